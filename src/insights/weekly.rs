use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

use crate::models::{Routine, Season};
use crate::schedule::effective_cadence;

const DAYS_IN_WEEK: u32 = 7;
const TOP_ROUTINES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineConsistency<'a> {
    pub name: &'a str,
    pub completions: usize,
    pub possible: u32,
}

impl RoutineConsistency<'_> {
    pub fn rate(&self) -> f64 {
        if self.possible == 0 {
            return 0.0;
        }
        self.completions as f64 / f64::from(self.possible) * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Percentage of possible completions actually logged.
    pub completion_rate: f64,
    pub total_completions: usize,
    pub total_minutes: f64,
    pub most_consistent: Vec<RoutineConsistency<'a>>,
    /// Percentage change in completion rate versus the week before.
    pub change_vs_previous: f64,
}

/// Renders minutes as "45m", "2h" or "1h 30m".
pub fn format_minutes(minutes: f64) -> String {
    let total = minutes.round().max(0.0) as u64;
    let (hours, mins) = (total / 60, total % 60);
    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Sunday-to-Saturday bounds of the week `weeks_ago` weeks before `today`'s.
/// Weeks before the earliest representable date clamp to it.
pub fn week_bounds(today: NaiveDate, weeks_ago: u32) -> (NaiveDate, NaiveDate) {
    let back = u64::from(today.weekday().num_days_from_sunday()) + u64::from(weeks_ago) * 7;
    let start = today
        .checked_sub_days(Days::new(back))
        .unwrap_or(NaiveDate::MIN);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
    (start, end)
}

struct WeekTotals<'a> {
    completions: usize,
    minutes: f64,
    possible: u32,
    per_routine: Vec<RoutineConsistency<'a>>,
}

impl WeekTotals<'_> {
    fn rate(&self) -> f64 {
        if self.possible == 0 {
            return 0.0;
        }
        self.completions as f64 / f64::from(self.possible) * 100.0
    }
}

fn tally<'a, Tz: TimeZone>(
    routines: &'a [Routine],
    tz: &Tz,
    season: Season,
    start: NaiveDate,
    end: NaiveDate,
) -> WeekTotals<'a> {
    let mut totals = WeekTotals {
        completions: 0,
        minutes: 0.0,
        possible: 0,
        per_routine: Vec::new(),
    };

    for routine in routines.iter().filter(|r| !r.is_archived) {
        let possible = DAYS_IN_WEEK / effective_cadence(routine, season);
        totals.possible += possible;

        let in_week: Vec<_> = routine
            .history
            .iter()
            .filter(|event| {
                let day = event.date.with_timezone(tz).date_naive();
                day >= start && day <= end
            })
            .collect();

        totals.completions += in_week.len();
        totals.minutes += in_week
            .iter()
            .filter_map(|event| event.duration_minutes)
            .sum::<f64>();

        if possible > 0 {
            totals.per_routine.push(RoutineConsistency {
                name: &routine.name,
                completions: in_week.len(),
                possible,
            });
        }
    }

    totals
}

pub fn weekly_summary<'a, Tz: TimeZone>(
    routines: &'a [Routine],
    now: &DateTime<Tz>,
    season: Season,
    weeks_ago: u32,
) -> WeekSummary<'a> {
    let tz = now.timezone();
    let today = now.date_naive();

    let (start, end) = week_bounds(today, weeks_ago);
    let current = tally(routines, &tz, season, start, end);

    let (prev_start, prev_end) = week_bounds(today, weeks_ago.saturating_add(1));
    let previous_rate = tally(routines, &tz, season, prev_start, prev_end).rate();

    let completion_rate = current.rate();
    let change_vs_previous = if previous_rate > 0.0 {
        (completion_rate - previous_rate) / previous_rate * 100.0
    } else {
        0.0
    };

    let mut most_consistent = current.per_routine;
    most_consistent.sort_by(|a, b| b.rate().total_cmp(&a.rate()));
    most_consistent.truncate(TOP_ROUTINES);

    WeekSummary {
        start,
        end,
        completion_rate,
        total_completions: current.completions,
        total_minutes: current.minutes,
        most_consistent,
        change_vs_previous,
    }
}
