use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

use crate::models::Routine;

/// Six Sunday-start weeks.
const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub completions: Vec<&'a str>,
}

/// Month grid for `year`/`month` with completed routine names per day.
/// Returns `None` for an invalid month.
pub fn month_grid<'a, Tz: TimeZone>(
    routines: &'a [Routine],
    year: i32,
    month: u32,
    now: &DateTime<Tz>,
) -> Option<Vec<CalendarDay<'a>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let grid_start =
        first.checked_sub_days(Days::new(u64::from(first.weekday().num_days_from_sunday())))?;
    let today = now.date_naive();
    let tz = now.timezone();

    let mut days: Vec<CalendarDay<'a>> = grid_start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| CalendarDay {
            date,
            in_month: date.month() == month && date.year() == year,
            is_today: date == today,
            completions: Vec::new(),
        })
        .collect();

    for routine in routines {
        for event in &routine.history {
            let day = event.date.with_timezone(&tz).date_naive();
            let offset = (day - grid_start).num_days();
            if let Ok(offset) = usize::try_from(offset) {
                if let Some(cell) = days.get_mut(offset) {
                    cell.completions.push(&routine.name);
                }
            }
        }
    }

    Some(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, routine_done_at};

    #[test]
    fn grid_starts_on_the_sunday_before_the_first() {
        let now = at("2026-05-13T12:00:00Z");
        let grid = month_grid(&[], 2026, 5, &now).expect("grid");

        assert_eq!(grid.len(), 42);
        // May 1 2026 is a Friday
        assert_eq!(grid[0].date, "2026-04-26".parse::<NaiveDate>().expect("date"));
        assert!(!grid[0].in_month);
        assert!(grid[5].in_month);
        assert_eq!(grid.iter().filter(|d| d.in_month).count(), 31);
        assert_eq!(grid.iter().filter(|d| d.is_today).count(), 1);
    }

    #[test]
    fn places_completions_on_their_day() {
        let now = at("2026-05-13T12:00:00Z");
        let mut r = routine_done_at(
            "r",
            7,
            &[at("2026-05-12T08:00:00Z"), at("2026-03-01T08:00:00Z")],
        );
        r.name = "Skincare".into();
        let routines = vec![r];

        let grid = month_grid(&routines, 2026, 5, &now).expect("grid");

        let day = grid
            .iter()
            .find(|d| d.date == "2026-05-12".parse::<NaiveDate>().expect("date"))
            .expect("cell");
        assert_eq!(day.completions, vec!["Skincare"]);
        assert_eq!(grid.iter().map(|d| d.completions.len()).sum::<usize>(), 1);
    }

    #[test]
    fn invalid_month_yields_none() {
        let now = at("2026-05-13T12:00:00Z");
        assert!(month_grid(&[], 2026, 13, &now).is_none());
    }
}
