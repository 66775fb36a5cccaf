use chrono::{DateTime, TimeZone, Utc};

use super::timeline::{timeline, TimelineEntry};
use crate::models::{Routine, Season};
use crate::schedule::{due_state, DueState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttentionItem<'a> {
    pub routine: &'a Routine,
    pub overdue_days: i64,
}

impl AttentionItem<'_> {
    pub fn overdue_label(&self) -> String {
        match self.overdue_days {
            d if d <= 0 => "Due today".to_string(),
            1 => "1 day overdue".to_string(),
            d => format!("{d} days overdue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard<'a> {
    pub due_count: usize,
    pub completed_today: usize,
    pub total: usize,
    /// Due routines, most overdue first.
    pub needs_attention: Vec<AttentionItem<'a>>,
    pub recent_activity: Vec<TimelineEntry<'a>>,
}

pub fn dashboard<'a, Tz: TimeZone>(
    routines: &'a [Routine],
    now: &DateTime<Tz>,
    season: Season,
    recent_limit: usize,
) -> Dashboard<'a> {
    let now_utc = now.with_timezone(&Utc);
    let today = now.date_naive();
    let tz = now.timezone();

    let active: Vec<&Routine> = routines.iter().filter(|r| !r.is_archived).collect();

    let completed_today = active
        .iter()
        .filter(|r| {
            r.last_completed_at
                .is_some_and(|last| last.with_timezone(&tz).date_naive() == today)
        })
        .count();

    let mut needs_attention: Vec<AttentionItem<'a>> = active
        .iter()
        .filter_map(|&routine| match due_state(routine, now_utc, season) {
            DueState::Due { overdue_days } => Some(AttentionItem {
                routine,
                overdue_days,
            }),
            DueState::NotDue => None,
        })
        .collect();
    needs_attention.sort_by(|a, b| b.overdue_days.cmp(&a.overdue_days));

    let mut recent_activity = timeline(routines);
    recent_activity.truncate(recent_limit);

    Dashboard {
        due_count: needs_attention.len(),
        completed_today,
        total: active.len(),
        needs_attention,
        recent_activity,
    }
}
