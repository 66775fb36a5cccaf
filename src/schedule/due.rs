use chrono::{DateTime, Utc};

use super::status::{classify, effective_cadence};
use crate::models::{Routine, Season};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    /// Still inside its cadence, or postponed by an active skip.
    NotDue,
    /// Whole days past the due point; 0 means due today.
    Due { overdue_days: i64 },
}

impl DueState {
    pub fn is_due(&self) -> bool {
        matches!(self, DueState::Due { .. })
    }
}

/// Due-ness derived from [`classify`], so list badges and the dashboard agree.
pub fn due_state(routine: &Routine, now: DateTime<Utc>, season: Season) -> DueState {
    let status = classify(routine, now, season);

    match (status.days_since, status.days_until) {
        // never completed and not postponed
        (None, None) => DueState::Due { overdue_days: 0 },
        (Some(since), Some(until)) if until <= 0.0 => {
            let cadence = f64::from(effective_cadence(routine, season));
            let overdue = (since - cadence).floor().max(0.0) as i64;
            DueState::Due {
                overdue_days: overdue,
            }
        }
        _ => DueState::NotDue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, days, routine, routine_done_at};

    #[test]
    fn never_completed_is_due_today() {
        let now = at("2026-05-10T12:00:00Z");
        assert_eq!(
            due_state(&routine("r", 7), now, Season::Default),
            DueState::Due { overdue_days: 0 }
        );
    }

    #[test]
    fn inside_cadence_is_not_due() {
        let now = at("2026-05-10T12:00:00Z");
        let r = routine_done_at("r", 14, &[now - days(10.0)]);
        assert_eq!(due_state(&r, now, Season::Default), DueState::NotDue);
    }

    #[test]
    fn overdue_days_floor_past_the_cadence() {
        let now = at("2026-05-10T12:00:00Z");
        let r = routine_done_at("r", 14, &[now - days(20.6)]);
        assert_eq!(
            due_state(&r, now, Season::Default),
            DueState::Due { overdue_days: 6 }
        );

        let exactly = routine_done_at("r", 14, &[now - days(14.0)]);
        assert_eq!(
            due_state(&exactly, now, Season::Default),
            DueState::Due { overdue_days: 0 }
        );
    }

    #[test]
    fn active_skip_suppresses_due() {
        let now = at("2026-05-10T12:00:00Z");
        let mut r = routine_done_at("r", 7, &[now - days(30.0)]);
        r.skipped_until = Some(now + days(1.0));
        assert!(!due_state(&r, now, Season::Default).is_due());

        let mut fresh = routine("n", 7);
        fresh.skipped_until = Some(now + days(3.0));
        assert!(!due_state(&fresh, now, Season::Default).is_due());
    }

    #[test]
    fn due_agrees_with_classify_under_season_override() {
        use std::collections::BTreeMap;

        let now = at("2026-05-10T12:00:00Z");
        let mut r = routine_done_at("r", 7, &[now - days(10.0)]);
        r.cadence_by_season = Some(BTreeMap::from([(Season::Summer, 21)]));

        assert!(due_state(&r, now, Season::Default).is_due());
        assert!(!due_state(&r, now, Season::Summer).is_due());
    }
}
