use chrono::{DateTime, Utc};

use crate::models::{FuzzyStatus, Routine, RoutineStatus, Season};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Up to 70% of the cadence elapsed still reads as fresh.
pub const FRESH_RATIO: f64 = 0.7;
/// Up to 10% past the cadence still reads as approaching.
pub const DRIFT_RATIO: f64 = 1.1;

fn days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MS_PER_DAY
}

pub fn effective_cadence(routine: &Routine, season: Season) -> u32 {
    routine
        .season_override(season)
        .unwrap_or(routine.cadence_days)
}

/// Classifies a routine's freshness at `now` under the active `season`.
///
/// An active skip always reads as fresh and counts down to the skip date.
/// A routine that was never completed reads as approaching with no day counts.
/// Callers must keep `cadence_days >= 1`.
pub fn classify(routine: &Routine, now: DateTime<Utc>, season: Season) -> RoutineStatus {
    let cadence = f64::from(effective_cadence(routine, season));

    if let Some(skipped_until) = routine.skipped_until.filter(|&until| until > now) {
        return RoutineStatus {
            status: FuzzyStatus::Fresh,
            days_since: None,
            days_until: Some(days_between(skipped_until, now)),
        };
    }

    let Some(last) = routine.last_completed_at else {
        return RoutineStatus {
            status: FuzzyStatus::Approaching,
            days_since: None,
            days_until: None,
        };
    };

    let diff = days_between(now, last);
    let status = if diff <= cadence * FRESH_RATIO {
        FuzzyStatus::Fresh
    } else if diff <= cadence * DRIFT_RATIO {
        FuzzyStatus::Approaching
    } else {
        FuzzyStatus::Drifted
    };

    RoutineStatus {
        status,
        days_since: Some(diff),
        days_until: Some((cadence - diff).max(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::test_support::{at, days, routine, routine_done_at};

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("day count present");
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn never_completed_is_approaching_without_counts() {
        let now = at("2026-05-10T12:00:00Z");
        let status = classify(&routine("r", 14), now, Season::Default);

        assert_eq!(status.status, FuzzyStatus::Approaching);
        assert_eq!(status.days_since, None);
        assert_eq!(status.days_until, None);
    }

    #[test]
    fn ten_days_into_fourteen_is_approaching() {
        let now = at("2026-05-10T12:00:00Z");
        let r = routine_done_at("r", 14, &[now - days(10.0)]);

        let status = classify(&r, now, Season::Default);

        assert_eq!(status.status, FuzzyStatus::Approaching);
        assert_close(status.days_since, 10.0);
        assert_close(status.days_until, 4.0);
    }

    #[test]
    fn twenty_days_into_fourteen_has_drifted() {
        let now = at("2026-05-10T12:00:00Z");
        let r = routine_done_at("r", 14, &[now - days(20.0)]);

        let status = classify(&r, now, Season::Default);

        assert_eq!(status.status, FuzzyStatus::Drifted);
        assert_close(status.days_since, 20.0);
        assert_close(status.days_until, 0.0);
    }

    #[test]
    fn thresholds_are_inclusive_and_monotonic() {
        let now = at("2026-05-10T00:00:00Z");
        let cadence = 10;
        let expectations = [
            (0.0, FuzzyStatus::Fresh),
            (7.0, FuzzyStatus::Fresh),
            (7.5, FuzzyStatus::Approaching),
            (11.0, FuzzyStatus::Approaching),
            (11.5, FuzzyStatus::Drifted),
            (40.0, FuzzyStatus::Drifted),
        ];

        let mut previous_rank = 0;
        for (elapsed, expected) in expectations {
            let r = routine_done_at("r", cadence, &[now - days(elapsed)]);
            let status = classify(&r, now, Season::Default).status;
            assert_eq!(status, expected, "after {elapsed} days");

            let rank = match status {
                FuzzyStatus::Fresh => 0,
                FuzzyStatus::Approaching => 1,
                FuzzyStatus::Drifted => 2,
            };
            assert!(rank >= previous_rank);
            previous_rank = rank;
        }
    }

    #[test]
    fn active_skip_reads_fresh_even_when_long_overdue() {
        let now = at("2026-05-10T12:00:00Z");
        let mut r = routine_done_at("r", 7, &[now - days(90.0)]);
        r.skipped_until = Some(now + days(2.5));

        let status = classify(&r, now, Season::Default);

        assert_eq!(status.status, FuzzyStatus::Fresh);
        assert_eq!(status.days_since, None);
        assert_close(status.days_until, 2.5);
    }

    #[test]
    fn skip_also_covers_never_completed_routines() {
        let now = at("2026-05-10T12:00:00Z");
        let mut r = routine("r", 7);
        r.skipped_until = Some(now + days(7.0));

        let status = classify(&r, now, Season::Default);

        assert_eq!(status.status, FuzzyStatus::Fresh);
        assert_close(status.days_until, 7.0);
    }

    #[test]
    fn expired_skip_is_ignored() {
        let now = at("2026-05-10T12:00:00Z");
        let mut r = routine_done_at("r", 7, &[now - days(20.0)]);
        r.skipped_until = Some(now);

        assert_eq!(
            classify(&r, now, Season::Default).status,
            FuzzyStatus::Drifted
        );
    }

    #[test]
    fn season_override_replaces_base_cadence() {
        let now = at("2026-05-10T12:00:00Z");
        let mut r = routine_done_at("r", 14, &[now - days(20.0)]);
        r.cadence_by_season = Some(BTreeMap::from([(Season::Winter, 30)]));

        assert_eq!(effective_cadence(&r, Season::Winter), 30);
        assert_eq!(effective_cadence(&r, Season::Summer), 14);

        let winter = classify(&r, now, Season::Winter);
        assert_eq!(winter.status, FuzzyStatus::Fresh);
        assert_close(winter.days_until, 10.0);

        assert_eq!(
            classify(&r, now, Season::Summer).status,
            FuzzyStatus::Drifted
        );
    }
}
