use chrono::{DateTime, Duration, Utc};

use crate::models::{CompletionEvent, Friction, Routine};

pub fn at(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid RFC 3339 timestamp")
}

pub fn days(n: f64) -> Duration {
    Duration::milliseconds((n * 86_400_000.0) as i64)
}

pub fn routine(id: &str, cadence_days: u32) -> Routine {
    Routine {
        id: id.to_string(),
        name: format!("Routine {id}"),
        cadence_days,
        cadence_by_season: None,
        friction: Friction::Medium,
        link: None,
        tags: Vec::new(),
        last_completed_at: None,
        skipped_until: None,
        history: Vec::new(),
        is_archived: false,
    }
}

/// Routine whose history holds `dates` (newest first) with a matching `last_completed_at`.
pub fn routine_done_at(id: &str, cadence_days: u32, dates: &[DateTime<Utc>]) -> Routine {
    let mut r = routine(id, cadence_days);
    r.history = dates
        .iter()
        .map(|&date| CompletionEvent {
            date,
            note: None,
            duration_minutes: None,
            photo: None,
        })
        .collect();
    r.last_completed_at = dates.first().copied();
    r
}
