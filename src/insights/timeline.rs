use chrono::TimeZone;

use crate::models::{CompletionEvent, Routine};

/// One history entry with enough context to find it again in its routine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEntry<'a> {
    pub routine_id: &'a str,
    pub routine_name: &'a str,
    /// Position in the owning routine's history.
    pub index: usize,
    pub event: &'a CompletionEvent,
}

/// Every history entry across all routines, newest first. Archived routines
/// are included.
pub fn timeline(routines: &[Routine]) -> Vec<TimelineEntry<'_>> {
    let mut entries: Vec<TimelineEntry<'_>> = routines
        .iter()
        .flat_map(|routine| {
            routine
                .history
                .iter()
                .enumerate()
                .map(move |(index, event)| TimelineEntry {
                    routine_id: &routine.id,
                    routine_name: &routine.name,
                    index,
                    event,
                })
        })
        .collect();
    entries.sort_by(|a, b| b.event.date.cmp(&a.event.date));
    entries
}

/// Groups consecutive entries under "Month Year" labels in `tz`.
pub fn group_by_month<'a, Tz>(
    entries: Vec<TimelineEntry<'a>>,
    tz: &Tz,
) -> Vec<(String, Vec<TimelineEntry<'a>>)>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut groups: Vec<(String, Vec<TimelineEntry<'a>>)> = Vec::new();
    for entry in entries {
        let label = entry
            .event
            .date
            .with_timezone(tz)
            .format("%B %Y")
            .to_string();
        match groups.last_mut() {
            Some((current, items)) if *current == label => items.push(entry),
            _ => groups.push((label, vec![entry])),
        }
    }
    groups
}

/// Entries that carry a photo, optionally limited to one routine.
pub fn gallery<'a>(routines: &'a [Routine], routine_id: Option<&str>) -> Vec<TimelineEntry<'a>> {
    timeline(routines)
        .into_iter()
        .filter(|entry| entry.event.photo.is_some())
        .filter(|entry| routine_id.map_or(true, |id| entry.routine_id == id))
        .collect()
}
