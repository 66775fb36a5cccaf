use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::Season;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Friction {
    Low,
    #[default]
    Medium,
    High,
}

impl Friction {
    pub fn label(&self) -> &'static str {
        match self {
            Friction::Low => "Low effort",
            Friction::Medium => "Medium effort",
            Friction::High => "High effort",
        }
    }
}

impl FromStr for Friction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Friction::Low),
            "medium" => Ok(Friction::Medium),
            "high" => Ok(Friction::High),
            other => Err(format!("unknown friction '{other}' (expected low, medium or high)")),
        }
    }
}

/// One logged occurrence of a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    /// Pre-encoded image payload, usually a data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_cadence")]
    pub cadence_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence_by_season: Option<BTreeMap<Season, u32>>,
    #[serde(default)]
    pub friction: Friction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub last_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skipped_until: Option<DateTime<Utc>>,
    /// Newest first.
    #[serde(default)]
    pub history: Vec<CompletionEvent>,
    #[serde(default)]
    pub is_archived: bool,
}

impl Routine {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Season override for `season`, if one is set to a usable value.
    pub fn season_override(&self, season: Season) -> Option<u32> {
        self.cadence_by_season
            .as_ref()
            .and_then(|overrides| overrides.get(&season).copied())
            .filter(|&days| days > 0)
    }

    pub(crate) fn sort_history(&mut self) {
        // sort_by is stable, so equal dates keep their logged order
        self.history.sort_by(|a, b| b.date.cmp(&a.date));
    }

    pub(crate) fn refresh_last_completed(&mut self) {
        self.last_completed_at = self.history.first().map(|event| event.date);
    }
}

/// Coerces any user or file supplied cadence to a whole number of days, minimum 1.
pub fn coerce_cadence(value: f64) -> u32 {
    if !value.is_finite() || value < 1.0 {
        return 1;
    }
    value.trunc().min(u32::MAX as f64) as u32
}

fn deserialize_cadence<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(coerce_cadence(raw))
}

/// Fields a caller supplies when creating a routine; the store assigns the id.
#[derive(Debug, Clone, Default)]
pub struct NewRoutine {
    pub name: String,
    pub cadence_days: u32,
    pub cadence_by_season: Option<BTreeMap<Season, u32>>,
    pub friction: Friction,
    pub tags: Vec<String>,
    pub link: Option<String>,
}

/// Shallow patch for [`Routine`]. `None` leaves a field alone; for nullable
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct RoutinePatch {
    pub name: Option<String>,
    pub cadence_days: Option<u32>,
    pub cadence_by_season: Option<Option<BTreeMap<Season, u32>>>,
    pub friction: Option<Friction>,
    pub tags: Option<Vec<String>>,
    pub link: Option<Option<String>>,
    pub skipped_until: Option<Option<DateTime<Utc>>>,
}

impl RoutinePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cadence_days.is_none()
            && self.cadence_by_season.is_none()
            && self.friction.is_none()
            && self.tags.is_none()
            && self.link.is_none()
            && self.skipped_until.is_none()
    }

    pub(crate) fn apply(self, routine: &mut Routine) {
        if let Some(name) = self.name {
            routine.name = name;
        }
        if let Some(days) = self.cadence_days {
            routine.cadence_days = days.max(1);
        }
        if let Some(overrides) = self.cadence_by_season {
            routine.cadence_by_season = overrides;
        }
        if let Some(friction) = self.friction {
            routine.friction = friction;
        }
        if let Some(tags) = self.tags {
            routine.tags = tags;
        }
        if let Some(link) = self.link {
            routine.link = link;
        }
        if let Some(skipped_until) = self.skipped_until {
            routine.skipped_until = skipped_until;
        }
    }
}

/// Optional details attached when logging a completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogData {
    pub note: Option<String>,
    pub duration_minutes: Option<f64>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryPatch {
    pub date: Option<DateTime<Utc>>,
    pub note: Option<Option<String>>,
    pub duration_minutes: Option<Option<f64>>,
    pub photo: Option<Option<String>>,
}

impl HistoryPatch {
    /// Applies the patch and reports whether the event date moved.
    pub(crate) fn apply(self, event: &mut CompletionEvent) -> bool {
        let mut date_changed = false;
        if let Some(date) = self.date {
            date_changed = date != event.date;
            event.date = date;
        }
        if let Some(note) = self.note {
            event.note = note;
        }
        if let Some(duration) = self.duration_minutes {
            event.duration_minutes = duration;
        }
        if let Some(photo) = self.photo {
            event.photo = photo;
        }
        date_changed
    }
}
