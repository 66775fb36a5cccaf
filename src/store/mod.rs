//! Canonical routine collection and every mutation applied to it.
//!
//! The store owns the routines exclusively. Each successful mutation writes a
//! full snapshot to the backend under [`ROUTINES_KEY`]; operations on an
//! unknown id are no-ops reported as `Ok(false)`.

mod migrate;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::db::KvBackend;
use crate::error::{AppError, Result};
use crate::models::{
    CompletionEvent, HistoryPatch, LogData, NewRoutine, Routine, RoutinePatch, RoutineStatus,
    Season,
};
use crate::schedule::classify;

pub const ROUTINES_KEY: &str = "rhythms-routines-v1";
pub const SEASON_KEY: &str = "rhythms-season";

pub struct RoutineStore<B, C = SystemClock> {
    backend: B,
    clock: C,
    routines: Vec<Routine>,
    season: Season,
}

impl<B: KvBackend, C: Clock> RoutineStore<B, C> {
    pub async fn load(backend: B, clock: C) -> Result<Self> {
        let routines = match backend.get(ROUTINES_KEY).await? {
            Some(raw) => migrate::load_routines(&raw),
            None => Vec::new(),
        };

        let season = match backend.get(SEASON_KEY).await? {
            Some(raw) => raw.parse::<Season>().unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored season: {}", e);
                Season::default()
            }),
            None => Season::default(),
        };

        tracing::debug!(count = routines.len(), %season, "Loaded routines");

        Ok(Self {
            backend,
            clock,
            routines,
            season,
        })
    }

    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    pub fn get(&self, id: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.id == id)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn status(&self, routine: &Routine) -> RoutineStatus {
        classify(routine, self.clock.now(), self.season)
    }

    pub async fn set_season(&mut self, season: Season) -> Result<()> {
        self.season = season;
        self.backend.set(SEASON_KEY, season.as_str()).await?;
        tracing::debug!(%season, "Season changed");
        Ok(())
    }

    /// Adds a routine with an empty history and returns its generated id.
    pub async fn add(&mut self, new: NewRoutine) -> Result<String> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("routine name cannot be empty".into()));
        }

        let mut id = Uuid::new_v4().to_string();
        while self.get(&id).is_some() {
            id = Uuid::new_v4().to_string();
        }

        self.routines.push(Routine {
            id: id.clone(),
            name,
            cadence_days: new.cadence_days.max(1),
            cadence_by_season: new.cadence_by_season,
            friction: new.friction,
            link: normalize_link(new.link),
            tags: normalize_tags(new.tags),
            last_completed_at: None,
            skipped_until: None,
            history: Vec::new(),
            is_archived: false,
        });

        tracing::debug!(id = %id, "Added routine");
        self.persist().await?;
        Ok(id)
    }

    pub async fn update(&mut self, id: &str, mut patch: RoutinePatch) -> Result<bool> {
        if let Some(name) = patch.name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::InvalidInput("routine name cannot be empty".into()));
            }
        }
        patch.tags = patch.tags.map(normalize_tags);
        patch.link = patch.link.map(normalize_link);

        let Some(routine) = self.routine_mut(id) else {
            return Ok(false);
        };
        patch.apply(routine);

        tracing::debug!(id, "Updated routine");
        self.persist().await?;
        Ok(true)
    }

    /// Logs a completion now. Completing always cancels an active skip.
    pub async fn mark_done(&mut self, id: &str, log: LogData) -> Result<bool> {
        let now = self.clock.now();
        let Some(routine) = self.routine_mut(id) else {
            return Ok(false);
        };

        routine.history.insert(
            0,
            CompletionEvent {
                date: now,
                note: log.note,
                duration_minutes: log.duration_minutes,
                photo: log.photo,
            },
        );
        routine.last_completed_at = Some(now);
        routine.skipped_until = None;

        tracing::debug!(id, "Marked routine done");
        self.persist().await?;
        Ok(true)
    }

    /// Postpones the routine until `days` from now without touching its history.
    pub async fn skip_until(&mut self, id: &str, days: u32) -> Result<bool> {
        let until = self.clock.now() + Duration::days(i64::from(days));
        let Some(routine) = self.routine_mut(id) else {
            return Ok(false);
        };
        routine.skipped_until = Some(until);

        tracing::debug!(id, %until, "Skipped routine");
        self.persist().await?;
        Ok(true)
    }

    pub async fn delete_routine(&mut self, id: &str) -> Result<bool> {
        let before = self.routines.len();
        self.routines.retain(|r| r.id != id);
        if self.routines.len() == before {
            return Ok(false);
        }

        tracing::debug!(id, "Deleted routine");
        self.persist().await?;
        Ok(true)
    }

    /// Patches one history entry. Moving an entry's date re-sorts the history
    /// and re-derives `last_completed_at` from the new head.
    pub async fn update_history_event(
        &mut self,
        id: &str,
        index: usize,
        patch: HistoryPatch,
    ) -> Result<bool> {
        let now = self.clock.now();
        if patch.date.is_some_and(|date| date > now) {
            return Err(AppError::InvalidInput(
                "a completion cannot be dated in the future".into(),
            ));
        }

        let Some(routine) = self.routine_mut(id) else {
            return Ok(false);
        };
        let Some(event) = routine.history.get_mut(index) else {
            return Ok(false);
        };

        if patch.apply(event) {
            routine.sort_history();
            routine.refresh_last_completed();
        }

        tracing::debug!(id, index, "Updated history entry");
        self.persist().await?;
        Ok(true)
    }

    pub async fn delete_history_event(&mut self, id: &str, index: usize) -> Result<bool> {
        let Some(routine) = self.routine_mut(id) else {
            return Ok(false);
        };
        if index >= routine.history.len() {
            return Ok(false);
        }

        routine.history.remove(index);
        if index == 0 {
            routine.refresh_last_completed();
        }

        tracing::debug!(id, index, "Deleted history entry");
        self.persist().await?;
        Ok(true)
    }

    pub async fn toggle_archive(&mut self, id: &str) -> Result<bool> {
        let Some(routine) = self.routine_mut(id) else {
            return Ok(false);
        };
        routine.is_archived = !routine.is_archived;

        tracing::debug!(id, archived = routine.is_archived, "Toggled archive");
        self.persist().await?;
        Ok(true)
    }

    /// Replaces the whole collection with `json`. Returns `Ok(false)` and leaves
    /// the collection untouched when the payload is malformed.
    pub async fn import_routines(&mut self, json: &str) -> Result<bool> {
        let routines = match migrate::parse_import(json) {
            Ok(routines) => routines,
            Err(reason) => {
                tracing::warn!("Rejected import: {}", reason);
                return Ok(false);
            }
        };

        tracing::info!(count = routines.len(), "Imported routines");
        self.routines = routines;
        self.persist().await?;
        Ok(true)
    }

    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.routines)?)
    }

    fn routine_mut(&mut self, id: &str) -> Option<&mut Routine> {
        self.routines.iter_mut().find(|r| r.id == id)
    }

    async fn persist(&self) -> Result<()> {
        let snapshot = serde_json::to_string(&self.routines)?;
        self.backend.set(ROUTINES_KEY, &snapshot).await?;
        Ok(())
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn normalize_link(link: Option<String>) -> Option<String> {
    link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
}
