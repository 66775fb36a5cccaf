//! Command-line interface for rhythms
//!
//! Running `rhythms` without a subcommand opens the terminal UI. Every
//! subcommand works on the same store and exits after printing its result.

use std::path::PathBuf;

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::error::{AppError, Result};
use crate::models::{Friction, Routine, Season};

mod run;

pub use run::run;

/// rhythms - keep self-care routines in a loose rhythm
///
/// Tracks recurring routines with a cadence in days and tells you which ones
/// are fresh, coming up, or have drifted a bit.
#[derive(Parser, Debug)]
#[command(name = "rhythms")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new rhythm
    Add {
        name: String,

        /// Days between completions (defaults to the configured cadence)
        #[arg(long, allow_negative_numbers = true)]
        cadence: Option<f64>,

        /// Effort level: low, medium, high
        #[arg(long)]
        friction: Option<Friction>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Related link (booking page, product, ...)
        #[arg(long, value_parser = parse_link)]
        link: Option<String>,

        /// Seasonal cadence override, e.g. winter=21 (repeatable)
        #[arg(long = "season-cadence", value_parser = parse_season_cadence)]
        season_cadence: Vec<(Season, u32)>,
    },

    /// List rhythms with their status
    List {
        /// Show idle (archived) rhythms instead of active ones
        #[arg(long, conflicts_with = "all")]
        archived: bool,

        /// Show every rhythm
        #[arg(long)]
        all: bool,

        /// Only rhythms carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show one rhythm with its full history
    Show {
        /// Rhythm id or unique prefix
        id: String,
    },

    /// Change a rhythm's settings
    Edit {
        /// Rhythm id or unique prefix
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        cadence: Option<f64>,

        #[arg(long)]
        friction: Option<Friction>,

        /// Replace the tags (repeatable)
        #[arg(long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,

        #[arg(long)]
        clear_tags: bool,

        #[arg(long, value_parser = parse_link, conflicts_with = "clear_link")]
        link: Option<String>,

        #[arg(long)]
        clear_link: bool,

        /// Set a seasonal cadence override, e.g. summer=7 (repeatable)
        #[arg(
            long = "season-cadence",
            value_parser = parse_season_cadence,
            conflicts_with = "clear_season_cadence"
        )]
        season_cadence: Vec<(Season, u32)>,

        /// Remove every seasonal override
        #[arg(long)]
        clear_season_cadence: bool,
    },

    /// Log a completion now
    Done {
        /// Rhythm id or unique prefix
        id: String,

        #[arg(long)]
        note: Option<String>,

        /// How long it took, in minutes
        #[arg(long)]
        minutes: Option<f64>,

        /// File holding a pre-encoded image (data URI)
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Postpone a rhythm without logging it
    Skip {
        /// Rhythm id or unique prefix
        id: String,

        /// Days to skip (defaults to the configured skip length)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,
    },

    /// Toggle a rhythm between active and idle
    Archive {
        /// Rhythm id or unique prefix
        id: String,
    },

    /// Delete a rhythm and its history
    Delete {
        /// Rhythm id or unique prefix
        id: String,
    },

    /// Edit or delete logged completions
    #[command(subcommand)]
    History(HistoryCommand),

    /// Replace every rhythm with the contents of an export file
    Import { file: PathBuf },

    /// Write every rhythm as JSON to a file, or stdout
    Export { file: Option<PathBuf> },

    /// Show or change the active season
    Season { season: Option<Season> },

    /// Due counts, overdue rhythms and recent activity
    Dashboard,

    /// Completion summary for one Sunday-to-Saturday week
    Weekly {
        /// How many weeks back to look (0 is this week)
        #[arg(long, default_value_t = 0)]
        weeks_ago: u32,
    },

    /// Month calendar of completions
    Calendar {
        /// Month to show as YYYY-MM (defaults to this month)
        #[arg(long, value_parser = parse_month)]
        month: Option<(i32, u32)>,
    },

    /// Every completion, newest first, grouped by month
    Timeline,

    /// Completions that carry a photo
    Gallery {
        /// Only this rhythm (id or unique prefix)
        #[arg(long)]
        routine: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Change one logged completion (index as shown by `show`)
    Edit {
        /// Rhythm id or unique prefix
        id: String,

        index: usize,

        /// New date, RFC 3339 or YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,

        #[arg(long, conflicts_with = "clear_note")]
        note: Option<String>,

        #[arg(long)]
        clear_note: bool,

        #[arg(long, conflicts_with = "clear_minutes")]
        minutes: Option<f64>,

        #[arg(long)]
        clear_minutes: bool,

        #[arg(long, conflicts_with = "clear_photo")]
        photo: Option<PathBuf>,

        #[arg(long)]
        clear_photo: bool,
    },

    /// Remove one logged completion
    Delete {
        /// Rhythm id or unique prefix
        id: String,

        index: usize,
    },
}

/// Finds the single rhythm whose id is `query` or starts with it.
pub fn resolve_id<'a>(routines: &'a [Routine], query: &str) -> Result<&'a Routine> {
    let query = query.trim();
    if let Some(exact) = routines.iter().find(|r| r.id == query) {
        return Ok(exact);
    }

    let matches: Vec<&Routine> = routines
        .iter()
        .filter(|r| !query.is_empty() && r.id.starts_with(query))
        .collect();
    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(AppError::InvalidInput(format!("no rhythm matches '{query}'"))),
        many => Err(AppError::InvalidInput(format!(
            "'{query}' matches {} rhythms, use more of the id",
            many.len()
        ))),
    }
}

fn parse_link(s: &str) -> std::result::Result<String, String> {
    let trimmed = s.trim();
    url::Url::parse(trimmed).map_err(|e| format!("invalid link '{trimmed}': {e}"))?;
    Ok(trimmed.to_string())
}

fn parse_season_cadence(s: &str) -> std::result::Result<(Season, u32), String> {
    let (season, days) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SEASON=DAYS, got '{s}'"))?;
    let season: Season = season.parse()?;
    if season == Season::Default {
        return Err("the default season uses the base cadence".to_string());
    }
    let days: u32 = days
        .trim()
        .parse()
        .map_err(|_| format!("'{days}' is not a number of days"))?;
    Ok((season, days))
}

fn parse_month(s: &str) -> std::result::Result<(i32, u32), String> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM, got '{s}'"))?;
    Ok((first.year(), first.month()))
}

/// Accepts a full RFC 3339 timestamp, or a bare date taken as local noon.
fn parse_date(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .and_then(|noon| noon.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| format!("expected RFC 3339 or YYYY-MM-DD, got '{s}'"))
}
