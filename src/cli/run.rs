use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{Datelike, Local};

use super::{resolve_id, Command, HistoryCommand};
use crate::clock::Clock;
use crate::config::Config;
use crate::db::KvBackend;
use crate::error::{AppError, Result};
use crate::insights::{
    dashboard, format_minutes, gallery, group_by_month, month_grid, timeline, weekly_summary,
};
use crate::models::{
    coerce_cadence, ArchiveFilter, CompletionEvent, HistoryPatch, LogData, NewRoutine, Routine,
    RoutineFilter, RoutinePatch, Season,
};
use crate::schedule::{due_state, effective_cadence};
use crate::store::RoutineStore;

/// Executes one subcommand against the store, writing human-readable output to `out`.
pub async fn run<B, C, W>(
    command: Command,
    store: &mut RoutineStore<B, C>,
    config: &Config,
    out: &mut W,
) -> Result<()>
where
    B: KvBackend,
    C: Clock,
    W: Write,
{
    match command {
        Command::Add {
            name,
            cadence,
            friction,
            tags,
            link,
            season_cadence,
        } => {
            let new = NewRoutine {
                name,
                cadence_days: cadence.map_or(config.default_cadence_days, coerce_cadence),
                cadence_by_season: (!season_cadence.is_empty())
                    .then(|| season_cadence.into_iter().collect()),
                friction: friction.unwrap_or(config.default_friction),
                tags,
                link,
            };
            let id = store.add(new).await?;
            if let Some(routine) = store.get(&id) {
                writeln!(
                    out,
                    "Added {} ({}), every {} days",
                    routine.name,
                    short_id(&routine.id),
                    routine.cadence_days
                )?;
            }
        }

        Command::List { archived, all, tag } => {
            let filter = RoutineFilter {
                archive: if all {
                    ArchiveFilter::All
                } else if archived {
                    ArchiveFilter::Archived
                } else {
                    ArchiveFilter::Active
                },
                tag,
            };
            let shown = filter.apply(store.routines());
            if shown.is_empty() {
                writeln!(out, "No rhythms yet. Add one with `rhythms add <name>`.")?;
            }
            for routine in shown {
                let status = store.status(routine);
                let badge = if routine.is_archived {
                    "  (idle)"
                } else if due_state(routine, store.now(), store.season()).is_due() {
                    "  (due)"
                } else {
                    ""
                };
                writeln!(
                    out,
                    "{}  {:<24} {:<14} {}{badge}",
                    short_id(&routine.id),
                    routine.name,
                    status.status.label(),
                    status.timing_label(),
                )?;
            }
        }

        Command::Show { id } => {
            let routine = resolve_id(store.routines(), &id)?;
            write_details(out, store, routine)?;
        }

        Command::Edit {
            id,
            name,
            cadence,
            friction,
            tags,
            clear_tags,
            link,
            clear_link,
            season_cadence,
            clear_season_cadence,
        } => {
            let routine = resolve_id(store.routines(), &id)?;
            let id = routine.id.clone();

            let cadence_by_season = if clear_season_cadence {
                Some(None)
            } else if season_cadence.is_empty() {
                None
            } else {
                let mut overrides: BTreeMap<Season, u32> =
                    routine.cadence_by_season.clone().unwrap_or_default();
                for (season, days) in season_cadence {
                    if days == 0 {
                        overrides.remove(&season);
                    } else {
                        overrides.insert(season, days);
                    }
                }
                Some((!overrides.is_empty()).then_some(overrides))
            };

            let patch = RoutinePatch {
                name,
                cadence_days: cadence.map(coerce_cadence),
                cadence_by_season,
                friction,
                tags: if clear_tags {
                    Some(Vec::new())
                } else {
                    (!tags.is_empty()).then_some(tags)
                },
                link: if clear_link { Some(None) } else { link.map(Some) },
                skipped_until: None,
            };
            if patch.is_empty() {
                return Err(AppError::InvalidInput("nothing to change".into()));
            }

            store.update(&id, patch).await?;
            writeln!(out, "Updated {}", display_name(store, &id))?;
        }

        Command::Done {
            id,
            note,
            minutes,
            photo,
        } => {
            let id = resolve_id(store.routines(), &id)?.id.clone();
            let log = LogData {
                note,
                duration_minutes: minutes.filter(|m| m.is_finite() && *m >= 0.0),
                photo: photo.as_deref().map(read_photo).transpose()?,
            };
            store.mark_done(&id, log).await?;
            writeln!(out, "Logged {}. Nice work.", display_name(store, &id))?;
        }

        Command::Skip { id, days } => {
            let id = resolve_id(store.routines(), &id)?.id.clone();
            let days = days.unwrap_or(config.default_skip_days).max(1);
            store.skip_until(&id, days).await?;
            writeln!(out, "Skipped {} for {days} days", display_name(store, &id))?;
        }

        Command::Archive { id } => {
            let id = resolve_id(store.routines(), &id)?.id.clone();
            store.toggle_archive(&id).await?;
            let state = match store.get(&id) {
                Some(r) if r.is_archived => "idle",
                _ => "active",
            };
            writeln!(out, "{} is now {state}", display_name(store, &id))?;
        }

        Command::Delete { id } => {
            let routine = resolve_id(store.routines(), &id)?;
            let (id, name) = (routine.id.clone(), routine.name.clone());
            store.delete_routine(&id).await?;
            writeln!(out, "Deleted {name}")?;
        }

        Command::History(HistoryCommand::Edit {
            id,
            index,
            date,
            note,
            clear_note,
            minutes,
            clear_minutes,
            photo,
            clear_photo,
        }) => {
            let id = resolve_id(store.routines(), &id)?.id.clone();
            let patch = HistoryPatch {
                date,
                note: if clear_note { Some(None) } else { note.map(Some) },
                duration_minutes: if clear_minutes {
                    Some(None)
                } else {
                    minutes.map(Some)
                },
                photo: if clear_photo {
                    Some(None)
                } else {
                    photo.as_deref().map(read_photo).transpose()?.map(Some)
                },
            };
            if !store.update_history_event(&id, index, patch).await? {
                return Err(AppError::InvalidInput(format!("no history entry #{index}")));
            }
            writeln!(out, "Updated entry #{index} of {}", display_name(store, &id))?;
        }

        Command::History(HistoryCommand::Delete { id, index }) => {
            let id = resolve_id(store.routines(), &id)?.id.clone();
            if !store.delete_history_event(&id, index).await? {
                return Err(AppError::InvalidInput(format!("no history entry #{index}")));
            }
            writeln!(out, "Deleted entry #{index} of {}", display_name(store, &id))?;
        }

        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            if !store.import_routines(&json).await? {
                return Err(AppError::InvalidInput(format!(
                    "{} is not a valid rhythms export",
                    file.display()
                )));
            }
            writeln!(out, "Imported {} rhythms", store.routines().len())?;
        }

        Command::Export { file } => {
            let json = store.export()?;
            match file {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    writeln!(
                        out,
                        "Exported {} rhythms to {}",
                        store.routines().len(),
                        path.display()
                    )?;
                }
                None => writeln!(out, "{json}")?,
            }
        }

        Command::Season { season } => {
            if let Some(season) = season {
                store.set_season(season).await?;
            }
            for option in Season::ALL {
                let marker = if option == store.season() { "*" } else { " " };
                writeln!(out, "{marker} {:<8} {}", option.as_str(), option.label())?;
            }
        }

        Command::Dashboard => {
            let now = store.now().with_timezone(&Local);
            let board = dashboard(
                store.routines(),
                &now,
                store.season(),
                config.recent_activity_limit,
            );

            writeln!(
                out,
                "{} due   {} done today   {} active",
                board.due_count, board.completed_today, board.total
            )?;
            writeln!(out, "\nNeeds attention")?;
            if board.needs_attention.is_empty() {
                writeln!(out, "  All caught up.")?;
            }
            for item in &board.needs_attention {
                writeln!(out, "  {:<24} {}", item.routine.name, item.overdue_label())?;
            }
            writeln!(out, "\nRecent activity")?;
            for entry in &board.recent_activity {
                writeln!(out, "  {}", entry_line(entry.routine_name, entry.event))?;
            }
        }

        Command::Weekly { weeks_ago } => {
            let now = store.now().with_timezone(&Local);
            let week = weekly_summary(store.routines(), &now, store.season(), weeks_ago);

            writeln!(
                out,
                "Week of {} to {}",
                week.start.format("%b %-d"),
                week.end.format("%b %-d")
            )?;
            writeln!(
                out,
                "Completion rate  {:.0}% ({:+.0}% vs previous week)",
                week.completion_rate, week.change_vs_previous
            )?;
            writeln!(out, "Completions      {}", week.total_completions)?;
            writeln!(out, "Time spent       {}", format_minutes(week.total_minutes))?;
            if !week.most_consistent.is_empty() {
                writeln!(out, "\nMost consistent")?;
            }
            for item in &week.most_consistent {
                writeln!(
                    out,
                    "  {:<24} {}/{}  {:.0}%",
                    item.name,
                    item.completions,
                    item.possible,
                    item.rate()
                )?;
            }
        }

        Command::Calendar { month } => {
            let now = store.now().with_timezone(&Local);
            let (year, month) = month.unwrap_or((now.year(), now.month()));
            let grid = month_grid(store.routines(), year, month, &now)
                .ok_or_else(|| AppError::InvalidInput(format!("invalid month {year}-{month}")))?;

            if let Some(first) = grid.iter().find(|day| day.in_month) {
                writeln!(out, "{}", first.date.format("%B %Y"))?;
            }
            writeln!(out, " Su  Mo  Tu  We  Th  Fr  Sa")?;
            for week in grid.chunks(7) {
                let row: String = week
                    .iter()
                    .map(|day| {
                        if !day.in_month {
                            return "    ".to_string();
                        }
                        let mark = match (day.is_today, day.completions.is_empty()) {
                            (true, _) => '<',
                            (false, false) => '*',
                            (false, true) => ' ',
                        };
                        format!(" {:>2}{mark}", day.date.day())
                    })
                    .collect();
                writeln!(out, "{}", row.trim_end())?;
            }

            let busy: Vec<_> = grid
                .iter()
                .filter(|day| day.in_month && !day.completions.is_empty())
                .collect();
            if !busy.is_empty() {
                writeln!(out)?;
            }
            for day in busy {
                writeln!(
                    out,
                    "  {}  {}",
                    day.date.format("%a %b %-d"),
                    day.completions.join(", ")
                )?;
            }
        }

        Command::Timeline => {
            let groups = group_by_month(timeline(store.routines()), &Local);
            if groups.is_empty() {
                writeln!(out, "Nothing logged yet.")?;
            }
            for (label, entries) in groups {
                writeln!(out, "{label}")?;
                for entry in entries {
                    writeln!(out, "  {}", entry_line(entry.routine_name, entry.event))?;
                }
            }
        }

        Command::Gallery { routine } => {
            let routine_id = routine
                .map(|query| resolve_id(store.routines(), &query).map(|r| r.id.clone()))
                .transpose()?;
            let photos = gallery(store.routines(), routine_id.as_deref());
            if photos.is_empty() {
                writeln!(out, "No photos yet.")?;
            }
            for entry in photos {
                let size = entry.event.photo.as_ref().map_or(0, |p| p.len());
                writeln!(
                    out,
                    "  {}  #{} [{} KB image]",
                    entry_line(entry.routine_name, entry.event),
                    entry.index,
                    size.div_ceil(1024)
                )?;
            }
        }
    }

    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn display_name<B: KvBackend, C: Clock>(store: &RoutineStore<B, C>, id: &str) -> String {
    store
        .get(id)
        .map_or_else(|| id.to_string(), |r| r.name.clone())
}

fn entry_line(name: &str, event: &CompletionEvent) -> String {
    let mut line = format!(
        "{}  {name}",
        event.date.with_timezone(&Local).format("%a %b %-d")
    );
    if let Some(minutes) = event.duration_minutes {
        line.push_str(&format!("  {}", format_minutes(minutes)));
    }
    if let Some(note) = &event.note {
        line.push_str(&format!("  \"{note}\""));
    }
    line
}

fn write_details<B, C, W>(out: &mut W, store: &RoutineStore<B, C>, routine: &Routine) -> Result<()>
where
    B: KvBackend,
    C: Clock,
    W: Write,
{
    let status = store.status(routine);
    let season = store.season();

    writeln!(out, "{}  ({})", routine.name, routine.id)?;
    writeln!(
        out,
        "  Status    {}, {}",
        status.status.label(),
        status.timing_label()
    )?;
    write!(out, "  Cadence   every {} days", routine.cadence_days)?;
    let effective = effective_cadence(routine, season);
    if effective != routine.cadence_days {
        write!(out, " ({} in {})", effective, season.label())?;
    }
    writeln!(out)?;
    if let Some(overrides) = &routine.cadence_by_season {
        for (season, days) in overrides {
            writeln!(out, "            {}: {} days", season.label(), days)?;
        }
    }
    writeln!(out, "  Friction  {}", routine.friction.label())?;
    if !routine.tags.is_empty() {
        writeln!(out, "  Tags      {}", routine.tags.join(", "))?;
    }
    if let Some(link) = &routine.link {
        writeln!(out, "  Link      {link}")?;
    }
    if let Some(until) = routine.skipped_until.filter(|u| *u > store.now()) {
        writeln!(
            out,
            "  Skipped   until {}",
            until.with_timezone(&Local).format("%a %b %-d")
        )?;
    }
    if routine.is_archived {
        writeln!(out, "  Idle")?;
    }

    writeln!(out, "\nHistory ({})", routine.history.len())?;
    for (index, event) in routine.history.iter().enumerate() {
        let photo = if event.photo.is_some() { "  [photo]" } else { "" };
        writeln!(out, "  #{index:<3} {}{photo}", entry_line(&routine.name, event))?;
    }
    Ok(())
}

fn read_photo(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading photo {}", path.display()))?;
    Ok(data.trim().to_string())
}
