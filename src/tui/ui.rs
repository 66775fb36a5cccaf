use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, View};
use crate::clock::Clock;
use crate::db::KvBackend;
use crate::insights::{dashboard, format_minutes, weekly_summary};
use crate::models::{FuzzyStatus, Routine, Season};
use crate::schedule::effective_cadence;

const RECENT_HISTORY: usize = 5;

pub fn draw<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>) {
    // Main horizontal split: 1/3 left, 2/3 right
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3), // Left pane: routine list
            Constraint::Ratio(2, 3), // Right pane: details / insights
        ])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Routine list
            Constraint::Length(1), // Status line
        ])
        .split(main_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Routine name / view title
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Message line
        ])
        .split(main_chunks[1]);

    render_header(frame, app, left_chunks[0]);
    render_routine_list(frame, app, left_chunks[1]);
    render_left_status(frame, left_chunks[2]);

    render_title(frame, app, right_chunks[0]);
    match app.view {
        View::Details => render_details(frame, app, right_chunks[1]),
        View::Dashboard => render_dashboard(frame, app, right_chunks[1]),
        View::Weekly => render_weekly(frame, app, right_chunks[1]),
    }
    render_right_status(frame, app, right_chunks[2]);

    if let Some(mode) = app.input_mode {
        render_input(frame, app, mode);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn status_color(status: FuzzyStatus) -> Color {
    match status {
        FuzzyStatus::Fresh => Color::Green,
        FuzzyStatus::Approaching => Color::Yellow,
        FuzzyStatus::Drifted => Color::Red,
    }
}

fn render_header<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>, area: Rect) {
    let season = app.store.season();
    let mut title = format!(" Rhythms [{}]", app.filter.archive.label());
    if let Some(tag) = &app.filter.tag {
        title.push_str(&format!(" #{tag}"));
    }
    if season != Season::Default {
        title.push_str(&format!(" {}", season.label()));
    }
    title.push(' ');

    let shown = app.filtered_routines();
    let drifted = shown
        .iter()
        .filter(|r| app.store.status(r).status == FuzzyStatus::Drifted)
        .count();
    let stats = format!(" {} Rhythms | {} Drifted", shown.len(), drifted);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_routine_list<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>, area: Rect) {
    let items: Vec<ListItem> = app
        .filtered_routines()
        .iter()
        .map(|routine| {
            let status = app.store.status(routine);
            let name_style = if routine.is_archived {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled("● ", Style::default().fg(status_color(status.status))),
                Span::styled(routine.name.clone(), name_style),
                Span::styled(
                    format!("  {}", status.timing_label()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_left_status(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new("j/k:nav  d:done  s:skip  Tab:view  ?:help  q:quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_title<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>, area: Rect) {
    let title = match app.view {
        View::Details => app
            .selected_routine()
            .map(|r| r.name.clone())
            .unwrap_or_else(|| "No rhythm selected".to_string()),
        other => other.label().to_string(),
    };

    let block = Block::default()
        .title(format!(" {} ", app.view.label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(title)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn detail_lines<B: KvBackend, C: Clock>(app: &App<B, C>, routine: &Routine) -> Vec<Line<'static>> {
    let season = app.store.season();
    let status = app.store.status(routine);
    let label = Style::default().fg(Color::Blue);

    let mut cadence = format!("every {} days", routine.cadence_days);
    let effective = effective_cadence(routine, season);
    if effective != routine.cadence_days {
        cadence.push_str(&format!(" ({} in {})", effective, season.label()));
    }

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Status:   ", label),
            Span::styled(
                status.status.label().to_string(),
                Style::default().fg(status_color(status.status)),
            ),
            Span::raw(format!("  {}", status.timing_label())),
        ]),
        Line::from(vec![Span::styled("Cadence:  ", label), Span::raw(cadence)]),
        Line::from(vec![
            Span::styled("Friction: ", label),
            Span::raw(routine.friction.label().to_string()),
        ]),
    ];

    if !routine.tags.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Tags:     ", label),
            Span::raw(routine.tags.join(", ")),
        ]));
    }
    if let Some(link) = &routine.link {
        lines.push(Line::from(vec![
            Span::styled("Link:     ", label),
            Span::raw(link.clone()),
        ]));
    }
    if let Some(until) = routine.skipped_until.filter(|u| *u > app.store.now()) {
        lines.push(Line::from(vec![
            Span::styled("Skipped:  ", label),
            Span::raw(format!(
                "until {}",
                until.with_timezone(&Local).format("%b %-d")
            )),
        ]));
    }
    if routine.is_archived {
        lines.push(Line::from(Span::styled(
            "Idle",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("History ({})", routine.history.len()),
        label.add_modifier(Modifier::BOLD),
    )));
    if routine.history.is_empty() {
        lines.push(Line::from("  Not done yet. Press d when you get to it."));
    }
    for event in routine.history.iter().take(RECENT_HISTORY) {
        let mut text = format!("  {}", event.date.with_timezone(&Local).format("%a %b %-d %Y"));
        if let Some(minutes) = event.duration_minutes {
            text.push_str(&format!("  {}", format_minutes(minutes)));
        }
        if let Some(note) = &event.note {
            text.push_str(&format!("  {note}"));
        }
        if event.photo.is_some() {
            text.push_str("  [photo]");
        }
        lines.push(Line::from(text));
    }

    lines
}

fn render_details<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>, area: Rect) {
    let lines = match app.selected_routine() {
        Some(routine) => detail_lines(app, routine),
        None => vec![Line::from(
            "No rhythms here yet. Add one with `rhythms add <name>`.",
        )],
    };

    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_dashboard<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>, area: Rect) {
    let now = app.store.now().with_timezone(&Local);
    let board = dashboard(
        app.store.routines(),
        &now,
        app.store.season(),
        app.recent_activity_limit,
    );
    let heading = Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(format!(
            "{} due   {} done today   {} active",
            board.due_count, board.completed_today, board.total
        )),
        Line::from(""),
        Line::from(Span::styled("Needs attention", heading)),
    ];
    if board.needs_attention.is_empty() {
        lines.push(Line::from("  All caught up."));
    }
    for item in &board.needs_attention {
        lines.push(Line::from(vec![
            Span::raw(format!("  {}  ", item.routine.name)),
            Span::styled(item.overdue_label(), Style::default().fg(Color::Red)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Recent activity", heading)));
    for entry in &board.recent_activity {
        lines.push(Line::from(format!(
            "  {}  {}",
            entry.event.date.with_timezone(&Local).format("%b %-d"),
            entry.routine_name
        )));
    }

    let block = Block::default()
        .title(" Dashboard ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_weekly<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>, area: Rect) {
    let now = app.store.now().with_timezone(&Local);
    let week = weekly_summary(app.store.routines(), &now, app.store.season(), 0);
    let heading = Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD);

    let change_color = if week.change_vs_previous < 0.0 {
        Color::Red
    } else {
        Color::Green
    };

    let mut lines = vec![
        Line::from(format!(
            "{} to {}",
            week.start.format("%b %-d"),
            week.end.format("%b %-d")
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw(format!("Completion rate  {:.0}%  ", week.completion_rate)),
            Span::styled(
                format!("{:+.0}% vs last week", week.change_vs_previous),
                Style::default().fg(change_color),
            ),
        ]),
        Line::from(format!("Completions      {}", week.total_completions)),
        Line::from(format!("Time spent       {}", format_minutes(week.total_minutes))),
        Line::from(""),
        Line::from(Span::styled("Most consistent", heading)),
    ];
    for item in &week.most_consistent {
        lines.push(Line::from(format!(
            "  {}  {}/{}  {:.0}%",
            item.name,
            item.completions,
            item.possible,
            item.rate()
        )));
    }

    let block = Block::default()
        .title(" This Week ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_right_status<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>, area: Rect) {
    let text = app.message.as_deref().unwrap_or("");
    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_input<B: KvBackend, C: Clock>(frame: &mut Frame, app: &App<B, C>, mode: InputMode) {
    let area = centered_rect(60, 20, frame.area());

    let title = match mode {
        InputMode::SkipDays => " Skip for how many days? (Enter for default) ",
        InputMode::Note => " Log with a note ",
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", app.input);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 70, frame.area());

    let help_text = [
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   < / >    Jump to top / bottom",
        "   Tab      Cycle view",
        "",
        " Actions:",
        "   d        Mark done",
        "   n        Mark done with a note",
        "   s        Skip for a few days",
        "   a        Archive / restore",
        "   X        Delete rhythm",
        "   o        Open link",
        "   f        Cycle active / idle / all",
        "   t        Cycle tag filter",
        "   S        Cycle season",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::db::MemoryKv;
    use crate::models::NewRoutine;
    use crate::store::RoutineStore;
    use crate::test_support::at;

    async fn sample_app() -> App<MemoryKv, ManualClock> {
        let clock = ManualClock::new(at("2026-05-10T08:00:00Z"));
        let mut store = RoutineStore::load(MemoryKv::default(), clock)
            .await
            .expect("load");
        store
            .add(NewRoutine {
                name: "Eyebrow shaping".into(),
                cadence_days: 21,
                ..Default::default()
            })
            .await
            .expect("add");
        App::new(store, &Config::default())
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn renders_every_view() {
        let mut app = sample_app().await;
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("terminal");

        for _ in 0..3 {
            terminal.draw(|frame| draw(frame, &app)).expect("draw");
            app.view = app.view.cycle();
        }

        terminal.draw(|frame| draw(frame, &app)).expect("draw");
        assert!(screen_text(&terminal).contains("Eyebrow shaping"));
    }

    #[tokio::test]
    async fn renders_popups() {
        let mut app = sample_app().await;
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");

        app.input_mode = Some(InputMode::SkipDays);
        app.input = "3".into();
        terminal.draw(|frame| draw(frame, &app)).expect("draw");
        assert!(screen_text(&terminal).contains("Skip for how many days"));

        app.input_mode = None;
        app.show_help = true;
        terminal.draw(|frame| draw(frame, &app)).expect("draw");
        assert!(screen_text(&terminal).contains("Cycle season"));
    }
}
