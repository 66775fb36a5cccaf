use std::io;
use std::time::Duration;

use clap::Parser;
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod app;
mod cli;
mod clock;
mod config;
mod db;
mod error;
mod insights;
mod models;
mod schedule;
mod store;
mod tui;

#[cfg(test)]
mod test_support;

use app::App;
use cli::Cli;
use clock::{Clock, SystemClock};
use config::Config;
use db::{KvBackend, Repository};
use error::Result;
use store::RoutineStore;
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    let repository = Repository::new(&config.db_path).await?;
    let mut store = RoutineStore::load(repository, SystemClock).await?;

    // Subcommands print their result and exit
    if let Some(command) = args.command {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        return cli::run(command, &mut store, &config, &mut out).await;
    }

    let mut app = App::new(store, &config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<T, B, C>(terminal: &mut Terminal<T>, app: &mut App<B, C>) -> Result<()>
where
    T: Backend,
    B: KvBackend,
    C: Clock,
{
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Poll with a timeout so status labels keep up with the clock
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) =
                        handle_key_event(key, app.input_active(), app.show_help)
                    {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
