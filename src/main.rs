mod api;
mod app;
mod config;
mod report;
mod review;
mod ui;

use anyhow::Result;
use app::{App, AppEvent, Continuation, InputMode, View};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use review::ExtendAction;
use std::io;
use std::sync::mpsc;
use std::time::Duration;

/// Terminal UI for reviewing license matches
#[derive(Parser)]
#[command(name = "lcr", version, about)]
struct Cli {
    /// Package id to review (omit for the open-reviews table)
    package: Option<i64>,

    /// Review server base URL (overrides config)
    #[arg(long)]
    server: Option<String>,

    /// Open the reviews table even when a package id is given
    #[arg(long)]
    open: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut lcr_config = config::load_config(".");
    if let Some(server) = cli.server {
        lcr_config.server.url = server;
    }

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let package = if cli.open { None } else { cli.package };
    let mut app = App::new(lcr_config, package, tx)?;

    // Kick off the initial load before the first draw
    match app.view {
        View::Report => app.load_report(),
        View::Table => app.load_reviews(),
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let result = run_app(&mut terminal, &mut app, rx);

    // Cleanup
    app.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    loop {
        // Draw
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for key events with a timeout (lets us drain worker events too)
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match &app.input_mode {
                    InputMode::Pattern => handle_pattern_input(app, key),
                    InputMode::Glob => handle_glob_input(app, key),
                    InputMode::Normal => handle_normal_input(app, key),
                }
            }
        }

        // Worker results (non-blocking)
        while let Ok(event) = rx.try_recv() {
            app.handle_event(event);
        }

        app.tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    // Quit works everywhere in normal mode
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        _ => {}
    }

    match app.view {
        View::Report => handle_report_input(app, key),
        View::Table => handle_table_input(app, key),
    }
}

fn handle_report_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') | KeyCode::Char(' ') => app.advance(),
        KeyCode::Char('i') => app.ignore_current(),
        KeyCode::Char('d') => app.declassify_current(),
        KeyCode::Char('p') => app.open_pattern_form(),
        KeyCode::Char('R') => app.start_reindex(),
        KeyCode::Char('g') => app.open_glob_input(),
        KeyCode::Char('r') => app.load_report(),
        KeyCode::Char('o') => {
            if let Some(fire) = app.navigator.current() {
                let file_id = fire.file_id;
                app.toggle_container(file_id);
            }
        }
        // Excerpt extension
        KeyCode::Char('[') => app.extend_excerpt(ExtendAction::OneLineAbove),
        KeyCode::Char(']') => app.extend_excerpt(ExtendAction::OneLineBelow),
        KeyCode::Char('{') => app.extend_excerpt(ExtendAction::Top),
        KeyCode::Char('}') => app.extend_excerpt(ExtendAction::Bottom),
        KeyCode::Char('(') => app.extend_excerpt(ExtendAction::MatchAbove),
        KeyCode::Char(')') => app.extend_excerpt(ExtendAction::MatchBelow),
        // Manual scrolling
        KeyCode::Char('j') | KeyCode::Down => {
            app.source_scroll = app.source_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.source_scroll = app.source_scroll.saturating_sub(1);
        }
        KeyCode::PageDown => {
            app.source_scroll = app.source_scroll.saturating_add(20);
        }
        KeyCode::PageUp => {
            app.source_scroll = app.source_scroll.saturating_sub(20);
        }
        _ => {}
    }
}

fn handle_table_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.table.next_row(),
        KeyCode::Char('k') | KeyCode::Up => app.table.prev_row(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_detail(),
        KeyCode::Char('r') => app.load_reviews(),
        KeyCode::Char(c @ '1'..='8') => {
            let idx = c as usize - '1' as usize;
            app.sort_table(idx);
        }
        _ => {}
    }
}

fn handle_pattern_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_pattern_form(),
        KeyCode::Enter => app.submit_pattern(Continuation::Continue),
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.submit_pattern(Continuation::Reindex);
        }
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = app.pattern_form.as_mut() {
                form.focus_next();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(form) = app.pattern_form.as_mut() {
                form.focus_prev();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = app.pattern_form.as_mut() {
                if form.license_focused() {
                    form.license.pop();
                }
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.pattern_form.as_mut() {
                if form.license_focused() {
                    form.license.push(c);
                } else if c == ' ' {
                    form.toggle_focused();
                }
            }
        }
        _ => {}
    }
}

fn handle_glob_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.glob_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.submit_glob(),
        KeyCode::Backspace => {
            app.glob_input.pop();
        }
        KeyCode::Char(c) => app.glob_input.push(c),
        _ => {}
    }
}
