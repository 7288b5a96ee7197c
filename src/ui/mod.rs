mod pattern_form;
mod source_view;
mod status_bar;
mod styles;
mod table_view;

use crate::app::{App, View};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

/// Render the entire UI
pub fn draw(f: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // top bar
            Constraint::Min(1),    // main content
            Constraint::Length(1), // bottom bar
        ])
        .split(f.area());

    status_bar::render_top_bar(f, outer[0], app);

    match app.view {
        View::Report => source_view::render(f, outer[1], app),
        View::Table => table_view::render(f, outer[1], app),
    }

    status_bar::render_bottom_bar(f, outer[2], app);

    // Notification overlay
    if let Some(ref msg) = app.status_message {
        status_bar::render_notification(f, f.area(), msg);
    }

    // Pattern dialog on top of everything
    if let Some(ref form) = app.pattern_form {
        pattern_form::render(f, f.area(), form);
    }
}
