use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::{App, InputMode, View};

/// Render the top status bar: package identity, match progress, job state.
pub fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let panel_bg = ratatui::style::Style::default().bg(styles::PANEL);
    let mut spans: Vec<Span> = vec![Span::styled(
        " lcr ",
        ratatui::style::Style::default()
            .fg(styles::BG)
            .bg(styles::BLUE)
            .add_modifier(ratatui::style::Modifier::BOLD),
    )];

    match app.view {
        View::Report => {
            spans.push(Span::styled(
                format!(" package #{}", app.package_id),
                styles::header_style(),
            ));
            let total = app.navigator.fires().len();
            let open = app.navigator.active_count();
            spans.push(Span::styled(
                format!("  {open}/{total} matches open"),
                styles::dim_style(),
            ));
            if app.reindex_pending {
                spans.push(Span::styled("  reindexing…", styles::warning_style()));
            }
        }
        View::Table => {
            spans.push(Span::styled(" open reviews", styles::header_style()));
            spans.push(Span::styled(
                format!("  {} rows", app.table.rows.len()),
                styles::dim_style(),
            ));
        }
    }

    let bar = Paragraph::new(Line::from(spans)).style(panel_bg);
    f.render_widget(bar, area);
}

/// Render the bottom bar: the glob prompt while typing, key hints otherwise.
pub fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let panel_bg = ratatui::style::Style::default().bg(styles::PANEL);

    if app.input_mode == InputMode::Glob {
        let prompt = Paragraph::new(Line::from(vec![
            Span::styled(" Ignore glob: ", styles::header_style()),
            Span::styled(app.glob_input.clone(), styles::default_style()),
            Span::styled("▏", styles::header_style()),
        ]))
        .style(panel_bg);
        f.render_widget(prompt, area);
        return;
    }

    let hints: &[(&str, &str)] = match app.view {
        View::Report => &[
            ("n", "next match"),
            ("i", "ignore"),
            ("d", "non-license"),
            ("p", "pattern"),
            ("R", "reindex"),
            ("g", "glob"),
            ("o", "fold file"),
            ("[/]", "±line"),
            ("{/}", "top/bottom"),
            ("(/)", "±match"),
            ("q", "quit"),
        ],
        View::Table => &[
            ("j/k", "move"),
            ("enter", "detail"),
            ("1-8", "sort"),
            ("r", "reload"),
            ("q", "quit"),
        ],
    };

    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!("{key} "), styles::key_hint_style()));
        spans.push(Span::styled(format!("{label}  "), styles::dim_style()));
    }
    let bar = Paragraph::new(Line::from(spans)).style(panel_bg);
    f.render_widget(bar, area);
}

/// Transient notification in the top-right corner.
pub fn render_notification(f: &mut Frame, area: Rect, message: &str) {
    let notif_width = message.chars().count() as u16 + 4;
    let notif_x = area.x + area.width.saturating_sub(notif_width + 2);
    let notif_y = area.y + 2;

    let notif_area = Rect {
        x: notif_x,
        y: notif_y,
        width: notif_width.min(area.width),
        height: 1,
    };

    let notif = Paragraph::new(Line::from(vec![
        Span::styled(" ● ", ratatui::style::Style::default().fg(styles::GREEN)),
        Span::styled(
            message.to_string(),
            ratatui::style::Style::default().fg(styles::TEXT),
        ),
        Span::raw(" "),
    ]))
    .style(
        ratatui::style::Style::default()
            .bg(styles::PANEL)
            .fg(styles::TEXT),
    );

    f.render_widget(notif, notif_area);
}
