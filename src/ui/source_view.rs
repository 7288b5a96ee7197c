use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::styles;
use crate::app::App;
use crate::report::FileContainer;

/// Render the report: file containers with their source excerpts, risk
/// highlights and the current match selection.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(report) = app.report.as_ref() else {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            " Loading report…",
            styles::dim_style(),
        )))
        .style(styles::default_style());
        f.render_widget(placeholder, area);
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    for container in &report.files {
        lines.push(container_header(container));
        if container.collapsed {
            continue;
        }
        for line in &container.lines {
            lines.push(source_line(app, container.file_id, line));
        }
    }

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(app.source_scroll as usize)
        .take(area.height as usize)
        .collect();

    let mut view = Paragraph::new(visible).style(styles::default_style());
    if app.config.display.wrap_lines {
        view = view.wrap(Wrap { trim: false });
    }
    f.render_widget(view, area);
}

fn container_header(container: &FileContainer) -> Line<'static> {
    let marker = if container.collapsed { "▸" } else { "▾" };
    let title = if container.name.is_empty() {
        format!("file #{}", container.file_id)
    } else {
        container.name.clone()
    };
    let spans = vec![
        Span::styled(format!(" {marker} "), styles::dim_style()),
        Span::styled(title, styles::header_style()),
        Span::styled(
            format!("  [{}–{}]", container.start, container.end),
            styles::dim_style(),
        ),
    ];
    Line::from(spans)
}

fn source_line(app: &App, file_id: i64, line: &crate::report::SourceLine) -> Line<'static> {
    let current = app.navigator.is_current(file_id, line.number);
    let gutter_style = if current {
        styles::current_match_style()
    } else {
        styles::dim_style()
    };
    let text_style = if current {
        styles::current_match_style()
    } else if line.risk {
        styles::risk_style()
    } else {
        styles::default_style()
    };
    let marker = if line.fire { "▌" } else { " " };

    let mut spans = Vec::with_capacity(3);
    if app.config.display.line_numbers {
        spans.push(Span::styled(format!("{:>6} ", line.number), gutter_style));
    }
    spans.push(Span::styled(
        marker.to_string(),
        if line.fire {
            ratatui::style::Style::default().fg(styles::RED)
        } else {
            styles::dim_style()
        },
    ));
    spans.push(Span::styled(line.text.clone(), text_style));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppEvent;
    use crate::config::LcrConfig;
    use std::sync::mpsc;

    fn make_app() -> App {
        let (tx, _rx) = mpsc::channel::<AppEvent>();
        App::new(LcrConfig::default(), Some(42), tx).unwrap()
    }

    fn make_line() -> crate::report::SourceLine {
        crate::report::SourceLine {
            number: 7,
            text: "license text".to_string(),
            hash: None,
            snippet: None,
            risk: false,
            fire: false,
        }
    }

    #[test]
    fn gutter_shows_line_number_by_default() {
        let app = make_app();
        let line = source_line(&app, 1, &make_line());
        assert_eq!(line.spans[0].content.as_ref(), "     7 ");
    }

    #[test]
    fn gutter_hidden_when_line_numbers_off() {
        let mut app = make_app();
        app.config.display.line_numbers = false;
        let line = source_line(&app, 1, &make_line());
        assert!(!line
            .spans
            .iter()
            .any(|span| span.content.contains('7')));
        assert_eq!(line.spans.last().unwrap().content.as_ref(), "license text");
    }
}
