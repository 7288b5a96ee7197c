use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::App;
use crate::report::{cell_display, fragment::strip_tags, SortDir};

/// Render the open-reviews table with expanded detail panels.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let table = &app.table;

    if table.rows.is_empty() {
        let message = if app.table_loaded {
            table.empty_message()
        } else {
            "Loading reviews…"
        };
        let placeholder = Paragraph::new(Line::from(Span::styled(
            format!(" {message}"),
            styles::header_style(),
        )))
        .style(styles::default_style());
        f.render_widget(placeholder, area);
        return;
    }

    let widths = column_widths(app, area.width as usize);
    let mut lines: Vec<Line> = vec![header_line(app, &widths)];

    for (idx, row) in table.rows.iter().enumerate() {
        let style = if idx == table.selected {
            styles::selected_style()
        } else {
            styles::default_style()
        };
        let mut spans: Vec<Span> = Vec::new();
        for (column, width) in table.columns.iter().zip(&widths) {
            let text = strip_tags(&cell_display(row, *column));
            spans.push(Span::styled(pad(&text, *width), style));
        }
        lines.push(Line::from(spans));

        // Expanded detail panel directly under its row
        if table.is_open(row.id) {
            let detail = table
                .details
                .get(&row.id)
                .map(|body| strip_tags(body))
                .unwrap_or_else(|| "loading…".to_string());
            for detail_line in detail.lines().filter(|l| !l.trim().is_empty()) {
                lines.push(Line::from(Span::styled(
                    format!("    {detail_line}"),
                    styles::dim_style(),
                )));
            }
        }
    }

    let visible: Vec<Line> = lines.into_iter().take(area.height as usize).collect();
    let view = Paragraph::new(visible).style(styles::default_style());
    f.render_widget(view, area);
}

fn header_line(app: &App, widths: &[usize]) -> Line<'static> {
    let (sort_idx, dir) = app.table.sort;
    let mut spans: Vec<Span> = Vec::new();
    for (idx, (column, width)) in app.table.columns.iter().zip(widths).enumerate() {
        let mut title = column.title().to_string();
        if idx == sort_idx {
            title.push(match dir {
                SortDir::Asc => '↑',
                SortDir::Desc => '↓',
            });
        }
        spans.push(Span::styled(pad(&title, *width), styles::header_style()));
    }
    Line::from(spans)
}

/// Fixed widths for the narrow columns, remainder split between link and
/// report.
fn column_widths(app: &App, total: usize) -> Vec<usize> {
    use crate::report::Column;
    let columns = &app.table.columns;
    let mut widths: Vec<usize> = columns
        .iter()
        .map(|c| match c {
            Column::Created => 18,
            Column::State => 12,
            Column::Result | Column::Login | Column::Products => 14,
            Column::Package => 22,
            Column::Link | Column::Report => 0,
        })
        .collect();
    let fixed: usize = widths.iter().sum();
    let flexible = widths.iter().filter(|w| **w == 0).count().max(1);
    let share = total.saturating_sub(fixed).max(flexible * 8) / flexible;
    for width in widths.iter_mut() {
        if *width == 0 {
            *width = share;
        }
    }
    widths
}

fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}
