use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::styles;
use crate::app::PatternForm;
use crate::report::fragment::strip_tags;
use crate::report::links::license_link;

/// Render the pattern-creation dialog as a centered overlay.
pub fn render(f: &mut Frame, area: Rect, form: &PatternForm) {
    let width = (area.width * 3 / 4).clamp(40, 100);
    let height = (form.flags.len() as u16 + 12).min(area.height.saturating_sub(2));
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    f.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Create pattern ")
        .borders(Borders::ALL)
        .border_style(ratatui::style::Style::default().fg(styles::BORDER))
        .style(styles::surface_style());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines: Vec<Line> = Vec::new();

    // License input
    let license_style = if form.license_focused() {
        styles::selected_style()
    } else {
        styles::default_style()
    };
    lines.push(Line::from(vec![
        Span::styled(" License: ", styles::dim_style()),
        Span::styled(
            if form.license.is_empty() && !form.license_focused() {
                strip_tags(&license_link(""))
            } else {
                form.license.clone()
            },
            license_style,
        ),
        Span::styled(
            if form.license_focused() { "▏" } else { "" },
            styles::header_style(),
        ),
    ]));
    lines.push(Line::default());

    // Flag checkboxes
    for (idx, (name, checked)) in form.flags.iter().enumerate() {
        let focused = form.focus == idx + 1;
        lines.push(checkbox_line(name, *checked, focused));
    }
    lines.push(checkbox_line(
        "only match within this package",
        form.local_only,
        form.focus == form.flags.len() + 1,
    ));
    lines.push(Line::default());

    // Pattern text preview
    lines.push(Line::from(Span::styled(" Pattern text:", styles::dim_style())));
    let preview_rows = inner.height.saturating_sub(lines.len() as u16 + 2) as usize;
    for text_line in form.text.lines().take(preview_rows) {
        lines.push(Line::from(Span::styled(
            format!("   {text_line}"),
            styles::default_style(),
        )));
    }

    lines.push(Line::from(vec![
        Span::styled(" Enter ", styles::key_hint_style()),
        Span::styled("save + continue  ", styles::dim_style()),
        Span::styled("^R ", styles::key_hint_style()),
        Span::styled("save + reindex  ", styles::dim_style()),
        Span::styled("Esc ", styles::key_hint_style()),
        Span::styled("cancel", styles::dim_style()),
    ]));

    let body = Paragraph::new(lines).style(styles::surface_style());
    f.render_widget(body, inner);
}

fn checkbox_line(label: &str, checked: bool, focused: bool) -> Line<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    let style = if focused {
        styles::selected_style()
    } else {
        styles::default_style()
    };
    Line::from(vec![
        Span::styled(format!(" {mark} "), style),
        Span::styled(label.to_string(), style),
    ])
}
