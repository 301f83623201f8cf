//! Column Configuration Overlay
//!
//! Show/hide columns for the current resource. Each row shows the header,
//! the JSON path it reads from, and its width so the table layout is
//! predictable before applying.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(54, 60, area);
    f.render_widget(Clear, popup_area);

    let resource = app.current_resource();
    let resource_name = resource
        .map(|r| r.display_name.as_str())
        .unwrap_or("Resource");

    let title = format!(" Columns: {} ", resource_name);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Help text
            Constraint::Length(1), // Separator
            Constraint::Min(1),    // Column list
        ])
        .split(inner);

    let help = Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::styled(":nav ", Style::default().fg(Color::DarkGray)),
        Span::styled("Space", Style::default().fg(Color::Yellow)),
        Span::styled(":toggle ", Style::default().fg(Color::DarkGray)),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::styled(":apply ", Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::styled(":cancel", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(help), chunks[0]);

    let sep = "─".repeat(chunks[1].width as usize);
    f.render_widget(
        Paragraph::new(sep).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );

    let Some(ref state) = app.column_config_state else {
        return;
    };

    // At least one column has to stay visible
    let visible_count = state.columns.iter().filter(|c| c.visible).count();

    let items: Vec<ListItem> = state
        .columns
        .iter()
        .map(|col| {
            let checkbox = if col.visible { "[x]" } else { "[ ]" };

            let checkbox_style = if col.visible {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let text_style = if col.visible {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            // Registry detail for this column, shown dimmed
            let detail = resource
                .and_then(|r| r.columns.iter().find(|c| c.header == col.header))
                .map(|c| format!("  {} (w{})", c.json_path, c.width))
                .unwrap_or_default();

            let trailer = if col.visible && visible_count == 1 {
                Span::styled(" (required)", Style::default().fg(Color::Yellow))
            } else {
                Span::styled(detail, Style::default().fg(Color::DarkGray))
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", checkbox), checkbox_style),
                Span::styled(format!("{:<12}", col.header), text_style),
                trailer,
            ]))
        })
        .collect();

    let list = List::new(items).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));

    f.render_stateful_widget(list, chunks[2], &mut list_state);
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
