//! Status Picker
//!
//! Status selection overlay for server-side status filtering. The choices
//! come from the current resource definition.

use crate::app::App;
use crate::resource::registry::get_color_for_value;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(40, 50, area);
    f.render_widget(Clear, popup_area);

    let title = format!(" Filter by Status [{}] ", app.statuses_filtered.len());

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

    // Split inner into: help text, separator, list
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Help text
            Constraint::Length(1), // Separator
            Constraint::Min(1),    // Status list
        ])
        .split(inner);

    // Help text
    let help = Line::from(vec![
        Span::styled(" ↑↓", Style::default().fg(Color::Yellow)),
        Span::styled(":nav ", Style::default().fg(Color::DarkGray)),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::styled(":select ", Style::default().fg(Color::DarkGray)),
        Span::styled("Del", Style::default().fg(Color::Yellow)),
        Span::styled(":clear ", Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::styled(":cancel", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(help), chunks[0]);

    // Separator line
    let sep = "─".repeat(chunks[1].width as usize);
    f.render_widget(
        Paragraph::new(sep).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );

    let color_map = app
        .current_resource()
        .and_then(|r| r.columns.iter().find_map(|c| c.color_map.clone()));

    let items: Vec<ListItem> = app
        .statuses_filtered
        .iter()
        .map(|status| {
            let is_active = app.active_status.as_deref() == Some(status.as_str());
            let color = color_map
                .as_ref()
                .and_then(|m| get_color_for_value(m, status))
                .map(|[r, g, b]| Color::Rgb(r, g, b))
                .unwrap_or(Color::White);

            let style = if is_active {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            };
            let prefix = if is_active { "✓ " } else { "  " };
            ListItem::new(Span::styled(format!("{}{}", prefix, status), style))
        })
        .collect();

    let list = List::new(items).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    state.select(Some(app.statuses_selected));

    f.render_stateful_widget(list, chunks[2], &mut state);
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
