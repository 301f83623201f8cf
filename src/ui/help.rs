//! Help Overlay
//!
//! Shows keyboard shortcuts and help information.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, _app: &App) {
    let area = f.area();
    let popup_area = centered_rect(70, 80, area);

    f.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Navigation", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  j/k, ↑/↓    ", Style::default().fg(Color::Yellow)),
            Span::raw("Move up/down"),
        ]),
        Line::from(vec![
            Span::styled("  gg / G      ", Style::default().fg(Color::Yellow)),
            Span::raw("Go to top / bottom"),
        ]),
        Line::from(vec![
            Span::styled("  Ctrl+d/u    ", Style::default().fg(Color::Yellow)),
            Span::raw("Half page down/up"),
        ]),
        Line::from(vec![
            Span::styled("  [/]         ", Style::default().fg(Color::Yellow)),
            Span::raw("Previous/next page of results"),
        ]),
        Line::from(vec![
            Span::styled("  1-9         ", Style::default().fg(Color::Yellow)),
            Span::raw("Jump to row by number"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Views", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  Enter/d     ", Style::default().fg(Color::Yellow)),
            Span::raw("View record details"),
        ]),
        Line::from(vec![
            Span::styled("  b/Backspace ", Style::default().fg(Color::Yellow)),
            Span::raw("Go back"),
        ]),
        Line::from(vec![
            Span::styled("  R           ", Style::default().fg(Color::Yellow)),
            Span::raw("Force refresh (bypass cache)"),
        ]),
        Line::from(vec![
            Span::styled("  N           ", Style::default().fg(Color::Yellow)),
            Span::raw("Notifications history"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Filtering", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  /           ", Style::default().fg(Color::Yellow)),
            Span::raw("Filter rows by text"),
        ]),
        Line::from(vec![
            Span::styled("  c           ", Style::default().fg(Color::Yellow)),
            Span::raw("Filter by category"),
        ]),
        Line::from(vec![
            Span::styled("  s           ", Style::default().fg(Color::Yellow)),
            Span::raw("Filter by status"),
        ]),
        Line::from(vec![
            Span::styled("  F1-F6 / F12 ", Style::default().fg(Color::Yellow)),
            Span::raw("Sort by column / clear sort"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Selection", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  Space       ", Style::default().fg(Color::Yellow)),
            Span::raw("Toggle selection"),
        ]),
        Line::from(vec![
            Span::styled("  v / J / K   ", Style::default().fg(Color::Yellow)),
            Span::raw("Visual mode / extend selection"),
        ]),
        Line::from(vec![
            Span::styled("  *           ", Style::default().fg(Color::Yellow)),
            Span::raw("Select all"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Commands", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  :           ", Style::default().fg(Color::Yellow)),
            Span::raw("Command mode (:open, :terms, :translate, :alias, ...)"),
        ]),
        Line::from(vec![
            Span::styled("  :columns    ", Style::default().fg(Color::Yellow)),
            Span::raw("Configure visible columns"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Actions", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  (shortcut)  ", Style::default().fg(Color::Yellow)),
            Span::raw("Run the action shown in the header"),
        ]),
        Line::from(vec![
            Span::styled("  Delete      ", Style::default().fg(Color::Red)),
            Span::raw("Delete record (destructive)"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  ?/Esc       ", Style::default().fg(Color::Yellow)),
            Span::raw("Close help"),
        ]),
        Line::from(vec![
            Span::styled("  q           ", Style::default().fg(Color::Yellow)),
            Span::raw("Quit application"),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(paragraph, popup_area);
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
