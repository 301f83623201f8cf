//! Command Box
//!
//! Command input with autocomplete over resources, aliases, and built-in
//! commands. Suggestions are annotated with what they resolve to.

use crate::app::App;
use crate::resource::registry::get_resource;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

const MAX_VISIBLE_SUGGESTIONS: usize = 8;

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Command box at bottom of screen
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(12)])
        .split(area);

    let command_area = chunks[1];

    f.render_widget(Clear, command_area);

    // Split into input and suggestions
    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(command_area);

    // Input box, with ghost text for the top suggestion
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Command ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let mut spans = vec![Span::styled(":", Style::default().fg(Color::Cyan))];
    match &app.command_preview {
        Some(preview) if app.command_text.is_empty() => {
            spans.push(Span::styled(preview, Style::default().fg(Color::DarkGray)));
        }
        Some(preview) if preview.starts_with(&app.command_text) => {
            spans.push(Span::styled(
                &app.command_text,
                Style::default().fg(Color::White),
            ));
            spans.push(Span::styled(
                &preview[app.command_text.len()..],
                Style::default().fg(Color::DarkGray),
            ));
        }
        _ => {
            spans.push(Span::styled(
                &app.command_text,
                Style::default().fg(Color::White),
            ));
        }
    }

    let input_para = Paragraph::new(Line::from(spans)).block(input_block);
    f.render_widget(input_para, inner_chunks[0]);

    // Suggestions, annotated with what each one resolves to
    let suggestions_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(
                " Suggestions [{}] (↑/↓ select, Tab complete) ",
                app.command_suggestions.len()
            ),
            Style::default().fg(Color::DarkGray),
        ));

    let suggestions: Vec<ListItem> = app
        .command_suggestions
        .iter()
        .enumerate()
        .take(MAX_VISIBLE_SUGGESTIONS)
        .map(|(i, cmd)| {
            let selected = i == app.command_suggestion_selected;
            let style = if selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let annotation_style = if selected {
                style
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {:<16}", cmd), style),
                Span::styled(annotate(app, cmd), annotation_style),
            ]))
        })
        .collect();

    let suggestions_list = List::new(suggestions).block(suggestions_block);
    f.render_widget(suggestions_list, inner_chunks[1]);
}

/// What a suggestion resolves to: a resource listing, an alias, or a
/// built-in command.
fn annotate(app: &App, suggestion: &str) -> String {
    if let Some(target) = app.config.aliases.get(suggestion) {
        return format!("alias → {}", target);
    }
    if let Some(def) = get_resource(suggestion) {
        return format!("list {}", def.display_name);
    }
    match suggestion.split_whitespace().next().unwrap_or(suggestion) {
        "quit" | "q" => "exit tshop".to_string(),
        "back" => "previous view".to_string(),
        "refresh" => "refetch, bypassing cache".to_string(),
        "categories" => "category picker".to_string(),
        "statuses" => "status filter".to_string(),
        "notifications" => "mutation history".to_string(),
        "columns" => "show/hide columns".to_string(),
        "open" => "open a storefront route".to_string(),
        "terms" => "terms & policy pages".to_string(),
        "translate" => "translate labels".to_string(),
        "alias" => "define a shortcut".to_string(),
        _ => String::new(),
    }
}
