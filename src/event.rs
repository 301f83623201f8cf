//! Event Handling
//!
//! Keyboard and event handling for tshop.

use crate::app::{App, Mode};
use crate::resource::registry::ActionDef;
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::time::Duration;

/// Handle events, returns true if app should quit
pub async fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            return handle_key_event(app, key.code, key.modifiers).await;
        }
    }
    Ok(false)
}

async fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers).await,
        Mode::Command => handle_command_mode(app, code, modifiers).await,
        Mode::Help => handle_help_mode(app, code),
        Mode::Confirm => handle_confirm_mode(app, code).await,
        Mode::Warning => handle_warning_mode(app, code),
        Mode::Categories => handle_categories_mode(app, code, modifiers).await,
        Mode::Statuses => handle_statuses_mode(app, code).await,
        Mode::Describe | Mode::Terms => handle_describe_mode(app, code, modifiers),
        Mode::Notifications => handle_notifications_mode(app, code),
        Mode::ColumnConfig => handle_column_config_mode(app, code),
    }
}

async fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Double-g goes to top, vim style
    if code == KeyCode::Char('g') {
        if let Some((KeyCode::Char('g'), time)) = app.last_key_press {
            if time.elapsed() < Duration::from_millis(1000) {
                app.go_to_top();
                app.last_key_press = None;
                return Ok(false);
            }
        }
        app.last_key_press = Some((code, std::time::Instant::now()));
        return Ok(false);
    }

    // Clear last key press for non-g keys
    app.last_key_press = None;

    // Handle filter input first
    if app.filter_active {
        match code {
            KeyCode::Esc => {
                app.clear_filter();
            }
            KeyCode::Enter => {
                app.filter_active = false;
            }
            KeyCode::Backspace => {
                app.filter_text.pop();
                app.apply_filter();
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.filter_text.push(c);
                app.apply_filter();
            }
            _ => {}
        }
        return Ok(false);
    }

    match code {
        // Quit
        KeyCode::Char('q') => return Ok(true),

        // Navigation - vim style + accessible alternatives
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Home => app.go_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.go_to_bottom(),
        KeyCode::PageDown => app.page_down(10),
        KeyCode::PageUp => app.page_up(10),

        // Ctrl+D/U for page navigation
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_down(10);
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_up(10);
        }

        // Multi-selection
        KeyCode::Char(' ') => app.toggle_selection(),
        KeyCode::Char('v') => app.toggle_visual_mode(),
        KeyCode::Char('J') => app.extend_selection_down(),
        KeyCode::Char('K') => app.extend_selection_up(),
        KeyCode::Char('*') => app.select_all(),
        KeyCode::Esc => app.clear_selection(),

        // Quick jump to position 1-9
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c.to_digit(10).unwrap() as usize - 1;
            if idx < app.filtered_items.len() {
                app.selected = idx;
            }
        }

        // Sorting with F1-F6
        KeyCode::F(n @ 1..=6) => {
            app.sort_by_column((n - 1) as usize);
        }
        // Clear sort with F12
        KeyCode::F(12) => {
            app.clear_sort();
        }

        // Pagination
        KeyCode::Char(']') => {
            app.next_page().await?;
        }
        KeyCode::Char('[') => {
            app.prev_page().await?;
        }

        // Refresh (bypasses the cache)
        KeyCode::Char('R') => {
            app.reset_pagination();
            app.sort_column = None;
            app.force_refresh().await?;
        }

        // Describe/Enter
        KeyCode::Enter | KeyCode::Char('d') => {
            app.enter_describe_mode().await?;
        }

        // Filter
        KeyCode::Char('/') => {
            app.filter_active = true;
        }

        // Command mode
        KeyCode::Char(':') => {
            app.enter_command_mode();
        }

        // Help
        KeyCode::Char('?') => {
            app.enter_help_mode();
        }

        // Back navigation
        KeyCode::Backspace | KeyCode::Left | KeyCode::Char('b') => {
            if app.parent_context.is_some() {
                app.navigate_back().await?;
            }
        }

        // Category picker
        KeyCode::Char('c') => {
            app.enter_categories_mode().await?;
        }

        // Status picker
        KeyCode::Char('s') => {
            app.enter_statuses_mode();
        }

        // Notifications panel
        KeyCode::Char('N') => {
            app.enter_notifications_mode();
        }

        // Delete action with the Delete key
        KeyCode::Delete => {
            if let Some(resource) = app.current_resource() {
                if let Some(action_def) = resource.actions.iter().find(|a| a.op == "delete") {
                    let action = action_def.clone();
                    handle_action(app, &action).await?;
                }
            }
        }

        // Sub-resource and action shortcuts
        KeyCode::Char(c) => {
            if let Some(resource) = app.current_resource() {
                let sub = resource
                    .sub_resources
                    .iter()
                    .find(|s| s.shortcut == c.to_string());

                if let Some(sub_def) = sub {
                    if app.selected_item().is_some() {
                        let key = sub_def.resource_key.clone();
                        app.navigate_to_sub_resource(&key).await?;
                        return Ok(false);
                    }
                }

                if let Some(action_def) = resource.action_by_shortcut(&c.to_string()) {
                    let action = action_def.clone();
                    handle_action(app, &action).await?;
                    return Ok(false);
                }
            }
        }

        _ => {}
    }

    Ok(false)
}

async fn handle_action(app: &mut App, action_def: &ActionDef) -> Result<()> {
    if app.readonly {
        app.show_warning("Read-only mode: actions are disabled");
        return Ok(());
    }

    let ids = app.action_target_ids();
    if ids.is_empty() {
        return Ok(());
    }

    if action_def.requires_confirm() || ids.len() > 1 {
        if let Some(pending) = app.create_pending_action(action_def) {
            app.enter_confirm_mode(pending);
        }
    } else {
        app.dispatch_action(action_def.clone(), ids).await?;
    }

    Ok(())
}

async fn handle_command_mode(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.exit_mode();
        }
        KeyCode::Enter => {
            let should_quit = app.execute_command().await?;
            if app.mode == Mode::Command {
                app.exit_mode();
            }
            return Ok(should_quit);
        }
        KeyCode::Backspace => {
            app.command_text.pop();
            app.update_command_suggestions();
        }
        KeyCode::Tab | KeyCode::Right => {
            app.apply_suggestion();
        }
        KeyCode::Down => {
            app.next_suggestion();
        }
        KeyCode::Up => {
            app.prev_suggestion();
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_text.push(c);
            app.update_command_suggestions();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
            app.exit_mode();
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_confirm_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
            app.exit_mode();
        }
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = true;
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = false;
            }
        }
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
            let confirmed = code != KeyCode::Enter
                || app
                    .pending_action
                    .as_ref()
                    .is_some_and(|p| p.selected_yes);
            if confirmed {
                app.execute_pending_action().await?;
            } else {
                app.exit_mode();
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_warning_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Enter => {
            app.warning_message = None;
            app.exit_mode();
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_categories_mode(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.exit_mode();
        }
        KeyCode::Enter => {
            app.select_category().await?;
        }
        KeyCode::Delete => {
            app.exit_mode();
            app.clear_category().await?;
        }
        KeyCode::Down => app.next(),
        KeyCode::Up => app.previous(),
        KeyCode::Home => app.go_to_top(),
        KeyCode::End => app.go_to_bottom(),
        KeyCode::Backspace => {
            app.categories_search_text.pop();
            app.apply_categories_filter();
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.categories_search_text.push(c);
            app.apply_categories_filter();
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_statuses_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.exit_mode();
        }
        KeyCode::Enter => {
            app.select_status().await?;
        }
        KeyCode::Delete => {
            app.exit_mode();
            app.clear_status().await?;
        }
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Home => app.go_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.go_to_bottom(),
        _ => {}
    }
    Ok(false)
}

fn handle_describe_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
            app.exit_mode();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.describe_scroll = app.describe_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.describe_scroll = app.describe_scroll.saturating_sub(1);
        }
        KeyCode::PageDown => {
            app.describe_scroll = app.describe_scroll.saturating_add(10);
        }
        KeyCode::PageUp => {
            app.describe_scroll = app.describe_scroll.saturating_sub(10);
        }
        KeyCode::Char('d') => {
            if modifiers.contains(KeyModifiers::CONTROL) {
                app.describe_scroll = app.describe_scroll.saturating_add(10);
            } else {
                app.exit_mode();
            }
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.describe_scroll = app.describe_scroll.saturating_sub(10);
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.describe_scroll = 0;
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.describe_scroll_to_bottom(30); // Approximate visible lines
        }
        _ => {}
    }
    Ok(false)
}

fn handle_notifications_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('N') => {
            app.exit_mode();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let count = app.notification_manager.notifications.len();
            if count > 0 {
                app.notifications_selected = (app.notifications_selected + 1).min(count - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.notifications_selected = app.notifications_selected.saturating_sub(1);
        }
        KeyCode::Char('C') => {
            app.notification_manager.clear();
            app.notifications_selected = 0;
        }
        _ => {}
    }
    Ok(false)
}

fn handle_column_config_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.cancel_column_config();
        }
        KeyCode::Enter => {
            app.apply_column_config();
        }
        KeyCode::Char(' ') => {
            app.toggle_column_visibility();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(ref mut state) = app.column_config_state {
                if !state.columns.is_empty() {
                    state.selected = (state.selected + 1).min(state.columns.len() - 1);
                }
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(ref mut state) = app.column_config_state {
                state.selected = state.selected.saturating_sub(1);
            }
        }
        _ => {}
    }
    Ok(false)
}
