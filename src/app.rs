//! Application State
//!
//! Central application state management for tshop.

use crate::api::client::{ApiClient, MutationOp};
use crate::api::error::format_api_error;
use crate::api::translate;
use crate::cache::{CacheSource, QueryCache};
use crate::config::Config;
use crate::mutation::MutationDispatcher;
use crate::notification::NotificationManager;
use crate::resource::categories::{category_choices, fetch_categories, CategoryChoice};
use crate::resource::fetcher::{
    extract_json_value, fetch_collection, fetch_entity, resource_path, ResourceFilter,
};
use crate::resource::registry::{get_all_resource_keys, get_resource, ActionDef, ResourceDef};
use crate::route::{self, Route, RouteOutcome, TermsKind};
use anyhow::Result;
use crossterm::event::KeyCode;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::time::Instant;

// =========================================================================
// Configuration Constants
// =========================================================================

/// Default viewport height (updated during render based on terminal size)
const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

/// Rows requested per page
const PER_PAGE: u32 = 50;

/// Maximum redirects to follow when resolving a route
const MAX_REDIRECTS: usize = 4;

/// Application modes
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,        // Viewing list
    Command,       // : command input
    Help,          // ? help popup
    Confirm,       // Confirmation dialog
    Warning,       // Warning/info dialog (OK only)
    Categories,    // Category picker
    Statuses,      // Status picker
    Describe,      // Viewing JSON details of selected item
    Terms,         // Terms-and-conditions page
    Notifications, // Notifications history panel
    ColumnConfig,  // Column visibility configuration
}

/// State for column configuration overlay
#[derive(Debug, Clone)]
pub struct ColumnConfigState {
    pub columns: Vec<ColumnConfigItem>,
    pub selected: usize,
}

/// Single column configuration item
#[derive(Debug, Clone)]
pub struct ColumnConfigItem {
    pub header: String,
    pub visible: bool,
}

/// Action awaiting confirmation
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub action: ActionDef,
    pub resource_ids: Vec<String>,
    pub message: String,
    pub destructive: bool,
    pub selected_yes: bool,
}

/// Parent context for hierarchical navigation (e.g. vendor -> payouts)
#[derive(Debug, Clone)]
pub struct ParentContext {
    pub resource_key: String,
    pub item: Value,
    pub display_name: String,
}

impl ParentContext {
    pub fn id(&self) -> Option<String> {
        let def = get_resource(&self.resource_key)?;
        let id = extract_json_value(&self.item, &def.id_field);
        (id != "-").then_some(id)
    }
}

/// Page-number pagination state
#[derive(Debug, Clone)]
pub struct PaginationState {
    pub page: u32,
    pub total: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self { page: 1, total: 0 }
    }
}

impl PaginationState {
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(PER_PAGE) < self.total
    }

    pub fn page_count(&self) -> u32 {
        (self.total.div_ceil(u64::from(PER_PAGE)).max(1)) as u32
    }
}

/// Main application state
pub struct App {
    // Backend access
    pub client: ApiClient,
    pub cache: QueryCache,
    pub dispatcher: MutationDispatcher,

    // Current resource being viewed
    pub current_resource_key: String,

    // Dynamic data storage (JSON)
    pub items: Vec<Value>,
    pub filtered_items: Vec<Value>,

    // Provenance of the current items, for the table title
    pub cache_source: Option<CacheSource>,
    pub fetched_at: Option<Instant>,

    // Navigation state
    pub selected: usize,
    pub mode: Mode,
    pub filter_text: String,
    pub filter_active: bool,

    // Hierarchical navigation
    pub parent_context: Option<ParentContext>,
    pub navigation_stack: Vec<ParentContext>,

    // Command input
    pub command_text: String,
    pub command_suggestions: Vec<String>,
    pub command_suggestion_selected: usize,
    pub command_preview: Option<String>,

    // Category picker
    pub categories: Vec<CategoryChoice>,
    pub categories_filtered: Vec<CategoryChoice>,
    pub categories_selected: usize,
    pub categories_search_text: String,
    pub active_category: Option<CategoryChoice>,

    // Status picker
    pub statuses_filtered: Vec<String>,
    pub statuses_selected: usize,
    pub active_status: Option<String>,

    // Sorting
    pub sort_column: Option<usize>,
    pub sort_ascending: bool,

    // Confirmation
    pub pending_action: Option<PendingAction>,

    // UI state
    pub loading: bool,
    pub error_message: Option<String>,
    pub describe_scroll: usize,
    pub describe_data: Option<Value>,

    // Terms page
    pub terms_kind: TermsKind,
    pub terms_data: Option<Value>,

    // Session label translations (source -> translated)
    pub translations: HashMap<String, String>,

    // Persistent configuration
    pub config: Config,

    // Key press tracking (gg, etc.)
    pub last_key_press: Option<(KeyCode, Instant)>,

    // Read-only mode
    pub readonly: bool,

    // Warning message
    pub warning_message: Option<String>,

    // Pagination
    pub pagination: PaginationState,

    // Notifications
    pub notification_manager: NotificationManager,
    pub notifications_selected: usize,

    // Virtual scrolling
    pub viewport_height: usize,
    pub scroll_offset: usize,

    // Multi-selection (bulk actions)
    pub selected_indices: HashSet<usize>,
    pub visual_mode: bool,

    // Column configuration state
    pub column_config_state: Option<ColumnConfigState>,
}

impl App {
    pub fn new(client: ApiClient, config: Config, readonly: bool) -> Self {
        let cache = QueryCache::new();
        let dispatcher = MutationDispatcher::new(client.clone(), cache.clone());
        let initial_resource = config
            .last_resource
            .clone()
            .filter(|key| get_resource(key).is_some_and(|def| def.parent.is_none()))
            .unwrap_or_else(|| "products".to_string());
        let mut notification_manager = NotificationManager::new();
        notification_manager.detail_level = config.notification_detail_level();

        Self {
            client,
            cache,
            dispatcher,
            current_resource_key: initial_resource,
            items: Vec::new(),
            filtered_items: Vec::new(),
            cache_source: None,
            fetched_at: None,
            selected: 0,
            mode: Mode::Normal,
            filter_text: String::new(),
            filter_active: false,
            parent_context: None,
            navigation_stack: Vec::new(),
            command_text: String::new(),
            command_suggestions: Vec::new(),
            command_suggestion_selected: 0,
            command_preview: None,
            categories: Vec::new(),
            categories_filtered: Vec::new(),
            categories_selected: 0,
            categories_search_text: String::new(),
            active_category: None,
            statuses_filtered: Vec::new(),
            statuses_selected: 0,
            active_status: None,
            sort_column: None,
            sort_ascending: true,
            pending_action: None,
            loading: false,
            error_message: None,
            describe_scroll: 0,
            describe_data: None,
            terms_kind: TermsKind::General,
            terms_data: None,
            translations: HashMap::new(),
            config,
            last_key_press: None,
            readonly,
            warning_message: None,
            pagination: PaginationState::default(),
            notification_manager,
            notifications_selected: 0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            scroll_offset: 0,
            selected_indices: HashSet::new(),
            visual_mode: false,
            column_config_state: None,
        }
    }

    // =========================================================================
    // Resource Definition Access
    // =========================================================================

    pub fn current_resource(&self) -> Option<&'static ResourceDef> {
        get_resource(&self.current_resource_key)
    }

    /// Display label for a string, using the session translations if any
    pub fn label<'a>(&'a self, source: &'a str) -> &'a str {
        self.translations.get(source).map(String::as_str).unwrap_or(source)
    }

    pub fn get_available_commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = get_all_resource_keys()
            .iter()
            .map(|s| s.to_string())
            .collect();

        commands.push("categories".to_string());
        commands.push("statuses".to_string());
        commands.push("notifications".to_string());
        commands.push("notifications clear".to_string());
        commands.push("columns".to_string());
        commands.push("refresh".to_string());
        commands.push("terms".to_string());
        commands.push("back".to_string());

        // Add aliases
        for alias in self.config.aliases.keys() {
            if !commands.contains(alias) {
                commands.push(alias.clone());
            }
        }

        commands.sort();
        commands
    }

    // =========================================================================
    // Data Fetching
    // =========================================================================

    fn active_filters(&self) -> Vec<ResourceFilter> {
        let mut filters = Vec::new();
        if let Some(status) = &self.active_status {
            filters.push(ResourceFilter::new("status", status));
        }
        if let Some(category) = &self.active_category {
            filters.push(ResourceFilter::new("category", &category.id));
        }
        filters
    }

    pub async fn refresh_current(&mut self) -> Result<()> {
        if self.current_resource().is_none() {
            self.error_message = Some(format!("Unknown resource: {}", self.current_resource_key));
            return Ok(());
        }

        self.loading = true;
        self.error_message = None;

        let parent_id = self.parent_context.as_ref().and_then(ParentContext::id);
        let result = if self.current_resource_key == "categories" {
            fetch_categories(&self.client, &self.cache).await
        } else {
            fetch_collection(
                &self.client,
                &self.cache,
                &self.current_resource_key,
                parent_id.as_deref(),
                &self.active_filters(),
                self.pagination.page,
                PER_PAGE,
            )
            .await
        };

        match result {
            Ok(outcome) => {
                let prev_selected = self.selected;
                self.items = outcome.data.items().to_vec();
                self.pagination.total = outcome.data.total();
                self.cache_source = Some(outcome.source);
                self.fetched_at = Some(outcome.fetched_at);
                self.apply_filter();

                if prev_selected < self.filtered_items.len() {
                    self.selected = prev_selected;
                } else {
                    self.selected = 0;
                }
            }
            Err(e) => {
                self.error_message = Some(format_api_error(&e));
                self.items.clear();
                self.filtered_items.clear();
                self.selected = 0;
                self.cache_source = None;
                self.fetched_at = None;
                self.pagination = PaginationState::default();
            }
        }

        self.loading = false;
        Ok(())
    }

    /// Force a refetch of the current query
    pub async fn force_refresh(&mut self) -> Result<()> {
        self.cache.invalidate(&self.current_resource_key);
        self.refresh_current().await
    }

    pub async fn next_page(&mut self) -> Result<()> {
        if !self.pagination.has_more() {
            return Ok(());
        }
        self.pagination.page += 1;
        self.refresh_current().await
    }

    pub async fn prev_page(&mut self) -> Result<()> {
        if self.pagination.page <= 1 {
            return Ok(());
        }
        self.pagination.page -= 1;
        self.refresh_current().await
    }

    pub fn reset_pagination(&mut self) {
        self.pagination = PaginationState::default();
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    pub fn apply_filter(&mut self) {
        let filter = self.filter_text.to_lowercase();

        if filter.is_empty() {
            self.filtered_items = self.items.clone();
        } else {
            let resource = self.current_resource();
            self.filtered_items = self
                .items
                .iter()
                .filter(|item| {
                    if let Some(res) = resource {
                        // Search ALL columns, not just name/id
                        res.columns.iter().any(|col| {
                            let value = extract_json_value(item, &col.json_path).to_lowercase();
                            value.contains(&filter)
                        })
                    } else {
                        item.to_string().to_lowercase().contains(&filter)
                    }
                })
                .cloned()
                .collect();
        }

        if self.selected >= self.filtered_items.len() && !self.filtered_items.is_empty() {
            self.selected = self.filtered_items.len() - 1;
        }

        // Selection indices become invalid when the row set changes
        self.selected_indices.clear();
        self.scroll_offset = 0;

        if self.sort_column.is_some() {
            self.apply_sort();
        }
    }

    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
        self.apply_filter();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn selected_item(&self) -> Option<&Value> {
        self.filtered_items.get(self.selected)
    }

    pub fn selected_item_json(&self) -> Option<String> {
        if let Some(ref data) = self.describe_data {
            return Some(serde_json::to_string_pretty(data).unwrap_or_default());
        }
        self.selected_item()
            .map(|item| serde_json::to_string_pretty(item).unwrap_or_default())
    }

    pub fn describe_line_count(&self) -> usize {
        self.selected_item_json()
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    pub fn describe_scroll_to_bottom(&mut self, visible_lines: usize) {
        let total = self.describe_line_count();
        self.describe_scroll = total.saturating_sub(visible_lines);
    }

    pub fn next(&mut self) {
        match self.mode {
            Mode::Categories => {
                if !self.categories_filtered.is_empty() {
                    self.categories_selected =
                        (self.categories_selected + 1).min(self.categories_filtered.len() - 1);
                }
            }
            Mode::Statuses => {
                if !self.statuses_filtered.is_empty() {
                    self.statuses_selected =
                        (self.statuses_selected + 1).min(self.statuses_filtered.len() - 1);
                }
            }
            _ => {
                if !self.filtered_items.is_empty() {
                    self.selected = (self.selected + 1).min(self.filtered_items.len() - 1);
                }
            }
        }
    }

    pub fn previous(&mut self) {
        match self.mode {
            Mode::Categories => {
                self.categories_selected = self.categories_selected.saturating_sub(1);
            }
            Mode::Statuses => {
                self.statuses_selected = self.statuses_selected.saturating_sub(1);
            }
            _ => {
                self.selected = self.selected.saturating_sub(1);
            }
        }
    }

    pub fn go_to_top(&mut self) {
        match self.mode {
            Mode::Categories => self.categories_selected = 0,
            Mode::Statuses => self.statuses_selected = 0,
            _ => self.selected = 0,
        }
    }

    pub fn go_to_bottom(&mut self) {
        match self.mode {
            Mode::Categories => {
                if !self.categories_filtered.is_empty() {
                    self.categories_selected = self.categories_filtered.len() - 1;
                }
            }
            Mode::Statuses => {
                if !self.statuses_filtered.is_empty() {
                    self.statuses_selected = self.statuses_filtered.len() - 1;
                }
            }
            _ => {
                if !self.filtered_items.is_empty() {
                    self.selected = self.filtered_items.len() - 1;
                }
            }
        }
    }

    pub fn page_down(&mut self, page_size: usize) {
        if !self.filtered_items.is_empty() {
            self.selected = (self.selected + page_size).min(self.filtered_items.len() - 1);
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_text.clear();
        self.command_suggestions = self.get_available_commands();
        self.command_suggestion_selected = 0;
        self.command_preview = None;
    }

    pub fn update_command_suggestions(&mut self) {
        let input = self.command_text.to_lowercase();
        let all_commands = self.get_available_commands();

        if input.is_empty() {
            self.command_suggestions = all_commands;
        } else {
            self.command_suggestions = all_commands
                .into_iter()
                .filter(|cmd| cmd.contains(&input))
                .collect();
        }

        if self.command_suggestion_selected >= self.command_suggestions.len() {
            self.command_suggestion_selected = 0;
        }

        self.update_preview();
    }

    fn update_preview(&mut self) {
        self.command_preview = self
            .command_suggestions
            .get(self.command_suggestion_selected)
            .cloned();
    }

    pub fn next_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            self.command_suggestion_selected =
                (self.command_suggestion_selected + 1) % self.command_suggestions.len();
            self.update_preview();
        }
    }

    pub fn prev_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            if self.command_suggestion_selected == 0 {
                self.command_suggestion_selected = self.command_suggestions.len() - 1;
            } else {
                self.command_suggestion_selected -= 1;
            }
            self.update_preview();
        }
    }

    pub fn apply_suggestion(&mut self) {
        if let Some(preview) = &self.command_preview {
            self.command_text = preview.clone();
            self.update_command_suggestions();
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    /// Show full details for the selected item, fetching the individual
    /// record so detail-only fields are present.
    pub async fn enter_describe_mode(&mut self) -> Result<()> {
        let Some(item) = self.selected_item().cloned() else {
            return Ok(());
        };
        let Some(def) = self.current_resource() else {
            return Ok(());
        };

        self.mode = Mode::Describe;
        self.describe_scroll = 0;
        self.describe_data = Some(item.clone());

        // Nested resources have no /{resource}/{id} endpoint of their own
        if def.parent.is_some() {
            return Ok(());
        }

        let id = extract_json_value(&item, &def.id_field);
        if id == "-" {
            return Ok(());
        }

        match fetch_entity(&self.client, &self.cache, &self.current_resource_key, &id).await {
            Ok(outcome) => {
                if let crate::cache::CachedValue::Entity(record) = outcome.data {
                    self.describe_data = Some(record);
                }
            }
            Err(e) => {
                // Keep showing the row data; surface the error
                self.error_message = Some(format_api_error(&e));
            }
        }
        Ok(())
    }

    pub fn enter_confirm_mode(&mut self, pending: PendingAction) {
        self.pending_action = Some(pending);
        self.mode = Mode::Confirm;
    }

    pub fn show_warning(&mut self, message: &str) {
        self.warning_message = Some(message.to_string());
        self.mode = Mode::Warning;
    }

    /// Build a pending action for the selection (single or bulk)
    pub fn create_pending_action(&self, action: &ActionDef) -> Option<PendingAction> {
        let resource_def = self.current_resource()?;
        let ids = self.action_target_ids();
        if ids.is_empty() {
            return None;
        }

        let config = action.get_confirm_config().unwrap_or_default();
        let target = if ids.len() == 1 {
            let name = self
                .selected_item()
                .map(|item| extract_json_value(item, &resource_def.name_field))
                .filter(|n| n != "-" && !n.is_empty());
            format!("'{}'", name.unwrap_or_else(|| ids[0].clone()))
        } else {
            format!("{} records", ids.len())
        };

        let message = config
            .message
            .unwrap_or_else(|| format!("{}?", action.display_name));

        Some(PendingAction {
            action: action.clone(),
            resource_ids: ids,
            message: format!("{} ({})", message, target),
            destructive: config.destructive,
            selected_yes: config.default_yes,
        })
    }

    /// Target ids for an action: the multi-selection if any, otherwise the
    /// highlighted row.
    pub fn action_target_ids(&self) -> Vec<String> {
        let Some(def) = self.current_resource() else {
            return Vec::new();
        };

        let indices: Vec<usize> = if self.selected_indices.is_empty() {
            vec![self.selected]
        } else {
            let mut sorted: Vec<usize> = self.selected_indices.iter().copied().collect();
            sorted.sort_unstable();
            sorted
        };

        indices
            .into_iter()
            .filter_map(|idx| self.filtered_items.get(idx))
            .map(|item| extract_json_value(item, &def.id_field))
            .filter(|id| id != "-" && !id.is_empty())
            .collect()
    }

    pub async fn enter_categories_mode(&mut self) -> Result<()> {
        match fetch_categories(&self.client, &self.cache).await {
            Ok(outcome) => {
                self.categories = category_choices(outcome.data.items());
                self.categories_search_text.clear();
                self.categories_filtered = self.categories.clone();
                self.categories_selected = self
                    .active_category
                    .as_ref()
                    .and_then(|active| {
                        self.categories_filtered.iter().position(|c| c.id == active.id)
                    })
                    .unwrap_or(0);
                self.mode = Mode::Categories;
            }
            Err(e) => {
                self.error_message = Some(format_api_error(&e));
            }
        }
        Ok(())
    }

    pub fn enter_statuses_mode(&mut self) {
        let Some(def) = self.current_resource() else {
            return;
        };
        if def.statuses.is_empty() {
            self.error_message = Some(format!(
                "{} has no status filter",
                def.display_name
            ));
            return;
        }
        self.statuses_filtered = def.statuses.clone();
        self.statuses_selected = self
            .active_status
            .as_ref()
            .and_then(|active| self.statuses_filtered.iter().position(|s| s == active))
            .unwrap_or(0);
        self.mode = Mode::Statuses;
    }

    pub fn enter_notifications_mode(&mut self) {
        self.notifications_selected = 0;
        self.mode = Mode::Notifications;
    }

    pub fn enter_column_config_mode(&mut self) {
        let Some(resource) = self.current_resource() else {
            return;
        };

        let columns: Vec<ColumnConfigItem> = resource
            .columns
            .iter()
            .map(|col| ColumnConfigItem {
                header: col.header.clone(),
                visible: !self
                    .config
                    .is_column_hidden(&self.current_resource_key, &col.header),
            })
            .collect();

        self.column_config_state = Some(ColumnConfigState {
            columns,
            selected: 0,
        });
        self.mode = Mode::ColumnConfig;
    }

    /// Toggle visibility of the selected column in column config mode
    pub fn toggle_column_visibility(&mut self) {
        if let Some(ref mut state) = self.column_config_state {
            let visible_count = state.columns.iter().filter(|c| c.visible).count();
            let selected_idx = state.selected;

            if let Some(col) = state.columns.get_mut(selected_idx) {
                // The last visible column cannot be hidden
                if col.visible && visible_count <= 1 {
                    return;
                }
                col.visible = !col.visible;
            }
        }
    }

    /// Apply column configuration and save to config
    pub fn apply_column_config(&mut self) {
        if let Some(state) = self.column_config_state.take() {
            let resource = self.current_resource_key.clone();
            for col in &state.columns {
                let hidden = self.config.is_column_hidden(&resource, &col.header);
                if hidden == col.visible {
                    self.config.toggle_column(&resource, &col.header);
                }
            }
            if let Err(e) = self.config.save() {
                tracing::warn!("Failed to save column config: {}", e);
            }
        }
        self.mode = Mode::Normal;
    }

    /// Cancel column config without saving
    pub fn cancel_column_config(&mut self) {
        self.column_config_state = None;
        self.mode = Mode::Normal;
    }

    // =========================================================================
    // Picker Filtering
    // =========================================================================

    pub fn apply_categories_filter(&mut self) {
        let filter = self.categories_search_text.to_lowercase();
        if filter.is_empty() {
            self.categories_filtered = self.categories.clone();
        } else {
            self.categories_filtered = self
                .categories
                .iter()
                .filter(|c| c.name.to_lowercase().contains(&filter))
                .cloned()
                .collect();
        }
        if self.categories_selected >= self.categories_filtered.len() {
            self.categories_selected = 0;
        }
    }

    /// Apply the category highlighted in the picker and refetch
    pub async fn select_category(&mut self) -> Result<()> {
        if let Some(choice) = self.categories_filtered.get(self.categories_selected) {
            self.active_category = Some(choice.clone());
            self.reset_pagination();
            self.exit_mode();
            self.refresh_current().await?;
        } else {
            self.exit_mode();
        }
        Ok(())
    }

    pub async fn clear_category(&mut self) -> Result<()> {
        if self.active_category.take().is_some() {
            self.reset_pagination();
            self.refresh_current().await?;
        }
        Ok(())
    }

    /// Apply the status highlighted in the picker and refetch
    pub async fn select_status(&mut self) -> Result<()> {
        if let Some(status) = self.statuses_filtered.get(self.statuses_selected) {
            self.active_status = Some(status.clone());
            self.reset_pagination();
            self.exit_mode();
            self.refresh_current().await?;
        } else {
            self.exit_mode();
        }
        Ok(())
    }

    pub async fn clear_status(&mut self) -> Result<()> {
        if self.active_status.take().is_some() {
            self.reset_pagination();
            self.refresh_current().await?;
        }
        Ok(())
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Run a registry action against the given records. Optimistic actions
    /// update cached rows immediately and roll back on failure; everything
    /// else invalidates and refetches after the backend confirms.
    pub async fn dispatch_action(&mut self, action: ActionDef, ids: Vec<String>) -> Result<()> {
        let Some(def) = self.current_resource() else {
            return Ok(());
        };
        let resource_key = self.current_resource_key.clone();
        let parent_id = self.parent_context.as_ref().and_then(ParentContext::id);
        let path = match resource_path(def, parent_id.as_deref()) {
            Ok(path) => path,
            Err(e) => {
                self.error_message = Some(format_api_error(&e));
                return Ok(());
            }
        };
        let id_field = def.id_field.clone();

        for id in ids {
            let notif_id = self.notification_manager.create_notification(
                action.display_name.clone(),
                resource_key.clone(),
                id.clone(),
            );

            let op = match action.op.as_str() {
                "delete" => MutationOp::Delete { id: id.clone() },
                _ => MutationOp::Update { id: id.clone() },
            };
            let payload = action.payload.clone();

            let result = if action.optimistic {
                let edits = action
                    .optimistic_edits()
                    .cloned()
                    .unwrap_or_default();
                let target_id = id.clone();
                let id_field = id_field.clone();
                self.dispatcher
                    .run_optimistic(&resource_key, &path, op, payload, move |_, data| {
                        if let crate::cache::CachedValue::Collection { items, .. } = data {
                            for item in items.iter_mut() {
                                let matches = item
                                    .get(&id_field)
                                    .and_then(Value::as_str)
                                    .is_some_and(|v| v == target_id);
                                if matches {
                                    if let Some(map) = item.as_object_mut() {
                                        for (field, value) in &edits {
                                            map.insert(field.clone(), value.clone());
                                        }
                                    }
                                }
                            }
                        }
                    })
                    .await
            } else {
                self.dispatcher
                    .run(&resource_key, &path, op, payload)
                    .await
            };

            match result {
                Ok(_) => self.notification_manager.mark_success(notif_id),
                Err(e) => {
                    let message = format_api_error(&e);
                    self.notification_manager.mark_error(notif_id, message.clone());
                    self.error_message = Some(message);
                }
            }
        }

        self.clear_selection();
        self.refresh_current().await
    }

    /// Run the confirmed pending action
    pub async fn execute_pending_action(&mut self) -> Result<()> {
        let Some(pending) = self.pending_action.take() else {
            return Ok(());
        };
        self.exit_mode();
        self.dispatch_action(pending.action, pending.resource_ids).await
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    pub fn sort_by_column(&mut self, column_index: usize) {
        if self.sort_column == Some(column_index) {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_column = Some(column_index);
            self.sort_ascending = true;
        }
        self.apply_sort();
    }

    pub fn apply_sort(&mut self) {
        let Some(col_idx) = self.sort_column else {
            return;
        };
        let Some(resource) = self.current_resource() else {
            return;
        };
        let Some(column) = resource.columns.get(col_idx) else {
            return;
        };

        let json_path = column.json_path.clone();
        let ascending = self.sort_ascending;

        self.filtered_items.sort_by(|a, b| {
            let val_a = extract_json_value(a, &json_path);
            let val_b = extract_json_value(b, &json_path);

            // Try numeric comparison first
            let cmp = match (val_a.parse::<f64>(), val_b.parse::<f64>()) {
                (Ok(na), Ok(nb)) => na.partial_cmp(&nb).unwrap_or(std::cmp::Ordering::Equal),
                _ => val_a.cmp(&val_b),
            };

            if ascending {
                cmp
            } else {
                cmp.reverse()
            }
        });
    }

    pub fn clear_sort(&mut self) {
        self.sort_column = None;
        self.apply_filter(); // Re-apply filter to restore original order
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
        self.pending_action = None;
        self.describe_data = None;
        self.terms_data = None;
    }

    // =========================================================================
    // Resource Navigation
    // =========================================================================

    pub async fn navigate_to_resource(&mut self, resource_key: &str) -> Result<()> {
        if get_resource(resource_key).is_none() {
            self.error_message = Some(format!("Unknown resource: {}", resource_key));
            return Ok(());
        }

        self.parent_context = None;
        self.navigation_stack.clear();
        self.current_resource_key = resource_key.to_string();
        self.selected = 0;
        self.filter_text.clear();
        self.filter_active = false;
        self.active_status = None;
        self.mode = Mode::Normal;
        self.selected_indices.clear();
        self.visual_mode = false;
        self.scroll_offset = 0;
        self.sort_column = None;
        if resource_key != "products" {
            self.active_category = None;
        }

        if let Err(e) = self.config.set_last_resource(resource_key) {
            tracing::warn!("Failed to save last resource: {}", e);
        }

        self.reset_pagination();
        self.refresh_current().await?;
        Ok(())
    }

    pub async fn navigate_to_sub_resource(&mut self, sub_resource_key: &str) -> Result<()> {
        let Some(selected_item) = self.selected_item().cloned() else {
            return Ok(());
        };
        let Some(current_resource) = self.current_resource() else {
            return Ok(());
        };

        let is_valid = current_resource
            .sub_resources
            .iter()
            .any(|s| s.resource_key == sub_resource_key);

        if !is_valid {
            self.error_message = Some(format!(
                "{} is not a sub-resource of {}",
                sub_resource_key, self.current_resource_key
            ));
            return Ok(());
        }

        let display_name = extract_json_value(&selected_item, &current_resource.name_field);
        let id = extract_json_value(&selected_item, &current_resource.id_field);
        let display = if display_name != "-" { display_name } else { id };

        if let Some(ctx) = self.parent_context.take() {
            self.navigation_stack.push(ctx);
        }

        self.parent_context = Some(ParentContext {
            resource_key: self.current_resource_key.clone(),
            item: selected_item,
            display_name: display,
        });

        self.current_resource_key = sub_resource_key.to_string();
        self.selected = 0;
        self.filter_text.clear();
        self.filter_active = false;
        self.active_status = None;
        self.selected_indices.clear();
        self.visual_mode = false;
        self.scroll_offset = 0;
        self.sort_column = None;

        self.reset_pagination();
        self.refresh_current().await?;
        Ok(())
    }

    pub async fn navigate_back(&mut self) -> Result<()> {
        if let Some(parent) = self.parent_context.take() {
            self.parent_context = self.navigation_stack.pop();
            self.current_resource_key = parent.resource_key;
            self.selected = 0;
            self.filter_text.clear();
            self.filter_active = false;
            self.selected_indices.clear();
            self.visual_mode = false;
            self.scroll_offset = 0;

            self.reset_pagination();
            self.refresh_current().await?;
        }
        Ok(())
    }

    pub fn get_breadcrumb(&self) -> Vec<String> {
        let mut path = Vec::new();

        for ctx in &self.navigation_stack {
            path.push(format!("{}:{}", ctx.resource_key, ctx.display_name));
        }
        if let Some(ctx) = &self.parent_context {
            path.push(format!("{}:{}", ctx.resource_key, ctx.display_name));
        }
        path.push(self.current_resource_key.clone());
        path
    }

    // =========================================================================
    // Routes
    // =========================================================================

    /// Resolve a storefront-style path and navigate to the matching view.
    /// Redirects are followed before anything is fetched.
    pub async fn open_route(&mut self, path: &str) -> Result<()> {
        let mut current = path.to_string();
        for _ in 0..=MAX_REDIRECTS {
            match route::resolve(&current) {
                RouteOutcome::Redirect(target) => {
                    tracing::debug!("route {} redirects to {}", current, target);
                    current = target;
                }
                RouteOutcome::Show(route) => {
                    return self.show_route(route).await;
                }
            }
        }
        self.error_message = Some(format!("Route redirect loop: {}", path));
        Ok(())
    }

    async fn show_route(&mut self, route: Route) -> Result<()> {
        match route {
            Route::Home => self.navigate_to_resource("products").await,
            Route::Products { category } => {
                self.navigate_to_resource("products").await?;
                if let Some(id) = category {
                    self.active_category = Some(CategoryChoice {
                        name: id.clone(),
                        id,
                        depth: 0,
                    });
                    self.reset_pagination();
                    self.refresh_current().await?;
                }
                Ok(())
            }
            Route::ProductDetail { id } => {
                self.navigate_to_resource("products").await?;
                self.show_entity("products", &id).await
            }
            Route::Cart => {
                // No cart of its own here; pending orders are the closest view
                self.navigate_to_resource("orders").await?;
                self.active_status = Some("pending".to_string());
                self.reset_pagination();
                self.refresh_current().await
            }
            Route::Payment { order_id } => {
                self.navigate_to_resource("orders").await?;
                self.show_entity("orders", &order_id).await
            }
            Route::Terms { kind } => self.open_terms(kind).await,
            Route::Resource { key } => self.navigate_to_resource(&key).await,
        }
    }

    async fn show_entity(&mut self, resource_key: &str, id: &str) -> Result<()> {
        match fetch_entity(&self.client, &self.cache, resource_key, id).await {
            Ok(outcome) => {
                if let crate::cache::CachedValue::Entity(record) = outcome.data {
                    self.describe_data = Some(record);
                    self.describe_scroll = 0;
                    self.mode = Mode::Describe;
                }
            }
            Err(e) => {
                self.error_message = Some(format_api_error(&e));
            }
        }
        Ok(())
    }

    /// Fetch and display a terms page variant
    pub async fn open_terms(&mut self, kind: TermsKind) -> Result<()> {
        match self.client.fetch_terms(kind.as_param()).await {
            Ok(data) => {
                self.terms_kind = kind;
                self.terms_data = Some(data);
                self.describe_scroll = 0;
                self.mode = Mode::Terms;
            }
            Err(e) => {
                self.error_message = Some(format_api_error(&e));
            }
        }
        Ok(())
    }

    /// Plain-text body of the loaded terms page
    pub fn terms_text(&self) -> Option<String> {
        let data = self.terms_data.as_ref()?;
        data.get("content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(serde_json::to_string_pretty(data).unwrap_or_default()))
    }

    // =========================================================================
    // Translation
    // =========================================================================

    /// Translate column headers and resource names for this session
    pub async fn translate_labels(&mut self, target_lang: &str) -> Result<()> {
        let mut texts: HashSet<String> = HashSet::new();
        for key in get_all_resource_keys() {
            if let Some(def) = get_resource(key) {
                texts.insert(def.display_name.clone());
                for col in &def.columns {
                    texts.insert(col.header.clone());
                }
            }
        }
        let texts: Vec<String> = texts.into_iter().collect();

        match translate::translate(&self.client, &texts, target_lang).await {
            Ok(map) => {
                let count = map.len();
                self.translations = map;
                self.show_warning(&format!("Translated {} labels to {}", count, target_lang));
            }
            Err(e) => {
                self.error_message = Some(format_api_error(&e));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    pub async fn execute_command(&mut self) -> Result<bool> {
        let command_text = if self.command_text.is_empty() {
            self.command_preview.clone().unwrap_or_default()
        } else if let Some(preview) = &self.command_preview {
            if preview.contains(&self.command_text) {
                preview.clone()
            } else {
                self.command_text.clone()
            }
        } else {
            self.command_text.clone()
        };

        let parts: Vec<&str> = command_text.split_whitespace().collect();

        if parts.is_empty() {
            return Ok(false);
        }

        let cmd = parts[0];

        match cmd {
            "q" | "quit" => return Ok(true),
            "back" => {
                self.navigate_back().await?;
            }
            "refresh" => {
                self.mode = Mode::Normal;
                self.force_refresh().await?;
            }
            "categories" => {
                self.enter_categories_mode().await?;
            }
            "category" if parts.len() > 1 && parts[1] == "clear" => {
                self.mode = Mode::Normal;
                self.clear_category().await?;
            }
            "statuses" => {
                self.enter_statuses_mode();
            }
            "status" if parts.len() > 1 => {
                self.mode = Mode::Normal;
                if parts[1] == "clear" {
                    self.clear_status().await?;
                } else {
                    self.active_status = Some(parts[1].to_string());
                    self.reset_pagination();
                    self.refresh_current().await?;
                }
            }
            "notifications" => {
                if parts.len() > 1 && parts[1] == "clear" {
                    self.notification_manager.clear();
                    self.mode = Mode::Normal;
                } else {
                    self.enter_notifications_mode();
                }
            }
            "columns" => {
                self.enter_column_config_mode();
            }
            "open" if parts.len() > 1 => {
                self.open_route(parts[1]).await?;
            }
            "terms" => {
                let kind = TermsKind::from_param(parts.get(1).copied());
                self.open_terms(kind).await?;
            }
            "translate" if parts.len() > 1 => {
                self.translate_labels(parts[1]).await?;
            }
            "alias" if parts.len() >= 3 => {
                // :alias <alias> <resource_key>
                let alias = parts[1];
                let resource_key = parts[2];
                if get_resource(resource_key).is_some() {
                    if let Err(e) = self.config.set_alias(alias, resource_key) {
                        self.error_message = Some(format!("Failed to save alias: {}", e));
                    } else {
                        self.mode = Mode::Normal;
                    }
                } else {
                    self.error_message = Some(format!("Unknown resource: {}", resource_key));
                }
            }
            _ => {
                let resolved_cmd = self.config.resolve_alias(cmd).to_string();

                if get_resource(&resolved_cmd).is_some() {
                    let is_sub = self
                        .current_resource()
                        .map(|resource| {
                            resource
                                .sub_resources
                                .iter()
                                .any(|s| s.resource_key == resolved_cmd)
                        })
                        .unwrap_or(false);
                    if is_sub && self.selected_item().is_some() {
                        self.navigate_to_sub_resource(&resolved_cmd).await?;
                    } else {
                        self.navigate_to_resource(&resolved_cmd).await?;
                    }
                } else {
                    self.error_message = Some(format!("Unknown command: {}", cmd));
                }
            }
        }

        Ok(false)
    }

    // =========================================================================
    // Virtual Scrolling
    // =========================================================================

    /// Update the viewport height (called from UI during render)
    pub fn update_viewport(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    /// Ensure the selected item is visible in the viewport
    pub fn ensure_visible(&mut self) {
        if self.filtered_items.is_empty() {
            self.scroll_offset = 0;
            return;
        }

        let visible_height = self.viewport_height;
        let margin = 2; // Keep cursor at least this far from edge

        if self.selected < self.scroll_offset + margin {
            self.scroll_offset = self.selected.saturating_sub(margin);
        } else if self.selected >= self.scroll_offset + visible_height.saturating_sub(margin) {
            self.scroll_offset = self
                .selected
                .saturating_sub(visible_height.saturating_sub(margin + 1));
        }

        let max_offset = self
            .filtered_items
            .len()
            .saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Get the range of visible items based on scroll offset and viewport
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.scroll_offset;
        let end = (self.scroll_offset + self.viewport_height).min(self.filtered_items.len());
        start..end
    }

    // =========================================================================
    // Multi-Selection (Bulk Actions)
    // =========================================================================

    /// Toggle selection of the current item
    pub fn toggle_selection(&mut self) {
        if self.filtered_items.is_empty() {
            return;
        }
        if self.selected_indices.contains(&self.selected) {
            self.selected_indices.remove(&self.selected);
        } else {
            self.selected_indices.insert(self.selected);
        }
    }

    /// Select all filtered items
    pub fn select_all(&mut self) {
        self.selected_indices = (0..self.filtered_items.len()).collect();
    }

    /// Clear all selections
    pub fn clear_selection(&mut self) {
        self.selected_indices.clear();
        self.visual_mode = false;
    }

    /// Check if an item at the given index is selected
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected_indices.contains(&index)
    }

    /// Get count of selected items
    pub fn selection_count(&self) -> usize {
        self.selected_indices.len()
    }

    /// Toggle visual/multi-select mode
    pub fn toggle_visual_mode(&mut self) {
        self.visual_mode = !self.visual_mode;
    }

    /// Extend selection downward (Shift+J)
    pub fn extend_selection_down(&mut self) {
        if self.filtered_items.is_empty() {
            return;
        }
        self.selected_indices.insert(self.selected);
        if self.selected < self.filtered_items.len() - 1 {
            self.selected += 1;
            self.selected_indices.insert(self.selected);
        }
    }

    /// Extend selection upward (Shift+K)
    pub fn extend_selection_up(&mut self) {
        if self.filtered_items.is_empty() {
            return;
        }
        self.selected_indices.insert(self.selected);
        if self.selected > 0 {
            self.selected -= 1;
            self.selected_indices.insert(self.selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_has_more() {
        let state = PaginationState { page: 1, total: 120 };
        assert!(state.has_more());
        assert_eq!(state.page_count(), 3);

        let state = PaginationState { page: 3, total: 120 };
        assert!(!state.has_more());

        let state = PaginationState::default();
        assert!(!state.has_more());
        assert_eq!(state.page_count(), 1);
    }

    #[test]
    fn test_selection_toggle() {
        let mut selected_indices = HashSet::new();
        let selected = 5;

        if selected_indices.contains(&selected) {
            selected_indices.remove(&selected);
        } else {
            selected_indices.insert(selected);
        }
        assert!(selected_indices.contains(&5));

        if selected_indices.contains(&selected) {
            selected_indices.remove(&selected);
        } else {
            selected_indices.insert(selected);
        }
        assert!(!selected_indices.contains(&5));
    }

    #[test]
    fn test_visible_range_at_end() {
        let filtered_items: Vec<Value> = (0..25).map(|i| serde_json::json!({"id": i})).collect();
        let scroll_offset = 20;
        let viewport_height = 10;

        let start = scroll_offset;
        let end = (scroll_offset + viewport_height).min(filtered_items.len());
        assert_eq!(start..end, 20..25);
    }

    #[test]
    fn test_ensure_visible_logic() {
        let viewport_height: usize = 10;
        let margin: usize = 2;

        // Selected at top, scroll should be 0
        let selected: usize = 0;
        let mut scroll_offset: usize = 5;
        if selected < scroll_offset + margin {
            scroll_offset = selected.saturating_sub(margin);
        }
        assert_eq!(scroll_offset, 0);

        // Selected below viewport, scroll follows
        let selected: usize = 50;
        let mut scroll_offset: usize = 30;
        let filtered_items_len: usize = 100;
        if selected >= scroll_offset + viewport_height.saturating_sub(margin) {
            scroll_offset = selected.saturating_sub(viewport_height.saturating_sub(margin + 1));
        }
        let max_offset = filtered_items_len.saturating_sub(viewport_height);
        scroll_offset = scroll_offset.min(max_offset);
        assert!(selected >= scroll_offset);
        assert!(selected < scroll_offset + viewport_height);
    }
}
