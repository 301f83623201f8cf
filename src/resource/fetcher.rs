//! Resource Fetcher
//!
//! Cache-backed fetching of resource collections and single records, driven
//! by the registry definitions. All reads go through the query cache;
//! concurrent reads of the same query share one request.

use super::registry::{get_resource, ResourceDef};
use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::cache::{CachedValue, QueryCache, QueryKey, QueryOutcome};
use serde_json::Value;
use std::sync::Arc;

/// Filter for resources (becomes a query parameter)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    pub param: String,
    pub value: String,
}

impl ResourceFilter {
    pub fn new(param: &str, value: &str) -> Self {
        Self {
            param: param.to_string(),
            value: value.to_string(),
        }
    }
}

/// URL path for a resource, nesting under its parent when required,
/// e.g. `vendors/v-1/payouts`.
pub fn resource_path(def: &ResourceDef, parent_id: Option<&str>) -> Result<String, ApiError> {
    match (&def.parent, parent_id) {
        (None, _) => Ok(def.path.clone()),
        (Some(parent_key), Some(id)) => {
            let parent = get_resource(parent_key).ok_or_else(|| {
                ApiError::bad_shape(format!("unknown parent resource: {}", parent_key))
            })?;
            Ok(format!(
                "{}/{}/{}",
                parent.path,
                urlencoding::encode(id),
                def.path
            ))
        }
        (Some(parent_key), None) => Err(ApiError::bad_shape(format!(
            "{} requires a selected {} record",
            def.display_name, parent_key
        ))),
    }
}

/// Fetch one page of a resource collection through the cache.
pub async fn fetch_collection(
    client: &ApiClient,
    cache: &QueryCache,
    resource_key: &str,
    parent_id: Option<&str>,
    filters: &[ResourceFilter],
    page: u32,
    per_page: u32,
) -> Result<QueryOutcome, Arc<ApiError>> {
    let Some(def) = get_resource(resource_key) else {
        return Err(Arc::new(ApiError::bad_shape(format!(
            "unknown resource: {}",
            resource_key
        ))));
    };

    let mut key = QueryKey::new(resource_key)
        .with_param("page", &page.to_string())
        .with_param("per_page", &per_page.to_string());
    if let Some(id) = parent_id {
        key = key.with_param("parent", id);
    }
    for filter in filters {
        key = key.with_param(&filter.param, &filter.value);
    }

    let path = resource_path(def, parent_id).map_err(Arc::new)?;
    let mut params: Vec<(String, String)> = filters
        .iter()
        .map(|f| (f.param.clone(), f.value.clone()))
        .collect();
    params.push(("page".to_string(), page.to_string()));
    params.push(("per_page".to_string(), per_page.to_string()));

    let url = client.collection_url(&path, &params);
    let client = client.clone();
    cache
        .ensure_fetched(&key, def.ttl(), move || async move {
            let data = client.get_data(&url).await?;
            parse_collection(data)
        })
        .await
}

/// Fetch a single record by id through the cache (404 becomes NotFound).
pub async fn fetch_entity(
    client: &ApiClient,
    cache: &QueryCache,
    resource_key: &str,
    id: &str,
) -> Result<QueryOutcome, Arc<ApiError>> {
    let Some(def) = get_resource(resource_key) else {
        return Err(Arc::new(ApiError::bad_shape(format!(
            "unknown resource: {}",
            resource_key
        ))));
    };

    let key = QueryKey::entity(resource_key, id);
    let client = client.clone();
    let path = def.path.clone();
    let id = id.to_string();
    cache
        .ensure_fetched(&key, def.ttl(), move || async move {
            let record = client.fetch_by_id(&path, &id).await?;
            Ok(CachedValue::Entity(post_process_item(record)))
        })
        .await
}

/// Parse a `{items, total}` collection payload. An empty page is
/// `{"items": [], "total": 0}`, which is valid data, not an error.
fn parse_collection(data: Value) -> Result<CachedValue, ApiError> {
    let Some(obj) = data.as_object() else {
        return Err(ApiError::bad_shape("expected a collection object"));
    };
    let Some(items) = obj.get("items").and_then(Value::as_array) else {
        return Err(ApiError::bad_shape("collection missing 'items' array"));
    };
    let total = obj
        .get("total")
        .and_then(Value::as_u64)
        .unwrap_or(items.len() as u64);

    let items = items
        .iter()
        .cloned()
        .map(post_process_item)
        .collect();

    Ok(CachedValue::Collection { items, total })
}

/// Post-process a record to add computed display fields
fn post_process_item(mut item: Value) -> Value {
    if let Value::Object(ref mut map) = item {
        // Money amounts arrive in cents
        for (cents_field, display_field) in [
            ("price_cents", "price_display"),
            ("total_cents", "total_display"),
            ("amount_cents", "amount_display"),
        ] {
            if let Some(cents) = map.get(cents_field).and_then(Value::as_i64) {
                map.insert(display_field.to_string(), Value::String(format_price(cents)));
            }
        }

        if let Some(pct) = map.get("discount_percent").and_then(Value::as_i64) {
            map.insert(
                "discount_display".to_string(),
                Value::String(format!("-{}%", pct)),
            );
        }

        if let Some(rate) = map.get("rate").and_then(Value::as_f64) {
            map.insert(
                "rate_display".to_string(),
                Value::String(format!("{:.0}%", rate * 100.0)),
            );
        }

        // Shorten timestamps
        for field in ["created_at", "updated_at", "starts_at", "ends_at"] {
            if let Some(ts) = map.get(field).and_then(Value::as_str) {
                let short = format_timestamp_short(ts);
                map.insert(format!("{}_short", field), Value::String(short));
            }
        }

        // Count arrays
        for (array_field, count_field) in
            [("items", "items_count"), ("values", "values_count")]
        {
            if let Some(arr) = map.get(array_field).and_then(Value::as_array) {
                map.insert(
                    count_field.to_string(),
                    Value::String(arr.len().to_string()),
                );
            }
        }

        // Format booleans
        if let Some(visible) = map.get("visible").and_then(Value::as_bool) {
            let display = if visible { "Yes" } else { "No" };
            map.insert(
                "visible_display".to_string(),
                Value::String(display.to_string()),
            );
        }
    }

    item
}

/// Format a cent amount as a currency string, e.g. 1999 -> "$19.99"
fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

/// Format an RFC3339 timestamp to its date part; non-parsing values pass
/// through unchanged.
fn format_timestamp_short(timestamp: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%Y-%m-%d").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = item;

    for part in parts {
        // Handle array index
        if let Ok(idx) = part.parse::<usize>() {
            current = match current.get(idx) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        } else {
            current = match current.get(part) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}
