//! Category tree
//!
//! The backend returns categories as a nested tree. The table view and the
//! category picker both want a flat, depth-first list, so the tree is
//! flattened on fetch with an indented display name per row.

use super::registry::get_resource;
use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::cache::{CachedValue, QueryCache, QueryKey, QueryOutcome};
use serde_json::Value;
use std::sync::Arc;

/// One selectable category in the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChoice {
    pub id: String,
    pub name: String,
    pub depth: usize,
}

impl CategoryChoice {
    /// Label with tree indentation, e.g. `"  └ Green Tea"`.
    pub fn label(&self) -> String {
        indent_name(&self.name, self.depth)
    }
}

/// Fetch the category tree and cache it as a flattened collection.
pub async fn fetch_categories(
    client: &ApiClient,
    cache: &QueryCache,
) -> Result<QueryOutcome, Arc<ApiError>> {
    let def = get_resource("categories")
        .ok_or_else(|| Arc::new(ApiError::bad_shape("categories resource not defined")))?;

    let key = QueryKey::new("categories");
    let url = client.collection_url(&def.path, &[]);
    let client = client.clone();
    cache
        .ensure_fetched(&key, def.ttl(), move || async move {
            let data = client.get_data(&url).await?;
            let Some(roots) = data.get("items").and_then(Value::as_array) else {
                return Err(ApiError::bad_shape("category tree missing 'items' array"));
            };
            let flat = flatten_tree(roots);
            let total = flat.len() as u64;
            Ok(CachedValue::Collection { items: flat, total })
        })
        .await
}

/// Flatten a category tree depth-first, annotating each row with its depth
/// and an indented display name. Children are consumed into the flat list.
pub fn flatten_tree(roots: &[Value]) -> Vec<Value> {
    let mut flat = Vec::new();
    for root in roots {
        flatten_node(root, 0, &mut flat);
    }
    flat
}

fn flatten_node(node: &Value, depth: usize, out: &mut Vec<Value>) {
    let mut row = node.clone();
    let children = row
        .as_object_mut()
        .and_then(|map| map.remove("children"))
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default();

    if let Value::Object(ref mut map) = row {
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string();
        map.insert("depth".to_string(), Value::from(depth));
        map.insert(
            "name_indented".to_string(),
            Value::String(indent_name(&name, depth)),
        );
    }
    out.push(row);

    for child in &children {
        flatten_node(child, depth + 1, out);
    }
}

/// Choices for the category picker, derived from flattened rows.
pub fn category_choices(rows: &[Value]) -> Vec<CategoryChoice> {
    rows.iter()
        .filter_map(|row| {
            let id = row.get("id").and_then(Value::as_str)?.to_string();
            let name = row.get("name").and_then(Value::as_str)?.to_string();
            let depth = row.get("depth").and_then(Value::as_u64).unwrap_or(0) as usize;
            Some(CategoryChoice { id, name, depth })
        })
        .collect()
}

fn indent_name(name: &str, depth: usize) -> String {
    if depth == 0 {
        name.to_string()
    } else {
        format!("{}└ {}", "  ".repeat(depth), name)
    }
}
