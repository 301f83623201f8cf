//! Query keys
//!
//! A query key identifies one cached query result: the resource type plus
//! the filter/pagination parameters of the request. Parameters live in a
//! sorted map so equality is structural and insertion order is irrelevant.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    resource: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    /// Key for an unfiltered collection query.
    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            params: BTreeMap::new(),
        }
    }

    /// Key for a single-entity query.
    pub fn entity(resource: &str, id: &str) -> Self {
        Self::new(resource).with_param("id", id)
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.params.insert(k.into(), v.into());
        }
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Canonical string form, e.g. `vendors?page=1&status=active`.
    /// Deterministic for a given resource + parameter set.
    pub fn canonical(&self) -> String {
        if self.params.is_empty() {
            return self.resource.clone();
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", self.resource, query.join("&"))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_order_irrelevant() {
        let a = QueryKey::new("vendors")
            .with_param("status", "active")
            .with_param("page", "2");
        let b = QueryKey::new("vendors")
            .with_param("page", "2")
            .with_param("status", "active");
        assert_eq!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_canonical_form() {
        let key = QueryKey::new("offers").with_param("status", "live");
        assert_eq!(key.canonical(), "offers?status=live");
        assert_eq!(QueryKey::new("products").canonical(), "products");
    }

    #[test]
    fn test_entity_key_distinct_from_collection() {
        assert_ne!(QueryKey::entity("orders", "o-1"), QueryKey::new("orders"));
        assert_ne!(
            QueryKey::entity("orders", "o-1"),
            QueryKey::entity("orders", "o-2")
        );
    }

    #[test]
    fn test_canonical_starts_with_resource() {
        let key = QueryKey::entity("vendors", "v-1");
        assert!(key.canonical().starts_with("vendors"));
        assert_eq!(key.resource(), "vendors");
    }
}
