//! Cache entry states
//!
//! Per-view loading/error/success is modeled as an explicit state machine so
//! illegal combinations (error and loading at once) are unrepresentable.
//! Loading and Error retain the previous successful payload for
//! stale-while-revalidate reads.

use serde_json::Value;
use std::time::{Duration, Instant};

/// A cached query payload: a filtered collection page or a single entity.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Collection { items: Vec<Value>, total: u64 },
    Entity(Value),
}

impl CachedValue {
    pub fn items(&self) -> &[Value] {
        match self {
            CachedValue::Collection { items, .. } => items,
            CachedValue::Entity(_) => &[],
        }
    }

    pub fn total(&self) -> u64 {
        match self {
            CachedValue::Collection { total, .. } => *total,
            CachedValue::Entity(_) => 1,
        }
    }
}

/// A successful payload with the moment it was fetched.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub data: CachedValue,
    pub fetched_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub enum QueryState {
    /// Never fetched.
    #[default]
    Idle,
    /// Fetch in flight; `prior` holds the last good payload if any.
    Loading { prior: Option<CachedSnapshot> },
    /// Last fetch succeeded.
    Success {
        data: CachedValue,
        fetched_at: Instant,
    },
    /// Last fetch failed; `prior` holds the last good payload if any.
    Error {
        message: String,
        prior: Option<CachedSnapshot>,
    },
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            QueryState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Best available payload regardless of state.
    pub fn available_data(&self) -> Option<&CachedValue> {
        match self {
            QueryState::Idle => None,
            QueryState::Success { data, .. } => Some(data),
            QueryState::Loading { prior } | QueryState::Error { prior, .. } => {
                prior.as_ref().map(|s| &s.data)
            }
        }
    }

    /// Snapshot to carry into the next Loading/Error state.
    pub(crate) fn carry_prior(&self) -> Option<CachedSnapshot> {
        match self {
            QueryState::Idle => None,
            QueryState::Loading { prior } | QueryState::Error { prior, .. } => prior.clone(),
            QueryState::Success { data, fetched_at } => Some(CachedSnapshot {
                data: data.clone(),
                fetched_at: *fetched_at,
            }),
        }
    }
}

/// One cache slot: the query state plus an invalidation mark.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub state: QueryState,
    /// Set by `invalidate`; a stale entry is served but refetched on the
    /// next read.
    pub stale: bool,
}

impl CacheEntry {
    /// Fresh means servable without a refetch.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        if self.stale {
            return false;
        }
        match &self.state {
            QueryState::Success { fetched_at, .. } => fetched_at.elapsed() < ttl,
            _ => false,
        }
    }
}

/// Where the data returned by `ensure_fetched` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Fresh from the network.
    Network,
    /// Cached and within its TTL.
    CacheFresh,
    /// The refetch failed; serving the retained prior payload.
    Offline,
}

/// Data plus provenance, handed back to views.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub data: CachedValue,
    pub source: CacheSource,
    pub fetched_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(n: usize) -> CachedValue {
        CachedValue::Collection {
            items: (0..n).map(|i| json!({ "id": i })).collect(),
            total: n as u64,
        }
    }

    #[test]
    fn test_idle_has_no_data() {
        assert!(QueryState::Idle.available_data().is_none());
        assert!(!CacheEntry::default().is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn test_error_retains_prior_data() {
        let success = QueryState::Success {
            data: collection(3),
            fetched_at: Instant::now(),
        };
        let error = QueryState::Error {
            message: "boom".to_string(),
            prior: success.carry_prior(),
        };
        assert_eq!(error.available_data().unwrap().items().len(), 3);
        assert_eq!(error.error_message(), Some("boom"));
    }

    #[test]
    fn test_stale_entry_not_fresh() {
        let entry = CacheEntry {
            state: QueryState::Success {
                data: collection(1),
                fetched_at: Instant::now(),
            },
            stale: true,
        };
        assert!(!entry.is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn test_recent_success_is_fresh() {
        let entry = CacheEntry {
            state: QueryState::Success {
                data: collection(1),
                fetched_at: Instant::now(),
            },
            stale: false,
        };
        assert!(entry.is_fresh(Duration::from_secs(60)));
        assert!(!entry.is_fresh(Duration::ZERO));
    }
}
