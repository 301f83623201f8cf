//! Mutation dispatcher
//!
//! Single entry point for create/update/delete calls. Every successful
//! mutation invalidates the cached queries of the touched resource type so
//! the next read refetches. The optimistic path additionally edits cached
//! payloads up front and rolls back to an exact snapshot on failure.

use crate::api::client::{ApiClient, MutationOp};
use crate::api::error::ApiError;
use crate::cache::{CachedValue, QueryCache, QueryKey};
use serde_json::Value;

/// What a completed mutation did, for notifications and logging.
#[derive(Debug)]
pub struct MutationOutcome {
    /// Record returned by the backend (None for deletes).
    pub record: Option<Value>,
    /// Cache entries marked stale as a result.
    pub invalidated: usize,
}

/// Dispatches mutations and keeps the query cache consistent.
#[derive(Clone)]
pub struct MutationDispatcher {
    client: ApiClient,
    cache: QueryCache,
}

impl MutationDispatcher {
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// Run a mutation; on success mark every cached query of `resource`
    /// stale. On failure the cache is untouched.
    pub async fn run(
        &self,
        resource: &str,
        path: &str,
        op: MutationOp,
        payload: Value,
    ) -> Result<MutationOutcome, ApiError> {
        tracing::info!(
            "mutation: {} {} {}",
            op.verb(),
            resource,
            op.target_id().unwrap_or("(new)")
        );
        let record = self.client.mutate(path, &op, &payload).await?;
        let invalidated = self.cache.invalidate(resource);
        Ok(MutationOutcome {
            record,
            invalidated,
        })
    }

    /// Run a mutation with an optimistic cache edit applied before the
    /// request. On success the edit stands and the resource is invalidated
    /// for a background refetch; on failure the cache is restored to the
    /// exact pre-mutation state and the error propagates.
    pub async fn run_optimistic<F>(
        &self,
        resource: &str,
        path: &str,
        op: MutationOp,
        payload: Value,
        edit: F,
    ) -> Result<MutationOutcome, ApiError>
    where
        F: FnMut(&QueryKey, &mut CachedValue),
    {
        let snapshot = self.cache.snapshot_resource(resource);
        self.cache.edit_resource(resource, edit);
        tracing::info!(
            "optimistic mutation: {} {} {}",
            op.verb(),
            resource,
            op.target_id().unwrap_or("(new)")
        );

        match self.client.mutate(path, &op, &payload).await {
            Ok(record) => {
                let invalidated = self.cache.invalidate(resource);
                Ok(MutationOutcome {
                    record,
                    invalidated,
                })
            }
            Err(err) => {
                tracing::warn!("mutation failed, rolling back {} cache: {}", resource, err);
                self.cache.restore(snapshot);
                Err(err)
            }
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn seeded_dispatcher(server_uri: &str) -> (MutationDispatcher, QueryKey) {
        let client = ApiClient::new(server_uri, None).unwrap();
        let cache = QueryCache::new();
        let key = QueryKey::new("products").with_param("status", "active");
        cache
            .ensure_fetched(&key, Duration::from_secs(30), || async {
                Ok(CachedValue::Collection {
                    items: vec![
                        json!({"id": "p-1", "status": "inactive"}),
                        json!({"id": "p-2", "status": "active"}),
                    ],
                    total: 2,
                })
            })
            .await
            .unwrap();
        (MutationDispatcher::new(client, cache), key)
    }

    fn set_status(items: &mut CachedValue, id: &str, status: &str) {
        if let CachedValue::Collection { items, .. } = items {
            for item in items.iter_mut() {
                if item["id"] == id {
                    item["status"] = json!(status);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_successful_update_invalidates_resource() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/products/p-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"success": true, "data": {"id": "p-1", "status": "active"}}),
            ))
            .mount(&server)
            .await;

        let (dispatcher, key) = seeded_dispatcher(&server.uri()).await;
        let outcome = dispatcher
            .run(
                "products",
                "products",
                MutationOp::Update {
                    id: "p-1".to_string(),
                },
                json!({"status": "active"}),
            )
            .await
            .unwrap();

        assert_eq!(outcome.record.unwrap()["status"], "active");
        assert_eq!(outcome.invalidated, 1);
        assert!(dispatcher.cache().get(&key).stale);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/products/p-1"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "server error"})),
            )
            .mount(&server)
            .await;

        let (dispatcher, key) = seeded_dispatcher(&server.uri()).await;
        let before = dispatcher.cache().get(&key).state.available_data().cloned();

        let result = dispatcher
            .run(
                "products",
                "products",
                MutationOp::Update {
                    id: "p-1".to_string(),
                },
                json!({"status": "active"}),
            )
            .await;

        assert!(result.is_err());
        let entry = dispatcher.cache().get(&key);
        assert!(!entry.stale);
        assert_eq!(entry.state.available_data().cloned(), before);
    }

    #[tokio::test]
    async fn test_optimistic_edit_stands_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/products/p-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"success": true, "data": {"id": "p-1", "status": "active"}}),
            ))
            .mount(&server)
            .await;

        let (dispatcher, key) = seeded_dispatcher(&server.uri()).await;
        let outcome = dispatcher
            .run_optimistic(
                "products",
                "products",
                MutationOp::Update {
                    id: "p-1".to_string(),
                },
                json!({"status": "active"}),
                |_, data| set_status(data, "p-1", "active"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.invalidated, 1);
        let entry = dispatcher.cache().get(&key);
        let data = entry.state.available_data().unwrap();
        assert_eq!(data.items()[0]["status"], "active");
    }

    #[tokio::test]
    async fn test_optimistic_rollback_restores_exact_state() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/products/p-1"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(
                    json!({"success": false, "errors": {"status": ["transition not allowed"]}}),
                ),
            )
            .mount(&server)
            .await;

        let (dispatcher, key) = seeded_dispatcher(&server.uri()).await;
        let before = dispatcher.cache().get(&key).state.available_data().cloned();

        let result = dispatcher
            .run_optimistic(
                "products",
                "products",
                MutationOp::Update {
                    id: "p-1".to_string(),
                },
                json!({"status": "active"}),
                |_, data| set_status(data, "p-1", "active"),
            )
            .await;

        assert!(matches!(result, Err(ApiError::Validation { .. })));
        let entry = dispatcher.cache().get(&key);
        assert!(!entry.stale);
        assert_eq!(entry.state.available_data().cloned(), before);
        assert_eq!(
            entry.state.available_data().unwrap().items()[0]["status"],
            "inactive"
        );
    }

    #[tokio::test]
    async fn test_delete_returns_no_record() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/products/p-2"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (dispatcher, _key) = seeded_dispatcher(&server.uri()).await;
        let outcome = dispatcher
            .run(
                "products",
                "products",
                MutationOp::Delete {
                    id: "p-2".to_string(),
                },
                Value::Null,
            )
            .await
            .unwrap();

        assert!(outcome.record.is_none());
        assert_eq!(outcome.invalidated, 1);
    }
}
