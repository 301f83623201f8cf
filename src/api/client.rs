//! API Client
//!
//! Main client for the e-commerce backend, combining the HTTP transport with
//! endpoint building and `{success, data}` envelope decoding.

use super::error::ApiError;
use super::http::HttpClient;
use serde_json::Value;

/// A create/update/delete request against one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOp {
    Create,
    Update { id: String },
    Delete { id: String },
}

impl MutationOp {
    pub fn verb(&self) -> &'static str {
        match self {
            MutationOp::Create => "create",
            MutationOp::Update { .. } => "update",
            MutationOp::Delete { .. } => "delete",
        }
    }

    pub fn target_id(&self) -> Option<&str> {
        match self {
            MutationOp::Create => None,
            MutationOp::Update { id } | MutationOp::Delete { id } => Some(id),
        }
    }
}

/// Main backend API client
#[derive(Clone)]
pub struct ApiClient {
    pub http: HttpClient,
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let http = HttpClient::new()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    // =========================================================================
    // URL builders
    // =========================================================================

    /// Build a collection URL with query parameters, e.g. `/vendors?status=active`
    pub fn collection_url(&self, path: &str, params: &[(String, String)]) -> String {
        let mut url = format!("{}/{}", self.base_url, path);
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    /// Build a single-entity URL, e.g. `/orders/{id}`
    pub fn entity_url(&self, path: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, path, urlencoding::encode(id))
    }

    /// Build a nested sub-resource URL, e.g. `/categories/{id}/filters`
    pub fn sub_resource_url(&self, path: &str, id: &str, sub: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            path,
            urlencoding::encode(id),
            sub
        )
    }

    /// Build the terms page URL for a given variant
    pub fn terms_url(&self, kind: &str) -> String {
        format!("{}/pages/terms?type={}", self.base_url, kind)
    }

    // =========================================================================
    // Envelope-decoding requests
    // =========================================================================

    /// GET a URL and unwrap the `{success, data}` envelope.
    pub async fn get_data(&self, url: &str) -> Result<Value, ApiError> {
        let raw = self.http.get(url, self.token()).await?;
        decode_envelope(raw)
    }

    /// Fetch a single entity by id, mapping a 404 to NotFound.
    pub async fn fetch_by_id(&self, path: &str, id: &str) -> Result<Value, ApiError> {
        let url = self.entity_url(path, id);
        match self.get_data(&url).await {
            Err(ApiError::Api { status: 404, .. }) => Err(ApiError::NotFound {
                resource: path.to_string(),
                id: id.to_string(),
            }),
            other => other,
        }
    }

    /// Perform a mutation. Returns the created/updated record, or None for
    /// deletes. 404 on update/delete maps to NotFound.
    pub async fn mutate(
        &self,
        path: &str,
        op: &MutationOp,
        payload: &Value,
    ) -> Result<Option<Value>, ApiError> {
        let result = match op {
            MutationOp::Create => {
                let url = self.collection_url(path, &[]);
                self.http
                    .post(&url, self.token(), Some(payload))
                    .await
                    .and_then(decode_envelope)
                    .map(Some)
            }
            MutationOp::Update { id } => {
                let url = self.entity_url(path, id);
                self.http
                    .put(&url, self.token(), payload)
                    .await
                    .and_then(decode_envelope)
                    .map(Some)
            }
            MutationOp::Delete { id } => {
                let url = self.entity_url(path, id);
                self.http.delete(&url, self.token()).await.map(|_| None)
            }
        };

        match result {
            Err(ApiError::Api { status: 404, .. }) if op.target_id().is_some() => {
                Err(ApiError::NotFound {
                    resource: path.to_string(),
                    id: op.target_id().unwrap_or_default().to_string(),
                })
            }
            other => other,
        }
    }

    /// Fetch the terms-and-conditions content for a variant.
    pub async fn fetch_terms(&self, kind: &str) -> Result<Value, ApiError> {
        self.get_data(&self.terms_url(kind)).await
    }
}

/// Unwrap the backend's `{success: bool, data: T}` envelope, failing fast on
/// shape mismatch instead of propagating untyped data.
fn decode_envelope(raw: Value) -> Result<Value, ApiError> {
    let Some(obj) = raw.as_object() else {
        return Err(ApiError::bad_shape("expected a JSON object envelope"));
    };

    match obj.get("success").and_then(Value::as_bool) {
        Some(true) => obj
            .get("data")
            .cloned()
            .ok_or_else(|| ApiError::bad_shape("envelope missing 'data' field")),
        Some(false) => Err(ApiError::bad_shape("envelope reports success=false")),
        None => Err(ApiError::bad_shape("envelope missing 'success' field")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_url_encodes_params() {
        let client = ApiClient::new("http://localhost:8000/", None).unwrap();
        let url = client.collection_url(
            "vendors",
            &[
                ("status".to_string(), "active".to_string()),
                ("q".to_string(), "tea & spice".to_string()),
            ],
        );
        assert_eq!(
            url,
            "http://localhost:8000/vendors?status=active&q=tea%20%26%20spice"
        );
    }

    #[test]
    fn test_entity_url() {
        let client = ApiClient::new("http://localhost:8000", None).unwrap();
        assert_eq!(
            client.entity_url("orders", "ord-1"),
            "http://localhost:8000/orders/ord-1"
        );
    }

    #[test]
    fn test_sub_resource_url() {
        let client = ApiClient::new("http://localhost:8000", None).unwrap();
        assert_eq!(
            client.sub_resource_url("categories", "cat-9", "filters"),
            "http://localhost:8000/categories/cat-9/filters"
        );
    }

    #[test]
    fn test_decode_envelope_success() {
        let data = decode_envelope(json!({"success": true, "data": {"id": "v-1"}})).unwrap();
        assert_eq!(data["id"], "v-1");
    }

    #[test]
    fn test_decode_envelope_missing_data() {
        assert!(decode_envelope(json!({"success": true})).is_err());
    }

    #[test]
    fn test_decode_envelope_not_object() {
        assert!(decode_envelope(json!([1, 2, 3])).is_err());
    }

    mod live {
        use super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_fetch_by_id_maps_404_to_not_found() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/offers/off-404"))
                .respond_with(ResponseTemplate::new(404).set_body_json(
                    json!({"success": false, "message": "no such offer"}),
                ))
                .mount(&server)
                .await;

            let client = ApiClient::new(&server.uri(), None).unwrap();
            let err = client.fetch_by_id("offers", "off-404").await.unwrap_err();

            match &err {
                ApiError::NotFound { resource, id } => {
                    assert_eq!(resource, "offers");
                    assert_eq!(id, "off-404");
                }
                other => panic!("expected NotFound, got {:?}", other),
            }
            assert_eq!(
                crate::api::error::format_api_error(&err),
                "Offer 'off-404' not found."
            );
        }

        #[tokio::test]
        async fn test_get_data_unwraps_envelope() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/products/p-1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(
                    json!({"success": true, "data": {"id": "p-1", "name": "Green Tea"}}),
                ))
                .mount(&server)
                .await;

            let client = ApiClient::new(&server.uri(), None).unwrap();
            let data = client.fetch_by_id("products", "p-1").await.unwrap();
            assert_eq!(data["name"], "Green Tea");
        }

        #[tokio::test]
        async fn test_create_returns_record() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/vendors"))
                .respond_with(ResponseTemplate::new(201).set_body_json(
                    json!({"success": true, "data": {"id": "v-new", "name": "Acme"}}),
                ))
                .mount(&server)
                .await;

            let client = ApiClient::new(&server.uri(), None).unwrap();
            let record = client
                .mutate("vendors", &MutationOp::Create, &json!({"name": "Acme"}))
                .await
                .unwrap();
            assert_eq!(record.unwrap()["id"], "v-new");
        }

        #[tokio::test]
        async fn test_delete_404_maps_to_not_found() {
            let server = MockServer::start().await;
            Mock::given(method("DELETE"))
                .and(path("/vendors/v-gone"))
                .respond_with(ResponseTemplate::new(404).set_body_json(
                    json!({"success": false, "message": "already deleted"}),
                ))
                .mount(&server)
                .await;

            let client = ApiClient::new(&server.uri(), None).unwrap();
            let err = client
                .mutate(
                    "vendors",
                    &MutationOp::Delete {
                        id: "v-gone".to_string(),
                    },
                    &Value::Null,
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::NotFound { .. }));
        }
    }
}
