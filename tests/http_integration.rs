//! Integration tests for the backend HTTP contract using wiremock
//!
//! These tests verify the behavior of the REST API surface the client is
//! built against: the `{success, data}` envelope, filter query parameters,
//! page-number pagination, and error body shapes.

use serde_json::json;
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test module for envelope and collection behavior
mod collection_tests {
    use super::*;

    /// Collections come wrapped in a `{success, data: {items, total}}` envelope
    #[tokio::test]
    async fn test_collection_envelope_shape() {
        let server = MockServer::start().await;

        let expected_response = json!({
            "success": true,
            "data": {
                "items": [
                    {"id": "p-1", "name": "Green Tea", "status": "active"},
                    {"id": "p-2", "name": "Black Tea", "status": "draft"}
                ],
                "total": 2
            }
        });

        Mock::given(method("GET"))
            .and(path("/products"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&expected_response))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/products", server.uri());

        let response = client
            .get(&url)
            .bearer_auth("test-token")
            .send()
            .await
            .expect("Request should succeed")
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");

        assert_eq!(response["success"], true);
        assert_eq!(response["data"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(response["data"]["total"], 2);
        assert_eq!(response["data"]["items"][0]["id"], "p-1");
    }

    /// Status filters are passed as query parameters, not body fields
    #[tokio::test]
    async fn test_status_filter_query_param() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("status", "active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "items": [{"id": "p-1", "status": "active"}],
                    "total": 1
                }
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/products?status=active", server.uri());

        let response = client
            .get(&url)
            .send()
            .await
            .expect("Request should succeed")
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");

        let items = response["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items.iter().all(|i| i["status"] == "active"));
    }

    /// An empty result set is still a successful response
    #[tokio::test]
    async fn test_empty_collection_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/offers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [], "total": 0}
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/offers", server.uri());

        let response = client
            .get(&url)
            .send()
            .await
            .expect("Request should succeed");

        assert_eq!(response.status(), 200);
        let body = response
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
        assert_eq!(body["data"]["total"], 0);
    }

    /// Page-number pagination via page/per_page parameters
    #[tokio::test]
    async fn test_page_number_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "items": [{"id": "ord-51"}, {"id": "ord-52"}],
                    "total": 52
                }
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/orders", server.uri());

        let response = client
            .get(&url)
            .query(&[("page", "2"), ("per_page", "50")])
            .send()
            .await
            .expect("Request should succeed")
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");

        assert_eq!(response["data"]["total"], 52);
        assert_eq!(response["data"]["items"][0]["id"], "ord-51");
    }

    /// Nested sub-resource paths: /vendors/{id}/payouts
    #[tokio::test]
    async fn test_nested_sub_resource_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vendors/v-1/payouts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "items": [{"id": "pay-1", "amount_cents": 12500, "status": "paid"}],
                    "total": 1
                }
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/vendors/v-1/payouts", server.uri());

        let response = client
            .get(&url)
            .send()
            .await
            .expect("Request should succeed")
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");

        assert_eq!(response["data"]["items"][0]["status"], "paid");
    }
}

/// Test module for error body shapes
mod error_tests {
    use super::*;

    /// A single-entity 404 carries a message but no field errors
    #[tokio::test]
    async fn test_404_for_missing_entity() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/offers/off-404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "Offer not found"
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/offers/off-404", server.uri());

        let response = client
            .get(&url)
            .send()
            .await
            .expect("Request should complete");

        assert_eq!(response.status(), 404);
        let body = response
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");
        assert_eq!(body["success"], false);
        assert!(body.get("errors").is_none());
    }

    /// Validation failures return per-field error arrays
    #[tokio::test]
    async fn test_422_validation_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/vendors/v-1"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "success": false,
                "errors": {
                    "email": ["is invalid"],
                    "commission_rate": ["must be between 0 and 100"]
                }
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/vendors/v-1", server.uri());

        let response = client
            .put(&url)
            .json(&json!({"email": "nope", "commission_rate": 250}))
            .send()
            .await
            .expect("Request should complete");

        assert_eq!(response.status(), 422);
        let body = response
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");
        let errors = body["errors"].as_object().unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["email"][0], "is invalid");
    }

    /// Deletes respond 204 with an empty body
    #[tokio::test]
    async fn test_delete_204_empty_body() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/products/p-9"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/products/p-9", server.uri());

        let response = client
            .delete(&url)
            .send()
            .await
            .expect("Request should succeed");

        assert_eq!(response.status(), 204);
        let body = response.text().await.expect("Should get body");
        assert!(body.is_empty());
    }
}

/// Test module for auxiliary endpoints
mod page_tests {
    use super::*;

    /// Terms content is selected by the `type` query parameter
    #[tokio::test]
    async fn test_terms_page_by_type() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pages/terms"))
            .and(query_param("type", "PRIVACY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"type": "PRIVACY", "content": "We respect your privacy."}
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/pages/terms?type=PRIVACY", server.uri());

        let response = client
            .get(&url)
            .send()
            .await
            .expect("Request should succeed")
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");

        assert_eq!(response["data"]["type"], "PRIVACY");
        assert!(response["data"]["content"].is_string());
    }

    /// The translate endpoint takes a batch of texts and a target language
    #[tokio::test]
    async fn test_translate_batch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "translations": {
                        "Products": "Produits",
                        "Vendors": "Vendeurs"
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/translate", server.uri());

        let response = client
            .post(&url)
            .json(&json!({"texts": ["Products", "Vendors"], "target": "fr"}))
            .send()
            .await
            .expect("Request should succeed")
            .json::<serde_json::Value>()
            .await
            .expect("Should parse JSON");

        let translations = response["data"]["translations"].as_object().unwrap();
        assert_eq!(translations["Products"], "Produits");
        assert_eq!(translations.len(), 2);
    }
}
