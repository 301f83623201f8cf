//! HTTP utilities for backend REST API calls

use crate::api::error::{ApiError, FieldErrors};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        // Back down to a char boundary; a fixed byte offset can land inside
        // a multibyte character.
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..cut],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for backend API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("tshop/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, token: Option<&str>) -> Result<Value, ApiError> {
        self.request(Method::GET, url, token, None).await
    }

    /// Make a POST request with an optional JSON body
    pub async fn post(
        &self,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.request(Method::POST, url, token, body).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put(
        &self,
        url: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Value, ApiError> {
        self.request(Method::PUT, url, token, Some(body)).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, token: Option<&str>) -> Result<Value, ApiError> {
        self.request(Method::DELETE, url, token, None).await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: only log sanitized/truncated error bodies
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(classify_failure(status, &body));
        }

        // Handle empty response (e.g. 204 on delete)
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::bad_shape(format!("response is not valid JSON: {}", e)))
    }
}

/// Map a non-2xx response to a typed error.
///
/// A 4xx carrying `{"success": false, "errors": {field: [messages]}}`
/// becomes a Validation error; everything else is a plain Api error.
/// NotFound is decided by the caller, which knows whether the request
/// targeted a single resource.
fn classify_failure(status: StatusCode, body: &str) -> ApiError {
    if status.is_client_error() {
        if let Ok(parsed) = serde_json::from_str::<Value>(body) {
            if let Some(errors) = parsed.get("errors").and_then(|e| e.as_object()) {
                let mut field_errors = FieldErrors::new();
                for (field, messages) in errors {
                    let msgs: Vec<String> = match messages {
                        Value::Array(arr) => arr
                            .iter()
                            .filter_map(|m| m.as_str().map(str::to_string))
                            .collect(),
                        Value::String(s) => vec![s.clone()],
                        _ => Vec::new(),
                    };
                    if !msgs.is_empty() {
                        field_errors.insert(field.clone(), msgs);
                    }
                }
                if !field_errors.is_empty() {
                    return ApiError::Validation { field_errors };
                }
            }
        }
    }

    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_default();

    ApiError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_validation_body() {
        let body = r#"{"success": false, "errors": {"email": ["is invalid", "is taken"]}}"#;
        match classify_failure(StatusCode::UNPROCESSABLE_ENTITY, body) {
            ApiError::Validation { field_errors } => {
                assert_eq!(field_errors["email"], vec!["is invalid", "is taken"]);
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_plain_4xx() {
        match classify_failure(StatusCode::FORBIDDEN, r#"{"message": "no access"}"#) {
            ApiError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "no access");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_5xx_unstructured() {
        match classify_failure(StatusCode::BAD_GATEWAY, "<html>oops</html>") {
            ApiError::Api { status, .. } => assert_eq!(status, 502),
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(500);
        let out = sanitize_for_log(&long);
        assert!(out.contains("truncated"));
        assert!(out.len() < 300);
    }

    #[test]
    fn test_sanitize_truncates_multibyte_at_boundary() {
        // 'é' is two bytes and straddles the truncation offset
        let mut body = "x".repeat(MAX_LOG_BODY_LENGTH - 1);
        body.push('é');
        body.push_str(&"y".repeat(100));
        let out = sanitize_for_log(&body);
        assert!(out.contains("truncated"));
        assert!(out.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH - 1)));
    }
}
