//! API error taxonomy
//!
//! Typed failures surfaced by the resource client. The cache stores these on
//! entries without discarding prior data; views decide how to display them.

use std::collections::BTreeMap;
use thiserror::Error;

/// Field name → validation messages, as returned by the backend on 4xx.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection-level failure: DNS, refused, timeout at the transport.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response without a structured validation body.
    #[error("API request failed: {status}")]
    Api { status: u16, message: String },

    /// 4xx with a structured validation body, or a response whose shape does
    /// not match the `{success, data}` envelope.
    #[error("validation failed")]
    Validation { field_errors: FieldErrors },

    /// 404 on a single-resource fetch.
    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },
}

impl ApiError {
    /// Build a Validation error from a single pseudo-field message, used for
    /// response-shape mismatches detected at the client boundary.
    pub fn bad_shape(message: impl Into<String>) -> Self {
        let mut field_errors = FieldErrors::new();
        field_errors.insert("body".to_string(), vec![message.into()]);
        ApiError::Validation { field_errors }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Format an API error for display in the status line.
/// Security: avoids leaking raw backend error bodies to the terminal.
pub fn format_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Network(_) => {
            "Request failed. Check your network connection and the API URL.".to_string()
        }
        ApiError::Api { status, .. } => match status {
            401 => "Authentication failed. Set TSHOP_API_TOKEN or check your token.".to_string(),
            403 => "Permission denied. Your token lacks access to this resource.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Resource conflict. It may already exist or be in use.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            500..=599 => "Backend temporarily unavailable. Please try again.".to_string(),
            s => format!("Request failed ({}).", s),
        },
        ApiError::Validation { field_errors } => {
            let mut parts: Vec<String> = field_errors
                .iter()
                .map(|(field, msgs)| format!("{}: {}", field, msgs.join(", ")))
                .collect();
            parts.truncate(3);
            if parts.is_empty() {
                "Validation failed.".to_string()
            } else {
                format!("Validation failed: {}", parts.join("; "))
            }
        }
        ApiError::NotFound { resource, id } => {
            format!("{} '{}' not found.", display_singular(resource), id)
        }
    }
}

/// "offers" -> "Offer", "categories" -> "Category"
fn display_singular(resource: &str) -> String {
    let singular = if let Some(stem) = resource.strip_suffix("ies") {
        format!("{}y", stem)
    } else {
        resource.strip_suffix('s').unwrap_or(resource).to_string()
    };
    let mut chars = singular.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => singular,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ApiError::NotFound {
            resource: "offers".to_string(),
            id: "missing-id".to_string(),
        };
        assert_eq!(format_api_error(&err), "Offer 'missing-id' not found.");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_category_singular() {
        let err = ApiError::NotFound {
            resource: "categories".to_string(),
            id: "x".to_string(),
        };
        assert!(format_api_error(&err).starts_with("Category 'x'"));
    }

    #[test]
    fn test_validation_lists_fields() {
        let mut field_errors = FieldErrors::new();
        field_errors.insert("name".to_string(), vec!["is required".to_string()]);
        let err = ApiError::Validation { field_errors };
        let msg = format_api_error(&err);
        assert!(msg.contains("name: is required"));
    }

    #[test]
    fn test_bad_shape_is_validation() {
        let err = ApiError::bad_shape("missing data field");
        match err {
            ApiError::Validation { ref field_errors } => {
                assert!(field_errors.contains_key("body"));
            }
            _ => panic!("expected Validation"),
        }
    }

    #[test]
    fn test_api_status_messages() {
        let err = ApiError::Api {
            status: 429,
            message: String::new(),
        };
        assert!(format_api_error(&err).contains("Rate limit"));
    }
}
