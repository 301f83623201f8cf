//! Translation proxy
//!
//! The backend exposes `POST /translate` which translates a batch of display
//! strings. Used by the `:translate <lang>` command to localize labels for
//! the current session.

use super::client::ApiClient;
use super::error::ApiError;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
struct TranslateResponse {
    translations: HashMap<String, String>,
}

/// Translate a batch of strings into the target language.
/// Returns a source → translated map; strings the backend could not
/// translate are simply absent from the result.
pub async fn translate(
    client: &ApiClient,
    texts: &[String],
    target_lang: &str,
) -> Result<HashMap<String, String>, ApiError> {
    if texts.is_empty() {
        return Ok(HashMap::new());
    }

    let url = format!("{}/translate", client.base_url);
    let body = json!({
        "texts": texts,
        "target": target_lang,
    });

    let raw = client.http.post(&url, client.token.as_deref(), Some(&body)).await?;
    let data = match raw.get("data") {
        Some(d) => d.clone(),
        None => raw,
    };

    let parsed: TranslateResponse = serde_json::from_value(data)
        .map_err(|e| ApiError::bad_shape(format!("unexpected translate response: {}", e)))?;

    tracing::debug!(
        "translated {} of {} strings to {}",
        parsed.translations.len(),
        texts.len(),
        target_lang
    );

    Ok(parsed.translations)
}
