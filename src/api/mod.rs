//! Backend API interaction module
//!
//! This module provides the core functionality for talking to the e-commerce
//! backend REST API: the HTTP transport, the typed error taxonomy, and the
//! main client with its endpoint builders.
//!
//! # Module Structure
//!
//! - [`error`] - Typed API errors and user-facing formatting
//! - [`http`] - HTTP utilities for REST API calls
//! - [`client`] - Main API client with endpoint builders and envelope decoding
//! - [`translate`] - Translation proxy for display strings
//!
//! # Example
//!
//! ```ignore
//! use crate::api::client::ApiClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = ApiClient::new("http://localhost:8000", None)?;
//!     let vendors = client.get_data(&client.collection_url("vendors", &[])).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod translate;
