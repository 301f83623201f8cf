//! Resource system
//!
//! Data-driven resource definitions: each browsable resource type (products,
//! vendors, offers, orders...) is described by embedded JSON and handled by
//! generic fetch/render/mutate code.
//!
//! - [`registry`] - Resource definitions loaded from embedded JSON
//! - [`fetcher`] - Cache-backed collection and entity fetching
//! - [`categories`] - Category tree flattening for the category picker

pub mod categories;
pub mod fetcher;
pub mod registry;
