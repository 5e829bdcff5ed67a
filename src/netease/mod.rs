//! Upstream music service adapter.
//!
//! Everything specific to the third-party API lives here: endpoint paths, the
//! cookie jar it expects, and the field shaping that turns its payloads into
//! the crate's own models.

pub mod api;
pub mod cookies;
pub mod models;

pub use api::{NeteaseClient, Upstream};
pub use models::Track;
