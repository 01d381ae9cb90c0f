//! Hierarchical resolution of raw geographic identifiers.

mod levels;
mod service;

pub use levels::{resolve_level, resolve_lga, resolve_polling_unit, resolve_state, resolve_ward};
pub use service::{normalize_degraded, normalize_with_index, GeoResolver};
