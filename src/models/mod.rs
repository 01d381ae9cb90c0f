//! Core data models for the geographic resolver.

pub mod level;
pub mod normalized;
pub mod record;

pub use level::GeoLevel;
pub use normalized::{LevelValue, NormalizedGeo, RawGeo};
pub use record::{column_for_header, GeoRecord, RecordLevel};
