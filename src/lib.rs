//! georesolve - Hierarchical geographic reference resolver
//!
//! Turns inconsistently formatted state / LGA / ward / polling-unit
//! identifiers into canonical codes and display names, checking each level
//! against its parent. Shared by the query and inspect binaries.

pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod resolver;

pub use error::{LoadError, LoadErrorKind};
pub use models::{GeoLevel, GeoRecord, LevelValue, NormalizedGeo, RawGeo};
pub use resolver::GeoResolver;
