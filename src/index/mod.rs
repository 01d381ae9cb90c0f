//! Reference dataset loading and the normalized in-memory index.

pub mod canonical;
mod loader;
mod source;
mod tree;

pub use canonical::{canonicalize, NormalizedKey};
pub use loader::DatasetLoader;
pub use source::{DatasetFormat, FileSource, MemorySource, RecordLocation, RecordSource};
pub use tree::{synthesize_code, Children, GeoEntry, GeoIndex, GeoIndexBuilder, GeoNode, LoadReport};
