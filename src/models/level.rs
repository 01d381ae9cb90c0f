//! Administrative levels of the electoral geography.

use serde::{Deserialize, Serialize};

/// The four levels of the hierarchy, in parent-to-child order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    /// State (top level)
    State,
    /// Local government area
    Lga,
    /// Ward within an LGA
    Ward,
    /// Polling unit within a ward (leaf)
    PollingUnit,
}

impl GeoLevel {
    /// Get all levels in hierarchical order (state first)
    pub fn all() -> &'static [GeoLevel] {
        &[
            GeoLevel::State,
            GeoLevel::Lga,
            GeoLevel::Ward,
            GeoLevel::PollingUnit,
        ]
    }

    /// Number of ancestors a node at this level has
    pub fn depth(&self) -> usize {
        match self {
            GeoLevel::State => 0,
            GeoLevel::Lga => 1,
            GeoLevel::Ward => 2,
            GeoLevel::PollingUnit => 3,
        }
    }

    /// Level reached after walking `depth` ancestors from the root
    pub fn from_depth(depth: usize) -> Option<Self> {
        Self::all().get(depth).copied()
    }

    /// Get the field name for this level
    pub fn field_name(&self) -> &'static str {
        match self {
            GeoLevel::State => "state",
            GeoLevel::Lga => "lga",
            GeoLevel::Ward => "ward",
            GeoLevel::PollingUnit => "polling_unit",
        }
    }

    /// Prefix used when a code has to be synthesized for a node
    pub fn code_prefix(&self) -> &'static str {
        match self {
            GeoLevel::State => "ST",
            GeoLevel::Lga => "LG",
            GeoLevel::Ward => "WD",
            GeoLevel::PollingUnit => "PU",
        }
    }
}

impl std::fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}
