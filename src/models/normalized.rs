//! Caller input and per-call normalization results.

use serde::{Deserialize, Serialize};

use super::GeoLevel;

/// Raw, caller-supplied geographic identifiers. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGeo {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub lga: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default, alias = "polling_unit")]
    pub polling_unit: Option<String>,
}

impl RawGeo {
    pub fn new(
        state: Option<&str>,
        lga: Option<&str>,
        ward: Option<&str>,
        polling_unit: Option<&str>,
    ) -> Self {
        Self {
            state: state.map(String::from),
            lga: lga.map(String::from),
            ward: ward.map(String::from),
            polling_unit: polling_unit.map(String::from),
        }
    }

    /// Trimmed value supplied for a level; blank strings count as absent.
    pub fn get(&self, level: GeoLevel) -> Option<&str> {
        let value = match level {
            GeoLevel::State => &self.state,
            GeoLevel::Lga => &self.lga,
            GeoLevel::Ward => &self.ward,
            GeoLevel::PollingUnit => &self.polling_unit,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Code and display name for one level of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelValue {
    pub code: Option<String>,
    pub name: Option<String>,
}

impl LevelValue {
    pub fn resolved(code: &str, name: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
        }
    }

    /// Name echoed from the input with no code attached.
    pub fn unresolved(raw: Option<&str>) -> Self {
        Self {
            code: None,
            name: raw.map(String::from),
        }
    }

    /// Raw input used as both code and name.
    pub fn echo(raw: Option<&str>) -> Self {
        Self {
            code: raw.map(String::from),
            name: raw.map(String::from),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.code.is_some()
    }
}

/// Result of normalizing a [`RawGeo`]. Built fresh for every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedGeo {
    pub state: LevelValue,
    pub lga: LevelValue,
    pub ward: LevelValue,
    pub polling_unit: LevelValue,
    pub is_complete: bool,
    /// Set when the reference dataset could not be loaded and inputs were echoed
    pub degraded: bool,
}

impl NormalizedGeo {
    /// Assemble a result from per-level values in hierarchical order.
    ///
    /// Complete means every level carries a code: a resolver hit when the
    /// index is loaded, a supplied value when echoing in degraded mode.
    pub fn from_levels(levels: [LevelValue; 4], degraded: bool) -> Self {
        let is_complete = levels.iter().all(|l| l.code.is_some() && l.name.is_some());
        let [state, lga, ward, polling_unit] = levels;
        Self {
            state,
            lga,
            ward,
            polling_unit,
            is_complete,
            degraded,
        }
    }

    pub fn get(&self, level: GeoLevel) -> &LevelValue {
        match level {
            GeoLevel::State => &self.state,
            GeoLevel::Lga => &self.lga,
            GeoLevel::Ward => &self.ward,
            GeoLevel::PollingUnit => &self.polling_unit,
        }
    }
}
