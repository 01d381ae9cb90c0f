//! Raw dataset rows as read from the reference source.

use serde::{Deserialize, Serialize};

use super::GeoLevel;

/// One flat row of the reference dataset.
///
/// Every field is optional at the type level; structural rules (state is
/// mandatory, no skipped levels, no code without a name) are checked by
/// [`GeoRecord::chain`] when the row is indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    #[serde(default, alias = "stateName", alias = "state_name")]
    pub state: Option<String>,
    #[serde(default, alias = "stateCode")]
    pub state_code: Option<String>,

    #[serde(default, alias = "lgaName", alias = "lga_name")]
    pub lga: Option<String>,
    #[serde(default, alias = "lgaCode")]
    pub lga_code: Option<String>,

    #[serde(default, alias = "wardName", alias = "ward_name")]
    pub ward: Option<String>,
    #[serde(default, alias = "wardCode")]
    pub ward_code: Option<String>,

    #[serde(
        default,
        alias = "pollingUnit",
        alias = "polling_unit_name",
        alias = "pollingUnitName",
        alias = "pu"
    )]
    pub polling_unit: Option<String>,
    #[serde(default, alias = "pollingUnitCode", alias = "pu_code")]
    pub polling_unit_code: Option<String>,
}

/// A single level of a validated record: level, display name, source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLevel<'a> {
    pub level: GeoLevel,
    pub name: &'a str,
    pub code: Option<&'a str>,
}

impl GeoRecord {
    pub fn new(state: impl Into<String>, state_code: Option<&str>) -> Self {
        Self {
            state: Some(state.into()),
            state_code: state_code.map(String::from),
            ..Default::default()
        }
    }

    pub fn with_lga(mut self, name: impl Into<String>, code: Option<&str>) -> Self {
        self.lga = Some(name.into());
        self.lga_code = code.map(String::from);
        self
    }

    pub fn with_ward(mut self, name: impl Into<String>, code: Option<&str>) -> Self {
        self.ward = Some(name.into());
        self.ward_code = code.map(String::from);
        self
    }

    pub fn with_polling_unit(mut self, name: impl Into<String>, code: Option<&str>) -> Self {
        self.polling_unit = Some(name.into());
        self.polling_unit_code = code.map(String::from);
        self
    }

    fn fields(&self, level: GeoLevel) -> (Option<&str>, Option<&str>) {
        let (name, code) = match level {
            GeoLevel::State => (&self.state, &self.state_code),
            GeoLevel::Lga => (&self.lga, &self.lga_code),
            GeoLevel::Ward => (&self.ward, &self.ward_code),
            GeoLevel::PollingUnit => (&self.polling_unit, &self.polling_unit_code),
        };
        (non_blank(name), non_blank(code))
    }

    /// Validate the row and return its populated levels, state first.
    ///
    /// Returns a human readable reason when the row is structurally invalid.
    pub fn chain(&self) -> Result<Vec<RecordLevel<'_>>, String> {
        let mut chain = Vec::with_capacity(GeoLevel::all().len());
        let mut ended_at: Option<GeoLevel> = None;

        for level in GeoLevel::all() {
            match self.fields(*level) {
                (Some(name), code) => {
                    if let Some(missing) = ended_at {
                        return Err(format!("{} is set but {} is empty", level, missing));
                    }
                    chain.push(RecordLevel {
                        level: *level,
                        name,
                        code,
                    });
                }
                (None, Some(code)) => {
                    return Err(format!("{} code '{}' has no {} name", level, code, level));
                }
                (None, None) => {
                    ended_at.get_or_insert(*level);
                }
            }
        }

        if chain.is_empty() {
            return Err("state is empty".to_string());
        }
        Ok(chain)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Map a CSV header onto a [`GeoRecord`] field name.
///
/// Headers are matched case-insensitively, with spaces and dashes treated
/// as underscores. Unknown headers are returned unchanged and ignored.
pub fn column_for_header(header: &str) -> String {
    let key: String = header
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    let column = match key.as_str() {
        "state" | "state_name" | "statename" => "state",
        "state_code" | "statecode" => "state_code",
        "lga" | "lga_name" | "lganame" | "local_government" | "local_government_area" => "lga",
        "lga_code" | "lgacode" => "lga_code",
        "ward" | "ward_name" | "wardname" => "ward",
        "ward_code" | "wardcode" => "ward_code",
        "polling_unit" | "polling_unit_name" | "pollingunit" | "pollingunitname" | "pu" => {
            "polling_unit"
        }
        "polling_unit_code" | "pollingunitcode" | "pu_code" => "polling_unit_code",
        _ => return header.to_string(),
    };
    column.to_string()
}
