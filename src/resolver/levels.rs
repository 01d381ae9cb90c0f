//! Per-level lookups over a built index.
//!
//! Each resolver walks to its parent using the ancestor identifiers (codes
//! or raw names) and matches the raw input among that parent's children.
//! Pure and lock-free.

use crate::index::{GeoEntry, GeoIndex};
use crate::models::GeoLevel;

pub fn resolve_state(index: &GeoIndex, raw: &str) -> Option<GeoEntry> {
    resolve_level(index, GeoLevel::State, &[], raw)
}

pub fn resolve_lga(index: &GeoIndex, state: &str, raw: &str) -> Option<GeoEntry> {
    resolve_level(index, GeoLevel::Lga, &[state], raw)
}

pub fn resolve_ward(index: &GeoIndex, state: &str, lga: &str, raw: &str) -> Option<GeoEntry> {
    resolve_level(index, GeoLevel::Ward, &[state, lga], raw)
}

pub fn resolve_polling_unit(
    index: &GeoIndex,
    state: &str,
    lga: &str,
    ward: &str,
    raw: &str,
) -> Option<GeoEntry> {
    resolve_level(index, GeoLevel::PollingUnit, &[state, lga, ward], raw)
}

/// Resolve `raw` at `level`; `parent_keys` must name exactly the level's ancestors.
pub fn resolve_level(
    index: &GeoIndex,
    level: GeoLevel,
    parent_keys: &[&str],
    raw: &str,
) -> Option<GeoEntry> {
    if parent_keys.len() != level.depth() {
        return None;
    }
    index.resolve(parent_keys, raw).map(|node| node.entry())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::GeoIndexBuilder;
    use crate::models::GeoRecord;

    fn index() -> GeoIndex {
        let mut builder = GeoIndexBuilder::new();
        for record in [
            GeoRecord::new("Lagos", Some("LA"))
                .with_lga("Ikeja", Some("LA-IK"))
                .with_ward("Ward 1", Some("LA-IK-W1"))
                .with_polling_unit("PU 001", Some("LA-IK-W1-PU001")),
            // Same LGA name under another state
            GeoRecord::new("Ogun", Some("OG"))
                .with_lga("Ikeja", Some("OG-IK"))
                .with_ward("Ward 1", Some("OG-IK-W1")),
        ] {
            builder.insert(&record).unwrap();
        }
        builder.finish()
    }

    #[test]
    fn test_each_level() {
        let index = index();
        assert_eq!(resolve_state(&index, " LAGOS").unwrap().code, "LA");
        assert_eq!(resolve_lga(&index, "LA", "ikeja").unwrap().code, "LA-IK");
        assert_eq!(
            resolve_ward(&index, "LA", "LA-IK", "WARD 1").unwrap().code,
            "LA-IK-W1"
        );
        let pu = resolve_polling_unit(&index, "LA", "LA-IK", "LA-IK-W1", "pu  001").unwrap();
        assert_eq!(pu.name, "PU 001");
        assert_eq!(pu.level, GeoLevel::PollingUnit);
    }

    #[test]
    fn test_parent_scopes_lookup() {
        let index = index();
        assert_eq!(resolve_lga(&index, "OG", "Ikeja").unwrap().code, "OG-IK");
        assert_eq!(resolve_lga(&index, "Ogun", "Ikeja").unwrap().code, "OG-IK");
        assert!(resolve_polling_unit(&index, "OG", "OG-IK", "OG-IK-W1", "PU 001").is_none());
    }

    #[test]
    fn test_unknown_ancestor_does_not_fall_back() {
        let index = index();
        assert!(resolve_lga(&index, "Kano", "Ikeja").is_none());
        assert!(resolve_ward(&index, "LA", "Epe", "Ward 1").is_none());
    }

    #[test]
    fn test_wrong_number_of_parents() {
        let index = index();
        assert!(resolve_level(&index, GeoLevel::Ward, &["LA"], "Ward 1").is_none());
        assert!(resolve_level(&index, GeoLevel::State, &["LA"], "Ikeja").is_none());
    }

    #[test]
    fn test_blank_input_is_unresolved() {
        let index = index();
        assert!(resolve_state(&index, "   ").is_none());
    }
}
