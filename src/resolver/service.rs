//! Normalization service: resolves a raw 4-tuple level by level.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::error::LoadError;
use crate::index::{Children, DatasetLoader, GeoEntry, GeoIndex, LoadReport, RecordSource};
use crate::models::{GeoLevel, LevelValue, NormalizedGeo, RawGeo};

/// Process-wide resolver instance.
static RESOLVER: OnceLock<Arc<GeoResolver>> = OnceLock::new();

/// Entry point used by request handlers.
pub struct GeoResolver {
    loader: DatasetLoader,
}

impl GeoResolver {
    pub fn new<S: RecordSource + 'static>(source: S) -> Self {
        Self {
            loader: DatasetLoader::new(source),
        }
    }

    /// Install the process-wide resolver. Returns the rejected instance if
    /// one was already installed.
    pub fn init_global(resolver: GeoResolver) -> Result<(), Arc<GeoResolver>> {
        RESOLVER.set(Arc::new(resolver))
    }

    /// The process-wide resolver, if installed.
    pub fn global() -> Option<&'static Arc<GeoResolver>> {
        RESOLVER.get()
    }

    pub fn ensure_loaded(&self) -> Result<(), LoadError> {
        self.loader.ensure_loaded()
    }

    pub fn is_loaded(&self) -> bool {
        self.loader.loaded().is_some()
    }

    pub fn source(&self) -> String {
        self.loader.describe_source()
    }

    /// Report of the successful load, if any.
    pub fn report(&self) -> Option<&LoadReport> {
        self.loader.loaded().map(GeoIndex::report)
    }

    /// Normalize raw identifiers. Never fails: if the dataset cannot be
    /// loaded every supplied value is echoed as its own code and name.
    pub fn normalize(&self, input: &RawGeo) -> NormalizedGeo {
        match self.loader.load() {
            Ok(index) => normalize_with_index(index, input),
            Err(e) => {
                warn!("Geographic dataset unavailable, echoing input: {}", e);
                normalize_degraded(input)
            }
        }
    }

    /// Entries directly below an ancestor path (empty path lists states).
    ///
    /// `Ok(None)` means an ancestor did not match.
    pub fn children(&self, parent_keys: &[&str]) -> Result<Option<Vec<GeoEntry>>, LoadError> {
        Ok(self.loader.load()?.children(parent_keys))
    }
}

/// Resolve state → LGA → ward → polling unit against a built index.
///
/// Each level is looked up among the children of the node resolved for
/// the level above, so a match is always scoped to its actual parent.
/// After the first unresolved level, lower levels keep their raw input as
/// the name with no code.
pub fn normalize_with_index(index: &GeoIndex, input: &RawGeo) -> NormalizedGeo {
    let mut levels: [LevelValue; 4] = Default::default();
    let mut scope: Option<&Children> = Some(index.states());

    for level in GeoLevel::all() {
        let raw = input.get(*level);
        let resolved = match (scope, raw) {
            (Some(children), Some(raw)) => children.lookup(raw),
            _ => None,
        };

        levels[level.depth()] = match resolved {
            Some(node) => {
                scope = Some(node.children());
                LevelValue::resolved(node.code(), node.name())
            }
            None => {
                if scope.is_some() {
                    debug!("Resolution stopped at {} ({:?})", level, raw);
                }
                scope = None;
                LevelValue::unresolved(raw)
            }
        };
    }

    NormalizedGeo::from_levels(levels, false)
}

/// Echo every supplied value as both code and name.
pub fn normalize_degraded(input: &RawGeo) -> NormalizedGeo {
    let levels = [
        LevelValue::echo(input.get(GeoLevel::State)),
        LevelValue::echo(input.get(GeoLevel::Lga)),
        LevelValue::echo(input.get(GeoLevel::Ward)),
        LevelValue::echo(input.get(GeoLevel::PollingUnit)),
    ];
    NormalizedGeo::from_levels(levels, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{FileSource, MemorySource};
    use crate::models::GeoRecord;

    fn resolver() -> GeoResolver {
        GeoResolver::new(MemorySource::new(vec![
            GeoRecord::new("Lagos", Some("LA"))
                .with_lga("Ikeja", Some("LA-IK"))
                .with_ward("Ward 1", Some("LA-IK-W1"))
                .with_polling_unit("PU 001", Some("LA-IK-W1-PU001")),
            GeoRecord::new("Lagos", Some("LA"))
                .with_lga("Epe", Some("LA-EP"))
                .with_ward("Ward 1", Some("LA-EP-W1")),
        ]))
    }

    fn raw(state: Option<&str>, lga: Option<&str>, ward: Option<&str>, pu: Option<&str>) -> RawGeo {
        RawGeo::new(state, lga, ward, pu)
    }

    #[test]
    fn test_all_levels_resolve() {
        let result = resolver().normalize(&raw(
            Some("lagos "),
            Some("IKEJA"),
            Some("ward 1"),
            Some("pu 001"),
        ));

        assert_eq!(result.state, LevelValue::resolved("LA", "Lagos"));
        assert_eq!(result.lga, LevelValue::resolved("LA-IK", "Ikeja"));
        assert_eq!(result.ward, LevelValue::resolved("LA-IK-W1", "Ward 1"));
        assert_eq!(
            result.polling_unit,
            LevelValue::resolved("LA-IK-W1-PU001", "PU 001")
        );
        assert!(result.is_complete);
        assert!(!result.degraded);
    }

    #[test]
    fn test_unknown_lga_short_circuits() {
        let result = resolver().normalize(&raw(
            Some("Lagos"),
            Some("Unknown LGA"),
            Some("Ward 1"),
            Some("PU 001"),
        ));

        assert_eq!(result.state, LevelValue::resolved("LA", "Lagos"));
        assert_eq!(result.lga, LevelValue::unresolved(Some("Unknown LGA")));
        assert_eq!(result.ward, LevelValue::unresolved(Some("Ward 1")));
        assert_eq!(result.polling_unit, LevelValue::unresolved(Some("PU 001")));
        assert!(!result.is_complete);
    }

    #[test]
    fn test_missing_source_degrades_to_echo() {
        let resolver = GeoResolver::new(FileSource::new("/nonexistent/geo.csv"));
        let result = resolver.normalize(&raw(Some("Lagos"), None, None, None));

        assert_eq!(result.state, LevelValue::resolved("Lagos", "Lagos"));
        assert_eq!(result.lga, LevelValue::default());
        assert_eq!(result.ward, LevelValue::default());
        assert_eq!(result.polling_unit, LevelValue::default());
        assert!(!result.is_complete);
        assert!(result.degraded);
    }

    #[test]
    fn test_degraded_completeness_from_presence() {
        let result = normalize_degraded(&raw(Some("A"), Some("B"), Some("C"), Some("D")));
        assert!(result.is_complete);
        let result = normalize_degraded(&raw(Some("A"), Some("B"), Some(" "), Some("D")));
        assert!(!result.is_complete);
        assert_eq!(result.ward, LevelValue::default());
    }

    #[test]
    fn test_ward_name_is_scoped_by_resolved_lga() {
        let resolver = resolver();
        let epe = resolver.normalize(&raw(Some("Lagos"), Some("Epe"), Some("Ward 1"), None));
        assert_eq!(epe.ward.code.as_deref(), Some("LA-EP-W1"));
        assert!(!epe.is_complete);
        assert_eq!(epe.polling_unit, LevelValue::default());
    }

    #[test]
    fn test_missing_middle_level_breaks_chain() {
        let input = raw(Some("Lagos"), None, Some("Ward 1"), Some("PU 001"));
        let result = resolver().normalize(&input);
        assert!(result.state.is_resolved());
        assert_eq!(result.lga, LevelValue::default());
        assert_eq!(result.ward, LevelValue::unresolved(Some("Ward 1")));
        assert!(!result.polling_unit.is_resolved());
    }

    #[test]
    fn test_short_circuit_is_monotonic() {
        let resolver = resolver();
        let inputs = [
            raw(Some("Lagos"), Some("Ikeja"), Some("Ward 1"), Some("PU 001")),
            raw(Some("Lagos"), Some("Ikeja"), Some("Ward 9"), Some("PU 001")),
            raw(Some("Kano"), Some("Ikeja"), Some("Ward 1"), Some("PU 001")),
            raw(None, Some("Ikeja"), None, Some("PU 001")),
            raw(Some("LA"), Some("la-ik"), Some("LA-IK-W1"), Some("pu 002")),
        ];

        for input in &inputs {
            let result = resolver.normalize(input);
            let mut broken = false;
            for level in GeoLevel::all() {
                let value = result.get(*level);
                if broken {
                    assert!(value.code.is_none(), "{:?} at {}", input, level);
                }
                broken |= !value.is_resolved();
            }
            let all_named = GeoLevel::all().iter().all(|l| result.get(*l).name.is_some());
            assert_eq!(result.is_complete, all_named && !broken);
        }
    }

    #[test]
    fn test_idempotent() {
        let resolver = resolver();
        let input = raw(Some(" LAGOS"), Some("ikeja"), Some("Ward 1"), Some("PU 001"));
        let first = serde_json::to_string(&resolver.normalize(&input)).unwrap();
        let second = serde_json::to_string(&resolver.normalize(&input)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_children_listing() {
        let resolver = resolver();
        let lgas = resolver.children(&["LA"]).unwrap().unwrap();
        let names: Vec<_> = lgas.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Epe", "Ikeja"]);
        assert!(resolver.children(&["Kano"]).unwrap().is_none());

        let missing = GeoResolver::new(FileSource::new("/nonexistent/geo.csv"));
        assert!(missing.children(&[]).is_err());
    }

    #[test]
    fn test_sibling_code_collision_stays_under_declared_parent() {
        let resolver = GeoResolver::new(MemorySource::new(vec![
            GeoRecord::new("Lagos", Some("LA"))
                .with_lga("Ikeja", Some("X1"))
                .with_ward("Ward A", Some("WA")),
            GeoRecord::new("Lagos", Some("LA"))
                .with_lga("Epe", Some("X1"))
                .with_ward("Ward B", Some("WB")),
        ]));

        let own = resolver.normalize(&raw(Some("Lagos"), Some("Epe"), Some("Ward B"), None));
        assert_eq!(own.ward, LevelValue::resolved("WB", "Ward B"));
        assert_ne!(own.lga.code.as_deref(), Some("X1"));

        let foreign = resolver.normalize(&raw(Some("Lagos"), Some("Epe"), Some("Ward A"), None));
        assert_eq!(foreign.ward, LevelValue::unresolved(Some("Ward A")));

        let first = resolver.normalize(&raw(Some("Lagos"), Some("Ikeja"), Some("Ward A"), None));
        assert_eq!(first.lga, LevelValue::resolved("X1", "Ikeja"));
        assert_eq!(first.ward, LevelValue::resolved("WA", "Ward A"));

        // The reassigned code leads back into Epe's subtree
        let epe_code = own.lga.code.unwrap();
        let children = resolver.children(&["LA", epe_code.as_str()]).unwrap().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Ward B");
    }

    #[test]
    fn test_duplicate_state_names_descend_into_first() {
        let resolver = GeoResolver::new(MemorySource::new(vec![
            GeoRecord::new("Lagos", Some("LA")).with_lga("Ikeja", Some("LA-IK")),
            GeoRecord::new("LAGOS", Some("LG")).with_lga("Epe", Some("LG-EP")),
        ]));

        // Both rows merge under the first-seen state; its code is kept
        let epe = resolver.normalize(&raw(Some("lagos"), Some("Epe"), None, None));
        assert_eq!(epe.state, LevelValue::resolved("LA", "Lagos"));
        assert_eq!(epe.lga, LevelValue::resolved("LG-EP", "Epe"));
    }

    #[test]
    fn test_sample_dataset() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample.csv");
        let resolver = GeoResolver::new(FileSource::new(path));

        let oyo = resolver.normalize(&raw(Some("OYO"), Some("ibadan  north"), None, None));
        assert_eq!(oyo.state, LevelValue::resolved("OY", "Ọ̀yọ́"));
        assert_eq!(oyo.lga.code.as_deref(), Some("OY-IBN"));

        // Ward without a source code gets a synthesized one
        let kano = resolver.normalize(&raw(Some("Kano"), Some("Dala"), Some("ward 3"), None));
        assert!(kano.lga.code.as_deref().unwrap().starts_with("LG-"));
        assert!(kano.ward.code.as_deref().unwrap().starts_with("WD-"));

        let report = resolver.report().unwrap();
        assert_eq!(report.records, 7);
        assert_eq!(report.count(GeoLevel::State), 4);
        assert_eq!(report.count(GeoLevel::PollingUnit), 5);
    }

    #[test]
    fn test_report_after_load() {
        let resolver = resolver();
        assert!(resolver.report().is_none());
        resolver.ensure_loaded().unwrap();
        assert!(resolver.is_loaded());
        assert_eq!(resolver.report().unwrap().count(GeoLevel::Ward), 2);
    }
}
