//! In-memory hierarchical index: state → LGA → ward → polling unit.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use serde::Serialize;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

use super::canonical::{canonicalize, NormalizedKey};
use crate::models::{GeoLevel, GeoRecord};

/// Canonical code and display name of an indexed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoEntry {
    pub level: GeoLevel,
    pub code: String,
    pub name: String,
}

/// A single node of the hierarchy. Polling units have no children.
#[derive(Debug)]
pub struct GeoNode {
    level: GeoLevel,
    code: String,
    name: String,
    children: Children,
}

impl GeoNode {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> GeoLevel {
        self.level
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn entry(&self) -> GeoEntry {
        GeoEntry {
            level: self.level,
            code: self.code.clone(),
            name: self.name.clone(),
        }
    }
}

/// Children of one parent, keyed by canonical name with a reverse map by
/// canonical code.
#[derive(Debug, Default)]
pub struct Children {
    by_name: HashMap<NormalizedKey, GeoNode>,
    by_code: HashMap<NormalizedKey, NormalizedKey>,
}

impl Children {
    /// Look up a child by an already canonicalized name
    pub fn by_name(&self, key: &str) -> Option<&GeoNode> {
        self.by_name.get(key)
    }

    /// Look up a child by an already canonicalized code
    pub fn by_code(&self, key: &str) -> Option<&GeoNode> {
        self.by_code.get(key).and_then(|name| self.by_name.get(name))
    }

    /// Match a raw input by canonical name, falling back to canonical code
    pub fn lookup(&self, raw: &str) -> Option<&GeoNode> {
        let key = canonicalize(raw);
        if key.is_empty() {
            return None;
        }
        self.by_name(&key).or_else(|| self.by_code(&key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoNode> {
        self.by_name.values()
    }
}

/// Counters collected while building the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Rows read from the source
    pub records: usize,
    /// Distinct nodes per level, state first
    pub nodes: [usize; 4],
    /// Nodes whose code had to be synthesized
    pub synthesized_codes: usize,
    /// Rows that spelled an existing node differently (first spelling kept)
    pub name_variants: usize,
    /// Rows that disagreed with the code already assigned to a node, or
    /// reused a code claimed by a sibling (the later sibling gets a
    /// synthesized code)
    pub code_conflicts: usize,
}

impl LoadReport {
    pub fn count(&self, level: GeoLevel) -> usize {
        self.nodes[level.depth()]
    }
}

/// The immutable, fully built index.
#[derive(Debug)]
pub struct GeoIndex {
    root: Children,
    report: LoadReport,
}

impl GeoIndex {
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn states(&self) -> &Children {
        &self.root
    }

    /// Walk to the children of the node identified by `parent_keys`.
    ///
    /// Each key is matched against child codes first, then child names.
    /// Codes are unique among siblings. Any miss fails the whole walk.
    pub fn walk(&self, parent_keys: &[&str]) -> Option<&Children> {
        let mut children = &self.root;
        for raw in parent_keys {
            let key = canonicalize(raw);
            let node = children
                .by_code(&key)
                .or_else(|| children.by_name(&key))?;
            children = &node.children;
        }
        Some(children)
    }

    /// Resolve `raw` among the children of `parent_keys`.
    ///
    /// Names are matched first; a child whose code equals the input is the
    /// fallback.
    pub fn resolve(&self, parent_keys: &[&str], raw: &str) -> Option<&GeoNode> {
        if parent_keys.len() >= GeoLevel::all().len() {
            return None;
        }
        self.walk(parent_keys)?.lookup(raw)
    }

    /// Entries directly below `parent_keys`, sorted by display name.
    pub fn children(&self, parent_keys: &[&str]) -> Option<Vec<GeoEntry>> {
        if parent_keys.len() >= GeoLevel::all().len() {
            return None;
        }
        let mut entries: Vec<GeoEntry> = self
            .walk(parent_keys)?
            .iter()
            .map(GeoNode::entry)
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        Some(entries)
    }
}

/// Builds a [`GeoIndex`] one record at a time.
#[derive(Debug, Default)]
pub struct GeoIndexBuilder {
    root: Children,
    report: LoadReport,
}

impl GeoIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> usize {
        self.report.records
    }

    /// Insert a record, creating intermediate nodes as needed.
    ///
    /// Duplicate canonical names under one parent resolve first-seen-wins:
    /// the first row's code and display name are kept and later rows only
    /// contribute descendants.
    pub fn insert(&mut self, record: &GeoRecord) -> Result<(), String> {
        let chain = record.chain()?;
        let report = &mut self.report;
        report.records += 1;

        let mut children = &mut self.root;
        let mut parent_code = String::new();

        for part in chain {
            let key = NormalizedKey::new(part.name);
            if key.is_empty() {
                return Err(format!(
                    "{} name '{}' is empty after canonicalization",
                    part.level, part.name
                ));
            }

            let Children { by_name, by_code } = children;
            let node = match by_name.entry(key) {
                Entry::Occupied(entry) => {
                    let node = entry.into_mut();
                    if node.name != part.name.trim() {
                        report.name_variants += 1;
                        debug!(
                            "{} '{}' also spelled '{}', keeping first",
                            part.level, node.name, part.name
                        );
                    }
                    if let Some(code) = part.code {
                        if code.trim() != node.code {
                            report.code_conflicts += 1;
                            debug!(
                                "{} '{}' has code '{}', ignoring '{}'",
                                part.level, node.name, node.code, code
                            );
                        }
                    }
                    node
                }
                Entry::Vacant(entry) => {
                    let mut code = match part.code {
                        Some(code) => code.trim().to_string(),
                        None => {
                            report.synthesized_codes += 1;
                            synthesize_code(part.level, &parent_code, entry.key())
                        }
                    };
                    if let Some(claimed) = by_code.get(&NormalizedKey::new(&code)) {
                        let replacement = synthesize_code(part.level, &parent_code, entry.key());
                        report.code_conflicts += 1;
                        report.synthesized_codes += 1;
                        debug!(
                            "{} code '{}' already claimed by '{}', using '{}' for '{}'",
                            part.level,
                            code,
                            claimed,
                            replacement,
                            part.name
                        );
                        code = replacement;
                    }
                    // A synthesized replacement can only collide through a hash clash;
                    // the node then stays reachable by name only
                    if let Entry::Vacant(slot) = by_code.entry(NormalizedKey::new(&code)) {
                        slot.insert(entry.key().clone());
                    }
                    report.nodes[part.level.depth()] += 1;
                    entry.insert(GeoNode {
                        level: part.level,
                        code,
                        name: part.name.trim().to_string(),
                        children: Children::default(),
                    })
                }
            };

            parent_code.clear();
            parent_code.push_str(&node.code);
            children = &mut node.children;
        }

        Ok(())
    }

    pub fn finish(self) -> GeoIndex {
        GeoIndex {
            root: self.root,
            report: self.report,
        }
    }
}

/// Deterministic code for a node the source gave no code to.
///
/// Derived from the parent's code and the node's canonical name, so the
/// same dataset always yields the same codes regardless of row order.
pub fn synthesize_code(level: GeoLevel, parent_code: &str, key: &NormalizedKey) -> String {
    let seed = format!("{}/{}", parent_code, key);
    let hash = xxh64(seed.as_bytes(), 0) & 0xFFFF_FFFF_FFFF;
    format!("{}-{:012X}", level.code_prefix(), hash)
}
