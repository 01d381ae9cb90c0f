//! Single-flight, cache-once loading of the reference dataset.

use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Instant;

use tracing::{debug, info};

use super::source::RecordSource;
use super::tree::{GeoIndex, GeoIndexBuilder};
use crate::error::LoadError;
use crate::models::GeoLevel;

/// Owns a dataset source and the index built from it.
///
/// The first caller builds the index while holding `load_lock`; callers
/// arriving meanwhile block on the same lock and then observe the published
/// index. Only success is cached, so a failed attempt is retried by the next
/// caller. Once published, reads never touch the lock.
pub struct DatasetLoader {
    source: Box<dyn RecordSource>,
    index: OnceLock<GeoIndex>,
    load_lock: Mutex<()>,
}

impl DatasetLoader {
    pub fn new<S: RecordSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            index: OnceLock::new(),
            load_lock: Mutex::new(()),
        }
    }

    /// Make sure the index is built.
    pub fn ensure_loaded(&self) -> Result<(), LoadError> {
        self.load().map(|_| ())
    }

    /// Get the index, building it on first use.
    pub fn load(&self) -> Result<&GeoIndex, LoadError> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }

        // The guarded value carries no state, so a poisoned lock is still usable
        let _guard = self
            .load_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(index) = self.index.get() {
            debug!("Dataset was loaded while waiting for the load lock");
            return Ok(index);
        }

        let index = self.build()?;
        Ok(self.index.get_or_init(|| index))
    }

    /// The index if it has already been built. Never triggers a load.
    pub fn loaded(&self) -> Option<&GeoIndex> {
        self.index.get()
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    fn build(&self) -> Result<GeoIndex, LoadError> {
        let started = Instant::now();
        info!("Loading geographic dataset from {}", self.source.describe());

        let records = self.source.read_records()?;
        let mut builder = GeoIndexBuilder::new();
        for (location, record) in &records {
            builder
                .insert(record)
                .map_err(|reason| LoadError::parse(format!("{}: {}", location, reason)))?;
        }

        if builder.records() == 0 {
            return Err(LoadError::parse(format!(
                "{}: dataset contains no records",
                self.source.describe()
            )));
        }

        let index = builder.finish();
        let report = index.report();
        info!(
            "Geographic index built from {} records in {:?}",
            report.records,
            started.elapsed()
        );
        for level in GeoLevel::all() {
            info!("  {}: {} entries", level, report.count(*level));
        }
        if report.synthesized_codes > 0 {
            info!("  {} codes synthesized", report.synthesized_codes);
        }
        if report.name_variants + report.code_conflicts > 0 {
            info!(
                "  {} name variants and {} code conflicts resolved first-seen-wins",
                report.name_variants, report.code_conflicts
            );
        }

        Ok(index)
    }
}
