//! Line catalog: which lines the schedule knows and which have models.
//!
//! Readers take an immutable snapshot; a refresh builds a new snapshot and
//! swaps it in whole, so a request never sees a half-updated catalog.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::LineName;
use crate::inference::{ModelError, ModelRegistry};
use crate::schedule::ScheduleStore;

/// An immutable view of the supported lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineCatalog {
    valid_lines: BTreeSet<LineName>,
    modelled_lines: BTreeSet<LineName>,
}

impl LineCatalog {
    pub fn new(valid_lines: BTreeSet<LineName>, modelled_lines: BTreeSet<LineName>) -> Self {
        Self {
            valid_lines,
            modelled_lines,
        }
    }

    /// Whether the schedule has any route with this short name.
    pub fn is_valid(&self, line: &LineName) -> bool {
        self.valid_lines.contains(line)
    }

    /// Whether an end-to-end model is listed for this line.
    pub fn has_model(&self, line: &LineName) -> bool {
        self.modelled_lines.contains(line)
    }

    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            valid_lines: self.valid_lines.len(),
            modelled_lines: self.modelled_lines.len(),
        }
    }
}

/// Sizes of a catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub valid_lines: usize,
    pub modelled_lines: usize,
}

/// Shared, refreshable handle to the current catalog snapshot.
#[derive(Clone)]
pub struct Catalog {
    current: Arc<RwLock<Arc<LineCatalog>>>,
    schedule: Arc<dyn ScheduleStore>,
    models: Arc<ModelRegistry>,
}

impl Catalog {
    /// Build the initial snapshot.
    pub fn build(
        schedule: Arc<dyn ScheduleStore>,
        models: Arc<ModelRegistry>,
    ) -> Result<Self, ModelError> {
        let snapshot = scan(schedule.as_ref(), &models)?;
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
            schedule,
            models,
        })
    }

    /// The current snapshot.
    pub async fn snapshot(&self) -> Arc<LineCatalog> {
        let guard = self.current.read().await;
        Arc::clone(&guard)
    }

    /// Rescan the schedule and model directory.
    ///
    /// On success, replaces the current snapshot. On failure, the existing
    /// snapshot is preserved and the error is returned.
    pub async fn refresh(&self) -> Result<CatalogCounts, ModelError> {
        let schedule = Arc::clone(&self.schedule);
        let models = Arc::clone(&self.models);
        let snapshot =
            tokio::task::spawn_blocking(move || scan(schedule.as_ref(), &models)).await??;
        let counts = snapshot.counts();

        let mut guard = self.current.write().await;
        *guard = Arc::new(snapshot);

        Ok(counts)
    }
}

fn scan(schedule: &dyn ScheduleStore, models: &ModelRegistry) -> Result<LineCatalog, ModelError> {
    Ok(LineCatalog::new(
        schedule.line_names(),
        models.available_line_models()?,
    ))
}
