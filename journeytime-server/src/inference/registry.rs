//! Model registry: the generic artifact plus per-line artifacts on disk.
//!
//! Layout under the model root:
//!
//! ```text
//! stop_to_stop/<file>.json   generic segment model, loaded once
//! end_to_end/<LINE>.json     optional per-line models
//! ```
//!
//! Per-line artifacts are cached by line and reloaded when the file's
//! modification time changes. File access happens off the async workers.

use std::collections::BTreeSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use moka::future::Cache as MokaCache;
use tracing::{debug, info};

use crate::domain::LineName;

use super::artifact::{ModelArtifact, Regressor};
use super::error::ModelError;

/// Directory holding the generic artifact.
pub const STOP_TO_STOP_DIR: &str = "stop_to_stop";
/// Directory holding per-line artifacts.
pub const END_TO_END_DIR: &str = "end_to_end";

const ARTIFACT_EXTENSION: &str = "json";

/// Configuration for the model registry.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model root directory
    pub root: PathBuf,
    /// File name of the generic artifact under `stop_to_stop/`
    pub stop_to_stop_file: String,
    /// Maximum number of per-line artifacts held in memory
    pub max_cached_lines: u64,
}

impl ModelConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stop_to_stop_file: "stop_to_stop.json".to_string(),
            max_cached_lines: 256,
        }
    }

    pub fn with_stop_to_stop_file(mut self, file: impl Into<String>) -> Self {
        self.stop_to_stop_file = file.into();
        self
    }

    pub fn with_max_cached_lines(mut self, n: u64) -> Self {
        self.max_cached_lines = n;
        self
    }

    pub fn stop_to_stop_path(&self) -> PathBuf {
        self.root
            .join(STOP_TO_STOP_DIR)
            .join(&self.stop_to_stop_file)
    }
}

#[derive(Debug, Clone)]
struct CachedModel {
    modified: Option<SystemTime>,
    model: Arc<ModelArtifact>,
}

/// Access to all regression artifacts.
pub struct ModelRegistry {
    end_to_end_dir: PathBuf,
    generic: Arc<dyn Regressor>,
    line_models: MokaCache<LineName, CachedModel>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("end_to_end_dir", &self.end_to_end_dir)
            .field("cached_line_models", &self.line_models.entry_count())
            .finish_non_exhaustive()
    }
}

impl ModelRegistry {
    /// Load the generic artifact and prepare the per-line cache.
    ///
    /// Fails if the generic artifact is missing or invalid.
    pub fn open(config: &ModelConfig) -> Result<Self, ModelError> {
        let path = config.stop_to_stop_path();
        let generic = ModelArtifact::load(&path)?;
        info!(
            path = %path.display(),
            features = generic.features.len(),
            "loaded stop-to-stop model"
        );
        Ok(Self::with_generic(config, Arc::new(generic)))
    }

    /// Build a registry around an already loaded generic model.
    pub fn with_generic(config: &ModelConfig, generic: Arc<dyn Regressor>) -> Self {
        let line_models = MokaCache::builder()
            .max_capacity(config.max_cached_lines)
            .build();

        Self {
            end_to_end_dir: config.root.join(END_TO_END_DIR),
            generic,
            line_models,
        }
    }

    /// The generic stop-to-stop model.
    pub fn generic(&self) -> &Arc<dyn Regressor> {
        &self.generic
    }

    /// Where the artifact for `line` would live, or `None` if the line name
    /// cannot be used as a file name.
    pub fn line_model_path(&self, line: &LineName) -> Option<PathBuf> {
        let name = line.as_str();
        if name.starts_with('.') || name.contains(['/', '\\']) {
            return None;
        }
        Some(
            self.end_to_end_dir
                .join(format!("{name}.{ARTIFACT_EXTENSION}")),
        )
    }

    /// The end-to-end model for `line`, if one exists.
    ///
    /// A missing file is `Ok(None)`. An unreadable or invalid file is an
    /// error.
    pub async fn line_model(&self, line: &LineName) -> Result<Option<Arc<dyn Regressor>>, ModelError> {
        let Some(path) = self.line_model_path(line) else {
            return Ok(None);
        };

        let modified = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.modified().ok(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.line_models.invalidate(line).await;
                return Ok(None);
            }
            Err(source) => return Err(ModelError::Io { path, source }),
        };

        if let Some(cached) = self.line_models.get(line).await {
            if modified.is_some() && cached.modified == modified {
                let model: Arc<dyn Regressor> = cached.model;
                return Ok(Some(model));
            }
            debug!(line = %line, "model file changed, reloading");
        }

        let load_path = path.clone();
        let artifact = tokio::task::spawn_blocking(move || ModelArtifact::load(&load_path)).await??;
        let artifact = Arc::new(artifact);
        self.line_models
            .insert(
                line.clone(),
                CachedModel {
                    modified,
                    model: Arc::clone(&artifact),
                },
            )
            .await;
        debug!(line = %line, path = %path.display(), "loaded end-to-end model");

        let model: Arc<dyn Regressor> = artifact;
        Ok(Some(model))
    }

    /// Every line with an artifact file in the end-to-end directory.
    ///
    /// A missing directory means no line models.
    pub fn available_line_models(&self) -> Result<BTreeSet<LineName>, ModelError> {
        list_artifacts(&self.end_to_end_dir)
    }
}

fn list_artifacts(dir: &Path) -> Result<BTreeSet<LineName>, ModelError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(source) => {
            return Err(ModelError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut lines = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|source| ModelError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
            continue;
        }
        if let Some(line) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| LineName::parse(s).ok())
        {
            lines.insert(line);
        }
    }
    Ok(lines)
}
