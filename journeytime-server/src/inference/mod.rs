//! Pre-trained regression models.
//!
//! Models are opaque predictors behind the [`Regressor`] trait. The
//! [`ModelRegistry`] owns the one generic stop-to-stop model and hands out
//! per-line end-to-end models when they exist.

mod artifact;
mod error;
mod registry;

pub use artifact::{ModelArtifact, ModelKind, Node, Regressor, Tree};
pub use error::ModelError;
pub use registry::{END_TO_END_DIR, ModelConfig, ModelRegistry, STOP_TO_STOP_DIR};
