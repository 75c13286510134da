//! Regression artifact format and evaluation.
//!
//! Artifacts are JSON documents naming their input columns in order and
//! carrying either a linear model or an ensemble of regression trees whose
//! outputs are averaged. Trees are stored as flat node arrays rooted at
//! index 0, with every child index greater than its parent's.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

use super::error::ModelError;

/// A pre-trained model that maps one feature row to one scalar.
pub trait Regressor: Send + Sync + fmt::Debug {
    /// Input column names, in the order the model expects them.
    fn feature_names(&self) -> &[String];

    /// Predict a duration in seconds.
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// A regression artifact as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub features: Vec<String>,
    pub model: ModelKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Forest {
        trees: Vec<Tree>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Go `left` when the feature value is at most `threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl ModelArtifact {
    /// Read and validate an artifact file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let body = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&body).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check that the model is consistent with its declared features.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.features.len();
        if n == 0 {
            return Err(ModelError::Invalid("no features declared".to_string()));
        }

        match &self.model {
            ModelKind::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != n {
                    return Err(ModelError::Invalid(format!(
                        "{} coefficients for {n} features",
                        coefficients.len()
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::Invalid(
                        "non-finite linear parameter".to_string(),
                    ));
                }
            }
            ModelKind::Forest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::Invalid("forest has no trees".to_string()));
                }
                for (t, tree) in trees.iter().enumerate() {
                    tree.validate(n)
                        .map_err(|reason| ModelError::Invalid(format!("tree {t}: {reason}")))?;
                }
            }
        }
        Ok(())
    }

    fn check_columns(&self, features: &FeatureVector) -> Result<(), ModelError> {
        if features.has_columns(self.features.as_slice()) {
            Ok(())
        } else {
            Err(ModelError::FeatureMismatch {
                expected: self.features.clone(),
                actual: features.names().map(str::to_string).collect(),
            })
        }
    }
}

impl Regressor for ModelArtifact {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self.check_columns(features)?;
        let row: Vec<f64> = features.values().collect();

        let value = match &self.model {
            ModelKind::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(&row)
                        .map(|(c, x)| c * x)
                        .sum::<f64>()
            }
            ModelKind::Forest { trees } => {
                trees.iter().map(|t| t.evaluate(&row)).sum::<f64>() / trees.len() as f64
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite)
        }
    }
}

impl Tree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {i} splits on unknown feature {feature}"));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {i} has a NaN threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!("node {i} has invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("node {i} has a non-finite leaf"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. Terminates because children always
    /// follow their parent.
    fn evaluate(&self, row: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}
