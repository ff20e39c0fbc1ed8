//! Pretrained multinomial logistic regression model.
//!
//! The artifact is a JSON file produced offline:
//!
//! ```json
//! {
//!   "name": "heading-lr-v1",
//!   "features": ["relative_size", "is_bold", ...],
//!   "classes": ["NONE", "H1", "H2", "H3"],
//!   "mean": [...], "scale": [...],
//!   "weights": [[...], [...], [...], [...]],
//!   "bias": [...]
//! }
//! ```
//!
//! Inputs are standardized with `mean`/`scale`, then scored per class with
//! `weights · x + bias` and normalized with softmax.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use super::model::{HeadingModel, Prediction};
use crate::error::{Error, Result};
use crate::model::HeadingLabel;

/// Serialized form of a [`LinearModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearArtifact {
    /// Model name
    #[serde(default = "default_name")]
    pub name: String,
    /// Feature names in input order; must match the extractor's order
    #[serde(default)]
    pub features: Vec<String>,
    /// Class label of each weight row
    pub classes: Vec<HeadingLabel>,
    /// Per-feature mean for standardization
    pub mean: Vec<f32>,
    /// Per-feature scale for standardization
    pub scale: Vec<f32>,
    /// One weight row per class
    pub weights: Vec<Vec<f32>>,
    /// One bias per class
    pub bias: Vec<f32>,
}

fn default_name() -> String {
    "linear".to_string()
}

/// A validated linear model ready for inference.
#[derive(Debug, Clone)]
pub struct LinearModel {
    name: String,
    classes: Vec<HeadingLabel>,
    mean: [f32; FEATURE_COUNT],
    scale: [f32; FEATURE_COUNT],
    weights: Vec<[f32; FEATURE_COUNT]>,
    bias: Vec<f32>,
}

impl LinearModel {
    /// Load and validate an artifact from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse and validate an artifact from JSON text.
    pub fn from_json(data: &str) -> Result<Self> {
        let artifact: LinearArtifact =
            serde_json::from_str(data).map_err(|e| Error::InvalidModel(e.to_string()))?;
        Self::from_artifact(artifact)
    }

    /// Validate an artifact.
    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self> {
        if !artifact.features.is_empty() && artifact.features != FEATURE_NAMES {
            return Err(Error::InvalidModel(format!(
                "feature order {:?} does not match {:?}",
                artifact.features, FEATURE_NAMES
            )));
        }

        let classes = artifact.classes.len();
        if classes == 0 || artifact.weights.len() != classes || artifact.bias.len() != classes {
            return Err(Error::InvalidModel(format!(
                "{} classes but {} weight rows and {} biases",
                classes,
                artifact.weights.len(),
                artifact.bias.len()
            )));
        }
        for (i, label) in artifact.classes.iter().enumerate() {
            if artifact.classes[..i].contains(label) {
                return Err(Error::InvalidModel(format!("duplicate class {}", label)));
            }
        }

        let mean = fixed(&artifact.mean, "mean")?;
        let scale = fixed(&artifact.scale, "scale")?;
        if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(Error::InvalidModel("scale entries must be finite and non-zero".into()));
        }
        let weights = artifact
            .weights
            .iter()
            .map(|row| fixed(row, "weights row"))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: artifact.name,
            classes: artifact.classes,
            mean,
            scale,
            weights,
            bias: artifact.bias,
        })
    }
}

fn fixed(values: &[f32], what: &str) -> Result<[f32; FEATURE_COUNT]> {
    values.try_into().map_err(|_| {
        Error::InvalidModel(format!(
            "{} has {} entries, expected {}",
            what,
            values.len(),
            FEATURE_COUNT
        ))
    })
}

impl HeadingModel for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, features: &FeatureVector) -> Prediction {
        let x = features.to_array();
        let z: Vec<f32> = (0..FEATURE_COUNT)
            .map(|i| (x[i] - self.mean[i]) / self.scale[i])
            .collect();

        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&z).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect();

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exp.iter().sum();

        // Classes missing from the artifact score zero.
        let mut scores = [0.0; 4];
        for (label, e) in self.classes.iter().zip(exp) {
            scores[label.index()] = e / total;
        }
        Prediction::from_scores(scores)
    }
}
