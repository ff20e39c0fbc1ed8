//! Heading classification.
//!
//! Lines pass a cheap gate first; candidates are scored by a shared
//! [`HeadingModel`] and their levels are then stabilised per document with
//! [`LevelPins`].

mod classifier;
mod features;
mod linear;
mod model;
mod rules;

pub use classifier::{ClassifiedLine, HeadingClassifier, LevelPins};
pub use features::{
    DocumentStats, FeatureExtractor, FeatureVector, DEFAULT_BODY_SIZE, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use linear::{LinearArtifact, LinearModel};
pub use model::{load_model, HeadingModel, Prediction, DEFAULT_MODEL_PATH};
pub use rules::RuleModel;
