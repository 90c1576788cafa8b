//! Sleep-quality scorers.
//!
//! Every scorer takes the fixed-order [`FeatureVector`] and returns an
//! estimate on the 0-100 scale.

mod model;
mod training;

pub use model::{feature_matrix, LinearModel};
pub use training::{train, SyntheticDataset, TrainingReport, DEFAULT_ROWS, DEFAULT_SEED};

use crate::habits::FeatureVector;
use std::path::PathBuf;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Opaque scoring collaborator.
pub trait SleepScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, features: &FeatureVector) -> f64;
}

/// Hand-written ground truth used to label synthetic training data.
///
/// `100 - 5*screen - 3*caffeine + steps/100 + 5*water - 4*stress - 5*device`,
/// clipped to 0-100.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceFormula;

impl ReferenceFormula {
    const INTERCEPT: f64 = 100.0;
    const WEIGHTS: [f64; FeatureVector::LEN] = [-5.0, -3.0, 0.01, 5.0, -4.0, -5.0];
}

impl SleepScorer for ReferenceFormula {
    fn name(&self) -> &'static str {
        "reference-formula"
    }

    fn score(&self, features: &FeatureVector) -> f64 {
        let raw = features
            .as_slice()
            .iter()
            .zip(Self::WEIGHTS)
            .fold(Self::INTERCEPT, |acc, (value, weight)| acc + value * weight);
        clamp_score(raw)
    }
}

pub(crate) fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return MIN_SCORE;
    }
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("training data is degenerate; least-squares system is singular")]
    SingularSystem,
    #[error("training needs at least {required} rows (got {actual})")]
    InsufficientRows { required: usize, actual: usize },
    #[error("expected {rows} targets for a {rows}x6 feature matrix (got {targets} targets, {columns} columns)")]
    ShapeMismatch {
        rows: usize,
        columns: usize,
        targets: usize,
    },
    #[error("failed to access model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("model artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
