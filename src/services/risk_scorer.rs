//! Credit-risk scoring capability.
//!
//! The decision engine only needs a class label (`P1`..`P4`) for four applicant
//! features. Where that label comes from is behind the [`RiskScorer`] trait:
//!
//! - [`ModelScorer`]: a multinomial linear classifier read from a JSON artifact
//! - [`FallbackScorer`]: always answers [`FALLBACK_CLASS`]
//!
//! [`load_scorer`] picks one at startup and never fails. A missing or broken
//! artifact means every application is scored as `P2`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Label used when no model is available.
pub const FALLBACK_CLASS: &str = "P2";

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 4;

/// Classifier inputs: `[age, income, credit_score, months_employed]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub age: u32,
    pub income: f64,
    pub credit_score: u32,
    pub months_employed: u32,
}

impl RiskFeatures {
    /// Features in the order the model was trained on.
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.age),
            self.income,
            f64::from(self.credit_score),
            f64::from(self.months_employed),
        ]
    }
}

/// Anything that can turn applicant features into a risk class label.
pub trait RiskScorer: Send + Sync + fmt::Debug {
    fn predict(&self, features: &RiskFeatures) -> String;

    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}

/// Scorer used when no model artifact could be loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackScorer;

impl RiskScorer for FallbackScorer {
    fn predict(&self, _features: &RiskFeatures) -> String {
        FALLBACK_CLASS.to_string()
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

/// Errors raised while loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("cannot read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("inconsistent model artifact: {0}")]
    Shape(String),
}

/// Optional feature standardisation applied before the linear scores.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scaling {
    pub mean: [f64; FEATURE_COUNT],
    pub std: [f64; FEATURE_COUNT],
}

/// On-disk model format.
///
/// ```json
/// {
///   "classes": ["P1", "P2", "P3", "P4"],
///   "coefficients": [[0.0, -0.5, -2.0, -0.5], ...],
///   "intercepts": [-0.5, 0.3, 0.3, -0.5],
///   "scaling": { "mean": [40, 3000, 650, 48], "std": [12, 1500, 100, 36] }
/// }
/// ```
#[derive(Debug, Deserialize)]
struct ModelArtifact {
    classes: Vec<String>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    #[serde(default)]
    scaling: Option<Scaling>,
}

/// Linear multi-class model: the class with the highest score wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelScorer {
    classes: Vec<String>,
    coefficients: Vec<[f64; FEATURE_COUNT]>,
    intercepts: Vec<f64>,
    scaling: Option<Scaling>,
}

impl ModelScorer {
    /// Read and validate a model artifact from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or its
    /// dimensions do not line up.
    pub fn from_path(path: &Path) -> Result<Self, ScorerError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a model artifact.
    ///
    /// # Errors
    ///
    /// See [`ModelScorer::from_path`].
    pub fn from_json(raw: &str) -> Result<Self, ScorerError> {
        let artifact: ModelArtifact = serde_json::from_str(raw)?;

        if artifact.classes.is_empty() {
            return Err(ScorerError::Shape("no classes".to_string()));
        }
        if artifact.coefficients.len() != artifact.classes.len()
            || artifact.intercepts.len() != artifact.classes.len()
        {
            return Err(ScorerError::Shape(format!(
                "{} classes but {} coefficient rows and {} intercepts",
                artifact.classes.len(),
                artifact.coefficients.len(),
                artifact.intercepts.len()
            )));
        }

        let coefficients = artifact
            .coefficients
            .into_iter()
            .map(|row| {
                <[f64; FEATURE_COUNT]>::try_from(row.as_slice()).map_err(|_| {
                    ScorerError::Shape(format!(
                        "coefficient row has {} values, expected {}",
                        row.len(),
                        FEATURE_COUNT
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(scaling) = &artifact.scaling {
            if scaling.std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                return Err(ScorerError::Shape(
                    "scaling std must be positive".to_string(),
                ));
            }
        }

        Ok(Self {
            classes: artifact.classes,
            coefficients,
            intercepts: artifact.intercepts,
            scaling: artifact.scaling,
        })
    }

    fn scaled(&self, features: &RiskFeatures) -> [f64; FEATURE_COUNT] {
        let mut x = features.to_vector();
        if let Some(scaling) = &self.scaling {
            for ((value, mean), std) in x.iter_mut().zip(scaling.mean).zip(scaling.std) {
                *value = (*value - mean) / std;
            }
        }
        x
    }
}

impl RiskScorer for ModelScorer {
    fn predict(&self, features: &RiskFeatures) -> String {
        let x = self.scaled(features);

        let mut best: Option<(usize, f64)> = None;
        for (index, (weights, intercept)) in
            self.coefficients.iter().zip(&self.intercepts).enumerate()
        {
            let score = intercept + weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
            // Strict comparison keeps the first class on ties
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        best.and_then(|(index, _)| self.classes.get(index))
            .cloned()
            .unwrap_or_else(|| FALLBACK_CLASS.to_string())
    }

    fn name(&self) -> &'static str {
        "model"
    }
}

/// Select the scorer for this process.
///
/// Returns a [`ModelScorer`] when `path` points at a valid artifact and a
/// [`FallbackScorer`] otherwise.
pub fn load_scorer(path: Option<&Path>) -> Arc<dyn RiskScorer> {
    let Some(path) = path else {
        tracing::warn!("RISK_MODEL_PATH not set, scoring every application as {}", FALLBACK_CLASS);
        return Arc::new(FallbackScorer);
    };

    match ModelScorer::from_path(path) {
        Ok(model) => {
            tracing::info!(
                path = %path.display(),
                classes = model.classes.len(),
                "Risk model loaded"
            );
            Arc::new(model)
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Risk model unavailable, scoring every application as {}",
                FALLBACK_CLASS
            );
            Arc::new(FallbackScorer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_MODEL: &str = include_str!("../../resources/risk_model.json");

    fn features(age: u32, income: f64, credit_score: u32, months_employed: u32) -> RiskFeatures {
        RiskFeatures {
            age,
            income,
            credit_score,
            months_employed,
        }
    }

    #[test]
    fn fallback_always_returns_p2() {
        let scorer = FallbackScorer;

        assert_eq!(scorer.predict(&features(18, 0.0, 0, 0)), "P2");
        assert_eq!(scorer.predict(&features(70, 90_000.0, 900, 400)), "P2");
    }

    #[test]
    fn sample_model_separates_strong_and_weak_applicants() {
        let model = ModelScorer::from_json(SAMPLE_MODEL).unwrap();

        assert_eq!(model.predict(&features(45, 6_000.0, 850, 120)), "P4");
        assert_eq!(model.predict(&features(22, 1_000.0, 450, 3)), "P1");
    }

    #[test]
    fn ties_resolve_to_first_class() {
        let model = ModelScorer::from_json(
            r#"{
                "classes": ["P2", "P3"],
                "coefficients": [[0, 0, 0, 0], [0, 0, 0, 0]],
                "intercepts": [1.0, 1.0]
            }"#,
        )
        .unwrap();

        assert_eq!(model.predict(&features(30, 2_000.0, 600, 12)), "P2");
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let result = ModelScorer::from_json(
            r#"{
                "classes": ["P1", "P2"],
                "coefficients": [[0, 0, 0, 0]],
                "intercepts": [0.0, 0.0]
            }"#,
        );

        assert!(matches!(result, Err(ScorerError::Shape(_))));
    }

    #[test]
    fn short_coefficient_row_is_rejected() {
        let result = ModelScorer::from_json(
            r#"{
                "classes": ["P1"],
                "coefficients": [[0, 0, 0]],
                "intercepts": [0.0]
            }"#,
        );

        assert!(matches!(result, Err(ScorerError::Shape(_))));
    }

    #[test]
    fn zero_std_is_rejected() {
        let result = ModelScorer::from_json(
            r#"{
                "classes": ["P1"],
                "coefficients": [[1, 1, 1, 1]],
                "intercepts": [0.0],
                "scaling": { "mean": [0, 0, 0, 0], "std": [1, 0, 1, 1] }
            }"#,
        );

        assert!(matches!(result, Err(ScorerError::Shape(_))));
    }

    #[test]
    fn missing_path_yields_fallback() {
        let scorer = load_scorer(None);

        assert_eq!(scorer.name(), "fallback");
        assert_eq!(scorer.predict(&features(30, 2_000.0, 700, 24)), FALLBACK_CLASS);
    }

    #[test]
    fn missing_file_yields_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let scorer = load_scorer(Some(&dir.path().join("absent.json")));

        assert_eq!(scorer.name(), "fallback");
    }

    #[test]
    fn malformed_file_yields_fallback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();

        let scorer = load_scorer(Some(file.path()));

        assert_eq!(scorer.name(), "fallback");
        assert_eq!(scorer.predict(&features(30, 2_000.0, 700, 24)), "P2");
    }

    #[test]
    fn valid_file_yields_model() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_MODEL.as_bytes()).unwrap();

        let scorer = load_scorer(Some(file.path()));

        assert_eq!(scorer.name(), "model");
        assert_eq!(scorer.predict(&features(45, 6_000.0, 850, 120)), "P4");
    }
}
