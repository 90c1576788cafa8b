use super::{clamp_score, ScoringError, SleepScorer};
use crate::habits::FeatureVector;
use ndarray::{concatenate, s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const TERMS: usize = FeatureVector::LEN + 1;

/// Least-squares linear regressor over the six habit features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: [f64; FeatureVector::LEN],
}

/// Stacks feature vectors into an `n x 6` matrix, one row per sample.
pub fn feature_matrix(rows: &[FeatureVector]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), FeatureVector::LEN), |(i, j)| rows[i].0[j])
}

impl LinearModel {
    /// Fits by solving the normal equations `XᵀX w = Xᵀy`, where `X` is the
    /// feature matrix with a leading column of ones.
    pub fn fit(
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> Result<Self, ScoringError> {
        let rows = features.nrows();
        if features.ncols() != FeatureVector::LEN || targets.len() != rows {
            return Err(ScoringError::ShapeMismatch {
                rows,
                columns: features.ncols(),
                targets: targets.len(),
            });
        }
        if rows < TERMS {
            return Err(ScoringError::InsufficientRows {
                required: TERMS,
                actual: rows,
            });
        }

        let ones = Array2::<f64>::ones((rows, 1));
        let design = concatenate(Axis(1), &[ones.view(), features.view()]).map_err(|_| {
            ScoringError::ShapeMismatch {
                rows,
                columns: features.ncols(),
                targets: targets.len(),
            }
        })?;

        let gram = design.t().dot(&design);
        let moment = design.t().dot(&targets);
        let weights = solve(gram, moment)?;

        let mut coefficients = [0.0; FeatureVector::LEN];
        for (slot, weight) in coefficients.iter_mut().zip(weights.slice(s![1..])) {
            *slot = *weight;
        }

        Ok(Self {
            intercept: weights[0],
            coefficients,
        })
    }

    /// Unclamped linear response.
    pub fn raw(&self, features: &FeatureVector) -> f64 {
        features
            .as_slice()
            .iter()
            .zip(self.coefficients)
            .fold(self.intercept, |acc, (value, weight)| acc + value * weight)
    }

    /// Clamped scores for every row of an `n x 6` feature matrix.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        let weights = Array1::from(self.coefficients.to_vec());
        (features.dot(&weights) + self.intercept).mapv(clamp_score)
    }

    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let raw = fs::read_to_string(path).map_err(|source| ScoringError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScoringError> {
        let body = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ScoringError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, body).map_err(|source| ScoringError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl SleepScorer for LinearModel {
    fn name(&self) -> &'static str {
        "linear-least-squares"
    }

    fn score(&self, features: &FeatureVector) -> f64 {
        clamp_score(self.raw(features))
    }
}

/// Gaussian elimination with partial pivoting on a square system.
fn solve(mut matrix: Array2<f64>, mut rhs: Array1<f64>) -> Result<Array1<f64>, ScoringError> {
    let n = rhs.len();
    let largest = matrix.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
    let tolerance = largest * f64::EPSILON * n as f64;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| matrix[[a, col]].abs().total_cmp(&matrix[[b, col]].abs()))
            .unwrap_or(col);
        if matrix[[pivot, col]].abs() <= tolerance {
            return Err(ScoringError::SingularSystem);
        }

        if pivot != col {
            for k in 0..n {
                matrix.swap([col, k], [pivot, k]);
            }
            rhs.swap(col, pivot);
        }

        let pivot_row = matrix.row(col).to_owned();
        for row in (col + 1)..n {
            let factor = matrix[[row, col]] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            matrix.row_mut(row).scaled_add(-factor, &pivot_row);
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail = matrix
            .slice(s![row, row + 1..])
            .dot(&solution.slice(s![row + 1..]));
        solution[row] = (rhs[row] - tail) / matrix[[row, row]];
    }

    Ok(solution)
}
