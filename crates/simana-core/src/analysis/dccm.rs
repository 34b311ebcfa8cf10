use super::coordinates::FrameTensor;
use super::error::AnalysisError;
use super::matrix::PairwiseMatrix;
use nalgebra::{DMatrix, Vector3};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Mean-square fluctuation (Å²) below which a residue counts as motionless.
pub const MIN_FLUCTUATION: f64 = 1e-12;

/// What to do with residues whose fluctuation is too small to normalize by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegeneratePolicy {
    /// Fail with [`AnalysisError::DegenerateTrajectory`].
    #[default]
    Reject,
    /// Fill the residue's row and column, diagonal included, with NaN.
    Mask,
}

impl fmt::Display for DegeneratePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegeneratePolicy::Reject => f.write_str("reject"),
            DegeneratePolicy::Mask => f.write_str("mask"),
        }
    }
}

impl FromStr for DegeneratePolicy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(DegeneratePolicy::Reject),
            "mask" => Ok(DegeneratePolicy::Mask),
            other => Err(AnalysisError::invalid_parameter(
                "degenerate_policy",
                format!("unknown policy '{other}' (expected 'reject' or 'mask')"),
            )),
        }
    }
}

/// Covariance of residue displacements summed over frames and axes:
/// `C[i][j] = Σ_t Σ_d f[t,i,d] · f[t,j,d]`, with `f` the deviation from the mean position.
fn fluctuation_covariance(tensor: &FrameTensor) -> DMatrix<f64> {
    let n = tensor.residue_count();
    let t = tensor.frame_count();

    let mut means = vec![Vector3::zeros(); n];
    for frame in 0..t {
        for (mean, position) in means.iter_mut().zip(tensor.frame(frame)) {
            *mean += position.coords;
        }
    }
    for mean in &mut means {
        *mean /= t as f64;
    }

    // One column per residue, one row per (frame, axis).
    let fluctuations = DMatrix::from_fn(3 * t, n, |row, residue| {
        let (frame, axis) = (row / 3, row % 3);
        tensor.position(frame, residue)[axis] - means[residue][axis]
    });
    fluctuations.transpose() * &fluctuations
}

/// Builds the dynamic cross-correlation matrix of a superposed trajectory.
///
/// `R[i][j] = C[i][j] / sqrt(C[i][i] · C[j][j])`, clamped to `[-1, 1]`, with an exact
/// diagonal of 1. Residues whose mean-square fluctuation `C[i][i] / T` is below
/// [`MIN_FLUCTUATION`] are handled per `policy`; a single-frame trajectory makes every
/// residue degenerate.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientAtoms`] for fewer than two residues.
/// - [`AnalysisError::DegenerateTrajectory`] under [`DegeneratePolicy::Reject`].
pub fn build_dccm(
    tensor: &FrameTensor,
    policy: DegeneratePolicy,
) -> Result<PairwiseMatrix, AnalysisError> {
    let n = tensor.residue_count();
    if n < 2 {
        return Err(AnalysisError::InsufficientAtoms {
            required: 2,
            found: n,
        });
    }
    let frames = tensor.frame_count().max(1) as f64;

    let covariance = fluctuation_covariance(tensor);
    let degenerate: Vec<usize> = (0..n)
        .filter(|&i| covariance[(i, i)] / frames < MIN_FLUCTUATION)
        .collect();

    if !degenerate.is_empty() {
        match policy {
            DegeneratePolicy::Reject => {
                return Err(AnalysisError::DegenerateTrajectory {
                    residues: degenerate,
                });
            }
            DegeneratePolicy::Mask => {
                warn!(
                    count = degenerate.len(),
                    "Masking residues without positional fluctuation."
                );
            }
        }
    }

    let mut is_degenerate = vec![false; n];
    for &i in &degenerate {
        is_degenerate[i] = true;
    }

    let mut matrix = PairwiseMatrix::zeros(n);
    for i in 0..n {
        for j in i..n {
            let value = if is_degenerate[i] || is_degenerate[j] {
                f64::NAN
            } else if i == j {
                1.0
            } else {
                let norm = (covariance[(i, i)] * covariance[(j, j)]).sqrt();
                (covariance[(i, j)] / norm).clamp(-1.0, 1.0)
            };
            matrix.set_symmetric(i, j, value);
        }
    }

    debug!(
        residues = n,
        frames = tensor.frame_count(),
        masked = degenerate.len(),
        "Computed dynamic cross-correlation matrix."
    );
    Ok(matrix)
}
