use thiserror::Error;

use super::capability::Feature;
use crate::core::io::pdb::PdbError;
use crate::core::io::table::TableError;
use crate::core::selection::SelectionError;
use crate::core::trajectory::TrajectoryError;
use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to read input file: {0}")]
    Parse(#[from] PdbError),

    #[error("Selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("At least {required} residues are required, but the selection contains {found}")]
    InsufficientAtoms { required: usize, found: usize },

    #[error(
        "Degenerate trajectory: residues {residues:?} have no positional fluctuation, so their correlations are undefined"
    )]
    DegenerateTrajectory { residues: Vec<usize> },

    #[error("Trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),

    #[error("Capability '{0}' is not available in this deployment")]
    DependencyUnavailable(Feature),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("No residue in the requested models and chains has both phi and psi in class '{0}'")]
    NoBackboneAngles(String),

    #[error("Table export failed: {0}")]
    Table(#[from] TableError),
}

impl AnalysisError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
