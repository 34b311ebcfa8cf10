use super::config::DccmConfig;
use super::report::MatrixReport;
use crate::analysis::capability::{Capabilities, Feature, require};
use crate::analysis::coordinates::extract_superposed;
use crate::analysis::dccm::build_dccm;
use crate::analysis::error::AnalysisError;
use crate::core::models::system::MolecularSystem;
use crate::core::selection::{SelectionRule, select};
use crate::core::trajectory::Trajectory;
use crate::render::Renderer;
use tracing::{info, instrument};

/// Superposes `trajectory` on its alpha carbons, computes the dynamic cross-correlation
/// matrix of their motion and renders it.
///
/// The trajectory is consumed: superposition rewrites its frames in place.
#[instrument(skip_all, name = "dccm_workflow")]
pub fn run(
    system: &MolecularSystem,
    trajectory: Trajectory,
    config: &DccmConfig,
    renderer: &dyn Renderer,
    capabilities: &dyn Capabilities,
) -> Result<MatrixReport, AnalysisError> {
    require(capabilities, &[Feature::TrajectoryAnalysis, Feature::Plotting])?;

    let selection = select(system, SelectionRule::AlphaCarbon)?;
    let frames = trajectory.len();
    let tensor = extract_superposed(trajectory, &selection)?;
    let matrix = build_dccm(&tensor, config.degenerate_policy)?;
    info!(
        residues = matrix.size(),
        frames,
        policy = %config.degenerate_policy,
        "Built dynamic cross-correlation matrix."
    );

    let plot = renderer.heatmap(&matrix, &config.style)?;
    Ok(MatrixReport::new(plot, matrix, selection.residues().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::capability::FixedCapabilities;
    use crate::analysis::dccm::DegeneratePolicy;
    use crate::core::models::atom::Atom;
    use crate::workflows::config::DccmConfigBuilder;
    use crate::workflows::test_support::RecordingRenderer;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    const ALPHAS: [[f64; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [3.8, 0.6, 0.0],
        [7.6, -0.4, 0.5],
        [11.0, 1.2, -0.3],
    ];

    fn system() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A');
        for (i, [x, y, z]) in ALPHAS.iter().copied().enumerate() {
            let residue = system
                .add_residue(chain, i as isize + 1, None, "GLY")
                .unwrap();
            let atom = Atom::new(i + 1, "CA", residue, Point3::new(x, y, z));
            system.add_atom_to_residue(residue, atom).unwrap();
        }
        system
    }

    /// Frames where residues 0 and 1 wobble together along z while 2 and 3 stay put,
    /// except for small independent motions that keep them non-degenerate.
    fn trajectory(system: &MolecularSystem) -> Trajectory {
        let mut trajectory = Trajectory::new(system.atom_count());
        let wobble = [0.0, 0.4, -0.3, 0.2, -0.5];
        for (t, &dz) in wobble.iter().enumerate() {
            let mut frame = system.positions();
            frame[0] += Vector3::new(0.0, 0.0, dz);
            frame[1] += Vector3::new(0.0, 0.0, dz);
            frame[2] += Vector3::new(0.05 * t as f64, 0.0, 0.0);
            frame[3] += Vector3::new(0.0, 0.04 * (t % 2) as f64, 0.0);
            trajectory.push_frame(frame).unwrap();
        }
        trajectory
    }

    #[test]
    fn produces_symmetric_unit_diagonal_matrix() {
        let system = system();
        let config = DccmConfigBuilder::new().build().unwrap();

        let report = run(
            &system,
            trajectory(&system),
            &config,
            &RecordingRenderer::default(),
            &FixedCapabilities::all(),
        )
        .unwrap();

        assert_eq!(report.residue_count, 4);
        assert!(report.matrix.is_symmetric(1e-12));
        for i in 0..4 {
            assert_relative_eq!(report.matrix.get(i, i), 1.0, epsilon = 1e-9);
            for j in 0..4 {
                let value = report.matrix.get(i, j);
                assert!((-1.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn single_frame_is_rejected_by_default() {
        let system = system();
        let config = DccmConfigBuilder::new().build().unwrap();

        let err = run(
            &system,
            Trajectory::from_system(&system),
            &config,
            &RecordingRenderer::default(),
            &FixedCapabilities::all(),
        )
        .unwrap_err();

        match err {
            AnalysisError::DegenerateTrajectory { residues } => {
                assert_eq!(residues, vec![0, 1, 2, 3]);
            }
            other => panic!("expected DegenerateTrajectory, got {other:?}"),
        }
    }

    #[test]
    fn single_frame_is_masked_on_request() {
        let system = system();
        let config = DccmConfigBuilder::new()
            .degenerate_policy(DegeneratePolicy::Mask)
            .build()
            .unwrap();

        let report = run(
            &system,
            Trajectory::from_system(&system),
            &config,
            &RecordingRenderer::default(),
            &FixedCapabilities::all(),
        )
        .unwrap();

        assert!(report.matrix.rows().iter().flatten().all(|v| v.is_nan()));
    }

    #[test]
    fn requires_trajectory_capability() {
        let system = system();
        let config = DccmConfigBuilder::new().build().unwrap();
        let capabilities = FixedCapabilities::new([Feature::StructureAnalysis, Feature::Plotting]);

        let err = run(
            &system,
            trajectory(&system),
            &config,
            &RecordingRenderer::default(),
            &capabilities,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::DependencyUnavailable(Feature::TrajectoryAnalysis)
        ));
    }

    #[test]
    fn empty_trajectory_is_a_trajectory_error() {
        let system = system();
        let config = DccmConfigBuilder::new().build().unwrap();

        let err = run(
            &system,
            Trajectory::new(system.atom_count()),
            &config,
            &RecordingRenderer::default(),
            &FixedCapabilities::all(),
        )
        .unwrap_err();

        assert!(matches!(err, AnalysisError::Trajectory(_)));
    }
}
