use super::config::{ModelSelection, RamachandranConfig};
use super::report::RamachandranReport;
use crate::analysis::capability::{Capabilities, Feature, require};
use crate::analysis::error::AnalysisError;
use crate::analysis::ramachandran::backbone_dihedrals;
use crate::core::io::table::{TableError, write_records};
use crate::core::models::system::MolecularSystem;
use crate::core::trajectory::{Trajectory, TrajectoryError};
use crate::render::Renderer;
use tracing::{debug, info, instrument};

/// Computes backbone phi/psi over the configured models and chains, keeps the residues
/// of the requested class and renders the defined `(phi, psi)` pairs as a scatter plot.
///
/// Every model of `trajectory` is read against the topology of `system`.
#[instrument(skip_all, name = "ramachandran_workflow")]
pub fn run(
    system: &MolecularSystem,
    trajectory: &Trajectory,
    config: &RamachandranConfig,
    renderer: &dyn Renderer,
    capabilities: &dyn Capabilities,
) -> Result<RamachandranReport, AnalysisError> {
    require(capabilities, &[Feature::StructureAnalysis, Feature::Plotting])?;

    if let Some(chain) = config.chain {
        if system.find_chain_by_id(chain).is_none() {
            return Err(AnalysisError::invalid_parameter(
                "chain_id",
                format!("chain '{chain}' is not present in the structure"),
            ));
        }
    }

    let models = match config.models {
        ModelSelection::All => 0..trajectory.len(),
        ModelSelection::Single(model) => model..model + 1,
    };
    let mut angles = Vec::new();
    for model in models {
        let positions = trajectory
            .frame(model)
            .ok_or(TrajectoryError::FrameOutOfRange {
                frame: model,
                len: trajectory.len(),
            })?;
        let model_angles = backbone_dihedrals(system, positions, model, config.chain);
        debug!(model, residues = model_angles.len(), "Measured backbone torsions.");
        angles.extend(model_angles);
    }
    angles.retain(|a| config.category.admits(a.category));

    let points: Vec<(f64, f64)> = angles.iter().filter_map(|a| a.point()).collect();
    if points.is_empty() {
        return Err(AnalysisError::NoBackboneAngles(config.category.to_string()));
    }
    info!(
        residues = angles.len(),
        points = points.len(),
        category = %config.category,
        "Collected Ramachandran points."
    );

    let plot = renderer.scatter(&points, &config.style)?;
    let csv = if config.include_csv {
        let mut buffer = Vec::new();
        write_records(&mut buffer, &angles).map_err(|source| TableError::Csv {
            path: "<memory>".into(),
            source,
        })?;
        Some(buffer)
    } else {
        None
    };

    Ok(RamachandranReport {
        plot,
        file_type: "png",
        csv,
        category: config.category,
        point_count: points.len(),
        angles,
    })
}
