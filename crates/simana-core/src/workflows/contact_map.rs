use super::config::ContactMapConfig;
use super::report::MatrixReport;
use crate::analysis::capability::{Capabilities, Feature, require};
use crate::analysis::contact_map::build_contact_map;
use crate::analysis::coordinates::extract_static;
use crate::analysis::error::AnalysisError;
use crate::core::models::system::MolecularSystem;
use crate::core::selection::{SelectionRule, select};
use crate::render::Renderer;
use tracing::{info, instrument};

/// Computes the alpha-carbon contact map of a static structure and renders it.
///
/// # Errors
///
/// Fails if a required capability is missing, no alpha carbons are found, fewer than two
/// residues are selected, or rendering fails.
#[instrument(skip_all, name = "contact_map_workflow")]
pub fn run(
    system: &MolecularSystem,
    config: &ContactMapConfig,
    renderer: &dyn Renderer,
    capabilities: &dyn Capabilities,
) -> Result<MatrixReport, AnalysisError> {
    require(capabilities, &[Feature::StructureAnalysis, Feature::Plotting])?;

    let selection = select(system, SelectionRule::AlphaCarbon)?;
    let tensor = extract_static(system, &selection)?;
    let matrix = build_contact_map(tensor.frame(0), config.cutoff, config.search.strategy())?;
    info!(
        residues = matrix.size(),
        cutoff = config.cutoff,
        "Built residue contact map."
    );

    let plot = renderer.heatmap(&matrix, &config.style)?;
    Ok(MatrixReport::new(plot, matrix, selection.residues().clone()))
}
