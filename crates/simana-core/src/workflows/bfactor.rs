use super::config::BfactorConfig;
use super::report::BfactorReport;
use crate::analysis::bfactor::{density_histogram, residue_bfactors};
use crate::analysis::capability::{Capabilities, Feature, require};
use crate::analysis::error::AnalysisError;
use crate::core::models::system::MolecularSystem;
use crate::core::selection::{SelectionRule, select};
use crate::render::{Profile, Renderer};
use tracing::{info, instrument};

/// Summarizes per-residue B-factors of the protein atoms and renders the mean profile
/// and the distribution of residue means.
#[instrument(skip_all, name = "bfactor_workflow")]
pub fn run(
    system: &MolecularSystem,
    config: &BfactorConfig,
    renderer: &dyn Renderer,
    capabilities: &dyn Capabilities,
) -> Result<BfactorReport, AnalysisError> {
    require(capabilities, &[Feature::StructureAnalysis, Feature::Plotting])?;

    let selection = select(system, SelectionRule::Protein)?;
    let residue_data = residue_bfactors(system, &selection);
    info!(residues = residue_data.len(), "Computed per-residue B-factors.");

    let means: Vec<f64> = residue_data.iter().map(|r| r.mean_bfactor).collect();
    let profile = Profile {
        x: residue_data.iter().map(|r| r.residue as f64).collect(),
        y: means.clone(),
        spread: config
            .show_std_dev
            .then(|| residue_data.iter().map(|r| r.std_bfactor).collect()),
    };
    let curve_plot = renderer.profile(&profile, &config.curve)?;

    let histogram = density_histogram(&means, config.bins).ok_or_else(|| {
        AnalysisError::invalid_parameter("bfactor", "no finite B-factor values to bin")
    })?;
    let dist_plot = renderer.histogram(&histogram, &config.distribution)?;

    Ok(BfactorReport {
        curve_plot,
        dist_plot,
        residue_count: residue_data.len(),
        residue_data,
    })
}
