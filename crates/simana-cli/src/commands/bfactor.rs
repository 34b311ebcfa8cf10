use super::{ensure_parent_dir, with_suffix};
use crate::cli::BfactorArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use simana::analysis::capability::BuiltinCapabilities;
use simana::core::io::pdb::PdbFile;
use simana::core::io::table::write_records_to_path;
use simana::core::io::traits::MolecularFile;
use simana::render::default_renderer;
use simana::workflows;
use simana::workflows::config::BfactorConfigBuilder;
use tracing::info;

pub fn run(args: BfactorArgs, config: PartialConfig) -> Result<()> {
    let defaults = config.analysis_defaults()?;
    let mut builder = BfactorConfigBuilder::new()
        .show_std_dev(args.show_std_dev)
        .max_dpi(defaults.max_dpi);
    if let Some(dpi) = args.dpi {
        builder = builder.dpi(dpi);
    }
    let analysis_config = builder.build()?;

    info!("Reading structure from {:?}", args.input);
    let (system, _) = PdbFile::read_from_path(&args.input)?;

    let renderer = default_renderer();
    let report = workflows::bfactor::run(
        &system,
        &analysis_config,
        renderer.as_ref(),
        &BuiltinCapabilities,
    )?;

    let curve_path = with_suffix(&args.output, "_curve.png");
    let dist_path = with_suffix(&args.output, "_dist.png");
    let csv_path = with_suffix(&args.output, ".csv");
    ensure_parent_dir(&curve_path)?;
    std::fs::write(&curve_path, &report.curve_plot)?;
    std::fs::write(&dist_path, &report.dist_plot)?;
    write_records_to_path(&csv_path, &report.residue_data)?;

    info!(
        curve = %curve_path.display(),
        distribution = %dist_path.display(),
        table = %csv_path.display(),
        residues = report.residue_count,
        "Wrote B-factor report."
    );
    Ok(())
}
