use super::{ensure_parent_dir, with_suffix};
use crate::cli::RamachandranArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use simana::analysis::capability::BuiltinCapabilities;
use simana::analysis::ramachandran::RamachandranCategory;
use simana::core::io::load;
use simana::core::io::table::write_records_to_path;
use simana::render::default_renderer;
use simana::workflows;
use simana::workflows::config::{ModelSelection, RamachandranConfigBuilder};
use tracing::info;

pub fn run(args: RamachandranArgs, config: PartialConfig) -> Result<()> {
    let defaults = config.analysis_defaults()?;
    let mut builder = RamachandranConfigBuilder::new()
        .category(args.plot_type.parse::<RamachandranCategory>()?)
        .models(if args.all_models {
            ModelSelection::All
        } else {
            ModelSelection::Single(args.model)
        })
        .chain(args.chain)
        .max_dpi(defaults.max_dpi);
    if let Some(dpi) = args.dpi {
        builder = builder.dpi(dpi);
    }
    let analysis_config = builder.build()?;

    info!("Reading structure from {:?}", args.input);
    let (system, models) = load(&args.input, args.trajectory.as_deref())?;

    let renderer = default_renderer();
    let report = workflows::ramachandran::run(
        &system,
        &models,
        &analysis_config,
        renderer.as_ref(),
        &BuiltinCapabilities,
    )?;

    let png_path = with_suffix(&args.output, ".png");
    let csv_path = with_suffix(&args.output, ".csv");
    ensure_parent_dir(&png_path)?;
    std::fs::write(&png_path, &report.plot)?;
    write_records_to_path(&csv_path, &report.angles)?;

    info!(
        plot = %png_path.display(),
        table = %csv_path.display(),
        points = report.point_count,
        "Wrote Ramachandran report."
    );
    Ok(())
}
