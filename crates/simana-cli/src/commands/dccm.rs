use super::write_matrix_report;
use crate::cli::DccmArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use simana::analysis::capability::BuiltinCapabilities;
use simana::analysis::dccm::DegeneratePolicy;
use simana::core::io::load;
use simana::render::default_renderer;
use simana::workflows;
use simana::workflows::config::DccmConfigBuilder;
use tracing::info;

pub fn run(args: DccmArgs, config: PartialConfig) -> Result<()> {
    let defaults = config.analysis_defaults()?;
    let policy = match &args.degenerate_policy {
        Some(name) => name.parse::<DegeneratePolicy>()?,
        None => defaults.degenerate_policy,
    };

    let mut builder = DccmConfigBuilder::new()
        .degenerate_policy(policy)
        .color_range(args.plot.vmin.unwrap_or(-1.0), args.plot.vmax.unwrap_or(1.0))
        .max_dpi(defaults.max_dpi);
    if let Some(cmap) = &args.plot.cmap {
        builder = builder.colormap(cmap.as_str());
    }
    if let Some(dpi) = args.plot.dpi {
        builder = builder.dpi(dpi);
    }
    if let Some(title) = &args.plot.title {
        builder = builder.title(title.as_str());
    }
    let analysis_config = builder.build()?;

    info!(
        "Reading topology from {:?} and trajectory from {:?}",
        args.input,
        args.trajectory.as_ref().unwrap_or(&args.input)
    );
    let (system, trajectory) = load(&args.input, args.trajectory.as_deref())?;
    info!(
        atoms = system.atom_count(),
        frames = trajectory.len(),
        "Loaded trajectory."
    );

    let renderer = default_renderer();
    let report = workflows::dccm::run(
        &system,
        trajectory,
        &analysis_config,
        renderer.as_ref(),
        &BuiltinCapabilities,
    )?;
    write_matrix_report(&args.plot.output, &report)
}
