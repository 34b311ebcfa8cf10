use super::write_matrix_report;
use crate::cli::ContactMapArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use simana::analysis::capability::BuiltinCapabilities;
use simana::analysis::contact_map::ContactSearchKind;
use simana::core::io::pdb::PdbFile;
use simana::core::io::traits::MolecularFile;
use simana::render::default_renderer;
use simana::workflows;
use simana::workflows::config::ContactMapConfigBuilder;
use tracing::info;

pub fn run(args: ContactMapArgs, config: PartialConfig) -> Result<()> {
    let defaults = config.analysis_defaults()?;
    let search = match &args.search {
        Some(name) => name.parse::<ContactSearchKind>()?,
        None => defaults.contact_search,
    };

    let mut builder = ContactMapConfigBuilder::new()
        .cutoff(args.cutoff.unwrap_or(defaults.contact_cutoff))
        .search(search)
        .color_range(args.plot.vmin.unwrap_or(0.0), args.plot.vmax.unwrap_or(1.0))
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
    if let Some(gap) = args.ticks_gap {
        builder = builder.x_tick_gap(gap).y_tick_gap(gap);
    }
    let analysis_config = builder.build()?;

    info!("Reading structure from {:?}", args.input);
    let (system, metadata) = PdbFile::read_from_path(&args.input)?;
    if let Some(title) = &metadata.title {
        info!("Structure title: {}", title);
    }

    let renderer = default_renderer();
    let report = workflows::contact_map::run(
        &system,
        &analysis_config,
        renderer.as_ref(),
        &BuiltinCapabilities,
    )?;
    write_matrix_report(&args.plot.output, &report)
}
