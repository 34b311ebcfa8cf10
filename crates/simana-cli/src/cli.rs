use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "SimAna Developers",
    version,
    about = "SimAna CLI - residue contact maps, dynamic cross-correlation matrices, B-factor profiles and Ramachandran plots for molecular-dynamics data.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S analysis.contact-cutoff=6.5
    #[arg(
        short = 'S',
        long = "set",
        value_name = "KEY=VALUE",
        global = true,
        num_args(0..)
    )]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP analysis service.
    Serve(ServeArgs),
    /// Compute and plot the alpha-carbon contact map of a structure.
    ContactMap(ContactMapArgs),
    /// Compute and plot the dynamic cross-correlation matrix of a trajectory.
    Dccm(DccmArgs),
    /// Compute and plot per-residue B-factor statistics.
    Bfactor(BfactorArgs),
    /// Compute backbone phi/psi angles and draw a Ramachandran plot.
    Ramachandran(RamachandranArgs),
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to listen on, overriding `server.bind`.
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Maximum request body size in megabytes, overriding `server.max-upload-mb`.
    #[arg(long, value_name = "MB")]
    pub max_upload_mb: Option<usize>,

    /// Directory in which per-request upload directories are created,
    /// overriding `staging.directory`.
    #[arg(long, value_name = "PATH")]
    pub staging_dir: Option<PathBuf>,
}

/// Output options shared by the offline analysis commands.
#[derive(Args, Debug, Clone)]
pub struct PlotArgs {
    /// Output prefix; writes `<PREFIX>.png` and `<PREFIX>.csv`.
    #[arg(short, long, required = true, value_name = "PREFIX")]
    pub output: PathBuf,

    /// Matplotlib colormap name, optionally with an `_r` suffix.
    #[arg(long, value_name = "NAME")]
    pub cmap: Option<String>,

    /// Output resolution in dots per inch.
    #[arg(long, value_name = "DPI")]
    pub dpi: Option<u32>,

    /// Lower end of the color scale.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub vmin: Option<f64>,

    /// Upper end of the color scale.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub vmax: Option<f64>,

    /// Plot title.
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,
}

/// Arguments for the `contact-map` subcommand.
#[derive(Args, Debug)]
pub struct ContactMapArgs {
    /// Path to the input structure (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Contact distance cutoff in Angstroms, overriding `analysis.contact-cutoff`.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Pair search strategy (`pairwise` or `cell-grid`), overriding `analysis.contact-search`.
    #[arg(long, value_name = "STRATEGY")]
    pub search: Option<String>,

    /// Residue-index spacing of the axis ticks.
    #[arg(long, value_name = "INT")]
    pub ticks_gap: Option<usize>,

    #[command(flatten)]
    pub plot: PlotArgs,
}

/// Arguments for the `dccm` subcommand.
#[derive(Args, Debug)]
pub struct DccmArgs {
    /// Path to the topology structure (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Multi-model PDB trajectory. Without it, the models of the input structure are used.
    #[arg(short, long, value_name = "PATH")]
    pub trajectory: Option<PathBuf>,

    /// How to treat residues without fluctuation (`reject` or `mask`),
    /// overriding `analysis.degenerate-policy`.
    #[arg(long, value_name = "POLICY")]
    pub degenerate_policy: Option<String>,

    #[command(flatten)]
    pub plot: PlotArgs,
}

/// Arguments for the `bfactor` subcommand.
#[derive(Args, Debug)]
pub struct BfactorArgs {
    /// Path to the input structure (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output prefix; writes `<PREFIX>_curve.png`, `<PREFIX>_dist.png` and `<PREFIX>.csv`.
    #[arg(short, long, required = true, value_name = "PREFIX")]
    pub output: PathBuf,

    /// Draw a band of one standard deviation around the mean curve.
    #[arg(long)]
    pub show_std_dev: bool,

    /// Output resolution in dots per inch.
    #[arg(long, value_name = "DPI")]
    pub dpi: Option<u32>,
}

/// Arguments for the `ramachandran` subcommand.
#[derive(Args, Debug)]
pub struct RamachandranArgs {
    /// Path to the input structure (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Multi-model PDB whose models replace those of the input structure.
    #[arg(short, long, value_name = "PATH")]
    pub trajectory: Option<PathBuf>,

    /// Output prefix; writes `<PREFIX>.png` and `<PREFIX>.csv`.
    #[arg(short, long, required = true, value_name = "PREFIX")]
    pub output: PathBuf,

    /// Residue class to plot: 0 all, 1 general, 2 glycine, 3 proline, 4 pre-proline,
    /// 5 ile-val (numbers or names).
    #[arg(long, value_name = "TYPE", default_value = "0")]
    pub plot_type: String,

    /// Zero-based model to analyze.
    #[arg(long, value_name = "INT", default_value_t = 0, conflicts_with = "all_models")]
    pub model: usize,

    /// Analyze every model instead of one.
    #[arg(long)]
    pub all_models: bool,

    /// Restrict the analysis to one chain; all chains when omitted.
    #[arg(long, value_name = "ID")]
    pub chain: Option<char>,

    /// Output resolution in dots per inch.
    #[arg(long, value_name = "DPI")]
    pub dpi: Option<u32>,
}
