use crate::cli::ServeArgs;
use crate::error::{CliError, Result};
use serde::Deserialize;
use simana::analysis::contact_map::{ContactSearchKind, DEFAULT_CONTACT_CUTOFF};
use simana::analysis::dccm::DegeneratePolicy;
use simana::workflows::config::DEFAULT_MAX_DPI;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 100;

/// Analysis defaults shared by the server and the offline commands.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisDefaults {
    pub contact_cutoff: f64,
    pub contact_search: ContactSearchKind,
    pub degenerate_policy: DegeneratePolicy,
    pub max_dpi: u32,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            contact_cutoff: DEFAULT_CONTACT_CUTOFF,
            contact_search: ContactSearchKind::default(),
            degenerate_policy: DegeneratePolicy::default(),
            max_dpi: DEFAULT_MAX_DPI,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
    /// Parent of the per-request staging directories; the system temp dir when unset.
    pub staging_dir: Option<PathBuf>,
    pub analysis: AnalysisDefaults,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialServerSection {
    bind: Option<String>,
    max_upload_mb: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialStagingSection {
    directory: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialAnalysisSection {
    contact_cutoff: Option<f64>,
    contact_search: Option<ContactSearchKind>,
    degenerate_policy: Option<DegeneratePolicy>,
    max_dpi: Option<u32>,
}

/// The configuration file as written, every field optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    server: Option<PartialServerSection>,
    staging: Option<PartialStagingSection>,
    analysis: Option<PartialAnalysisSection>,
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {kind} value for {key}: {value}")))
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file when one is given, then applies `--set` overrides.
    pub fn load(path: Option<&Path>, set_values: &[String]) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_set_values(set_values)?;
        Ok(config)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{kv_pair}'. Expected KEY=VALUE."
                )));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "server.bind" => {
                    self.server.get_or_insert_with(Default::default).bind = Some(value.to_string());
                }
                "server.max-upload-mb" => {
                    self.server.get_or_insert_with(Default::default).max_upload_mb =
                        Some(parse_value(key, value, "integer")?);
                }
                "staging.directory" => {
                    self.staging.get_or_insert_with(Default::default).directory =
                        Some(PathBuf::from(value));
                }
                "analysis.contact-cutoff" => {
                    self.analysis.get_or_insert_with(Default::default).contact_cutoff =
                        Some(parse_value(key, value, "float")?);
                }
                "analysis.contact-search" => {
                    let search = value
                        .parse::<ContactSearchKind>()
                        .map_err(|e| CliError::Config(e.to_string()))?;
                    self.analysis.get_or_insert_with(Default::default).contact_search =
                        Some(search);
                }
                "analysis.degenerate-policy" => {
                    let policy = value
                        .parse::<DegeneratePolicy>()
                        .map_err(|e| CliError::Config(e.to_string()))?;
                    self.analysis.get_or_insert_with(Default::default).degenerate_policy =
                        Some(policy);
                }
                "analysis.max-dpi" => {
                    self.analysis.get_or_insert_with(Default::default).max_dpi =
                        Some(parse_value(key, value, "integer")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{key}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolves the `[analysis]` section against built-in defaults.
    pub fn analysis_defaults(&self) -> Result<AnalysisDefaults> {
        let defaults = AnalysisDefaults::default();
        let Some(section) = &self.analysis else {
            return Ok(defaults);
        };
        let max_dpi = section.max_dpi.unwrap_or(defaults.max_dpi);
        if max_dpi < simana::workflows::config::MIN_DPI {
            return Err(CliError::Config(format!(
                "`analysis.max-dpi` must be at least {}, got {max_dpi}",
                simana::workflows::config::MIN_DPI
            )));
        }
        Ok(AnalysisDefaults {
            contact_cutoff: section.contact_cutoff.unwrap_or(defaults.contact_cutoff),
            contact_search: section.contact_search.unwrap_or(defaults.contact_search),
            degenerate_policy: section
                .degenerate_policy
                .unwrap_or(defaults.degenerate_policy),
            max_dpi,
        })
    }

    /// Produces the server configuration; flags in `args` take precedence.
    pub fn merge_with_cli(self, args: &ServeArgs) -> Result<ServerConfig> {
        let analysis = self.analysis_defaults()?;
        let server = self.server.unwrap_or_default();
        let staging = self.staging.unwrap_or_default();

        let bind = match (args.bind, server.bind) {
            (Some(bind), _) => bind,
            (None, Some(text)) => text.parse().map_err(|_| {
                CliError::Config(format!("`server.bind` is not a socket address: '{text}'"))
            })?,
            (None, None) => DEFAULT_BIND
                .parse()
                .map_err(|_| CliError::Config(format!("Invalid default bind '{DEFAULT_BIND}'")))?,
        };
        let max_upload_mb = args
            .max_upload_mb
            .or(server.max_upload_mb)
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB);
        if max_upload_mb == 0 {
            return Err(CliError::Config("`server.max-upload-mb` must be positive".into()));
        }

        Ok(ServerConfig {
            bind,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            staging_dir: args.staging_dir.clone().or(staging.directory),
            analysis,
        })
    }
}
