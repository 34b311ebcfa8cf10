use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Crates whose warnings are silenced below `-vv`: `usvg` reports every missing
/// font family while laying out plot text.
const QUIET_BELOW_DEBUG: &[&str] = &["usvg", "resvg", "fontdb"];

/// Maps `-v` counts and `--quiet` to a level filter.
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn build_filter(verbosity: u8, quiet: bool) -> EnvFilter {
    let level = level_filter(verbosity, quiet);
    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    if level < LevelFilter::DEBUG {
        for target in QUIET_BELOW_DEBUG {
            if let Ok(directive) = format!("{target}=error").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

/// Installs the global subscriber: compact stderr output plus, with `--log-file`, a
/// plain-text file layer carrying thread ids (request handlers log from the blocking pool).
///
/// `RUST_LOG` directives, when set, refine the filter derived from the flags.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(File::create(path)?)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_target(true),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(build_filter(verbosity, quiet))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;
    use tracing::{debug, info, warn};

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(3, true), LevelFilter::ERROR);
    }

    #[test]
    #[serial]
    fn font_warnings_are_hidden_at_default_verbosity() {
        let filter = build_filter(1, false).to_string();
        assert!(filter.contains("usvg=error"));

        let filter = build_filter(2, false).to_string();
        assert!(!filter.contains("usvg"));
    }

    #[test]
    #[serial]
    fn file_layer_records_thread_ids() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("simana.log");

        let file_layer = fmt::layer()
            .with_writer(File::create(&log_path).unwrap())
            .with_ansi(false)
            .with_thread_ids(true);
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            info!(residues = 42, "Built contact map.");
            debug!("Superposed frame 3.");
            warn!("Residue 7 has no fluctuation.");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Built contact map. residues=42"));
        assert!(content.contains("DEBUG"));
        assert!(content.contains("ThreadId"));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let directory = PathBuf::from("/");
        if cfg!(unix) && directory.is_dir() {
            let result = setup_logging(0, false, Some(&directory));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
