use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Per-request directory for uploaded files, deleted when dropped.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

/// Reduces an uploaded file name to a safe single path component.
fn sanitize(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

impl StagingArea {
    /// Creates a fresh directory under `root`, or under the system temp dir.
    pub fn new(root: Option<&Path>) -> io::Result<Self> {
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                tempfile::Builder::new().prefix("simana-").tempdir_in(root)?
            }
            None => tempfile::Builder::new().prefix("simana-").tempdir()?,
        };
        debug!(path = %dir.path().display(), "Created staging directory.");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes an uploaded file and returns where it was stored.
    ///
    /// The stored name is `<field>-<sanitized file name>`, so two fields can upload files
    /// with the same name.
    pub async fn stage(&self, field: &str, file_name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self
            .dir
            .path()
            .join(format!("{}-{}", sanitize(field), sanitize(file_name)));
        tokio::fs::write(&path, contents).await?;
        debug!(field, bytes = contents.len(), path = %path.display(), "Staged upload.");
        Ok(path)
    }
}
