pub mod bfactor;
pub mod contact_map;
pub mod dccm;
pub mod ramachandran;
pub mod serve;

use crate::error::Result;
use simana::core::io::table::write_matrix_to_path;
use simana::workflows::report::MatrixReport;
use std::path::{Path, PathBuf};
use tracing::info;

/// `<prefix>.<extension>`, keeping any dots already in the prefix.
pub(crate) fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes `<prefix>.png` and `<prefix>.csv` for a matrix report.
pub(crate) fn write_matrix_report(prefix: &Path, report: &MatrixReport) -> Result<()> {
    let png_path = with_suffix(prefix, ".png");
    let csv_path = with_suffix(prefix, ".csv");
    ensure_parent_dir(&png_path)?;

    std::fs::write(&png_path, &report.plot)?;
    write_matrix_to_path(&csv_path, &report.residues.labels(), &report.matrix.rows())?;

    info!(
        plot = %png_path.display(),
        table = %csv_path.display(),
        residues = report.residue_count,
        "Wrote matrix report."
    );
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use simana::analysis::matrix::PairwiseMatrix;
    use simana::core::selection::ResidueLabel;
    use tempfile::tempdir;

    #[test]
    fn suffix_is_appended_to_dotted_prefix() {
        assert_eq!(
            with_suffix(Path::new("out/run.v2"), ".png"),
            PathBuf::from("out/run.v2.png")
        );
    }

    #[test]
    fn matrix_report_writes_png_and_csv() {
        let dir = tempdir().unwrap();
        let prefix = dir.path().join("nested").join("cmap");
        let mut matrix = PairwiseMatrix::zeros(2);
        matrix.set_symmetric(0, 1, 1.0);
        let residues = ["ALA", "GLY"]
            .iter()
            .zip(1..)
            .map(|(name, number)| ResidueLabel {
                chain: 'A',
                segment: None,
                number,
                insertion_code: None,
                name: name.to_string(),
            })
            .collect();
        let report = MatrixReport::new(b"png".to_vec(), matrix, residues);

        write_matrix_report(&prefix, &report).unwrap();

        assert_eq!(std::fs::read(with_suffix(&prefix, ".png")).unwrap(), b"png");
        let csv = std::fs::read_to_string(with_suffix(&prefix, ".csv")).unwrap();
        assert_eq!(csv, "residue,A:ALA1,A:GLY2\nA:ALA1,0,1\nA:GLY2,1,0\n");
    }
}
