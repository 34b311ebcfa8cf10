use serde::Serialize;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Table has {rows} rows but {labels} labels")]
    Shape { rows: usize, labels: usize },
}

/// Writes a labelled square matrix as CSV.
///
/// The header row is `residue` followed by the labels; each data row starts with its
/// label. Non-finite cells (masked DCCM entries) are written as empty fields.
pub fn write_matrix<W: Write>(
    writer: W,
    labels: &[String],
    rows: &[Vec<f64>],
) -> Result<(), TableError> {
    if rows.len() != labels.len() || rows.iter().any(|row| row.len() != labels.len()) {
        return Err(TableError::Shape {
            rows: rows.len(),
            labels: labels.len(),
        });
    }
    write_matrix_unchecked(writer, labels, rows).map_err(|source| TableError::Csv {
        path: "<writer>".into(),
        source,
    })
}

fn write_matrix_unchecked<W: Write>(
    writer: W,
    labels: &[String],
    rows: &[Vec<f64>],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(labels.len() + 1);
    header.push("residue");
    header.extend(labels.iter().map(String::as_str));
    csv_writer.write_record(&header)?;

    for (label, row) in labels.iter().zip(rows) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(label.clone());
        record.extend(row.iter().map(|value| {
            if value.is_finite() {
                value.to_string()
            } else {
                String::new()
            }
        }));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes serializable records as CSV, with a header derived from the field names.
pub fn write_records<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_matrix_to_path(
    path: &Path,
    labels: &[String],
    rows: &[Vec<f64>],
) -> Result<(), TableError> {
    let file = std::fs::File::create(path).map_err(|e| TableError::Csv {
        path: path.to_string_lossy().to_string(),
        source: csv::Error::from(e),
    })?;
    match write_matrix(file, labels, rows) {
        Err(TableError::Csv { source, .. }) => Err(TableError::Csv {
            path: path.to_string_lossy().to_string(),
            source,
        }),
        other => other,
    }
}

pub fn write_records_to_path<T: Serialize>(path: &Path, records: &[T]) -> Result<(), TableError> {
    let to_error = |source| TableError::Csv {
        path: path.to_string_lossy().to_string(),
        source,
    };
    let file = std::fs::File::create(path).map_err(|e| to_error(csv::Error::from(e)))?;
    write_records(file, records).map_err(to_error)
}
