use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::system::MolecularSystem;
use crate::core::trajectory::Trajectory;
use nalgebra::Point3;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Chain identifier assigned to records whose chain column is blank.
const DEFAULT_CHAIN_ID: char = 'A';

/// Atom records shorter than this cannot hold all three coordinates.
const MIN_ATOM_RECORD_LEN: usize = 54;

/// Leading magic numbers of GROMACS binary trajectories (big-endian XDR).
const XTC_MAGIC: [u8; 4] = 1995i32.to_be_bytes();
const TRR_MAGIC: [u8; 4] = 1993i32.to_be_bytes();

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Concatenated `TITLE` records, if any.
    pub title: Option<String>,
    /// Number of models found in the file (1 for files without `MODEL` records).
    pub model_count: usize,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Unsupported {0} coordinate file: only PDB text files can be read")]
    UnsupportedFormat(&'static str),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
    #[error("{0}")]
    UnbalancedModel(&'static str),
    #[error("Line is not valid UTF-8 text")]
    NotText,
}

/// One parsed `ATOM`/`HETATM` record.
#[derive(Debug, Clone, PartialEq)]
struct AtomRecord {
    serial: usize,
    name: String,
    alt_loc: Option<char>,
    residue_name: String,
    chain_id: char,
    residue_number: isize,
    insertion_code: Option<char>,
    segment: Option<String>,
    position: Point3<f64>,
    occupancy: f64,
    b_factor: f64,
    element: Option<String>,
    is_hetero: bool,
}

/// Fields whose change between consecutive records starts a new residue.
type ResidueBoundary<'a> = (char, isize, Option<char>, &'a str, Option<&'a str>);

impl AtomRecord {
    fn site_key(&self) -> (char, isize, Option<char>, Option<String>, String) {
        (
            self.chain_id,
            self.residue_number,
            self.insertion_code,
            self.segment.clone(),
            self.name.clone(),
        )
    }

    fn residue_boundary(&self) -> ResidueBoundary<'_> {
        (
            self.chain_id,
            self.residue_number,
            self.insertion_code,
            &self.residue_name,
            self.segment.as_deref(),
        )
    }
}

/// Records of every model in a file, in file order.
#[derive(Debug, Default)]
struct ParsedModels {
    models: Vec<Vec<AtomRecord>>,
    title: Option<String>,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    // Trailing columns are often omitted, so a short line yields a truncated field.
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn optional_char(line: &str, column: usize) -> Option<char> {
    line.get(column..column + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_optional_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    default: f64,
) -> Result<f64, PdbError> {
    if slice_and_trim(line, start, end).is_empty() {
        Ok(default)
    } else {
        parse_float(line, line_num, start, end)
    }
}

fn parse_atom_record(
    line: &str,
    line_num: usize,
    fallback_serial: usize,
    is_hetero: bool,
) -> Result<AtomRecord, PdbError> {
    if line.len() < MIN_ATOM_RECORD_LEN {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::LineTooShort,
        });
    }

    let name = slice_and_trim(line, 12, 16);
    if name.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: "13-16".into(),
            },
        });
    }

    // Large MD systems overflow the five-digit serial field with hex or `*****`.
    let serial = slice_and_trim(line, 6, 11)
        .parse()
        .unwrap_or(fallback_serial);

    let residue_number_str = slice_and_trim(line, 22, 26);
    let residue_number: isize = residue_number_str.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: "23-26".into(),
            value: residue_number_str.into(),
        },
    })?;

    let x = parse_float(line, line_num, 30, 38)?;
    let y = parse_float(line, line_num, 38, 46)?;
    let z = parse_float(line, line_num, 46, 54)?;
    let occupancy = parse_optional_float(line, line_num, 54, 60, 1.0)?;
    let b_factor = parse_optional_float(line, line_num, 60, 66, 0.0)?;

    let segment = Some(slice_and_trim(line, 72, 76))
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let element = Some(slice_and_trim(line, 76, 78))
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_uppercase);

    Ok(AtomRecord {
        serial,
        name: name.to_string(),
        alt_loc: optional_char(line, 16),
        residue_name: slice_and_trim(line, 17, 21).to_string(),
        chain_id: optional_char(line, 21).unwrap_or(DEFAULT_CHAIN_ID),
        residue_number,
        insertion_code: optional_char(line, 26),
        segment,
        position: Point3::new(x, y, z),
        occupancy,
        b_factor,
        element,
        is_hetero,
    })
}

/// Fails fast on binary trajectory formats instead of reporting a garbled first line.
fn reject_binary(reader: &mut impl BufRead) -> Result<(), PdbError> {
    let head = reader.fill_buf()?;
    let format = if head.starts_with(&XTC_MAGIC) {
        "XTC"
    } else if head.starts_with(&TRR_MAGIC) {
        "TRR"
    } else if head.get(4..8) == Some(b"CORD".as_slice()) {
        "DCD"
    } else if head.contains(&0) {
        "binary"
    } else {
        return Ok(());
    };
    Err(PdbError::UnsupportedFormat(format))
}

fn parse_models(reader: &mut impl BufRead) -> Result<ParsedModels, PdbError> {
    reject_binary(reader)?;
    let mut parsed = ParsedModels::default();
    let mut current: Vec<AtomRecord> = Vec::new();
    let mut seen_sites = HashSet::new();
    let mut in_model = false;

    for (line_num, line_res) in reader.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line_res.map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::NotText,
            },
            _ => PdbError::Io(e),
        })?;

        match slice_and_trim(&line, 0, 6) {
            "ATOM" | "HETATM" => {
                let is_hetero = line.starts_with("HETATM");
                let record = parse_atom_record(&line, line_num, current.len() + 1, is_hetero)?;
                // Only the first alternate location of each site is kept.
                if !seen_sites.insert(record.site_key()) && record.alt_loc.is_some() {
                    continue;
                }
                current.push(record);
            }
            "MODEL" => {
                if in_model {
                    return Err(PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::UnbalancedModel("MODEL record inside an open model"),
                    });
                }
                if !current.is_empty() {
                    parsed.models.push(std::mem::take(&mut current));
                }
                seen_sites.clear();
                in_model = true;
            }
            "ENDMDL" => {
                if !in_model {
                    return Err(PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::UnbalancedModel("ENDMDL record without MODEL"),
                    });
                }
                parsed.models.push(std::mem::take(&mut current));
                seen_sites.clear();
                in_model = false;
            }
            "TITLE" => {
                let text = slice_and_trim(&line, 10, 80);
                match parsed.title.as_mut() {
                    Some(title) => {
                        title.push(' ');
                        title.push_str(text);
                    }
                    None => parsed.title = Some(text.to_string()),
                }
            }
            "END" => break,
            _ => {}
        }
    }

    if !current.is_empty() {
        parsed.models.push(current);
    }
    parsed.models.retain(|model| !model.is_empty());

    if parsed.models.is_empty() {
        return Err(PdbError::MissingRecord("ATOM/HETATM".into()));
    }
    Ok(parsed)
}

/// Builds the topology from one model's records.
///
/// A residue spans a run of consecutive records agreeing on chain, residue number,
/// insertion code, residue name and segment. A key that reappears after a different
/// residue starts a new residue rather than rejoining the earlier one.
fn build_system(records: &[AtomRecord]) -> Result<MolecularSystem, PdbError> {
    let mut system = MolecularSystem::new();
    let mut current = None;

    for record in records {
        let boundary = record.residue_boundary();
        let residue_id = match current {
            Some((previous, residue_id)) if previous == boundary => residue_id,
            _ => {
                let chain_id = system.add_chain(record.chain_id);
                system
                    .add_segment_residue(
                        chain_id,
                        record.residue_number,
                        record.insertion_code,
                        &record.residue_name,
                        record.segment.as_deref(),
                    )
                    .ok_or_else(|| {
                        PdbError::Inconsistency(format!("Chain '{}' vanished", record.chain_id))
                    })?
            }
        };
        current = Some((boundary, residue_id));

        let mut atom = Atom::new(record.serial, &record.name, residue_id, record.position);
        if let Some(element) = &record.element {
            atom.element = element.clone();
        }
        atom.occupancy = record.occupancy;
        atom.b_factor = record.b_factor;
        atom.is_hetero = record.is_hetero;

        system.add_atom_to_residue(residue_id, atom).ok_or_else(|| {
            PdbError::Inconsistency(format!(
                "Residue {}{} vanished",
                record.residue_name, record.residue_number
            ))
        })?;
    }

    Ok(system)
}

fn collect_frames(models: Vec<Vec<AtomRecord>>, atom_count: usize) -> Result<Trajectory, PdbError> {
    let mut trajectory = Trajectory::new(atom_count);
    for (index, model) in models.into_iter().enumerate() {
        if model.len() != atom_count {
            return Err(PdbError::Inconsistency(format!(
                "Model {} has {} atoms, but the topology has {}",
                index + 1,
                model.len(),
                atom_count
            )));
        }
        let positions = model.into_iter().map(|record| record.position).collect();
        trajectory
            .push_frame(positions)
            .map_err(|e| PdbError::Inconsistency(e.to_string()))?;
    }
    Ok(trajectory)
}

/// Reader for fixed-column PDB coordinate files.
///
/// The first model defines the topology. Every model (or the whole file when there are
/// no `MODEL` records) becomes one trajectory frame.
pub struct PdbFile;

impl PdbFile {
    /// Reads the topology from the first model and every model as a frame.
    ///
    /// # Errors
    ///
    /// Returns [`PdbError::Inconsistency`] when a model's atom count differs from the
    /// first model's.
    pub fn read_with_frames(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Trajectory, PdbMetadata), PdbError> {
        let parsed = parse_models(reader)?;
        let metadata = PdbMetadata {
            title: parsed.title,
            model_count: parsed.models.len(),
        };
        let system = build_system(&parsed.models[0])?;
        let trajectory = collect_frames(parsed.models, system.atom_count())?;
        Ok((system, trajectory, metadata))
    }

    /// Reads every model of a trajectory file against an existing topology.
    ///
    /// # Errors
    ///
    /// Returns [`PdbError::Inconsistency`] when any model's atom count differs from
    /// `system`'s.
    pub fn read_trajectory(
        reader: &mut impl BufRead,
        system: &MolecularSystem,
    ) -> Result<Trajectory, PdbError> {
        let parsed = parse_models(reader)?;
        collect_frames(parsed.models, system.atom_count())
    }
}

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let parsed = parse_models(reader)?;
        let system = build_system(&parsed.models[0])?;
        Ok((
            system,
            PdbMetadata {
                title: parsed.title,
                model_count: parsed.models.len(),
            },
        ))
    }
}

/// Loads a structure and its trajectory.
///
/// With a separate trajectory file, its models are the frames and the structure only
/// supplies the topology. Without one, the structure's own models are the frames; a
/// single-model structure yields a single-frame trajectory.
pub fn load(
    structure_path: &Path,
    trajectory_path: Option<&Path>,
) -> Result<(MolecularSystem, Trajectory), PdbError> {
    let mut reader = BufReader::new(File::open(structure_path)?);
    let (system, own_frames, _) = PdbFile::read_with_frames(&mut reader)?;

    let trajectory = match trajectory_path {
        Some(path) => {
            let mut reader = BufReader::new(File::open(path)?);
            PdbFile::read_trajectory(&mut reader, &system)?
        }
        None => own_frames,
    };
    Ok((system, trajectory))
}
