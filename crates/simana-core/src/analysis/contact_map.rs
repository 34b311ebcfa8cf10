use super::error::AnalysisError;
use super::matrix::PairwiseMatrix;
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_CONTACT_CUTOFF: f64 = 8.0;

/// Cell coordinates in the spatial hash grid.
type CellIndex = (i64, i64, i64);

/// Strict contact predicate shared by every search strategy.
#[inline]
fn in_contact(a: &Point3<f64>, b: &Point3<f64>, cutoff: f64) -> bool {
    (a - b).norm() < cutoff
}

/// Finds every unordered pair of points closer than a cutoff.
pub trait ContactSearch: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns all pairs `(i, j)` with `i < j` and `distance < cutoff`, sorted.
    fn contacts(&self, positions: &[Point3<f64>], cutoff: f64) -> Vec<(usize, usize)>;
}

/// Tests every pair directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseScan;

impl ContactSearch for PairwiseScan {
    fn name(&self) -> &'static str {
        "pairwise"
    }

    fn contacts(&self, positions: &[Point3<f64>], cutoff: f64) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..positions.len() {
            for j in i + 1..positions.len() {
                if in_contact(&positions[i], &positions[j], cutoff) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

/// Hashes points into cubic cells with edge equal to the cutoff and only tests pairs in
/// the 27 surrounding cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellGrid;

impl CellGrid {
    fn cell_of(point: &Point3<f64>, origin: &Point3<f64>, edge: f64) -> CellIndex {
        let offset = (point - origin) / edge;
        (
            offset.x.floor() as i64,
            offset.y.floor() as i64,
            offset.z.floor() as i64,
        )
    }
}

impl ContactSearch for CellGrid {
    fn name(&self) -> &'static str {
        "cell-grid"
    }

    fn contacts(&self, positions: &[Point3<f64>], cutoff: f64) -> Vec<(usize, usize)> {
        let Some(origin) = positions.iter().copied().reduce(|a, b| a.inf(&b)) else {
            return Vec::new();
        };

        let mut cells: HashMap<CellIndex, Vec<usize>> = HashMap::new();
        for (index, point) in positions.iter().enumerate() {
            cells
                .entry(Self::cell_of(point, &origin, cutoff))
                .or_default()
                .push(index);
        }

        let mut pairs = Vec::new();
        for (i, point) in positions.iter().enumerate() {
            let (cx, cy, cz) = Self::cell_of(point, &origin, cutoff);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(members) = cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                            continue;
                        };
                        pairs.extend(
                            members
                                .iter()
                                .filter(|&&j| j > i && in_contact(point, &positions[j], cutoff))
                                .map(|&j| (i, j)),
                        );
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}

/// Selects a [`ContactSearch`] implementation by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactSearchKind {
    #[default]
    Pairwise,
    CellGrid,
}

impl ContactSearchKind {
    pub fn strategy(self) -> &'static dyn ContactSearch {
        match self {
            ContactSearchKind::Pairwise => &PairwiseScan,
            ContactSearchKind::CellGrid => &CellGrid,
        }
    }
}

impl fmt::Display for ContactSearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.strategy().name())
    }
}

impl FromStr for ContactSearchKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pairwise" => Ok(ContactSearchKind::Pairwise),
            "cell-grid" | "cellgrid" | "grid" => Ok(ContactSearchKind::CellGrid),
            other => Err(AnalysisError::invalid_parameter(
                "contact-search",
                format!("unknown strategy '{other}' (expected 'pairwise' or 'cell-grid')"),
            )),
        }
    }
}

/// Rejects cutoffs that are not finite and strictly positive.
pub fn validate_cutoff(cutoff: f64) -> Result<f64, AnalysisError> {
    if cutoff.is_finite() && cutoff > 0.0 {
        Ok(cutoff)
    } else {
        Err(AnalysisError::invalid_parameter(
            "cutoff",
            format!("must be a finite positive distance, got {cutoff}"),
        ))
    }
}

/// Builds the binary residue contact map of one frame.
///
/// `matrix[i][j]` is 1 when residues `i` and `j` are closer than `cutoff`, else 0.
/// Self-pairs are never evaluated, so the diagonal is 0.
///
/// # Errors
///
/// Returns [`AnalysisError::InsufficientAtoms`] for fewer than two residues and
/// [`AnalysisError::InvalidParameter`] for an invalid cutoff.
pub fn build_contact_map(
    positions: &[Point3<f64>],
    cutoff: f64,
    search: &dyn ContactSearch,
) -> Result<PairwiseMatrix, AnalysisError> {
    let cutoff = validate_cutoff(cutoff)?;
    if positions.len() < 2 {
        return Err(AnalysisError::InsufficientAtoms {
            required: 2,
            found: positions.len(),
        });
    }

    let pairs = search.contacts(positions, cutoff);
    debug!(
        residues = positions.len(),
        contacts = pairs.len(),
        strategy = search.name(),
        cutoff,
        "Computed residue contacts."
    );

    let mut matrix = PairwiseMatrix::zeros(positions.len());
    for (i, j) in pairs {
        matrix.set_symmetric(i, j, 1.0);
    }
    Ok(matrix)
}
