use super::models::ids::AtomId;
use super::models::system::MolecularSystem;
use super::utils::identifiers::ALPHA_CARBON;
use nalgebra::Point3;
use serde::Serialize;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown selection rule '{0}' (expected 'protein' or 'alpha-carbon')")]
    UnknownRule(String),
    #[error("Selection '{rule}' matched no atoms")]
    Empty { rule: SelectionRule },
}

/// Rule choosing the atoms an analysis operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionRule {
    /// Every atom of a standard amino-acid residue.
    Protein,
    /// The `CA` atom of every standard amino-acid residue that has one.
    AlphaCarbon,
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionRule::Protein => write!(f, "protein"),
            SelectionRule::AlphaCarbon => write!(f, "alpha-carbon"),
        }
    }
}

impl FromStr for SelectionRule {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_lowercase().as_str() {
            "protein" => Ok(SelectionRule::Protein),
            "alpha-carbon" | "ca" | "calpha" | "name ca" => Ok(SelectionRule::AlphaCarbon),
            _ => Err(SelectionError::UnknownRule(s.to_string())),
        }
    }
}

/// Identity of one residue in a derived artifact.
///
/// Displayed as `CHAIN:NAMENUMBER[ICODE]`, with the segment identifier in place of the
/// chain when the residue has one (`PROA:ALA1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResidueLabel {
    pub chain: char,
    pub segment: Option<String>,
    pub number: isize,
    pub insertion_code: Option<char>,
    pub name: String,
}

impl fmt::Display for ResidueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.segment {
            Some(segment) => write!(f, "{segment}:{}{}", self.name, self.number)?,
            None => write!(f, "{}:{}{}", self.chain, self.name, self.number)?,
        }
        if let Some(code) = self.insertion_code {
            write!(f, "{code}")?;
        }
        Ok(())
    }
}

/// The ordered residues of a selection.
///
/// Position `i` in this sequence is row and column `i` of every matrix derived from the
/// selection, and tick `i` of every plot axis. The sequence cannot be modified once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueOrder(Box<[ResidueLabel]>);

impl ResidueOrder {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResidueLabel> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResidueLabel> {
        self.0.iter()
    }

    /// Display labels (`A:ALA1`, ...) in order.
    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl Index<usize> for ResidueOrder {
    type Output = ResidueLabel;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl FromIterator<ResidueLabel> for ResidueOrder {
    fn from_iter<I: IntoIterator<Item = ResidueLabel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The atoms chosen by a [`SelectionRule`], grouped by residue in structure order.
#[derive(Debug, Clone)]
pub struct Selection {
    rule: SelectionRule,
    atoms: Vec<AtomId>,
    atom_indices: Vec<usize>,
    atom_residues: Vec<usize>,
    residues: ResidueOrder,
}

impl Selection {
    pub fn rule(&self) -> SelectionRule {
        self.rule
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// File-order indices of the selected atoms, parallel to [`Selection::atoms`].
    pub fn atom_indices(&self) -> &[usize] {
        &self.atom_indices
    }

    /// Residue index (into [`Selection::residues`]) of each selected atom.
    pub fn atom_residues(&self) -> &[usize] {
        &self.atom_residues
    }

    pub fn residues(&self) -> &ResidueOrder {
        &self.residues
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    /// Picks the selected atoms' positions out of a full frame.
    ///
    /// Returns `None` if the frame is shorter than the topology the selection was made on.
    pub fn positions_in(&self, frame: &[Point3<f64>]) -> Option<Vec<Point3<f64>>> {
        self.atom_indices
            .iter()
            .map(|&index| frame.get(index).copied())
            .collect()
    }
}

/// Applies `rule` to `system`.
///
/// Residues are visited chain by chain in structure order; residues contributing no
/// atoms (non-amino-acids, or amino acids lacking a `CA` under
/// [`SelectionRule::AlphaCarbon`]) do not appear in the residue order.
///
/// # Errors
///
/// Returns [`SelectionError::Empty`] if no atom matches.
pub fn select(system: &MolecularSystem, rule: SelectionRule) -> Result<Selection, SelectionError> {
    let mut atoms = Vec::new();
    let mut atom_residues = Vec::new();
    let mut labels = Vec::new();

    for (_, residue) in system.residues_iter() {
        if !residue.is_amino_acid() {
            continue;
        }

        let picked: Vec<AtomId> = match rule {
            SelectionRule::Protein => residue.atoms().to_vec(),
            SelectionRule::AlphaCarbon => residue
                .get_atom_id_by_name(ALPHA_CARBON)
                .into_iter()
                .collect(),
        };
        if picked.is_empty() {
            continue;
        }

        let Some(chain) = system.chain(residue.chain_id) else {
            continue;
        };
        let residue_index = labels.len();
        labels.push(ResidueLabel {
            chain: chain.id,
            segment: residue.segment.clone(),
            number: residue.number,
            insertion_code: residue.insertion_code,
            name: residue.name.clone(),
        });
        atom_residues.extend(std::iter::repeat_n(residue_index, picked.len()));
        atoms.extend(picked);
    }

    if atoms.is_empty() {
        return Err(SelectionError::Empty { rule });
    }

    let atom_indices = atoms
        .iter()
        .filter_map(|&id| system.atom_index(id))
        .collect::<Vec<_>>();

    Ok(Selection {
        rule,
        atoms,
        atom_indices,
        atom_residues,
        residues: labels.into_iter().collect(),
    })
}
