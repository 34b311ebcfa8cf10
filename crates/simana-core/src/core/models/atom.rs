use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents an atom of a parsed structure.
///
/// Besides its identity and position, an atom carries the crystallographic attributes
/// found in coordinate files (occupancy and temperature factor) so that per-atom
/// analyses such as B-factor profiles do not need to go back to the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number from the source file.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The element symbol, upper-cased (e.g., "C", "FE").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Fractional occupancy of this position.
    pub occupancy: f64,
    /// Isotropic temperature factor (B-factor) in square Angstroms.
    pub b_factor: f64,
    /// Whether the atom came from a `HETATM` record.
    pub is_hetero: bool,
}

impl Atom {
    /// Creates a new `Atom` with default crystallographic attributes.
    ///
    /// The element is inferred from the atom name, occupancy is set to 1.0 and the
    /// B-factor to 0.0. Callers that know better values overwrite the public fields.
    ///
    /// # Arguments
    ///
    /// * `serial` - The serial number of the atom.
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(serial: usize, name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            residue_id,
            element: infer_element(name),
            position,
            occupancy: 1.0,
            b_factor: 0.0,
            is_hetero: false,
        }
    }
}

/// Guesses an element symbol from a PDB-style atom name.
///
/// Leading digits are skipped ("1HB" -> "H"). Only the first alphabetic character is
/// used, which is correct for every atom name found in standard amino acids and
/// nucleotides; two-letter elements must come from the element column.
pub fn infer_element(atom_name: &str) -> String {
    atom_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}
