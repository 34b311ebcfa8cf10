use super::ids::{AtomId, ChainId};
use crate::core::utils::identifiers;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: isize,                      // Residue sequence number from source file
    pub insertion_code: Option<char>,       // PDB insertion code, if any
    pub name: String,                       // Name of the residue (e.g., "ALA", "HOH")
    pub chain_id: ChainId,                  // ID of the parent chain
    pub segment: Option<String>,            // Segment identifier (PDB columns 73-76)
    pub(crate) atoms: Vec<AtomId>,          // Atoms in file order
    atom_name_map: HashMap<String, AtomId>, // First atom carrying each name
}

impl Residue {
    pub(crate) fn new(
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: ChainId,
    ) -> Self {
        Self {
            number,
            insertion_code,
            name: name.to_string(),
            chain_id,
            segment: None,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    /// Whether the residue name is one of the standard (or common protonation-variant)
    /// amino-acid names.
    pub fn is_amino_acid(&self) -> bool {
        identifiers::is_amino_acid(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_chain_id(n: u64) -> ChainId {
        ChainId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn new_residue_initializes_fields_correctly() {
        let chain_id = dummy_chain_id(1);
        let residue = Residue::new(10, Some('A'), "GLY", chain_id);
        assert_eq!(residue.number, 10);
        assert_eq!(residue.insertion_code, Some('A'));
        assert_eq!(residue.name, "GLY");
        assert_eq!(residue.chain_id, chain_id);
        assert!(residue.segment.is_none());
        assert!(residue.atoms().is_empty());
        assert!(residue.get_atom_id_by_name("CA").is_none());
    }

    #[test]
    fn add_atom_preserves_order_and_maps_name() {
        let mut residue = Residue::new(5, None, "ALA", dummy_chain_id(2));
        let n = dummy_atom_id(1);
        let ca = dummy_atom_id(2);
        residue.add_atom("N", n);
        residue.add_atom("CA", ca);
        assert_eq!(residue.atoms(), &[n, ca]);
        assert_eq!(residue.get_atom_id_by_name("CA"), Some(ca));
    }

    #[test]
    fn duplicate_atom_names_keep_first_mapping() {
        let mut residue = Residue::new(5, None, "ALA", dummy_chain_id(2));
        let first = dummy_atom_id(1);
        let second = dummy_atom_id(2);
        residue.add_atom("CA", first);
        residue.add_atom("CA", second);
        assert_eq!(residue.atoms().len(), 2);
        assert_eq!(residue.get_atom_id_by_name("CA"), Some(first));
    }

    #[test]
    fn amino_acid_classification_follows_residue_name() {
        let chain_id = dummy_chain_id(3);
        assert!(Residue::new(1, None, "LEU", chain_id).is_amino_acid());
        assert!(Residue::new(1, None, "HSD", chain_id).is_amino_acid());
        assert!(!Residue::new(1, None, "HOH", chain_id).is_amino_acid());
        assert!(!Residue::new(1, None, "CA", chain_id).is_amino_acid());
    }
}
