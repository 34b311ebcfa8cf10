use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;

/// Key identifying a residue within its chain: sequence number plus insertion code.
type ResidueKey = (ChainId, isize, Option<char>);

/// Represents a complete molecular structure with atoms, residues and chains.
///
/// Components are stored in slot maps for stable ids, but iteration never relies on the
/// slot-map layout: chains, residues and atoms are visited in the order they were added,
/// which for parsed files is the order of the records in the file. That order is what
/// trajectory frames index into (see [`MolecularSystem::atom_index`]).
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains.
    chains: SlotMap<ChainId, Chain>,
    /// Chains in insertion order.
    chain_order: Vec<ChainId>,
    /// Atoms in insertion (file) order.
    atom_order: Vec<AtomId>,
    /// Position of every atom in `atom_order`.
    atom_index: SecondaryMap<AtomId, usize>,
    /// First residue registered under each chain, number and insertion code.
    residue_id_map: HashMap<ResidueKey, ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves an immutable reference to a residue by its ID.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Retrieves an immutable reference to a chain by its ID.
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns an iterator over all atoms in file order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(AtomId, &Atom)` pairs.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atom_order.iter().map(|&id| (id, &self.atoms[id]))
    }

    /// Returns an iterator over all chains in file order.
    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order.iter().map(|&id| (id, &self.chains[id]))
    }

    /// Returns an iterator over all residues, chain by chain, each chain in file order.
    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains_iter().flat_map(move |(_, chain)| {
            chain
                .residues
                .iter()
                .map(move |&id| (id, &self.residues[id]))
        })
    }

    pub fn atom_count(&self) -> usize {
        self.atom_order.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    /// Returns the zero-based file-order index of an atom.
    ///
    /// Trajectory frames store positions in this order, so the index is how a selected
    /// atom is located in every frame.
    pub fn atom_index(&self, id: AtomId) -> Option<usize> {
        self.atom_index.get(id).copied()
    }

    /// Returns the positions of all atoms in file order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms_iter().map(|(_, atom)| atom.position).collect()
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Finds the first residue added with this chain, residue number and insertion code.
    pub fn find_residue(
        &self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
    ) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, residue_number, insertion_code))
            .copied()
    }

    /// Adds a new chain to the system or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given ID already exists,
    /// it returns the existing chain ID without creating a duplicate.
    pub fn add_chain(&mut self, id: char) -> ChainId {
        if let Some(&existing) = self.chain_id_map.get(&id) {
            return existing;
        }
        let chain_id = self.chains.insert(Chain::new(id));
        self.chain_order.push(chain_id);
        self.chain_id_map.insert(id, chain_id);
        chain_id
    }

    /// Appends a new residue to the end of a chain.
    ///
    /// Every call creates a residue, even when one with the same number and insertion
    /// code already exists. Deciding where one residue ends is left to the caller.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if successful, otherwise `None` (if the chain doesn't exist).
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> Option<ResidueId> {
        self.add_segment_residue(chain_id, residue_number, insertion_code, name, None)
    }

    /// Like [`MolecularSystem::add_residue`], tagging the residue with a segment identifier.
    pub fn add_segment_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
        segment: Option<&str>,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;

        let mut residue = Residue::new(residue_number, insertion_code, name, chain_id);
        residue.segment = segment.map(str::to_string);
        let residue_id = self.residues.insert(residue);
        chain.residues.push(residue_id);
        self.residue_id_map
            .entry((chain_id, residue_number, insertion_code))
            .or_insert(residue_id);
        Some(residue_id)
    }

    /// Adds an atom to a specific residue, appending it to the file order.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (if the residue doesn't exist).
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        let residue = self.residues.get_mut(residue_id)?;
        atom.residue_id = residue_id;
        let name = atom.name.clone();

        let atom_id = self.atoms.insert(atom);
        residue.add_atom(&name, atom_id);
        self.atom_index.insert(atom_id, self.atom_order.len());
        self.atom_order.push(atom_id);

        Some(atom_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRefs {
        chain_a_id: ChainId,
        gly_id: ResidueId,
        gly_ca_id: AtomId,
        ala_id: ResidueId,
        ala_ca_id: AtomId,
    }

    fn create_standard_test_system() -> (MolecularSystem, TestRefs) {
        let mut system = MolecularSystem::new();
        let chain_a_id = system.add_chain('A');

        let gly_id = system.add_residue(chain_a_id, 1, None, "GLY").unwrap();
        let gly_n = Atom::new(1, "N", gly_id, Point3::new(0.0, 0.0, 0.0));
        let gly_ca = Atom::new(2, "CA", gly_id, Point3::new(1.4, 0.0, 0.0));
        system.add_atom_to_residue(gly_id, gly_n).unwrap();
        let gly_ca_id = system.add_atom_to_residue(gly_id, gly_ca).unwrap();

        let ala_id = system.add_residue(chain_a_id, 2, None, "ALA").unwrap();
        let ala_ca = Atom::new(3, "CA", ala_id, Point3::new(2.0, 1.0, 0.0));
        let ala_ca_id = system.add_atom_to_residue(ala_id, ala_ca).unwrap();

        (
            system,
            TestRefs {
                chain_a_id,
                gly_id,
                gly_ca_id,
                ala_id,
                ala_ca_id,
            },
        )
    }

    #[test]
    fn add_chain_is_idempotent() {
        let mut system = MolecularSystem::new();
        let first = system.add_chain('A');
        let second = system.add_chain('A');
        assert_eq!(first, second);
        assert_eq!(system.chains_iter().count(), 1);
    }

    #[test]
    fn add_residue_always_appends_and_lookup_returns_the_first() {
        let (mut system, refs) = create_standard_test_system();
        let again = system.add_residue(refs.chain_a_id, 1, None, "GLY").unwrap();
        assert_ne!(again, refs.gly_id);
        assert_eq!(system.find_residue(refs.chain_a_id, 1, None), Some(refs.gly_id));

        let inserted = system
            .add_residue(refs.chain_a_id, 1, Some('A'), "SER")
            .unwrap();
        assert_eq!(system.find_residue(refs.chain_a_id, 1, Some('A')), Some(inserted));
        assert_eq!(system.residue_count(), 4);
        assert_eq!(system.chain(refs.chain_a_id).unwrap().residues.last(), Some(&inserted));
    }

    #[test]
    fn segment_residue_keeps_its_segment() {
        let (mut system, refs) = create_standard_test_system();
        let tagged = system
            .add_segment_residue(refs.chain_a_id, 7, None, "LYS", Some("PROB"))
            .unwrap();
        assert_eq!(system.residue(tagged).unwrap().segment.as_deref(), Some("PROB"));
    }

    #[test]
    fn add_residue_to_missing_chain_returns_none() {
        let (mut system, _) = create_standard_test_system();
        assert!(
            system
                .add_residue(ChainId::default(), 5, None, "ALA")
                .is_none()
        );
    }

    #[test]
    fn atoms_are_indexed_in_file_order() {
        let (system, refs) = create_standard_test_system();
        assert_eq!(system.atom_count(), 3);
        assert_eq!(system.atom_index(refs.gly_ca_id), Some(1));
        assert_eq!(system.atom_index(refs.ala_ca_id), Some(2));

        let serials: Vec<usize> = system.atoms_iter().map(|(_, a)| a.serial).collect();
        assert_eq!(serials, vec![1, 2, 3]);
    }

    #[test]
    fn add_atom_rewrites_residue_id_and_registers_name() {
        let (mut system, refs) = create_standard_test_system();
        let stray = Atom::new(4, "CB", ResidueId::default(), Point3::origin());
        let cb_id = system.add_atom_to_residue(refs.ala_id, stray).unwrap();

        assert_eq!(system.atom(cb_id).unwrap().residue_id, refs.ala_id);
        assert_eq!(
            system.residue(refs.ala_id).unwrap().get_atom_id_by_name("CB"),
            Some(cb_id)
        );
    }

    #[test]
    fn residues_iter_follows_chain_then_residue_order() {
        let mut system = MolecularSystem::new();
        let b = system.add_chain('B');
        let a = system.add_chain('A');
        system.add_residue(b, 10, None, "LYS").unwrap();
        system.add_residue(a, 1, None, "MET").unwrap();
        system.add_residue(b, 11, None, "GLU").unwrap();

        let names: Vec<&str> = system
            .residues_iter()
            .map(|(_, r)| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["LYS", "GLU", "MET"]);
    }

    #[test]
    fn positions_are_reported_in_file_order() {
        let (system, _) = create_standard_test_system();
        assert_eq!(
            system.positions(),
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.4, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
            ]
        );
    }
}
