//! # Core Models Module
//!
//! Data structures describing a parsed biomolecular structure.
//!
//! - [`atom`] - Individual atom with position, element and crystallographic attributes
//! - [`residue`] - Residue (monomer) with its ordered atoms
//! - [`chain`] - Chain with its ordered residues
//! - [`system`] - The complete system, with explicit file ordering of every component
//! - [`ids`] - Stable identifier types for atoms, residues and chains
//!
//! ```ignore
//! use simana::core::models::{atom::Atom, system::MolecularSystem};
//!
//! let mut system = MolecularSystem::new();
//! let chain_id = system.add_chain('A');
//! let residue_id = system.add_residue(chain_id, 1, None, "ALA")?;
//!
//! let atom = Atom::new(1, "CA", residue_id, Point3::new(0.0, 0.0, 0.0));
//! system.add_atom_to_residue(residue_id, atom)?;
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod system;
