//! Provides input/output functionality for molecular data.
//!
//! Structures and multi-model trajectories are read from fixed-column PDB files
//! through the [`traits::MolecularFile`] interface; derived tables are exported as
//! CSV.

pub mod pdb;
pub mod table;
pub mod traits;

pub use pdb::load;
