//! # Core Module
//!
//! Fundamental building blocks shared by every analysis pipeline.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains and the ordered system
//! - **Trajectories** ([`trajectory`]) - Frames of positions over a fixed topology
//! - **Selection** ([`selection`]) - Selection rules and the canonical residue ordering
//! - **File I/O** ([`io`]) - PDB structure/trajectory reading and CSV table export
//! - **Utilities** ([`utils`]) - Superposition geometry and residue/atom identifiers

pub mod io;
pub mod models;
pub mod selection;
pub mod trajectory;
pub mod utils;
