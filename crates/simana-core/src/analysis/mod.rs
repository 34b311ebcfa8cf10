//! Numerical analyses over selected residues.
//!
//! Every builder here is synchronous and pure: it takes positions or a selection and
//! returns a [`matrix::PairwiseMatrix`] or per-residue table indexed by the selection's
//! residue order. Backbone torsions ([`ramachandran`]) are computed per chain straight
//! from the structure.

pub mod bfactor;
pub mod capability;
pub mod contact_map;
pub mod coordinates;
pub mod dccm;
pub mod error;
pub mod matrix;
pub mod ramachandran;
