//! # SimAna Core Library
//!
//! Structural analysis of biomolecular structures and molecular-dynamics trajectories:
//! residue contact maps, dynamic cross-correlation matrices (DCCM), per-residue
//! B-factor profiles and Ramachandran plots, together with their heatmap and chart renderings.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that each concern can be tested on its own.
//!
//! - **[`core`]: The Foundation.** Immutable data models (`MolecularSystem`, `Trajectory`),
//!   residue selection with an explicit canonical ordering, geometry helpers and the PDB reader.
//!
//! - **[`analysis`]: The Numerical Core.** Coordinate extraction with rigid-body superposition,
//!   the contact-map and DCCM builders, B-factor statistics, backbone torsions and the error taxonomy shared by
//!   every pipeline.
//!
//! - **[`workflows`]: The Public API.** End-to-end pipelines that tie selection, extraction,
//!   the builders and a [`render::Renderer`] together and format the result for a client.
//!
//! Rendering lives in [`render`]; the plotters/resvg backed implementation is compiled with the
//! `plotting` feature (enabled by default).

pub mod analysis;
pub mod core;
pub mod render;
pub mod workflows;
