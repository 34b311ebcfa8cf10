//! # Workflows Module
//!
//! End-to-end analysis pipelines. Each workflow checks the capabilities it needs, selects
//! residues, extracts coordinates, builds its matrix or statistics, and renders the
//! result through an injected [`Renderer`](crate::render::Renderer).
//!
//! - **Contact map** ([`contact_map`]): alpha-carbon contacts of a static structure.
//! - **DCCM** ([`dccm`]): correlated motion over a superposed trajectory.
//! - **B-factor profile** ([`bfactor`]): per-residue temperature-factor statistics.
//! - **Ramachandran plot** ([`ramachandran`]): backbone phi/psi per model and chain.
//!
//! Configurations are assembled with the builders in [`config`], which validate request
//! parameters and fill in defaults. Results are the serializable reports in [`report`].

pub mod bfactor;
pub mod config;
pub mod contact_map;
pub mod dccm;
pub mod ramachandran;
pub mod report;

#[cfg(test)]
mod test_support;
