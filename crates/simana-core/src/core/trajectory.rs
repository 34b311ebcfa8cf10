use super::models::system::MolecularSystem;
use super::utils::geometry::{self, RigidTransform};
use nalgebra::Point3;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum TrajectoryError {
    #[error("Trajectory contains no frames")]
    Empty,
    #[error("Frame {frame} has {found} atoms, but the topology has {expected}")]
    AtomCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error("Frame {frame} is out of range for a trajectory of {len} frames")]
    FrameOutOfRange { frame: usize, len: usize },
    #[error("Atom index {index} is out of range for a topology of {atom_count} atoms")]
    IndexOutOfRange { index: usize, atom_count: usize },
    #[error("Cannot superpose frame {frame}: the fitting atom set is empty")]
    EmptyFitSet { frame: usize },
}

/// An ordered sequence of coordinate frames over a fixed topology.
///
/// Every frame holds one position per atom, in the file order of the
/// [`MolecularSystem`] it was read against. The atom count is fixed at construction
/// and checked for every pushed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    atom_count: usize,
    frames: Vec<Vec<Point3<f64>>>,
}

impl Trajectory {
    pub fn new(atom_count: usize) -> Self {
        Self {
            atom_count,
            frames: Vec::new(),
        }
    }

    /// Builds a single-frame trajectory from the static positions of a system.
    pub fn from_system(system: &MolecularSystem) -> Self {
        Self {
            atom_count: system.atom_count(),
            frames: vec![system.positions()],
        }
    }

    /// Appends a frame, rejecting it when its atom count differs from the topology.
    pub fn push_frame(&mut self, positions: Vec<Point3<f64>>) -> Result<(), TrajectoryError> {
        if positions.len() != self.atom_count {
            return Err(TrajectoryError::AtomCountMismatch {
                frame: self.frames.len(),
                expected: self.atom_count,
                found: positions.len(),
            });
        }
        self.frames.push(positions);
        Ok(())
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&[Point3<f64>]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    pub fn frames_iter(&self) -> impl Iterator<Item = &[Point3<f64>]> {
        self.frames.iter().map(Vec::as_slice)
    }

    /// Collects the positions of `atom_indices` from one frame.
    pub fn gather(
        &self,
        frame: usize,
        atom_indices: &[usize],
    ) -> Result<Vec<Point3<f64>>, TrajectoryError> {
        let positions = self.frames.get(frame).ok_or(TrajectoryError::FrameOutOfRange {
            frame,
            len: self.frames.len(),
        })?;
        atom_indices
            .iter()
            .map(|&index| {
                positions
                    .get(index)
                    .copied()
                    .ok_or(TrajectoryError::IndexOutOfRange {
                        index,
                        atom_count: self.atom_count,
                    })
            })
            .collect()
    }

    /// Superposes every frame onto frame 0 by a least-squares fit over `atom_indices`.
    ///
    /// The fitted transform of each frame is applied to all of its atoms, not only the
    /// fitting set. Frame 0 is the reference and is left untouched.
    ///
    /// # Return
    ///
    /// The post-fit RMSD of the fitting set for every frame, in frame order.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::Empty`] for a trajectory with no frames, and
    /// [`TrajectoryError::IndexOutOfRange`] when an index exceeds the atom count.
    pub fn superpose(&mut self, atom_indices: &[usize]) -> Result<Vec<f64>, TrajectoryError> {
        if self.is_empty() {
            return Err(TrajectoryError::Empty);
        }
        let reference = self.gather(0, atom_indices)?;
        let mut rmsds = Vec::with_capacity(self.frames.len());
        rmsds.push(0.0);

        for frame_index in 1..self.frames.len() {
            let mobile = self.gather(frame_index, atom_indices)?;
            let transform: RigidTransform = geometry::superposition_transform(&mobile, &reference)
                .ok_or(TrajectoryError::EmptyFitSet { frame: frame_index })?;

            let frame = &mut self.frames[frame_index];
            transform.apply_all(frame);

            let fitted: Vec<_> = mobile.iter().map(|p| transform.apply(p)).collect();
            let rmsd = geometry::rmsd(&fitted, &reference).unwrap_or(0.0);
            debug!(frame = frame_index, rmsd, "Superposed frame onto reference.");
            rmsds.push(rmsd);
        }

        Ok(rmsds)
    }
}
