use super::error::AnalysisError;
use crate::core::models::system::MolecularSystem;
use crate::core::selection::Selection;
use crate::core::trajectory::{Trajectory, TrajectoryError};
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Per-residue positions over frames, stored frame-major as `[frame][residue]`.
///
/// Each residue is represented by the centroid of its selected atoms, which for an
/// alpha-carbon selection is simply the CA position.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTensor {
    frame_count: usize,
    residue_count: usize,
    data: Vec<Point3<f64>>,
}

impl FrameTensor {
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn residue_count(&self) -> usize {
        self.residue_count
    }

    #[inline]
    pub fn position(&self, frame: usize, residue: usize) -> Point3<f64> {
        self.data[frame * self.residue_count + residue]
    }

    pub fn frame(&self, frame: usize) -> &[Point3<f64>] {
        let start = frame * self.residue_count;
        &self.data[start..start + self.residue_count]
    }

    /// Builds a tensor from residue positions given frame by frame.
    ///
    /// Returns `None` if the frames differ in length.
    pub fn from_frames(frames: &[Vec<Point3<f64>>]) -> Option<Self> {
        let residue_count = frames.first().map_or(0, Vec::len);
        if frames.iter().any(|frame| frame.len() != residue_count) {
            return None;
        }
        Some(Self {
            frame_count: frames.len(),
            residue_count,
            data: frames.concat(),
        })
    }

    fn push_frame(&mut self, atom_positions: &[Point3<f64>], selection: &Selection) {
        let mut sums = vec![Vector3::zeros(); self.residue_count];
        let mut counts = vec![0usize; self.residue_count];
        for (position, &residue) in atom_positions.iter().zip(selection.atom_residues()) {
            sums[residue] += position.coords;
            counts[residue] += 1;
        }
        self.data.extend(
            sums.into_iter()
                .zip(counts)
                .map(|(sum, count)| Point3::from(sum / count.max(1) as f64)),
        );
        self.frame_count += 1;
    }

    fn empty(residue_count: usize) -> Self {
        Self {
            frame_count: 0,
            residue_count,
            data: Vec::new(),
        }
    }
}

/// Extracts the residue positions of the static structure as a one-frame tensor.
pub fn extract_static(
    system: &MolecularSystem,
    selection: &Selection,
) -> Result<FrameTensor, AnalysisError> {
    let trajectory = Trajectory::from_system(system);
    let atom_positions = trajectory.gather(0, selection.atom_indices())?;

    let mut tensor = FrameTensor::empty(selection.residue_count());
    tensor.push_frame(&atom_positions, selection);
    Ok(tensor)
}

/// Superposes the trajectory onto its first frame using the selected atoms, then
/// extracts residue positions from every frame.
///
/// # Errors
///
/// Returns [`AnalysisError::Trajectory`] when the trajectory has no frames or does not
/// match the topology the selection was made on.
pub fn extract_superposed(
    mut trajectory: Trajectory,
    selection: &Selection,
) -> Result<FrameTensor, AnalysisError> {
    if trajectory.is_empty() {
        return Err(TrajectoryError::Empty.into());
    }

    let rmsds = trajectory.superpose(selection.atom_indices())?;
    let max_rmsd = rmsds.iter().copied().fold(0.0, f64::max);
    debug!(
        frames = trajectory.len(),
        max_rmsd, "Superposed trajectory onto the first frame."
    );

    let mut tensor = FrameTensor::empty(selection.residue_count());
    for positions in trajectory.frames_iter() {
        let atom_positions =
            selection
                .positions_in(positions)
                .ok_or_else(|| TrajectoryError::IndexOutOfRange {
                    index: selection.atom_indices().iter().copied().max().unwrap_or(0),
                    atom_count: trajectory.atom_count(),
                })?;
        tensor.push_frame(&atom_positions, selection);
    }
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::selection::{SelectionRule, select};
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    fn three_residue_system() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A');
        for (number, x, y) in [(1, 0.0, 0.0), (2, 3.8, 0.6), (3, 7.6, -0.4)] {
            let residue = system.add_residue(chain, number, None, "ALA").unwrap();
            let n = Atom::new(0, "N", residue, Point3::new(x - 1.0, y + 1.0, 0.5));
            let ca = Atom::new(0, "CA", residue, Point3::new(x, y, 0.0));
            system.add_atom_to_residue(residue, n).unwrap();
            system.add_atom_to_residue(residue, ca).unwrap();
        }
        system
    }

    #[test]
    fn static_extraction_uses_alpha_carbons() {
        let system = three_residue_system();
        let selection = select(&system, SelectionRule::AlphaCarbon).unwrap();

        let tensor = extract_static(&system, &selection).unwrap();

        assert_eq!(tensor.frame_count(), 1);
        assert_eq!(tensor.residue_count(), 3);
        assert_eq!(tensor.position(0, 2), Point3::new(7.6, -0.4, 0.0));
    }

    #[test]
    fn protein_selection_uses_residue_centroids() {
        let system = three_residue_system();
        let selection = select(&system, SelectionRule::Protein).unwrap();

        let tensor = extract_static(&system, &selection).unwrap();

        assert_relative_eq!(tensor.position(0, 0), Point3::new(-0.5, 0.5, 0.25));
    }

    #[test]
    fn empty_trajectory_is_a_trajectory_error() {
        let system = three_residue_system();
        let selection = select(&system, SelectionRule::AlphaCarbon).unwrap();

        let err = extract_superposed(Trajectory::new(system.atom_count()), &selection).unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::Trajectory(TrajectoryError::Empty)
        ));
    }

    #[test]
    fn trajectory_shorter_than_selection_topology_is_rejected() {
        let system = three_residue_system();
        let selection = select(&system, SelectionRule::AlphaCarbon).unwrap();
        let mut trajectory = Trajectory::new(3);
        trajectory.push_frame(system.positions()[..3].to_vec()).unwrap();

        let err = extract_superposed(trajectory, &selection).unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::Trajectory(TrajectoryError::IndexOutOfRange { atom_count: 3, .. })
        ));
    }

    #[test]
    fn superposed_extraction_removes_rigid_motion() {
        let system = three_residue_system();
        let selection = select(&system, SelectionRule::AlphaCarbon).unwrap();
        let reference = system.positions();
        let rotation = Rotation3::from_euler_angles(0.1, 0.9, -0.4);
        let moved = reference
            .iter()
            .map(|p| rotation * p + Vector3::new(4.0, 4.0, 4.0))
            .collect();

        let mut trajectory = Trajectory::new(system.atom_count());
        trajectory.push_frame(reference).unwrap();
        trajectory.push_frame(moved).unwrap();

        let tensor = extract_superposed(trajectory, &selection).unwrap();

        assert_eq!(tensor.frame_count(), 2);
        for residue in 0..3 {
            assert_relative_eq!(
                tensor.position(1, residue),
                tensor.position(0, residue),
                epsilon = 1e-9
            );
        }
    }
}
