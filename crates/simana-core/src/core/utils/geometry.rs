use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

/// A proper rigid motion: rotation about the origin followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl RigidTransform {
    #[inline]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    pub fn apply_all(&self, points: &mut [Point3<f64>]) {
        for point in points.iter_mut() {
            *point = self.apply(point);
        }
    }
}

/// Arithmetic mean of a point set, `None` when empty.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Root-mean-square deviation between two equally sized point sets.
pub fn rmsd(a: &[Point3<f64>], b: &[Point3<f64>]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(p, q)| (p - q).norm_squared())
        .sum();
    Some((sum / a.len() as f64).sqrt())
}

/// Torsion angle `a-b-c-d` about the `b-c` bond, in degrees within `(-180, 180]`.
///
/// Positive angles are clockwise when viewed from `b` towards `c`. Returns `None` when
/// `b` and `c` coincide, or when `a` or `d` lies on the `b-c` axis.
pub fn dihedral(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> Option<f64> {
    let axis = (c - b).try_normalize(f64::EPSILON)?;
    let from = a - b;
    let to = d - c;
    let v = from - axis * from.dot(&axis);
    let w = to - axis * to.dot(&axis);
    if v.norm_squared() <= f64::EPSILON || w.norm_squared() <= f64::EPSILON {
        return None;
    }
    let x = v.dot(&w);
    let y = axis.cross(&v).dot(&w);
    let angle = y.atan2(x).to_degrees();
    Some(if angle <= -180.0 { angle + 360.0 } else { angle })
}

/// Computes the least-squares rigid transform mapping `from_points` onto `to_points`
/// (Kabsch algorithm).
///
/// Reflections are excluded: when the optimal orthogonal matrix has a negative
/// determinant, the smallest singular direction is flipped so the result is a proper
/// rotation.
///
/// # Return
///
/// `None` if the point sets are empty, differ in length, or the SVD fails to produce
/// both singular-vector matrices.
pub fn superposition_transform(
    from_points: &[Point3<f64>],
    to_points: &[Point3<f64>],
) -> Option<RigidTransform> {
    if from_points.len() != to_points.len() {
        return None;
    }
    let from_centroid = centroid(from_points)?;
    let to_centroid = centroid(to_points)?;

    let h = from_points
        .iter()
        .zip(to_points)
        .fold(Matrix3::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let mut correction = Matrix3::identity();
    if (u * v_t).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    let translation = to_centroid.coords - rotation * from_centroid.coords;

    Some(RigidTransform {
        rotation,
        translation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Unit;

    fn tetrahedron() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.3, 0.4, 1.8),
        ]
    }

    #[test]
    fn centroid_of_empty_set_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn centroid_is_the_mean_position() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -6.0)];
        assert_eq!(centroid(&points), Some(Point3::new(1.0, 2.0, -3.0)));
    }

    #[test]
    fn rmsd_requires_matching_lengths() {
        let a = tetrahedron();
        assert!(rmsd(&a, &a[..2]).is_none());
        assert_relative_eq!(rmsd(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn superposition_recovers_pure_translation() {
        let from = tetrahedron();
        let shift = Vector3::new(10.0, 20.0, 30.0);
        let to: Vec<_> = from.iter().map(|p| p + shift).collect();

        let transform = superposition_transform(&from, &to).unwrap();

        assert_relative_eq!(*transform.rotation.matrix(), Matrix3::identity(), epsilon = 1e-9);
        assert_relative_eq!(transform.translation, shift, epsilon = 1e-9);
    }

    #[test]
    fn superposition_recovers_rotation_and_translation() {
        let from = tetrahedron();
        let axis = Unit::new_normalize(Vector3::new(1.0, -2.0, 0.5));
        let rotation = Rotation3::from_axis_angle(&axis, 1.1);
        let shift = Vector3::new(-3.0, 0.5, 7.0);
        let to: Vec<_> = from.iter().map(|p| rotation * p + shift).collect();

        let transform = superposition_transform(&from, &to).unwrap();
        let mut moved = from.clone();
        transform.apply_all(&mut moved);

        assert!(rmsd(&moved, &to).unwrap() < 1e-9);
        assert_relative_eq!(transform.rotation.matrix().determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn superposition_never_returns_a_reflection() {
        let from = tetrahedron();
        let to: Vec<_> = from.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();

        let transform = superposition_transform(&from, &to).unwrap();

        assert_relative_eq!(transform.rotation.matrix().determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn dihedral_distinguishes_cis_trans_and_handedness() {
        let b = Point3::origin();
        let c = Point3::new(1.5, 0.0, 0.0);
        let a = Point3::new(0.0, 1.0, 0.0);

        assert_relative_eq!(dihedral(&a, &b, &c, &Point3::new(1.5, 1.0, 0.0)).unwrap(), 0.0);
        assert_relative_eq!(dihedral(&a, &b, &c, &Point3::new(1.5, -1.0, 0.0)).unwrap(), 180.0);
        assert_relative_eq!(dihedral(&a, &b, &c, &Point3::new(1.5, 0.0, 1.0)).unwrap(), 90.0);
        assert_relative_eq!(dihedral(&a, &b, &c, &Point3::new(1.5, 0.0, -1.0)).unwrap(), -90.0);
    }

    #[test]
    fn dihedral_is_undefined_for_collinear_atoms() {
        let b = Point3::origin();
        let c = Point3::new(1.0, 0.0, 0.0);
        assert!(dihedral(&Point3::new(-1.0, 0.0, 0.0), &b, &c, &Point3::new(2.0, 1.0, 0.0)).is_none());
        assert!(dihedral(&Point3::new(0.0, 1.0, 0.0), &b, &b, &c).is_none());
    }

    #[test]
    fn superposition_rejects_mismatched_or_empty_input() {
        let from = tetrahedron();
        assert!(superposition_transform(&from, &from[..3]).is_none());
        assert!(superposition_transform(&[], &[]).is_none());
    }
}
