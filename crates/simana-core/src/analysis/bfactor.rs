use crate::core::models::system::MolecularSystem;
use crate::core::selection::Selection;
use serde::Serialize;

/// Temperature-factor statistics of one residue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidueBfactor {
    /// Residue sequence number.
    pub residue: isize,
    pub chain: char,
    pub name: String,
    pub mean_bfactor: f64,
    /// Population standard deviation; 0 for single-atom residues.
    pub std_bfactor: f64,
}

/// Computes per-residue B-factor mean and population standard deviation over the
/// selected atoms, in selection residue order.
pub fn residue_bfactors(system: &MolecularSystem, selection: &Selection) -> Vec<ResidueBfactor> {
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); selection.residue_count()];
    for (&atom_id, &residue) in selection.atoms().iter().zip(selection.atom_residues()) {
        if let Some(atom) = system.atom(atom_id) {
            values[residue].push(atom.b_factor);
        }
    }

    selection
        .residues()
        .iter()
        .zip(values)
        .map(|(label, b_factors)| {
            let (mean, std) = mean_and_std(&b_factors);
            ResidueBfactor {
                residue: label.number,
                chain: label.chain,
                name: label.name.clone(),
                mean_bfactor: mean,
                std_bfactor: std,
            }
        })
        .collect()
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() == 1 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// A histogram normalized so its bars integrate to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityHistogram {
    /// `bins + 1` ascending bin edges.
    pub edges: Vec<f64>,
    pub densities: Vec<f64>,
}

/// Bins `values` into `bins` equal-width bins spanning their range, as a density.
///
/// A zero-width range is widened to `value ± 0.5`. The last bin is closed on the right.
pub fn density_histogram(values: &[f64], bins: usize) -> Option<DensityHistogram> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return None;
    }

    let (mut lo, mut hi) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in &finite {
        let index = (((v - lo) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    let total = finite.len() as f64;
    Some(DensityHistogram {
        edges: (0..=bins).map(|i| lo + width * i as f64).collect(),
        densities: counts
            .into_iter()
            .map(|c| c as f64 / (total * width))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::selection::{SelectionRule, select};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn system_with_bfactors() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A');
        let ala = system.add_residue(chain, 7, None, "ALA").unwrap();
        for (name, b) in [("N", 10.0), ("CA", 20.0), ("C", 30.0), ("O", 40.0)] {
            let mut atom = Atom::new(0, name, ala, Point3::origin());
            atom.b_factor = b;
            system.add_atom_to_residue(ala, atom).unwrap();
        }
        let gly = system.add_residue(chain, 8, None, "GLY").unwrap();
        let mut ca = Atom::new(0, "CA", gly, Point3::origin());
        ca.b_factor = 15.0;
        system.add_atom_to_residue(gly, ca).unwrap();

        let water = system.add_residue(chain, 200, None, "HOH").unwrap();
        let mut o = Atom::new(0, "O", water, Point3::origin());
        o.b_factor = 99.0;
        system.add_atom_to_residue(water, o).unwrap();
        system
    }

    #[test]
    fn computes_mean_and_population_std_per_residue() {
        let system = system_with_bfactors();
        let selection = select(&system, SelectionRule::Protein).unwrap();

        let stats = residue_bfactors(&system, &selection);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].residue, 7);
        assert_eq!(stats[0].name, "ALA");
        assert_relative_eq!(stats[0].mean_bfactor, 25.0);
        assert_relative_eq!(stats[0].std_bfactor, 125.0f64.sqrt());
    }

    #[test]
    fn single_atom_residue_has_zero_std() {
        let system = system_with_bfactors();
        let selection = select(&system, SelectionRule::Protein).unwrap();

        let stats = residue_bfactors(&system, &selection);

        assert_eq!(stats[1].mean_bfactor, 15.0);
        assert_eq!(stats[1].std_bfactor, 0.0);
    }

    #[test]
    fn histogram_density_integrates_to_one() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64).sqrt()).collect();
        let histogram = density_histogram(&values, 30).unwrap();

        assert_eq!(histogram.edges.len(), 31);
        let area: f64 = histogram
            .densities
            .iter()
            .zip(histogram.edges.windows(2))
            .map(|(d, e)| d * (e[1] - e[0]))
            .sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn histogram_of_constant_values_uses_unit_range() {
        let histogram = density_histogram(&[5.0, 5.0, 5.0], 2).unwrap();
        assert_eq!(histogram.edges, vec![4.5, 5.0, 5.5]);
        assert_eq!(histogram.densities, vec![0.0, 2.0]);
    }

    #[test]
    fn histogram_of_nothing_is_none() {
        assert!(density_histogram(&[], 30).is_none());
        assert!(density_histogram(&[f64::NAN], 30).is_none());
    }
}
