use super::error::AnalysisError;
use crate::core::models::residue::Residue;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::geometry::dihedral;
use crate::core::utils::identifiers::ALPHA_CARBON;
use nalgebra::Point3;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Longest C(i-1)–N(i) distance, in Ångströms, still treated as a peptide bond.
pub const PEPTIDE_BOND_MAX: f64 = 2.0;

/// Residue classes with distinct backbone preferences.
///
/// A residue falls in exactly one class, checked in this order: glycine, proline,
/// pre-proline (followed by a bonded proline), isoleucine/valine, general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RamachandranCategory {
    /// Every residue; only meaningful as a filter.
    #[default]
    All,
    General,
    Glycine,
    Proline,
    PreProline,
    IleVal,
}

impl RamachandranCategory {
    /// Whether a residue of class `class` passes this filter.
    pub fn admits(self, class: RamachandranCategory) -> bool {
        self == RamachandranCategory::All || self == class
    }
}

impl fmt::Display for RamachandranCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RamachandranCategory::All => "all",
            RamachandranCategory::General => "general",
            RamachandranCategory::Glycine => "glycine",
            RamachandranCategory::Proline => "proline",
            RamachandranCategory::PreProline => "pre-proline",
            RamachandranCategory::IleVal => "ile-val",
        };
        f.write_str(name)
    }
}

impl FromStr for RamachandranCategory {
    type Err = AnalysisError;

    /// Accepts the class name or its plot-type number, `0` (all) to `5` (ile-val).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "all" => Ok(RamachandranCategory::All),
            "1" | "general" => Ok(RamachandranCategory::General),
            "2" | "glycine" | "gly" => Ok(RamachandranCategory::Glycine),
            "3" | "proline" | "pro" => Ok(RamachandranCategory::Proline),
            "4" | "pre-proline" | "preproline" | "pre-pro" => Ok(RamachandranCategory::PreProline),
            "5" | "ile-val" | "ileval" => Ok(RamachandranCategory::IleVal),
            other => Err(AnalysisError::invalid_parameter(
                "plot_type",
                format!("unknown residue class '{other}' (expected 0-5 or a class name)"),
            )),
        }
    }
}

/// Backbone torsions of one residue in one model.
///
/// `phi` is undefined for the first residue of a chain or after a chain break, `psi`
/// for the last residue or before a break. Angles are in degrees within `(-180, 180]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackboneDihedrals {
    pub model: usize,
    pub chain: char,
    pub residue: isize,
    pub name: String,
    pub category: RamachandranCategory,
    pub phi: Option<f64>,
    pub psi: Option<f64>,
}

impl BackboneDihedrals {
    /// The `(phi, psi)` point, when both angles are defined.
    pub fn point(&self) -> Option<(f64, f64)> {
        Some((self.phi?, self.psi?))
    }
}

struct Backbone<'a> {
    residue: &'a Residue,
    n: Point3<f64>,
    ca: Point3<f64>,
    c: Point3<f64>,
}

impl<'a> Backbone<'a> {
    fn locate(system: &MolecularSystem, residue: &'a Residue, positions: &[Point3<f64>]) -> Option<Self> {
        let position = |name: &str| {
            let atom = residue.get_atom_id_by_name(name)?;
            positions.get(system.atom_index(atom)?).copied()
        };
        Some(Self {
            residue,
            n: position("N")?,
            ca: position(ALPHA_CARBON)?,
            c: position("C")?,
        })
    }

    /// Whether `self` is peptide-bonded to the residue that follows it.
    fn bonded_to(&self, next: &Backbone) -> bool {
        self.residue.segment == next.residue.segment
            && (next.n - self.c).norm() <= PEPTIDE_BOND_MAX
    }
}

fn classify(name: &str, next: Option<&str>) -> RamachandranCategory {
    match name {
        "GLY" => RamachandranCategory::Glycine,
        "PRO" => RamachandranCategory::Proline,
        _ if next == Some("PRO") => RamachandranCategory::PreProline,
        "ILE" | "VAL" => RamachandranCategory::IleVal,
        _ => RamachandranCategory::General,
    }
}

/// Computes phi and psi for every amino-acid residue with N, CA and C atoms.
///
/// `positions` is one frame in the system's file order; `model` is copied into the
/// output. Chains are visited in structure order, restricted to `chain` when given.
/// Consecutive residues count as bonded only when they share a segment and their
/// C–N distance is at most [`PEPTIDE_BOND_MAX`].
pub fn backbone_dihedrals(
    system: &MolecularSystem,
    positions: &[Point3<f64>],
    model: usize,
    chain: Option<char>,
) -> Vec<BackboneDihedrals> {
    let mut angles = Vec::new();
    for (_, current_chain) in system.chains_iter() {
        if chain.is_some_and(|id| id != current_chain.id) {
            continue;
        }
        let backbones: Vec<Backbone> = current_chain
            .residues
            .iter()
            .filter_map(|&id| system.residue(id))
            .filter(|residue| residue.is_amino_acid())
            .filter_map(|residue| Backbone::locate(system, residue, positions))
            .collect();

        for (i, current) in backbones.iter().enumerate() {
            let previous = i
                .checked_sub(1)
                .and_then(|p| backbones.get(p))
                .filter(|previous| previous.bonded_to(current));
            let next = backbones.get(i + 1).filter(|next| current.bonded_to(next));

            let phi = previous.and_then(|p| dihedral(&p.c, &current.n, &current.ca, &current.c));
            let psi = next.and_then(|n| dihedral(&current.n, &current.ca, &current.c, &n.n));
            angles.push(BackboneDihedrals {
                model,
                chain: current_chain.id,
                residue: current.residue.number,
                name: current.residue.name.clone(),
                category: classify(
                    &current.residue.name,
                    next.map(|n| n.residue.name.as_str()),
                ),
                phi,
                psi,
            });
        }
    }
    angles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use approx::assert_relative_eq;

    /// Three residues built with trans peptide bonds and known backbone torsions.
    fn tripeptide(names: [&str; 3], gap_after_first: f64) -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A');
        let backbone = [
            [(0.0, 1.0, 0.0), (0.0, 0.0, 0.0), (1.5, 0.0, 0.0)],
            [(2.3, 1.0, 0.0), (3.8, 1.0, 0.0), (3.8, 1.0, 1.5)],
            [(5.1, 1.0, 2.2), (5.1, 2.4, 2.2), (5.1, 2.4, 3.7)],
        ];
        for (k, (name, atoms)) in names.iter().zip(backbone).enumerate() {
            let residue = system.add_residue(chain, k as isize + 1, None, name).unwrap();
            let shift = if k == 0 { 0.0 } else { gap_after_first };
            for (atom_name, (x, y, z)) in ["N", "CA", "C"].into_iter().zip(atoms) {
                let atom = Atom::new(0, atom_name, residue, Point3::new(x + shift, y, z));
                system.add_atom_to_residue(residue, atom).unwrap();
            }
        }
        system
    }

    #[test]
    fn terminal_residues_lack_one_angle() {
        let system = tripeptide(["ALA", "ALA", "ALA"], 0.0);
        let angles = backbone_dihedrals(&system, &system.positions(), 0, None);

        assert_eq!(angles.len(), 3);
        assert!(angles[0].phi.is_none() && angles[0].psi.is_some());
        assert!(angles[1].point().is_some());
        assert!(angles[2].phi.is_some() && angles[2].psi.is_none());
    }

    #[test]
    fn middle_residue_angles_match_the_dihedral_formula() {
        let system = tripeptide(["ALA", "ALA", "ALA"], 0.0);
        let positions = system.positions();
        let angles = backbone_dihedrals(&system, &positions, 0, None);

        // Atom order is N, CA, C per residue.
        let expected_phi = dihedral(&positions[2], &positions[3], &positions[4], &positions[5]).unwrap();
        let expected_psi = dihedral(&positions[3], &positions[4], &positions[5], &positions[6]).unwrap();
        assert_relative_eq!(angles[1].phi.unwrap(), expected_phi);
        assert_relative_eq!(angles[1].psi.unwrap(), expected_psi);
        assert_relative_eq!(expected_phi, -90.0, epsilon = 1e-9);
    }

    #[test]
    fn chain_break_leaves_both_sides_undefined() {
        let system = tripeptide(["ALA", "ALA", "ALA"], 3.0);
        let angles = backbone_dihedrals(&system, &system.positions(), 0, None);

        assert!(angles[0].psi.is_none());
        assert!(angles[1].phi.is_none());
        assert!(angles[1].psi.is_some());
    }

    #[test]
    fn residues_are_classified_by_name_and_successor() {
        let system = tripeptide(["VAL", "SER", "PRO"], 0.0);
        let angles = backbone_dihedrals(&system, &system.positions(), 0, None);

        let classes: Vec<_> = angles.iter().map(|a| a.category).collect();
        assert_eq!(
            classes,
            vec![
                RamachandranCategory::IleVal,
                RamachandranCategory::PreProline,
                RamachandranCategory::Proline
            ]
        );
        assert_eq!(classify("GLY", Some("PRO")), RamachandranCategory::Glycine);
        assert!(RamachandranCategory::All.admits(RamachandranCategory::Glycine));
        assert!(!RamachandranCategory::General.admits(RamachandranCategory::Glycine));
    }

    #[test]
    fn chain_filter_and_missing_backbone_atoms() {
        let mut system = tripeptide(["ALA", "GLY", "ALA"], 0.0);
        let other = system.add_chain('B');
        let lone = system.add_residue(other, 1, None, "ALA").unwrap();
        system
            .add_atom_to_residue(lone, Atom::new(0, "CA", lone, Point3::origin()))
            .unwrap();

        let positions = system.positions();
        assert_eq!(backbone_dihedrals(&system, &positions, 0, Some('B')).len(), 0);
        assert_eq!(backbone_dihedrals(&system, &positions, 0, Some('A')).len(), 3);
        assert_eq!(backbone_dihedrals(&system, &positions, 2, None)[0].model, 2);
    }

    #[test]
    fn plot_types_parse_by_number_or_name() {
        let parse = |s: &str| s.parse::<RamachandranCategory>().unwrap();
        assert_eq!(parse("0"), RamachandranCategory::All);
        assert_eq!(parse("4"), RamachandranCategory::PreProline);
        assert_eq!(parse("Glycine"), RamachandranCategory::Glycine);
        assert_eq!(parse(" ile-val "), RamachandranCategory::IleVal);
        assert!(matches!(
            "7".parse::<RamachandranCategory>(),
            Err(AnalysisError::InvalidParameter { .. })
        ));
    }
}
