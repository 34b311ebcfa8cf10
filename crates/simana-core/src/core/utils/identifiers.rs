use phf::{Set, phf_set};

/// Residue names treated as standard amino acids, including common protonation-state and
/// force-field variants (CHARMM/AMBER histidines, neutral ASP/GLU/LYS, disulfide CYS,
/// selenomethionine).
static AMINO_ACID_NAMES: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "HSD", "HSE", "HSP", "HID", "HIE", "HIP", "HISD", "HISE", "HISH",
    "CYX", "CYM", "ASH", "GLH", "LYN", "MSE", "SEC", "PYL",
};

/// Atom name of the representative backbone carbon of an amino-acid residue.
pub const ALPHA_CARBON: &str = "CA";

pub fn is_amino_acid(residue_name: &str) -> bool {
    let name = residue_name.trim();
    if AMINO_ACID_NAMES.contains(name) {
        return true;
    }
    name.bytes().any(|b| b.is_ascii_lowercase())
        && AMINO_ACID_NAMES.contains(name.to_ascii_uppercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_amino_acid_recognizes_standard_residues() {
        assert!(is_amino_acid("ALA"));
        assert!(is_amino_acid("TRP"));
        assert!(is_amino_acid(" GLY "));
    }

    #[test]
    fn is_amino_acid_recognizes_protonation_variants() {
        assert!(is_amino_acid("HSD"));
        assert!(is_amino_acid("HIE"));
        assert!(is_amino_acid("MSE"));
    }

    #[test]
    fn is_amino_acid_is_case_insensitive() {
        assert!(is_amino_acid("ala"));
        assert!(is_amino_acid("Lys"));
    }

    #[test]
    fn is_amino_acid_rejects_ions_water_and_ligands() {
        assert!(!is_amino_acid("CA"));
        assert!(!is_amino_acid("HOH"));
        assert!(!is_amino_acid("NAG"));
        assert!(!is_amino_acid(""));
    }
}
