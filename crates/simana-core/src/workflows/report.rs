use crate::analysis::bfactor::ResidueBfactor;
use crate::analysis::matrix::PairwiseMatrix;
use crate::analysis::ramachandran::{BackboneDihedrals, RamachandranCategory};
use crate::core::selection::ResidueOrder;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Serialize, Serializer};

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Encodes PNG bytes as a `data:` URI.
pub fn data_uri(png: &[u8]) -> String {
    format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(png))
}

fn serialize_png<S: Serializer>(png: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&data_uri(png))
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn serialize_optional_base64<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serialize_base64(bytes, serializer),
        None => serializer.serialize_none(),
    }
}

fn serialize_labels<S: Serializer>(order: &ResidueOrder, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(order.iter().map(ToString::to_string))
}

/// A residue-by-residue matrix with its heatmap.
///
/// Serializes as `{ plot, matrix, residue_count, residues }` with the plot as a PNG
/// data URI and residues as `A:ALA1`-style labels.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    #[serde(serialize_with = "serialize_png")]
    pub plot: Vec<u8>,
    pub matrix: PairwiseMatrix,
    pub residue_count: usize,
    #[serde(serialize_with = "serialize_labels")]
    pub residues: ResidueOrder,
}

impl MatrixReport {
    pub fn new(plot: Vec<u8>, matrix: PairwiseMatrix, residues: ResidueOrder) -> Self {
        Self {
            plot,
            residue_count: matrix.size(),
            matrix,
            residues,
        }
    }
}

/// Per-residue B-factor statistics with their curve and distribution plots.
#[derive(Debug, Clone, Serialize)]
pub struct BfactorReport {
    #[serde(serialize_with = "serialize_png")]
    pub curve_plot: Vec<u8>,
    #[serde(serialize_with = "serialize_png")]
    pub dist_plot: Vec<u8>,
    pub residue_data: Vec<ResidueBfactor>,
    pub residue_count: usize,
}

/// Backbone torsions with their scatter plot.
///
/// `plot` serializes as a PNG data URI and `csv`, when requested, as bare base64 of the
/// CSV text; otherwise `csv` is `null`.
#[derive(Debug, Clone, Serialize)]
pub struct RamachandranReport {
    #[serde(serialize_with = "serialize_png")]
    pub plot: Vec<u8>,
    pub file_type: &'static str,
    #[serde(serialize_with = "serialize_optional_base64")]
    pub csv: Option<Vec<u8>>,
    pub category: RamachandranCategory,
    pub angles: Vec<BackboneDihedrals>,
    pub point_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::ResidueLabel;
    use serde_json::{Value, json};

    fn order() -> ResidueOrder {
        [("ALA", 1), ("GLY", 2)]
            .into_iter()
            .map(|(name, number)| ResidueLabel {
                chain: 'A',
                segment: None,
                number,
                insertion_code: None,
                name: name.into(),
            })
            .collect()
    }

    #[test]
    fn data_uri_has_png_prefix() {
        assert_eq!(data_uri(b"png"), "data:image/png;base64,cG5n");
    }

    #[test]
    fn matrix_report_serializes_to_client_shape() {
        let mut matrix = PairwiseMatrix::zeros(2);
        matrix.set_symmetric(0, 1, 1.0);
        let report = MatrixReport::new(vec![1, 2, 3], matrix, order());

        let value: Value = serde_json::to_value(&report).unwrap();

        assert_eq!(
            value,
            json!({
                "plot": "data:image/png;base64,AQID",
                "matrix": [[0.0, 1.0], [1.0, 0.0]],
                "residue_count": 2,
                "residues": ["A:ALA1", "A:GLY2"],
            })
        );
    }

    #[test]
    fn bfactor_report_serializes_residue_rows() {
        let report = BfactorReport {
            curve_plot: vec![0],
            dist_plot: vec![0],
            residue_data: vec![ResidueBfactor {
                residue: 7,
                chain: 'A',
                name: "ALA".into(),
                mean_bfactor: 25.0,
                std_bfactor: 0.0,
            }],
            residue_count: 1,
        };

        let value: Value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["residue_count"], 1);
        assert_eq!(
            value["residue_data"][0],
            json!({
                "residue": 7,
                "chain": "A",
                "name": "ALA",
                "mean_bfactor": 25.0,
                "std_bfactor": 0.0,
            })
        );
        assert_eq!(value["curve_plot"], "data:image/png;base64,AA==");
    }

    #[test]
    fn ramachandran_report_encodes_plot_and_csv() {
        let report = RamachandranReport {
            plot: vec![1, 2, 3],
            file_type: "png",
            csv: Some(b"model\n".to_vec()),
            category: RamachandranCategory::PreProline,
            angles: vec![BackboneDihedrals {
                model: 0,
                chain: 'A',
                residue: 4,
                name: "SER".into(),
                category: RamachandranCategory::PreProline,
                phi: None,
                psi: Some(150.0),
            }],
            point_count: 0,
        };

        let value: Value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["plot"], "data:image/png;base64,AQID");
        assert_eq!(value["csv"], "bW9kZWwK");
        assert_eq!(value["category"], "pre-proline");
        assert_eq!(value["angles"][0]["phi"], Value::Null);
        assert_eq!(value["angles"][0]["chain"], "A");
    }
}
