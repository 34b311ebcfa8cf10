use crate::config::AnalysisDefaults;
use simana::analysis::contact_map::ContactSearchKind;
use simana::analysis::dccm::DegeneratePolicy;
use simana::analysis::error::AnalysisError;
use simana::analysis::ramachandran::RamachandranCategory;
use simana::render::AxisLimits;
use simana::workflows::config::{
    AxisFonts, BfactorConfig, BfactorConfigBuilder, ContactMapConfig, ContactMapConfigBuilder, DccmConfig,
    DccmConfigBuilder, ModelSelection, RamachandranConfig, RamachandranConfigBuilder,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Text fields and staged files of one multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, PathBuf>,
}

fn parse_field<T: FromStr>(name: &str, raw: &str, kind: &str) -> Result<T, AnalysisError> {
    raw.trim()
        .parse()
        .map_err(|_| AnalysisError::invalid_parameter(name, format!("expected {kind}, got '{raw}'")))
}

impl UploadForm {
    pub fn insert_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn insert_file(&mut self, name: impl Into<String>, path: PathBuf) {
        self.files.insert(name.into(), path);
    }

    /// A text field; blank values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn float(&self, name: &str) -> Result<Option<f64>, AnalysisError> {
        self.text(name)
            .map(|raw| parse_field(name, raw, "a number"))
            .transpose()
    }

    pub fn integer<T: FromStr>(&self, name: &str) -> Result<Option<T>, AnalysisError> {
        self.text(name)
            .map(|raw| parse_field(name, raw, "a non-negative integer"))
            .transpose()
    }

    pub fn flag(&self, name: &str) -> Result<bool, AnalysisError> {
        match self.text(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) => match v.as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(AnalysisError::invalid_parameter(
                    name,
                    format!("expected a boolean, got '{v}'"),
                )),
            },
        }
    }

    /// The first staged file among `names`.
    pub fn file(&self, names: &[&str]) -> Option<&PathBuf> {
        names.iter().find_map(|name| self.files.get(*name))
    }

    pub fn require_file(&self, name: &'static str) -> Result<&PathBuf, AnalysisError> {
        self.file(&[name])
            .ok_or_else(|| AnalysisError::invalid_parameter(name, "file upload is required"))
    }

    fn index_limits(&self, min: &str, max: &str) -> Result<AxisLimits<usize>, AnalysisError> {
        Ok(AxisLimits {
            min: self.integer(min)?,
            max: self.integer(max)?,
        })
    }

    fn float_limits(&self, min: &str, max: &str) -> Result<AxisLimits<f64>, AnalysisError> {
        Ok(AxisLimits {
            min: self.float(min)?,
            max: self.float(max)?,
        })
    }

    /// Axis title and tick sizes sent as `<prefix>_x_label_size`, `<prefix>_y_label_size`
    /// and `<prefix>_tick_size`.
    fn axis_fonts(&self, prefix: &str) -> Result<AxisFonts, AnalysisError> {
        Ok(AxisFonts {
            x_label: self.float(&format!("{prefix}_x_label_size"))?,
            y_label: self.float(&format!("{prefix}_y_label_size"))?,
            tick: self.float(&format!("{prefix}_tick_size"))?,
        })
    }

    pub fn contact_map_config(
        &self,
        defaults: &AnalysisDefaults,
    ) -> Result<ContactMapConfig, AnalysisError> {
        let mut builder = ContactMapConfigBuilder::new()
            .cutoff(self.float("cutoff")?.unwrap_or(defaults.contact_cutoff))
            .search(match self.text("contact_search") {
                Some(raw) => raw.parse::<ContactSearchKind>()?,
                None => defaults.contact_search,
            })
            .color_range(
                self.float("vmin")?.unwrap_or(0.0),
                self.float("vmax")?.unwrap_or(1.0),
            )
            .x_limits(self.index_limits("xlim_min", "xlim_max")?)
            .y_limits(self.index_limits("ylim_min", "ylim_max")?)
            .max_dpi(defaults.max_dpi);

        if let Some(cmap) = self.text("cmap") {
            builder = builder.colormap(cmap);
        }
        if let Some(title) = self.text("title") {
            builder = builder.title(title);
        }
        if let Some(label) = self.text("xlabel") {
            builder = builder.x_label(label);
        }
        if let Some(label) = self.text("ylabel") {
            builder = builder.y_label(label);
        }
        if let Some(label) = self.text("colorbar_label") {
            builder = builder.colorbar_label(label);
        }
        if let Some(gap) = self.integer("xticks_gap")? {
            builder = builder.x_tick_gap(gap);
        }
        if let Some(gap) = self.integer("yticks_gap")? {
            builder = builder.y_tick_gap(gap);
        }
        if let Some(size) = self.float("label_fontsize")? {
            builder = builder.label_font_size(size);
        }
        if let Some(size) = self.float("tick_labelsize")? {
            builder = builder.tick_font_size(size);
        }
        if let Some(dpi) = self.integer("dpi")? {
            builder = builder.dpi(dpi);
        }
        builder.build()
    }

    pub fn dccm_config(&self, defaults: &AnalysisDefaults) -> Result<DccmConfig, AnalysisError> {
        let mut builder = DccmConfigBuilder::new()
            .degenerate_policy(match self.text("degenerate_policy") {
                Some(raw) => raw.parse::<DegeneratePolicy>()?,
                None => defaults.degenerate_policy,
            })
            .color_range(
                self.float("vmin")?.unwrap_or(-1.0),
                self.float("vmax")?.unwrap_or(1.0),
            )
            .max_dpi(defaults.max_dpi);

        if let Some(cmap) = self.text("cmap") {
            builder = builder.colormap(cmap);
        }
        if let Some(title) = self.text("title") {
            builder = builder.title(title);
        }
        if let Some(label) = self.text("xlabel") {
            builder = builder.x_label(label);
        }
        if let Some(label) = self.text("ylabel") {
            builder = builder.y_label(label);
        }
        if let Some(label) = self.text("colorbar_label") {
            builder = builder.colorbar_label(label);
        }
        if let Some(dpi) = self.integer("dpi")? {
            builder = builder.dpi(dpi);
        }
        builder.build()
    }

    pub fn bfactor_config(&self, defaults: &AnalysisDefaults) -> Result<BfactorConfig, AnalysisError> {
        let mut builder = BfactorConfigBuilder::new()
            .show_std_dev(self.flag("show_std_dev")?)
            .curve_fonts(self.axis_fonts("curve")?)
            .dist_fonts(self.axis_fonts("dist")?)
            .curve_x_limits(self.float_limits("curve_x_min", "curve_x_max")?)
            .curve_y_limits(self.float_limits("curve_y_min", "curve_y_max")?)
            .dist_x_limits(self.float_limits("dist_x_min", "dist_x_max")?)
            .dist_y_limits(self.float_limits("dist_y_min", "dist_y_max")?)
            .max_dpi(defaults.max_dpi);

        if let Some(label) = self.text("curve_x_label") {
            builder = builder.curve_x_label(label);
        }
        if let Some(label) = self.text("curve_y_label") {
            builder = builder.curve_y_label(label);
        }
        if let Some(width) = self.float("curve_linewidth")? {
            builder = builder.curve_line_width(width);
        }
        if let Some(label) = self.text("dist_x_label") {
            builder = builder.dist_x_label(label);
        }
        if let Some(label) = self.text("dist_y_label") {
            builder = builder.dist_y_label(label);
        }
        if let Some(alpha) = self.float("dist_alpha")? {
            builder = builder.dist_alpha(alpha);
        }
        if let Some(dpi) = self.integer("dpi")? {
            builder = builder.dpi(dpi);
        }
        builder.build()
    }

    /// `iter_models` visits every model, otherwise `model_number` (zero-based, default 0);
    /// `iter_chains` visits every chain, otherwise `chain_id` (default `A`).
    pub fn ramachandran_config(
        &self,
        defaults: &AnalysisDefaults,
    ) -> Result<RamachandranConfig, AnalysisError> {
        let models = if self.flag("iter_models")? {
            ModelSelection::All
        } else {
            ModelSelection::Single(self.integer("model_number")?.unwrap_or(0))
        };
        let chain = if self.flag("iter_chains")? {
            None
        } else {
            let raw = self.text("chain_id").unwrap_or("A").trim();
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(id), None) => Some(id),
                _ => {
                    return Err(AnalysisError::invalid_parameter(
                        "chain_id",
                        format!("expected a single character, got '{raw}'"),
                    ));
                }
            }
        };

        let mut builder = RamachandranConfigBuilder::new()
            .category(match self.text("plot_type") {
                Some(raw) => raw.parse()?,
                None => RamachandranCategory::default(),
            })
            .models(models)
            .chain(chain)
            .include_csv(self.flag("save_csv")?)
            .max_dpi(defaults.max_dpi);
        if let Some(file_type) = self.text("file_type") {
            builder = builder.file_type(file_type);
        }
        if let Some(dpi) = self.integer("dpi")? {
            builder = builder.dpi(dpi);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> UploadForm {
        let mut form = UploadForm::default();
        for (name, value) in fields {
            form.insert_field(*name, *value);
        }
        form
    }

    fn invalid_name(err: AnalysisError) -> String {
        match err {
            AnalysisError::InvalidParameter { name, .. } => name,
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn blank_fields_fall_back_to_defaults() {
        let config = form(&[("cutoff", ""), ("xlim_max", "  "), ("cmap", "")])
            .contact_map_config(&AnalysisDefaults::default())
            .unwrap();

        assert_eq!(config.cutoff, 8.0);
        assert_eq!(config.style.x_limits.max, None);
        assert_eq!(config.style.colormap.name(), "viridis");
    }

    #[test]
    fn contact_map_fields_are_applied() {
        let config = form(&[
            ("cutoff", "6.5"),
            ("cmap", "Greys"),
            ("xlabel", "Residue"),
            ("xticks_gap", "5"),
            ("xlim_min", "2"),
            ("xlim_max", "40"),
            ("label_fontsize", "18"),
            ("dpi", "150"),
        ])
        .contact_map_config(&AnalysisDefaults::default())
        .unwrap();

        assert_eq!(config.cutoff, 6.5);
        assert_eq!(config.style.colormap.name(), "greys");
        assert_eq!(config.style.x_label, "Residue");
        assert_eq!(config.style.x_tick_gap, 5);
        assert_eq!(config.style.x_limits, AxisLimits { min: Some(2), max: Some(40) });
        assert_eq!(config.style.fonts.label, 18.0);
        assert_eq!(config.style.dpi, 150);
    }

    #[test]
    fn server_defaults_apply_when_fields_are_missing() {
        let defaults = AnalysisDefaults {
            contact_cutoff: 5.0,
            contact_search: ContactSearchKind::CellGrid,
            degenerate_policy: DegeneratePolicy::Mask,
            max_dpi: 100,
        };

        let contact = form(&[]).contact_map_config(&defaults).unwrap();
        assert_eq!(contact.cutoff, 5.0);
        assert_eq!(contact.search, ContactSearchKind::CellGrid);

        let dccm = form(&[("dpi", "100")]).dccm_config(&defaults).unwrap();
        assert_eq!(dccm.degenerate_policy, DegeneratePolicy::Mask);

        let err = form(&[]).dccm_config(&defaults).unwrap_err();
        assert_eq!(invalid_name(err), "dpi");
    }

    #[test]
    fn malformed_values_name_their_field() {
        let err = form(&[("cutoff", "near")])
            .contact_map_config(&AnalysisDefaults::default())
            .unwrap_err();
        assert_eq!(invalid_name(err), "cutoff");

        let err = form(&[("xticks_gap", "-3")])
            .contact_map_config(&AnalysisDefaults::default())
            .unwrap_err();
        assert_eq!(invalid_name(err), "xticks_gap");

        let err = form(&[("degenerate_policy", "ignore")])
            .dccm_config(&AnalysisDefaults::default())
            .unwrap_err();
        assert_eq!(invalid_name(err), "degenerate_policy");

        let err = form(&[("show_std_dev", "maybe")])
            .bfactor_config(&AnalysisDefaults::default())
            .unwrap_err();
        assert_eq!(invalid_name(err), "show_std_dev");
    }

    #[test]
    fn bfactor_fields_are_applied() {
        let config = form(&[
            ("show_std_dev", "true"),
            ("curve_linewidth", "2.5"),
            ("dist_alpha", "0.8"),
            ("curve_y_min", "0"),
        ])
        .bfactor_config(&AnalysisDefaults::default())
        .unwrap();

        assert!(config.show_std_dev);
        assert_eq!(config.curve.line_width, 2.5);
        assert_eq!(config.distribution.alpha, 0.8);
        assert_eq!(config.curve.y_limits.min, Some(0.0));
    }

    #[test]
    fn bfactor_font_sizes_and_limits_reach_both_charts() {
        let config = form(&[
            ("curve_x_label_size", "18"),
            ("curve_y_label_size", "9"),
            ("curve_tick_size", "7"),
            ("curve_x_max", "120"),
            ("dist_tick_size", "8"),
            ("dist_x_min", "5.5"),
            ("dist_y_max", "0.5"),
        ])
        .bfactor_config(&AnalysisDefaults::default())
        .unwrap();

        assert_eq!(config.curve.fonts.label, 18.0);
        assert_eq!(config.curve.fonts.title, 20.0);
        assert_eq!(config.curve.y_label_font, 9.0);
        assert_eq!(config.curve.fonts.tick, 7.0);
        assert_eq!(config.curve.x_limits, AxisLimits { min: None, max: Some(120.0) });
        assert_eq!(config.distribution.fonts.tick, 8.0);
        assert_eq!(config.distribution.fonts.label, 12.0);
        assert_eq!(config.distribution.x_limits.min, Some(5.5));
        assert_eq!(config.distribution.y_limits.max, Some(0.5));

        let err = form(&[("dist_y_label_size", "big")])
            .bfactor_config(&AnalysisDefaults::default())
            .unwrap_err();
        assert_eq!(invalid_name(err), "dist_y_label_size");
    }

    #[test]
    fn trajectory_file_accepts_alias() {
        let mut form = UploadForm::default();
        form.insert_file("xtc_file", PathBuf::from("/tmp/t.pdb"));

        assert_eq!(
            form.file(&["trajectory_file", "xtc_file"]),
            Some(&PathBuf::from("/tmp/t.pdb"))
        );
        assert!(form.require_file("pdb_file").is_err());
    }

    #[test]
    fn ramachandran_defaults_follow_the_upload_form() {
        let config = form(&[])
            .ramachandran_config(&AnalysisDefaults::default())
            .unwrap();

        assert_eq!(config.category, RamachandranCategory::All);
        assert_eq!(config.models, ModelSelection::Single(0));
        assert_eq!(config.chain, Some('A'));
        assert!(!config.include_csv);
    }

    #[test]
    fn ramachandran_fields_are_applied() {
        let config = form(&[
            ("plot_type", "3"),
            ("iter_models", "true"),
            ("iter_chains", "true"),
            ("chain_id", "B"),
            ("save_csv", "true"),
            ("file_type", "png"),
        ])
        .ramachandran_config(&AnalysisDefaults::default())
        .unwrap();

        assert_eq!(config.category, RamachandranCategory::Proline);
        assert_eq!(config.models, ModelSelection::All);
        assert_eq!(config.chain, None);
        assert!(config.include_csv);

        let config = form(&[("model_number", "2"), ("chain_id", "B")])
            .ramachandran_config(&AnalysisDefaults::default())
            .unwrap();
        assert_eq!(config.models, ModelSelection::Single(2));
        assert_eq!(config.chain, Some('B'));
    }

    #[test]
    fn ramachandran_rejects_bad_fields() {
        let defaults = AnalysisDefaults::default();
        for (field, value) in [
            ("plot_type", "9"),
            ("model_number", "-1"),
            ("chain_id", "AB"),
            ("file_type", "pdf"),
        ] {
            let err = form(&[(field, value)]).ramachandran_config(&defaults).unwrap_err();
            assert_eq!(invalid_name(err), field);
        }
    }
}
