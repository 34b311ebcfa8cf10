use crate::analysis::contact_map::{ContactSearchKind, DEFAULT_CONTACT_CUTOFF, validate_cutoff};
use crate::analysis::dccm::DegeneratePolicy;
use crate::analysis::error::AnalysisError;
use crate::analysis::ramachandran::RamachandranCategory;
use crate::render::colormap::Colormap;
use crate::render::{AxisLimits, ChartStyle, FontSizes, HeatmapStyle};
use tracing::debug;

/// Lowest accepted output resolution.
pub const MIN_DPI: u32 = 10;
/// Default upper bound on the output resolution.
pub const DEFAULT_MAX_DPI: u32 = 600;
pub const DEFAULT_DPI: u32 = 300;
/// Number of bins of the B-factor distribution plot.
pub const BFACTOR_HISTOGRAM_BINS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ContactMapConfig {
    pub cutoff: f64,
    pub search: ContactSearchKind,
    pub style: HeatmapStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DccmConfig {
    pub degenerate_policy: DegeneratePolicy,
    pub style: HeatmapStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BfactorConfig {
    pub show_std_dev: bool,
    pub bins: usize,
    pub curve: ChartStyle,
    pub distribution: ChartStyle,
}

/// Which frames of a trajectory a per-model analysis visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSelection {
    All,
    /// One zero-based frame.
    Single(usize),
}

impl Default for ModelSelection {
    fn default() -> Self {
        ModelSelection::Single(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RamachandranConfig {
    pub category: RamachandranCategory,
    pub models: ModelSelection,
    /// Restricts the analysis to one chain; `None` visits every chain.
    pub chain: Option<char>,
    pub include_csv: bool,
    pub style: ChartStyle,
}

fn parse_colormap(name: Option<String>) -> Result<Colormap, AnalysisError> {
    match name {
        Some(name) => name
            .parse::<Colormap>()
            .map_err(|e| AnalysisError::invalid_parameter("cmap", e.to_string())),
        None => Ok(Colormap::default()),
    }
}

fn validate_dpi(dpi: Option<u32>, max_dpi: Option<u32>) -> Result<u32, AnalysisError> {
    let dpi = dpi.unwrap_or_else(|| {
        debug!("No resolution requested, using {} dpi.", DEFAULT_DPI);
        DEFAULT_DPI
    });
    let max_dpi = max_dpi.unwrap_or(DEFAULT_MAX_DPI);
    if (MIN_DPI..=max_dpi).contains(&dpi) {
        Ok(dpi)
    } else {
        Err(AnalysisError::invalid_parameter(
            "dpi",
            format!("must be between {MIN_DPI} and {max_dpi}, got {dpi}"),
        ))
    }
}

fn validate_color_range(vmin: f64, vmax: f64) -> Result<(), AnalysisError> {
    if vmin.is_finite() && vmax.is_finite() && vmin < vmax {
        Ok(())
    } else {
        Err(AnalysisError::invalid_parameter(
            "vmin/vmax",
            format!("need finite vmin < vmax, got {vmin} and {vmax}"),
        ))
    }
}

fn validate_gap(name: &str, gap: usize) -> Result<usize, AnalysisError> {
    if gap > 0 {
        Ok(gap)
    } else {
        Err(AnalysisError::invalid_parameter(name, "must be at least 1"))
    }
}

fn validate_font(name: &str, size: f64) -> Result<f64, AnalysisError> {
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(AnalysisError::invalid_parameter(
            name,
            format!("must be a positive size in points, got {size}"),
        ))
    }
}

#[derive(Default)]
pub struct ContactMapConfigBuilder {
    cutoff: Option<f64>,
    search: Option<ContactSearchKind>,
    colormap: Option<String>,
    color_range: Option<(f64, f64)>,
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
    colorbar_label: Option<String>,
    x_tick_gap: Option<usize>,
    y_tick_gap: Option<usize>,
    x_limits: AxisLimits<usize>,
    y_limits: AxisLimits<usize>,
    label_font_size: Option<f64>,
    tick_font_size: Option<f64>,
    dpi: Option<u32>,
    max_dpi: Option<u32>,
}

impl ContactMapConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn search(mut self, search: ContactSearchKind) -> Self {
        self.search = Some(search);
        self
    }
    pub fn colormap(mut self, name: impl Into<String>) -> Self {
        self.colormap = Some(name.into());
        self
    }
    pub fn color_range(mut self, vmin: f64, vmax: f64) -> Self {
        self.color_range = Some((vmin, vmax));
        self
    }
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }
    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }
    pub fn colorbar_label(mut self, label: impl Into<String>) -> Self {
        self.colorbar_label = Some(label.into());
        self
    }
    pub fn x_tick_gap(mut self, gap: usize) -> Self {
        self.x_tick_gap = Some(gap);
        self
    }
    pub fn y_tick_gap(mut self, gap: usize) -> Self {
        self.y_tick_gap = Some(gap);
        self
    }
    pub fn x_limits(mut self, limits: AxisLimits<usize>) -> Self {
        self.x_limits = limits;
        self
    }
    pub fn y_limits(mut self, limits: AxisLimits<usize>) -> Self {
        self.y_limits = limits;
        self
    }
    pub fn label_font_size(mut self, points: f64) -> Self {
        self.label_font_size = Some(points);
        self
    }
    pub fn tick_font_size(mut self, points: f64) -> Self {
        self.tick_font_size = Some(points);
        self
    }
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }
    pub fn max_dpi(mut self, max_dpi: u32) -> Self {
        self.max_dpi = Some(max_dpi);
        self
    }

    /// Fills unset fields with their defaults and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidParameter`] naming the first invalid field.
    pub fn build(self) -> Result<ContactMapConfig, AnalysisError> {
        let (vmin, vmax) = self.color_range.unwrap_or((0.0, 1.0));
        validate_color_range(vmin, vmax)?;
        let defaults = FontSizes::default();

        Ok(ContactMapConfig {
            cutoff: validate_cutoff(self.cutoff.unwrap_or(DEFAULT_CONTACT_CUTOFF))?,
            search: self.search.unwrap_or_default(),
            style: HeatmapStyle {
                colormap: parse_colormap(self.colormap)?,
                vmin,
                vmax,
                title: self.title.filter(|t| !t.is_empty()),
                x_label: self.x_label.unwrap_or_else(|| "Residue Index".into()),
                y_label: self.y_label.unwrap_or_else(|| "Residue Index".into()),
                colorbar_label: self.colorbar_label.unwrap_or_else(|| "Contact".into()),
                x_tick_gap: validate_gap("xticks_gap", self.x_tick_gap.unwrap_or(10))?,
                y_tick_gap: validate_gap("yticks_gap", self.y_tick_gap.unwrap_or(10))?,
                x_limits: self.x_limits,
                y_limits: self.y_limits,
                fonts: FontSizes {
                    title: defaults.title,
                    label: validate_font(
                        "label_fontsize",
                        self.label_font_size.unwrap_or(defaults.label),
                    )?,
                    tick: validate_font(
                        "tick_labelsize",
                        self.tick_font_size.unwrap_or(defaults.tick),
                    )?,
                },
                size_inches: 10.0,
                dpi: validate_dpi(self.dpi, self.max_dpi)?,
            },
        })
    }
}

#[derive(Default)]
pub struct DccmConfigBuilder {
    degenerate_policy: Option<DegeneratePolicy>,
    colormap: Option<String>,
    color_range: Option<(f64, f64)>,
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
    colorbar_label: Option<String>,
    dpi: Option<u32>,
    max_dpi: Option<u32>,
}

impl DccmConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = Some(policy);
        self
    }
    pub fn colormap(mut self, name: impl Into<String>) -> Self {
        self.colormap = Some(name.into());
        self
    }
    pub fn color_range(mut self, vmin: f64, vmax: f64) -> Self {
        self.color_range = Some((vmin, vmax));
        self
    }
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }
    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }
    pub fn colorbar_label(mut self, label: impl Into<String>) -> Self {
        self.colorbar_label = Some(label.into());
        self
    }
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }
    pub fn max_dpi(mut self, max_dpi: u32) -> Self {
        self.max_dpi = Some(max_dpi);
        self
    }

    pub fn build(self) -> Result<DccmConfig, AnalysisError> {
        let (vmin, vmax) = self.color_range.unwrap_or((-1.0, 1.0));
        validate_color_range(vmin, vmax)?;

        Ok(DccmConfig {
            degenerate_policy: self.degenerate_policy.unwrap_or_default(),
            style: HeatmapStyle {
                colormap: parse_colormap(self.colormap)?,
                vmin,
                vmax,
                title: Some(
                    self.title
                        .unwrap_or_else(|| "Dynamic Cross-Correlation Matrix".into()),
                )
                .filter(|t| !t.is_empty()),
                x_label: self.x_label.unwrap_or_else(|| "Residue index".into()),
                y_label: self.y_label.unwrap_or_else(|| "Residue index".into()),
                colorbar_label: self
                    .colorbar_label
                    .unwrap_or_else(|| "Correlation Coefficient".into()),
                dpi: validate_dpi(self.dpi, self.max_dpi)?,
                ..HeatmapStyle::default()
            },
        })
    }
}

/// Point sizes of one chart's axis titles and tick labels; unset sizes keep the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisFonts {
    pub x_label: Option<f64>,
    pub y_label: Option<f64>,
    pub tick: Option<f64>,
}

impl AxisFonts {
    /// Applies the sizes to `style`; the title is set 2 points above the x-axis title.
    fn apply(self, prefix: &str, style: &mut ChartStyle) -> Result<(), AnalysisError> {
        let sizes = [
            ("x_label_size", self.x_label),
            ("y_label_size", self.y_label),
            ("tick_size", self.tick),
        ];
        for (name, size) in sizes {
            if let Some(size) = size {
                if !(size.is_finite() && size > 0.0) {
                    return Err(AnalysisError::invalid_parameter(
                        format!("{prefix}_{name}"),
                        format!("must be positive, got {size}"),
                    ));
                }
            }
        }
        if let Some(size) = self.x_label {
            style.fonts.label = size;
            style.fonts.title = size + 2.0;
        }
        if let Some(size) = self.y_label {
            style.y_label_font = size;
        }
        if let Some(size) = self.tick {
            style.fonts.tick = size;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct BfactorConfigBuilder {
    show_std_dev: bool,
    curve_x_label: Option<String>,
    curve_y_label: Option<String>,
    curve_line_width: Option<f64>,
    curve_fonts: AxisFonts,
    curve_x_limits: AxisLimits<f64>,
    curve_y_limits: AxisLimits<f64>,
    dist_x_label: Option<String>,
    dist_y_label: Option<String>,
    dist_alpha: Option<f64>,
    dist_fonts: AxisFonts,
    dist_x_limits: AxisLimits<f64>,
    dist_y_limits: AxisLimits<f64>,
    dpi: Option<u32>,
    max_dpi: Option<u32>,
}

impl BfactorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_std_dev(mut self, show: bool) -> Self {
        self.show_std_dev = show;
        self
    }
    pub fn curve_x_label(mut self, label: impl Into<String>) -> Self {
        self.curve_x_label = Some(label.into());
        self
    }
    pub fn curve_y_label(mut self, label: impl Into<String>) -> Self {
        self.curve_y_label = Some(label.into());
        self
    }
    pub fn curve_line_width(mut self, points: f64) -> Self {
        self.curve_line_width = Some(points);
        self
    }
    pub fn curve_fonts(mut self, fonts: AxisFonts) -> Self {
        self.curve_fonts = fonts;
        self
    }
    pub fn curve_x_limits(mut self, limits: AxisLimits<f64>) -> Self {
        self.curve_x_limits = limits;
        self
    }
    pub fn curve_y_limits(mut self, limits: AxisLimits<f64>) -> Self {
        self.curve_y_limits = limits;
        self
    }
    pub fn dist_x_label(mut self, label: impl Into<String>) -> Self {
        self.dist_x_label = Some(label.into());
        self
    }
    pub fn dist_y_label(mut self, label: impl Into<String>) -> Self {
        self.dist_y_label = Some(label.into());
        self
    }
    pub fn dist_alpha(mut self, alpha: f64) -> Self {
        self.dist_alpha = Some(alpha);
        self
    }
    pub fn dist_fonts(mut self, fonts: AxisFonts) -> Self {
        self.dist_fonts = fonts;
        self
    }
    pub fn dist_x_limits(mut self, limits: AxisLimits<f64>) -> Self {
        self.dist_x_limits = limits;
        self
    }
    pub fn dist_y_limits(mut self, limits: AxisLimits<f64>) -> Self {
        self.dist_y_limits = limits;
        self
    }
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }
    pub fn max_dpi(mut self, max_dpi: u32) -> Self {
        self.max_dpi = Some(max_dpi);
        self
    }

    pub fn build(self) -> Result<BfactorConfig, AnalysisError> {
        let dpi = validate_dpi(self.dpi, self.max_dpi)?;
        let line_width = self.curve_line_width.unwrap_or(1.5);
        if !(line_width.is_finite() && line_width > 0.0) {
            return Err(AnalysisError::invalid_parameter(
                "curve_linewidth",
                format!("must be positive, got {line_width}"),
            ));
        }
        let alpha = self.dist_alpha.unwrap_or(0.5);
        if !(0.0..=1.0).contains(&alpha) {
            return Err(AnalysisError::invalid_parameter(
                "dist_alpha",
                format!("must be between 0 and 1, got {alpha}"),
            ));
        }

        let mut curve = ChartStyle {
            title: "B-factor by Residue".into(),
            x_label: self.curve_x_label.unwrap_or_else(|| "Residue Number".into()),
            y_label: self.curve_y_label.unwrap_or_else(|| "B-factor Mean".into()),
            x_limits: self.curve_x_limits,
            y_limits: self.curve_y_limits,
            line_width,
            alpha: 0.2,
            dpi,
            ..ChartStyle::default()
        };
        self.curve_fonts.apply("curve", &mut curve)?;
        let mut distribution = ChartStyle {
            title: "B-factor Distribution".into(),
            x_label: self.dist_x_label.unwrap_or_else(|| "B-factor".into()),
            y_label: self.dist_y_label.unwrap_or_else(|| "Density".into()),
            x_limits: self.dist_x_limits,
            y_limits: self.dist_y_limits,
            alpha,
            dpi,
            ..ChartStyle::default()
        };
        self.dist_fonts.apply("dist", &mut distribution)?;

        Ok(BfactorConfig {
            show_std_dev: self.show_std_dev,
            bins: BFACTOR_HISTOGRAM_BINS,
            curve,
            distribution,
        })
    }
}

#[derive(Default)]
pub struct RamachandranConfigBuilder {
    category: RamachandranCategory,
    models: ModelSelection,
    chain: Option<char>,
    include_csv: bool,
    file_type: Option<String>,
    title: Option<String>,
    dpi: Option<u32>,
    max_dpi: Option<u32>,
}

impl RamachandranConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: RamachandranCategory) -> Self {
        self.category = category;
        self
    }
    pub fn models(mut self, models: ModelSelection) -> Self {
        self.models = models;
        self
    }
    pub fn chain(mut self, chain: Option<char>) -> Self {
        self.chain = chain;
        self
    }
    pub fn include_csv(mut self, include: bool) -> Self {
        self.include_csv = include;
        self
    }
    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }
    pub fn max_dpi(mut self, max_dpi: u32) -> Self {
        self.max_dpi = Some(max_dpi);
        self
    }

    /// Only PNG output is produced; any other `file_type` is rejected.
    pub fn build(self) -> Result<RamachandranConfig, AnalysisError> {
        if let Some(file_type) = &self.file_type {
            if !file_type.trim().eq_ignore_ascii_case("png") {
                return Err(AnalysisError::invalid_parameter(
                    "file_type",
                    format!("only png is supported, got '{file_type}'"),
                ));
            }
        }
        let full_turn = AxisLimits {
            min: Some(-180.0),
            max: Some(180.0),
        };
        let title = self.title.unwrap_or_else(|| match self.category {
            RamachandranCategory::All => "Ramachandran Plot".into(),
            category => format!("Ramachandran Plot ({category})"),
        });

        Ok(RamachandranConfig {
            category: self.category,
            models: self.models,
            chain: self.chain,
            include_csv: self.include_csv,
            style: ChartStyle {
                title,
                x_label: "Phi (°)".into(),
                y_label: "Psi (°)".into(),
                x_limits: full_turn,
                y_limits: full_turn,
                line_width: 1.5,
                alpha: 0.6,
                width_inches: 8.0,
                height_inches: 8.0,
                dpi: validate_dpi(self.dpi, self.max_dpi)?,
                ..ChartStyle::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_name(err: AnalysisError) -> String {
        match err {
            AnalysisError::InvalidParameter { name, .. } => name,
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn contact_map_defaults() {
        let config = ContactMapConfigBuilder::new().build().unwrap();
        assert_eq!(config.cutoff, 8.0);
        assert_eq!(config.search, ContactSearchKind::Pairwise);
        assert_eq!(config.style.colormap.name(), "viridis");
        assert_eq!((config.style.vmin, config.style.vmax), (0.0, 1.0));
        assert_eq!(config.style.x_label, "Residue Index");
        assert_eq!(config.style.colorbar_label, "Contact");
        assert_eq!(config.style.title, None);
        assert_eq!(config.style.dpi, 300);
    }

    #[test]
    fn dccm_defaults() {
        let config = DccmConfigBuilder::new().build().unwrap();
        assert_eq!(config.degenerate_policy, DegeneratePolicy::Reject);
        assert_eq!((config.style.vmin, config.style.vmax), (-1.0, 1.0));
        assert_eq!(
            config.style.title.as_deref(),
            Some("Dynamic Cross-Correlation Matrix")
        );
        assert_eq!(config.style.colorbar_label, "Correlation Coefficient");
        assert_eq!(config.style.y_label, "Residue index");
    }

    #[test]
    fn bfactor_defaults() {
        let config = BfactorConfigBuilder::new().build().unwrap();
        assert!(!config.show_std_dev);
        assert_eq!(config.bins, 30);
        assert_eq!(config.curve.line_width, 1.5);
        assert_eq!(config.curve.x_label, "Residue Number");
        assert_eq!(config.distribution.alpha, 0.5);
        assert_eq!(config.distribution.y_label, "Density");
    }

    #[test]
    fn unknown_colormap_is_an_invalid_parameter() {
        let err = ContactMapConfigBuilder::new()
            .colormap("rainbowish")
            .build()
            .unwrap_err();
        assert_eq!(invalid_name(err), "cmap");
    }

    #[test]
    fn dpi_is_bounded() {
        let low = DccmConfigBuilder::new().dpi(5).build().unwrap_err();
        assert_eq!(invalid_name(low), "dpi");

        let high = ContactMapConfigBuilder::new()
            .dpi(900)
            .max_dpi(600)
            .build()
            .unwrap_err();
        assert_eq!(invalid_name(high), "dpi");

        let raised = ContactMapConfigBuilder::new()
            .dpi(900)
            .max_dpi(1200)
            .build()
            .unwrap();
        assert_eq!(raised.style.dpi, 900);
    }

    #[test]
    fn invalid_cutoff_and_ranges_are_rejected() {
        let err = ContactMapConfigBuilder::new().cutoff(0.0).build().unwrap_err();
        assert_eq!(invalid_name(err), "cutoff");

        let err = DccmConfigBuilder::new()
            .color_range(1.0, 1.0)
            .build()
            .unwrap_err();
        assert_eq!(invalid_name(err), "vmin/vmax");

        let err = ContactMapConfigBuilder::new().x_tick_gap(0).build().unwrap_err();
        assert_eq!(invalid_name(err), "xticks_gap");

        let err = BfactorConfigBuilder::new().dist_alpha(1.5).build().unwrap_err();
        assert_eq!(invalid_name(err), "dist_alpha");

        let fonts = AxisFonts {
            tick: Some(-1.0),
            ..AxisFonts::default()
        };
        let err = BfactorConfigBuilder::new().curve_fonts(fonts).build().unwrap_err();
        assert_eq!(invalid_name(err), "curve_tick_size");
    }

    #[test]
    fn ramachandran_defaults_cover_a_full_turn() {
        let config = RamachandranConfigBuilder::new().build().unwrap();
        assert_eq!(config.category, RamachandranCategory::All);
        assert_eq!(config.models, ModelSelection::Single(0));
        assert_eq!(config.chain, None);
        assert!(!config.include_csv);
        assert_eq!(config.style.x_limits.min, Some(-180.0));
        assert_eq!(config.style.y_limits.max, Some(180.0));
        assert_eq!(config.style.title, "Ramachandran Plot");

        let glycine = RamachandranConfigBuilder::new()
            .category(RamachandranCategory::Glycine)
            .build()
            .unwrap();
        assert_eq!(glycine.style.title, "Ramachandran Plot (glycine)");
    }

    #[test]
    fn ramachandran_accepts_only_png() {
        assert!(RamachandranConfigBuilder::new().file_type("PNG").build().is_ok());
        let err = RamachandranConfigBuilder::new()
            .file_type("svg")
            .build()
            .unwrap_err();
        assert_eq!(invalid_name(err), "file_type");
    }

    #[test]
    fn empty_title_means_no_title() {
        let config = DccmConfigBuilder::new().title("").build().unwrap();
        assert_eq!(config.style.title, None);
    }
}
