//! # Rendering
//!
//! Turns analysis results into PNG images through the [`Renderer`] trait.
//!
//! Charts are laid out with `plotters` on its SVG backend, which keeps text as SVG
//! `<text>` and needs no font rasterizer at draw time; the SVG is then rasterized with
//! `resvg`. Both live behind the `plotting` cargo feature. Without it,
//! [`default_renderer`] returns a renderer that fails every call with
//! [`RenderError::Unavailable`].
//!
//! Sizes follow the usual figure conventions: a figure is specified in inches, font
//! sizes in points, and the output resolution in dots per inch.

pub mod colormap;

#[cfg(feature = "plotting")]
mod chart;
#[cfg(feature = "plotting")]
mod heatmap;
#[cfg(feature = "plotting")]
mod raster;

use crate::analysis::bfactor::DensityHistogram;
use crate::analysis::matrix::PairwiseMatrix;
use colormap::Colormap;
use std::sync::Arc;
use thiserror::Error;

/// SVG user units per inch of figure size.
pub const UNITS_PER_INCH: f64 = 100.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("Plotting support is not compiled into this build")]
    Unavailable,
    #[error("Invalid plot style: {0}")]
    InvalidStyle(String),
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Rasterization failed: {0}")]
    Rasterize(String),
}

/// Optional lower and upper bounds for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisLimits<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

/// Font sizes in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub title: f64,
    pub label: f64,
    pub tick: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 16.0,
            label: 15.0,
            tick: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapStyle {
    pub colormap: Colormap,
    pub vmin: f64,
    pub vmax: f64,
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
    /// Residue-index spacing of axis ticks.
    pub x_tick_gap: usize,
    pub y_tick_gap: usize,
    /// Visible residue-index window per axis; `max` is exclusive and clamped to the size.
    pub x_limits: AxisLimits<usize>,
    pub y_limits: AxisLimits<usize>,
    pub fonts: FontSizes,
    /// Square figure edge in inches.
    pub size_inches: f64,
    pub dpi: u32,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            colormap: Colormap::default(),
            vmin: 0.0,
            vmax: 1.0,
            title: None,
            x_label: "Residue Index".into(),
            y_label: "Residue Index".into(),
            colorbar_label: String::new(),
            x_tick_gap: 10,
            y_tick_gap: 10,
            x_limits: AxisLimits::default(),
            y_limits: AxisLimits::default(),
            fonts: FontSizes::default(),
            size_inches: 10.0,
            dpi: 300,
        }
    }
}

/// A per-residue line profile with an optional symmetric spread band.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub spread: Option<Vec<f64>>,
}

/// Shared layout of the line and histogram charts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_limits: AxisLimits<f64>,
    pub y_limits: AxisLimits<f64>,
    /// `fonts.label` sizes the x-axis title.
    pub fonts: FontSizes,
    /// Size of the y-axis title in points.
    pub y_label_font: f64,
    /// Line width in points (profile), marker radius in points (scatter), ignored (histogram).
    pub line_width: f64,
    /// Fill opacity of histogram bars or the profile spread band.
    pub alpha: f64,
    pub color: [u8; 3],
    pub width_inches: f64,
    pub height_inches: f64,
    pub dpi: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            x_limits: AxisLimits::default(),
            y_limits: AxisLimits::default(),
            fonts: FontSizes {
                title: 14.0,
                label: 12.0,
                tick: 10.0,
            },
            y_label_font: 12.0,
            line_width: 1.5,
            alpha: 0.5,
            color: [0x1f, 0x77, 0xb4],
            width_inches: 10.0,
            height_inches: 6.0,
            dpi: 300,
        }
    }
}

/// Produces PNG images of analysis results.
pub trait Renderer: Send + Sync {
    /// Renders a square matrix as a heatmap with residue 0 at the bottom-left.
    fn heatmap(&self, matrix: &PairwiseMatrix, style: &HeatmapStyle) -> Result<Vec<u8>, RenderError>;

    /// Renders a line profile, with its spread drawn as a translucent band when present.
    fn profile(&self, profile: &Profile, style: &ChartStyle) -> Result<Vec<u8>, RenderError>;

    /// Renders a density histogram as adjacent bars.
    fn histogram(
        &self,
        histogram: &DensityHistogram,
        style: &ChartStyle,
    ) -> Result<Vec<u8>, RenderError>;

    /// Renders `(x, y)` points as filled markers.
    fn scatter(&self, points: &[(f64, f64)], style: &ChartStyle) -> Result<Vec<u8>, RenderError>;
}

/// Renderer used when plotting support is compiled out.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRenderer;

impl Renderer for UnavailableRenderer {
    fn heatmap(&self, _: &PairwiseMatrix, _: &HeatmapStyle) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unavailable)
    }

    fn profile(&self, _: &Profile, _: &ChartStyle) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unavailable)
    }

    fn histogram(&self, _: &DensityHistogram, _: &ChartStyle) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unavailable)
    }

    fn scatter(&self, _: &[(f64, f64)], _: &ChartStyle) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unavailable)
    }
}

/// Renders with `plotters` and rasterizes with `resvg`.
#[cfg(feature = "plotting")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

#[cfg(feature = "plotting")]
impl Renderer for PlottersRenderer {
    fn heatmap(&self, matrix: &PairwiseMatrix, style: &HeatmapStyle) -> Result<Vec<u8>, RenderError> {
        heatmap::render(matrix, style)
    }

    fn profile(&self, profile: &Profile, style: &ChartStyle) -> Result<Vec<u8>, RenderError> {
        chart::render_profile(profile, style)
    }

    fn histogram(
        &self,
        histogram: &DensityHistogram,
        style: &ChartStyle,
    ) -> Result<Vec<u8>, RenderError> {
        chart::render_histogram(histogram, style)
    }

    fn scatter(&self, points: &[(f64, f64)], style: &ChartStyle) -> Result<Vec<u8>, RenderError> {
        chart::render_scatter(points, style)
    }
}

/// The best renderer this build provides.
pub fn default_renderer() -> Arc<dyn Renderer> {
    #[cfg(feature = "plotting")]
    {
        Arc::new(PlottersRenderer)
    }
    #[cfg(not(feature = "plotting"))]
    {
        Arc::new(UnavailableRenderer)
    }
}

/// Converts a size in points to SVG user units.
pub(crate) fn points_to_units(points: f64) -> f64 {
    points * UNITS_PER_INCH / 72.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_renderer_fails_every_call() {
        let renderer = UnavailableRenderer;
        let matrix = PairwiseMatrix::zeros(2);
        assert_eq!(
            renderer.heatmap(&matrix, &HeatmapStyle::default()),
            Err(RenderError::Unavailable)
        );
        let profile = Profile {
            x: vec![1.0],
            y: vec![1.0],
            spread: None,
        };
        assert_eq!(
            renderer.profile(&profile, &ChartStyle::default()),
            Err(RenderError::Unavailable)
        );
        assert_eq!(
            renderer.scatter(&[(0.0, 0.0)], &ChartStyle::default()),
            Err(RenderError::Unavailable)
        );
    }

    #[test]
    fn point_sizes_convert_to_units() {
        assert_eq!(points_to_units(72.0), UNITS_PER_INCH);
    }
}
