use super::raster;
use super::{AxisLimits, ChartStyle, Profile, RenderError, UNITS_PER_INCH, points_to_units};
use crate::analysis::bfactor::DensityHistogram;
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

const FONT: &str = "sans-serif";
/// Fraction of the data span added on each side of an automatic axis range.
const PADDING: f64 = 0.05;

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn drawing<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if span > 0.0 {
        (lo - span * PADDING, hi + span * PADDING)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

/// Resolves an axis range from data bounds, letting explicit limits win.
fn axis_range(limits: AxisLimits<f64>, data: (f64, f64), axis: &str) -> Result<Range<f64>, RenderError> {
    let lo = limits.min.unwrap_or(data.0);
    let hi = limits.max.unwrap_or(data.1);
    if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
        return Err(RenderError::InvalidStyle(format!("{axis} range {lo}..{hi} is empty")));
    }
    Ok(lo..hi)
}

fn bounds(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn figure_size(style: &ChartStyle) -> Result<(u32, u32), RenderError> {
    if !(style.width_inches > 0.0 && style.height_inches > 0.0) || style.dpi == 0 {
        return Err(RenderError::InvalidStyle(
            "figure size and resolution must be positive".into(),
        ));
    }
    Ok((
        (style.width_inches * UNITS_PER_INCH).round() as u32,
        (style.height_inches * UNITS_PER_INCH).round() as u32,
    ))
}

/// Builds the titled, gridded chart frame shared by both chart kinds.
fn frame<'a, DB: DrawingBackend + 'a>(
    root: &'a DrawingArea<DB, Shift>,
    style: &ChartStyle,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, DB>, RenderError> {
    let label_font = points_to_units(style.fonts.label);
    let y_label_font = points_to_units(style.y_label_font);
    let tick_font = points_to_units(style.fonts.tick);
    let margin = tick_font.round() as i32;

    let mut chart = ChartBuilder::on(root)
        .caption(&style.title, (FONT, points_to_units(style.fonts.title)))
        .margin(margin as u32)
        .x_label_area_size((label_font + tick_font * 2.5).round() as u32)
        .y_label_area_size((y_label_font + tick_font * 5.0).round() as u32)
        .build_cartesian_2d(x, y)
        .map_err(drawing)?;
    chart
        .configure_mesh()
        .max_light_lines(0)
        .bold_line_style(BLACK.mix(0.3))
        .x_desc(style.x_label.as_str())
        .axis_desc_style((FONT, label_font))
        .label_style((FONT, tick_font))
        .draw()
        .map_err(drawing)?;

    // The mesh shares one description style between axes, so the y title is drawn here.
    if !style.y_label.is_empty() {
        let (_, plot_y) = chart.plotting_area().get_pixel_range();
        let font = (FONT, y_label_font)
            .into_font()
            .transform(FontTransform::Rotate270);
        let y_desc = TextStyle::from(font).pos(Pos::new(HPos::Center, VPos::Top));
        root.draw(&Text::new(
            style.y_label.as_str(),
            (margin, (plot_y.start + plot_y.end) / 2),
            y_desc,
        ))
        .map_err(drawing)?;
    }
    Ok(chart)
}

/// Draws `profile` as a line, with `y ± spread` as a translucent band behind it.
pub(crate) fn render_profile(profile: &Profile, style: &ChartStyle) -> Result<Vec<u8>, RenderError> {
    let (width, height) = figure_size(style)?;
    if profile.x.is_empty() || profile.x.len() != profile.y.len() {
        return Err(RenderError::InvalidStyle(format!(
            "profile needs matching, non-empty x and y ({} vs {} points)",
            profile.x.len(),
            profile.y.len()
        )));
    }
    let spread = match &profile.spread {
        Some(spread) if spread.len() != profile.y.len() => {
            return Err(RenderError::InvalidStyle(format!(
                "spread has {} values for {} points",
                spread.len(),
                profile.y.len()
            )));
        }
        Some(spread) => spread.clone(),
        None => vec![0.0; profile.y.len()],
    };

    let upper: Vec<(f64, f64)> = profile
        .x
        .iter()
        .zip(profile.y.iter().zip(&spread))
        .map(|(&x, (&y, &s))| (x, y + s))
        .collect();
    let lower: Vec<(f64, f64)> = profile
        .x
        .iter()
        .zip(profile.y.iter().zip(&spread))
        .map(|(&x, (&y, &s))| (x, y - s))
        .collect();

    let x_data = bounds(profile.x.iter().copied())
        .ok_or_else(|| RenderError::InvalidStyle("profile has no finite x values".into()))?;
    let y_data = bounds(upper.iter().chain(&lower).map(|&(_, y)| y))
        .ok_or_else(|| RenderError::InvalidStyle("profile has no finite y values".into()))?;
    let (x_lo, x_hi) = if x_data.0 < x_data.1 {
        x_data
    } else {
        padded(x_data.0, x_data.1)
    };
    let x = axis_range(style.x_limits, (x_lo, x_hi), "x")?;
    let y = axis_range(style.y_limits, padded(y_data.0, y_data.1), "y")?;

    let [r, g, b] = style.color;
    let color = RGBColor(r, g, b);
    let stroke = points_to_units(style.line_width).round().max(1.0) as u32;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;
        let mut chart = frame(&root, style, x, y)?;

        if profile.spread.is_some() {
            let band: Vec<(f64, f64)> = upper.into_iter().chain(lower.into_iter().rev()).collect();
            chart
                .draw_series(std::iter::once(Polygon::new(
                    band,
                    color.mix(style.alpha).filled(),
                )))
                .map_err(drawing)?;
        }
        chart
            .draw_series(LineSeries::new(
                profile.x.iter().copied().zip(profile.y.iter().copied()),
                color.stroke_width(stroke),
            ))
            .map_err(drawing)?;
        root.present().map_err(drawing)?;
    }

    raster::rasterize(&svg, style.dpi, None)
}

/// Draws `histogram` as adjacent bars.
pub(crate) fn render_histogram(
    histogram: &DensityHistogram,
    style: &ChartStyle,
) -> Result<Vec<u8>, RenderError> {
    let (width, height) = figure_size(style)?;
    if histogram.densities.is_empty() || histogram.edges.len() != histogram.densities.len() + 1 {
        return Err(RenderError::InvalidStyle(format!(
            "histogram needs one more edge than bins ({} edges, {} bins)",
            histogram.edges.len(),
            histogram.densities.len()
        )));
    }

    let (first, last) = (histogram.edges[0], histogram.edges[histogram.edges.len() - 1]);
    let x = axis_range(style.x_limits, padded(first, last), "x")?;
    let peak = histogram.densities.iter().copied().fold(0.0, f64::max);
    let y = axis_range(
        style.y_limits,
        (0.0, if peak > 0.0 { peak * (1.0 + PADDING) } else { 1.0 }),
        "y",
    )?;

    let [r, g, b] = style.color;
    let fill = RGBColor(r, g, b).mix(style.alpha).filled();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;
        let mut chart = frame(&root, style, x, y)?;
        chart
            .draw_series(
                histogram
                    .edges
                    .windows(2)
                    .zip(&histogram.densities)
                    .map(|(edge, &density)| Rectangle::new([(edge[0], 0.0), (edge[1], density)], fill)),
            )
            .map_err(drawing)?;
        root.present().map_err(drawing)?;
    }

    raster::rasterize(&svg, style.dpi, None)
}

/// Draws `points` as filled circles; non-finite points are skipped.
pub(crate) fn render_scatter(points: &[(f64, f64)], style: &ChartStyle) -> Result<Vec<u8>, RenderError> {
    let (width, height) = figure_size(style)?;
    let x_data = bounds(points.iter().map(|&(x, _)| x))
        .ok_or_else(|| RenderError::InvalidStyle("scatter has no finite points".into()))?;
    let y_data = bounds(points.iter().map(|&(_, y)| y))
        .ok_or_else(|| RenderError::InvalidStyle("scatter has no finite points".into()))?;
    let x = axis_range(style.x_limits, padded(x_data.0, x_data.1), "x")?;
    let y = axis_range(style.y_limits, padded(y_data.0, y_data.1), "y")?;

    let [r, g, b] = style.color;
    let fill = RGBColor(r, g, b).mix(style.alpha).filled();
    let radius = points_to_units(style.line_width).round().max(1.0) as i32;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;
        let mut chart = frame(&root, style, x, y)?;
        chart
            .draw_series(
                points
                    .iter()
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|&point| Circle::new(point, radius, fill)),
            )
            .map_err(drawing)?;
        root.present().map_err(drawing)?;
    }

    raster::rasterize(&svg, style.dpi, None)
}
