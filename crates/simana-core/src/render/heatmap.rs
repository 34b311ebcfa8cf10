use super::raster::{self, Overlay};
use super::{AxisLimits, HeatmapStyle, RenderError, UNITS_PER_INCH, points_to_units};
use crate::analysis::matrix::PairwiseMatrix;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

const FONT: &str = "sans-serif";
/// Fraction of the figure width given to the heatmap; the rest holds the colorbar.
const MAIN_FRACTION: f64 = 0.85;
const COLORBAR_STEPS: usize = 256;

fn drawing<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Visible residue-index window `[lo, hi)` of one axis.
fn window(limits: AxisLimits<usize>, size: usize, axis: &str) -> Result<Range<usize>, RenderError> {
    let lo = limits.min.unwrap_or(0);
    let hi = limits.max.map_or(size, |max| max.min(size));
    if lo >= hi {
        return Err(RenderError::InvalidStyle(format!(
            "{axis} range {lo}..{hi} selects no residues of a {size}x{size} matrix"
        )));
    }
    Ok(lo..hi)
}

fn ticks(window: &Range<usize>, gap: usize) -> Vec<f64> {
    window.clone().step_by(gap).map(|i| i as f64).collect()
}

fn validate(matrix: &PairwiseMatrix, style: &HeatmapStyle) -> Result<(), RenderError> {
    if matrix.size() == 0 {
        return Err(RenderError::InvalidStyle("cannot draw an empty matrix".into()));
    }
    if !(style.vmin < style.vmax) {
        return Err(RenderError::InvalidStyle(format!(
            "color range {}..{} is empty",
            style.vmin, style.vmax
        )));
    }
    if style.x_tick_gap == 0 || style.y_tick_gap == 0 {
        return Err(RenderError::InvalidStyle("tick spacing must be positive".into()));
    }
    if !(style.size_inches > 0.0) || style.dpi == 0 {
        return Err(RenderError::InvalidStyle(
            "figure size and resolution must be positive".into(),
        ));
    }
    Ok(())
}

/// Draws `matrix` with residue 0 at the bottom-left and a colorbar on the right.
///
/// Axes and text are laid out as SVG; the cells are painted afterwards as one raster
/// image stretched over the plot area, one pixel per matrix entry.
pub(crate) fn render(matrix: &PairwiseMatrix, style: &HeatmapStyle) -> Result<Vec<u8>, RenderError> {
    validate(matrix, style)?;
    let size = matrix.size();
    let xs = window(style.x_limits, size, "x")?;
    let ys = window(style.y_limits, size, "y")?;
    let (svg, plot_area) = layout(style, &xs, &ys)?;

    let (width, height) = (xs.len() as u32, ys.len() as u32);
    let colors = ys.clone().rev().flat_map(|row| {
        xs.clone()
            .map(move |col| style.colormap.map(matrix.get(row, col), style.vmin, style.vmax))
    });
    let cells = raster::pixmap_from_rgb(width, height, colors)?;

    raster::rasterize(
        &svg,
        style.dpi,
        Some(Overlay {
            pixels: cells,
            area: plot_area,
        }),
    )
}

/// Lays out axes, ticks and the colorbar as SVG and returns it with the plot area in
/// SVG units.
fn layout(
    style: &HeatmapStyle,
    xs: &Range<usize>,
    ys: &Range<usize>,
) -> Result<(String, (f64, f64, f64, f64)), RenderError> {
    let edge = (style.size_inches * UNITS_PER_INCH).round() as u32;
    let title_font = points_to_units(style.fonts.title);
    let label_font = points_to_units(style.fonts.label);
    let tick_font = points_to_units(style.fonts.tick);
    let label_area = (label_font + tick_font * 3.5).round() as u32;

    let mut svg = String::new();
    let plot_area = {
        let root = SVGBackend::with_string(&mut svg, (edge, edge)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;
        let root = match &style.title {
            Some(title) => root.titled(title, (FONT, title_font)).map_err(drawing)?,
            None => root,
        };
        let (main, bar) = root.split_horizontally((edge as f64 * MAIN_FRACTION) as u32);

        let x_ticks = ticks(xs, style.x_tick_gap);
        let y_ticks = ticks(ys, style.y_tick_gap);
        let (x_lo, y_lo) = (xs.start as f64 - 0.5, ys.start as f64 - 0.5);

        let mut chart = ChartBuilder::on(&main)
            .margin(tick_font.round() as u32)
            .x_label_area_size(label_area)
            .y_label_area_size(label_area)
            .build_cartesian_2d(x_lo..xs.end as f64 - 0.5, y_lo..ys.end as f64 - 0.5)
            .map_err(drawing)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(0)
            .y_labels(0)
            .x_desc(style.x_label.as_str())
            .y_desc(style.y_label.as_str())
            .axis_desc_style((FONT, label_font))
            .draw()
            .map_err(drawing)?;

        // Residue ticks sit on cell centers at exact gaps, so they are drawn by hand.
        let (base_x, base_y) = main.get_base_pixel();
        let tick_len = (tick_font * 0.4).round().max(1.0) as i32;
        let x_tick_style = TextStyle::from((FONT, tick_font)).pos(Pos::new(HPos::Center, VPos::Top));
        let y_tick_style = TextStyle::from((FONT, tick_font)).pos(Pos::new(HPos::Right, VPos::Center));
        for &x in &x_ticks {
            let (px, py) = chart.backend_coord(&(x, y_lo));
            let (px, py) = (px - base_x, py - base_y);
            main.draw(&PathElement::new(vec![(px, py), (px, py + tick_len)], BLACK))
                .map_err(drawing)?;
            main.draw(&Text::new(
                format!("{x:.0}"),
                (px, py + tick_len * 2),
                x_tick_style.clone(),
            ))
            .map_err(drawing)?;
        }
        for &y in &y_ticks {
            let (px, py) = chart.backend_coord(&(x_lo, y));
            let (px, py) = (px - base_x, py - base_y);
            main.draw(&PathElement::new(vec![(px - tick_len, py), (px, py)], BLACK))
                .map_err(drawing)?;
            main.draw(&Text::new(
                format!("{y:.0}"),
                (px - tick_len * 2, py),
                y_tick_style.clone(),
            ))
            .map_err(drawing)?;
        }

        let (plot_x, plot_y) = chart.plotting_area().get_pixel_range();
        let (_, main_y) = main.get_pixel_range();
        draw_colorbar(
            &bar,
            style,
            (plot_y.start - main_y.start).max(0) as u32,
            (main_y.end - plot_y.end).max(0) as u32,
            label_font,
            tick_font,
        )?;

        root.present().map_err(drawing)?;
        (
            plot_x.start as f64,
            plot_y.start as f64,
            plot_x.end as f64,
            plot_y.end as f64,
        )
    };
    Ok((svg, plot_area))
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    style: &HeatmapStyle,
    top: u32,
    bottom: u32,
    label_font: f64,
    tick_font: f64,
) -> Result<(), RenderError> {
    let mut bar = ChartBuilder::on(area)
        .margin_top(top)
        .margin_bottom(bottom)
        .margin_left((tick_font * 0.5).round() as u32)
        .right_y_label_area_size((label_font + tick_font * 4.0).round() as u32)
        .build_cartesian_2d(0.0..1.0, style.vmin..style.vmax)
        .map_err(drawing)?;
    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .y_desc(style.colorbar_label.as_str())
        .axis_desc_style((FONT, label_font))
        .label_style((FONT, tick_font))
        .draw()
        .map_err(drawing)?;

    let step = (style.vmax - style.vmin) / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let lo = style.vmin + step * i as f64;
        let [r, g, b] = style
            .colormap
            .at((i as f64 + 0.5) / COLORBAR_STEPS as f64);
        Rectangle::new([(0.0, lo), (1.0, lo + step)], RGBColor(r, g, b).filled())
    }))
    .map_err(drawing)?;
    Ok(())
}
