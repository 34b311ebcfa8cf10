use super::{RenderError, UNITS_PER_INCH};
use resvg::{tiny_skia, usvg};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Sans-serif families tried, in order, for SVG `font-family="sans-serif"` text.
const PREFERRED_SANS: &[&str] = &["DejaVu Sans", "Liberation Sans", "Arial", "Helvetica"];

/// A raster image stretched over a rectangle of the SVG canvas.
pub(crate) struct Overlay {
    pub pixels: tiny_skia::Pixmap,
    /// `(left, top, right, bottom)` in SVG user units.
    pub area: (f64, f64, f64, f64),
}

fn fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            let has_family =
                |name: &str| db.faces().any(|face| face.families.iter().any(|(n, _)| n == name));
            let family = PREFERRED_SANS
                .iter()
                .find(|name| has_family(name))
                .map(|name| name.to_string())
                .or_else(|| {
                    db.faces()
                        .next()
                        .and_then(|face| face.families.first().map(|(n, _)| n.clone()))
                });
            if let Some(family) = family {
                db.set_sans_serif_family(family);
            }
            debug!(faces = db.len(), "Loaded system fonts for rasterization.");
            Arc::new(db)
        })
        .clone()
}

/// Rasterizes an SVG document to PNG at `dpi`, optionally drawing an overlay image on top.
///
/// The overlay is scaled with nearest-neighbour filtering, so each of its pixels stays a
/// crisp rectangle however large it is drawn.
pub(crate) fn rasterize(svg: &str, dpi: u32, overlay: Option<Overlay>) -> Result<Vec<u8>, RenderError> {
    let mut options = usvg::Options::default();
    options.fontdb = fonts();
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| RenderError::Rasterize(e.to_string()))?;

    let scale = dpi as f32 / UNITS_PER_INCH as f32;
    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        RenderError::Rasterize(format!("cannot allocate a {width}x{height} image"))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    if let Some(Overlay { pixels, area }) = overlay {
        let (left, top, right, bottom) = area;
        let sx = (right - left) as f32 * scale / pixels.width() as f32;
        let sy = (bottom - top) as f32 * scale / pixels.height() as f32;
        let paint = tiny_skia::PixmapPaint {
            quality: tiny_skia::FilterQuality::Nearest,
            ..Default::default()
        };
        pixmap.draw_pixmap(
            0,
            0,
            pixels.as_ref(),
            &paint,
            tiny_skia::Transform::from_row(sx, 0.0, 0.0, sy, left as f32 * scale, top as f32 * scale),
            None,
        );
    }

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Rasterize(e.to_string()))
}

/// Builds an opaque pixmap from row-major RGB colours.
pub(crate) fn pixmap_from_rgb(
    width: u32,
    height: u32,
    colors: impl IntoIterator<Item = [u8; 3]>,
) -> Result<tiny_skia::Pixmap, RenderError> {
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        RenderError::Rasterize(format!("cannot allocate a {width}x{height} cell image"))
    })?;
    for (pixel, [r, g, b]) in pixmap.pixels_mut().iter_mut().zip(colors) {
        *pixel = tiny_skia::ColorU8::from_rgba(r, g, b, 255).premultiply();
    }
    Ok(pixmap)
}

#[cfg(test)]
pub(crate) fn png_dimensions(png: &[u8]) -> Option<(u32, u32)> {
    const SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    if png.len() < 24 || &png[..8] != SIGNATURE {
        return None;
    }
    let width = u32::from_be_bytes(png[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(png[20..24].try_into().ok()?);
    Some((width, height))
}
