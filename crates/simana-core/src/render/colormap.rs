use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Anchor stops of a colormap: ascending positions in `[0, 1]` with their RGB colour.
type Stops = &'static [(f64, [u8; 3])];

const VIRIDIS: Stops = &[
    (0.0, [0x44, 0x01, 0x54]),
    (0.1, [0x48, 0x24, 0x75]),
    (0.2, [0x41, 0x44, 0x87]),
    (0.3, [0x35, 0x5f, 0x8d]),
    (0.4, [0x2a, 0x78, 0x8e]),
    (0.5, [0x21, 0x91, 0x8c]),
    (0.6, [0x22, 0xa8, 0x84]),
    (0.7, [0x44, 0xbf, 0x70]),
    (0.8, [0x7a, 0xd1, 0x51]),
    (0.9, [0xbd, 0xdf, 0x26]),
    (1.0, [0xfd, 0xe7, 0x25]),
];

const PLASMA: Stops = &[
    (0.0, [0x0d, 0x08, 0x87]),
    (0.1, [0x41, 0x04, 0x9d]),
    (0.2, [0x6a, 0x00, 0xa8]),
    (0.3, [0x8f, 0x0d, 0xa4]),
    (0.4, [0xb1, 0x2a, 0x90]),
    (0.5, [0xcc, 0x47, 0x78]),
    (0.6, [0xe1, 0x64, 0x62]),
    (0.7, [0xf2, 0x84, 0x4b]),
    (0.8, [0xfc, 0xa6, 0x36]),
    (0.9, [0xfc, 0xce, 0x25]),
    (1.0, [0xf0, 0xf9, 0x21]),
];

const INFERNO: Stops = &[
    (0.0, [0x00, 0x00, 0x04]),
    (0.1, [0x16, 0x0b, 0x39]),
    (0.2, [0x42, 0x0a, 0x68]),
    (0.3, [0x6a, 0x17, 0x6e]),
    (0.4, [0x93, 0x26, 0x67]),
    (0.5, [0xbc, 0x37, 0x54]),
    (0.6, [0xdd, 0x51, 0x3a]),
    (0.7, [0xf3, 0x78, 0x19]),
    (0.8, [0xfc, 0xa5, 0x0a]),
    (0.9, [0xf6, 0xd7, 0x46]),
    (1.0, [0xfc, 0xff, 0xa4]),
];

const MAGMA: Stops = &[
    (0.0, [0x00, 0x00, 0x04]),
    (0.1, [0x14, 0x0e, 0x36]),
    (0.2, [0x3b, 0x0f, 0x70]),
    (0.3, [0x64, 0x1a, 0x80]),
    (0.4, [0x8c, 0x29, 0x81]),
    (0.5, [0xb7, 0x37, 0x79]),
    (0.6, [0xde, 0x49, 0x68]),
    (0.7, [0xf7, 0x70, 0x5c]),
    (0.8, [0xfe, 0x9f, 0x6d]),
    (0.9, [0xfe, 0xcf, 0x92]),
    (1.0, [0xfc, 0xfd, 0xbf]),
];

const CIVIDIS: Stops = &[
    (0.0, [0x00, 0x22, 0x4e]),
    (0.1, [0x12, 0x35, 0x70]),
    (0.2, [0x3b, 0x49, 0x6c]),
    (0.3, [0x57, 0x5d, 0x6d]),
    (0.4, [0x70, 0x71, 0x73]),
    (0.5, [0x8a, 0x87, 0x79]),
    (0.6, [0xa6, 0x9d, 0x75]),
    (0.7, [0xc4, 0xb5, 0x6c]),
    (0.8, [0xe4, 0xcf, 0x5b]),
    (0.9, [0xf3, 0xda, 0x49]),
    (1.0, [0xfe, 0xe8, 0x38]),
];

const GRAY: Stops = &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

const GREYS: Stops = &[(0.0, [255, 255, 255]), (1.0, [0, 0, 0])];

const BLUES: Stops = &[
    (0.0, [0xf7, 0xfb, 0xff]),
    (0.125, [0xde, 0xeb, 0xf7]),
    (0.25, [0xc6, 0xdb, 0xef]),
    (0.375, [0x9e, 0xca, 0xe1]),
    (0.5, [0x6b, 0xae, 0xd6]),
    (0.625, [0x42, 0x92, 0xc6]),
    (0.75, [0x21, 0x71, 0xb5]),
    (0.875, [0x08, 0x51, 0x9c]),
    (1.0, [0x08, 0x30, 0x6b]),
];

const REDS: Stops = &[
    (0.0, [0xff, 0xf5, 0xf0]),
    (0.125, [0xfe, 0xe0, 0xd2]),
    (0.25, [0xfc, 0xbb, 0xa1]),
    (0.375, [0xfc, 0x92, 0x72]),
    (0.5, [0xfb, 0x6a, 0x4a]),
    (0.625, [0xef, 0x3b, 0x2c]),
    (0.75, [0xcb, 0x18, 0x1d]),
    (0.875, [0xa5, 0x0f, 0x15]),
    (1.0, [0x67, 0x00, 0x0d]),
];

const GREENS: Stops = &[
    (0.0, [0xf7, 0xfc, 0xf5]),
    (0.125, [0xe5, 0xf5, 0xe0]),
    (0.25, [0xc7, 0xe9, 0xc0]),
    (0.375, [0xa1, 0xd9, 0x9b]),
    (0.5, [0x74, 0xc4, 0x76]),
    (0.625, [0x41, 0xab, 0x5d]),
    (0.75, [0x23, 0x8b, 0x45]),
    (0.875, [0x00, 0x6d, 0x2c]),
    (1.0, [0x00, 0x44, 0x1b]),
];

const HOT: Stops = &[
    (0.0, [11, 0, 0]),
    (0.365, [255, 0, 0]),
    (0.746, [255, 255, 0]),
    (1.0, [255, 255, 255]),
];

const COOLWARM: Stops = &[
    (0.0, [59, 76, 192]),
    (0.125, [98, 130, 234]),
    (0.25, [141, 176, 254]),
    (0.375, [184, 208, 249]),
    (0.5, [221, 221, 221]),
    (0.625, [245, 196, 173]),
    (0.75, [244, 154, 123]),
    (0.875, [222, 96, 77]),
    (1.0, [180, 4, 38]),
];

const BWR: Stops = &[
    (0.0, [0, 0, 255]),
    (0.5, [255, 255, 255]),
    (1.0, [255, 0, 0]),
];

const SEISMIC: Stops = &[
    (0.0, [0, 0, 76]),
    (0.25, [0, 0, 255]),
    (0.5, [255, 255, 255]),
    (0.75, [255, 0, 0]),
    (1.0, [127, 0, 0]),
];

const RDBU: Stops = &[
    (0.0, [0x67, 0x00, 0x1f]),
    (0.1, [0xb2, 0x18, 0x2b]),
    (0.2, [0xd6, 0x60, 0x4d]),
    (0.3, [0xf4, 0xa5, 0x82]),
    (0.4, [0xfd, 0xdb, 0xc7]),
    (0.5, [0xf7, 0xf7, 0xf7]),
    (0.6, [0xd1, 0xe5, 0xf0]),
    (0.7, [0x92, 0xc5, 0xde]),
    (0.8, [0x43, 0x93, 0xc3]),
    (0.9, [0x21, 0x66, 0xac]),
    (1.0, [0x05, 0x30, 0x61]),
];

static COLORMAPS: Map<&'static str, (&'static str, Stops)> = phf_map! {
    "viridis" => ("viridis", VIRIDIS),
    "plasma" => ("plasma", PLASMA),
    "inferno" => ("inferno", INFERNO),
    "magma" => ("magma", MAGMA),
    "cividis" => ("cividis", CIVIDIS),
    "gray" => ("gray", GRAY),
    "grey" => ("gray", GRAY),
    "greys" => ("greys", GREYS),
    "binary" => ("binary", GREYS),
    "blues" => ("blues", BLUES),
    "reds" => ("reds", REDS),
    "greens" => ("greens", GREENS),
    "hot" => ("hot", HOT),
    "coolwarm" => ("coolwarm", COOLWARM),
    "bwr" => ("bwr", BWR),
    "seismic" => ("seismic", SEISMIC),
    "rdbu" => ("rdbu", RDBU),
};

/// Colour used for undefined (NaN) values.
pub const MISSING_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown colormap '{0}'")]
pub struct UnknownColormap(pub String);

/// A named, piecewise-linear colormap. A `_r` suffix on the name reverses it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colormap {
    name: &'static str,
    stops: Stops,
    reversed: bool,
}

impl Colormap {
    pub fn names() -> impl Iterator<Item = &'static str> {
        COLORMAPS.keys().copied()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Colour at position `t`, clamped to `[0, 1]`.
    pub fn at(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let t = if self.reversed { 1.0 - t } else { t };

        let upper = self
            .stops
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            return self.stops[0].1;
        }
        let (p0, c0) = self.stops[upper - 1];
        let (p1, c1) = self.stops[upper];
        let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
        [lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])]
    }

    /// Maps `value` from `[vmin, vmax]` onto the colormap; NaN maps to [`MISSING_COLOR`].
    pub fn map(&self, value: f64, vmin: f64, vmax: f64) -> [u8; 3] {
        if value.is_nan() {
            return MISSING_COLOR;
        }
        let span = vmax - vmin;
        let t = if span > 0.0 { (value - vmin) / span } else { 0.5 };
        self.at(t)
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self {
            name: "viridis",
            stops: VIRIDIS,
            reversed: false,
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, if self.reversed { "_r" } else { "" })
    }
}

impl FromStr for Colormap {
    type Err = UnknownColormap;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        COLORMAPS
            .get(base)
            .map(|&(name, stops)| Colormap {
                name,
                stops,
                reversed,
            })
            .ok_or_else(|| UnknownColormap(s.to_string()))
    }
}
