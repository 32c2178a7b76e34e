//! Strip filters
//!
//! Each named style maps to a fixed chain of CSS-style filter functions.
//! The chain is applied to every frame of a strip with the colour matrices
//! from the Filter Effects module, so the same input always produces the
//! same pixels.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One step of a filter chain. Amounts use CSS units (1.0 = 100%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Sepia(f32),
    Grayscale(f32),
    Contrast(f32),
    Brightness(f32),
}

impl FilterOp {
    fn css(self) -> String {
        match self {
            FilterOp::Sepia(a) => format!("sepia({})", a),
            FilterOp::Grayscale(a) => format!("grayscale({})", a),
            FilterOp::Contrast(a) => format!("contrast({})", a),
            FilterOp::Brightness(a) => format!("brightness({})", a),
        }
    }

    /// Apply to one normalized RGB triple
    fn apply(self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        let out = match self {
            FilterOp::Sepia(amount) => {
                let a = 1.0 - amount.clamp(0.0, 1.0);
                [
                    (0.393 + 0.607 * a) * r + (0.769 - 0.769 * a) * g + (0.189 - 0.189 * a) * b,
                    (0.349 - 0.349 * a) * r + (0.686 + 0.314 * a) * g + (0.168 - 0.168 * a) * b,
                    (0.272 - 0.272 * a) * r + (0.534 - 0.534 * a) * g + (0.131 + 0.869 * a) * b,
                ]
            }
            FilterOp::Grayscale(amount) => {
                let a = 1.0 - amount.clamp(0.0, 1.0);
                [
                    (0.2126 + 0.7874 * a) * r + (0.7152 - 0.7152 * a) * g + (0.0722 - 0.0722 * a) * b,
                    (0.2126 - 0.2126 * a) * r + (0.7152 + 0.2848 * a) * g + (0.0722 - 0.0722 * a) * b,
                    (0.2126 - 0.2126 * a) * r + (0.7152 - 0.7152 * a) * g + (0.0722 + 0.9278 * a) * b,
                ]
            }
            FilterOp::Contrast(c) => {
                let intercept = 0.5 - 0.5 * c;
                [r * c + intercept, g * c + intercept, b * c + intercept]
            }
            FilterOp::Brightness(k) => [r * k, g * k, b * k],
        };
        out.map(|v| v.clamp(0.0, 1.0))
    }
}

/// Named strip styles offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripFilter {
    Vintage,
    Retro,
    Classic,
    Modern,
}

impl StripFilter {
    pub const ALL: [StripFilter; 4] = [
        StripFilter::Vintage,
        StripFilter::Retro,
        StripFilter::Classic,
        StripFilter::Modern,
    ];

    /// Look up a style by name. Unknown names have no filter.
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn name(self) -> &'static str {
        match self {
            StripFilter::Vintage => "vintage",
            StripFilter::Retro => "retro",
            StripFilter::Classic => "classic",
            StripFilter::Modern => "modern",
        }
    }

    /// Filter chain for this style, in application order
    pub fn ops(self) -> &'static [FilterOp] {
        match self {
            StripFilter::Vintage => &[FilterOp::Sepia(0.5), FilterOp::Contrast(1.2)],
            StripFilter::Retro => &[
                FilterOp::Grayscale(0.5),
                FilterOp::Contrast(1.1),
                FilterOp::Brightness(1.1),
            ],
            StripFilter::Classic => &[FilterOp::Contrast(1.1), FilterOp::Brightness(1.1)],
            StripFilter::Modern => &[],
        }
    }

    /// CSS `filter` expression for this style (`none` for the identity)
    pub fn css_expression(self) -> String {
        css_expression(self.ops())
    }
}

impl FromStr for StripFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vintage" => Ok(StripFilter::Vintage),
            "retro" => Ok(StripFilter::Retro),
            "classic" => Ok(StripFilter::Classic),
            "modern" => Ok(StripFilter::Modern),
            other => Err(format!("Unknown filter: {}", other)),
        }
    }
}

impl std::fmt::Display for StripFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Render a chain as a CSS `filter` value
pub fn css_expression(ops: &[FilterOp]) -> String {
    if ops.is_empty() {
        return "none".to_string();
    }
    ops.iter()
        .map(|op| op.css())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ops applied for a possibly-unknown filter name
pub fn ops_for_name(name: &str) -> &'static [FilterOp] {
    StripFilter::from_name(name).map(StripFilter::ops).unwrap_or(&[])
}

/// Apply a chain in place. Alpha is left untouched.
pub fn apply_filter(image: &mut RgbaImage, ops: &[FilterOp]) {
    if ops.is_empty() {
        return;
    }

    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let mut rgb = [r, g, b].map(|c| f32::from(c) / 255.0);
        for op in ops {
            rgb = op.apply(rgb);
        }
        let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
        pixel.0 = [r, g, b, a];
    }
}
