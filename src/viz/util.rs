//! Utility functions for visualization: palettes, theme colors, axis ranges.

use plotters::prelude::*;

use super::text::estimate_text_width_px;
use super::types::{Palette, Theme};

/// Microsoft Office (2013+) chart series palette.
/// Order: Blue, Orange, Gray, Gold, Light Blue, Green, Dark Blue, Dark Orange, Dark Gray, Brownish Gold.
const OFFICE10: [RGBColor; 10] = [
    RGBColor(68, 114, 196),  // blue      (#4472C4)
    RGBColor(237, 125, 49),  // orange    (#ED7D31)
    RGBColor(165, 165, 165), // gray      (#A5A5A5)
    RGBColor(255, 192, 0),   // gold      (#FFC000)
    RGBColor(91, 155, 213),  // light blue(#5B9BD5)
    RGBColor(112, 173, 71),  // green     (#70AD47)
    RGBColor(38, 68, 120),   // dark blue (#264478)
    RGBColor(158, 72, 14),   // dark org. (#9E480E)
    RGBColor(99, 99, 99),    // dark gray (#636363)
    RGBColor(153, 115, 0),   // brownish  (#997300)
];

/// ColorBrewer Set2.
const SET2: [RGBColor; 8] = [
    RGBColor(102, 194, 165), // #66C2A5
    RGBColor(252, 141, 98),  // #FC8D62
    RGBColor(141, 160, 203), // #8DA0CB
    RGBColor(231, 138, 195), // #E78AC3
    RGBColor(166, 216, 84),  // #A6D854
    RGBColor(255, 217, 47),  // #FFD92F
    RGBColor(229, 196, 148), // #E5C494
    RGBColor(179, 179, 179), // #B3B3B3
];

/// Series color for index `idx`, cycling through the palette.
#[inline]
pub fn series_color(palette: Palette, idx: usize) -> RGBAColor {
    match palette {
        Palette::Set2 => SET2[idx % SET2.len()].to_rgba(),
        Palette::Office => OFFICE10[idx % OFFICE10.len()].to_rgba(),
    }
}

/// (plot face, grid line) colors; no grid color for [`Theme::White`].
pub fn theme_colors(theme: Theme) -> (RGBColor, Option<RGBColor>) {
    match theme {
        Theme::DarkGrid => (RGBColor(234, 234, 242), Some(WHITE)),
        Theme::WhiteGrid => (WHITE, Some(RGBColor(222, 222, 222))),
        Theme::White => (WHITE, None),
    }
}

/// Pixel stroke width for a fractional line weight (at least 1px).
pub fn stroke_px(weight: f64) -> u32 {
    if weight.is_finite() {
        weight.round().max(1.0) as u32
    } else {
        1
    }
}

/// Padded value range that always contains zero (area fills start at zero).
pub fn value_range_with_zero(min: f64, max: f64) -> (f64, f64) {
    let lo = min.min(0.0);
    let hi = max.max(0.0);
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (if lo < 0.0 { lo - pad } else { lo }, hi + pad)
}

/// Compute a tight left label area width for the Y axis (in pixels),
/// based on the formatted tick labels that will appear.
///
/// Returns a width clamped to a sensible range to avoid extremes.
pub fn compute_left_label_area_px<F: Fn(f64) -> String>(
    ymin: f64,
    ymax: f64,
    ticks: usize,
    font_px: u32,
    fmt: F,
) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let v = ymin + (ymax - ymin) * t;
        max_px = max_px.max(estimate_text_width_px(&fmt(v), font_px));
    }
    // Room for tick marks and the rotated axis description.
    max_px.saturating_add(34).clamp(48, 160)
}
