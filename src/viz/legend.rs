//! Legend layout and drawing for external legend placement.
//!
//! Right: a single column of swatches. Top/Bottom: a band that flows items left
//! to right, starting at the plot's x-axis, and wraps into rows.

use anyhow::{Result, anyhow};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::text::{estimate_text_width_px, truncate_to_width, wrap_text_to_width};
use super::types::LegendMode;

// Shared by the estimator and the painter.
const FONT_PX: u32 = 14;
const LINE_H: i32 = FONT_PX as i32 + 2;
const ROW_GAP: i32 = 4;
const PAD: i32 = 8;
const SWATCH: i32 = 10;
const SWATCH_GAP: i32 = 8;
const ITEM_GAP: i32 = 18;

fn item_width(label: &str, cap_px: i32) -> i32 {
    let text = truncate_to_width(label, FONT_PX, cap_px.max(40) as u32);
    SWATCH + SWATCH_GAP + estimate_text_width_px(&text, FONT_PX) as i32 + ITEM_GAP
}

/// Greedy row packing for the Top/Bottom band. Returns item indices per row.
fn pack_rows(labels: &[String], start_x: i32, total_w: i32) -> Vec<Vec<usize>> {
    let usable = total_w - PAD;
    let cap = ((usable - start_x) as f32 * 0.5).max(120.0) as i32;
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut cur: Vec<usize> = Vec::new();
    let mut x = start_x;
    for (i, label) in labels.iter().enumerate() {
        let w = item_width(label, cap);
        if x + w > usable && !cur.is_empty() {
            rows.push(std::mem::take(&mut cur));
            x = start_x;
        }
        x += w;
        cur.push(i);
    }
    if !cur.is_empty() {
        rows.push(cur);
    }
    rows
}

/// Height in pixels a Top/Bottom legend band needs for `labels`.
pub fn estimate_top_bottom_legend_height_px(labels: &[String], start_x: i32, total_w: i32) -> i32 {
    let rows = pack_rows(labels, start_x, total_w).len().max(1) as i32;
    PAD * 2 + rows * LINE_H + (rows - 1) * ROW_GAP
}

/// Draw the legend panel into `legend_area`.
pub fn draw_legend_panel<DB: DrawingBackend>(
    legend_area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBAColor)],
    placement: LegendMode,
    axis_x_start_px: i32,
) -> Result<()> {
    legend_area
        .fill(&WHITE)
        .map_err(|e| anyhow!("{:?}", e))?;

    let (w_u32, _) = legend_area.dim_in_pixel();
    let w = w_u32 as i32;
    let label_style =
        TextStyle::from((FontFamily::SansSerif, FONT_PX)).pos(Pos::new(HPos::Left, VPos::Center));

    let draw_item = |x: i32, y_center: i32, lines: &[String], color: &RGBAColor| -> Result<()> {
        let top = y_center - SWATCH / 2;
        legend_area
            .draw(&Rectangle::new(
                [(x, top), (x + SWATCH, top + SWATCH)],
                color.filled(),
            ))
            .map_err(|e| anyhow!("{:?}", e))?;
        for (i, line) in lines.iter().enumerate() {
            legend_area
                .draw(&Text::new(
                    line.as_str(),
                    (x + SWATCH + SWATCH_GAP, y_center + i as i32 * LINE_H),
                    label_style.clone(),
                ))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
        Ok(())
    };

    match placement {
        LegendMode::Right => {
            let text_cap = (w - PAD * 2 - SWATCH - SWATCH_GAP).max(40) as u32;
            let mut y = PAD * 2;
            for (label, color) in items {
                let lines = wrap_text_to_width(label, FONT_PX, text_cap);
                draw_item(PAD, y + LINE_H / 2, &lines, color)?;
                y += lines.len().max(1) as i32 * LINE_H + ROW_GAP;
            }
        }
        LegendMode::Top | LegendMode::Bottom => {
            let labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
            let cap = ((w - PAD - axis_x_start_px) as f32 * 0.5).max(120.0) as i32;
            let mut y = PAD + LINE_H / 2;
            for row in pack_rows(&labels, axis_x_start_px, w) {
                let mut x = axis_x_start_px;
                for idx in row {
                    let (label, color) = &items[idx];
                    let text = truncate_to_width(label, FONT_PX, cap.max(40) as u32);
                    draw_item(x, y, std::slice::from_ref(&text), color)?;
                    x += item_width(label, cap);
                }
                y += LINE_H + ROW_GAP;
            }
        }
        // Inside legends are drawn by the chart itself.
        LegendMode::Inside => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_band_wraps_into_more_rows() {
        let labels: Vec<String> = (0..6).map(|i| format!("Series number {i}")).collect();
        let wide = estimate_top_bottom_legend_height_px(&labels, 60, 2000);
        let narrow = estimate_top_bottom_legend_height_px(&labels, 60, 400);
        assert_eq!(wide, PAD * 2 + LINE_H);
        assert!(narrow > wide);
    }
}
