//! Visualization: render area charts, stacked area charts, and choropleth maps to **SVG** or **PNG**.
//!
//! - Series colors from the Set2 (default) or Office palettes
//! - Seaborn-like themes: `DarkGrid` (default), `WhiteGrid`, `White`
//! - Legend placement: `Inside`, `Right`, `Top`, `Bottom`, or none
//! - Tick formatting through [`ValueFormat`](crate::format::ValueFormat), locale-aware grouping
//! - Choropleth maps with log scaling, colorbar, and ranked top-k highlighting
//!
//! The output format follows the file extension: `.svg` uses the SVG backend,
//! anything else is rendered as a bitmap.

pub mod legend;
pub mod map;
pub mod text;
pub mod types;
pub mod util;

pub use map::plot_map;
pub use types::{
    ChartOptions, DEFAULT_LEGEND_MODE, LegendMode, MapOptions, MapOutcome, Palette, PlotKind,
    Theme,
};

use crate::format::{map_locale, trim_decimal};
use crate::models::{Column, Frame};
use anyhow::{Result, anyhow};
use log::debug;

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::{AreaSeries, LineSeries};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontFamily, FontStyle};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;
use std::sync::Once;

use legend::{draw_legend_panel, estimate_top_bottom_legend_height_px};
use util::{compute_left_label_area_px, series_color, stroke_px, theme_colors, value_range_with_zero};

/// One-time registration for the "sans-serif" family when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

pub(crate) fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let bytes: &'static [u8] = include_bytes!("../../assets/DejaVuSans.ttf");
        // Bold requests (titles, axis descriptions) fall back to the regular face.
        for style in [FontStyle::Normal, FontStyle::Bold] {
            let _ = plotters::style::register_font("sans-serif", style, bytes);
        }
    });
}

pub(crate) fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Tick text when no formatter is requested: whole numbers without decimals.
fn default_tick_label(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        trim_decimal(v, 2)
    }
}

/// Area chart: one line per column with a translucent fill down to zero.
pub fn area_plot<P: AsRef<Path>>(
    frame: &Frame,
    columns: &[String],
    out_path: P,
    width: u32,
    height: u32,
    options: &ChartOptions,
) -> Result<()> {
    plot_chart(frame, columns, out_path, width, height, PlotKind::Area, options)
}

/// Stacked area chart: columns stacked upward in the given order.
pub fn stacked_plot<P: AsRef<Path>>(
    frame: &Frame,
    columns: &[String],
    out_path: P,
    width: u32,
    height: u32,
    options: &ChartOptions,
) -> Result<()> {
    plot_chart(
        frame,
        columns,
        out_path,
        width,
        height,
        PlotKind::StackedArea,
        options,
    )
}

/// Fully-configurable entry point for the cartesian charts.
pub fn plot_chart<P: AsRef<Path>>(
    frame: &Frame,
    columns: &[String],
    out_path: P,
    width: u32,
    height: u32,
    kind: PlotKind,
    options: &ChartOptions,
) -> Result<()> {
    if frame.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    if columns.is_empty() {
        return Err(anyhow!("no columns selected"));
    }
    if options.labels.len() != columns.len() {
        return Err(anyhow!(
            "expected {} labels (one per column), got {}",
            columns.len(),
            options.labels.len()
        ));
    }
    let selected: Vec<&Column> = columns
        .iter()
        .map(|c| {
            frame
                .column(c)
                .ok_or_else(|| anyhow!("column '{}' not found", c))
        })
        .collect::<Result<_>>()?;
    if let Some(ann) = options.annotate_column.as_deref()
        && frame.column(ann).is_none()
    {
        return Err(anyhow!("annotation column '{}' not found", ann));
    }
    let annotation = options.annotate_column.as_deref().and_then(|a| frame.column(a));
    for col in selected.iter().copied().chain(annotation) {
        if col.values.len() != frame.len() {
            return Err(anyhow!(
                "column '{}' has {} values, expected {} (one per x value)",
                col.name,
                col.values.len(),
                frame.len()
            ));
        }
        if col.values.iter().flatten().any(|v| !v.is_finite()) {
            return Err(anyhow!("column '{}' has non-finite values", col.name));
        }
    }
    if frame.x.iter().any(|x| !x.is_finite()) {
        return Err(anyhow!("x column '{}' has non-finite values", frame.x_name));
    }

    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    debug!("rendering {:?} chart of {} column(s) to {}", kind, columns.len(), path_string);

    if is_svg(out_path) {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_chart(root, frame, &selected, kind, options)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_chart(root, frame, &selected, kind, options)?;
    }
    Ok(())
}

/// A filled band between `lower` and `upper`; an empty `lower` means the zero baseline.
struct Layer {
    lower: Vec<(f64, f64)>,
    upper: Vec<(f64, f64)>,
}

/// Cell `i` of a column; rows past the end of a short column are missing.
fn cell(col: &Column, i: usize) -> Option<f64> {
    col.values.get(i).copied().flatten()
}

fn build_layers(frame: &Frame, columns: &[&Column], kind: PlotKind) -> Vec<Layer> {
    let mut order: Vec<usize> = (0..frame.len()).collect();
    order.sort_by(|a, b| frame.x[*a].total_cmp(&frame.x[*b]));

    match kind {
        PlotKind::Area => columns
            .iter()
            .map(|col| Layer {
                lower: Vec::new(),
                upper: order
                    .iter()
                    .filter_map(|&i| cell(col, i).map(|v| (frame.x[i], v)))
                    .collect(),
            })
            .collect(),
        PlotKind::StackedArea => {
            let mut cum = vec![0.0f64; order.len()];
            columns
                .iter()
                .map(|col| {
                    let mut lower = Vec::with_capacity(order.len());
                    let mut upper = Vec::with_capacity(order.len());
                    for (slot, &i) in order.iter().enumerate() {
                        let x = frame.x[i];
                        lower.push((x, cum[slot]));
                        cum[slot] += cell(col, i).unwrap_or(0.0).max(0.0);
                        upper.push((x, cum[slot]));
                    }
                    Layer { lower, upper }
                })
                .collect()
        }
    }
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    frame: &Frame,
    columns: &[&Column],
    kind: PlotKind,
    opts: &ChartOptions,
) -> Result<()>
where
    DB: DrawingBackend,
{
    const MARGIN: i32 = 16;
    let locale = map_locale(&opts.locale);

    // ----------------------------
    // 1) Data ranges
    // ----------------------------
    let layers = build_layers(frame, columns, kind);
    let ys: Vec<f64> = layers
        .iter()
        .flat_map(|l| l.upper.iter().chain(l.lower.iter()).map(|(_, y)| *y))
        .collect();
    if ys.is_empty() {
        return Err(anyhow!("no numeric values to plot"));
    }
    let y_min = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_max = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let (y_lo, y_hi) = value_range_with_zero(y_min, y_max);

    let (mut x_lo, mut x_hi) = (
        frame.x.iter().cloned().fold(f64::INFINITY, f64::min),
        frame.x.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );
    if (x_hi - x_lo).abs() < f64::EPSILON {
        x_lo -= 1.0;
        x_hi += 1.0;
    }
    if ![x_lo, x_hi, y_lo, y_hi].iter().all(|v| v.is_finite()) {
        return Err(anyhow!("axis range is not finite"));
    }

    // ----------------------------
    // 2) Tick formatters
    // ----------------------------
    let fmt_axis = |v: f64, apply: bool| -> String {
        if !opts.ticks {
            return String::new();
        }
        match opts.tick_format {
            Some(f) if apply => f.format(v, locale),
            _ => default_tick_label(v),
        }
    };
    let x_fmt = |v: &f64| fmt_axis(*v, opts.format_x);
    let y_fmt = |v: &f64| fmt_axis(*v, opts.format_y);

    let y_label_count = 8usize;
    let left_label_width_px = compute_left_label_area_px(y_lo, y_hi, y_label_count, 12, |v| y_fmt(&v));
    let axis_x_start_px: i32 = MARGIN + left_label_width_px as i32;

    // ----------------------------
    // 3) Split drawing areas
    // ----------------------------
    let (root_w_u32, root_h_u32) = root.dim_in_pixel();
    let root_w = root_w_u32 as i32;
    let root_h = root_h_u32 as i32;

    let legend_needed_h = match opts.legend {
        Some(LegendMode::Top | LegendMode::Bottom) => {
            estimate_top_bottom_legend_height_px(&opts.labels, axis_x_start_px, root_w)
        }
        _ => 0,
    };

    let (plot_area, legend_area_opt): (DrawingArea<DB, Shift>, Option<DrawingArea<DB, Shift>>) =
        match opts.legend {
            Some(LegendMode::Right) => {
                let (plot, legend) = root.split_horizontally((80).percent_width());
                (plot, Some(legend))
            }
            Some(LegendMode::Top) => {
                let (legend, plot) = root.split_vertically(legend_needed_h.max(32));
                (plot, Some(legend))
            }
            Some(LegendMode::Bottom) => {
                let h = legend_needed_h.max(32);
                let (plot, legend) = root.split_vertically((root_h - h).max(40));
                (plot, Some(legend))
            }
            Some(LegendMode::Inside) | None => (root, None),
        };

    plot_area
        .fill(&WHITE)
        .map_err(|e| anyhow!("{:?}", e))?;

    // ----------------------------
    // 4) Build chart
    // ----------------------------
    let mut builder = ChartBuilder::on(&plot_area);
    builder
        .margin(MARGIN as u32)
        .set_label_area_size(LabelAreaPosition::Left, left_label_width_px)
        .set_label_area_size(LabelAreaPosition::Bottom, 48);
    if let Some(title) = opts.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        builder.caption(
            title,
            (FontFamily::SansSerif, 20).into_font().style(FontStyle::Bold),
        );
    }
    let mut chart = builder
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(|e| anyhow!("{:?}", e))?;

    let (face, grid) = theme_colors(opts.theme);
    chart
        .plotting_area()
        .fill(&face)
        .map_err(|e| anyhow!("{:?}", e))?;

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(10)
        .y_labels(y_label_count)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .max_light_lines(0)
        .label_style((FontFamily::SansSerif, 12))
        .axis_desc_style((FontFamily::SansSerif, 14).into_font().style(FontStyle::Bold));
    if let Some(desc) = opts.x_label.as_deref() {
        mesh.x_desc(desc);
    }
    if let Some(desc) = opts.y_label.as_deref() {
        mesh.y_desc(desc);
    }
    match grid {
        Some(g) => {
            mesh.bold_line_style(g.stroke_width(1));
        }
        None => {
            mesh.disable_mesh();
        }
    }
    mesh.draw().map_err(|e| anyhow!("{:?}", e))?;

    // ----------------------------
    // 5) Draw layers & collect legend items
    // ----------------------------
    let mut legend_items: Vec<(String, RGBAColor)> = Vec::new();
    let inside_mode = matches!(opts.legend, Some(LegendMode::Inside));
    let stroke = stroke_px(opts.line_weight);
    let opacity = opts.opacity.clamp(0.0, 1.0);

    for (idx, (layer, label)) in layers.iter().zip(opts.labels.iter()).enumerate() {
        let color = series_color(opts.palette, idx);
        let line_style = ShapeStyle {
            color,
            filled: false,
            stroke_width: stroke,
        };

        let elem = match kind {
            PlotKind::Area => {
                chart
                    .draw_series(AreaSeries::new(
                        layer.upper.clone(),
                        0.0,
                        color.mix(opacity).filled(),
                    ))
                    .map_err(|e| anyhow!("{:?}", e))?;
                chart
                    .draw_series(LineSeries::new(layer.upper.clone(), line_style))
                    .map_err(|e| anyhow!("{:?}", e))?
            }
            PlotKind::StackedArea => {
                // polygon: lower (forward) + upper (reverse)
                let mut poly: Vec<(f64, f64)> = Vec::with_capacity(layer.upper.len() * 2);
                poly.extend(layer.lower.iter().copied());
                poly.extend(layer.upper.iter().rev().copied());
                chart
                    .draw_series(std::iter::once(Polygon::new(
                        poly,
                        color.mix(opacity).filled(),
                    )))
                    .map_err(|e| anyhow!("{:?}", e))?;
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        layer.upper.clone(),
                        line_style,
                    )))
                    .map_err(|e| anyhow!("{:?}", e))?
            }
        };

        if inside_mode {
            elem.label(label.clone()).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
        } else {
            legend_items.push((label.clone(), color));
        }
    }

    // Point annotations: every second row of each area line.
    if let (PlotKind::Area, Some(ann_name)) = (kind, opts.annotate_column.as_deref())
        && let Some(ann) = frame.column(ann_name)
    {
        let style = TextStyle::from((FontFamily::SansSerif, 11))
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        for col in columns {
            let labels: Vec<((f64, f64), String)> = (0..frame.len())
                .step_by(2)
                .filter_map(|i| {
                    let y = cell(col, i)?;
                    let note = cell(ann, i)?;
                    Some(((frame.x[i], y), crate::format::approx_thousands(note)))
                })
                .collect();
            chart
                .draw_series(labels.into_iter().map(|(pos, text)| {
                    EmptyElement::at(pos) + Text::new(text, (0, -3), style.clone())
                }))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    // ----------------------------
    // 6) Legend rendering
    // ----------------------------
    if inside_mode {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .label_font((FontFamily::SansSerif, 14))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    } else if let (Some(legend_area), Some(mode)) = (legend_area_opt.as_ref(), opts.legend) {
        draw_legend_panel(legend_area, &legend_items, mode, axis_x_start_px)?;
    }

    // ----------------------------
    // 7) Present
    // ----------------------------
    plot_area.present().map_err(|e| anyhow!("{:?}", e))?;
    if let Some(ref legend_area) = legend_area_opt {
        legend_area.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ticks_drop_decimals_for_whole_numbers() {
        assert_eq!(default_tick_label(2020.0), "2020");
        assert_eq!(default_tick_label(0.25), "0.25");
    }

    #[test]
    fn short_columns_read_as_missing() {
        let frame = Frame::new("x", vec![1.0, 2.0, 3.0]).with_column("a", vec![Some(4.0)]);
        let cols: Vec<&Column> = frame.columns.iter().collect();
        let layers = build_layers(&frame, &cols, PlotKind::Area);
        assert_eq!(layers[0].upper, vec![(1.0, 4.0)]);
        let layers = build_layers(&frame, &cols, PlotKind::StackedArea);
        assert_eq!(layers[0].upper, vec![(1.0, 4.0), (2.0, 0.0), (3.0, 0.0)]);
    }

    #[test]
    fn stacked_layers_accumulate() {
        let frame = Frame::new("x", vec![2.0, 1.0])
            .with_column("a", vec![Some(1.0), Some(2.0)])
            .with_column("b", vec![None, Some(-5.0)]);
        let cols: Vec<&Column> = frame.columns.iter().collect();
        let layers = build_layers(&frame, &cols, PlotKind::StackedArea);
        // rows are reordered by x
        assert_eq!(layers[0].upper, vec![(1.0, 2.0), (2.0, 1.0)]);
        assert_eq!(layers[1].lower, layers[0].upper);
        assert_eq!(layers[1].upper, vec![(1.0, 2.0), (2.0, 1.0)]);
    }
}
