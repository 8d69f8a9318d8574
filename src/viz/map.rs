//! Choropleth rendering: shaded regions, outlines, rank badges, colorbar, and
//! the ranked legend under the map.

use super::ensure_fonts_registered;
use super::is_svg;
use super::text::{estimate_text_width_px, truncate_to_width};
use super::types::{MapOptions, MapOutcome};
use crate::choropleth::{
    AnnotateOptions, Annotation, ColorScale, Highlight, Scale, annotate, coolwarm, legend_entry,
    legend_head, select_named,
};
use crate::format::{ValueFormat, map_locale};
use crate::models::{RegionGeometry, RegionMeasure};

use anyhow::{Context, Result, anyhow};
use geo::{BoundingRect, LineString, MultiPolygon, Rect, coord};
use log::{info, warn};
use num_format::Locale;

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontFamily, FontStyle};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;

const MARGIN: i32 = 16;
const CAPTION_PX: i32 = 36;
const LEGEND_LINE_H: i32 = 20;
const COLORBAR_TICKS: usize = 5;

/// Render a choropleth of `measure` over `geometry`.
///
/// Zero-valued regions are not shaded but keep their outline. When no region
/// has a non-zero measure nothing is written and
/// [`MapOutcome::NothingToRender`] is returned.
pub fn plot_map<P: AsRef<Path>>(
    measure: &RegionMeasure,
    geometry: &RegionGeometry,
    out_path: P,
    width: u32,
    height: u32,
    options: &MapOptions,
) -> Result<MapOutcome> {
    let annotation = annotate_for_map(measure, geometry, options)?;
    if annotation.is_empty() {
        warn!("nothing to render: no region has a non-zero measure");
        return Ok(MapOutcome::NothingToRender);
    }
    let bounds = geometry_bounds(geometry).ok_or_else(|| anyhow!("no region outlines to draw"))?;

    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();

    if is_svg(out_path) {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_map(root, &annotation, geometry, bounds, options)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_map(root, &annotation, geometry, bounds, options)?;
    }
    info!(
        "wrote choropleth of {} region(s) to {}",
        annotation.regions.len(),
        path_string
    );
    Ok(MapOutcome::Rendered)
}

/// Annotate and apply the highlight mode.
pub fn annotate_for_map(
    measure: &RegionMeasure,
    geometry: &RegionGeometry,
    options: &MapOptions,
) -> Result<Annotation> {
    let annotate_options = AnnotateOptions {
        scale: options.scale,
        top_k: options.highlight.top_k(),
        measure_kind: options.measure_kind,
    };
    let mut annotation =
        annotate(measure, geometry, &annotate_options).context("invalid region measure")?;
    match &options.highlight {
        Highlight::Top(_) => {}
        Highlight::Regions(names) => {
            annotation.selection =
                select_named(measure, geometry, names).context("invalid region measure")?;
        }
        Highlight::None => annotation.selection.clear(),
    }
    Ok(annotation)
}

/// Bounding box over all outlines.
pub fn geometry_bounds(geometry: &RegionGeometry) -> Option<Rect<f64>> {
    geometry
        .values()
        .filter_map(|g| g.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
}

/// Grow the shorter side of `bounds` so the data aspect matches `px_w : px_h`
/// and the map is not stretched.
pub fn fit_aspect(bounds: Rect<f64>, px_w: f64, px_h: f64) -> ((f64, f64), (f64, f64)) {
    let (mut x0, mut x1) = (bounds.min().x, bounds.max().x);
    let (mut y0, mut y1) = (bounds.min().y, bounds.max().y);
    let mut dx = x1 - x0;
    let mut dy = y1 - y0;
    if dx <= 0.0 {
        x0 -= 0.5;
        x1 += 0.5;
        dx = 1.0;
    }
    if dy <= 0.0 {
        y0 -= 0.5;
        y1 += 0.5;
        dy = 1.0;
    }
    if px_w > 0.0 && px_h > 0.0 {
        let target = px_w / px_h;
        if dx / dy > target {
            let grow = (dx / target - dy) / 2.0;
            y0 -= grow;
            y1 += grow;
        } else {
            let grow = (dy * target - dx) / 2.0;
            x0 -= grow;
            x1 += grow;
        }
    }
    ((x0, x1), (y0, y1))
}

fn ring(line: &LineString<f64>) -> Vec<(f64, f64)> {
    line.coords().map(|c| (c.x, c.y)).collect()
}

fn rings(mp: &MultiPolygon<f64>) -> impl Iterator<Item = Vec<(f64, f64)>> + '_ {
    mp.0.iter().flat_map(|p| {
        std::iter::once(ring(p.exterior())).chain(p.interiors().iter().map(ring))
    })
}

fn draw_map<DB>(
    root: DrawingArea<DB, Shift>,
    annotation: &Annotation,
    geometry: &RegionGeometry,
    bounds: Rect<f64>,
    options: &MapOptions,
) -> Result<()>
where
    DB: DrawingBackend,
{
    let locale = map_locale(&options.locale);
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    // ----------------------------
    // 1) Layout: legend band at the bottom, colorbar on the right
    // ----------------------------
    let heading = options.highlight.heading(options.legend_title.as_deref());
    let lines = legend_parts(annotation, options.value_format, locale);
    let band_rows = lines.len() + usize::from(heading.is_some());
    let (_, root_h) = root.dim_in_pixel();
    let (upper, band) = if !lines.is_empty() {
        let band_h = band_rows as i32 * LEGEND_LINE_H + MARGIN;
        let (u, b) = root.split_vertically((root_h as i32 - band_h).max(80));
        (u, Some(b))
    } else {
        (root, None)
    };
    let (map_area, bar_area) = upper.split_horizontally((86).percent_width());

    // ----------------------------
    // 2) Map
    // ----------------------------
    let has_title = !options.title.trim().is_empty();
    let (map_w, map_h) = map_area.dim_in_pixel();
    let avail_w = map_w as f64 - 2.0 * MARGIN as f64;
    let avail_h =
        map_h as f64 - 2.0 * MARGIN as f64 - if has_title { CAPTION_PX as f64 } else { 0.0 };
    let (x_range, y_range) = fit_aspect(bounds, avail_w, avail_h);

    let mut builder = ChartBuilder::on(&map_area);
    builder.margin(MARGIN as u32);
    if has_title {
        builder.caption(
            options.title.trim(),
            (FontFamily::SansSerif, 20).into_font().style(FontStyle::Bold),
        );
    }
    let mut chart = builder
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
        .map_err(|e| anyhow!("{:?}", e))?;

    let (lo, hi) = annotation
        .render_range()
        .ok_or_else(|| anyhow!("nothing to render"))?;
    let scale = ColorScale::new(lo, hi);

    // Shaded regions.
    for region in &annotation.regions {
        let Some(mp) = geometry.get(&region.region) else {
            continue;
        };
        let fill = scale.color(region.render).filled();
        chart
            .draw_series(mp.0.iter().map(|p| Polygon::new(ring(p.exterior()), fill)))
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    // Every outline, shaded or not.
    let outline = BLACK.stroke_width(1);
    for mp in geometry.values() {
        chart
            .draw_series(rings(mp).map(|r| PathElement::new(r, outline)))
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    // Highlighted outlines and rank badges.
    let bold = BLACK.stroke_width(2);
    let badge_text = TextStyle::from((FontFamily::SansSerif, 12))
        .pos(Pos::new(HPos::Center, VPos::Center));
    for sel in &annotation.selection {
        if let Some(mp) = geometry.get(&sel.region) {
            chart
                .draw_series(rings(mp).map(|r| PathElement::new(r, bold)))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
        if let Some(c) = sel.centroid {
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((c.x(), c.y()))
                        + Circle::new((0, 0), 9, WHITE.filled())
                        + Text::new(sel.rank.to_string(), (0, 0), badge_text.clone()),
                ))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    // ----------------------------
    // 3) Colorbar
    // ----------------------------
    let top_offset = MARGIN + if has_title { CAPTION_PX } else { 0 };
    draw_colorbar(&bar_area, annotation, &scale, options.value_format, locale, top_offset)?;

    // ----------------------------
    // 4) Ranked legend
    // ----------------------------
    if let Some(ref band) = band {
        let (band_w, _) = band.dim_in_pixel();
        let center_x = band_w as i32 / 2;
        let mut y = MARGIN / 2;
        let line_style = TextStyle::from((FontFamily::SansSerif, 14))
            .pos(Pos::new(HPos::Center, VPos::Top));
        if let Some(h) = heading {
            let heading_style = TextStyle::from(
                (FontFamily::SansSerif, 14).into_font().style(FontStyle::Bold),
            )
            .pos(Pos::new(HPos::Center, VPos::Top));
            band.draw(&Text::new(h, (center_x, y), heading_style))
                .map_err(|e| anyhow!("{:?}", e))?;
            y += LEGEND_LINE_H;
        }
        for (head, value) in &lines {
            let text = fit_legend_line(head, value, 14, band_w.saturating_sub(2 * MARGIN as u32));
            band.draw(&Text::new(text, (center_x, y), line_style.clone()))
                .map_err(|e| anyhow!("{:?}", e))?;
            y += LEGEND_LINE_H;
        }
        band.present().map_err(|e| anyhow!("{:?}", e))?;
    }

    map_area.present().map_err(|e| anyhow!("{:?}", e))?;
    bar_area.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

/// Text lines of the ranked legend, raw values formatted by `format`
/// (grouped 3-decimal rounding when unset).
pub fn legend_lines(
    annotation: &Annotation,
    format: Option<ValueFormat>,
    locale: &Locale,
) -> Vec<String> {
    let format = format.unwrap_or(ValueFormat::Grouped);
    annotation
        .selection
        .iter()
        .map(|s| legend_entry(s.rank, &s.region, &format.format(s.raw, locale)))
        .collect()
}

/// (head, formatted value) per legend line.
fn legend_parts(
    annotation: &Annotation,
    format: Option<ValueFormat>,
    locale: &Locale,
) -> Vec<(String, String)> {
    let format = format.unwrap_or(ValueFormat::Grouped);
    annotation
        .selection
        .iter()
        .map(|s| (legend_head(s.rank, &s.region), format.format(s.raw, locale)))
        .collect()
}

/// Legend line fitted to `max_px`: only the rank and name are shortened, the
/// `(value)` suffix is always kept whole.
pub fn fit_legend_line(head: &str, value_text: &str, font_px: u32, max_px: u32) -> String {
    let tail = format!(" ({value_text})");
    let budget = max_px.saturating_sub(estimate_text_width_px(&tail, font_px));
    format!("{}{}", truncate_to_width(head, font_px, budget), tail)
}

/// Colorbar tick text: log scales always report the inverse-mapped raw value,
/// linear scales use the value format when one is set.
pub fn colorbar_label(
    annotation: &Annotation,
    render: f64,
    format: Option<ValueFormat>,
    locale: &Locale,
) -> String {
    match (annotation.scale, format) {
        (Scale::Linear, Some(f)) => f.format(render, locale),
        _ => annotation.tick_label(render),
    }
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    annotation: &Annotation,
    scale: &ColorScale,
    format: Option<ValueFormat>,
    locale: &Locale,
    top_offset: i32,
) -> Result<()> {
    const SEGMENTS: i32 = 64;
    let (_, h) = area.dim_in_pixel();
    let bar_x0 = 6;
    let bar_x1 = bar_x0 + 16;
    // 80% of the available height, vertically centered.
    let avail = (h as i32 - top_offset - MARGIN).max(40);
    let bar_h = (avail as f64 * 0.8) as i32;
    let bar_top = top_offset + (avail - bar_h) / 2;
    let bar_bottom = bar_top + bar_h;

    for i in 0..SEGMENTS {
        let y0 = bar_top + bar_h * i / SEGMENTS;
        let y1 = bar_top + bar_h * (i + 1) / SEGMENTS;
        // Top of the bar is the maximum.
        let t = 1.0 - (i as f64 + 0.5) / SEGMENTS as f64;
        area.draw(&Rectangle::new([(bar_x0, y0), (bar_x1, y1)], coolwarm(t).filled()))
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    area.draw(&Rectangle::new(
        [(bar_x0, bar_top), (bar_x1, bar_bottom)],
        BLACK.stroke_width(1),
    ))
    .map_err(|e| anyhow!("{:?}", e))?;

    let label_style =
        TextStyle::from((FontFamily::SansSerif, 11)).pos(Pos::new(HPos::Left, VPos::Center));
    for v in scale.ticks(COLORBAR_TICKS) {
        let y = bar_bottom - (scale.normalize(v) * bar_h as f64).round() as i32;
        area.draw(&PathElement::new(
            vec![(bar_x1, y), (bar_x1 + 4, y)],
            BLACK.stroke_width(1),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
        area.draw(&Text::new(
            colorbar_label(annotation, v, format, locale),
            (bar_x1 + 7, y),
            label_style.clone(),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn aspect_fit_pads_the_short_side() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 4.0, y: 1.0 });
        let ((x0, x1), (y0, y1)) = fit_aspect(bounds, 200.0, 100.0);
        assert_eq!((x0, x1), (0.0, 4.0));
        assert!(((y1 - y0) - 2.0).abs() < 1e-9);
        assert!((y0 + 0.5).abs() < 1e-9);
    }

    #[test]
    fn long_names_never_cut_the_value() {
        let head = legend_head(1, "An Extremely Long Region Name That Keeps Going");
        let line = fit_legend_line(&head, "1,500", 14, 200);
        assert!(line.ends_with(" (1,500)"), "{line}");
        assert!(line.starts_with("1: An"));
        assert!(line.contains('…'));
        assert!(estimate_text_width_px(&line, 14) <= 200);

        let line = fit_legend_line("2: Bravo", "3", 14, 400);
        assert_eq!(line, "2: Bravo (3)");
    }

    #[test]
    fn point_bounds_get_a_unit_box() {
        let bounds = Rect::new(coord! { x: 1.0, y: 1.0 }, coord! { x: 1.0, y: 1.0 });
        let ((x0, x1), (y0, y1)) = fit_aspect(bounds, 100.0, 100.0);
        assert!(((x1 - x0) - 1.0).abs() < 1e-9);
        assert!(((y1 - y0) - 1.0).abs() < 1e-9);
    }
}
