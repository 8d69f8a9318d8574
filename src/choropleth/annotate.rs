//! Region ranking and value transforms behind the choropleth renderer.
//!
//! Everything in this module is a pure function of the region measure, the region
//! outlines, and [`AnnotateOptions`]. The renderer only consumes the resulting
//! [`Annotation`]: colors come from [`RenderedRegion::render`], every number shown
//! to the reader comes from the raw measure.

use crate::format::{round_to, trim_decimal};
use crate::models::{RegionGeometry, RegionMeasure};
use geo::{Centroid, Point};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of highlighted regions when nothing else is requested.
pub const DEFAULT_TOP_K: usize = 3;

/// Transform applied before color mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scale {
    #[default]
    Linear,
    /// Natural logarithm; zero entries must be filtered beforehand.
    Log,
}

impl Scale {
    pub fn forward(self, raw: f64) -> f64 {
        match self {
            Scale::Linear => raw,
            Scale::Log => raw.ln(),
        }
    }

    pub fn inverse(self, render: f64) -> f64 {
        match self {
            Scale::Linear => render,
            Scale::Log => render.exp(),
        }
    }
}

/// What the measure counts. Currency measures get `M`-suffixed colorbar labels
/// on a log scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeasureKind {
    #[default]
    General,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotateOptions {
    pub scale: Scale,
    pub top_k: usize,
    pub measure_kind: MeasureKind,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            scale: Scale::Linear,
            top_k: DEFAULT_TOP_K,
            measure_kind: MeasureKind::General,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnnotateError {
    #[error("region '{region}' has a negative measure ({value})")]
    NegativeMeasure { region: String, value: f64 },
    #[error("region '{region}' has a non-finite measure")]
    NonFiniteMeasure { region: String },
}

/// A region that takes part in color mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedRegion {
    pub region: String,
    pub raw: f64,
    pub render: f64,
}

/// One entry of a highlight selection; rank 1 is the largest measure.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRegion {
    pub rank: usize,
    pub region: String,
    pub raw: f64,
    /// `None` when the region has no outline to place a badge in.
    pub centroid: Option<Point<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub scale: Scale,
    pub measure_kind: MeasureKind,
    /// Non-zero regions, ordered by region identifier.
    pub regions: Vec<RenderedRegion>,
    pub selection: Vec<RankedRegion>,
}

impl Annotation {
    /// True when nothing survived zero filtering, i.e. there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// (min, max) of the render values.
    pub fn render_range(&self) -> Option<(f64, f64)> {
        if self.regions.is_empty() {
            return None;
        }
        let min = self
            .regions
            .iter()
            .map(|r| r.render)
            .fold(f64::INFINITY, f64::min);
        let max = self
            .regions
            .iter()
            .map(|r| r.render)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    pub fn render_value(&self, region: &str) -> Option<f64> {
        self.find(region).map(|r| r.render)
    }

    pub fn raw_value(&self, region: &str) -> Option<f64> {
        self.find(region).map(|r| r.raw)
    }

    fn find(&self, region: &str) -> Option<&RenderedRegion> {
        self.regions
            .binary_search_by(|r| r.region.as_str().cmp(region))
            .ok()
            .map(|i| &self.regions[i])
    }

    /// Colorbar label for a render value, reporting the raw measure.
    pub fn tick_label(&self, render: f64) -> String {
        tick_label(render, self.scale, self.measure_kind)
    }
}

/// Validate the measure and drop zero entries. Output is ordered by region id.
pub fn nonzero_measure(measure: &RegionMeasure) -> Result<Vec<(String, f64)>, AnnotateError> {
    let mut kept = Vec::with_capacity(measure.len());
    for (region, &value) in measure {
        if !value.is_finite() {
            return Err(AnnotateError::NonFiniteMeasure {
                region: region.clone(),
            });
        }
        if value < 0.0 {
            return Err(AnnotateError::NegativeMeasure {
                region: region.clone(),
                value,
            });
        }
        if value != 0.0 {
            kept.push((region.clone(), value));
        }
    }
    Ok(kept)
}

/// Largest measure first; equal measures fall back to ascending region id.
fn rank_descending(entries: &mut [(String, f64)]) {
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}

fn ranked(entries: Vec<(String, f64)>, geometry: &RegionGeometry) -> Vec<RankedRegion> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (region, raw))| RankedRegion {
            rank: i + 1,
            centroid: geometry.get(&region).and_then(|g| g.centroid()),
            region,
            raw,
        })
        .collect()
}

/// The `top_k` regions with the largest non-zero measure. `top_k` clamps to the
/// number of available regions.
pub fn select_top_k(
    measure: &RegionMeasure,
    geometry: &RegionGeometry,
    top_k: usize,
) -> Result<Vec<RankedRegion>, AnnotateError> {
    let mut entries = nonzero_measure(measure)?;
    rank_descending(&mut entries);
    entries.truncate(top_k);
    Ok(ranked(entries, geometry))
}

/// Rank an explicit list of regions with the same ordering rule as
/// [`select_top_k`]. Names without a non-zero measure are skipped.
pub fn select_named(
    measure: &RegionMeasure,
    geometry: &RegionGeometry,
    names: &[String],
) -> Result<Vec<RankedRegion>, AnnotateError> {
    let mut entries: Vec<(String, f64)> = nonzero_measure(measure)?
        .into_iter()
        .filter(|(region, _)| names.iter().any(|n| n == region))
        .collect();
    rank_descending(&mut entries);
    Ok(ranked(entries, geometry))
}

/// Compute render values and the top-k selection in one pass.
pub fn annotate(
    measure: &RegionMeasure,
    geometry: &RegionGeometry,
    options: &AnnotateOptions,
) -> Result<Annotation, AnnotateError> {
    let kept = nonzero_measure(measure)?;
    let dropped = measure.len() - kept.len();
    if dropped > 0 {
        debug!("dropped {dropped} zero-valued region(s) before color mapping");
    }

    let regions: Vec<RenderedRegion> = kept
        .iter()
        .map(|(region, raw)| RenderedRegion {
            region: region.clone(),
            raw: *raw,
            render: options.scale.forward(*raw),
        })
        .collect();

    let mut ordered = kept;
    rank_descending(&mut ordered);
    ordered.truncate(options.top_k);
    let selection = ranked(ordered, geometry);

    debug!(
        "annotated {} region(s), selected {} of top {}",
        regions.len(),
        selection.len(),
        options.top_k
    );

    Ok(Annotation {
        scale: options.scale,
        measure_kind: options.measure_kind,
        regions,
        selection,
    })
}

/// Colorbar tick text: the inverse-mapped raw value rounded to 3 decimals, or,
/// for currency on a log scale, millions rounded to 2 decimals with an `M`.
pub fn tick_label(render: f64, scale: Scale, kind: MeasureKind) -> String {
    let raw = round_to(scale.inverse(render), 3);
    match (scale, kind) {
        (Scale::Log, MeasureKind::Currency) => {
            format!("{}M", trim_decimal(round_to(raw / 1.0e6, 2), 2))
        }
        _ => trim_decimal(raw, 3),
    }
}

/// `"{rank}: {name}"` cut to at most its first two comma-separated fields.
pub fn legend_head(rank: usize, region: &str) -> String {
    let head = format!("{rank}: {region}");
    let short: Vec<&str> = head.split(',').take(2).collect();
    short.join(",")
}

/// One line of the ranked legend under the map.
pub fn legend_entry(rank: usize, region: &str, value_text: &str) -> String {
    format!("{} ({})", legend_head(rank, region), value_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, polygon};

    fn square(x0: f64, y0: f64, side: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
            (x: x0, y: y0),
        ]])
    }

    fn sample() -> (RegionMeasure, RegionGeometry) {
        let measure: RegionMeasure = [("A", 500.0), ("B", 1500.0), ("C", 1000.0), ("D", 0.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let geometry: RegionGeometry = [
            ("A", square(0.0, 0.0, 2.0)),
            ("B", square(2.0, 0.0, 2.0)),
            ("C", square(4.0, 0.0, 2.0)),
            ("D", square(6.0, 0.0, 2.0)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        (measure, geometry)
    }

    #[test]
    fn top_three_excludes_zero_region() {
        let (measure, geometry) = sample();
        let a = annotate(&measure, &geometry, &AnnotateOptions::default()).unwrap();
        let got: Vec<(usize, &str, f64)> = a
            .selection
            .iter()
            .map(|r| (r.rank, r.region.as_str(), r.raw))
            .collect();
        assert_eq!(got, vec![(1, "B", 1500.0), (2, "C", 1000.0), (3, "A", 500.0)]);
        assert!(a.raw_value("D").is_none());
    }

    #[test]
    fn centroid_is_polygon_center() {
        let (measure, geometry) = sample();
        let a = annotate(&measure, &geometry, &AnnotateOptions::default()).unwrap();
        let c = a.selection[0].centroid.unwrap();
        assert!((c.x() - 3.0).abs() < 1e-9);
        assert!((c.y() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn log_scale_renders_ln_and_labels_raw() {
        let measure: RegionMeasure = [("A".to_string(), 100.0)].into_iter().collect();
        let opts = AnnotateOptions {
            scale: Scale::Log,
            ..Default::default()
        };
        let a = annotate(&measure, &RegionGeometry::new(), &opts).unwrap();
        let r = a.render_value("A").unwrap();
        assert!((r - 4.6052).abs() < 1e-4);
        assert!((Scale::Log.inverse(4.6052) - 100.0).abs() < 0.01);
        assert_eq!(a.tick_label(r), "100");
    }

    #[test]
    fn currency_labels_in_millions() {
        let label = tick_label(2_500_000f64.ln(), Scale::Log, MeasureKind::Currency);
        assert_eq!(label, "2.5M");
        // Linear scale never switches to millions.
        assert_eq!(
            tick_label(2_500_000.0, Scale::Linear, MeasureKind::Currency),
            "2500000"
        );
    }

    #[test]
    fn ties_break_on_region_id() {
        let measure: RegionMeasure = [("b", 5.0), ("a", 5.0), ("c", 7.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let sel = select_top_k(&measure, &RegionGeometry::new(), 10).unwrap();
        let order: Vec<&str> = sel.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert!(sel.iter().all(|r| r.centroid.is_none()));
    }

    #[test]
    fn negative_and_nan_are_rejected() {
        let mut measure = RegionMeasure::new();
        measure.insert("X".into(), -1.0);
        assert!(matches!(
            annotate(&measure, &RegionGeometry::new(), &AnnotateOptions::default()),
            Err(AnnotateError::NegativeMeasure { .. })
        ));
        measure.insert("X".into(), f64::NAN);
        assert!(matches!(
            nonzero_measure(&measure),
            Err(AnnotateError::NonFiniteMeasure { .. })
        ));
    }

    #[test]
    fn legend_entry_keeps_two_fields() {
        assert_eq!(
            legend_entry(1, "Mission, San Francisco, CA", "1,500"),
            "1: Mission, San Francisco (1,500)"
        );
        assert_eq!(legend_entry(2, "Noe Valley", "3"), "2: Noe Valley (3)");
    }
}
