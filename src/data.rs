//! Input loading: CSV frames, CSV region measures, and GeoJSON region outlines.

use crate::models::{Column, Frame, RegionGeometry, RegionMeasure};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::GeoJson;
use log::{debug, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parse a numeric cell. Empty cells are missing; anything else must be a
/// finite number (`inf`, `NaN` and overflowing literals are rejected).
fn parse_cell(raw: &str) -> Result<Option<f64>> {
    let t = raw.trim();
    if t.is_empty() {
        return Ok(None);
    }
    let v = t
        .parse::<f64>()
        .map_err(|_| anyhow!("not a number: '{}'", t))?;
    if !v.is_finite() {
        return Err(anyhow!("not a finite number: '{}'", t));
    }
    Ok(Some(v))
}

/// Load a CSV into a [`Frame`] with `x_col` as the shared x column and every
/// other column as a value column.
pub fn load_frame<P: AsRef<Path>>(path: P, x_col: &str) -> Result<Frame> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let headers = rdr.headers()?.clone();

    let x_idx = headers
        .iter()
        .position(|h| h == x_col)
        .ok_or_else(|| anyhow!("x column '{}' not found in CSV", x_col))?;

    let mut frame = Frame::new(x_col, Vec::new());
    let value_idx: Vec<usize> = (0..headers.len()).filter(|i| *i != x_idx).collect();
    for &i in &value_idx {
        frame.columns.push(Column {
            name: headers[i].to_string(),
            values: Vec::new(),
        });
    }

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let x = parse_cell(record.get(x_idx).unwrap_or(""))
            .with_context(|| format!("row {}: column '{}'", row + 1, x_col))?
            .ok_or_else(|| anyhow!("row {}: empty x value", row + 1))?;
        frame.x.push(x);
        for (col, &i) in frame.columns.iter_mut().zip(value_idx.iter()) {
            let v = parse_cell(record.get(i).unwrap_or(""))
                .with_context(|| format!("row {}: column '{}'", row + 1, col.name))?;
            col.values.push(v);
        }
    }

    debug!(
        "loaded frame with {} rows and {} value columns from {:?}",
        frame.len(),
        frame.columns.len(),
        path
    );
    Ok(frame)
}

/// Load a region measure from two CSV columns. Rows with an empty id are skipped,
/// empty values count as zero.
pub fn load_measure_csv<P: AsRef<Path>>(
    path: P,
    id_col: &str,
    value_col: &str,
) -> Result<RegionMeasure> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);
    let headers = rdr.headers()?.clone();

    let id_idx = headers
        .iter()
        .position(|h| h == id_col)
        .ok_or_else(|| anyhow!("Join column '{}' not found in CSV", id_col))?;
    let value_idx = headers
        .iter()
        .position(|h| h == value_col)
        .ok_or_else(|| anyhow!("Value column '{}' not found in CSV", value_col))?;

    let mut measure = RegionMeasure::new();
    for result in rdr.records() {
        let record = result?;
        let id = record.get(id_idx).unwrap_or("").trim().to_string();
        if id.is_empty() {
            continue;
        }
        let value = parse_cell(record.get(value_idx).unwrap_or(""))
            .with_context(|| format!("region '{}'", id))?
            .unwrap_or(0.0);
        if measure.insert(id.clone(), value).is_some() {
            warn!("region '{}' appears more than once; keeping the last value", id);
        }
    }
    Ok(measure)
}

/// Region outlines plus, when a measure property was requested, the measure
/// read from the same features.
#[derive(Debug, Clone, Default)]
pub struct RegionLayer {
    pub geometry: RegionGeometry,
    pub measure: RegionMeasure,
}

fn property_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn property_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a GeoJSON FeatureCollection. Features without an id property or with
/// non-areal geometry are skipped. `value_field`, when given, fills
/// [`RegionLayer::measure`] (missing values count as zero).
pub fn parse_geojson(
    text: &str,
    id_field: &str,
    value_field: Option<&str>,
) -> Result<RegionLayer> {
    let geojson: GeoJson = text.parse().context("Failed to parse GeoJSON")?;
    layer_from_geojson(geojson, id_field, value_field)
}

/// File variant of [`parse_geojson`].
pub fn load_geojson<P: AsRef<Path>>(
    path: P,
    id_field: &str,
    value_field: Option<&str>,
) -> Result<RegionLayer> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;
    layer_from_geojson(geojson, id_field, value_field)
}

fn layer_from_geojson(
    geojson: GeoJson,
    id_field: &str,
    value_field: Option<&str>,
) -> Result<RegionLayer> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut layer = RegionLayer::default();
    let mut skipped = 0usize;

    for feature in collection.features {
        let props = feature.properties.as_ref();
        let id = match props.and_then(|p| p.get(id_field)).and_then(property_string) {
            Some(id) => id,
            None => {
                skipped += 1;
                continue;
            }
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let converted: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of '{}': {:?}", id, e))?;
                match converted {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        skipped += 1;
                        continue;
                    }
                }
            }
            None => {
                skipped += 1;
                continue;
            }
        };

        if let Some(field) = value_field {
            let value = props
                .and_then(|p| p.get(field))
                .and_then(property_number)
                .unwrap_or(0.0);
            layer.measure.insert(id.clone(), value);
        }
        layer.geometry.insert(id, geometry);
    }

    if skipped > 0 {
        warn!("skipped {skipped} feature(s) without an id or areal geometry");
    }
    debug!("loaded {} region outline(s)", layer.geometry.len());
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cell_handles_blanks_and_garbage() {
        assert_eq!(parse_cell("  ").unwrap(), None);
        assert_eq!(parse_cell(" 1000.5 ").unwrap(), Some(1000.5));
        assert!(parse_cell("abc").is_err());
        assert!(parse_cell("1_000").is_err());
    }

    #[test]
    fn parse_cell_rejects_non_finite() {
        for raw in ["inf", "-inf", "NaN", "1e400"] {
            let err = parse_cell(raw).unwrap_err();
            assert!(err.to_string().contains("not a finite number"), "{raw}");
        }
    }
}
