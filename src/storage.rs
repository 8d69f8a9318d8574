use crate::choropleth::RankedRegion;
use anyhow::Result;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Flat, serializable form of a [`RankedRegion`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionRow {
    pub rank: usize,
    pub region: String,
    pub value: f64,
    pub centroid_x: Option<f64>,
    pub centroid_y: Option<f64>,
}

impl From<&RankedRegion> for SelectionRow {
    fn from(r: &RankedRegion) -> Self {
        Self {
            rank: r.rank,
            region: r.region.clone(),
            value: r.raw,
            centroid_x: r.centroid.map(|c| c.x()),
            centroid_y: r.centroid.map(|c| c.y()),
        }
    }
}

/// Save a selection as CSV with header.
pub fn save_csv<P: AsRef<Path>>(selection: &[RankedRegion], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for r in selection {
        wtr.serialize(SelectionRow::from(r))?;
    }
    if selection.is_empty() {
        wtr.write_record(["rank", "region", "value", "centroid_x", "centroid_y"])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a selection as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(selection: &[RankedRegion], path: P) -> Result<()> {
    let rows: Vec<SelectionRow> = selection.iter().map(SelectionRow::from).collect();
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
