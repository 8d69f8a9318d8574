use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Region identifier -> non-negative measure. Zero entries are kept here and
/// dropped by the annotator.
pub type RegionMeasure = BTreeMap<String, f64>;

/// Region identifier -> planar outline.
pub type RegionGeometry = BTreeMap<String, MultiPolygon<f64>>;

/// One named numeric column of a [`Frame`]. Empty cells are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Tidy table used by the area and stacked charts: one shared x column plus
/// value columns of the same length, in file order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    pub x_name: String,
    pub x: Vec<f64>,
    pub columns: Vec<Column>,
}

impl Frame {
    pub fn new(x_name: impl Into<String>, x: Vec<f64>) -> Self {
        Self {
            x_name: x_name.into(),
            x,
            columns: Vec::new(),
        }
    }

    /// Builder-style helper, mostly for tests and demos.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            values,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// (x, y) pairs of a column, skipping missing cells.
    pub fn series(&self, name: &str) -> Option<Vec<(f64, f64)>> {
        let col = self.column(name)?;
        Some(
            self.x
                .iter()
                .zip(col.values.iter())
                .filter_map(|(x, v)| v.map(|v| (*x, v)))
                .collect(),
        )
    }
}
