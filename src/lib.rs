//! regionplot
//!
//! A small Rust library for rendering area charts, stacked area charts, and
//! annotated choropleth maps. Pairs with the `regionplot` CLI.
//!
//! ### Features
//! - Load tidy CSV tables, CSV region measures, and GeoJSON region outlines
//! - Area and stacked area charts with themes, palettes, and tick formatting
//! - Choropleth maps with optional log scaling; colorbar ticks always show raw values
//! - Top-k region highlighting with rank badges and a ranked legend
//! - Save a highlight selection as CSV or JSON
//!
//! ### Example
//! ```no_run
//! use regionplot::choropleth::{Highlight, Scale};
//! use regionplot::viz::{self, MapOptions};
//!
//! let layer = regionplot::data::load_geojson("regions.geojson", "name", Some("sales"))?;
//! let options = MapOptions {
//!     title: "Sales by region".into(),
//!     scale: Scale::Log,
//!     highlight: Highlight::Top(3),
//!     ..Default::default()
//! };
//! viz::plot_map(&layer.measure, &layer.geometry, "sales.svg", 900, 700, &options)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod choropleth;
pub mod data;
pub mod format;
pub mod models;
pub mod storage;
pub mod viz;

pub use choropleth::{AnnotateOptions, Annotation, Highlight, Scale, annotate};
pub use format::ValueFormat;
pub use models::{Frame, RegionGeometry, RegionMeasure};
