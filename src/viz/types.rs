//! Public types and constants for the visualization module.

use crate::choropleth::{Highlight, MeasureKind, Scale};
use crate::format::ValueFormat;

/// Legend placement options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendMode {
    /// Overlay legend inside the plotting area (may overlap data).
    Inside,
    /// Separate, non-overlapping legend panel on the right side.
    Right,
    /// Separate, non-overlapping legend band at the top.
    Top,
    /// Separate, non-overlapping legend band at the bottom.
    Bottom,
}

/// Cartesian chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    /// One line per column with a translucent fill down to zero.
    Area,
    /// Columns stacked upward from zero.
    StackedArea,
}

/// Plot background and grid styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Blue-grey face with white grid lines.
    #[default]
    DarkGrid,
    /// White face with light grey grid lines.
    WhiteGrid,
    /// White face, no grid.
    White,
}

/// Series color palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// ColorBrewer Set2, eight soft qualitative colors.
    #[default]
    Set2,
    /// Microsoft Office chart palette.
    Office,
}

/// Default legend placement for cartesian charts.
pub const DEFAULT_LEGEND_MODE: LegendMode = LegendMode::Bottom;

/// Options shared by the area and stacked charts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    /// Legend labels, one per plotted column.
    pub labels: Vec<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub title: Option<String>,
    /// `None` hides the legend.
    pub legend: Option<LegendMode>,
    pub theme: Theme,
    pub palette: Palette,
    /// `false` blanks all tick labels.
    pub ticks: bool,
    pub line_weight: f64,
    pub opacity: f64,
    /// Formatter applied to the axes selected by `format_x` / `format_y`.
    pub tick_format: Option<ValueFormat>,
    pub format_x: bool,
    pub format_y: bool,
    /// Area charts only: column whose values label every second point.
    pub annotate_column: Option<String>,
    pub locale: String,
}

impl ChartOptions {
    /// Defaults for [`PlotKind::Area`].
    pub fn area(labels: Vec<String>) -> Self {
        Self {
            labels,
            x_label: None,
            y_label: None,
            title: None,
            legend: Some(DEFAULT_LEGEND_MODE),
            theme: Theme::DarkGrid,
            palette: Palette::Set2,
            ticks: true,
            line_weight: 1.45,
            opacity: 0.25,
            tick_format: None,
            format_x: false,
            format_y: false,
            annotate_column: None,
            locale: "en".to_string(),
        }
    }

    /// Defaults for [`PlotKind::StackedArea`].
    pub fn stacked(labels: Vec<String>) -> Self {
        Self {
            line_weight: 1.0,
            opacity: 0.2,
            ..Self::area(labels)
        }
    }
}

/// Options for the choropleth renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub title: String,
    pub scale: Scale,
    pub measure_kind: MeasureKind,
    pub highlight: Highlight,
    /// Heading above the ranked list; see [`Highlight::heading`].
    pub legend_title: Option<String>,
    /// Formats legend values and, on a linear scale, colorbar ticks.
    pub value_format: Option<ValueFormat>,
    pub locale: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            scale: Scale::Linear,
            measure_kind: MeasureKind::General,
            highlight: Highlight::default(),
            legend_title: None,
            value_format: None,
            locale: "en".to_string(),
        }
    }
}

/// Result of a map render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
    /// The file was written.
    Rendered,
    /// No region had a non-zero measure; no file was written.
    NothingToRender,
}
