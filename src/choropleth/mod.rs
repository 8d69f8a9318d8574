//! Choropleth support: value transforms, top-k highlighting, and the color ramp.

pub mod annotate;
pub mod colormap;

pub use annotate::{
    AnnotateError, AnnotateOptions, Annotation, DEFAULT_TOP_K, MeasureKind, RankedRegion,
    RenderedRegion, Scale, annotate, legend_entry, legend_head, nonzero_measure, select_named, select_top_k,
    tick_label,
};
pub use colormap::{ColorScale, coolwarm};

/// Which regions get outlined, numbered, and listed under the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Highlight {
    None,
    /// The `k` largest regions.
    Top(usize),
    /// An explicit list, ranked by measure.
    Regions(Vec<String>),
}

impl Default for Highlight {
    fn default() -> Self {
        Highlight::Top(DEFAULT_TOP_K)
    }
}

impl Highlight {
    /// Legend heading: an explicit title wins; otherwise `Top(k)` reads
    /// "Top k Regions" and the other modes have none.
    pub fn heading(&self, legend_title: Option<&str>) -> Option<String> {
        match (legend_title.map(str::trim), self) {
            (Some(t), _) if !t.is_empty() => Some(t.to_string()),
            (_, Highlight::Top(k)) => Some(format!("Top {k} Regions")),
            _ => None,
        }
    }

    pub(crate) fn top_k(&self) -> usize {
        match self {
            Highlight::Top(k) => *k,
            _ => DEFAULT_TOP_K,
        }
    }
}
