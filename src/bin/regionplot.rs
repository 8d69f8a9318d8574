use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use regionplot::choropleth::{Highlight, MeasureKind, Scale, select_named, select_top_k};
use regionplot::format::{ValueFormat, map_locale};
use regionplot::models::RegionMeasure;
use regionplot::viz::{self, ChartOptions, LegendMode, MapOptions, MapOutcome, Palette, Theme};
use regionplot::{data, storage};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "regionplot",
    version,
    about = "Render area charts, stacked charts & annotated choropleth maps"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Area chart: one filled line per column.
    Area(AreaArgs),
    /// Stacked area chart.
    Stacked(ChartArgs),
    /// Choropleth map with top-k highlighting.
    Map(MapArgs),
    /// Print (and optionally save) the highlighted regions without drawing.
    Top(TopArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LegendArg {
    Inside,
    Right,
    Top,
    Bottom,
    None,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Darkgrid,
    Whitegrid,
    White,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PaletteArg {
    Set2,
    Office,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Plain,
    Grouped,
    Thousands,
    Millions,
    Percent,
}

impl From<FormatArg> for ValueFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Plain => ValueFormat::Plain,
            FormatArg::Grouped => ValueFormat::Grouped,
            FormatArg::Thousands => ValueFormat::Thousands,
            FormatArg::Millions => ValueFormat::Millions,
            FormatArg::Percent => ValueFormat::Percent,
        }
    }
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// CSV file with an x column and value columns.
    #[arg(long)]
    data: PathBuf,
    /// Name of the x column (e.g., year).
    #[arg(short, long)]
    x: String,
    /// Columns to plot, separated by comma or semicolon.
    #[arg(short, long)]
    cols: String,
    /// Legend labels, one per column (defaults to the column names).
    #[arg(long)]
    labels: Option<String>,
    /// Output path (.svg or .png).
    #[arg(short, long)]
    out: PathBuf,
    #[arg(long)]
    x_label: Option<String>,
    #[arg(long)]
    y_label: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, value_enum, default_value_t = LegendArg::Bottom)]
    legend: LegendArg,
    #[arg(long, value_enum, default_value_t = ThemeArg::Darkgrid)]
    theme: ThemeArg,
    #[arg(long, value_enum, default_value_t = PaletteArg::Set2)]
    palette: PaletteArg,
    /// Hide all tick labels.
    #[arg(long, default_value_t = false)]
    no_ticks: bool,
    /// Line weight in pixels (area default 1.45, stacked default 1).
    #[arg(long)]
    line_weight: Option<f64>,
    /// Fill opacity in [0, 1] (area default 0.25, stacked default 0.2).
    #[arg(long)]
    opacity: Option<f64>,
    /// Tick formatter for the axes chosen with --format-x / --format-y.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    #[arg(long, default_value_t = false)]
    format_x: bool,
    #[arg(long, default_value_t = false)]
    format_y: bool,
    /// Locale for digit grouping (en, de, fr, es, it, pt, nl).
    #[arg(long, default_value = "en")]
    locale: String,
    /// Width of the plot (default 1000).
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of the plot (default 600).
    #[arg(long, default_value_t = 600)]
    height: u32,
}

#[derive(Args, Debug)]
struct AreaArgs {
    #[command(flatten)]
    chart: ChartArgs,
    /// Column whose values label every second point ("~12K").
    #[arg(long)]
    annotate: Option<String>,
}

#[derive(Args, Debug)]
struct RegionArgs {
    /// GeoJSON FeatureCollection with the region outlines.
    #[arg(long)]
    geojson: PathBuf,
    /// Feature property holding the region identifier.
    #[arg(long, default_value = "name")]
    id_field: String,
    /// Feature property holding the measure.
    #[arg(long)]
    value_field: Option<String>,
    /// CSV file holding the measure (joined on --id-col).
    #[arg(long, requires = "value_col")]
    measure_csv: Option<PathBuf>,
    /// CSV id column (defaults to --id-field).
    #[arg(long)]
    id_col: Option<String>,
    /// CSV value column.
    #[arg(long)]
    value_col: Option<String>,
}

#[derive(Args, Debug)]
struct MapArgs {
    #[command(flatten)]
    region: RegionArgs,
    /// Output path (.svg or .png).
    #[arg(short, long)]
    out: PathBuf,
    #[arg(long, default_value = "")]
    title: String,
    /// Color by ln(value); colorbar ticks still show raw values.
    #[arg(long, default_value_t = false)]
    log: bool,
    /// Treat the measure as currency (log colorbar ticks in millions).
    #[arg(long, default_value_t = false)]
    currency: bool,
    /// Number of top regions to highlight.
    #[arg(long, default_value_t = 3)]
    top: usize,
    /// Highlight these regions instead of the top ones (comma separated; use
    /// semicolons when names contain commas).
    #[arg(long, conflicts_with = "no_highlight")]
    highlight: Option<String>,
    #[arg(long, default_value_t = false)]
    no_highlight: bool,
    /// Heading above the ranked legend.
    #[arg(long)]
    legend_title: Option<String>,
    /// Formatter for legend values (and linear colorbar ticks).
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    #[arg(long, default_value = "en")]
    locale: String,
    #[arg(long, default_value_t = 900)]
    width: u32,
    #[arg(long, default_value_t = 700)]
    height: u32,
}

#[derive(Args, Debug)]
struct TopArgs {
    #[command(flatten)]
    region: RegionArgs,
    #[arg(long, default_value_t = 3)]
    top: usize,
    /// Rank these regions instead of the top ones.
    #[arg(long)]
    highlight: Option<String>,
    /// Save the selection (format inferred from the extension: .csv or .json).
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    #[arg(long, default_value = "en")]
    locale: String,
}

/// Split on `;` when present (names may contain commas), otherwise on `,`.
fn parse_list(s: &str) -> Vec<String> {
    let seps: &[char] = if s.contains(';') { &[';'] } else { &[','] };
    s.split(seps)
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Area(args) => cmd_area(args),
        Command::Stacked(args) => cmd_stacked(args),
        Command::Map(args) => cmd_map(args),
        Command::Top(args) => cmd_top(args),
    }
}

fn chart_options(args: &ChartArgs, mut base: ChartOptions) -> ChartOptions {
    base.x_label = args.x_label.clone();
    base.y_label = args.y_label.clone();
    base.title = args.title.clone();
    base.legend = match args.legend {
        LegendArg::Inside => Some(LegendMode::Inside),
        LegendArg::Right => Some(LegendMode::Right),
        LegendArg::Top => Some(LegendMode::Top),
        LegendArg::Bottom => Some(LegendMode::Bottom),
        LegendArg::None => None,
    };
    base.theme = match args.theme {
        ThemeArg::Darkgrid => Theme::DarkGrid,
        ThemeArg::Whitegrid => Theme::WhiteGrid,
        ThemeArg::White => Theme::White,
    };
    base.palette = match args.palette {
        PaletteArg::Set2 => Palette::Set2,
        PaletteArg::Office => Palette::Office,
    };
    base.ticks = !args.no_ticks;
    if let Some(w) = args.line_weight {
        base.line_weight = w;
    }
    if let Some(o) = args.opacity {
        base.opacity = o;
    }
    base.tick_format = args.format.map(ValueFormat::from);
    base.format_x = args.format_x;
    base.format_y = args.format_y;
    base.locale = args.locale.clone();
    base
}

fn columns_and_labels(args: &ChartArgs) -> (Vec<String>, Vec<String>) {
    let cols = parse_list(&args.cols);
    let labels = args
        .labels
        .as_deref()
        .map(parse_list)
        .unwrap_or_else(|| cols.clone());
    (cols, labels)
}

fn cmd_area(args: AreaArgs) -> Result<()> {
    let chart = &args.chart;
    let frame = data::load_frame(&chart.data, &chart.x)?;
    let (cols, labels) = columns_and_labels(chart);
    let mut options = chart_options(chart, ChartOptions::area(labels));
    options.annotate_column = args.annotate.clone();
    viz::area_plot(&frame, &cols, &chart.out, chart.width, chart.height, &options)?;
    eprintln!("Wrote plot to {}", chart.out.display());
    Ok(())
}

fn cmd_stacked(args: ChartArgs) -> Result<()> {
    let frame = data::load_frame(&args.data, &args.x)?;
    let (cols, labels) = columns_and_labels(&args);
    let options = chart_options(&args, ChartOptions::stacked(labels));
    viz::stacked_plot(&frame, &cols, &args.out, args.width, args.height, &options)?;
    eprintln!("Wrote plot to {}", args.out.display());
    Ok(())
}

fn load_regions(args: &RegionArgs) -> Result<(RegionMeasure, regionplot::RegionGeometry)> {
    let layer = data::load_geojson(&args.geojson, &args.id_field, args.value_field.as_deref())?;
    let measure = match (&args.measure_csv, &args.value_col) {
        (Some(path), Some(value_col)) => {
            let id_col = args.id_col.as_deref().unwrap_or(&args.id_field);
            data::load_measure_csv(path, id_col, value_col)?
        }
        _ if args.value_field.is_some() => layer.measure,
        _ => {
            return Err(anyhow!(
                "no measure given: use --value-field or --measure-csv with --value-col"
            ));
        }
    };
    info!(
        "loaded {} measure(s) and {} outline(s)",
        measure.len(),
        layer.geometry.len()
    );
    Ok((measure, layer.geometry))
}

fn cmd_map(args: MapArgs) -> Result<()> {
    let (measure, geometry) = load_regions(&args.region)?;
    let highlight = if args.no_highlight {
        Highlight::None
    } else if let Some(list) = args.highlight.as_deref() {
        Highlight::Regions(parse_list(list))
    } else {
        Highlight::Top(args.top)
    };
    let options = MapOptions {
        title: args.title.clone(),
        scale: if args.log { Scale::Log } else { Scale::Linear },
        measure_kind: if args.currency {
            MeasureKind::Currency
        } else {
            MeasureKind::General
        },
        highlight,
        legend_title: args.legend_title.clone(),
        value_format: args.format.map(ValueFormat::from),
        locale: args.locale.clone(),
    };
    match viz::plot_map(&measure, &geometry, &args.out, args.width, args.height, &options)? {
        MapOutcome::Rendered => eprintln!("Wrote map to {}", args.out.display()),
        MapOutcome::NothingToRender => eprintln!("Nothing to render: every measure is zero"),
    }
    Ok(())
}

fn cmd_top(args: TopArgs) -> Result<()> {
    let (measure, geometry) = load_regions(&args.region)?;
    let selection = match args.highlight.as_deref() {
        Some(list) => select_named(&measure, &geometry, &parse_list(list))?,
        None => select_top_k(&measure, &geometry, args.top)?,
    };
    let locale = map_locale(&args.locale);
    let format = args.format.map(ValueFormat::from).unwrap_or(ValueFormat::Grouped);
    for r in &selection {
        println!("{}  {}  {}", r.rank, r.region, format.format(r.raw, locale));
    }

    if let Some(path) = args.out.as_ref() {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => storage::save_csv(&selection, path),
            "json" => storage::save_json(&selection, path),
            other => Err(anyhow!("unsupported format: {}", other)),
        }
        .with_context(|| format!("Failed to save selection to {}", path.display()))?;
        eprintln!("Saved {} rows to {}", selection.len(), path.display());
    }
    Ok(())
}
