use regionplot::choropleth::{Highlight, Scale};
use regionplot::data;
use regionplot::models::{Frame, RegionGeometry, RegionMeasure};
use regionplot::viz::{self, ChartOptions, LegendMode, MapOptions, MapOutcome, Palette, Theme};
use regionplot::ValueFormat;
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn population() -> Frame {
    data::load_frame(fixture("population.csv"), "year").unwrap()
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn write_and_check<F: Fn(&PathBuf)>(maker: F, name: &str, ext: &str) {
    let tmp = std::env::temp_dir();
    let path: PathBuf = tmp.join(format!("regionplot_viz_{}.{}", name, ext));
    maker(&path);
    let meta = fs::metadata(&path).expect("file created");
    assert!(meta.len() > 0, "output has content");
    fs::remove_file(&path).ok();
}

#[test]
fn area_chart_with_every_legend_mode() {
    let frame = population();
    let columns = cols(&["north", "south"]);
    let modes = [
        Some(LegendMode::Inside),
        Some(LegendMode::Right),
        Some(LegendMode::Top),
        Some(LegendMode::Bottom),
        None,
    ];
    for (i, legend) in modes.into_iter().enumerate() {
        write_and_check(
            |p| {
                let options = ChartOptions {
                    legend,
                    title: Some("Population".into()),
                    x_label: Some("Year".into()),
                    y_label: Some("People".into()),
                    ..ChartOptions::area(cols(&["North", "South"]))
                };
                viz::area_plot(&frame, &columns, p, 900, 500, &options).unwrap();
            },
            &format!("area_legend_{i}"),
            "svg",
        );
    }
}

#[test]
fn area_chart_with_annotations_and_formats() {
    let frame = population();
    write_and_check(
        |p| {
            let options = ChartOptions {
                annotate_column: Some("income".into()),
                tick_format: Some(ValueFormat::Thousands),
                format_y: true,
                theme: Theme::WhiteGrid,
                palette: Palette::Office,
                ..ChartOptions::area(cols(&["Income"]))
            };
            viz::area_plot(&frame, &cols(&["income"]), p, 800, 500, &options).unwrap();
        },
        "area_annotated",
        "svg",
    );
}

#[test]
fn stacked_chart_svg_and_png() {
    let frame = population();
    let columns = cols(&["north", "south"]);
    for ext in ["svg", "png"] {
        write_and_check(
            |p| {
                let options = ChartOptions {
                    theme: Theme::White,
                    ticks: false,
                    ..ChartOptions::stacked(cols(&["North", "South"]))
                };
                viz::stacked_plot(&frame, &columns, p, 800, 500, &options).unwrap();
            },
            "stacked",
            ext,
        );
    }
}

#[test]
fn chart_input_errors() {
    let frame = population();
    let out = std::env::temp_dir().join("regionplot_viz_never_written.svg");

    let empty = Frame::new("year", Vec::new());
    let options = ChartOptions::area(cols(&["N"]));
    let err = viz::area_plot(&empty, &cols(&["north"]), &out, 400, 300, &options).unwrap_err();
    assert!(err.to_string().contains("no data"));

    let err = viz::area_plot(
        &frame,
        &cols(&["north", "south"]),
        &out,
        400,
        300,
        &ChartOptions::area(cols(&["only one"])),
    )
    .unwrap_err();
    assert!(err.to_string().contains("labels"));

    let err = viz::stacked_plot(
        &frame,
        &cols(&["west"]),
        &out,
        400,
        300,
        &ChartOptions::stacked(cols(&["West"])),
    )
    .unwrap_err();
    assert!(err.to_string().contains("west"));

    let options = ChartOptions {
        annotate_column: Some("missing".into()),
        ..ChartOptions::area(cols(&["North"]))
    };
    assert!(viz::area_plot(&frame, &cols(&["north"]), &out, 400, 300, &options).is_err());
    assert!(!out.exists());
}

#[test]
fn map_renders_for_each_highlight_mode() {
    let layer = data::load_geojson(fixture("regions.geojson"), "name", Some("sales")).unwrap();
    let variants = [
        MapOptions {
            title: "Sales".into(),
            ..Default::default()
        },
        MapOptions {
            scale: Scale::Log,
            highlight: Highlight::Top(10),
            legend_title: Some("Best sellers".into()),
            ..Default::default()
        },
        MapOptions {
            highlight: Highlight::Regions(vec!["Charlie".into(), "Delta".into()]),
            value_format: Some(ValueFormat::Thousands),
            ..Default::default()
        },
        MapOptions {
            highlight: Highlight::None,
            ..Default::default()
        },
    ];
    for (i, options) in variants.iter().enumerate() {
        write_and_check(
            |p| {
                let outcome =
                    viz::plot_map(&layer.measure, &layer.geometry, p, 900, 700, options).unwrap();
                assert_eq!(outcome, MapOutcome::Rendered);
            },
            &format!("map_{i}"),
            "svg",
        );
    }
    write_and_check(
        |p| {
            viz::plot_map(&layer.measure, &layer.geometry, p, 600, 500, &variants[0]).unwrap();
        },
        "map_png",
        "png",
    );
}

#[test]
fn all_zero_map_writes_nothing() {
    let mut layer = data::load_geojson(fixture("regions.geojson"), "name", Some("sales")).unwrap();
    for v in layer.measure.values_mut() {
        *v = 0.0;
    }
    let out = std::env::temp_dir().join("regionplot_viz_all_zero.svg");
    fs::remove_file(&out).ok();
    let outcome =
        viz::plot_map(&layer.measure, &layer.geometry, &out, 600, 400, &MapOptions::default())
            .unwrap();
    assert_eq!(outcome, MapOutcome::NothingToRender);
    assert!(!out.exists());

    let outcome = viz::plot_map(
        &RegionMeasure::new(),
        &RegionGeometry::new(),
        &out,
        600,
        400,
        &MapOptions::default(),
    )
    .unwrap();
    assert_eq!(outcome, MapOutcome::NothingToRender);
}

#[test]
fn map_rejects_negative_measure() {
    let mut layer = data::load_geojson(fixture("regions.geojson"), "name", Some("sales")).unwrap();
    layer.measure.insert("Bravo".into(), -5.0);
    let out = std::env::temp_dir().join("regionplot_viz_negative.svg");
    let err = viz::plot_map(&layer.measure, &layer.geometry, &out, 600, 400, &MapOptions::default())
        .unwrap_err();
    assert!(format!("{err:#}").contains("negative"));
}

#[test]
fn non_finite_cells_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("inf.csv");
    fs::write(&csv, "year,a\n2000,1\n2001,inf\n").unwrap();
    let err = data::load_frame(&csv, "year").unwrap_err();
    assert!(format!("{err:#}").contains("not a finite number"));

    // Frames built in code go through the same check before drawing.
    let frame = Frame::new("year", vec![2000.0, 2001.0])
        .with_column("a", vec![Some(1.0), Some(f64::INFINITY)]);
    let out = dir.path().join("inf.svg");
    let options = ChartOptions::area(cols(&["A"]));
    let err = viz::area_plot(&frame, &cols(&["a"]), &out, 400, 300, &options).unwrap_err();
    assert!(err.to_string().contains("non-finite"));
    assert!(!out.exists());
}

#[test]
fn ragged_frame_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("ragged.svg");
    let frame = Frame::new("x", vec![1.0, 2.0, 3.0]).with_column("a", vec![Some(1.0)]);
    let options = ChartOptions::area(cols(&["A"]));
    let err = viz::area_plot(&frame, &cols(&["a"]), &out, 400, 300, &options).unwrap_err();
    assert!(err.to_string().contains("has 1 values, expected 3"));

    let frame = population().with_column("short", vec![Some(5.0)]);
    let options = ChartOptions {
        annotate_column: Some("short".into()),
        ..ChartOptions::area(cols(&["North"]))
    };
    assert!(viz::area_plot(&frame, &cols(&["north"]), &out, 400, 300, &options).is_err());
    assert!(viz::stacked_plot(
        &frame,
        &cols(&["north", "short"]),
        &out,
        400,
        300,
        &ChartOptions::stacked(cols(&["North", "Short"])),
    )
    .is_err());
    assert!(!out.exists());
}

/// Trimmed contents of every `<text>` element.
fn svg_text_nodes(svg: &str) -> Vec<String> {
    svg.split("</text>")
        .filter_map(|chunk| chunk.rsplit_once('>').map(|(_, t)| t.trim().to_string()))
        .collect()
}

#[test]
fn log_map_shows_raw_values_in_labels() {
    let layer = data::load_geojson(fixture("regions.geojson"), "name", Some("sales")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("log_map.svg");
    let options = MapOptions {
        title: "Sales".into(),
        scale: Scale::Log,
        ..Default::default()
    };
    let outcome = viz::plot_map(&layer.measure, &layer.geometry, &out, 900, 700, &options).unwrap();
    assert_eq!(outcome, MapOutcome::Rendered);

    let svg = fs::read_to_string(&out).unwrap();
    let nodes = svg_text_nodes(&svg);
    let has = |s: &str| nodes.iter().any(|n| n == s);
    assert!(has("Sales"), "title missing: {nodes:?}");
    assert!(has("Top 3 Regions"), "heading missing: {nodes:?}");
    assert!(has("1: Bravo (1,500)"));
    assert!(has("3: Alpha, North (500)"));
    // Rank badges.
    assert!(has("1") && has("2") && has("3"));
    // Colorbar ends at the raw extremes, never at ln values.
    assert!(has("500") && has("1500"), "colorbar labels: {nodes:?}");
    assert!(!nodes.iter().any(|n| n.starts_with("6.21") || n.starts_with("7.31")));
}
