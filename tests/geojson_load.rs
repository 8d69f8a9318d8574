use regionplot::data;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn loads_areal_features_with_measure() {
    let layer = data::load_geojson(fixture("regions.geojson"), "name", Some("sales")).unwrap();
    let ids: Vec<&str> = layer.geometry.keys().map(String::as_str).collect();
    // The point feature and the feature without a name are skipped.
    assert_eq!(ids, vec!["Alpha, North", "Bravo", "Charlie", "Delta"]);
    assert_eq!(layer.measure.get("Charlie"), Some(&1000.0));
    assert_eq!(layer.measure.get("Delta"), Some(&0.0));
    assert!(!layer.measure.contains_key("Echo Point"));
    assert_eq!(layer.geometry["Charlie"].0.len(), 2);
    assert_eq!(layer.geometry["Bravo"].0.len(), 1);
}

#[test]
fn numeric_ids_and_missing_measure_field() {
    let layer = data::load_geojson(fixture("regions.geojson"), "code", None).unwrap();
    let ids: Vec<&str> = layer.geometry.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert!(layer.measure.is_empty());

    let layer = data::load_geojson(fixture("regions.geojson"), "name", Some("nope")).unwrap();
    assert!(layer.measure.values().all(|v| *v == 0.0));
    assert_eq!(layer.measure.len(), 4);
}

#[test]
fn parse_rejects_non_collections() {
    let point = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#;
    assert!(data::parse_geojson(point, "name", None).is_err());
    assert!(data::parse_geojson("not json", "name", None).is_err());

    let empty = r#"{"type": "FeatureCollection", "features": []}"#;
    let layer = data::parse_geojson(empty, "name", Some("v")).unwrap();
    assert!(layer.geometry.is_empty() && layer.measure.is_empty());
}

#[test]
fn measure_csv_handles_quotes_and_zero() {
    let m = data::load_measure_csv(fixture("sales.csv"), "region", "sales").unwrap();
    assert_eq!(m.len(), 4);
    assert_eq!(m.get("Alpha, North"), Some(&500.0));
    assert_eq!(m.get("Delta"), Some(&0.0));

    let err = data::load_measure_csv(fixture("sales.csv"), "region", "revenue").unwrap_err();
    assert!(err.to_string().contains("revenue"));
}

#[test]
fn frame_keeps_empty_cells_as_missing() {
    let frame = data::load_frame(fixture("population.csv"), "year").unwrap();
    assert_eq!(frame.len(), 5);
    assert_eq!(frame.x[0], 2015.0);
    let names: Vec<&str> = frame.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["north", "south", "income"]);
    assert_eq!(frame.column("south").unwrap().values[2], None);
    assert_eq!(frame.series("south").unwrap().len(), 4);

    assert!(data::load_frame(fixture("population.csv"), "month").is_err());
}
