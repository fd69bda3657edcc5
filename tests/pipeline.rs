use bramm::compute::geojson::table_to_feature_collection;
use bramm::preprocessing::{Aggregation, DuplicatesRemoval, OutlierRemoval, ValueThreshold};
use bramm::{
    CoordinateFields, DataSource, Matcher, MatcherConfig, PairOptions, Value, from_json_file,
    from_table,
};
use std::io::Write;

const MOSS: &str = r#"[
    {"code": "M1", "longitude": 2.3522, "latitude": 48.8566, "date": "2016-09-01", "zinc": 30.0},
    {"code": "M1", "longitude": 2.3522, "latitude": 48.8566, "date": "2016-09-01", "zinc": 50.0},
    {"code": "M2", "longitude": 4.8357, "latitude": 45.7640, "date": "2016-09-03", "zinc": 900.0},
    {"code": "M3", "longitude": 5.3698, "latitude": 43.2965, "date": "2016-09-05", "zinc": 25.0},
    {"code": "M4", "longitude": null, "latitude": 43.6, "date": "2016-09-06", "zinc": 12.0}
]"#;

const RMQS: &str = r#"[
    {"site": 101, "longitude": 2.3530, "latitude": 48.8570, "date_complete": "2004-05-11"},
    {"site": 102, "longitude": 5.3700, "latitude": 43.2960, "date_complete": "1997-03-02"},
    {"site": 103, "longitude": 5.3710, "latitude": 43.2970, "date_complete": "2009-10-20"},
    {"site": 104, "longitude": 0.1, "latitude": 47.0, "date_complete": "2012-06-30"}
]"#;

fn write_json(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_moss_to_soil_pipeline() {
    let _ = env_logger::builder().is_test(true).try_init();

    let moss_file = write_json(MOSS);
    let rmqs_file = write_json(RMQS);
    let fields = CoordinateFields::default();

    let moss = from_json_file(moss_file.path())
        .retrieve_points(&fields)
        .expect("moss samples");
    assert_eq!(moss.len(), 4);

    let moss = DuplicatesRemoval::new(Aggregation::Mean)
        .process_duplicates(&moss)
        .unwrap();
    assert_eq!(moss.len(), 3);
    assert_eq!(moss.value(0, "zinc"), Some(&Value::from(40.0)));

    let zinc = ValueThreshold::new("zinc", 0.0, 500.0);
    let moss = OutlierRemoval::new(moss).apply_thresholds(&[&zinc]).unwrap();
    assert_eq!(moss.len(), 2);

    let soil = from_json_file(rmqs_file.path())
        .with_date_fields(["date_complete"])
        .retrieve_points(&fields)
        .unwrap();

    let matcher = Matcher::new(MatcherConfig::default().with_km_threshold(2.0)).unwrap();
    let out = matcher
        .match_to_primary(&moss, &soil, &PairOptions::new().want_leftovers(true))
        .unwrap();

    assert_eq!(out.matched.len(), 2);
    let sites: Vec<&Value> = out.matched.column("site").unwrap();
    assert_eq!(sites, vec![&Value::from(101.0), &Value::from(103.0)]);
    assert_eq!(out.leftovers.as_ref().map(|t| t.len()), Some(1));

    let geojson = table_to_feature_collection(
        &out.matched,
        &CoordinateFields::new("longitude_moss", "latitude_moss"),
    )
    .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&geojson).unwrap();
    assert_eq!(parsed["features"].as_array().map(Vec::len), Some(2));
    assert_eq!(parsed["features"][0]["properties"]["code"], "M1");
}

#[test]
fn test_in_memory_source_round_trip() {
    let file = write_json(RMQS);
    let table = from_json_file(file.path()).retrieve_table().unwrap();

    let source = from_table(table.clone());
    assert_eq!(source.retrieve_table().unwrap(), table);
    assert_eq!(
        source
            .retrieve_points(&CoordinateFields::default())
            .unwrap()
            .len(),
        4
    );
}
