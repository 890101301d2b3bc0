use major_transit_stops::output::{read_merged_stops, write_merged_stops};
use major_transit_stops::parser::{TRIPS_FILE, load_feed};
use major_transit_stops::{ClassifyError, MergeConfig, MergedStop, major_transit_stops};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sfmta")
}

fn temp_path(name: &str) -> PathBuf {
    env::temp_dir().join(name)
}

/// Copies the fixture feed into a scratch directory that tests may modify.
fn scratch_feed(name: &str) -> PathBuf {
    let dir = temp_path(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    for entry in fs::read_dir(fixture_dir()).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dir.join(entry.file_name())).unwrap();
    }
    dir
}

fn classify(dir: &Path, config: &MergeConfig) -> Result<Vec<MergedStop>, ClassifyError> {
    let feed = load_feed(dir).expect("Failed to load feed");
    major_transit_stops(&feed, config)?.collect()
}

fn names(stops: &[MergedStop]) -> Vec<&str> {
    stops.iter().map(|s| s.stop_name.as_str()).collect()
}

#[test]
fn test_full_pipeline() {
    let stops = classify(&fixture_dir(), &MergeConfig::builtin().unwrap()).unwrap();

    // 24th & Bryant only sees the 48; 16th & Mission only the merged 14/14R.
    assert_eq!(names(&stops), vec!["24th St & Mission St", "Ferry Building"]);
    assert_eq!(stops[0].stop_ids, vec!["3476", "3477"]);
    assert!((stops[0].stop_lat - 37.7524).abs() < 1e-9);
    assert!((stops[0].stop_lon - -122.4183).abs() < 1e-9);
    assert_eq!(stops[1].stop_ids, vec!["7000"]);

    let path = temp_path("major_transit_stops_integration_output.csv");
    write_merged_stops(&path, &stops).unwrap();
    let read_back = read_merged_stops(&path).unwrap();
    assert_eq!(read_back.len(), stops.len());
    for (read, written) in read_back.iter().zip(&stops) {
        assert_eq!(read.stop_ids, written.stop_ids);
        assert_eq!(read.stop_name, written.stop_name);
        assert!((read.stop_lat - written.stop_lat).abs() < 1e-9);
        assert!((read.stop_lon - written.stop_lon).abs() < 1e-9);
    }
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_unmerged_rapid_counts_as_its_own_route() {
    let stops = classify(&fixture_dir(), &MergeConfig::from_json("{}").unwrap()).unwrap();

    assert_eq!(
        names(&stops),
        vec!["24th St & Mission St", "Ferry Building", "Mission St & 16th St"]
    );
}

#[test]
fn test_sample_merge_config_matches_builtin() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/duplicate_routes.json");
    let from_file = classify(&fixture_dir(), &MergeConfig::load(&path).unwrap()).unwrap();
    let builtin = classify(&fixture_dir(), &MergeConfig::builtin().unwrap()).unwrap();

    assert_eq!(from_file, builtin);
}

#[test]
fn test_duplicate_trip_aborts() {
    let dir = scratch_feed("major_transit_stops_integration_dup_trip");
    let trips = fs::read_to_string(dir.join(TRIPS_FILE)).unwrap();
    fs::write(dir.join(TRIPS_FILE), format!("{trips}48,SAT,14-WKDY-0800\n")).unwrap();

    let err = classify(&dir, &MergeConfig::builtin().unwrap()).unwrap_err();
    assert_eq!(err, ClassifyError::DuplicateTrip("14-WKDY-0800".to_string()));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_cli_writes_output() {
    let output = temp_path("major_transit_stops_cli_output.csv");
    let _ = fs::remove_file(&output);

    let status = Command::new(env!("CARGO_BIN_EXE_major_transit_stops"))
        .arg(fixture_dir())
        .arg("--output")
        .arg(&output)
        .env("LOG_FILE_PATH", temp_path("major_transit_stops_cli_logs/run.log"))
        .status()
        .unwrap();

    assert!(status.success());
    let stops = read_merged_stops(&output).unwrap();
    assert_eq!(names(&stops), vec!["24th St & Mission St", "Ferry Building"]);

    fs::remove_file(&output).unwrap();
}

#[test]
fn test_cli_writes_stop_buffers() {
    let output = temp_path("major_transit_stops_cli_buffers.csv");
    let geojson = temp_path("major_transit_stops_cli_buffers.geojson");
    let _ = fs::remove_file(&geojson);

    let status = Command::new(env!("CARGO_BIN_EXE_major_transit_stops"))
        .arg(fixture_dir())
        .arg("-o")
        .arg(&output)
        .arg("--geojson")
        .arg(&geojson)
        .env("LOG_FILE_PATH", temp_path("major_transit_stops_cli_logs/run.log"))
        .status()
        .unwrap();

    assert!(status.success());
    let collection: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&geojson).unwrap()).unwrap();
    let features = collection["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["properties"]["stop_name"], "24th St & Mission St");
    assert_eq!(features[1]["properties"]["stop_ids"], serde_json::json!(["7000"]));

    fs::remove_file(&output).unwrap();
    fs::remove_file(&geojson).unwrap();
}

#[test]
fn test_cli_integrity_error_leaves_no_output() {
    let dir = scratch_feed("major_transit_stops_cli_dangling");
    let trips = fs::read_to_string(dir.join(TRIPS_FILE)).unwrap();
    // Drop the ferry trip so its stop_time dangles.
    let trips: String = trips
        .lines()
        .filter(|line| !line.starts_with("FB,"))
        .map(|line| format!("{line}\n"))
        .collect();
    fs::write(dir.join(TRIPS_FILE), trips).unwrap();

    let output = temp_path("major_transit_stops_cli_dangling.csv");
    let _ = fs::remove_file(&output);

    let status = Command::new(env!("CARGO_BIN_EXE_major_transit_stops"))
        .arg(&dir)
        .arg("-o")
        .arg(&output)
        .env("LOG_FILE_PATH", temp_path("major_transit_stops_cli_logs/run.log"))
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(!output.exists());

    fs::remove_dir_all(&dir).unwrap();
}
