use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use lap_events::analyzers::analyzer::{Report, analyze};
use lap_events::config::AnalysisConfig;
use lap_events::error::LapDataError;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config(output_dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        dataset_dir: fixtures(),
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Reads a report back as header -> cell maps.
fn read_table(path: &Path) -> Vec<HashMap<String, String>> {
    let mut rdr = csv::Reader::from_path(path).expect("report should exist");
    rdr.deserialize()
        .collect::<Result<_, _>>()
        .expect("report should be valid CSV")
}

fn number(row: &HashMap<String, String>, column: &str) -> f64 {
    row[column].parse().expect("numeric cell")
}

#[test]
fn test_full_pipeline() {
    let out = tempfile::tempdir().unwrap();
    let config = config(out.path());

    let manifest = analyze(&config, &Report::ALL).expect("analysis should succeed");
    assert_eq!(manifest.reports.len(), 15);
    for entry in &manifest.reports {
        assert!(entry.path.exists(), "{} missing", entry.path.display());
    }

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(json["reports"].as_array().unwrap().len(), 15);
    assert_eq!(json["reports"][0]["name"], "pit-stops");
}

#[test]
fn test_consistency_report() {
    let out = tempfile::tempdir().unwrap();
    analyze(&config(out.path()), &[Report::Consistency]).unwrap();

    let rows = read_table(&out.path().join("lap_consistency_pit_stops.csv"));
    assert_eq!(rows.len(), 2);

    let ham = &rows[0];
    assert_eq!(ham["Driver"], "HAM");
    assert_eq!(ham["PitStops"], "0");
    assert_eq!(number(ham, "TotalLaps"), 4.0);
    assert_eq!(number(ham, "TimedLaps"), 3.0);
    assert_eq!(number(ham, "LapTimeMean"), 102.0);
    assert_eq!(number(ham, "LapTimeStd"), 0.0);
    assert_eq!(ham["AvgPitTime"], "");

    let ver = &rows[1];
    assert_eq!(ver["Driver"], "VER");
    assert_eq!(ver["PitStops"], "1");
    assert_eq!(number(ver, "AvgStintLength"), 2.0);
    assert_eq!(number(ver, "LapTimeMean"), 105.0);
    assert!((number(ver, "LapTimeStd") - 10.0).abs() < 1e-9);
    assert!((number(ver, "AvgPitTime") - 22.0).abs() < 1e-9);

    let stints = read_table(&out.path().join("stints.csv"));
    let ver_stints: Vec<_> = stints.iter().filter(|s| s["Driver"] == "VER").collect();
    assert_eq!(ver_stints.len(), 2);
    assert_eq!(ver_stints[1]["StartLap"], "3");
    assert_eq!(ver_stints[1]["Compound"], "HARD");
}

#[test]
fn test_position_change_report() {
    let out = tempfile::tempdir().unwrap();
    analyze(&config(out.path()), &[Report::PositionChanges]).unwrap();

    let rows = read_table(&out.path().join("position_changes.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Driver"], "VER");
    assert_eq!(rows[0]["PositionBefore"], "1");
    assert_eq!(rows[0]["PositionAfter"], "2");
    assert_eq!(rows[0]["PositionChange"], "-1");
    assert!((number(&rows[0], "PitStopTime") - 50.0 / 3_600.0).abs() < 1e-9);
}

#[test]
fn test_weather_report() {
    let out = tempfile::tempdir().unwrap();
    analyze(&config(out.path()), &[Report::Weather]).unwrap();

    let rows = read_table(&out.path().join("weather_tire_analysis.csv"));
    assert_eq!(rows.len(), 8);

    let air: Vec<f64> = rows
        .iter()
        .filter(|r| r["Driver"] == "VER")
        .map(|r| number(r, "AirTemp"))
        .collect();
    assert_eq!(air, vec![28.0, 28.0, 27.5, 27.5]);
    assert!(rows.iter().all(|r| r["Rainfall"] == "false"));
    assert_eq!(number(&rows[0], "Pressure"), 1010.2);
    assert_eq!(number(&rows[0], "WindSpeed"), 1.2);
}

#[test]
fn test_results_reports() {
    let out = tempfile::tempdir().unwrap();
    analyze(
        &config(out.path()),
        &[Report::PitStopsVsPosition, Report::StartingCompound],
    )
    .unwrap();

    let ranges = read_table(&out.path().join("pit_stops_vs_position.csv"));
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0]["PitStopRange"], "1-2");
    assert_eq!(number(&ranges[0], "Position"), 1.5);

    let compounds = read_table(&out.path().join("tire_average_position.csv"));
    let order: Vec<&str> = compounds.iter().map(|r| r["Compound"].as_str()).collect();
    assert_eq!(order, vec!["SOFT", "MEDIUM"]);
}

#[test]
fn test_lap_time_and_race_length_reports() {
    let out = tempfile::tempdir().unwrap();
    analyze(
        &config(out.path()),
        &[Report::LapTimes, Report::RaceLength],
    )
    .unwrap();

    let lap_times = read_table(&out.path().join("driver_average_lap_times.csv"));
    let drivers: Vec<&str> = lap_times.iter().map(|r| r["Driver"].as_str()).collect();
    assert_eq!(drivers, vec!["HAM", "VER"]);

    let stats = read_table(&out.path().join("race_length_stats.csv"));
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0]["RaceLength"], "4");
    assert_eq!(number(&stats[0], "AvgPitStops"), 0.5);
    assert_eq!(stats[0]["MostCommonTire"], "MEDIUM");
}

#[test]
fn test_missing_dataset_fails() {
    let out = tempfile::tempdir().unwrap();
    let config = AnalysisConfig {
        dataset_dir: out.path().join("nowhere"),
        ..config(out.path())
    };

    let err = analyze(&config, &[Report::PitStops]).unwrap_err();
    assert!(matches!(err, LapDataError::MissingInput { .. }));
}
