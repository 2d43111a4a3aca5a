use std::cell::OnceCell;
use std::path::Path;

use tracing::{info, info_span};

use crate::analyzers::aggregate::{aggregate_driver, group_laps};
use crate::analyzers::asof::weather_by_lap;
use crate::analyzers::compound::{
    average_positions, compound_lap_times, driver_average_lap_times, tyre_delta_points,
    tyre_delta_summary,
};
use crate::analyzers::position::{
    detect_position_changes, pit_stop_markers, position_change_rows, race_start,
};
use crate::analyzers::race_length::{driver_race_lengths, race_length_stats};
use crate::analyzers::results::{pit_stops_vs_position, starting_compound_positions};
use crate::analyzers::segmentation::{detect_pit_stops, segment_stints};
use crate::analyzers::types::PitStopRow;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::output::{ReportEntry, RunManifest, write_manifest, write_report};
use crate::parser::{load_laps, load_positions, load_results, load_weather};
use crate::records::{LapRecord, PositionSample, RaceResult, WeatherSample};

/// A derived table set that can be produced in one batch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    PitStops,
    Consistency,
    LapTimes,
    Compounds,
    TyreDelta,
    RaceLength,
    Weather,
    PositionChanges,
    AveragePositions,
    PitStopsVsPosition,
    StartingCompound,
}

impl Report {
    pub const ALL: [Report; 11] = [
        Report::PitStops,
        Report::Consistency,
        Report::LapTimes,
        Report::Compounds,
        Report::TyreDelta,
        Report::RaceLength,
        Report::Weather,
        Report::PositionChanges,
        Report::AveragePositions,
        Report::PitStopsVsPosition,
        Report::StartingCompound,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Report::PitStops => "pit-stops",
            Report::Consistency => "consistency",
            Report::LapTimes => "lap-times",
            Report::Compounds => "compounds",
            Report::TyreDelta => "tyre-delta",
            Report::RaceLength => "race-length",
            Report::Weather => "weather",
            Report::PositionChanges => "position-changes",
            Report::AveragePositions => "average-positions",
            Report::PitStopsVsPosition => "pit-stops-vs-position",
            Report::StartingCompound => "starting-compound",
        }
    }
}

/// Input tables for one run, each loaded on first use.
pub struct Inputs<'a> {
    config: &'a AnalysisConfig,
    laps: OnceCell<Vec<LapRecord>>,
    weather: OnceCell<Vec<WeatherSample>>,
    positions: OnceCell<Vec<PositionSample>>,
    results: OnceCell<Vec<RaceResult>>,
}

fn cached<'c, T>(
    cell: &'c OnceCell<Vec<T>>,
    path: &Path,
    load: impl FnOnce(&Path) -> Result<Vec<T>>,
) -> Result<&'c [T]> {
    if let Some(rows) = cell.get() {
        return Ok(rows.as_slice());
    }
    let rows = load(path)?;
    Ok(cell.get_or_init(|| rows).as_slice())
}

impl<'a> Inputs<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Inputs {
            config,
            laps: OnceCell::new(),
            weather: OnceCell::new(),
            positions: OnceCell::new(),
            results: OnceCell::new(),
        }
    }

    pub fn laps(&self) -> Result<&[LapRecord]> {
        cached(&self.laps, &self.config.laps_path(), load_laps)
    }

    pub fn weather(&self) -> Result<&[WeatherSample]> {
        cached(&self.weather, &self.config.weather_path(), load_weather)
    }

    pub fn positions(&self) -> Result<&[PositionSample]> {
        cached(&self.positions, &self.config.positions_path(), load_positions)
    }

    pub fn results(&self) -> Result<&[RaceResult]> {
        cached(&self.results, &self.config.results_path(), load_results)
    }
}

/// Produces the files of one report and returns what was written.
pub fn run_report(report: Report, inputs: &Inputs<'_>) -> Result<Vec<ReportEntry>> {
    let span = info_span!("report", report = report.name());
    let _guard = span.enter();

    let config = inputs.config;
    let out = config.output_dir.as_path();
    let window = &config.pit_window;
    let name = report.name();

    let entries = match report {
        Report::PitStops => {
            let groups = group_laps(inputs.laps()?);
            let mut rows = Vec::with_capacity(groups.len());
            let mut events = Vec::new();
            for (key, group) in &groups {
                rows.push(PitStopRow::from(&aggregate_driver(key, group, window)));
                events.extend(detect_pit_stops(group, window));
            }
            vec![
                write_report(out, name, "pit_stop_analysis.csv", &rows)?,
                write_report(out, name, "pit_stop_events.csv", &events)?,
            ]
        }
        Report::Consistency => {
            let groups = group_laps(inputs.laps()?);
            let mut aggregates = Vec::with_capacity(groups.len());
            let mut stints = Vec::new();
            for (key, group) in &groups {
                aggregates.push(aggregate_driver(key, group, window));
                stints.extend(segment_stints(group));
            }
            vec![
                write_report(out, name, "lap_consistency_pit_stops.csv", &aggregates)?,
                write_report(out, name, "stints.csv", &stints)?,
            ]
        }
        Report::LapTimes => vec![write_report(
            out,
            name,
            "driver_average_lap_times.csv",
            &driver_average_lap_times(inputs.laps()?),
        )?],
        Report::Compounds => vec![write_report(
            out,
            name,
            "tire_compound_analysis.csv",
            &compound_lap_times(inputs.laps()?),
        )?],
        Report::TyreDelta => {
            let points = tyre_delta_points(inputs.laps()?);
            vec![
                write_report(out, name, "tire_delta_by_life.csv", &points)?,
                write_report(
                    out,
                    name,
                    "tire_delta_analysis.csv",
                    &tyre_delta_summary(&points),
                )?,
            ]
        }
        Report::RaceLength => {
            let entries = driver_race_lengths(inputs.laps()?);
            vec![
                write_report(out, name, "driver_race_lengths.csv", &entries)?,
                write_report(
                    out,
                    name,
                    "race_length_stats.csv",
                    &race_length_stats(&entries),
                )?,
            ]
        }
        Report::Weather => {
            let rows = weather_by_lap(inputs.laps()?, inputs.weather()?);
            vec![write_report(out, name, "weather_tire_analysis.csv", &rows)?]
        }
        Report::PositionChanges => {
            let positions = inputs.positions()?;
            let markers = pit_stop_markers(inputs.laps()?);
            let changes = detect_position_changes(positions, &markers);
            let rows = match race_start(positions) {
                Some(start) => position_change_rows(&changes, start),
                None => Vec::new(),
            };
            vec![write_report(out, name, "position_changes.csv", &rows)?]
        }
        Report::AveragePositions => vec![write_report(
            out,
            name,
            "average_positions.csv",
            &average_positions(inputs.laps()?),
        )?],
        Report::PitStopsVsPosition => vec![write_report(
            out,
            name,
            "pit_stops_vs_position.csv",
            &pit_stops_vs_position(inputs.laps()?, inputs.results()?),
        )?],
        Report::StartingCompound => vec![write_report(
            out,
            name,
            "tire_average_position.csv",
            &starting_compound_positions(inputs.laps()?, inputs.results()?),
        )?],
    };

    Ok(entries)
}

/// Runs `reports` in order against one set of inputs, then writes the
/// manifest. The first structural input error aborts the run.
#[tracing::instrument(
    skip_all,
    fields(reports = reports.len(), output_dir = %config.output_dir.display())
)]
pub fn analyze(config: &AnalysisConfig, reports: &[Report]) -> Result<RunManifest> {
    let inputs = Inputs::new(config);
    let mut entries = Vec::new();

    for &report in reports {
        entries.extend(run_report(report, &inputs)?);
    }

    let manifest = RunManifest::new(entries);
    let path = write_manifest(&config.output_dir, &manifest)?;
    info!(
        files = manifest.reports.len(),
        manifest = %path.display(),
        "Analysis complete"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LAPS: &str = "\
Time,Driver,DriverNumber,LapTime,LapNumber,Stint,PitOutTime,PitInTime,Compound,TyreLife,Position,EventName
0 days 00:01:40.000000,VER,1,0 days 00:01:40.000000,1.0,1.0,,,SOFT,1.0,1.0,Bahrain
0 days 00:03:20.000000,VER,1,0 days 00:01:40.000000,2.0,1.0,,0 days 00:03:15.000000,SOFT,2.0,1.0,Bahrain
0 days 00:05:10.000000,VER,1,0 days 00:01:50.000000,3.0,2.0,0 days 00:03:40.000000,,HARD,1.0,2.0,Bahrain
";

    fn config_with_laps(dir: &Path) -> AnalysisConfig {
        let dataset = dir.join("dataset");
        fs::create_dir_all(&dataset).unwrap();
        fs::write(dataset.join("lap_2024.csv"), LAPS).unwrap();

        AnalysisConfig {
            dataset_dir: dataset,
            output_dir: dir.join("out"),
            ..Default::default()
        }
    }

    #[test]
    fn test_report_names_are_unique() {
        let mut names: Vec<&str> = Report::ALL.iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Report::ALL.len());
    }

    #[test]
    fn test_pit_stop_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_laps(dir.path());

        let manifest = analyze(&config, &[Report::PitStops]).unwrap();
        assert_eq!(manifest.reports.len(), 2);

        let summary = fs::read_to_string(config.output_dir.join("pit_stop_analysis.csv")).unwrap();
        assert_eq!(
            summary,
            "EventName,Driver,PitStops,AvgPitTime,TotalPitTime\nBahrain,VER,1,25.0,25.0\n"
        );

        let events = fs::read_to_string(config.output_dir.join("pit_stop_events.csv")).unwrap();
        assert_eq!(
            events,
            "EventName,Driver,LapNumber,StintBefore,StintAfter,PitDuration\n\
             Bahrain,VER,3,1,2,25.0\n"
        );
        assert!(config.output_dir.join("manifest.json").exists());
    }

    #[test]
    fn test_empty_report_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_laps(dir.path());
        fs::write(config.positions_path(), "Time,Driver,Position\n").unwrap();

        let manifest = analyze(&config, &[Report::PositionChanges]).unwrap();
        assert_eq!(manifest.reports[0].rows, 0);

        let content = fs::read_to_string(config.output_dir.join("position_changes.csv")).unwrap();
        assert_eq!(
            content,
            "Driver,PitStopTime,PositionBefore,PositionAfter,PositionChange\n"
        );
    }

    #[test]
    fn test_inputs_load_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_laps(dir.path());
        let inputs = Inputs::new(&config);

        assert_eq!(inputs.laps().unwrap().len(), 3);
        fs::remove_file(config.laps_path()).unwrap();
        assert_eq!(inputs.laps().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_input_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_laps(dir.path());

        let err = analyze(&config, &[Report::Weather]).unwrap_err();
        assert!(matches!(err, crate::error::LapDataError::MissingInput { .. }));
        assert!(!config.output_dir.join("manifest.json").exists());
    }
}
