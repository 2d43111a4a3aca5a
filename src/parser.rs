//! CSV loaders for lap, weather, position and result tables.
//!
//! A missing file, a missing required column or a structurally broken CSV
//! aborts the load. Individual cells that fail to parse become `None` and are
//! counted; rows without their identifying fields are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::duration;
use crate::error::{LapDataError, Result};
use crate::records::{LapRecord, PositionSample, RaceResult, WeatherSample};

const LAP_COLUMNS: &[&str] = &["Driver", "EventName", "LapNumber"];
const WEATHER_COLUMNS: &[&str] = &["EventName", "Time"];
const POSITION_COLUMNS: &[&str] = &["DriverName|Driver", "Time", "Position"];
const RESULT_COLUMNS: &[&str] = &["Abbreviation|DriverNumber"];

/// Cell values pandas writes for missing data.
const MISSING_MARKERS: &[&str] = &["", "nan", "NaN", "NaT", "None", "<NA>"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawLap {
    driver: Option<String>,
    driver_number: Option<String>,
    event_name: Option<String>,
    lap_number: Option<String>,
    lap_time: Option<String>,
    stint: Option<String>,
    compound: Option<String>,
    tyre_life: Option<String>,
    pit_in_time: Option<String>,
    pit_out_time: Option<String>,
    time: Option<String>,
    position: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawWeather {
    event_name: Option<String>,
    time: Option<String>,
    air_temp: Option<String>,
    track_temp: Option<String>,
    humidity: Option<String>,
    pressure: Option<String>,
    wind_speed: Option<String>,
    rainfall: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPosition {
    driver_name: Option<String>,
    driver: Option<String>,
    time: Option<String>,
    position: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResult {
    abbreviation: Option<String>,
    driver_number: Option<String>,
    event_name: Option<String>,
    position: Option<String>,
    classified_position: Option<String>,
}

/// Counts cells that held a value which did not parse.
#[derive(Debug, Default)]
struct Cells {
    malformed: usize,
}

impl Cells {
    fn text(&self, raw: Option<String>) -> Option<String> {
        raw.map(|s| s.trim().to_string())
            .filter(|s| !MISSING_MARKERS.contains(&s.as_str()))
    }

    fn parse<T>(&mut self, raw: Option<&str>, f: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let raw = raw.map(str::trim)?;
        if MISSING_MARKERS.contains(&raw) {
            return None;
        }
        let parsed = f(raw);
        if parsed.is_none() {
            self.malformed += 1;
        }
        parsed
    }

    fn duration(&mut self, raw: Option<&str>) -> Option<f64> {
        self.parse(raw, |s| duration::parse(s))
    }

    fn count(&mut self, raw: Option<&str>) -> Option<u32> {
        self.parse(raw, parse_count)
    }

    fn number(&mut self, raw: Option<&str>) -> Option<f64> {
        self.parse(raw, |s| s.parse::<f64>().ok().filter(|v| v.is_finite()))
    }

    fn flag(&mut self, raw: Option<&str>) -> Option<bool> {
        self.parse(raw, |s| match s {
            "True" | "true" | "1" | "1.0" => Some(true),
            "False" | "false" | "0" | "0.0" => Some(false),
            _ => None,
        })
    }
}

/// Parses whole numbers that may have been exported as floats (`"3.0"`).
fn parse_count(s: &str) -> Option<u32> {
    let value = s.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| LapDataError::MissingInput {
        path: path.to_path_buf(),
        source,
    })
}

fn read_rows<T: DeserializeOwned>(
    reader: impl Read,
    source: &Path,
    required: &[&str],
) -> Result<Vec<T>> {
    let csv_error = |e| LapDataError::Csv {
        path: source.to_path_buf(),
        source: e,
    };

    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(csv_error)?.clone();

    for column in required {
        let present = column
            .split('|')
            .any(|alt| headers.iter().any(|h| h.trim() == alt));
        if !present {
            return Err(LapDataError::MissingColumn {
                path: source.to_path_buf(),
                column: column.replace('|', "` or `"),
            });
        }
    }

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result.map_err(csv_error)?);
    }
    debug!(path = %source.display(), rows = rows.len(), "CSV rows read");
    Ok(rows)
}

/// Outcome of decoding one table, logged once the table is loaded.
#[derive(Debug, Default, PartialEq)]
struct Tally {
    kept: usize,
    skipped: usize,
    malformed: usize,
}

impl Tally {
    fn new(total: usize, kept: usize, cells: &Cells) -> Self {
        Tally {
            kept,
            skipped: total - kept,
            malformed: cells.malformed,
        }
    }

    fn log(&self, source: &Path, table: &str) {
        if self.skipped > 0 || self.malformed > 0 {
            warn!(
                path = %source.display(),
                table,
                kept = self.kept,
                skipped = self.skipped,
                malformed = self.malformed,
                "Some rows or cells could not be parsed"
            );
        } else {
            debug!(path = %source.display(), table, kept = self.kept, "Table loaded");
        }
    }
}

/// Loads the lap table from `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_laps(path: &Path) -> Result<Vec<LapRecord>> {
    read_laps(open(path)?, path)
}

/// Reads lap rows from any reader; `source` is only used in errors and logs.
pub fn read_laps(reader: impl Read, source: &Path) -> Result<Vec<LapRecord>> {
    let (laps, tally) = decode_laps(reader, source)?;
    tally.log(source, "laps");
    Ok(laps)
}

fn decode_laps(reader: impl Read, source: &Path) -> Result<(Vec<LapRecord>, Tally)> {
    let rows: Vec<RawLap> = read_rows(reader, source, LAP_COLUMNS)?;
    let total = rows.len();
    let mut cells = Cells::default();

    let laps: Vec<LapRecord> = rows
        .into_iter()
        .filter_map(|raw| {
            let driver = cells.text(raw.driver)?;
            let event_name = cells.text(raw.event_name)?;
            let lap_number = cells.count(raw.lap_number.as_deref()).filter(|&n| n > 0)?;
            Some(LapRecord {
                driver,
                driver_number: cells.text(raw.driver_number),
                event_name,
                lap_number,
                lap_time: cells.duration(raw.lap_time.as_deref()),
                stint: cells.count(raw.stint.as_deref()),
                compound: cells.text(raw.compound),
                tyre_life: cells.count(raw.tyre_life.as_deref()),
                pit_in_time: cells.duration(raw.pit_in_time.as_deref()),
                pit_out_time: cells.duration(raw.pit_out_time.as_deref()),
                timestamp: cells.duration(raw.time.as_deref()),
                position: cells.count(raw.position.as_deref()),
            })
        })
        .collect();

    let tally = Tally::new(total, laps.len(), &cells);
    Ok((laps, tally))
}

/// Loads the weather table from `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_weather(path: &Path) -> Result<Vec<WeatherSample>> {
    read_weather(open(path)?, path)
}

pub fn read_weather(reader: impl Read, source: &Path) -> Result<Vec<WeatherSample>> {
    let (samples, tally) = decode_weather(reader, source)?;
    tally.log(source, "weather");
    Ok(samples)
}

fn decode_weather(reader: impl Read, source: &Path) -> Result<(Vec<WeatherSample>, Tally)> {
    let rows: Vec<RawWeather> = read_rows(reader, source, WEATHER_COLUMNS)?;
    let total = rows.len();
    let mut cells = Cells::default();

    let samples: Vec<WeatherSample> = rows
        .into_iter()
        .filter_map(|raw| {
            Some(WeatherSample {
                event_name: cells.text(raw.event_name)?,
                timestamp: cells.duration(raw.time.as_deref()),
                air_temp: cells.number(raw.air_temp.as_deref()),
                track_temp: cells.number(raw.track_temp.as_deref()),
                humidity: cells.number(raw.humidity.as_deref()),
                pressure: cells.number(raw.pressure.as_deref()),
                wind_speed: cells.number(raw.wind_speed.as_deref()),
                rainfall: cells.flag(raw.rainfall.as_deref()),
            })
        })
        .collect();

    let tally = Tally::new(total, samples.len(), &cells);
    Ok((samples, tally))
}

/// Loads the running-position table from `path`.
///
/// Samples without a driver, a parseable time or a position are skipped since
/// they cannot bound a pit stop.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_positions(path: &Path) -> Result<Vec<PositionSample>> {
    read_positions(open(path)?, path)
}

pub fn read_positions(reader: impl Read, source: &Path) -> Result<Vec<PositionSample>> {
    let (samples, tally) = decode_positions(reader, source)?;
    tally.log(source, "positions");
    Ok(samples)
}

fn decode_positions(reader: impl Read, source: &Path) -> Result<(Vec<PositionSample>, Tally)> {
    let rows: Vec<RawPosition> = read_rows(reader, source, POSITION_COLUMNS)?;
    let total = rows.len();
    let mut cells = Cells::default();

    let samples: Vec<PositionSample> = rows
        .into_iter()
        .filter_map(|raw| {
            let driver = cells
                .text(raw.driver_name)
                .or_else(|| cells.text(raw.driver))?;
            let timestamp = cells.duration(raw.time.as_deref())?;
            let position = cells.count(raw.position.as_deref())?;
            Some(PositionSample {
                driver,
                timestamp,
                position,
            })
        })
        .collect();

    let tally = Tally::new(total, samples.len(), &cells);
    Ok((samples, tally))
}

/// Loads the race result table from `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_results(path: &Path) -> Result<Vec<RaceResult>> {
    read_results(open(path)?, path)
}

pub fn read_results(reader: impl Read, source: &Path) -> Result<Vec<RaceResult>> {
    let (results, tally) = decode_results(reader, source)?;
    tally.log(source, "results");
    Ok(results)
}

fn decode_results(reader: impl Read, source: &Path) -> Result<(Vec<RaceResult>, Tally)> {
    let rows: Vec<RawResult> = read_rows(reader, source, RESULT_COLUMNS)?;
    let total = rows.len();
    let mut cells = Cells::default();

    let results: Vec<RaceResult> = rows
        .into_iter()
        .map(|raw| RaceResult {
            abbreviation: cells.text(raw.abbreviation),
            driver_number: cells.text(raw.driver_number),
            event_name: cells.text(raw.event_name),
            position: cells.number(raw.position.as_deref()),
            // Retirements and disqualifications are letters, not malformed data.
            classified_position: raw
                .classified_position
                .as_deref()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite()),
        })
        .collect();

    let tally = Tally::new(total, results.len(), &cells);
    Ok((results, tally))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> &'static Path {
        Path::new("fixture.csv")
    }

    #[test]
    fn test_read_laps_normalises_fields() {
        let csv = "\
Time,Driver,DriverNumber,LapTime,LapNumber,Stint,PitOutTime,PitInTime,Compound,TyreLife,Position,EventName
0 days 01:02:03.000000,VER,1,0 days 00:01:35.123000,1.0,1.0,,,SOFT,1.0,1.0,Bahrain Grand Prix
";
        let laps = read_laps(csv.as_bytes(), source()).unwrap();

        assert_eq!(laps.len(), 1);
        let lap = &laps[0];
        assert_eq!(lap.driver, "VER");
        assert_eq!(lap.driver_number.as_deref(), Some("1"));
        assert_eq!(lap.event_name, "Bahrain Grand Prix");
        assert_eq!(lap.lap_number, 1);
        assert_eq!(lap.lap_time, Some(95.123));
        assert_eq!(lap.stint, Some(1));
        assert_eq!(lap.compound.as_deref(), Some("SOFT"));
        assert_eq!(lap.tyre_life, Some(1));
        assert_eq!(lap.pit_in_time, None);
        assert_eq!(lap.pit_out_time, None);
        assert_eq!(lap.timestamp, Some(3723.0));
        assert_eq!(lap.position, Some(1));
    }

    #[test]
    fn test_read_laps_malformed_cell_is_missing() {
        let csv = "\
Driver,EventName,LapNumber,LapTime,Stint
VER,Bahrain,1,garbage,1
VER,Bahrain,2,NaT,1
";
        let laps = read_laps(csv.as_bytes(), source()).unwrap();

        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].lap_time, None);
        assert_eq!(laps[1].lap_time, None);
        assert_eq!(laps[0].stint, Some(1));
    }

    #[test]
    fn test_read_laps_skips_rows_without_lap_number() {
        let csv = "\
Driver,EventName,LapNumber
VER,Bahrain,
VER,Bahrain,2.5
VER,Bahrain,3
";
        let laps = read_laps(csv.as_bytes(), source()).unwrap();

        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].lap_number, 3);
    }

    #[test]
    fn test_read_laps_missing_required_column() {
        let csv = "Driver,LapNumber\nVER,1\n";
        let err = read_laps(csv.as_bytes(), source()).unwrap_err();

        match err {
            LapDataError::MissingColumn { column, .. } => assert_eq!(column, "EventName"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_laps_ragged_rows_are_structural() {
        let csv = "Driver,EventName,LapNumber\nVER,Bahrain,1,extra\n";
        let err = read_laps(csv.as_bytes(), source()).unwrap_err();

        assert!(matches!(err, LapDataError::Csv { .. }));
    }

    #[test]
    fn test_load_laps_missing_file() {
        let err = load_laps(Path::new("/definitely/not/here/laps.csv")).unwrap_err();

        assert!(matches!(err, LapDataError::MissingInput { .. }));
    }

    #[test]
    fn test_read_weather() {
        let csv = "\
Time,AirTemp,Humidity,Pressure,Rainfall,TrackTemp,WindDirection,WindSpeed,EventName
0 days 00:00:10.000000,25.1,40.0,1010.2,False,33.5,120,1.2,Bahrain
";
        let samples = read_weather(csv.as_bytes(), source()).unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp, Some(10.0));
        assert_eq!(samples[0].air_temp, Some(25.1));
        assert_eq!(samples[0].track_temp, Some(33.5));
        assert_eq!(samples[0].rainfall, Some(false));
    }

    #[test]
    fn test_read_positions_accepts_driver_alias() {
        let csv = "Time,Driver,Position\n0 days 00:00:05.000000,HAM,4\n00:00:06,HAM,\n";
        let samples = read_positions(csv.as_bytes(), source()).unwrap();

        assert_eq!(
            samples,
            vec![PositionSample {
                driver: "HAM".to_string(),
                timestamp: 5.0,
                position: 4,
            }]
        );
    }

    #[test]
    fn test_read_positions_prefers_driver_name_column() {
        let csv = "\
Time,DriverName,Driver,Position
0 days 00:00:05.000000,HAM,Lewis Hamilton,4
0 days 00:00:06.000000,,VER,1
";
        let samples = read_positions(csv.as_bytes(), source()).unwrap();

        let drivers: Vec<&str> = samples.iter().map(|s| s.driver.as_str()).collect();
        assert_eq!(drivers, vec!["HAM", "VER"]);
        assert_eq!(samples[0].position, 4);
    }

    #[test]
    fn test_decode_laps_tallies_skipped_rows_and_bad_cells() {
        let csv = "\
Driver,EventName,LapNumber,LapTime,Stint,Compound
VER,Bahrain,1,garbage,1,SOFT
VER,Bahrain,2,0 days 00:01:35.000000,one,SOFT
VER,Bahrain,3,,1,
,Bahrain,4,0 days 00:01:36.000000,1,SOFT
VER,Bahrain,,0 days 00:01:36.000000,1,SOFT
";
        let (laps, tally) = decode_laps(csv.as_bytes(), source()).unwrap();

        assert_eq!(laps.len(), 3);
        assert_eq!(
            tally,
            Tally {
                kept: 3,
                skipped: 2,
                malformed: 2,
            }
        );
    }

    #[test]
    fn test_decode_weather_counts_bad_numbers() {
        let csv = "\
Time,AirTemp,Rainfall,EventName
0 days 00:00:10.000000,hot,maybe,Bahrain
0 days 00:01:10.000000,25.0,False,Bahrain
";
        let (samples, tally) = decode_weather(csv.as_bytes(), source()).unwrap();

        assert_eq!(samples[0].air_temp, None);
        assert_eq!(samples[0].rainfall, None);
        assert_eq!(tally.malformed, 2);
        assert_eq!(tally.skipped, 0);
    }

    #[test]
    fn test_read_results_non_numeric_classification() {
        let csv = "\
DriverNumber,Abbreviation,Position,ClassifiedPosition
1,VER,1.0,1
2,SAR,20.0,R
";
        let results = read_results(csv.as_bytes(), source()).unwrap();

        assert_eq!(results[0].classified_position, Some(1.0));
        assert_eq!(results[1].classified_position, None);
        assert_eq!(results[1].position, Some(20.0));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("3.0"), Some(3));
        assert_eq!(parse_count("3.5"), None);
        assert_eq!(parse_count("-1"), None);
    }
}
