//! Data types produced by the analysis pipeline.
//!
//! Report rows serialize with the column names downstream chart scripts
//! read, so several fields carry explicit renames.

use serde::Serialize;

use crate::output::Tabular;

/// Identifies one driver's entry in one event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriverKey {
    pub event_name: String,
    pub driver: String,
}

impl DriverKey {
    pub fn new(event_name: &str, driver: &str) -> Self {
        DriverKey {
            event_name: event_name.to_string(),
            driver: driver.to_string(),
        }
    }
}

/// A pit stop inferred from a stint change between consecutive laps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PitStopEvent {
    pub event_name: String,
    pub driver: String,
    /// First lap of the new stint.
    pub lap_number: u32,
    pub stint_before: u32,
    pub stint_after: u32,
    /// Pit-in to pit-out time; `None` when unknown or implausible.
    pub pit_duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitStopSummary {
    pub pit_stop_count: usize,
    pub avg_pit_time: Option<f64>,
    pub total_pit_time: f64,
}

/// A contiguous run of laps on one set of tyres.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stint {
    pub event_name: String,
    pub driver: String,
    pub stint: u32,
    pub start_lap: u32,
    pub end_lap: u32,
    pub laps: usize,
    pub compound: Option<String>,
}

/// Per-driver, per-race summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DriverAggregate {
    pub event_name: String,
    pub driver: String,
    pub total_laps: u32,
    pub timed_laps: usize,
    #[serde(rename = "PitStops")]
    pub pit_stop_count: usize,
    pub avg_stint_length: f64,
    #[serde(rename = "LapTimeMean")]
    pub lap_time_mean: Option<f64>,
    #[serde(rename = "LapTimeStd")]
    pub lap_time_stddev: Option<f64>,
    pub avg_pit_time: Option<f64>,
    pub total_pit_time: f64,
}

/// Pit stop columns of a [`DriverAggregate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PitStopRow {
    pub event_name: String,
    pub driver: String,
    pub pit_stops: usize,
    pub avg_pit_time: Option<f64>,
    pub total_pit_time: f64,
}

impl From<&DriverAggregate> for PitStopRow {
    fn from(agg: &DriverAggregate) -> Self {
        PitStopRow {
            event_name: agg.event_name.clone(),
            driver: agg.driver.clone(),
            pit_stops: agg.pit_stop_count,
            avg_pit_time: agg.avg_pit_time,
            total_pit_time: agg.total_pit_time,
        }
    }
}

/// A lap joined with the latest weather reading at or before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LapWeatherRow {
    pub event_name: String,
    pub time: Option<f64>,
    pub driver: String,
    pub compound: Option<String>,
    pub air_temp: Option<f64>,
    pub track_temp: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub rainfall: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitStopMarker {
    pub driver: String,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionChange {
    pub driver: String,
    pub pit_time: f64,
    pub before: u32,
    pub after: u32,
    /// Positive when the driver gained places.
    pub delta: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionChangeRow {
    pub driver: String,
    /// Hours since the first position sample.
    pub pit_stop_time: f64,
    pub position_before: u32,
    pub position_after: u32,
    pub position_change: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DriverLapTime {
    pub driver: String,
    pub average_lap_time: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompoundLapTime {
    pub driver: String,
    pub compound: String,
    pub average_lap_time: Option<f64>,
    pub total_laps: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AveragePosition {
    pub driver: String,
    pub compound: String,
    pub position: Option<f64>,
}

/// Mean lap time on one compound at one tyre age, relative to the freshest bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TyreDeltaPoint {
    pub compound: String,
    pub tyre_life: u32,
    pub lap_time: f64,
    pub delta_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TyreDeltaSummary {
    pub tire_compound: String,
    pub laps: u32,
    pub avg_delta_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DriverRaceLength {
    pub event_name: String,
    pub driver: String,
    pub total_laps: u32,
    pub pit_stops: usize,
    pub most_common_tire: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaceLengthStats {
    pub race_length: u32,
    pub avg_pit_stops: f64,
    pub most_common_tire: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PitStopRangePosition {
    pub pit_stop_range: String,
    pub position: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompoundPosition {
    pub compound: String,
    pub classified_position: f64,
}

/// Implements [`Tabular`] from each row type's column list.
macro_rules! columns {
    ($($row:ty => [$($column:literal),+ $(,)?];)+) => {
        $(
            impl Tabular for $row {
                const COLUMNS: &'static [&'static str] = &[$($column),+];
            }
        )+
    };
}

columns! {
    PitStopEvent => [
        "EventName",
        "Driver",
        "LapNumber",
        "StintBefore",
        "StintAfter",
        "PitDuration",
    ];
    Stint => ["EventName", "Driver", "Stint", "StartLap", "EndLap", "Laps", "Compound"];
    DriverAggregate => [
        "EventName",
        "Driver",
        "TotalLaps",
        "TimedLaps",
        "PitStops",
        "AvgStintLength",
        "LapTimeMean",
        "LapTimeStd",
        "AvgPitTime",
        "TotalPitTime",
    ];
    PitStopRow => ["EventName", "Driver", "PitStops", "AvgPitTime", "TotalPitTime"];
    LapWeatherRow => [
        "EventName",
        "Time",
        "Driver",
        "Compound",
        "AirTemp",
        "TrackTemp",
        "Humidity",
        "Pressure",
        "WindSpeed",
        "Rainfall",
    ];
    PositionChangeRow => [
        "Driver",
        "PitStopTime",
        "PositionBefore",
        "PositionAfter",
        "PositionChange",
    ];
    DriverLapTime => ["Driver", "AverageLapTime"];
    CompoundLapTime => ["Driver", "Compound", "AverageLapTime", "TotalLaps"];
    AveragePosition => ["Driver", "Compound", "Position"];
    TyreDeltaPoint => ["Compound", "TyreLife", "LapTime", "DeltaTime"];
    TyreDeltaSummary => ["TireCompound", "Laps", "AvgDeltaTime"];
    DriverRaceLength => ["EventName", "Driver", "TotalLaps", "PitStops", "MostCommonTire"];
    RaceLengthStats => ["RaceLength", "AvgPitStops", "MostCommonTire"];
    PitStopRangePosition => ["PitStopRange", "Position"];
    CompoundPosition => ["Compound", "ClassifiedPosition"];
}
