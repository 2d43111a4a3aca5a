//! Input records after normalisation.
//!
//! Durations and session offsets are seconds. Optional fields are `None` when
//! the source cell was empty or failed to parse.

use serde::Serialize;

/// One lap by one driver in one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LapRecord {
    pub driver: String,
    pub driver_number: Option<String>,
    pub event_name: String,
    pub lap_number: u32,
    pub lap_time: Option<f64>,
    pub stint: Option<u32>,
    pub compound: Option<String>,
    pub tyre_life: Option<u32>,
    pub pit_in_time: Option<f64>,
    pub pit_out_time: Option<f64>,
    /// Session offset at the end of the lap.
    pub timestamp: Option<f64>,
    pub position: Option<u32>,
}

impl LapRecord {
    pub fn new(event_name: &str, driver: &str, lap_number: u32) -> Self {
        LapRecord {
            driver: driver.to_string(),
            event_name: event_name.to_string(),
            lap_number,
            ..Default::default()
        }
    }
}

/// A weather reading taken during a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSample {
    pub event_name: String,
    pub timestamp: Option<f64>,
    pub air_temp: Option<f64>,
    pub track_temp: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub rainfall: Option<bool>,
}

/// Running race position of a driver at a session offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSample {
    pub driver: String,
    pub timestamp: f64,
    pub position: u32,
}

/// A classified race result row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RaceResult {
    pub abbreviation: Option<String>,
    pub driver_number: Option<String>,
    pub event_name: Option<String>,
    pub position: Option<f64>,
    /// `None` for non-numeric classifications such as retirements.
    pub classified_position: Option<f64>,
}
