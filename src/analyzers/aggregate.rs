use crate::analyzers::segmentation::{PitWindow, detect_pit_stops, summarize_pit_stops};
use crate::analyzers::types::{DriverAggregate, DriverKey};
use crate::analyzers::utility::{mean, sample_stddev};
use crate::records::LapRecord;
use std::collections::BTreeMap;

/// Partitions laps by (event, driver), each partition sorted by lap number.
///
/// The sort is stable, so duplicate lap numbers keep their input order.
pub fn group_laps(laps: &[LapRecord]) -> BTreeMap<DriverKey, Vec<LapRecord>> {
    let mut groups: BTreeMap<DriverKey, Vec<LapRecord>> = BTreeMap::new();

    for lap in laps {
        groups
            .entry(DriverKey::new(&lap.event_name, &lap.driver))
            .or_default()
            .push(lap.clone());
    }

    for group in groups.values_mut() {
        group.sort_by_key(|lap| lap.lap_number);
    }

    groups
}

/// Summarises one driver's race. `laps` must be sorted by lap number.
///
/// `total_laps` is the highest lap number seen rather than the row count, so
/// gaps in the data do not shorten the race.
pub fn aggregate_driver(
    key: &DriverKey,
    laps: &[LapRecord],
    window: &PitWindow,
) -> DriverAggregate {
    let lap_times: Vec<f64> = laps.iter().filter_map(|lap| lap.lap_time).collect();
    let total_laps = laps.iter().map(|lap| lap.lap_number).max().unwrap_or(0);

    let pit_stops = summarize_pit_stops(&detect_pit_stops(laps, window));

    DriverAggregate {
        event_name: key.event_name.clone(),
        driver: key.driver.clone(),
        total_laps,
        timed_laps: lap_times.len(),
        pit_stop_count: pit_stops.pit_stop_count,
        avg_stint_length: total_laps as f64 / (pit_stops.pit_stop_count + 1) as f64,
        lap_time_mean: mean(&lap_times),
        lap_time_stddev: sample_stddev(&lap_times),
        avg_pit_time: pit_stops.avg_pit_time,
        total_pit_time: pit_stops.total_pit_time,
    }
}

/// Aggregates every (event, driver) pair, in key order.
#[tracing::instrument(skip_all, fields(laps = laps.len()))]
pub fn aggregate_drivers(laps: &[LapRecord], window: &PitWindow) -> Vec<DriverAggregate> {
    let aggregates: Vec<DriverAggregate> = group_laps(laps)
        .iter()
        .map(|(key, group)| aggregate_driver(key, group, window))
        .collect();

    tracing::debug!(drivers = aggregates.len(), "Driver aggregates computed");
    aggregates
}
