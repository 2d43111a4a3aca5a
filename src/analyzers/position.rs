//! Position changes across pit stops.

use std::collections::BTreeMap;

use crate::analyzers::types::{PitStopMarker, PositionChange, PositionChangeRow};
use crate::records::{LapRecord, PositionSample};

const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Pit stops as seen from the lap table: every lap with a pit-in time marks a
/// stop at that lap's timestamp.
pub fn pit_stop_markers(laps: &[LapRecord]) -> Vec<PitStopMarker> {
    laps.iter()
        .filter(|lap| lap.pit_in_time.is_some())
        .filter_map(|lap| {
            Some(PitStopMarker {
                driver: lap.driver.clone(),
                time: lap.timestamp?,
            })
        })
        .collect()
}

/// Compares each driver's position just before and just after every stop.
///
/// Samples exactly at the stop time bound neither side. Stops with no sample
/// on one side, such as at the very start or end of a session, are skipped.
#[tracing::instrument(skip_all, fields(samples = positions.len(), pit_stops = pit_stops.len()))]
pub fn detect_position_changes(
    positions: &[PositionSample],
    pit_stops: &[PitStopMarker],
) -> Vec<PositionChange> {
    let mut series: BTreeMap<&str, Vec<&PositionSample>> = BTreeMap::new();
    for sample in positions {
        series.entry(sample.driver.as_str()).or_default().push(sample);
    }
    for samples in series.values_mut() {
        samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }

    pit_stops
        .iter()
        .filter_map(|stop| {
            let samples = series.get(stop.driver.as_str())?;
            let first_not_before = samples.partition_point(|s| s.timestamp < stop.time);
            let first_after = samples.partition_point(|s| s.timestamp <= stop.time);

            let before = samples.get(first_not_before.checked_sub(1)?)?.position;
            let after = samples.get(first_after)?.position;

            Some(PositionChange {
                driver: stop.driver.clone(),
                pit_time: stop.time,
                before,
                after,
                delta: i64::from(before) - i64::from(after),
            })
        })
        .collect()
}

/// Earliest position sample, taken as the race start.
pub fn race_start(positions: &[PositionSample]) -> Option<f64> {
    positions
        .iter()
        .map(|s| s.timestamp)
        .min_by(|a, b| a.total_cmp(b))
}

/// Report rows with pit times in hours from `race_start`.
pub fn position_change_rows(
    changes: &[PositionChange],
    race_start: f64,
) -> Vec<PositionChangeRow> {
    changes
        .iter()
        .map(|change| PositionChangeRow {
            driver: change.driver.clone(),
            pit_stop_time: (change.pit_time - race_start) / SECONDS_PER_HOUR,
            position_before: change.before,
            position_after: change.after,
            position_change: change.delta,
        })
        .collect()
}
