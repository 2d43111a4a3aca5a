//! Lap time and position reports broken down by driver and tyre compound.

use std::collections::BTreeMap;

use crate::analyzers::types::{
    AveragePosition, CompoundLapTime, DriverLapTime, TyreDeltaPoint, TyreDeltaSummary,
};
use crate::analyzers::utility::{cmp_missing_last, mean};
use crate::records::LapRecord;

/// Mean lap time per driver over every event, fastest first.
/// Drivers without a single timed lap are listed last.
pub fn driver_average_lap_times(laps: &[LapRecord]) -> Vec<DriverLapTime> {
    let mut times: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for lap in laps {
        let entry = times.entry(lap.driver.as_str()).or_default();
        if let Some(t) = lap.lap_time {
            entry.push(t);
        }
    }

    let mut rows: Vec<DriverLapTime> = times
        .into_iter()
        .map(|(driver, values)| DriverLapTime {
            driver: driver.to_string(),
            average_lap_time: mean(&values),
        })
        .collect();
    rows.sort_by(|a, b| cmp_missing_last(a.average_lap_time, b.average_lap_time));
    rows
}

/// Mean lap time and lap count per (driver, compound). Laps with no compound
/// are left out.
pub fn compound_lap_times(laps: &[LapRecord]) -> Vec<CompoundLapTime> {
    let mut groups: BTreeMap<(&str, &str), (Vec<f64>, usize)> = BTreeMap::new();
    for lap in laps {
        let Some(compound) = lap.compound.as_deref() else {
            continue;
        };
        let (times, count) = groups.entry((lap.driver.as_str(), compound)).or_default();
        *count += 1;
        if let Some(t) = lap.lap_time {
            times.push(t);
        }
    }

    groups
        .into_iter()
        .map(|((driver, compound), (times, count))| CompoundLapTime {
            driver: driver.to_string(),
            compound: compound.to_string(),
            average_lap_time: mean(&times),
            total_laps: count,
        })
        .collect()
}

/// Mean running position per (driver, compound).
pub fn average_positions(laps: &[LapRecord]) -> Vec<AveragePosition> {
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for lap in laps {
        let Some(compound) = lap.compound.as_deref() else {
            continue;
        };
        let positions = groups.entry((lap.driver.as_str(), compound)).or_default();
        if let Some(p) = lap.position {
            positions.push(f64::from(p));
        }
    }

    groups
        .into_iter()
        .map(|((driver, compound), positions)| AveragePosition {
            driver: driver.to_string(),
            compound: compound.to_string(),
            position: mean(&positions),
        })
        .collect()
}

/// Lap time by tyre age for each compound, as a delta to the freshest age
/// that has a timed lap.
pub fn tyre_delta_points(laps: &[LapRecord]) -> Vec<TyreDeltaPoint> {
    let mut buckets: BTreeMap<&str, BTreeMap<u32, Vec<f64>>> = BTreeMap::new();
    for lap in laps {
        let (Some(compound), Some(tyre_life), Some(lap_time)) =
            (lap.compound.as_deref(), lap.tyre_life, lap.lap_time)
        else {
            continue;
        };
        buckets
            .entry(compound)
            .or_default()
            .entry(tyre_life)
            .or_default()
            .push(lap_time);
    }

    let mut points = Vec::new();
    for (compound, by_life) in buckets {
        let mut base = None;
        for (tyre_life, times) in by_life {
            let Some(lap_time) = mean(&times) else {
                continue;
            };
            let base_time = *base.get_or_insert(lap_time);
            points.push(TyreDeltaPoint {
                compound: compound.to_string(),
                tyre_life,
                lap_time,
                delta_time: lap_time - base_time,
            });
        }
    }
    points
}

/// Per compound: the oldest tyre age seen and the mean delta over all ages.
pub fn tyre_delta_summary(points: &[TyreDeltaPoint]) -> Vec<TyreDeltaSummary> {
    let mut groups: BTreeMap<&str, (u32, Vec<f64>)> = BTreeMap::new();
    for point in points {
        let (max_life, deltas) = groups.entry(point.compound.as_str()).or_default();
        *max_life = (*max_life).max(point.tyre_life);
        deltas.push(point.delta_time);
    }

    groups
        .into_iter()
        .filter_map(|(compound, (laps, deltas))| {
            Some(TyreDeltaSummary {
                tire_compound: compound.to_string(),
                laps,
                avg_delta_time: mean(&deltas)?,
            })
        })
        .collect()
}
