//! Reports joining lap data with classified race results.

use std::collections::BTreeMap;

use crate::analyzers::types::{CompoundPosition, PitStopRangePosition};
use crate::analyzers::utility::mean;
use crate::records::{LapRecord, RaceResult};

/// Buckets a stop count the way the finishing-position report groups it.
pub fn pit_stop_range(stops: usize) -> &'static str {
    match stops {
        0..=2 => "1-2",
        3..=4 => "3-4",
        _ => "5+",
    }
}

/// Mean finishing position per pit stop bucket.
///
/// A driver's stop count is the number of their laps with a pit-out time,
/// counted over the whole lap table. Results join on the driver abbreviation.
pub fn pit_stops_vs_position(
    laps: &[LapRecord],
    results: &[RaceResult],
) -> Vec<PitStopRangePosition> {
    let mut stops: BTreeMap<&str, usize> = BTreeMap::new();
    for lap in laps {
        let count = stops.entry(lap.driver.as_str()).or_default();
        if lap.pit_out_time.is_some() {
            *count += 1;
        }
    }

    let mut buckets: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in results {
        let Some(count) = result.abbreviation.as_deref().and_then(|a| stops.get(a)) else {
            continue;
        };
        let positions = buckets.entry(pit_stop_range(*count)).or_default();
        if let Some(position) = result.position {
            positions.push(position);
        }
    }

    buckets
        .into_iter()
        .map(|(range, positions)| PitStopRangePosition {
            pit_stop_range: range.to_string(),
            position: mean(&positions),
        })
        .collect()
}

/// Mean classified position per starting compound, best first.
///
/// The starting compound is the compound on lap 1, matched on driver number
/// and, when the result row names one, on event.
pub fn starting_compound_positions(
    laps: &[LapRecord],
    results: &[RaceResult],
) -> Vec<CompoundPosition> {
    let starts: Vec<(&str, &str, &str)> = laps
        .iter()
        .filter(|lap| lap.lap_number == 1)
        .filter_map(|lap| {
            Some((
                lap.driver_number.as_deref()?,
                lap.event_name.as_str(),
                lap.compound.as_deref()?,
            ))
        })
        .collect();

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in results {
        let (Some(number), Some(classified)) =
            (result.driver_number.as_deref(), result.classified_position)
        else {
            continue;
        };
        let event = result.event_name.as_deref();

        for &(_, _, compound) in starts
            .iter()
            .filter(|(n, e, _)| *n == number && event.is_none_or(|event| event == *e))
        {
            groups.entry(compound).or_default().push(classified);
        }
    }

    let mut rows: Vec<CompoundPosition> = groups
        .into_iter()
        .filter_map(|(compound, positions)| {
            Some(CompoundPosition {
                compound: compound.to_string(),
                classified_position: mean(&positions)?,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.classified_position.total_cmp(&b.classified_position));
    rows
}
