//! Stint and pit-stop segmentation for one driver's lap sequence.
//!
//! A pit stop is a change of `stint` between consecutive laps. Laps without a
//! stint id are ignored here. All functions expect laps sorted by
//! `lap_number`; see [`group_laps`](crate::analyzers::aggregate::group_laps).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analyzers::types::{PitStopEvent, PitStopSummary, Stint};
use crate::analyzers::utility::{mean, most_common};
use crate::records::LapRecord;

/// Range of pit-lane times accepted as real measurements, in seconds (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitWindow {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for PitWindow {
    fn default() -> Self {
        PitWindow {
            min_secs: 10.0,
            max_secs: 60.0,
        }
    }
}

impl PitWindow {
    pub fn contains(&self, secs: f64) -> bool {
        secs >= self.min_secs && secs <= self.max_secs
    }
}

/// Detects pit stops from stint changes.
///
/// The pit duration is the pit-out time of the later lap minus the pit-in
/// time of the earlier lap. Durations outside `window` are dropped, but the
/// stop is still reported.
pub fn detect_pit_stops(laps: &[LapRecord], window: &PitWindow) -> Vec<PitStopEvent> {
    let staged: Vec<(&LapRecord, u32)> = laps
        .iter()
        .filter_map(|lap| lap.stint.map(|stint| (lap, stint)))
        .collect();

    staged
        .windows(2)
        .filter_map(|pair| {
            let [(prev, stint_before), (next, stint_after)] = pair else {
                return None;
            };
            if stint_before == stint_after {
                return None;
            }

            let pit_duration = match (prev.pit_in_time, next.pit_out_time) {
                (Some(pit_in), Some(pit_out)) => Some(pit_out - pit_in),
                _ => None,
            }
            .filter(|secs| window.contains(*secs));

            Some(PitStopEvent {
                event_name: next.event_name.clone(),
                driver: next.driver.clone(),
                lap_number: next.lap_number,
                stint_before: *stint_before,
                stint_after: *stint_after,
                pit_duration,
            })
        })
        .collect()
}

/// Counts stops and averages the plausible durations.
pub fn summarize_pit_stops(events: &[PitStopEvent]) -> PitStopSummary {
    let durations: Vec<f64> = events.iter().filter_map(|e| e.pit_duration).collect();

    PitStopSummary {
        pit_stop_count: events.len(),
        avg_pit_time: mean(&durations),
        total_pit_time: durations.iter().sum(),
    }
}

/// Number of distinct stint ids present.
pub fn distinct_stints(laps: &[LapRecord]) -> usize {
    laps.iter()
        .filter_map(|lap| lap.stint)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Splits the sequence into contiguous runs of equal stint id.
///
/// Each run holds at least one lap.
pub fn segment_stints(laps: &[LapRecord]) -> Vec<Stint> {
    let mut runs: Vec<(u32, Vec<&LapRecord>)> = Vec::new();

    for lap in laps {
        let Some(stint) = lap.stint else {
            continue;
        };
        match runs.last_mut() {
            Some((current, members)) if *current == stint => members.push(lap),
            _ => runs.push((stint, vec![lap])),
        }
    }

    runs.into_iter()
        .map(|(stint, members)| Stint {
            event_name: members[0].event_name.clone(),
            driver: members[0].driver.clone(),
            stint,
            start_lap: members[0].lap_number,
            end_lap: members[members.len() - 1].lap_number,
            laps: members.len(),
            compound: most_common(members.iter().filter_map(|l| l.compound.as_deref())),
        })
        .collect()
}
