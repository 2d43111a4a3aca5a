//! Backward as-of join between two timestamped tables.
//!
//! Each primary row is matched to the latest secondary row of the same group
//! whose timestamp is not after its own. Both sides are indexed per group and
//! sorted once, then walked with two cursors.

use std::collections::BTreeMap;

use crate::analyzers::types::LapWeatherRow;
use crate::records::{LapRecord, WeatherSample};

/// A row that can take part in an as-of join.
pub trait AsOfKeyed {
    /// Rows only match within the same group.
    fn group_key(&self) -> &str;
    /// Timestamp in seconds; rows without one never match.
    fn as_of(&self) -> Option<f64>;
}

impl AsOfKeyed for LapRecord {
    fn group_key(&self) -> &str {
        &self.event_name
    }

    fn as_of(&self) -> Option<f64> {
        self.timestamp
    }
}

impl AsOfKeyed for WeatherSample {
    fn group_key(&self) -> &str {
        &self.event_name
    }

    fn as_of(&self) -> Option<f64> {
        self.timestamp
    }
}

/// Per group, `(timestamp, row index)` sorted by timestamp. Stable, so equal
/// timestamps keep input order.
fn index_by_group<T: AsOfKeyed>(rows: &[T]) -> BTreeMap<&str, Vec<(f64, usize)>> {
    let mut groups: BTreeMap<&str, Vec<(f64, usize)>> = BTreeMap::new();

    for (idx, row) in rows.iter().enumerate() {
        if let Some(ts) = row.as_of().filter(|ts| !ts.is_nan()) {
            groups.entry(row.group_key()).or_default().push((ts, idx));
        }
    }

    for entries in groups.values_mut() {
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    groups
}

/// Matches every primary row to its as-of secondary row.
///
/// The result is aligned with `primary`: element `i` is the match for
/// `primary[i]`, or `None` when no secondary row of the same group precedes
/// it. On equal timestamps the secondary row that came last in input wins.
pub fn asof_join<'s, P: AsOfKeyed, S: AsOfKeyed>(
    primary: &[P],
    secondary: &'s [S],
) -> Vec<Option<&'s S>> {
    let mut matched = vec![None; primary.len()];
    let candidates = index_by_group(secondary);

    for (group, rows) in index_by_group(primary) {
        let Some(candidates) = candidates.get(group) else {
            continue;
        };

        let mut cursor = 0;
        let mut current = None;
        for (ts, idx) in rows {
            while let Some(&(candidate_ts, candidate_idx)) = candidates.get(cursor) {
                if candidate_ts > ts {
                    break;
                }
                current = Some(&secondary[candidate_idx]);
                cursor += 1;
            }
            matched[idx] = current;
        }
    }

    matched
}

/// Attaches the latest weather reading of the same event to every lap.
#[tracing::instrument(skip_all, fields(laps = laps.len(), samples = weather.len()))]
pub fn weather_by_lap(laps: &[LapRecord], weather: &[WeatherSample]) -> Vec<LapWeatherRow> {
    let matches = asof_join(laps, weather);
    let unmatched = matches.iter().filter(|m| m.is_none()).count();
    if unmatched > 0 {
        tracing::debug!(unmatched, "Laps without a preceding weather sample");
    }

    laps.iter()
        .zip(matches)
        .map(|(lap, sample)| LapWeatherRow {
            event_name: lap.event_name.clone(),
            time: lap.timestamp,
            driver: lap.driver.clone(),
            compound: lap.compound.clone(),
            air_temp: sample.and_then(|s| s.air_temp),
            track_temp: sample.and_then(|s| s.track_temp),
            humidity: sample.and_then(|s| s.humidity),
            pressure: sample.and_then(|s| s.pressure),
            wind_speed: sample.and_then(|s| s.wind_speed),
            rainfall: sample.and_then(|s| s.rainfall),
        })
        .collect()
}
