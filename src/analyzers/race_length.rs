use std::collections::BTreeMap;

use crate::analyzers::aggregate::group_laps;
use crate::analyzers::segmentation::distinct_stints;
use crate::analyzers::types::{DriverRaceLength, RaceLengthStats};
use crate::analyzers::utility::most_common;
use crate::records::LapRecord;

/// Race distance, stop count and favourite compound for every driver entry.
pub fn driver_race_lengths(laps: &[LapRecord]) -> Vec<DriverRaceLength> {
    group_laps(laps)
        .into_iter()
        .map(|(key, group)| DriverRaceLength {
            total_laps: group.iter().map(|l| l.lap_number).max().unwrap_or(0),
            pit_stops: distinct_stints(&group).saturating_sub(1),
            most_common_tire: most_common(group.iter().filter_map(|l| l.compound.as_deref())),
            event_name: key.event_name,
            driver: key.driver,
        })
        .collect()
}

/// Groups driver entries by race distance, averaging their stop counts.
pub fn race_length_stats(entries: &[DriverRaceLength]) -> Vec<RaceLengthStats> {
    let mut groups: BTreeMap<u32, Vec<&DriverRaceLength>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.total_laps).or_default().push(entry);
    }

    groups
        .into_iter()
        .map(|(race_length, members)| RaceLengthStats {
            race_length,
            avg_pit_stops: members.iter().map(|e| e.pit_stops as f64).sum::<f64>()
                / members.len() as f64,
            most_common_tire: most_common(
                members.iter().filter_map(|e| e.most_common_tire.as_deref()),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_laps(event: &str, driver: &str, stints: &[(u32, &str)]) -> Vec<LapRecord> {
        stints
            .iter()
            .enumerate()
            .map(|(i, &(stint, compound))| LapRecord {
                stint: Some(stint),
                compound: Some(compound.to_string()),
                ..LapRecord::new(event, driver, i as u32 + 1)
            })
            .collect()
    }

    #[test]
    fn test_driver_race_lengths() {
        let laps = entry_laps(
            "Bahrain",
            "VER",
            &[(1, "SOFT"), (1, "SOFT"), (2, "HARD"), (2, "HARD"), (2, "HARD")],
        );

        let entries = driver_race_lengths(&laps);
        assert_eq!(
            entries,
            vec![DriverRaceLength {
                event_name: "Bahrain".into(),
                driver: "VER".into(),
                total_laps: 5,
                pit_stops: 1,
                most_common_tire: Some("HARD".into()),
            }]
        );
    }

    #[test]
    fn test_missing_stints_do_not_underflow() {
        let mut laps = entry_laps("Bahrain", "VER", &[(1, "SOFT")]);
        laps[0].stint = None;

        assert_eq!(driver_race_lengths(&laps)[0].pit_stops, 0);
    }

    #[test]
    fn test_race_length_stats_groups_by_distance() {
        let mut laps = entry_laps("Bahrain", "VER", &[(1, "SOFT"), (2, "HARD"), (3, "HARD")]);
        laps.extend(entry_laps(
            "Bahrain",
            "HAM",
            &[(1, "MEDIUM"), (1, "MEDIUM"), (2, "HARD")],
        ));
        laps.extend(entry_laps("Monaco", "VER", &[(1, "SOFT")]));

        let stats = race_length_stats(&driver_race_lengths(&laps));
        assert_eq!(stats.len(), 2);

        assert_eq!(stats[0].race_length, 1);
        assert_eq!(stats[0].avg_pit_stops, 0.0);
        assert_eq!(stats[0].most_common_tire.as_deref(), Some("SOFT"));

        assert_eq!(stats[1].race_length, 3);
        assert_eq!(stats[1].avg_pit_stops, 1.5);
        // One MEDIUM and one HARD entry; HAM sorts first.
        assert_eq!(stats[1].most_common_tire.as_deref(), Some("MEDIUM"));
    }
}
