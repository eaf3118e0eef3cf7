//! Track correspondence tables between phone models

use std::collections::HashMap;

use crate::error::{CassetteError, Result};
use crate::topology::PhoneModel;

/// What a source track becomes on the destination model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackMapping {
    /// Exactly one destination track.
    Direct(String),
    /// Every listed track.
    DuplicateAll(Vec<String>),
    /// `n` draws with replacement from the pool, deduplicated.
    SampleN(Vec<String>, usize),
    /// One whole candidate set picked at random.
    ChooseOne(Vec<Vec<String>>),
}

/// Correspondence table for one porting route.
#[derive(Debug, Clone, Default)]
pub struct PortTable {
    /// Keyed by source track (`"3"`, `"1.12"`).
    pub tracks: HashMap<String, TrackMapping>,
    /// Destination track for segmented effects, keyed by source track.
    pub segmented_effects: HashMap<String, String>,
}

impl PortTable {
    fn with(mut self, track: &str, mapping: TrackMapping) -> Self {
        self.tracks.insert(track.to_string(), mapping);
        self
    }

    fn with_zones(mut self, from_glyph: u32, to_glyph: u32, from_count: u32, to_count: u32) -> Self {
        self.tracks.extend(zone_map(from_glyph, to_glyph, from_count, to_count));
        self
    }

    fn with_segmented(mut self, pairs: &[(&str, &str)]) -> Self {
        self.segmented_effects.extend(
            pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string())),
        );
        self
    }
}

fn direct(track: &str) -> TrackMapping {
    TrackMapping::Direct(track.to_string())
}

fn owned(tracks: &[&str]) -> Vec<String> {
    tracks.iter().map(|t| t.to_string()).collect()
}

fn dup(tracks: &[&str]) -> TrackMapping {
    TrackMapping::DuplicateAll(owned(tracks))
}

fn sample(pool: &[&str], n: usize) -> TrackMapping {
    TrackMapping::SampleN(owned(pool), n)
}

fn choose(sets: &[&[&str]]) -> TrackMapping {
    TrackMapping::ChooseOne(sets.iter().map(|set| owned(set)).collect())
}

const PHONE2_FROM_TOP: &[&[&str]] = &[
    &["1", "2", "3"],
    &["1", "2"],
    &["4", "5", "6"],
    &["7", "8", "9"],
    &["4", "5", "7", "8"],
    &["4", "5", "6", "7", "8", "9"],
    &["5", "8"],
];

const PHONE2_FROM_MIDDLE: &[&[&str]] = &[
    &["4", "5", "6"],
    &["7", "8", "9"],
    &["4", "5", "7", "8"],
    &["4", "5", "6", "7", "8", "9"],
    &["5", "8"],
];

const PHONE1_RING_HALVES: &[&[&str]] = &[&["3.1", "3.3"], &["3"], &["3.2", "3.4"]];

/// Proportional sub-zone map `"<a>.<i>" -> "<b>.<j>"` for `i` in `1..=from_count`,
/// `j = round(i * to_count / from_count)` clamped into `1..=to_count`.
pub fn zone_map(
    from_glyph: u32,
    to_glyph: u32,
    from_count: u32,
    to_count: u32,
) -> Vec<(String, TrackMapping)> {
    let factor = to_count as f64 / from_count as f64;
    (1..=from_count)
        .map(|i| {
            let zone = ((i as f64 * factor).round_ties_even() as u32).clamp(1, to_count);
            (
                format!("{}.{}", from_glyph, i),
                TrackMapping::Direct(format!("{}.{}", to_glyph, zone)),
            )
        })
        .collect()
}

/// Table for porting `from` onto `to`.
pub fn port_table(from: PhoneModel, to: PhoneModel) -> Result<PortTable> {
    use PhoneModel::*;

    let table = PortTable::default();
    let table = match (from, to) {
        (Phone2A, Phone3A) => table
            .with("1", direct("1"))
            .with("2", direct("2"))
            .with("3", direct("3"))
            .with_zones(1, 1, 24, 20)
            .with_segmented(&[("1", "1")]),
        (Phone2A, Phone2) => table
            .with_zones(1, 4, 24, 16)
            .with_segmented(&[("1", "4")])
            .with("1", choose(PHONE2_FROM_TOP))
            .with("2", choose(PHONE2_FROM_MIDDLE))
            .with("3", sample(&["10", "11"], 1)),
        (Phone2A, Phone1) => table
            .with_zones(1, 4, 24, 8)
            .with_segmented(&[("1", "4")])
            .with("1", dup(&["1", "2"]))
            .with("2", choose(PHONE1_RING_HALVES))
            .with("3", sample(&["4", "5"], 1)),
        (Phone3A, Phone2A) => table
            .with("1", direct("1"))
            .with("2", direct("2"))
            .with("3", direct("3"))
            .with_zones(1, 1, 20, 24)
            .with_zones(2, 1, 11, 24)
            .with("3.1", direct("3"))
            .with("3.2", direct("3"))
            .with("3.3", direct("3"))
            .with("3.4", direct("3"))
            .with("3.5", direct("3"))
            .with_segmented(&[("1", "1"), ("2", "1"), ("3", "1")]),
        (Phone3A, Phone1) => table
            .with("1", choose(&[&["1", "2"], &["3.1", "3.3"], &["3.2", "3.4"]]))
            .with("2", choose(PHONE1_RING_HALVES))
            .with("3", sample(&["4", "5"], 1))
            .with_zones(1, 4, 20, 8)
            .with_zones(2, 4, 11, 8)
            .with_zones(3, 4, 5, 8)
            .with_segmented(&[("1", "4"), ("2", "4"), ("3", "4")]),
        (Phone3A, Phone2) => table
            .with("1", choose(PHONE2_FROM_TOP))
            .with("2", choose(PHONE2_FROM_TOP))
            .with("3", sample(&["10", "11"], 1))
            .with_zones(1, 4, 20, 16)
            .with_zones(2, 4, 11, 16)
            .with_zones(3, 10, 5, 8)
            .with_segmented(&[("1", "4"), ("2", "4"), ("3", "10")]),
        (Phone1, Phone2) => table
            .with("1", dup(&["1", "2"]))
            .with("2", direct("3"))
            .with("3", dup(&["4", "5", "6", "7", "8", "9"]))
            .with("3.1", direct("4"))
            .with("3.2", dup(&["5", "6"]))
            .with("3.3", direct("7"))
            .with("3.4", dup(&["8", "9"]))
            .with_zones(4, 10, 8, 8)
            .with("5", direct("11"))
            .with_segmented(&[("4", "10")]),
        (Phone2, Phone1) => table
            .with("1", direct("1"))
            .with("2", direct("1"))
            .with("3", direct("2"))
            .with("4", direct("3.1"))
            .with("5", direct("3.2"))
            .with("6", direct("3.2"))
            .with("7", direct("3.3"))
            .with("8", direct("3.4"))
            .with("9", direct("3.4"))
            .with_zones(4, 4, 16, 8)
            .with_zones(10, 4, 8, 8)
            .with("11", direct("5"))
            .with_segmented(&[("4", "4"), ("10", "4")]),
        _ => {
            return Err(CassetteError::UnsupportedPort {
                from: from.code().to_string(),
                to: to.code().to_string(),
            })
        }
    };
    Ok(table)
}

/// Destinations `model` can be ported to.
pub fn available_ports(model: PhoneModel) -> Vec<PhoneModel> {
    PhoneModel::ALL
        .into_iter()
        .filter(|&to| to != model && port_table(model, to).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn target(table: &PortTable, track: &str) -> TrackMapping {
        table.tracks.get(track).cloned().unwrap()
    }

    #[test_case(1, 1, 24, 20, "1.1", "1.1")]
    #[test_case(1, 1, 24, 20, "1.24", "1.20")]
    #[test_case(1, 4, 24, 16, "1.3", "4.2")]
    #[test_case(3, 10, 5, 8, "3.5", "10.8")]
    #[test_case(2, 1, 11, 24, "2.1", "1.2")]
    fn test_zone_map(a: u32, b: u32, na: u32, nb: u32, from: &str, to: &str) {
        let map: HashMap<String, TrackMapping> = zone_map(a, b, na, nb).into_iter().collect();
        assert_eq!(map.len(), na as usize);
        assert_eq!(map[from], TrackMapping::Direct(to.to_string()));
    }

    #[test]
    fn test_zone_map_stays_in_range() {
        for (_, mapping) in zone_map(3, 10, 5, 8).into_iter().chain(zone_map(1, 4, 20, 8)) {
            if let TrackMapping::Direct(track) = mapping {
                let zone: u32 = track.split('.').nth(1).unwrap().parse().unwrap();
                assert!(zone >= 1 && zone <= 8);
            }
        }
    }

    #[test]
    fn test_phone2_to_phone1_table() {
        let table = port_table(PhoneModel::Phone2, PhoneModel::Phone1).unwrap();
        assert_eq!(target(&table, "9"), TrackMapping::Direct("3.4".to_string()));
        assert_eq!(target(&table, "11"), TrackMapping::Direct("5".to_string()));
        assert_eq!(target(&table, "10.8"), TrackMapping::Direct("4.8".to_string()));
        assert_eq!(table.segmented_effects["10"], "4");
    }

    #[test]
    fn test_phone1_to_phone2_duplicates_ring() {
        let table = port_table(PhoneModel::Phone1, PhoneModel::Phone2).unwrap();
        match target(&table, "3") {
            TrackMapping::DuplicateAll(tracks) => assert_eq!(tracks.len(), 6),
            other => panic!("unexpected mapping {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_routes() {
        assert!(port_table(PhoneModel::Phone1, PhoneModel::Phone2A).is_err());
        assert!(port_table(PhoneModel::Phone2, PhoneModel::Phone3A).is_err());
        assert!(port_table(PhoneModel::Phone1, PhoneModel::Phone1).is_err());
    }

    #[test]
    fn test_available_ports() {
        assert_eq!(available_ports(PhoneModel::Phone1), vec![PhoneModel::Phone2]);
        assert_eq!(
            available_ports(PhoneModel::Phone2A),
            vec![PhoneModel::Phone1, PhoneModel::Phone2, PhoneModel::Phone3A]
        );
    }
}
