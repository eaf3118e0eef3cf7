//! Topology Registry
//!
//! Static description of every supported light-array topology: which phone
//! models exist, how their logical glyphs and zones map onto physical array
//! columns, and which tracks segmented effects may animate. The set is closed
//! and compiled into the binary.

pub mod tables;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CassetteError, Result};
use tables::Span;

/// Supported phone models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PhoneModel {
    Phone1,
    Phone2,
    Phone2A,
    Phone3A,
}

impl PhoneModel {
    pub const ALL: [PhoneModel; 4] = [
        PhoneModel::Phone1,
        PhoneModel::Phone2,
        PhoneModel::Phone2A,
        PhoneModel::Phone3A,
    ];

    /// Code used in label files and cassette documents (`PHONE2A`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Phone1 => "PHONE1",
            Self::Phone2 => "PHONE2",
            Self::Phone2A => "PHONE2A",
            Self::Phone3A => "PHONE3A",
        }
    }

    /// Name shown to users and stored in composition files (`Phone (2a)`).
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Phone1 => "Phone (1)",
            Self::Phone2 => "Phone (2)",
            Self::Phone2A => "Phone (2a)",
            Self::Phone3A => "Phone (3a)",
        }
    }

    /// Short model number (`2a`).
    pub fn number(&self) -> &'static str {
        match self {
            Self::Phone1 => "1",
            Self::Phone2 => "2",
            Self::Phone2A => "2a",
            Self::Phone3A => "3a",
        }
    }

    /// Number of logical tracks shown in the editor.
    pub fn track_count(&self) -> u32 {
        match self {
            Self::Phone1 => 5,
            Self::Phone2 => 11,
            Self::Phone2A | Self::Phone3A => 3,
        }
    }

    /// Resolve a hardware product code (`ro.product.model`).
    pub fn from_product_code(code: &str) -> Option<Self> {
        tables::PRODUCT_CODES
            .iter()
            .find(|(product, _)| *product == code.trim())
            .and_then(|(_, model)| model.parse().ok())
    }

    /// Glyphs that expose addressable zones, with their zone count.
    pub fn zoned_glyphs(&self) -> &'static [(u32, u32)] {
        match self {
            Self::Phone1 => tables::PHONE1_ZONED_GLYPHS,
            Self::Phone2 => tables::PHONE2_ZONED_GLYPHS,
            Self::Phone2A => tables::PHONE2A_ZONED_GLYPHS,
            Self::Phone3A => tables::PHONE3A_ZONED_GLYPHS,
        }
    }

    /// Number of zones of a glyph, `None` if the glyph is not zoned.
    pub fn zones_of(&self, glyph: u32) -> Option<u32> {
        self.zoned_glyphs()
            .iter()
            .find(|(g, _)| *g == glyph)
            .map(|(_, zones)| *zones)
    }

    /// Tracks that segmented effects can animate.
    pub fn segmented_tracks(&self) -> &'static [(&'static str, u32)] {
        match self {
            Self::Phone1 => tables::PHONE1_SEGMENTED_TRACKS,
            Self::Phone2 => tables::PHONE2_SEGMENTED_TRACKS,
            Self::Phone2A => tables::PHONE2A_SEGMENTED_TRACKS,
            Self::Phone3A => tables::PHONE3A_SEGMENTED_TRACKS,
        }
    }

    /// Segment count of a segmented track, `None` for plain tracks.
    pub fn segment_count(&self, track: &str) -> Option<u32> {
        self.segmented_tracks()
            .iter()
            .find(|(t, _)| *t == track)
            .map(|(_, segs)| *segs)
    }
}

impl fmt::Display for PhoneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PhoneModel {
    type Err = CassetteError;

    /// Accepts the code, the display name or the short number.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        PhoneModel::ALL
            .into_iter()
            .find(|m| {
                m.code().eq_ignore_ascii_case(s) || m.display_name() == s || m.number() == s
            })
            .ok_or_else(|| CassetteError::UnknownPhoneModel {
                model: s.to_string(),
            })
    }
}

impl TryFrom<String> for PhoneModel {
    type Error = CassetteError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PhoneModel> for String {
    fn from(model: PhoneModel) -> Self {
        model.code().to_string()
    }
}

/// Physical addressing variant of a phone model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnsModel {
    FiveZone,
    FifteenZone,
    ElevenZone,
    ThirtyThreeZone,
    ThreeZone2A,
    TwentySixZone,
    ThreeZone3A,
    ThirtySixZone,
}

impl ColumnsModel {
    /// Variant used when compiling labels for `model`.
    pub fn for_phone(model: PhoneModel, has_zone_labels: bool) -> Self {
        match (model, has_zone_labels) {
            (PhoneModel::Phone1, false) => Self::FiveZone,
            (PhoneModel::Phone1, true) => Self::FifteenZone,
            (PhoneModel::Phone2, false) => Self::ElevenZone,
            (PhoneModel::Phone2, true) => Self::ThirtyThreeZone,
            (PhoneModel::Phone2A, false) => Self::ThreeZone2A,
            (PhoneModel::Phone2A, true) => Self::TwentySixZone,
            (PhoneModel::Phone3A, false) => Self::ThreeZone3A,
            (PhoneModel::Phone3A, true) => Self::ThirtySixZone,
        }
    }

    /// Canonical variant for a compiled matrix width.
    pub fn from_column_count(columns: usize) -> Result<Self> {
        match columns {
            5 => Ok(Self::FiveZone),
            15 => Ok(Self::FifteenZone),
            33 => Ok(Self::ThirtyThreeZone),
            26 => Ok(Self::TwentySixZone),
            36 => Ok(Self::ThirtySixZone),
            _ => Err(CassetteError::UnknownColumnCount { columns }),
        }
    }

    pub fn phone_model(&self) -> PhoneModel {
        match self {
            Self::FiveZone | Self::FifteenZone => PhoneModel::Phone1,
            Self::ElevenZone | Self::ThirtyThreeZone => PhoneModel::Phone2,
            Self::ThreeZone2A | Self::TwentySixZone => PhoneModel::Phone2A,
            Self::ThreeZone3A | Self::ThirtySixZone => PhoneModel::Phone3A,
        }
    }

    /// Number of physical columns in the compiled matrix.
    pub fn zone_count(&self) -> usize {
        match self {
            Self::FiveZone => 5,
            Self::FifteenZone => 15,
            Self::ElevenZone | Self::ThirtyThreeZone => 33,
            Self::ThreeZone2A | Self::TwentySixZone => 26,
            Self::ThreeZone3A | Self::ThirtySixZone => 36,
        }
    }

    /// Device codename written to the COMPOSER tag.
    pub fn codename(&self) -> &'static str {
        match self.phone_model() {
            PhoneModel::Phone1 => "Spacewar",
            PhoneModel::Phone2 => "Pong",
            PhoneModel::Phone2A => "Pacman",
            PhoneModel::Phone3A => "Asteroids",
        }
    }

    /// Column-count code written to the CUSTOM2 tag.
    pub fn cols_code(&self) -> &'static str {
        match self.phone_model() {
            PhoneModel::Phone1 => "5cols",
            PhoneModel::Phone2 => "33cols",
            PhoneModel::Phone2A => "26cols",
            PhoneModel::Phone3A => "36cols",
        }
    }
}

impl fmt::Display for ColumnsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({} columns)", self, self.zone_count())
    }
}

fn unaddressable(glyph: u32, zone: u32, columns: ColumnsModel) -> CassetteError {
    CassetteError::UnaddressableGlyph {
        glyph,
        zone,
        columns: columns.to_string(),
    }
}

fn span_at(table: &[Span], index: usize) -> Option<Vec<usize>> {
    table.get(index).map(|&(start, end)| (start..end).collect())
}

/// Physical array indices lit by `glyph` (1-based) and optional `zone`
/// (1-based, 0 for the whole glyph) on `columns`.
pub fn resolve(glyph: u32, zone: u32, columns: ColumnsModel) -> Result<Vec<usize>> {
    let model = columns.phone_model();
    if glyph == 0 || glyph > model.track_count() {
        return Err(unaddressable(glyph, zone, columns));
    }
    if zone != 0 {
        match model.zones_of(glyph) {
            Some(zones) if zone <= zones => {}
            _ => return Err(unaddressable(glyph, zone, columns)),
        }
    }

    let g = (glyph - 1) as usize;
    let z = zone as usize;

    let resolved = match columns {
        ColumnsModel::FiveZone => span_at(&tables::PHONE1_GLYPH_TO_5COL, g),
        ColumnsModel::FifteenZone => {
            if z == 0 {
                span_at(&tables::PHONE1_GLYPH_TO_15COL, g)
            } else {
                let offset = (if g > 2 { 3 } else { 0 }) + (if g > 3 { 7 } else { 0 });
                span_at(&tables::PHONE1_ZONE_TO_15COL, g + z - 1 + offset)
            }
        }
        ColumnsModel::ElevenZone => span_at(&tables::PHONE2_GLYPH_TO_33COL, g),
        ColumnsModel::ThirtyThreeZone => {
            if z == 0 {
                span_at(&tables::PHONE2_GLYPH_TO_33COL, g)
            } else {
                let offset = (if g > 3 { 15 } else { 0 }) + (if g > 9 { 7 } else { 0 });
                tables::phone2_zone_to_33col(g + z - 1 + offset).map(|i| vec![i])
            }
        }
        ColumnsModel::ThreeZone2A => span_at(&tables::PHONE2A_GLYPH_TO_26COL, g),
        ColumnsModel::TwentySixZone => {
            if z == 0 {
                span_at(&tables::PHONE2A_GLYPH_TO_26COL, g)
            } else {
                let offset = if g > 0 { 23 } else { 0 };
                tables::phone2a_zone_to_26col(g + z - 1 + offset).map(|i| vec![i])
            }
        }
        ColumnsModel::ThreeZone3A => span_at(&tables::PHONE3A_GLYPH_TO_36COL, g),
        ColumnsModel::ThirtySixZone => {
            if z == 0 {
                span_at(&tables::PHONE3A_GLYPH_TO_36COL, g)
            } else {
                let offset = (if g > 0 { 19 } else { 0 }) + (if g > 1 { 10 } else { 0 });
                tables::phone3a_zone_to_36col(g + z - 1 + offset).map(|i| vec![i])
            }
        }
    };

    resolved.ok_or_else(|| unaddressable(glyph, zone, columns))
}

/// Number of physical columns of `columns`.
pub fn zone_count(columns: ColumnsModel) -> usize {
    columns.zone_count()
}

/// Canonical five-column id of `glyph` used by the CUSTOM1 channel.
pub fn canonical_5col_id(glyph: u32, columns: ColumnsModel) -> Result<usize> {
    let g = glyph.checked_sub(1).map(|g| g as usize);
    let id = g.and_then(|g| match columns.phone_model() {
        PhoneModel::Phone1 => tables::PHONE1_GLYPH_TO_5COL.get(g).map(|span| span.0),
        PhoneModel::Phone2 => tables::PHONE2_GLYPH_TO_5COL.get(g).copied(),
        PhoneModel::Phone2A => tables::PHONE2A_GLYPH_TO_5COL.get(g).copied(),
        PhoneModel::Phone3A => tables::PHONE3A_GLYPH_TO_5COL.get(g).copied(),
    });
    id.ok_or_else(|| unaddressable(glyph, 0, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("PHONE2A", PhoneModel::Phone2A ; "code")]
    #[test_case("Phone (3a)", PhoneModel::Phone3A ; "display name")]
    #[test_case("1", PhoneModel::Phone1 ; "number")]
    #[test_case("phone2", PhoneModel::Phone2 ; "lowercase code")]
    fn test_parse_phone_model(input: &str, expected: PhoneModel) {
        assert_eq!(input.parse::<PhoneModel>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_phone_model() {
        assert!("PHONE9".parse::<PhoneModel>().is_err());
    }

    #[test]
    fn test_product_codes() {
        assert_eq!(PhoneModel::from_product_code("A142P"), Some(PhoneModel::Phone2A));
        assert_eq!(PhoneModel::from_product_code("A059\n"), Some(PhoneModel::Phone3A));
        assert_eq!(PhoneModel::from_product_code("Pixel 8"), None);
    }

    #[test_case(1, 0, ColumnsModel::FiveZone, vec![0])]
    #[test_case(3, 0, ColumnsModel::FifteenZone, vec![2, 3, 4, 5])]
    #[test_case(3, 1, ColumnsModel::FifteenZone, vec![4])]
    #[test_case(4, 1, ColumnsModel::FifteenZone, vec![14])]
    #[test_case(4, 8, ColumnsModel::FifteenZone, vec![7])]
    #[test_case(5, 0, ColumnsModel::FifteenZone, vec![6])]
    #[test_case(4, 16, ColumnsModel::ThirtyThreeZone, vec![18])]
    #[test_case(10, 1, ColumnsModel::ThirtyThreeZone, vec![32])]
    #[test_case(11, 0, ColumnsModel::ElevenZone, vec![24])]
    #[test_case(1, 1, ColumnsModel::TwentySixZone, vec![23])]
    #[test_case(1, 24, ColumnsModel::TwentySixZone, vec![0])]
    #[test_case(3, 0, ColumnsModel::ThreeZone2A, vec![25])]
    #[test_case(2, 1, ColumnsModel::ThirtySixZone, vec![20])]
    #[test_case(3, 5, ColumnsModel::ThirtySixZone, vec![35])]
    fn test_resolve(glyph: u32, zone: u32, columns: ColumnsModel, expected: Vec<usize>) {
        assert_eq!(resolve(glyph, zone, columns).unwrap(), expected);
    }

    #[test]
    fn test_resolve_whole_segmented_glyph() {
        let indices = resolve(4, 0, ColumnsModel::ElevenZone).unwrap();
        assert_eq!(indices, (3..19).collect::<Vec<_>>());

        let indices = resolve(1, 0, ColumnsModel::ThreeZone2A).unwrap();
        assert_eq!(indices.len(), 24);
    }

    #[test]
    fn test_resolve_rejects_out_of_range() {
        assert!(resolve(6, 0, ColumnsModel::FiveZone).is_err());
        assert!(resolve(0, 0, ColumnsModel::FiveZone).is_err());
        assert!(resolve(2, 1, ColumnsModel::FifteenZone).is_err());
        assert!(resolve(3, 5, ColumnsModel::FifteenZone).is_err());
        assert!(resolve(1, 25, ColumnsModel::TwentySixZone).is_err());
    }

    #[test]
    fn test_every_addressable_zone_is_in_bounds() {
        for columns in [
            ColumnsModel::FifteenZone,
            ColumnsModel::ThirtyThreeZone,
            ColumnsModel::TwentySixZone,
            ColumnsModel::ThirtySixZone,
        ] {
            let model = columns.phone_model();
            for glyph in 1..=model.track_count() {
                for index in resolve(glyph, 0, columns).unwrap() {
                    assert!(index < columns.zone_count());
                }
                for zone in 1..=model.zones_of(glyph).unwrap_or(0) {
                    let indices = resolve(glyph, zone, columns).unwrap();
                    assert_eq!(indices.len(), 1);
                    assert!(indices[0] < columns.zone_count());
                }
            }
        }
    }

    #[test]
    fn test_canonical_ids() {
        assert_eq!(canonical_5col_id(2, ColumnsModel::ThirtyThreeZone).unwrap(), 0);
        assert_eq!(canonical_5col_id(11, ColumnsModel::ElevenZone).unwrap(), 4);
        assert_eq!(canonical_5col_id(3, ColumnsModel::ThirtySixZone).unwrap(), 2);
        assert!(canonical_5col_id(4, ColumnsModel::ThreeZone2A).is_err());
    }

    #[test]
    fn test_column_counts_round_trip_through_width() {
        for width in [5, 15, 33, 26, 36] {
            let columns = ColumnsModel::from_column_count(width).unwrap();
            assert_eq!(columns.zone_count(), width);
        }
        assert!(ColumnsModel::from_column_count(11).is_err());
    }

    #[test]
    fn test_segment_counts() {
        assert_eq!(PhoneModel::Phone2.segment_count("10"), Some(8));
        assert_eq!(PhoneModel::Phone2.segment_count("3"), None);
        assert_eq!(PhoneModel::Phone3A.segment_count("2"), Some(11));
    }
}
