//! Physical addressing tables
//!
//! Index tables are stored as half-open `(start, end)` ranges of physical
//! array columns. A glyph-level table is indexed by `glyph - 1`; a zone-level
//! table by `glyph - 1 + zone - 1 + offset`, with the offset depending on the
//! glyph (see `topology::resolve`).

/// Half-open range of physical columns.
pub type Span = (usize, usize);

const fn one(i: usize) -> Span {
    (i, i + 1)
}

// Phone (1)
pub const PHONE1_GLYPH_TO_5COL: [Span; 5] = [one(0), one(1), one(2), one(3), one(4)];
pub const PHONE1_GLYPH_TO_15COL: [Span; 5] = [one(0), one(1), (2, 6), (7, 15), one(6)];
pub const PHONE1_ZONE_TO_15COL: [Span; 15] = [
    one(0),
    one(1),
    one(4),
    one(5),
    one(2),
    one(3),
    one(14),
    one(13),
    one(12),
    one(11),
    one(10),
    one(9),
    one(8),
    one(7),
    one(6),
];

// Phone (2)
pub const PHONE2_GLYPH_TO_5COL: [usize; 11] = [0, 0, 1, 2, 2, 2, 2, 2, 2, 3, 4];
pub const PHONE2_GLYPH_TO_33COL: [Span; 11] = [
    one(0),
    one(1),
    one(2),
    (3, 19),
    one(19),
    one(20),
    one(21),
    one(22),
    one(23),
    (25, 33),
    one(24),
];

/// Zones 1..=24 map straight through; the last eight run backwards.
pub fn phone2_zone_to_33col(index: usize) -> Option<usize> {
    match index {
        0..=23 => Some(index),
        24..=32 => Some(32 - (index - 24)),
        _ => None,
    }
}

// Phone (2a)
pub const PHONE2A_GLYPH_TO_5COL: [usize; 3] = [0, 1, 2];
pub const PHONE2A_GLYPH_TO_26COL: [Span; 3] = [(0, 24), one(24), one(25)];

/// The 24 zones of the main ring are wired in reverse order.
pub fn phone2a_zone_to_26col(index: usize) -> Option<usize> {
    match index {
        0..=23 => Some(23 - index),
        24 | 25 => Some(index),
        _ => None,
    }
}

// Phone (3a)
pub const PHONE3A_GLYPH_TO_5COL: [usize; 3] = [0, 1, 2];
pub const PHONE3A_GLYPH_TO_36COL: [Span; 3] = [(0, 20), (20, 31), (31, 36)];

pub fn phone3a_zone_to_36col(index: usize) -> Option<usize> {
    (index < 36).then_some(index)
}

/// Glyphs that expose addressable zones, as `(glyph, zone count)`.
pub const PHONE1_ZONED_GLYPHS: &[(u32, u32)] = &[(3, 4), (4, 8)];
pub const PHONE2_ZONED_GLYPHS: &[(u32, u32)] = &[(4, 16), (10, 8)];
pub const PHONE2A_ZONED_GLYPHS: &[(u32, u32)] = &[(1, 24)];
pub const PHONE3A_ZONED_GLYPHS: &[(u32, u32)] = &[(1, 20), (2, 11), (3, 5)];

/// Tracks that segmented effects can animate, as `(track, segment count)`.
pub const PHONE1_SEGMENTED_TRACKS: &[(&str, u32)] = &[("4", 8)];
pub const PHONE2_SEGMENTED_TRACKS: &[(&str, u32)] = &[("4", 16), ("10", 8)];
pub const PHONE2A_SEGMENTED_TRACKS: &[(&str, u32)] = &[("1", 24)];
pub const PHONE3A_SEGMENTED_TRACKS: &[(&str, u32)] = &[("1", 20), ("2", 11), ("3", 5)];

/// Hardware product codes reported by `ro.product.model`.
pub const PRODUCT_CODES: &[(&str, &str)] = &[
    ("A063", "PHONE1"),
    ("A065", "PHONE2"),
    ("AIN065", "PHONE2"),
    ("A142", "PHONE2A"),
    ("A142P", "PHONE2A"),
    ("A059", "PHONE3A"),
    ("A059P", "PHONE3A"),
];
