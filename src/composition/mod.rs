//! Glyph timeline data model
//!
//! Glyphs and their effect descriptors, the editor's composition file, the
//! export pipeline and the live glyph repository.

pub mod export;
pub mod glyph;
pub mod project;
pub mod store;

pub use export::{export_composition, export_label_document, COMPOSED_TITLE};
pub use glyph::{parse_track, EffectDescriptor, Glyph};
pub use project::{AudioInfo, Composition};
pub use store::{GlyphStore, SyncSink};
