//! Container Codec
//!
//! The `.cassette` document, its AUTHOR/CUSTOM1 channels, watermark
//! encryption and the audio tags the channels end up in.

pub mod author;
pub mod document;
pub mod tagging;
pub mod watermark;

pub use author::{AuthorData, Custom1Data};
pub use document::{CassetteDocument, DecodedCassette};
pub use tagging::{read_tags, tag_audio, AudioProbe, FFmpeg};
pub use watermark::{Watermark, WatermarkKey};
