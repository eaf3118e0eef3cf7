//! Cassette - Glyph Composition Compiler
//!
//! Turns a timeline of glyph light events into the brightness data phones
//! with a glyph interface play back from ringtone metadata.
//!
//! # Architecture
//!
//! - `topology`: static addressing tables of every supported light array
//! - `effects`: expansion of declarative effects into concrete segments
//! - `raster`: label files compiled into the fixed-step AUTHOR matrix
//! - `codec`: the `.cassette` document, watermark encryption, audio tags
//! - `porter`: re-targeting compositions to another phone model
//! - `sync`: live preview on an attached phone

pub mod cli;
pub mod codec;
pub mod composition;
pub mod config;
pub mod effects;
pub mod error;
pub mod porter;
pub mod raster;
pub mod sync;
pub mod topology;

pub use config::CassetteConfig;
pub use error::{CassetteError, Result};
pub use topology::{ColumnsModel, PhoneModel};
