//! CLI Module
//!
//! Command-line interface for compiling, tagging, exporting and porting
//! glyph compositions, and previewing them on an attached phone.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cassette - glyph composition compiler
#[derive(Parser, Debug)]
#[command(name = "cassette")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a label file into a .cassette document
    Compile {
        /// Label file
        labels: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Protect the light data with this watermark text
        #[arg(long)]
        watermark: Option<String>,
    },

    /// Write a .cassette document into the tags of an audio file
    Tag {
        /// Audio file
        audio: PathBuf,

        /// Cassette document
        cassette: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Title tag, also used as the output file name
        #[arg(long, default_value = "Composed_withCassette")]
        title: String,
    },

    /// Export a composition over its audio
    Export {
        /// Composition save file
        composition: PathBuf,

        /// Cropped audio of the composition
        audio: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Protect the light data with this watermark text
        #[arg(long)]
        watermark: Option<String>,
    },

    /// Port a composition to another phone model and export it
    Port {
        /// Composition save file
        composition: PathBuf,

        /// Cropped audio of the composition
        audio: PathBuf,

        /// Destination model (PHONE2, "Phone (2)" or 2)
        #[arg(long)]
        to: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Protect the light data with this watermark text
        #[arg(long)]
        watermark: Option<String>,
    },

    /// Show what a .cassette document contains
    Inspect {
        /// Cassette document
        cassette: PathBuf,
    },

    /// List the effects the editor offers
    Effects {
        /// Phone model
        #[arg(long)]
        model: Option<String>,

        /// Track, only with --model
        #[arg(long, requires = "model")]
        track: Option<String>,
    },

    /// Play a composition on an attached phone
    Preview {
        /// Composition save file
        composition: PathBuf,

        /// Start position in milliseconds
        #[arg(long, default_value_t = 0)]
        from_ms: u64,

        /// Seconds to wait for a phone
        #[arg(long, default_value_t = 30)]
        wait: u64,
    },
}
