//! Error handling for Cassette
//!
//! Every fallible operation in the crate returns [`CassetteError`]. The
//! variants fall into five families: validation, topology, codec, porting
//! and protocol. Only protocol errors are recovered locally.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Cassette operations
pub type Result<T> = std::result::Result<T, CassetteError>;

/// Main error type for Cassette operations
#[derive(Error, Debug)]
pub enum CassetteError {
    // Validation Errors
    #[error("Invalid label in line {line}: '{text}' does not match the {model} grammar")]
    LabelGrammar {
        line: usize,
        text: String,
        model: String,
    },

    #[error("Invalid label file format in line {line}: {reason}")]
    MalformedLabel { line: usize, reason: String },

    #[error("Label file has no END label")]
    MissingEndLabel,

    #[error("Label file has more than one END label (second one in line {line})")]
    DuplicateEndLabel { line: usize },

    #[error("Label file has no PHONE_MODEL label")]
    MissingPhoneModel,

    #[error("Label file has no LABEL_VERSION label")]
    MissingLabelVersion,

    #[error("Unsupported label version: {version}")]
    UnsupportedLabelVersion { version: u32 },

    #[error("Unsupported light mode '{mode}' in line {line}")]
    UnsupportedLightMode { line: usize, mode: String },

    #[error("AUTHOR data has different number of columns in line {row} ({found} instead of {expected})")]
    RaggedAuthorData {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("CUSTOM1 data has an invalid entry: '{entry}'")]
    InvalidCustom1 { entry: String },

    #[error("Invalid salt: expected 16 bytes, got {len}")]
    InvalidSalt { len: usize },

    #[error("Invalid glyph: {reason}")]
    InvalidGlyph { reason: String },

    #[error("Invalid setting for effect '{effect}': {reason}")]
    InvalidEffectSetting { effect: String, reason: String },

    // Topology Errors
    #[error("Unknown phone model: {model}")]
    UnknownPhoneModel { model: String },

    #[error("No columns model has {columns} columns")]
    UnknownColumnCount { columns: usize },

    #[error("Glyph {glyph} zone {zone} is not addressable on {columns}")]
    UnaddressableGlyph {
        glyph: u32,
        zone: u32,
        columns: String,
    },

    #[error("Track '{track}' has no segment data on {model} (segmented effect '{effect}')")]
    MissingSegments {
        track: String,
        model: String,
        effect: String,
    },

    // Codec Errors
    #[error("{tool} failed: {stderr}")]
    ExternalTool { tool: String, stderr: String },

    #[error("Failed to decrypt AUTHOR data: {reason}")]
    Decryption { reason: String },

    #[error("Malformed cassette document: {reason}")]
    MalformedDocument { reason: String },

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    // Porting Errors
    #[error("Porting from {from} to {to} is not supported")]
    UnsupportedPort { from: String, to: String },

    #[error("Track '{track}' has no counterpart when porting from {from} to {to}")]
    UnmappedTrack {
        track: String,
        from: String,
        to: String,
    },

    // Protocol Errors
    #[error("Device connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Device handshake failed after {attempts} attempts")]
    HandshakeFailed { attempts: u32 },

    #[error("Failed to send frame to device: {reason}")]
    SendFailed { reason: String },

    #[error("Device bridge unavailable")]
    BridgeClosed,

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CassetteError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            CassetteError::LabelGrammar { .. } => "LABEL_GRAMMAR",
            CassetteError::MalformedLabel { .. } => "MALFORMED_LABEL",
            CassetteError::MissingEndLabel => "MISSING_END_LABEL",
            CassetteError::DuplicateEndLabel { .. } => "DUPLICATE_END_LABEL",
            CassetteError::MissingPhoneModel => "MISSING_PHONE_MODEL",
            CassetteError::MissingLabelVersion => "MISSING_LABEL_VERSION",
            CassetteError::UnsupportedLabelVersion { .. } => "UNSUPPORTED_LABEL_VERSION",
            CassetteError::UnsupportedLightMode { .. } => "UNSUPPORTED_LIGHT_MODE",
            CassetteError::RaggedAuthorData { .. } => "RAGGED_AUTHOR_DATA",
            CassetteError::InvalidCustom1 { .. } => "INVALID_CUSTOM1",
            CassetteError::InvalidSalt { .. } => "INVALID_SALT",
            CassetteError::InvalidGlyph { .. } => "INVALID_GLYPH",
            CassetteError::InvalidEffectSetting { .. } => "INVALID_EFFECT_SETTING",
            CassetteError::UnknownPhoneModel { .. } => "UNKNOWN_PHONE_MODEL",
            CassetteError::UnknownColumnCount { .. } => "UNKNOWN_COLUMN_COUNT",
            CassetteError::UnaddressableGlyph { .. } => "UNADDRESSABLE_GLYPH",
            CassetteError::MissingSegments { .. } => "MISSING_SEGMENTS",
            CassetteError::ExternalTool { .. } => "EXTERNAL_TOOL",
            CassetteError::Decryption { .. } => "DECRYPTION",
            CassetteError::MalformedDocument { .. } => "MALFORMED_DOCUMENT",
            CassetteError::Base64(_) => "BASE64",
            CassetteError::UnsupportedPort { .. } => "UNSUPPORTED_PORT",
            CassetteError::UnmappedTrack { .. } => "UNMAPPED_TRACK",
            CassetteError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            CassetteError::HandshakeFailed { .. } => "HANDSHAKE_FAILED",
            CassetteError::SendFailed { .. } => "SEND_FAILED",
            CassetteError::BridgeClosed => "BRIDGE_CLOSED",
            CassetteError::FileNotFound { .. } => "FILE_NOT_FOUND",
            CassetteError::Io(_) => "IO_ERROR",
            CassetteError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recovered locally rather than aborting the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CassetteError::ConnectionFailed { .. }
                | CassetteError::HandshakeFailed { .. }
                | CassetteError::SendFailed { .. }
        )
    }

    /// Check if this error indicates a broken label file
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CassetteError::LabelGrammar { .. }
                | CassetteError::MalformedLabel { .. }
                | CassetteError::MissingEndLabel
                | CassetteError::DuplicateEndLabel { .. }
                | CassetteError::MissingPhoneModel
                | CassetteError::MissingLabelVersion
                | CassetteError::UnsupportedLabelVersion { .. }
                | CassetteError::UnsupportedLightMode { .. }
                | CassetteError::RaggedAuthorData { .. }
                | CassetteError::InvalidCustom1 { .. }
                | CassetteError::InvalidSalt { .. }
                | CassetteError::InvalidGlyph { .. }
                | CassetteError::InvalidEffectSetting { .. }
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            CassetteError::LabelGrammar { .. } => {
                Some("Make sure that you used the right phone model for these labels.")
            }
            CassetteError::MissingEndLabel => {
                Some("Add an END label whose end time marks the length of the composition.")
            }
            CassetteError::MissingPhoneModel => {
                Some("Add a 'PHONE_MODEL=<CODE>' label, e.g. PHONE_MODEL=PHONE2A.")
            }
            CassetteError::InvalidSalt { .. } => {
                Some("The cassette file was modified; re-export it from the composition.")
            }
            CassetteError::ExternalTool { .. } => {
                Some("Check that ffmpeg and ffprobe are installed and on the PATH.")
            }
            CassetteError::UnmappedTrack { .. } => {
                Some("Move the glyph to a track that exists on both models and try again.")
            }
            CassetteError::HandshakeFailed { .. } | CassetteError::ConnectionFailed { .. } => {
                Some("Reconnect the phone and make sure USB debugging is enabled.")
            }
            CassetteError::FileNotFound { .. } => Some("Check the file path and try again."),
            _ => None,
        }
    }
}
