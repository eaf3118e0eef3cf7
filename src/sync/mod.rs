//! Device Sync Protocol
//!
//! Streams composition changes to an attached phone for live preview:
//! newline-delimited JSON frames over a forwarded TCP port, a single-writer
//! connection actor, and a background probe that notices attached devices.

pub mod bridge;
pub mod connection;
pub mod protocol;
pub mod syncer;

pub use bridge::{AdbBridge, DeviceBridge};
pub use connection::{Connection, ConnectionConfig, ConnectionState};
pub use protocol::{diff, Frame, SyncDiff, WireGlyph};
pub use syncer::{scan_devices, DeviceProbe, GlyphSyncer};
