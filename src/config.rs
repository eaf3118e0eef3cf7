//! Runtime configuration
//!
//! Defaults can be overridden with `CASSETTE_*` environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Default TCP port of the on-device glyph receiver.
pub const DEFAULT_BRIDGE_PORT: u16 = 7777;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CassetteConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub adb_path: String,
    pub bridge_host: String,
    pub bridge_port: u16,
    pub probe_interval_ms: u64,
    pub handshake_attempts: u32,
    pub handshake_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub pong_timeout_ms: u64,
    /// Seed for every random source; entropy when unset.
    pub rng_seed: Option<u64>,
}

impl Default for CassetteConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            adb_path: "adb".to_string(),
            bridge_host: "127.0.0.1".to_string(),
            bridge_port: DEFAULT_BRIDGE_PORT,
            probe_interval_ms: 3000,
            handshake_attempts: 10,
            handshake_delay_ms: 1000,
            connect_timeout_ms: 1000,
            pong_timeout_ms: 2000,
            rng_seed: None,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl CassetteConfig {
    /// Defaults overridden by the environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ffmpeg_path: env_or("CASSETTE_FFMPEG_PATH", defaults.ffmpeg_path),
            ffprobe_path: env_or("CASSETTE_FFPROBE_PATH", defaults.ffprobe_path),
            adb_path: env_or("CASSETTE_ADB_PATH", defaults.adb_path),
            bridge_host: env_or("CASSETTE_BRIDGE_HOST", defaults.bridge_host),
            bridge_port: env_or("CASSETTE_BRIDGE_PORT", defaults.bridge_port),
            probe_interval_ms: env_or("CASSETTE_PROBE_INTERVAL_MS", defaults.probe_interval_ms),
            handshake_attempts: env_or("CASSETTE_HANDSHAKE_ATTEMPTS", defaults.handshake_attempts),
            handshake_delay_ms: env_or("CASSETTE_HANDSHAKE_DELAY_MS", defaults.handshake_delay_ms),
            connect_timeout_ms: defaults.connect_timeout_ms,
            pong_timeout_ms: defaults.pong_timeout_ms,
            rng_seed: env::var("CASSETTE_RNG_SEED")
                .ok()
                .and_then(|s| s.trim().parse().ok()),
        }
    }

    pub fn bridge_addr(&self) -> String {
        format!("{}:{}", self.bridge_host, self.bridge_port)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn handshake_delay(&self) -> Duration {
        Duration::from_millis(self.handshake_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }

    /// Random source for effects and porting.
    pub fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults() {
        let config = CassetteConfig::default();
        assert_eq!(config.bridge_addr(), "127.0.0.1:7777");
        assert_eq!(config.handshake_attempts, 10);
        assert_eq!(config.pong_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = CassetteConfig {
            rng_seed: Some(42),
            ..Default::default()
        };
        let a: u64 = config.rng().gen();
        let b: u64 = config.rng().gen();
        assert_eq!(a, b);
    }

    #[test]
    fn test_partial_json() {
        let config: CassetteConfig = serde_json::from_str(r#"{"bridge_port": 9000}"#).unwrap();
        assert_eq!(config.bridge_port, 9000);
        assert_eq!(config.ffmpeg_path, "ffmpeg");
    }
}
