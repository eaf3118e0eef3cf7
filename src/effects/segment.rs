//! Concrete light segments produced by effect expansion

use serde::{Deserialize, Serialize};

use crate::raster::label::format_label_line;

/// One concrete light event on a single (sub-)track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "start")]
    pub start_ms: f64,
    #[serde(rename = "duration")]
    pub duration_ms: f64,
    pub track: String,
    pub brightness: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_brightness: Option<u8>,
}

impl Segment {
    pub fn new(start_ms: f64, duration_ms: f64, track: impl Into<String>, brightness: u8) -> Self {
        Self {
            start_ms,
            duration_ms,
            track: track.into(),
            brightness,
            end_brightness: None,
        }
    }

    /// Ramp linearly from `brightness` to `end` over the segment.
    pub fn fading_to(mut self, end: u8) -> Self {
        self.end_brightness = Some(end);
        self
    }

    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    /// Render as a label line: `<t0>\t<t1>\t<track>-<b>[-<b2>]-LIN`.
    pub fn to_label_line(&self) -> String {
        let text = match self.end_brightness {
            Some(end) => format!("{}-{}-{}-LIN", self.track, self.brightness, end),
            None => format!("{}-{}-LIN", self.track, self.brightness),
        };
        format_label_line(self.start_ms / 1000.0, self.end_ms() / 1000.0, &text)
    }
}

/// Render a list of segments as label lines.
pub fn to_label_lines(segments: &[Segment]) -> Vec<String> {
    segments.iter().map(Segment::to_label_line).collect()
}
