//! Effects that animate a whole track over time

use super::params::{BpmParams, SoftStrobeParams, StrobeParams};
use super::segment::Segment;
use super::{positive_interval, Span};
use crate::error::Result;

pub fn fade_in(span: &Span) -> Vec<Segment> {
    vec![Segment::new(span.start, span.duration, span.track, 0).fading_to(span.brightness)]
}

pub fn fade_out(span: &Span) -> Vec<Segment> {
    vec![Segment::new(span.start, span.duration, span.track, span.brightness).fading_to(0)]
}

/// Ramp up over the first half, down over the second. Both halves use the
/// truncated half duration.
pub fn fade_in_out(span: &Span) -> Vec<Segment> {
    let half = (span.duration / 2.0).trunc();
    let mid = span.start + span.duration / 2.0;
    vec![
        Segment::new(span.start, half, span.track, 0).fading_to(span.brightness),
        Segment::new(mid, half, span.track, span.brightness).fading_to(0),
    ]
}

/// On for the first half of every interval.
pub fn strobe(span: &Span, params: &StrobeParams) -> Result<Vec<Segment>> {
    let interval = positive_interval("Strobe", params.frequency)?;
    let mut out = Vec::new();
    let mut t = span.start;
    while t < span.end {
        let t_off = (t + interval / 2.0).min(span.end);
        out.push(Segment::new(t, t_off - t, span.track, span.brightness));
        t += interval;
    }
    Ok(out)
}

/// Alternate between two brightness levels instead of switching off.
pub fn soft_strobe(span: &Span, params: &SoftStrobeParams, bpm: f64) -> Result<Vec<Segment>> {
    let frequency = match params.bpm_snap {
        Some(snap) => bpm / 60.0 * snap,
        None => params.frequency,
    };
    let interval = positive_interval("Soft Strobe", frequency)?;

    let mut out = Vec::new();
    let mut t = span.start;
    while t < span.end {
        let t_off = (t + interval / 2.0).min(span.end);
        let duration = t_off - t;
        out.push(Segment::new(t, duration, span.track, params.first_brightness));
        out.push(Segment::new(t_off, duration, span.track, params.second_brightness));
        t += interval;
    }
    Ok(out)
}

/// A fade-out pulse on every beat.
pub fn bpm_pulse(span: &Span, params: &BpmParams, bpm: f64) -> Result<Vec<Segment>> {
    let beat = positive_interval("BPM", bpm * params.multiplier / 60.0)?;

    let mut out = Vec::new();
    let mut t = span.start;
    while t < span.end {
        let t_off = (t + beat / 2.0).min(span.end);
        out.push(Segment::new(t, t_off - t, span.track, span.brightness).fading_to(0));
        t += beat;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn span(track: &str) -> Span<'_> {
        Span {
            track,
            segments: 0,
            start: 200.0,
            end: 2200.0,
            duration: 2000.0,
            brightness: 100,
        }
    }

    #[test]
    fn test_fade_in_out_halves() {
        let out = fade_in_out(&span("2"));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].brightness, 0);
        assert_eq!(out[0].end_brightness, Some(100));
        assert_relative_eq!(out[1].start_ms, 1200.0);
        assert_relative_eq!(out[1].duration_ms, 1000.0);
        assert_eq!(out[1].end_brightness, Some(0));
    }

    #[test]
    fn test_strobe_windows() {
        let out = strobe(&span("2"), &StrobeParams { frequency: 2.0 }).unwrap();
        assert_eq!(out.len(), 4);
        for (i, seg) in out.iter().enumerate() {
            assert_relative_eq!(seg.start_ms, 200.0 + 500.0 * i as f64);
            assert_relative_eq!(seg.duration_ms, 250.0);
        }
    }

    #[test]
    fn test_strobe_rejects_zero_frequency() {
        assert!(strobe(&span("2"), &StrobeParams { frequency: 0.0 }).is_err());
    }

    #[test]
    fn test_soft_strobe_snaps_to_bpm() {
        let params = SoftStrobeParams {
            frequency: 10.0,
            first_brightness: 100,
            second_brightness: 40,
            bpm_snap: Some(1.0),
        };
        // 120 BPM snapped at x1 is 2 strobes per second.
        let out = soft_strobe(&span("1"), &params, 120.0).unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(out[0].brightness, 100);
        assert_eq!(out[1].brightness, 40);
        assert_relative_eq!(out[1].start_ms, 450.0);
    }

    #[test]
    fn test_bpm_pulses_fade_out() {
        let out = bpm_pulse(&span("3"), &BpmParams { multiplier: 2.0 }, 60.0).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|s| s.end_brightness == Some(0)));
        assert_relative_eq!(out[1].start_ms, 700.0);
        assert_relative_eq!(out[1].duration_ms, 250.0);
    }
}
