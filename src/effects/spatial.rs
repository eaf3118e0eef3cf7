//! Effects that animate the sub-zones of a segmented track

use rand::Rng;

use super::params::{
    BoomerangParams, FillParams, GlitchParams, ShockerParams, Side, SidebeatParams, SidebeatPart,
    SweepParams, ZebraParams,
};
use super::segment::Segment;
use super::{level, positive_interval, Span};
use crate::error::Result;

fn zone(track: &str, index: i64) -> String {
    format!("{}.{}", track, index)
}

/// Light segments one after another; every segment stays on until the end.
pub fn fill(span: &Span, params: &FillParams) -> Vec<Segment> {
    let segs = span.segments as usize;
    let step = span.duration / segs as f64;
    let indices: Vec<usize> = match params.side {
        Side::Right => (0..segs).collect(),
        Side::Left => (0..segs).rev().collect(),
    };

    indices
        .into_iter()
        .map(|i| {
            let start = span.start + i as f64 * step;
            Segment::new(start, span.end - start, zone(span.track, i as i64 + 1), span.brightness)
        })
        .collect()
}

/// Run a single lit segment from the last one to the first and back.
pub fn sweep(span: &Span, params: &SweepParams) -> Vec<Segment> {
    let segs = span.segments as i64;
    let mut order: Vec<i64> = (1..=segs).rev().chain(2..=segs).collect();
    if params.side == Side::Left {
        order.reverse();
    }

    let step = span.duration / order.len() as f64;
    order
        .into_iter()
        .enumerate()
        .map(|(i, seg)| {
            Segment::new(span.start + i as f64 * step, step, zone(span.track, seg), span.brightness)
        })
        .collect()
}

/// Lit blocks at the ends of the track that shrink towards the middle of
/// the time span.
pub fn sidebeat(span: &Span, params: &SidebeatParams) -> Vec<Segment> {
    let segs = span.segments as i64;
    let per_part = segs / 3;
    if per_part == 0 {
        return Vec::new();
    }
    let time_per_segment = span.duration / per_part as f64 / 2.0;

    let bases: &[i64] = match params.part {
        SidebeatPart::Left => &[1],
        SidebeatPart::Right => &[segs],
        SidebeatPart::Both => &[1, segs],
    };

    let mut out = Vec::new();
    for &base in bases {
        let direction = if base == 1 { 1 } else { -1 };
        for i in 0..per_part {
            let shrink = time_per_segment * i as f64;
            out.push(Segment::new(
                span.start + shrink,
                span.duration - 2.0 * shrink,
                zone(span.track, base + i * direction),
                100,
            ));
        }
    }
    out
}

/// Repeating lit/dark stripes that shift by one segment per step.
pub fn zebra(span: &Span, params: &ZebraParams, bpm: f64) -> Result<Vec<Segment>> {
    let fps = match params.bpm_snap {
        Some(snap) => bpm / 60.0 * snap,
        None => params.fps,
    };
    let step_duration = positive_interval("Zebra", fps)?;
    let pattern_len = i64::from(params.on_count + params.off_count).max(1);
    let total_steps = ((span.duration / step_duration) as i64).max(1);

    let mut out = Vec::new();
    for step in 0..total_steps {
        let t0 = span.start + step as f64 * step_duration;
        let t1 = (t0 + step_duration).min(span.end);

        for i in 0..span.segments as i64 {
            let shifted = (i - step * params.side.sign()).rem_euclid(pattern_len);
            if shifted < i64::from(params.on_count) {
                out.push(Segment::new(t0, t1 - t0, zone(span.track, i + 1), span.brightness));
            }
        }
    }
    Ok(out)
}

/// Even segments flash in the first half of every interval, odd ones in
/// the second.
pub fn shocker(span: &Span, params: &ShockerParams, bpm: f64) -> Result<Vec<Segment>> {
    let frequency = match params.bpm_snap {
        Some(snap) => bpm / 60.0 * snap,
        None => params.frequency,
    };
    let interval = positive_interval("Shocker", frequency)?;
    let segs = span.segments as i64;

    let flash = |start: f64, duration: f64, seg: i64| {
        let segment = Segment::new(start, duration, zone(span.track, seg), span.brightness);
        if params.fade_out {
            segment.fading_to(0)
        } else {
            segment
        }
    };

    let mut out = Vec::new();
    let mut t = span.start;
    while t < span.end {
        let t_half = (t + interval / 2.0).min(span.end);
        let t_next = (t + interval).min(span.end);

        for seg in (1..=segs).filter(|s| s % 2 == 0) {
            out.push(flash(t, t_half - t, seg));
        }
        for seg in (1..=segs).filter(|s| s % 2 == 1) {
            out.push(flash(t_half, t_next - t_half, seg));
        }

        t = t_next;
    }
    Ok(out)
}

/// Random segments at random brightness, frame by frame.
pub fn glitch<R: Rng + ?Sized>(
    span: &Span,
    params: &GlitchParams,
    bpm: f64,
    rng: &mut R,
) -> Result<Vec<Segment>> {
    let fps = match params.bpm_snap {
        Some(snap) => bpm / 60.0 * snap,
        None => params.fps,
    };
    let frame = positive_interval("Glitch", fps)?;
    let ratio = params.min_brightness_ratio / 100.0;
    let head = i64::from(span.brightness);
    let min_br = 5.max((head as f64 * ratio) as i64);
    let max_br = head.max(min_br);

    let mut out = Vec::new();
    let mut t = span.start;
    while t < span.end - 1e-9 {
        let t1 = (t + frame).min(span.end);

        for seg in 1..=span.segments as i64 {
            if rng.gen::<f64>() < params.duty_cycle {
                let brightness = rng.gen_range(min_br..=max_br);
                out.push(Segment::new(t, t1 - t, zone(span.track, seg), level(brightness)));
            }
        }

        t = t1;
    }
    Ok(out)
}

fn tail_brightness(head: i64, position: i64, length: i64) -> i64 {
    if position == 0 || length <= 1 {
        return head;
    }
    let min_br = 5.max((head as f64 * 0.2) as i64);
    let span = (head - min_br) as f64;
    min_br.max((head as f64 - span * (position as f64 / (length - 1) as f64)) as i64)
}

/// A head with a fading tail that bounces between the track ends; the tail
/// grows on every bounce until it covers the whole track.
pub fn boomerang(span: &Span, params: &BoomerangParams) -> Vec<Segment> {
    let segs = span.segments as i64;
    let jumps = i64::from(params.jumps) + 2;
    let steps_to_grow = if jumps > 1 { jumps - 1 } else { 1 };
    let tail_step = 1.max(((segs - 1) as f64 / steps_to_grow as f64).round_ties_even() as i64);
    let head = i64::from(span.brightness);

    let mut out = Vec::new();
    let mut tail_len = 1;
    let mut direction = -1;
    let mut virtual_head = segs;
    let mut t = span.start;

    while t < span.end - 1e-9 {
        let step = span.duration / (jumps * (segs + tail_len)) as f64;
        let t_next = t + step;

        for i in 0..tail_len {
            let seg = if direction == -1 {
                virtual_head + i
            } else {
                virtual_head - i
            };
            if (1..=segs).contains(&seg) {
                let brightness = tail_brightness(head, i, tail_len);
                out.push(Segment::new(t, step, zone(span.track, seg), level(brightness)));
            }
        }

        virtual_head += direction;

        let passed_end = (direction == -1 && virtual_head + tail_len - 1 < 1)
            || (direction == 1 && virtual_head - tail_len + 1 > segs);
        if passed_end && (span.end - t_next) > step * (segs + tail_len + tail_step) as f64 {
            tail_len = (tail_len + tail_step).min(segs);
            direction = -direction;
            virtual_head = if direction == -1 { segs } else { 1 };
        }

        t = t_next;
    }
    out
}
