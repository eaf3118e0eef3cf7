//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::codec::tagging::{tag_audio, FFmpeg};
use crate::codec::{CassetteDocument, Watermark};
use crate::composition::{export_composition, Composition};
use crate::config::CassetteConfig;
use crate::effects::registry::{effects_for_track, EffectInfo, EFFECTS};
use crate::error::{CassetteError, Result};
use crate::porter::{export_port, port};
use crate::raster::compile_file;
use crate::sync::{AdbBridge, Connection, ConnectionConfig, DeviceProbe, GlyphSyncer};
use crate::topology::PhoneModel;

fn watermark(text: Option<&str>) -> Option<Watermark> {
    text.map(Watermark::new)
}

/// Compile a label file into a cassette document.
pub fn compile(labels: &Path, output: &Path, watermark_text: Option<&str>) -> Result<()> {
    info!("Compiling {}", labels.display());
    let watermark = watermark(watermark_text);
    let path = compile_file(labels, output, watermark.as_ref())?;
    println!("{}", path.display());
    Ok(())
}

/// Tag an audio file with a cassette document.
pub fn tag(config: &CassetteConfig, audio: &Path, cassette: &Path, output: &Path, title: &str) -> Result<()> {
    let ffmpeg = FFmpeg::from_config(config);
    let path = tag_audio(&ffmpeg, audio, cassette, output, title)?;
    println!("{}", path.display());
    Ok(())
}

/// Export a composition: labels, cassette, tagged audio.
pub fn export(
    config: &CassetteConfig,
    composition: &Path,
    audio: &Path,
    output: &Path,
    watermark_text: Option<&str>,
) -> Result<()> {
    let composition = Composition::load(composition)?;
    let watermark = watermark(watermark_text);
    let ffmpeg = FFmpeg::from_config(config);
    let mut rng = config.rng();

    let path = export_composition(&composition, audio, output, watermark.as_ref(), &ffmpeg, &mut rng)?;
    println!("{}", path.display());
    Ok(())
}

/// Port a composition to another model and export the result.
pub fn port_composition(
    config: &CassetteConfig,
    composition: &Path,
    audio: &Path,
    to: &str,
    output: &Path,
    watermark_text: Option<&str>,
) -> Result<()> {
    let composition = Composition::load(composition)?;
    let to: PhoneModel = to.parse()?;
    let mut rng = config.rng();

    info!(
        "Porting {} glyphs from {} to {}",
        composition.glyphs.len(),
        composition.model.display_name(),
        to.display_name()
    );
    let (lines, model) = port(composition.model, to, &composition, &mut rng)?;

    let watermark = watermark(watermark_text);
    let ffmpeg = FFmpeg::from_config(config);
    let path = export_port(
        &lines,
        model,
        composition.duration_s(),
        audio,
        output,
        watermark.as_ref(),
        &ffmpeg,
    )?;
    println!("{}", path.display());
    Ok(())
}

/// Print the contents of a cassette document.
pub fn inspect(cassette: &Path) -> Result<()> {
    let document = CassetteDocument::read(cassette)?;
    let decoded = document.decode()?;
    let columns = decoded.author.columns_model()?;

    println!("Cassette: {}", cassette.display());
    println!("{:-<60}", "");
    println!("Version:     {}", document.version);
    println!("Phone model: {}", decoded.phone_model.display_name());
    println!("Columns:     {} ({})", columns.zone_count(), columns.cols_code());
    println!("Rows:        {}", decoded.author.row_count());
    println!(
        "Duration:    {:.3} s",
        decoded.author.row_count() as f64 * crate::raster::TIME_STEP_MS / 1000.0
    );
    println!("CUSTOM1:     {} entries", decoded.custom1.len());
    match &decoded.watermark {
        Some(watermark) => println!("Watermark:   {}", watermark.content().replace('\n', " / ")),
        None => println!("Watermark:   none"),
    }
    Ok(())
}

fn print_effect(info: &EffectInfo) {
    let marker = if info.segmented { " [segmented]" } else { "" };
    println!("{}{}", info.name, marker);
    for slot in info.settings {
        println!("    {:<10} {}", slot.slot, slot.title);
    }
}

/// List editor effects, optionally only those usable on one track.
pub fn effects(model: Option<&str>, track: Option<&str>) -> Result<()> {
    let effects: Vec<&EffectInfo> = match (model, track) {
        (Some(model), Some(track)) => {
            let model: PhoneModel = model.parse()?;
            effects_for_track(model, track)
        }
        (Some(model), None) => {
            let model: PhoneModel = model.parse()?;
            let segmented: Vec<String> = model
                .segmented_tracks()
                .iter()
                .map(|(track, count)| format!("{} ({} segments)", track, count))
                .collect();
            println!("{}: segmented tracks {}", model.display_name(), segmented.join(", "));
            EFFECTS.iter().collect()
        }
        _ => EFFECTS.iter().collect(),
    };

    for info in effects {
        print_effect(info);
    }
    Ok(())
}

/// Send a composition to an attached phone and start playback.
pub fn preview(config: &CassetteConfig, composition: &Path, from_ms: u64, wait: Duration) -> Result<()> {
    let composition = Composition::load(composition)?;

    let connection = Arc::new(Connection::spawn(ConnectionConfig::from_config(config))?);
    let syncer = GlyphSyncer::new(connection.clone(), composition.model, composition.bpm(), config.rng());
    syncer.full_load(&composition.glyphs);

    let bridge = AdbBridge::new(&config.adb_path);
    let mut probe = DeviceProbe::start(bridge, syncer.clone(), config.probe_interval(), config.bridge_port)?;

    println!("Waiting for a phone...");
    let deadline = Instant::now() + wait;
    while !connection.is_connected() {
        if Instant::now() >= deadline {
            probe.stop();
            return Err(CassetteError::ConnectionFailed {
                reason: format!("no phone answered within {} s", wait.as_secs()),
            });
        }
        thread::sleep(Duration::from_millis(100));
    }
    probe.stop();

    let devices = probe.devices();
    if devices.len() > 1 {
        warn!("{} devices attached, previewing on the first one found", devices.len());
    }

    syncer.play(from_ms);
    connection.flush();
    println!(
        "Playing {} glyphs from {} ms",
        composition.glyphs.len(),
        from_ms
    );
    Ok(())
}
