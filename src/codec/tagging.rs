//! Audio metadata tagging through ffmpeg/ffprobe

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use log::{debug, info};
use serde_json::Value;

use super::document::{CassetteDocument, DecodedCassette};
use super::watermark::deflate;
use crate::config::CassetteConfig;
use crate::error::{CassetteError, Result};
use crate::raster::compiler::raster_rows;

/// Album tag written into every exported file.
pub const ALBUM: &str = "Cassette 0.1";

const TAG_LINE_WIDTH: usize = 76;

/// Audio stream properties reported by ffprobe.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioProbe {
    pub duration_ms: f64,
    pub tags: BTreeMap<String, String>,
}

impl AudioProbe {
    /// Parse `ffprobe -of json -show_streams -select_streams a` output.
    pub fn from_ffprobe_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let stream = value
            .get("streams")
            .and_then(|streams| streams.get(0))
            .ok_or_else(|| CassetteError::ExternalTool {
                tool: "ffprobe".to_string(),
                stderr: "file has no audio stream".to_string(),
            })?;

        if stream.get("codec_type").and_then(Value::as_str) != Some("audio") {
            return Err(CassetteError::ExternalTool {
                tool: "ffprobe".to_string(),
                stderr: "first stream is not an audio stream".to_string(),
            });
        }

        let duration_s = stream
            .get("duration")
            .and_then(|d| match d {
                Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            })
            .unwrap_or(0.0);

        let tags = stream
            .get("tags")
            .and_then(Value::as_object)
            .map(|tags| {
                tags.iter()
                    .map(|(k, v)| (k.clone(), v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            duration_ms: duration_s * 1000.0,
            tags,
        })
    }
}

/// ffmpeg and ffprobe executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FFmpeg {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl FFmpeg {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub fn from_config(config: &CassetteConfig) -> Self {
        Self::new(&config.ffmpeg_path, &config.ffprobe_path)
    }

    /// Probe the first audio stream of `audio`.
    pub fn probe(&self, audio: &Path) -> Result<AudioProbe> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-of", "json", "-show_streams", "-select_streams", "a"])
            .arg(audio)
            .output()
            .map_err(|e| CassetteError::ExternalTool {
                tool: self.ffprobe_path.clone(),
                stderr: format!("failed to start: {}", e),
            })?;

        if !output.status.success() {
            return Err(CassetteError::ExternalTool {
                tool: self.ffprobe_path.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        AudioProbe::from_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
    }

    /// Copy `input` to `output` with `metadata` as its audio stream tags.
    ///
    /// ffmpeg writes into a temporary file next to `output`, which replaces
    /// `output` only after a clean exit. A failed run leaves an existing
    /// `output` untouched.
    pub fn write_metadata(
        &self,
        input: &Path,
        output: &Path,
        metadata: &[(String, String)],
    ) -> Result<()> {
        let directory = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let suffix = output
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let staged = tempfile::Builder::new()
            .prefix(".cassette-")
            .suffix(&suffix)
            .tempfile_in(directory)?;

        let mut child = Command::new(&self.ffmpeg_path)
            .args(metadata_args(input, staged.path(), metadata))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CassetteError::ExternalTool {
                tool: self.ffmpeg_path.clone(),
                stderr: format!("failed to start: {}", e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // ffmpeg may exit before reading; its stderr explains why.
            if let Err(e) = stdin.write_all(render_ffmetadata(metadata).as_bytes()) {
                debug!("Writing metadata to {} failed: {}", self.ffmpeg_path, e);
            }
        }

        let result = child.wait_with_output()?;
        if !result.status.success() {
            return Err(CassetteError::ExternalTool {
                tool: self.ffmpeg_path.clone(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        staged.persist(output).map_err(|e| e.error)?;
        Ok(())
    }
}

/// ffmpeg arguments that clear the existing stream tags, map the
/// metadata document from stdin and copy the audio bit-exactly.
pub fn metadata_args(input: &Path, output: &Path, metadata: &[(String, String)]) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-v".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-i".into(),
        "-".into(),
        "-y".into(),
    ];
    for (key, _) in metadata {
        args.push("-metadata:s:a:0".into());
        args.push(format!("{}=", key));
    }
    args.extend(
        [
            "-map_metadata",
            "1",
            "-c:a",
            "copy",
            "-fflags",
            "+bitexact",
            "-flags:v",
            "+bitexact",
            "-flags:a",
            "+bitexact",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(output.to_string_lossy().into_owned());
    args
}

pub fn escape_ffmetadata(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        if matches!(c, '\\' | '=' | ';' | '#' | '\n') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render an `;FFMETADATA1` document.
pub fn render_ffmetadata(metadata: &[(String, String)]) -> String {
    let mut out = String::from(";FFMETADATA1\n");
    for (key, value) in metadata {
        out.push_str(&escape_ffmetadata(key));
        out.push('=');
        out.push_str(&escape_ffmetadata(value));
        out.push('\n');
    }
    out
}

/// Standard base64 without padding, wrapped at 76 characters, with a
/// trailing newline.
pub fn encode_tag_base64(data: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / TAG_LINE_WIDTH + 1);
    for (i, chunk) in encoded.as_bytes().chunks(TAG_LINE_WIDTH).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&String::from_utf8_lossy(chunk));
    }
    out.push('\n');
    out
}

/// Decode a tag written by [`encode_tag_base64`], padded or not.
pub fn decode_tag_base64(data: &str) -> Result<Vec<u8>> {
    let compact: String = data
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .trim_end_matches('=')
        .to_string();
    Ok(STANDARD_NO_PAD.decode(compact)?)
}

/// Tags for a decoded cassette, in the order they are written.
///
/// When the audio needs exactly one more raster row than AUTHOR holds, a
/// dark row is appended.
pub fn build_metadata(
    cassette: &DecodedCassette,
    title: &str,
    audio_duration_ms: f64,
) -> Result<Vec<(String, String)>> {
    let mut author = cassette.author.clone();
    let required_rows = raster_rows(audio_duration_ms);
    if required_rows == author.row_count() + 1 {
        debug!("Padding AUTHOR with one dark row to match the audio length");
        author.push_zero_row();
    }

    let columns = author.columns_model()?;

    let mut metadata = vec![
        ("TITLE".to_string(), title.to_string()),
        ("ALBUM".to_string(), ALBUM.to_string()),
        ("AUTHOR".to_string(), encode_tag_base64(&deflate(&author.raw_bytes())?)),
        (
            "COMPOSER".to_string(),
            format!("v1-{} Glyph Composer", columns.codename()),
        ),
        (
            "CUSTOM1".to_string(),
            encode_tag_base64(&deflate(&cassette.custom1.raw_bytes())?),
        ),
        ("CUSTOM2".to_string(), columns.cols_code().to_string()),
    ];
    if let Some(watermark) = &cassette.watermark {
        metadata.push((
            "GLYPHER_WATERMARK".to_string(),
            format!("\n{}", watermark.content()),
        ));
    }
    Ok(metadata)
}

/// Write the cassette at `cassette_path` into a copy of `audio_path` named
/// `<output_dir>/<title><ext>`.
pub fn tag_audio(
    ffmpeg: &FFmpeg,
    audio_path: &Path,
    cassette_path: &Path,
    output_dir: &Path,
    title: &str,
) -> Result<PathBuf> {
    if !audio_path.exists() {
        return Err(CassetteError::FileNotFound {
            path: audio_path.to_path_buf(),
        });
    }

    let probe = ffmpeg.probe(audio_path)?;
    let cassette = CassetteDocument::read(cassette_path)?.decode()?;
    let metadata = build_metadata(&cassette, title, probe.duration_ms)?;

    let extension = audio_path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let output = output_dir.join(format!("{}{}", title, extension));

    ffmpeg.write_metadata(audio_path, &output, &metadata)?;
    info!("Tagged {} -> {}", audio_path.display(), output.display());
    Ok(output)
}

/// Stream tags of an audio file; empty when it has none.
pub fn read_tags(ffmpeg: &FFmpeg, audio_path: &Path) -> Result<BTreeMap<String, String>> {
    Ok(ffmpeg.probe(audio_path)?.tags)
}
