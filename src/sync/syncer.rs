//! Live preview: snapshot diffing and device discovery

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;

use super::bridge::DeviceBridge;
use super::connection::Connection;
use super::protocol::{diff, Frame, SyncDiff, WireGlyph};
use crate::composition::{Glyph, SyncSink};
use crate::effects::effect_to_segments;
use crate::error::Result;
use crate::topology::PhoneModel;

struct SyncerState {
    last_synced: BTreeMap<String, Glyph>,
    model: PhoneModel,
    bpm: f64,
    rng: StdRng,
}

impl SyncerState {
    /// Attach pre-expanded effect segments so the device does not need to
    /// expand effects itself.
    fn enrich(&mut self, id: &str, glyph: &Glyph) -> WireGlyph {
        let effect_to_glyphs = match &glyph.effect {
            Some(_) => match effect_to_segments(glyph, self.model, self.bpm, &mut self.rng) {
                Ok(segments) => Some(segments),
                Err(e) => {
                    warn!("Glyph {}: effect not expanded for preview: {}", id, e);
                    None
                }
            },
            None => None,
        };
        WireGlyph {
            id: None,
            glyph: glyph.clone(),
            effect_to_glyphs,
        }
    }
}

/// Keeps the device in step with the composition.
///
/// Cloning yields another handle to the same snapshot and connection.
#[derive(Clone)]
pub struct GlyphSyncer {
    state: Arc<Mutex<SyncerState>>,
    connection: Arc<Connection>,
}

impl GlyphSyncer {
    pub fn new(connection: Arc<Connection>, model: PhoneModel, bpm: f64, rng: StdRng) -> Self {
        Self {
            state: Arc::new(Mutex::new(SyncerState {
                last_synced: BTreeMap::new(),
                model,
                bpm,
                rng,
            })),
            connection,
        }
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Last synchronized glyphs.
    pub fn snapshot(&self) -> BTreeMap<String, Glyph> {
        self.state.lock().last_synced.clone()
    }

    /// Send the difference between the snapshot and `current`, then take
    /// `current` as the new snapshot whether or not the frames arrived.
    pub fn sync(&self, current: &BTreeMap<String, Glyph>) -> SyncDiff {
        let mut state = self.state.lock();
        let changes = diff(&state.last_synced, current);

        if !changes.deleted.is_empty() {
            self.connection.send(Frame::Delete {
                ids: changes.deleted.clone(),
            });
        }
        if !changes.changed.is_empty() {
            let glyphs = changes
                .changed
                .iter()
                .map(|(id, glyph)| (id.clone(), state.enrich(id, glyph)))
                .collect();
            self.connection.send(Frame::Update { glyphs });
        }

        debug!(
            "Synced {} changed and {} deleted glyphs",
            changes.changed.len(),
            changes.deleted.len()
        );
        state.last_synced = current.clone();
        changes
    }

    /// Replace everything on the device with `glyphs`.
    pub fn full_load(&self, glyphs: &BTreeMap<String, Glyph>) {
        let mut state = self.state.lock();
        self.load_locked(&mut state, glyphs.clone());
    }

    /// Send the current snapshot again, after a reconnect.
    pub fn reload(&self) {
        let mut state = self.state.lock();
        let snapshot = state.last_synced.clone();
        self.load_locked(&mut state, snapshot);
    }

    fn load_locked(&self, state: &mut SyncerState, glyphs: BTreeMap<String, Glyph>) {
        let wire = glyphs
            .iter()
            .map(|(id, glyph)| WireGlyph {
                id: Some(id.clone()),
                ..state.enrich(id, glyph)
            })
            .collect();
        self.connection.send(Frame::Load { glyphs: wire });
        state.last_synced = glyphs;
    }

    pub fn play(&self, from_ms: u64) {
        self.connection.send(Frame::Play { from_ms });
    }

    pub fn stop(&self) {
        self.connection.send(Frame::Stop);
    }
}

impl SyncSink for GlyphSyncer {
    fn sync(&mut self, glyphs: &BTreeMap<String, Glyph>) {
        GlyphSyncer::sync(self, glyphs);
    }
}

/// Look at the attached devices once.
///
/// When the device list changed, the first newly attached device with a
/// known model is prepared, handshaken and loaded with the snapshot.
pub fn scan_devices<B: DeviceBridge + ?Sized>(
    bridge: &B,
    syncer: &GlyphSyncer,
    known: &mut Vec<String>,
    port: u16,
) -> Result<Option<(String, PhoneModel)>> {
    let devices = bridge.devices()?;
    if devices == *known {
        return Ok(None);
    }

    let previous: HashSet<String> = known.iter().cloned().collect();
    *known = devices.clone();

    for device in devices.into_iter().filter(|d| !previous.contains(d)) {
        let Some(model) = bridge.product_model(&device)? else {
            debug!("Device {} is not a supported phone", device);
            continue;
        };
        info!("Found {} ({})", device, model.display_name());
        let connected = bridge
            .prepare(&device, port)
            .and_then(|_| syncer.connection().handshake());
        if let Err(e) = connected {
            // Forget the device so the next scan tries it again.
            known.retain(|d| *d != device);
            return Err(e);
        }
        syncer.reload();
        return Ok(Some((device, model)));
    }
    Ok(None)
}

/// Background thread polling the bridge for devices.
pub struct DeviceProbe {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    devices: Arc<Mutex<Vec<String>>>,
}

impl DeviceProbe {
    pub fn start<B: DeviceBridge + 'static>(
        bridge: B,
        syncer: GlyphSyncer,
        interval: Duration,
        port: u16,
    ) -> Result<Self> {
        let (stop, stopped) = bounded::<()>(1);
        let devices = Arc::new(Mutex::new(Vec::new()));
        let seen = devices.clone();

        syncer.connection().mark_discovering();
        let handle = thread::Builder::new()
            .name("cassette-probe".to_string())
            .spawn(move || loop {
                let mut known = seen.lock().clone();
                if let Err(e) = scan_devices(&bridge, &syncer, &mut known, port) {
                    warn!("Device scan failed: {}", e);
                }
                *seen.lock() = known;
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
            devices,
        })
    }

    /// Devices seen by the last scan.
    pub fn devices(&self) -> Vec<String> {
        self.devices.lock().clone()
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DeviceProbe {
    fn drop(&mut self) {
        self.stop();
    }
}
