//! Live glyph repository
//!
//! Owns the glyph map of an open composition. Every mutation goes through
//! this type and ends with an explicit call to the attached [`SyncSink`].

use std::collections::BTreeMap;

use log::debug;

use super::glyph::{EffectDescriptor, Glyph};
use crate::error::Result;

/// Receiver of the full glyph map after each mutation.
pub trait SyncSink: Send {
    fn sync(&mut self, glyphs: &BTreeMap<String, Glyph>);
}

/// Repository for the glyphs of one composition.
pub struct GlyphStore {
    glyphs: BTreeMap<String, Glyph>,
    last_id: u64,
    sink: Option<Box<dyn SyncSink>>,
}

impl GlyphStore {
    pub fn new(glyphs: BTreeMap<String, Glyph>) -> Self {
        let last_id = glyphs.keys().filter_map(|id| id.parse().ok()).max().unwrap_or(0);
        Self {
            glyphs,
            last_id,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn SyncSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn SyncSink>>) {
        self.sink = sink;
    }

    fn notify(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.sync(&self.glyphs);
        }
    }

    /// Add a glyph under the next free id and return that id.
    pub fn insert(&mut self, glyph: Glyph) -> Result<String> {
        glyph.validate()?;
        self.last_id += 1;
        let id = self.last_id.to_string();
        debug!("Glyph {} added on track {}", id, glyph.track);
        self.glyphs.insert(id.clone(), glyph);
        self.notify();
        Ok(id)
    }

    /// Replace an existing glyph. Returns `false` when `id` is unknown.
    pub fn update(&mut self, id: &str, glyph: Glyph) -> Result<bool> {
        glyph.validate()?;
        match self.glyphs.get_mut(id) {
            Some(slot) => {
                *slot = glyph;
                self.notify();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Attach or remove the effect of a glyph.
    pub fn set_effect(&mut self, id: &str, effect: Option<EffectDescriptor>) -> bool {
        match self.glyphs.get_mut(id) {
            Some(glyph) => {
                glyph.effect = effect;
                self.notify();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        if self.glyphs.remove(id).is_some() {
            self.notify();
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
        self.notify();
    }

    pub fn get(&self, id: &str) -> Option<&Glyph> {
        self.glyphs.get(id)
    }

    pub fn glyphs(&self) -> &BTreeMap<String, Glyph> {
        &self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn into_glyphs(self) -> BTreeMap<String, Glyph> {
        self.glyphs
    }
}
