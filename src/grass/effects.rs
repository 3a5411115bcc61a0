//! Cut effect triggers.
//!
//! On every cut the engine notifies each registered emitter with the blade
//! position and a color picked between the material's two tint colors.
//! Particle playback itself belongs to the host.

use glam::{Vec3, Vec4};
use rand::Rng;

use crate::core::types::FloatRange;

/// The two tint colors read from the grass material.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TintColors {
    pub primary: Vec4,
    pub secondary: Vec4,
}

impl TintColors {
    /// Interpolate between the tints.
    pub fn at(&self, t: f32) -> Vec4 {
        self.primary.lerp(self.secondary, t)
    }
}

impl Default for TintColors {
    fn default() -> Self {
        Self {
            primary: Vec4::new(0.24, 0.45, 0.12, 1.0),
            secondary: Vec4::new(0.55, 0.68, 0.25, 1.0),
        }
    }
}

/// One particle burst request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutEvent {
    pub position: Vec3,
    /// Interpolation parameter drawn from the emitter's color range.
    pub color_t: f32,
    pub color: Vec4,
}

/// Host-side particle emitter notified on cuts.
pub trait CutEffectTrigger {
    /// Range the color parameter is drawn from.
    fn color_range(&self) -> FloatRange;

    fn emit(&mut self, event: CutEvent);
}

/// Fan a cut out to every emitter, drawing one color per emitter.
pub fn trigger_cut<R: Rng + ?Sized>(
    emitters: &mut [&mut dyn CutEffectTrigger],
    tints: &TintColors,
    position: Vec3,
    rng: &mut R,
) {
    for emitter in emitters.iter_mut() {
        let color_t = emitter.color_range().sample(rng);
        emitter.emit(CutEvent {
            position,
            color_t,
            color: tints.at(color_t),
        });
    }
}

/// Emitter that queues events for the host to drain once per frame.
#[derive(Clone, Debug)]
pub struct CutParticleQueue {
    color_range: FloatRange,
    /// Particles requested per event.
    pub emit_count: u32,
    events: Vec<CutEvent>,
}

impl CutParticleQueue {
    pub fn new(color_range: FloatRange, emit_count: u32) -> Self {
        Self {
            color_range,
            emit_count,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[CutEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, CutEvent> {
        self.events.drain(..)
    }
}

impl Default for CutParticleQueue {
    fn default() -> Self {
        Self::new(FloatRange::new(0.0, 1.0), 6)
    }
}

impl CutEffectTrigger for CutParticleQueue {
    fn color_range(&self) -> FloatRange {
        self.color_range
    }

    fn emit(&mut self, event: CutEvent) {
        self.events.push(event);
    }
}
