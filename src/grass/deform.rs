//! Per-tick blade deformation: flatten and cut passes.
//!
//! Every live blade is tested against every agent in the tick's snapshot.
//! Distances are compared squared against squared thresholds.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::agents::AgentSnapshot;
use super::config::{CutConfig, FlattenConfig, GrowthSampling};
use super::effects::{CutEffectTrigger, TintColors, trigger_cut};
use super::field::{BladeField, BladeId};
use super::regrowth::RegrowthScheduler;

/// Above this squared lean a blade only yields to a stronger flattener.
pub const HYSTERESIS_LEAN_SQ: f32 = 0.4;

/// Blades at or below this grow value can't be cut again.
pub const MIN_CUT_GROW: f32 = 0.4;

/// Counters for one deformation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeformReport {
    pub blades: usize,
    pub cuts: usize,
}

/// Lean a flattener wants to impose on a blade at `offset` from it.
///
/// Direction is away from the flattener on the ground plane with magnitude
/// `bend_force`, then scaled by `clamp(1 / |v|², 0, 1)`.
pub fn flatten_target(offset: Vec3, bend_force: f32) -> Vec2 {
    let scaled = Vec2::new(offset.x, offset.z).normalize_or_zero() * bend_force;
    let len_sq = scaled.length_squared();
    if len_sq == 0.0 {
        return Vec2::ZERO;
    }
    scaled * (1.0 / len_sq).clamp(0.0, 1.0)
}

/// Move `lean` toward `target` at `rate`, resisting redirection of
/// strongly flattened blades by weaker influences.
pub fn steer_lean(lean: Vec2, target: Vec2, rate: f32) -> Vec2 {
    let current_sq = lean.length_squared();
    if current_sq <= HYSTERESIS_LEAN_SQ {
        return lean + (target - lean) * rate;
    }
    if target.length_squared() > current_sq {
        let adopted = lean.normalize_or_zero() * target.length();
        return lean + (adopted - lean) * rate;
    }
    lean
}

/// Exponential relaxation toward upright.
pub fn relax_lean(lean: Vec2, rate: f32) -> Vec2 {
    lean + (Vec2::ZERO - lean) * rate
}

/// Interpolation factor for one tick; capped at 1 so it never overshoots.
fn tick_rate(speed: f32, dt: f32) -> f32 {
    (speed * dt).clamp(0.0, 1.0)
}

/// Applies agent influence to the blade field.
pub struct DeformationEngine {
    flatten: FlattenConfig,
    cut: CutConfig,
    tints: TintColors,
}

impl DeformationEngine {
    pub fn new(flatten: FlattenConfig, cut: CutConfig, tints: TintColors) -> Self {
        Self { flatten, cut, tints }
    }

    pub fn tints(&self) -> &TintColors {
        &self.tints
    }

    pub fn set_tints(&mut self, tints: TintColors) {
        self.tints = tints;
    }

    /// Run both passes over every live blade.
    ///
    /// Cut blades drop to zero height, get a regrowth task, and are reported
    /// to every emitter.
    pub fn run<R: Rng + ?Sized>(
        &self,
        field: &mut BladeField,
        agents: &AgentSnapshot,
        scheduler: &mut RegrowthScheduler,
        emitters: &mut [&mut dyn CutEffectTrigger],
        rng: &mut R,
        dt: f32,
    ) -> DeformReport {
        let mut report = DeformReport::default();
        let flatten_rate = tick_rate(self.flatten.flatten_speed, dt);
        let raise_rate = tick_rate(self.flatten.raise_speed, dt);
        let has_flatteners = agents.flattener_count() > 0;
        let has_cutters = agents.cutter_count() > 0;
        let capacity = field.layout().capacity;

        for (chunk_index, chunk) in field.chunks_mut().iter_mut().enumerate() {
            let base = chunk_index * capacity;

            for slot in 0..chunk.len() {
                if !chunk.is_alive(slot) {
                    continue;
                }
                report.blades += 1;
                let position = chunk.positions()[slot];
                let mut bend = chunk.bends()[slot];

                if has_flatteners {
                    let mut lean = bend.lean();
                    for (at, threshold_sq, force) in agents.flatteners() {
                        let offset = position - at;
                        if offset.length_squared() > threshold_sq {
                            lean = relax_lean(lean, raise_rate);
                            continue;
                        }
                        let target = flatten_target(offset, force);
                        lean = steer_lean(lean, target, flatten_rate);
                    }
                    bend.set_lean(lean);
                }

                if has_cutters {
                    for (at, threshold_sq) in agents.cutters() {
                        let dist_sq = (position - at).length_squared();
                        if dist_sq >= threshold_sq || bend.grow <= MIN_CUT_GROW {
                            continue;
                        }

                        bend.grow = 0.0;
                        chunk.set_regrow_pending(slot, true);
                        let (speed, delay) = match self.cut.sampling {
                            GrowthSampling::AtCut => {
                                let speed = self.cut.grow_speed_range.sample(rng);
                                let delay = self.cut.grow_delay_range.sample(rng);
                                chunk.set_growth(slot, speed, delay);
                                (speed, delay)
                            }
                            GrowthSampling::AtPopulation => chunk.growth(slot),
                        };
                        let id = BladeId {
                            index: (base + slot) as u32,
                            generation: chunk.generation(slot),
                        };
                        scheduler.schedule(id, delay, speed);
                        trigger_cut(emitters, &self.tints, position, rng);
                        report.cuts += 1;
                    }
                }

                *chunk.bend_mut(slot) = bend;
            }
        }

        report
    }
}
