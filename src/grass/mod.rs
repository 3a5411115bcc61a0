//! Interactive grass simulation.
//!
//! A [`BladeField`] of instanced blades reacts to cutters and flatteners
//! every tick. Cut blades regrow after a delay through the
//! [`RegrowthScheduler`], and the field is handed to a
//! [`BatchRenderer`](crate::render::BatchRenderer) one chunk per draw call.

pub mod agents;
pub mod config;
pub mod deform;
pub mod effects;
pub mod field;
pub mod params;
pub mod regrowth;

pub use agents::{AgentHandle, AgentRoster, AgentSnapshot, AgentTracker, Cutter, Flattener};
pub use config::{ChunkAllocation, ChunkLayout, CutConfig, FlattenConfig, GrassConfig, GrowthSampling, PopulationConfig};
pub use deform::{DeformReport, DeformationEngine};
pub use effects::{CutEffectTrigger, CutEvent, CutParticleQueue, TintColors};
pub use field::{BladeField, BladeId};
pub use params::Bend;
pub use regrowth::{RegrowthReport, RegrowthScheduler};

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::core::types::Result;
use crate::render::batch::{BatchRenderer, GrassMaterial, InstancedDrawBackend, MeshHandle};
use crate::scan::ScanResult;
use agents::{PositionedThreshold, PositionedThresholdWithForce};

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickStats {
    /// Live blades visited by the deformation pass
    pub blades: usize,
    pub cuts: usize,
    /// Regrowth tasks still pending after the tick
    pub regrowth_active: usize,
    pub regrowth_completed: usize,
    pub regrowth_cancelled: usize,
    pub draw_calls: usize,
    pub elapsed: Duration,
    pub over_budget: bool,
}

/// Owns the blade field and runs the per-tick pipeline.
pub struct GrassSystem {
    config: GrassConfig,
    field: BladeField,
    tracker: AgentTracker,
    scheduler: RegrowthScheduler,
    engine: DeformationEngine,
    renderer: BatchRenderer,
    rng: SmallRng,
    budget_overruns: u64,
}

impl GrassSystem {
    /// The renderer's instancing ceiling is the configured chunk capacity.
    pub fn new(config: GrassConfig, mesh: MeshHandle, material: GrassMaterial) -> Self {
        let engine = DeformationEngine::new(config.flatten.clone(), config.cut.clone(), material.tints);
        let renderer = BatchRenderer::new(mesh, material, config.layout.capacity);
        Self {
            field: BladeField::new(config.layout.clone()),
            tracker: AgentTracker::new(),
            scheduler: RegrowthScheduler::new(),
            engine,
            renderer,
            rng: SmallRng::seed_from_u64(config.seed),
            budget_overruns: 0,
            config,
        }
    }

    pub fn config(&self) -> &GrassConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    pub fn field(&self) -> &BladeField {
        &self.field
    }

    pub fn scheduler(&self) -> &RegrowthScheduler {
        &self.scheduler
    }

    pub fn snapshot(&self) -> &AgentSnapshot {
        self.tracker.snapshot()
    }

    pub fn renderer(&self) -> &BatchRenderer {
        &self.renderer
    }

    /// Swap the material; cut effects pick up its tints.
    pub fn set_material(&mut self, material: GrassMaterial) {
        self.engine.set_tints(material.tints);
        self.renderer.set_material(material);
    }

    /// Ticks that ran past `tick_budget_ms` so far.
    pub fn budget_overruns(&self) -> u64 {
        self.budget_overruns
    }

    /// Rebuild the field from scan points. Pending regrowth is dropped.
    pub fn populate(&mut self, scan: &ScanResult) -> Result<()> {
        self.scheduler.clear();
        self.field
            .populate(scan, &self.config.population, &self.config.cut, &mut self.rng)
    }

    /// Remove one blade and its regrowth task.
    pub fn remove_blade(&mut self, id: BladeId) -> bool {
        self.scheduler.cancel(id);
        self.field.remove(id)
    }

    /// Run one tick: snapshot agents, advance regrowth, deform, submit.
    pub fn tick<C, F>(
        &mut self,
        dt: f32,
        roster: &AgentRoster<C, F>,
        emitters: &mut [&mut dyn CutEffectTrigger],
        backend: &mut dyn InstancedDrawBackend,
    ) -> Result<TickStats>
    where
        C: PositionedThreshold,
        F: PositionedThresholdWithForce,
    {
        if !self.config.enabled {
            return Ok(TickStats::default());
        }
        let start = Instant::now();

        self.tracker.refresh(roster);
        let regrowth = self.scheduler.advance(&mut self.field, dt);
        let deform = self.engine.run(
            &mut self.field,
            self.tracker.snapshot(),
            &mut self.scheduler,
            emitters,
            &mut self.rng,
            dt,
        );
        let draw_calls = self.renderer.submit(&self.field, backend)?;

        let elapsed = start.elapsed();
        let over_budget = elapsed.as_secs_f32() * 1000.0 > self.config.tick_budget_ms;
        if over_budget {
            self.budget_overruns += 1;
            log::debug!(
                "Grass tick took {:.2}ms (budget {:.2}ms, {} blades)",
                elapsed.as_secs_f32() * 1000.0,
                self.config.tick_budget_ms,
                deform.blades
            );
        }

        Ok(TickStats {
            blades: deform.blades,
            cuts: deform.cuts,
            regrowth_active: self.scheduler.len(),
            regrowth_completed: regrowth.completed,
            regrowth_cancelled: regrowth.cancelled,
            draw_calls,
            elapsed,
            over_budget,
        })
    }
}
