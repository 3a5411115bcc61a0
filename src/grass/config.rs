//! Grass simulation configuration.
//!
//! Per-agent thresholds and forces live on the agents themselves
//! (`agents.rs`); everything here is global to one field.

use std::path::Path;

use glam::Vec3;

use crate::core::types::{FloatRange, Result};

/// How blades are spread across render chunks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ChunkAllocation {
    /// `N / capacity + 1` chunks. Always keeps a trailing chunk, which is
    /// empty when `N` is an exact multiple of the capacity.
    #[default]
    ExtraTrailing,
    /// `ceil(N / capacity)` chunks.
    Exact,
}

/// Chunk sizing tied to the instancing backend's per-call ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChunkLayout {
    /// Blades per chunk; also the most instances one draw call may carry.
    pub capacity: usize,
    pub allocation: ChunkAllocation,
}

impl ChunkLayout {
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Number of chunks allocated for `count` blades.
    pub fn chunk_count(&self, count: usize) -> usize {
        let capacity = self.capacity.max(1);
        match self.allocation {
            ChunkAllocation::ExtraTrailing => count / capacity + 1,
            ChunkAllocation::Exact => count.div_ceil(capacity),
        }
    }

    /// (chunk, slot) for a global blade index.
    pub fn locate(&self, index: usize) -> (usize, usize) {
        let capacity = self.capacity.max(1);
        (index / capacity, index % capacity)
    }
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            allocation: ChunkAllocation::ExtraTrailing,
        }
    }
}

/// Blade placement settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Scale baked into every blade transform.
    pub mesh_scale: Vec3,
    /// Fixed offset added to every anchor point.
    pub spawn_offset: Vec3,
    /// Radius of the horizontal random jitter around each anchor.
    pub spawn_jitter_radius: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            mesh_scale: Vec3::ONE,
            spawn_offset: Vec3::ZERO,
            spawn_jitter_radius: 0.18,
        }
    }
}

/// Lean response speeds.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Rate toward the flattened target, per second.
    pub flatten_speed: f32,
    /// Rate back to upright outside a flattener's reach, per second.
    pub raise_speed: f32,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            flatten_speed: 4.0,
            raise_speed: 0.8,
        }
    }
}

/// When per-blade growth parameters are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GrowthSampling {
    /// Fresh draw on every cut.
    #[default]
    AtCut,
    /// One draw per slot at population, reused by every cut of that blade.
    AtPopulation,
}

/// Cut and regrowth settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CutConfig {
    /// Grow units per second once regrowth starts.
    pub grow_speed_range: FloatRange,
    /// Seconds between a cut and the start of regrowth.
    pub grow_delay_range: FloatRange,
    pub sampling: GrowthSampling,
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            grow_speed_range: FloatRange::new(0.1, 1.0),
            grow_delay_range: FloatRange::new(2.0, 3.0),
            sampling: GrowthSampling::AtCut,
        }
    }
}

/// Top-level grass configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GrassConfig {
    /// Master on/off; a disabled system skips the whole tick.
    pub enabled: bool,
    /// Seed for jitter, growth parameters and effect colors.
    pub seed: u64,
    /// Tick time above which the tick is counted as over budget.
    pub tick_budget_ms: f32,
    pub layout: ChunkLayout,
    pub population: PopulationConfig,
    pub flatten: FlattenConfig,
    pub cut: CutConfig,
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 12345,
            tick_budget_ms: 4.0,
            layout: ChunkLayout::default(),
            population: PopulationConfig::default(),
            flatten: FlattenConfig::default(),
            cut: CutConfig::default(),
        }
    }
}

impl GrassConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = GrassConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.layout.capacity, 1000);
        assert_eq!(cfg.cut.grow_delay_range, FloatRange::new(2.0, 3.0));
        assert_eq!(cfg.population.spawn_jitter_radius, 0.18);
    }

    #[test]
    fn test_chunk_count_extra_trailing() {
        let layout = ChunkLayout::default();
        assert_eq!(layout.chunk_count(0), 1);
        assert_eq!(layout.chunk_count(999), 1);
        assert_eq!(layout.chunk_count(1000), 2);
        assert_eq!(layout.chunk_count(2500), 3);
    }

    #[test]
    fn test_chunk_count_exact() {
        let layout = ChunkLayout { capacity: 1000, allocation: ChunkAllocation::Exact };
        assert_eq!(layout.chunk_count(0), 0);
        assert_eq!(layout.chunk_count(1000), 1);
        assert_eq!(layout.chunk_count(1001), 2);
    }

    #[test]
    fn test_locate() {
        let layout = ChunkLayout { capacity: 7, allocation: ChunkAllocation::Exact };
        for i in 0..50 {
            assert_eq!(layout.locate(i), (i / 7, i % 7));
        }
    }

    #[test]
    fn test_from_json_partial() {
        let cfg = GrassConfig::from_json_str(
            r#"{ "seed": 9, "layout": { "capacity": 64 }, "cut": { "sampling": "AtPopulation" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.layout.capacity, 64);
        assert_eq!(cfg.layout.allocation, ChunkAllocation::ExtraTrailing);
        assert_eq!(cfg.cut.sampling, GrowthSampling::AtPopulation);
        assert_eq!(cfg.flatten.flatten_speed, 4.0);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(GrassConfig::from_json_str("{ not json").is_err());
    }
}
