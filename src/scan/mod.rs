//! Placement scanning.
//!
//! Sweeps a grid over a bounding volume and probes straight down through an
//! external [`SpatialQuery`] oracle. Hits on accepted surfaces become blade
//! anchor points. The host engine provides the oracle; [`SurfaceSet`] is a
//! small box-collider world for tools and tests.

pub mod persist;
pub mod scanner;
pub mod surface;

pub use scanner::{ScanRejection, ScanReport, SpatialScanner};
pub use surface::SurfaceSet;

use crate::core::types::Vec3;
use crate::math::Ray;

/// Probes sent by a single sweep before it gives up.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// Identity of a surface the probe can land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(transparent)]
pub struct SurfaceId(pub u32);

/// Bit set of collision layers a probe is allowed to see.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    pub const fn only(layer: u8) -> Self {
        Self(1u32 << (layer as u32 & 31))
    }

    pub fn contains(self, layer: u8) -> bool {
        self.0 & (1u32 << (layer as u32 & 31)) != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Result of a successful probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    pub surface: SurfaceId,
}

/// External single-ray intersection oracle.
pub trait SpatialQuery {
    /// Nearest hit along `ray` within `max_distance` on a layer in `mask`.
    fn raycast(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit>;
}

/// Sweep parameters.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Grid spacing on both planar axes.
    pub step: f32,
    /// Height above the volume's floor that probes start from.
    /// `None` uses the volume's own height.
    pub probe_height: Option<f32>,
    /// Maximum probe length.
    pub max_distance: f32,
    pub layer_mask: LayerMask,
    /// Cap on probes per sweep. Values above [`DEFAULT_MAX_ITERATIONS`] are clamped to it.
    pub max_iterations: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step: 0.3,
            probe_height: None,
            max_distance: 1000.0,
            layer_mask: LayerMask::ALL,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Ordered anchor points in sweep order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanResult {
    points: Vec<Vec3>,
}

impl ScanResult {
    pub fn from_points(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn points_mut(&mut self) -> &mut Vec<Vec3> {
        &mut self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_mask() {
        assert!(LayerMask::ALL.contains(0));
        assert!(LayerMask::ALL.contains(31));
        assert!(!LayerMask::NONE.contains(3));
        let ground = LayerMask::only(4);
        assert!(ground.contains(4));
        assert!(!ground.contains(5));
    }

    #[test]
    fn test_scan_config_defaults() {
        let cfg = ScanConfig::default();
        assert!(cfg.step > 0.0);
        assert_eq!(cfg.max_iterations, 100_000);
        assert!(cfg.probe_height.is_none());
    }

    #[test]
    fn test_scan_config_partial_json() {
        let cfg: ScanConfig = serde_json::from_str(r#"{ "step": 0.5 }"#).unwrap();
        assert_eq!(cfg.step, 0.5);
        assert_eq!(cfg.max_distance, 1000.0);
    }
}
