//! Grid sweep that turns surface probes into anchor points.

use super::{ScanConfig, ScanResult, SpatialQuery, SurfaceId, DEFAULT_MAX_ITERATIONS};
use crate::core::types::Vec3;
use crate::math::{Aabb, Ray};

/// Why a sweep refused to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanRejection {
    /// Step was zero, negative or not finite.
    NonPositiveStep,
    /// Volume max is below min on a planar axis.
    EmptyVolume,
    /// No surface identity was accepted.
    NoValidSurfaces,
}

/// Outcome of the last scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Probes cast.
    pub probes: usize,
    /// Probes that hit any surface.
    pub hits: usize,
    /// Hits recorded as anchor points.
    pub accepted: usize,
    /// The iteration cap stopped a sweep before it covered its volume.
    pub cap_reached: bool,
    pub rejected: Option<ScanRejection>,
}

/// Discovers blade placement points.
pub struct SpatialScanner {
    config: ScanConfig,
    result: ScanResult,
    last_report: ScanReport,
}

impl SpatialScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            result: ScanResult::default(),
            last_report: ScanReport::default(),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ScanConfig {
        &mut self.config
    }

    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    pub fn last_report(&self) -> ScanReport {
        self.last_report
    }

    /// Replace the stored result, e.g. with one loaded from disk.
    pub fn set_result(&mut self, result: ScanResult) {
        self.result = result;
    }

    /// Sweep `volume` and keep hits whose surface is in `valid`.
    ///
    /// The previous result is overwritten in place.
    pub fn scan<Q: SpatialQuery + ?Sized>(
        &mut self,
        oracle: &Q,
        volume: &Aabb,
        valid: &[SurfaceId],
    ) -> ScanReport {
        self.result.points_mut().clear();
        let mut report = ScanReport::default();

        if valid.is_empty() {
            log::debug!("Scan skipped: no valid surfaces configured");
            report.rejected = Some(ScanRejection::NoValidSurfaces);
        } else if let Some(rejection) = self.validate(volume) {
            report.rejected = Some(rejection);
        } else {
            let height = self.config.probe_height.unwrap_or(volume.size().y);
            self.sweep(oracle, volume, height, |id| valid.contains(&id), &mut report);
        }

        self.finish(report)
    }

    /// Sweep each surface's own bounds, keeping only hits on that surface.
    ///
    /// Probes start twice the surface's height above its floor.
    pub fn scan_surfaces<Q: SpatialQuery + ?Sized>(
        &mut self,
        oracle: &Q,
        surfaces: &[(SurfaceId, Aabb)],
    ) -> ScanReport {
        self.result.points_mut().clear();
        let mut report = ScanReport::default();

        if surfaces.is_empty() {
            report.rejected = Some(ScanRejection::NoValidSurfaces);
            return self.finish(report);
        }

        for &(id, bounds) in surfaces {
            if let Some(rejection) = self.validate(&bounds) {
                report.rejected = Some(rejection);
                continue;
            }
            let height = bounds.size().y * 2.0;
            self.sweep(oracle, &bounds, height, |hit| hit == id, &mut report);
        }

        self.finish(report)
    }

    /// Return the stored result, scanning first if it is empty.
    pub fn positions_or_scan<Q: SpatialQuery + ?Sized>(
        &mut self,
        oracle: &Q,
        volume: &Aabb,
        valid: &[SurfaceId],
    ) -> &ScanResult {
        if self.result.is_empty() {
            self.scan(oracle, volume, valid);
        }
        &self.result
    }

    fn validate(&self, volume: &Aabb) -> Option<ScanRejection> {
        let step = self.config.step;
        if !(step > 0.0) || !step.is_finite() {
            log::warn!("Scan step must be positive and finite (got {}); scan skipped", step);
            return Some(ScanRejection::NonPositiveStep);
        }
        if volume.is_inverted() {
            log::warn!("Scan volume is empty (min {:?}, max {:?}); scan skipped", volume.min, volume.max);
            return Some(ScanRejection::EmptyVolume);
        }
        None
    }

    /// Row-major sweep: z advances every probe, x advances when z leaves the
    /// volume. Coordinates are computed from integer indices so long sweeps
    /// don't drift.
    fn sweep<Q, F>(
        &mut self,
        oracle: &Q,
        volume: &Aabb,
        height: f32,
        accept: F,
        report: &mut ScanReport,
    ) where
        Q: SpatialQuery + ?Sized,
        F: Fn(SurfaceId) -> bool,
    {
        let step = self.config.step;
        let start = volume.min;
        let end = volume.max;
        // Configs may lower the cap but never lift it
        let cap = self.config.max_iterations.min(DEFAULT_MAX_ITERATIONS);
        let mut probes = 0usize;
        let mut ix = 0u32;
        let mut iz = 0u32;

        loop {
            let x = start.x + ix as f32 * step;
            if x > end.x {
                break;
            }
            let z = start.z + iz as f32 * step;
            if z > end.z {
                iz = 0;
                ix += 1;
                continue;
            }
            if probes >= cap {
                report.cap_reached = true;
                log::warn!(
                    "Scan stopped after {} probes before covering the volume; step {} is too small for extent {:?}",
                    probes, step, volume.planar_extent()
                );
                break;
            }

            probes += 1;
            let origin = Vec3::new(x, start.y + height, z);
            if let Some(hit) = oracle.raycast(&Ray::down(origin), self.config.max_distance, self.config.layer_mask) {
                report.hits += 1;
                if accept(hit.surface) {
                    report.accepted += 1;
                    self.result.points_mut().push(hit.point);
                }
            }

            iz += 1;
        }

        report.probes += probes;
    }

    fn finish(&mut self, report: ScanReport) -> ScanReport {
        if report.rejected.is_none() {
            log::info!(
                "Scan: {} probes, {} hits, {} placement points",
                report.probes, report.hits, report.accepted
            );
        }
        self.last_report = report;
        report
    }
}

impl Default for SpatialScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
