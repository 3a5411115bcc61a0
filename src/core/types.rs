//! Core type aliases and re-exports

pub use glam::{
    Vec2, Vec3, Vec4,
    Mat4,
    Quat,
};

/// Standard Result type for the engine
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Closed float interval used for randomized per-blade parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw a uniform sample. Reversed bounds are swapped; a degenerate
    /// range returns its single value without consuming randomness.
    pub fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let lo = self.min.min(self.max);
        let hi = self.min.max(self.max);
        if lo == hi || !lo.is_finite() || !hi.is_finite() {
            return lo;
        }
        rng.random_range(lo..=hi)
    }

    /// Check whether `v` lies inside the (normalized) interval.
    pub fn contains(&self, v: f32) -> bool {
        v >= self.min.min(self.max) && v <= self.min.max(self.max)
    }
}
