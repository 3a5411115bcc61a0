//! Blade storage partitioned into fixed-capacity render chunks.
//!
//! Blades are addressed by global index; blade `i` lives in chunk
//! `i / capacity` at slot `i % capacity`. Each slot carries a generation so
//! that stale [`BladeId`]s (held by regrowth tasks) are detected after a
//! removal or a repopulation.

use glam::{Mat4, Quat, Vec3};
use rand::Rng;

use super::config::{ChunkLayout, CutConfig, GrowthSampling, PopulationConfig};
use super::params::Bend;
use crate::core::Error;
use crate::core::types::Result;
use crate::scan::ScanResult;

/// Stable handle to one blade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BladeId {
    /// Global index in population order.
    pub index: u32,
    pub generation: u32,
}

/// One render batch worth of blades (structure of arrays).
#[derive(Debug)]
pub struct Chunk {
    capacity: usize,
    transforms: Vec<Mat4>,
    bends: Vec<Bend>,
    positions: Vec<Vec3>,
    regrow_pending: Vec<bool>,
    grow_speeds: Vec<f32>,
    grow_delays: Vec<f32>,
    generations: Vec<u32>,
    alive: Vec<bool>,
}

impl Chunk {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            transforms: Vec::with_capacity(capacity),
            bends: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            regrow_pending: Vec::with_capacity(capacity),
            grow_speeds: Vec::with_capacity(capacity),
            grow_delays: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, transform: Mat4, growth: (f32, f32), generation: u32) -> Result<()> {
        if self.transforms.len() >= self.capacity {
            return Err(Error::InstancingLimitExceeded {
                requested: self.transforms.len() + 1,
                capacity: self.capacity,
            });
        }
        self.positions.push(transform.w_axis.truncate());
        self.transforms.push(transform);
        self.bends.push(Bend::UPRIGHT);
        self.regrow_pending.push(false);
        self.grow_speeds.push(growth.0);
        self.grow_delays.push(growth.1);
        self.generations.push(generation);
        self.alive.push(true);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn bends(&self) -> &[Bend] {
        &self.bends
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub(crate) fn is_alive(&self, slot: usize) -> bool {
        self.alive[slot]
    }

    pub(crate) fn generation(&self, slot: usize) -> u32 {
        self.generations[slot]
    }

    pub(crate) fn bend_mut(&mut self, slot: usize) -> &mut Bend {
        &mut self.bends[slot]
    }

    pub(crate) fn set_regrow_pending(&mut self, slot: usize, pending: bool) {
        self.regrow_pending[slot] = pending;
    }

    /// Growth parameters stored for the slot: (speed, delay).
    pub(crate) fn growth(&self, slot: usize) -> (f32, f32) {
        (self.grow_speeds[slot], self.grow_delays[slot])
    }

    pub(crate) fn set_growth(&mut self, slot: usize, speed: f32, delay: f32) {
        self.grow_speeds[slot] = speed;
        self.grow_delays[slot] = delay;
    }
}

/// Owner of every blade's transform and bend state.
#[derive(Debug)]
pub struct BladeField {
    layout: ChunkLayout,
    chunks: Vec<Chunk>,
    len: usize,
    live: usize,
    epoch: u32,
}

impl BladeField {
    pub fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            chunks: Vec::new(),
            len: 0,
            live: 0,
            epoch: 0,
        }
    }

    /// Rebuild the field from anchor points.
    ///
    /// Every outstanding [`BladeId`] becomes stale.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        scan: &ScanResult,
        population: &PopulationConfig,
        cut: &CutConfig,
        rng: &mut R,
    ) -> Result<()> {
        if self.layout.capacity == 0 {
            return Err(Error::Config("chunk capacity must be at least 1".into()));
        }

        let count = scan.len();
        if count > u32::MAX as usize {
            return Err(Error::Config(format!("{} blades exceed the addressable range", count)));
        }

        self.epoch = self.epoch.wrapping_add(1);
        let chunk_count = self.layout.chunk_count(count);
        self.chunks = (0..chunk_count)
            .map(|_| Chunk::with_capacity(self.layout.capacity))
            .collect();

        for (i, anchor) in scan.points().iter().enumerate() {
            let (chunk, _) = self.layout.locate(i);
            let position = spawn_position(*anchor, population, rng);
            let transform = Mat4::from_scale_rotation_translation(
                population.mesh_scale,
                Quat::IDENTITY,
                position,
            );
            let growth = match cut.sampling {
                GrowthSampling::AtPopulation => (
                    cut.grow_speed_range.sample(rng),
                    cut.grow_delay_range.sample(rng),
                ),
                GrowthSampling::AtCut => (0.0, 0.0),
            };
            self.chunks[chunk].push(transform, growth, self.epoch)?;
        }

        self.len = count;
        self.live = count;
        log::info!(
            "Populated {} blades into {} chunks (capacity {})",
            count, chunk_count, self.layout.capacity
        );
        Ok(())
    }

    /// Drop every blade and chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
        self.live = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// Blades placed at population, including removed ones.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Blades not removed.
    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub(crate) fn chunks_mut(&mut self) -> &mut [Chunk] {
        &mut self.chunks
    }

    /// Handle for the live blade at a global index.
    pub fn id_at(&self, index: usize) -> Option<BladeId> {
        if index >= self.len {
            return None;
        }
        let (chunk, slot) = self.layout.locate(index);
        let c = &self.chunks[chunk];
        c.is_alive(slot).then(|| BladeId {
            index: index as u32,
            generation: c.generation(slot),
        })
    }

    fn slot(&self, id: BladeId) -> Option<(usize, usize)> {
        let index = id.index as usize;
        if index >= self.len {
            return None;
        }
        let (chunk, slot) = self.layout.locate(index);
        let c = &self.chunks[chunk];
        (c.is_alive(slot) && c.generation(slot) == id.generation).then_some((chunk, slot))
    }

    /// True while the blade exists and the handle is current.
    pub fn is_live(&self, id: BladeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn bend(&self, id: BladeId) -> Option<Bend> {
        self.slot(id).map(|(c, s)| self.chunks[c].bends[s])
    }

    pub fn position(&self, id: BladeId) -> Option<Vec3> {
        self.slot(id).map(|(c, s)| self.chunks[c].positions[s])
    }

    pub fn is_regrow_pending(&self, id: BladeId) -> bool {
        self.slot(id).is_some_and(|(c, s)| self.chunks[c].regrow_pending[s])
    }

    /// Apply `f` to the blade's grow value, clamping the result to [0, 1].
    /// Returns the new value, or `None` for a stale handle.
    pub fn update_grow(&mut self, id: BladeId, f: impl FnOnce(f32) -> f32) -> Option<f32> {
        let (c, s) = self.slot(id)?;
        let bend = &mut self.chunks[c].bends[s];
        bend.grow = f(bend.grow).clamp(0.0, 1.0);
        Some(bend.grow)
    }

    pub fn set_regrow_pending(&mut self, id: BladeId, pending: bool) -> bool {
        match self.slot(id) {
            Some((c, s)) => {
                self.chunks[c].regrow_pending[s] = pending;
                true
            }
            None => false,
        }
    }

    /// Tombstone a blade: its transform collapses to zero scale and its
    /// handle goes stale. The slot keeps its chunk position.
    pub fn remove(&mut self, id: BladeId) -> bool {
        let Some((c, s)) = self.slot(id) else {
            return false;
        };
        let chunk = &mut self.chunks[c];
        chunk.alive[s] = false;
        chunk.generations[s] = chunk.generations[s].wrapping_add(1);
        chunk.transforms[s] = Mat4::ZERO;
        chunk.bends[s] = Bend::default();
        chunk.regrow_pending[s] = false;
        self.live -= 1;
        true
    }
}

/// Anchor + horizontal jitter inside a sphere of the configured radius + fixed offset.
fn spawn_position<R: Rng + ?Sized>(anchor: Vec3, population: &PopulationConfig, rng: &mut R) -> Vec3 {
    let mut jitter = if population.spawn_jitter_radius > 0.0 {
        random_in_unit_sphere(rng) * population.spawn_jitter_radius
    } else {
        Vec3::ZERO
    };
    jitter.y = 0.0;
    anchor + jitter + population.spawn_offset
}

fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FloatRange;
    use crate::grass::config::ChunkAllocation;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn line_scan(n: usize) -> ScanResult {
        ScanResult::from_points((0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect())
    }

    fn populated(n: usize, layout: ChunkLayout) -> BladeField {
        let mut field = BladeField::new(layout);
        let mut rng = SmallRng::seed_from_u64(1);
        field
            .populate(&line_scan(n), &PopulationConfig::default(), &CutConfig::default(), &mut rng)
            .unwrap();
        field
    }

    #[test]
    fn test_partitioning() {
        let layout = ChunkLayout { capacity: 4, allocation: ChunkAllocation::ExtraTrailing };
        let field = populated(10, layout);
        assert_eq!(field.chunk_count(), 3);
        assert_eq!(field.chunks()[0].len(), 4);
        assert_eq!(field.chunks()[1].len(), 4);
        assert_eq!(field.chunks()[2].len(), 2);

        for i in 0..10 {
            let id = field.id_at(i).unwrap();
            let (chunk, slot) = (i / 4, i % 4);
            let pos = field.chunks()[chunk].positions()[slot];
            assert_eq!(field.position(id), Some(pos));
        }
    }

    #[test]
    fn test_exact_multiple_keeps_trailing_chunk() {
        let field = populated(8, ChunkLayout { capacity: 4, allocation: ChunkAllocation::ExtraTrailing });
        assert_eq!(field.chunk_count(), 3);
        assert!(field.chunks()[2].is_empty());

        let field = populated(8, ChunkLayout { capacity: 4, allocation: ChunkAllocation::Exact });
        assert_eq!(field.chunk_count(), 2);
    }

    #[test]
    fn test_initial_state() {
        let field = populated(5, ChunkLayout::default());
        for i in 0..5 {
            let id = field.id_at(i).unwrap();
            assert_eq!(field.bend(id), Some(Bend::UPRIGHT));
            assert!(!field.is_regrow_pending(id));
        }
        assert_eq!(field.live_count(), 5);
    }

    #[test]
    fn test_spawn_jitter_is_horizontal_and_bounded() {
        let population = PopulationConfig {
            mesh_scale: Vec3::new(1.0, 2.0, 1.0),
            spawn_offset: Vec3::new(0.0, 0.5, 0.0),
            spawn_jitter_radius: 0.25,
        };
        let mut field = BladeField::new(ChunkLayout::default());
        let mut rng = SmallRng::seed_from_u64(3);
        let scan = line_scan(200);
        field.populate(&scan, &population, &CutConfig::default(), &mut rng).unwrap();

        for (i, anchor) in scan.points().iter().enumerate() {
            let id = field.id_at(i).unwrap();
            let pos = field.position(id).unwrap();
            assert_eq!(pos.y, 0.5);
            let offset = pos - *anchor - population.spawn_offset;
            assert!(offset.length() <= 0.25 + 1e-5);
        }

        let transform = field.chunks()[0].transforms()[0];
        let (scale, rotation, _) = transform.to_scale_rotation_translation();
        assert!((scale - population.mesh_scale).length() < 1e-5);
        assert!(rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn test_presampled_growth() {
        let cut = CutConfig {
            grow_speed_range: FloatRange::new(0.5, 0.6),
            grow_delay_range: FloatRange::new(1.0, 2.0),
            sampling: GrowthSampling::AtPopulation,
        };
        let mut field = BladeField::new(ChunkLayout::default());
        let mut rng = SmallRng::seed_from_u64(3);
        field.populate(&line_scan(50), &PopulationConfig::default(), &cut, &mut rng).unwrap();
        for slot in 0..50 {
            let (speed, delay) = field.chunks()[0].growth(slot);
            assert!(cut.grow_speed_range.contains(speed));
            assert!(cut.grow_delay_range.contains(delay));
        }
    }

    #[test]
    fn test_grow_is_clamped() {
        let mut field = populated(1, ChunkLayout::default());
        let id = field.id_at(0).unwrap();
        assert_eq!(field.update_grow(id, |g| g + 5.0), Some(1.0));
        assert_eq!(field.update_grow(id, |g| g - 5.0), Some(0.0));
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let mut field = populated(3, ChunkLayout::default());
        let id = field.id_at(1).unwrap();
        assert!(field.remove(id));
        assert!(!field.is_live(id));
        assert!(!field.remove(id));
        assert!(field.id_at(1).is_none());
        assert_eq!(field.update_grow(id, |_| 0.5), None);
        assert_eq!(field.chunks()[0].transforms()[1], Mat4::ZERO);
        assert_eq!(field.live_count(), 2);
        assert_eq!(field.len(), 3);
    }

    #[test]
    fn test_repopulate_invalidates_handles() {
        let mut field = populated(3, ChunkLayout::default());
        let old = field.id_at(0).unwrap();
        let mut rng = SmallRng::seed_from_u64(9);
        field
            .populate(&line_scan(3), &PopulationConfig::default(), &CutConfig::default(), &mut rng)
            .unwrap();
        assert!(!field.is_live(old));
        assert!(field.is_live(field.id_at(0).unwrap()));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut field = BladeField::new(ChunkLayout { capacity: 0, allocation: ChunkAllocation::Exact });
        let mut rng = SmallRng::seed_from_u64(1);
        let err = field
            .populate(&line_scan(2), &PopulationConfig::default(), &CutConfig::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_chunk_push_over_capacity() {
        let mut chunk = Chunk::with_capacity(1);
        chunk.push(Mat4::IDENTITY, (0.0, 0.0), 0).unwrap();
        let err = chunk.push(Mat4::IDENTITY, (0.0, 0.0), 0).unwrap_err();
        assert!(matches!(err, Error::InstancingLimitExceeded { requested: 2, capacity: 1 }));
    }
}
