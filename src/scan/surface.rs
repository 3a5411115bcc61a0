//! Box-collider world implementing [`SpatialQuery`].

use super::{LayerMask, RayHit, SpatialQuery, SurfaceId};
use crate::math::{Aabb, Ray};

#[derive(Clone, Debug)]
struct Surface {
    id: SurfaceId,
    bounds: Aabb,
    layer: u8,
}

/// Collection of axis-aligned box surfaces.
#[derive(Clone, Debug, Default)]
pub struct SurfaceSet {
    surfaces: Vec<Surface>,
    next_id: u32,
}

impl SurfaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a box on `layer` and return its identity.
    pub fn add_box(&mut self, bounds: Aabb, layer: u8) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.push(Surface { id, bounds, layer });
        id
    }

    pub fn remove(&mut self, id: SurfaceId) -> bool {
        let before = self.surfaces.len();
        self.surfaces.retain(|s| s.id != id);
        self.surfaces.len() != before
    }

    pub fn bounds(&self, id: SurfaceId) -> Option<Aabb> {
        self.surfaces.iter().find(|s| s.id == id).map(|s| s.bounds)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl SpatialQuery for SurfaceSet {
    fn raycast(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;

        for surface in &self.surfaces {
            if !mask.contains(surface.layer) {
                continue;
            }
            let Some((t_near, _)) = ray.intersects_aabb(&surface.bounds) else {
                continue;
            };
            if t_near > max_distance {
                continue;
            }
            if best.is_none_or(|b| t_near < b.distance) {
                best = Some(RayHit {
                    point: ray.at(t_near),
                    distance: t_near,
                    surface: surface.id,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;

    fn ground_and_rock() -> (SurfaceSet, SurfaceId, SurfaceId) {
        let mut set = SurfaceSet::new();
        let ground = set.add_box(Aabb::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(10.0, 0.0, 10.0)), 0);
        let rock = set.add_box(Aabb::new(Vec3::new(4.0, 0.0, 4.0), Vec3::new(6.0, 2.0, 6.0)), 1);
        (set, ground, rock)
    }

    #[test]
    fn test_nearest_hit_wins() {
        let (set, _, rock) = ground_and_rock();
        let hit = set.raycast(&Ray::down(Vec3::new(5.0, 10.0, 5.0)), 1000.0, LayerMask::ALL).unwrap();
        assert_eq!(hit.surface, rock);
        assert_eq!(hit.point.y, 2.0);
    }

    #[test]
    fn test_layer_mask_hides_surface() {
        let (set, ground, _) = ground_and_rock();
        let hit = set.raycast(&Ray::down(Vec3::new(5.0, 10.0, 5.0)), 1000.0, LayerMask::only(0)).unwrap();
        assert_eq!(hit.surface, ground);
        assert_eq!(hit.point.y, 0.0);
    }

    #[test]
    fn test_max_distance_and_miss() {
        let (set, _, _) = ground_and_rock();
        assert!(set.raycast(&Ray::down(Vec3::new(1.0, 10.0, 1.0)), 5.0, LayerMask::ALL).is_none());
        assert!(set.raycast(&Ray::down(Vec3::new(20.0, 10.0, 1.0)), 1000.0, LayerMask::ALL).is_none());
    }

    #[test]
    fn test_remove() {
        let (mut set, _, rock) = ground_and_rock();
        assert!(set.remove(rock));
        assert!(!set.remove(rock));
        assert_eq!(set.len(), 1);
        assert!(set.bounds(rock).is_none());
    }
}
