//! Delayed regrowth after a cut.
//!
//! Each cut blade gets one task: wait `delay` seconds, then add
//! `speed * dt` to its grow value every tick until it reaches 1. Tasks hold
//! only a [`BladeId`] and drop themselves when the handle goes stale.

use std::collections::HashMap;

use super::field::{BladeField, BladeId};

/// Phase of a regrowth task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RegrowthState {
    Waiting { remaining: f32 },
    Growing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegrowthTask {
    pub blade: BladeId,
    pub speed: f32,
    pub state: RegrowthState,
}

/// What one `advance` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegrowthReport {
    /// Tasks that brought their blade back to full height.
    pub completed: usize,
    /// Tasks dropped because their blade no longer exists.
    pub cancelled: usize,
}

/// Active regrowth tasks, at most one per blade.
#[derive(Debug, Default)]
pub struct RegrowthScheduler {
    tasks: HashMap<u32, RegrowthTask>,
}

impl RegrowthScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) regrowth for a blade.
    pub fn schedule(&mut self, blade: BladeId, delay: f32, speed: f32) {
        let task = RegrowthTask {
            blade,
            speed: speed.max(0.0),
            state: RegrowthState::Waiting { remaining: delay.max(0.0) },
        };
        if self.tasks.insert(blade.index, task).is_some() {
            log::trace!("Regrowth restarted for blade {}", blade.index);
        }
    }

    /// Drop a blade's task without touching the blade.
    pub fn cancel(&mut self, blade: BladeId) -> bool {
        match self.tasks.get(&blade.index) {
            Some(task) if task.blade == blade => {
                self.tasks.remove(&blade.index);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, blade: BladeId) -> Option<&RegrowthTask> {
        self.tasks.get(&blade.index).filter(|t| t.blade == blade)
    }

    /// Step every task by `dt` seconds.
    ///
    /// Time left over when a delay expires mid-tick is spent growing, so a
    /// blade's height is `speed * (elapsed - delay)` regardless of tick size.
    pub fn advance(&mut self, field: &mut BladeField, dt: f32) -> RegrowthReport {
        let mut report = RegrowthReport::default();
        let dt = dt.max(0.0);

        self.tasks.retain(|_, task| {
            if !field.is_live(task.blade) {
                report.cancelled += 1;
                return false;
            }

            let grow_time = match task.state {
                RegrowthState::Waiting { remaining } => {
                    let remaining = remaining - dt;
                    if remaining > 0.0 {
                        task.state = RegrowthState::Waiting { remaining };
                        return true;
                    }
                    task.state = RegrowthState::Growing;
                    -remaining
                }
                RegrowthState::Growing => dt,
            };

            let speed = task.speed;
            let grow = field
                .update_grow(task.blade, |g| g + speed * grow_time)
                .unwrap_or(1.0);
            if grow >= 1.0 {
                field.set_regrow_pending(task.blade, false);
                report.completed += 1;
                false
            } else {
                true
            }
        });

        if report.cancelled > 0 {
            log::debug!("Dropped {} regrowth tasks for removed blades", report.cancelled);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grass::config::{ChunkLayout, CutConfig, PopulationConfig};
    use crate::scan::ScanResult;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn field_with(n: usize) -> BladeField {
        let mut field = BladeField::new(ChunkLayout::default());
        let scan = ScanResult::from_points(vec![Vec3::ZERO; n]);
        let mut rng = SmallRng::seed_from_u64(5);
        field.populate(&scan, &PopulationConfig::default(), &CutConfig::default(), &mut rng).unwrap();
        field
    }

    fn cut(field: &mut BladeField, id: BladeId) {
        field.update_grow(id, |_| 0.0);
        field.set_regrow_pending(id, true);
    }

    #[test]
    fn test_delay_then_linear_growth() {
        let mut field = field_with(1);
        let id = field.id_at(0).unwrap();
        cut(&mut field, id);

        let mut sched = RegrowthScheduler::new();
        sched.schedule(id, 1.0, 0.5);

        // 4 ticks of 0.25s: still waiting
        for _ in 0..4 {
            sched.advance(&mut field, 0.25);
            assert_eq!(field.bend(id).unwrap().grow, 0.0);
        }

        // Growth at 0.5/s
        sched.advance(&mut field, 0.25);
        assert_eq!(field.bend(id).unwrap().grow, 0.125);
        sched.advance(&mut field, 0.25);
        assert_eq!(field.bend(id).unwrap().grow, 0.25);
        assert!(field.is_regrow_pending(id));
    }

    #[test]
    fn test_overflow_time_counts_as_growth() {
        let mut field = field_with(1);
        let id = field.id_at(0).unwrap();
        cut(&mut field, id);

        let mut sched = RegrowthScheduler::new();
        sched.schedule(id, 0.75, 1.0);
        sched.advance(&mut field, 0.5);
        assert_eq!(field.bend(id).unwrap().grow, 0.0);
        sched.advance(&mut field, 0.5);
        assert_eq!(field.bend(id).unwrap().grow, 0.25);
    }

    #[test]
    fn test_completes_and_clears_pending() {
        let mut field = field_with(1);
        let id = field.id_at(0).unwrap();
        cut(&mut field, id);

        let mut sched = RegrowthScheduler::new();
        sched.schedule(id, 0.0, 2.0);
        let mut completed = 0;
        let mut last = 0.0;
        for _ in 0..10 {
            completed += sched.advance(&mut field, 0.25).completed;
            let grow = field.bend(id).unwrap().grow;
            assert!(grow >= last && grow <= 1.0);
            last = grow;
        }
        assert_eq!(completed, 1);
        assert_eq!(last, 1.0);
        assert!(sched.is_empty());
        assert!(!field.is_regrow_pending(id));
    }

    #[test]
    fn test_reschedule_restarts() {
        let mut field = field_with(1);
        let id = field.id_at(0).unwrap();
        cut(&mut field, id);

        let mut sched = RegrowthScheduler::new();
        sched.schedule(id, 0.5, 1.0);
        sched.advance(&mut field, 0.5);
        sched.advance(&mut field, 0.25);
        assert_eq!(field.bend(id).unwrap().grow, 0.25);

        cut(&mut field, id);
        sched.schedule(id, 1.0, 1.0);
        assert_eq!(sched.len(), 1);
        assert_eq!(sched.task(id).unwrap().state, RegrowthState::Waiting { remaining: 1.0 });
        sched.advance(&mut field, 0.5);
        assert_eq!(field.bend(id).unwrap().grow, 0.0);
    }

    #[test]
    fn test_removed_blade_cancels_without_mutation() {
        let mut field = field_with(2);
        let gone = field.id_at(0).unwrap();
        let kept = field.id_at(1).unwrap();
        cut(&mut field, gone);
        cut(&mut field, kept);

        let mut sched = RegrowthScheduler::new();
        sched.schedule(gone, 0.0, 1.0);
        sched.schedule(kept, 0.0, 1.0);
        field.remove(gone);

        let report = sched.advance(&mut field, 0.25);
        assert_eq!(report.cancelled, 1);
        assert_eq!(sched.len(), 1);
        assert_eq!(field.chunks()[0].bends()[0].grow, 0.0);
        assert_eq!(field.bend(kept).unwrap().grow, 0.25);
    }

    #[test]
    fn test_repopulation_cancels_all() {
        let mut field = field_with(3);
        let mut sched = RegrowthScheduler::new();
        for i in 0..3 {
            let id = field.id_at(i).unwrap();
            cut(&mut field, id);
            sched.schedule(id, 0.0, 1.0);
        }
        let mut rng = SmallRng::seed_from_u64(1);
        field
            .populate(&ScanResult::from_points(vec![Vec3::ZERO; 3]), &PopulationConfig::default(), &CutConfig::default(), &mut rng)
            .unwrap();
        let report = sched.advance(&mut field, 0.1);
        assert_eq!(report.cancelled, 3);
        for i in 0..3 {
            assert_eq!(field.bend(field.id_at(i).unwrap()).unwrap().grow, 1.0);
        }
    }

    #[test]
    fn test_cancel_checks_generation() {
        let mut field = field_with(1);
        let id = field.id_at(0).unwrap();
        let mut sched = RegrowthScheduler::new();
        sched.schedule(id, 1.0, 1.0);
        let stale = BladeId { index: id.index, generation: id.generation.wrapping_sub(1) };
        assert!(!sched.cancel(stale));
        assert!(sched.cancel(id));
        assert!(sched.is_empty());
    }
}
