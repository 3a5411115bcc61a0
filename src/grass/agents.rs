//! Cutter and flattener agents.
//!
//! Agents are owned and moved by the host through an [`AgentRoster`]. Once
//! per tick the [`AgentTracker`] copies their positions and parameters into
//! flat arrays so every blade in that tick sees the same configuration.

use glam::Vec3;

/// Anything with a position and a squared-distance reach.
pub trait PositionedThreshold {
    fn position(&self) -> Vec3;
    /// Squared distance below which the agent acts on a blade.
    fn threshold_sq(&self) -> f32;
}

/// A positioned agent that also pushes blades over.
pub trait PositionedThresholdWithForce: PositionedThreshold {
    fn bend_force(&self) -> f32;
}

/// Shortens blades it passes over.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cutter {
    pub position: Vec3,
    /// Compared against squared distance.
    pub cut_distance_sq: f32,
}

impl Cutter {
    pub fn new(position: Vec3, cut_distance_sq: f32) -> Self {
        Self { position, cut_distance_sq }
    }
}

impl PositionedThreshold for Cutter {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn threshold_sq(&self) -> f32 {
        self.cut_distance_sq
    }
}

/// Lays blades over, away from its position.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Flattener {
    pub position: Vec3,
    /// Compared against squared distance.
    pub flatten_distance_sq: f32,
    /// Upper bound on the lean this flattener can impose.
    pub bend_force: f32,
}

impl Flattener {
    pub fn new(position: Vec3, flatten_distance_sq: f32, bend_force: f32) -> Self {
        Self { position, flatten_distance_sq, bend_force }
    }
}

impl PositionedThreshold for Flattener {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn threshold_sq(&self) -> f32 {
        self.flatten_distance_sq
    }
}

impl PositionedThresholdWithForce for Flattener {
    fn bend_force(&self) -> f32 {
        self.bend_force
    }
}

/// Handle returned when an agent joins a roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AgentHandle(u32);

/// Host-side agent lists. Agents may be added, moved and removed between
/// ticks; changes are picked up on the next snapshot.
pub struct AgentRoster<C = Cutter, F = Flattener> {
    cutters: Vec<(AgentHandle, C)>,
    flatteners: Vec<(AgentHandle, F)>,
    next_handle: u32,
}

impl<C, F> AgentRoster<C, F>
where
    C: PositionedThreshold,
    F: PositionedThresholdWithForce,
{
    pub fn new() -> Self {
        Self {
            cutters: Vec::new(),
            flatteners: Vec::new(),
            next_handle: 0,
        }
    }

    fn allocate(&mut self) -> AgentHandle {
        let handle = AgentHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        handle
    }

    pub fn add_cutter(&mut self, cutter: C) -> AgentHandle {
        let handle = self.allocate();
        self.cutters.push((handle, cutter));
        handle
    }

    pub fn add_flattener(&mut self, flattener: F) -> AgentHandle {
        let handle = self.allocate();
        self.flatteners.push((handle, flattener));
        handle
    }

    pub fn remove_cutter(&mut self, handle: AgentHandle) -> Option<C> {
        let pos = self.cutters.iter().position(|(h, _)| *h == handle)?;
        Some(self.cutters.remove(pos).1)
    }

    pub fn remove_flattener(&mut self, handle: AgentHandle) -> Option<F> {
        let pos = self.flatteners.iter().position(|(h, _)| *h == handle)?;
        Some(self.flatteners.remove(pos).1)
    }

    pub fn cutter_mut(&mut self, handle: AgentHandle) -> Option<&mut C> {
        self.cutters.iter_mut().find(|(h, _)| *h == handle).map(|(_, c)| c)
    }

    pub fn flattener_mut(&mut self, handle: AgentHandle) -> Option<&mut F> {
        self.flatteners.iter_mut().find(|(h, _)| *h == handle).map(|(_, f)| f)
    }

    pub fn cutters(&self) -> impl ExactSizeIterator<Item = &C> {
        self.cutters.iter().map(|(_, c)| c)
    }

    pub fn flatteners(&self) -> impl ExactSizeIterator<Item = &F> {
        self.flatteners.iter().map(|(_, f)| f)
    }

    pub fn cutter_count(&self) -> usize {
        self.cutters.len()
    }

    pub fn flattener_count(&self) -> usize {
        self.flatteners.len()
    }
}

impl<C, F> Default for AgentRoster<C, F>
where
    C: PositionedThreshold,
    F: PositionedThresholdWithForce,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Per-tick copy of every agent's state.
///
/// Parallel arrays per agent kind; only [`AgentTracker`] and
/// [`AgentSnapshot::from_arrays`] write them, so their lengths always agree.
#[derive(Clone, Debug, Default)]
pub struct AgentSnapshot {
    cutter_positions: Vec<Vec3>,
    cutter_thresholds_sq: Vec<f32>,
    flattener_positions: Vec<Vec3>,
    flattener_thresholds_sq: Vec<f32>,
    flattener_forces: Vec<f32>,
}

impl AgentSnapshot {
    /// Build a snapshot from host-side arrays.
    ///
    /// Parameter arrays are resized to match their position array. Missing
    /// entries become 0, which makes the agent inert.
    pub fn from_arrays(
        cutter_positions: Vec<Vec3>,
        mut cutter_thresholds_sq: Vec<f32>,
        flattener_positions: Vec<Vec3>,
        mut flattener_thresholds_sq: Vec<f32>,
        mut flattener_forces: Vec<f32>,
    ) -> Self {
        let cutters = cutter_positions.len();
        let flatteners = flattener_positions.len();
        if cutter_thresholds_sq.len() != cutters
            || flattener_thresholds_sq.len() != flatteners
            || flattener_forces.len() != flatteners
        {
            log::warn!(
                "Agent arrays disagree in size (cutters {}/{}, flatteners {}/{}/{}), resizing",
                cutters,
                cutter_thresholds_sq.len(),
                flatteners,
                flattener_thresholds_sq.len(),
                flattener_forces.len()
            );
        }
        cutter_thresholds_sq.resize(cutters, 0.0);
        flattener_thresholds_sq.resize(flatteners, 0.0);
        flattener_forces.resize(flatteners, 0.0);
        Self {
            cutter_positions,
            cutter_thresholds_sq,
            flattener_positions,
            flattener_thresholds_sq,
            flattener_forces,
        }
    }

    pub fn cutter_count(&self) -> usize {
        self.cutter_positions.len()
    }

    pub fn flattener_count(&self) -> usize {
        self.flattener_positions.len()
    }

    pub fn cutter_positions(&self) -> &[Vec3] {
        &self.cutter_positions
    }

    pub fn cutter_thresholds_sq(&self) -> &[f32] {
        &self.cutter_thresholds_sq
    }

    pub fn flattener_positions(&self) -> &[Vec3] {
        &self.flattener_positions
    }

    pub fn flattener_thresholds_sq(&self) -> &[f32] {
        &self.flattener_thresholds_sq
    }

    pub fn flattener_forces(&self) -> &[f32] {
        &self.flattener_forces
    }

    /// `(position, threshold_sq)` per cutter.
    pub fn cutters(&self) -> impl Iterator<Item = (Vec3, f32)> + '_ {
        self.cutter_positions
            .iter()
            .copied()
            .zip(self.cutter_thresholds_sq.iter().copied())
    }

    /// `(position, threshold_sq, bend_force)` per flattener.
    pub fn flatteners(&self) -> impl Iterator<Item = (Vec3, f32, f32)> + '_ {
        self.flattener_positions
            .iter()
            .copied()
            .zip(self.flattener_thresholds_sq.iter().copied())
            .zip(self.flattener_forces.iter().copied())
            .map(|((p, t), f)| (p, t, f))
    }
}

/// Pulls agent state into cached arrays once per tick.
#[derive(Debug, Default)]
pub struct AgentTracker {
    snapshot: AgentSnapshot,
}

impl AgentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &AgentSnapshot {
        &self.snapshot
    }

    /// Refresh from a roster.
    pub fn refresh<C, F>(&mut self, roster: &AgentRoster<C, F>)
    where
        C: PositionedThreshold,
        F: PositionedThresholdWithForce,
    {
        self.refresh_cutters(roster.cutters());
        self.refresh_flatteners(roster.flatteners());
    }

    /// Copy cutter state, reallocating the cached arrays when the count changed.
    pub fn refresh_cutters<'a, C, I>(&mut self, cutters: I)
    where
        C: PositionedThreshold + 'a,
        I: ExactSizeIterator<Item = &'a C>,
    {
        let snap = &mut self.snapshot;
        if snap.cutter_positions.len() != cutters.len() {
            log::debug!(
                "Cutter count changed {} -> {}, reallocating",
                snap.cutter_positions.len(),
                cutters.len()
            );
            snap.cutter_positions = vec![Vec3::ZERO; cutters.len()];
            snap.cutter_thresholds_sq = vec![0.0; cutters.len()];
        }
        for (i, cutter) in cutters.enumerate() {
            snap.cutter_positions[i] = cutter.position();
            snap.cutter_thresholds_sq[i] = cutter.threshold_sq();
        }
    }

    /// Copy flattener state, reallocating the cached arrays when the count changed.
    pub fn refresh_flatteners<'a, F, I>(&mut self, flatteners: I)
    where
        F: PositionedThresholdWithForce + 'a,
        I: ExactSizeIterator<Item = &'a F>,
    {
        let snap = &mut self.snapshot;
        if snap.flattener_positions.len() != flatteners.len() {
            log::debug!(
                "Flattener count changed {} -> {}, reallocating",
                snap.flattener_positions.len(),
                flatteners.len()
            );
            snap.flattener_positions = vec![Vec3::ZERO; flatteners.len()];
            snap.flattener_thresholds_sq = vec![0.0; flatteners.len()];
            snap.flattener_forces = vec![0.0; flatteners.len()];
        }
        for (i, flattener) in flatteners.enumerate() {
            snap.flattener_positions[i] = flattener.position();
            snap.flattener_thresholds_sq[i] = flattener.threshold_sq();
            snap.flattener_forces[i] = flattener.bend_force();
        }
    }
}
