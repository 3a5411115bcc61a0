//! Tick timing utilities

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tick-rate statistics over the recent history window
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct TickRateStats {
    pub avg: f32,
    pub min: f32,
    pub max: f32,
    pub tick_count: u64,
}

/// Measures the simulated delta between ticks.
///
/// The delta handed to the simulation is the real elapsed time clamped to
/// `max_delta`, so a stalled host (debugger, window drag) does not produce
/// one huge regrowth step. An optional target rate paces the loop.
pub struct TickClock {
    last_tick: Instant,
    delta: Duration,
    max_delta: Duration,
    target_interval: Option<Duration>,
    tick_count: u64,
    /// Ring buffer of (timestamp, tick_time_secs), pruned to `history`
    tick_history: VecDeque<(Instant, f32)>,
    history: Duration,
}

impl TickClock {
    /// Create a clock with a 100ms delta clamp and no pacing
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta: Duration::ZERO,
            max_delta: Duration::from_millis(100),
            target_interval: None,
            tick_count: 0,
            tick_history: VecDeque::new(),
            history: Duration::from_secs(5),
        }
    }

    /// Set the upper bound for a single tick's delta
    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = max_delta;
        self
    }

    /// Pace `wait_for_next_tick` to the given rate. Zero or negative disables pacing.
    pub fn with_target_rate(mut self, ticks_per_sec: f32) -> Self {
        self.target_interval = if ticks_per_sec > 0.0 && ticks_per_sec.is_finite() {
            Some(Duration::from_secs_f32(1.0 / ticks_per_sec))
        } else {
            None
        };
        self
    }

    /// Call once per tick to update timing
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = (now - self.last_tick).min(self.max_delta);
        self.last_tick = now;
        self.tick_count += 1;

        self.tick_history.push_back((now, self.delta.as_secs_f32()));

        let cutoff = now.checked_sub(self.history).unwrap_or(now);
        while let Some(&(timestamp, _)) = self.tick_history.front() {
            if timestamp < cutoff {
                self.tick_history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Sleep until the next tick is due when a target rate is set
    pub fn wait_for_next_tick(&self) {
        if let Some(interval) = self.target_interval {
            let elapsed = self.last_tick.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
    }

    /// Clamped delta of the last tick in seconds
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Rolling tick-rate statistics over the history window
    pub fn stats(&self) -> TickRateStats {
        let mut total_time = 0.0f32;
        let mut min_rate = f32::INFINITY;
        let mut max_rate = 0.0f32;
        let mut count = 0usize;

        for &(_, tick_time) in self.tick_history.iter() {
            count += 1;
            total_time += tick_time;
            let rate = if tick_time > 0.0 { 1.0 / tick_time } else { 0.0 };
            min_rate = min_rate.min(rate);
            max_rate = max_rate.max(rate);
        }

        if count == 0 {
            min_rate = 0.0;
        }

        TickRateStats {
            avg: if total_time > 0.0 { count as f32 / total_time } else { 0.0 },
            min: min_rate,
            max: max_rate,
            tick_count: self.tick_count,
        }
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
