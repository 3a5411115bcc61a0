//! Meadow - interactive instanced grass
//!
//! Scans a scene for placement points, populates a chunked field of grass
//! blades, lets cutters and flatteners deform it every tick, regrows cut
//! blades after a delay, and packs the field into instanced draw calls.

pub mod core;
pub mod math;
pub mod scan;
pub mod grass;
pub mod render;
