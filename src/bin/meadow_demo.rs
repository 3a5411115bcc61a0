//! Headless meadow run: scan a box world, populate grass, drive a cutter
//! and a flattener around the field and log what happens.
//!
//! Usage: cargo run --release --bin meadow_demo -- [--config grass.json] [--ticks 600] [--save scan.bin | --load scan.bin]

use std::path::PathBuf;

use glam::Vec3;

use meadow::core::Result;
use meadow::core::time::TickClock;
use meadow::grass::{AgentRoster, Cutter, CutEffectTrigger, CutParticleQueue, Flattener, GrassConfig, GrassSystem};
use meadow::math::Aabb;
use meadow::render::{GrassMaterial, MaterialHandle, MeshHandle, RecordingBackend};
use meadow::scan::{persist, ScanConfig, SpatialScanner, SurfaceSet};

const GROUND_LAYER: u8 = 0;
const ROCK_LAYER: u8 = 1;
const ORBIT_RADIUS: f32 = 12.0;

struct Args {
    config: Option<PathBuf>,
    ticks: u64,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let value = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    Args {
        config: value("--config").map(PathBuf::from),
        ticks: value("--ticks").and_then(|t| t.parse().ok()).unwrap_or(600),
        save: value("--save").map(PathBuf::from),
        load: value("--load").map(PathBuf::from),
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            log::info!("Loading grass config from {}", path.display());
            GrassConfig::from_json_file(path)?
        }
        None => GrassConfig::default(),
    };

    // A 40x40 lawn with a rock in the middle that grass should avoid
    let lawn_bounds = Aabb::new(Vec3::new(-20.0, -1.0, -20.0), Vec3::new(20.0, 0.0, 20.0));
    let rock_bounds = Aabb::from_center_half_extent(Vec3::new(0.0, 1.0, 0.0), Vec3::new(3.0, 1.0, 3.0));
    let mut world = SurfaceSet::new();
    let lawn = world.add_box(lawn_bounds, GROUND_LAYER);
    world.add_box(rock_bounds, ROCK_LAYER);

    let mut scanner = SpatialScanner::new(ScanConfig::default());
    if let Some(path) = &args.load {
        scanner.set_result(persist::load_scan(path)?);
        log::info!("Loaded {} anchors from {}", scanner.result().len(), path.display());
    } else {
        let volume = lawn_bounds.merged(&rock_bounds);
        let report = scanner.scan(&world, &volume, &[lawn]);
        log::info!(
            "Scan: {} probes, {} hits, {} anchors{}",
            report.probes,
            report.hits,
            report.accepted,
            if report.cap_reached { " (iteration cap reached)" } else { "" }
        );
    }

    if let Some(path) = &args.save {
        persist::save_scan(path, scanner.result())?;
        log::info!("Saved scan to {}", path.display());
    }

    let material = GrassMaterial { handle: MaterialHandle(0), ..Default::default() };
    let mut grass = GrassSystem::new(config, MeshHandle(0), material);
    grass.populate(scanner.result())?;

    let mut roster: AgentRoster = AgentRoster::new();
    let mower = roster.add_cutter(Cutter::new(Vec3::ZERO, 1.5 * 1.5));
    let walker = roster.add_flattener(Flattener::new(Vec3::ZERO, 2.0 * 2.0, 0.8));

    let mut particles = CutParticleQueue::default();
    let mut backend = RecordingBackend::new();
    let mut clock = TickClock::new().with_target_rate(60.0);
    let mut elapsed = 0.0f32;
    let mut total_cuts = 0usize;
    let orbit_center = lawn_bounds.center() * Vec3::new(1.0, 0.0, 1.0);

    for tick in 0..args.ticks {
        clock.wait_for_next_tick();
        clock.tick();
        let dt = clock.delta_secs();
        elapsed += dt;

        let angle = elapsed * 0.5;
        if let Some(cutter) = roster.cutter_mut(mower) {
            cutter.position = orbit_center + Vec3::new(angle.cos(), 0.0, angle.sin()) * ORBIT_RADIUS;
        }
        if let Some(flattener) = roster.flattener_mut(walker) {
            flattener.position = orbit_center + Vec3::new(-angle.sin(), 0.0, angle.cos()) * (ORBIT_RADIUS * 0.5);
        }

        backend.clear();
        let stats = {
            let mut emitters: [&mut dyn CutEffectTrigger; 1] = [&mut particles];
            grass.tick(dt, &roster, &mut emitters, &mut backend)?
        };
        total_cuts += stats.cuts;
        particles.drain();

        if tick % 60 == 0 {
            log::info!(
                "tick {}: {} blades, {} cuts, {} regrowing, {} draws ({} instances), {:.2}ms",
                tick,
                stats.blades,
                stats.cuts,
                stats.regrowth_active,
                stats.draw_calls,
                backend.instance_total(),
                stats.elapsed.as_secs_f32() * 1000.0
            );
        }
    }

    let rate = clock.stats();
    log::info!(
        "Done: {} ticks, {} cuts, {} still regrowing, {} budget overruns, {:.1} ticks/s avg",
        rate.tick_count,
        total_cuts,
        grass.scheduler().len(),
        grass.budget_overruns(),
        rate.avg
    );
    Ok(())
}

fn main() {
    meadow::core::logging::init();

    if let Err(e) = run(parse_args()) {
        log::error!("meadow_demo failed: {}", e);
        std::process::exit(1);
    }
}
