use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::Vec3;

use meadow::grass::{AgentRoster, Cutter, CutEffectTrigger, CutParticleQueue, Flattener, GrassConfig, GrassSystem};
use meadow::render::{GrassMaterial, MeshHandle, RecordingBackend};
use meadow::scan::ScanResult;

fn grid(side: usize, spacing: f32) -> ScanResult {
    let half = side as f32 * spacing * 0.5;
    let points = (0..side * side)
        .map(|i| Vec3::new((i % side) as f32 * spacing - half, 0.0, (i / side) as f32 * spacing - half))
        .collect();
    ScanResult::from_points(points)
}

fn roster(cutters: usize, flatteners: usize) -> AgentRoster {
    let mut roster = AgentRoster::new();
    for i in 0..cutters {
        roster.add_cutter(Cutter::new(Vec3::new(i as f32 * 5.0, 0.0, 0.0), 1.0));
    }
    for i in 0..flatteners {
        roster.add_flattener(Flattener::new(Vec3::new(0.0, 0.0, i as f32 * 5.0), 4.0, 0.8));
    }
    roster
}

fn system(side: usize) -> GrassSystem {
    let mut grass = GrassSystem::new(GrassConfig::default(), MeshHandle(0), GrassMaterial::default());
    if let Err(e) = grass.populate(&grid(side, 0.3)) {
        panic!("populate failed: {}", e);
    }
    grass
}

fn bench_tick_50k(c: &mut Criterion) {
    let mut grass = system(224);
    let agents = roster(4, 4);
    let mut particles = CutParticleQueue::default();
    let mut backend = RecordingBackend::new();

    c.bench_function("grass_tick_50k_8_agents", |b| {
        b.iter(|| {
            backend.clear();
            particles.drain();
            let mut emitters: [&mut dyn CutEffectTrigger; 1] = [&mut particles];
            grass.tick(black_box(1.0 / 60.0), &agents, &mut emitters, &mut backend)
        });
    });
}

fn bench_tick_50k_no_agents(c: &mut Criterion) {
    let mut grass = system(224);
    let agents = roster(0, 0);
    let mut backend = RecordingBackend::new();

    c.bench_function("grass_tick_50k_idle", |b| {
        b.iter(|| {
            backend.clear();
            grass.tick(black_box(1.0 / 60.0), &agents, &mut [], &mut backend)
        });
    });
}

criterion_group!(benches, bench_tick_50k, bench_tick_50k_no_agents);
criterion_main!(benches);
