use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use swarm_siege::core::config::SimulationConfig;
use swarm_siege::core::types::Vec2;
use swarm_siege::ecs::world::World;
use swarm_siege::entity::archetype::Archetype;

fn build_world(archetype: Archetype, agents: usize) -> World {
    let mut config = SimulationConfig::default();
    config.world.max_agents = agents;
    config.world.seed = 0xBEEF;
    let mut world = World::new(config).expect("default config is valid");
    world
        .spawn(archetype, agents, archetype.native_environment())
        .expect("spawn within capacity");
    world
        .place_objective(Vec2::new(640.0, 360.0))
        .expect("objective inside world");
    world
        .place_obstacle(Vec2::new(400.0, 300.0), 40.0)
        .expect("obstacle inside world");
    world
}

fn bench_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_tick");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(5));

    let steps = 32;
    for archetype in Archetype::ALL {
        // 200 runs sequentially, the larger swarms on rayon
        for agents in [200_usize, 1000, 2000] {
            group.bench_function(format!("{archetype:?}_{agents}_agents_{steps}_ticks"), |b| {
                b.iter_batched(
                    || build_world(archetype, agents),
                    |mut world| {
                        for _ in 0..steps {
                            world.tick(1.0 / 60.0);
                        }
                        world
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);
