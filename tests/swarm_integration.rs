//! Integration tests for Swarm Siege
//!
//! These drive the public `World` API end-to-end:
//! - aggression waves travelling one hop per tick
//! - swimmer quorum votes
//! - objective damage and destruction
//! - reset and respawn
//! - physical invariants over long runs

use swarm_siege::core::config::SimulationConfig;
use swarm_siege::core::types::{ObjectiveId, Vec2};
use swarm_siege::ecs::world::World;
use swarm_siege::entity::agent::AgentState;
use swarm_siege::entity::archetype::Archetype;
use swarm_siege::environment::EnvironmentKind;
use swarm_siege::simulation::pheromone::PheromoneKind;
use swarm_siege::simulation::tick::SimulationEvent;

const DT: f32 = 0.05;

fn world() -> World {
    World::new(SimulationConfig::default()).unwrap()
}

// ============================================================================
// Message Propagation
// ============================================================================

#[test]
fn test_aggression_wave_advances_one_hop_per_tick() {
    let mut world = world();
    // 120 apart: each flyer hears only its direct neighbors (communication 150)
    let chain: Vec<_> = (0..5)
        .map(|i| {
            world
                .spawn_at(
                    Archetype::Flyer,
                    EnvironmentKind::Air,
                    Vec2::new(100.0 + 120.0 * i as f32, 100.0),
                )
                .unwrap()
        })
        .collect();
    // Out of everyone's perception; nearest agent is chain[0]
    world.place_objective(Vec2::new(100.0, 400.0)).unwrap();

    assert!(world.agent(chain[0]).unwrap().aggressive);
    assert!(!world.agent(chain[1]).unwrap().aggressive);

    for tick in 1..chain.len() {
        world.tick(DT);
        assert!(
            world.agent(chain[tick]).unwrap().aggressive,
            "distance {tick} should be aggressive after {tick} ticks"
        );
        if tick + 1 < chain.len() {
            assert!(
                !world.agent(chain[tick + 1]).unwrap().aggressive,
                "distance {} reached early at tick {tick}",
                tick + 1
            );
        }
    }

    let relayed = world.agent(chain[4]).unwrap();
    assert_eq!(relayed.objective, Some(ObjectiveId(0)));
    assert_eq!(relayed.attack_priority, 8);
    assert_eq!(relayed.state, AgentState::Seeking);
}

#[test]
fn test_lone_flyer_far_from_objective_stays_idle() {
    let mut world = world();
    let id = world
        .spawn_at(Archetype::Flyer, EnvironmentKind::Air, Vec2::new(300.0, 300.0))
        .unwrap();
    world.place_objective(Vec2::new(500.0, 300.0)).unwrap();

    for _ in 0..10 {
        world.tick(DT);
    }

    let flyer = world.agent(id).unwrap();
    assert_eq!(flyer.state, AgentState::Idle);
    assert_eq!(flyer.objective, None);
    assert_eq!(world.objectives[0].health, world.objectives[0].max_health);
}

#[test]
fn test_nearby_agent_discovers_and_attacks() {
    let mut world = world();
    let id = world
        .spawn_at(Archetype::Flyer, EnvironmentKind::Air, Vec2::new(210.0, 200.0))
        .unwrap();
    let objective = world.place_objective(Vec2::new(200.0, 200.0)).unwrap();

    world.tick(0.1);

    let flyer = world.agent(id).unwrap();
    assert_eq!(flyer.objective, Some(objective));
    assert_eq!(flyer.state, AgentState::Attacking);
    assert!(world.objective(objective).unwrap().health < 100.0);
    assert!(world
        .drain_events()
        .iter()
        .any(|e| matches!(e, SimulationEvent::TargetDiscovered { .. })));
}

// ============================================================================
// Voting
// ============================================================================

fn voting_world(near_a: usize, near_b: usize) -> (World, ObjectiveId) {
    let mut world = world();
    let a = world.place_objective(Vec2::new(200.0, 200.0)).unwrap();
    world.place_objective(Vec2::new(900.0, 500.0)).unwrap();
    for i in 0..near_a {
        world
            .spawn_at(
                Archetype::Swimmer,
                EnvironmentKind::Water,
                Vec2::new(160.0 + 10.0 * i as f32, 250.0),
            )
            .unwrap();
    }
    for i in 0..near_b {
        world
            .spawn_at(
                Archetype::Swimmer,
                EnvironmentKind::Water,
                Vec2::new(860.0 + 10.0 * i as f32, 550.0),
            )
            .unwrap();
    }
    (world, a)
}

#[test]
fn test_six_of_ten_swimmers_surge() {
    let (mut world, a) = voting_world(6, 4);
    world.tick(DT);

    assert_eq!(world.surge, Some(a));
    assert_eq!(world.stats.surges, 1);
    let events = world.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        SimulationEvent::SurgeStarted { objective, votes: 6, voters: 10, .. } if *objective == a
    )));
}

#[test]
fn test_five_five_split_does_not_surge() {
    let (mut world, _) = voting_world(5, 5);
    world.tick(DT);
    assert_eq!(world.surge, None);
    assert_eq!(world.stats.surges, 0);
}

// ============================================================================
// Objectives
// ============================================================================

#[test]
fn test_objective_destroyed_once_and_stays_inert() {
    let mut config = SimulationConfig::default();
    config.combat.objective_max_health = 1.0;
    let mut world = World::new(config).unwrap();
    let id = world
        .spawn_at(Archetype::Flyer, EnvironmentKind::Air, Vec2::new(205.0, 200.0))
        .unwrap();
    let objective = world.place_objective(Vec2::new(200.0, 200.0)).unwrap();

    for _ in 0..30 {
        world.tick(0.1);
    }

    let target = world.objective(objective).unwrap();
    assert!(target.destroyed);
    assert_eq!(target.health, 0.0);

    let destroyed = world
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SimulationEvent::ObjectiveDestroyed { .. }))
        .count();
    assert_eq!(destroyed, 1);
    assert_eq!(world.stats.objectives_destroyed, 1);
    assert!((world.stats.total_damage - 1.0).abs() < 1e-6);

    let flyer = world.agent(id).unwrap();
    assert_eq!(flyer.objective, None);
    assert_ne!(flyer.state, AgentState::Attacking);
}

// ============================================================================
// Reset and Invariants
// ============================================================================

#[test]
fn test_reset_then_spawn_round_trip() {
    let mut world = world();
    world.spawn(Archetype::Crawler, 40, EnvironmentKind::Ground).unwrap();
    world.place_objective(Vec2::new(640.0, 360.0)).unwrap();
    world.place_obstacle(Vec2::new(300.0, 300.0), 25.0).unwrap();
    for _ in 0..20 {
        world.tick(DT);
    }
    assert!(world.pheromones.total_mass(PheromoneKind::Trail) > 0.0);

    world.reset();
    let ids = world.spawn(Archetype::Flyer, 50, EnvironmentKind::Air).unwrap();

    assert_eq!(ids.len(), 50);
    assert_eq!(world.agent_count(), 50);
    assert!(world.objectives.is_empty());
    assert!(world.obstacles.is_empty());
    assert_eq!(world.pheromones.total_mass(PheromoneKind::Trail), 0.0);
    assert_eq!(world.pheromones.total_mass(PheromoneKind::Alarm), 0.0);
    assert_eq!(world.current_tick, 0);
}

#[test]
fn test_physical_invariants_hold_over_mixed_run() {
    let mut world = world();
    world.spawn(Archetype::Flyer, 60, EnvironmentKind::Air).unwrap();
    world.spawn(Archetype::Swimmer, 60, EnvironmentKind::Water).unwrap();
    world.spawn(Archetype::Crawler, 60, EnvironmentKind::Ground).unwrap();
    world.place_obstacle(Vec2::new(400.0, 300.0), 40.0).unwrap();
    world.place_objective(Vec2::new(640.0, 360.0)).unwrap();
    world.place_objective(Vec2::new(200.0, 600.0)).unwrap();

    let max_energy = world.config.energy.max_energy;
    for _ in 0..120 {
        world.tick(1.0 / 30.0);
        for agent in &world.agents {
            assert!(agent.velocity.length() <= agent.max_speed + 1e-3);
            assert!(agent.last_force.length() <= agent.max_force + 1e-3);
            assert!(agent.position.x >= 0.0 && agent.position.x < world.width());
            assert!(agent.position.y >= 0.0 && agent.position.y < world.height());
            assert!((0.0..=max_energy).contains(&agent.energy));
        }
        for objective in &world.objectives {
            assert!(objective.health >= 0.0 && objective.health <= objective.max_health);
        }
    }
}

#[test]
fn test_parallel_and_sequential_runs_match() {
    let run = |parallel_threshold: usize| {
        let mut config = SimulationConfig::default();
        config.world.parallel_threshold = parallel_threshold;
        let mut world = World::new(config).unwrap();
        world.spawn(Archetype::Swimmer, 80, EnvironmentKind::Water).unwrap();
        world.place_objective(Vec2::new(640.0, 360.0)).unwrap();
        for _ in 0..30 {
            world.tick(DT);
        }
        world
            .agents
            .iter()
            .map(|a| (a.id, a.position.x, a.position.y, a.aggressive))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(1), run(usize::MAX));
}

#[test]
fn test_snapshot_reflects_world() {
    let mut world = world();
    world.spawn(Archetype::Flyer, 5, EnvironmentKind::Air).unwrap();
    world.place_objective(Vec2::new(640.0, 360.0)).unwrap();
    world.tick(DT);

    let snapshot = world.snapshot_with_field();
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.agents.len(), 5);
    assert_eq!(snapshot.objectives.len(), 1);
    let field = snapshot.field.expect("field requested");
    assert_eq!(field.trail.len(), field.width * field.height);
}
