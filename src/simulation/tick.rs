//! Tick system - advances the swarm one fixed step
//!
//! Each tick runs four phases:
//! 1. Bookkeeping: clear per-tick damage, turn wind and currents, rebuild the
//!    spatial index, deliver last tick's messages, tally swimmer votes
//! 2. Decisions: every agent is decided against an immutable view of the
//!    world (in parallel above `parallel_threshold`), then the outcomes are
//!    merged in agent order
//! 3. Pheromones: apply deposits, evaporate, diffuse
//! 4. Damage: apply accumulated objective damage and report destructions
//!
//! Random draws happen sequentially before phase 2, so a run is fully
//! determined by its seed whether or not rayon is used.

use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::comms::voting::VotingProtocol;
use crate::core::types::{AgentId, ObjectiveId, Tick};
use crate::ecs::world::World;
use crate::entity::archetype::ArchetypeState;
use crate::simulation::behavior::{decide, nearest_visible, AgentDraws, AgentOutcome, Deposit, TickContext};

/// Events generated during a simulation tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimulationEvent {
    /// An agent spotted an objective on its own
    TargetDiscovered {
        agent: AgentId,
        objective: ObjectiveId,
        tick: Tick,
    },
    /// Swimmers reached quorum on an objective they were not surging on last tick
    SurgeStarted {
        objective: ObjectiveId,
        votes: usize,
        voters: usize,
        tick: Tick,
    },
    /// A flyer dove onto its objective
    DiveStrike {
        agent: AgentId,
        objective: ObjectiveId,
        damage: f32,
        tick: Tick,
    },
    /// An agent ran low on energy and started resting
    AgentRested { agent: AgentId, tick: Tick },
    /// A resting agent recovered
    AgentRecovered { agent: AgentId, tick: Tick },
    ObjectiveDestroyed { objective: ObjectiveId, tick: Tick },
}

/// Run a single simulation tick of length `dt`
///
/// The caller is responsible for rejecting invalid `dt` and for pausing;
/// see `World::tick`.
pub fn run_simulation_tick(world: &mut World, dt: f32) -> Vec<SimulationEvent> {
    let mut events = Vec::new();

    begin_tick(world, dt, &mut events);
    let draws = draw_randomness(world);
    let outcomes = decide_agents(world, &draws, dt);
    let deposits = merge_outcomes(world, outcomes, &mut events);
    update_pheromones(world, &deposits);
    resolve_damage(world, &mut events);

    world.current_tick += 1;
    world.elapsed += dt;

    tracing::debug!(
        tick = world.current_tick,
        agents = world.agents.len(),
        events = events.len(),
        "tick complete"
    );

    events
}

/// Phase 1
fn begin_tick(world: &mut World, dt: f32, events: &mut Vec<SimulationEvent>) {
    for objective in &mut world.objectives {
        objective.clear_tick_damage();
    }

    world.environments.update(dt, &world.config.environment);

    world
        .spatial
        .rebuild(world.agents.iter().map(|a| (a.id, a.position)));

    let agents = &mut world.agents;
    let lookup = &world.agent_lookup;
    let delivered = world.bus.deliver(|id, message| match lookup.get(&id) {
        Some(&idx) => {
            agents[idx].receive(message);
            true
        }
        None => false,
    });
    world.stats.messages_delivered += delivered as u64;

    tally_votes(world, events);
}

/// Every swimmer votes for its closest visible objective; a quorum surges
fn tally_votes(world: &mut World, events: &mut Vec<SimulationEvent>) {
    let objectives = &world.objectives;
    let mut ballots = Vec::new();
    for agent in &mut world.agents {
        let choice = nearest_visible(agent, objectives);
        if let ArchetypeState::Swimmer { vote, .. } = &mut agent.kind {
            *vote = choice;
            ballots.push(choice);
        }
    }

    let tally = VotingProtocol::tally(ballots);
    let surge = VotingProtocol::new(world.config.voting.quorum).surge_target(&tally);

    if let Some(objective) = surge {
        if world.surge != Some(objective) {
            let votes = tally.votes_for(objective);
            tracing::info!(%objective, votes, voters = tally.voters(), "swimmers surge");
            world.stats.surges += 1;
            events.push(SimulationEvent::SurgeStarted {
                objective,
                votes,
                voters: tally.voters(),
                tick: world.current_tick,
            });
        }
    }
    world.surge = surge;
}

fn draw_randomness(world: &mut World) -> Vec<AgentDraws> {
    let rng = &mut world.rng;
    world
        .agents
        .iter()
        .map(|_| AgentDraws {
            wander_jitter: rng.gen_range(-1.0..=1.0),
            dive_roll: rng.gen::<f32>(),
        })
        .collect()
}

/// Phase 2, decision half
fn decide_agents(world: &World, draws: &[AgentDraws], dt: f32) -> Vec<AgentOutcome> {
    let ctx = TickContext {
        config: &world.config,
        agents: &world.agents,
        lookup: &world.agent_lookup,
        index: &world.spatial,
        objectives: &world.objectives,
        obstacles: &world.obstacles,
        pheromones: &world.pheromones,
        environments: &world.environments,
        surge: world.surge,
        tick: world.current_tick,
        dt,
    };

    if world.agents.len() >= world.config.world.parallel_threshold {
        // PARALLEL: decisions only read the shared context
        world
            .agents
            .par_iter()
            .zip(draws.par_iter())
            .map(|(agent, &draw)| decide(agent, draw, &ctx))
            .collect()
    } else {
        world
            .agents
            .iter()
            .zip(draws.iter())
            .map(|(agent, &draw)| decide(agent, draw, &ctx))
            .collect()
    }
}

/// Phase 2, merge half: apply outcomes in agent order
fn merge_outcomes(
    world: &mut World,
    outcomes: Vec<AgentOutcome>,
    events: &mut Vec<SimulationEvent>,
) -> Vec<Deposit> {
    let mut deposits = Vec::new();

    for (idx, outcome) in outcomes.into_iter().enumerate() {
        for broadcast in &outcome.broadcasts {
            world.bus.broadcast(&broadcast.recipients, &broadcast.message);
        }
        if let Some((objective_id, amount)) = outcome.damage {
            if let Some(objective) = world.objectives.iter_mut().find(|o| o.id == objective_id) {
                objective.accumulate(amount);
            }
        }
        for event in &outcome.events {
            if matches!(event, SimulationEvent::DiveStrike { .. }) {
                world.stats.dives += 1;
            }
        }
        deposits.extend(outcome.deposits);
        events.extend(outcome.events);
        world.agents[idx] = outcome.agent;
    }

    deposits
}

/// Phase 3
fn update_pheromones(world: &mut World, deposits: &[Deposit]) {
    for deposit in deposits {
        world
            .pheromones
            .deposit(deposit.position, deposit.kind, deposit.amount);
    }
    world.pheromones.update();
}

/// Phase 4
fn resolve_damage(world: &mut World, events: &mut Vec<SimulationEvent>) {
    for objective in &mut world.objectives {
        let (applied, destroyed) = objective.apply_accumulated();
        world.stats.total_damage += applied as f64;
        if destroyed {
            tracing::info!(objective = %objective.id, tick = world.current_tick, "objective destroyed");
            world.stats.objectives_destroyed += 1;
            events.push(SimulationEvent::ObjectiveDestroyed {
                objective: objective.id,
                tick: world.current_tick,
            });
        }
    }
}
