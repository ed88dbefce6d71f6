//! Per-agent decisions for one tick
//!
//! `decide` reads an immutable view of the world and returns everything the
//! agent wants to change as an `AgentOutcome`. No shared state is touched, so
//! agents can be decided in parallel and merged afterwards in agent order.

use ahash::AHashMap;
use ordered_float::OrderedFloat;

use crate::comms::message::{Message, MessageKind};
use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, ObjectiveId, Tick, Vec2};
use crate::entity::agent::{Agent, AgentState, EnergyTransition};
use crate::entity::archetype::ArchetypeState;
use crate::entity::objective::Objective;
use crate::entity::obstacle::Obstacle;
use crate::environment::Environments;
use crate::simulation::pheromone::{PheromoneField, PheromoneKind};
use crate::simulation::tick::SimulationEvent;
use crate::spatial::sparse_hash::SpatialIndex;
use crate::steering::{compute_force, Neighbor, SteeringInput};

/// Read-only world state shared by every decision in a tick
pub struct TickContext<'a> {
    pub config: &'a SimulationConfig,
    pub agents: &'a [Agent],
    pub lookup: &'a AHashMap<AgentId, usize>,
    pub index: &'a SpatialIndex,
    pub objectives: &'a [Objective],
    pub obstacles: &'a [Obstacle],
    pub pheromones: &'a PheromoneField,
    pub environments: &'a Environments,
    pub surge: Option<ObjectiveId>,
    pub tick: Tick,
    pub dt: f32,
}

impl TickContext<'_> {
    pub fn live_objective(&self, id: ObjectiveId) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id && o.is_alive())
    }

    /// Nearest live objective within the resolve radius of a message payload
    pub fn resolve_objective(&self, payload: Vec2) -> Option<ObjectiveId> {
        let radius = self.config.messaging.resolve_radius;
        self.objectives
            .iter()
            .filter(|o| o.is_alive())
            .map(|o| (o, o.position.distance(&payload)))
            .filter(|&(_, d)| d <= radius)
            .min_by_key(|&(o, d)| (OrderedFloat(d), o.id))
            .map(|(o, _)| o.id)
    }
}

/// Random values drawn for one agent before the decision phase
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentDraws {
    /// Uniform in [-1, 1]
    pub wander_jitter: f32,
    /// Uniform in [0, 1)
    pub dive_roll: f32,
}

#[derive(Debug, Clone)]
pub struct Broadcast {
    pub recipients: Vec<AgentId>,
    pub message: Message,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deposit {
    pub position: Vec2,
    pub kind: PheromoneKind,
    pub amount: f32,
}

/// Everything one agent changes this tick
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub agent: Agent,
    pub broadcasts: Vec<Broadcast>,
    pub damage: Option<(ObjectiveId, f32)>,
    pub deposits: Vec<Deposit>,
    pub events: Vec<SimulationEvent>,
}

/// Closest live objective within perception
pub fn nearest_visible(agent: &Agent, objectives: &[Objective]) -> Option<ObjectiveId> {
    objectives
        .iter()
        .filter(|o| o.is_alive())
        .map(|o| (o, o.position.distance(&agent.position)))
        .filter(|&(_, d)| d <= agent.perception_radius)
        .min_by_key(|&(o, d)| (OrderedFloat(d), o.id))
        .map(|(o, _)| o.id)
}

/// Best visible objective by proximity and damage already dealt
///
/// Score = 0.6 * (1 - d / perception) + 0.4 * (1 - health fraction); ties
/// go to the lower id.
pub fn select_target<'o>(agent: &Agent, objectives: &'o [Objective]) -> Option<&'o Objective> {
    let perception = agent.perception_radius;
    objectives
        .iter()
        .filter(|o| o.is_alive())
        .filter_map(|o| {
            let d = o.position.distance(&agent.position);
            (d <= perception).then(|| {
                let score = 0.6 * (1.0 - d / perception) + 0.4 * (1.0 - o.health_fraction());
                (o, score)
            })
        })
        .max_by_key(|&(o, score)| (OrderedFloat(score), std::cmp::Reverse(o.id)))
        .map(|(o, _)| o)
}

/// Decide one agent's tick
pub fn decide(agent: &Agent, draws: AgentDraws, ctx: &TickContext) -> AgentOutcome {
    let config = ctx.config;
    let dt = ctx.dt;
    let mut me = agent.clone();
    let origin = me.position;
    let mut events = Vec::new();

    me.process_messages(|payload| ctx.resolve_objective(payload), &config.messaging);
    me.decay_aggression(dt);

    if let Some(held) = me.objective {
        if ctx.live_objective(held).is_none() {
            me.drop_objective();
        }
    }

    if me.objective.is_none() && !me.is_resting() {
        if let Some(found) = select_target(&me, ctx.objectives) {
            me.acquire(found.id);
            me.announce(MessageKind::TargetFound, found.position);
            tracing::trace!(agent = %me.id, objective = %found.id, "target discovered");
            events.push(SimulationEvent::TargetDiscovered {
                agent: me.id,
                objective: found.id,
                tick: ctx.tick,
            });
        }
    }

    match me.update_energy(dt, &config.energy) {
        Some(EnergyTransition::StartedResting) => events.push(SimulationEvent::AgentRested {
            agent: me.id,
            tick: ctx.tick,
        }),
        Some(EnergyTransition::Recovered) => events.push(SimulationEvent::AgentRecovered {
            agent: me.id,
            tick: ctx.tick,
        }),
        None => {}
    }

    let resting = me.is_resting();
    let surge_objective = match &mut me.kind {
        ArchetypeState::Swimmer { vote, in_surge } => {
            *in_surge = !resting && ctx.surge.is_some() && *vote == ctx.surge;
            if *in_surge {
                ctx.surge
            } else {
                None
            }
        }
        _ => None,
    };

    let target = if resting {
        None
    } else {
        me.objective.and_then(|id| ctx.live_objective(id))
    };

    let neighbors = gather_neighbors(&me, ctx);
    let mut input = SteeringInput::new(&neighbors, ctx.obstacles);
    input.environment_force = ctx
        .environments
        .force(me.environment, me.velocity, &config.environment);
    input.target = target.map(|o| o.position);
    input.surge_target = surge_objective
        .and_then(|id| ctx.live_objective(id))
        .map(|o| o.position);
    input.wander_jitter = draws.wander_jitter;
    if matches!(me.kind, ArchetypeState::Crawler { .. }) {
        input.trail_gradient = ctx.pheromones.sample_gradient(origin, PheromoneKind::Trail);
        input.alarm_gradient = ctx.pheromones.sample_gradient(origin, PheromoneKind::Alarm);
    }

    let steering = compute_force(&me, &input, config);
    me.last_force = steering.force;
    me.wander_angle = steering.wander_angle;
    me.apply_force(steering.force);
    me.integrate(dt);
    me.wrap(config.world.width, config.world.height);

    let mut damage = 0.0;
    if let Some(objective) = target {
        let in_range = objective.surface_distance(me.position) <= me.attack_range;
        if me.state == AgentState::Seeking && in_range {
            me.state = AgentState::Attacking;
            if me.aggressive {
                me.announce(MessageKind::AttackNow, objective.position);
            }
        }
        if me.state == AgentState::Attacking && in_range {
            let rate = match me.kind {
                ArchetypeState::Swimmer { in_surge: true, .. } => config.voting.surge_damage_rate,
                _ => config.archetype(me.archetype()).base_damage_rate,
            };
            let multiplier = if me.aggressive {
                config.combat.aggressive_multiplier
            } else {
                1.0
            };
            damage += rate * dt * multiplier;
        }
    }

    if let ArchetypeState::Flyer { dive_cooldown } = &mut me.kind {
        *dive_cooldown = (*dive_cooldown - dt).max(0.0);
        if let Some(objective) = target {
            let dive = &config.dive;
            let close = objective.position.distance(&me.position) <= dive.range;
            if *dive_cooldown <= 0.0 && me.aggressive && close && draws.dive_roll < dive.probability {
                let strike = dive.max_damage * config.combat.attack_intensity * dive.aggressive_multiplier;
                damage += strike;
                *dive_cooldown = dive.cooldown;
                events.push(SimulationEvent::DiveStrike {
                    agent: me.id,
                    objective: objective.id,
                    damage: strike,
                    tick: ctx.tick,
                });
            }
        }
    }

    let mut deposits = Vec::new();
    if let ArchetypeState::Crawler { carried_strength } = &mut me.kind {
        let pheromone = &config.pheromone;
        *carried_strength = if me.objective.is_some() {
            pheromone.trail_deposit_found
        } else {
            pheromone.trail_deposit_explore
        };
        deposits.push(Deposit {
            position: me.position,
            kind: PheromoneKind::Trail,
            amount: *carried_strength,
        });
        if me.state == AgentState::Attacking {
            deposits.push(Deposit {
                position: me.position,
                kind: PheromoneKind::Alarm,
                amount: pheromone.alarm_deposit,
            });
        }
    }

    let mut broadcasts = Vec::new();
    if !me.outbox.is_empty() {
        let mut recipients: Vec<AgentId> = ctx
            .index
            .query(origin, me.communication_radius)
            .into_iter()
            .filter(|&id| id != me.id)
            .collect();
        recipients.sort_unstable();
        for message in me.outbox.drain(..) {
            broadcasts.push(Broadcast {
                recipients: recipients.clone(),
                message,
            });
        }
    }

    let hit = target.map(|o| o.id).filter(|_| damage > 0.0);
    AgentOutcome {
        agent: me,
        broadcasts,
        damage: hit.map(|id| (id, damage)),
        deposits,
        events,
    }
}

fn gather_neighbors(agent: &Agent, ctx: &TickContext) -> Vec<Neighbor> {
    let mut found = ctx
        .index
        .query_with_positions(agent.position, agent.perception_radius);
    // Fixed summation order keeps runs reproducible
    found.sort_unstable_by_key(|&(id, _)| id);
    found
        .into_iter()
        .filter(|&(id, _)| id != agent.id)
        .filter_map(|(id, position)| {
            let other = ctx.agents.get(*ctx.lookup.get(&id)?)?;
            Some(Neighbor {
                position,
                velocity: other.velocity,
                distance: position.distance(&agent.position),
            })
        })
        .collect()
}
