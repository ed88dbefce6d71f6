//! Steering: combines the individual behaviors into one force per agent

pub mod behaviors;

pub use behaviors::{alignment, arrive, cohesion, flee, obstacle_avoidance, seek, separation, wander, Neighbor};

use crate::core::config::SimulationConfig;
use crate::core::types::Vec2;
use crate::entity::agent::Agent;
use crate::entity::archetype::Archetype;
use crate::entity::obstacle::Obstacle;

/// Everything outside the agent that steering looks at this tick
///
/// Random draws arrive pre-sampled so `compute_force` stays a pure function.
#[derive(Debug, Clone, Copy)]
pub struct SteeringInput<'a> {
    pub neighbors: &'a [Neighbor],
    pub obstacles: &'a [Obstacle],
    pub environment_force: Vec2,
    /// Objective position to home in on, if any
    pub target: Option<Vec2>,
    /// Surge objective position when the agent rides a surge
    pub surge_target: Option<Vec2>,
    /// Unit trail gradient (crawlers only)
    pub trail_gradient: Vec2,
    /// Unit alarm gradient (crawlers only)
    pub alarm_gradient: Vec2,
    /// Uniform draw in [-1, 1]
    pub wander_jitter: f32,
}

impl<'a> SteeringInput<'a> {
    pub fn new(neighbors: &'a [Neighbor], obstacles: &'a [Obstacle]) -> Self {
        Self {
            neighbors,
            obstacles,
            environment_force: Vec2::ZERO,
            target: None,
            surge_target: None,
            trail_gradient: Vec2::ZERO,
            alarm_gradient: Vec2::ZERO,
            wander_jitter: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    /// Blended force, magnitude at most the agent's `max_force`
    pub force: Vec2,
    pub wander_angle: f32,
}

/// Blend avoidance, the archetype swarm rule, seeking and the environment
///
/// Weights come from `SteeringConfig`: avoidance dominates, then seeking,
/// then the swarm rule, with the environment a gentle bias. The sum is
/// clamped to the agent's `max_force`.
pub fn compute_force(agent: &Agent, input: &SteeringInput, config: &SimulationConfig) -> SteeringOutput {
    let archetype = config.archetype(agent.archetype());
    let steering = &config.steering;
    let (pos, vel) = (agent.position, agent.velocity);
    let (max_speed, max_force) = (agent.max_speed, agent.max_force);

    let avoid = obstacle_avoidance(
        pos,
        vel,
        input.obstacles,
        steering.obstacle_lookahead,
        agent.body_radius,
        max_speed,
        max_force,
    );

    let (wander_force, wander_angle) =
        wander(agent.wander_angle, input.wander_jitter, steering.wander_max_turn, max_force);

    let separate = separation(
        pos,
        vel,
        input.neighbors,
        archetype.separation_radius(),
        max_speed,
        max_force,
    );

    let swarm = match agent.archetype() {
        Archetype::Flyer | Archetype::Swimmer => {
            cohesion(pos, vel, input.neighbors, max_speed, max_force) * archetype.cohesion_weight
                + separate * archetype.separation_weight
                + alignment(vel, input.neighbors, max_speed, max_force) * archetype.alignment_weight
                + wander_force * archetype.wander_weight
        }
        Archetype::Crawler => {
            let pheromone = &config.pheromone;
            input.trail_gradient.normalize() * (max_force * pheromone.follow_weight)
                + input.alarm_gradient.normalize() * (max_force * pheromone.alarm_follow_weight)
                + separate * archetype.separation_weight
                + wander_force * archetype.wander_weight
        }
    };

    let mut pursue = match input.target {
        Some(target) => arrive(pos, vel, target, steering.arrive_radius, max_speed, max_force),
        None => Vec2::ZERO,
    };
    if let Some(surge) = input.surge_target {
        pursue += surge_lane(agent, surge, config) * steering.surge_bonus_weight;
    }

    let force = (avoid * steering.avoid_weight
        + swarm * steering.swarm_weight
        + pursue * steering.seek_weight
        + input.environment_force * steering.environment_weight)
        .limit(max_force);

    SteeringOutput {
        force: if force.is_finite() { force } else { Vec2::ZERO },
        wander_angle,
    }
}

/// Seek along one of five approach lanes fanned around the direct line
///
/// Lane offsets are `(id mod 5 - 2) * spread`, so a surging school closes in
/// from several angles at once.
pub fn surge_lane(agent: &Agent, target: Vec2, config: &SimulationConfig) -> Vec2 {
    let lane = (agent.id.0 % 5) as f32 - 2.0;
    let offset = (lane * config.steering.surge_angle_spread_deg).to_radians();
    let direction = (target - agent.position).normalize().rotate(offset);
    if direction == Vec2::ZERO {
        return Vec2::ZERO;
    }
    (direction * agent.max_speed - agent.velocity).limit(agent.max_force)
}
