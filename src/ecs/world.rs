//! World - owns every collection and exposes the simulation commands
//!
//! Commands validate their input before touching any state, so a rejected
//! command leaves the world exactly as it was.

use std::collections::VecDeque;

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::comms::message::{Message, MessageBus, MessageKind};
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SwarmError};
use crate::core::types::{AgentId, ObjectiveId, ObstacleId, Tick, Vec2};
use crate::ecs::snapshot::{FieldSnapshot, WorldSnapshot};
use crate::entity::agent::Agent;
use crate::entity::archetype::Archetype;
use crate::entity::objective::Objective;
use crate::entity::obstacle::Obstacle;
use crate::environment::{EnvironmentKind, Environments};
use crate::simulation::pheromone::PheromoneField;
use crate::simulation::tick::{run_simulation_tick, SimulationEvent};
use crate::spatial::sparse_hash::SpatialIndex;

/// Events kept for `drain_events` before the oldest are discarded
const MAX_EVENT_BACKLOG: usize = 10_000;

/// Running totals since the last reset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub total_damage: f64,
    pub objectives_destroyed: u32,
    pub dives: u64,
    pub surges: u64,
    pub messages_delivered: u64,
}

/// The simulation world
pub struct World {
    pub config: SimulationConfig,
    pub current_tick: Tick,
    /// Simulated time since the last reset
    pub elapsed: f32,
    pub agents: Vec<Agent>,
    pub objectives: Vec<Objective>,
    pub obstacles: Vec<Obstacle>,
    pub pheromones: PheromoneField,
    /// Objective the swimmers are surging on this tick
    pub surge: Option<ObjectiveId>,
    pub stats: SimulationStats,

    pub(crate) agent_lookup: AHashMap<AgentId, usize>,
    pub(crate) spatial: SpatialIndex,
    pub(crate) bus: MessageBus,
    pub(crate) environments: Environments,
    pub(crate) rng: ChaCha8Rng,

    paused: bool,
    events: VecDeque<SimulationEvent>,
    next_agent_id: u32,
    next_objective_id: u32,
    next_obstacle_id: u32,
}

impl World {
    /// Validate `config` and build an empty world from it
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let pheromones = PheromoneField::new(config.world.width, config.world.height, &config.pheromone);
        Ok(Self {
            current_tick: 0,
            elapsed: 0.0,
            agents: Vec::new(),
            objectives: Vec::new(),
            obstacles: Vec::new(),
            pheromones,
            surge: None,
            stats: SimulationStats::default(),
            agent_lookup: AHashMap::new(),
            spatial: SpatialIndex::new(config.spatial.cell_size),
            bus: MessageBus::new(),
            environments: Environments::new(),
            rng: ChaCha8Rng::seed_from_u64(config.world.seed),
            paused: false,
            events: VecDeque::new(),
            next_agent_id: 0,
            next_objective_id: 0,
            next_obstacle_id: 0,
            config,
        })
    }

    pub fn width(&self) -> f32 {
        self.config.world.width
    }

    pub fn height(&self) -> f32 {
        self.config.world.height
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.is_finite()
            && (0.0..=self.width()).contains(&position.x)
            && (0.0..=self.height()).contains(&position.y)
    }

    fn check_in_bounds(&self, position: Vec2) -> Result<()> {
        if self.contains(position) {
            Ok(())
        } else {
            Err(SwarmError::OutOfBounds {
                x: position.x,
                y: position.y,
            })
        }
    }

    fn check_spawn(&self, archetype: Archetype, count: usize, environment: EnvironmentKind) -> Result<()> {
        if count == 0 {
            return Err(SwarmError::InvalidCount(count));
        }
        if !environment.allows(archetype) {
            return Err(SwarmError::IncompatibleEnvironment {
                archetype,
                environment,
            });
        }
        let limit = self.config.world.max_agents;
        let requested = self.agents.len().saturating_add(count);
        if requested > limit {
            return Err(SwarmError::CapacityExceeded { requested, limit });
        }
        Ok(())
    }

    fn insert_agent(&mut self, archetype: Archetype, environment: EnvironmentKind, position: Vec2) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;

        let config = self.config.archetype(archetype);
        let mut agent = Agent::new(id, archetype, environment, position, config, self.config.energy.max_energy);
        let heading = self.rng.gen_range(0.0..std::f32::consts::TAU);
        agent.velocity = Vec2::from_angle(heading) * (agent.max_speed * 0.5);
        agent.wander_angle = heading;

        self.agent_lookup.insert(id, self.agents.len());
        self.agents.push(agent);
        id
    }

    /// Spawn `count` agents at random positions inside the spawn margin
    pub fn spawn(&mut self, archetype: Archetype, count: usize, environment: EnvironmentKind) -> Result<Vec<AgentId>> {
        if let Err(err) = self.check_spawn(archetype, count, environment) {
            tracing::warn!(?archetype, count, ?environment, %err, "spawn rejected");
            return Err(err);
        }

        let margin = self.config.world.spawn_margin;
        let (max_x, max_y) = (self.width() - margin, self.height() - margin);
        let ids = (0..count)
            .map(|_| {
                let position = Vec2::new(
                    self.rng.gen_range(margin..max_x),
                    self.rng.gen_range(margin..max_y),
                );
                self.insert_agent(archetype, environment, position)
            })
            .collect::<Vec<_>>();

        tracing::info!(?archetype, count, total = self.agents.len(), "spawned agents");
        Ok(ids)
    }

    /// Spawn `count` agents uniformly within `spread` of `center`
    ///
    /// Positions falling outside the world wrap around its edges.
    pub fn spawn_cluster(
        &mut self,
        archetype: Archetype,
        count: usize,
        environment: EnvironmentKind,
        center: Vec2,
        spread: f32,
    ) -> Result<Vec<AgentId>> {
        self.check_spawn(archetype, count, environment)?;
        self.check_in_bounds(center)?;
        if !(spread >= 0.0) || !spread.is_finite() {
            return Err(SwarmError::InvalidRadius(spread));
        }

        let (width, height) = (self.width(), self.height());
        let ids = (0..count)
            .map(|_| {
                let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
                let distance = spread * self.rng.gen::<f32>().sqrt();
                let mut position = center + Vec2::from_angle(angle) * distance;
                position.x = position.x.rem_euclid(width).min(width);
                position.y = position.y.rem_euclid(height).min(height);
                self.insert_agent(archetype, environment, position)
            })
            .collect::<Vec<_>>();

        tracing::info!(?archetype, count, x = center.x, y = center.y, "spawned cluster");
        Ok(ids)
    }

    /// Place one agent at an exact position
    pub fn spawn_at(&mut self, archetype: Archetype, environment: EnvironmentKind, position: Vec2) -> Result<AgentId> {
        self.check_spawn(archetype, 1, environment)?;
        self.check_in_bounds(position)?;
        let id = self.insert_agent(archetype, environment, position);
        if let Some(agent) = self.agents.last_mut() {
            agent.velocity = Vec2::ZERO;
        }
        Ok(id)
    }

    /// Place an objective and seed the swarm's aggression
    ///
    /// The agent nearest the objective is primed (aggressive for the seed
    /// window) and its target-found broadcast is queued for its neighbors,
    /// arriving at the start of the next tick.
    pub fn place_objective(&mut self, position: Vec2) -> Result<ObjectiveId> {
        if let Err(err) = self.check_in_bounds(position) {
            tracing::warn!(x = position.x, y = position.y, "objective placement rejected");
            return Err(err);
        }

        let id = ObjectiveId(self.next_objective_id);
        self.next_objective_id += 1;
        self.objectives.push(Objective::new(
            id,
            position,
            self.config.combat.objective_radius,
            self.config.combat.objective_max_health,
        ));

        if let Some(seed) = self.nearest_agent(position) {
            self.seed_aggression(seed, position);
        }

        tracing::info!(%id, x = position.x, y = position.y, "objective placed");
        Ok(id)
    }

    fn nearest_agent(&self, position: Vec2) -> Option<usize> {
        self.agents
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| (OrderedFloat(a.position.distance_squared(&position)), a.id))
            .map(|(idx, _)| idx)
    }

    fn seed_aggression(&mut self, seed_idx: usize, objective_position: Vec2) {
        let messaging = &self.config.messaging;
        let seed = &mut self.agents[seed_idx];
        seed.prime(messaging.seed_aggression_window, messaging.target_found_priority);

        let message = Message::new(MessageKind::TargetFound, seed.id, seed.position, objective_position);
        let (origin, reach) = (seed.position, seed.communication_radius);
        let mut recipients: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| a.position.distance(&origin) <= reach)
            .map(|a| a.id)
            .collect();
        recipients.sort_unstable();
        self.bus.broadcast(&recipients, &message);

        tracing::debug!(seed = %message.sender, neighbors = recipients.len().saturating_sub(1), "seeded aggression");
    }

    pub fn place_obstacle(&mut self, position: Vec2, radius: f32) -> Result<ObstacleId> {
        if !(radius > 0.0) || !radius.is_finite() {
            tracing::warn!(radius, "obstacle placement rejected");
            return Err(SwarmError::InvalidRadius(radius));
        }
        self.check_in_bounds(position)?;

        let id = ObstacleId(self.next_obstacle_id);
        self.next_obstacle_id += 1;
        self.obstacles.push(Obstacle::new(id, position, radius));
        tracing::info!(%id, x = position.x, y = position.y, radius, "obstacle placed");
        Ok(id)
    }

    /// Clear agents, objectives, obstacles, messages and pheromones
    ///
    /// Configuration, the random generator and id counters carry over.
    pub fn reset(&mut self) {
        self.agents.clear();
        self.agent_lookup.clear();
        self.objectives.clear();
        self.obstacles.clear();
        self.pheromones.clear();
        self.spatial.clear();
        self.bus.clear();
        self.environments.reset();
        self.events.clear();
        self.surge = None;
        self.stats = SimulationStats::default();
        self.current_tick = 0;
        self.elapsed = 0.0;
        tracing::info!("world reset");
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Advance by `dt` unless paused; invalid `dt` is ignored
    pub fn tick(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        if !(dt > 0.0) || !dt.is_finite() {
            tracing::warn!(dt, "ignoring tick with invalid dt");
            return;
        }
        let events = run_simulation_tick(self, dt);
        self.events.extend(events);
        while self.events.len() > MAX_EVENT_BACKLOG {
            self.events.pop_front();
        }
    }

    /// Take every event recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        self.events.drain(..).collect()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agent_lookup.get(&id).and_then(|&idx| self.agents.get(idx))
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn count_of(&self, archetype: Archetype) -> usize {
        self.agents.iter().filter(|a| a.archetype() == archetype).count()
    }

    /// Nearest obstacle along a ray and the distance to it
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<(ObstacleId, f32)> {
        let direction = direction.normalize();
        if direction == Vec2::ZERO || !(max_distance >= 0.0) {
            return None;
        }
        self.obstacles
            .iter()
            .filter_map(|o| o.ray_hit(origin, direction, max_distance, 0.0).map(|t| (o.id, t)))
            .min_by_key(|&(id, t)| (OrderedFloat(t), id))
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self, None)
    }

    /// Snapshot including both pheromone channels
    pub fn snapshot_with_field(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self, Some(FieldSnapshot::capture(&self.pheromones)))
    }
}
