//! Simulation configuration with documented constants
//!
//! All tuning numbers are collected here with explanations of their purpose
//! and how they interact with each other. The configuration is fixed once a
//! `World` is created; nothing here is negotiated at runtime.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SwarmError};
use crate::entity::archetype::Archetype;

/// Largest pheromone grid a configuration may ask for
pub const MAX_FIELD_CELLS: usize = 16 * 1024 * 1024;

/// Configuration for the whole simulation
///
/// Every section falls back to its defaults when omitted from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub spatial: SpatialConfig,
    /// Archetype tables must be given in full when present
    pub flyer: ArchetypeConfig,
    pub swimmer: ArchetypeConfig,
    pub crawler: ArchetypeConfig,
    pub steering: SteeringConfig,
    pub pheromone: PheromoneConfig,
    pub messaging: MessagingConfig,
    pub voting: VotingConfig,
    pub dive: DiveConfig,
    pub energy: EnergyConfig,
    pub combat: CombatConfig,
    pub environment: EnvironmentConfig,
}

// === WORLD ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World extent along x (length units)
    pub width: f32,
    /// World extent along y (length units)
    pub height: f32,
    /// Spawn positions keep this distance from every edge
    pub spawn_margin: f32,
    /// Hard cap on live agents; spawns beyond it are rejected
    pub max_agents: usize,
    /// Seed for the world's ChaCha8 generator (wander jitter, dive rolls, spawn positions)
    pub seed: u64,
    /// Minimum agent count before the decision phase runs on rayon
    ///
    /// Below this threshold, thread overhead exceeds benefits.
    pub parallel_threshold: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            spawn_margin: 10.0,
            max_agents: 1000,
            seed: 42,
            parallel_threshold: 512,
        }
    }
}

// === SPATIAL ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Size of each cell in the spatial hash (length units)
    ///
    /// Should be close to the smallest perception radius. A query of radius r
    /// visits roughly (2r / cell_size + 1)^2 cells.
    pub cell_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { cell_size: 50.0 }
    }
}

// === ARCHETYPES ===

/// Physical and behavioral constants for one agent archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    /// Velocity magnitude cap (length units per time unit)
    pub max_speed: f32,
    /// Steering force magnitude cap
    pub max_force: f32,
    /// Radius within which neighbors and objectives are noticed
    pub perception_radius: f32,
    /// Radius within which messages reach neighbors
    pub communication_radius: f32,
    /// Distance at which the agent can damage an objective
    pub attack_range: f32,
    /// Damage per time unit while attacking in range
    pub base_damage_rate: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    /// Separation radius as a fraction of the perception radius
    ///
    /// Schools pack tighter than flocks so swimmers use a larger factor.
    pub separation_radius_factor: f32,
    /// Weight of the wander term inside the swarm rule
    pub wander_weight: f32,
    /// Body radius used by obstacle clearance checks
    pub body_radius: f32,
}

impl ArchetypeConfig {
    pub fn flyer() -> Self {
        Self {
            max_speed: 120.0,
            max_force: 60.0,
            perception_radius: 100.0,
            communication_radius: 150.0,
            attack_range: 15.0,
            base_damage_rate: 1.0,
            cohesion_weight: 0.30,
            separation_weight: 0.30,
            alignment_weight: 0.40,
            separation_radius_factor: 0.5,
            wander_weight: 0.15,
            body_radius: 6.0,
        }
    }

    pub fn swimmer() -> Self {
        Self {
            max_speed: 90.0,
            max_force: 45.0,
            perception_radius: 80.0,
            communication_radius: 120.0,
            attack_range: 12.0,
            base_damage_rate: 1.5,
            cohesion_weight: 0.25,
            separation_weight: 0.40,
            alignment_weight: 0.35,
            separation_radius_factor: 0.7,
            wander_weight: 0.1,
            body_radius: 5.0,
        }
    }

    /// Crawlers follow pheromone gradients instead of the cohesion/alignment
    /// triple; only separation weight is still consulted.
    pub fn crawler() -> Self {
        Self {
            max_speed: 60.0,
            max_force: 30.0,
            perception_radius: 60.0,
            communication_radius: 100.0,
            attack_range: 8.0,
            base_damage_rate: 1.0,
            cohesion_weight: 0.0,
            separation_weight: 0.2,
            alignment_weight: 0.0,
            separation_radius_factor: 0.3,
            wander_weight: 0.3,
            body_radius: 3.0,
        }
    }

    pub fn separation_radius(&self) -> f32 {
        self.perception_radius * self.separation_radius_factor
    }
}

// === STEERING ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Weight of obstacle avoidance in the final blend
    pub avoid_weight: f32,
    /// Weight of the archetype swarm rule in the final blend
    pub swarm_weight: f32,
    /// Weight of objective seeking in the final blend
    pub seek_weight: f32,
    /// Weight of the environment force in the final blend
    pub environment_weight: f32,
    /// How far ahead along the velocity the avoidance ray is cast
    pub obstacle_lookahead: f32,
    /// Distance at which arrive starts slowing down
    pub arrive_radius: f32,
    /// Largest wander heading change in a single tick (radians)
    pub wander_max_turn: f32,
    /// Weight of the multi-angle surge bonus relative to the plain seek
    pub surge_bonus_weight: f32,
    /// Angular spacing of surge approach lanes (degrees)
    pub surge_angle_spread_deg: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            avoid_weight: 2.0,
            swarm_weight: 1.0,
            seek_weight: 1.5,
            environment_weight: 0.5,
            obstacle_lookahead: 50.0,
            arrive_radius: 60.0,
            wander_max_turn: std::f32::consts::PI / 8.0,
            surge_bonus_weight: 1.0,
            surge_angle_spread_deg: 15.0,
        }
    }
}

// === PHEROMONES ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PheromoneConfig {
    /// Size of one pheromone cell (length units)
    pub cell_size: f32,
    /// Multiplier applied to every cell once per tick
    ///
    /// At 0.99 an untouched trail halves in roughly 69 ticks.
    pub evaporation: f32,
    /// Fraction of the 8-neighbor sum flowing into each cell per tick
    ///
    /// The inflow is not balanced by an outflow term, so total mass can grow
    /// while diffusing; cells are clamped at `max_strength`.
    pub diffusion: f32,
    /// Upper bound for every cell
    pub max_strength: f32,
    /// Trail carried by a crawler that holds an objective
    pub trail_deposit_found: f32,
    /// Trail carried by an exploring crawler
    pub trail_deposit_explore: f32,
    /// Alarm laid per tick by an attacking crawler
    pub alarm_deposit: f32,
    /// Weight of the trail gradient inside the crawler swarm rule
    pub follow_weight: f32,
    /// Weight of the alarm gradient inside the crawler swarm rule
    pub alarm_follow_weight: f32,
}

impl Default for PheromoneConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            evaporation: 0.99,
            diffusion: 0.1,
            max_strength: 255.0,
            trail_deposit_found: 1.5,
            trail_deposit_explore: 0.3,
            alarm_deposit: 2.0,
            follow_weight: 0.8,
            alarm_follow_weight: 0.4,
        }
    }
}

// === MESSAGING ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Aggression window granted to the agent nearest a newly placed objective
    pub seed_aggression_window: f32,
    /// Aggression window granted by a received target-found message
    pub message_aggression_window: f32,
    pub target_found_priority: u8,
    pub attack_now_priority: u8,
    /// Messages that travelled this many hops are consumed but not relayed
    pub max_hops: u8,
    /// A payload position resolves to the nearest live objective within this radius
    pub resolve_radius: f32,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            seed_aggression_window: 30.0,
            message_aggression_window: 25.0,
            target_found_priority: 8,
            attack_now_priority: 9,
            max_hops: 32,
            resolve_radius: 10.0,
        }
    }
}

// === VOTING ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    /// Inclusive quorum: votes / live swimmers must reach this ratio
    pub quorum: f32,
    /// Swimmer damage rate while their objective is surging
    pub surge_damage_rate: f32,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            quorum: 0.6,
            surge_damage_rate: 2.0,
        }
    }
}

// === DIVES ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiveConfig {
    /// Chance per tick that an eligible flyer dives
    pub probability: f32,
    /// Time units between dives
    pub cooldown: f32,
    /// Maximum distance to the objective for a dive
    pub range: f32,
    pub max_damage: f32,
    /// Dive damage multiplier for aggressive flyers
    pub aggressive_multiplier: f32,
}

impl Default for DiveConfig {
    fn default() -> Self {
        Self {
            probability: 0.02,
            cooldown: 4.0,
            range: 200.0,
            max_damage: 3.0,
            aggressive_multiplier: 1.3,
        }
    }
}

// === ENERGY ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub max_energy: f32,
    /// Energy drained per unit of speed per time unit
    pub movement_drain: f32,
    /// Drain multiplier while attacking
    pub attack_drain_multiplier: f32,
    /// Energy regained per time unit while idle or resting
    pub recovery_rate: f32,
    /// Below this the agent starts resting
    pub low_threshold: f32,
    /// A resting agent resumes once energy climbs above this
    ///
    /// The gap to `low_threshold` is the hysteresis band that keeps agents
    /// from flickering in and out of rest.
    pub recover_threshold: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy: 100.0,
            movement_drain: 0.05,
            attack_drain_multiplier: 2.0,
            recovery_rate: 10.0,
            low_threshold: 20.0,
            recover_threshold: 60.0,
        }
    }
}

// === COMBAT ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Damage multiplier for aggressive agents
    pub aggressive_multiplier: f32,
    /// Attack intensity scales dive damage
    pub attack_intensity: f32,
    pub objective_max_health: f32,
    pub objective_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            aggressive_multiplier: 1.5,
            attack_intensity: 1.0,
            objective_max_health: 100.0,
            objective_radius: 15.0,
        }
    }
}

// === ENVIRONMENTS ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub wind_strength: f32,
    /// Radians per time unit the wind direction turns
    pub wind_turn_rate: f32,
    pub current_strength: f32,
    pub current_turn_rate: f32,
    /// Fraction of velocity retained on the ground; the rest is applied as drag
    pub ground_friction: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            wind_strength: 12.0,
            wind_turn_rate: 0.5,
            current_strength: 8.0,
            current_turn_rate: 0.3,
            ground_friction: 0.9,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            spatial: SpatialConfig::default(),
            flyer: ArchetypeConfig::flyer(),
            swimmer: ArchetypeConfig::swimmer(),
            crawler: ArchetypeConfig::crawler(),
            steering: SteeringConfig::default(),
            pheromone: PheromoneConfig::default(),
            messaging: MessagingConfig::default(),
            voting: VotingConfig::default(),
            dive: DiveConfig::default(),
            energy: EnergyConfig::default(),
            combat: CombatConfig::default(),
            environment: EnvironmentConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), seed = config.world.seed, "loaded configuration");
        Ok(config)
    }

    pub fn archetype(&self, archetype: Archetype) -> &ArchetypeConfig {
        match archetype {
            Archetype::Flyer => &self.flyer,
            Archetype::Swimmer => &self.swimmer,
            Archetype::Crawler => &self.crawler,
        }
    }

    /// Validate configuration for internal consistency
    ///
    /// Every length, speed and rate must be finite; TOML accepts `inf` and
    /// `nan`, which would otherwise reach grid allocation and integration.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SwarmError::InvalidConfig(msg));
        let positive = |x: f32| x.is_finite() && x > 0.0;
        let non_negative = |x: f32| x.is_finite() && x >= 0.0;

        if !(positive(self.world.width) && positive(self.world.height)) {
            return invalid(format!(
                "world size must be positive and finite, got {}x{}",
                self.world.width, self.world.height
            ));
        }
        if !non_negative(self.world.spawn_margin)
            || self.world.spawn_margin * 2.0 >= self.world.width.min(self.world.height)
        {
            return invalid(format!("spawn_margin ({}) leaves no spawn area", self.world.spawn_margin));
        }
        if !(positive(self.spatial.cell_size) && positive(self.pheromone.cell_size)) {
            return invalid("cell sizes must be positive and finite".into());
        }
        let field_cells = (self.world.width / self.pheromone.cell_size).ceil() as f64
            * (self.world.height / self.pheromone.cell_size).ceil() as f64;
        if field_cells > MAX_FIELD_CELLS as f64 {
            return invalid(format!(
                "pheromone grid would need {field_cells} cells (limit {MAX_FIELD_CELLS})"
            ));
        }

        for archetype in Archetype::ALL {
            let a = self.archetype(archetype);
            if !(positive(a.max_speed) && positive(a.max_force)) {
                return invalid(format!("{:?} max_speed and max_force must be positive", archetype));
            }
            if ![a.perception_radius, a.communication_radius, a.attack_range]
                .into_iter()
                .all(positive)
            {
                return invalid(format!("{:?} radii must be positive", archetype));
            }
            if ![
                a.base_damage_rate,
                a.cohesion_weight,
                a.separation_weight,
                a.alignment_weight,
                a.separation_radius_factor,
                a.wander_weight,
                a.body_radius,
            ]
            .into_iter()
            .all(non_negative)
            {
                return invalid(format!("{:?} weights and rates must be finite and >= 0", archetype));
            }
        }

        let s = &self.steering;
        if ![
            s.avoid_weight,
            s.swarm_weight,
            s.seek_weight,
            s.environment_weight,
            s.obstacle_lookahead,
            s.arrive_radius,
            s.wander_max_turn,
            s.surge_bonus_weight,
            s.surge_angle_spread_deg,
        ]
        .into_iter()
        .all(non_negative)
        {
            return invalid("steering weights must be finite and >= 0".into());
        }

        if !(self.voting.quorum > 0.0 && self.voting.quorum <= 1.0) {
            return invalid(format!("voting quorum ({}) must be in (0, 1]", self.voting.quorum));
        }
        if !non_negative(self.voting.surge_damage_rate) {
            return invalid("surge_damage_rate must be finite and >= 0".into());
        }
        if !(self.pheromone.evaporation > 0.0 && self.pheromone.evaporation <= 1.0) {
            return invalid(format!(
                "pheromone evaporation ({}) must be in (0, 1]",
                self.pheromone.evaporation
            ));
        }
        let p = &self.pheromone;
        if !non_negative(p.diffusion) || !positive(p.max_strength) {
            return invalid("pheromone diffusion must be >= 0 and max_strength > 0".into());
        }
        if ![
            p.trail_deposit_found,
            p.trail_deposit_explore,
            p.alarm_deposit,
            p.follow_weight,
            p.alarm_follow_weight,
        ]
        .into_iter()
        .all(non_negative)
        {
            return invalid("pheromone deposits and weights must be finite and >= 0".into());
        }

        if !non_negative(self.messaging.seed_aggression_window)
            || !non_negative(self.messaging.message_aggression_window)
            || !non_negative(self.messaging.resolve_radius)
        {
            return invalid("messaging windows and resolve_radius must be finite and >= 0".into());
        }

        let d = &self.dive;
        if !(0.0..=1.0).contains(&d.probability) {
            return invalid(format!("dive probability ({}) must be in [0, 1]", d.probability));
        }
        if ![d.cooldown, d.range, d.max_damage, d.aggressive_multiplier]
            .into_iter()
            .all(non_negative)
        {
            return invalid("dive settings must be finite and >= 0".into());
        }

        let e = &self.energy;
        if ![
            e.max_energy,
            e.movement_drain,
            e.attack_drain_multiplier,
            e.recovery_rate,
            e.low_threshold,
            e.recover_threshold,
        ]
        .into_iter()
        .all(non_negative)
        {
            return invalid("energy settings must be finite and >= 0".into());
        }
        if e.recover_threshold <= e.low_threshold {
            return invalid(format!(
                "energy recover_threshold ({}) must exceed low_threshold ({})",
                e.recover_threshold, e.low_threshold
            ));
        }
        if e.recover_threshold > e.max_energy {
            return invalid("energy recover_threshold cannot exceed max_energy".into());
        }

        let c = &self.combat;
        if !positive(c.objective_max_health) || !positive(c.objective_radius) {
            return invalid("objective_max_health and objective_radius must be positive".into());
        }
        if !non_negative(c.aggressive_multiplier) || !non_negative(c.attack_intensity) {
            return invalid("combat multipliers must be finite and >= 0".into());
        }

        let env = &self.environment;
        if ![
            env.wind_strength,
            env.wind_turn_rate,
            env.current_strength,
            env.current_turn_rate,
        ]
        .into_iter()
        .all(f32::is_finite)
            || !(0.0..=1.0).contains(&env.ground_friction)
        {
            return invalid("environment settings must be finite, ground_friction in [0, 1]".into());
        }

        Ok(())
    }
}
