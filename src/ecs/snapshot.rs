//! Serializable read-only view of the world for outer layers

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, ObjectiveId, Tick, Vec2};
use crate::ecs::world::{SimulationStats, World};
use crate::entity::agent::AgentState;
use crate::entity::archetype::Archetype;
use crate::entity::obstacle::Obstacle;
use crate::environment::EnvironmentKind;
use crate::simulation::pheromone::{PheromoneField, PheromoneKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub archetype: Archetype,
    pub environment: EnvironmentKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub state: AgentState,
    pub energy: f32,
    pub aggressive: bool,
    pub attack_priority: u8,
    pub objective: Option<ObjectiveId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSnapshot {
    pub id: ObjectiveId,
    pub position: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub damage_this_tick: f32,
    pub destroyed: bool,
}

/// Both pheromone channels, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    pub trail: Vec<f32>,
    pub alarm: Vec<f32>,
}

impl FieldSnapshot {
    pub fn capture(field: &PheromoneField) -> Self {
        Self {
            width: field.width(),
            height: field.height(),
            cell_size: field.cell_size(),
            trail: field.grid(PheromoneKind::Trail).as_slice().to_vec(),
            alarm: field.grid(PheromoneKind::Alarm).as_slice().to_vec(),
        }
    }
}

/// Agent counts per archetype
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    pub flyers: usize,
    pub swimmers: usize,
    pub crawlers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub elapsed: f32,
    pub paused: bool,
    pub surge: Option<ObjectiveId>,
    pub population: Population,
    pub objectives_alive: usize,
    pub stats: SimulationStats,
    pub agents: Vec<AgentSnapshot>,
    pub objectives: Vec<ObjectiveSnapshot>,
    pub obstacles: Vec<Obstacle>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field: Option<FieldSnapshot>,
}

impl WorldSnapshot {
    pub fn capture(world: &World, field: Option<FieldSnapshot>) -> Self {
        let mut population = Population::default();
        let agents = world
            .agents
            .iter()
            .map(|a| {
                match a.archetype() {
                    Archetype::Flyer => population.flyers += 1,
                    Archetype::Swimmer => population.swimmers += 1,
                    Archetype::Crawler => population.crawlers += 1,
                }
                AgentSnapshot {
                    id: a.id,
                    archetype: a.archetype(),
                    environment: a.environment,
                    position: a.position,
                    velocity: a.velocity,
                    state: a.state,
                    energy: a.energy,
                    aggressive: a.aggressive,
                    attack_priority: a.attack_priority,
                    objective: a.objective,
                }
            })
            .collect();

        let objectives: Vec<ObjectiveSnapshot> = world
            .objectives
            .iter()
            .map(|o| ObjectiveSnapshot {
                id: o.id,
                position: o.position,
                radius: o.radius,
                health: o.health,
                max_health: o.max_health,
                damage_this_tick: o.damage_this_tick,
                destroyed: o.destroyed,
            })
            .collect();

        Self {
            tick: world.current_tick,
            elapsed: world.elapsed,
            paused: world.is_paused(),
            surge: world.surge,
            population,
            objectives_alive: objectives.iter().filter(|o| !o.destroyed).count(),
            stats: world.stats.clone(),
            agents,
            objectives,
            obstacles: world.obstacles.clone(),
            field,
        }
    }

    pub fn to_json(&self) -> crate::core::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
