//! Agent archetypes and their per-archetype payloads

use serde::{Deserialize, Serialize};

use crate::core::types::ObjectiveId;
use crate::environment::EnvironmentKind;

/// The three fixed agent kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// Flocks through the air, dives on objectives
    Flyer,
    /// Schools through water, votes on collective surges
    Swimmer,
    /// Crawls over the ground, coordinates through pheromone trails
    Crawler,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Flyer, Archetype::Swimmer, Archetype::Crawler];

    /// The only environment this archetype may be spawned into
    pub fn native_environment(self) -> EnvironmentKind {
        match self {
            Archetype::Flyer => EnvironmentKind::Air,
            Archetype::Swimmer => EnvironmentKind::Water,
            Archetype::Crawler => EnvironmentKind::Ground,
        }
    }
}

impl std::str::FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flyer" | "bird" => Ok(Archetype::Flyer),
            "swimmer" | "fish" => Ok(Archetype::Swimmer),
            "crawler" | "ant" => Ok(Archetype::Crawler),
            other => Err(format!("unknown archetype '{other}'")),
        }
    }
}

/// Archetype tag carrying the fields only that archetype needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArchetypeState {
    Flyer {
        /// Time units until the next dive is allowed
        dive_cooldown: f32,
    },
    Swimmer {
        /// Objective this swimmer voted for at the start of the tick
        vote: Option<ObjectiveId>,
        /// Whether the swimmer is riding this tick's surge
        in_surge: bool,
    },
    Crawler {
        /// Trail strength laid down per tick
        carried_strength: f32,
    },
}

impl ArchetypeState {
    pub fn new(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Flyer => ArchetypeState::Flyer { dive_cooldown: 0.0 },
            Archetype::Swimmer => ArchetypeState::Swimmer {
                vote: None,
                in_surge: false,
            },
            Archetype::Crawler => ArchetypeState::Crawler {
                carried_strength: 0.0,
            },
        }
    }

    pub fn archetype(&self) -> Archetype {
        match self {
            ArchetypeState::Flyer { .. } => Archetype::Flyer,
            ArchetypeState::Swimmer { .. } => Archetype::Swimmer,
            ArchetypeState::Crawler { .. } => Archetype::Crawler,
        }
    }
}
