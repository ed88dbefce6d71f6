use thiserror::Error;

use crate::entity::archetype::Archetype;
use crate::environment::EnvironmentKind;

#[derive(Error, Debug)]
pub enum SwarmError {
    #[error("Invalid radius: {0}")]
    InvalidRadius(f32),

    #[error("Invalid spawn count: {0}")]
    InvalidCount(usize),

    #[error("Position ({x}, {y}) is outside the world bounds")]
    OutOfBounds { x: f32, y: f32 },

    #[error("{archetype:?} agents cannot be spawned into the {environment:?} environment")]
    IncompatibleEnvironment {
        archetype: Archetype,
        environment: EnvironmentKind,
    },

    #[error("Spawning {requested} agents would exceed the limit of {limit}")]
    CapacityExceeded { requested: usize, limit: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SwarmError>;
