pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{Result, SwarmError};
pub use types::{AgentId, ObjectiveId, ObstacleId, Tick, Vec2};
