pub mod snapshot;
pub mod world;

pub use snapshot::{AgentSnapshot, FieldSnapshot, ObjectiveSnapshot, Population, WorldSnapshot};
pub use world::{SimulationStats, World};
