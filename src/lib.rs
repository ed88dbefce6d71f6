//! Swarm Siege - emergent collective behavior of flocks, schools and colonies
//!
//! Heterogeneous agents steer with local rules, signal each other through
//! neighbor messages, pheromone trails and quorum votes, and converge on
//! shared objectives. The crate is a headless core: outer layers drive it
//! through `ecs::World` commands and read `ecs::WorldSnapshot`s back.

pub mod comms;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod environment;
pub mod simulation;
pub mod spatial;
pub mod steering;
