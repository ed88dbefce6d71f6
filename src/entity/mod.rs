pub mod agent;
pub mod archetype;
pub mod objective;
pub mod obstacle;

pub use agent::{Agent, AgentState, EnergyTransition};
pub use archetype::{Archetype, ArchetypeState};
pub use objective::Objective;
pub use obstacle::Obstacle;
