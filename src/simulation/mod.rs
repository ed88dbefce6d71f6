pub mod behavior;
pub mod pheromone;
pub mod tick;

pub use behavior::{decide, select_target, AgentDraws, AgentOutcome, TickContext};
pub use pheromone::{PheromoneField, PheromoneKind};
pub use tick::{run_simulation_tick, SimulationEvent};
