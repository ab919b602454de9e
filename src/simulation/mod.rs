pub mod tick;
pub mod trap;

pub use tick::{run_simulation_tick, SimulationEvent};
pub use trap::{Bite, CapturedPigeon, ClaimedView, Trap, TrapClaims, TrapReport};
