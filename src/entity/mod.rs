pub mod alert;
pub mod flock;
pub mod stats;

pub use alert::{AlertLevel, AlertState, AlertStimulus, AlertTransition};
pub use flock::Flock;
pub use stats::{draw_obesity, resolve_stats, AgentStatBlock};
