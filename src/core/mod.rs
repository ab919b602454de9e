pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{ForageError, Result};
pub use types::{AgentId, FaceId, SpeciesId, Tier, TrapId, Vec2};
