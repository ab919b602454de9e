//! Simulation configuration with documented constants
//!
//! Tunables that belong to the driver rather than to content data. Content
//! (tiers, species, traps) lives in `data::ContentTables`.

use crate::core::error::{ForageError, Result};

/// Configuration for the simulation systems
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    // === SPATIAL SYSTEM ===
    /// Size of each cell in the spatial hash grid (world units)
    ///
    /// Should be on the order of the largest eat radius so a trap query
    /// touches only a handful of cells.
    pub grid_cell_size: f32,

    // === TRAPS ===
    /// Fixed margin added to each pigeon's own eat radius during discovery
    ///
    /// Keeps a pigeon that jitters on the edge of its radius from dropping
    /// in and out of the contestant set every other tick.
    pub eat_range_slack: f32,

    /// How long a successful bite keeps a pigeon flagged as "eating" (seconds)
    ///
    /// Presentation only. Never read by the economy.
    pub eating_display_secs: f32,

    // === ALERT SYSTEM ===
    /// Radius for ambient crowding stimulus, `None` to disable
    ///
    /// When set, each pigeon counts other pigeons within this radius and
    /// feeds the count through the crowd alert formula every tick. Trap
    /// competition stress is applied regardless of this setting.
    pub ambient_crowd_radius: Option<f32>,

    // === PARALLELIZATION ===
    /// Minimum flock size before alert integration runs on rayon
    ///
    /// Below this, thread overhead exceeds the per-agent work.
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_cell_size: 4.0,
            eat_range_slack: 0.25,
            eating_display_secs: 0.5,
            ambient_crowd_radius: None,
            parallel_threshold: 1000,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.grid_cell_size <= 0.0 {
            return Err(ForageError::InvalidConfig(format!(
                "grid_cell_size ({}) must be positive",
                self.grid_cell_size
            )));
        }

        if self.eat_range_slack < 0.0 {
            return Err(ForageError::InvalidConfig(format!(
                "eat_range_slack ({}) must not be negative",
                self.eat_range_slack
            )));
        }

        if self.eating_display_secs < 0.0 {
            return Err(ForageError::InvalidConfig(
                "eating_display_secs must not be negative".into(),
            ));
        }

        if let Some(radius) = self.ambient_crowd_radius {
            if radius <= 0.0 {
                return Err(ForageError::InvalidConfig(format!(
                    "ambient_crowd_radius ({}) must be positive when set",
                    radius
                )));
            }
        }

        Ok(())
    }
}
