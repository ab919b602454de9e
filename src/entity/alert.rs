//! Per-pigeon alert accumulator and behavior state machine
//!
//! Alert is a continuous stress value. Each tick it accumulates from player
//! proximity and crowding, decays linearly, and is then classified against
//! the pigeon's three thresholds:
//!
//! ```text
//! Normal -> Cautious -> BackOff -> Flee
//!              ^           |
//!              +-----------+  (only when the backoff timer expires)
//! ```
//!
//! Flee is sticky: no tick leaves it. Callers that want a pigeon back must
//! call [`AlertState::reset`].

use serde::{Deserialize, Serialize};

use crate::data::modifiers::StressEatModifier;
use crate::entity::stats::AgentStatBlock;

/// Discrete behavior state derived from alert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    #[default]
    Normal,
    Cautious,
    BackOff,
    Flee,
}

impl AlertLevel {
    /// Classify an alert value against a stat block's thresholds
    pub fn classify(alert: f32, stats: &AgentStatBlock) -> Self {
        if alert >= stats.flee_threshold {
            AlertLevel::Flee
        } else if alert >= stats.backoff_threshold {
            AlertLevel::BackOff
        } else if alert >= stats.warn_threshold {
            AlertLevel::Cautious
        } else {
            AlertLevel::Normal
        }
    }

    pub fn all() -> &'static [AlertLevel] {
        &[
            AlertLevel::Normal,
            AlertLevel::Cautious,
            AlertLevel::BackOff,
            AlertLevel::Flee,
        ]
    }
}

/// Stimulus for one alert update
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertStimulus {
    pub dt: f32,
    /// Distance to the player, `None` when no player is present
    pub player_distance: Option<f32>,
    /// Other pigeons crowding this one
    pub neighbor_count: usize,
}

/// Result of an update that changed state or issued a retreat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertTransition {
    pub from: AlertLevel,
    pub to: AlertLevel,
    /// Retreat distance, set only on the tick the pigeon enters BackOff
    pub retreat: Option<f32>,
}

/// Alert accumulator plus current state for one pigeon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    alert: f32,
    level: AlertLevel,
    backoff_timer: f32,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert(&self) -> f32 {
        self.alert
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }

    /// Remaining BackOff time, `None` outside BackOff
    pub fn backoff_timer(&self) -> Option<f32> {
        (self.level == AlertLevel::BackOff).then_some(self.backoff_timer)
    }

    /// Add stress from `competitor_count` other pigeons over `dt`
    pub fn add_crowd_alert(&mut self, stats: &AgentStatBlock, competitor_count: usize, dt: f32) {
        self.alert += stats.crowd_alert_per_neighbor_per_sec
            * competitor_count as f32
            * stats.crowd_weight
            * dt;
    }

    /// Raw alert adjustment for collaborators (scares, treats); never below 0
    pub fn add_alert(&mut self, amount: f32) {
        self.alert = (self.alert + amount).max(0.0);
    }

    /// Clear alert and return to Normal, the only way out of Flee
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance one tick: accumulate, decay, then transition
    pub fn update(
        &mut self,
        stats: &AgentStatBlock,
        stimulus: &AlertStimulus,
    ) -> Option<AlertTransition> {
        let dt = stimulus.dt.max(0.0);

        if let Some(distance) = stimulus.player_distance {
            if distance <= stats.personal_space_radius {
                self.alert += stats.player_alert_per_sec * stats.player_weight * dt;
            }
        }
        if stimulus.neighbor_count > 0 {
            self.add_crowd_alert(stats, stimulus.neighbor_count, dt);
        }

        self.alert = (self.alert - stats.alert_decay_per_sec * dt).max(0.0);

        let from = self.level;
        let target = AlertLevel::classify(self.alert, stats);

        let to = match (from, target) {
            (AlertLevel::Flee, _) | (_, AlertLevel::Flee) => AlertLevel::Flee,
            (AlertLevel::BackOff, _) => {
                self.backoff_timer -= dt;
                if self.backoff_timer > 0.0 {
                    AlertLevel::BackOff
                } else {
                    // Expired: re-evaluate as if fresh. Still above the
                    // backoff threshold means another full BackOff.
                    if target == AlertLevel::BackOff {
                        self.backoff_timer = stats.backoff_duration;
                    }
                    target
                }
            }
            (_, AlertLevel::BackOff) => {
                self.backoff_timer = stats.backoff_duration;
                AlertLevel::BackOff
            }
            (_, target) => target,
        };

        if to != AlertLevel::BackOff {
            self.backoff_timer = 0.0;
        }
        self.level = to;

        if from == to {
            return None;
        }

        Some(AlertTransition {
            from,
            to,
            retreat: (to == AlertLevel::BackOff).then_some(stats.backoff_distance),
        })
    }

    /// Whether the pigeon may make eat attempts in its current state
    pub fn can_eat(&self, modifier: &StressEatModifier) -> bool {
        match self.level {
            AlertLevel::Flee => false,
            AlertLevel::BackOff => !modifier.backoff_stops_eating,
            AlertLevel::Normal | AlertLevel::Cautious => true,
        }
    }

    fn cautious_modifier(&self, modifier: &StressEatModifier) -> bool {
        self.level == AlertLevel::Cautious && modifier.enabled
    }

    /// Eat chance after the stress modifier
    pub fn effective_eat_chance(&self, stats: &AgentStatBlock, modifier: &StressEatModifier) -> f32 {
        if self.cautious_modifier(modifier) {
            stats.eat_chance * modifier.warn_eat_chance_multiplier
        } else {
            stats.eat_chance
        }
    }

    /// Eat interval after the stress modifier
    pub fn effective_eat_interval(
        &self,
        stats: &AgentStatBlock,
        modifier: &StressEatModifier,
    ) -> f32 {
        if self.cautious_modifier(modifier) {
            stats.eat_interval * modifier.warn_eat_interval_multiplier
        } else {
            stats.eat_interval
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_stats() -> AgentStatBlock {
    use crate::core::types::{FaceId, SpeciesId, Tier};

    AgentStatBlock {
        species_id: SpeciesId(0),
        face_id: FaceId(0),
        tier: Tier(1),
        obesity: 5,
        bite_power: 5,
        price: 100,
        eat_radius: 1.0,
        eat_interval: 2.0,
        eat_chance: 1.0,
        personal_space_radius: 3.0,
        player_alert_per_sec: 10.0,
        crowd_alert_per_neighbor_per_sec: 2.0,
        alert_decay_per_sec: 0.0,
        warn_threshold: 30.0,
        backoff_threshold: 60.0,
        flee_threshold: 100.0,
        backoff_duration: 2.0,
        backoff_distance: 1.5,
        crowd_weight: 1.0,
        player_weight: 1.0,
    }
}
