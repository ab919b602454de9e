//! The flock: every live pigeon, stored as a Structure of Arrays
//!
//! Rows stay in spawn order. Despawning removes the row immediately (no
//! tombstones) so nothing downstream can observe a destroyed pigeon.

use ahash::AHashMap;
use rayon::prelude::*;

use crate::core::error::invariant_violation;
use crate::core::types::{AgentId, Vec2};
use crate::data::modifiers::StressEatModifier;
use crate::entity::alert::{AlertLevel, AlertState, AlertStimulus, AlertTransition};
use crate::entity::stats::AgentStatBlock;
use crate::spatial::SpatialQuery;

/// Structure of Arrays for pigeon entities
pub struct Flock {
    modifier: StressEatModifier,
    next_id: u32,
    ids: Vec<AgentId>,
    positions: Vec<Vec2>,
    stats: Vec<AgentStatBlock>,
    alerts: Vec<AlertState>,
    index: AHashMap<AgentId, usize>,
}

impl Flock {
    pub fn new(modifier: StressEatModifier) -> Self {
        Self {
            modifier,
            next_id: 1,
            ids: Vec::new(),
            positions: Vec::new(),
            stats: Vec::new(),
            alerts: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Add a pigeon with an already resolved stat block
    pub fn spawn(&mut self, stats: AgentStatBlock, position: Vec2) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;

        self.index.insert(id, self.ids.len());
        self.ids.push(id);
        self.positions.push(position);
        self.stats.push(stats);
        self.alerts.push(AlertState::new());

        id
    }

    /// Remove a pigeon, returning its stat block
    pub fn despawn(&mut self, id: AgentId) -> Option<AgentStatBlock> {
        let idx = self.index.remove(&id)?;

        self.ids.remove(idx);
        self.positions.remove(idx);
        self.alerts.remove(idx);
        let stats = self.stats.remove(idx);

        for (row, later) in self.ids.iter().enumerate().skip(idx) {
            self.index.insert(*later, row);
        }

        Some(stats)
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Ids in spawn order
    pub fn ids(&self) -> &[AgentId] {
        &self.ids
    }

    pub fn modifier(&self) -> &StressEatModifier {
        &self.modifier
    }

    #[inline]
    fn row(&self, id: AgentId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn position(&self, id: AgentId) -> Option<Vec2> {
        self.row(id).map(|row| self.positions[row])
    }

    pub fn stats(&self, id: AgentId) -> Option<&AgentStatBlock> {
        self.row(id).map(|row| &self.stats[row])
    }

    pub fn alert_state(&self, id: AgentId) -> Option<&AlertState> {
        self.row(id).map(|row| &self.alerts[row])
    }

    pub fn state(&self, id: AgentId) -> Option<AlertLevel> {
        self.alert_state(id).map(AlertState::level)
    }

    pub fn alert(&self, id: AgentId) -> Option<f32> {
        self.alert_state(id).map(AlertState::alert)
    }

    /// Eat readiness; a missing pigeon cannot eat
    pub fn can_eat(&self, id: AgentId) -> bool {
        self.alert_state(id)
            .is_some_and(|alert| alert.can_eat(&self.modifier))
    }

    /// Effective eat interval in the pigeon's current state
    pub fn eat_interval(&self, id: AgentId) -> Option<f32> {
        let row = self.row(id)?;
        Some(self.alerts[row].effective_eat_interval(&self.stats[row], &self.modifier))
    }

    /// Effective eat chance in the pigeon's current state
    pub fn eat_chance(&self, id: AgentId) -> Option<f32> {
        let row = self.row(id)?;
        Some(self.alerts[row].effective_eat_chance(&self.stats[row], &self.modifier))
    }

    /// Largest eat radius in the flock, used to size trap discovery queries
    pub fn max_eat_radius(&self) -> f32 {
        self.stats
            .iter()
            .map(|stats| stats.eat_radius)
            .fold(0.0, f32::max)
    }

    pub fn set_position(&mut self, id: AgentId, position: Vec2) {
        match self.row(id) {
            Some(row) => self.positions[row] = position,
            None => invariant_violation(format_args!("set_position on missing {:?}", id)),
        }
    }

    pub fn add_crowd_alert(&mut self, id: AgentId, competitor_count: usize, dt: f32) {
        match self.row(id) {
            Some(row) => self.alerts[row].add_crowd_alert(&self.stats[row], competitor_count, dt),
            None => invariant_violation(format_args!("add_crowd_alert on missing {:?}", id)),
        }
    }

    pub fn add_alert(&mut self, id: AgentId, amount: f32) {
        match self.row(id) {
            Some(row) => self.alerts[row].add_alert(amount),
            None => invariant_violation(format_args!("add_alert on missing {:?}", id)),
        }
    }

    /// Explicit recovery, the only way out of Flee
    pub fn reset_alert(&mut self, id: AgentId) {
        match self.row(id) {
            Some(row) => self.alerts[row].reset(),
            None => invariant_violation(format_args!("reset_alert on missing {:?}", id)),
        }
    }

    /// Advance every pigeon's alert state by one tick
    ///
    /// `neighbor_counts` is indexed like [`Flock::ids`]; pass an empty slice
    /// for no ambient crowding. Transitions come back in spawn order.
    pub fn update_alerts(
        &mut self,
        dt: f32,
        player: Option<Vec2>,
        neighbor_counts: &[usize],
        parallel: bool,
    ) -> Vec<(AgentId, AlertTransition)> {
        let step = |row: usize, alert: &mut AlertState| {
            let stimulus = AlertStimulus {
                dt,
                player_distance: player.map(|p| p.distance(&self.positions[row])),
                neighbor_count: neighbor_counts.get(row).copied().unwrap_or(0),
            };
            alert
                .update(&self.stats[row], &stimulus)
                .map(|transition| (self.ids[row], transition))
        };

        let mut alerts = std::mem::take(&mut self.alerts);
        let transitions: Vec<_> = if parallel {
            alerts
                .par_iter_mut()
                .enumerate()
                .filter_map(|(row, alert)| step(row, alert))
                .collect()
        } else {
            alerts
                .iter_mut()
                .enumerate()
                .filter_map(|(row, alert)| step(row, alert))
                .collect()
        };
        self.alerts = alerts;

        transitions
    }

    /// Iterate `(id, position)` in spawn order
    pub fn iter_positions(&self) -> impl Iterator<Item = (AgentId, Vec2)> + '_ {
        self.ids.iter().copied().zip(self.positions.iter().copied())
    }

    /// Count pigeons in each state
    pub fn state_counts(&self) -> AHashMap<AlertLevel, usize> {
        let mut counts = AHashMap::new();
        for alert in &self.alerts {
            *counts.entry(alert.level()).or_insert(0) += 1;
        }
        counts
    }
}

/// Naive linear-scan radius query
impl SpatialQuery for Flock {
    fn agents_within(&self, center: Vec2, radius: f32) -> Vec<AgentId> {
        self.iter_positions()
            .filter(|(_, pos)| center.distance(pos) <= radius)
            .map(|(id, _)| id)
            .collect()
    }
}
