//! Trap feed resource and capture resolution
//!
//! A trap holds a depleting integer feed counter. Every tick it rediscovers
//! which pigeons are close enough to eat, stresses competing eaters, runs
//! each eater's own interval timer and rolls eat attempts. The bite that
//! takes feed to zero or below captures that pigeon: its stat block is
//! deep-copied into the trap and the pigeon is removed from the flock.
//!
//! Captured is terminal. A captured trap ignores every later update.

use ahash::{AHashMap, AHashSet};
use rand::Rng;
use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::error::{invariant_violation, Result};
use crate::core::types::{AgentId, TrapId, Vec2};
use crate::data::catalog::TrapDef;
use crate::entity::flock::Flock;
use crate::entity::stats::AgentStatBlock;
use crate::spatial::SpatialQuery;

/// Snapshot kept by a trap after capture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedPigeon {
    pub agent: AgentId,
    pub stats: AgentStatBlock,
}

/// A successful bite during one trap update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bite {
    pub agent: AgentId,
    pub amount: i32,
    pub remaining: i32,
}

/// Everything that happened at one trap in one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrapReport {
    pub attempts: usize,
    pub bites: Vec<Bite>,
    /// Pigeon captured this tick; already despawned from the flock
    pub captured: Option<AgentId>,
}

/// One placed trap
#[derive(Debug, Clone)]
pub struct Trap {
    id: TrapId,
    name: String,
    position: Vec2,
    current_feed_amount: i32,
    initial_feed_amount: i32,
    captured: Option<CapturedPigeon>,
    contestants: Vec<AgentId>,
    eat_timers: AHashMap<AgentId, f32>,
    eating_display: AHashMap<AgentId, f32>,
}

impl Trap {
    /// Place a trap; a non-positive feed amount is a configuration error
    pub fn new(id: TrapId, def: &TrapDef, position: Vec2) -> Result<Self> {
        def.validate()?;
        Ok(Self {
            id,
            name: def.name.clone(),
            position,
            current_feed_amount: def.feed_amount,
            initial_feed_amount: def.feed_amount,
            captured: None,
            contestants: Vec::new(),
            eat_timers: AHashMap::new(),
            eating_display: AHashMap::new(),
        })
    }

    pub fn id(&self) -> TrapId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn current_feed_amount(&self) -> i32 {
        self.current_feed_amount
    }

    pub fn max_feed_amount(&self) -> i32 {
        self.initial_feed_amount
    }

    /// Remaining feed as a 0..=1 fraction of the initial amount
    pub fn feed_ratio(&self) -> f32 {
        (self.current_feed_amount.max(0) as f32 / self.initial_feed_amount as f32).clamp(0.0, 1.0)
    }

    pub fn has_captured_pigeon(&self) -> bool {
        self.captured.is_some()
    }

    pub fn captured_pigeon(&self) -> Option<&CapturedPigeon> {
        self.captured.as_ref()
    }

    pub fn captured_pigeon_stats(&self) -> Option<&AgentStatBlock> {
        self.captured.as_ref().map(|c| &c.stats)
    }

    /// Pigeons discovered in range on the last update, in spawn order
    pub fn contestants(&self) -> &[AgentId] {
        &self.contestants
    }

    /// Presentation cue: did this pigeon land a bite very recently
    pub fn is_pigeon_eating(&self, agent: AgentId) -> bool {
        self.eating_display.contains_key(&agent)
    }

    /// Accumulated eat timer for a pigeon, `None` if it has no running timer
    pub fn eat_timer(&self, agent: AgentId) -> Option<f32> {
        self.eat_timers.get(&agent).copied()
    }

    /// Drop every reference to a destroyed pigeon
    pub fn forget(&mut self, agent: AgentId) {
        self.contestants.retain(|&a| a != agent);
        self.eat_timers.remove(&agent);
        self.eating_display.remove(&agent);
    }

    /// Distance to `agent` when it stands within its own eat radius plus slack
    fn reach(&self, flock: &Flock, agent: AgentId, slack: f32) -> Option<f32> {
        let (pos, stats) = (flock.position(agent)?, flock.stats(agent)?);
        let distance = self.position.distance(&pos);
        (distance <= stats.eat_radius + slack).then_some(distance)
    }

    /// Recompute contestants: pigeons within their own eat radius plus slack
    fn discover(&mut self, flock: &Flock, spatial: &impl SpatialQuery, slack: f32) {
        let query_radius = flock.max_eat_radius() + slack;

        let mut found: Vec<AgentId> = spatial
            .agents_within(self.position, query_radius)
            .into_iter()
            .filter(|&agent| self.reach(flock, agent, slack).is_some())
            .collect();

        found.sort_unstable();
        found.dedup();
        self.contestants = found;
    }

    /// Run one tick of discovery, competition and eating
    pub fn update(
        &mut self,
        dt: f32,
        flock: &mut Flock,
        spatial: &impl SpatialQuery,
        config: &SimulationConfig,
        rng: &mut impl Rng,
    ) -> TrapReport {
        let mut report = TrapReport::default();
        if self.captured.is_some() {
            return report;
        }

        self.eating_display.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });

        self.discover(flock, spatial, config.eat_range_slack);

        // Snapshot eligibility before any stress is applied this pass
        let eligible: Vec<AgentId> = self
            .contestants
            .iter()
            .copied()
            .filter(|&agent| flock.can_eat(agent))
            .collect();

        if eligible.len() > 1 {
            let others = eligible.len() - 1;
            for &agent in &eligible {
                flock.add_crowd_alert(agent, others, dt);
            }
        }

        let eligible_set: AHashSet<AgentId> = eligible.iter().copied().collect();
        self.eat_timers.retain(|agent, _| eligible_set.contains(agent));

        for &agent in &eligible {
            let interval = flock.eat_interval(agent).unwrap_or(f32::INFINITY);
            let timer = self.eat_timers.entry(agent).or_insert(0.0);
            *timer += dt;
            if *timer < interval {
                continue;
            }
            *timer = 0.0;

            report.attempts += 1;
            let chance = flock.eat_chance(agent).unwrap_or(0.0);
            let draw: f32 = rng.gen();
            if draw >= chance {
                tracing::trace!("Trap {:?}: {:?} missed (draw {:.3} vs {:.3})", self.id, agent, draw, chance);
                continue;
            }

            let Some(bite_power) = flock.stats(agent).map(|s| s.bite_power) else {
                continue;
            };

            self.current_feed_amount -= bite_power;
            self.eating_display.insert(agent, config.eating_display_secs);
            report.bites.push(Bite {
                agent,
                amount: bite_power,
                remaining: self.current_feed_amount,
            });
            tracing::debug!(
                "Trap {:?}: {:?} ate {} ({} left)",
                self.id,
                agent,
                bite_power,
                self.current_feed_amount
            );

            if self.current_feed_amount <= 0 {
                if self.capture(agent, flock) {
                    report.captured = Some(agent);
                }
                break;
            }
        }

        report
    }

    fn capture(&mut self, agent: AgentId, flock: &mut Flock) -> bool {
        let Some(stats) = flock.despawn(agent) else {
            invariant_violation(format_args!(
                "trap {:?} emptied by missing {:?}",
                self.id, agent
            ));
            return false;
        };

        tracing::info!(
            "Trap {:?} ({}) captured {:?}: tier {}, obesity {}, price {}",
            self.id,
            self.name,
            agent,
            stats.tier.0,
            stats.obesity,
            stats.price
        );

        self.captured = Some(CapturedPigeon { agent, stats });
        self.contestants.clear();
        self.eat_timers.clear();
        self.eating_display.clear();
        true
    }
}

/// Which trap each pigeon belongs to for one tick
///
/// A pigeon in reach of several open traps joins the nearest one; equal
/// distances go to the earliest placed trap. A trap only sees the pigeons it
/// owns.
#[derive(Debug, Clone, Default)]
pub struct TrapClaims {
    owners: AHashMap<AgentId, TrapId>,
}

impl TrapClaims {
    /// Claim pigeons for `traps` (in placement order); captured traps claim nothing
    pub fn assign(
        traps: &[Trap],
        flock: &Flock,
        spatial: &impl SpatialQuery,
        slack: f32,
    ) -> Self {
        let query_radius = flock.max_eat_radius() + slack;
        let mut nearest: AHashMap<AgentId, (TrapId, f32)> = AHashMap::new();

        for trap in traps.iter().filter(|trap| !trap.has_captured_pigeon()) {
            for agent in spatial.agents_within(trap.position, query_radius) {
                let Some(distance) = trap.reach(flock, agent, slack) else {
                    continue;
                };
                match nearest.get(&agent) {
                    Some(&(_, best)) if best <= distance => {}
                    _ => {
                        nearest.insert(agent, (trap.id, distance));
                    }
                }
            }
        }

        Self {
            owners: nearest
                .into_iter()
                .map(|(agent, (trap, _))| (agent, trap))
                .collect(),
        }
    }

    pub fn owner(&self, agent: AgentId) -> Option<TrapId> {
        self.owners.get(&agent).copied()
    }

    /// Narrow `spatial` to the pigeons claimed by `trap`
    pub fn view<'a, S: SpatialQuery>(&'a self, trap: TrapId, spatial: &'a S) -> ClaimedView<'a, S> {
        ClaimedView {
            claims: self,
            trap,
            spatial,
        }
    }
}

/// Spatial view restricted to one trap's claimed pigeons
pub struct ClaimedView<'a, S> {
    claims: &'a TrapClaims,
    trap: TrapId,
    spatial: &'a S,
}

impl<S: SpatialQuery> SpatialQuery for ClaimedView<'_, S> {
    fn agents_within(&self, center: Vec2, radius: f32) -> Vec<AgentId> {
        self.spatial
            .agents_within(center, radius)
            .into_iter()
            .filter(|&agent| self.claims.owner(agent) == Some(self.trap))
            .collect()
    }
}
