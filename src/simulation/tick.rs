//! Tick system - orchestrates simulation updates
//!
//! One tick runs, in order:
//! spatial rebuild -> alert update -> retreats -> trap claims -> trap updates
//! (in placement order)
//!
//! Alert integration touches only each pigeon's own state, so it runs on
//! rayon for large flocks. Traps stay sequential: competition stress writes
//! into shared pigeon state.

use crate::core::types::{AgentId, Tick, TrapId, Vec2};
use crate::ecs::world::World;
use crate::entity::alert::AlertLevel;
use crate::simulation::trap::TrapClaims;

/// Events generated during a simulation tick
///
/// Returned by `run_simulation_tick` for presentation and logging
/// collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// A pigeon's behavior state changed
    StateChanged {
        agent: AgentId,
        from: AlertLevel,
        to: AlertLevel,
        tick: Tick,
    },
    /// A pigeon entered BackOff and was pushed away from the player
    Retreat {
        agent: AgentId,
        distance: f32,
        tick: Tick,
    },
    /// A pigeon took a bite out of a trap
    Bite {
        trap: TrapId,
        agent: AgentId,
        amount: i32,
        remaining: i32,
        tick: Tick,
    },
    /// A trap ran dry and captured the pigeon that emptied it
    Captured {
        trap: TrapId,
        agent: AgentId,
        price: i32,
        tick: Tick,
    },
}

/// Run a single simulation tick of `dt` seconds
///
/// 1. Rebuild the spatial grid
/// 2. Update every pigeon's alert (player proximity, optional ambient crowding)
/// 3. Apply one-shot retreats for pigeons that just entered BackOff
/// 4. Give every pigeon in reach to its nearest open trap
/// 5. Update each trap over its own pigeons: discovery, competition stress,
///    eat timers, capture
/// 6. Advance tick counter
pub fn run_simulation_tick(world: &mut World, dt: f32) -> Vec<SimulationEvent> {
    let mut events = Vec::new();

    world.grid.rebuild(world.flock.iter_positions());

    update_alerts(world, dt, &mut events);
    update_traps(world, dt, &mut events);

    world.current_tick += 1;

    events
}

fn neighbor_counts(world: &World) -> Vec<usize> {
    let Some(radius) = world.config().ambient_crowd_radius else {
        return Vec::new();
    };

    world
        .flock
        .iter_positions()
        .map(|(_, pos)| world.grid.query_radius(pos, radius).len().saturating_sub(1))
        .collect()
}

fn update_alerts(world: &mut World, dt: f32, events: &mut Vec<SimulationEvent>) {
    let counts = neighbor_counts(world);
    let parallel = world.flock.count() >= world.config().parallel_threshold;
    let tick = world.current_tick;

    let transitions = world.flock.update_alerts(dt, world.player, &counts, parallel);

    let mut moved = false;
    for (agent, transition) in transitions {
        tracing::debug!(
            "{:?}: {:?} -> {:?}",
            agent,
            transition.from,
            transition.to
        );
        events.push(SimulationEvent::StateChanged {
            agent,
            from: transition.from,
            to: transition.to,
            tick,
        });

        if let Some(distance) = transition.retreat {
            moved |= apply_retreat(world, agent, distance);
            events.push(SimulationEvent::Retreat { agent, distance, tick });
        }
    }

    if moved {
        world.grid.rebuild(world.flock.iter_positions());
    }
}

/// Push a pigeon `distance` straight away from the player
///
/// Without a player, or with the pigeon standing on the player, there is no
/// direction to retreat in and the order is a no-op.
fn apply_retreat(world: &mut World, agent: AgentId, distance: f32) -> bool {
    let (Some(player), Some(pos)) = (world.player, world.flock.position(agent)) else {
        return false;
    };

    let away = (pos - player).normalize();
    if away == Vec2::default() {
        return false;
    }

    world.flock.set_position(agent, pos + away * distance);
    true
}

fn update_traps(world: &mut World, dt: f32, events: &mut Vec<SimulationEvent>) {
    let tick = world.current_tick;
    let config = world.config().clone();
    let claims = TrapClaims::assign(
        &world.traps,
        &world.flock,
        &world.grid,
        config.eat_range_slack,
    );

    for idx in 0..world.traps.len() {
        let trap = &mut world.traps[idx];
        if trap.has_captured_pigeon() {
            continue;
        }

        let trap_id = trap.id();
        let view = claims.view(trap_id, &world.grid);
        let report = trap.update(dt, &mut world.flock, &view, &config, &mut world.rng);

        for bite in &report.bites {
            events.push(SimulationEvent::Bite {
                trap: trap_id,
                agent: bite.agent,
                amount: bite.amount,
                remaining: bite.remaining,
                tick,
            });
        }

        if let Some(agent) = report.captured {
            let price = trap.captured_pigeon_stats().map_or(0, |stats| stats.price);

            for other in &mut world.traps {
                other.forget(agent);
            }
            world.grid.rebuild(world.flock.iter_positions());

            events.push(SimulationEvent::Captured {
                trap: trap_id,
                agent,
                price,
                tick,
            });
        }
    }
}
