//! Headless Forage Runner
//!
//! Spawns a flock around a row of traps, walks the player in a slow orbit
//! through the field, and reports which pigeons each trap captured.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use pigeon_forage::core::{FaceId, Result, SimulationConfig, SpeciesId, TrapId, Vec2};
use pigeon_forage::data::{default_content_path, load_content};
use pigeon_forage::ecs::World;
use pigeon_forage::entity::AlertLevel;
use pigeon_forage::simulation::{run_simulation_tick, SimulationEvent};
use rand::Rng;
use serde::Serialize;

const TRAP_SPACING: f32 = 10.0;
const SPAWN_RING: (f32, f32) = (3.0, 8.0);
const WALK_SPEED: f32 = 1.0;
const FLEE_SPEED: f32 = 3.0;
const FLEE_DESPAWN_DISTANCE: f32 = 15.0;
const PLAYER_ORBIT_RADIUS: f32 = 7.0;
const PLAYER_ANGULAR_SPEED: f32 = 0.2;

/// Headless Forage Runner - pigeons, traps and a wandering player
#[derive(Parser, Debug)]
#[command(name = "forage_sim")]
#[command(about = "Run a headless pigeon foraging session and report captures")]
struct Args {
    /// Content tables (defaults to data/content.toml)
    #[arg(long)]
    content: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum ticks to simulate
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Pigeons to spawn
    #[arg(long, default_value_t = 24)]
    pigeons: usize,

    /// Traps to place (types cycle through the content table)
    #[arg(long, default_value_t = 3)]
    traps: usize,

    /// Leave the player out of the field entirely
    #[arg(long)]
    no_player: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Log every simulation event to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct CaptureSummary {
    trap: TrapId,
    trap_name: String,
    tick: u64,
    species: String,
    face: String,
    tier: u8,
    obesity: i32,
    bite_power: i32,
    price: i32,
}

#[derive(Serialize)]
struct TrapSummary {
    id: TrapId,
    name: String,
    remaining_feed: i32,
    max_feed: i32,
    captured: bool,
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    captures: Vec<CaptureSummary>,
    traps: Vec<TrapSummary>,
    fled: usize,
    remaining_pigeons: usize,
    states: BTreeMap<String, usize>,
    total_value: i64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let content_path = args.content.clone().unwrap_or_else(default_content_path);
    let tables = load_content(&content_path)?;
    let mut world = World::new(tables, SimulationConfig::default(), seed)?;

    setup_field(&mut world, &args)?;
    tracing::info!(
        "Field ready: {} pigeons, {} traps, seed {}",
        world.pigeon_count(),
        world.traps.len(),
        seed
    );

    let center = field_center(&world);
    let mut captures = Vec::new();
    let mut fled = 0;
    let mut ticks_run = 0;

    while ticks_run < args.ticks {
        if !args.no_player {
            let angle = ticks_run as f32 * args.dt * PLAYER_ANGULAR_SPEED;
            world.set_player(Some(
                center + Vec2::new(angle.cos(), angle.sin()) * PLAYER_ORBIT_RADIUS,
            ));
        }

        fled += steer(&mut world, args.dt, center);

        for event in run_simulation_tick(&mut world, args.dt) {
            if args.verbose {
                eprintln!("  [{}] {:?}", world.current_tick, event);
            }
            if let SimulationEvent::Captured { trap, tick, .. } = event {
                if let Some(summary) = summarize_capture(&world, trap, tick) {
                    captures.push(summary);
                }
            }
        }
        ticks_run += 1;

        if world.active_traps().next().is_none() || world.flock.is_empty() {
            break;
        }
    }

    let counts = world.flock.state_counts();
    let summary = RunSummary {
        seed,
        ticks: ticks_run,
        total_value: captures.iter().map(|c| c.price as i64).sum(),
        captures,
        traps: world
            .traps
            .iter()
            .map(|trap| TrapSummary {
                id: trap.id(),
                name: trap.name().to_string(),
                remaining_feed: trap.current_feed_amount(),
                max_feed: trap.max_feed_amount(),
                captured: trap.has_captured_pigeon(),
            })
            .collect(),
        fled,
        remaining_pigeons: world.pigeon_count(),
        states: AlertLevel::all()
            .iter()
            .map(|level| (format!("{:?}", level), counts.get(level).copied().unwrap_or(0)))
            .collect(),
    };

    match args.format.as_str() {
        "json" => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize summary: {}", e),
        },
        _ => print_text(&summary),
    }

    Ok(())
}

fn setup_field(world: &mut World, args: &Args) -> Result<()> {
    let trap_names: Vec<String> = world
        .tables()
        .trap_defs()
        .iter()
        .map(|def| def.name.clone())
        .collect();
    if !trap_names.is_empty() {
        for i in 0..args.traps {
            let name = &trap_names[i % trap_names.len()];
            world.place_trap(name, Vec2::new(i as f32 * TRAP_SPACING, 0.0))?;
        }
    }

    let species: Vec<SpeciesId> = world.tables().species_ids().collect();
    let faces: Vec<FaceId> = world.tables().face_ids().collect();
    if species.is_empty() || faces.is_empty() || world.traps.is_empty() {
        tracing::warn!("Nothing to simulate: content has no species, faces or traps");
        return Ok(());
    }

    for _ in 0..args.pigeons {
        let anchor = world.traps[world.rng.gen_range(0..world.traps.len())].position();
        let angle = world.rng.gen_range(0.0..std::f32::consts::TAU);
        let radius = world.rng.gen_range(SPAWN_RING.0..SPAWN_RING.1);
        let position = anchor + Vec2::new(angle.cos(), angle.sin()) * radius;

        let species_id = species[world.rng.gen_range(0..species.len())];
        let face_id = faces[world.rng.gen_range(0..faces.len())];
        world.spawn_pigeon(species_id, face_id, position)?;
    }

    Ok(())
}

fn field_center(world: &World) -> Vec2 {
    if world.traps.is_empty() {
        return Vec2::default();
    }
    let sum = world
        .traps
        .iter()
        .fold(Vec2::default(), |acc, trap| acc + trap.position());
    sum * (1.0 / world.traps.len() as f32)
}

/// Stand-in movement collaborator
///
/// Calm pigeons walk to the nearest open trap, BackOff pigeons hold still,
/// fleeing pigeons run from the player and leave the field once far enough.
/// Returns how many pigeons left.
fn steer(world: &mut World, dt: f32, center: Vec2) -> usize {
    let threat = world.player.unwrap_or(center);
    let mut departed = Vec::new();

    for id in world.flock.ids().to_vec() {
        let (Some(state), Some(pos), Some(stats)) = (
            world.flock.state(id),
            world.flock.position(id),
            world.flock.stats(id),
        ) else {
            continue;
        };
        let reach = stats.eat_radius * 0.5;

        match state {
            AlertLevel::Flee => {
                let away = (pos - threat).normalize();
                let next = pos + away * (FLEE_SPEED * dt);
                world.flock.set_position(id, next);
                if next.distance(&threat) > FLEE_DESPAWN_DISTANCE {
                    departed.push(id);
                }
            }
            AlertLevel::BackOff => {}
            AlertLevel::Normal | AlertLevel::Cautious => {
                let target = world
                    .active_traps()
                    .map(|trap| trap.position())
                    .min_by(|a, b| pos.distance(a).total_cmp(&pos.distance(b)));
                if let Some(target) = target {
                    let gap = pos.distance(&target);
                    if gap > reach {
                        let step = (WALK_SPEED * dt).min(gap - reach);
                        world
                            .flock
                            .set_position(id, pos + (target - pos).normalize() * step);
                    }
                }
            }
        }
    }

    for id in &departed {
        world.despawn_pigeon(*id);
    }
    departed.len()
}

fn summarize_capture(world: &World, trap_id: TrapId, tick: u64) -> Option<CaptureSummary> {
    let trap = world.trap(trap_id)?;
    let stats = trap.captured_pigeon_stats()?;
    let tables = world.tables();

    Some(CaptureSummary {
        trap: trap_id,
        trap_name: trap.name().to_string(),
        tick,
        species: tables.species(stats.species_id)?.name.clone(),
        face: tables.face(stats.face_id)?.name.clone(),
        tier: stats.tier.0,
        obesity: stats.obesity,
        bite_power: stats.bite_power,
        price: stats.price,
    })
}

fn print_text(summary: &RunSummary) {
    println!("=== Forage session (seed {}) ===", summary.seed);
    println!("Ticks run: {}", summary.ticks);
    println!();
    println!("Captures:");
    if summary.captures.is_empty() {
        println!("  (none)");
    }
    for capture in &summary.captures {
        println!(
            "  [{}] {} caught a {} {} (tier {}, obesity {}) worth {}",
            capture.tick,
            capture.trap_name,
            capture.face,
            capture.species,
            capture.tier,
            capture.obesity,
            capture.price
        );
    }
    println!();
    println!("Traps:");
    for trap in &summary.traps {
        println!(
            "  {:?} {}: {}/{} feed{}",
            trap.id,
            trap.name,
            trap.remaining_feed,
            trap.max_feed,
            if trap.captured { " (captured)" } else { "" }
        );
    }
    println!();
    println!(
        "Fled: {}  Remaining: {}  Total value: {}",
        summary.fled, summary.remaining_pigeons, summary.total_value
    );
    for (state, count) in &summary.states {
        println!("  {}: {}", state, count);
    }
}
