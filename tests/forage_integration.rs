//! Forage integration tests
//!
//! Drive whole ticks through `World` with a small inline content table so
//! every number in the assertions can be worked out by hand.

use pigeon_forage::core::{AgentId, FaceId, SpeciesId, Tier, TrapId, Vec2};
use pigeon_forage::core::{ForageError, SimulationConfig};
use pigeon_forage::data::{default_content_path, load_content, parse_content, ContentTables};
use pigeon_forage::ecs::World;
use pigeon_forage::entity::AlertLevel;
use pigeon_forage::simulation::{run_simulation_tick, SimulationEvent};

/// One tier that eats every second without fail and never calms down
const FIXTURE: &str = r#"
[[tiers]]
eat_interval = 1.0
eat_chance = 1.0
personal_space_radius = 3.0
player_alert_per_sec = 10.0
crowd_alert_per_neighbor_per_sec = 2.0
alert_decay_per_sec = 0.0
warn_threshold = 30.0
backoff_threshold = 60.0
flee_threshold = 100.0
backoff_duration = 2.0
backoff_distance = 1.5
crowd_weight = 1.0
player_weight = 1.0
base_price = 100

[obesity]
bite_power_equals_obesity = true
price_discounts = [{ obesity = 5, discount = 0.25 }]

[stress]
enabled = true
warn_eat_chance_multiplier = 0.5
warn_eat_interval_multiplier = 2.0
backoff_stops_eating = true

[[species]]
name = "dove"
tier = 1
obesity_min = 5
obesity_max = 5
default_bite_power = 1
eat_radius = 1.0

[[faces]]
name = "plain"
price_multiplier = 1.0

[[faces]]
name = "fancy"
price_multiplier = 2.0

[[traps]]
name = "bread"
feed_amount = 20
"#;

const DOVE: SpeciesId = SpeciesId(0);
const PLAIN: FaceId = FaceId(0);

fn tables() -> ContentTables {
    parse_content(FIXTURE).unwrap()
}

fn world() -> World {
    World::new(tables(), SimulationConfig::default(), 1234).unwrap()
}

fn spawn_at(world: &mut World, x: f32) -> AgentId {
    world
        .spawn_pigeon_with(DOVE, PLAIN, 5, Tier(1), Vec2::new(x, 0.0))
        .unwrap()
}

fn bites_on(events: &[SimulationEvent], trap_id: TrapId) -> Vec<(AgentId, i32)> {
    events
        .iter()
        .filter_map(|event| match event {
            SimulationEvent::Bite { trap, agent, remaining, .. } if *trap == trap_id => {
                Some((*agent, *remaining))
            }
            _ => None,
        })
        .collect()
}

/// Feed 20, bite power 5: four bites, the fourth empties the trap and
/// captures the pigeon.
#[test]
fn test_single_pigeon_captured_on_fourth_bite() {
    let mut world = world();
    let trap = world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
    let pigeon = spawn_at(&mut world, 0.5);

    let mut remaining = Vec::new();
    let mut captured_at = None;
    for _ in 0..10 {
        let events = run_simulation_tick(&mut world, 1.0);
        remaining.extend(bites_on(&events, trap).into_iter().map(|(_, left)| left));
        for event in events {
            if let SimulationEvent::Captured { agent, price, tick, .. } = event {
                assert_eq!(agent, pigeon);
                assert_eq!(price, 75); // 100 * 1.0 * (1 - 0.25)
                captured_at = Some(tick);
            }
        }
    }

    assert_eq!(remaining, vec![15, 10, 5, 0]);
    assert_eq!(captured_at, Some(3));
    assert_eq!(world.pigeon_count(), 0);

    let trap = world.trap(trap).unwrap();
    assert!(trap.has_captured_pigeon());
    assert_eq!(trap.captured_pigeon().map(|c| c.agent), Some(pigeon));
    assert_eq!(trap.captured_pigeon_stats().unwrap().bite_power, 5);
}

/// Two eligible pigeons each feel one competitor: +2 alert per second,
/// not +4.
#[test]
fn test_two_competitors_stress_each_other_once() {
    let mut world = world();
    let trap = world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
    let a = spawn_at(&mut world, 0.5);
    let b = spawn_at(&mut world, -0.5);

    let events = run_simulation_tick(&mut world, 1.0);

    assert!((world.flock.alert(a).unwrap() - 2.0).abs() < 1e-6);
    assert!((world.flock.alert(b).unwrap() - 2.0).abs() < 1e-6);

    // Both ate, in spawn order
    assert_eq!(bites_on(&events, trap), vec![(a, 15), (b, 10)]);
    assert_eq!(world.trap(trap).unwrap().contestants(), &[a, b]);
}

#[test]
fn test_competition_ends_with_one_capture() {
    let mut world = world();
    let trap = world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
    let a = spawn_at(&mut world, 0.5);
    let b = spawn_at(&mut world, -0.5);

    let mut captures = Vec::new();
    for _ in 0..10 {
        for event in run_simulation_tick(&mut world, 1.0) {
            if let SimulationEvent::Captured { agent, .. } = event {
                captures.push(agent);
            }
        }
    }

    // 15, 10 on tick 0; 5, 0 on tick 1; b lands the emptying bite
    assert_eq!(captures, vec![b]);
    assert!(world.flock.contains(a));
    assert!(!world.flock.contains(b));

    let trap = world.trap(trap).unwrap();
    assert!(trap.eat_timer(a).is_none());
    assert!(trap.contestants().is_empty());
}

/// A pigeon in reach of two traps belongs to the nearer one only: one
/// eat timer, one bite per interval, one source of competition stress.
#[test]
fn test_pigeon_between_traps_eats_from_one() {
    let mut world = world();
    let near = world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
    let far = world.place_trap("bread", Vec2::new(0.4, 0.0)).unwrap();
    let pigeon = spawn_at(&mut world, 0.15);

    let mut near_bites = 0;
    let mut far_bites = 0;
    for _ in 0..2 {
        let events = run_simulation_tick(&mut world, 1.0);
        near_bites += bites_on(&events, near).len();
        far_bites += bites_on(&events, far).len();

        let (near_trap, far_trap) = (world.trap(near).unwrap(), world.trap(far).unwrap());
        assert_eq!(near_trap.contestants(), &[pigeon]);
        assert!(far_trap.contestants().is_empty());
        assert!(far_trap.eat_timer(pigeon).is_none());
    }

    assert_eq!((near_bites, far_bites), (2, 0));
    assert_eq!(world.trap(near).unwrap().current_feed_amount(), 10);
    assert_eq!(world.trap(far).unwrap().current_feed_amount(), 20);
}

#[test]
fn test_captured_trap_ignores_later_pigeons() {
    let mut world = world();
    let trap = world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
    let first = spawn_at(&mut world, 0.5);
    for _ in 0..4 {
        run_simulation_tick(&mut world, 1.0);
    }
    assert!(world.trap(trap).unwrap().has_captured_pigeon());

    let latecomer = spawn_at(&mut world, 0.2);
    for _ in 0..6 {
        let events = run_simulation_tick(&mut world, 1.0);
        assert!(bites_on(&events, trap).is_empty());
    }

    let trap = world.trap(trap).unwrap();
    assert_eq!(trap.current_feed_amount(), 0);
    assert_eq!(trap.captured_pigeon().map(|c| c.agent), Some(first));
    assert!(trap.contestants().is_empty());
    assert!(!trap.is_pigeon_eating(latecomer));
    assert!(world.flock.contains(latecomer));
}

#[test]
fn test_fleeing_pigeon_never_eats_until_reset() {
    let mut world = world();
    let trap = world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
    let pigeon = spawn_at(&mut world, 0.5);
    world.flock.add_alert(pigeon, 150.0);

    for _ in 0..5 {
        let events = run_simulation_tick(&mut world, 1.0);
        assert!(bites_on(&events, trap).is_empty());
    }
    assert_eq!(world.flock.state(pigeon), Some(AlertLevel::Flee));
    assert_eq!(world.trap(trap).unwrap().current_feed_amount(), 20);

    world.flock.reset_alert(pigeon);
    let events = run_simulation_tick(&mut world, 1.0);
    assert_eq!(bites_on(&events, trap), vec![(pigeon, 15)]);
}

#[test]
fn test_backoff_stops_eating_and_retreats_once() {
    let mut world = world();
    let trap = world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
    let pigeon = spawn_at(&mut world, 0.5);
    world.flock.add_alert(pigeon, 70.0);

    let mut retreats = 0;
    for _ in 0..7 {
        let events = run_simulation_tick(&mut world, 1.0);
        assert!(bites_on(&events, trap).is_empty());
        retreats += events
            .iter()
            .filter(|e| matches!(e, SimulationEvent::Retreat { .. }))
            .count();
        assert!(world.trap(trap).unwrap().eat_timer(pigeon).is_none());
    }

    // Alert never decays here, so each expiry restarts BackOff silently
    assert_eq!(retreats, 1);
    assert_eq!(world.flock.state(pigeon), Some(AlertLevel::BackOff));
}

#[test]
fn test_cautious_pigeon_eats_slower() {
    let mut world = world();
    let pigeon = spawn_at(&mut world, 0.5);
    world.flock.add_alert(pigeon, 40.0);
    run_simulation_tick(&mut world, 0.1);

    assert_eq!(world.flock.state(pigeon), Some(AlertLevel::Cautious));
    assert_eq!(world.flock.eat_interval(pigeon), Some(2.0));
    assert_eq!(world.flock.eat_chance(pigeon), Some(0.5));
}

#[test]
fn test_player_pushes_pigeon_through_states() {
    let mut world = world();
    let pigeon = spawn_at(&mut world, 1.0);
    world.set_player(Some(Vec2::new(0.0, 0.0)));

    let mut seen = vec![AlertLevel::Normal];
    for _ in 0..20 {
        for event in run_simulation_tick(&mut world, 1.0) {
            if let SimulationEvent::StateChanged { agent, to, .. } = event {
                assert_eq!(agent, pigeon);
                seen.push(to);
            }
        }
    }

    // 10/s inside 3 units: Cautious at 30, BackOff at 60 (retreat to 2.5,
    // still inside), Flee at 100
    assert_eq!(
        seen,
        vec![
            AlertLevel::Normal,
            AlertLevel::Cautious,
            AlertLevel::BackOff,
            AlertLevel::Flee
        ]
    );
}

#[test]
fn test_despawn_purges_trap_bookkeeping() {
    let mut world = world();
    let trap = world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
    let pigeon = spawn_at(&mut world, 0.5);
    run_simulation_tick(&mut world, 0.5);
    assert!(world.trap(trap).unwrap().eat_timer(pigeon).is_some());

    assert!(world.despawn_pigeon(pigeon).is_some());

    let trap = world.trap(trap).unwrap();
    assert!(trap.eat_timer(pigeon).is_none());
    assert!(!trap.contestants().contains(&pigeon));
    assert!(world.flock.state(pigeon).is_none());
}

#[test]
fn test_face_and_obesity_set_price() {
    let mut world = world();
    let fancy = world.tables().face_id("fancy").unwrap();
    let pigeon = world
        .spawn_pigeon_with(DOVE, fancy, 5, Tier(1), Vec2::default())
        .unwrap();
    assert_eq!(world.flock.stats(pigeon).unwrap().price, 150);

    assert!(matches!(
        world.spawn_pigeon_with(DOVE, FaceId(9), 5, Tier(1), Vec2::default()),
        Err(ForageError::UnknownFace(_))
    ));
    assert!(matches!(
        world.spawn_pigeon_with(DOVE, PLAIN, 5, Tier(4), Vec2::default()),
        Err(ForageError::UnknownTier(_))
    ));
}

#[test]
fn test_bundled_content_runs_deterministically() {
    let run = |seed: u64| {
        let tables = load_content(&default_content_path()).unwrap();
        let mut world = World::new(tables, SimulationConfig::default(), seed).unwrap();
        let species: Vec<SpeciesId> = world.tables().species_ids().collect();

        world.place_trap("bread", Vec2::new(0.0, 0.0)).unwrap();
        world.place_trap("crumbs", Vec2::new(6.0, 0.0)).unwrap();
        for i in 0..12 {
            let x = (i % 4) as f32 * 2.0 - 1.0;
            let y = (i / 4) as f32 * 0.4 - 0.4;
            world
                .spawn_pigeon(species[i % species.len()], PLAIN, Vec2::new(x, y))
                .unwrap();
        }

        let mut log = Vec::new();
        for _ in 0..400 {
            log.extend(run_simulation_tick(&mut world, 0.1));
        }
        log
    };

    let first = run(99);
    assert_eq!(first, run(99));
    assert!(first
        .iter()
        .any(|e| matches!(e, SimulationEvent::Bite { .. })));
}
