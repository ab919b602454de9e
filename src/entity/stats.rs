//! Instance stat resolution
//!
//! Turns `(species, face, obesity, tier)` plus the content tables into the
//! flat stat block a pigeon carries for its whole life.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{ForageError, Result};
use crate::core::types::{FaceId, SpeciesId, Tier};
use crate::data::catalog::{ContentTables, SpeciesDef};

/// Resolved, per-instance stats for one pigeon
///
/// A deep copy of this block is what a trap keeps after a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatBlock {
    pub species_id: SpeciesId,
    pub face_id: FaceId,
    pub tier: Tier,
    pub obesity: i32,
    pub bite_power: i32,
    pub price: i32,
    /// Distance to a trap within which this pigeon can eat
    pub eat_radius: f32,

    pub eat_interval: f32,
    pub eat_chance: f32,

    pub personal_space_radius: f32,
    pub player_alert_per_sec: f32,
    pub crowd_alert_per_neighbor_per_sec: f32,
    pub alert_decay_per_sec: f32,

    pub warn_threshold: f32,
    pub backoff_threshold: f32,
    pub flee_threshold: f32,

    pub backoff_duration: f32,
    pub backoff_distance: f32,

    pub crowd_weight: f32,
    pub player_weight: f32,
}

/// Resolve the stat block for one pigeon instance
///
/// Unknown species, face or tier is a configuration error; no pigeon may be
/// spawned without a resolved block.
pub fn resolve_stats(
    tables: &ContentTables,
    species_id: SpeciesId,
    face_id: FaceId,
    obesity: i32,
    tier: Tier,
) -> Result<AgentStatBlock> {
    let species = tables
        .species(species_id)
        .ok_or(ForageError::UnknownSpecies(species_id))?;
    let face = tables.face(face_id).ok_or(ForageError::UnknownFace(face_id))?;
    let profile = tables.profiles.require(tier)?;
    let rule = &tables.obesity;

    let bite_power = if rule.bite_power_equals_obesity {
        obesity
    } else {
        species.default_bite_power
    };

    let eat_interval = profile.eat_interval * rule.eat_interval_multiplier(obesity);

    let discount = rule.price_discount(obesity) as f64;
    let raw_price = profile.base_price as f64 * face.price_multiplier as f64 * (1.0 - discount);
    let price = (raw_price.round() as i32).max(0);

    Ok(AgentStatBlock {
        species_id,
        face_id,
        tier,
        obesity,
        bite_power,
        price,
        eat_radius: species.eat_radius,
        eat_interval,
        eat_chance: profile.eat_chance,
        personal_space_radius: profile.personal_space_radius,
        player_alert_per_sec: profile.player_alert_per_sec,
        crowd_alert_per_neighbor_per_sec: profile.crowd_alert_per_neighbor_per_sec,
        alert_decay_per_sec: profile.alert_decay_per_sec,
        warn_threshold: profile.warn_threshold,
        backoff_threshold: profile.backoff_threshold,
        flee_threshold: profile.flee_threshold,
        backoff_duration: profile.backoff_duration,
        backoff_distance: profile.backoff_distance,
        crowd_weight: profile.crowd_weight,
        player_weight: profile.player_weight,
    })
}

/// Draw an obesity value from the species' inclusive default range
pub fn draw_obesity(species: &SpeciesDef, rng: &mut impl Rng) -> i32 {
    rng.gen_range(species.obesity_min..=species.obesity_max)
}
