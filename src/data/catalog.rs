//! Species, face and trap definitions plus the assembled content tables
//!
//! `ContentTables` is built once at load time and then shared read-only by
//! the stat resolver, the flock and the world. Ids are dense indices; name
//! lookups go through hash indices and return `None` when missing.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{ForageError, Result};
use crate::core::types::{FaceId, SpeciesId, Tier};
use crate::data::modifiers::{ObesityRule, StressEatModifier};
use crate::data::profiles::BehaviorProfileTable;

/// A pigeon species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub name: String,
    /// Tier used when spawning without an explicit tier
    pub tier: Tier,
    /// Inclusive range obesity is drawn from at spawn
    pub obesity_min: i32,
    pub obesity_max: i32,
    /// Bite power when the obesity rule does not set it
    pub default_bite_power: i32,
    /// How close to a trap this species must be to eat from it
    pub eat_radius: f32,
}

/// A cosmetic face variant that scales price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDef {
    pub name: String,
    pub price_multiplier: f32,
}

/// A placeable trap type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrapDef {
    pub name: String,
    pub feed_amount: i32,
}

impl TrapDef {
    pub fn validate(&self) -> Result<()> {
        if self.feed_amount <= 0 {
            return Err(ForageError::InvalidFeedAmount {
                trap: self.name.clone(),
                amount: self.feed_amount,
            });
        }
        Ok(())
    }
}

/// All read-only content the core consumes
#[derive(Debug, Clone)]
pub struct ContentTables {
    pub profiles: BehaviorProfileTable,
    pub obesity: ObesityRule,
    pub stress: StressEatModifier,
    species: Vec<SpeciesDef>,
    faces: Vec<FaceDef>,
    traps: Vec<TrapDef>,
    species_by_name: AHashMap<String, SpeciesId>,
    faces_by_name: AHashMap<String, FaceId>,
    traps_by_name: AHashMap<String, usize>,
}

impl ContentTables {
    /// Assemble and validate content tables
    pub fn new(
        profiles: BehaviorProfileTable,
        obesity: ObesityRule,
        stress: StressEatModifier,
        species: Vec<SpeciesDef>,
        faces: Vec<FaceDef>,
        traps: Vec<TrapDef>,
    ) -> Result<Self> {
        for def in &species {
            if def.obesity_min > def.obesity_max || def.obesity_min < 0 {
                return Err(ForageError::InvalidObesityRange {
                    species: def.name.clone(),
                    min: def.obesity_min,
                    max: def.obesity_max,
                });
            }
            if profiles.get(def.tier).is_none() {
                return Err(ForageError::UnknownTier(def.tier));
            }
            if def.default_bite_power < 0 || !(def.eat_radius >= 0.0) {
                return Err(ForageError::InvalidContent(format!(
                    "species '{}' needs non-negative bite power and eat radius",
                    def.name
                )));
            }
        }

        for face in &faces {
            if !(face.price_multiplier >= 0.0) {
                return Err(ForageError::InvalidContent(format!(
                    "face '{}' has negative price multiplier",
                    face.name
                )));
            }
        }

        for trap in &traps {
            trap.validate()?;
        }

        let species_by_name = index_names(species.iter().map(|s| s.name.as_str()), "species")?
            .into_iter()
            .map(|(name, idx)| (name, SpeciesId(idx as u16)))
            .collect();
        let faces_by_name = index_names(faces.iter().map(|f| f.name.as_str()), "face")?
            .into_iter()
            .map(|(name, idx)| (name, FaceId(idx as u16)))
            .collect();
        let traps_by_name = index_names(traps.iter().map(|t| t.name.as_str()), "trap")?;

        Ok(Self {
            profiles,
            obesity,
            stress,
            species,
            faces,
            traps,
            species_by_name,
            faces_by_name,
            traps_by_name,
        })
    }

    pub fn species(&self, id: SpeciesId) -> Option<&SpeciesDef> {
        self.species.get(id.0 as usize)
    }

    pub fn face(&self, id: FaceId) -> Option<&FaceDef> {
        self.faces.get(id.0 as usize)
    }

    pub fn trap(&self, name: &str) -> Option<&TrapDef> {
        self.traps_by_name.get(name).and_then(|&idx| self.traps.get(idx))
    }

    pub fn species_id(&self, name: &str) -> Option<SpeciesId> {
        self.species_by_name.get(name).copied()
    }

    pub fn face_id(&self, name: &str) -> Option<FaceId> {
        self.faces_by_name.get(name).copied()
    }

    pub fn species_ids(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        (0..self.species.len()).map(|idx| SpeciesId(idx as u16))
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(|idx| FaceId(idx as u16))
    }

    pub fn trap_defs(&self) -> &[TrapDef] {
        &self.traps
    }
}

fn index_names<'a>(
    names: impl Iterator<Item = &'a str>,
    kind: &str,
) -> Result<AHashMap<String, usize>> {
    let mut index = AHashMap::new();
    for (idx, name) in names.enumerate() {
        if index.insert(name.to_string(), idx).is_some() {
            return Err(ForageError::InvalidContent(format!(
                "duplicate {} name '{}'",
                kind, name
            )));
        }
    }
    Ok(index)
}

#[cfg(test)]
pub(crate) fn sample_tables() -> ContentTables {
    use crate::data::profiles::sample_profile;

    let mut rare = sample_profile();
    rare.base_price = 400;
    rare.eat_interval = 3.0;

    ContentTables::new(
        BehaviorProfileTable::new(vec![sample_profile(), rare]).unwrap(),
        ObesityRule::default(),
        StressEatModifier::default(),
        vec![
            SpeciesDef {
                name: "rock_dove".into(),
                tier: Tier(1),
                obesity_min: 1,
                obesity_max: 3,
                default_bite_power: 2,
                eat_radius: 1.0,
            },
            SpeciesDef {
                name: "crowned".into(),
                tier: Tier(2),
                obesity_min: 2,
                obesity_max: 5,
                default_bite_power: 4,
                eat_radius: 1.5,
            },
        ],
        vec![
            FaceDef { name: "plain".into(), price_multiplier: 1.0 },
            FaceDef { name: "grumpy".into(), price_multiplier: 1.5 },
        ],
        vec![TrapDef { name: "bread".into(), feed_amount: 20 }],
    )
    .unwrap()
}
