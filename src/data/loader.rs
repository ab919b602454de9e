//! Load content tables from TOML
//!
//! The on-disk layout keeps obesity maps as arrays of tables because TOML
//! keys are always strings:
//!
//! ```toml
//! [obesity]
//! bite_power_equals_obesity = true
//! eat_interval_multipliers = [{ obesity = 3, multiplier = 1.25 }]
//! price_discounts = [{ obesity = 3, discount = 0.1 }]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::error::{ForageError, Result};
use crate::data::catalog::{ContentTables, FaceDef, SpeciesDef, TrapDef};
use crate::data::modifiers::{ObesityRule, StressEatModifier};
use crate::data::profiles::{BehaviorProfileTable, RarityTierProfile};

#[derive(Debug, Deserialize)]
struct ContentFile {
    tiers: Vec<RarityTierProfile>,
    #[serde(default)]
    obesity: ObesityFile,
    #[serde(default)]
    stress: StressEatModifier,
    #[serde(default)]
    species: Vec<SpeciesDef>,
    #[serde(default)]
    faces: Vec<FaceDef>,
    #[serde(default)]
    traps: Vec<TrapDef>,
}

#[derive(Debug, Default, Deserialize)]
struct ObesityFile {
    #[serde(default)]
    bite_power_equals_obesity: bool,
    #[serde(default)]
    eat_interval_multipliers: Vec<IntervalEntry>,
    #[serde(default)]
    price_discounts: Vec<DiscountEntry>,
}

#[derive(Debug, Deserialize)]
struct IntervalEntry {
    obesity: i32,
    multiplier: f32,
}

#[derive(Debug, Deserialize)]
struct DiscountEntry {
    obesity: i32,
    discount: f32,
}

impl ObesityFile {
    fn into_rule(self) -> Result<ObesityRule> {
        let mut rule = ObesityRule {
            bite_power_equals_obesity: self.bite_power_equals_obesity,
            ..ObesityRule::default()
        };

        for entry in self.eat_interval_multipliers {
            if !(entry.multiplier > 0.0) {
                return Err(ForageError::InvalidContent(format!(
                    "eat interval multiplier for obesity {} must be > 0",
                    entry.obesity
                )));
            }
            if rule
                .eat_interval_multiplier_by_obesity
                .insert(entry.obesity, entry.multiplier)
                .is_some()
            {
                return Err(ForageError::InvalidContent(format!(
                    "duplicate eat interval multiplier for obesity {}",
                    entry.obesity
                )));
            }
        }

        for entry in self.price_discounts {
            if !(0.0..=1.0).contains(&entry.discount) {
                return Err(ForageError::InvalidContent(format!(
                    "price discount for obesity {} must be in 0..=1",
                    entry.obesity
                )));
            }
            if rule
                .obesity_price_discount
                .insert(entry.obesity, entry.discount)
                .is_some()
            {
                return Err(ForageError::InvalidContent(format!(
                    "duplicate price discount for obesity {}",
                    entry.obesity
                )));
            }
        }

        Ok(rule)
    }
}

/// Parse and validate content tables from a TOML string
pub fn parse_content(content: &str) -> Result<ContentTables> {
    let file: ContentFile = toml::from_str(content)?;

    let profiles = BehaviorProfileTable::new(file.tiers)?;
    let obesity = file.obesity.into_rule()?;
    file.stress.validate()?;

    ContentTables::new(
        profiles,
        obesity,
        file.stress,
        file.species,
        file.faces,
        file.traps,
    )
}

/// Load content tables from a TOML file
pub fn load_content(path: &Path) -> Result<ContentTables> {
    let content = fs::read_to_string(path)?;
    let tables = parse_content(&content)?;

    tracing::info!(
        "Loaded content from {:?}: {} tiers, {} species, {} faces, {} traps",
        path,
        tables.profiles.len(),
        tables.species_ids().count(),
        tables.face_ids().count(),
        tables.trap_defs().len()
    );

    Ok(tables)
}

/// Path of the bundled default content file
pub fn default_content_path() -> PathBuf {
    PathBuf::from("data/content.toml")
}
