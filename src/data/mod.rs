//! Read-only content: tier profiles, global modifiers, species, faces, traps

pub mod catalog;
pub mod loader;
pub mod modifiers;
pub mod profiles;

pub use catalog::{ContentTables, FaceDef, SpeciesDef, TrapDef};
pub use loader::{default_content_path, load_content, parse_content};
pub use modifiers::{ObesityRule, StressEatModifier};
pub use profiles::{BehaviorProfileTable, RarityTierProfile};
