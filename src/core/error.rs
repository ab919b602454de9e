use thiserror::Error;

use crate::core::types::{FaceId, SpeciesId, Tier};

/// Configuration and load-time failures
///
/// Everything here is fatal for content loading: a table that fails to
/// resolve must never be replaced by silent defaults.
#[derive(Error, Debug)]
pub enum ForageError {
    #[error("Unknown species: {0:?}")]
    UnknownSpecies(SpeciesId),

    #[error("Unknown face: {0:?}")]
    UnknownFace(FaceId),

    #[error("Unknown rarity tier: {0:?}")]
    UnknownTier(Tier),

    #[error("Unknown content name: {0}")]
    UnknownName(String),

    #[error("Invalid behavior profile for tier {tier}: {reason}")]
    InvalidProfile { tier: u8, reason: String },

    #[error("Trap '{trap}' has non-positive feed amount {amount}")]
    InvalidFeedAmount { trap: String, amount: i32 },

    #[error("Species '{species}' has invalid obesity range {min}..={max}")]
    InvalidObesityRange { species: String, min: i32, max: i32 },

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ForageError>;

/// Report a programming error such as touching a despawned agent
///
/// Debug builds fail fast. Release builds log and let the caller no-op so the
/// simulation loop keeps running.
#[track_caller]
pub fn invariant_violation(what: std::fmt::Arguments<'_>) {
    debug_assert!(false, "invariant violation: {}", what);
    tracing::warn!("invariant violation: {}", what);
}
