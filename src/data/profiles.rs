//! Tier-indexed behavior profiles
//!
//! A profile is the shared baseline for every pigeon of one rarity tier:
//! how often it tries to eat, how jumpy it is, and where its alert
//! thresholds sit. Profiles are immutable once loaded.

use serde::{Deserialize, Serialize};

use crate::core::error::{ForageError, Result};
use crate::core::types::Tier;

/// Behavior baseline for one rarity tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityTierProfile {
    /// Seconds between eat attempts
    pub eat_interval: f32,
    /// Probability an eat attempt succeeds (0.0 - 1.0)
    pub eat_chance: f32,

    /// Player closer than this raises alert
    pub personal_space_radius: f32,
    pub player_alert_per_sec: f32,
    pub crowd_alert_per_neighbor_per_sec: f32,
    pub alert_decay_per_sec: f32,

    pub warn_threshold: f32,
    pub backoff_threshold: f32,
    pub flee_threshold: f32,

    /// Seconds a pigeon holds BackOff before re-evaluating
    pub backoff_duration: f32,
    /// Retreat distance issued on entering BackOff
    pub backoff_distance: f32,

    pub crowd_weight: f32,
    pub player_weight: f32,

    /// Price before face and obesity adjustments
    pub base_price: i32,
}

impl RarityTierProfile {
    /// Check the load-time invariants for this profile
    pub fn validate(&self, tier: Tier) -> Result<()> {
        let fail = |reason: String| ForageError::InvalidProfile { tier: tier.0, reason };

        if !(self.warn_threshold < self.backoff_threshold
            && self.backoff_threshold < self.flee_threshold)
        {
            return Err(fail(format!(
                "thresholds must be strictly increasing (warn {} < backoff {} < flee {})",
                self.warn_threshold, self.backoff_threshold, self.flee_threshold
            )));
        }

        let rates = [
            ("personal_space_radius", self.personal_space_radius),
            ("player_alert_per_sec", self.player_alert_per_sec),
            ("crowd_alert_per_neighbor_per_sec", self.crowd_alert_per_neighbor_per_sec),
            ("alert_decay_per_sec", self.alert_decay_per_sec),
            ("backoff_duration", self.backoff_duration),
            ("backoff_distance", self.backoff_distance),
            ("crowd_weight", self.crowd_weight),
            ("player_weight", self.player_weight),
        ];
        for (name, value) in rates {
            if !(value >= 0.0) {
                return Err(fail(format!("{} must be >= 0, got {}", name, value)));
            }
        }

        if !(self.eat_interval > 0.0) {
            return Err(fail(format!("eat_interval must be > 0, got {}", self.eat_interval)));
        }

        if !(0.0..=1.0).contains(&self.eat_chance) {
            return Err(fail(format!("eat_chance must be in 0..=1, got {}", self.eat_chance)));
        }

        if self.base_price < 0 {
            return Err(fail(format!("base_price must be >= 0, got {}", self.base_price)));
        }

        Ok(())
    }
}

/// Dense table of profiles, tier `n` stored at index `n - 1`
#[derive(Debug, Clone, Default)]
pub struct BehaviorProfileTable {
    tiers: Vec<RarityTierProfile>,
}

impl BehaviorProfileTable {
    /// Build a table from profiles ordered by tier, validating each
    pub fn new(tiers: Vec<RarityTierProfile>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(ForageError::InvalidContent(
                "behavior profile table has no tiers".into(),
            ));
        }
        if tiers.len() > u8::MAX as usize {
            return Err(ForageError::InvalidContent(format!(
                "behavior profile table has {} tiers, at most {} are supported",
                tiers.len(),
                u8::MAX
            )));
        }
        for (idx, profile) in tiers.iter().enumerate() {
            profile.validate(Tier(idx as u8 + 1))?;
        }
        Ok(Self { tiers })
    }

    /// Profile for a tier, `None` when the tier is not in the table
    pub fn get(&self, tier: Tier) -> Option<&RarityTierProfile> {
        tier.index().and_then(|idx| self.tiers.get(idx))
    }

    /// Profile for a tier, or a configuration error
    pub fn require(&self, tier: Tier) -> Result<&RarityTierProfile> {
        self.get(tier).ok_or(ForageError::UnknownTier(tier))
    }

    /// Number of tiers (the highest valid tier)
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &RarityTierProfile)> {
        self.tiers
            .iter()
            .enumerate()
            .map(|(idx, profile)| (Tier(idx as u8 + 1), profile))
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> RarityTierProfile {
    RarityTierProfile {
        eat_interval: 2.0,
        eat_chance: 1.0,
        personal_space_radius: 3.0,
        player_alert_per_sec: 10.0,
        crowd_alert_per_neighbor_per_sec: 2.0,
        alert_decay_per_sec: 0.0,
        warn_threshold: 30.0,
        backoff_threshold: 60.0,
        flee_threshold: 100.0,
        backoff_duration: 2.0,
        backoff_distance: 1.5,
        crowd_weight: 1.0,
        player_weight: 1.0,
        base_price: 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_profile_is_valid() {
        assert!(sample_profile().validate(Tier(1)).is_ok());
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let mut profile = sample_profile();
        profile.backoff_threshold = profile.flee_threshold;
        let err = profile.validate(Tier(2)).unwrap_err();
        assert!(matches!(err, ForageError::InvalidProfile { tier: 2, .. }));
    }

    #[test]
    fn test_tier_count_fits_tier_ids() {
        let full = vec![sample_profile(); u8::MAX as usize];
        let table = BehaviorProfileTable::new(full).unwrap();
        assert_eq!(table.iter().last().map(|(tier, _)| tier), Some(Tier(u8::MAX)));

        let overfull = vec![sample_profile(); u8::MAX as usize + 1];
        assert!(matches!(
            BehaviorProfileTable::new(overfull),
            Err(ForageError::InvalidContent(_))
        ));
    }

    #[test]
    fn test_rejects_negative_rate() {
        let mut profile = sample_profile();
        profile.alert_decay_per_sec = -1.0;
        assert!(profile.validate(Tier(1)).is_err());
    }

    #[test]
    fn test_rejects_nan_rate() {
        let mut profile = sample_profile();
        profile.player_weight = f32::NAN;
        assert!(profile.validate(Tier(1)).is_err());
    }

    #[test]
    fn test_table_lookup_is_one_based() {
        let mut rare = sample_profile();
        rare.base_price = 500;
        let table = BehaviorProfileTable::new(vec![sample_profile(), rare]).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(Tier(1)).unwrap().base_price, 100);
        assert_eq!(table.get(Tier(2)).unwrap().base_price, 500);
        assert!(table.get(Tier(0)).is_none());
        assert!(table.get(Tier(3)).is_none());
        assert!(matches!(table.require(Tier(3)), Err(ForageError::UnknownTier(Tier(3)))));
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(BehaviorProfileTable::new(Vec::new()).is_err());
    }
}
