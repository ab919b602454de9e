//! Global modifiers layered on top of tier profiles

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{ForageError, Result};

/// How obesity feeds into bite power, eat interval and price
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObesityRule {
    /// When true a pigeon bites for exactly its obesity
    pub bite_power_equals_obesity: bool,
    /// Eat interval multiplier per obesity value, missing entries mean 1.0
    pub eat_interval_multiplier_by_obesity: AHashMap<i32, f32>,
    /// Fractional price discount per obesity value, missing entries mean 0.0
    pub obesity_price_discount: AHashMap<i32, f32>,
}

impl ObesityRule {
    pub fn eat_interval_multiplier(&self, obesity: i32) -> f32 {
        self.eat_interval_multiplier_by_obesity
            .get(&obesity)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn price_discount(&self, obesity: i32) -> f32 {
        self.obesity_price_discount
            .get(&obesity)
            .copied()
            .unwrap_or(0.0)
    }
}

/// How stress states change eating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressEatModifier {
    pub enabled: bool,
    /// Applied to eat chance while Cautious
    pub warn_eat_chance_multiplier: f32,
    /// Applied to eat interval while Cautious
    pub warn_eat_interval_multiplier: f32,
    /// BackOff pigeons cannot eat at all
    pub backoff_stops_eating: bool,
}

impl Default for StressEatModifier {
    fn default() -> Self {
        Self {
            enabled: false,
            warn_eat_chance_multiplier: 1.0,
            warn_eat_interval_multiplier: 1.0,
            backoff_stops_eating: false,
        }
    }
}

impl StressEatModifier {
    /// Interval multiplier must be > 0, chance multiplier >= 0
    pub fn validate(&self) -> Result<()> {
        if !(self.warn_eat_interval_multiplier > 0.0) {
            return Err(ForageError::InvalidContent(format!(
                "warn eat interval multiplier must be > 0, got {}",
                self.warn_eat_interval_multiplier
            )));
        }
        if !(self.warn_eat_chance_multiplier >= 0.0) {
            return Err(ForageError::InvalidContent(format!(
                "warn eat chance multiplier must be >= 0, got {}",
                self.warn_eat_chance_multiplier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_obesity_entries_are_neutral() {
        let rule = ObesityRule::default();
        assert_eq!(rule.eat_interval_multiplier(7), 1.0);
        assert_eq!(rule.price_discount(7), 0.0);
    }

    #[test]
    fn test_obesity_entries_looked_up() {
        let mut rule = ObesityRule::default();
        rule.eat_interval_multiplier_by_obesity.insert(3, 1.5);
        rule.obesity_price_discount.insert(3, 0.2);

        assert_eq!(rule.eat_interval_multiplier(3), 1.5);
        assert_eq!(rule.price_discount(3), 0.2);
        assert_eq!(rule.eat_interval_multiplier(2), 1.0);
    }

    #[test]
    fn test_default_stress_modifier_is_inert() {
        let modifier = StressEatModifier::default();
        assert!(!modifier.enabled);
        assert!(!modifier.backoff_stops_eating);
    }

    #[test]
    fn test_stress_modifier_validation() {
        assert!(StressEatModifier::default().validate().is_ok());

        let zero_interval = StressEatModifier {
            warn_eat_interval_multiplier: 0.0,
            ..StressEatModifier::default()
        };
        assert!(zero_interval.validate().is_err());

        let nan_chance = StressEatModifier {
            warn_eat_chance_multiplier: f32::NAN,
            ..StressEatModifier::default()
        };
        assert!(nan_chance.validate().is_err());

        let negative_chance = StressEatModifier {
            warn_eat_chance_multiplier: -0.5,
            ..StressEatModifier::default()
        };
        assert!(negative_chance.validate().is_err());

        let blocked_chance = StressEatModifier {
            warn_eat_chance_multiplier: 0.0,
            ..StressEatModifier::default()
        };
        assert!(blocked_chance.validate().is_ok());
    }
}
