//! Combat arithmetic.
//!
//! Damage is simultaneous: both cards strike with the attack value they had
//! before the exchange. Health is never clamped and is written straight back
//! to the card records, so it accumulates over a card's whole life.

use serde::{Deserialize, Serialize};

use super::config::CardConfig;
use super::error::EngineError;

/// Who died in an exchange. The numeric codes are stable and shared with the
/// JavaScript side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CombatOutcome {
    NoneDied,
    BothDied,
    AttackerDied,
    DefenderDied,
}

impl CombatOutcome {
    pub const fn code(self) -> i8 {
        match self {
            CombatOutcome::NoneDied => -1,
            CombatOutcome::BothDied => 0,
            CombatOutcome::AttackerDied => 1,
            CombatOutcome::DefenderDied => 2,
        }
    }

    pub const fn attacker_died(self) -> bool {
        matches!(self, CombatOutcome::BothDied | CombatOutcome::AttackerDied)
    }

    pub const fn defender_died(self) -> bool {
        matches!(self, CombatOutcome::BothDied | CombatOutcome::DefenderDied)
    }
}

impl TryFrom<i8> for CombatOutcome {
    type Error = EngineError;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(CombatOutcome::NoneDied),
            0 => Ok(CombatOutcome::BothDied),
            1 => Ok(CombatOutcome::AttackerDied),
            2 => Ok(CombatOutcome::DefenderDied),
            code => Err(EngineError::UnresolvedOutcome { code }),
        }
    }
}

/// Classifies an exchange from post-damage health values.
pub fn classify(attacker_health: i32, defender_health: i32) -> CombatOutcome {
    match (attacker_health > 0, defender_health > 0) {
        (true, true) => CombatOutcome::NoneDied,
        (false, false) => CombatOutcome::BothDied,
        (false, true) => CombatOutcome::AttackerDied,
        (true, false) => CombatOutcome::DefenderDied,
    }
}

/// Applies one exchange of blows and reports who died.
pub fn resolve_combat(attacker: &CardConfig, defender: &CardConfig) -> CombatOutcome {
    let attacker_health = attacker.health().saturating_sub(defender.attack_value);
    let defender_health = defender.health().saturating_sub(attacker.attack_value);
    attacker.set_health(attacker_health);
    defender.set_health(defender_health);
    classify(attacker_health, defender_health)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defender_dies_and_attacker_survives() {
        let attacker = CardConfig::new("a", "Attacker", 3, 5);
        let defender = CardConfig::new("d", "Defender", 4, 2);

        let outcome = resolve_combat(&attacker, &defender);

        assert_eq!(outcome, CombatOutcome::DefenderDied);
        assert_eq!(outcome.code(), 2);
        assert_eq!(attacker.health(), 1);
        assert_eq!(defender.health(), -1);
    }

    #[test]
    fn equal_cards_destroy_each_other() {
        let attacker = CardConfig::new("a", "Attacker", 5, 4);
        let defender = CardConfig::new("d", "Defender", 5, 4);

        let outcome = resolve_combat(&attacker, &defender);

        assert_eq!(outcome, CombatOutcome::BothDied);
        assert_eq!(attacker.health(), -1);
        assert_eq!(defender.health(), -1);
    }

    #[test]
    fn damage_accumulates_across_exchanges() {
        let attacker = CardConfig::new("a", "Attacker", 1, 10);
        let defender = CardConfig::new("d", "Defender", 2, 3);

        assert_eq!(resolve_combat(&attacker, &defender), CombatOutcome::NoneDied);
        assert_eq!(resolve_combat(&attacker, &defender), CombatOutcome::NoneDied);
        assert_eq!(resolve_combat(&attacker, &defender), CombatOutcome::DefenderDied);
        assert_eq!(attacker.health(), 4);
        assert_eq!(defender.health(), 0);
    }

    #[test]
    fn attacker_can_die_alone() {
        let attacker = CardConfig::new("a", "Attacker", 1, 2);
        let defender = CardConfig::new("d", "Defender", 6, 9);
        assert_eq!(resolve_combat(&attacker, &defender), CombatOutcome::AttackerDied);
        assert!(attacker.is_dead());
    }

    #[test]
    fn extreme_stats_saturate() {
        let attacker = CardConfig::new("a", "Attacker", i32::MAX, 5);
        let defender = CardConfig::new("d", "Defender", 1, -5);

        assert_eq!(resolve_combat(&attacker, &defender), CombatOutcome::DefenderDied);
        assert_eq!(attacker.health(), 4);
        assert_eq!(defender.health(), i32::MIN);

        // health keeps falling but stays pinned at the floor
        assert_eq!(resolve_combat(&attacker, &defender), CombatOutcome::DefenderDied);
        assert_eq!(attacker.health(), 3);
        assert_eq!(defender.health(), i32::MIN);
    }

    #[test]
    fn unknown_codes_are_unresolved() {
        assert_eq!(CombatOutcome::try_from(1), Ok(CombatOutcome::AttackerDied));
        assert_eq!(
            CombatOutcome::try_from(7),
            Err(EngineError::UnresolvedOutcome { code: 7 })
        );
    }
}
