use serde::{Deserialize, Serialize};

use crate::log;
use crate::rules::RuleContext;

use super::changer::StateChanger;
use super::combat::{resolve_combat, CombatOutcome};
use super::config::GameConfig;
use super::error::{EngineError, EngineResult};
use super::state::{GameState, Player, Winner};

/// Attack request as it arrives from the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttackProps {
    pub from: String,
    pub to: String,
    pub attacking_card: String,
    pub defending_card: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_rules: Option<Vec<String>>,
}

/// One card attacking another across two piles.
#[derive(Debug, Clone)]
pub struct Attack<'a> {
    from: String,
    to: String,
    attacking_card: String,
    defending_card: String,
    manual: bool,
    config: &'a GameConfig,
    incoming_rules: Vec<String>,
}

impl<'a> Attack<'a> {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        attacking_card: impl Into<String>,
        defending_card: impl Into<String>,
        manual: bool,
        config: &'a GameConfig,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            attacking_card: attacking_card.into(),
            defending_card: defending_card.into(),
            manual,
            config,
            incoming_rules: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.incoming_rules = rules;
        self
    }

    pub fn from_props(props: &AttackProps, manual: bool, config: &'a GameConfig) -> Self {
        Self::new(
            props.from.clone(),
            props.to.clone(),
            props.attacking_card.clone(),
            props.defending_card.clone(),
            manual,
            config,
        )
    }

    fn check_rules(&self, state: &GameState) -> EngineResult<()> {
        if !self.manual || self.incoming_rules.is_empty() {
            return Ok(());
        }
        let ctx = RuleContext::for_attack(
            state,
            self.config,
            &self.from,
            &self.to,
            &self.attacking_card,
            &self.defending_card,
        )?;
        if ctx.check_all(self.incoming_rules.as_slice())? {
            Ok(())
        } else {
            Err(EngineError::invalid(format!(
                "attack {} -> {} rejected by incoming rules",
                self.from, self.to
            )))
        }
    }

    fn bury(state: &mut GameState, pile: &str, card: &str, owner: Player) -> EngineResult<()> {
        let card = state
            .get_pile_state_mut(pile)?
            .take_card(card)
            .ok_or_else(|| EngineError::card_not_found(card))?;
        state
            .get_pile_state_mut(owner.cemetery_pile())?
            .cards
            .push(card);
        Ok(())
    }
}

impl StateChanger for Attack<'_> {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn validate(&self, state: &GameState) -> EngineResult<()> {
        let owner = state.get_pile_owner(&self.from)?;
        if owner != state.get_turn_player() {
            return Err(EngineError::invalid(format!(
                "pile {} belongs to {owner}, not the turn player",
                self.from
            )));
        }

        let from_pile = state.get_pile_state(&self.from)?;
        if from_pile.has_acted {
            return Err(EngineError::invalid(format!(
                "pile {} has already attacked this turn",
                self.from
            )));
        }
        let to_pile = state.get_pile_state(&self.to)?;

        if self.attacking_card.is_empty() || self.defending_card.is_empty() {
            return Err(EngineError::invalid("there is no attacker or defender"));
        }
        if !from_pile.contains(&self.attacking_card) {
            return Err(EngineError::invalid(format!(
                "pile {} does not have card {}",
                self.from, self.attacking_card
            )));
        }
        if !to_pile.contains(&self.defending_card) {
            return Err(EngineError::invalid(format!(
                "pile {} does not have card {}",
                self.to, self.defending_card
            )));
        }

        self.check_rules(state)
    }

    fn make(&self, state: &GameState) -> EngineResult<GameState> {
        let mut next = state.clone();
        let owner = next.get_pile_owner(&self.from)?;
        let opponent = owner.opponent();

        // Resolve every lookup before health is touched.
        for pile in [
            self.from.as_str(),
            self.to.as_str(),
            owner.cemetery_pile(),
            opponent.cemetery_pile(),
        ] {
            next.get_pile_state(pile)?;
        }
        for (pile, card) in [
            (&self.from, &self.attacking_card),
            (&self.to, &self.defending_card),
        ] {
            if !next.get_pile_state(pile)?.contains(card) {
                return Err(EngineError::invalid(format!(
                    "pile {pile} does not have card {card}"
                )));
            }
        }
        let attacker = self.config.card(&self.attacking_card)?;
        let defender = self.config.card(&self.defending_card)?;

        let outcome = resolve_combat(attacker, defender);
        log::debug(
            self.name(),
            &format!(
                "{} ({}) vs {} ({}) -> {:?}",
                attacker.id,
                attacker.health(),
                defender.id,
                defender.health(),
                outcome
            ),
        );

        if outcome.attacker_died() {
            Self::bury(&mut next, &self.from, &self.attacking_card, owner)?;
        }
        if outcome.defender_died() {
            Self::bury(&mut next, &self.to, &self.defending_card, opponent)?;
        }

        let attacker_warlord = self.from == owner.warlord_pile();
        let defender_warlord = self.to == opponent.warlord_pile();
        match outcome {
            CombatOutcome::BothDied if attacker_warlord && defender_warlord => {
                next.declare_winner(Winner::Draw)
            }
            CombatOutcome::AttackerDied if attacker_warlord => {
                next.declare_winner(opponent.into())
            }
            CombatOutcome::DefenderDied if defender_warlord => next.declare_winner(owner.into()),
            _ => {}
        }

        next.get_pile_state_mut(&self.from)?.has_acted = true;
        Ok(next)
    }
}
