use serde::{Deserialize, Serialize};

use crate::rules::RuleContext;

use super::changer::StateChanger;
use super::config::GameConfig;
use super::error::{EngineError, EngineResult};
use super::state::{GameState, Phase};

/// What a move carries: one named card, or the top `n` cards of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveSubject {
    Card(String),
    Amount(usize),
}

impl MoveSubject {
    pub fn amount(&self) -> usize {
        match self {
            MoveSubject::Card(_) => 1,
            MoveSubject::Amount(amount) => *amount,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MoveSubject::Card(id) => id.is_empty(),
            MoveSubject::Amount(amount) => *amount == 0,
        }
    }
}

impl From<&str> for MoveSubject {
    fn from(card: &str) -> Self {
        MoveSubject::Card(card.to_string())
    }
}

impl From<String> for MoveSubject {
    fn from(card: String) -> Self {
        MoveSubject::Card(card)
    }
}

impl From<usize> for MoveSubject {
    fn from(amount: usize) -> Self {
        MoveSubject::Amount(amount)
    }
}

/// Move request as it arrives from the UI or the registry's initial deal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MoveProps {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_rules: Option<Vec<String>>,
}

impl MoveProps {
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: MoveSubject) -> Self {
        let (amount, card) = match subject {
            MoveSubject::Card(card) => (None, Some(card)),
            MoveSubject::Amount(amount) => (Some(amount), None),
        };
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            card,
            incoming_rules: None,
        }
    }

    /// A positive amount wins over a card id; `None` when neither is usable.
    pub fn subject(&self) -> Option<MoveSubject> {
        match (self.amount, self.card.as_deref()) {
            (Some(amount), _) if amount > 0 => Some(MoveSubject::Amount(amount)),
            (_, Some(card)) if !card.is_empty() => Some(MoveSubject::Card(card.to_string())),
            _ => None,
        }
    }
}

/// Moves one card, or a block of cards from the top, between two piles.
#[derive(Debug, Clone)]
pub struct Move<'a> {
    from: String,
    to: String,
    subject: MoveSubject,
    manual: bool,
    incoming_rules: Vec<String>,
    config: Option<&'a GameConfig>,
}

impl<'a> Move<'a> {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<MoveSubject>,
        manual: bool,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            manual,
            incoming_rules: Vec::new(),
            config: None,
        }
    }

    /// Attaches the edge's rule strings and the registry they read from.
    pub fn with_rules(mut self, rules: Vec<String>, config: &'a GameConfig) -> Self {
        self.incoming_rules = rules;
        self.config = Some(config);
        self
    }

    pub fn from_pile(&self) -> &str {
        &self.from
    }

    pub fn to_pile(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &MoveSubject {
        &self.subject
    }

    fn check_rules(&self, state: &GameState) -> EngineResult<()> {
        let Some(config) = self.config else {
            return Ok(());
        };
        if !self.manual || self.incoming_rules.is_empty() {
            return Ok(());
        }
        let ctx = RuleContext::for_move(state, config, &self.from, &self.to, &self.subject)?;
        if ctx.check_all(self.incoming_rules.as_slice())? {
            Ok(())
        } else {
            Err(EngineError::invalid(format!(
                "move {} -> {} rejected by incoming rules",
                self.from, self.to
            )))
        }
    }
}

impl StateChanger for Move<'_> {
    fn name(&self) -> &'static str {
        "move"
    }

    fn validate(&self, state: &GameState) -> EngineResult<()> {
        let from_pile = state.get_pile_state(&self.from)?;

        if self.subject.is_empty() {
            return Err(EngineError::invalid("move has no card"));
        }

        match &self.subject {
            MoveSubject::Card(card) => {
                if !from_pile.contains(card) {
                    return Err(EngineError::invalid(format!(
                        "pile {} does not have card {card}",
                        self.from
                    )));
                }
            }
            MoveSubject::Amount(amount) => {
                if from_pile.cards.len() < *amount {
                    return Err(EngineError::invalid(format!(
                        "pile {} does not have {amount} cards to move",
                        self.from
                    )));
                }
            }
        }

        self.check_rules(state)
    }

    fn make(&self, state: &GameState) -> EngineResult<GameState> {
        let mut next = state.clone();
        if self.manual && next.phase == Phase::DrawPhase && self.from != self.to {
            next.has_drawn = true;
        }

        let moved = {
            let from_pile = next.get_pile_state_mut(&self.from)?;
            match &self.subject {
                MoveSubject::Card(card) => vec![from_pile
                    .take_card(card)
                    .ok_or_else(|| EngineError::card_not_found(card.as_str()))?],
                MoveSubject::Amount(amount) => {
                    let start = from_pile.cards.len().checked_sub(*amount).ok_or_else(|| {
                        EngineError::invalid(format!("pile {} is too small", self.from))
                    })?;
                    from_pile.cards.drain(start..).collect()
                }
            }
        };

        next.get_pile_state_mut(&self.to)?.cards.extend(moved);
        Ok(next)
    }
}
