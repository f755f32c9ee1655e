use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::game::{EngineError, EngineResult, GameConfig, GameState, MoveSubject};

use super::eval::{evaluate, Scope};
use super::parser::parse;

fn to_value<T: Serialize>(value: &T) -> EngineResult<Value> {
    serde_json::to_value(value).map_err(EngineError::from)
}

fn expect_id<'v>(name: &str, args: &'v [Value]) -> EngineResult<&'v str> {
    match args.first() {
        Some(Value::String(id)) => Ok(id),
        Some(other) => Err(EngineError::invalid(format!(
            "{name} expects an id, got {other}"
        ))),
        None => Err(EngineError::invalid(format!("{name} expects an id"))),
    }
}

/// Bindings a rule is evaluated against.
///
/// Every value handed to a rule is a JSON copy of the snapshot or registry
/// entry it came from, so rules cannot reach back into engine state.
pub struct RuleContext<'a> {
    state: &'a GameState,
    config: &'a GameConfig,
    bindings: BTreeMap<&'static str, Value>,
}

impl<'a> RuleContext<'a> {
    fn new(state: &'a GameState, config: &'a GameConfig) -> Self {
        Self {
            state,
            config,
            bindings: BTreeMap::new(),
        }
    }

    fn state_pile(&self, pile_id: &str) -> EngineResult<Value> {
        match self.state.piles.get(pile_id) {
            Some(pile) => to_value(pile),
            None => Ok(Value::Null),
        }
    }

    /// Bindings for a pending move: `card`, `move`, `fromPile`, `toPile`.
    pub fn for_move(
        state: &'a GameState,
        config: &'a GameConfig,
        from: &str,
        to: &str,
        subject: &MoveSubject,
    ) -> EngineResult<Self> {
        let mut ctx = Self::new(state, config);
        // Amount moves carry no card id; `card` is null rather than an empty string.
        let (card, amount) = match subject {
            MoveSubject::Card(id) => (Value::String(id.clone()), 1),
            MoveSubject::Amount(amount) => (Value::Null, *amount),
        };
        let from_pile = ctx.state_pile(from)?;
        let to_pile = ctx.state_pile(to)?;
        ctx.bindings.insert(
            "move",
            json!({ "from": from, "to": to, "amount": amount, "card": card.clone() }),
        );
        ctx.bindings.insert("card", card);
        ctx.bindings.insert("fromPile", from_pile);
        ctx.bindings.insert("toPile", to_pile);
        Ok(ctx)
    }

    /// Bindings for a pending attack: `attackingCard`, `defendingCard`, `card`,
    /// `from`, `to`, `attack`, `move`, `fromPile`, `toPile`.
    pub fn for_attack(
        state: &'a GameState,
        config: &'a GameConfig,
        from: &str,
        to: &str,
        attacking_card: &str,
        defending_card: &str,
    ) -> EngineResult<Self> {
        let mut ctx = Self::new(state, config);
        let from_pile = ctx.state_pile(from)?;
        let to_pile = ctx.state_pile(to)?;
        ctx.bindings.insert(
            "attack",
            json!({
                "from": from,
                "to": to,
                "attackingCard": attacking_card,
                "defendingCard": defending_card,
            }),
        );
        ctx.bindings.insert("move", json!({ "from": from, "to": to }));
        // Rules shared with move edges may read `card`.
        ctx.bindings.insert("card", Value::Null);
        ctx.bindings.insert("attackingCard", json!(attacking_card));
        ctx.bindings.insert("defendingCard", json!(defending_card));
        ctx.bindings.insert("from", json!(from));
        ctx.bindings.insert("to", json!(to));
        ctx.bindings.insert("fromPile", from_pile);
        ctx.bindings.insert("toPile", to_pile);
        Ok(ctx)
    }

    /// Evaluates one rule. Only a boolean `true` passes; anything else,
    /// including truthy non-booleans, fails.
    pub fn check_rule(&self, rule: &str) -> EngineResult<bool> {
        let wrap = |reason: String| EngineError::Rule {
            rule: rule.to_string(),
            reason,
        };
        let expr = parse(rule).map_err(|error| wrap(error.to_string()))?;
        let value = evaluate(&expr, self).map_err(|error| wrap(error.to_string()))?;
        Ok(value == Value::Bool(true))
    }

    /// Logical AND over a rule list. The first fault aborts the check.
    pub fn check_all<S: AsRef<str>>(&self, rules: &[S]) -> EngineResult<bool> {
        for rule in rules {
            if !self.check_rule(rule.as_ref())? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Scope for RuleContext<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }

    fn call(&self, name: &str, args: &[Value]) -> EngineResult<Value> {
        match name {
            "getCard" => to_value(self.config.card(expect_id(name, args)?)?),
            "getPile" => to_value(self.config.pile(expect_id(name, args)?)?),
            "getStatePile" => self.state_pile(expect_id(name, args)?),
            "getStatePhase" => Ok(json!(self.state.phase.as_str())),
            "isPlayer1Turn" => Ok(json!(self.state.player1_turn)),
            "hasDrawn" => Ok(json!(self.state.has_drawn)),
            "hasEnded" => Ok(json!(self.state.ended)),
            "getLast" => match args.first() {
                Some(Value::Array(items)) => Ok(items.last().cloned().unwrap_or(Value::Null)),
                Some(Value::String(text)) => Ok(text
                    .chars()
                    .last()
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Null)),
                _ => Err(EngineError::invalid("getLast expects a list")),
            },
            _ => Err(EngineError::invalid(format!("{name} is not a function"))),
        }
    }
}
