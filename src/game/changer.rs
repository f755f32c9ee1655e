use crate::log;

use super::attack::Attack;
use super::error::EngineResult;
use super::moves::Move;
use super::shuffle::Shuffle;
use super::state::GameState;

/// A state-changing operation.
///
/// Callers check [`is_valid`](StateChanger::is_valid) first and only then
/// call [`make`](StateChanger::make) to obtain the next snapshot. `make`
/// never touches its input; it returns a fresh snapshot.
pub trait StateChanger {
    /// Short operation name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Checks the operation against `state` and reports why it is rejected.
    /// Must not mutate the snapshot or any card record.
    fn validate(&self, state: &GameState) -> EngineResult<()>;

    /// Applies the operation. Assumes `validate` succeeded on `state`.
    fn make(&self, state: &GameState) -> EngineResult<GameState>;

    fn is_valid(&self, state: &GameState) -> bool {
        match self.validate(state) {
            Ok(()) => true,
            Err(error) => {
                log::debug(self.name(), &error.to_string());
                false
            }
        }
    }
}

/// Any of the three operations, for callers that queue them uniformly.
#[derive(Debug, Clone)]
pub enum StateChange<'a> {
    Shuffle(Shuffle),
    Move(Move<'a>),
    Attack(Attack<'a>),
}

impl StateChanger for StateChange<'_> {
    fn name(&self) -> &'static str {
        match self {
            StateChange::Shuffle(op) => op.name(),
            StateChange::Move(op) => op.name(),
            StateChange::Attack(op) => op.name(),
        }
    }

    fn validate(&self, state: &GameState) -> EngineResult<()> {
        match self {
            StateChange::Shuffle(op) => op.validate(state),
            StateChange::Move(op) => op.validate(state),
            StateChange::Attack(op) => op.validate(state),
        }
    }

    fn make(&self, state: &GameState) -> EngineResult<GameState> {
        match self {
            StateChange::Shuffle(op) => op.make(state),
            StateChange::Move(op) => op.make(state),
            StateChange::Attack(op) => op.make(state),
        }
    }
}

impl From<Shuffle> for StateChange<'_> {
    fn from(op: Shuffle) -> Self {
        StateChange::Shuffle(op)
    }
}

impl<'a> From<Move<'a>> for StateChange<'a> {
    fn from(op: Move<'a>) -> Self {
        StateChange::Move(op)
    }
}

impl<'a> From<Attack<'a>> for StateChange<'a> {
    fn from(op: Attack<'a>) -> Self {
        StateChange::Attack(op)
    }
}
