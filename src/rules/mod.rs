//! Rule expressions attached to pile edges.
//!
//! Rules are small JavaScript-flavoured boolean expressions kept as strings in
//! the pile registry, for example
//!
//! ```text
//! getStatePhase() === 'MainPhase' && toPile.cards.length < 1
//! ```
//!
//! They are tokenized, parsed into an [`Expr`] tree and interpreted against a
//! [`RuleContext`] built from the current snapshot and the pending operation.

pub mod context;
pub mod eval;
pub mod lexer;
pub mod parser;

use thiserror::Error;

pub use context::RuleContext;
pub use eval::{evaluate, Scope};
pub use parser::{parse, Expr};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {offset}: {message}")]
pub struct RuleSyntaxError {
    pub offset: usize,
    pub message: String,
}

impl RuleSyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}
