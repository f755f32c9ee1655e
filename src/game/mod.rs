//! Game core: snapshot, registry, state changers and the session loop.

pub mod attack;
pub mod changer;
pub mod combat;
pub mod config;
pub mod error;
pub mod moves;
pub mod session;
pub mod shuffle;
pub mod state;

pub use attack::{Attack, AttackProps};
pub use changer::{StateChange, StateChanger};
pub use combat::{resolve_combat, CombatOutcome};
pub use config::{CardConfig, GameConfig, PileConfig};
pub use error::{EngineError, EngineResult, LookupKind};
pub use moves::{Move, MoveProps, MoveSubject};
pub use session::GameSession;
pub use shuffle::Shuffle;
pub use state::{
    GameState,
    IntegrityError,
    Phase,
    PileState,
    Player,
    TableauState,
    Winner,
};
