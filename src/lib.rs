pub mod game;
pub mod log;
pub mod rules;

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use game::{
    resolve_combat, Attack, AttackProps, CardConfig, CombatOutcome, EngineError, EngineResult,
    GameConfig, GameSession, GameState, IntegrityError, Move, MoveProps, MoveSubject, Phase,
    PileConfig, PileState, Player, Shuffle, StateChange, StateChanger, TableauState, Winner,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Milliseconds the deck animation runs before the shuffle is committed.
const DEFAULT_SHUFFLE_DELAY_MS: u32 = 1000;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: EngineError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn state_to_json(state: &GameState) -> Result<String, JsValue> {
    serde_json::to_string(state).map_err(serde_to_js_error)
}

#[wasm_bindgen]
pub struct GameEngine {
    session: Rc<RefCell<GameSession>>,
}

#[wasm_bindgen]
impl GameEngine {
    /// Starts a session from the registry and bootstrap snapshot. Either one
    /// falls back to the built-in sample table when omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: Option<String>,
        initial_state_json: Option<String>,
    ) -> Result<GameEngine, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(to_js_error)?,
            None => GameConfig::sample(),
        };
        let state = match initial_state_json {
            Some(json) => GameState::from_json(&json).map_err(to_js_error)?,
            None => GameState::sample(),
        };
        let session = GameSession::new(config, state).map_err(to_js_error)?;
        Ok(GameEngine {
            session: Rc::new(RefCell::new(session)),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        state_to_json(self.session.borrow().state())
    }

    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.borrow().config()).map_err(serde_to_js_error)
    }

    pub fn make_move_json(&self, props_json: &str) -> Result<bool, JsValue> {
        let props: MoveProps = serde_json::from_str(props_json).map_err(serde_to_js_error)?;
        self.session.borrow_mut().make_move(&props).map_err(to_js_error)
    }

    pub fn make_attack_json(&self, props_json: &str) -> Result<bool, JsValue> {
        let props: AttackProps = serde_json::from_str(props_json).map_err(serde_to_js_error)?;
        self.session.borrow_mut().make_attack(&props).map_err(to_js_error)
    }

    pub fn is_move_valid_json(&self, props_json: &str) -> Result<bool, JsValue> {
        let props: MoveProps = serde_json::from_str(props_json).map_err(serde_to_js_error)?;
        Ok(self.session.borrow().is_move_valid(&props))
    }

    pub fn is_attack_valid_json(&self, props_json: &str) -> Result<bool, JsValue> {
        let props: AttackProps = serde_json::from_str(props_json).map_err(serde_to_js_error)?;
        Ok(self.session.borrow().is_attack_valid(&props))
    }

    /// Returns the new phase name.
    pub fn change_phase(&self) -> String {
        self.session.borrow_mut().change_phase().as_str().to_string()
    }

    /// Returns the player now on turn.
    pub fn change_turn(&self) -> String {
        self.session.borrow_mut().change_turn().to_string()
    }

    pub fn toggle_invalid_moves(&self) -> bool {
        self.session.borrow_mut().toggle_invalid_moves()
    }

    pub fn clear_validity_feedback(&self) {
        self.session.borrow_mut().clear_validity_feedback();
    }

    pub fn restart(&self) {
        self.session.borrow_mut().restart();
    }

    pub fn deal_initial_moves(&self) -> Result<usize, JsValue> {
        self.session
            .borrow_mut()
            .deal_initial_moves()
            .map_err(to_js_error)
    }

    pub fn warlord_health(&self, player1: bool) -> Option<i32> {
        let player = if player1 { Player::One } else { Player::Two };
        self.session.borrow().warlord_health(player)
    }

    /// Flags the start-shuffled piles right away and commits the permutation
    /// once `delay_ms` has passed. Resolves with the committed state as JSON.
    pub fn shuffle_initial(&self, delay_ms: Option<u32>) -> Result<Promise, JsValue> {
        let piles = self
            .session
            .borrow_mut()
            .begin_initial_shuffle()
            .map_err(to_js_error)?;
        let session = Rc::clone(&self.session);
        let delay = delay_ms.unwrap_or(DEFAULT_SHUFFLE_DELAY_MS);

        Ok(future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            session
                .borrow_mut()
                .finish_shuffle(&piles)
                .map_err(to_js_error)?;
            let json = state_to_json(session.borrow().state())?;
            Ok(JsValue::from_str(&json))
        }))
    }
}

/// Returns the built-in sample table, handy for UI debugging.
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::sample()).map_err(JsValue::from)
}

/// Deep-copies a snapshot.
#[wasm_bindgen(js_name = "cloneGameState")]
pub fn clone_game_state(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let cloned = state.clone();
    to_value(&cloned).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(EngineError::from(error)))?;
    Ok(())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
