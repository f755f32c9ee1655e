use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::{EngineError, EngineResult, LookupKind};

/// One of the two seats at the table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    #[serde(rename = "Player 1")]
    One,
    #[serde(rename = "Player 2")]
    Two,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    pub const fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Player::One => "Player 1",
            Player::Two => "Player 2",
        }
    }

    pub const fn tableau_id(self) -> &'static str {
        match self {
            Player::One => "player1Tableau",
            Player::Two => "player2Tableau",
        }
    }

    pub const fn warlord_pile(self) -> &'static str {
        match self {
            Player::One => "player1Warlord",
            Player::Two => "player2Warlord",
        }
    }

    pub const fn cemetery_pile(self) -> &'static str {
        match self {
            Player::One => "player1Cemetery",
            Player::Two => "player2Cemetery",
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Winner {
    #[serde(rename = "Player 1")]
    Player1,
    #[serde(rename = "Player 2")]
    Player2,
    #[serde(rename = "DRAW")]
    Draw,
}

impl From<Player> for Winner {
    fn from(player: Player) -> Self {
        match player {
            Player::One => Winner::Player1,
            Player::Two => Winner::Player2,
        }
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Player1 => f.write_str(Player::One.as_str()),
            Winner::Player2 => f.write_str(Player::Two.as_str()),
            Winner::Draw => f.write_str("DRAW"),
        }
    }
}

/// Turn phase. Advanced by the controller, read by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    DrawPhase,
    MainPhase,
    BattlePhase,
    EndPhase,
}

impl Phase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::DrawPhase => "DrawPhase",
            Phase::MainPhase => "MainPhase",
            Phase::BattlePhase => "BattlePhase",
            Phase::EndPhase => "EndPhase",
        }
    }

    pub const fn next(self) -> Phase {
        match self {
            Phase::DrawPhase => Phase::MainPhase,
            Phase::MainPhase => Phase::BattlePhase,
            Phase::BattlePhase => Phase::EndPhase,
            Phase::EndPhase => Phase::DrawPhase,
        }
    }
}

fn default_true() -> bool {
    true
}

/// An ordered group of pile ids making up one player's half of the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TableauState {
    #[serde(default)]
    pub piles: Vec<String>,
}

impl TableauState {
    pub fn new<I, S>(piles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            piles: piles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, pile_id: &str) -> bool {
        self.piles.iter().any(|pile| pile == pile_id)
    }
}

/// Per-pile snapshot data. The last card in `cards` is the top of the pile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PileState {
    #[serde(default)]
    pub cards: Vec<String>,
    #[serde(default)]
    pub show_back: bool,
    #[serde(default)]
    pub unfolded: bool,
    #[serde(default)]
    pub is_shuffling: bool,
    #[serde(default = "default_true")]
    pub last_incoming_move_validity: bool,
    #[serde(default = "default_true")]
    pub last_incoming_attack_validity: bool,
    #[serde(default)]
    pub has_acted: bool,
}

impl PileState {
    pub fn new<I, S>(cards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cards: cards.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn position(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|card| card == card_id)
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.position(card_id).is_some()
    }

    pub fn top(&self) -> Option<&str> {
        self.cards.last().map(String::as_str)
    }

    /// Removes `card_id` wherever it sits in the pile.
    pub fn take_card(&mut self, card_id: &str) -> Option<String> {
        let idx = self.position(card_id)?;
        Some(self.cards.remove(idx))
    }
}

impl Default for PileState {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            show_back: false,
            unfolded: false,
            is_shuffling: false,
            last_incoming_move_validity: true,
            last_incoming_attack_validity: true,
            has_acted: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("tableau {tableau} references missing pile {pile}")]
    MissingPile { tableau: String, pile: String },
    #[error("card {card} appears in more than one pile")]
    DuplicateCard { card: String },
    #[error("game ended without a winner")]
    EndedWithoutWinner,
}

/// Snapshot of the whole table.
///
/// Snapshots are plain owned values: every state changer clones the input and
/// returns a fresh snapshot, so older snapshots are never aliased.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default)]
    pub tableaux: BTreeMap<String, TableauState>,
    #[serde(default)]
    pub piles: BTreeMap<String, PileState>,
    #[serde(default)]
    pub allow_invalid_moves: bool,
    #[serde(default = "default_true")]
    pub player1_turn: bool,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub has_drawn: bool,
    #[serde(default)]
    pub ended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

impl GameState {
    pub fn new(
        tableaux: BTreeMap<String, TableauState>,
        piles: BTreeMap<String, PileState>,
    ) -> Self {
        Self {
            tableaux,
            piles,
            ..Self::default()
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_turn(mut self, player: Player) -> Self {
        self.player1_turn = player == Player::One;
        self
    }

    /// Parses a persisted snapshot and checks its invariants.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let state: GameState = serde_json::from_str(json)?;
        state.integrity_check()?;
        Ok(state)
    }

    pub fn get_pile_state(&self, pile_id: &str) -> EngineResult<&PileState> {
        self.piles
            .get(pile_id)
            .ok_or_else(|| EngineError::pile_not_found(pile_id))
    }

    pub fn get_pile_state_mut(&mut self, pile_id: &str) -> EngineResult<&mut PileState> {
        self.piles
            .get_mut(pile_id)
            .ok_or_else(|| EngineError::pile_not_found(pile_id))
    }

    /// Finds the player whose tableau lists `pile_id`.
    pub fn get_pile_owner(&self, pile_id: &str) -> EngineResult<Player> {
        Player::ALL
            .into_iter()
            .find(|player| {
                self.tableaux
                    .get(player.tableau_id())
                    .is_some_and(|tableau| tableau.contains(pile_id))
            })
            .ok_or_else(|| EngineError::pile_not_found(pile_id))
    }

    pub fn get_tableau(&self, tableau_id: &str) -> EngineResult<&TableauState> {
        self.tableaux.get(tableau_id).ok_or_else(|| EngineError::NotFound {
            kind: LookupKind::Tableau,
            id: tableau_id.to_string(),
        })
    }

    pub fn is_player1_turn(&self) -> bool {
        self.player1_turn
    }

    pub fn get_turn_player(&self) -> Player {
        if self.player1_turn {
            Player::One
        } else {
            Player::Two
        }
    }

    pub fn get_current_phase(&self) -> Phase {
        self.phase
    }

    pub fn total_cards(&self) -> usize {
        self.piles.values().map(|pile| pile.cards.len()).sum()
    }

    pub fn declare_winner(&mut self, winner: Winner) {
        self.winner = Some(winner);
        self.ended = true;
    }

    pub fn reset_pile_actions(&mut self) {
        for pile in self.piles.values_mut() {
            pile.has_acted = false;
        }
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        for (tableau_id, tableau) in &self.tableaux {
            if let Some(missing) = tableau
                .piles
                .iter()
                .find(|pile| !self.piles.contains_key(pile.as_str()))
            {
                return Err(IntegrityError::MissingPile {
                    tableau: tableau_id.clone(),
                    pile: missing.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for card in self.piles.values().flat_map(|pile| pile.cards.iter()) {
            if !seen.insert(card.as_str()) {
                return Err(IntegrityError::DuplicateCard { card: card.clone() });
            }
        }

        if self.ended && self.winner.is_none() {
            return Err(IntegrityError::EndedWithoutWinner);
        }

        Ok(())
    }

    /// A small two-player table used for local play and tests.
    ///
    /// Each player owns a deck, a hand, four minion piles, a warlord pile and a
    /// cemetery. The card ids line up with [`GameConfig::sample`].
    ///
    /// [`GameConfig::sample`]: super::config::GameConfig::sample
    pub fn sample() -> Self {
        let mut tableaux = BTreeMap::new();
        let mut piles = BTreeMap::new();

        for (player, prefix) in [(Player::One, "player1"), (Player::Two, "player2")] {
            let short = if player == Player::One { "p1" } else { "p2" };
            let pile_ids = sample_pile_ids(prefix);
            for pile_id in &pile_ids {
                let cards: Vec<String> = match pile_id.trim_start_matches(prefix) {
                    "Deck" => (1..=6).map(|n| format!("{short}Card{n}")).collect(),
                    "Warlord" => vec![format!("{short}Warlord")],
                    "Minion0" => vec![format!("{short}Knight")],
                    "Minion1" => vec![format!("{short}Berserker")],
                    _ => Vec::new(),
                };
                let mut pile = PileState::new(cards);
                pile.show_back = pile_id.ends_with("Deck");
                piles.insert(pile_id.clone(), pile);
            }
            tableaux.insert(player.tableau_id().to_string(), TableauState::new(pile_ids));
        }

        GameState::new(tableaux, piles)
    }
}

pub(crate) fn sample_pile_ids(prefix: &str) -> Vec<String> {
    [
        "Deck", "Hand", "Minion0", "Minion1", "Minion2", "Minion3", "Warlord", "Cemetery",
    ]
    .iter()
    .map(|suffix| format!("{prefix}{suffix}"))
    .collect()
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            tableaux: BTreeMap::new(),
            piles: BTreeMap::new(),
            allow_invalid_moves: false,
            player1_turn: true,
            phase: Phase::default(),
            has_drawn: false,
            ended: false,
            winner: None,
        }
    }
}
