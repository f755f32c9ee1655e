//! Static game configuration: the card and pile registries handed to the
//! engine at start-up.
//!
//! Everything here is read-only except card health. Health lives in a
//! [`Cell`] on the card record instead of in [`GameState`](super::GameState):
//! it is shared by every snapshot and is not rolled back when an older
//! snapshot is restored. `Cell` keeps the registry `!Sync`, so only one
//! thread can ever resolve combat against it.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::moves::{MoveProps, MoveSubject};
use super::state::{sample_pile_ids, Player};

/// A card record. `health_value` is mutated in place by combat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub url: String,
    pub attack_value: i32,
    pub health_value: Cell<i32>,
    #[serde(default)]
    pub original_health_value: Option<i32>,
}

impl CardConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, attack: i32, health: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rank: String::new(),
            category: String::new(),
            url: String::new(),
            attack_value: attack,
            health_value: Cell::new(health),
            original_health_value: Some(health),
        }
    }

    pub fn with_rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = rank.into();
        self
    }

    pub fn health(&self) -> i32 {
        self.health_value.get()
    }

    pub fn set_health(&self, value: i32) {
        self.health_value.set(value);
    }

    pub fn original_health(&self) -> i32 {
        self.original_health_value.unwrap_or_else(|| self.health())
    }

    pub fn is_dead(&self) -> bool {
        self.health() <= 0
    }
}

/// A pile record. `incoming` holds the rule strings checked when a card is
/// moved onto this pile by a player; `incoming_attack` the ones checked when
/// this pile is attacked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PileConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub incoming: Vec<String>,
    #[serde(default)]
    pub incoming_attack: Vec<String>,
    #[serde(default)]
    pub initial_shuffle: bool,
}

impl PileConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_incoming<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incoming = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_incoming_attack<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incoming_attack = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn shuffled_at_start(mut self) -> Self {
        self.initial_shuffle = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    #[serde(default)]
    pub piles: Vec<PileConfig>,
    #[serde(default)]
    pub cards: Vec<CardConfig>,
    #[serde(default)]
    pub initial_moves: Vec<MoveProps>,
}

impl GameConfig {
    pub fn new(piles: Vec<PileConfig>, cards: Vec<CardConfig>) -> Self {
        Self {
            piles,
            cards,
            initial_moves: Vec::new(),
        }
    }

    pub fn with_initial_moves(mut self, moves: Vec<MoveProps>) -> Self {
        self.initial_moves = moves;
        self
    }

    /// Parses a registry file. Cards without an `originalHealthValue` take
    /// their starting health as the original.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let mut config: GameConfig = serde_json::from_str(json)?;
        for card in &mut config.cards {
            if card.original_health_value.is_none() {
                card.original_health_value = Some(card.health());
            }
        }
        config.check_unique_ids()?;
        Ok(config)
    }

    fn check_unique_ids(&self) -> EngineResult<()> {
        let mut cards: Vec<&str> = self.cards.iter().map(|card| card.id.as_str()).collect();
        cards.sort_unstable();
        if let Some(pair) = cards.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(EngineError::Config {
                reason: format!("card {} registered twice", pair[0]),
            });
        }
        let mut piles: Vec<&str> = self.piles.iter().map(|pile| pile.id.as_str()).collect();
        piles.sort_unstable();
        if let Some(pair) = piles.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(EngineError::Config {
                reason: format!("pile {} registered twice", pair[0]),
            });
        }
        Ok(())
    }

    pub fn card(&self, card_id: &str) -> EngineResult<&CardConfig> {
        self.cards
            .iter()
            .find(|card| card.id == card_id)
            .ok_or_else(|| EngineError::card_not_found(card_id))
    }

    pub fn pile(&self, pile_id: &str) -> EngineResult<&PileConfig> {
        self.piles
            .iter()
            .find(|pile| pile.id == pile_id)
            .ok_or_else(|| EngineError::pile_not_found(pile_id))
    }

    /// Move rules attached to the edge into `pile_id`; empty for unknown piles.
    pub fn incoming_rules(&self, pile_id: &str) -> &[String] {
        self.pile(pile_id)
            .map(|pile| pile.incoming.as_slice())
            .unwrap_or_default()
    }

    pub fn incoming_attack_rules(&self, pile_id: &str) -> &[String] {
        self.pile(pile_id)
            .map(|pile| pile.incoming_attack.as_slice())
            .unwrap_or_default()
    }

    pub fn reset_health(&self) {
        for card in &self.cards {
            card.set_health(card.original_health());
        }
    }

    /// Registry matching [`GameState::sample`](super::GameState::sample).
    pub fn sample() -> Self {
        let mut cards = Vec::new();
        let mut piles = Vec::new();
        let mut initial_moves = Vec::new();

        for player in Player::ALL {
            let (prefix, short, turn_check) = match player {
                Player::One => ("player1", "p1", "isPlayer1Turn()"),
                Player::Two => ("player2", "p2", "!isPlayer1Turn()"),
            };

            cards.push(CardConfig::new(format!("{short}Warlord"), "Warlord", 2, 20).with_rank("W"));
            cards.push(CardConfig::new(format!("{short}Knight"), "Knight", 3, 5).with_rank("3"));
            cards.push(CardConfig::new(format!("{short}Berserker"), "Berserker", 5, 4).with_rank("5"));
            for n in 1..=6 {
                cards.push(
                    CardConfig::new(format!("{short}Card{n}"), format!("Recruit {n}"), n, n + 1)
                        .with_rank(n.to_string()),
                );
            }

            let deck = format!("{prefix}Deck");
            let hand = format!("{prefix}Hand");
            for pile_id in sample_pile_ids(prefix) {
                let suffix = pile_id.trim_start_matches(prefix).to_string();
                let pile = PileConfig::new(pile_id.clone(), suffix.clone());
                let pile = match suffix.as_str() {
                    "Deck" => pile.shuffled_at_start().with_incoming(["false"]),
                    "Hand" => pile.with_incoming([
                        turn_check.to_string(),
                        format!("move.from === '{deck}'"),
                        "getStatePhase() === 'DrawPhase' && !hasDrawn()".to_string(),
                    ]),
                    "Warlord" => pile
                        .with_incoming(["false"])
                        .with_incoming_attack(["getStatePhase() === 'BattlePhase'"]),
                    "Cemetery" => pile.with_incoming(["false"]).with_incoming_attack(["false"]),
                    _ => pile
                        .with_incoming([
                            turn_check.to_string(),
                            format!("move.from === '{hand}'"),
                            "getStatePhase() === 'MainPhase'".to_string(),
                            "toPile.cards.length < 1".to_string(),
                        ])
                        .with_incoming_attack(["getStatePhase() === 'BattlePhase'"]),
                };
                piles.push(pile);
            }

            initial_moves.push(MoveProps::new(deck, hand, MoveSubject::Amount(3)));
        }

        GameConfig::new(piles, cards).with_initial_moves(initial_moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookups() {
        let config = GameConfig::sample();
        assert_eq!(config.card("p1Knight").expect("knight exists").attack_value, 3);
        assert!(matches!(
            config.card("ghost"),
            Err(EngineError::NotFound { .. })
        ));
        assert_eq!(config.incoming_rules("player1Warlord"), ["false".to_string()]);
        assert!(config.incoming_rules("unknown").is_empty());
    }

    #[test]
    fn health_is_shared_and_resettable() {
        let config = GameConfig::sample();
        let knight = config.card("p2Knight").expect("knight exists");
        knight.set_health(-3);
        assert!(config.card("p2Knight").expect("knight exists").is_dead());
        config.reset_health();
        assert_eq!(knight.health(), 5);
    }

    #[test]
    fn parses_registry_json() {
        let json = r#"{
            "piles": [{ "id": "deck", "name": "Deck", "initialShuffle": true, "sort": false }],
            "tableaux": [{ "id": "player1Tableau" }],
            "cards": [{ "id": "c1", "attackValue": 2, "healthValue": 7, "url": "c1" }],
            "initialMoves": [{ "from": "deck", "to": "hand", "amount": 2 }]
        }"#;
        let config = GameConfig::from_json(json).expect("config should parse");
        let card = config.card("c1").expect("card exists");
        assert_eq!(card.original_health(), 7);
        assert!(config.pile("deck").expect("pile exists").initial_shuffle);
        assert_eq!(
            config.initial_moves[0].subject(),
            Some(MoveSubject::Amount(2))
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{ "cards": [
            { "id": "c1", "attackValue": 1, "healthValue": 1 },
            { "id": "c1", "attackValue": 2, "healthValue": 2 }
        ] }"#;
        assert!(matches!(
            GameConfig::from_json(json),
            Err(EngineError::Config { .. })
        ));
    }
}
