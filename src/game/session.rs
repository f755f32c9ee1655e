//! The authoritative game loop.
//!
//! [`GameSession`] owns the current snapshot and the registry, turns UI
//! requests into state changers, and drives phase and turn progression.

use crate::log;

use super::attack::{Attack, AttackProps};
use super::changer::{StateChange, StateChanger};
use super::config::{CardConfig, GameConfig};
use super::error::EngineResult;
use super::moves::{Move, MoveProps, MoveSubject};
use super::shuffle::Shuffle;
use super::state::{GameState, Phase, Player};

#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    initial: GameState,
    state: GameState,
}

fn commit(state: &mut GameState, change: &impl StateChanger) -> EngineResult<bool> {
    let valid = change.is_valid(state);
    if valid || state.allow_invalid_moves {
        *state = change.make(state)?;
    }
    Ok(valid)
}

impl GameSession {
    pub fn new(config: GameConfig, state: GameState) -> EngineResult<Self> {
        state.integrity_check()?;
        Ok(Self {
            config,
            initial: state.clone(),
            state,
        })
    }

    pub fn from_json(config_json: &str, state_json: &str) -> EngineResult<Self> {
        Self::new(GameConfig::from_json(config_json)?, GameState::from_json(state_json)?)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Builds a changer against the registry and commits it when valid, or
    /// unconditionally while `allowInvalidMoves` is set. Returns the validity.
    pub fn apply<F>(&mut self, build: F) -> EngineResult<bool>
    where
        F: for<'c> FnOnce(&'c GameConfig) -> StateChange<'c>,
    {
        let change = build(&self.config);
        commit(&mut self.state, &change)
    }

    fn move_rules(&self, props: &MoveProps) -> Vec<String> {
        props
            .incoming_rules
            .clone()
            .unwrap_or_else(|| self.config.incoming_rules(&props.to).to_vec())
    }

    fn attack_rules(&self, props: &AttackProps) -> Vec<String> {
        props
            .incoming_rules
            .clone()
            .unwrap_or_else(|| self.config.incoming_attack_rules(&props.to).to_vec())
    }

    /// Player-initiated move. The result is recorded on the destination pile.
    pub fn make_move(&mut self, props: &MoveProps) -> EngineResult<bool> {
        let rules = self.move_rules(props);
        let subject = props.subject().unwrap_or(MoveSubject::Amount(0));
        let valid = self.apply(|config| {
            StateChange::Move(
                Move::new(props.from.clone(), props.to.clone(), subject, true)
                    .with_rules(rules, config),
            )
        })?;
        if let Ok(pile) = self.state.get_pile_state_mut(&props.to) {
            pile.last_incoming_move_validity = valid;
        }
        Ok(valid)
    }

    pub fn is_move_valid(&self, props: &MoveProps) -> bool {
        let subject = props.subject().unwrap_or(MoveSubject::Amount(0));
        Move::new(props.from.clone(), props.to.clone(), subject, true)
            .with_rules(self.move_rules(props), &self.config)
            .is_valid(&self.state)
    }

    /// Player-initiated attack. The result is recorded on the attacked pile.
    pub fn make_attack(&mut self, props: &AttackProps) -> EngineResult<bool> {
        let rules = self.attack_rules(props);
        let valid = self.apply(|config| {
            StateChange::Attack(Attack::from_props(props, true, config).with_rules(rules))
        })?;
        if let Ok(pile) = self.state.get_pile_state_mut(&props.to) {
            pile.last_incoming_attack_validity = valid;
        }
        Ok(valid)
    }

    pub fn is_attack_valid(&self, props: &AttackProps) -> bool {
        Attack::from_props(props, true, &self.config)
            .with_rules(self.attack_rules(props))
            .is_valid(&self.state)
    }

    pub fn clear_validity_feedback(&mut self) {
        for pile in self.state.piles.values_mut() {
            pile.last_incoming_move_validity = true;
            pile.last_incoming_attack_validity = true;
        }
    }

    /// Runs the registry's opening moves. They are automatic, so pile rules
    /// do not apply; structurally invalid ones are skipped.
    pub fn deal_initial_moves(&mut self) -> EngineResult<usize> {
        let mut applied = 0;
        for props in &self.config.initial_moves {
            let Some(subject) = props.subject() else {
                log::warn("session", &format!("initial move {} -> {} has no card", props.from, props.to));
                continue;
            };
            let op = Move::new(props.from.clone(), props.to.clone(), subject, false);
            if op.is_valid(&self.state) {
                self.state = op.make(&self.state)?;
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Flags every start-shuffled pile as shuffling and returns their ids
    /// for [`finish_shuffle`](Self::finish_shuffle).
    pub fn begin_initial_shuffle(&mut self) -> EngineResult<Vec<String>> {
        let mut started = Vec::new();
        for pile in self.config.piles.iter().filter(|pile| pile.initial_shuffle) {
            let op = Shuffle::new(pile.id.clone());
            if op.is_valid(&self.state) {
                self.state = op.animate(&self.state)?;
                started.push(pile.id.clone());
            }
        }
        Ok(started)
    }

    pub fn finish_shuffle(&mut self, piles: &[String]) -> EngineResult<()> {
        for pile in piles {
            let op = Shuffle::new(pile.clone());
            commit(&mut self.state, &op)?;
        }
        Ok(())
    }

    /// Advances Draw -> Main -> Battle -> End. Leaving the end phase hands the
    /// turn to the other player.
    pub fn change_phase(&mut self) -> Phase {
        if self.state.phase == Phase::EndPhase {
            self.change_turn();
        } else {
            self.state.phase = self.state.phase.next();
        }
        self.state.phase
    }

    pub fn change_turn(&mut self) -> Player {
        self.state.player1_turn = !self.state.player1_turn;
        self.state.has_drawn = false;
        self.state.phase = Phase::DrawPhase;
        self.state.reset_pile_actions();
        log::debug("session", &format!("{} to play", self.state.get_turn_player()));
        self.state.get_turn_player()
    }

    pub fn toggle_invalid_moves(&mut self) -> bool {
        self.state.allow_invalid_moves = !self.state.allow_invalid_moves;
        self.state.allow_invalid_moves
    }

    pub fn restart(&mut self) {
        self.state = self.initial.clone();
        self.config.reset_health();
    }

    /// Health of the card on top of `player`'s warlord pile.
    pub fn warlord_health(&self, player: Player) -> Option<i32> {
        let card = self.state.piles.get(player.warlord_pile())?.top()?;
        self.config.card(card).ok().map(CardConfig::health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::new(GameConfig::sample(), GameState::sample()).expect("sample is consistent")
    }

    fn draw(session: &mut GameSession, card: &str) -> bool {
        session
            .make_move(&MoveProps::new("player1Deck", "player1Hand", MoveSubject::Card(card.into())))
            .expect("move runs")
    }

    fn advance_to(session: &mut GameSession, phase: Phase) {
        while session.state().phase != phase {
            session.change_phase();
        }
    }

    #[test]
    fn rejects_an_inconsistent_bootstrap() {
        let mut state = GameState::sample();
        state
            .get_pile_state_mut("player2Hand")
            .expect("pile exists")
            .cards
            .push("p1Card1".into());
        assert!(GameSession::new(GameConfig::sample(), state).is_err());
    }

    #[test]
    fn phase_cycle_hands_over_the_turn() {
        let mut session = session();
        assert!(draw(&mut session, "p1Card6"));
        session
            .state
            .get_pile_state_mut("player1Minion0")
            .expect("pile exists")
            .has_acted = true;

        assert_eq!(session.change_phase(), Phase::MainPhase);
        assert_eq!(session.change_phase(), Phase::BattlePhase);
        assert_eq!(session.change_phase(), Phase::EndPhase);
        assert!(session.state().is_player1_turn());
        assert!(session.state().has_drawn);

        assert_eq!(session.change_phase(), Phase::DrawPhase);
        assert_eq!(session.state().get_turn_player(), Player::Two);
        assert!(!session.state().has_drawn);
        assert!(session.state().piles.values().all(|pile| !pile.has_acted));
    }

    #[test]
    fn one_draw_per_turn() {
        let mut session = session();
        assert!(draw(&mut session, "p1Card6"));
        assert!(!draw(&mut session, "p1Card5"));

        assert_eq!(session.state().piles["player1Hand"].cards, ["p1Card6"]);
        assert!(!session.state().piles["player1Hand"].last_incoming_move_validity);

        session.clear_validity_feedback();
        assert!(session.state().piles["player1Hand"].last_incoming_move_validity);
    }

    #[test]
    fn deploy_and_attack_record_feedback() {
        let mut session = session();
        assert!(draw(&mut session, "p1Card6"));
        advance_to(&mut session, Phase::MainPhase);

        let deploy = MoveProps::new("player1Hand", "player1Minion2", MoveSubject::Card("p1Card6".into()));
        assert!(session.is_move_valid(&deploy));
        assert!(session.make_move(&deploy).expect("move runs"));
        // minion slots hold one card
        let crowded = MoveProps::new("player1Minion2", "player1Minion0", MoveSubject::Amount(1));
        assert!(!session.make_move(&crowded).expect("move runs"));
        assert!(!session.state().piles["player1Minion0"].last_incoming_move_validity);

        let attack = AttackProps {
            from: "player1Minion1".into(),
            to: "player2Minion1".into(),
            attacking_card: "p1Berserker".into(),
            defending_card: "p2Berserker".into(),
            incoming_rules: None,
        };
        assert!(!session.make_attack(&attack).expect("attack runs"), "not battle phase yet");
        assert!(!session.state().piles["player2Minion1"].last_incoming_attack_validity);

        advance_to(&mut session, Phase::BattlePhase);
        assert!(session.is_attack_valid(&attack));
        assert!(session.make_attack(&attack).expect("attack runs"));
        assert_eq!(session.state().piles["player1Cemetery"].cards, ["p1Berserker"]);
        assert_eq!(session.state().piles["player2Cemetery"].cards, ["p2Berserker"]);
        assert!(session.state().piles["player2Minion1"].last_incoming_attack_validity);
    }

    #[test]
    fn invalid_moves_commit_when_allowed() {
        let mut session = session();
        let props = MoveProps::new("player1Deck", "player1Minion3", MoveSubject::Amount(2));
        assert!(!session.make_move(&props).expect("move runs"));
        assert!(session.state().piles["player1Minion3"].cards.is_empty());

        assert!(session.toggle_invalid_moves());
        assert!(!session.make_move(&props).expect("move runs"));
        assert_eq!(session.state().piles["player1Minion3"].cards, ["p1Card5", "p1Card6"]);
        assert!(!session.state().piles["player1Minion3"].last_incoming_move_validity);
    }

    #[test]
    fn initial_deal_skips_impossible_moves() {
        let config = GameConfig::sample().with_initial_moves(vec![
            MoveProps::new("player1Deck", "player1Hand", MoveSubject::Amount(3)),
            MoveProps::new("player2Deck", "player2Hand", MoveSubject::Amount(3)),
            MoveProps::new("player1Deck", "player1Hand", MoveSubject::Amount(9)),
            MoveProps::default(),
        ]);
        let mut session = GameSession::new(config, GameState::sample()).expect("sample is consistent");

        assert_eq!(session.deal_initial_moves().expect("deal runs"), 2);
        assert_eq!(session.state().piles["player1Hand"].cards.len(), 3);
        assert_eq!(session.state().piles["player2Deck"].cards.len(), 3);
        assert!(!session.state().has_drawn);
    }

    #[test]
    fn initial_shuffle_in_two_steps() {
        let mut session = session();
        let before = session.state().clone();

        let piles = session.begin_initial_shuffle().expect("shuffle starts");
        assert_eq!(piles, ["player1Deck", "player2Deck"]);
        assert!(session.state().piles["player1Deck"].is_shuffling);
        assert_eq!(session.state().piles["player1Deck"].cards, before.piles["player1Deck"].cards);

        session.finish_shuffle(&piles).expect("shuffle commits");
        for pile in &piles {
            let mut cards = session.state().piles[pile].cards.clone();
            let mut original = before.piles[pile].cards.clone();
            cards.sort();
            original.sort();
            assert_eq!(cards, original);
            assert!(!session.state().piles[pile].is_shuffling);
        }
    }

    #[test]
    fn restart_restores_board_and_health() {
        let mut session = session();
        advance_to(&mut session, Phase::BattlePhase);
        let attack = AttackProps {
            from: "player1Minion0".into(),
            to: "player2Warlord".into(),
            attacking_card: "p1Knight".into(),
            defending_card: "p2Warlord".into(),
            incoming_rules: None,
        };
        assert!(session.make_attack(&attack).expect("attack runs"));
        assert_eq!(session.warlord_health(Player::Two), Some(17));
        assert_eq!(session.warlord_health(Player::One), Some(20));

        session.restart();

        assert_eq!(session.state(), &GameState::sample());
        assert_eq!(session.warlord_health(Player::Two), Some(20));
        assert_eq!(session.config().card("p1Knight").expect("registered").health(), 5);
    }

    #[test]
    fn explicit_rules_override_the_registry() {
        let mut session = session();
        advance_to(&mut session, Phase::BattlePhase);
        let mut attack = AttackProps {
            from: "player1Minion0".into(),
            to: "player2Minion0".into(),
            attacking_card: "p1Knight".into(),
            defending_card: "p2Knight".into(),
            incoming_rules: Some(vec!["hasEnded()".into()]),
        };
        assert!(!session.is_attack_valid(&attack));

        attack.incoming_rules = Some(Vec::new());
        assert!(session.make_attack(&attack).expect("attack runs"));
        assert!(session.state().winner.is_none());
    }
}
