//! 单写者状态容器：计算新快照、整体替换、同步通知订阅者。

use serde::{Deserialize, Serialize};

use super::rules::{RoundInput, RoundResolution, RoundScorer};
use super::state::{EntityId, GameState, IntegrityError};
use super::view::{PrimaryColor, Screen, ThemeSetting, ViewState};

pub type Listener = Box<dyn FnMut(&GameState)>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u32);

#[derive(Default)]
pub struct GameStore {
    state: GameState,
    view: ViewState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u32,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: GameState) -> Result<Self, IntegrityError> {
        state.integrity_check()?;
        Ok(Self {
            state,
            ..Self::default()
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn replace(&mut self, next: GameState) {
        if next == self.state {
            return;
        }
        self.state = next;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }

    fn update<F>(&mut self, transition: F)
    where
        F: FnOnce(GameState) -> GameState,
    {
        let next = transition(self.state.clone());
        self.replace(next);
    }

    pub fn set_number_of_players(&mut self, count: u32) {
        tracing::debug!(count, "set number of players");
        self.update(|state| state.with_number_of_players(count));
    }

    pub fn set_teams_mode(&mut self, enabled: bool) {
        tracing::debug!(enabled, "set teams mode");
        self.update(|state| state.with_teams_mode(enabled));
    }

    pub fn update_player_name(&mut self, id: EntityId, name: &str) {
        self.update(|state| state.with_player_name(id, name));
    }

    pub fn update_team_name(&mut self, id: EntityId, name: &str) {
        self.update(|state| state.with_team_name(id, name));
    }

    pub fn set_target_score(&mut self, raw: &str) {
        self.update(|state| state.with_target_score(raw));
        tracing::debug!(raw, target = self.state.target_score, "set target score");
    }

    pub fn set_target_score_value(&mut self, value: i64) {
        self.update(|state| state.with_target_score_value(value));
        tracing::debug!(value, target = self.state.target_score, "set target score");
    }

    pub fn toggle_napola(&mut self, enabled: bool) {
        tracing::debug!(enabled, "toggle napola");
        self.update(|state| state.with_napola(enabled));
    }

    pub fn toggle_re_bello(&mut self, enabled: bool) {
        tracing::debug!(enabled, "toggle re bello");
        self.update(|state| state.with_re_bello(enabled));
    }

    pub fn start_game(&mut self) {
        self.update(GameState::start);
        self.view.close_overlays();
        tracing::info!(
            entities = self.state.scores.len(),
            target = self.state.target_score,
            teams_mode = self.state.teams_mode,
            "game started"
        );
    }

    pub fn submit_round(&mut self, input: &RoundInput) -> RoundResolution {
        let resolution = RoundScorer::score_round(&self.state, input);
        self.replace(resolution.state.clone());
        self.view.add_round_dialog_open = false;

        tracing::info!(
            round = resolution.round.round_number,
            scored = resolution.round.details.len(),
            "round submitted"
        );
        if let Some(winner) = &resolution.winner {
            tracing::info!(%winner, "game won");
        }
        resolution
    }

    pub fn new_game(&mut self) {
        self.replace(GameState::new_game());
        self.view.close_overlays();
        self.view.cancel_game_dialog_open = false;
        tracing::info!("new game");
    }

    /// Installs a previously saved snapshot after checking it.
    pub fn restore(&mut self, state: GameState) -> Result<(), IntegrityError> {
        if let Err(error) = state.integrity_check() {
            tracing::warn!(?error, "rejected snapshot");
            return Err(error);
        }
        self.replace(state);
        Ok(())
    }

    pub fn open_add_round_dialog(&mut self) {
        self.view.add_round_dialog_open = true;
    }

    pub fn close_add_round_dialog(&mut self) {
        self.view.add_round_dialog_open = false;
    }

    pub fn open_cancel_game_dialog(&mut self) {
        self.view.cancel_game_dialog_open = true;
    }

    pub fn close_cancel_game_dialog(&mut self) {
        self.view.cancel_game_dialog_open = false;
    }

    pub fn open_screen(&mut self, screen: Screen) {
        self.view.open_screen(screen);
    }

    pub fn close_screen(&mut self, screen: Screen) {
        self.view.close_screen(screen);
    }

    pub fn set_theme(&mut self, theme: ThemeSetting) {
        self.view.theme = theme;
    }

    pub fn set_primary_color(&mut self, color: PrimaryColor) {
        self.view.primary_color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::ScoreCategory;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_store() -> (GameStore, Rc<RefCell<Vec<GameState>>>) {
        let mut store = GameStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |state| sink.borrow_mut().push(state.clone()));
        (store, seen)
    }

    #[test]
    fn listeners_see_each_new_snapshot() {
        let (mut store, seen) = recording_store();
        store.set_number_of_players(3);
        store.start_game();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].players.len(), 3);
        assert!(seen[1].started);
        assert_eq!(&seen[1], store.state());
    }

    #[test]
    fn unchanged_snapshots_are_not_published() {
        let (mut store, seen) = recording_store();
        store.update_player_name(99, "Ghost");
        store.set_number_of_players(2);
        assert!(seen.borrow().is_empty(), "no-op edits should stay silent");
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let mut store = GameStore::new();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = store.subscribe(move |_| *counter.borrow_mut() += 1);

        store.toggle_napola(true);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id), "second unsubscribe finds nothing");
        store.toggle_napola(false);

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn submit_round_dismisses_dialog_and_scores() {
        let mut store = GameStore::new();
        store.start_game();
        store.open_add_round_dialog();

        let input = RoundInput::default()
            .with_scope(1, 2)
            .with_winner(ScoreCategory::Carte, 1)
            .with_winner(ScoreCategory::Settebello, 2);
        let resolution = store.submit_round(&input);

        assert!(!store.view().add_round_dialog_open);
        assert_eq!(resolution.round.round_number, 1);
        assert_eq!(store.state().score_of(1), 3);
        assert_eq!(store.state().score_of(2), 1);
    }

    #[test]
    fn full_game_reaches_winner_and_resets() {
        let mut store = GameStore::new();
        store.update_player_name(1, "Anna");
        store.update_player_name(2, "Marco");
        store.set_target_score("5");
        store.toggle_napola(true);
        store.start_game();

        let napola = RoundInput::default().with_winner(ScoreCategory::Napola, 2);
        store.submit_round(&napola);
        assert!(store.state().winner.is_none());

        let resolution = store.submit_round(&napola);
        assert_eq!(resolution.winner.as_deref(), Some("Marco"));
        assert!(store.state().is_finished());

        store.open_cancel_game_dialog();
        store.open_screen(Screen::Settings);
        store.set_theme(ThemeSetting::Dark);
        store.new_game();

        assert_eq!(store.state(), &GameState::new_game());
        assert!(!store.view().cancel_game_dialog_open);
        assert_eq!(store.view().overlay, None);
        assert_eq!(store.view().theme, ThemeSetting::Dark, "preferences survive");
    }

    #[test]
    fn start_game_closes_overlays() {
        let mut store = GameStore::new();
        store.open_screen(Screen::Rules);
        store.start_game();
        assert_eq!(store.view().overlay, None);
    }

    #[test]
    fn restore_rejects_broken_snapshots() {
        let mut store = GameStore::new();
        let mut broken = GameState::new_game().with_teams_mode(true);
        broken.players.push(crate::game::state::Player::numbered(5));

        assert_eq!(
            store.restore(broken),
            Err(IntegrityError::RosterModeMismatch { teams_mode: true })
        );
        assert_eq!(store.state(), &GameState::new_game());

        let saved = GameState::new_game().with_number_of_players(4).start();
        store.restore(saved.clone()).expect("valid snapshot should restore");
        assert_eq!(store.state(), &saved);
    }

    #[test]
    fn published_snapshots_always_restore() {
        let mut store = GameStore::new();
        store.set_number_of_players(3);
        store.set_target_score("1");
        let carte = RoundInput::default().with_winner(ScoreCategory::Carte, 3);
        let resolution = store.submit_round(&carte);
        assert_eq!(resolution.winner.as_deref(), Some("Player 3"));
        assert!(!store.state().started, "rounds before start are accepted");

        let early = store.state().clone();
        GameStore::new()
            .restore(early)
            .expect("pre-start winner should restore");

        store.set_number_of_players(2);
        assert!(store.state().scores.is_empty());
        let shrunk = store.state().clone();
        GameStore::new()
            .restore(shrunk)
            .expect("roster change should restore");
    }
}
