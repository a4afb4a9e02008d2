pub mod game;
pub mod utils;

use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use web_sys::js_sys::Function;

pub use game::{
    EntityId, GameState, GameStore, IntegrityError, Participant, Player, PrimaryColor,
    RoundDetail, RoundInput, RoundResolution, RoundResult, RoundScorer, RuleFlags, ScoreCategory,
    Screen, Standing, SubscriptionId, Team, ThemeSetting, ViewState,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error(error: IntegrityError) -> JsValue {
    serde_wasm_bindgen::to_value(&error)
        .unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn parse_state(json: &str) -> Result<GameState, JsValue> {
    let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
    state.integrity_check().map_err(to_js_error)?;
    Ok(state)
}

fn announce_winner(resolution: &RoundResolution) {
    if let Some(winner) = &resolution.winner {
        utils::console_log(&format!("{winner} wins the game!"));
    }
}

/// 面向前端的记分器，内部持有唯一的状态容器。
#[wasm_bindgen]
pub struct ScopaEngine {
    store: GameStore,
}

#[wasm_bindgen]
impl ScopaEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<ScopaEngine, JsValue> {
        let store = match initial_state_json {
            Some(json) => {
                let state: GameState = serde_json::from_str(&json).map_err(serde_to_js_error)?;
                GameStore::with_state(state).map_err(to_js_error)?
            }
            None => GameStore::new(),
        };
        Ok(ScopaEngine { store })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.store.state()).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.store.restore(state).map_err(to_js_error)
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(self.store.state())
    }

    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.store.view()).map_err(serde_to_js_error)
    }

    pub fn standings_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.store.state().standings()).map_err(serde_to_js_error)
    }

    pub fn set_number_of_players(&mut self, count: u32) {
        self.store.set_number_of_players(count);
    }

    pub fn set_teams_mode(&mut self, enabled: bool) {
        self.store.set_teams_mode(enabled);
    }

    pub fn update_player_name(&mut self, id: EntityId, name: &str) {
        self.store.update_player_name(id, name);
    }

    pub fn update_team_name(&mut self, id: EntityId, name: &str) {
        self.store.update_team_name(id, name);
    }

    pub fn set_target_score(&mut self, raw: &str) {
        self.store.set_target_score(raw);
    }

    pub fn set_target_score_value(&mut self, value: i32) {
        self.store.set_target_score_value(i64::from(value));
    }

    pub fn toggle_napola(&mut self, enabled: bool) {
        self.store.toggle_napola(enabled);
    }

    pub fn toggle_re_bello(&mut self, enabled: bool) {
        self.store.toggle_re_bello(enabled);
    }

    pub fn start_game(&mut self) {
        self.store.start_game();
    }

    pub fn new_game(&mut self) {
        self.store.new_game();
    }

    pub fn submit_round_json(&mut self, input_json: &str) -> Result<String, JsValue> {
        let input: RoundInput = serde_json::from_str(input_json).map_err(serde_to_js_error)?;
        let resolution = self.store.submit_round(&input);
        announce_winner(&resolution);
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    /// Registers a callback that receives every new snapshot as a JSON string.
    pub fn subscribe(&mut self, callback: Function) -> u32 {
        let id = self.store.subscribe(move |state| {
            match serde_json::to_string(state) {
                Ok(json) => {
                    if let Err(error) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                        tracing::warn!(?error, "snapshot listener threw");
                    }
                }
                Err(error) => tracing::warn!(%error, "failed to encode snapshot"),
            }
        });
        id.0
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.store.unsubscribe(SubscriptionId(id))
    }

    pub fn open_add_round_dialog(&mut self) {
        self.store.open_add_round_dialog();
    }

    pub fn close_add_round_dialog(&mut self) {
        self.store.close_add_round_dialog();
    }

    pub fn open_cancel_game_dialog(&mut self) {
        self.store.open_cancel_game_dialog();
    }

    pub fn close_cancel_game_dialog(&mut self) {
        self.store.close_cancel_game_dialog();
    }

    pub fn open_screen(&mut self, screen: &str) {
        if let Ok(screen) = screen.parse::<Screen>() {
            self.store.open_screen(screen);
        }
    }

    pub fn close_screen(&mut self, screen: &str) {
        if let Ok(screen) = screen.parse::<Screen>() {
            self.store.close_screen(screen);
        }
    }

    pub fn set_theme(&mut self, theme: &str) {
        if let Ok(theme) = theme.parse::<ThemeSetting>() {
            self.store.set_theme(theme);
        }
    }

    pub fn set_primary_color(&mut self, color: &str) {
        if let Ok(color) = color.parse::<PrimaryColor>() {
            self.store.set_primary_color(color);
        }
    }
}

/// 返回默认的两人对局状态。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_js(&GameState::new_game())
}

/// 对传入的状态计算一局得分，返回新状态与本局明细，不修改任何容器。
#[wasm_bindgen(js_name = "scoreRound")]
pub fn score_round(state_json: &str, input_json: &str) -> Result<String, JsValue> {
    let state = parse_state(state_json)?;
    let input: RoundInput = serde_json::from_str(input_json).map_err(serde_to_js_error)?;
    let resolution = RoundScorer::score_round(&state, &input);
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state_json: &str) -> Result<(), JsValue> {
    parse_state(state_json).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only success paths here: building a JsValue panics off wasm32.

    #[test]
    fn engine_round_trips_json_on_host() {
        let mut engine = ScopaEngine::new(None).expect("engine should construct");
        engine.set_number_of_players(3);
        engine.start_game();
        engine.open_add_round_dialog();

        let json = engine
            .submit_round_json(r#"{"scopa_counts": {"1": 2}, "carte_winner": 1, "settebello_winner": 3}"#)
            .expect("round should submit");
        let resolution: RoundResolution =
            serde_json::from_str(&json).expect("resolution should parse");
        assert_eq!(resolution.round.details[0].breakdown_label(), "2 Scope, Carte");
        assert_eq!(resolution.state.score_of(3), 1);

        let view: ViewState =
            serde_json::from_str(&engine.view_json().expect("view json")).expect("view");
        assert!(!view.add_round_dialog_open);

        let saved = engine.state_json().expect("state json");
        let mut reloaded = ScopaEngine::new(Some(saved.clone())).expect("saved state should load");
        assert_eq!(reloaded.state_json().expect("state json"), saved);
        reloaded.set_state_json(&saved).expect("restore should accept own snapshot");
    }

    #[test]
    fn free_functions_score_and_validate() {
        let state = serde_json::to_string(&GameState::new_game().start()).expect("state json");
        validate_state(&state).expect("fresh state should validate");

        let json = score_round(&state, r#"{"primiera_winner": 2}"#).expect("round should score");
        let resolution: RoundResolution =
            serde_json::from_str(&json).expect("resolution should parse");
        assert_eq!(resolution.state.score_of(2), 1);
        assert_eq!(resolution.round.round_number, 1);
    }

    #[test]
    fn engine_ignores_unknown_view_names() {
        let mut engine = ScopaEngine::new(None).expect("engine should construct");
        engine.open_screen("rules");
        engine.set_theme("neon");
        engine.set_primary_color("dark-gray");

        let view: ViewState =
            serde_json::from_str(&engine.view_json().expect("view json")).expect("view");
        assert_eq!(view.overlay, Some(Screen::Rules));
        assert_eq!(view.theme, ThemeSetting::System);
        assert_eq!(view.primary_color, PrimaryColor::DarkGray);

        engine.new_game();
        let standings: Vec<Standing> =
            serde_json::from_str(&engine.standings_json().expect("standings json"))
                .expect("standings");
        assert_eq!(standings.len(), 2);
    }
}
