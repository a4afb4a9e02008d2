//! 对局状态与计分逻辑模块（状态快照、单局计分、状态容器等）。

pub mod rules;
pub mod state;
pub mod store;
pub mod view;

pub use rules::{RoundInput, RoundResolution, RoundScorer, ScoreCategory, NAPOLA_POINTS};
pub use state::{
    EntityId,
    GameState,
    IntegrityError,
    Participant,
    Player,
    RoundDetail,
    RoundResult,
    RuleFlags,
    Standing,
    Team,
    DEFAULT_TARGET_SCORE,
    MAX_PLAYERS,
    MIN_PLAYERS,
};
pub use store::{GameStore, Listener, SubscriptionId};
pub use view::{PrimaryColor, Screen, ThemeSetting, ViewState};
