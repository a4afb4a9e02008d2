use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const DEFAULT_TARGET_SCORE: u32 = 11;
pub const MIN_PLAYERS: u32 = 2;
pub const MAX_PLAYERS: u32 = 4;
pub const TEAMS_MODE_PLAYERS: u32 = 4;

/// 玩家或队伍的标识，在当前参与者集合内唯一。
pub type EntityId = u32;

/// 计分单位的公共接口：计分器只关心 id 与名称。
pub trait Participant {
    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: EntityId,
    pub name: String,
}

impl Player {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn numbered(id: EntityId) -> Self {
        Self::new(id, format!("Player {id}"))
    }
}

impl Participant for Player {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 队伍。成员列表只用于展示，计分时不会读取。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<Player>,
}

impl Team {
    pub fn new(id: EntityId, name: impl Into<String>, players: Vec<Player>) -> Self {
        Self {
            id,
            name: name.into(),
            players,
        }
    }
}

impl Participant for Team {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleFlags {
    #[serde(default)]
    pub napola_enabled: bool,
    #[serde(default)]
    pub re_bello_enabled: bool,
}

/// 某个参与者在一局中的得分明细。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundDetail {
    pub entity_id: EntityId,
    pub entity_name: String,
    pub points: u32,
    #[serde(default)]
    pub breakdown: Vec<String>,
}

impl RoundDetail {
    /// Labels as shown to players, e.g. `"2 Scope, Carte"`.
    pub fn breakdown_label(&self) -> String {
        self.breakdown.join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResult {
    pub round_number: u32,
    #[serde(default)]
    pub details: Vec<RoundDetail>,
}

impl RoundResult {
    pub fn detail_for(&self, entity_id: EntityId) -> Option<&RoundDetail> {
        self.details.iter().find(|detail| detail.entity_id == entity_id)
    }
}

/// 记分板上的一行。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Standing {
    pub entity_id: EntityId,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    DuplicateEntityId { entity_id: EntityId },
    RosterModeMismatch { teams_mode: bool },
    InvalidTargetScore { value: u32 },
    UnknownScoreEntity { entity_id: EntityId },
    RoundNumbering { expected: u32, actual: u32 },
}

/// 对局整体状态。所有变更都通过构造新的快照完成。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub teams_mode: bool,
    pub target_score: u32,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub scores: BTreeMap<EntityId, u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub round_history: Vec<RoundResult>,
    #[serde(default)]
    pub rules: RuleFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl GameState {
    pub fn new_game() -> Self {
        Self::default()
    }

    fn default_players(count: u32) -> Vec<Player> {
        (1..=count).map(Player::numbered).collect()
    }

    fn default_teams() -> Vec<Team> {
        vec![
            Team::new(1, "Team 1", vec![Player::numbered(1), Player::numbered(3)]),
            Team::new(2, "Team 2", vec![Player::numbered(2), Player::numbered(4)]),
        ]
    }

    /// 更换阵容会丢弃已有的比分、历史与胜者。
    fn clear_progress(&mut self) {
        self.scores.clear();
        self.round_history.clear();
        self.winner = None;
    }

    pub fn with_number_of_players(mut self, count: u32) -> Self {
        if self.started {
            return self;
        }
        let count = count.clamp(MIN_PLAYERS, MAX_PLAYERS);
        self.players = Self::default_players(count);
        self.teams.clear();
        self.teams_mode = false;
        self.clear_progress();
        self
    }

    pub fn with_teams_mode(mut self, enabled: bool) -> Self {
        if self.started {
            return self;
        }
        if enabled {
            self.players.clear();
            self.teams = Self::default_teams();
            self.teams_mode = true;
            self.clear_progress();
            self
        } else if self.players.is_empty() {
            self.with_number_of_players(TEAMS_MODE_PLAYERS)
        } else {
            self.teams.clear();
            self.teams_mode = false;
            self.clear_progress();
            self
        }
    }

    pub fn with_player_name(mut self, id: EntityId, name: impl Into<String>) -> Self {
        if self.started {
            return self;
        }
        if let Some(player) = self.players.iter_mut().find(|player| player.id == id) {
            player.name = name.into();
        }
        self
    }

    pub fn with_team_name(mut self, id: EntityId, name: impl Into<String>) -> Self {
        if self.started {
            return self;
        }
        if let Some(team) = self.teams.iter_mut().find(|team| team.id == id) {
            team.name = name.into();
        }
        self
    }

    /// Unparseable or non-positive input falls back to the default of 11.
    pub fn with_target_score(self, raw: &str) -> Self {
        let value = raw.parse::<i64>().unwrap_or(0);
        self.with_target_score_value(value)
    }

    pub fn with_target_score_value(mut self, value: i64) -> Self {
        if self.started {
            return self;
        }
        self.target_score = u32::try_from(value)
            .ok()
            .filter(|target| *target > 0)
            .unwrap_or(DEFAULT_TARGET_SCORE);
        self
    }

    pub fn with_napola(mut self, enabled: bool) -> Self {
        self.rules.napola_enabled = enabled;
        self
    }

    pub fn with_re_bello(mut self, enabled: bool) -> Self {
        self.rules.re_bello_enabled = enabled;
        self
    }

    pub fn start(mut self) -> Self {
        let scores: BTreeMap<EntityId, u32> = self
            .active_entities()
            .iter()
            .map(|entity| (entity.id(), 0))
            .collect();
        self.scores = scores;
        self.round_history.clear();
        self.winner = None;
        self.started = true;
        self
    }

    pub fn active_entities(&self) -> Vec<&dyn Participant> {
        if self.teams_mode {
            self.teams.iter().map(|team| team as &dyn Participant).collect()
        } else {
            self.players
                .iter()
                .map(|player| player as &dyn Participant)
                .collect()
        }
    }

    pub fn entity_name(&self, id: EntityId) -> Option<&str> {
        if self.teams_mode {
            self.teams.iter().find(|team| team.id == id).map(Team::name)
        } else {
            self.players
                .iter()
                .find(|player| player.id == id)
                .map(Player::name)
        }
    }

    pub fn score_of(&self, id: EntityId) -> u32 {
        self.scores.get(&id).copied().unwrap_or(0)
    }

    pub fn standings(&self) -> Vec<Standing> {
        self.active_entities()
            .into_iter()
            .map(|entity| Standing {
                entity_id: entity.id(),
                name: entity.name().to_string(),
                score: self.score_of(entity.id()),
            })
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.teams_mode && !self.players.is_empty() {
            return Err(IntegrityError::RosterModeMismatch { teams_mode: true });
        }
        if !self.teams_mode && !self.teams.is_empty() {
            return Err(IntegrityError::RosterModeMismatch { teams_mode: false });
        }
        if self.target_score == 0 {
            return Err(IntegrityError::InvalidTargetScore {
                value: self.target_score,
            });
        }

        let mut seen = HashSet::new();
        for entity in self.active_entities() {
            if !seen.insert(entity.id()) {
                return Err(IntegrityError::DuplicateEntityId {
                    entity_id: entity.id(),
                });
            }
        }

        if let Some(entity_id) = self.scores.keys().find(|id| !seen.contains(*id)) {
            return Err(IntegrityError::UnknownScoreEntity {
                entity_id: *entity_id,
            });
        }

        // 历史按最近一局在前排列，局号从 1 连续递增。
        let rounds = self.round_history.len() as u32;
        for (index, round) in self.round_history.iter().enumerate() {
            let expected = rounds - index as u32;
            if round.round_number != expected {
                return Err(IntegrityError::RoundNumbering {
                    expected,
                    actual: round.round_number,
                });
            }
        }

        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            players: Self::default_players(MIN_PLAYERS),
            teams: Vec::new(),
            teams_mode: false,
            target_score: DEFAULT_TARGET_SCORE,
            started: false,
            scores: BTreeMap::new(),
            round_history: Vec::new(),
            rules: RuleFlags::default(),
            winner: None,
        }
    }
}
