use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::state::{EntityId, GameState, RoundDetail, RoundResult, RuleFlags};

pub const NAPOLA_POINTS: u32 = 3;

/// 裁判录入的一局原始数据。缺省字段表示该项本局无人获得（平局或不适用）。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundInput {
    #[serde(default)]
    pub scopa_counts: BTreeMap<EntityId, i32>,
    #[serde(default)]
    pub carte_winner: Option<EntityId>,
    #[serde(default)]
    pub denari_winner: Option<EntityId>,
    #[serde(default)]
    pub settebello_winner: Option<EntityId>,
    #[serde(default)]
    pub primiera_winner: Option<EntityId>,
    #[serde(default)]
    pub napola_winner: Option<EntityId>,
    #[serde(default)]
    pub re_bello_winner: Option<EntityId>,
}

impl RoundInput {
    pub fn with_scope(mut self, entity_id: EntityId, count: i32) -> Self {
        self.scopa_counts.insert(entity_id, count);
        self
    }

    pub fn with_winner(mut self, category: ScoreCategory, entity_id: EntityId) -> Self {
        let slot = match category {
            ScoreCategory::Scopa => return self,
            ScoreCategory::Carte => &mut self.carte_winner,
            ScoreCategory::Denari => &mut self.denari_winner,
            ScoreCategory::Settebello => &mut self.settebello_winner,
            ScoreCategory::Primiera => &mut self.primiera_winner,
            ScoreCategory::ReBello => &mut self.re_bello_winner,
            ScoreCategory::Napola => &mut self.napola_winner,
        };
        *slot = Some(entity_id);
        self
    }

    fn winner_of(&self, category: ScoreCategory) -> Option<EntityId> {
        match category {
            ScoreCategory::Scopa => None,
            ScoreCategory::Carte => self.carte_winner,
            ScoreCategory::Denari => self.denari_winner,
            ScoreCategory::Settebello => self.settebello_winner,
            ScoreCategory::Primiera => self.primiera_winner,
            ScoreCategory::ReBello => self.re_bello_winner,
            ScoreCategory::Napola => self.napola_winner,
        }
    }
}

/// 计分项。`ORDER` 决定明细标签的排列顺序。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScoreCategory {
    Scopa,
    Carte,
    Denari,
    Settebello,
    Primiera,
    ReBello,
    Napola,
}

impl ScoreCategory {
    pub const ORDER: [ScoreCategory; 7] = [
        ScoreCategory::Scopa,
        ScoreCategory::Carte,
        ScoreCategory::Denari,
        ScoreCategory::Settebello,
        ScoreCategory::Primiera,
        ScoreCategory::ReBello,
        ScoreCategory::Napola,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScoreCategory::Scopa => "Scope",
            ScoreCategory::Carte => "Carte",
            ScoreCategory::Denari => "Denari",
            ScoreCategory::Settebello => "Settebello",
            ScoreCategory::Primiera => "Primiera",
            ScoreCategory::ReBello => "Re Bello",
            ScoreCategory::Napola => "Napola",
        }
    }

    /// Points for a single-winner category; scope are counted separately.
    pub fn award(self) -> u32 {
        match self {
            ScoreCategory::Napola => NAPOLA_POINTS,
            _ => 1,
        }
    }

    pub fn is_enabled(self, rules: &RuleFlags) -> bool {
        match self {
            ScoreCategory::ReBello => rules.re_bello_enabled,
            ScoreCategory::Napola => rules.napola_enabled,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResolution {
    pub state: GameState,
    pub round: RoundResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

pub struct RoundScorer;

impl RoundScorer {
    /// Points and breakdown labels for one entity, in category order.
    pub fn score_entity(
        entity_id: EntityId,
        input: &RoundInput,
        rules: &RuleFlags,
    ) -> (u32, Vec<String>) {
        let mut points: u32 = 0;
        let mut breakdown = Vec::new();

        for category in ScoreCategory::ORDER {
            if !category.is_enabled(rules) {
                continue;
            }
            match category {
                ScoreCategory::Scopa => {
                    let count = input.scopa_counts.get(&entity_id).copied().unwrap_or(0);
                    if count > 0 {
                        points = points.saturating_add(count as u32);
                        breakdown.push(format!("{count} {}", category.label()));
                    }
                }
                _ => {
                    if input.winner_of(category) == Some(entity_id) {
                        points = points.saturating_add(category.award());
                        breakdown.push(category.label().to_string());
                    }
                }
            }
        }

        (points, breakdown)
    }

    pub fn score_round(state: &GameState, input: &RoundInput) -> RoundResolution {
        let mut scores = state.scores.clone();
        let mut details = Vec::new();

        for entity in state.active_entities() {
            let id = entity.id();
            let (points, breakdown) = Self::score_entity(id, input, &state.rules);
            if points == 0 {
                continue;
            }
            let total = scores.entry(id).or_insert(0);
            *total = total.saturating_add(points);
            details.push(RoundDetail {
                entity_id: id,
                entity_name: entity.name().to_string(),
                points,
                breakdown,
            });
        }

        let round = RoundResult {
            round_number: state.round_history.len() as u32 + 1,
            details,
        };

        // 按 id 升序找到第一个达到目标分的参与者；同局多人达标时只记录一个。
        let winner = scores
            .iter()
            .find(|(_, score)| **score >= state.target_score)
            .and_then(|(id, _)| state.entity_name(*id))
            .map(str::to_string);

        let mut round_history = Vec::with_capacity(state.round_history.len() + 1);
        round_history.push(round.clone());
        round_history.extend(state.round_history.iter().cloned());

        let next = GameState {
            scores,
            round_history,
            winner: winner.clone(),
            ..state.clone()
        };

        RoundResolution {
            state: next,
            round,
            winner,
        }
    }
}
