pub mod client;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of the backend wire format
// ---------------------------------------------------------------------------

/// One half of the binary contestant partition. `A` is the female side,
/// `B` the male side; pair encodings always emit the `A` id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::A => "female",
            Side::B => "male",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contestant {
    pub id: u32,
    pub name: String,
    pub side: Side,
    pub is_newcomer: bool,
    pub portrait_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Category {
    SeasonCouple,
    FinalZeroVote,
    SeasonPopular,
    MessageTarget,
    LikeUp,
    LikeDown,
    SpecialBinary,
    #[default]
    Other,
}

impl Category {
    /// Parse the backend's category string. `is_special` promotes an
    /// otherwise unscoped item to a yes/no question.
    pub fn from_wire(raw: Option<&str>, is_special: bool) -> Self {
        match raw {
            Some("season_couple") => Category::SeasonCouple,
            Some("final_zero_vote") => Category::FinalZeroVote,
            Some("season_popular") => Category::SeasonPopular,
            Some("message_target") => Category::MessageTarget,
            Some("like_up") => Category::LikeUp,
            Some("like_down") => Category::LikeDown,
            Some("special") => Category::SpecialBinary,
            _ if is_special => Category::SpecialBinary,
            _ => Category::Other,
        }
    }

    pub fn is_pairing(&self) -> bool {
        matches!(self, Category::SeasonCouple | Category::MessageTarget)
    }

    /// Categories whose answer is a single contestant id.
    pub fn is_single_target(&self) -> bool {
        matches!(
            self,
            Category::FinalZeroVote
                | Category::SeasonPopular
                | Category::LikeUp
                | Category::LikeDown
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionItem {
    pub id: u32,
    pub episode_id: Option<u32>,
    pub category: Category,
    pub question_text: String,
    pub odds: Option<f64>,
    pub is_pairing_type: bool,
    pub is_special: bool,
}

/// A committed two-sided match. Field order follows the encoding
/// convention: side A first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommittedPair {
    pub side_a_id: u32,
    pub side_b_id: u32,
}

impl CommittedPair {
    pub fn new(side_a_id: u32, side_b_id: u32) -> Self {
        Self { side_a_id, side_b_id }
    }

    pub fn contains(&self, contestant_id: u32) -> bool {
        self.side_a_id == contestant_id || self.side_b_id == contestant_id
    }
}

/// One encoded answer destined for the episode submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub prediction_item_id: u32,
    pub selected_value: String,
    pub target_participant_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeSummary {
    pub id: u32,
    pub episode_number: u32,
    pub start_time: Option<DateTime<Utc>>,
}

/// Lock/open flags as reported by the backend snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseFlags {
    pub season_pairing_open: bool,
    pub season_pairing_locked: bool,
    pub final_vote_open: bool,
    pub final_vote_locked: bool,
    pub episode_locked: bool,
}

/// An answer the backend already holds for the upcoming episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingAnswer {
    pub prediction_item_id: u32,
    pub selected_value: String,
    pub target_participant_id: Option<u32>,
}

/// One snapshot of the prediction screen, loaded once per episode cycle.
#[derive(Debug, Clone, Default)]
pub struct Overview {
    pub next_episode: Option<EpisodeSummary>,
    pub roster: Vec<Contestant>,
    pub items: Vec<PredictionItem>,
    pub flags: PhaseFlags,
    pub existing_pairs: Vec<CommittedPair>,
    pub existing_answers: Vec<ExistingAnswer>,
    pub final_zero_vote: Option<u32>,
    pub popular_pick: Option<u32>,
}

// ---------------------------------------------------------------------------
// History / profile
// ---------------------------------------------------------------------------

/// A past prediction, already scored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredPredictionRecord {
    pub id: u32,
    pub prediction_item_id: Option<u32>,
    pub prediction_type: String,
    pub encoded_value: String,
    pub target_participant_id: Option<u32>,
    pub betting_points: i64,
    pub is_correct: Option<bool>,
    pub earned_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodePredictions {
    pub episode_id: u32,
    pub predictions: Vec<ScoredPredictionRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub nickname: String,
    pub points: i64,
    pub accuracy_rate: f64,
    pub participated_episodes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub is_owned: bool,
    pub earned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyPoint {
    pub episode_id: u32,
    pub accuracy_rate: f64,
    pub correct_predictions: u32,
    pub total_predictions: u32,
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingEntry {
    pub user_id: u32,
    pub nickname: String,
    pub points: i64,
    pub rank: u32,
    pub primary_badge_icon_url: Option<String>,
    pub primary_badge_name: Option<String>,
}

/// Leaderboard plus the viewer's own row, which may fall outside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    pub me: Option<RankingEntry>,
    pub leaders: Vec<RankingEntry>,
}
