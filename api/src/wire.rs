/// Backend raw wire types — serde shapes for the prediction service's JSON.
/// These map to the clean domain types in lib.rs via the mapping functions
/// in client.rs.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Overview  (GET /predictions/overview)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct OverviewResponse {
    pub next_episode: Option<WireEpisode>,
    #[serde(default)]
    pub season_start_open: bool,
    #[serde(default)]
    pub season_final_vote_open: bool,
    #[serde(default)]
    pub season_couples_locked: bool,
    #[serde(default)]
    pub season_final_vote_locked: Option<bool>,
    #[serde(default)]
    pub season_couples: Vec<WirePair>,
    pub episode_predictions_locked: Option<bool>,
    #[serde(default)]
    pub participants: Vec<WireParticipant>,
    #[serde(default)]
    pub episode_items: Vec<WireItem>,
    pub episode_answers: Option<Vec<WireAnswer>>,
    pub season_final_zero_vote: Option<u32>,
    pub season_popular_one: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireEpisode {
    pub id: u32,
    #[serde(default)]
    pub episode_number: u32,
    pub start_time: Option<String>, // ISO 8601
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct WirePair {
    pub female_id: u32,
    pub male_id: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireParticipant {
    pub id: u32,
    pub name: String,
    pub image_url: Option<String>,
    pub gender: Option<String>,
    pub is_newcomer: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireItem {
    pub id: u32,
    pub episode_id: Option<u32>,
    pub category: Option<String>,
    pub question_text: String,
    pub odds: Option<f64>,
    #[serde(default)]
    pub is_multiple_choice: bool,
    pub scope: Option<String>,
    #[serde(default)]
    pub is_special: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct WireAnswer {
    pub prediction_item_id: u32,
    pub selected_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_participant_id: Option<u32>,
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SeasonCouplesRequest<'a> {
    pub pairs: &'a [WirePair],
}

#[derive(Debug, Serialize)]
pub struct SeasonFinalRequest {
    pub final_zero_vote_participant_id: u32,
    pub season_popular_participant_id: u32,
}

#[derive(Debug, Serialize)]
pub struct EpisodeAnswersRequest<'a> {
    pub episode_id: u32,
    pub answers: &'a [WireAnswer],
}

// ---------------------------------------------------------------------------
// Profile  (GET /users/me/...)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PredictionHistoryResponse {
    #[serde(default)]
    pub episodes: Vec<WireEpisodePredictions>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireEpisodePredictions {
    pub episode_id: u32,
    #[serde(default)]
    pub predictions: Vec<WireScoredPrediction>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireScoredPrediction {
    pub id: u32,
    pub prediction_item_id: Option<u32>,
    pub prediction_type: String,
    pub target_participant_id: Option<u32>,
    pub selected_value: String,
    #[serde(default)]
    pub betting_points: i64,
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub earned_points: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserSummaryResponse {
    pub nickname: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub accuracy_rate: f64,
    #[serde(default)]
    pub participated_episodes: u32,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct BadgeCollectionResponse {
    #[serde(default)]
    pub badges: Vec<WireBadge>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireBadge {
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    #[serde(default)]
    pub is_owned: bool,
    pub earned_at: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AccuracyTrendResponse {
    #[serde(default)]
    pub points: Vec<WireAccuracyPoint>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireAccuracyPoint {
    pub episode_id: u32,
    #[serde(default)]
    pub accuracy_rate: f64,
    #[serde(default)]
    pub correct_predictions: u32,
    #[serde(default)]
    pub total_predictions: u32,
}

// ---------------------------------------------------------------------------
// Rankings  (GET /rankings)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RankingResponse {
    pub me: Option<WireRankingEntry>,
    #[serde(default)]
    pub leaders: Vec<WireRankingEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WireRankingEntry {
    pub user_id: u32,
    pub nickname: String,
    #[serde(default)]
    pub points: i64,
    pub rank: u32,
    pub primary_badge_icon_url: Option<String>,
    pub primary_badge_name: Option<String>,
}
