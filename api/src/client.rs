use crate::wire::{
    AccuracyTrendResponse, BadgeCollectionResponse, EpisodeAnswersRequest, OverviewResponse,
    PredictionHistoryResponse, RankingResponse, SeasonCouplesRequest, SeasonFinalRequest,
    UserSummaryResponse, WireAnswer, WireBadge, WireItem, WirePair, WireParticipant,
    WireRankingEntry, WireScoredPrediction,
};
use crate::{
    AccuracyPoint, AnswerRecord, Badge, Category, CommittedPair, Contestant, EpisodePredictions,
    EpisodeSummary, ExistingAnswer, Overview, PhaseFlags, PredictionItem, Ranking, RankingEntry,
    ScoredPredictionRecord, Side, UserSummary,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Prediction backend client. Authentication is issued elsewhere; this
/// client only forwards the bearer token it is given.
#[derive(Debug, Clone)]
pub struct LovecastApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl Default for LovecastApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("lovecast/0.1 (prediction companion)")
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_BACKEND_URL.to_owned(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status of a rejected request, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api(e, _) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short retryable message suitable for showing to the user.
    pub fn user_message(&self, action: &str) -> String {
        match self {
            ApiError::Network(..) => {
                format!("Couldn't reach the server while trying to {action}. Please try again.")
            }
            ApiError::Api(..) if self.status() == Some(401) => {
                format!("Your session has expired. Sign in again to {action}.")
            }
            _ => format!("Failed to {action}. Please try again."),
        }
    }
}

impl LovecastApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of the current prediction cycle.
    pub async fn fetch_overview(&self) -> ApiResult<Overview> {
        let raw: OverviewResponse = self.get("/predictions/overview").await?;
        Ok(map_overview(raw))
    }

    pub async fn post_season_pairs(&self, pairs: &[CommittedPair]) -> ApiResult<()> {
        let pairs: Vec<WirePair> = pairs.iter().map(|p| to_wire_pair(*p)).collect();
        self.post("/predictions/season-couples", &SeasonCouplesRequest { pairs: &pairs })
            .await
    }

    pub async fn post_final_vote(&self, zero_vote_id: u32, popular_id: u32) -> ApiResult<()> {
        let body = SeasonFinalRequest {
            final_zero_vote_participant_id: zero_vote_id,
            season_popular_participant_id: popular_id,
        };
        self.post("/predictions/season-final", &body).await
    }

    pub async fn post_episode_answers(
        &self,
        episode_id: u32,
        answers: &[AnswerRecord],
    ) -> ApiResult<()> {
        let answers: Vec<WireAnswer> = answers
            .iter()
            .map(|a| WireAnswer {
                prediction_item_id: a.prediction_item_id,
                selected_value: a.selected_value.clone(),
                target_participant_id: a.target_participant_id,
            })
            .collect();
        let body = EpisodeAnswersRequest { episode_id, answers: &answers };
        self.post("/predictions/episode", &body).await
    }

    /// Past predictions grouped by episode, already scored.
    pub async fn fetch_history(&self) -> ApiResult<Vec<EpisodePredictions>> {
        let raw: PredictionHistoryResponse = self.get("/users/me/predictions").await?;
        Ok(raw
            .episodes
            .into_iter()
            .map(|e| EpisodePredictions {
                episode_id: e.episode_id,
                predictions: e.predictions.into_iter().map(map_scored_prediction).collect(),
            })
            .collect())
    }

    pub async fn fetch_user_summary(&self) -> ApiResult<UserSummary> {
        let raw: UserSummaryResponse = self.get("/users/me").await?;
        Ok(UserSummary {
            nickname: raw.nickname,
            points: raw.points,
            accuracy_rate: raw.accuracy_rate,
            participated_episodes: raw.participated_episodes,
        })
    }

    pub async fn fetch_badges(&self) -> ApiResult<Vec<Badge>> {
        let raw: BadgeCollectionResponse = self.get("/users/me/badges").await?;
        Ok(raw.badges.into_iter().map(map_badge).collect())
    }

    pub async fn fetch_accuracy_trend(&self) -> ApiResult<Vec<AccuracyPoint>> {
        let raw: AccuracyTrendResponse = self.get("/users/me/stats/accuracy").await?;
        Ok(raw
            .points
            .into_iter()
            .map(|p| AccuracyPoint {
                episode_id: p.episode_id,
                accuracy_rate: p.accuracy_rate,
                correct_predictions: p.correct_predictions,
                total_predictions: p.total_predictions,
            })
            .collect())
    }

    /// Points leaderboard with the viewer's own standing.
    pub async fn fetch_rankings(&self) -> ApiResult<Ranking> {
        let raw: RankingResponse = self.get("/rankings").await?;
        Ok(Ranking {
            me: raw.me.map(map_ranking_entry),
            leaders: raw.leaders.into_iter().map(map_ranking_entry).collect(),
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url).timeout(self.timeout);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");
        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        response
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.clone()))?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url))
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let url = format!("{}{path}", self.base_url);
        debug!("POST {url}");
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        response
            .error_for_status()
            .map(|_| ())
            .map_err(|e| ApiError::Api(e, url))
    }
}

// ---------------------------------------------------------------------------
// Mapping: backend wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_overview(raw: OverviewResponse) -> Overview {
    let flags = PhaseFlags {
        season_pairing_open: raw.season_start_open,
        season_pairing_locked: raw.season_couples_locked,
        final_vote_open: raw.season_final_vote_open,
        final_vote_locked: raw.season_final_vote_locked.unwrap_or(false),
        episode_locked: raw.episode_predictions_locked.unwrap_or(false),
    };

    Overview {
        next_episode: raw.next_episode.map(|e| EpisodeSummary {
            id: e.id,
            episode_number: e.episode_number,
            start_time: e.start_time.as_deref().and_then(parse_timestamp),
        }),
        roster: raw.participants.into_iter().filter_map(map_participant).collect(),
        items: raw.episode_items.into_iter().map(map_item).collect(),
        flags,
        existing_pairs: raw.season_couples.into_iter().map(from_wire_pair).collect(),
        existing_answers: raw
            .episode_answers
            .unwrap_or_default()
            .into_iter()
            .map(|a| ExistingAnswer {
                prediction_item_id: a.prediction_item_id,
                selected_value: a.selected_value,
                target_participant_id: a.target_participant_id,
            })
            .collect(),
        final_zero_vote: raw.season_final_zero_vote,
        popular_pick: raw.season_popular_one,
    }
}

/// Contestants outside the two-sided partition cannot be paired or picked.
fn map_participant(p: WireParticipant) -> Option<Contestant> {
    let side = match p.gender.as_deref() {
        Some("female") => Side::A,
        Some("male") => Side::B,
        other => {
            debug!("dropping participant {} with gender {other:?}", p.id);
            return None;
        }
    };
    Some(Contestant {
        id: p.id,
        name: p.name,
        side,
        is_newcomer: p.is_newcomer.unwrap_or(false),
        portrait_ref: p.image_url.filter(|u| !u.is_empty()),
    })
}

fn map_item(item: WireItem) -> PredictionItem {
    let category = Category::from_wire(item.category.as_deref(), item.is_special);
    PredictionItem {
        id: item.id,
        episode_id: item.episode_id,
        category,
        question_text: item.question_text,
        odds: item.odds,
        is_pairing_type: category.is_pairing(),
        is_special: item.is_special,
    }
}

fn map_scored_prediction(p: WireScoredPrediction) -> ScoredPredictionRecord {
    ScoredPredictionRecord {
        id: p.id,
        prediction_item_id: p.prediction_item_id,
        prediction_type: p.prediction_type,
        encoded_value: p.selected_value,
        target_participant_id: p.target_participant_id,
        betting_points: p.betting_points,
        is_correct: p.is_correct,
        earned_points: p.earned_points,
    }
}

fn map_badge(b: WireBadge) -> Badge {
    Badge {
        id: b.id,
        name: b.name,
        description: b.description,
        icon_url: b.icon_url,
        is_owned: b.is_owned,
        earned_at: b.earned_at.as_deref().and_then(parse_timestamp),
    }
}

fn map_ranking_entry(e: WireRankingEntry) -> RankingEntry {
    RankingEntry {
        user_id: e.user_id,
        nickname: e.nickname,
        points: e.points,
        rank: e.rank,
        primary_badge_icon_url: e.primary_badge_icon_url.filter(|url| !url.trim().is_empty()),
        primary_badge_name: e.primary_badge_name,
    }
}

fn to_wire_pair(p: CommittedPair) -> WirePair {
    WirePair { female_id: p.side_a_id, male_id: p.side_b_id }
}

fn from_wire_pair(p: WirePair) -> CommittedPair {
    CommittedPair::new(p.female_id, p.male_id)
}

/// RFC 3339 first; zone-less timestamps are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
