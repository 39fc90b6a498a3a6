use crate::state::codec::decode_label;
use crate::state::roster::Roster;
use lovecast_api::{EpisodePredictions, PredictionItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display labels injected into the history and profile views: prediction
/// type → label, badge name → icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub prediction_types: HashMap<String, String>,
    pub badge_icons: HashMap<String, String>,
    pub default_badge_icon: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let prediction_types = [
            ("season_couple", "Season couple"),
            ("season_final_couple", "Final couple"),
            ("final_zero_vote", "Zero final votes"),
            ("season_popular", "Most popular"),
            ("message_target", "Text message pick"),
            ("like_up", "Rising favourite"),
            ("like_down", "Falling favourite"),
            ("special", "Special question"),
        ];
        let badge_icons = [
            ("연프 촉", "🔮"),
            ("편집 읽는 사람", "🎬"),
            ("역배 전문가", "🎲"),
            ("분석왕", "📊"),
            ("초심자", "🌱"),
            ("열정팬", "🔥"),
        ];
        Self {
            prediction_types: to_map(&prediction_types),
            badge_icons: to_map(&badge_icons),
            default_badge_icon: "🏅".to_owned(),
        }
    }
}

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

impl LabelConfig {
    pub fn prediction_type_label<'a>(&'a self, prediction_type: &'a str) -> &'a str {
        self.prediction_types
            .get(prediction_type)
            .map(String::as_str)
            .unwrap_or(prediction_type)
    }

    pub fn badge_icon(&self, badge_name: &str) -> &str {
        self.badge_icons
            .get(badge_name)
            .unwrap_or(&self.default_badge_icon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryDetailRow {
    pub record_id: u32,
    pub label: String,
    pub value: String,
    pub earned_points: i64,
    pub is_correct: Option<bool>,
}

impl HistoryDetailRow {
    /// `"+N"`, `"-N"`, or empty for zero.
    pub fn points_label(&self) -> String {
        match self.earned_points {
            p if p > 0 => format!("+{p}"),
            p if p < 0 => p.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeHistoryRow {
    pub episode_id: u32,
    pub total_points: i64,
    pub correct_count: usize,
    pub total_count: usize,
    pub details: Vec<HistoryDetailRow>,
}

impl EpisodeHistoryRow {
    pub fn episode_label(&self) -> String {
        format!("EP.{}", self.episode_id)
    }

    pub fn correct_ratio(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        self.correct_count as f64 / self.total_count as f64
    }

    pub fn total_points_label(&self) -> String {
        let sign = if self.total_points >= 0 { "+" } else { "" };
        format!("{sign}{} pt", self.total_points)
    }

    pub fn correct_ratio_label(&self) -> String {
        format!("{}/{}", self.correct_count, self.total_count)
    }
}

/// Turn scored history into display rows. Pure; safe to call on every
/// render.
pub fn aggregate_history(
    episodes: &[EpisodePredictions],
    roster: &Roster,
    catalog: &[PredictionItem],
    labels: &LabelConfig,
) -> Vec<EpisodeHistoryRow> {
    let questions: HashMap<u32, &str> = catalog
        .iter()
        .filter(|item| !item.question_text.trim().is_empty())
        .map(|item| (item.id, item.question_text.as_str()))
        .collect();

    episodes
        .iter()
        .map(|episode| {
            let details: Vec<HistoryDetailRow> = episode
                .predictions
                .iter()
                .map(|record| {
                    let label = record
                        .prediction_item_id
                        .and_then(|id| questions.get(&id).copied())
                        .unwrap_or_else(|| labels.prediction_type_label(&record.prediction_type))
                        .to_owned();
                    HistoryDetailRow {
                        record_id: record.id,
                        label,
                        value: decode_label(&record.encoded_value, roster),
                        earned_points: record.earned_points,
                        is_correct: record.is_correct,
                    }
                })
                .collect();

            EpisodeHistoryRow {
                episode_id: episode.episode_id,
                total_points: episode.predictions.iter().map(|r| r.earned_points).sum(),
                correct_count: episode
                    .predictions
                    .iter()
                    .filter(|r| r.is_correct == Some(true))
                    .count(),
                total_count: episode.predictions.len(),
                details,
            }
        })
        .collect()
}
