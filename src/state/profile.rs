use crate::state::history::LabelConfig;
use chrono::{DateTime, Utc};
use lovecast_api::{AccuracyPoint, Badge, Ranking, RankingEntry};

/// Owned badges earned after the caller's "seen at" marker, plus the marker
/// to persist next. The marker itself is held by the presentation layer.
pub fn newly_earned(
    badges: &[Badge],
    seen_at: Option<DateTime<Utc>>,
) -> (Vec<&Badge>, Option<DateTime<Utc>>) {
    let fresh: Vec<&Badge> = badges
        .iter()
        .filter(|b| b.is_owned)
        .filter(|b| match (b.earned_at, seen_at) {
            (Some(earned), Some(seen)) => earned > seen,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .collect();

    let latest = badges
        .iter()
        .filter(|b| b.is_owned)
        .filter_map(|b| b.earned_at)
        .max();
    let next_seen = match (seen_at, latest) {
        (Some(seen), Some(latest)) => Some(seen.max(latest)),
        (seen, latest) => seen.or(latest),
    };

    (fresh, next_seen)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadgeView {
    pub name: String,
    pub icon: String,
    pub is_owned: bool,
}

pub fn badge_shelf(badges: &[Badge], labels: &LabelConfig) -> Vec<BadgeView> {
    badges
        .iter()
        .map(|b| BadgeView {
            name: b.name.clone(),
            icon: labels.badge_icon(&b.name).to_owned(),
            is_owned: b.is_owned,
        })
        .collect()
}

/// `(EP.<id>, accuracy rate)` points for the accuracy chart.
pub fn accuracy_series(points: &[AccuracyPoint]) -> Vec<(String, f64)> {
    points
        .iter()
        .map(|p| (format!("EP.{}", p.episode_id), p.accuracy_rate))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeVisual {
    Image(String),
    Icon(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRow {
    pub rank: u32,
    pub nickname: String,
    pub points: i64,
    pub badge: BadgeVisual,
    pub is_me: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingBoard {
    pub me: Option<RankingRow>,
    pub leaders: Vec<RankingRow>,
}

/// The backend's badge image wins; otherwise the badge name is looked up in
/// the icon table, and a badge-less entry gets the default icon.
fn badge_visual(entry: &RankingEntry, labels: &LabelConfig) -> BadgeVisual {
    if let Some(url) = &entry.primary_badge_icon_url {
        return BadgeVisual::Image(url.clone());
    }
    let icon = match &entry.primary_badge_name {
        Some(name) => labels.badge_icon(name),
        None => &labels.default_badge_icon,
    };
    BadgeVisual::Icon(icon.to_owned())
}

pub fn ranking_board(ranking: &Ranking, labels: &LabelConfig) -> RankingBoard {
    let my_id = ranking.me.as_ref().map(|me| me.user_id);
    let row = |entry: &RankingEntry| RankingRow {
        rank: entry.rank,
        nickname: entry.nickname.clone(),
        points: entry.points,
        badge: badge_visual(entry, labels),
        is_me: Some(entry.user_id) == my_id,
    };
    let mut leaders: Vec<RankingRow> = ranking.leaders.iter().map(row).collect();
    leaders.sort_by_key(|r| r.rank);
    RankingBoard { me: ranking.me.as_ref().map(row), leaders }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn badge(id: u32, name: &str, owned: bool, earned_day: Option<u32>) -> Badge {
        Badge {
            id,
            name: name.to_owned(),
            description: None,
            icon_url: None,
            is_owned: owned,
            earned_at: earned_day.map(|d| Utc.with_ymd_and_hms(2026, 10, d, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn only_badges_after_marker_are_new() {
        let badges = vec![
            badge(1, "초심자", true, Some(1)),
            badge(2, "분석왕", true, Some(10)),
            badge(3, "열정팬", false, None),
        ];
        let seen = Utc.with_ymd_and_hms(2026, 10, 5, 0, 0, 0).unwrap();
        let (fresh, next) = newly_earned(&badges, Some(seen));
        assert_eq!(fresh.iter().map(|b| b.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(next, badges[1].earned_at);

        let (fresh, next_again) = newly_earned(&badges, next);
        assert!(fresh.is_empty());
        assert_eq!(next_again, next);
    }

    #[test]
    fn first_visit_reports_every_owned_badge() {
        let badges = vec![badge(1, "초심자", true, Some(1)), badge(2, "x", true, None)];
        let (fresh, next) = newly_earned(&badges, None);
        assert_eq!(fresh.len(), 1);
        assert_eq!(next, badges[0].earned_at);
    }

    #[test]
    fn shelf_resolves_icons_through_config() {
        let badges = [badge(1, "초심자", true, None), badge(2, "Mystery", false, None)];
        let shelf = badge_shelf(&badges, &LabelConfig::default());
        assert_eq!(shelf[0].icon, "🌱");
        assert_eq!(shelf[1].icon, "🏅");
        assert!(!shelf[1].is_owned);
    }

    #[test]
    fn accuracy_series_labels_episodes() {
        let series = accuracy_series(&[AccuracyPoint {
            episode_id: 3,
            accuracy_rate: 62.5,
            correct_predictions: 5,
            total_predictions: 8,
        }]);
        assert_eq!(series, vec![("EP.3".to_owned(), 62.5)]);
    }

    fn entry(user_id: u32, rank: u32, url: Option<&str>, name: Option<&str>) -> RankingEntry {
        RankingEntry {
            user_id,
            nickname: format!("user{user_id}"),
            points: 1000 - i64::from(rank) * 10,
            rank,
            primary_badge_icon_url: url.map(str::to_owned),
            primary_badge_name: name.map(str::to_owned),
        }
    }

    #[test]
    fn ranking_badges_prefer_image_then_icon_table() {
        let ranking = Ranking {
            me: Some(entry(9, 2, None, Some("분석왕"))),
            leaders: vec![
                entry(9, 2, None, Some("분석왕")),
                entry(4, 1, Some("https://cdn.example/1.png"), Some("분석왕")),
                entry(5, 3, None, None),
                entry(6, 4, None, Some("Mystery")),
            ],
        };
        let board = ranking_board(&ranking, &LabelConfig::default());

        let ranks: Vec<u32> = board.leaders.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert_eq!(
            board.leaders[0].badge,
            BadgeVisual::Image("https://cdn.example/1.png".to_owned())
        );
        assert_eq!(board.leaders[1].badge, BadgeVisual::Icon("📊".to_owned()));
        assert_eq!(board.leaders[2].badge, BadgeVisual::Icon("🏅".to_owned()));
        assert_eq!(board.leaders[3].badge, BadgeVisual::Icon("🏅".to_owned()));
        assert!(board.leaders[1].is_me);
        assert!(!board.leaders[0].is_me);
        assert_eq!(board.me.map(|me| me.rank), Some(2));
    }

    #[test]
    fn empty_ranking_has_no_rows() {
        let board = ranking_board(&Ranking::default(), &LabelConfig::default());
        assert_eq!(board, RankingBoard::default());
    }
}
