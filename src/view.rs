use crate::app::ProfileState;
use crate::state::codec::{CodecVersion, EncodedAnswer, decode_label};
use crate::state::history::{EpisodeHistoryRow, LabelConfig};
use crate::state::phase_gate::Phase;
use crate::state::profile::{BadgeVisual, RankingBoard, RankingRow, accuracy_series, badge_shelf};
use crate::state::roster::Roster;
use crate::state::session::{PairingContext, PredictionSession};
use lovecast_api::{CommittedPair, Side};
use std::fmt::Write;

pub fn pair_label(pair: CommittedPair, roster: &Roster) -> String {
    decode_label(&CodecVersion::CURRENT.encode(&EncodedAnswer::Pair(pair)), roster)
}

fn phase_badge(session: &PredictionSession, phase: Phase) -> &'static str {
    let gate = session.gate();
    if gate.is_locked(phase) {
        "locked"
    } else if !gate.is_open(phase) {
        "not open"
    } else if session.can_submit(phase) {
        "open, ready to submit"
    } else {
        "open"
    }
}

fn contestant_label(session: &PredictionSession, id: Option<u32>) -> String {
    match id {
        Some(id) => session
            .roster()
            .name_of(id)
            .map(str::to_owned)
            .unwrap_or_else(|| id.to_string()),
        None => "-".to_owned(),
    }
}

fn write_pairs(out: &mut String, session: &PredictionSession, context: PairingContext) {
    let roster = session.roster();
    let pairs = session.pairs(context);
    if pairs.is_empty() {
        out.push_str("    (no pairs)\n");
    }
    for pair in pairs {
        let _ = writeln!(
            out,
            "    {} [{} {}]",
            pair_label(*pair, roster),
            pair.side_a_id,
            pair.side_b_id
        );
    }
    let pending = session.pending(context);
    if !pending.is_empty() {
        let _ = writeln!(
            out,
            "    pending: {} / {}",
            contestant_label(session, pending.get(Side::A)),
            contestant_label(session, pending.get(Side::B))
        );
    }
}

/// Full prediction board for the current snapshot.
pub fn render_status(session: &PredictionSession) -> String {
    let mut out = String::new();
    match session.next_episode() {
        Some(episode) => {
            let _ = writeln!(
                out,
                "EP.{}  closes in {}",
                episode.episode_number,
                session.countdown_label()
            );
        }
        None => out.push_str("No upcoming episode\n"),
    }

    out.push_str("\nContestants\n");
    for side in [Side::A, Side::B] {
        let names: Vec<String> = session
            .roster()
            .side(side)
            .map(|c| format!("{} {}", c.id, c.name))
            .collect();
        if !names.is_empty() {
            let _ = writeln!(out, "  {:<7} {}", side.label(), names.join(", "));
        }
    }

    let _ = writeln!(out, "\nSeason couples [{}]", phase_badge(session, Phase::SeasonPairing));
    write_pairs(&mut out, session, PairingContext::Season);

    let (zero_vote, popular) = session.final_vote();
    let _ = writeln!(out, "\nFinal vote [{}]", phase_badge(session, Phase::FinalVote));
    let _ = writeln!(out, "    zero-vote: {}", contestant_label(session, zero_vote));
    let _ = writeln!(out, "    most popular: {}", contestant_label(session, popular));

    let _ = writeln!(out, "\nEpisode predictions [{}]", phase_badge(session, Phase::Episode));
    for item in session.items() {
        let _ = writeln!(out, "  [{}] {}", item.id, item.question_text);
        if item.is_pairing_type {
            write_pairs(&mut out, session, PairingContext::MessageTarget);
        } else {
            let answer = session
                .episode_answer(item.id)
                .map(|a| decode_label(&CodecVersion::CURRENT.encode(a), session.roster()))
                .unwrap_or_else(|| "-".to_owned());
            let _ = writeln!(out, "    answer: {answer}");
        }
    }
    out
}

pub fn render_history(rows: &[EpisodeHistoryRow]) -> String {
    if rows.is_empty() {
        return "No scored predictions yet".to_owned();
    }
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(
            out,
            "{}  {}  correct {} ({:.0}%)",
            row.episode_label(),
            row.total_points_label(),
            row.correct_ratio_label(),
            row.correct_ratio() * 100.0
        );
        for detail in &row.details {
            let mark = match detail.is_correct {
                Some(true) => "✓",
                Some(false) => "✗",
                None => "·",
            };
            let _ = writeln!(
                out,
                "  {mark} {}: {} {}",
                detail.label,
                detail.value,
                detail.points_label()
            );
        }
    }
    out.trim_end().to_owned()
}

pub fn render_profile(profile: &ProfileState, labels: &LabelConfig) -> String {
    let mut out = String::new();
    let summary = &profile.summary;
    let _ = writeln!(
        out,
        "{}  {} pt  accuracy {:.1}%  episodes {}",
        summary.nickname, summary.points, summary.accuracy_rate, summary.participated_episodes
    );

    let shelf = badge_shelf(&profile.badges, labels);
    if !shelf.is_empty() {
        out.push_str("\nBadges\n");
        for badge in shelf {
            let owned = if badge.is_owned { "" } else { " (locked)" };
            let _ = writeln!(out, "  {} {}{owned}", badge.icon, badge.name);
        }
    }

    let series = accuracy_series(&profile.accuracy);
    if !series.is_empty() {
        out.push_str("\nAccuracy\n");
        for (label, rate) in series {
            let _ = writeln!(out, "  {label:<6} {rate:>5.1}%");
        }
    }
    out.trim_end().to_owned()
}

fn ranking_line(out: &mut String, row: &RankingRow) {
    let medal = match row.rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "  ",
    };
    let me = if row.is_me { "  (you)" } else { "" };
    let _ = match &row.badge {
        BadgeVisual::Icon(icon) => writeln!(
            out,
            "{medal} {:>3}. {icon} {}  {} pt{me}",
            row.rank, row.nickname, row.points
        ),
        BadgeVisual::Image(url) => writeln!(
            out,
            "{medal} {:>3}. {}  {} pt{me}  <{url}>",
            row.rank, row.nickname, row.points
        ),
    };
}

/// Leaderboard with medals for the podium, then the viewer's own standing
/// when it falls outside the listed leaders.
pub fn render_rankings(board: &RankingBoard) -> String {
    if board.leaders.is_empty() && board.me.is_none() {
        return "No rankings yet".to_owned();
    }
    let mut out = String::from("Rankings\n");
    for row in &board.leaders {
        ranking_line(&mut out, row);
    }
    if let Some(me) = board.me.as_ref().filter(|_| !board.leaders.iter().any(|r| r.is_me)) {
        out.push_str("  ...\n");
        ranking_line(&mut out, me);
    }
    out.trim_end().to_owned()
}

pub fn help_text() -> &'static str {
    "\
pick season|msg f|m <id>   select one side of a pair
unpair season|msg <a> <b>  remove a committed pair
reset season|msg           clear every pair on a board
answer <item> <id>|yes|no  answer an episode question
clear <item>               remove an episode answer
final zero|popular <id>    set a final vote pick
submit season|final|episode
confirm                    send the episode predictions
refresh | history | profile | rankings | status | help | quit"
}
