use crate::commands::Command;
use crate::state::session::OverviewTicket;
use crate::state::error::SubmitError;
use crate::state::submission::Submission;
use lovecast_api::{AccuracyPoint, Badge, EpisodePredictions, Overview, Ranking, UserSummary};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadOverview { ticket: OverviewTicket },
    LoadHistory,
    LoadProfile,
    LoadRankings,
    Submit { submission: Submission },
}

#[derive(Debug)]
pub enum NetworkResponse {
    OverviewLoaded { ticket: OverviewTicket, overview: Overview },
    HistoryLoaded { episodes: Vec<EpisodePredictions> },
    ProfileLoaded {
        summary: UserSummary,
        badges: Vec<Badge>,
        accuracy: Vec<AccuracyPoint>,
    },
    RankingsLoaded { ranking: Ranking },
    /// The backend acknowledged; the lock may now be applied.
    Submitted { submission: Submission },
    SubmitFailed { submission: Submission, error: SubmitError },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    AppStarted,
    Command(Command),
    InvalidInput(String),
    ClockTick,
    RefreshDue,
    InputClosed,
}
