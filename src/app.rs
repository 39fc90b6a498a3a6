use crate::state::app_settings::AppSettings;
use crate::state::error::SubmitError;
use crate::state::history::{EpisodeHistoryRow, aggregate_history};
use crate::state::messages::NetworkRequest;
use crate::state::phase_gate::Phase;
use crate::state::profile::{RankingBoard, newly_earned, ranking_board};
use crate::state::session::{OverviewTicket, PredictionSession};
use crate::state::submission::{Submission, SubmitOutcome};
use chrono::{DateTime, Utc};
use log::{debug, info};
use lovecast_api::{AccuracyPoint, Badge, EpisodePredictions, Overview, Ranking, UserSummary};

#[derive(Debug, Clone)]
pub struct ProfileState {
    pub summary: UserSummary,
    pub badges: Vec<Badge>,
    pub accuracy: Vec<AccuracyPoint>,
}

pub struct App {
    pub settings: AppSettings,
    pub session: PredictionSession,
    pub history: Vec<EpisodePredictions>,
    pub profile: Option<ProfileState>,
    pub ranking: Option<Ranking>,
    pub last_error: Option<String>,
    /// Newest badge `earned_at` already announced to the user.
    pub badge_seen_at: Option<DateTime<Utc>>,
    pending_confirmation: Option<Submission>,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            session: PredictionSession::new(),
            history: Vec::new(),
            profile: None,
            ranking: None,
            last_error: None,
            badge_seen_at: None,
            pending_confirmation: None,
        }
    }

    /// Issue a fresh overview ticket. Any in-flight fetch is superseded.
    pub fn request_overview(&mut self) -> NetworkRequest {
        NetworkRequest::LoadOverview { ticket: self.session.begin_overview_fetch() }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from the main loop
    // -----------------------------------------------------------------------

    pub fn on_overview_loaded(&mut self, ticket: OverviewTicket, overview: Overview) -> bool {
        let applied = self.session.apply_overview(ticket, overview);
        if applied {
            self.last_error = None;
            // A confirmation prompt built from the previous snapshot may no
            // longer match what the user sees.
            let stale = self
                .pending_confirmation
                .as_ref()
                .is_some_and(|pending| !self.session.can_compose(pending.phase()));
            if stale {
                debug!("dropping stale confirmation");
                self.pending_confirmation = None;
            }
        }
        applied
    }

    pub fn on_history_loaded(&mut self, episodes: Vec<EpisodePredictions>) {
        self.last_error = None;
        self.history = episodes;
    }

    /// Store the profile and return names of badges earned since the last
    /// visit.
    pub fn on_profile_loaded(
        &mut self,
        summary: UserSummary,
        badges: Vec<Badge>,
        accuracy: Vec<AccuracyPoint>,
    ) -> Vec<String> {
        self.last_error = None;
        let (fresh, seen_at) = newly_earned(&badges, self.badge_seen_at);
        let names = fresh.iter().map(|b| b.name.clone()).collect();
        self.badge_seen_at = seen_at;
        self.profile = Some(ProfileState { summary, badges, accuracy });
        names
    }

    pub fn on_rankings_loaded(&mut self, ranking: Ranking) {
        self.last_error = None;
        self.ranking = Some(ranking);
    }

    pub fn on_submitted(&mut self, submission: &Submission) -> String {
        info!("{:?} submission acknowledged", submission.phase());
        self.last_error = None;
        if self.session.apply_submission_success(submission) == SubmitOutcome::Stale {
            return "Episode predictions were saved for an earlier episode".to_owned();
        }
        match submission.phase() {
            Phase::SeasonPairing => "Season couples submitted".to_owned(),
            Phase::FinalVote => "Final vote submitted".to_owned(),
            Phase::Episode => "Episode predictions submitted".to_owned(),
        }
    }

    /// The phase stays editable. A retryable episode batch goes back to
    /// waiting for `confirm` while its episode is still open.
    pub fn on_submit_failed(&mut self, submission: Submission, error: &SubmitError) -> String {
        let message = error.to_string();
        self.last_error = Some(message.clone());
        if error.is_retryable()
            && submission.phase() == Phase::Episode
            && self.session.can_compose(Phase::Episode)
        {
            self.pending_confirmation = Some(submission);
            return format!("{message} Type `confirm` to send them again.");
        }
        message
    }

    pub fn on_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// Returns true on the tick where the episode deadline first passes.
    pub fn on_clock_tick(&mut self, now: DateTime<Utc>) -> bool {
        let was_passed = self.session.gate().deadline_passed();
        self.session.observe_now(now);
        let passed = self.session.gate().deadline_passed();
        if passed && !was_passed {
            info!("episode deadline passed");
            if self
                .pending_confirmation
                .as_ref()
                .is_some_and(|s| s.phase() == Phase::Episode)
            {
                self.pending_confirmation = None;
            }
        }
        passed && !was_passed
    }

    // -----------------------------------------------------------------------
    // Episode confirmation
    // -----------------------------------------------------------------------

    pub fn await_confirmation(&mut self, submission: Submission) {
        self.pending_confirmation = Some(submission);
    }

    pub fn take_pending_confirmation(&mut self) -> Option<Submission> {
        self.pending_confirmation.take()
    }

    pub fn ranking_board(&self) -> Option<RankingBoard> {
        self.ranking
            .as_ref()
            .map(|ranking| ranking_board(ranking, &self.settings.labels))
    }

    pub fn history_rows(&self) -> Vec<EpisodeHistoryRow> {
        aggregate_history(
            &self.history,
            self.session.roster(),
            self.session.items(),
            &self.settings.labels,
        )
    }
}
