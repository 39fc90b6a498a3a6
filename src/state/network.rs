use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::session::OverviewTicket;
use crate::state::submission::{PredictionBackend, Submission};
use log::{debug, error};
use lovecast_api::client::ApiError;
use tokio::sync::mpsc;

/// Executes backend calls one at a time, in request order. Submissions run
/// to completion; nothing is cancelled.
pub struct NetworkWorker<B> {
    client: B,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl<B: PredictionBackend> NetworkWorker<B> {
    pub fn new(
        client: B,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self { client, requests, responses }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let response = match request {
                NetworkRequest::LoadOverview { ticket } => self.handle_load_overview(ticket).await,
                NetworkRequest::LoadHistory => self.handle_load_history().await,
                NetworkRequest::LoadProfile => self.handle_load_profile().await,
                NetworkRequest::LoadRankings => self.handle_load_rankings().await,
                NetworkRequest::Submit { submission } => self.handle_submit(submission).await,
            };

            debug!("network request complete");
            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_overview(&self, ticket: OverviewTicket) -> NetworkResponse {
        debug!("loading prediction overview");
        match self.client.fetch_overview().await {
            Ok(overview) => NetworkResponse::OverviewLoaded { ticket, overview },
            Err(e) => fetch_error(e, "load predictions"),
        }
    }

    async fn handle_load_history(&self) -> NetworkResponse {
        debug!("loading prediction history");
        match self.client.fetch_history().await {
            Ok(episodes) => NetworkResponse::HistoryLoaded { episodes },
            Err(e) => fetch_error(e, "load your prediction history"),
        }
    }

    async fn handle_load_profile(&self) -> NetworkResponse {
        debug!("loading profile");
        let loaded = tokio::try_join!(
            self.client.fetch_user_summary(),
            self.client.fetch_badges(),
            self.client.fetch_accuracy_trend(),
        );
        match loaded {
            Ok((summary, badges, accuracy)) => {
                NetworkResponse::ProfileLoaded { summary, badges, accuracy }
            }
            Err(e) => fetch_error(e, "load your profile"),
        }
    }

    async fn handle_load_rankings(&self) -> NetworkResponse {
        debug!("loading rankings");
        match self.client.fetch_rankings().await {
            Ok(ranking) => NetworkResponse::RankingsLoaded { ranking },
            Err(e) => fetch_error(e, "load the rankings"),
        }
    }

    async fn handle_submit(&self, submission: Submission) -> NetworkResponse {
        match submission.deliver(&self.client).await {
            Ok(()) => NetworkResponse::Submitted { submission },
            Err(error) => NetworkResponse::SubmitFailed { submission, error },
        }
    }
}

fn fetch_error(e: ApiError, action: &str) -> NetworkResponse {
    error!("fetch failed: {e}");
    NetworkResponse::Error { message: e.user_message(action) }
}
