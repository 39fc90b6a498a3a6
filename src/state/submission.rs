use crate::state::codec::{CodecVersion, EncodedAnswer};
use crate::state::error::{PreconditionError, SubmitError};
use crate::state::phase_gate::Phase;
use crate::state::session::PredictionSession;
use log::{debug, error, warn};
use lovecast_api::client::{ApiResult, LovecastApi};
use lovecast_api::{
    AccuracyPoint, AnswerRecord, Badge, Category, CommittedPair, EpisodePredictions, Overview,
    Ranking, UserSummary,
};
use std::collections::BTreeMap;
use std::future::Future;

/// Everything the core consumes from the backend. Each call resolves
/// exactly once.
pub trait PredictionBackend {
    fn fetch_overview(&self) -> impl Future<Output = ApiResult<Overview>> + Send;
    fn post_season_pairs(
        &self,
        pairs: &[CommittedPair],
    ) -> impl Future<Output = ApiResult<()>> + Send;
    fn post_final_vote(
        &self,
        zero_vote_id: u32,
        popular_id: u32,
    ) -> impl Future<Output = ApiResult<()>> + Send;
    fn post_episode_answers(
        &self,
        episode_id: u32,
        answers: &[AnswerRecord],
    ) -> impl Future<Output = ApiResult<()>> + Send;
    fn fetch_history(&self) -> impl Future<Output = ApiResult<Vec<EpisodePredictions>>> + Send;
    fn fetch_user_summary(&self) -> impl Future<Output = ApiResult<UserSummary>> + Send;
    fn fetch_badges(&self) -> impl Future<Output = ApiResult<Vec<Badge>>> + Send;
    fn fetch_accuracy_trend(&self) -> impl Future<Output = ApiResult<Vec<AccuracyPoint>>> + Send;
    fn fetch_rankings(&self) -> impl Future<Output = ApiResult<Ranking>> + Send;
}

impl PredictionBackend for LovecastApi {
    fn fetch_overview(&self) -> impl Future<Output = ApiResult<Overview>> + Send {
        LovecastApi::fetch_overview(self)
    }

    fn post_season_pairs(
        &self,
        pairs: &[CommittedPair],
    ) -> impl Future<Output = ApiResult<()>> + Send {
        LovecastApi::post_season_pairs(self, pairs)
    }

    fn post_final_vote(
        &self,
        zero_vote_id: u32,
        popular_id: u32,
    ) -> impl Future<Output = ApiResult<()>> + Send {
        LovecastApi::post_final_vote(self, zero_vote_id, popular_id)
    }

    fn post_episode_answers(
        &self,
        episode_id: u32,
        answers: &[AnswerRecord],
    ) -> impl Future<Output = ApiResult<()>> + Send {
        LovecastApi::post_episode_answers(self, episode_id, answers)
    }

    fn fetch_history(&self) -> impl Future<Output = ApiResult<Vec<EpisodePredictions>>> + Send {
        LovecastApi::fetch_history(self)
    }

    fn fetch_user_summary(&self) -> impl Future<Output = ApiResult<UserSummary>> + Send {
        LovecastApi::fetch_user_summary(self)
    }

    fn fetch_badges(&self) -> impl Future<Output = ApiResult<Vec<Badge>>> + Send {
        LovecastApi::fetch_badges(self)
    }

    fn fetch_accuracy_trend(&self) -> impl Future<Output = ApiResult<Vec<AccuracyPoint>>> + Send {
        LovecastApi::fetch_accuracy_trend(self)
    }

    fn fetch_rankings(&self) -> impl Future<Output = ApiResult<Ranking>> + Send {
        LovecastApi::fetch_rankings(self)
    }
}

/// A fully encoded batch for one phase, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    SeasonPairs { pairs: Vec<CommittedPair> },
    FinalVote { zero_vote_id: u32, popular_id: u32 },
    EpisodeAnswers { episode_id: u32, answers: Vec<AnswerRecord> },
}

impl Submission {
    pub fn phase(&self) -> Phase {
        match self {
            Submission::SeasonPairs { .. } => Phase::SeasonPairing,
            Submission::FinalVote { .. } => Phase::FinalVote,
            Submission::EpisodeAnswers { .. } => Phase::Episode,
        }
    }

    /// Verb phrase used in user-facing failure messages.
    pub fn action(&self) -> &'static str {
        match self {
            Submission::SeasonPairs { .. } => "submit your season couples",
            Submission::FinalVote { .. } => "submit your final vote",
            Submission::EpisodeAnswers { .. } => "submit your episode predictions",
        }
    }

    pub async fn send<B: PredictionBackend>(&self, backend: &B) -> ApiResult<()> {
        debug!("sending {:?} submission", self.phase());
        match self {
            Submission::SeasonPairs { pairs } => backend.post_season_pairs(pairs).await,
            Submission::FinalVote { zero_vote_id, popular_id } => {
                backend.post_final_vote(*zero_vote_id, *popular_id).await
            }
            Submission::EpisodeAnswers { episode_id, answers } => {
                backend.post_episode_answers(*episode_id, answers).await
            }
        }
    }

    /// Send and turn a transport failure into the error shown to the user.
    /// Local state is not touched either way.
    pub async fn deliver<B: PredictionBackend>(&self, backend: &B) -> Result<(), SubmitError> {
        self.send(backend).await.map_err(|source| {
            error!("{:?} submission failed: {source}", self.phase());
            SubmitError::backend(self.action(), source)
        })
    }
}

/// What an acknowledgment did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// The acknowledged batch belongs to an episode that is no longer
    /// current; nothing was hydrated or locked.
    Stale,
}

/// Scalar answers first (by item id), then one record per message pair.
pub fn merge_episode_batch(
    scalar_answers: &BTreeMap<u32, EncodedAnswer>,
    message_item_id: Option<u32>,
    pairs: &[CommittedPair],
) -> Vec<AnswerRecord> {
    let codec = CodecVersion::CURRENT;
    let mut batch: Vec<AnswerRecord> = scalar_answers
        .iter()
        .map(|(item_id, answer)| codec.record(*item_id, answer))
        .collect();
    if let Some(item_id) = message_item_id {
        batch.extend(
            pairs
                .iter()
                .map(|pair| codec.record(item_id, &EncodedAnswer::Pair(*pair))),
        );
    }
    batch
}

impl PredictionSession {
    pub fn episode_batch(&self) -> Vec<AnswerRecord> {
        merge_episode_batch(
            &self.episode_answers,
            self.item_id_for(Category::MessageTarget),
            self.message_pairs.pairs(),
        )
    }

    pub fn prepare_season_pairs(&self) -> Result<Submission, SubmitError> {
        self.ensure_submittable(Phase::SeasonPairing)?;
        Ok(Submission::SeasonPairs { pairs: self.season_pairs.pairs().to_vec() })
    }

    pub fn prepare_final_vote(&self) -> Result<Submission, SubmitError> {
        self.ensure_submittable(Phase::FinalVote)?;
        let (Some(zero_vote_id), Some(popular_id)) = (self.final_zero_vote, self.popular_pick)
        else {
            return Err(PreconditionError::FinalVoteIncomplete.into());
        };
        Ok(Submission::FinalVote { zero_vote_id, popular_id })
    }

    /// `Ok(None)` when there is nothing to send.
    pub fn prepare_episode_answers(&self) -> Result<Option<Submission>, SubmitError> {
        match self.ensure_submittable(Phase::Episode) {
            Ok(()) => {}
            Err(PreconditionError::NothingToSubmit(_)) => {
                debug!("episode batch empty, not submitting");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }
        let Some(episode) = self.next_episode.as_ref() else {
            return Err(PreconditionError::PhaseNotOpen(Phase::Episode).into());
        };
        let answers = self.episode_batch();
        Ok(Some(Submission::EpisodeAnswers { episode_id: episode.id, answers }))
    }

    /// Local transition after the backend acknowledged `submission`. The
    /// submitted values become the committed state of the now-locked phase.
    /// An episode batch only applies while its episode is still current.
    pub fn apply_submission_success(&mut self, submission: &Submission) -> SubmitOutcome {
        match submission {
            Submission::SeasonPairs { pairs } => {
                self.season_pairs.hydrate(pairs.iter().copied());
            }
            Submission::FinalVote { zero_vote_id, popular_id } => {
                self.final_zero_vote = Some(*zero_vote_id);
                self.popular_pick = Some(*popular_id);
                self.gate.mark_final_vote_recorded();
            }
            Submission::EpisodeAnswers { episode_id, answers } => {
                let current = self.next_episode.as_ref().map(|e| e.id);
                if current != Some(*episode_id) {
                    warn!(
                        "acknowledgment for episode {episode_id} arrived while episode {current:?} \
                         is current, ignoring"
                    );
                    return SubmitOutcome::Stale;
                }
                self.hydrate_episode_answers(
                    answers
                        .iter()
                        .map(|a| (a.prediction_item_id, a.selected_value.as_str())),
                );
            }
        }
        self.gate.lock(submission.phase());
        SubmitOutcome::Submitted
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state::codec::ScalarAnswer;
    use crate::state::pairing::SelectOutcome;
    use crate::state::session::tests::{loaded_session, overview};
    use crate::state::session::{FinalVotePick, PairingContext};
    use lovecast_api::Side;
    use lovecast_api::client::ApiError;
    use std::sync::{Arc, Mutex};

    /// In-memory backend recording every call.
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub fail: bool,
        pub calls: Arc<Mutex<Vec<Submission>>>,
        pub overview: Mutex<Option<Overview>>,
        pub history: Vec<EpisodePredictions>,
        pub ranking: Ranking,
    }

    impl FakeBackend {
        pub(crate) fn failing() -> Self {
            Self { fail: true, ..Default::default() }
        }

        pub(crate) fn calls(&self) -> Vec<Submission> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, submission: Submission) -> ApiResult<()> {
            self.calls.lock().unwrap().push(submission);
            if self.fail {
                Err(ApiError::Other("backend unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    impl PredictionBackend for FakeBackend {
        async fn fetch_overview(&self) -> ApiResult<Overview> {
            self.overview
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ApiError::NotFound("no overview".into()))
        }

        async fn post_season_pairs(&self, pairs: &[CommittedPair]) -> ApiResult<()> {
            self.record(Submission::SeasonPairs { pairs: pairs.to_vec() })
        }

        async fn post_final_vote(&self, zero_vote_id: u32, popular_id: u32) -> ApiResult<()> {
            self.record(Submission::FinalVote { zero_vote_id, popular_id })
        }

        async fn post_episode_answers(
            &self,
            episode_id: u32,
            answers: &[AnswerRecord],
        ) -> ApiResult<()> {
            self.record(Submission::EpisodeAnswers { episode_id, answers: answers.to_vec() })
        }

        async fn fetch_history(&self) -> ApiResult<Vec<EpisodePredictions>> {
            Ok(self.history.clone())
        }

        async fn fetch_user_summary(&self) -> ApiResult<UserSummary> {
            Ok(UserSummary {
                nickname: "fan".into(),
                points: 120,
                accuracy_rate: 50.0,
                participated_episodes: 2,
            })
        }

        async fn fetch_badges(&self) -> ApiResult<Vec<Badge>> {
            Ok(Vec::new())
        }

        async fn fetch_accuracy_trend(&self) -> ApiResult<Vec<AccuracyPoint>> {
            Ok(Vec::new())
        }

        async fn fetch_rankings(&self) -> ApiResult<Ranking> {
            Ok(self.ranking.clone())
        }
    }

    fn pair_up(session: &mut PredictionSession, ctx: PairingContext, a: u32, b: u32) {
        session.select_side(ctx, Side::A, a).unwrap();
        assert!(matches!(session.select_side(ctx, Side::B, b), Ok(SelectOutcome::Committed(_))));
    }

    /// Same steps the network worker and `App` take: deliver, then apply
    /// the acknowledgment.
    async fn deliver_and_apply(
        session: &mut PredictionSession,
        backend: &FakeBackend,
        submission: Submission,
    ) -> Result<SubmitOutcome, SubmitError> {
        submission.deliver(backend).await?;
        Ok(session.apply_submission_success(&submission))
    }

    #[tokio::test]
    async fn season_pairs_lock_after_acknowledgement() {
        let mut session = loaded_session();
        pair_up(&mut session, PairingContext::Season, 1, 2);
        let backend = FakeBackend::default();

        let submission = session.prepare_season_pairs().unwrap();
        let outcome = deliver_and_apply(&mut session, &backend, submission).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Submitted);
        assert_eq!(
            backend.calls(),
            vec![Submission::SeasonPairs { pairs: vec![CommittedPair::new(1, 2)] }]
        );
        assert!(session.gate().is_locked(Phase::SeasonPairing));
        assert_eq!(
            session.remove_pair(PairingContext::Season, CommittedPair::new(1, 2)),
            Err(PreconditionError::PhaseLocked(Phase::SeasonPairing))
        );
    }

    #[tokio::test]
    async fn failed_season_submission_changes_nothing() {
        let mut session = loaded_session();
        pair_up(&mut session, PairingContext::Season, 1, 2);
        let backend = FakeBackend::failing();

        let submission = session.prepare_season_pairs().unwrap();
        let err = deliver_and_apply(&mut session, &backend, submission).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("season couples"));
        assert!(!session.gate().is_locked(Phase::SeasonPairing));
        assert_eq!(session.pairs(PairingContext::Season), &[CommittedPair::new(1, 2)]);
        assert!(session.can_submit(Phase::SeasonPairing));
    }

    #[test]
    fn empty_season_set_is_rejected_locally() {
        let session = loaded_session();
        let err = session.prepare_season_pairs().unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Precondition(PreconditionError::NothingToSubmit(Phase::SeasonPairing))
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn final_vote_requires_both_picks_then_records_them() {
        let mut session = loaded_session();
        let backend = FakeBackend::default();
        session.set_final_vote_pick(FinalVotePick::ZeroVote, 3).unwrap();
        let err = session.prepare_final_vote().unwrap_err();
        assert!(matches!(err, SubmitError::Precondition(PreconditionError::FinalVoteIncomplete)));

        session.set_final_vote_pick(FinalVotePick::Popular, 2).unwrap();
        let submission = session.prepare_final_vote().unwrap();
        deliver_and_apply(&mut session, &backend, submission).await.unwrap();
        assert_eq!(backend.calls(), vec![Submission::FinalVote { zero_vote_id: 3, popular_id: 2 }]);
        assert_eq!(session.final_vote(), (Some(3), Some(2)));
        assert!(session.gate().is_locked(Phase::FinalVote));
    }

    #[tokio::test]
    async fn episode_batch_merges_scalars_and_pairs() {
        let mut session = loaded_session();
        session.set_scalar_answer(12, ScalarAnswer::Binary(true)).unwrap();
        session.set_scalar_answer(11, ScalarAnswer::Target(4)).unwrap();
        pair_up(&mut session, PairingContext::MessageTarget, 1, 2);
        pair_up(&mut session, PairingContext::MessageTarget, 3, 4);
        let backend = FakeBackend::default();

        let submission = session.prepare_episode_answers().unwrap().unwrap();
        deliver_and_apply(&mut session, &backend, submission).await.unwrap();
        let record = |id, value: &str, target| AnswerRecord {
            prediction_item_id: id,
            selected_value: value.to_owned(),
            target_participant_id: target,
        };
        assert_eq!(
            backend.calls(),
            vec![Submission::EpisodeAnswers {
                episode_id: 5,
                answers: vec![
                    record(11, "4", None),
                    record(12, "yes", None),
                    record(10, "1:2", Some(2)),
                    record(10, "3:4", Some(4)),
                ],
            }]
        );
        assert!(session.gate().is_locked(Phase::Episode));
        assert_eq!(
            session.set_scalar_answer(11, ScalarAnswer::Target(2)),
            Err(PreconditionError::PhaseLocked(Phase::Episode))
        );
    }

    #[test]
    fn empty_episode_batch_is_a_silent_no_op() {
        let session = loaded_session();
        assert_eq!(session.prepare_episode_answers().unwrap(), None);
        assert!(session.can_compose(Phase::Episode));
        assert!(!session.can_submit(Phase::Episode));
    }

    #[test]
    fn locked_episode_rejects_before_network() {
        let mut snapshot = overview();
        snapshot.flags.episode_locked = true;
        let mut session = PredictionSession::new();
        let ticket = session.begin_overview_fetch();
        session.apply_overview(ticket, snapshot);
        let err = session.prepare_episode_answers().unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Precondition(PreconditionError::PhaseLocked(Phase::Episode))
        ));
    }

    #[tokio::test]
    async fn failed_episode_submission_can_be_retried() {
        let mut session = loaded_session();
        session.set_scalar_answer(12, ScalarAnswer::Binary(false)).unwrap();
        let submission = session.prepare_episode_answers().unwrap().unwrap();
        let failing = FakeBackend::failing();
        let err = deliver_and_apply(&mut session, &failing, submission.clone()).await;
        assert!(err.is_err());
        assert!(session.can_submit(Phase::Episode));

        let backend = FakeBackend::default();
        let outcome = deliver_and_apply(&mut session, &backend, submission).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Submitted);
    }

    #[test]
    fn late_acknowledgment_for_previous_episode_is_dropped() {
        let mut session = loaded_session();
        session.set_scalar_answer(11, ScalarAnswer::Target(2)).unwrap();
        let submission = session.prepare_episode_answers().unwrap().unwrap();

        let mut next = overview();
        next.next_episode = next.next_episode.map(|mut episode| {
            episode.id = 6;
            episode.episode_number += 1;
            episode
        });
        let ticket = session.begin_overview_fetch();
        assert!(session.apply_overview(ticket, next));

        assert_eq!(session.apply_submission_success(&submission), SubmitOutcome::Stale);
        assert!(session.can_compose(Phase::Episode));
        assert_eq!(session.episode_answer(11), None);
    }

    #[test]
    fn success_transition_without_network() {
        let mut session = loaded_session();
        let submission = Submission::SeasonPairs {
            pairs: vec![CommittedPair::new(1, 2), CommittedPair::new(3, 2)],
        };
        assert_eq!(session.apply_submission_success(&submission), SubmitOutcome::Submitted);
        assert!(session.gate().is_locked(Phase::SeasonPairing));
        assert_eq!(session.pairs(PairingContext::Season), &[CommittedPair::new(1, 2)]);
    }

    #[test]
    fn merge_without_message_item_drops_pairs() {
        let mut scalars = BTreeMap::new();
        scalars.insert(11, EncodedAnswer::Target(2));
        let batch = merge_episode_batch(&scalars, None, &[CommittedPair::new(1, 2)]);
        assert_eq!(batch.len(), 1);
        assert!(merge_episode_batch(&BTreeMap::new(), Some(10), &[]).is_empty());
    }
}
