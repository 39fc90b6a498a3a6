use crate::state::codec::{CodecVersion, EncodedAnswer, ScalarAnswer};
use crate::state::countdown::Countdown;
use crate::state::error::PreconditionError;
use crate::state::pairing::{PairingBuilder, PendingSelection, SelectOutcome};
use crate::state::phase_gate::{Phase, PhaseGate};
use crate::state::roster::Roster;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use lovecast_api::{Category, CommittedPair, EpisodeSummary, Overview, PredictionItem, Side};
use std::collections::BTreeMap;

/// Identifies one overview fetch. Only the most recently issued ticket may
/// be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OverviewTicket(u64);

/// The two independent pair sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairingContext {
    Season,
    MessageTarget,
}

impl PairingContext {
    pub fn phase(self) -> Phase {
        match self {
            PairingContext::Season => Phase::SeasonPairing,
            PairingContext::MessageTarget => Phase::Episode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalVotePick {
    ZeroVote,
    Popular,
}

/// All prediction state owned by one user session.
#[derive(Debug, Default)]
pub struct PredictionSession {
    pub(crate) roster: Roster,
    pub(crate) items: Vec<PredictionItem>,
    pub(crate) next_episode: Option<EpisodeSummary>,
    pub(crate) gate: PhaseGate,
    pub(crate) season_pairs: PairingBuilder,
    pub(crate) message_pairs: PairingBuilder,
    pub(crate) final_zero_vote: Option<u32>,
    pub(crate) popular_pick: Option<u32>,
    pub(crate) episode_answers: BTreeMap<u32, EncodedAnswer>,
    countdown: Option<Countdown>,
    issued_ticket: u64,
    loaded: bool,
}

impl PredictionSession {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Snapshot boundary
    // -----------------------------------------------------------------------

    pub fn begin_overview_fetch(&mut self) -> OverviewTicket {
        self.issued_ticket += 1;
        OverviewTicket(self.issued_ticket)
    }

    /// Apply a snapshot. Returns false when a newer fetch has been issued
    /// since this one, in which case nothing changes.
    pub fn apply_overview(&mut self, ticket: OverviewTicket, overview: Overview) -> bool {
        if ticket.0 != self.issued_ticket {
            warn!(
                "discarding stale overview (ticket {}, latest {})",
                ticket.0, self.issued_ticket
            );
            return false;
        }

        let incoming_episode = overview.next_episode.as_ref().map(|e| e.id);
        let same_episode =
            self.loaded && self.next_episode.as_ref().map(|e| e.id) == incoming_episode;
        debug!("applying overview for episode {incoming_episode:?} (same cycle: {same_episode})");

        self.roster = Roster::new(overview.roster);
        self.items = overview.items;
        self.next_episode = overview.next_episode;
        self.loaded = true;

        let final_vote_recorded =
            overview.final_zero_vote.is_some() && overview.popular_pick.is_some();
        self.gate.merge_snapshot(
            overview.flags,
            final_vote_recorded,
            self.next_episode.is_some(),
            same_episode,
        );
        if !same_episode {
            self.countdown = None;
        }

        if !overview.existing_pairs.is_empty() || self.gate.is_locked(Phase::SeasonPairing) {
            self.season_pairs.hydrate(overview.existing_pairs);
        }
        if overview.final_zero_vote.is_some() {
            self.final_zero_vote = overview.final_zero_vote;
        }
        if overview.popular_pick.is_some() {
            self.popular_pick = overview.popular_pick;
        }

        if !same_episode {
            self.message_pairs.reset();
            self.episode_answers.clear();
        }
        if !overview.existing_answers.is_empty() {
            self.hydrate_episode_answers(
                overview
                    .existing_answers
                    .iter()
                    .map(|a| (a.prediction_item_id, a.selected_value.as_str())),
            );
        }
        true
    }

    /// Load encoded answers for the current episode: message-target values
    /// become pairs, everything else a scalar answer. Each part replaces
    /// local state only when the input carries values for it.
    pub(crate) fn hydrate_episode_answers<'a>(
        &mut self,
        answers: impl IntoIterator<Item = (u32, &'a str)>,
    ) {
        let message_item = self.item_id_for(Category::MessageTarget);
        let mut pairs = Vec::new();
        let mut scalars = BTreeMap::new();

        for (item_id, value) in answers {
            let parsed = CodecVersion::CURRENT.parse(value);
            if Some(item_id) == message_item {
                match parsed {
                    EncodedAnswer::Pair(pair) => pairs.push(pair),
                    _ => warn!("ignoring malformed message pick {value:?}"),
                }
            } else {
                // Only the message-target item carries pairs.
                let scalar = match parsed {
                    EncodedAnswer::Pair(_) => EncodedAnswer::Raw(value.to_owned()),
                    other => other,
                };
                scalars.insert(item_id, scalar);
            }
        }

        if !pairs.is_empty() {
            self.message_pairs.hydrate(pairs);
        }
        if !scalars.is_empty() {
            self.episode_answers = scalars;
        }
    }

    /// Recompute the countdown from the injected clock's reading. A passed
    /// deadline closes episode composition.
    pub fn observe_now(&mut self, now: DateTime<Utc>) -> Option<Countdown> {
        let target = self.next_episode.as_ref()?.start_time?;
        let countdown = Countdown::remaining(target, now);
        self.gate.observe_deadline(countdown.is_passed());
        self.countdown = Some(countdown);
        Some(countdown)
    }

    // -----------------------------------------------------------------------
    // Read models
    // -----------------------------------------------------------------------

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn items(&self) -> &[PredictionItem] {
        &self.items
    }

    pub fn next_episode(&self) -> Option<&EpisodeSummary> {
        self.next_episode.as_ref()
    }

    pub fn gate(&self) -> &PhaseGate {
        &self.gate
    }

    pub fn pairs(&self, context: PairingContext) -> &[CommittedPair] {
        self.builder(context).pairs()
    }

    pub fn pending(&self, context: PairingContext) -> PendingSelection {
        self.builder(context).pending()
    }

    /// Display string of the countdown; zero until a target is known.
    pub fn countdown_label(&self) -> String {
        self.countdown.unwrap_or(Countdown::ZERO).to_string()
    }

    pub fn final_vote(&self) -> (Option<u32>, Option<u32>) {
        (self.final_zero_vote, self.popular_pick)
    }

    pub fn episode_answer(&self, item_id: u32) -> Option<&EncodedAnswer> {
        self.episode_answers.get(&item_id)
    }

    pub fn can_compose(&self, phase: Phase) -> bool {
        self.gate.can_compose(phase)
    }

    /// Every precondition a submit of `phase` checks before any network
    /// call is made.
    pub fn ensure_submittable(&self, phase: Phase) -> Result<(), PreconditionError> {
        let count = match phase {
            Phase::SeasonPairing => self.season_pairs.pairs().len(),
            Phase::FinalVote => {
                self.gate.ensure_composable(phase)?;
                if self.final_zero_vote.is_none() || self.popular_pick.is_none() {
                    return Err(PreconditionError::FinalVoteIncomplete);
                }
                1
            }
            Phase::Episode => self.episode_batch().len(),
        };
        self.gate.ensure_submittable(phase, count)
    }

    pub fn can_submit(&self, phase: Phase) -> bool {
        self.ensure_submittable(phase).is_ok()
    }

    pub fn item_id_for(&self, category: Category) -> Option<u32> {
        self.items.iter().find(|i| i.category == category).map(|i| i.id)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn select_side(
        &mut self,
        context: PairingContext,
        side: Side,
        contestant_id: u32,
    ) -> Result<SelectOutcome, PreconditionError> {
        self.gate.ensure_composable(context.phase())?;
        if context == PairingContext::MessageTarget
            && self.item_id_for(Category::MessageTarget).is_none()
        {
            return Err(PreconditionError::MissingItem(Category::MessageTarget));
        }
        let contestant = self
            .roster
            .get(contestant_id)
            .ok_or(PreconditionError::UnknownContestant(contestant_id))?;
        if contestant.side != side {
            return Err(PreconditionError::WrongSide { contestant_id, expected: side });
        }
        Ok(self.builder_mut(context).select(side, contestant_id))
    }

    pub fn remove_pair(
        &mut self,
        context: PairingContext,
        pair: CommittedPair,
    ) -> Result<bool, PreconditionError> {
        self.gate.ensure_composable(context.phase())?;
        Ok(self.builder_mut(context).remove(pair))
    }

    pub fn reset_pairs(&mut self, context: PairingContext) -> Result<(), PreconditionError> {
        self.gate.ensure_composable(context.phase())?;
        self.builder_mut(context).reset();
        Ok(())
    }

    /// Set or overwrite the answer to a non-pairing episode item.
    pub fn set_scalar_answer(
        &mut self,
        item_id: u32,
        answer: ScalarAnswer,
    ) -> Result<(), PreconditionError> {
        self.gate.ensure_composable(Phase::Episode)?;
        let item = self
            .items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or(PreconditionError::UnknownItem(item_id))?;
        if item.is_pairing_type {
            return Err(PreconditionError::NotScalarItem(item_id));
        }
        if let ScalarAnswer::Target(id) = answer {
            self.roster.get(id).ok_or(PreconditionError::UnknownContestant(id))?;
        }
        self.episode_answers.insert(item_id, answer.into());
        Ok(())
    }

    pub fn clear_scalar_answer(&mut self, item_id: u32) -> Result<bool, PreconditionError> {
        self.gate.ensure_composable(Phase::Episode)?;
        Ok(self.episode_answers.remove(&item_id).is_some())
    }

    pub fn set_final_vote_pick(
        &mut self,
        pick: FinalVotePick,
        contestant_id: u32,
    ) -> Result<(), PreconditionError> {
        self.gate.ensure_composable(Phase::FinalVote)?;
        self.roster
            .get(contestant_id)
            .ok_or(PreconditionError::UnknownContestant(contestant_id))?;
        match pick {
            FinalVotePick::ZeroVote => self.final_zero_vote = Some(contestant_id),
            FinalVotePick::Popular => self.popular_pick = Some(contestant_id),
        }
        Ok(())
    }

    fn builder(&self, context: PairingContext) -> &PairingBuilder {
        match context {
            PairingContext::Season => &self.season_pairs,
            PairingContext::MessageTarget => &self.message_pairs,
        }
    }

    fn builder_mut(&mut self, context: PairingContext) -> &mut PairingBuilder {
        match context {
            PairingContext::Season => &mut self.season_pairs,
            PairingContext::MessageTarget => &mut self.message_pairs,
        }
    }
}
