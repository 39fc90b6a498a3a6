use crate::state::error::PreconditionError;
use log::debug;
use lovecast_api::PhaseFlags;

/// The three independently gated prediction windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    SeasonPairing,
    FinalVote,
    Episode,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::SeasonPairing => "Season couple",
            Phase::FinalVote => "Final vote",
            Phase::Episode => "Episode",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseLockState {
    pub season_pairing_open: bool,
    pub season_pairing_locked: bool,
    pub final_vote_open: bool,
    pub final_vote_locked: bool,
    pub episode_locked: bool,
}

impl From<PhaseFlags> for PhaseLockState {
    fn from(flags: PhaseFlags) -> Self {
        Self {
            season_pairing_open: flags.season_pairing_open,
            season_pairing_locked: flags.season_pairing_locked,
            final_vote_open: flags.final_vote_open,
            final_vote_locked: flags.final_vote_locked,
            episode_locked: flags.episode_locked,
        }
    }
}

/// Transition applied after the backend acknowledged a submission.
pub fn apply_lock_on_success(phase: Phase, state: PhaseLockState) -> PhaseLockState {
    match phase {
        Phase::SeasonPairing => PhaseLockState { season_pairing_locked: true, ..state },
        Phase::FinalVote => PhaseLockState { final_vote_locked: true, ..state },
        Phase::Episode => PhaseLockState { episode_locked: true, ..state },
    }
}

/// Decides whether each phase accepts new answers. Locks are one-way: no
/// operation here ever clears a locked flag within one episode cycle.
#[derive(Debug, Clone, Default)]
pub struct PhaseGate {
    state: PhaseLockState,
    /// Both final-vote values are already known, which counts as a lock
    /// even when the explicit flag is stale.
    final_vote_recorded: bool,
    episode_available: bool,
    deadline_passed: bool,
}

impl PhaseGate {
    pub fn is_locked(&self, phase: Phase) -> bool {
        match phase {
            Phase::SeasonPairing => self.state.season_pairing_locked,
            Phase::FinalVote => self.state.final_vote_locked || self.final_vote_recorded,
            Phase::Episode => self.state.episode_locked || self.deadline_passed,
        }
    }

    pub fn is_open(&self, phase: Phase) -> bool {
        match phase {
            Phase::SeasonPairing => self.state.season_pairing_open,
            Phase::FinalVote => self.state.final_vote_open,
            Phase::Episode => self.episode_available,
        }
    }

    pub fn can_compose(&self, phase: Phase) -> bool {
        self.is_open(phase) && !self.is_locked(phase)
    }

    /// Composable and carrying at least one answer.
    pub fn ensure_submittable(
        &self,
        phase: Phase,
        answer_count: usize,
    ) -> Result<(), PreconditionError> {
        self.ensure_composable(phase)?;
        if answer_count == 0 {
            return Err(PreconditionError::NothingToSubmit(phase));
        }
        Ok(())
    }

    /// Gate for every composition entry point.
    pub fn ensure_composable(&self, phase: Phase) -> Result<(), PreconditionError> {
        if self.is_locked(phase) {
            return Err(PreconditionError::PhaseLocked(phase));
        }
        if !self.is_open(phase) {
            return Err(PreconditionError::PhaseNotOpen(phase));
        }
        Ok(())
    }

    pub fn lock(&mut self, phase: Phase) {
        debug!("locking {phase:?} phase");
        self.state = apply_lock_on_success(phase, self.state);
    }

    pub fn mark_final_vote_recorded(&mut self) {
        self.final_vote_recorded = true;
    }

    /// Merge a fresh snapshot. Locked flags only ever turn on, except that a
    /// new episode cycle starts from the snapshot's episode flag.
    pub fn merge_snapshot(
        &mut self,
        flags: PhaseFlags,
        final_vote_recorded: bool,
        episode_available: bool,
        same_episode: bool,
    ) {
        let incoming = PhaseLockState::from(flags);
        self.state = PhaseLockState {
            season_pairing_open: incoming.season_pairing_open,
            season_pairing_locked: self.state.season_pairing_locked
                || incoming.season_pairing_locked,
            final_vote_open: incoming.final_vote_open,
            final_vote_locked: self.state.final_vote_locked || incoming.final_vote_locked,
            episode_locked: if same_episode {
                self.state.episode_locked || incoming.episode_locked
            } else {
                incoming.episode_locked
            },
        };
        self.final_vote_recorded |= final_vote_recorded;
        self.episode_available = episode_available;
        if !same_episode {
            self.deadline_passed = false;
        }
    }

    /// Once the countdown reaches zero the episode is treated as locked
    /// until the next episode cycle.
    pub fn observe_deadline(&mut self, passed: bool) {
        if passed && !self.deadline_passed {
            debug!("episode deadline passed, composition closed");
        }
        self.deadline_passed |= passed;
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline_passed
    }
}
