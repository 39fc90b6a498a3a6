use crate::state::phase_gate::Phase;
use lovecast_api::client::ApiError;
use lovecast_api::{Category, Side};
use std::fmt;

/// A command was issued against state that does not allow it. These are
/// caught locally and never reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    PhaseLocked(Phase),
    PhaseNotOpen(Phase),
    NothingToSubmit(Phase),
    FinalVoteIncomplete,
    UnknownContestant(u32),
    WrongSide { contestant_id: u32, expected: Side },
    UnknownItem(u32),
    MissingItem(Category),
    NotScalarItem(u32),
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreconditionError::PhaseLocked(phase) => {
                write!(f, "{} predictions are locked", phase.label())
            }
            PreconditionError::PhaseNotOpen(phase) => {
                write!(f, "{} predictions are not open yet", phase.label())
            }
            PreconditionError::NothingToSubmit(phase) => {
                write!(f, "nothing to submit for {} predictions", phase.label())
            }
            PreconditionError::FinalVoteIncomplete => {
                write!(f, "pick both the final zero-vote and the most popular contestant")
            }
            PreconditionError::UnknownContestant(id) => write!(f, "no contestant with id {id}"),
            PreconditionError::WrongSide { contestant_id, expected } => {
                write!(f, "contestant {contestant_id} is not on the {} side", expected.label())
            }
            PreconditionError::UnknownItem(id) => write!(f, "no prediction item with id {id}"),
            PreconditionError::MissingItem(category) => {
                write!(f, "this episode has no {category:?} prediction")
            }
            PreconditionError::NotScalarItem(id) => {
                write!(f, "prediction item {id} takes a pairing, not a single answer")
            }
        }
    }
}

impl std::error::Error for PreconditionError {}

#[derive(Debug)]
pub enum SubmitError {
    Precondition(PreconditionError),
    /// The backend did not acknowledge; local state is untouched and the
    /// user may retry.
    Backend { message: String, source: ApiError },
}

impl SubmitError {
    /// Wrap a transport failure with the message shown for `action`.
    pub fn backend(action: &str, source: ApiError) -> Self {
        SubmitError::Backend { message: source.user_message(action), source }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Backend { .. })
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Precondition(e) => write!(f, "{e}"),
            SubmitError::Backend { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Precondition(e) => Some(e),
            SubmitError::Backend { source, .. } => Some(source),
        }
    }
}

impl From<PreconditionError> for SubmitError {
    fn from(e: PreconditionError) -> Self {
        SubmitError::Precondition(e)
    }
}
