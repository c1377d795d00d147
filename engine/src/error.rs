use thiserror::Error;

use crate::actor::ActorId;
use crate::checks::CheckId;
use crate::injury::InjuryId;
use crate::quarrel::QuarrelId;

/// Errors surfaced to the host. None of them is fatal; each one means the
/// operation left actor state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("actor '{0}' not found")]
    MissingActor(ActorId),
    #[error("quarrel {0} not found")]
    MissingPendingData(QuarrelId),
    #[error("unknown hit location '{0}'")]
    InvalidLocation(String),
    #[error("insufficient {resource}: needed {needed}, available {available}")]
    InsufficientResource {
        resource: &'static str,
        needed: i32,
        available: i32,
    },
    #[error("check {0} has already been resolved")]
    CheckAlreadyResolved(CheckId),
    #[error("check {0} is not on display")]
    UnknownCheck(CheckId),
    #[error("injury {0} not found on actor '{1}'")]
    MissingInjury(InjuryId, ActorId),
    #[error("injury severity {0} outside 1..=10")]
    InvalidSeverity(i32),
    #[error("hit location of quarrel {0} was already changed")]
    AlreadyRelocated(QuarrelId),
}
