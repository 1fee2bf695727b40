use thiserror::Error;

use crate::registry::ParticipantId;

/// Why a guess was not evaluated. Never reported back to the guesser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessRejection {
    NoActiveRound,
    FromDrawer,
    NoSecretWord,
    UnknownGuesser,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("participant {0} is already registered")]
    DuplicateIdentity(ParticipantId),
    #[error("participant {0} is not registered")]
    UnknownParticipant(ParticipantId),
    #[error("need at least {required} participants, have {present}")]
    InsufficientParticipants { present: usize, required: usize },
    #[error("guess ignored: {0:?}")]
    InvalidGuessContext(GuessRejection),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to create transport: {0}")]
    Transport(#[from] std::io::Error),
    #[error("netcode transport failed: {0}")]
    Netcode(#[from] renet_netcode::NetcodeTransportError),
    #[error("system time is before unix epoch")]
    Clock(#[from] std::time::SystemTimeError),
}
