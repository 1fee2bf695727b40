use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

pub const NEED_MORE_PLAYERS_MESSAGE: &str = "Need at least 2 players to start";
pub const NOT_ENOUGH_PLAYERS_MESSAGE: &str = "Not enough players to continue";
pub const ALREADY_JOINED_MESSAGE: &str = "You have already joined a room.";

/// Generation token of a round; every `NewRound` carries a larger one than the last.
pub type RoundId = u64;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParticipantView {
    pub user_id: u64,
    pub username: String,
    pub score: u32,
    pub is_drawing: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum ServerMessage {
    Welcome {
        user_id: u64,
        username: String,
        room: String,
    },
    JoinRejected {
        message: String,
    },
    UserList {
        participants: Vec<ParticipantView>,
    },
    UserJoined {
        username: String,
        user_id: u64,
    },
    UserLeft {
        username: String,
        user_id: u64,
    },
    ClearCanvas,
    YouAreDrawing {
        word: String,
    },
    NewRound {
        round: RoundId,
        drawer: String,
        scores: Vec<ParticipantView>,
    },
    TimerUpdate {
        round: RoundId,
        seconds_remaining: u32,
    },
    CorrectGuess {
        guesser: String,
        word: String,
        scores: Vec<ParticipantView>,
    },
    RoundEnded {
        word: String,
        scores: Vec<ParticipantView>,
    },
    GameError {
        message: String,
    },
}

impl ServerMessage {
    pub fn variant_name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum ClientMessage {
    /// A blank room joins the default room.
    Join { display_name: String, room: String },
    StartGame,
    SubmitGuess(String),
    Leave,
}

pub fn version() -> u64 {
    env!("CARGO_PKG_VERSION")
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
        .unwrap_or(0)
}
