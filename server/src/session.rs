use std::time::Instant;

use tracing::{debug, info, trace, warn};

use common::protocol::{
    NEED_MORE_PLAYERS_MESSAGE, NOT_ENOUGH_PLAYERS_MESSAGE, RoundId, ServerMessage,
};

use crate::{
    clock::{ClockEvent, RoundClock},
    config::GameSettings,
    error::{GuessRejection, SessionError},
    registry::{Participant, ParticipantId, ParticipantRegistry},
    words::{WordList, is_correct_guess},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    /// The round has concluded and a restart is scheduled after the grace delay.
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    All,
    Only(ParticipantId),
    AllExcept(ParticipantId),
}

/// A notification with its recipients resolved at the moment it was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub recipients: Vec<ParticipantId>,
    pub message: ServerMessage,
}

#[derive(Debug)]
struct Round {
    id: RoundId,
    drawer: ParticipantId,
    word: String,
    clock: RoundClock,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledRestart {
    round: RoundId,
    due: Instant,
}

/// One running game: its participants, at most one round, and the timers of
/// that round. Every method runs on the server loop's thread, so transitions
/// are applied one at a time in arrival order.
///
/// `generation` is bumped whenever a round starts or is aborted. A scheduled
/// restart remembers the generation it was scheduled in and is dropped if the
/// session has moved on by the time it comes due.
pub struct Session {
    room: String,
    settings: GameSettings,
    words: WordList,
    registry: ParticipantRegistry,
    phase: Phase,
    round: Option<Round>,
    previous_drawer: Option<ParticipantId>,
    generation: RoundId,
    restart: Option<ScheduledRestart>,
    outbox: Vec<Delivery>,
}

impl Session {
    pub fn new(room: &str, settings: GameSettings, words: WordList) -> Self {
        Self {
            room: room.to_string(),
            settings,
            words,
            registry: ParticipantRegistry::new(),
            phase: Phase::Idle,
            round: None,
            previous_drawer: None,
            generation: 0,
            restart: None,
            outbox: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Id of the current round, if one is active or ending.
    pub fn current_round(&self) -> Option<RoundId> {
        self.round.as_ref().map(|round| round.id)
    }

    pub fn drawer(&self) -> Option<ParticipantId> {
        self.round.as_ref().map(|round| round.drawer)
    }

    pub fn clock_running(&self) -> bool {
        self.round
            .as_ref()
            .is_some_and(|round| round.clock.is_running())
    }

    pub fn restart_due_at(&self) -> Option<Instant> {
        self.restart.map(|restart| restart.due)
    }

    pub fn join(
        &mut self,
        id: ParticipantId,
        display_name: &str,
    ) -> Result<Participant, SessionError> {
        let participant = self.registry.join(id, display_name)?;
        info!(room = %self.room, participant = %id, name = display_name, "participant joined");

        self.emit(
            Audience::Only(id),
            ServerMessage::Welcome {
                user_id: id.0,
                username: participant.display_name.clone(),
                room: self.room.clone(),
            },
        );
        self.emit(
            Audience::AllExcept(id),
            ServerMessage::UserJoined {
                username: participant.display_name.clone(),
                user_id: id.0,
            },
        );
        self.broadcast_user_list();

        if self.phase == Phase::Active {
            self.catch_up(id);
        }

        Ok(participant)
    }

    /// Removes the participant. Unknown ids are ignored.
    pub fn leave(&mut self, id: ParticipantId, now: Instant) -> Option<Participant> {
        let Some(participant) = self.registry.leave(id) else {
            debug!(room = %self.room, participant = %id, "leave for unknown participant ignored");
            return None;
        };
        info!(room = %self.room, participant = %id, "participant left");

        self.emit(
            Audience::All,
            ServerMessage::UserLeft {
                username: participant.display_name.clone(),
                user_id: id.0,
            },
        );

        let drawer_left = self.phase == Phase::Active && self.drawer() == Some(id);

        if self.registry.len() < self.settings.min_participants && self.phase != Phase::Idle {
            self.abort();
        } else if drawer_left {
            info!(room = %self.room, "drawer left mid-round");
            if let Some(round) = self.round.as_mut() {
                round.clock.cancel();
            }
            self.phase = Phase::Ending;
            self.schedule_restart(now);
        }

        self.broadcast_user_list();
        Some(participant)
    }

    /// Starts the first round. Ignored while a round is already under way.
    pub fn start_game(
        &mut self,
        requester: ParticipantId,
        now: Instant,
    ) -> Result<(), SessionError> {
        if !self.registry.contains(requester) {
            return Err(SessionError::UnknownParticipant(requester));
        }

        if self.phase != Phase::Idle {
            debug!(room = %self.room, participant = %requester, "game already in progress");
            return Ok(());
        }

        self.start_round(now).map(|_| ())
    }

    /// Returns whether the guess was correct. Guesses outside an active round,
    /// from the drawer, or from strangers are rejected with `InvalidGuessContext`.
    pub fn submit_guess(
        &mut self,
        id: ParticipantId,
        text: &str,
        now: Instant,
    ) -> Result<bool, SessionError> {
        // A guess arriving after the deadline loses to the expiry.
        self.advance_clock(now);

        let rejection = |reason| SessionError::InvalidGuessContext(reason);

        if self.phase != Phase::Active {
            return Err(rejection(GuessRejection::NoActiveRound));
        }
        let round = self
            .round
            .as_mut()
            .ok_or(rejection(GuessRejection::NoActiveRound))?;
        if !self.registry.contains(id) {
            return Err(rejection(GuessRejection::UnknownGuesser));
        }
        if round.drawer == id {
            return Err(rejection(GuessRejection::FromDrawer));
        }
        if round.word.is_empty() {
            return Err(rejection(GuessRejection::NoSecretWord));
        }

        if !is_correct_guess(text, &round.word) {
            trace!(room = %self.room, participant = %id, "incorrect guess");
            return Ok(false);
        }

        round.clock.cancel();
        let drawer = round.drawer;
        let word = round.word.clone();
        self.phase = Phase::Ending;

        self.registry
            .apply_score_delta(id, i64::from(self.settings.guesser_reward))?;
        if let Err(err) = self
            .registry
            .apply_score_delta(drawer, i64::from(self.settings.drawer_reward))
        {
            warn!(room = %self.room, %err, "drawer missing when awarding points");
        }

        let guesser = self
            .registry
            .get(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_default();
        info!(room = %self.room, participant = %id, %word, "correct guess");

        self.emit(
            Audience::All,
            ServerMessage::CorrectGuess {
                guesser,
                word,
                scores: self.registry.snapshot(),
            },
        );
        self.broadcast_user_list();
        self.schedule_restart(now);

        Ok(true)
    }

    /// Delivers due clock ticks and fires a due restart.
    pub fn poll(&mut self, now: Instant) {
        self.advance_clock(now);

        let Some(restart) = self.restart else {
            return;
        };
        if now < restart.due {
            return;
        }
        self.restart = None;

        if restart.round != self.generation {
            debug!(room = %self.room, round = restart.round, "stale restart ignored");
            return;
        }

        if let Err(err) = self.start_round(now) {
            info!(room = %self.room, %err, "next round not started");
        }
    }

    pub fn drain_outbox(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.outbox)
    }

    fn start_round(&mut self, now: Instant) -> Result<RoundId, SessionError> {
        self.generation += 1;
        self.restart = None;
        if let Some(mut old) = self.round.take() {
            old.clock.cancel();
        }
        self.registry.clear_drawing();

        let present = self.registry.len();
        let required = self.settings.min_participants;
        let drawer = match next_drawer(self.registry.all(), self.previous_drawer) {
            Some(drawer) if present >= required => drawer,
            _ => {
                self.phase = Phase::Idle;
                self.emit(
                    Audience::All,
                    ServerMessage::GameError {
                        message: NEED_MORE_PLAYERS_MESSAGE.to_string(),
                    },
                );
                self.broadcast_user_list();
                return Err(SessionError::InsufficientParticipants { present, required });
            }
        };

        self.registry.set_drawing(drawer, true)?;
        let word = self.words.choose().to_string();
        let id = self.generation;

        self.round = Some(Round {
            id,
            drawer,
            word: word.clone(),
            clock: RoundClock::start(self.settings.round_secs, now),
        });
        self.previous_drawer = Some(drawer);
        self.phase = Phase::Active;
        info!(room = %self.room, round = id, drawer = %drawer, "round started");

        self.emit(Audience::All, ServerMessage::ClearCanvas);
        self.emit(Audience::Only(drawer), ServerMessage::YouAreDrawing { word });
        let message = self.new_round_message();
        if let Some(message) = message {
            self.emit(Audience::All, message);
        }
        self.advance_clock(now);

        Ok(id)
    }

    fn advance_clock(&mut self, now: Instant) {
        if self.phase != Phase::Active {
            return;
        }
        let Some(round) = self.round.as_mut() else {
            return;
        };

        let id = round.id;
        for event in round.clock.poll(now) {
            match event {
                ClockEvent::Tick(seconds_remaining) => self.emit(
                    Audience::All,
                    ServerMessage::TimerUpdate {
                        round: id,
                        seconds_remaining,
                    },
                ),
                ClockEvent::Expired => self.finish_on_expiry(now),
            }
        }
    }

    fn finish_on_expiry(&mut self, now: Instant) {
        let word = self
            .round
            .as_ref()
            .map(|round| round.word.clone())
            .unwrap_or_default();
        info!(room = %self.room, %word, "round timed out");

        self.phase = Phase::Ending;
        self.emit(
            Audience::All,
            ServerMessage::RoundEnded {
                word,
                scores: self.registry.snapshot(),
            },
        );
        self.schedule_restart(now);
    }

    /// Drops the round and any pending restart when too few participants remain.
    fn abort(&mut self) {
        info!(room = %self.room, "not enough participants, returning to idle");
        self.generation += 1;
        self.restart = None;
        if let Some(mut round) = self.round.take() {
            round.clock.cancel();
        }
        self.registry.clear_drawing();
        self.phase = Phase::Idle;
        self.emit(
            Audience::All,
            ServerMessage::GameError {
                message: NOT_ENOUGH_PLAYERS_MESSAGE.to_string(),
            },
        );
    }

    fn schedule_restart(&mut self, now: Instant) {
        self.restart = Some(ScheduledRestart {
            round: self.generation,
            due: now + self.settings.grace_delay,
        });
    }

    /// Brings a participant who joined mid-round up to date, without the word.
    fn catch_up(&mut self, id: ParticipantId) {
        let Some(message) = self.new_round_message() else {
            return;
        };
        self.emit(Audience::Only(id), message);

        if let Some(round) = self.round.as_ref() {
            let message = ServerMessage::TimerUpdate {
                round: round.id,
                seconds_remaining: round.clock.remaining_secs(),
            };
            self.emit(Audience::Only(id), message);
        }
    }

    fn new_round_message(&self) -> Option<ServerMessage> {
        let round = self.round.as_ref()?;
        let drawer = self.registry.get(round.drawer)?;
        Some(ServerMessage::NewRound {
            round: round.id,
            drawer: drawer.display_name.clone(),
            scores: self.registry.snapshot(),
        })
    }

    fn broadcast_user_list(&mut self) {
        let participants = self.registry.snapshot();
        self.emit(Audience::All, ServerMessage::UserList { participants });
    }

    fn emit(&mut self, audience: Audience, message: ServerMessage) {
        let recipients: Vec<ParticipantId> = self
            .registry
            .all()
            .iter()
            .map(|p| p.id)
            .filter(|&id| match audience {
                Audience::All => true,
                Audience::Only(target) => id == target,
                Audience::AllExcept(excluded) => id != excluded,
            })
            .collect();

        if recipients.is_empty() {
            return;
        }
        self.outbox.push(Delivery {
            recipients,
            message,
        });
    }
}

/// Round-robin in join order, starting after the previous drawer. If the
/// previous drawer has left, rotation restarts from the first participant.
pub fn next_drawer(
    participants: &[Participant],
    previous: Option<ParticipantId>,
) -> Option<ParticipantId> {
    if participants.is_empty() {
        return None;
    }

    let index = previous
        .and_then(|prev| participants.iter().position(|p| p.id == prev))
        .map(|i| (i + 1) % participants.len())
        .unwrap_or(0);

    Some(participants[index].id)
}
