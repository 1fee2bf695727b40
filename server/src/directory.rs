use std::{collections::HashMap, time::Instant};

use tracing::info;

use crate::{
    config::GameSettings,
    error::SessionError,
    registry::{Participant, ParticipantId},
    session::{Delivery, Session},
    words::WordList,
};

/// Independent sessions keyed by room code. A room is created by its first
/// join and closed as soon as its last participant leaves.
pub struct SessionDirectory {
    settings: GameSettings,
    words: WordList,
    sessions: HashMap<String, Session>,
    memberships: HashMap<ParticipantId, String>,
}

impl SessionDirectory {
    pub fn new(settings: GameSettings, words: WordList) -> Self {
        Self {
            settings,
            words,
            sessions: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    pub fn join(
        &mut self,
        id: ParticipantId,
        display_name: &str,
        room: &str,
    ) -> Result<Participant, SessionError> {
        if self.memberships.contains_key(&id) {
            return Err(SessionError::DuplicateIdentity(id));
        }

        let session = self.sessions.entry(room.to_string()).or_insert_with(|| {
            info!(room, "room opened");
            Session::new(room, self.settings.clone(), self.words.clone())
        });
        let participant = session.join(id, display_name)?;
        self.memberships.insert(id, room.to_string());

        Ok(participant)
    }

    pub fn leave(&mut self, id: ParticipantId, now: Instant) -> Option<Participant> {
        let room = self.memberships.remove(&id)?;
        let session = self.sessions.get_mut(&room)?;
        let participant = session.leave(id, now);

        if session.is_empty() {
            self.sessions.remove(&room);
            info!(room = %room, "room closed");
        }

        participant
    }

    pub fn start_game(&mut self, id: ParticipantId, now: Instant) -> Result<(), SessionError> {
        self.session_of(id)?.start_game(id, now)
    }

    pub fn submit_guess(
        &mut self,
        id: ParticipantId,
        text: &str,
        now: Instant,
    ) -> Result<bool, SessionError> {
        self.session_of(id)?.submit_guess(id, text, now)
    }

    pub fn poll(&mut self, now: Instant) {
        for session in self.sessions.values_mut() {
            session.poll(now);
        }
    }

    pub fn drain_outbox(&mut self) -> Vec<Delivery> {
        self.sessions
            .values_mut()
            .flat_map(|session| session.drain_outbox())
            .collect()
    }

    pub fn room_of(&self, id: ParticipantId) -> Option<&str> {
        self.memberships.get(&id).map(|room| room.as_str())
    }

    pub fn session(&self, room: &str) -> Option<&Session> {
        self.sessions.get(room)
    }

    pub fn room_count(&self) -> usize {
        self.sessions.len()
    }

    fn session_of(&mut self, id: ParticipantId) -> Result<&mut Session, SessionError> {
        self.memberships
            .get(&id)
            .and_then(|room| self.sessions.get_mut(room))
            .ok_or(SessionError::UnknownParticipant(id))
    }
}
