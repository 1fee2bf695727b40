use std::fmt;

use common::protocol::ParticipantView;

use crate::error::SessionError;

/// Assigned by the gateway; the transport's client id for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub score: u32,
    pub is_drawing: bool,
}

impl Participant {
    pub fn view(&self) -> ParticipantView {
        ParticipantView {
            user_id: self.id.0,
            username: self.display_name.clone(),
            score: self.score,
            is_drawing: self.is_drawing,
        }
    }
}

/// Participants of one session, kept in join order so drawer rotation is deterministic.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(
        &mut self,
        id: ParticipantId,
        display_name: &str,
    ) -> Result<Participant, SessionError> {
        if self.contains(id) {
            return Err(SessionError::DuplicateIdentity(id));
        }

        let participant = Participant {
            id,
            display_name: display_name.to_string(),
            score: 0,
            is_drawing: false,
        };
        self.participants.push(participant.clone());
        Ok(participant)
    }

    /// Returns the removed participant, or `None` if `id` was not registered.
    pub fn leave(&mut self, id: ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id == id)?;
        Some(self.participants.remove(index))
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.get(id).is_some()
    }

    pub fn all(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn apply_score_delta(
        &mut self,
        id: ParticipantId,
        delta: i64,
    ) -> Result<u32, SessionError> {
        let participant = self.get_mut(id)?;
        let total = (i64::from(participant.score) + delta).clamp(0, i64::from(u32::MAX));
        participant.score = total as u32;
        Ok(participant.score)
    }

    pub fn set_drawing(&mut self, id: ParticipantId, flag: bool) -> Result<(), SessionError> {
        self.get_mut(id)?.is_drawing = flag;
        Ok(())
    }

    pub fn clear_drawing(&mut self) {
        for participant in &mut self.participants {
            participant.is_drawing = false;
        }
    }

    /// Owned copy for broadcasting.
    pub fn snapshot(&self) -> Vec<ParticipantView> {
        self.participants.iter().map(Participant::view).collect()
    }

    fn get_mut(&mut self, id: ParticipantId) -> Result<&mut Participant, SessionError> {
        self.participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SessionError::UnknownParticipant(id))
    }
}
