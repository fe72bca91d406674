//! Conversation store: the ordered, append-only transcript of a session.

use chrono::Local;

use crate::types::{Turn, TurnBody, TurnId};

/// Owns the transcript and hands out turn identities.
///
/// Insertion order is display order. Nothing is ever edited or removed;
/// the transcript lives exactly as long as the store.
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
    next_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh turn id. Ids strictly increase.
    pub fn next_id(&mut self) -> TurnId {
        self.next_id += 1;
        TurnId(self.next_id)
    }

    /// Add a turn to the end of the transcript.
    pub fn append(&mut self, turn: Turn) {
        tracing::trace!(turn_id = %turn.id, role = %turn.role(), "Turn appended");
        self.turns.push(turn);
    }

    /// Build a turn with a fresh id and the current time, then append it.
    pub fn record(&mut self, body: TurnBody) -> &Turn {
        let turn = Turn {
            id: self.next_id(),
            created_at: Local::now(),
            body,
        };
        self.append(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// Transcript snapshot, oldest first.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    /// Most recent answer, skipping error notices.
    pub fn last_answer(&self) -> Option<&Turn> {
        self.turns
            .iter()
            .rev()
            .find(|t| matches!(t.body, TurnBody::Assistant { .. }))
    }

    /// Pretty-printed JSON of the transcript.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.turns)
    }
}
