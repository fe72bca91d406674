//! The assistant session: single owner of all conversation state.
//!
//! Presentation layers read the transcript, input buffer, in-flight flag
//! and selected citation from here, and mutate state only through
//! `submit`, `select` and `clear_selection` (plus cancel and open).

use std::sync::Arc;

use chrono::{DateTime, Local};
use lexi_core::LexiConfig;
use uuid::Uuid;

use crate::citation::{CitationDetail, CitationResolver};
use crate::dispatcher::{QueryDispatcher, Submission};
use crate::error::LinkError;
use crate::opener::LinkOpener;
use crate::resolver::AnswerResolver;
use crate::types::{Citation, Turn};

pub struct AssistantSession {
    id: Uuid,
    started_at: DateTime<Local>,
    input: String,
    dispatcher: QueryDispatcher,
    citations: CitationResolver,
}

impl AssistantSession {
    pub fn new(resolver: Arc<dyn AnswerResolver>, config: &LexiConfig) -> Self {
        Self::from_parts(
            QueryDispatcher::new(resolver, &config.chat),
            CitationResolver::new(config.links.policy),
        )
    }

    pub fn from_parts(dispatcher: QueryDispatcher, citations: CitationResolver) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, "Session started");
        Self {
            id,
            started_at: Local::now(),
            input: String::new(),
            dispatcher,
            citations,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    // -- Input buffer --

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Submit whatever is in the input buffer.
    pub fn submit_input(&mut self) -> Submission {
        let text = std::mem::take(&mut self.input);
        let submission = self.dispatcher.submit(&text);
        if !submission.is_accepted() {
            self.input = text;
        }
        submission
    }

    /// Submit `question`. The input buffer is cleared when it is accepted.
    pub fn submit(&mut self, question: &str) -> Submission {
        let submission = self.dispatcher.submit(question);
        if submission.is_accepted() {
            self.input.clear();
        }
        submission
    }

    // -- Conversation --

    pub fn transcript(&self) -> &[Turn] {
        self.dispatcher.transcript()
    }

    pub fn is_in_flight(&self) -> bool {
        self.dispatcher.is_in_flight()
    }

    pub fn pending_question(&self) -> Option<&str> {
        self.dispatcher.pending_question()
    }

    /// See [`QueryDispatcher::wait_for_answer`].
    pub async fn wait_for_answer(&mut self) -> Option<&Turn> {
        self.dispatcher.wait_for_answer().await
    }

    /// See [`QueryDispatcher::try_finish`].
    pub fn try_finish(&mut self) -> Option<&Turn> {
        self.dispatcher.try_finish()
    }

    pub fn cancel(&mut self) -> bool {
        self.dispatcher.cancel()
    }

    /// Citations of the most recent answer.
    pub fn latest_citations(&self) -> &[Citation] {
        self.dispatcher
            .store()
            .last_answer()
            .map(Turn::citations)
            .unwrap_or_default()
    }

    pub fn export_json(&self) -> lexi_core::Result<String> {
        Ok(self.dispatcher.store().to_json()?)
    }

    // -- Citations --

    pub fn select(&mut self, citation: &Citation) {
        self.citations.select(citation);
    }

    pub fn clear_selection(&mut self) {
        self.citations.clear_selection();
    }

    pub fn selected(&self) -> Option<&Citation> {
        self.citations.selected()
    }

    pub fn resolve_link(&self, citation: &Citation) -> Result<String, LinkError> {
        self.citations.resolve_link(citation)
    }

    pub fn open_citation(
        &mut self,
        citation: &Citation,
        opener: &dyn LinkOpener,
    ) -> Result<String, LinkError> {
        self.citations.open(citation, opener)
    }

    pub fn citation_detail(&self, citation: &Citation) -> CitationDetail {
        self.citations.detail(citation)
    }

    pub fn last_link_error(&self) -> Option<&LinkError> {
        self.citations.last_error()
    }
}
