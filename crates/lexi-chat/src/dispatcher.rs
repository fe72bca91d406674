//! Query dispatcher: turns a submitted question into a user turn, runs the
//! answer backend in the background, and records the outcome.
//!
//! At most one request is in flight. The user turn is appended as soon as
//! the question is accepted; the answer (or an error notice) is appended
//! only once the backend finishes, so turns from different questions never
//! interleave.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use lexi_core::ChatConfig;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error::ResolveError;
use crate::resolver::AnswerResolver;
use crate::store::ConversationStore;
use crate::types::{Answer, Turn, TurnBody, TurnId};

/// Prefix of the transcript notice written when the backend fails.
pub const ERROR_NOTICE_PREFIX: &str = "Sorry, I couldn't answer that question: ";

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing left after trimming whitespace.
    Empty,
    /// A previous question is still being answered.
    InFlight,
}

/// Outcome of [`QueryDispatcher::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted(TurnId),
    Rejected(RejectReason),
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted(_))
    }

    pub fn turn_id(&self) -> Option<TurnId> {
        match self {
            Submission::Accepted(id) => Some(*id),
            Submission::Rejected(_) => None,
        }
    }
}

struct PendingRequest {
    question: String,
    cancel: CancellationToken,
    task: JoinHandle<Result<Answer, ResolveError>>,
}

/// Owns the transcript and the single pending request.
pub struct QueryDispatcher {
    resolver: Arc<dyn AnswerResolver>,
    store: ConversationStore,
    pending: Option<PendingRequest>,
    timeout: Duration,
    include_history: bool,
}

impl QueryDispatcher {
    pub fn new(resolver: Arc<dyn AnswerResolver>, config: &ChatConfig) -> Self {
        Self {
            resolver,
            store: ConversationStore::new(),
            pending: None,
            timeout: config.resolution_timeout(),
            include_history: config.include_history,
        }
    }

    /// Override the backend timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submit a question.
    ///
    /// Blank questions and questions sent while another is in flight are
    /// ignored. Otherwise the user turn is appended immediately and the
    /// backend is started on a tokio task; call [`wait_for_answer`] or
    /// [`try_finish`] to record its outcome. Must be called from within a
    /// tokio runtime.
    ///
    /// [`wait_for_answer`]: QueryDispatcher::wait_for_answer
    /// [`try_finish`]: QueryDispatcher::try_finish
    pub fn submit(&mut self, question: &str) -> Submission {
        let text = question.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring blank submission");
            return Submission::Rejected(RejectReason::Empty);
        }
        if self.pending.is_some() {
            tracing::debug!("Ignoring submission while a request is in flight");
            return Submission::Rejected(RejectReason::InFlight);
        }

        let history = if self.include_history {
            self.store.all().to_vec()
        } else {
            Vec::new()
        };
        let turn_id = self
            .store
            .record(TurnBody::User {
                content: text.to_string(),
            })
            .id;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(resolve_with_limits(
            Arc::clone(&self.resolver),
            text.to_string(),
            history,
            self.timeout,
            cancel.clone(),
        ));
        self.pending = Some(PendingRequest {
            question: text.to_string(),
            cancel,
            task,
        });

        tracing::info!(turn_id = %turn_id, question_len = text.len(), "Question submitted");
        Submission::Accepted(turn_id)
    }

    /// Wait for the in-flight request and record its outcome.
    ///
    /// Returns the appended turn: an answer on success, an error notice on
    /// failure or timeout. Returns `None` when nothing was in flight.
    /// Dropping the returned future before it completes leaves the request
    /// in flight.
    pub async fn wait_for_answer(&mut self) -> Option<&Turn> {
        let pending = self.pending.as_mut()?;
        let joined = (&mut pending.task).await;
        let pending = self.pending.take()?;
        self.finish(&pending.question, task_outcome(joined))
    }

    /// Record the outcome of the in-flight request if the backend has
    /// already finished, without waiting.
    ///
    /// Render loops that only poll state call this once per frame so an
    /// answered, failed or timed-out request leaves the in-flight state
    /// even when nobody awaits [`wait_for_answer`]. Returns `None` while the
    /// backend is still running or when nothing was in flight.
    ///
    /// [`wait_for_answer`]: QueryDispatcher::wait_for_answer
    pub fn try_finish(&mut self) -> Option<&Turn> {
        let pending = self.pending.as_mut()?;
        if !pending.task.is_finished() {
            return None;
        }
        let joined = (&mut pending.task).now_or_never()?;
        let pending = self.pending.take()?;
        self.finish(&pending.question, task_outcome(joined))
    }

    /// Abandon the in-flight request without recording an answer.
    ///
    /// Returns `false` when nothing was in flight.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.cancel.cancel();
                tracing::info!(question_len = pending.question.len(), "Request cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Text of the question being answered, if any.
    pub fn pending_question(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.question.as_str())
    }

    pub fn transcript(&self) -> &[Turn] {
        self.store.all()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    fn finish(&mut self, question: &str, outcome: Result<Answer, ResolveError>) -> Option<&Turn> {
        match outcome {
            Ok(answer) => {
                tracing::info!(citations = answer.citations.len(), "Answer received");
                Some(self.store.record(TurnBody::Assistant {
                    content: answer.answer,
                    citations: answer.citations,
                }))
            }
            Err(ResolveError::Cancelled) => {
                tracing::debug!(question_len = question.len(), "Resolution cancelled");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, question_len = question.len(), "Resolution failed");
                Some(self.store.record(TurnBody::Error {
                    content: format!("{}{}", ERROR_NOTICE_PREFIX, err),
                }))
            }
        }
    }
}

impl Drop for QueryDispatcher {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
        }
    }
}

fn task_outcome(
    joined: Result<Result<Answer, ResolveError>, JoinError>,
) -> Result<Answer, ResolveError> {
    joined.unwrap_or_else(|e| {
        Err(ResolveError::Failed(format!(
            "resolution task ended unexpectedly: {}",
            e
        )))
    })
}

async fn resolve_with_limits(
    resolver: Arc<dyn AnswerResolver>,
    question: String,
    history: Vec<Turn>,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<Answer, ResolveError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ResolveError::Cancelled),
        res = tokio::time::timeout(timeout, resolver.resolve(&question, &history)) => {
            res.unwrap_or_else(|_| Err(ResolveError::TimedOut(timeout)))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StubResolver;
    use crate::types::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Answers only after `release` is notified.
    struct GatedResolver {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AnswerResolver for GatedResolver {
        async fn resolve(&self, _: &str, _: &[Turn]) -> Result<Answer, ResolveError> {
            self.release.notified().await;
            Ok(StubResolver::canned_answer())
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl AnswerResolver for FailingResolver {
        async fn resolve(&self, _: &str, _: &[Turn]) -> Result<Answer, ResolveError> {
            Err(ResolveError::Failed("index offline".to_string()))
        }
    }

    struct NeverResolver;

    #[async_trait]
    impl AnswerResolver for NeverResolver {
        async fn resolve(&self, _: &str, _: &[Turn]) -> Result<Answer, ResolveError> {
            std::future::pending().await
        }
    }

    struct PanickingResolver;

    #[async_trait]
    impl AnswerResolver for PanickingResolver {
        async fn resolve(&self, _: &str, _: &[Turn]) -> Result<Answer, ResolveError> {
            panic!("backend bug")
        }
    }

    /// Records what it was asked.
    #[derive(Default)]
    struct RecordingResolver {
        calls: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl AnswerResolver for RecordingResolver {
        async fn resolve(&self, question: &str, history: &[Turn]) -> Result<Answer, ResolveError> {
            self.calls
                .lock()
                .unwrap()
                .push((question.to_string(), history.len()));
            Ok(Answer {
                answer: format!("echo: {}", question),
                citations: vec![],
            })
        }
    }

    fn dispatcher(resolver: impl AnswerResolver + 'static) -> QueryDispatcher {
        QueryDispatcher::new(Arc::new(resolver), &ChatConfig::default())
    }

    #[tokio::test]
    async fn test_submit_appends_user_turn_immediately() {
        let release = Arc::new(Notify::new());
        let mut d = dispatcher(GatedResolver {
            release: Arc::clone(&release),
        });

        let submission = d.submit("  What about future prospects?  ");
        assert!(submission.is_accepted());
        assert!(d.is_in_flight());
        assert_eq!(d.pending_question(), Some("What about future prospects?"));

        let transcript = d.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role(), Role::User);
        assert_eq!(transcript[0].content(), "What about future prospects?");
        assert_eq!(submission.turn_id(), Some(transcript[0].id));

        release.notify_one();
        d.wait_for_answer().await.unwrap();
        assert!(!d.is_in_flight());
    }

    #[tokio::test]
    async fn test_blank_submission_rejected() {
        let mut d = dispatcher(StubResolver::instant());
        assert_eq!(d.submit(""), Submission::Rejected(RejectReason::Empty));
        assert_eq!(d.submit("   \n\t"), Submission::Rejected(RejectReason::Empty));
        assert!(d.transcript().is_empty());
        assert!(!d.is_in_flight());
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_in_flight() {
        let release = Arc::new(Notify::new());
        let mut d = dispatcher(GatedResolver {
            release: Arc::clone(&release),
        });

        assert!(d.submit("first").is_accepted());
        assert_eq!(
            d.submit("second"),
            Submission::Rejected(RejectReason::InFlight)
        );
        assert_eq!(d.transcript().len(), 1);
        assert_eq!(d.pending_question(), Some("first"));

        release.notify_one();
        d.wait_for_answer().await;
        assert_eq!(d.transcript().len(), 2);
        assert!(d.submit("second").is_accepted());
    }

    #[tokio::test]
    async fn test_answer_carries_citations_in_order() {
        let mut d = dispatcher(StubResolver::instant());
        d.submit("question");
        let turn = d.wait_for_answer().await.unwrap().clone();

        let expected = StubResolver::canned_answer();
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.content(), expected.answer);
        assert_eq!(turn.citations(), expected.citations.as_slice());
        assert!(turn.id > d.transcript()[0].id);
    }

    #[tokio::test]
    async fn test_failure_appends_error_turn() {
        let mut d = dispatcher(FailingResolver);
        d.submit("question");
        let turn = d.wait_for_answer().await.unwrap();
        assert!(turn.is_error());
        assert!(turn.citations().is_empty());
        assert!(turn.content().starts_with(ERROR_NOTICE_PREFIX));
        assert!(turn.content().contains("index offline"));
        assert!(!d.is_in_flight());
        assert_eq!(d.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_appends_error_turn() {
        let mut d = dispatcher(NeverResolver).with_timeout(Duration::from_millis(20));
        d.submit("question");
        let turn = d.wait_for_answer().await.unwrap();
        assert!(turn.is_error());
        assert!(turn.content().contains("no answer within 20ms"));
        assert!(!d.is_in_flight());
    }

    #[tokio::test]
    async fn test_panicking_backend_does_not_stick() {
        let mut d = dispatcher(PanickingResolver);
        d.submit("question");
        let turn = d.wait_for_answer().await.unwrap();
        assert!(turn.is_error());
        assert!(!d.is_in_flight());
    }

    #[tokio::test]
    async fn test_cancel_clears_in_flight_without_answer() {
        let mut d = dispatcher(NeverResolver);
        d.submit("question");
        assert!(d.cancel());
        assert!(!d.is_in_flight());
        assert_eq!(d.transcript().len(), 1);
        assert!(d.wait_for_answer().await.is_none());

        assert!(d.submit("next").is_accepted());
        assert_eq!(d.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_without_request() {
        let mut d = dispatcher(StubResolver::instant());
        assert!(!d.cancel());
    }

    #[tokio::test]
    async fn test_wait_without_request_returns_none() {
        let mut d = dispatcher(StubResolver::instant());
        assert!(d.wait_for_answer().await.is_none());
        assert!(d.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_wait_keeps_request_in_flight() {
        let release = Arc::new(Notify::new());
        let mut d = dispatcher(GatedResolver {
            release: Arc::clone(&release),
        });
        d.submit("question");

        let waited = tokio::time::timeout(Duration::from_millis(10), d.wait_for_answer()).await;
        assert!(waited.is_err());
        assert!(d.is_in_flight());
        assert_eq!(d.transcript().len(), 1);

        release.notify_one();
        assert!(d.wait_for_answer().await.is_some());
        assert_eq!(d.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_try_finish_records_answer_without_waiting() {
        let mut d = dispatcher(StubResolver::instant());
        d.submit("q");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let turn = d.try_finish().unwrap();
        assert_eq!(turn.role(), Role::Assistant);
        assert!(!d.is_in_flight());
        assert_eq!(d.transcript().len(), 2);
        assert!(d.try_finish().is_none());
    }

    #[tokio::test]
    async fn test_try_finish_records_timeout_notice() {
        let mut d = dispatcher(NeverResolver).with_timeout(Duration::from_millis(20));
        d.submit("q");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let turn = d.try_finish().unwrap();
        assert!(turn.is_error());
        assert!(turn.content().starts_with(ERROR_NOTICE_PREFIX));
        assert!(!d.is_in_flight());
        assert_eq!(d.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_try_finish_leaves_running_request_alone() {
        let release = Arc::new(Notify::new());
        let mut d = dispatcher(GatedResolver {
            release: Arc::clone(&release),
        });
        assert!(d.try_finish().is_none());

        d.submit("q");
        tokio::task::yield_now().await;
        assert!(d.try_finish().is_none());
        assert!(d.is_in_flight());
        assert_eq!(d.transcript().len(), 1);

        release.notify_one();
        assert!(d.wait_for_answer().await.is_some());
    }

    #[tokio::test]
    async fn test_history_passed_to_backend() {
        let resolver = Arc::new(RecordingResolver::default());
        let mut d = QueryDispatcher::new(resolver.clone(), &ChatConfig::default());

        d.submit("first");
        d.wait_for_answer().await;
        d.submit("second");
        d.wait_for_answer().await;

        let calls = resolver.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("first".to_string(), 0), ("second".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_history_withheld_when_disabled() {
        let resolver = Arc::new(RecordingResolver::default());
        let config = ChatConfig {
            include_history: false,
            ..ChatConfig::default()
        };
        let mut d = QueryDispatcher::new(resolver.clone(), &config);

        d.submit("first");
        d.wait_for_answer().await;
        d.submit("second");
        d.wait_for_answer().await;

        let calls = resolver.calls.lock().unwrap().clone();
        assert_eq!(calls[1], ("second".to_string(), 0));
    }

    #[tokio::test]
    async fn test_turns_alternate_across_questions() {
        let mut d = dispatcher(StubResolver::instant());
        for i in 0..5 {
            d.submit(&format!("question {}", i));
            d.wait_for_answer().await;
        }
        let roles: Vec<Role> = d.transcript().iter().map(|t| t.role()).collect();
        for (i, role) in roles.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(*role, expected);
        }
        assert_eq!(roles.len(), 10);
    }

    #[tokio::test]
    async fn test_empty_citation_list_preserved() {
        let mut d = dispatcher(RecordingResolver::default());
        d.submit("anything");
        let turn = d.wait_for_answer().await.unwrap();
        assert_eq!(turn.content(), "echo: anything");
        assert!(matches!(
            &turn.body,
            TurnBody::Assistant { citations, .. } if citations.is_empty()
        ));
    }

    #[test]
    fn test_submission_helpers() {
        let accepted = Submission::Accepted(TurnId(3));
        assert!(accepted.is_accepted());
        assert_eq!(accepted.turn_id(), Some(TurnId(3)));

        let rejected = Submission::Rejected(RejectReason::Empty);
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.turn_id(), None);
    }
}
