//! Answer backend interface and the canned stand-in used until a real
//! retrieval service is wired up.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ResolveError;
use crate::types::{Answer, Citation, Turn};

/// Turns a question into an answer with citations.
///
/// Implementations may take arbitrarily long and may fail. `history` holds
/// the turns that preceded the question, oldest first.
#[async_trait]
pub trait AnswerResolver: Send + Sync {
    async fn resolve(&self, question: &str, history: &[Turn]) -> Result<Answer, ResolveError>;
}

const STUB_ANSWER: &str = "Yes, under Section 166 of the Motor Vehicles Act, 1988, the claimants are entitled to an addition for future prospects even when the deceased was self-employed and aged 54\u{2013}55 years at the time of the accident. In Dani Devi v. Pritam Singh, the Court held that 10% of the deceased's annual income should be added as future prospects.";

const STUB_EXCERPT: &str = "as the age of the deceased at the time of accident was held to be about 54-55 years by the learned Tribunal, being self-employed, as such, 10% of annual income should have been awarded on account of future prospects.";

const STUB_SOURCE: &str = "Dani_Devi_v_Pritam_Singh.pdf";

const STUB_LINK: &str = "https://lexisingapore-my.sharepoint.com/:b:/g/personal/harshit_lexi_sg/EdOegeiR_gdBvQxdyW4xE6oBCDgj5E4Bo5wjvhPHpqgIuQ?e=TEu4vzof";

/// Example question shown to new users; the stub answers it (and every
/// other question) with the same ruling.
pub const EXAMPLE_QUESTION: &str = "In a motor accident claim where the deceased was self-employed and aged 54\u{2013}55 years at the time of death, is the claimant entitled to an addition towards future prospects in computing compensation under Section 166 of the Motor Vehicles Act, 1988? If so, how much?";

/// Backend that answers every question with one fixed ruling after a
/// simulated delay.
#[derive(Debug, Clone)]
pub struct StubResolver {
    delay: Duration,
}

impl StubResolver {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Stub that answers without waiting.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// The canned answer.
    pub fn canned_answer() -> Answer {
        Answer {
            answer: STUB_ANSWER.to_string(),
            citations: vec![
                Citation::new(STUB_EXCERPT, STUB_SOURCE, STUB_LINK).with_paragraph("Para 7")
            ],
        }
    }
}

impl Default for StubResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl AnswerResolver for StubResolver {
    async fn resolve(&self, question: &str, history: &[Turn]) -> Result<Answer, ResolveError> {
        tracing::debug!(
            question_len = question.len(),
            history_len = history.len(),
            delay_ms = self.delay.as_millis() as u64,
            "Stub resolver answering"
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Self::canned_answer())
    }
}
