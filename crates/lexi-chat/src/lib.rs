//! Conversational core of the Lexi legal assistant.
//!
//! Holds the session transcript, dispatches questions to an answer
//! backend one at a time, and resolves the citations attached to answers
//! into links that can be opened.

pub mod citation;
pub mod dispatcher;
pub mod error;
pub mod opener;
pub mod resolver;
pub mod session;
pub mod store;
pub mod types;

pub use citation::{CitationDetail, CitationResolver};
pub use dispatcher::{QueryDispatcher, RejectReason, Submission, ERROR_NOTICE_PREFIX};
pub use error::{LinkError, ResolveError};
pub use opener::{BrowserOpener, LinkOpener, LoggingOpener};
pub use resolver::{AnswerResolver, StubResolver, EXAMPLE_QUESTION};
pub use session::AssistantSession;
pub use store::ConversationStore;
pub use types::{Answer, Citation, Role, Turn, TurnBody, TurnId};
