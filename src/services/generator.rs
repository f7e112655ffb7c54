//! Contract between the question buffer and whatever produces questions.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::question::Question;

/// Produces a fresh batch of questions for a topic.
///
/// Implementations may take many seconds and may fail for transport,
/// response-shape or parse reasons; callers treat every `Err` the same way.
/// An empty `Ok` batch is allowed and means "nothing this time".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<Vec<Question>>;
}
