use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single multiple-choice practice question as produced by the generator.
///
/// The buffer treats this as opaque; only the generation adapter and the
/// HTTP layer look inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Question {
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub question: String,
    #[validate(length(equal = 4, message = "exactly 4 options are required"))]
    pub options: Vec<String>,
    #[validate(range(max = 3, message = "correct_option must index one of the 4 options"))]
    pub correct_option: usize,
    #[serde(default)]
    pub explanation: String,
    pub subject: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

pub fn default_difficulty() -> String {
    "Moderate".to_string()
}

impl Question {
    pub fn correct_text(&self) -> Option<&str> {
        self.options.get(self.correct_option).map(String::as_str)
    }
}
