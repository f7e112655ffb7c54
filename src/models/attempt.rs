use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptResult {
    Correct,
    Wrong,
}

impl AttemptResult {
    pub fn from_selection(selected_option: usize, correct_option: usize) -> Self {
        if selected_option == correct_option {
            AttemptResult::Correct
        } else {
            AttemptResult::Wrong
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptResult::Correct => "Correct",
            AttemptResult::Wrong => "Wrong",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub selected_option: usize,
    pub correct_option: usize,
    #[serde(default)]
    pub explanation: String,
    pub subject: String,
    pub result: AttemptResult,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}
