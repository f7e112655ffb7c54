use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveAttemptRequest {
    #[validate(length(min = 1))]
    pub question: String,
    #[validate(length(equal = 4))]
    pub options: Vec<String>,
    #[validate(range(max = 3))]
    pub selected_option: usize,
    #[validate(range(max = 3))]
    pub correct_option: usize,
    pub explanation: Option<String>,
    #[validate(length(min = 1))]
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAttemptResponse {
    pub status: String,
    pub id: uuid::Uuid,
    pub result: crate::models::attempt::AttemptResult,
}
