use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::buffer_service::TopicSnapshot;

pub const DEFAULT_SUBJECT: &str = "Data Structures";

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextQuestionQuery {
    #[serde(default = "default_subject")]
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WarmUpRequest {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmUpResponse {
    pub subject: String,
    pub scheduled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BufferStatusResponse {
    pub capacity: usize,
    pub low_water_mark: usize,
    pub topics: Vec<TopicSnapshot>,
}
