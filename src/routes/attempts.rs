use axum::{extract::State, Json};
use validator::Validate;

use crate::dto::attempt_dto::{SaveAttemptRequest, SaveAttemptResponse};
use crate::error::Result;
use crate::AppState;

#[axum::debug_handler]
pub async fn save_attempt(
    State(state): State<AppState>,
    Json(payload): Json<SaveAttemptRequest>,
) -> Result<Json<SaveAttemptResponse>> {
    payload.validate()?;
    let record = state.attempt_service.save_attempt(payload).await?;
    Ok(Json(SaveAttemptResponse {
        status: "saved".to_string(),
        id: record.id,
        result: record.result,
    }))
}
