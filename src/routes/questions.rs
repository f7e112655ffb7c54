use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::dto::question_dto::{
    BufferStatusResponse, NextQuestionQuery, WarmUpRequest, WarmUpResponse,
};
use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::AppState;

#[axum::debug_handler]
pub async fn next_question(
    State(state): State<AppState>,
    Query(query): Query<NextQuestionQuery>,
) -> Result<Json<Question>> {
    let subject = query.subject.trim();
    if subject.is_empty() {
        return Err(Error::BadRequest("subject must not be empty".to_string()));
    }

    let question = state
        .question_buffer
        .fetch_next(subject, &state.generator)
        .await?;
    Ok(Json(question))
}

#[axum::debug_handler]
pub async fn warm_up(
    State(state): State<AppState>,
    Json(payload): Json<WarmUpRequest>,
) -> Result<(StatusCode, Json<WarmUpResponse>)> {
    payload.validate()?;
    let subject = payload.subject.trim().to_string();
    if subject.is_empty() {
        return Err(Error::BadRequest("subject must not be empty".to_string()));
    }

    let scheduled = state
        .question_buffer
        .warm_up(&subject, state.generator.clone());
    tracing::info!(subject = %subject, scheduled, "Warm-up requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(WarmUpResponse { subject, scheduled }),
    ))
}

pub async fn buffer_status(State(state): State<AppState>) -> Json<BufferStatusResponse> {
    let settings = state.question_buffer.settings();
    Json(BufferStatusResponse {
        capacity: settings.capacity,
        low_water_mark: settings.low_water_mark,
        topics: state.question_buffer.snapshot(),
    })
}
