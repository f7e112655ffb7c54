use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::error::Result;
use crate::services::export_service::ExportService;
use crate::utils::time::{file_stamp, now};
use crate::AppState;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn xlsx_response(buffer: Vec<u8>, filename: String) -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    )
}

/// Export every recorded attempt as XLSX
pub async fn download_report(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let attempts = state.attempt_service.list_attempts().await?;
    let buffer = ExportService::generate_attempts_xlsx(&attempts, "All Practice Questions")?;
    let filename = format!("practice_all_{}.xlsx", file_stamp(now()));
    Ok(xlsx_response(buffer, filename))
}

/// Export one subject's attempts as XLSX
pub async fn download_subject_report(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<impl IntoResponse> {
    let attempts = state.attempt_service.list_by_subject(&subject).await?;
    let title = format!("Practice Questions: {}", subject);
    let buffer = ExportService::generate_attempts_xlsx(&attempts, &title)?;
    let filename = format!(
        "practice_{}_{}.xlsx",
        ExportService::file_fragment(&subject),
        file_stamp(now())
    );
    Ok(xlsx_response(buffer, filename))
}
