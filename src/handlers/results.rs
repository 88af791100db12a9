// src/handlers/results.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::exam_result::SubmitResultRequest,
    store::{
        ResultsLog,
        view::{ResultsQuery, build_page},
    },
};

/// Appends a completed attempt to the results log.
///
/// * Validates the payload (candidate name, score bounds).
/// * The server assigns the timestamp.
pub async fn submit_result(
    State(results): State<ResultsLog>,
    Json(req): Json<SubmitResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let record = results.append_result(req).await?;

    Ok(Json(serde_json::json!({
        "message": "Result saved successfully.",
        "timestamp": record.timestamp,
    })))
}

/// Browses the results log: newest first, optional search, 6 per page.
pub async fn list_results(
    State(results): State<ResultsLog>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let records = results.list_results().await;
    Ok(Json(build_page(records, &query)))
}
