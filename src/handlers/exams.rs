// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, store::ExamStore};

/// Lists the names of all available exams.
pub async fn list_exams(State(store): State<ExamStore>) -> Result<impl IntoResponse, AppError> {
    let exams = store.list_exams().await?;
    Ok(Json(exams))
}

/// Returns the questions of one exam with each option list reshuffled.
///
/// * 404 if there is no `<examName>.json`.
/// * 500 if the file cannot be parsed.
pub async fn get_questions(
    State(store): State<ExamStore>,
    Path(exam_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let questions = store.get_questions(&exam_name).await?;
    Ok(Json(questions))
}
