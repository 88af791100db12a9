// src/client.rs

use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde_json::Value;

use crate::{
    error::AppError,
    models::{
        exam_result::{ResultRecord, SubmitResultRequest},
        question::Question,
    },
    store::{ExamStore, ResultsLog, results::parse_log},
};

/// Where an exam session gets its questions from and sends its results to.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    async fn list_exams(&self) -> Result<Vec<String>, AppError>;

    /// Questions of `exam_name` with shuffled options.
    async fn fetch_questions(&self, exam_name: &str) -> Result<Vec<Question>, AppError>;

    async fn submit_result(&self, attempt: &SubmitResultRequest) -> Result<(), AppError>;

    async fn list_results(&self) -> Result<Vec<ResultRecord>, AppError>;
}

/// Talks to a running exam server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/questions/{exam_name}` with the name percent-encoded as one segment.
    fn questions_url(&self, exam_name: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::InternalServerError(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::InternalServerError(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(["questions", exam_name]);
        Ok(url)
    }
}

/// Maps a non-success response to the matching error kind,
/// using the server's `{"error": ...}` message when present.
async fn error_from_response(resp: Response) -> AppError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::BAD_REQUEST => AppError::BadRequest(message),
        s if s.is_server_error() => AppError::InternalServerError(format!("{}: {}", s, message)),
        s => AppError::InternalServerError(format!("unexpected status {}: {}", s, message)),
    }
}

#[async_trait]
impl ExamBackend for HttpBackend {
    async fn list_exams(&self) -> Result<Vec<String>, AppError> {
        let resp = self.client.get(self.url("/exams")).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn fetch_questions(&self, exam_name: &str) -> Result<Vec<Question>, AppError> {
        let resp = self.client.get(self.questions_url(exam_name)?).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn submit_result(&self, attempt: &SubmitResultRequest) -> Result<(), AppError> {
        let resp = self
            .client
            .post(self.url("/submit"))
            .json(attempt)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(match error_from_response(resp).await {
                AppError::InternalServerError(msg) => AppError::StorageError(msg),
                other => other,
            });
        }
        Ok(())
    }

    /// Reads the raw results log; an absent or unreadable log is an empty list.
    async fn list_results(&self) -> Result<Vec<ResultRecord>, AppError> {
        let resp = self.client.get(self.url("/results.json")).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let body = resp.text().await?;
        Ok(parse_log(&body).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable results log: {}", e);
            Vec::new()
        }))
    }
}

/// In-process backend reading the exam directory and results file directly.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    store: ExamStore,
    results: ResultsLog,
}

impl LocalBackend {
    pub fn new(store: ExamStore, results: ResultsLog) -> Self {
        Self { store, results }
    }
}

#[async_trait]
impl ExamBackend for LocalBackend {
    async fn list_exams(&self) -> Result<Vec<String>, AppError> {
        self.store.list_exams().await
    }

    async fn fetch_questions(&self, exam_name: &str) -> Result<Vec<Question>, AppError> {
        self.store.get_questions(exam_name).await
    }

    async fn submit_result(&self, attempt: &SubmitResultRequest) -> Result<(), AppError> {
        self.results.append_result(attempt.clone()).await.map(|_| ())
    }

    async fn list_results(&self) -> Result<Vec<ResultRecord>, AppError> {
        Ok(self.results.list_results().await)
    }
}
