// src/session/controller.rs

use std::sync::Arc;

use chrono::Local;
use tokio::sync::{Mutex, oneshot};

use crate::{
    client::ExamBackend,
    error::AppError,
    models::exam_result::SubmitResultRequest,
    session::{ExamSession, PackageSize, timer::Countdown},
};

/// A finalized attempt and the outcome of persisting it.
///
/// The attempt is always available to show to the candidate, even when
/// `persisted` holds an error.
#[derive(Debug)]
pub struct Submission {
    pub attempt: SubmitResultRequest,
    pub persisted: Result<(), AppError>,
    pub timed_out: bool,
}

/// Drives one `ExamSession` for a UI: owns the countdown and talks to the
/// backend. The session is shared with the countdown task behind a mutex,
/// and `ExamSession::submit` yields an attempt only once, so timer expiry
/// and a manual submit cannot both persist a result.
///
/// Every attempt gets its own expiry channel; a submission from an
/// earlier attempt is never reported for a later one.
pub struct ExamController {
    session: Arc<Mutex<ExamSession>>,
    backend: Arc<dyn ExamBackend>,
    countdown: Option<Countdown>,
    expiry: Option<oneshot::Receiver<Submission>>,
}

impl ExamController {
    pub fn new(backend: Arc<dyn ExamBackend>) -> Self {
        Self {
            session: Arc::new(Mutex::new(ExamSession::new())),
            backend,
            countdown: None,
            expiry: None,
        }
    }

    pub fn session(&self) -> Arc<Mutex<ExamSession>> {
        self.session.clone()
    }

    pub async fn list_exams(&self) -> Result<Vec<String>, AppError> {
        self.backend.list_exams().await
    }

    pub async fn select_exam(&self, exam_name: &str) -> Result<(), AppError> {
        self.session.lock().await.select_exam(exam_name)
    }

    /// Fetches the questions and starts the attempt and its countdown.
    /// The session is not locked while the questions are fetched.
    pub async fn start_exam(
        &mut self,
        candidate: &str,
        package: PackageSize,
    ) -> Result<(), AppError> {
        let exam_name = self.session.lock().await.ready_exam_name(candidate)?;

        let questions = self
            .backend
            .fetch_questions(&exam_name)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to load exam '{}': {}", exam_name, e);
                e
            })?;

        let budget = {
            let mut session = self.session.lock().await;
            session.begin(candidate, package, questions, Local::now().date_naive())?;
            session.time_budget()
        };

        let (expired_tx, expired_rx) = oneshot::channel();
        let session = self.session.clone();
        let backend = self.backend.clone();
        self.expiry = Some(expired_rx);
        self.countdown = Some(Countdown::start(budget, move || async move {
            let attempt = session.lock().await.submit();
            if let Some(attempt) = attempt {
                tracing::info!("Time is up for {}", attempt.exam_identifier);
                let persisted = backend.submit_result(&attempt).await;
                if let Err(e) = &persisted {
                    tracing::error!("Error submitting results: {}", e);
                }
                let _ = expired_tx.send(Submission {
                    attempt,
                    persisted,
                    timed_out: true,
                });
            }
        }));
        Ok(())
    }

    /// Seconds left on the countdown, or 0 when no attempt is running.
    pub fn remaining_seconds(&self) -> u64 {
        self.countdown
            .as_ref()
            .map(Countdown::remaining_seconds)
            .unwrap_or(0)
    }

    /// Manual submit.
    ///
    /// If the countdown has already finalized the attempt, waits for its
    /// auto-submission to be persisted and returns that instead. Returns
    /// `None` when there is no attempt left to report.
    pub async fn submit(&mut self) -> Option<Submission> {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.cancel();
        }

        let attempt = self.session.lock().await.submit();
        let Some(attempt) = attempt else {
            let expiry = self.expiry.take()?;
            return expiry.await.ok();
        };
        self.expiry = None;

        let persisted = self.backend.submit_result(&attempt).await;
        if let Err(e) = &persisted {
            tracing::error!("Error submitting results: {}", e);
        }
        Some(Submission {
            attempt,
            persisted,
            timed_out: false,
        })
    }

    /// Resolves once the countdown has auto-submitted the current attempt.
    /// Never resolves if the attempt is submitted manually first.
    /// Cancel safe, so it can sit in a `select!` next to user input.
    pub async fn expired(&mut self) -> Submission {
        if let Some(expiry) = self.expiry.as_mut() {
            let received = expiry.await;
            self.expiry = None;
            if let Ok(submission) = received {
                return submission;
            }
        }
        std::future::pending().await
    }

    /// Leaves the exam without recording anything.
    pub async fn leave(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
        self.expiry = None;
        self.session.lock().await.abandon();
    }
}
