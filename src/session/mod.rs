// src/session/mod.rs
//
// Client-side exam session: Idle -> ExamSelected -> InProgress -> Completed.

pub mod controller;
pub mod scoring;
pub mod timer;

use std::{fmt, str::FromStr, time::Duration};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::{
    config::MINUTES_PER_QUESTION,
    error::AppError,
    models::{
        exam_result::{Answer, SubmitResultRequest},
        question::Question,
    },
};

pub use controller::{ExamController, Submission};

/// How many questions an attempt draws from the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageSize {
    Small,
    Mid,
    Large,
}

impl PackageSize {
    pub fn question_count(self) -> usize {
        match self {
            PackageSize::Small => 10,
            PackageSize::Mid => 25,
            PackageSize::Large => 50,
        }
    }

    /// Three minutes per requested question.
    pub fn time_budget(self) -> Duration {
        Duration::from_secs(self.question_count() as u64 * MINUTES_PER_QUESTION * 60)
    }
}

impl FromStr for PackageSize {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(PackageSize::Small),
            "mid" => Ok(PackageSize::Mid),
            "large" => Ok(PackageSize::Large),
            other => Err(AppError::ValidationError(format!(
                "Unknown package size '{}' (expected small, mid or large)",
                other
            ))),
        }
    }
}

impl fmt::Display for PackageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageSize::Small => "small",
            PackageSize::Mid => "mid",
            PackageSize::Large => "large",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ExamSelected,
    InProgress,
    Completed,
}

/// Collapses whitespace runs into single spaces and trims.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `<exam><DD><MM><YY>_<name>`, e.g. `aws190126_Ada Lovelace`.
pub fn exam_identifier(exam_name: &str, date: NaiveDate, candidate: &str) -> String {
    format!(
        "{}{:02}{:02}{:02}_{}",
        exam_name,
        date.day(),
        date.month(),
        date.year().rem_euclid(100),
        normalize_name(candidate)
    )
}

/// State of one candidate's attempt, owned by whoever drives the UI.
#[derive(Debug)]
pub struct ExamSession {
    state: SessionState,
    exam_name: Option<String>,
    candidate: String,
    exam_identifier: String,
    package: Option<PackageSize>,
    questions: Vec<Question>,
    answers: Vec<Option<Answer>>,
    current: usize,
    started_at: Option<Instant>,
    result: Option<SubmitResultRequest>,
}

impl Default for ExamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            exam_name: None,
            candidate: String::new(),
            exam_identifier: String::new(),
            package: None,
            questions: Vec::new(),
            answers: Vec::new(),
            current: 0,
            started_at: None,
            result: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn exam_name(&self) -> Option<&str> {
        self.exam_name.as_deref()
    }

    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    pub fn exam_identifier(&self) -> &str {
        &self.exam_identifier
    }

    /// Chooses the exam to take. Not allowed while an attempt is running.
    pub fn select_exam(&mut self, exam_name: &str) -> Result<(), AppError> {
        if self.state == SessionState::InProgress {
            return Err(AppError::ValidationError(
                "An exam is already in progress".to_string(),
            ));
        }
        *self = Self::new();
        self.exam_name = Some(exam_name.to_string());
        self.state = SessionState::ExamSelected;
        Ok(())
    }

    /// Leaves the setup screen without starting.
    pub fn back(&mut self) {
        if self.state == SessionState::ExamSelected {
            *self = Self::new();
        }
    }

    /// Drops the running attempt without recording it.
    pub fn abandon(&mut self) {
        if self.state == SessionState::InProgress {
            let exam_name = self.exam_name.take();
            *self = Self::new();
            self.exam_name = exam_name;
            self.state = SessionState::ExamSelected;
        }
    }

    /// Starts the attempt from an already fetched question pool.
    pub fn begin(
        &mut self,
        candidate: &str,
        package: PackageSize,
        pool: Vec<Question>,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        let exam_name = self.ready_exam_name(candidate)?;

        let questions = scoring::sample(pool, package.question_count(), &mut rand::rng());
        if questions.is_empty() {
            return Err(AppError::NotFound(format!(
                "Exam '{}' has no questions",
                exam_name
            )));
        }

        self.candidate = candidate.trim().to_string();
        self.exam_identifier = exam_identifier(&exam_name, today, candidate);
        self.package = Some(package);
        self.answers = vec![None; questions.len()];
        self.questions = questions;
        self.current = 0;
        self.started_at = Some(Instant::now());
        self.result = None;
        self.state = SessionState::InProgress;

        tracing::info!(
            "Exam {} started with {} questions",
            self.exam_identifier,
            self.questions.len()
        );
        Ok(())
    }

    /// The selected exam name, once `candidate` is usable and an exam is
    /// selected.
    pub(crate) fn ready_exam_name(&self, candidate: &str) -> Result<String, AppError> {
        if candidate.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Please enter your name.".to_string(),
            ));
        }
        match (&self.state, &self.exam_name) {
            (SessionState::ExamSelected, Some(name)) => Ok(name.clone()),
            _ => Err(AppError::ValidationError("No exam selected".to_string())),
        }
    }

    /// Countdown budget for the running attempt.
    pub fn time_budget(&self) -> Duration {
        self.package
            .map(PackageSize::time_budget)
            .unwrap_or(Duration::ZERO)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.state != SessionState::InProgress {
            return None;
        }
        self.questions.get(self.current)
    }

    /// Whether the UI should offer "Submit" instead of "Next".
    pub fn is_last(&self) -> bool {
        !self.questions.is_empty() && self.current + 1 == self.questions.len()
    }

    /// The option chosen for the current question, if any.
    pub fn selected_answer(&self) -> Option<&str> {
        self.answers
            .get(self.current)
            .and_then(Option::as_ref)
            .and_then(|a| a.selected_answer.as_deref())
    }

    /// Records (or replaces) the answer to the current question.
    pub fn answer_current(&mut self, option: &str) {
        let Some(question) = self.current_question() else {
            return;
        };
        let answer = Answer::record(question, Some(option.to_string()));
        self.answers[self.current] = Some(answer);
    }

    /// Keeps an explicit "not answered" entry for a visited question.
    fn save_current(&mut self) {
        if self.answers.get(self.current).is_some_and(Option::is_some) {
            return;
        }
        let Some(question) = self.current_question() else {
            return;
        };
        let answer = Answer::record(question, None);
        self.answers[self.current] = Some(answer);
    }

    /// Moves forward; returns false when already on the last question.
    pub fn next(&mut self) -> bool {
        self.save_current();
        if self.state == SessionState::InProgress && self.current + 1 < self.questions.len() {
            self.current += 1;
            return true;
        }
        false
    }

    /// Moves back; returns false when already on the first question.
    pub fn previous(&mut self) -> bool {
        self.save_current();
        if self.state == SessionState::InProgress && self.current > 0 {
            self.current -= 1;
            return true;
        }
        false
    }

    /// Finalizes the attempt.
    ///
    /// Returns the attempt to persist the first time it is called while in
    /// progress, and `None` afterwards, so a timer expiry and a manual
    /// submit can never both produce a submission.
    pub fn submit(&mut self) -> Option<SubmitResultRequest> {
        if self.state != SessionState::InProgress {
            return None;
        }
        self.save_current();

        let answers: Vec<Answer> = self
            .questions
            .iter()
            .zip(self.answers.iter())
            .map(|(question, answer)| {
                answer
                    .clone()
                    .unwrap_or_else(|| Answer::record(question, None))
            })
            .collect();

        let total = self.questions.len() as u32;
        let score = scoring::calculate_score(&answers);
        let percentage = scoring::percentage(score, total);
        let elapsed = self
            .started_at
            .map(|start| start.elapsed())
            .unwrap_or_default();

        let attempt = SubmitResultRequest {
            candidate: self.candidate.clone(),
            exam_name: self.exam_name.clone().unwrap_or_default(),
            exam_identifier: self.exam_identifier.clone(),
            answers,
            score,
            total_questions: total,
            percentage,
            duration: scoring::duration_minutes(elapsed),
            passed: scoring::is_passing(percentage),
        };

        self.state = SessionState::Completed;
        self.result = Some(attempt.clone());
        tracing::info!(
            "Exam {} submitted: {}/{} ({}%)",
            attempt.exam_identifier,
            score,
            total,
            percentage
        );
        Some(attempt)
    }

    /// The finalized attempt, available once completed.
    pub fn result(&self) -> Option<&SubmitResultRequest> {
        self.result.as_ref()
    }
}
