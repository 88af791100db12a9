// src/store/exams.rs

use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::LazyLock,
};

use regex::Regex;
use tokio::fs;
use validator::Validate;

use crate::{error::AppError, models::question::Question};

// Path separators, NUL, any `..` and a leading dot.
static UNSAFE_EXAM_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\\x00]|\.\.|^\.").unwrap());

/// Whether `name` can be mapped to a file inside the exams directory
/// without escaping it. `list_exams` only reports names that pass.
pub fn is_safe_exam_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 200 && !UNSAFE_EXAM_NAME.is_match(name)
}

/// Read-only access to the exam definitions directory.
///
/// Every exam is a `<examName>.json` file holding an array of questions.
/// Nothing is cached: each call reads the file again and reshuffles options.
#[derive(Debug, Clone)]
pub struct ExamStore {
    dir: PathBuf,
}

impl ExamStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Lists exam names (file names without `.json`), sorted.
    /// A missing directory yields an empty list.
    pub async fn list_exams(&self) -> Result<Vec<String>, AppError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Exams directory {:?} does not exist", self.dir);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(name) = file_name.strip_suffix(".json") else {
                continue;
            };
            if is_safe_exam_name(name) {
                names.push(name.to_string());
            } else {
                tracing::debug!("Skipping exam file {:?}", file_name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Loads the named exam and returns its questions with every option
    /// list independently shuffled.
    pub async fn get_questions(&self, exam_name: &str) -> Result<Vec<Question>, AppError> {
        let mut questions = self.load(exam_name).await?;
        shuffle_options(&mut questions);
        Ok(questions)
    }

    async fn load(&self, exam_name: &str) -> Result<Vec<Question>, AppError> {
        if !is_safe_exam_name(exam_name) {
            return Err(AppError::BadRequest(format!("Invalid exam name '{}'", exam_name)));
        }

        let path = self.dir.join(format!("{}.json", exam_name));
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Exam file not found: {:?}", path);
                return Err(AppError::NotFound("Exam file not found.".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let questions: Vec<Question> = serde_json::from_str(&content)
            .map_err(|e| AppError::ParseError(format!("{:?}: {}", path, e)))?;

        for question in &questions {
            question.validate().map_err(|e| {
                AppError::ParseError(format!("{:?}: question {}: {}", path, question.id, e))
            })?;
        }

        tracing::debug!("Loaded exam '{}' with {} questions", exam_name, questions.len());
        Ok(questions)
    }
}

fn shuffle_options(questions: &mut [Question]) {
    let mut rng = rand::rng();
    for question in questions {
        question.shuffle_options(&mut rng);
    }
}
