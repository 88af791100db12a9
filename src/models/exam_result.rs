// src/models/exam_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::{Question, QuestionId};

/// The candidate's answer to one question, kept for later review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: QuestionId,
    pub question: String,
    pub selected_answer: Option<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
    pub is_correct: bool,
}

impl Answer {
    /// Records `selected` against `question`, copying the review material.
    pub fn record(question: &Question, selected: Option<String>) -> Self {
        let is_correct = selected
            .as_deref()
            .map(|s| question.is_correct(s))
            .unwrap_or(false);

        Self {
            question_id: question.id.clone(),
            question: question.question.clone(),
            selected_answer: selected,
            correct_answer: question.answer.clone(),
            explanation: question.explanation.clone(),
            reference_image: question.reference_image.clone(),
            is_correct,
        }
    }
}

/// DTO for submitting a completed attempt (a `ResultRecord` without timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_score))]
pub struct SubmitResultRequest {
    #[validate(custom(function = validate_candidate))]
    pub candidate: String,
    #[validate(length(min = 1, max = 200))]
    pub exam_name: String,
    pub exam_identifier: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    /// Minutes spent on the attempt.
    pub duration: u64,
    pub passed: bool,
}

/// One entry of the persisted results log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(flatten)]
    pub attempt: SubmitResultRequest,
    /// Assigned by the server when the record is appended.
    pub timestamp: DateTime<Utc>,
}

fn validate_candidate(candidate: &str) -> Result<(), validator::ValidationError> {
    if candidate.trim().is_empty() {
        return Err(validator::ValidationError::new("candidate_cannot_be_empty"));
    }
    Ok(())
}

fn validate_score(req: &SubmitResultRequest) -> Result<(), validator::ValidationError> {
    if req.score > req.total_questions {
        return Err(validator::ValidationError::new("score_exceeds_total"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(candidate: &str) -> SubmitResultRequest {
        SubmitResultRequest {
            candidate: candidate.to_string(),
            exam_name: "aws".to_string(),
            exam_identifier: format!("aws010125_{}", candidate),
            answers: vec![],
            score: 7,
            total_questions: 10,
            percentage: 70,
            duration: 12,
            passed: true,
        }
    }

    #[test]
    fn test_record_uses_camel_case_fields() {
        let record = ResultRecord {
            attempt: attempt("Ada"),
            timestamp: "2025-01-01T10:00:00Z".parse().unwrap(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["examIdentifier"], "aws010125_Ada");
        assert_eq!(value["totalQuestions"], 10);
        assert_eq!(value["timestamp"], "2025-01-01T10:00:00Z");
        assert!(value.get("attempt").is_none());
    }

    #[test]
    fn test_answer_record_correctness() {
        let question: Question = serde_json::from_value(serde_json::json!({
            "ID": 1, "Question": "2+2?", "Options": ["3", "4"], "Answer": "4",
            "Explanation": "arithmetic"
        }))
        .unwrap();

        let right = Answer::record(&question, Some("4".to_string()));
        assert!(right.is_correct);
        assert_eq!(right.explanation.as_deref(), Some("arithmetic"));

        let wrong = Answer::record(&question, Some("3".to_string()));
        assert!(!wrong.is_correct);

        let skipped = Answer::record(&question, None);
        assert!(!skipped.is_correct);
        assert_eq!(serde_json::to_value(&skipped).unwrap()["selectedAnswer"], serde_json::Value::Null);
    }

    #[test]
    fn test_submission_validation() {
        assert!(attempt("Ada").validate().is_ok());
        assert!(attempt("   ").validate().is_err());

        let mut inflated = attempt("Ada");
        inflated.score = 11;
        assert!(inflated.validate().is_err());
    }
}
