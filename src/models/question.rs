// src/models/question.rs

use std::fmt;

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Identifier of a question inside an exam file.
/// Exam authors use either numbers or strings, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Number(n) => write!(f, "{}", n),
            QuestionId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A single multiple-choice question as stored in `<examName>.json`.
///
/// Field names follow the exam file format (`ID`, `Question`, `Options`,
/// `Answer`, `Explanation`, `ReferenceImage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_answer_in_options))]
pub struct Question {
    #[serde(rename = "ID")]
    pub id: QuestionId,

    /// The text content of the question.
    #[serde(rename = "Question")]
    pub question: String,

    /// Option texts, reordered on every read.
    #[serde(rename = "Options")]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,

    /// The correct answer. Must equal one of `options` verbatim.
    #[serde(rename = "Answer")]
    pub answer: String,

    #[serde(rename = "Explanation", default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Path relative to the exam bundle, usually `./images/<file>`.
    #[serde(rename = "ReferenceImage", default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
}

impl Question {
    /// Reorders the options with a uniform random permutation.
    pub fn shuffle_options<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.options.shuffle(rng);
    }

    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.answer
    }

    /// Server-relative URL of the reference image, if any.
    pub fn image_url(&self) -> Option<String> {
        self.reference_image
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(|path| match path.strip_prefix("./images/") {
                Some(rest) => format!("/images/{}", rest),
                None => path.to_string(),
            })
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    Ok(())
}

fn validate_answer_in_options(question: &Question) -> Result<(), validator::ValidationError> {
    if !question.options.iter().any(|opt| opt == &question.answer) {
        return Err(validator::ValidationError::new("answer_not_in_options"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn sample() -> Question {
        Question {
            id: QuestionId::Number(1),
            question: "Which service stores objects?".to_string(),
            options: vec!["S3".into(), "EC2".into(), "RDS".into(), "SQS".into()],
            answer: "S3".to_string(),
            explanation: None,
            reference_image: None,
        }
    }

    #[test]
    fn test_parse_exam_file_format() {
        let raw = r#"[
            {"ID": 7, "Question": "Q?", "Options": ["a", "b"], "Answer": "b",
             "Explanation": "because", "ReferenceImage": "./images/q7.png"},
            {"ID": "x-2", "Question": "Q2?", "Options": ["c"], "Answer": "c"}
        ]"#;
        let questions: Vec<Question> = serde_json::from_str(raw).unwrap();
        assert_eq!(questions[0].id, QuestionId::Number(7));
        assert_eq!(questions[0].explanation.as_deref(), Some("because"));
        assert_eq!(questions[1].id, QuestionId::Text("x-2".to_string()));
        assert_eq!(questions[1].reference_image, None);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let original = sample();
        let mut rng = rand::rng();
        for _ in 0..20 {
            let mut q = original.clone();
            q.shuffle_options(&mut rng);
            assert_eq!(q.options.len(), original.options.len());
            let a: HashSet<_> = q.options.iter().collect();
            let b: HashSet<_> = original.options.iter().collect();
            assert_eq!(a, b);
            assert!(q.options.contains(&q.answer));
        }
    }

    #[test]
    fn test_answer_must_be_an_option() {
        assert!(sample().validate().is_ok());

        let mut bad = sample();
        bad.answer = "Lambda".to_string();
        assert!(bad.validate().is_err());

        let mut empty = sample();
        empty.options.clear();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_image_url_rewrites_prefix() {
        let mut q = sample();
        assert_eq!(q.image_url(), None);

        q.reference_image = Some("./images/diagram.png".to_string());
        assert_eq!(q.image_url().as_deref(), Some("/images/diagram.png"));

        q.reference_image = Some("https://cdn.example.com/a.png".to_string());
        assert_eq!(q.image_url().as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_is_correct_is_exact_match() {
        let q = sample();
        assert!(q.is_correct("S3"));
        assert!(!q.is_correct("s3"));
        assert!(!q.is_correct(" S3"));
    }
}
