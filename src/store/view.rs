// src/store/view.rs
//
// Read-time presentation of the results log. Nothing here touches disk.

use serde::{Deserialize, Serialize};

use crate::{config::RESULTS_PAGE_SIZE, models::exam_result::ResultRecord};

/// Query parameters accepted by the results viewer.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResultsQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
}

/// One page of the filtered, newest-first results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsPage {
    pub results: Vec<ResultRecord>,
    pub page: usize,
    pub total_pages: usize,
    pub total_filtered: usize,
    pub total: usize,
}

pub fn sort_newest_first(records: &mut [ResultRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Case-insensitive substring match on exam identifier, candidate and exam name.
pub fn matches_search(record: &ResultRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    let attempt = &record.attempt;
    [&attempt.exam_identifier, &attempt.candidate, &attempt.exam_name]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Exam names containing `term`, ignoring case.
pub fn filter_exam_names(names: &[String], term: &str) -> Vec<String> {
    let term = term.trim().to_lowercase();
    names
        .iter()
        .filter(|name| name.to_lowercase().contains(&term))
        .cloned()
        .collect()
}

/// Sorts, filters and slices `records` into the requested page.
/// Out-of-range pages are clamped to the nearest valid one.
pub fn build_page(mut records: Vec<ResultRecord>, query: &ResultsQuery) -> ResultsPage {
    let total = records.len();
    sort_newest_first(&mut records);

    let term = query.q.as_deref().unwrap_or("");
    let filtered: Vec<ResultRecord> = records
        .into_iter()
        .filter(|r| matches_search(r, term))
        .collect();

    let total_filtered = filtered.len();
    let total_pages = total_filtered.div_ceil(RESULTS_PAGE_SIZE);
    let page = query.page.unwrap_or(1).clamp(1, total_pages.max(1));

    let results = filtered
        .into_iter()
        .skip((page - 1) * RESULTS_PAGE_SIZE)
        .take(RESULTS_PAGE_SIZE)
        .collect();

    ResultsPage {
        results,
        page,
        total_pages,
        total_filtered,
        total,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::exam_result::SubmitResultRequest;

    fn record(candidate: &str, exam: &str, minutes: i64) -> ResultRecord {
        ResultRecord {
            attempt: SubmitResultRequest {
                candidate: candidate.to_string(),
                exam_name: exam.to_string(),
                exam_identifier: format!("{}010125_{}", exam, candidate),
                answers: vec![],
                score: 5,
                total_questions: 10,
                percentage: 50,
                duration: 10,
                passed: false,
            },
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut records = vec![record("a", "aws", 1), record("b", "aws", 3), record("c", "aws", 2)];
        sort_newest_first(&mut records);
        let order: Vec<_> = records.iter().map(|r| r.attempt.candidate.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let r = record("Grace Hopper", "AZ900", 0);
        assert!(matches_search(&r, "grace"));
        assert!(matches_search(&r, "az9"));
        assert!(matches_search(&r, "010125_grace"));
        assert!(matches_search(&r, ""));
        assert!(!matches_search(&r, "lovelace"));
    }

    #[test]
    fn test_pagination_six_per_page() {
        let records: Vec<_> = (0..14).map(|i| record(&format!("c{}", i), "aws", i)).collect();

        let first = build_page(records.clone(), &ResultsQuery::default());
        assert_eq!(first.page, 1);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.results.len(), 6);
        assert_eq!(first.results[0].attempt.candidate, "c13");

        let last = build_page(
            records.clone(),
            &ResultsQuery {
                q: None,
                page: Some(3),
            },
        );
        assert_eq!(last.results.len(), 2);
        assert_eq!(last.results[1].attempt.candidate, "c0");

        let clamped = build_page(
            records,
            &ResultsQuery {
                q: None,
                page: Some(99),
            },
        );
        assert_eq!(clamped.page, 3);
    }

    #[test]
    fn test_filtered_page_counts() {
        let records = vec![
            record("Ada", "aws", 0),
            record("Bob", "gcp", 1),
            record("Ada", "gcp", 2),
        ];
        let page = build_page(
            records,
            &ResultsQuery {
                q: Some("ADA".to_string()),
                page: None,
            },
        );
        assert_eq!(page.total, 3);
        assert_eq!(page.total_filtered, 2);
        assert_eq!(page.total_pages, 1);

        let empty = build_page(Vec::new(), &ResultsQuery::default());
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.results.is_empty());
    }

    #[test]
    fn test_filter_exam_names() {
        let names = vec!["AWS-SAA".to_string(), "az900".to_string(), "gcp".to_string()];
        assert_eq!(filter_exam_names(&names, "a"), vec!["AWS-SAA", "az900"]);
        assert_eq!(filter_exam_names(&names, ""), names);
    }
}
