// src/store/results.rs

use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use serde_json::Value;
use tokio::{fs, sync::Mutex};

use crate::{
    error::AppError,
    models::exam_result::{ResultRecord, SubmitResultRequest},
};

/// Append-only log of completed attempts, stored as one JSON array.
///
/// Appends go through a single writer lock and replace the file with a
/// rename, so concurrent submissions in one process never lose updates
/// and readers never observe a half-written file.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamps `attempt` with the current time and appends it to the log.
    ///
    /// Existing content that cannot be parsed is moved aside to a
    /// `.corrupt-<timestamp>` sibling and a new log is started.
    pub async fn append_result(
        &self,
        attempt: SubmitResultRequest,
    ) -> Result<ResultRecord, AppError> {
        let _guard = self.writer.lock().await;

        let mut records = match self.read_log().await {
            Ok(records) => records,
            Err(AppError::ParseError(e)) => {
                let aside = self.move_aside().await?;
                tracing::error!("Corrupt results file ({}), moved to {:?}", e, aside);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let record = ResultRecord {
            attempt,
            timestamp: Utc::now(),
        };
        records.push(record.clone());
        self.write_log(&records).await?;

        tracing::info!(
            candidate = %record.attempt.candidate,
            exam_identifier = %record.attempt.exam_identifier,
            score = record.attempt.score,
            "Result appended ({} records)",
            records.len()
        );
        Ok(record)
    }

    /// Returns every recorded result. Missing or corrupt logs read as empty.
    pub async fn list_results(&self) -> Vec<ResultRecord> {
        match self.read_log().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Error reading results file {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    async fn read_log(&self) -> Result<Vec<ResultRecord>, AppError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::StorageError(e.to_string())),
        };
        parse_log(&content).map_err(|e| AppError::ParseError(format!("{:?}: {}", self.path, e)))
    }

    async fn move_aside(&self) -> Result<PathBuf, AppError> {
        let mut aside: OsString = self.path.clone().into_os_string();
        aside.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
        let aside = PathBuf::from(aside);

        fs::rename(&self.path, &aside)
            .await
            .map_err(|e| AppError::StorageError(format!("{:?}: {}", self.path, e)))?;
        Ok(aside)
    }

    async fn write_log(&self, records: &[ResultRecord]) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| AppError::StorageError(e.to_string()))?;

        let mut tmp: OsString = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)
            .await
            .map_err(|e| AppError::StorageError(format!("{:?}: {}", tmp, e)))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::StorageError(format!("{:?}: {}", self.path, e)))?;
        Ok(())
    }
}

/// Parses results-log content.
///
/// Empty content, whitespace, `null` and a JSON string holding only
/// whitespace (e.g. `""`) all mean "no results yet".
pub fn parse_log(content: &str) -> Result<Vec<ResultRecord>, serde_json::Error> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(trimmed)? {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        other => serde_json::from_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("results_log_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("results.json")
    }

    fn attempt(candidate: &str, score: u32) -> SubmitResultRequest {
        SubmitResultRequest {
            candidate: candidate.to_string(),
            exam_name: "aws".to_string(),
            exam_identifier: format!("aws190126_{}", candidate),
            answers: vec![],
            score,
            total_questions: 10,
            percentage: score * 10,
            duration: 5,
            passed: score >= 7,
        }
    }

    #[test]
    fn test_parse_log_empty_forms() {
        assert!(parse_log("").unwrap().is_empty());
        assert!(parse_log("  \n").unwrap().is_empty());
        assert!(parse_log("\"\"").unwrap().is_empty());
        assert!(parse_log("null").unwrap().is_empty());
        assert!(parse_log("[]").unwrap().is_empty());
        assert!(parse_log("{\"oops\": 1}").is_err());
        assert!(parse_log("[1, 2").is_err());
    }

    #[tokio::test]
    async fn test_append_preserves_order_and_stamps() {
        let log = ResultsLog::new(temp_file());

        let before = Utc::now();
        let r1 = log.append_result(attempt("Ada", 7)).await.unwrap();
        let mid = Utc::now();
        let r2 = log.append_result(attempt("Bob", 4)).await.unwrap();

        assert!(r1.timestamp >= before);
        assert!(r2.timestamp >= mid);

        let records = log.list_results().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], r1);
        assert_eq!(records[1], r2);

        // pretty-printed array on disk
        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert!(raw.starts_with("[\n"));
    }

    #[tokio::test]
    async fn test_append_to_empty_string_file() {
        let path = temp_file();
        std::fs::write(&path, "\"\"").unwrap();
        let log = ResultsLog::new(&path);

        assert!(log.list_results().await.is_empty());
        log.append_result(attempt("Ada", 9)).await.unwrap();
        assert_eq!(log.list_results().await.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_log_is_moved_aside_and_appends_continue() {
        let path = temp_file();
        std::fs::write(&path, "[{ broken").unwrap();
        let log = ResultsLog::new(&path);

        assert!(log.list_results().await.is_empty());
        log.append_result(attempt("Ada", 9)).await.unwrap();
        log.append_result(attempt("Bob", 4)).await.unwrap();

        let records = log.list_results().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].attempt.candidate, "Ada");

        let kept: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.starts_with("results.json.corrupt-"))
            .collect();
        assert_eq!(kept.len(), 1);
        let aside = path.parent().unwrap().join(&kept[0]);
        assert_eq!(std::fs::read_to_string(aside).unwrap(), "[{ broken");
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let log = ResultsLog::new(temp_file());

        let mut handles = Vec::new();
        for i in 0..20 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append_result(attempt(&format!("c{}", i), 5)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(log.list_results().await.len(), 20);
    }

    #[tokio::test]
    async fn test_unwritable_location_is_storage_error() {
        let path = std::env::temp_dir()
            .join(format!("missing_parent_{}", rand::random::<u64>()))
            .join("results.json");
        let log = ResultsLog::new(path);

        assert!(matches!(
            log.append_result(attempt("Ada", 9)).await,
            Err(AppError::StorageError(_))
        ));
    }
}
