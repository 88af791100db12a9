// src/config.rs

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;

use crate::error::AppError;

/// Minimum percentage required to pass an exam.
pub const PASSING_SCORE_PERCENTAGE: u32 = 70;

/// Time budget granted per question, in minutes.
pub const MINUTES_PER_QUESTION: u64 = 3;

/// Number of records shown per page by the results viewer.
pub const RESULTS_PAGE_SIZE: usize = 6;

#[derive(Debug, Clone)]
pub struct Config {
    pub exams_dir: PathBuf,
    pub results_file: PathBuf,
    pub images_dir: PathBuf,
    pub public_dir: PathBuf,
    pub log_dir: PathBuf,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let exams_dir = env::var("EXAMS_DIR").unwrap_or_else(|_| "exams".to_string());
        let results_file =
            env::var("RESULTS_FILE").unwrap_or_else(|_| "results.json".to_string());
        let images_dir = env::var("IMAGES_DIR").unwrap_or_else(|_| "images".to_string());
        let public_dir = env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string());
        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let port = parse_port(env::var("PORT").ok())?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            exams_dir: exams_dir.into(),
            results_file: results_file.into(),
            images_dir: images_dir.into(),
            public_dir: public_dir.into(),
            log_dir: log_dir.into(),
            port,
            cors_origins,
            rust_log,
        })
    }
}

/// `PORT` defaults to 80 when unset.
fn parse_port(value: Option<String>) -> Result<u16, AppError> {
    let Some(value) = value else {
        return Ok(80);
    };
    value.trim().parse().map_err(|e| {
        AppError::ValidationError(format!("PORT must be a valid port number, got '{}': {}", value, e))
    })
}
