use crate::config::Config;
use crate::store::{ExamStore, ResultsLog};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: ExamStore,
    pub results: ResultsLog,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: ExamStore::new(&config.exams_dir),
            results: ResultsLog::new(&config.results_file),
            config,
        }
    }
}

impl FromRef<AppState> for ExamStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for ResultsLog {
    fn from_ref(state: &AppState) -> Self {
        state.results.clone()
    }
}
