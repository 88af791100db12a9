// src/store/mod.rs

pub mod exams;
pub mod results;
pub mod view;

pub use exams::ExamStore;
pub use results::ResultsLog;
