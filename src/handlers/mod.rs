// src/handlers/mod.rs

pub mod exams;
pub mod results;
