// src/models/mod.rs

pub mod exam_result;
pub mod question;
