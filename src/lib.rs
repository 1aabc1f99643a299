pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod generator;
pub mod json_utils;
pub mod prompts;
pub mod question;
pub mod quiz;
pub mod schema;
pub mod shell;

// Convenient re-exports
pub use generator::{McqValidation, QuestionGenerator, RetryConfig};
pub use question::{Difficulty, Question, QuestionType};
pub use quiz::{EvaluationResult, QuizSession};
