//! Record shapes the model is asked to produce.
//!
//! The `question` field is cleaned on the way in: some models answer with the
//! schema's own `{"description": ...}` object instead of a string, so an object
//! contributes its `description` member and any other scalar its text form.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Multiple-choice question as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Multiple Choice Question")]
pub struct McqQuestion {
    /// The question text
    #[serde(deserialize_with = "clean_question")]
    #[schemars(with = "String")]
    pub question: String,
    /// List of 4 options
    pub options: Vec<String>,
    /// The correct answer to the question
    pub correct_answer: String,
}

/// Fill-in-the-blank question as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Fill In The Blank Question")]
pub struct FillBlankQuestion {
    /// The question text with '___' for the blank
    #[serde(deserialize_with = "clean_question")]
    #[schemars(with = "String")]
    pub question: String,
    /// The correct word or phrase filling in the blank
    pub correct_answer: String,
}

fn clean_question<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Object(map) => match map.get("description") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(map).to_string(),
        },
        other => other.to_string(),
    })
}
