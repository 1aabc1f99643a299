use std::fmt;

use clap::ValueEnum;

use crate::schema::{FillBlankQuestion, McqQuestion};

pub const MCQ_TAG: &str = "MCQ";
pub const FILL_BLANK_TAG: &str = "Fill in the blank";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuestionType {
    /// Four options, one correct
    #[value(name = "mcq", alias = "multiple-choice")]
    MultipleChoice,
    /// Free-text answer completing a blank
    #[value(name = "fill-blank", alias = "fill-in-the-blank")]
    FillInTheBlank,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "Multiple Choice"),
            QuestionType::FillInTheBlank => write!(f, "Fill in the Blank"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Lowercase form used inside prompts
    pub fn as_prompt_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// A generated question, normalized for the quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    MultipleChoice {
        question: String,
        options: Vec<String>,
        correct_answer: String,
    },
    FillInTheBlank {
        question: String,
        correct_answer: String,
    },
}

impl Question {
    pub fn text(&self) -> &str {
        match self {
            Question::MultipleChoice { question, .. } | Question::FillInTheBlank { question, .. } => question,
        }
    }

    pub fn correct_answer(&self) -> &str {
        match self {
            Question::MultipleChoice { correct_answer, .. }
            | Question::FillInTheBlank { correct_answer, .. } => correct_answer,
        }
    }

    /// Options for MCQ, empty for fill-in-the-blank
    pub fn options(&self) -> &[String] {
        match self {
            Question::MultipleChoice { options, .. } => options,
            Question::FillInTheBlank { .. } => &[],
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            Question::MultipleChoice { .. } => QuestionType::MultipleChoice,
            Question::FillInTheBlank { .. } => QuestionType::FillInTheBlank,
        }
    }

    /// Tag written to results
    pub fn type_tag(&self) -> &'static str {
        match self {
            Question::MultipleChoice { .. } => MCQ_TAG,
            Question::FillInTheBlank { .. } => FILL_BLANK_TAG,
        }
    }

    /// Whether `answer` is correct. MCQ compares exactly; fill-in-the-blank
    /// ignores case and surrounding whitespace on both sides.
    pub fn is_correct(&self, answer: &str) -> bool {
        match self {
            Question::MultipleChoice { correct_answer, .. } => answer == correct_answer,
            Question::FillInTheBlank { correct_answer, .. } => {
                answer.trim().to_lowercase() == correct_answer.trim().to_lowercase()
            }
        }
    }
}

impl From<McqQuestion> for Question {
    fn from(q: McqQuestion) -> Self {
        Question::MultipleChoice {
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
        }
    }
}

impl From<FillBlankQuestion> for Question {
    fn from(q: FillBlankQuestion) -> Self {
        Question::FillInTheBlank {
            question: q.question,
            correct_answer: q.correct_answer,
        }
    }
}
