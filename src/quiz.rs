//! Quiz session: build a question set, collect answers, score, export.
//!
//! A [`QuizSession`] is the whole per-user state. `build` recreates it from
//! scratch; nothing is persisted except an explicit CSV export.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::core::LowLevelClient;
use crate::error::{ExportError, SessionError};
use crate::generator::QuestionGenerator;
use crate::question::{Difficulty, Question, QuestionType};

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 10;
pub const DEFAULT_QUESTIONS: usize = 5;
pub const DEFAULT_RESULTS_PREFIX: &str = "quiz_results";

/// Separator between MCQ options in the CSV `options` column
pub const OPTIONS_SEPARATOR: &str = " | ";

/// Outcome for one answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationResult {
    /// 1-based position of the question in the quiz
    pub question_number: usize,
    pub question: String,
    pub question_type: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    question_number: usize,
    question: &'a str,
    question_type: &'a str,
    user_answer: &'a str,
    correct_answer: &'a str,
    is_correct: bool,
    options: String,
}

impl<'a> From<&'a EvaluationResult> for CsvRow<'a> {
    fn from(r: &'a EvaluationResult) -> Self {
        Self {
            question_number: r.question_number,
            question: &r.question,
            question_type: &r.question_type,
            user_answer: &r.user_answer,
            correct_answer: &r.correct_answer,
            is_correct: r.is_correct,
            options: r.options.join(OPTIONS_SEPARATOR),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    /// Sparse: only questions the user has answered
    answers: BTreeMap<usize, String>,
    results: Vec<EvaluationResult>,
    last_error: Option<String>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop questions, answers, results and any stored error.
    pub fn reset(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.results.clear();
        self.last_error = None;
    }

    /// Generate `count` questions, one model call after another.
    ///
    /// Returns `false` when any generation fails; the session is then left
    /// empty and [`last_error`](Self::last_error) describes the failure.
    #[instrument(target = "study_buddy::quiz", skip(self, generator))]
    pub async fn build<C: LowLevelClient>(
        &mut self,
        generator: &QuestionGenerator<C>,
        topic: &str,
        question_type: QuestionType,
        difficulty: Difficulty,
        count: usize,
    ) -> bool {
        self.reset();

        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
            let message = format!(
                "Number of questions must be between {} and {}, got {}",
                MIN_QUESTIONS, MAX_QUESTIONS, count
            );
            warn!(count, "{}", message);
            self.last_error = Some(message);
            return false;
        }

        let mut questions = Vec::with_capacity(count);
        let mut previous: Vec<String> = Vec::with_capacity(count);

        for index in 0..count {
            match generator.generate(topic, difficulty, question_type, &previous).await {
                Ok(question) => {
                    previous.push(question.text().to_string());
                    questions.push(question);
                }
                Err(e) => {
                    error!(error = %e, question = index + 1, "Abandoning quiz build");
                    self.last_error = Some(format!("Error generating question: {}", e));
                    return false;
                }
            }
        }

        info!(count = questions.len(), "Quiz built");
        self.questions = questions;
        true
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Store the current input for question `index` (0-based).
    ///
    /// Empty input leaves the question unanswered.
    pub fn record_answer(&mut self, index: usize, answer: impl Into<String>) -> Result<(), SessionError> {
        if index >= self.questions.len() {
            return Err(SessionError::NoSuchQuestion {
                number: index + 1,
                len: self.questions.len(),
            });
        }

        let answer = answer.into();
        if answer.is_empty() {
            self.answers.remove(&index);
        } else {
            self.answers.insert(index, answer);
        }
        Ok(())
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    /// Answered questions as `(index, answer)`, in question order.
    pub fn user_answers(&self) -> Vec<(usize, &str)> {
        self.answers.iter().map(|(i, a)| (*i, a.as_str())).collect()
    }

    /// Forget answers and results but keep the questions, for a retake.
    pub fn clear_answers(&mut self) {
        self.answers.clear();
        self.results.clear();
    }

    /// Score every answered question. Unanswered questions are skipped.
    pub fn evaluate(&mut self) -> &[EvaluationResult] {
        self.results = self
            .answers
            .iter()
            .filter_map(|(&index, answer)| {
                let question = self.questions.get(index)?;
                Some(EvaluationResult {
                    question_number: index + 1,
                    question: question.text().to_string(),
                    question_type: question.type_tag().to_string(),
                    user_answer: answer.clone(),
                    correct_answer: question.correct_answer().to_string(),
                    is_correct: question.is_correct(answer),
                    options: question.options().to_vec(),
                })
            })
            .collect();

        info!(evaluated = self.results.len(), correct = self.score().0, "Quiz evaluated");
        &self.results
    }

    pub fn results(&self) -> &[EvaluationResult] {
        &self.results
    }

    /// `(correct, evaluated)`
    pub fn score(&self) -> (usize, usize) {
        let correct = self.results.iter().filter(|r| r.is_correct).count();
        (correct, self.results.len())
    }

    /// Percentage of evaluated answers that are correct, `None` before any.
    pub fn score_percent(&self) -> Option<f64> {
        match self.score() {
            (_, 0) => None,
            (correct, total) => Some(correct as f64 / total as f64 * 100.0),
        }
    }

    /// Write the results to `<dir>/<prefix>_<YYYYMMDD_HHMMSS>.csv`.
    ///
    /// Returns `Ok(None)` without touching the filesystem when there is
    /// nothing to save.
    #[instrument(target = "study_buddy::quiz", skip(self))]
    pub fn save_to_csv(&self, dir: &Path, prefix: &str) -> Result<Option<PathBuf>, ExportError> {
        if self.results.is_empty() {
            warn!("No quiz results to save");
            return Ok(None);
        }

        fs::create_dir_all(dir)?;
        let (path, file) = create_results_file(dir, prefix)?;

        let mut writer = csv::Writer::from_writer(file);
        for result in &self.results {
            writer.serialize(CsvRow::from(result))?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = self.results.len(), "Results saved");
        Ok(Some(path))
    }
}

/// Create `<prefix>_<YYYYMMDD_HHMMSS>.csv` without clobbering an earlier
/// export; a second save within the same second gets a `_2`, `_3`... suffix.
fn create_results_file(dir: &Path, prefix: &str) -> io::Result<(PathBuf, File)> {
    let stem = format!("{}_{}", prefix, Local::now().format("%Y%m%d_%H%M%S"));
    let mut attempt = 1;

    loop {
        let name = match attempt {
            1 => format!("{}.csv", stem),
            n => format!("{}_{}.csv", stem, n),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Results file exists, trying next name");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
