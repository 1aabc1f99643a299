//! Question generation: prompt, call, parse, retry, validate.
//!
//! Each attempt reissues the full model call. Transport failures, responses
//! without JSON and JSON that does not match the record shape are all retried
//! up to [`RetryConfig::max_retries`] attempts; the structural check runs once
//! on the parsed record and is not retried.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::config::DEFAULT_MAX_RETRIES;
use crate::core::LowLevelClient;
use crate::error::{AttemptError, GeneratorError, ValidationError};
use crate::json_utils::extract_first;
use crate::prompts::{
    add_avoid_list, add_schema_guidance, format_prompt, FILL_BLANK_PROMPT_TEMPLATE, MCQ_PROMPT_TEMPLATE,
};
use crate::question::{Difficulty, Question, QuestionType};
use crate::schema::{FillBlankQuestion, McqQuestion};

/// Marker a fill-in-the-blank question must contain
pub const BLANK_MARKER: &str = "__";
pub const MCQ_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts per question, including the first
    pub max_retries: usize,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: Duration::ZERO,
        }
    }
}

/// Rule applied to a parsed multiple-choice question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum McqValidation {
    /// Reject only when the option count is wrong AND the answer is not an option
    #[default]
    Lenient,
    /// Reject when the option count is wrong OR the answer is not an option
    Strict,
}

impl McqValidation {
    /// Parse from string (case insensitive)
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("Unknown MCQ validation: '{}'. Supported: lenient, strict", s)),
        }
    }

    pub fn validate(&self, question: &McqQuestion) -> Result<(), ValidationError> {
        let found = question.options.len();
        let count_ok = found == MCQ_OPTION_COUNT;
        let answer_listed = question.options.contains(&question.correct_answer);

        match self {
            McqValidation::Strict if !count_ok => Err(ValidationError::OptionCount { found }),
            McqValidation::Strict if !answer_listed => Err(ValidationError::AnswerNotAnOption {
                answer: question.correct_answer.clone(),
            }),
            McqValidation::Lenient if !count_ok && !answer_listed => Err(ValidationError::OptionsAndAnswer {
                found,
                answer: question.correct_answer.clone(),
            }),
            McqValidation::Lenient if !count_ok || !answer_listed => {
                warn!(
                    options = found,
                    answer_listed,
                    "MCQ accepted by lenient validation but would fail strict validation"
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for McqValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McqValidation::Lenient => write!(f, "lenient"),
            McqValidation::Strict => write!(f, "strict"),
        }
    }
}

pub fn validate_fill_blank(question: &FillBlankQuestion) -> Result<(), ValidationError> {
    if question.question.contains(BLANK_MARKER) {
        Ok(())
    } else {
        Err(ValidationError::MissingBlank)
    }
}

/// Generates one validated question per call.
#[derive(Debug, Clone)]
pub struct QuestionGenerator<C: LowLevelClient> {
    client: C,
    retry: RetryConfig,
    mcq_validation: McqValidation,
}

impl<C: LowLevelClient> QuestionGenerator<C> {
    pub fn new(client: C, retry: RetryConfig) -> Self {
        info!(max_retries = retry.max_retries, "Creating new QuestionGenerator");
        Self {
            client,
            retry,
            mcq_validation: McqValidation::default(),
        }
    }

    pub fn with_mcq_validation(mut self, mcq_validation: McqValidation) -> Self {
        self.mcq_validation = mcq_validation;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Generate one question of the requested type.
    ///
    /// `previous` holds question texts already accepted in the current quiz;
    /// the model is asked not to repeat them.
    pub async fn generate(
        &self,
        topic: &str,
        difficulty: Difficulty,
        question_type: QuestionType,
        previous: &[String],
    ) -> Result<Question, GeneratorError> {
        match question_type {
            QuestionType::MultipleChoice => self.generate_mcq(topic, difficulty, previous).await.map(Question::from),
            QuestionType::FillInTheBlank => self
                .generate_fill_blank(topic, difficulty, previous)
                .await
                .map(Question::from),
        }
    }

    #[instrument(target = "study_buddy::generator", skip(self, previous), fields(previous = previous.len()))]
    pub async fn generate_mcq(
        &self,
        topic: &str,
        difficulty: Difficulty,
        previous: &[String],
    ) -> Result<McqQuestion, GeneratorError> {
        let question: McqQuestion = self
            .retry_and_parse(MCQ_PROMPT_TEMPLATE, topic, difficulty, previous)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to generate MCQ"))?;

        self.mcq_validation.validate(&question).inspect_err(|e| {
            error!(error = %e, "Failed to generate MCQ");
        })?;

        info!("Generated a valid MCQ");
        Ok(question)
    }

    #[instrument(target = "study_buddy::generator", skip(self, previous), fields(previous = previous.len()))]
    pub async fn generate_fill_blank(
        &self,
        topic: &str,
        difficulty: Difficulty,
        previous: &[String],
    ) -> Result<FillBlankQuestion, GeneratorError> {
        let question: FillBlankQuestion = self
            .retry_and_parse(FILL_BLANK_PROMPT_TEMPLATE, topic, difficulty, previous)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to generate fill-in-the-blank question"))?;

        validate_fill_blank(&question)
            .inspect_err(|e| error!(error = %e, "Failed to generate fill-in-the-blank question"))?;

        info!("Generated a valid fill-in-the-blank question");
        Ok(question)
    }

    /// Call the model until a `T` can be parsed or attempts run out.
    async fn retry_and_parse<T>(
        &self,
        template: &str,
        topic: &str,
        difficulty: Difficulty,
        previous: &[String],
    ) -> Result<T, GeneratorError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let prompt = format_prompt(template, topic, difficulty.as_prompt_str());
        let prompt = add_schema_guidance::<T>(add_avoid_list(prompt, previous));
        let max_retries = self.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(attempt, max_retries, topic, difficulty = difficulty.as_prompt_str(), "Generating question");

            match self.attempt::<T>(prompt.clone()).await {
                Ok(parsed) => {
                    info!(attempt, "Successfully parsed the question");
                    return Ok(parsed);
                }
                Err(e) if attempt >= max_retries => {
                    error!(error = %e, attempts = attempt, "Max retries exceeded");
                    return Err(GeneratorError::MaxRetriesExceeded { attempts: attempt, source: e });
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Generation attempt failed");
                    if !self.retry.delay.is_zero() {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, prompt: String) -> Result<T, AttemptError> {
        let raw = self.client.ask_raw(prompt).await?;
        debug!(response_len = raw.len(), "Received model response");
        extract_first::<T>(&raw)
    }
}
