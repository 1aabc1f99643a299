use thiserror::Error;

#[derive(Error, Debug)]
pub enum AIError {
    #[error("Groq API error: {0}")]
    Groq(ProviderError),
    #[error("DeepSeek API error: {0}")]
    DeepSeek(ProviderError),
    #[error("Mock error: {0}")]
    Mock(String),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

/// Failure of a single generation attempt. Every variant is retried.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("AI error: {0}")]
    Ai(#[from] AIError),
    #[error("JSON deserialization error: {0}. Raw response: {1}")]
    JsonDeserialization(#[source] serde_json::Error, String),
    #[error("No JSON object found in response: {0}")]
    NoStructuredData(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid MCQ structure: expected 4 options, found {found}")]
    OptionCount { found: usize },
    #[error("Invalid MCQ structure: correct answer {answer:?} is not one of the options")]
    AnswerNotAnOption { answer: String },
    #[error("Invalid MCQ structure: {found} options and correct answer {answer:?} is not one of them")]
    OptionsAndAnswer { found: usize, answer: String },
    #[error("Fill in blanks should contain '__'")]
    MissingBlank,
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Generation failed after {attempts} attempts: {source}")]
    MaxRetriesExceeded {
        attempts: usize,
        #[source]
        source: AttemptError,
    },
    #[error("Generated question failed validation: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write results file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Missing API key: set {0} in the environment or .env")]
    MissingKey(&'static str),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Question {number} does not exist (quiz has {len} questions)")]
    NoSuchQuestion { number: usize, len: usize },
}
