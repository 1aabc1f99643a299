use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use study_buddy::clients::{ClientType, FlexibleClient};
use study_buddy::config::Settings;
use study_buddy::shell::{FormPreset, Shell};
use study_buddy::{Difficulty, McqValidation, QuestionGenerator, QuestionType};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "📚 AI Study Buddy: generate and take quizzes on any topic", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    GROQ_API_KEY                       API key for the Groq client
    DEEPSEEK_API_KEY                   API key for the DeepSeek client
    STUDY_BUDDY_CLIENT                 groq|deepseek|mock [default: groq, deepseek if only its key is set]
    STUDY_BUDDY_MODEL                  Model id override
    STUDY_BUDDY_MAX_RETRIES            Attempts per question [default: 3]
    STUDY_BUDDY_RETRY_DELAY_MS         Pause between attempts [default: 0]
    STUDY_BUDDY_REQUEST_TIMEOUT_SECS   HTTP timeout [default: none]
    STUDY_BUDDY_RESULTS_DIR            Where CSV results go [default: results]
    STUDY_BUDDY_MCQ_VALIDATION         lenient|strict [default: lenient]
    RUST_LOG                           Log filter [default: warn]

EXAMPLES:
    study-buddy                                    # Fill in the form interactively
    study-buddy --topic \"AI History\" -d easy -n 3  # Skip the form fields given here
    study-buddy --client mock                      # Offline sample questions")]
struct Args {
    /// Question type
    #[arg(short = 't', long = "type", value_enum)]
    question_type: Option<QuestionType>,

    /// Quiz topic
    #[arg(long)]
    topic: Option<String>,

    /// Difficulty level
    #[arg(short, long, value_enum)]
    difficulty: Option<Difficulty>,

    /// Number of questions (1-10)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u8).range(1..=10))]
    count: Option<u8>,

    /// Model provider [default: groq, deepseek if only its key is set]
    #[arg(short, long, value_enum)]
    client: Option<ClientType>,

    /// Model id override
    #[arg(short, long)]
    model: Option<String>,

    /// Attempts per question before giving up
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    max_retries: Option<u16>,

    /// Directory for exported results
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// How strictly multiple-choice questions are checked
    #[arg(long, value_enum)]
    mcq_validation: Option<McqValidation>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(client) = self.client {
            settings.client = Some(client);
        }
        if let Some(model) = &self.model {
            settings.model = Some(model.clone());
        }
        if let Some(max_retries) = self.max_retries {
            settings.retry.max_retries = usize::from(max_retries);
        }
        if let Some(dir) = &self.results_dir {
            settings.results_dir = dir.clone();
        }
        if let Some(mcq_validation) = self.mcq_validation {
            settings.mcq_validation = mcq_validation;
        }
    }

    fn preset(&self) -> FormPreset {
        FormPreset {
            question_type: self.question_type,
            topic: self.topic.clone(),
            difficulty: self.difficulty,
            count: self.count.map(usize::from),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = Settings::from_env().context("Invalid configuration")?;
    args.apply(&mut settings);

    let client = FlexibleClient::from_settings(&settings).context("Could not create model client")?;
    let generator =
        QuestionGenerator::new(client, settings.retry.clone()).with_mcq_validation(settings.mcq_validation);

    let stdin = io::stdin();
    let mut shell = Shell::new(generator, settings.results_dir.clone(), stdin.lock(), io::stdout());
    shell.run(args.preset()).await.context("Terminal I/O failed")?;

    Ok(())
}
