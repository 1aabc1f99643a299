//! Line-oriented terminal form driving a [`QuizSession`].
//!
//! Generic over the reader and writer so the whole flow can run against
//! in-memory buffers. End of input anywhere means quit.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::core::LowLevelClient;
use crate::generator::QuestionGenerator;
use crate::question::{Difficulty, Question, QuestionType};
use crate::quiz::{QuizSession, DEFAULT_QUESTIONS, DEFAULT_RESULTS_PREFIX, MAX_QUESTIONS, MIN_QUESTIONS};

/// Values of the settings form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizForm {
    pub question_type: QuestionType,
    pub topic: String,
    pub difficulty: Difficulty,
    pub count: usize,
}

/// Form fields known up front (from the command line). Missing ones are asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPreset {
    pub question_type: Option<QuestionType>,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Save,
    Retake,
    NewQuiz,
    Quit,
}

pub struct Shell<C: LowLevelClient, R: BufRead, W: Write> {
    generator: QuestionGenerator<C>,
    session: QuizSession,
    results_dir: PathBuf,
    quiz_generated: bool,
    quiz_submitted: bool,
    input: R,
    output: W,
}

impl<C: LowLevelClient, R: BufRead, W: Write> Shell<C, R, W> {
    pub fn new(generator: QuestionGenerator<C>, results_dir: PathBuf, input: R, output: W) -> Self {
        Self {
            generator,
            session: QuizSession::new(),
            results_dir,
            quiz_generated: false,
            quiz_submitted: false,
            input,
            output,
        }
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Run the form until the user quits or input ends.
    pub async fn run(&mut self, preset: FormPreset) -> io::Result<()> {
        writeln!(self.output, "AI Study Buddy")?;
        let mut preset = preset;

        loop {
            let Some(form) = self.ask_form(&preset)? else { return Ok(()) };
            // Command line values only pre-fill the first quiz
            preset = FormPreset::default();

            if !self.generate(&form).await? {
                if self.confirm("Try again? (y/N): ")? {
                    continue;
                }
                return Ok(());
            }

            loop {
                if !self.quiz_submitted {
                    if !self.take_quiz()? {
                        return Ok(());
                    }
                    self.submit()?;
                }

                match self.ask_menu()? {
                    Some(MenuChoice::Save) => self.save_results()?,
                    Some(MenuChoice::Retake) => {
                        self.session.clear_answers();
                        self.quiz_submitted = false;
                    }
                    Some(MenuChoice::NewQuiz) => break,
                    Some(MenuChoice::Quit) | None => return Ok(()),
                }
            }
        }
    }

    /// The "generate" action.
    pub async fn generate(&mut self, form: &QuizForm) -> io::Result<bool> {
        self.quiz_submitted = false;
        writeln!(
            self.output,
            "Generating {} {} question(s) about {} ({})...",
            form.count, form.question_type, form.topic, form.difficulty
        )?;
        self.output.flush()?;

        let success = self
            .session
            .build(&self.generator, &form.topic, form.question_type, form.difficulty, form.count)
            .await;
        self.quiz_generated = success;

        if !success {
            let message = self.session.last_error().unwrap_or("Quiz generation failed").to_string();
            writeln!(self.output, "❌ {}", message)?;
        }
        Ok(success)
    }

    /// Ask for an answer to every question. Returns `false` on end of input.
    pub fn take_quiz(&mut self) -> io::Result<bool> {
        if !self.quiz_generated || self.session.is_empty() {
            return Ok(true);
        }
        writeln!(self.output, "\nQuiz")?;

        let questions = self.session.questions().to_vec();
        for (index, question) in questions.iter().enumerate() {
            let number = index + 1;
            writeln!(self.output, "\nQuestion {}: {}", number, question.text())?;

            let answer = match question {
                Question::MultipleChoice { options, .. } => self.ask_choice(number, options)?,
                Question::FillInTheBlank { .. } => {
                    let prompt = format!("Fill in the blank for Question {} (Enter to skip): ", number);
                    self.ask(&prompt)?
                }
            };
            let Some(answer) = answer else { return Ok(false) };

            if let Err(e) = self.session.record_answer(index, answer) {
                warn!(error = %e, "Answer not recorded");
            }
        }
        Ok(true)
    }

    /// The "submit" action: score and print results.
    pub fn submit(&mut self) -> io::Result<()> {
        self.session.evaluate();
        self.quiz_submitted = true;
        self.show_results()
    }

    /// The "save" action. Failures are reported, never fatal.
    pub fn save_results(&mut self) -> io::Result<()> {
        match self.session.save_to_csv(&self.results_dir, DEFAULT_RESULTS_PREFIX) {
            Ok(Some(path)) => writeln!(self.output, "Results saved to {}", path.display()),
            Ok(None) => writeln!(self.output, "No quiz results to save!!"),
            Err(e) => {
                warn!(error = %e, "Failed to save results");
                writeln!(self.output, "⚠️ Failed to save results: {}", e)
            }
        }
    }

    fn show_results(&mut self) -> io::Result<()> {
        writeln!(self.output, "\nQuiz Results")?;

        match self.session.score_percent() {
            Some(percent) => {
                let (correct, total) = self.session.score();
                writeln!(self.output, "Score: {:.1}% ({}/{})", percent, correct, total)?;
            }
            None => writeln!(self.output, "No questions were answered.")?,
        }

        for result in self.session.results() {
            if result.is_correct {
                writeln!(self.output, "✅ Question {}: {}", result.question_number, result.question)?;
                writeln!(self.output, "   Your answer: {}", result.user_answer)?;
            } else {
                writeln!(self.output, "❌ Question {}: {}", result.question_number, result.question)?;
                writeln!(self.output, "   Your answer: {}", result.user_answer)?;
                writeln!(self.output, "   Correct answer: {}", result.correct_answer)?;
            }
            writeln!(self.output, "--------")?;
        }

        let skipped = self.session.questions().len() - self.session.results().len();
        if skipped > 0 {
            writeln!(self.output, "{} unanswered question(s) not scored.", skipped)?;
        }
        Ok(())
    }

    fn ask_form(&mut self, preset: &FormPreset) -> io::Result<Option<QuizForm>> {
        writeln!(self.output, "\nQuiz Settings")?;

        let question_type = match preset.question_type {
            Some(t) => t,
            None => match self.ask_question_type()? {
                Some(t) => t,
                None => return Ok(None),
            },
        };
        let topic = match preset.topic.clone() {
            Some(t) if !t.trim().is_empty() => t,
            _ => match self.ask_topic()? {
                Some(t) => t,
                None => return Ok(None),
            },
        };
        let difficulty = match preset.difficulty {
            Some(d) => d,
            None => match self.ask_difficulty()? {
                Some(d) => d,
                None => return Ok(None),
            },
        };
        let count = match preset.count {
            Some(c) if (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&c) => c,
            _ => match self.ask_count()? {
                Some(c) => c,
                None => return Ok(None),
            },
        };

        let form = QuizForm { question_type, topic, difficulty, count };
        debug!(?form, "Form complete");
        Ok(Some(form))
    }

    fn ask_question_type(&mut self) -> io::Result<Option<QuestionType>> {
        loop {
            let Some(line) = self.ask("Question type [1] Multiple Choice [2] Fill in the Blank (default 1): ")? else {
                return Ok(None);
            };
            match line.trim() {
                "" | "1" => return Ok(Some(QuestionType::MultipleChoice)),
                "2" => return Ok(Some(QuestionType::FillInTheBlank)),
                other => writeln!(self.output, "Invalid choice '{}'. Enter 1 or 2.", other)?,
            }
        }
    }

    fn ask_topic(&mut self) -> io::Result<Option<String>> {
        loop {
            let Some(line) = self.ask("Enter topic (e.g. AI History, Technology): ")? else {
                return Ok(None);
            };
            let topic = line.trim();
            if !topic.is_empty() {
                return Ok(Some(topic.to_string()));
            }
            writeln!(self.output, "Topic cannot be empty.")?;
        }
    }

    fn ask_difficulty(&mut self) -> io::Result<Option<Difficulty>> {
        loop {
            let Some(line) = self.ask("Difficulty [1] Easy [2] Medium [3] Hard (default 2): ")? else {
                return Ok(None);
            };
            match line.trim() {
                "1" => return Ok(Some(Difficulty::Easy)),
                "" | "2" => return Ok(Some(Difficulty::Medium)),
                "3" => return Ok(Some(Difficulty::Hard)),
                other => writeln!(self.output, "Invalid choice '{}'. Enter 1, 2 or 3.", other)?,
            }
        }
    }

    fn ask_count(&mut self) -> io::Result<Option<usize>> {
        let prompt = format!(
            "Number of questions ({}-{}, default {}): ",
            MIN_QUESTIONS, MAX_QUESTIONS, DEFAULT_QUESTIONS
        );
        loop {
            let Some(line) = self.ask(&prompt)? else { return Ok(None) };
            let line = line.trim();
            if line.is_empty() {
                return Ok(Some(DEFAULT_QUESTIONS));
            }
            match line.parse::<usize>() {
                Ok(n) if (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&n) => return Ok(Some(n)),
                _ => writeln!(
                    self.output,
                    "Enter a number between {} and {}.",
                    MIN_QUESTIONS, MAX_QUESTIONS
                )?,
            }
        }
    }

    /// Pick an option by number; Enter skips (empty answer).
    fn ask_choice(&mut self, number: usize, options: &[String]) -> io::Result<Option<String>> {
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, option)?;
        }
        let prompt = format!(
            "Select an answer for Question {} (1-{}, Enter to skip): ",
            number,
            options.len()
        );
        loop {
            let Some(line) = self.ask(&prompt)? else { return Ok(None) };
            let line = line.trim();
            if line.is_empty() {
                return Ok(Some(String::new()));
            }
            match line.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(options[n - 1].clone())),
                _ => writeln!(self.output, "Enter a number between 1 and {}.", options.len())?,
            }
        }
    }

    fn ask_menu(&mut self) -> io::Result<Option<MenuChoice>> {
        loop {
            let Some(line) = self.ask("\n[s] Save results  [r] Retake quiz  [n] New quiz  [q] Quit: ")? else {
                return Ok(None);
            };
            match line.trim().to_lowercase().as_str() {
                "s" => return Ok(Some(MenuChoice::Save)),
                "r" => return Ok(Some(MenuChoice::Retake)),
                "n" => return Ok(Some(MenuChoice::NewQuiz)),
                "q" => return Ok(Some(MenuChoice::Quit)),
                other => writeln!(self.output, "Unknown option '{}'.", other)?,
            }
        }
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self
            .ask(prompt)?
            .map(|line| line.trim().eq_ignore_ascii_case("y"))
            .unwrap_or(false))
    }

    /// Print a prompt and read one line without its line ending. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::{MockClient, MockResponse};
    use crate::generator::RetryConfig;
    use std::io::Cursor;

    fn shell(input: &str, responses: Vec<MockResponse>) -> Shell<MockClient, Cursor<Vec<u8>>, Vec<u8>> {
        let (client, _handle) = MockClient::with_responses(responses);
        let generator = QuestionGenerator::new(client, RetryConfig::default());
        Shell::new(
            generator,
            PathBuf::from("unused"),
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
        )
    }

    fn printed<C: LowLevelClient>(shell: &Shell<C, Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(shell.output()).to_string()
    }

    #[test]
    fn form_reprompts_invalid_values() {
        let mut shell = shell("7\n2\n\n  Rust  \nx\n3\n0\n11\n4\n", vec![]);
        let form = shell.ask_form(&FormPreset::default()).unwrap().unwrap();
        assert_eq!(
            form,
            QuizForm {
                question_type: QuestionType::FillInTheBlank,
                topic: "Rust".into(),
                difficulty: Difficulty::Hard,
                count: 4,
            }
        );
        let out = printed(&shell);
        assert!(out.contains("Invalid choice '7'"));
        assert!(out.contains("Topic cannot be empty."));
        assert!(out.contains("Enter a number between 1 and 10."));
    }

    #[test]
    fn form_defaults_on_enter() {
        let mut shell = shell("\nAI\n\n\n", vec![]);
        let form = shell.ask_form(&FormPreset::default()).unwrap().unwrap();
        assert_eq!(form.question_type, QuestionType::MultipleChoice);
        assert_eq!(form.difficulty, Difficulty::Medium);
        assert_eq!(form.count, DEFAULT_QUESTIONS);
    }

    #[test]
    fn preset_fields_are_not_asked() {
        let mut shell = shell("", vec![]);
        let preset = FormPreset {
            question_type: Some(QuestionType::MultipleChoice),
            topic: Some("AI History".into()),
            difficulty: Some(Difficulty::Easy),
            count: Some(3),
        };
        let form = shell.ask_form(&preset).unwrap().unwrap();
        assert_eq!(form.topic, "AI History");
        assert_eq!(form.count, 3);
    }

    #[test]
    fn end_of_input_cancels_the_form() {
        let mut shell = shell("1\n", vec![]);
        assert!(shell.ask_form(&FormPreset::default()).unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_generation_is_reported() {
        let responses = vec![MockResponse::Failure("down".into()); 3];
        let mut shell = shell("", responses);
        let form = QuizForm {
            question_type: QuestionType::MultipleChoice,
            topic: "AI".into(),
            difficulty: Difficulty::Easy,
            count: 1,
        };
        assert!(!shell.generate(&form).await.unwrap());
        assert!(shell.session().is_empty());
        assert!(printed(&shell).contains("❌ Error generating question"));
    }

    #[tokio::test]
    async fn invalid_choice_is_reprompted_and_blank_skips() {
        let mcq = r#"{"question": "Pick", "options": ["a", "b", "c", "d"], "correct_answer": "b"}"#;
        let responses = vec![MockResponse::Success(mcq.into()), MockResponse::Success(mcq.into())];
        let mut shell = shell("9\n2\n\n", responses);
        let form = QuizForm {
            question_type: QuestionType::MultipleChoice,
            topic: "letters".into(),
            difficulty: Difficulty::Easy,
            count: 2,
        };
        assert!(shell.generate(&form).await.unwrap());
        assert!(shell.take_quiz().unwrap());
        shell.submit().unwrap();

        assert_eq!(shell.session().answer(0), Some("b"));
        assert_eq!(shell.session().answer(1), None);
        let out = printed(&shell);
        assert!(out.contains("Enter a number between 1 and 4."));
        assert!(out.contains("Score: 100.0% (1/1)"));
        assert!(out.contains("1 unanswered question(s) not scored."));
    }
}
