
use std::fs;

use study_buddy::clients::mock::MockResponse;
use study_buddy::error::{AttemptError, GeneratorError};
use study_buddy::generator::McqValidation;
use study_buddy::{Difficulty, Question, QuestionType, QuizSession};

use crate::test_utils::{blank_reply, mcq_reply, mock_generator, mock_generator_with_retries};

#[tokio::test]
async fn build_produces_exactly_count_valid_questions() {
    let (generator, handle) = mock_generator((1..=4).map(mcq_reply).collect());
    let mut session = QuizSession::new();

    let built = session
        .build(&generator, "AI History", QuestionType::MultipleChoice, Difficulty::Easy, 4)
        .await;

    assert!(built);
    assert_eq!(session.questions().len(), 4);
    for (i, question) in session.questions().iter().enumerate() {
        match question {
            Question::MultipleChoice { options, correct_answer, .. } => {
                assert_eq!(options.len(), 4);
                assert_eq!(correct_answer, &format!("Right {}", i + 1));
                assert!(options.contains(correct_answer));
            }
            other => panic!("expected MCQ, got {other:?}"),
        }
    }
    assert_eq!(handle.call_count(), 4);
}

#[tokio::test]
async fn later_prompts_list_earlier_questions() {
    let (generator, handle) = mock_generator((1..=3).map(mcq_reply).collect());
    let mut session = QuizSession::new();
    assert!(
        session
            .build(&generator, "AI History", QuestionType::MultipleChoice, Difficulty::Medium, 3)
            .await
    );

    let prompts = handle.prompts();
    assert!(!prompts[0].contains("Do not repeat"));
    assert!(prompts[2].contains("- AI history question 1?"));
    assert!(prompts[2].contains("- AI history question 2?"));
}

#[tokio::test]
async fn answering_only_question_two_scores_one_result() {
    let (generator, _handle) = mock_generator((1..=3).map(mcq_reply).collect());
    let mut session = QuizSession::new();
    assert!(
        session
            .build(&generator, "AI History", QuestionType::MultipleChoice, Difficulty::Easy, 3)
            .await
    );

    session.record_answer(1, "Right 2").unwrap();
    let results = session.evaluate();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].question_number, 2);
    assert_eq!(results[0].correct_answer, "Right 2");
    assert!(results[0].is_correct);
    assert_eq!(results[0].question_type, "MCQ");
}

#[tokio::test]
async fn fill_blank_scoring_ignores_case_and_spacing() {
    let (generator, _handle) = mock_generator(vec![
        blank_reply("The capital of France is __.", "Paris"),
        blank_reply("The capital of Italy is __.", "Rome"),
    ]);
    let mut session = QuizSession::new();
    assert!(
        session
            .build(&generator, "Geography", QuestionType::FillInTheBlank, Difficulty::Easy, 2)
            .await
    );

    session.record_answer(0, "Paris ").unwrap();
    session.record_answer(1, "milan").unwrap();
    let results = session.evaluate();

    assert!(results[0].is_correct);
    assert!(!results[1].is_correct);
    assert_eq!(results[1].correct_answer, "Rome");
    assert!(results[0].options.is_empty());
    assert_eq!(session.score(), (1, 2));
}

#[tokio::test]
async fn retry_exhaustion_leaves_no_partial_quiz() {
    let mut responses = vec![mcq_reply(1)];
    responses.extend(std::iter::repeat(MockResponse::Failure("503".into())).take(2));
    let (generator, handle) = mock_generator_with_retries(responses, 2);
    let mut session = QuizSession::new();

    let built = session
        .build(&generator, "AI History", QuestionType::MultipleChoice, Difficulty::Hard, 3)
        .await;

    assert!(!built);
    assert!(session.is_empty());
    assert_eq!(handle.call_count(), 3);
    let message = session.last_error().unwrap();
    assert!(message.contains("after 2 attempts"), "{message}");
}

#[tokio::test]
async fn rebuilding_discards_previous_state() {
    let (generator, _handle) = mock_generator((1..=3).map(mcq_reply).collect());
    let mut session = QuizSession::new();
    assert!(
        session
            .build(&generator, "AI", QuestionType::MultipleChoice, Difficulty::Easy, 1)
            .await
    );
    session.record_answer(0, "Right 1").unwrap();
    session.evaluate();

    assert!(
        session
            .build(&generator, "AI", QuestionType::MultipleChoice, Difficulty::Easy, 2)
            .await
    );
    assert_eq!(session.questions().len(), 2);
    assert!(session.user_answers().is_empty());
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn count_outside_form_bounds_is_refused() {
    let (generator, handle) = mock_generator(vec![]);
    let mut session = QuizSession::new();

    assert!(
        !session
            .build(&generator, "AI", QuestionType::MultipleChoice, Difficulty::Easy, 0)
            .await
    );
    assert!(
        !session
            .build(&generator, "AI", QuestionType::MultipleChoice, Difficulty::Easy, 11)
            .await
    );
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn strict_validation_rejects_answer_outside_options() {
    let reply = MockResponse::Success(
        r#"{"question": "Q?", "options": ["a", "b", "c", "d"], "correct_answer": "e"}"#.into(),
    );
    let (generator, _handle) = mock_generator(vec![reply.clone(), reply]);

    let lenient = generator.generate_mcq("AI", Difficulty::Easy, &[]).await;
    assert!(lenient.is_ok());

    let strict = generator
        .clone()
        .with_mcq_validation(McqValidation::Strict)
        .generate_mcq("AI", Difficulty::Easy, &[])
        .await;
    assert!(matches!(strict, Err(GeneratorError::Validation(_))));
}

#[tokio::test]
async fn unparseable_replies_surface_the_last_parse_error() {
    let (generator, _handle) = mock_generator_with_retries(
        vec![
            MockResponse::Success("Sorry, I cannot help with that.".into()),
            MockResponse::Success(r#"{"question": "Q __"}"#.into()),
        ],
        2,
    );

    let err = generator
        .generate_fill_blank("AI", Difficulty::Easy, &[])
        .await
        .unwrap_err();
    match err {
        GeneratorError::MaxRetriesExceeded { attempts: 2, source: AttemptError::JsonDeserialization(_, raw) } => {
            assert!(raw.contains("Q __"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn saving_without_results_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let results_dir = dir.path().join("results");
    let session = QuizSession::new();

    let saved = session.save_to_csv(&results_dir, "quiz_results").unwrap();

    assert!(saved.is_none());
    assert!(!results_dir.exists());
}

#[tokio::test]
async fn saved_csv_matches_evaluation() {
    let (generator, _handle) = mock_generator((1..=3).map(mcq_reply).collect());
    let mut session = QuizSession::new();
    assert!(
        session
            .build(&generator, "AI History", QuestionType::MultipleChoice, Difficulty::Easy, 3)
            .await
    );
    session.record_answer(0, "Right 1").unwrap();
    session.record_answer(2, "Wrong A").unwrap();
    session.evaluate();

    let dir = tempfile::tempdir().unwrap();
    let results_dir = dir.path().join("results");
    let path = session.save_to_csv(&results_dir, "quiz_results").unwrap().unwrap();

    assert_eq!(fs::read_dir(&results_dir).unwrap().count(), 1);
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("quiz_results_"));
    assert!(name.ends_with(".csv"));
    // quiz_results_YYYYMMDD_HHMMSS.csv
    assert_eq!(name.len(), "quiz_results_".len() + 15 + ".csv".len());

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["question_number", "question", "question_type", "user_answer", "correct_answer", "is_correct", "options"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), session.results().len());
    for (row, result) in rows.iter().zip(session.results()) {
        assert_eq!(row[0], result.question_number.to_string());
        assert_eq!(row[5], result.is_correct.to_string());
    }
    assert_eq!(&rows[0][6], "Right 1 | Wrong A | Wrong B | Wrong C");
    assert_eq!(&rows[1][0], "3");
    assert_eq!(&rows[1][5], "false");
}
