// tests/scoring_pipeline.rs
//
// Drives the pure scoring pipeline (grade -> fold into aggregates ->
// evaluate awards) across multi-submission journeys, the same sequence
// the submit handler runs per request.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::types::Json;

use arealearn_backend::models::award::{Award, AwardCriteria};
use arealearn_backend::models::quiz::{Question, QuestionOption, Quiz, SubmittedAnswer};
use arealearn_backend::models::quiz_result::QuizResult;
use arealearn_backend::models::user::{HeldAward, Points, Progress};
use arealearn_backend::scoring::{
    GradingOutcome, apply_submission, evaluate_awards, grade_submission,
};

/// One user's in-memory state plus the per-category score ledger the
/// handler would otherwise pull from `quiz_results`.
#[derive(Clone)]
struct Session {
    progress: Progress,
    held: Vec<HeldAward>,
    points: Points,
    ledger: BTreeMap<String, Vec<f64>>,
}

impl Session {
    fn new(registered_at: DateTime<Utc>) -> Self {
        let mut progress = Progress::default();
        progress.streaks.last_activity = registered_at;
        Self {
            progress,
            held: Vec::new(),
            points: Points::default(),
            ledger: BTreeMap::new(),
        }
    }

    fn submit(
        &mut self,
        quiz: &Quiz,
        answers: &[SubmittedAnswer],
        candidates: &[Award],
        time_taken: i64,
        now: DateTime<Utc>,
    ) -> (QuizResult, Vec<Award>) {
        let outcome = grade_submission(quiz, answers);
        let result = record(quiz, &outcome, time_taken, now);

        // The attempt lands in the ledger before aggregates are folded,
        // exactly as the handler inserts the result row first.
        let history = self.ledger.entry(quiz.category.clone()).or_default();
        history.push(outcome.percentage_score);

        apply_submission(
            &mut self.progress,
            &mut self.points,
            quiz,
            &outcome,
            history,
            now,
        );
        let earned = evaluate_awards(
            &mut self.held,
            &mut self.points,
            &self.progress,
            quiz,
            &result,
            candidates,
            now,
        );

        (result, earned)
    }
}

fn record(quiz: &Quiz, outcome: &GradingOutcome, time_taken: i64, now: DateTime<Utc>) -> QuizResult {
    QuizResult {
        id: 0,
        user_id: 1,
        quiz_id: quiz.id,
        answers: Json(outcome.answers.clone()),
        score: outcome.score,
        max_score: outcome.max_score,
        percentage_score: outcome.percentage_score,
        time_taken,
        passed: outcome.passed,
        completed_at: now,
    }
}

fn quiz(id: i64, category: &str, question_count: usize) -> Quiz {
    let questions = (0..question_count)
        .map(|i| Question {
            id: format!("q{i}"),
            text: format!("Question {i}"),
            options: vec![
                QuestionOption {
                    id: format!("q{i}-a"),
                    text: "Right".to_string(),
                    is_correct: true,
                },
                QuestionOption {
                    id: format!("q{i}-b"),
                    text: "Wrong".to_string(),
                    is_correct: false,
                },
            ],
            points: None,
            explanation: None,
        })
        .collect();

    Quiz {
        id,
        title: format!("Quiz {id}"),
        description: String::new(),
        category: category.to_string(),
        difficulty: "beginner".to_string(),
        passing_score: 70.0,
        module_id: None,
        questions: Json(questions),
        created_at: None,
    }
}

/// Answers selecting the correct option for the first `correct` questions
/// and a wrong one for the rest.
fn answers(quiz: &Quiz, correct: usize) -> Vec<SubmittedAnswer> {
    quiz.questions
        .0
        .iter()
        .enumerate()
        .map(|(i, question)| SubmittedAnswer {
            question_id: question.id.clone(),
            selected_option_id: if i < correct {
                format!("q{i}-a")
            } else {
                format!("q{i}-b")
            },
        })
        .collect()
}

fn award(id: i64, name: &str, criteria_type: &str, value: f64, points_value: i64) -> Award {
    Award {
        id,
        name: name.to_string(),
        award_type: "badge".to_string(),
        description: String::new(),
        image_url: String::new(),
        category: "achievement".to_string(),
        criteria: Json(AwardCriteria {
            criteria_type: criteria_type.to_string(),
            value,
            quiz_category: "all".to_string(),
        }),
        rarity: "common".to_string(),
        points_value,
        is_active: true,
        created_at: None,
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

#[test]
fn fresh_user_first_pass_populates_every_aggregate() {
    let mut session = Session::new(at(2026, 3, 1, 8));
    let quiz = quiz(7, "recycling", 2);

    let (result, earned) = session.submit(&quiz, &answers(&quiz, 2), &[], 42, at(2026, 3, 1, 10));

    assert_eq!(result.score, 20);
    assert_eq!(result.max_score, 20);
    assert_eq!(result.percentage_score, 100.0);
    assert!(result.passed);
    assert!(earned.is_empty());

    assert_eq!(session.progress.completed_quizzes, vec![7]);
    let stats = &session.progress.quiz_stats;
    assert_eq!(stats.total_attempted, 1);
    assert_eq!(stats.total_passed, 1);
    assert_eq!(stats.average_score, 100.0);

    let category = &stats.category_progress["recycling"];
    assert_eq!(category.completed, 1);
    assert_eq!(category.total_available, 1);
    assert_eq!(category.average_score, 100.0);

    // Same calendar day as registration, so no streak yet.
    assert_eq!(session.progress.streaks.current, 0);
    assert_eq!(session.progress.streaks.last_activity, at(2026, 3, 1, 10));

    assert_eq!(session.points.total, 20);
    assert_eq!(session.points.history.len(), 1);
    assert_eq!(session.points.history[0].reason, "Completed quiz: Quiz 7");
}

#[test]
fn retaking_a_quiz_keeps_the_completed_list_unique() {
    let mut session = Session::new(at(2026, 3, 1, 8));
    let quiz = quiz(7, "recycling", 2);

    session.submit(&quiz, &answers(&quiz, 2), &[], 42, at(2026, 3, 1, 10));
    session.submit(&quiz, &answers(&quiz, 1), &[], 42, at(2026, 3, 1, 11));

    assert_eq!(session.progress.completed_quizzes, vec![7]);
    let stats = &session.progress.quiz_stats;
    assert_eq!(stats.total_attempted, 2);
    assert_eq!(stats.total_passed, 1);
    // Mean of 100% and 50%.
    assert_eq!(stats.average_score, 75.0);
    // Both attempts earned their raw score.
    assert_eq!(session.points.total, 30);
}

#[test]
fn overall_average_is_the_mean_of_all_percentage_scores() {
    let mut session = Session::new(at(2026, 3, 1, 8));
    let first = quiz(1, "water", 4);
    let second = quiz(2, "energy", 4);
    let third = quiz(3, "water", 4);

    session.submit(&first, &answers(&first, 4), &[], 30, at(2026, 3, 1, 9));
    session.submit(&second, &answers(&second, 2), &[], 30, at(2026, 3, 1, 10));
    session.submit(&third, &answers(&third, 3), &[], 30, at(2026, 3, 1, 11));

    // Mean of 100%, 50% and 75%.
    assert_eq!(session.progress.quiz_stats.average_score, 75.0);
}

#[test]
fn category_average_follows_the_ledger_on_later_attempts() {
    let mut session = Session::new(at(2026, 3, 1, 8));
    let first = quiz(1, "water", 4);
    let second = quiz(2, "water", 4);

    session.submit(&first, &answers(&first, 4), &[], 30, at(2026, 3, 1, 9));
    session.submit(&second, &answers(&second, 2), &[], 30, at(2026, 3, 1, 10));

    let category = &session.progress.quiz_stats.category_progress["water"];
    // Mean of the two ledger entries, current attempt included.
    assert_eq!(category.average_score, 75.0);
    assert_eq!(category.completed, 1);
    // The counter is never maintained past the first sighting.
    assert_eq!(category.total_available, 1);
}

#[test]
fn streak_extends_daily_resets_after_a_gap_and_keeps_best() {
    let mut session = Session::new(at(2026, 1, 30, 8));
    let quiz = quiz(7, "recycling", 1);
    let full = answers(&quiz, 1);

    // Next day: streak starts.
    session.submit(&quiz, &full, &[], 10, at(2026, 1, 31, 9));
    assert_eq!(session.progress.streaks.current, 1);

    // Month boundary is still one calendar day apart.
    session.submit(&quiz, &full, &[], 10, at(2026, 2, 1, 9));
    assert_eq!(session.progress.streaks.current, 2);
    assert_eq!(session.progress.streaks.best, 2);

    // Second submission that day changes nothing.
    session.submit(&quiz, &full, &[], 10, at(2026, 2, 1, 21));
    assert_eq!(session.progress.streaks.current, 2);

    // Two days off: back to 1, best survives.
    session.submit(&quiz, &full, &[], 10, at(2026, 2, 4, 9));
    assert_eq!(session.progress.streaks.current, 1);
    assert_eq!(session.progress.streaks.best, 2);
}

#[test]
fn awards_interplay_across_a_four_day_journey() {
    let mut session = Session::new(at(2026, 3, 1, 8));
    let candidates = vec![
        award(1, "Perfect Score", "quiz_score", 100.0, 50),
        award(2, "Quiz Veteran", "quiz_completion", 3.0, 100),
        award(3, "Three-Day Streak", "streak", 3.0, 30),
    ];

    let day_one = quiz(1, "water", 2);
    let (_, earned) = session.submit(
        &day_one,
        &answers(&day_one, 2),
        &candidates,
        30,
        at(2026, 3, 1, 10),
    );
    assert_eq!(
        earned.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![1],
        "perfect score should be granted on day one"
    );

    // Day two: perfect score is already held, nothing else qualifies yet.
    let day_two = quiz(2, "energy", 2);
    let (_, earned) = session.submit(
        &day_two,
        &answers(&day_two, 2),
        &candidates,
        30,
        at(2026, 3, 2, 10),
    );
    assert!(earned.is_empty());

    // Day three: third pass unlocks the completion award.
    let day_three = quiz(3, "water", 2);
    let (_, earned) = session.submit(
        &day_three,
        &answers(&day_three, 2),
        &candidates,
        30,
        at(2026, 3, 3, 10),
    );
    assert_eq!(earned.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2]);

    // Day four: streak reaches three.
    let day_four = quiz(4, "energy", 2);
    let (_, earned) = session.submit(
        &day_four,
        &answers(&day_four, 2),
        &candidates,
        30,
        at(2026, 3, 4, 10),
    );
    assert_eq!(earned.iter().map(|a| a.id).collect::<Vec<_>>(), vec![3]);

    // 4 x 20 raw points plus 50 + 100 + 30 in award bonuses.
    assert_eq!(session.points.total, 260);
    assert_eq!(session.points.history.len(), 7);
    assert_eq!(session.held.len(), 3);
    assert_eq!(session.held[0].from_quiz, Some(1));
    assert_eq!(session.held[1].from_quiz, Some(3));
    assert_eq!(session.held[2].from_quiz, Some(4));
    assert_eq!(session.progress.completed_quizzes, vec![1, 2, 3, 4]);
    assert_eq!(session.progress.streaks.best, 3);
}

#[test]
fn racing_submissions_from_one_snapshot_drop_the_earlier_update() {
    // Nothing serializes two submissions by the same user: each request
    // reads the user row, folds its own attempt in, and saves the whole
    // aggregate. When both read the same snapshot the later save wins and
    // the earlier attempt survives only in the result ledger.
    let base = Session::new(at(2026, 3, 1, 8));
    let quiz_a = quiz(1, "water", 2);
    let quiz_b = quiz(2, "energy", 2);

    let mut first = base.clone();
    let mut second = base.clone();
    first.submit(&quiz_a, &answers(&quiz_a, 2), &[], 30, at(2026, 3, 1, 10));
    second.submit(&quiz_b, &answers(&quiz_b, 1), &[], 30, at(2026, 3, 1, 10));

    // `second` is what lands in the users table.
    assert_eq!(second.progress.quiz_stats.total_attempted, 1);
    assert_eq!(second.points.total, 10);
    assert!(second.progress.completed_quizzes.is_empty());

    // A sequential replay of the same two submissions knows both.
    let mut sequential = base;
    sequential.submit(&quiz_a, &answers(&quiz_a, 2), &[], 30, at(2026, 3, 1, 10));
    sequential.submit(&quiz_b, &answers(&quiz_b, 1), &[], 30, at(2026, 3, 1, 10));
    assert_eq!(sequential.progress.quiz_stats.total_attempted, 2);
    assert_eq!(sequential.points.total, 30);
    assert_eq!(sequential.progress.completed_quizzes, vec![1]);
}

#[test]
fn failed_attempts_earn_raw_points_but_never_complete() {
    let mut session = Session::new(at(2026, 3, 1, 8));
    let quiz = quiz(9, "soil", 2);
    let candidates = vec![award(1, "High Flier", "quiz_score", 80.0, 50)];

    let (result, earned) = session.submit(
        &quiz,
        &answers(&quiz, 1),
        &candidates,
        30,
        at(2026, 3, 1, 10),
    );

    assert!(!result.passed);
    assert!(earned.is_empty());
    assert!(session.progress.completed_quizzes.is_empty());
    assert_eq!(session.progress.quiz_stats.total_passed, 0);
    assert_eq!(session.progress.quiz_stats.total_attempted, 1);
    assert_eq!(session.points.total, 10);
}
