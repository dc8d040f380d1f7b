// src/scoring/grade.rs

use crate::config::QUESTION_MAX_POINTS;
use crate::models::quiz::{Quiz, SubmittedAnswer};
use crate::models::quiz_result::AnswerRecord;

/// Everything grading produces for one submission.
#[derive(Debug, Clone)]
pub struct GradingOutcome {
    pub answers: Vec<AnswerRecord>,
    pub score: i64,
    pub max_score: i64,
    pub percentage_score: f64,
    pub passed: bool,
}

/// Grades a submission against a quiz.
///
/// * Walks the submitted answers in order; an answer whose question id
///   matches nothing in the quiz grades as incorrect instead of failing.
/// * An answer is correct iff its selected option id equals the id of the
///   option flagged correct for that question.
/// * Correct answers earn `question.points` (default 10) toward `score`,
///   while `max_score` is always `10 * question_count`. Per-question
///   overrides therefore shift the percentage without moving the ceiling,
///   a long-standing quirk kept for result-history comparability.
pub fn grade_submission(quiz: &Quiz, answers: &[SubmittedAnswer]) -> GradingOutcome {
    let max_score = quiz.questions.0.len() as i64 * QUESTION_MAX_POINTS;

    let mut score = 0;
    let mut records = Vec::with_capacity(answers.len());

    for answer in answers {
        let Some(question) = quiz.questions.0.iter().find(|q| q.id == answer.question_id) else {
            records.push(AnswerRecord {
                question: answer.question_id.clone(),
                selected_option: answer.selected_option_id.clone(),
                is_correct: false,
            });
            continue;
        };

        let correct_option = question.options.iter().find(|option| option.is_correct);
        let is_correct =
            correct_option.is_some_and(|option| option.id == answer.selected_option_id);

        if is_correct {
            score += question.points.unwrap_or(QUESTION_MAX_POINTS);
        }

        records.push(AnswerRecord {
            question: answer.question_id.clone(),
            selected_option: answer.selected_option_id.clone(),
            is_correct,
        });
    }

    // A quiz without questions has a zero ceiling; report 0% rather than
    // dividing by zero.
    let percentage_score = if max_score > 0 {
        (score as f64 / max_score as f64) * 100.0
    } else {
        0.0
    };
    let passed = percentage_score >= quiz.passing_score;

    GradingOutcome {
        answers: records,
        score,
        max_score,
        percentage_score,
        passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{Question, QuestionOption};
    use sqlx::types::Json;

    fn question(id: &str, correct: &str, points: Option<i64>) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            options: vec![
                QuestionOption {
                    id: format!("{id}-a"),
                    text: "a".to_string(),
                    is_correct: correct == "a",
                },
                QuestionOption {
                    id: format!("{id}-b"),
                    text: "b".to_string(),
                    is_correct: correct == "b",
                },
                QuestionOption {
                    id: format!("{id}-c"),
                    text: "c".to_string(),
                    is_correct: correct == "c",
                },
            ],
            points,
            explanation: None,
        }
    }

    fn quiz(questions: Vec<Question>, passing_score: f64) -> Quiz {
        Quiz {
            id: 1,
            title: "Recycling basics".to_string(),
            description: String::new(),
            category: "My Environment".to_string(),
            difficulty: "beginner".to_string(),
            passing_score,
            module_id: None,
            questions: Json(questions),
            created_at: None,
        }
    }

    fn answer(question_id: &str, option: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: question_id.to_string(),
            selected_option_id: format!("{question_id}-{option}"),
        }
    }

    #[test]
    fn all_correct_with_default_weights_scores_full_marks() {
        let quiz = quiz(
            vec![question("q1", "a", None), question("q2", "b", None)],
            70.0,
        );
        let outcome = grade_submission(&quiz, &[answer("q1", "a"), answer("q2", "b")]);

        assert_eq!(outcome.score, 20);
        assert_eq!(outcome.max_score, 20);
        assert_eq!(outcome.percentage_score, 100.0);
        assert!(outcome.passed);
        assert!(outcome.answers.iter().all(|a| a.is_correct));
    }

    #[test]
    fn half_correct_scores_fifty_percent_and_fails_at_seventy() {
        let quiz = quiz(
            vec![question("q1", "a", None), question("q2", "b", None)],
            70.0,
        );
        let outcome = grade_submission(&quiz, &[answer("q1", "a"), answer("q2", "c")]);

        assert_eq!(outcome.score, 10);
        assert_eq!(outcome.percentage_score, 50.0);
        assert!(!outcome.passed);
        assert!(outcome.answers[0].is_correct);
        assert!(!outcome.answers[1].is_correct);
    }

    #[test]
    fn passing_is_inclusive_of_the_threshold() {
        let quiz = quiz(
            vec![question("q1", "a", None), question("q2", "b", None)],
            50.0,
        );
        let outcome = grade_submission(&quiz, &[answer("q1", "a"), answer("q2", "c")]);
        assert_eq!(outcome.percentage_score, 50.0);
        assert!(outcome.passed);
    }

    #[test]
    fn max_score_ignores_point_overrides_but_earned_score_uses_them() {
        // Ceiling stays at 10 per question even when a question is worth
        // more, so percentages can exceed 100.
        let quiz = quiz(
            vec![question("q1", "a", Some(25)), question("q2", "b", None)],
            70.0,
        );
        let outcome = grade_submission(&quiz, &[answer("q1", "a"), answer("q2", "b")]);

        assert_eq!(outcome.max_score, 20);
        assert_eq!(outcome.score, 35);
        assert_eq!(outcome.percentage_score, 175.0);
    }

    #[test]
    fn unknown_question_id_grades_as_incorrect() {
        let quiz = quiz(vec![question("q1", "a", None)], 70.0);
        let outcome = grade_submission(&quiz, &[answer("ghost", "a"), answer("q1", "a")]);

        assert_eq!(outcome.score, 10);
        assert_eq!(outcome.answers.len(), 2);
        assert_eq!(outcome.answers[0].question, "ghost");
        assert!(!outcome.answers[0].is_correct);
        assert!(outcome.answers[1].is_correct);
    }

    #[test]
    fn question_without_a_flagged_correct_option_never_scores() {
        let mut q = question("q1", "a", None);
        for option in &mut q.options {
            option.is_correct = false;
        }
        let quiz = quiz(vec![q], 70.0);
        let outcome = grade_submission(&quiz, &[answer("q1", "a")]);

        assert_eq!(outcome.score, 0);
        assert!(!outcome.answers[0].is_correct);
    }

    #[test]
    fn empty_answer_list_grades_to_zero() {
        let quiz = quiz(
            vec![question("q1", "a", None), question("q2", "b", None)],
            70.0,
        );
        let outcome = grade_submission(&quiz, &[]);

        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.max_score, 20);
        assert_eq!(outcome.percentage_score, 0.0);
        assert!(!outcome.passed);
        assert!(outcome.answers.is_empty());
    }

    #[test]
    fn quiz_without_questions_reports_zero_percent() {
        let quiz = quiz(vec![], 70.0);
        let outcome = grade_submission(&quiz, &[]);

        assert_eq!(outcome.max_score, 0);
        assert_eq!(outcome.percentage_score, 0.0);
        assert!(!outcome.passed);
    }

    #[test]
    fn duplicate_answers_to_one_question_each_grade_independently() {
        let quiz = quiz(vec![question("q1", "a", None)], 70.0);
        let outcome = grade_submission(&quiz, &[answer("q1", "a"), answer("q1", "a")]);

        // Each occurrence earns points; the ceiling does not care.
        assert_eq!(outcome.score, 20);
        assert_eq!(outcome.answers.len(), 2);
    }
}
