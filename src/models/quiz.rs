// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DIFFICULTIES: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Represents the 'quizzes' table in the database.
///
/// Questions are embedded as a JSONB array; they have no standalone
/// lifecycle outside their quiz.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Free-form category label, also used by award criteria scoping.
    pub category: String,
    /// One of `DIFFICULTIES`.
    pub difficulty: String,
    /// Pass threshold as a percentage, 0-100.
    pub passing_score: f64,
    /// Optional link to the learning module this quiz belongs to.
    pub module_id: Option<i64>,
    pub questions: Json<Vec<Question>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A question embedded in a quiz document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Opaque id generated at creation time, stable across quiz edits.
    pub id: String,
    pub text: String,
    pub options: Vec<QuestionOption>,
    /// Per-question score override. Grading falls back to 10 when unset.
    #[serde(default)]
    pub points: Option<i64>,
    /// Shown to the learner after answering. Never part of the public view.
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// Catalog listing row: question bodies stay out of list responses.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub passing_score: f64,
    pub module_id: Option<i64>,
    pub question_count: i64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Learner-facing view of a quiz: answer keys and explanations removed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub passing_score: f64,
    pub module_id: Option<i64>,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<PublicOption>,
}

#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: String,
    pub text: String,
}

impl From<Quiz> for PublicQuiz {
    fn from(quiz: Quiz) -> Self {
        let questions = quiz
            .questions
            .0
            .into_iter()
            .map(|q| PublicQuestion {
                id: q.id,
                text: q.text,
                options: q
                    .options
                    .into_iter()
                    .map(|o| PublicOption {
                        id: o.id,
                        text: o.text,
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            category: quiz.category,
            difficulty: quiz.difficulty,
            passing_score: quiz.passing_score,
            module_id: quiz.module_id,
            questions,
        }
    }
}

/// Query parameters for quiz catalog listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizListParams {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub module_id: Option<i64>,
}

/// DTO for creating a quiz (admin).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 characters."
    ))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: Option<String>,
    #[validate(range(min = 0.0, max = 100.0, message = "Passing score must be 0-100."))]
    pub passing_score: Option<f64>,
    pub module_id: Option<i64>,
    #[validate(custom(function = validate_questions))]
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

/// DTO for updating a quiz (admin). Absent fields keep their value.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_score: Option<f64>,
    pub module_id: Option<i64>,
    #[validate(custom(function = validate_questions))]
    pub questions: Option<Vec<QuestionInput>>,
}

/// Incoming question body. Ids are assigned server-side.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Question text length must be between 1 and 1000 characters."
    ))]
    pub text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<OptionInput>,
    #[validate(range(min = 0, max = 1000))]
    pub points: Option<i64>,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionInput {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl QuestionInput {
    /// Materializes the input into a stored question, minting option ids.
    pub fn into_question(self) -> Question {
        Question {
            id: Uuid::new_v4().to_string(),
            text: self.text,
            options: self
                .options
                .into_iter()
                .map(|o| QuestionOption {
                    id: Uuid::new_v4().to_string(),
                    text: o.text,
                    is_correct: o.is_correct,
                })
                .collect(),
            points: self.points,
            explanation: self.explanation,
        }
    }
}

fn validate_difficulty(difficulty: &str) -> Result<(), ValidationError> {
    if !DIFFICULTIES.contains(&difficulty) {
        return Err(ValidationError::new("invalid_difficulty"));
    }
    Ok(())
}

fn validate_questions(questions: &[QuestionInput]) -> Result<(), ValidationError> {
    for question in questions {
        if question.text.trim().is_empty() || question.text.len() > 1000 {
            return Err(ValidationError::new("invalid_question_text"));
        }
        validate_options(&question.options)?;
    }
    Ok(())
}

fn validate_options(options: &[OptionInput]) -> Result<(), ValidationError> {
    if options.is_empty() {
        return Err(ValidationError::new("options_required"));
    }
    for option in options {
        if option.text.trim().is_empty() || option.text.len() > 500 {
            return Err(ValidationError::new("invalid_option_text"));
        }
    }
    Ok(())
}

/// DTO for submitting answers to a quiz.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    /// Missing (as opposed to empty) answers are rejected with a 400.
    pub answers: Option<Vec<SubmittedAnswer>>,
    /// Seconds the attempt took, self-reported by the client.
    #[serde(default)]
    pub time_taken: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    /// Unmatched or absent option ids simply grade as incorrect.
    #[serde(default)]
    pub selected_option_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(text: &str, is_correct: bool) -> OptionInput {
        OptionInput {
            text: text.to_string(),
            is_correct,
        }
    }

    #[test]
    fn question_input_mints_distinct_ids() {
        let input = QuestionInput {
            text: "Which bin takes glass?".to_string(),
            options: vec![option("Green", true), option("Blue", false)],
            points: None,
            explanation: None,
        };

        let question = input.into_question();
        assert!(!question.id.is_empty());
        assert_eq!(question.options.len(), 2);
        assert_ne!(question.options[0].id, question.options[1].id);
        assert!(question.options[0].is_correct);
    }

    #[test]
    fn public_view_strips_answer_keys() {
        let quiz = Quiz {
            id: 1,
            title: "Recycling basics".to_string(),
            description: String::new(),
            category: "My Environment".to_string(),
            difficulty: "beginner".to_string(),
            passing_score: 70.0,
            module_id: None,
            questions: Json(vec![Question {
                id: "q1".to_string(),
                text: "Which bin takes glass?".to_string(),
                options: vec![
                    QuestionOption {
                        id: "o1".to_string(),
                        text: "Green".to_string(),
                        is_correct: true,
                    },
                    QuestionOption {
                        id: "o2".to_string(),
                        text: "Blue".to_string(),
                        is_correct: false,
                    },
                ],
                points: Some(15),
                explanation: Some("Glass goes in the green bin.".to_string()),
            }]),
            created_at: None,
        };

        let value = serde_json::to_value(PublicQuiz::from(quiz)).unwrap();
        let question = &value["questions"][0];
        assert_eq!(question["options"][0]["id"], "o1");
        assert!(question["options"][0].get("isCorrect").is_none());
        assert!(question.get("explanation").is_none());
        assert!(question.get("points").is_none());
    }

    #[test]
    fn create_request_rejects_empty_options() {
        let request = CreateQuizRequest {
            title: "Water cycle".to_string(),
            description: String::new(),
            category: "My Environment".to_string(),
            difficulty: None,
            passing_score: None,
            module_id: None,
            questions: vec![QuestionInput {
                text: "Where does rain come from?".to_string(),
                options: vec![],
                points: None,
                explanation: None,
            }],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn submitted_answer_tolerates_missing_option_id() {
        let answer: SubmittedAnswer = serde_json::from_str(r#"{"questionId":"q1"}"#).unwrap();
        assert_eq!(answer.question_id, "q1");
        assert!(answer.selected_option_id.is_empty());
    }
}
