// src/models/learning_module.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const RESOURCE_TYPES: [&str; 4] = ["pdf", "video", "link", "image"];

/// Represents the 'learning_modules' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningModule {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Long-form body shown on the module page.
    pub content: String,
    /// Position in the catalog; progress summaries walk modules in this order.
    pub order_index: i64,
    pub image_url: Option<String>,
    pub lessons: Json<Vec<Lesson>>,
    pub resources: Json<Vec<Resource>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A lesson embedded in a module document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Opaque id generated at creation time; lesson progress keys off it.
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub url: String,
}

/// Compact module reference used in listings and progress summaries.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub id: i64,
    pub title: String,
    pub order_index: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 characters."
    ))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub order_index: Option<i64>,
    #[validate(url(message = "Image URL must be a valid URL."))]
    pub image_url: Option<String>,
    #[validate(custom(function = validate_lessons))]
    #[serde(default)]
    pub lessons: Vec<LessonInput>,
    #[validate(custom(function = validate_resources))]
    #[serde(default)]
    pub resources: Vec<ResourceInput>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModuleRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub content: Option<String>,
    pub order_index: Option<i64>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(custom(function = validate_lessons))]
    pub lessons: Option<Vec<LessonInput>>,
    #[validate(custom(function = validate_resources))]
    pub resources: Option<Vec<ResourceInput>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub duration_minutes: Option<i64>,
}

impl LessonInput {
    pub fn into_lesson(self) -> Lesson {
        Lesson {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            content: self.content,
            duration_minutes: self.duration_minutes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInput {
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub url: String,
}

impl ResourceInput {
    pub fn into_resource(self) -> Resource {
        Resource {
            title: self.title,
            resource_type: self.resource_type,
            url: self.url,
        }
    }
}

fn validate_lessons(lessons: &[LessonInput]) -> Result<(), ValidationError> {
    for lesson in lessons {
        if lesson.title.trim().is_empty() || lesson.title.len() > 200 {
            return Err(ValidationError::new("invalid_lesson_title"));
        }
    }
    Ok(())
}

fn validate_resources(resources: &[ResourceInput]) -> Result<(), ValidationError> {
    for resource in resources {
        if !RESOURCE_TYPES.contains(&resource.resource_type.as_str()) {
            return Err(ValidationError::new("invalid_resource_type"));
        }
        if url::Url::parse(&resource.url).is_err() {
            return Err(ValidationError::new("invalid_resource_url"));
        }
    }
    Ok(())
}

/// DTO for recording lesson progress.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressRequest {
    pub module_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub lesson_id: String,
    /// Completion percentage for the lesson, 0-100.
    #[validate(range(min = 0.0, max = 100.0, message = "Progress must be 0-100."))]
    pub progress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_input_mints_an_id() {
        let lesson = LessonInput {
            title: "Sorting waste".to_string(),
            content: "...".to_string(),
            duration_minutes: Some(10),
        }
        .into_lesson();
        assert!(!lesson.id.is_empty());
        assert_eq!(lesson.duration_minutes, Some(10));
    }

    #[test]
    fn create_request_checks_nested_lessons_and_resources() {
        let blank_lesson = CreateModuleRequest {
            title: "Recycling".to_string(),
            description: String::new(),
            content: String::new(),
            order_index: None,
            image_url: None,
            lessons: vec![LessonInput {
                title: "   ".to_string(),
                content: String::new(),
                duration_minutes: None,
            }],
            resources: vec![],
        };
        assert!(blank_lesson.validate().is_err());

        let bad_resource = CreateModuleRequest {
            title: "Recycling".to_string(),
            description: String::new(),
            content: String::new(),
            order_index: None,
            image_url: None,
            lessons: vec![],
            resources: vec![ResourceInput {
                title: "Clip".to_string(),
                resource_type: "reel".to_string(),
                url: "https://example.com/clip".to_string(),
            }],
        };
        assert!(bad_resource.validate().is_err());
    }

    #[test]
    fn resource_validation_checks_type_and_url() {
        let bad_type = vec![ResourceInput {
            title: "Clip".to_string(),
            resource_type: "reel".to_string(),
            url: "https://example.com/clip".to_string(),
        }];
        assert!(validate_resources(&bad_type).is_err());

        let bad_url = vec![ResourceInput {
            title: "Clip".to_string(),
            resource_type: "video".to_string(),
            url: "not a url".to_string(),
        }];
        assert!(validate_resources(&bad_url).is_err());

        let ok = vec![ResourceInput {
            title: "Clip".to_string(),
            resource_type: "video".to_string(),
            url: "https://example.com/clip".to_string(),
        }];
        assert!(validate_resources(&ok).is_ok());
    }
}
