// src/models/subject.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::models::learning_module::ModuleSummary;

/// Represents the 'subjects' table: top-level catalog groupings.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Icon identifier the client maps to an asset.
    pub icon: String,
    /// Accent color as a CSS hex string.
    pub color: String,
    pub order_index: i64,
    /// Ordered module ids belonging to this subject.
    pub modules: Json<Vec<i64>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Subject with its module references expanded for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub order_index: i64,
    /// Module ids that no longer resolve are silently dropped.
    pub modules: Vec<ModuleSummary>,
    pub created_at: Option<DateTime<Utc>>,
}

impl SubjectView {
    pub fn new(subject: Subject, modules: Vec<ModuleSummary>) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            description: subject.description,
            icon: subject.icon,
            color: subject.color,
            order_index: subject.order_index,
            modules,
            created_at: subject.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Name length must be between 1 and 50 characters."
    ))]
    pub name: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: String,
    /// Defaults to "book" when omitted.
    #[validate(length(max = 100))]
    pub icon: Option<String>,
    /// Defaults to "#4CAF50" when omitted.
    #[validate(length(max = 20))]
    pub color: Option<String>,
    pub order_index: Option<i64>,
    #[serde(default)]
    pub modules: Vec<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub icon: Option<String>,
    #[validate(length(max = 20))]
    pub color: Option<String>,
    pub order_index: Option<i64>,
    pub modules: Option<Vec<i64>>,
}
