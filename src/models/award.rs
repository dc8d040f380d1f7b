// src/models/award.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

pub const AWARD_TYPES: [&str; 4] = ["star", "badge", "trophy", "certificate"];
pub const AWARD_CATEGORIES: [&str; 4] = ["achievement", "skill", "progress", "special"];
pub const RARITIES: [&str; 5] = ["common", "uncommon", "rare", "epic", "legendary"];
pub const CRITERIA_TYPES: [&str; 5] = [
    "quiz_score",
    "quiz_completion",
    "streak",
    "time",
    "category_mastery",
];

/// Represents the 'awards' table: the catalog of earnable awards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub id: i64,
    /// Unique display name, also used in points history reasons.
    pub name: String,
    /// One of `AWARD_TYPES`.
    #[serde(rename = "type")]
    pub award_type: String,
    pub description: String,
    pub image_url: String,
    /// One of `AWARD_CATEGORIES`, grouping the catalog for display.
    pub category: String,
    pub criteria: Json<AwardCriteria>,
    /// One of `RARITIES`.
    pub rarity: String,
    /// Points granted when the award is earned.
    pub points_value: i64,
    /// Inactive awards stay listable but are never granted.
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Earning rule attached to an award.
///
/// `criteria_type` stays a plain string on purpose: rows with a type this
/// build does not know simply never match, instead of failing to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardCriteria {
    #[serde(rename = "type")]
    pub criteria_type: String,
    /// Threshold the criterion compares against.
    pub value: f64,
    /// Category scope; "all" matches every quiz.
    #[serde(default = "default_quiz_category")]
    pub quiz_category: String,
}

fn default_quiz_category() -> String {
    "all".to_string()
}

/// DTO for creating an award (admin).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAwardRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(custom(function = validate_award_type))]
    #[serde(rename = "type")]
    pub award_type: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub image_url: String,
    #[validate(custom(function = validate_award_category))]
    pub category: String,
    #[validate(nested)]
    pub criteria: CriteriaInput,
    #[validate(custom(function = validate_rarity))]
    pub rarity: Option<String>,
    #[validate(range(min = 0, max = 100_000))]
    pub points_value: Option<i64>,
    pub is_active: Option<bool>,
}

/// DTO for updating an award (admin). Absent fields keep their value.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAwardRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(custom(function = validate_award_type))]
    #[serde(rename = "type")]
    pub award_type: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
    #[validate(custom(function = validate_award_category))]
    pub category: Option<String>,
    #[validate(nested)]
    pub criteria: Option<CriteriaInput>,
    #[validate(custom(function = validate_rarity))]
    pub rarity: Option<String>,
    #[validate(range(min = 0, max = 100_000))]
    pub points_value: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaInput {
    #[validate(custom(function = validate_criteria_type))]
    #[serde(rename = "type")]
    pub criteria_type: String,
    pub value: f64,
    pub quiz_category: Option<String>,
}

impl CriteriaInput {
    pub fn into_criteria(self) -> AwardCriteria {
        AwardCriteria {
            criteria_type: self.criteria_type,
            value: self.value,
            quiz_category: self.quiz_category.unwrap_or_else(default_quiz_category),
        }
    }
}

fn validate_award_type(award_type: &str) -> Result<(), ValidationError> {
    if !AWARD_TYPES.contains(&award_type) {
        return Err(ValidationError::new("invalid_award_type"));
    }
    Ok(())
}

fn validate_award_category(category: &str) -> Result<(), ValidationError> {
    if !AWARD_CATEGORIES.contains(&category) {
        return Err(ValidationError::new("invalid_award_category"));
    }
    Ok(())
}

fn validate_rarity(rarity: &str) -> Result<(), ValidationError> {
    if !RARITIES.contains(&rarity) {
        return Err(ValidationError::new("invalid_rarity"));
    }
    Ok(())
}

fn validate_criteria_type(criteria_type: &str) -> Result<(), ValidationError> {
    if !CRITERIA_TYPES.contains(&criteria_type) {
        return Err(ValidationError::new("invalid_criteria_type"));
    }
    Ok(())
}

/// Query parameters for award catalog listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardListParams {
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Award catalog response: the flat list plus a by-type grouping, which
/// is how clients render the trophy cabinet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedAwards {
    pub all: Vec<Award>,
    pub by_type: BTreeMap<String, Vec<Award>>,
}

impl GroupedAwards {
    pub fn new(awards: Vec<Award>) -> Self {
        let mut by_type: BTreeMap<String, Vec<Award>> = BTreeMap::new();
        for award in &awards {
            by_type
                .entry(award.award_type.clone())
                .or_default()
                .push(award.clone());
        }
        Self {
            all: awards,
            by_type,
        }
    }
}

/// One row of a user's earned awards, joined with catalog metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedAwardView {
    pub award: Award,
    pub date_earned: DateTime<Utc>,
    pub from_quiz: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_defaults_to_all_categories() {
        let criteria: AwardCriteria =
            serde_json::from_str(r#"{"type":"streak","value":7}"#).unwrap();
        assert_eq!(criteria.criteria_type, "streak");
        assert_eq!(criteria.quiz_category, "all");

        let value = serde_json::to_value(&criteria).unwrap();
        assert_eq!(value["type"], "streak");
        assert_eq!(value["quizCategory"], "all");
    }

    #[test]
    fn grouping_splits_the_catalog_by_type() {
        let mk = |id: i64, award_type: &str| Award {
            id,
            name: format!("award {id}"),
            award_type: award_type.to_string(),
            description: String::new(),
            image_url: String::new(),
            category: "achievement".to_string(),
            criteria: Json(AwardCriteria {
                criteria_type: "quiz_score".to_string(),
                value: 90.0,
                quiz_category: "all".to_string(),
            }),
            rarity: "common".to_string(),
            points_value: 10,
            is_active: true,
            created_at: None,
        };

        let grouped = GroupedAwards::new(vec![mk(1, "badge"), mk(2, "trophy"), mk(3, "badge")]);
        assert_eq!(grouped.all.len(), 3);
        assert_eq!(grouped.by_type["badge"].len(), 2);
        assert_eq!(grouped.by_type["trophy"].len(), 1);
    }

    #[test]
    fn unknown_criteria_types_still_decode() {
        let criteria: AwardCriteria =
            serde_json::from_str(r#"{"type":"perfect_month","value":1,"quizCategory":"all"}"#)
                .unwrap();
        assert_eq!(criteria.criteria_type, "perfect_month");
    }

    #[test]
    fn create_request_rejects_unknown_criteria_type() {
        let request = CreateAwardRequest {
            name: "Quiz Master".to_string(),
            award_type: "badge".to_string(),
            description: String::new(),
            image_url: String::new(),
            category: "achievement".to_string(),
            criteria: CriteriaInput {
                criteria_type: "perfect_month".to_string(),
                value: 1.0,
                quiz_category: None,
            },
            rarity: None,
            points_value: None,
            is_active: None,
        };
        assert!(request.validate().is_err());
    }
}
