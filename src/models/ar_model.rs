// src/models/ar_model.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::{Validate, ValidationError};

pub const MODEL_FILE_TYPES: [&str; 4] = ["glb", "gltf", "obj", "usdz"];

/// Represents the 'ar_models' table: metadata for AR assets attached to
/// learning modules. The binary assets live on external storage; this
/// service only tracks where they are and how to place them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArModel {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Location of the hosted model asset.
    pub model_url: String,
    /// One of `MODEL_FILE_TYPES`.
    pub file_type: String,
    pub preview_image: Option<String>,
    pub textures: Json<Vec<Texture>>,
    /// Initial placement scale; defaults to unit scale.
    pub scale: Json<Vec3>,
    /// Initial rotation in degrees per axis.
    pub rotation: Json<Vec3>,
    pub module_id: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Texture {
    pub name: String,
    pub texture_url: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn unit() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArModelRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Name length must be between 1 and 50 characters."
    ))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(url(message = "Model URL must be a valid URL."))]
    pub model_url: String,
    #[validate(custom(function = validate_file_type))]
    pub file_type: String,
    #[validate(url)]
    pub preview_image: Option<String>,
    #[validate(custom(function = validate_textures))]
    #[serde(default)]
    pub textures: Vec<TextureInput>,
    pub scale: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub module_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArModelRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(url)]
    pub model_url: Option<String>,
    #[validate(custom(function = validate_file_type))]
    pub file_type: Option<String>,
    #[validate(url)]
    pub preview_image: Option<String>,
    #[validate(custom(function = validate_textures))]
    pub textures: Option<Vec<TextureInput>>,
    pub scale: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub module_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArModelListParams {
    pub module_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInput {
    pub name: String,
    pub texture_url: String,
}

impl TextureInput {
    pub fn into_texture(self) -> Texture {
        Texture {
            name: self.name,
            texture_url: self.texture_url,
        }
    }
}

fn validate_file_type(file_type: &str) -> Result<(), ValidationError> {
    if !MODEL_FILE_TYPES.contains(&file_type) {
        return Err(ValidationError::new("invalid_file_type"));
    }
    Ok(())
}

fn validate_textures(textures: &[TextureInput]) -> Result<(), ValidationError> {
    for texture in textures {
        if texture.name.trim().is_empty() {
            return Err(ValidationError::new("invalid_texture_name"));
        }
        if url::Url::parse(&texture.texture_url).is_err() {
            return Err(ValidationError::new("invalid_texture_url"));
        }
    }
    Ok(())
}
