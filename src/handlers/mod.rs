// src/handlers/mod.rs

pub mod ar_models;
pub mod auth;
pub mod awards;
pub mod modules;
pub mod progress;
pub mod quizzes;
pub mod subjects;
pub mod users;
