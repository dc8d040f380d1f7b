// src/models/mod.rs

pub mod ar_model;
pub mod award;
pub mod learning_module;
pub mod quiz;
pub mod quiz_result;
pub mod subject;
pub mod user;
