// src/scoring/mod.rs

//! Pure scoring pipeline for quiz submissions.
//!
//! The pipeline runs in three stages, each a plain function over its
//! inputs so every stage is testable without a database:
//!
//! 1. [`grade::grade_submission`] turns raw answers into a graded outcome.
//! 2. [`stats::apply_submission`] folds the outcome into the user's
//!    progress and points aggregates.
//! 3. [`awards::evaluate_awards`] grants any newly qualified awards.
//!
//! The submission handler orchestrates the stages and owns all store
//! access; catalogs (quiz, award candidates) and the clock come in as
//! parameters.

pub mod awards;
pub mod grade;
pub mod stats;

pub use awards::evaluate_awards;
pub use grade::{GradingOutcome, grade_submission};
pub use stats::apply_submission;
