//! Core domain types and logic.

pub mod alignment;
pub mod comparison;
pub mod correlation;
pub mod dashboard;
pub mod error;
pub mod price_cache;
pub mod price_series;
pub mod settings;
pub mod universe;
