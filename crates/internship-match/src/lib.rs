//! Matching and quota-constrained allocation of students to internship postings.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

pub use error::AppError;
