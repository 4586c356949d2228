//! Core library for the Task List API
//!
//! This crate contains the core business logic, including:
//! - The task domain model
//! - The task repository and its SQLite-backed store
//! - The task service

pub mod error;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
