//! Core types, rules and trait definitions for the Mentor training engine.
//!
//! This crate has no HTTP or database dependencies. It holds the data model,
//! the [`store::TrainingStore`] abstraction and the pure rules (lifecycle
//! evaluation, quiz grading and certificate numbering) that the engine
//! composes.

pub mod analytics;
pub mod assignment;
pub mod catalog;
pub mod certificate;
pub mod error;
pub mod grading;
pub mod lifecycle;
pub mod notification;
pub mod progress;
pub mod quiz;
pub mod store;

pub use error::{Error, Result};

/// Free-form JSON object attached to assignments, materials and certificates.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
