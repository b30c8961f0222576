//! Core library for machine efficiency classification
//!
//! This crate provides the three stages that share one feature contract:
//! - Feature pipeline: raw telemetry to encoded, scaled, split artifacts
//! - Model training: multinomial logistic regression plus evaluation
//! - Prediction service: artifact loading, validation and classification
//!
//! The feature names, their order, the encoding tables and the scaler are
//! fixed in [`models`] and [`artifacts`] so that offline and online stages
//! reproduce the same transform.

pub mod artifacts;
pub mod error;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod predictor;
pub mod trainer;

pub use error::{Error, ErrorKind, Result, Stage};
pub use models::*;
pub use observability::StructuredLogger;
