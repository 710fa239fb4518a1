//! Shared errors and configuration for SketchMotion.
//!
//! This crate provides the pieces every other crate agrees on:
//! - Application-wide error type with its HTTP status mapping
//! - Configuration management

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::AppError;
