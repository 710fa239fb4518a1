//! Core pipeline logic for SketchMotion.
//!
//! This crate holds everything between the HTTP layer and the provider
//! clients. It knows nothing about axum or about the Google wire formats.
//!
//! # Modules
//!
//! - `sketch` - Base64 / data-URL sketch decoding
//! - `storage` - Job folders and object storage
//! - `generation` - Provider traits and the sketch-to-video service

pub mod generation;
pub mod sketch;
pub mod storage;
