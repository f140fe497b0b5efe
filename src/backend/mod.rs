//! Remote inference backend integration
//!
//! Provides the client for the backend that executes model teams.

pub mod client;
pub mod models;

pub use client::{collect_stream, BackendClient, InferenceBackend, TextStream};
pub use models::*;
