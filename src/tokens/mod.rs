//! Token counting module
//!
//! Provides prompt token estimation using tiktoken-rs.

pub mod counter;

pub use counter::TokenEstimator;
