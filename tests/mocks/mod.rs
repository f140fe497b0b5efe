//! Mock infrastructure for testing external services
//!
//! The only external dependency is the inference backend (model catalog and
//! team execution).

pub mod backend;

pub use backend::*;
