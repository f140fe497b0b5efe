//! Integration tests for Quorum

mod access;
mod backend_client;
mod health;
mod orchestrate;
mod teams;
