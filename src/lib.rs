//! FLOWSCAN: multi-factor stock scanner scoring engine
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod error;
pub mod types;
pub mod indicators;
pub mod scanners;
pub mod engine;
pub mod data;
pub mod dashboard;
