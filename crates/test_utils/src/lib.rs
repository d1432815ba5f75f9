//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the CRM
//! integration test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for test data construction
//! - `adapters`: Scripted fake ports (adapters, repositories) for hub tests
//! - `telemetry`: Opt-in tracing output for debugging tests

pub mod adapters;
pub mod builders;
pub mod fixtures;
pub mod telemetry;

pub use adapters::*;
pub use builders::*;
pub use fixtures::*;
pub use telemetry::*;
