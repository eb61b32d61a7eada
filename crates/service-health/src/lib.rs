//! Service Health
//!
//! Health checks for remote SOAP and REST services. Each check invokes one
//! configured operation, normalizes the response into a protocol-agnostic
//! outcome and validates it against declarative rules.
//!
//! # Flow
//! `ServiceDefinition` -> `Dispatcher` -> adapter -> `CallOutcome`
//! -> validation engine -> `CheckResult` -> `ServiceStore`
//!
//! # Design Principles
//! - Uniform: SOAP and REST calls produce the same outcome shape
//! - Isolated: one failing service never affects another in a batch
//! - Structured: every failure surfaces as a `CheckResult`, never a panic

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod store;
pub mod transport;

// Re-export contracts
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use contracts::*;
