#![deny(missing_docs)]

//! Core library for the student registry server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Text-generation client used for student summaries.
pub mod generation;
/// Structured logging and tracing setup.
pub mod logging;
/// Registry activity counters.
pub mod metrics;
/// Student records and their in-memory store.
pub mod registry;
/// Registry operations shared by the HTTP surface.
pub mod service;
