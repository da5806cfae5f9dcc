//! Quiz use-case services.
//!
//! # Responsibility
//! - Orchestrate engine, catalog and store into adapter-facing calls.
//! - Keep UI/FFI layers free of storage and scheduling rules.

pub mod audio;
pub mod quiz_service;
