//! Domain model for configured package sources.
//!
//! # Responsibility
//! - Define the record shape shared by storage, services and the CLI.
//!
//! # Invariants
//! - Records carry no persistence framework types.
//! - Identity is owned by the storage layer, never by callers.

pub mod source;
