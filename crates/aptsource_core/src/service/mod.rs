//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Produce the apt-facing artifacts derived from stored sources.

pub mod source_service;
pub mod sources_list;
