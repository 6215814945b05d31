//! Repository layer: the storage adapter for package sources.
//!
//! # Responsibility
//! - Define the persistence contract used by services.
//! - Keep SQL details out of the model and service layers.
//!
//! # Invariants
//! - Repositories are the only code that assigns source ids.
//! - Repository APIs return semantic errors (`NotFound`, `NotPersisted`)
//!   alongside transport errors.

pub mod source_repo;
