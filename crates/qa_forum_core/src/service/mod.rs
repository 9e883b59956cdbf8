//! Use-case services composed from repository calls.
//!
//! # Invariants
//! - Services never issue SQL directly; they go through repository traits.

pub mod thread_service;
