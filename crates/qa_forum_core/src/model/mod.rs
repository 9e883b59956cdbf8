//! Forum domain entities.
//!
//! # Responsibility
//! - Define typed records for every table the forum store owns.
//! - Keep persistence state explicit: `id == None` means "not yet saved".
//!
//! # Invariants
//! - Ids are assigned by the store on first insert and never change.
//! - Entities carry no connection and cache no derived collections.

pub mod question;
pub mod relation;
pub mod reply;
pub mod user;
