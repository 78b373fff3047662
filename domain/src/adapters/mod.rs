//! Test-only adapters that live inside the domain crate for convenience.
//!
//! These are intended for unit testing and local demos. The persistent
//! adapter (SQLite) lives in a separate crate.

pub mod memory_store;
