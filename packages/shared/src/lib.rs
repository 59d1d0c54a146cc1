//! Shared utilities for Murmur.
//!
//! Logger initialisation and time helpers used by the server binary and its
//! tests.

pub mod logger;
pub mod time;
