//! Foundational data structures, error types, and the stream abstraction.

pub mod error;
pub mod models;
pub mod source;
