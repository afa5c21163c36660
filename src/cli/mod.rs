//! CLI Command Implementations
//!
//! Thin wrappers that wire configuration into the library types and print
//! results. All pipeline behavior lives in the library modules.

pub mod commands;
