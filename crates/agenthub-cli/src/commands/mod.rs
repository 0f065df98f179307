//! CLI command implementations

pub mod chain;
pub mod simulate;
