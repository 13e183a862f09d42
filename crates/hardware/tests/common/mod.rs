//! Shared test infrastructure.

/// Core construction and tick loop helpers.
pub mod harness;
