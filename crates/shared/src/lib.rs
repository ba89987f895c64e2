//! Shared utilities and common types for the Fleet Pulse backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Guarded ratio and rounding arithmetic
//! - Common validation logic

pub mod ratio;
pub mod validation;
