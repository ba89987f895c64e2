//! Domain layer for Fleet Pulse.
//!
//! This crate contains:
//! - Fleet collection models (devices, positions, fuel requests, reference data)
//! - The dashboard aggregation engine and its derived views
//! - The notification receiver

pub mod models;
pub mod services;
