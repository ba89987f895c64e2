//! HTTP route handlers.

pub mod clients;
pub mod collections;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod sync;
