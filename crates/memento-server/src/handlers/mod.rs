//! HTTP handlers.

pub mod demo;
pub mod health;
pub mod invalidate;
pub mod metrics;
pub mod stats;
