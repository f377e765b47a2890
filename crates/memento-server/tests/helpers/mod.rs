//! Test helpers para memento-server.

#![allow(dead_code, unused_imports)]

pub mod app;
pub mod client;
pub mod providers;

pub use app::{CountingApp, counting_app, full_router};
pub use client::{TestClient, TestResponse, client};
pub use providers::FailingProvider;
