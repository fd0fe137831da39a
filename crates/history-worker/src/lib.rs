//! # history-worker
//!
//! Long-running process around the history services: the platform REST
//! fetcher, the startup and periodic backfill scheduler, and an Axum HTTP
//! surface for live events, transcripts and maintenance.

pub mod discord;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod scheduler;
pub mod server;
pub mod state;
