//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod channels;
pub mod events;
pub mod health;
pub mod maintenance;
