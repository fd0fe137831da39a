//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers between DTOs and domain entities

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    BackfillRequest, ContextRequest, EditMessageRequest, MessageEventRequest, SyncRequest,
    ThresholdRequest,
};

pub use responses::{
    ApiResponse, ContextResponse, DeleteResponse, HealthChecks, HealthResponse, IngestResponse,
    ReadinessResponse, ResetResponse, StoredMessageResponse,
};
