//! # history-service
//!
//! Application layer: tiered history lookup, the backfill orchestrator, the
//! sync reconciler, live event ingestion, transcript assembly and DTOs.

pub mod dto;
pub mod services;

pub use services::{
    BackfillReport, BackfillService, BackfillSummary, ChannelLocks, ContextBuilder, HistoryService,
    IngestService, MaintenanceService, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult, ServiceSettings, SyncReport, SyncService, Transcript,
};
