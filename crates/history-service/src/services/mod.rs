//! Business logic services
//!
//! This module contains the service layer: history lookup, backfill, sync,
//! live ingestion, transcript assembly and maintenance.

pub mod backfill;
pub mod context;
pub mod context_builder;
pub mod error;
pub mod history;
pub mod ingest;
pub mod locks;
pub mod maintenance;
pub mod sync;

// Re-export all services for convenience
pub use backfill::{near_target, BackfillReport, BackfillService, BackfillSummary};
pub use context::{ServiceContext, ServiceContextBuilder, ServiceSettings};
pub use context_builder::{ContextBuilder, Transcript, CURRENT_MESSAGE_NOTICE};
pub use error::{ServiceError, ServiceResult};
pub use history::{FetchedPage, HistoryService};
pub use ingest::IngestService;
pub use locks::ChannelLocks;
pub use maintenance::MaintenanceService;
pub use sync::{SyncReport, SyncService};
