//! Shutdown capability for collaborators holding external resources

use async_trait::async_trait;

/// Releases pools, sockets and clients on shutdown
#[async_trait]
pub trait Closeable: Send + Sync {
    /// Short name used in shutdown logs
    fn name(&self) -> &'static str;

    async fn close(&self);
}
