//! Cache tiers and the chain that consults them in order

mod chain;
mod distributed;
mod memory;
mod window;

pub use chain::{CacheChain, Lookup, LookupTier};
pub use distributed::DistributedCache;
pub use memory::InProcessCache;
