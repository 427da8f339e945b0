//! REVLENS Cache - Two-Tier Result Caching
//!
//! Content-addressed caching for enrichment results:
//!
//! - [`VolatileCache`]: in-process, capacity-bounded, time-expiring LRU.
//!   Used for high-churn results (translations) that live for the process
//!   lifetime.
//! - [`DurableCache`]: file-backed, unbounded, no expiry. Used for
//!   expensive results (AI annotations) that must survive restarts.
//!
//! Both tiers implement [`EnrichmentCache`], the seam the engine depends
//! on. Size management for the durable tier is an external maintenance
//! operation, exposed in [`maintenance`].

mod durable;
pub mod maintenance;
mod traits;
mod volatile;

pub use durable::DurableCache;
pub use maintenance::{
    namespace_stats, purge_older_than, remove_empty_namespaces, NamespaceStats, PurgeReport,
};
pub use traits::{CacheStats, EnrichmentCache};
pub use volatile::VolatileCache;
