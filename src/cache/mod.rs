//! Cache Core
//!
//! Shared caching machinery for the resolvers:
//!
//! - [`Clock`]: injectable time source
//! - [`CacheEntry`]: a value plus the time it was stored
//! - [`TtlCache`]: mutex-guarded map with per-lookup expiry ([`Expiry`])
//! - [`ResolverCaches`]: the store owning every resolver cache
//!
//! # Locking
//!
//! Each cache has its own guard and no guard is held while the content tree
//! is being read. A miss is computed without the lock and committed
//! afterwards, so two callers may compute the same miss; the last write
//! wins and entries are always stored whole.

pub mod clock;
pub mod entry;
pub mod metrics;
pub mod store;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use metrics::{CacheCounters, CacheSnapshot, CacheStats, ResolverCounters};
pub use store::{ResolverCaches, SettingKey, SettingValue, SettingsLocation};
pub use ttl::{Expiry, TtlCache};
