// # ddns6-core
//
// Core library for ddns6, a single-shot AAAA record synchronizer.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the host's expected IPv6 address
// - **RecordResolver**: Trait for resolving the currently published address
// - **DnsProvider**: Trait for provider zone/record calls
// - **CacheStore**: Trait for persisting provider ids between runs
// - **SyncEngine**: One reconciliation pass over the above
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Single Pass**: Each invocation is independent; scheduling is external
// 3. **Never Crash the Run**: Errors are logged where they occur and end the
//    run early
// 4. **Library-First**: Everything the binary does is reachable as a library

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod traits;

// Re-export core types for convenience
pub use cache::{FileCacheStore, MemoryCacheStore};
pub use config::{ManagedDomain, ProviderConfig, SyncConfig};
pub use engine::{RunOutcome, SyncEngine};
pub use error::{Error, Result};
pub use traits::{CacheStore, DnsProvider, IpSource, RecordResolver};
