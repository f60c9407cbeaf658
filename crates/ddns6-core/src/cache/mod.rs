// # Cache Store Implementations
//
// This module provides implementations of the CacheStore trait.

pub mod file;
pub mod memory;

pub use file::FileCacheStore;
pub use memory::MemoryCacheStore;
