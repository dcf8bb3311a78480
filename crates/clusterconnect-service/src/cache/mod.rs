//! Best-effort read cache for projects.
//!
//! ## Architecture
//!
//! - **Backend**: disabled, in-process (DashMap) or shared (Redis)
//! - **Project cache**: typed keys, TTLs and MessagePack encoding on top
//!
//! ## Read Path
//!
//! ```text
//! read → cache (bounded by op timeout) → store on miss → populate cache
//! ```
//!
//! ## Graceful Degradation
//!
//! A cache that is absent, unreachable or slow never fails a request: reads
//! fall through to the store and writes still succeed. Staleness is bounded
//! by the entry TTL.

pub mod backend;
pub mod project;

pub use backend::{CacheBackend, CacheError, CacheStats, CachedEntry};
pub use project::{LIST_KEY, ProjectCache};
