//! In-memory cache for API responses with a fixed time-to-live
//!
//! This module provides a cache that keeps raw response bodies keyed by request
//! URL. A background reaper task sweeps the store once per TTL and removes every
//! entry older than the TTL. Lookups never check freshness themselves, so an
//! expired entry stays readable until the next sweep removes it: residency is
//! always more than one TTL and at most two.

mod reaper;
mod store;

pub use store::Cache;
