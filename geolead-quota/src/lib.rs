//! Day-partitioned quota counters shared across process instances.
//!
//! A quota counter lives under a `(caller, UTC day)` key in an external
//! store. Two operations exist: a read ([`QuotaStore::get_usage`]) and an
//! atomic conditional increment ([`QuotaStore::check_and_consume`]). All
//! counter mutation in the whole system goes through the latter; nothing
//! else ever writes a quota key.
//!
//! # Fail-closed
//!
//! Enforcement that silently degrades is worse than none: a store outage
//! must never look like "usage is zero". Every transport failure, timeout,
//! or corrupt counter surfaces as a [`QuotaError`], and callers translate
//! that into denying the request. There is deliberately no in-memory
//! fallback behind the Redis backend; [`MemoryQuotaStore`] is a
//! construction-time choice for single-instance deployments and tests, not
//! a degraded mode.

pub mod error;
pub mod key;
pub mod memory;
pub mod redis;
pub mod store;

pub use error::{QuotaError, Result};
pub use key::QuotaKey;
pub use memory::MemoryQuotaStore;
pub use store::{QuotaConsumption, QuotaStore};

pub use self::redis::RedisQuotaStore;
