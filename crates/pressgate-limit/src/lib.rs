//! # Pressgate Limit
//!
//! Traffic and billing enforcement for the Pressgate pipeline:
//!
//! - **Rate limiting**: fixed hourly windows counted in-process with atomic
//!   counters, persisted asynchronously, swept in the background
//! - **Quota gating**: plan-limit checks against a short-TTL usage snapshot,
//!   with a soft-limit warning before the hard cap
//!
//! ## Failure policy
//!
//! Both gates are **fail-open**: when the backing store is unavailable the
//! platform serves traffic rather than turning a store outage into a total
//! outage. Enforcement precision degrades; availability does not.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// In-process hourly rate limiting
pub mod limiter;
/// Billing quota checks against cached usage snapshots
pub mod quota;

pub use limiter::{RateLimiter, WINDOW_SECONDS};
pub use quota::QuotaGate;
