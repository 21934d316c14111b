//! Submission aggregation and report loading.
//!
//! `aggregate` holds the pure statistics over a snapshot; `service` feeds it
//! consistent snapshots and keeps results in a revision-tagged cache.

mod aggregate;
mod cache;
mod service;

pub use aggregate::*;
pub use cache::*;
pub use service::*;
