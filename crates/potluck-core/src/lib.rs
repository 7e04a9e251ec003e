//! Service plumbing shared by Potluck binaries: error bodies, health checks,
//! request ids, tracing setup and serde helpers.

pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
