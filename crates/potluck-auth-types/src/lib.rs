//! Token contract shared by the API service, the admin CLI and tests.
//!
//! Provides access and refresh JWT issuance/validation, refresh-token hashing
//! and bearer-token header parsing.

pub mod bearer;
pub mod token;
