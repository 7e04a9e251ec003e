//! Domain types shared across all Potluck crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod pagination;
pub mod role_template;
pub mod scope;
pub mod unit;
