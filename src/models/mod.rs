//! Data models for the study-materials portal.
//!
//! These map to the catalog tables via `sqlx::FromRow` and serialize
//! naturally as JSON via `serde`.

pub mod paper;
