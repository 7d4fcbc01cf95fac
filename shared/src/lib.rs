//! Shared types and domain logic for the Tablet Production Tracking Platform
//!
//! This crate contains the pure parts of the production matching and
//! allocation engine: status enums, the box-tolerant bag matcher resolution,
//! the sequential-fill purchase order planner, and validation helpers. It has
//! no database or HTTP dependencies so the rules can be tested in isolation.

pub mod allocation;
pub mod models;
pub mod types;
pub mod validation;

pub use allocation::*;
pub use models::*;
pub use types::*;
pub use validation::*;
