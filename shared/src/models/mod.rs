//! Domain models for the Tablet Production Tracking Platform

mod purchase_order;
mod receive;
mod submission;

pub use purchase_order::*;
pub use receive::*;
pub use submission::*;
