//! HTTP handlers for the Tablet Production Tracking Platform

mod health;
mod purchase_order;
mod receive;
mod submission;

pub use health::*;
pub use purchase_order::*;
pub use receive::*;
pub use submission::*;
