//! Business logic services for the Tablet Production Tracking Platform

pub mod allocation;
pub mod matching;
pub mod purchase_order;
pub mod reassignment;
pub mod receive;
pub mod status;
pub mod submission;

pub use matching::BagMatcherService;
pub use purchase_order::PurchaseOrderService;
pub use reassignment::ReassignmentService;
pub use receive::ReceiveService;
pub use submission::SubmissionService;
