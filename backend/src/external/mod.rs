//! External API integrations

pub mod inventory_platform;

pub use inventory_platform::InventoryPlatformClient;
