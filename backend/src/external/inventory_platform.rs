//! Inventory platform client for pushing closed bags
//!
//! The engine owns the idempotency guard (a bag is pushed at most once); this
//! client only performs the delegated API call and returns the external
//! record id.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Inventory platform API client
#[derive(Clone)]
pub struct InventoryPlatformClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Payload for pushing a finished bag to the inventory platform
#[derive(Debug, Clone, Serialize)]
pub struct BagPushRequest {
    pub bag_id: Uuid,
    pub flavor: String,
    pub bag_number: i32,
    pub label_count: i64,
    pub good_count: i64,
    pub damaged_count: i64,
}

/// Inventory platform response for a pushed bag
#[derive(Debug, Deserialize)]
struct BagPushResponse {
    id: String,
}

impl InventoryPlatformClient {
    /// Create a new InventoryPlatformClient
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Push a bag record; returns the platform's record id
    pub async fn push_bag(&self, request: &BagPushRequest) -> AppResult<String> {
        let url = format!("{}/bags", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("push request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "push rejected: {} - {}",
                status, body
            )));
        }

        let data: BagPushResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("invalid push response: {}", e)))?;

        Ok(data.id)
    }
}
