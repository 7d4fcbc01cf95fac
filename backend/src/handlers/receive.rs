//! HTTP handlers for receive and bag endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use shared::Receive;

use crate::error::AppResult;
use crate::services::{receive::ReceiveWithBags, ReceiveService};
use crate::AppState;

/// Response for a bag push
#[derive(Debug, Serialize)]
pub struct PushBagResponse {
    pub external_ref: String,
}

/// Response for the next bag number lookup
#[derive(Debug, Serialize)]
pub struct NextBagNumberResponse {
    pub bag_number: i32,
}

/// Get a receive with its bags
pub async fn get_receive(
    State(state): State<AppState>,
    Path(receive_id): Path<Uuid>,
) -> AppResult<Json<ReceiveWithBags>> {
    let service = ReceiveService::new(state.db, state.platform.clone());
    let receive = service.get_receive(receive_id).await?;
    Ok(Json(receive))
}

/// Publish a draft receive (one-way)
pub async fn publish_receive(
    State(state): State<AppState>,
    Path(receive_id): Path<Uuid>,
) -> AppResult<Json<Receive>> {
    let service = ReceiveService::new(state.db, state.platform.clone());
    let receive = service.publish_receive(receive_id).await?;
    Ok(Json(receive))
}

/// Mark a published receive as physically emptied
pub async fn close_receive(
    State(state): State<AppState>,
    Path(receive_id): Path<Uuid>,
) -> AppResult<Json<Receive>> {
    let service = ReceiveService::new(state.db, state.platform.clone());
    let receive = service.close_receive(receive_id).await?;
    Ok(Json(receive))
}

/// Close a fully packaged bag
pub async fn close_bag(
    State(state): State<AppState>,
    Path(bag_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ReceiveService::new(state.db, state.platform.clone());
    service.close_bag(bag_id).await?;
    Ok(Json(()))
}

/// Push a closed bag to the external inventory platform
pub async fn push_bag(
    State(state): State<AppState>,
    Path(bag_id): Path<Uuid>,
) -> AppResult<Json<PushBagResponse>> {
    let service = ReceiveService::new(state.db, state.platform.clone());
    let external_ref = service.push_bag(bag_id).await?;
    Ok(Json(PushBagResponse { external_ref }))
}

/// Next bag number for a flavor within a receive
pub async fn get_next_bag_number(
    State(state): State<AppState>,
    Path((receive_id, flavor_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<NextBagNumberResponse>> {
    let service = ReceiveService::new(state.db, state.platform.clone());
    let bag_number = service.next_bag_number(receive_id, flavor_id).await?;
    Ok(Json(NextBagNumberResponse { bag_number }))
}
