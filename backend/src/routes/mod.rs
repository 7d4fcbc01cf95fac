//! Route definitions for the Tablet Production Tracking Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Production submissions and manager actions
        .nest("/submissions", submission_routes())
        // Receives and bags
        .nest("/receives", receive_routes())
        .nest("/bags", bag_routes())
        // Purchase orders
        .nest("/purchase-orders", purchase_order_routes())
}

/// Submission routes
fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_submission))
        .route("/review", get(handlers::list_submissions_needing_review))
        .route("/:id", get(handlers::get_submission))
        .route("/:id/candidates", get(handlers::get_submission_candidates))
        .route("/:id/resolve", post(handlers::resolve_submission))
        .route("/:id/approve", post(handlers::approve_submission))
        .route("/:id/reassign", post(handlers::reassign_submission))
}

/// Receive routes
fn receive_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(handlers::get_receive))
        .route("/:id/publish", post(handlers::publish_receive))
        .route("/:id/close", post(handlers::close_receive))
        .route(
            "/:id/next-bag-number/:flavor_id",
            get(handlers::get_next_bag_number),
        )
}

/// Bag routes
fn bag_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/close", post(handlers::close_bag))
        .route("/:id/push", post(handlers::push_bag))
}

/// Purchase order routes
fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_purchase_orders))
        .route("/:id", get(handlers::get_purchase_order))
        .route("/:id/close", post(handlers::close_purchase_order))
}
