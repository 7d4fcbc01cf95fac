//! HTTP handlers for production submission endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{BagCandidate, Submission};

use crate::error::AppResult;
use crate::services::{
    submission::{CreateSubmissionInput, SubmissionResult},
    BagMatcherService, ReassignmentService, SubmissionService,
};
use crate::AppState;

/// Input for resolving an ambiguous submission
#[derive(Debug, Deserialize)]
pub struct ResolveSubmissionInput {
    pub bag_id: Uuid,
}

/// Input for reassigning a submission to another purchase order
#[derive(Debug, Deserialize)]
pub struct ReassignSubmissionInput {
    pub target_po_id: Uuid,
}

/// Create a production submission and run the matching/allocation pipeline
pub async fn create_submission(
    State(state): State<AppState>,
    Json(input): Json<CreateSubmissionInput>,
) -> AppResult<Json<SubmissionResult>> {
    let service = SubmissionService::new(state.db);
    let result = service.create_submission(input).await?;
    Ok(Json(result))
}

/// Get a submission with its match outcome and, if ambiguous, candidates
pub async fn get_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> AppResult<Json<SubmissionResult>> {
    let service = SubmissionService::new(state.db);
    let result = service.get_submission(submission_id).await?;
    Ok(Json(result))
}

/// List submissions flagged for manager review
pub async fn list_submissions_needing_review(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Submission>>> {
    let service = SubmissionService::new(state.db);
    let submissions = service.list_needing_review().await?;
    Ok(Json(submissions))
}

/// Get the current candidate bags for a submission's signature
pub async fn get_submission_candidates(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> AppResult<Json<Vec<BagCandidate>>> {
    let service = SubmissionService::new(state.db.clone());
    let result = service.get_submission(submission_id).await?;

    let matcher = BagMatcherService::new(state.db);
    let candidates = matcher
        .find_candidates(
            result.submission.flavor_id,
            result.submission.bag_number,
            result.submission.box_number,
        )
        .await?;
    Ok(Json(candidates))
}

/// Manager action: resolve an ambiguous submission to a chosen bag
pub async fn resolve_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
    Json(input): Json<ResolveSubmissionInput>,
) -> AppResult<Json<Submission>> {
    let service = SubmissionService::new(state.db);
    let submission = service.resolve_ambiguous(submission_id, input.bag_id).await?;
    Ok(Json(submission))
}

/// Manager action: confirm a submission's PO assignment
pub async fn approve_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ReassignmentService::new(state.db);
    service.approve(submission_id).await?;
    Ok(Json(()))
}

/// Manager action: move a submission's counts to another purchase order
pub async fn reassign_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
    Json(input): Json<ReassignSubmissionInput>,
) -> AppResult<Json<()>> {
    let service = ReassignmentService::new(state.db);
    service.reassign(submission_id, input.target_po_id).await?;
    Ok(Json(()))
}
