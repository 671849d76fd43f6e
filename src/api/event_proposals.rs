//! Event proposal API endpoints.

use axum::extract::{Path, State};

use super::{created, error, success, ApiResult, Payload};
use crate::errors::AppError;
use crate::models::{EventProposal, EventProposalRequest};
use crate::AppState;

/// GET /api/event-proposals - List proposals, newest first.
pub async fn list_event_proposals(State(state): State<AppState>) -> ApiResult<Vec<EventProposal>> {
    match state.repo.list_event_proposals().await {
        Ok(proposals) => success(proposals),
        Err(e) => error(e),
    }
}

/// GET /api/event-proposals/:id - Get a single proposal.
pub async fn get_event_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<EventProposal> {
    match state.repo.get_event_proposal(&id).await {
        Ok(Some(proposal)) => success(proposal),
        Ok(None) => error(AppError::NotFound(format!(
            "Event proposal {} not found",
            id
        ))),
        Err(e) => error(e),
    }
}

/// POST /api/event-proposals - Submit a proposal.
pub async fn create_event_proposal(
    State(state): State<AppState>,
    Payload { body, .. }: Payload<EventProposalRequest>,
) -> ApiResult<EventProposal> {
    let text = body.proposal_text()?;

    let proposal = state.repo.create_event_proposal(&text).await?;
    created(proposal).map(|r| r.with_message("Event proposal submitted"))
}

/// PATCH /api/event-proposals/:id - Replace the proposal text when supplied.
pub async fn update_event_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload { body, .. }: Payload<EventProposalRequest>,
) -> ApiResult<EventProposal> {
    let proposal = match body.proposal_update()? {
        Some(text) => state.repo.update_event_proposal(&id, &text).await?,
        None => state
            .repo
            .get_event_proposal(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event proposal {} not found", id)))?,
    };
    success(proposal)
}

/// DELETE /api/event-proposals/:id - Delete a proposal.
pub async fn delete_event_proposal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_event_proposal(&id).await?;
    success(()).map(|r| r.with_message("Event proposal deleted"))
}
