//! Support ticket API endpoints.

use axum::extract::{Path, State};

use super::{created, error, success, ApiResult, Payload, QueryParams};
use crate::errors::AppError;
use crate::models::{
    CreateSupportTicketRequest, SupportListQuery, SupportTicket, TicketStatus,
    UpdateSupportTicketRequest,
};
use crate::AppState;

/// GET /api/support - List tickets, newest first, optionally by status.
pub async fn list_support_tickets(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SupportListQuery>,
) -> ApiResult<Vec<SupportTicket>> {
    let status = query
        .status
        .as_deref()
        .map(TicketStatus::parse_field)
        .transpose()?;

    let tickets = state.repo.list_support_tickets(status).await?;
    success(tickets)
}

/// GET /api/support/:id - Get a single ticket.
pub async fn get_support_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SupportTicket> {
    match state.repo.get_support_ticket(&id).await {
        Ok(Some(ticket)) => success(ticket),
        Ok(None) => error(AppError::NotFound(format!(
            "Support ticket {} not found",
            id
        ))),
        Err(e) => error(e),
    }
}

/// POST /api/support - Open a ticket. Status defaults to pending.
pub async fn create_support_ticket(
    State(state): State<AppState>,
    Payload { body, .. }: Payload<CreateSupportTicketRequest>,
) -> ApiResult<SupportTicket> {
    let status = body.validate()?;

    let ticket = state.repo.create_support_ticket(&body, status).await?;
    tracing::info!("Opened support ticket {}", ticket.id);
    created(ticket).map(|r| r.with_message("Support request received"))
}

/// PATCH /api/support/:id - Update supplied fields, typically the status.
pub async fn update_support_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload { body, .. }: Payload<UpdateSupportTicketRequest>,
) -> ApiResult<SupportTicket> {
    let status = body.validate()?;

    let ticket = state.repo.update_support_ticket(&id, &body, status).await?;
    success(ticket)
}

/// DELETE /api/support/:id - Delete a ticket.
pub async fn delete_support_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_support_ticket(&id).await?;
    success(()).map(|r| r.with_message("Support ticket deleted"))
}
