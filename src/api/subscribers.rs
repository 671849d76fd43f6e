//! Podcast subscriber API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use super::{error, success, ApiResponse, ApiResult, Payload, QueryParams};
use crate::errors::AppError;
use crate::models::{
    PodcastSubscriber, SubscribeOutcome, SubscribeRequest, SubscriberListQuery,
    UpdateSubscriberRequest,
};
use crate::AppState;

/// GET /api/podcast-subscribers - List subscribers, optionally by active flag.
pub async fn list_subscribers(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SubscriberListQuery>,
) -> ApiResult<Vec<PodcastSubscriber>> {
    let subscribers = state.repo.list_subscribers(query.active).await?;
    success(subscribers)
}

/// GET /api/podcast-subscribers/:id - Get a single subscriber.
pub async fn get_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PodcastSubscriber> {
    match state.repo.get_subscriber(&id).await {
        Ok(Some(subscriber)) => success(subscriber),
        Ok(None) => error(AppError::NotFound(format!("Subscriber {} not found", id))),
        Err(e) => error(e),
    }
}

/// POST /api/podcast-subscribers - Subscribe, reusing any existing record.
pub async fn subscribe(
    State(state): State<AppState>,
    Payload { body, .. }: Payload<SubscribeRequest>,
) -> ApiResult<PodcastSubscriber> {
    let email = body.normalized_email()?;

    let (subscriber, outcome) = state.repo.subscribe(&email).await?;
    let (status, message) = match outcome {
        SubscribeOutcome::Created => (StatusCode::CREATED, "Successfully subscribed"),
        SubscribeOutcome::AlreadyActive => (StatusCode::OK, "Already subscribed"),
        SubscribeOutcome::Reactivated => (StatusCode::OK, "Subscription reactivated"),
    };
    tracing::info!("Subscribe {}: {}", subscriber.id, message);

    Ok(ApiResponse::new(status, subscriber).with_message(message))
}

/// PATCH /api/podcast-subscribers/:id - Update email or active flag.
pub async fn update_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload { body, .. }: Payload<UpdateSubscriberRequest>,
) -> ApiResult<PodcastSubscriber> {
    let email = body.normalized_email()?;

    let subscriber = state
        .repo
        .update_subscriber(&id, email, body.is_active)
        .await?;
    success(subscriber)
}

/// DELETE /api/podcast-subscribers/:id - Unsubscribe. The record is kept.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PodcastSubscriber> {
    let subscriber = state.repo.unsubscribe(&id).await?;

    tracing::info!("Unsubscribed {}", subscriber.id);
    success(subscriber).map(|r| r.with_message("Successfully unsubscribed"))
}
