//! Marketplace listing API endpoints.

use axum::extract::{Path, State};

use super::{created, error, resolve_image, success, ApiResult, Payload, QueryParams};
use crate::errors::AppError;
use crate::models::{
    CreateListingRequest, Listing, ListingListQuery, ListingStatus, UpdateListingRequest,
};
use crate::AppState;

/// GET /api/listings - List items, newest first, by category and status.
pub async fn list_listings(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListingListQuery>,
) -> ApiResult<Vec<Listing>> {
    let status = query
        .status
        .as_deref()
        .map(ListingStatus::parse_field)
        .transpose()?;

    let listings = state
        .repo
        .list_listings(query.category.as_deref(), status)
        .await?;
    success(listings)
}

/// GET /api/listings/:id - Get a single listing.
pub async fn get_listing(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Listing> {
    match state.repo.get_listing(&id).await {
        Ok(Some(listing)) => success(listing),
        Ok(None) => error(AppError::NotFound(format!("Listing {} not found", id))),
        Err(e) => error(e),
    }
}

/// POST /api/listings - Create a listing (JSON or multipart with an image file).
pub async fn create_listing(
    State(state): State<AppState>,
    Payload { body, image }: Payload<CreateListingRequest>,
) -> ApiResult<Listing> {
    let defaults = body.validate()?;

    let image = resolve_image(&state, image, body.image.as_ref()).await?;
    let listing = state.repo.create_listing(&body, defaults, image).await?;

    tracing::info!("Created listing {}", listing.id);
    created(listing)
}

/// PATCH /api/listings/:id - Update supplied fields of a listing.
pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload { body, .. }: Payload<UpdateListingRequest>,
) -> ApiResult<Listing> {
    let changes = body.validate()?;

    let listing = state.repo.update_listing(&id, &body, changes).await?;
    success(listing)
}

/// DELETE /api/listings/:id - Remove a listing.
pub async fn delete_listing(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_listing(&id).await?;
    success(()).map(|r| r.with_message("Listing deleted"))
}
