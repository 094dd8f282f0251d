//! Purchase submission and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CorrelationId, ItemId, UserId};
use purchase::{
    InMemoryCatalog, PurchaseCommand, PurchaseEvent, PurchaseSaga, PurchaseSagaDefinition,
    PurchaseSnapshot, PurchaseStatus,
};
use saga_engine::{InMemoryBus, NullNotifier, RetryPolicy, TransitionEngine};
use saga_store::InMemorySagaStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Engine wiring for single-process deployment: in-memory store and bus,
/// catalog-backed pricing.
pub type PurchaseEngine = TransitionEngine<
    PurchaseSagaDefinition<InMemoryCatalog>,
    InMemorySagaStore<PurchaseSaga>,
    InMemoryBus<PurchaseCommand>,
    NullNotifier,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub engine: PurchaseEngine,
    pub status: PurchaseStatus<InMemorySagaStore<PurchaseSaga>>,
    pub retry: RetryPolicy,
}

// -- Request / response types --

#[derive(Deserialize)]
pub struct SubmitPurchaseRequest {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub quantity: u32,
    /// Client-supplied idempotency key; doubles as the correlation ID. A
    /// resubmission with the same key never creates a second purchase.
    pub idempotency_key: Uuid,
}

#[derive(Serialize)]
pub struct PurchaseAcceptedResponse {
    pub correlation_id: CorrelationId,
}

// -- Handlers --

/// POST /purchases — submit a purchase for processing.
///
/// Returns 202: acceptance means the request entered the saga, not that
/// the purchase succeeded. Poll the status endpoint for the outcome.
#[tracing::instrument(skip(state, req), fields(idempotency_key = %req.idempotency_key))]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitPurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseAcceptedResponse>), ApiError> {
    if req.quantity == 0 {
        return Err(ApiError::BadRequest("quantity must be at least 1".into()));
    }

    let correlation_id = CorrelationId::from_uuid(req.idempotency_key);
    let event = PurchaseEvent::requested(
        UserId::from_uuid(req.user_id),
        ItemId::from_uuid(req.item_id),
        req.quantity,
        correlation_id,
    );

    state
        .engine
        .dispatch_with_redelivery(event, &state.retry)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PurchaseAcceptedResponse { correlation_id }),
    ))
}

/// GET /purchases/{id}/status — current state of a purchase by its
/// idempotency key.
#[tracing::instrument(skip(state))]
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseSnapshot>, ApiError> {
    let correlation_id = CorrelationId::from_uuid(id);
    let snapshot = state
        .status
        .get(correlation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no purchase with key {id}")))?;

    Ok(Json(snapshot))
}
