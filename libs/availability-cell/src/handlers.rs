use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::scheduling::Slot;
use shared_utils::extractor::ensure_acts_for;
use shared_utils::input;

use crate::models::{
    parse_publish_batch, AvailabilityError, DaySummary, ListSlotsQuery, PublishEntryRequest,
    PublishOutcome, TimeBlockRequest,
};
use crate::services::publisher::AvailabilityPublisher;

const MANAGE: &str = "manage this professional's availability";

fn uuid_param(raw: &str, field: &str) -> Result<Uuid, AppError> {
    input::parse_uuid(Some(raw), field).map_err(|e| AvailabilityError::from(e).into())
}

fn publish_response(outcome: PublishOutcome) -> (StatusCode, Json<Value>) {
    match outcome {
        PublishOutcome::Inserted(inserted) => (
            StatusCode::CREATED,
            Json(json!({
                "insertedCount": inserted.len(),
                "inserted": inserted,
            })),
        ),
        PublishOutcome::NothingToAdd => (
            StatusCode::OK,
            Json(json!({
                "message": "nothing to add",
                "insertedCount": 0,
            })),
        ),
    }
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<ListSlotsQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let professional_id = match query.professional_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(uuid_param(raw, "professionalId")?),
        _ => None,
    };

    let slots = AvailabilityPublisher::new(&state).list(professional_id).await?;
    Ok(Json(slots))
}

#[axum::debug_handler]
pub async fn day_summary(
    State(state): State<AppState>,
    Path(professional_id): Path<String>,
) -> Result<Json<Vec<DaySummary>>, AppError> {
    let professional_id = uuid_param(&professional_id, "professionalId")?;

    let summary = AvailabilityPublisher::new(&state).summary(professional_id).await?;
    Ok(Json(summary))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn publish_slots(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    payload: Result<Json<Vec<PublishEntryRequest>>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(batch) = payload?;
    let (professional_id, entries) = parse_publish_batch(&batch)?;

    ensure_acts_for(&user, &professional_id.to_string(), MANAGE)?;
    debug!("User {} publishing {} entries for {}", user.id, entries.len(), professional_id);

    let outcome = AvailabilityPublisher::new(&state)
        .publish(professional_id, entries)
        .await?;

    Ok(publish_response(outcome))
}

#[axum::debug_handler]
pub async fn publish_blocks(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(professional_id): Path<String>,
    payload: Result<Json<Vec<TimeBlockRequest>>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let professional_id = uuid_param(&professional_id, "professionalId")?;
    ensure_acts_for(&user, &professional_id.to_string(), MANAGE)?;

    let Json(requests) = payload?;
    let blocks = requests
        .iter()
        .map(TimeBlockRequest::parse)
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = AvailabilityPublisher::new(&state)
        .publish_blocks(professional_id, &blocks)
        .await?;

    Ok(publish_response(outcome))
}

#[axum::debug_handler]
pub async fn clear_slots(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(professional_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let professional_id = uuid_param(&professional_id, "professionalId")?;
    ensure_acts_for(&user, &professional_id.to_string(), MANAGE)?;

    let outcome = AvailabilityPublisher::new(&state).clear(professional_id).await?;
    Ok(Json(json!(outcome)))
}

#[axum::debug_handler]
pub async fn withdraw_slot(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path((professional_id, slot_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let professional_id = uuid_param(&professional_id, "professionalId")?;
    let slot_id = uuid_param(&slot_id, "slotId")?;
    ensure_acts_for(&user, &professional_id.to_string(), MANAGE)?;

    AvailabilityPublisher::new(&state)
        .withdraw_slot(professional_id, slot_id)
        .await?;

    Ok(Json(json!({ "removedCount": 1 })))
}
