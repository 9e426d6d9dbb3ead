use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::ensure_acts_for;
use shared_utils::input;

use crate::models::{BookAppointmentRequest, BookingDetails, BookingError, BookingReceipt};
use crate::services::booking::BookingCoordinator;

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let Json(request) = payload?;
    let command = request.parse()?;

    ensure_acts_for(&user, &command.patient_id.to_string(), "book for this patient")?;
    debug!("User {} booking {}", user.id, command.slot);

    let receipt = BookingCoordinator::new(&state).book(command).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<BookingDetails>, AppError> {
    let appointment_id = input::parse_uuid(Some(appointment_id.as_str()), "appointmentId")
        .map_err(BookingError::from)?;

    let details = BookingCoordinator::new(&state).details(appointment_id).await?;

    let patient = details.appointment.patient_id.to_string();
    let professional = details.appointment.professional_id.to_string();
    if !user.acts_for(&patient) && !user.acts_for(&professional) {
        return Err(AppError::Forbidden("Not authorized to view this appointment".to_string()));
    }

    Ok(Json(details))
}
