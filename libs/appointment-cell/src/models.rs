use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::scheduling::{Appointment, BillingRecord, SlotKey};
use shared_utils::input::{self, InputError};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking request as sent by clients. Every field is required; they stay
/// optional here so absence is reported as a validation failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub patient_id: Option<String>,
    pub professional_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "type")]
    pub appointment_type: Option<String>,
    pub reason: Option<String>,
}

/// A fully validated booking request.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingCommand {
    pub patient_id: Uuid,
    pub slot: SlotKey,
    pub appointment_type: String,
    pub reason: String,
}

impl BookAppointmentRequest {
    pub fn parse(&self) -> Result<BookingCommand, BookingError> {
        let command = BookingCommand {
            patient_id: input::parse_uuid(self.patient_id.as_deref(), "patientId")?,
            slot: SlotKey {
                professional_id: input::parse_uuid(self.professional_id.as_deref(), "professionalId")?,
                date: input::parse_date(self.date.as_deref(), "date")?,
                start_time: input::parse_time(self.start_time.as_deref(), "startTime")?,
                end_time: input::parse_time(self.end_time.as_deref(), "endTime")?,
            },
            appointment_type: input::required(self.appointment_type.as_deref(), "type")?.to_string(),
            reason: input::required(self.reason.as_deref(), "reason")?.to_string(),
        };

        if command.slot.start_time >= command.slot.end_time {
            return Err(BookingError::Validation(
                "startTime must be before endTime".to_string(),
            ));
        }

        Ok(command)
    }
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDetails {
    pub appointment: Appointment,
    pub billing: Option<BillingRecord>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("slot no longer available")]
    Conflict,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Storage(String),
}

impl From<InputError> for BookingError {
    fn from(err: InputError) -> Self {
        BookingError::Validation(err.to_string())
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotTaken => BookingError::Conflict,
            other => BookingError::Storage(other.to_string()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::Conflict => AppError::Conflict(BookingError::Conflict.to_string()),
            BookingError::NotFound(msg) => AppError::NotFound(msg),
            BookingError::Storage(msg) => AppError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn request() -> BookAppointmentRequest {
        BookAppointmentRequest {
            patient_id: Some(Uuid::new_v4().to_string()),
            professional_id: Some(Uuid::new_v4().to_string()),
            date: Some("01/07/2025".to_string()),
            start_time: Some("09:00:00".to_string()),
            end_time: Some("09:30".to_string()),
            appointment_type: Some("Consulta".to_string()),
            reason: Some("chequeo".to_string()),
        }
    }

    #[test]
    fn parses_a_complete_request() {
        let command = request().parse().unwrap();

        assert_eq!(command.slot.date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(command.slot.end_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(command.appointment_type, "Consulta");
    }

    #[test]
    fn blank_reason_is_rejected() {
        let mut req = request();
        req.reason = Some("  ".to_string());

        assert_matches!(req.parse(), Err(BookingError::Validation(msg)) if msg.contains("reason"));
    }

    #[test]
    fn every_field_is_required() {
        let mut req = request();
        req.patient_id = None;
        assert_matches!(req.parse(), Err(BookingError::Validation(_)));

        let mut req = request();
        req.appointment_type = None;
        assert_matches!(req.parse(), Err(BookingError::Validation(msg)) if msg.contains("type"));
    }

    #[test]
    fn store_conflicts_become_booking_conflicts() {
        assert_matches!(BookingError::from(StoreError::SlotTaken), BookingError::Conflict);
        assert_matches!(
            BookingError::from(StoreError::Backend("down".to_string())),
            BookingError::Storage(_)
        );
    }

    #[test]
    fn conflict_maps_to_http_conflict() {
        let app_error = AppError::from(BookingError::Conflict);
        assert_eq!(app_error.kind(), "ConflictError");
        assert_eq!(app_error.message(), "slot no longer available");
    }
}
