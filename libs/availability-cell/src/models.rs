use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::scheduling::{Slot, SlotEntry};
use shared_utils::input::{self, InputError};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// One element of the publish body. Fields stay optional so a missing one is
/// reported as a validation failure naming it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishEntryRequest {
    pub professional_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// An open time block to be cut into slots of the configured length.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlockRequest {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSlotsQuery {
    pub professional_id: Option<String>,
}

fn parse_entry(
    date: Option<&str>,
    start_time: Option<&str>,
    end_time: Option<&str>,
) -> Result<SlotEntry, InputError> {
    Ok(SlotEntry {
        date: input::parse_date(date, "date")?,
        start_time: input::parse_time(start_time, "startTime")?,
        end_time: input::parse_time(end_time, "endTime")?,
    })
}

impl TimeBlockRequest {
    pub fn parse(&self) -> Result<SlotEntry, AvailabilityError> {
        Ok(parse_entry(
            self.date.as_deref(),
            self.start_time.as_deref(),
            self.end_time.as_deref(),
        )?)
    }
}

/// Parses a publish body into the single professional it names and its entries.
///
/// Any missing or malformed field rejects the whole batch, as does a batch
/// naming more than one professional.
pub fn parse_publish_batch(
    batch: &[PublishEntryRequest],
) -> Result<(Uuid, Vec<SlotEntry>), AvailabilityError> {
    let mut professional_id = None;
    let mut entries = Vec::with_capacity(batch.len());

    for (index, item) in batch.iter().enumerate() {
        let pid = input::parse_uuid(item.professional_id.as_deref(), "professionalId")
            .map_err(|e| AvailabilityError::Validation(format!("entry {}: {}", index, e)))?;

        match professional_id {
            None => professional_id = Some(pid),
            Some(first) if first != pid => {
                return Err(AvailabilityError::Validation(
                    "a batch must target a single professional".to_string(),
                ));
            }
            Some(_) => {}
        }

        let entry = parse_entry(
            item.date.as_deref(),
            item.start_time.as_deref(),
            item.end_time.as_deref(),
        )
        .map_err(|e| AvailabilityError::Validation(format!("entry {}: {}", index, e)))?;
        entries.push(entry);
    }

    let professional_id = professional_id
        .ok_or_else(|| AvailabilityError::Validation("expected at least one entry".to_string()))?;

    Ok((professional_id, entries))
}

// ==============================================================================
// RESULT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Inserted(Vec<Slot>),
    /// Every requested tuple was already published.
    NothingToAdd,
}

impl PublishOutcome {
    pub fn inserted_count(&self) -> usize {
        match self {
            PublishOutcome::Inserted(slots) => slots.len(),
            PublishOutcome::NothingToAdd => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearOutcome {
    pub removed_count: usize,
}

/// A run of back-to-back slots on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBlock {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub blocks: Vec<TimeBlock>,
    pub total_hours: f64,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Storage(String),
}

impl From<InputError> for AvailabilityError {
    fn from(err: InputError) -> Self {
        AvailabilityError::Validation(err.to_string())
    }
}

impl From<StoreError> for AvailabilityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Overlap(_) => AvailabilityError::Validation(err.to_string()),
            other => AvailabilityError::Storage(other.to_string()),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Validation(msg) => AppError::ValidationError(msg),
            AvailabilityError::NotFound(msg) => AppError::NotFound(msg),
            AvailabilityError::Storage(msg) => AppError::Storage(msg),
        }
    }
}
