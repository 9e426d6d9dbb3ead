use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, BillingRecord, NewBooking, ProfessionalFee, Slot, SlotEntry, SlotKey,
};

use crate::supabase::SupabaseError;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The slot vanished before the booking unit could lock it, or a
    /// uniqueness constraint rejected the booking.
    #[error("slot is no longer available")]
    SlotTaken,

    /// A new slot intersects another open slot of the same professional.
    #[error("slot overlaps an existing slot: {0}")]
    Overlap(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("malformed storage row: {0}")]
    Decode(String),
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Transport(e) if e.is_decode() => StoreError::Decode(e.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Open slots, keyed by id and unique on [`SlotKey`].
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Slots ordered by `(date, start_time)`; every professional when `None`.
    async fn list_slots(&self, professional_id: Option<Uuid>) -> Result<Vec<Slot>, StoreError>;

    async fn find_slot(&self, key: &SlotKey) -> Result<Option<Slot>, StoreError>;

    /// Inserts the batch as one unit. Entries whose key already exists are
    /// skipped; the returned slots are the rows actually created. An entry
    /// overlapping another open slot of the professional fails the whole
    /// batch with [`StoreError::Overlap`].
    async fn insert_slots(
        &self,
        professional_id: Uuid,
        entries: &[SlotEntry],
    ) -> Result<Vec<Slot>, StoreError>;

    /// Returns whether a slot was removed. Removing an absent slot is not an error.
    async fn delete_slot(&self, slot_id: Uuid) -> Result<bool, StoreError>;

    /// Removes every open slot of the professional, past or future.
    async fn delete_all_slots(&self, professional_id: Uuid) -> Result<Vec<Slot>, StoreError>;
}

#[async_trait]
pub trait ProfessionalDirectory: Send + Sync {
    /// `None` when the professional does not exist.
    async fn consultation_fee(&self, professional_id: Uuid) -> Result<Option<ProfessionalFee>, StoreError>;
}

#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Inserts the appointment, then its billing record, then deletes the slot,
    /// all in one atomic unit. Fails with [`StoreError::SlotTaken`] when the
    /// slot is gone by the time the unit locks it.
    async fn commit_booking(&self, booking: &NewBooking) -> Result<(), StoreError>;

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn get_billing_record(&self, appointment_id: Uuid) -> Result<Option<BillingRecord>, StoreError>;
}

/// Everything the scheduling core needs from persistence.
pub trait SchedulingStore: SlotStore + ProfessionalDirectory + BookingLedger {}

impl<T> SchedulingStore for T where T: SlotStore + ProfessionalDirectory + BookingLedger {}
