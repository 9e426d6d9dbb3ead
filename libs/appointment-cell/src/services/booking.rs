use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::{AppState, SchedulingStore};
use shared_models::scheduling::{Appointment, AppointmentStatus, BillingRecord, NewBooking};

use crate::models::{BookingCommand, BookingDetails, BookingError, BookingReceipt};
use crate::services::fee::FeeResolver;

/// Patient-side booking: claims one open slot and turns it into a confirmed
/// appointment with its billing record, or fails with nothing written.
pub struct BookingCoordinator {
    store: Arc<dyn SchedulingStore>,
    fees: FeeResolver,
}

impl BookingCoordinator {
    pub fn new(state: &AppState) -> Self {
        Self::with_store(state.store.clone())
    }

    pub fn with_store(store: Arc<dyn SchedulingStore>) -> Self {
        Self {
            fees: FeeResolver::new(store.clone()),
            store,
        }
    }

    #[instrument(skip(self, command), fields(patient = %command.patient_id, slot = %command.slot))]
    pub async fn book(&self, command: BookingCommand) -> Result<BookingReceipt, BookingError> {
        // 1. The exact slot must still be open.
        let slot = match self.store.find_slot(&command.slot).await? {
            Some(slot) => slot,
            None => {
                if !self.fees.professional_exists(command.slot.professional_id).await? {
                    return Err(BookingError::NotFound(format!(
                        "professional {} not found",
                        command.slot.professional_id
                    )));
                }
                debug!("Slot {} is not open", command.slot);
                return Err(BookingError::Conflict);
            }
        };

        // 2. Fee is read now and frozen into both records.
        let fee = self.fees.resolve(slot.professional_id).await?;

        // 3. Appointment, billing and slot removal as one unit.
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: command.patient_id,
            professional_id: slot.professional_id,
            scheduled_at: slot.starts_at(),
            status: AppointmentStatus::Confirmed,
            appointment_type: command.appointment_type,
            reason: command.reason,
            consultation_fee: fee,
            created_at: Utc::now(),
        };
        let billing = BillingRecord::for_appointment(&appointment);
        let appointment_id = appointment.id;

        let booking = NewBooking {
            slot_id: slot.id,
            appointment,
            billing,
        };

        if let Err(e) = self.store.commit_booking(&booking).await {
            warn!("Booking of slot {} failed: {}", slot.id, e);
            return Err(e.into());
        }

        info!(
            "Appointment {} confirmed for patient {} with professional {}",
            appointment_id, command.patient_id, slot.professional_id
        );

        Ok(BookingReceipt { appointment_id })
    }

    pub async fn details(&self, appointment_id: Uuid) -> Result<BookingDetails, BookingError> {
        let appointment = self
            .store
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("appointment {} not found", appointment_id)))?;
        let billing = self.store.get_billing_record(appointment_id).await?;

        Ok(BookingDetails { appointment, billing })
    }
}
