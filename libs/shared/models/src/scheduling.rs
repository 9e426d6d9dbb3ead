use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// SLOTS
// ==============================================================================

/// One open, bookable interval `[start_time, end_time)` on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(rename = "slotId")]
    pub id: Uuid,
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Slot {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            professional_id: self.professional_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn entry(&self) -> SlotEntry {
        SlotEntry {
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

/// The identity of a slot. Two slots with the same key are the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotKey {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}-{}",
            self.professional_id,
            self.date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// A validated `{date, startTime, endTime}` triple, not yet owned by a store row.
///
/// Ordering is `(date, start_time, end_time)`, which is also the listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEntry {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl SlotEntry {
    pub fn key(&self, professional_id: Uuid) -> SlotKey {
        SlotKey {
            professional_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

// ==============================================================================
// APPOINTMENTS & BILLING
// ==============================================================================

/// Booking is confirm-or-fail, so `Confirmed` is the only status produced.
/// A payment step would add a `PendingPayment` state here, not on billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Confirmed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "Confirmed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub reason: String,
    pub consultation_fee: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingStatus {
    Pending,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Pending => write!(f, "Pending"),
        }
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingStatus::Pending => write!(f, "Pending"),
        }
    }
}

/// Payment obligation for exactly one appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub professional_id: Uuid,
    pub patient_id: Uuid,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub status: BillingStatus,
    pub created_at: DateTime<Utc>,
}

impl BillingRecord {
    /// Opens the pending billing record for a freshly confirmed appointment.
    pub fn for_appointment(appointment: &Appointment) -> Self {
        Self {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            professional_id: appointment.professional_id,
            patient_id: appointment.patient_id,
            amount: appointment.consultation_fee,
            payment_method: PaymentMethod::Pending,
            status: BillingStatus::Pending,
            created_at: appointment.created_at,
        }
    }
}

/// Everything the booking unit writes in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub slot_id: Uuid,
    pub appointment: Appointment,
    pub billing: BillingRecord,
}

/// Fee row of a professional. `consultation_fee` is `None` when never configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalFee {
    pub professional_id: Uuid,
    pub consultation_fee: Option<f64>,
}
