use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::scheduling::{
    Appointment, AppointmentStatus, BillingRecord, BillingStatus, NewBooking, PaymentMethod,
    ProfessionalFee, Slot, SlotEntry, SlotKey,
};

use crate::store::{BookingLedger, ProfessionalDirectory, SlotStore, StoreError};
use crate::supabase::{prefer, SupabaseClient, IGNORE_DUPLICATES, RETURN_REPRESENTATION};

const SLOTS: &str = "/rest/v1/availability_slots";
const SLOT_ORDER: &str = "order=slot_date.asc,start_time.asc";
const SLOT_UNIQUE_COLUMNS: &str = "professional_id,slot_date,start_time,end_time";

fn clock(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct SlotRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    professional_id: Uuid,
    slot_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl SlotRow {
    fn new(professional_id: Uuid, entry: &SlotEntry) -> Self {
        Self {
            id: None,
            professional_id,
            slot_date: entry.date,
            start_time: entry.start_time,
            end_time: entry.end_time,
        }
    }

    fn into_slot(self) -> Result<Slot, StoreError> {
        let id = self
            .id
            .ok_or_else(|| StoreError::Decode("availability slot row without id".to_string()))?;

        Ok(Slot {
            id,
            professional_id: self.professional_id,
            date: self.slot_date,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

fn into_slots(rows: Vec<SlotRow>) -> Result<Vec<Slot>, StoreError> {
    rows.into_iter().map(SlotRow::into_slot).collect()
}

#[derive(Debug, Deserialize)]
struct ProfessionalRow {
    id: Uuid,
    consultation_fee: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AppointmentRow {
    id: Uuid,
    patient_id: Uuid,
    professional_id: Uuid,
    scheduled_at: NaiveDateTime,
    status: AppointmentStatus,
    appointment_type: String,
    reason: String,
    consultation_fee: f64,
    created_at: DateTime<Utc>,
}

impl From<&Appointment> for AppointmentRow {
    fn from(a: &Appointment) -> Self {
        Self {
            id: a.id,
            patient_id: a.patient_id,
            professional_id: a.professional_id,
            scheduled_at: a.scheduled_at,
            status: a.status,
            appointment_type: a.appointment_type.clone(),
            reason: a.reason.clone(),
            consultation_fee: a.consultation_fee,
            created_at: a.created_at,
        }
    }
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            patient_id: row.patient_id,
            professional_id: row.professional_id,
            scheduled_at: row.scheduled_at,
            status: row.status,
            appointment_type: row.appointment_type,
            reason: row.reason,
            consultation_fee: row.consultation_fee,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BillingRow {
    id: Uuid,
    appointment_id: Uuid,
    professional_id: Uuid,
    patient_id: Uuid,
    amount: f64,
    payment_method: PaymentMethod,
    status: BillingStatus,
    created_at: DateTime<Utc>,
}

impl From<&BillingRecord> for BillingRow {
    fn from(b: &BillingRecord) -> Self {
        Self {
            id: b.id,
            appointment_id: b.appointment_id,
            professional_id: b.professional_id,
            patient_id: b.patient_id,
            amount: b.amount,
            payment_method: b.payment_method,
            status: b.status,
            created_at: b.created_at,
        }
    }
}

impl From<BillingRow> for BillingRecord {
    fn from(row: BillingRow) -> Self {
        Self {
            id: row.id,
            appointment_id: row.appointment_id,
            professional_id: row.professional_id,
            patient_id: row.patient_id,
            amount: row.amount,
            payment_method: row.payment_method,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Store backed by the Supabase PostgREST API. Booking goes through the
/// `book_slot` database function so its three writes share one transaction.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        info!("Using Supabase slot store at {}", config.supabase_url);
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl SlotStore for SupabaseStore {
    async fn list_slots(&self, professional_id: Option<Uuid>) -> Result<Vec<Slot>, StoreError> {
        let path = match professional_id {
            Some(id) => format!("{}?professional_id=eq.{}&{}", SLOTS, id, SLOT_ORDER),
            None => format!("{}?{}", SLOTS, SLOT_ORDER),
        };

        let rows: Vec<SlotRow> = self.supabase.request(Method::GET, &path, None).await?;
        into_slots(rows)
    }

    async fn find_slot(&self, key: &SlotKey) -> Result<Option<Slot>, StoreError> {
        let path = format!(
            "{}?professional_id=eq.{}&slot_date=eq.{}&start_time=eq.{}&end_time=eq.{}&limit=1",
            SLOTS,
            key.professional_id,
            key.date,
            clock(key.start_time),
            clock(key.end_time)
        );

        let rows: Vec<SlotRow> = self.supabase.request(Method::GET, &path, None).await?;
        rows.into_iter().next().map(SlotRow::into_slot).transpose()
    }

    async fn insert_slots(
        &self,
        professional_id: Uuid,
        entries: &[SlotEntry],
    ) -> Result<Vec<Slot>, StoreError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<SlotRow> = entries
            .iter()
            .map(|entry| SlotRow::new(professional_id, entry))
            .collect();
        let body = serde_json::to_value(&rows).map_err(|e| StoreError::Decode(e.to_string()))?;

        // One statement, so the batch lands whole or not at all.
        let path = format!("{}?on_conflict={}", SLOTS, SLOT_UNIQUE_COLUMNS);
        let inserted: Vec<SlotRow> = self
            .supabase
            .request_with_headers(Method::POST, &path, Some(body), Some(prefer(IGNORE_DUPLICATES)))
            .await
            .map_err(|e| {
                if e.is_exclusion_violation() {
                    StoreError::Overlap(format!("batch for professional {}", professional_id))
                } else {
                    e.into()
                }
            })?;

        debug!("Inserted {} of {} slots for {}", inserted.len(), entries.len(), professional_id);
        let mut slots = into_slots(inserted)?;
        slots.sort_by_key(|slot| (slot.date, slot.start_time, slot.end_time));
        Ok(slots)
    }

    async fn delete_slot(&self, slot_id: Uuid) -> Result<bool, StoreError> {
        let path = format!("{}?id=eq.{}", SLOTS, slot_id);
        let removed: Vec<SlotRow> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(prefer(RETURN_REPRESENTATION)))
            .await?;

        Ok(!removed.is_empty())
    }

    async fn delete_all_slots(&self, professional_id: Uuid) -> Result<Vec<Slot>, StoreError> {
        let path = format!("{}?professional_id=eq.{}", SLOTS, professional_id);
        let removed: Vec<SlotRow> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(prefer(RETURN_REPRESENTATION)))
            .await?;

        let mut slots = into_slots(removed)?;
        slots.sort_by_key(|slot| (slot.date, slot.start_time, slot.end_time));
        Ok(slots)
    }
}

#[async_trait]
impl ProfessionalDirectory for SupabaseStore {
    async fn consultation_fee(&self, professional_id: Uuid) -> Result<Option<ProfessionalFee>, StoreError> {
        let path = format!(
            "/rest/v1/healthcare_professionals?select=id,consultation_fee&id=eq.{}",
            professional_id
        );

        let rows: Vec<ProfessionalRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next().map(|row| ProfessionalFee {
            professional_id: row.id,
            consultation_fee: row.consultation_fee,
        }))
    }
}

#[async_trait]
impl BookingLedger for SupabaseStore {
    async fn commit_booking(&self, booking: &NewBooking) -> Result<(), StoreError> {
        let args = json!({
            "p_slot_id": booking.slot_id,
            "p_appointment": AppointmentRow::from(&booking.appointment),
            "p_billing": BillingRow::from(&booking.billing),
        });

        match self.supabase.rpc::<bool>("book_slot", args).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::SlotTaken),
            Err(e) if e.is_conflict() => {
                warn!("book_slot hit a uniqueness constraint: {}", e);
                Err(StoreError::SlotTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<AppointmentRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next().map(Appointment::from))
    }

    async fn get_billing_record(&self, appointment_id: Uuid) -> Result<Option<BillingRecord>, StoreError> {
        let path = format!("/rest/v1/billing_records?appointment_id=eq.{}", appointment_id);
        let rows: Vec<BillingRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next().map(BillingRecord::from))
    }
}
