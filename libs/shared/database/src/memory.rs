use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, BillingRecord, NewBooking, ProfessionalFee, Slot, SlotEntry, SlotKey,
};

use crate::store::{BookingLedger, ProfessionalDirectory, SlotStore, StoreError};

/// Write steps that can be made to fail once, to exercise rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    InsertSlots,
    InsertAppointment,
    InsertBilling,
    DeleteSlot,
}

#[derive(Debug, Default)]
struct MemoryState {
    slots: HashMap<Uuid, Slot>,
    slot_ids: HashMap<SlotKey, Uuid>,
    professionals: HashMap<Uuid, Option<f64>>,
    appointments: HashMap<Uuid, Appointment>,
    // keyed by appointment id
    billing: HashMap<Uuid, BillingRecord>,
}

impl MemoryState {
    fn sorted(mut slots: Vec<Slot>) -> Vec<Slot> {
        slots.sort_by_key(|slot| (slot.date, slot.start_time, slot.end_time, slot.professional_id));
        slots
    }

    fn remove_slot(&mut self, slot_id: Uuid) -> Option<Slot> {
        let slot = self.slots.remove(&slot_id)?;
        self.slot_ids.remove(&slot.key());
        Some(slot)
    }
}

fn overlaps(a: &SlotEntry, b: &SlotEntry) -> bool {
    a.date == b.date && a.start_time < b.end_time && b.start_time < a.end_time
}

/// Process-local store. Every operation takes the single state lock, and
/// multi-step writes check everything before mutating anything, so each call
/// is atomic with respect to every other call.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    fault: Mutex<Option<FaultPoint>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with professionals and their fees.
    pub fn with_professionals<I>(professionals: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, Option<f64>)>,
    {
        let state = MemoryState {
            professionals: professionals.into_iter().collect(),
            ..MemoryState::default()
        };

        Self {
            state: RwLock::new(state),
            fault: Mutex::new(None),
        }
    }

    /// Creates or updates a professional's fee. `None` leaves the fee unset.
    pub async fn upsert_professional(&self, professional_id: Uuid, consultation_fee: Option<f64>) {
        let mut state = self.state.write().await;
        state.professionals.insert(professional_id, consultation_fee);
    }

    /// The next write reaching `point` fails with a backend error.
    pub fn fail_next(&self, point: FaultPoint) {
        if let Ok(mut fault) = self.fault.lock() {
            *fault = Some(point);
        }
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state.appointments.values().cloned().collect();
        appointments.sort_by_key(|a| (a.scheduled_at, a.created_at));
        appointments
    }

    pub async fn billing_records(&self) -> Vec<BillingRecord> {
        let state = self.state.read().await;
        state.billing.values().cloned().collect()
    }

    fn trip(&self, point: FaultPoint) -> Result<(), StoreError> {
        let tripped = match self.fault.lock() {
            Ok(mut fault) if *fault == Some(point) => {
                *fault = None;
                true
            }
            _ => false,
        };

        if tripped {
            warn!("Injected storage failure at {:?}", point);
            Err(StoreError::Backend(format!("injected failure at {:?}", point)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SlotStore for InMemoryStore {
    async fn list_slots(&self, professional_id: Option<Uuid>) -> Result<Vec<Slot>, StoreError> {
        let state = self.state.read().await;
        let slots = state
            .slots
            .values()
            .filter(|slot| professional_id.map_or(true, |id| slot.professional_id == id))
            .cloned()
            .collect();

        Ok(MemoryState::sorted(slots))
    }

    async fn find_slot(&self, key: &SlotKey) -> Result<Option<Slot>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .slot_ids
            .get(key)
            .and_then(|id| state.slots.get(id))
            .cloned())
    }

    async fn insert_slots(
        &self,
        professional_id: Uuid,
        entries: &[SlotEntry],
    ) -> Result<Vec<Slot>, StoreError> {
        let mut state = self.state.write().await;
        self.trip(FaultPoint::InsertSlots)?;

        let mut fresh: Vec<SlotEntry> = entries
            .iter()
            .filter(|entry| !state.slot_ids.contains_key(&entry.key(professional_id)))
            .copied()
            .collect();
        fresh.sort();
        fresh.dedup();

        let open: Vec<SlotEntry> = state
            .slots
            .values()
            .filter(|slot| slot.professional_id == professional_id)
            .map(Slot::entry)
            .collect();

        for (i, entry) in fresh.iter().enumerate() {
            let clash = fresh[i + 1..]
                .iter()
                .chain(open.iter())
                .find(|other| overlaps(entry, other));
            if let Some(other) = clash {
                return Err(StoreError::Overlap(format!(
                    "{} {}-{} and {}-{}",
                    entry.date, entry.start_time, entry.end_time, other.start_time, other.end_time
                )));
            }
        }

        let mut inserted = Vec::with_capacity(fresh.len());
        for entry in fresh {
            let slot = Slot {
                id: Uuid::new_v4(),
                professional_id,
                date: entry.date,
                start_time: entry.start_time,
                end_time: entry.end_time,
            };
            state.slot_ids.insert(entry.key(professional_id), slot.id);
            state.slots.insert(slot.id, slot.clone());
            inserted.push(slot);
        }

        debug!("Inserted {} of {} slots for {}", inserted.len(), entries.len(), professional_id);
        Ok(MemoryState::sorted(inserted))
    }

    async fn delete_slot(&self, slot_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.remove_slot(slot_id).is_some())
    }

    async fn delete_all_slots(&self, professional_id: Uuid) -> Result<Vec<Slot>, StoreError> {
        let mut state = self.state.write().await;
        let ids: Vec<Uuid> = state
            .slots
            .values()
            .filter(|slot| slot.professional_id == professional_id)
            .map(|slot| slot.id)
            .collect();

        let removed = ids
            .into_iter()
            .filter_map(|id| state.remove_slot(id))
            .collect();

        Ok(MemoryState::sorted(removed))
    }
}

#[async_trait]
impl ProfessionalDirectory for InMemoryStore {
    async fn consultation_fee(&self, professional_id: Uuid) -> Result<Option<ProfessionalFee>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .professionals
            .get(&professional_id)
            .map(|fee| ProfessionalFee {
                professional_id,
                consultation_fee: *fee,
            }))
    }
}

#[async_trait]
impl BookingLedger for InMemoryStore {
    async fn commit_booking(&self, booking: &NewBooking) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        let slot = match state.slots.get(&booking.slot_id) {
            Some(slot) if slot.professional_id == booking.appointment.professional_id => slot.clone(),
            _ => return Err(StoreError::SlotTaken),
        };

        self.trip(FaultPoint::InsertAppointment)?;
        self.trip(FaultPoint::InsertBilling)?;
        self.trip(FaultPoint::DeleteSlot)?;

        state
            .appointments
            .insert(booking.appointment.id, booking.appointment.clone());
        state
            .billing
            .insert(booking.billing.appointment_id, booking.billing.clone());
        state.remove_slot(slot.id);

        Ok(())
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let state = self.state.read().await;
        Ok(state.appointments.get(&appointment_id).cloned())
    }

    async fn get_billing_record(&self, appointment_id: Uuid) -> Result<Option<BillingRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.billing.get(&appointment_id).cloned())
    }
}
