use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::SchedulingConfig;
use shared_database::{AppState, SchedulingStore};
use shared_models::scheduling::{Slot, SlotEntry};

use crate::models::{AvailabilityError, ClearOutcome, DaySummary, PublishOutcome};
use crate::services::grid::split_block;
use crate::services::summary::summarize;

/// Professional-side management of open slots.
pub struct AvailabilityPublisher {
    store: Arc<dyn SchedulingStore>,
    scheduling: SchedulingConfig,
}

impl AvailabilityPublisher {
    pub fn new(state: &AppState) -> Self {
        Self::with_store(state.store.clone(), state.config.scheduling.clone())
    }

    pub fn with_store(store: Arc<dyn SchedulingStore>, scheduling: SchedulingConfig) -> Self {
        Self { store, scheduling }
    }

    pub fn scheduling(&self) -> &SchedulingConfig {
        &self.scheduling
    }

    pub async fn list(&self, professional_id: Option<Uuid>) -> Result<Vec<Slot>, AvailabilityError> {
        Ok(self.store.list_slots(professional_id).await?)
    }

    pub async fn summary(&self, professional_id: Uuid) -> Result<Vec<DaySummary>, AvailabilityError> {
        let slots = self.store.list_slots(Some(professional_id)).await?;
        Ok(summarize(&slots))
    }

    /// Publishes `entries`, with "today" taken from the local clock.
    pub async fn publish(
        &self,
        professional_id: Uuid,
        entries: Vec<SlotEntry>,
    ) -> Result<PublishOutcome, AvailabilityError> {
        self.publish_on(Local::now().date_naive(), professional_id, entries).await
    }

    /// Validates the whole batch, then inserts only the tuples not yet stored.
    ///
    /// Dates are compared at day granularity, so slots later today are accepted.
    /// An entry overlapping a different slot, in the batch or already stored,
    /// rejects the batch.
    #[instrument(skip(self, entries), fields(requested = entries.len()))]
    pub async fn publish_on(
        &self,
        today: NaiveDate,
        professional_id: Uuid,
        entries: Vec<SlotEntry>,
    ) -> Result<PublishOutcome, AvailabilityError> {
        if entries.is_empty() {
            return Err(AvailabilityError::Validation("expected at least one entry".to_string()));
        }

        for entry in &entries {
            if entry.start_time >= entry.end_time {
                return Err(AvailabilityError::Validation(format!(
                    "startTime must be before endTime ({} {}-{})",
                    entry.date, entry.start_time, entry.end_time
                )));
            }
            if entry.date < today {
                return Err(AvailabilityError::Validation(format!(
                    "cannot publish availability on a past date ({})",
                    entry.date
                )));
            }
        }

        self.ensure_professional(professional_id).await?;

        // Ordered and de-duplicated within the batch.
        let requested: BTreeSet<SlotEntry> = entries.into_iter().collect();

        let existing: HashSet<SlotEntry> = self
            .store
            .list_slots(Some(professional_id))
            .await?
            .iter()
            .map(Slot::entry)
            .collect();

        if let Some((a, b)) = first_overlap(requested.iter().chain(existing.iter())) {
            return Err(AvailabilityError::Validation(format!(
                "slot {} {}-{} overlaps {}-{}",
                a.date, a.start_time, a.end_time, b.start_time, b.end_time
            )));
        }

        let fresh: Vec<SlotEntry> = requested
            .into_iter()
            .filter(|entry| !existing.contains(entry))
            .collect();

        if fresh.is_empty() {
            debug!("Nothing new to publish for professional {}", professional_id);
            return Ok(PublishOutcome::NothingToAdd);
        }

        let inserted = self.store.insert_slots(professional_id, &fresh).await?;
        if inserted.len() < fresh.len() {
            warn!(
                "{} slots for {} were published concurrently and skipped",
                fresh.len() - inserted.len(),
                professional_id
            );
        }

        info!("Published {} slots for professional {}", inserted.len(), professional_id);

        if inserted.is_empty() {
            Ok(PublishOutcome::NothingToAdd)
        } else {
            Ok(PublishOutcome::Inserted(inserted))
        }
    }

    pub async fn publish_blocks(
        &self,
        professional_id: Uuid,
        blocks: &[SlotEntry],
    ) -> Result<PublishOutcome, AvailabilityError> {
        self.publish_blocks_on(Local::now().date_naive(), professional_id, blocks).await
    }

    /// Cuts each block into slots of the configured length and publishes them
    /// as one batch.
    pub async fn publish_blocks_on(
        &self,
        today: NaiveDate,
        professional_id: Uuid,
        blocks: &[SlotEntry],
    ) -> Result<PublishOutcome, AvailabilityError> {
        let mut entries = Vec::new();

        for block in blocks {
            let slots = split_block(block.date, block.start_time, block.end_time, self.scheduling.slot_minutes);
            if slots.is_empty() {
                return Err(AvailabilityError::Validation(format!(
                    "block {} {}-{} is shorter than one {}-minute slot",
                    block.date, block.start_time, block.end_time, self.scheduling.slot_minutes
                )));
            }
            entries.extend(slots);
        }

        self.publish_on(today, professional_id, entries).await
    }

    /// Removes every open slot of the professional. Clearing an empty
    /// calendar succeeds with zero removed.
    #[instrument(skip(self))]
    pub async fn clear(&self, professional_id: Uuid) -> Result<ClearOutcome, AvailabilityError> {
        self.ensure_professional(professional_id).await?;

        let removed = self.store.delete_all_slots(professional_id).await?;
        info!("Cleared {} slots for professional {}", removed.len(), professional_id);

        Ok(ClearOutcome {
            removed_count: removed.len(),
        })
    }

    /// Removes one open slot owned by the professional.
    pub async fn withdraw_slot(&self, professional_id: Uuid, slot_id: Uuid) -> Result<(), AvailabilityError> {
        self.ensure_professional(professional_id).await?;

        let owned = self
            .store
            .list_slots(Some(professional_id))
            .await?
            .iter()
            .any(|slot| slot.id == slot_id);

        // A booking may consume the slot between the two calls.
        if !owned || !self.store.delete_slot(slot_id).await? {
            return Err(AvailabilityError::NotFound(format!(
                "professional {} has no open slot {}",
                professional_id, slot_id
            )));
        }

        debug!("Withdrew slot {} of professional {}", slot_id, professional_id);
        Ok(())
    }

    async fn ensure_professional(&self, professional_id: Uuid) -> Result<(), AvailabilityError> {
        if self.store.consultation_fee(professional_id).await?.is_none() {
            return Err(AvailabilityError::NotFound(format!(
                "professional {} not found",
                professional_id
            )));
        }
        Ok(())
    }
}

/// First pair of distinct entries on the same day whose intervals intersect.
/// Back-to-back slots (`end == next start`) do not overlap.
fn first_overlap<'a, I>(entries: I) -> Option<(SlotEntry, SlotEntry)>
where
    I: IntoIterator<Item = &'a SlotEntry>,
{
    let mut sorted: Vec<SlotEntry> = entries.into_iter().copied().collect();
    sorted.sort();
    sorted.dedup();

    sorted
        .windows(2)
        .find(|pair| pair[0].date == pair[1].date && pair[1].start_time < pair[0].end_time)
        .map(|pair| (pair[0], pair[1]))
}
