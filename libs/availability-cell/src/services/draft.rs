use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use shared_config::SchedulingConfig;
use shared_models::scheduling::SlotEntry;

use crate::models::{AvailabilityError, PublishOutcome};
use crate::services::grid::day_grid;
use crate::services::publisher::AvailabilityPublisher;

/// Locally staged availability for one professional. Nothing reaches the
/// store until [`AvailabilityDraft::confirm`], which publishes the staged
/// entries as a single batch.
#[derive(Debug, Clone)]
pub struct AvailabilityDraft {
    professional_id: Uuid,
    grid: SchedulingConfig,
    entries: BTreeSet<SlotEntry>,
}

impl AvailabilityDraft {
    pub fn new(professional_id: Uuid, grid: SchedulingConfig) -> Self {
        Self {
            professional_id,
            grid,
            entries: BTreeSet::new(),
        }
    }

    pub fn professional_id(&self) -> Uuid {
        self.professional_id
    }

    pub fn entries(&self) -> impl Iterator<Item = &SlotEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &SlotEntry) -> bool {
        self.entries.contains(entry)
    }

    pub fn add(&mut self, entry: SlotEntry) -> Result<bool, AvailabilityError> {
        if entry.start_time >= entry.end_time {
            return Err(AvailabilityError::Validation(format!(
                "startTime must be before endTime ({}-{})",
                entry.start_time, entry.end_time
            )));
        }
        Ok(self.entries.insert(entry))
    }

    pub fn remove(&mut self, entry: &SlotEntry) -> bool {
        self.entries.remove(entry)
    }

    /// Flips one entry in or out of the draft; returns whether it is now staged.
    pub fn toggle(&mut self, entry: SlotEntry) -> Result<bool, AvailabilityError> {
        if self.entries.remove(&entry) {
            Ok(false)
        } else {
            self.add(entry)
        }
    }

    /// Stages every slot of the working day on `date`.
    pub fn select_whole_day(&mut self, date: NaiveDate) -> usize {
        let before = self.entries.len();
        self.entries.extend(day_grid(date, &self.grid));
        self.entries.len() - before
    }

    /// Drops everything staged on `date`.
    pub fn clear_day(&mut self, date: NaiveDate) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.date != date);
        before - self.entries.len()
    }

    pub async fn confirm(self, publisher: &AvailabilityPublisher) -> Result<PublishOutcome, AvailabilityError> {
        self.confirm_on(Local::now().date_naive(), publisher).await
    }

    pub async fn confirm_on(
        self,
        today: NaiveDate,
        publisher: &AvailabilityPublisher,
    ) -> Result<PublishOutcome, AvailabilityError> {
        debug!("Confirming {} staged slots for {}", self.entries.len(), self.professional_id);
        publisher
            .publish_on(today, self.professional_id, self.entries.into_iter().collect())
            .await
    }
}
