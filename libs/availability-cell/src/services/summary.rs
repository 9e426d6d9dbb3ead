use std::collections::BTreeMap;

use chrono::NaiveDate;

use shared_models::scheduling::Slot;

use crate::models::{DaySummary, TimeBlock};

/// Groups open slots per day, merging back-to-back slots (`end == next start`)
/// into blocks. Days come out in date order.
pub fn summarize(slots: &[Slot]) -> Vec<DaySummary> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Slot>> = BTreeMap::new();
    for slot in slots {
        by_day.entry(slot.date).or_default().push(slot);
    }

    by_day
        .into_iter()
        .map(|(date, mut day_slots)| {
            day_slots.sort_by_key(|slot| (slot.start_time, slot.end_time));

            let mut blocks: Vec<TimeBlock> = Vec::new();

            for slot in day_slots {
                match blocks.last_mut() {
                    Some(block) if slot.start_time <= block.end => {
                        block.end = block.end.max(slot.end_time)
                    }
                    _ => blocks.push(TimeBlock {
                        start: slot.start_time,
                        end: slot.end_time,
                    }),
                }
            }

            // Measured on merged blocks so overlapping slots count once.
            let seconds: i64 = blocks.iter().map(|b| (b.end - b.start).num_seconds()).sum();

            DaySummary {
                date,
                blocks,
                total_hours: seconds as f64 / 3600.0,
            }
        })
        .collect()
}
