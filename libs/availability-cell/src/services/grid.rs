use chrono::{Duration, NaiveDate, NaiveTime};

use shared_config::SchedulingConfig;
use shared_models::scheduling::SlotEntry;

/// Cuts `[start, end)` on `date` into consecutive slots of `slot_minutes`.
/// A trailing remainder shorter than one slot is dropped.
pub fn split_block(date: NaiveDate, start: NaiveTime, end: NaiveTime, slot_minutes: u32) -> Vec<SlotEntry> {
    let step = Duration::minutes(i64::from(slot_minutes.max(1)));
    let mut entries = Vec::new();
    let mut cursor = start;

    loop {
        let (next, wrapped) = cursor.overflowing_add_signed(step);
        // past midnight
        if wrapped != 0 || next > end {
            break;
        }
        entries.push(SlotEntry {
            date,
            start_time: cursor,
            end_time: next,
        });
        cursor = next;
    }

    entries
}

/// Every slot of the configured working day on `date`.
pub fn day_grid(date: NaiveDate, config: &SchedulingConfig) -> Vec<SlotEntry> {
    split_block(date, config.day_start, config.day_end, config.slot_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    #[test]
    fn block_splits_into_half_hours() {
        let entries = split_block(day(), time(9, 0), time(10, 30), 30);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].start_time, time(9, 0));
        assert_eq!(entries[2].end_time, time(10, 30));
    }

    #[test]
    fn short_remainder_is_dropped() {
        let entries = split_block(day(), time(9, 0), time(9, 50), 30);
        assert_eq!(entries.len(), 1);

        assert!(split_block(day(), time(9, 0), time(9, 20), 30).is_empty());
    }

    #[test]
    fn block_ending_at_midnight_does_not_wrap() {
        let entries = split_block(day(), time(23, 0), time(23, 59), 30);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn default_day_has_twenty_four_slots() {
        let grid = day_grid(day(), &SchedulingConfig::default());

        assert_eq!(grid.len(), 24);
        assert_eq!(grid[0].start_time, time(6, 0));
        assert_eq!(grid[23].end_time, time(18, 0));
    }
}
