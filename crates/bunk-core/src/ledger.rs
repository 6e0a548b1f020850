//! Sparse attendance ledger keyed by date and block.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{AttendanceStatus, BlockId};

/// One flat ledger entry, as exported to and imported from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub block_id: BlockId,
    pub status: AttendanceStatus,
}

/// In-memory map of `(date, block) -> status`.
///
/// A missing entry means the block is unmarked. Dates with no remaining
/// entries are dropped, so marking and then clearing a block leaves the ledger
/// exactly as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    days: BTreeMap<NaiveDate, BTreeMap<BlockId, AttendanceStatus>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from flat records. Later records for the same key win.
    pub fn from_records(records: impl IntoIterator<Item = AttendanceRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.mark(record.date, record.block_id, record.status);
        }
        ledger
    }

    /// Records a status, returning the status it replaced.
    pub fn mark(
        &mut self,
        date: NaiveDate,
        block_id: BlockId,
        status: AttendanceStatus,
    ) -> Option<AttendanceStatus> {
        self.days.entry(date).or_default().insert(block_id, status)
    }

    /// Removes a mark, returning the removed status. No-op if unmarked.
    pub fn clear(&mut self, date: NaiveDate, block_id: &BlockId) -> Option<AttendanceStatus> {
        let day = self.days.get_mut(&date)?;
        let removed = day.remove(block_id);
        if day.is_empty() {
            self.days.remove(&date);
        }
        removed
    }

    /// Removes every mark.
    pub fn reset_all(&mut self) {
        self.days.clear();
    }

    pub fn status(&self, date: NaiveDate, block_id: &BlockId) -> Option<AttendanceStatus> {
        self.days.get(&date)?.get(block_id).copied()
    }

    /// Marks recorded on `date`; empty if none.
    pub fn records_for_date(&self, date: NaiveDate) -> BTreeMap<BlockId, AttendanceStatus> {
        self.days.get(&date).cloned().unwrap_or_default()
    }

    /// Dates with at least one present or absent mark.
    pub fn marked_dates(&self) -> BTreeSet<NaiveDate> {
        self.days
            .iter()
            .filter(|(_, day)| !day.is_empty())
            .map(|(date, _)| *date)
            .collect()
    }

    /// Iterates dates in ascending order with their marks.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &BTreeMap<BlockId, AttendanceStatus>)> {
        self.days.iter().map(|(date, day)| (*date, day))
    }

    /// Number of marked blocks across all dates.
    pub fn len(&self) -> usize {
        self.days.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Flattens the ledger into records ordered by date, then block ID.
    pub fn to_records(&self) -> Vec<AttendanceRecord> {
        self.days
            .iter()
            .flat_map(|(date, day)| {
                day.iter().map(|(block_id, status)| AttendanceRecord {
                    date: *date,
                    block_id: block_id.clone(),
                    status: *status,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::calendar::parse_date_key;

    fn date(s: &str) -> NaiveDate {
        parse_date_key(s).unwrap()
    }

    fn block(s: &str) -> BlockId {
        BlockId::new(s).unwrap()
    }

    #[test]
    fn mark_is_idempotent_and_last_write_wins() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.mark(date("2026-01-05"), block("block_mon1"), AttendanceStatus::Present),
            None
        );
        let snapshot = ledger.clone();
        ledger.mark(date("2026-01-05"), block("block_mon1"), AttendanceStatus::Present);
        assert_eq!(ledger, snapshot);

        let previous =
            ledger.mark(date("2026-01-05"), block("block_mon1"), AttendanceStatus::Absent);
        assert_eq!(previous, Some(AttendanceStatus::Present));
        assert_eq!(
            ledger.status(date("2026-01-05"), &block("block_mon1")),
            Some(AttendanceStatus::Absent)
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn mark_then_clear_restores_previous_state() {
        let mut ledger = Ledger::new();
        ledger.mark(date("2026-01-05"), block("block_mon1"), AttendanceStatus::Present);
        let before = ledger.clone();

        ledger.mark(date("2026-01-06"), block("block_tue1"), AttendanceStatus::Absent);
        ledger.clear(date("2026-01-06"), &block("block_tue1"));
        assert_eq!(ledger, before);
        assert_eq!(ledger.marked_dates().len(), 1);
    }

    #[test]
    fn clear_unmarked_is_noop() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.clear(date("2026-01-05"), &block("block_mon1")), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn records_for_unmarked_date_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.records_for_date(date("2026-01-05")).is_empty());
    }

    #[test]
    fn reset_all_empties_ledger() {
        let mut ledger = Ledger::new();
        ledger.mark(date("2026-01-05"), block("block_mon1"), AttendanceStatus::Present);
        ledger.mark(date("2026-01-06"), block("block_tue1"), AttendanceStatus::Absent);
        ledger.reset_all();
        assert!(ledger.is_empty());
        assert!(ledger.marked_dates().is_empty());
    }

    #[test]
    fn records_round_trip_regardless_of_order() {
        let mut ledger = Ledger::new();
        ledger.mark(date("2026-01-05"), block("block_mon1"), AttendanceStatus::Present);
        ledger.mark(date("2026-01-05"), block("block_mon4"), AttendanceStatus::Absent);
        ledger.mark(date("2026-01-07"), block("block_wed2"), AttendanceStatus::Present);

        let mut records = ledger.to_records();
        records.reverse();
        assert_eq!(Ledger::from_records(records), ledger);
    }

    #[test]
    fn record_serializes_with_date_key() {
        let record = AttendanceRecord {
            date: date("2026-01-05"),
            block_id: block("block_mon1"),
            status: AttendanceStatus::Present,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2026-01-05","block_id":"block_mon1","status":"present"}"#
        );
    }
}
