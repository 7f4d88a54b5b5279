//! High-score ledger.
//!
//! Keeps the best completion times, fastest first. A finished game adds a
//! record with an empty player name; the records screen then asks for the
//! name and registers it by index.

use serde::{Deserialize, Serialize};

/// Maximum records kept.
pub const MAX_RECORDS: usize = 9;

/// Longest accepted player name, in characters.
pub const MAX_PLAYER_NAME: usize = 20;

/// A single completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Player name, empty while awaiting entry
    pub player: String,

    /// Completion date in epoch milliseconds, 0 when unknown
    pub date: i64,

    /// Elapsed clock ticks
    pub time: u64,
}

impl Record {
    /// Create a record awaiting a player name.
    pub fn pending(time: u64, date: i64) -> Self {
        Self {
            player: String::new(),
            date,
            time,
        }
    }

    /// Check if the player name is still missing.
    pub fn is_pending(&self) -> bool {
        self.player.is_empty()
    }

    /// Completion date as a UTC timestamp.
    pub fn date_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if self.date == 0 {
            return None;
        }
        chrono::DateTime::from_timestamp_millis(self.date)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "player": self.player,
            "date": self.date,
            "time": self.time
        })
    }
}

/// Bounded list of records sorted ascending by time.
///
/// Deserializing re-sorts and truncates, so the ordering invariant holds for
/// every ledger in existence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Record>", into = "Vec<Record>")]
pub struct RecordLedger {
    records: Vec<Record>,
}

impl RecordLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pending record for a finished game.
    ///
    /// Returns the new ledger and the rank the record landed at, or `None`
    /// if it was too slow to make the cut. Equal times keep insertion order,
    /// so the newcomer ranks after existing records with the same time.
    pub fn insert_candidate(&self, time: u64, date: i64) -> (RecordLedger, Option<usize>) {
        let rank = self.records.partition_point(|r| r.time <= time);

        let mut records = self.records.clone();
        records.insert(rank, Record::pending(time, date));
        records.truncate(MAX_RECORDS);

        let rank = (rank < MAX_RECORDS).then_some(rank);
        (RecordLedger { records }, rank)
    }

    /// Set the player name of the record at `index`.
    ///
    /// Out-of-range indices leave the ledger unchanged. Names longer than
    /// [`MAX_PLAYER_NAME`] characters are cut short.
    pub fn register_name(&self, index: usize, name: &str) -> RecordLedger {
        let name: String = name.chars().take(MAX_PLAYER_NAME).collect();
        let records = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                if i == index {
                    Record {
                        player: name.clone(),
                        ..record.clone()
                    }
                } else {
                    record.clone()
                }
            })
            .collect();
        RecordLedger { records }
    }

    /// Get a record by rank.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Index of the first record awaiting a name.
    pub fn pending_index(&self) -> Option<usize> {
        self.records.iter().position(Record::is_pending)
    }

    /// Records, fastest first.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows for the records screen, padded to [`MAX_RECORDS`].
    ///
    /// `None` rows are placeholders with an unbounded time. Padding only
    /// exists in this view and never reaches the ledger itself.
    pub fn display_rows(&self) -> Vec<Option<&Record>> {
        let mut rows: Vec<Option<&Record>> = self.records.iter().map(Some).collect();
        rows.resize(MAX_RECORDS, None);
        rows
    }

    pub fn to_json(&self) -> serde_json::Value {
        let records: Vec<serde_json::Value> = self.records.iter().map(Record::to_json).collect();
        serde_json::Value::Array(records)
    }
}

impl From<Vec<Record>> for RecordLedger {
    fn from(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|r| r.time);
        records.truncate(MAX_RECORDS);
        Self { records }
    }
}

impl From<RecordLedger> for Vec<Record> {
    fn from(ledger: RecordLedger) -> Self {
        ledger.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn times(ledger: &RecordLedger) -> Vec<u64> {
        ledger.iter().map(|r| r.time).collect()
    }

    #[test]
    fn test_insert_into_empty() {
        let (ledger, rank) = RecordLedger::new().insert_candidate(42, 1_000);
        assert_eq!(rank, Some(0));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(0), Some(&Record::pending(42, 1_000)));
        assert!(ledger.get(0).unwrap().is_pending());
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut ledger = RecordLedger::new();
        for time in [50, 10, 30, 20, 40] {
            ledger = ledger.insert_candidate(time, 0).0;
        }
        assert_eq!(times(&ledger), vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_ledger_is_bounded() {
        let mut ledger = RecordLedger::new();
        for time in (1..=12).rev() {
            ledger = ledger.insert_candidate(time * 10, 0).0;
        }
        assert_eq!(ledger.len(), MAX_RECORDS);
        assert_eq!(times(&ledger), vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);

        // Too slow to rank
        let (after, rank) = ledger.insert_candidate(1_000, 0);
        assert_eq!(rank, None);
        assert_eq!(after, ledger);

        // Fastest pushes the slowest out
        let (after, rank) = ledger.insert_candidate(5, 0);
        assert_eq!(rank, Some(0));
        assert_eq!(after.len(), MAX_RECORDS);
        assert_eq!(after.iter().last().unwrap().time, 80);
    }

    #[test]
    fn test_equal_times_keep_insertion_order() {
        let mut ledger = RecordLedger::new();
        ledger = ledger.insert_candidate(30, 1).0;
        ledger = ledger.register_name(0, "first");
        let (ledger, rank) = ledger.insert_candidate(30, 2);

        assert_eq!(rank, Some(1));
        assert_eq!(ledger.get(0).unwrap().player, "first");
        assert_eq!(ledger.get(1).unwrap().date, 2);
    }

    #[test]
    fn test_register_name() {
        let (ledger, _) = RecordLedger::new().insert_candidate(42, 0);
        let named = ledger.register_name(0, "ABC");
        assert_eq!(named.get(0).unwrap().player, "ABC");
        assert_eq!(named.get(0).unwrap().time, 42);
        assert_eq!(named.pending_index(), None);

        // Out of range is ignored
        let unchanged = ledger.register_name(5, "XYZ");
        assert_eq!(unchanged, ledger);
    }

    #[test]
    fn test_register_name_is_capped() {
        let (ledger, _) = RecordLedger::new().insert_candidate(10, 0);
        let ledger = ledger.register_name(0, "ÁLVARO DE LA FUENTE MARTÍNEZ");

        let player = &ledger.get(0).unwrap().player;
        assert_eq!(player.chars().count(), MAX_PLAYER_NAME);
        assert_eq!(player, "ÁLVARO DE LA FUENTE ");
    }

    #[test]
    fn test_display_rows_pad_without_persisting() {
        let (ledger, _) = RecordLedger::new().insert_candidate(42, 0);
        let rows = ledger.display_rows();
        assert_eq!(rows.len(), MAX_RECORDS);
        assert!(rows[0].is_some());
        assert!(rows[1..].iter().all(Option::is_none));

        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_deserialize_normalizes() {
        let json = serde_json::json!([
            {"player": "b", "date": 0, "time": 20},
            {"player": "a", "date": 0, "time": 10}
        ]);
        let ledger: RecordLedger = serde_json::from_value(json).unwrap();
        assert_eq!(times(&ledger), vec![10, 20]);
        assert_eq!(ledger.get(0).unwrap().player, "a");
    }

    #[test]
    fn test_date_time() {
        assert_eq!(Record::pending(1, 0).date_time(), None);
        let record = Record::pending(1, 1_500_000_000_000);
        assert_eq!(record.date_time().unwrap().timestamp(), 1_500_000_000);
    }
}
