//! Addressable collection of encoded sequences.

use crate::encoding::EncodedSequence;
use serde::{Deserialize, Serialize};

/// One entry in a [`Database`]: a dense, stable index, an optional
/// human-readable description, and the encoded sequence itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub index: usize,
    pub description: Option<String>,
    pub sequence: EncodedSequence,
}

/// A lightweight, logging-only summary of a database's contents (entry
/// count, mean/stddev sequence length). Never consulted for correctness —
/// its only consumers are the CLI's human-readable summary and debug logs
/// emitted at partitioning boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSummary {
    pub count: usize,
    pub mean_length: f64,
    pub stddev_length: f64,
}

impl DatabaseSummary {
    fn compute(entries: &[DatabaseEntry]) -> Self {
        let count = entries.len();
        if count == 0 {
            return Self {
                count: 0,
                mean_length: 0.0,
                stddev_length: 0.0,
            };
        }

        let lengths: Vec<f64> = entries.iter().map(|e| e.sequence.len() as f64).collect();
        let mean_length = lengths.iter().sum::<f64>() / count as f64;
        let variance = lengths
            .iter()
            .map(|&len| (len - mean_length).powi(2))
            .sum::<f64>()
            / count as f64;

        Self {
            count,
            mean_length,
            stddev_length: variance.sqrt(),
        }
    }
}

/// An ordered, append-only collection of sequences. Indices are dense
/// (`0..N`, insertion order) and stable once assigned: a `Database` handed to
/// a downstream module never has its existing indices renumbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    entries: Vec<DatabaseEntry>,
    summary: DatabaseSummary,
}

impl Database {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            summary: DatabaseSummary::compute(&[]),
        }
    }

    /// Append a sequence, assigning it the next dense index. Returns the
    /// assigned index.
    pub fn push(&mut self, description: Option<String>, sequence: EncodedSequence) -> usize {
        let index = self.entries.len();
        self.entries.push(DatabaseEntry {
            index,
            description,
            sequence,
        });
        self.summary = DatabaseSummary::compute(&self.entries);
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DatabaseEntry> {
        self.entries.get(index)
    }

    pub fn sequence(&self, index: usize) -> Option<&EncodedSequence> {
        self.entries.get(index).map(|e| &e.sequence)
    }

    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    pub fn summary(&self) -> DatabaseSummary {
        self.summary
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<(Option<String>, EncodedSequence)> for Database {
    fn from_iter<T: IntoIterator<Item = (Option<String>, EncodedSequence)>>(iter: T) -> Self {
        let mut database = Database::new();
        for (description, sequence) in iter {
            database.push(description, sequence);
        }
        database
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_insertion_ordered() {
        let mut database = Database::new();
        let a = database.push(None, EncodedSequence::from_ascii(b"AC"));
        let b = database.push(Some("second".into()), EncodedSequence::from_ascii(b"GT"));

        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(database.len(), 2);
        assert_eq!(database.get(1).unwrap().description.as_deref(), Some("second"));
    }

    #[test]
    fn summary_tracks_length_statistics() {
        let database: Database = vec![
            (None, EncodedSequence::from_ascii(b"AAAA")),
            (None, EncodedSequence::from_ascii(b"AAAAAAAA")),
        ]
        .into_iter()
        .collect();

        let summary = database.summary();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean_length, 6.0);
    }

    #[test]
    fn empty_database_has_empty_summary() {
        let database = Database::new();
        assert_eq!(database.summary().count, 0);
        assert_eq!(database.summary().mean_length, 0.0);
    }
}
