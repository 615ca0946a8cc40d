use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of error records retained before the oldest is evicted.
pub const DEFAULT_ERROR_CAPACITY: usize = 256;

/// A server-reported failure, in the shape the wire protocol uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub err_no: i64,
    pub err_info: String,
}

/// Bounded, append-only history of server-reported failures
///
/// Shared between foreground calls and the heartbeat task, so appends and
/// reads may happen concurrently. Records are kept in occurrence order;
/// once capacity is reached the oldest record is dropped.
#[derive(Debug)]
pub struct ErrorSink {
    records: Mutex<VecDeque<ErrorRecord>>,
    capacity: usize,
}

impl ErrorSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    /// Append a server-reported failure.
    pub fn record(&self, err_no: i64, err_info: impl Into<String>) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(ErrorRecord {
            err_no,
            err_info: err_info.into(),
        });
    }

    /// Snapshot of all retained records, oldest first.
    pub fn all(&self) -> Vec<ErrorRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.iter().cloned().collect()
    }

    /// Remove and return all retained records, oldest first.
    pub fn drain(&self) -> Vec<ErrorRecord> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_keep_occurrence_order() {
        let sink = ErrorSink::default();
        sink.record(1, "first");
        sink.record(2, "second");

        let all = sink.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].err_no, 1);
        assert_eq!(all[1].err_info, "second");
    }

    #[test]
    fn capacity_evicts_oldest() {
        let sink = ErrorSink::new(3);
        for i in 0..5 {
            sink.record(i, format!("e{}", i));
        }

        let all = sink.all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].err_no, 2);
        assert_eq!(all[2].err_no, 4);
    }

    #[test]
    fn drain_empties_the_sink() {
        let sink = ErrorSink::default();
        sink.record(7, "boom");
        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert!(sink.is_empty());
    }
}
