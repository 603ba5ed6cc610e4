//! In-process storage sink.
//!
//! The real storage engine lives behind the [`InsertSink`] interface and is
//! out of scope here. `MemoryStore` is the in-process implementation used
//! by the binary and the test suite: each sink buffers points privately and
//! hands them to the shared store on `flush`, so a request that fails
//! mid-parse never makes partial rows visible.

use std::sync::Arc;

use parking_lot::Mutex;
use tsdbpush_core::{
    error::IngestResult,
    store::{InsertSink, Label},
};

/// One durably handed-off data point.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub labels: Vec<(String, String)>,
    pub timestamp: i64,
    pub value: f64,
}

/// Shared in-memory point store. Cheap to clone via `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: Mutex<Vec<DataPoint>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a sink writing into this store.
    pub fn sink(self: &Arc<Self>) -> MemorySink {
        MemorySink {
            store: Arc::clone(self),
            buf: Vec::new(),
        }
    }

    /// Number of flushed points.
    pub fn len(&self) -> usize {
        self.points.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all flushed points, in flush order.
    pub fn snapshot(&self) -> Vec<DataPoint> {
        self.points.lock().clone()
    }
}

/// Per-request buffering sink over a [`MemoryStore`].
pub struct MemorySink {
    store: Arc<MemoryStore>,
    buf: Vec<DataPoint>,
}

impl InsertSink for MemorySink {
    fn reset(&mut self, rows_hint: usize) {
        self.buf.clear();
        if rows_hint > self.buf.capacity() {
            self.buf.reserve(rows_hint - self.buf.capacity());
        }
    }

    fn write_data_point(
        &mut self,
        labels: &[Label<'_>],
        timestamp: i64,
        value: f64,
    ) -> IngestResult<()> {
        self.buf.push(DataPoint {
            labels: labels
                .iter()
                .map(|l| (l.name.to_string(), l.value.to_string()))
                .collect(),
            timestamp,
            value,
        });
        Ok(())
    }

    fn flush(&mut self) -> IngestResult<()> {
        if !self.buf.is_empty() {
            self.store.points.lock().append(&mut self.buf);
        }
        Ok(())
    }
}
