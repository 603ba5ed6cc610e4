//! Downstream storage insertion interface.
//!
//! The write front end does not implement storage; it hands parsed rows to
//! an [`InsertSink`] owned by each push context. Implementations buffer
//! labeled data points and durably hand them off on `flush`.

use crate::error::IngestResult;

/// A borrowed label. The metric name travels under the reserved empty
/// label name; every tag becomes one labeled dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

impl<'a> Label<'a> {
    pub fn new(name: &'a str, value: &'a str) -> Self {
        Self { name, value }
    }
}

/// Storage insertion interface consumed by the insertion bridge.
///
/// Call sequence per request: `reset` with a row-count hint, one
/// `write_data_point` per row in parse order, then `flush`. A sink must not
/// surface buffered points before `flush` succeeds.
pub trait InsertSink: Send {
    /// Drop buffered state and prepare for roughly `rows_hint` points.
    fn reset(&mut self, rows_hint: usize);

    /// Buffer one data point under the given label set.
    fn write_data_point(
        &mut self,
        labels: &[Label<'_>],
        timestamp: i64,
        value: f64,
    ) -> IngestResult<()>;

    /// Durably hand off all buffered points.
    fn flush(&mut self) -> IngestResult<()>;
}
