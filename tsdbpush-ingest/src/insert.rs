//! Insertion bridge: converts parsed rows into downstream label/point calls.

use smallvec::SmallVec;
use tsdbpush_core::{
    error::IngestResult,
    row::Rows,
    store::{InsertSink, Label},
};

use crate::metrics::FormatMetrics;

/// Label scratch sized for the common tag count; rows with more tags than
/// the inline capacity spill to the heap.
type LabelBuf<'a> = SmallVec<[Label<'a>; 8]>;

/// Walk all parsed rows in order, write one data point per row into the
/// sink, then flush. The metric name travels under the reserved empty
/// label name; every tag becomes one labeled dimension.
pub fn insert_rows(
    rows: &Rows,
    sink: &mut dyn InsertSink,
    metrics: &FormatMetrics,
) -> IngestResult<()> {
    let batch = rows.rows();
    sink.reset(batch.len());

    let mut labels = LabelBuf::new();
    for row in batch {
        labels.clear();
        labels.push(Label::new("", &row.metric));
        for tag in rows.tags(row.tags) {
            labels.push(Label::new(&tag.key, &tag.value));
        }
        sink.write_data_point(&labels, row.timestamp, row.value)?;
    }

    metrics.rows_inserted.inc_by(batch.len() as u64);
    metrics.rows_per_insert.observe(batch.len() as f64);
    sink.flush()
}
