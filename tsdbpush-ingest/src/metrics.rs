//! Prometheus metrics for the write front end.
//!
//! All collectors are registered on an injected registry carried in the
//! application state; nothing here is process-global.

use prometheus::{
    exponential_buckets, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts,
    Registry,
};

/// Counters and distributions for one wire format.
#[derive(Debug, Clone)]
pub struct FormatMetrics {
    pub read_calls: IntCounter,
    pub read_errors: IntCounter,
    pub unmarshal_errors: IntCounter,
    pub rows_inserted: IntCounter,
    pub rows_per_insert: Histogram,
}

/// Per-format metrics for the ingest pipeline.
#[derive(Debug, Clone)]
pub struct IngestMetrics {
    pub json: FormatMetrics,
    pub telnet: FormatMetrics,
}

impl IngestMetrics {
    /// Register all collectors on `registry` and resolve per-format
    /// children.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let read_calls = IntCounterVec::new(
            Opts::new("tsdbpush_read_calls_total", "Total request body read calls"),
            &["format"],
        )?;
        let read_errors = IntCounterVec::new(
            Opts::new("tsdbpush_read_errors_total", "Total request body read errors"),
            &["format"],
        )?;
        let unmarshal_errors = IntCounterVec::new(
            Opts::new(
                "tsdbpush_unmarshal_errors_total",
                "Total row unmarshal errors",
            ),
            &["format"],
        )?;
        let rows_inserted = IntCounterVec::new(
            Opts::new("tsdbpush_rows_inserted_total", "Total rows inserted"),
            &["format"],
        )?;
        let rows_per_insert = HistogramVec::new(
            HistogramOpts::new("tsdbpush_rows_per_insert", "Rows per insert call")
                .buckets(exponential_buckets(1.0, 4.0, 10)?),
            &["format"],
        )?;

        registry.register(Box::new(read_calls.clone()))?;
        registry.register(Box::new(read_errors.clone()))?;
        registry.register(Box::new(unmarshal_errors.clone()))?;
        registry.register(Box::new(rows_inserted.clone()))?;
        registry.register(Box::new(rows_per_insert.clone()))?;

        let resolve = |format: &str| FormatMetrics {
            read_calls: read_calls.with_label_values(&[format]),
            read_errors: read_errors.with_label_values(&[format]),
            unmarshal_errors: unmarshal_errors.with_label_values(&[format]),
            rows_inserted: rows_inserted.with_label_values(&[format]),
            rows_per_insert: rows_per_insert.with_label_values(&[format]),
        };

        Ok(Self {
            json: resolve("json"),
            telnet: resolve("telnet"),
        })
    }

    /// The metrics bundle for one wire format.
    pub fn for_format(&self, format: crate::pipeline::Format) -> &FormatMetrics {
        match format {
            crate::pipeline::Format::Json => &self.json,
            crate::pipeline::Format::Telnet => &self.telnet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_count_independently() {
        let registry = Registry::new();
        let metrics = IngestMetrics::new(&registry).unwrap();

        metrics.json.rows_inserted.inc_by(5);
        metrics.telnet.rows_inserted.inc_by(2);

        assert_eq!(metrics.json.rows_inserted.get(), 5);
        assert_eq!(metrics.telnet.rows_inserted.get(), 2);
    }

    #[test]
    fn test_collectors_are_registered() {
        let registry = Registry::new();
        let metrics = IngestMetrics::new(&registry).unwrap();
        metrics.json.read_calls.inc();

        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "tsdbpush_read_calls_total"));
    }
}
