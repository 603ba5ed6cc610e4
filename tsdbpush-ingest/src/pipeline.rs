//! Request-processing pipeline: pooled push contexts and bounded reads.
//!
//! Each in-flight request exclusively owns one [`PushCtx`] holding a row
//! arena, a read buffer, and an insertion sink. Contexts are pooled so a
//! warmed-up service processes requests without touching the allocator:
//! a bounded fast path sized to the processor count avoids lock contention
//! under typical load, with an unbounded mutex-guarded overflow pool
//! behind it.

use std::io::Read;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use serde_json::Value;
use tsdbpush_core::{
    error::{IngestError, IngestResult},
    row::Rows,
    store::InsertSink,
};

use crate::metrics::FormatMetrics;
use crate::{insert, json_parser, telnet_parser};

/// Factory producing one insertion sink per push context.
pub type SinkFactory = Arc<dyn Fn() -> Box<dyn InsertSink> + Send + Sync>;

/// Wire format of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Telnet,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Telnet => "telnet",
        }
    }

    fn parse_into(&self, buf: &[u8], rows: &mut Rows) -> IngestResult<()> {
        match self {
            Format::Json => {
                let v: Value = serde_json::from_slice(buf)
                    .map_err(|e| IngestError::parse(format!("error parsing json: {e}")))?;
                json_parser::unmarshal(rows, &v)
            }
            Format::Telnet => {
                let s = std::str::from_utf8(buf)
                    .map_err(|e| IngestError::parse(format!("request body is not utf-8: {e}")))?;
                telnet_parser::unmarshal(rows, s)
            }
        }
    }
}

/// Per-request bundle of reusable parse and insert state.
pub struct PushCtx {
    rows: Rows,
    req_buf: Vec<u8>,
    format: Format,
    sink: Box<dyn InsertSink>,
    err: Option<IngestError>,
}

impl PushCtx {
    fn new(format: Format, sink: Box<dyn InsertSink>) -> Self {
        Self {
            rows: Rows::new(),
            req_buf: Vec::new(),
            format,
            sink,
            err: None,
        }
    }

    /// Clear all owned state, retaining capacity. Releases references into
    /// the previous request's bytes so they become reclaimable.
    fn reset(&mut self) {
        self.rows.reset();
        self.req_buf.clear();
        self.sink.reset(0);
        self.err = None;
    }

    /// Read the next bounded block of the request body into the context's
    /// buffer. Returns false on clean end-of-input or after recording an
    /// error in the context's error slot.
    fn read_block(&mut self, r: &mut dyn Read, max_size: u64, metrics: &FormatMetrics) -> bool {
        if self.err.is_some() {
            return false;
        }
        metrics.read_calls.inc();
        self.req_buf.clear();

        // Read one byte past the limit so oversize is an error, never a
        // silent truncation.
        let mut limited = r.take(max_size + 1);
        match limited.read_to_end(&mut self.req_buf) {
            Ok(0) => false,
            Ok(n) if n as u64 > max_size => {
                metrics.read_errors.inc();
                self.err = Some(IngestError::TooLarge { max_size });
                false
            }
            Ok(_) => true,
            Err(e) => {
                metrics.read_errors.inc();
                self.err = Some(IngestError::read(e.to_string()));
                false
            }
        }
    }

    fn parse_and_insert(&mut self, metrics: &FormatMetrics) -> IngestResult<()> {
        self.rows.reset();
        self.format
            .parse_into(&self.req_buf, &mut self.rows)
            .map_err(|e| {
                metrics.unmarshal_errors.inc();
                e
            })?;
        insert::insert_rows(&self.rows, self.sink.as_mut(), metrics)
    }

    fn take_error(&mut self) -> IngestResult<()> {
        match self.err.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Run the full per-request sequence: repeated bounded read, parse, and
/// insert cycles until the reader signals end-of-input or an error occurs.
/// End-of-input is not an error; anything else aborts the request with
/// zero rows visible downstream.
pub fn process_request(
    ctx: &mut PushCtx,
    reader: &mut dyn Read,
    max_size: u64,
    metrics: &FormatMetrics,
) -> IngestResult<()> {
    while ctx.read_block(reader, max_size, metrics) {
        ctx.parse_and_insert(metrics)?;
    }
    ctx.take_error()
}

/// Two-tier pool of push contexts for one wire format.
pub struct PushCtxPool {
    fast_tx: flume::Sender<PushCtx>,
    fast_rx: flume::Receiver<PushCtx>,
    overflow: Mutex<Vec<PushCtx>>,
    format: Format,
    sink_factory: SinkFactory,
}

impl PushCtxPool {
    pub fn new(format: Format, sink_factory: SinkFactory) -> Arc<Self> {
        let slots = thread::available_parallelism().map(|n| n.get()).unwrap_or(8);
        let (fast_tx, fast_rx) = flume::bounded(slots);
        Arc::new(Self {
            fast_tx,
            fast_rx,
            overflow: Mutex::new(Vec::new()),
            format,
            sink_factory,
        })
    }

    /// Take an idle context or construct a new one. The returned guard
    /// resets and returns the context on drop; no context is ever shared
    /// between two concurrent requests.
    pub fn acquire(self: &Arc<Self>) -> PooledCtx {
        let ctx = self
            .fast_rx
            .try_recv()
            .ok()
            .or_else(|| self.overflow.lock().pop())
            .unwrap_or_else(|| PushCtx::new(self.format, (self.sink_factory)()));
        PooledCtx {
            ctx: Some(ctx),
            pool: Arc::clone(self),
        }
    }

    fn release(&self, mut ctx: PushCtx) {
        ctx.reset();
        if let Err(flume::TrySendError::Full(ctx)) = self.fast_tx.try_send(ctx) {
            self.overflow.lock().push(ctx);
        }
    }

    /// Wire format this pool's contexts parse.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Idle contexts currently held by the pool.
    pub fn idle(&self) -> usize {
        self.fast_rx.len() + self.overflow.lock().len()
    }
}

/// A push context borrowed from the pool.
pub struct PooledCtx {
    ctx: Option<PushCtx>,
    pool: Arc<PushCtxPool>,
}

impl Deref for PooledCtx {
    type Target = PushCtx;

    fn deref(&self) -> &PushCtx {
        self.ctx.as_ref().expect("context already released")
    }
}

impl DerefMut for PooledCtx {
    fn deref_mut(&mut self) -> &mut PushCtx {
        self.ctx.as_mut().expect("context already released")
    }
}

impl Drop for PooledCtx {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}
