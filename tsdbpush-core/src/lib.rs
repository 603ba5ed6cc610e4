//! # tsdbpush Core Library
//!
//! Shared types for the tsdbpush write-path front end:
//!
//! - **Row model**: canonical rows, tags, and the reusable row arena that
//!   backs every parsed request
//! - **Timestamps**: the OpenTSDB seconds/milliseconds unit heuristic
//! - **Storage interface**: the `InsertSink` trait consumed by the
//!   insertion bridge
//! - **Errors**: shared error types for parse and pipeline failures

pub mod error;
pub mod row;
pub mod store;
pub mod timestamp;

// Re-export commonly used types
pub use error::{IngestError, IngestResult};
pub use row::{Row, Rows, Tag, TagRange};
pub use store::{InsertSink, Label};
pub use timestamp::to_millis;

/// Version information for tsdbpush
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
