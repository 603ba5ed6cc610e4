//! Canonical row model and the reusable row arena.
//!
//! `Rows` owns a growable sequence of rows and a shared tag pool. Both keep
//! their backing storage (including per-slot `String` capacity) across
//! `reset()` calls, so a warmed-up arena parses a request of equal or
//! smaller size without touching the allocator. Rows reference their tags
//! through index ranges into the shared pool rather than owning them.

/// A single key/value dimension attached to a row.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    fn reset(&mut self) {
        self.key.clear();
        self.value.clear();
    }
}

/// An index range into the shared tag pool of a [`Rows`] arena.
///
/// Valid only until the next `Rows::reset()`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TagRange {
    start: u32,
    len: u32,
}

impl TagRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start: start as u32,
            len: len as u32,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One canonical data point: metric, tag range, value, and a timestamp in
/// milliseconds since epoch.
#[derive(Debug, Default)]
pub struct Row {
    pub metric: String,
    pub tags: TagRange,
    pub value: f64,
    pub timestamp: i64,
}

impl Row {
    fn reset(&mut self) {
        self.metric.clear();
        self.tags = TagRange::default();
        self.value = 0.0;
        self.timestamp = 0;
    }
}

/// Reusable storage for a batch of parsed rows and their shared tag pool.
///
/// Appending past the logical length reuses previously allocated slots
/// before growing the backing vectors. After a failed parse the arena holds
/// partial, undefined content and must be reset before reuse.
#[derive(Debug, Default)]
pub struct Rows {
    rows: Vec<Row>,
    rows_len: usize,
    tags_pool: Vec<Tag>,
    tags_len: usize,
}

impl Rows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all rows and tags to their zero values, retaining capacity.
    ///
    /// Idempotent. Invalidates every previously returned row and tag view.
    pub fn reset(&mut self) {
        for row in &mut self.rows[..self.rows_len] {
            row.reset();
        }
        self.rows_len = 0;

        for tag in &mut self.tags_pool[..self.tags_len] {
            tag.reset();
        }
        self.tags_len = 0;
    }

    /// Number of parsed rows.
    pub fn len(&self) -> usize {
        self.rows_len
    }

    pub fn is_empty(&self) -> bool {
        self.rows_len == 0
    }

    /// The parsed rows, in parse order.
    pub fn rows(&self) -> &[Row] {
        &self.rows[..self.rows_len]
    }

    /// The tags referenced by `range`.
    pub fn tags(&self, range: TagRange) -> &[Tag] {
        let start = range.start as usize;
        &self.tags_pool[start..start + range.len as usize]
    }

    /// Current logical length of the tag pool; pair with
    /// [`Rows::tag_range_from`] to delimit one row's tags.
    pub fn tag_mark(&self) -> usize {
        self.tags_len
    }

    /// The range of tags appended since `mark`.
    pub fn tag_range_from(&self, mark: usize) -> TagRange {
        TagRange::new(mark, self.tags_len - mark)
    }

    /// Append one tag to the shared pool, reusing a spare slot if present.
    pub fn push_tag(&mut self, key: &str, value: &str) {
        if self.tags_len == self.tags_pool.len() {
            self.tags_pool.push(Tag::default());
        }
        let tag = &mut self.tags_pool[self.tags_len];
        tag.key.clear();
        tag.key.push_str(key);
        tag.value.clear();
        tag.value.push_str(value);
        self.tags_len += 1;
    }

    /// Append one row, reusing a spare slot if present.
    pub fn push_row(&mut self, metric: &str, timestamp: i64, value: f64, tags: TagRange) {
        if self.rows_len == self.rows.len() {
            self.rows.push(Row::default());
        }
        let row = &mut self.rows[self.rows_len];
        row.metric.clear();
        row.metric.push_str(metric);
        row.timestamp = timestamp;
        row.value = value;
        row.tags = tags;
        self.rows_len += 1;
    }

    /// Backing capacity of the row sequence (spare slots included).
    pub fn row_capacity(&self) -> usize {
        self.rows.capacity()
    }

    /// Backing capacity of the tag pool (spare slots included).
    pub fn tag_capacity(&self) -> usize {
        self.tags_pool.capacity()
    }
}
