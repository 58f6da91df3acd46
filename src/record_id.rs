//! Record ID type definition.

use std::{
    fmt::Display,
    sync::atomic::{AtomicU64, Ordering},
};

use time::OffsetDateTime;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// An opaque, unique identifier for a delivery or gas entry.
///
/// IDs are assigned once when a record is created and never reassigned.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Create a record ID from an existing string.
    ///
    /// Returns `None` if `id` is empty or only whitespace.
    pub fn new(id: &str) -> Option<Self> {
        let id = id.trim();

        if id.is_empty() {
            None
        } else {
            Some(Self(id.to_owned()))
        }
    }

    /// Generate a new ID.
    ///
    /// The ID combines the current time in nanoseconds with a process-wide
    /// sequence number, so records created within the same clock tick still
    /// get distinct IDs.
    pub fn generate() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);

        Self(format!("{nanos:x}-{sequence:x}"))
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
