use time::OffsetDateTime;

/// Strictly increasing epoch-millisecond source.
///
/// Session ids and `last_updated` stamps both come from here. Wall-clock
/// reads are clamped to at least one past the last value handed out, so
/// repeated saves within the same millisecond (and stored stamps from a
/// skewed clock, once observed) still order strictly.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TouchClock {
    last: u64,
}

impl TouchClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the floor to cover a value seen in stored data.
    pub fn observe(&mut self, value: u64) {
        self.last = self.last.max(value);
    }

    /// Returns the next strictly increasing stamp.
    pub fn next(&mut self) -> u64 {
        let now = epoch_millis();
        self.last = now.max(self.last + 1);
        self.last
    }
}

fn epoch_millis() -> u64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000_000).max(0) as u64
}
