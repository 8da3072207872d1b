use chrono::{FixedOffset, NaiveDate, Offset, Utc};

/// Calendar-date source shared by the gate and every view, so they cannot
/// disagree on "today" when invoked near midnight.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock pinned to the organization's UTC offset. The pairing service
/// stamps records in UTC, so the default offset is zero.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Returns `None` when the offset falls outside the valid +/-24h range.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes * 60).map(|offset| Self { offset })
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_offsets() {
        assert!(SystemClock::with_offset_minutes(9 * 60).is_some());
        assert!(SystemClock::with_offset_minutes(-10 * 60).is_some());
        assert!(SystemClock::with_offset_minutes(25 * 60).is_none());
    }

    #[test]
    fn utc_clock_matches_zero_offset() {
        let utc = SystemClock::utc().today();
        let zero = SystemClock::with_offset_minutes(0).expect("zero offset").today();
        assert_eq!(utc, zero);
    }
}
