use chrono::NaiveDate;
use shared::protocol::PairingRecord;

/// Outcome of deriving "do I already have a pair today" from weekly history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodayPair {
    /// First record dated today. Authoritative even when the anomaly below
    /// fires.
    pub record: Option<PairingRecord>,
    /// Set when more than one record carries today's date, which means the
    /// daily uniqueness invariant was violated upstream.
    pub violation: Option<String>,
}

impl TodayPair {
    /// The gate: registration stays disabled while a today's pair exists.
    pub fn is_paired(&self) -> bool {
        self.record.is_some()
    }
}

/// Pure derivation over history; suspension-free by construction. "Today"
/// comes from the shared clock so this cannot drift from the views.
pub fn resolve_today_pair(history: &[PairingRecord], today: NaiveDate) -> TodayPair {
    let mut matches = history.iter().filter(|record| record.pair_date == today);
    let record = matches.next().cloned();
    let extra = matches.count();
    let violation = (extra > 0).then(|| {
        format!(
            "{} pairing records dated {today}, expected at most one",
            extra + 1
        )
    });
    TodayPair { record, violation }
}
