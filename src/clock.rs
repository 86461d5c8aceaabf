use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

/// Source of server-assigned timestamps, bound to the configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tz: Tz,
}

impl Clock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Current instant. Stored as UTC; the zone only affects presentation.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Render a stored instant in the configured zone.
    pub fn localize(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.tz).fixed_offset()
    }
}
