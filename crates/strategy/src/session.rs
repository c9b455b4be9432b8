use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};

use common::Category;

/// Forex trading window in the session-local clock, end-exclusive.
const OPEN_HOUR: u32 = 8;
const CLOSE_HOUR: u32 = 20;

/// Session clock pinned to a single fixed UTC offset.
///
/// Crypto trades around the clock; forex only Monday-Friday between
/// 08:00 and 20:00 local. Outside that window instruments are forced to
/// wait regardless of indicator state.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    offset: FixedOffset,
}

impl SessionClock {
    pub fn from_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600)
            .unwrap_or_else(|| panic!("SESSION_UTC_OFFSET_HOURS out of range: {hours}"));
        Self { offset }
    }

    pub fn is_open(&self, category: Category, now: DateTime<Utc>) -> bool {
        if category == Category::Crypto {
            return true;
        }
        let local = now.with_timezone(&self.offset);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        (OPEN_HOUR..CLOSE_HOUR).contains(&local.hour())
    }
}
