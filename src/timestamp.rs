use chrono::{DateTime, FixedOffset, NaiveDateTime};
use log::warn;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::coerce;

/// Reports are produced in West Africa Time, which has no daylight saving.
const LOCAL_OFFSET_SECS: i32 = 3600;

/// Converts UTC epoch seconds to local civil time with the offset dropped.
pub fn localize(epoch_secs: i64, nanos: u32) -> Option<NaiveDateTime> {
    let offset = FixedOffset::east_opt(LOCAL_OFFSET_SECS)?;
    DateTime::from_timestamp(epoch_secs, nanos).map(|utc| utc.with_timezone(&offset).naive_local())
}

/// Parses an epoch-seconds field (integral or fractional) into local time.
pub fn parse_epoch(raw: Option<&str>) -> Option<NaiveDateTime> {
    let s = coerce::present(raw)?;
    let parsed = s.parse::<i64>().ok().map(|secs| (secs, 0)).or_else(|| {
        let d = coerce::parse_decimal(s)?;
        let secs = d.floor();
        let nanos = ((d - secs) * Decimal::from(1_000_000_000)).trunc().to_u32()?;
        Some((secs.to_i64()?, nanos))
    });
    let local = parsed.and_then(|(secs, nanos)| localize(secs, nanos));
    if local.is_none() {
        warn!("unusable epoch timestamp: {s:?}");
    }
    local
}

/// Stable ascending sort on a row's timestamp; rows without one go last.
pub fn sort_chronologically<T>(rows: &mut [T], created_at: impl Fn(&T) -> Option<NaiveDateTime>) {
    rows.sort_by_key(|row| {
        let ts = created_at(row);
        (ts.is_none(), ts)
    });
}
