//! Outreach scheduling: the next-due calculator and date-window utilities.
//!
//! The calculator is a pure function of relationship closeness, chosen
//! frequency, and the missed-outreach counter. Every entry point takes an
//! explicit reference timestamp; nothing in this module reads the ambient
//! clock, so callers (and tests) control "now".

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::defaults::{MIN_INTERVAL_DAYS, URGENCY_FLOOR};
use crate::models::ContactFrequency;

/// Days until the next outreach is due.
///
/// Starts from the frequency's base interval (weekly when unset), shrinks it
/// by a closeness multiplier `1 − (level−1)·0.1`, and, when outreach has been
/// missed, shrinks the rounded result again by an urgency multiplier
/// `max(0.3, 1 − missed·0.2)`. Never returns less than one day.
pub fn interval_days(level: i16, frequency: Option<ContactFrequency>, missed: i32) -> i64 {
    let base = frequency.unwrap_or(ContactFrequency::Weekly).days();

    let level = i64::from(level).clamp(1, 5);
    let closeness = 1.0 - (level - 1) as f64 * 0.1;
    let mut days = (base as f64 * closeness).round() as i64;

    if missed > 0 {
        let urgency = (1.0 - f64::from(missed) * 0.2).max(URGENCY_FLOOR);
        days = (days as f64 * urgency).round() as i64;
    }

    days.max(MIN_INTERVAL_DAYS)
}

/// Absolute timestamp of the next due outreach.
///
/// Adds [`interval_days`] to `reference`. When the naive result would land at
/// or before `now` (a stale contact reconciled late), the interval is
/// re-anchored at `now` instead, so the returned timestamp is always in the
/// future relative to `now`.
pub fn next_contact_due(
    level: i16,
    frequency: Option<ContactFrequency>,
    missed: i32,
    reference: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let days = Duration::days(interval_days(level, frequency, missed));
    let naive = reference + days;
    if naive <= now {
        now + days
    } else {
        naive
    }
}

/// Resolve an IANA timezone name, falling back to `None` (= UTC) on garbage.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            warn!(timezone = %name, "Unknown timezone name, falling back to UTC");
            None
        }
    }
}

/// UTC instant of local midnight for `date` in `tz`.
///
/// Around DST transitions local midnight can be ambiguous or nonexistent;
/// ambiguity resolves to the earlier instant, a gap shifts forward one hour.
fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => match tz.from_local_datetime(&(midnight + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => Utc.from_utc_datetime(&midnight),
        },
    }
}

/// Half-open `[start, end)` of the reference instant's calendar day in `tz`,
/// expressed in UTC.
pub fn day_bounds(reference: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = reference.with_timezone(&tz).date_naive();
    let next = date.succ_opt().unwrap_or(date);
    (start_of_day(date, tz), start_of_day(next, tz))
}

/// Absolute half-open 24-hour window starting at the reference instant.
///
/// Used by the due-soon selector; an absolute interval avoids timezone drift
/// around midnight boundaries.
pub fn next_24h(reference: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (reference, reference + Duration::hours(24))
}

/// Calendar-day projection of a timestamp in `tz`.
pub fn local_date(ts: DateTime<Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

/// The ledger's calendar-day key for a run at `reference`.
pub fn processing_date(reference: DateTime<Utc>, tz: Tz) -> NaiveDate {
    local_date(reference, tz)
}
