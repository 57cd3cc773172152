//! Domestic market session windows.
//!
//! Trading hours differ per venue: the alternate venue (NXT) runs a
//! pre-market and an after-hours session around the primary venue's (KRX)
//! regular hours. Windows are defined on the minute of day; every window is
//! half-open except the after-hours one, which is closed at both ends.

use chrono::{Local, NaiveTime, Timelike};

use crate::models::Venue;

const PRE_MARKET_OPEN: u32 = 8 * 60; // 08:00
const PRE_MARKET_CLOSE: u32 = 8 * 60 + 50; // 08:50
const REGULAR_OPEN: u32 = 9 * 60; // 09:00
const REGULAR_CLOSE: u32 = 15 * 60 + 20; // 15:20
const CLOSING_AUCTION_END: u32 = 15 * 60 + 30; // 15:30
const AFTER_HOURS_OPEN: u32 = 15 * 60 + 40; // 15:40
const AFTER_HOURS_CLOSE: u32 = 20 * 60; // 20:00

/// Returns the venues accepting orders at the given wall-clock time.
///
/// Outside every window (including the gaps between them) the result is
/// empty.
pub fn active_venues(at: NaiveTime) -> Vec<Venue> {
    let minute = at.hour() * 60 + at.minute();
    if (PRE_MARKET_OPEN..PRE_MARKET_CLOSE).contains(&minute) {
        vec![Venue::Nxt]
    } else if (REGULAR_OPEN..REGULAR_CLOSE).contains(&minute) {
        vec![Venue::Krx, Venue::Nxt]
    } else if (REGULAR_CLOSE..CLOSING_AUCTION_END).contains(&minute) {
        vec![Venue::Krx]
    } else if (AFTER_HOURS_OPEN..=AFTER_HOURS_CLOSE).contains(&minute) {
        vec![Venue::Nxt]
    } else {
        Vec::new()
    }
}

/// [`active_venues`] evaluated at the current local time.
pub fn active_venues_now() -> Vec<Venue> {
    active_venues(Local::now().time())
}
