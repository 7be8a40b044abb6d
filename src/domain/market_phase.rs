//! Clock & market-calendar.
//!
//! Pure derivation of a [`MarketPhase`] from an instant in the exchange time
//! zone. No mutation, no I/O — callers pass `Utc::now()` in production and
//! a fixed instant in tests; there is no injectable clock seam because
//! every call site already takes its instant as a plain argument.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Asia::Seoul;
use serde::{Deserialize, Serialize};

/// Categorization of a KST instant relative to exchange hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPhase {
    PreMarket,
    MarketHours,
    AfterMarket,
    Weekend,
}

/// KRX regular session: 09:00–15:30 KST, Monday–Friday.
const MARKET_OPEN_HOUR: u32 = 9;
const MARKET_OPEN_MINUTE: u32 = 0;
const MARKET_CLOSE_HOUR: u32 = 15;
const MARKET_CLOSE_MINUTE: u32 = 30;

/// Returns the [`MarketPhase`] for `instant`, evaluated in the Asia/Seoul
/// time zone. Weekend takes priority over the hour-of-day breakdown.
pub fn phase_at(instant: DateTime<Utc>) -> MarketPhase {
    let kst = instant.with_timezone(&Seoul);

    if matches!(kst.weekday(), Weekday::Sat | Weekday::Sun) {
        return MarketPhase::Weekend;
    }

    let minutes_of_day = kst.hour() * 60 + kst.minute();
    let open = MARKET_OPEN_HOUR * 60 + MARKET_OPEN_MINUTE;
    let close = MARKET_CLOSE_HOUR * 60 + MARKET_CLOSE_MINUTE;

    if minutes_of_day < open {
        MarketPhase::PreMarket
    } else if minutes_of_day < close {
        MarketPhase::MarketHours
    } else {
        MarketPhase::AfterMarket
    }
}

/// Whether `instant` (in KST) falls in one of the News worker's peak windows:
/// 07:30–09:30 or 14:30–16:30. Parameterized here rather than hardcoded
/// inline, per the Open Question in spec.md §9 about peak-window boundaries
/// differing between source code paths — this is the single authoritative
/// definition.
pub fn is_news_peak_window(instant: DateTime<Utc>) -> bool {
    let kst = instant.with_timezone(&Seoul);
    let minutes_of_day = kst.hour() * 60 + kst.minute();

    let morning = (7 * 60 + 30)..(9 * 60 + 30);
    let afternoon = (14 * 60 + 30)..(16 * 60 + 30);

    morning.contains(&minutes_of_day) || afternoon.contains(&minutes_of_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kst(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Seoul
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn weekday_before_open_is_pre_market() {
        // 2026-07-27 is a Monday
        assert_eq!(phase_at(kst(2026, 7, 27, 8, 59)), MarketPhase::PreMarket);
    }

    #[test]
    fn weekday_at_open_boundary_is_market_hours() {
        assert_eq!(phase_at(kst(2026, 7, 27, 9, 0)), MarketPhase::MarketHours);
    }

    #[test]
    fn weekday_at_close_boundary_is_after_market() {
        assert_eq!(phase_at(kst(2026, 7, 27, 15, 30)), MarketPhase::AfterMarket);
        assert_eq!(phase_at(kst(2026, 7, 27, 15, 29)), MarketPhase::MarketHours);
    }

    #[test]
    fn saturday_is_weekend_even_during_session_hours() {
        // 2026-08-01 is a Saturday
        assert_eq!(phase_at(kst(2026, 8, 1, 10, 0)), MarketPhase::Weekend);
    }

    #[test]
    fn friday_evening_boundary_is_after_market_not_weekend() {
        // 2026-07-31 is a Friday
        assert_eq!(
            phase_at(kst(2026, 7, 31, 15, 30) - chrono::Duration::seconds(1)),
            MarketPhase::MarketHours
        );
        assert_eq!(phase_at(kst(2026, 7, 31, 15, 30)), MarketPhase::AfterMarket);
    }

    #[test]
    fn news_peak_window_boundaries() {
        assert!(!is_news_peak_window(kst(2026, 7, 27, 7, 29)));
        assert!(is_news_peak_window(kst(2026, 7, 27, 7, 30)));
        assert!(is_news_peak_window(kst(2026, 7, 27, 9, 29)));
        assert!(!is_news_peak_window(kst(2026, 7, 27, 9, 30)));
        assert!(is_news_peak_window(kst(2026, 7, 27, 14, 30)));
        assert!(!is_news_peak_window(kst(2026, 7, 27, 16, 30)));
    }
}
