//! The per-worker scheduling decision.
//!
//! `should_execute_now` is a pure function of `(now, last_execution_at,
//! phase)` plus the worker's interval table; it has no side effects and is
//! exercised directly by tests without standing up a worker.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Asia::Seoul;
use std::time::Duration;

use crate::domain::market_phase::{is_news_peak_window, MarketPhase};
use crate::domain::service_kind::ServiceKind;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDecision {
    pub should_run: bool,
    pub reason: String,
}

impl ScheduleDecision {
    fn run(reason: impl Into<String>) -> Self {
        Self {
            should_run: true,
            reason: reason.into(),
        }
    }

    fn wait(reason: impl Into<String>) -> Self {
        Self {
            should_run: false,
            reason: reason.into(),
        }
    }
}

/// Required interval between runs for `kind` at `phase`, or `None` if the
/// domain has no interval-based gating at this phase (e.g. Flow during
/// market hours is driven by the websocket lifecycle, not this table; Report
/// outside its weekly anchor).
fn required_interval(kind: ServiceKind, phase: MarketPhase, now: DateTime<Utc>) -> Option<Duration> {
    use MarketPhase::*;
    use ServiceKind::*;

    match (kind, phase) {
        (News, MarketHours) => {
            if is_news_peak_window(now) {
                Some(Duration::from_secs(10 * 60))
            } else {
                Some(Duration::from_secs(60 * 60))
            }
        }
        (News, _) => None,

        (Disclosure, MarketHours | AfterMarket | Weekend | PreMarket) => {
            Some(Duration::from_secs(60 * 60))
        }

        (Chart, MarketHours) => Some(Duration::from_secs(5 * 60)),
        (Chart, AfterMarket) => Some(Duration::from_secs(60 * 60)),
        (Chart, Weekend) => Some(Duration::from_secs(24 * 60 * 60)),
        (Chart, PreMarket) => Some(Duration::from_secs(60 * 60)),

        (Flow, AfterMarket | Weekend) => Some(Duration::from_secs(24 * 60 * 60)),
        (Flow, MarketHours | PreMarket) => None,

        (Report, Weekend) => Some(Duration::from_secs(7 * 24 * 60 * 60)),
        (Report, _) => None,

        (User, _) => None,
    }
}

/// A wall-clock anchor window additional to interval gating: "Sunday 20:00",
/// "daily 18:00".
#[derive(Debug, Clone, Copy)]
struct Anchor {
    weekday: Option<Weekday>,
    hour: u32,
}

fn anchor_for(kind: ServiceKind, phase: MarketPhase) -> Option<Anchor> {
    match (kind, phase) {
        (ServiceKind::Flow, MarketPhase::AfterMarket | MarketPhase::Weekend) => Some(Anchor {
            weekday: None,
            hour: 18,
        }),
        (ServiceKind::Report, MarketPhase::Weekend) => Some(Anchor {
            weekday: Some(Weekday::Sun),
            hour: 20,
        }),
        _ => None,
    }
}

fn within_anchor_window(anchor: Anchor, now: DateTime<Utc>) -> bool {
    let kst = now.with_timezone(&Seoul);
    if let Some(weekday) = anchor.weekday {
        if kst.weekday() != weekday {
            return false;
        }
    }
    kst.hour() == anchor.hour
}

/// Decides whether `kind`'s pipeline should run now.
///
/// `last_execution_at` is `None` before the worker's first successful run.
/// An anchored domain (Report, Flow) is gated by its wall-clock window even
/// on that first tick — a null `last_execution_at` is not license to fire
/// on an arbitrary weekday/hour (spec.md §8 scenario d; the original's
/// `schedule.every().sunday.at("18:00")` gates the very first run too).
pub fn should_execute_now(
    kind: ServiceKind,
    now: DateTime<Utc>,
    last_execution_at: Option<DateTime<Utc>>,
) -> ScheduleDecision {
    let phase = crate::domain::market_phase::phase_at(now);

    if let Some(anchor) = anchor_for(kind, phase) {
        if !within_anchor_window(anchor, now) {
            return ScheduleDecision::wait("대기 중");
        }
        // Report's weekly anchor additionally requires a >=6 day gap, which
        // `interval` (7 days) enforces below once `last_execution_at` is set.
    }

    let Some(last_run) = last_execution_at else {
        return ScheduleDecision::run("첫 실행");
    };

    let Some(interval) = required_interval(kind, phase, now) else {
        return ScheduleDecision::wait("대기 중");
    };

    let elapsed = (now - last_run)
        .to_std()
        .unwrap_or(Duration::from_secs(0));

    if elapsed < interval {
        let remaining = interval - elapsed;
        return ScheduleDecision::wait(format!(
            "{}분 간격 중 {}분 후 실행 가능",
            interval.as_secs().div_ceil(60),
            remaining.as_secs().div_ceil(60)
        ));
    }

    ScheduleDecision::run(format!(
        "{}분 간격 경과",
        interval.as_secs().div_ceil(60)
    ))
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
    fn first_run_always_executes() {
        let decision = should_execute_now(ServiceKind::Chart, kst(2026, 7, 27, 10, 0), None);
        assert!(decision.should_run);
        assert_eq!(decision.reason, "첫 실행");
    }

    #[test]
    fn chart_gates_on_five_minutes_during_market_hours() {
        let last = kst(2026, 7, 27, 10, 0);
        let before = should_execute_now(ServiceKind::Chart, last + chrono::Duration::minutes(4), Some(last));
        assert!(!before.should_run);

        let at = should_execute_now(ServiceKind::Chart, last + chrono::Duration::minutes(5), Some(last));
        assert!(at.should_run);
    }

    /// spec.md §8 scenario (c): Chart, MarketHours, `last = now - 4min`,
    /// 5-minute interval → gated off with a message naming the interval.
    #[test]
    fn chart_wait_message_names_the_required_interval() {
        let last = kst(2026, 7, 27, 10, 0);
        let decision = should_execute_now(ServiceKind::Chart, last + chrono::Duration::minutes(4), Some(last));
        assert!(!decision.should_run);
        assert!(
            decision.reason.contains("5분"),
            "expected wait message to contain the 5-minute interval, got {:?}",
            decision.reason
        );
    }

    #[test]
    fn news_uses_shorter_interval_in_peak_window() {
        let last = kst(2026, 7, 27, 8, 0);
        let after_10_min = last + chrono::Duration::minutes(10);
        let decision = should_execute_now(ServiceKind::News, after_10_min, Some(last));
        assert!(decision.should_run, "08:00-08:10 is within the morning peak window");
    }

    #[test]
    fn report_weekly_anchor_gates_even_the_first_run() {
        // Sunday 2026-08-02, spec.md §8 scenario (d): 19:59 is outside the
        // 20:00 anchor hour, so even a null `last_execution_at` must wait.
        let almost = kst(2026, 8, 2, 19, 59);
        let decision = should_execute_now(ServiceKind::Report, almost, None);
        assert!(!decision.should_run);
        assert_eq!(decision.reason, "대기 중");

        let at_anchor = kst(2026, 8, 2, 20, 0);
        let decision2 = should_execute_now(ServiceKind::Report, at_anchor, None);
        assert!(decision2.should_run);
        assert_eq!(decision2.reason, "첫 실행");
    }

    #[test]
    fn report_weekly_anchor_gates_outside_window_after_first_run() {
        let first_run = kst(2026, 7, 26, 20, 0); // a Sunday
        let one_hour_later = first_run + chrono::Duration::hours(1);
        let decision = should_execute_now(ServiceKind::Report, one_hour_later, Some(first_run));
        assert!(!decision.should_run);

        let six_days_later_wrong_hour = first_run + chrono::Duration::days(6);
        let decision2 =
            should_execute_now(ServiceKind::Report, six_days_later_wrong_hour, Some(first_run));
        assert!(!decision2.should_run, "interval not yet satisfied at exactly 6 days");

        let next_sunday_2000 = first_run + chrono::Duration::days(7);
        let decision3 = should_execute_now(ServiceKind::Report, next_sunday_2000, Some(first_run));
        assert!(decision3.should_run);
    }
}
