// Schedule gate
// Decides whether "now" falls inside an event's redemption window. Pure:
// the caller supplies the clock reading and the reference timezone.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::entities::{ScheduleWindow, WindowStatus};
use crate::utils::{parse_clock_time, parse_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Resolves a window to absolute instants. `None` when any part is missing
/// or malformed, or when a wall-clock time does not exist in `tz`.
///
/// A close time earlier than the open time belongs to the following day
/// (e.g. 23:30-02:00).
pub fn window_bounds(schedule: &ScheduleWindow, tz: Tz) -> Option<WindowBounds> {
    let date = parse_date(schedule.date.as_deref()?.trim()).ok()?;
    let open = parse_clock_time(schedule.open_time.as_deref()?.trim()).ok()?;
    let close = parse_clock_time(schedule.close_time.as_deref()?.trim()).ok()?;

    let start = date.and_time(open);
    let mut end = date.and_time(close);
    if close < open {
        end += Duration::days(1);
    }
    Some(WindowBounds {
        start: to_utc(start, tz)?,
        end: to_utc(end, tz)?,
    })
}

/// Fail-closed: no schedule, or an incomplete one, means no redemption.
pub fn is_within_window(schedule: Option<&ScheduleWindow>, now: DateTime<Utc>, tz: Tz) -> bool {
    schedule
        .and_then(|window| window_bounds(window, tz))
        .map(|bounds| bounds.start <= now && now <= bounds.end)
        .unwrap_or(false)
}

/// True once the window has closed. Used for ordering, never for gating.
pub fn has_ended(schedule: Option<&ScheduleWindow>, now: DateTime<Utc>, tz: Tz) -> bool {
    schedule
        .and_then(|window| window_bounds(window, tz))
        .map(|bounds| now > bounds.end)
        .unwrap_or(false)
}

pub fn window_status(schedule: Option<&ScheduleWindow>, now: DateTime<Utc>, tz: Tz) -> WindowStatus {
    let bounds = schedule.and_then(|window| window_bounds(window, tz));
    WindowStatus {
        open: bounds.map(|b| b.start <= now && now <= b.end).unwrap_or(false),
        ended: bounds.map(|b| now > b.end).unwrap_or(false),
        require_verification: schedule.map(|w| w.require_verification).unwrap_or(false),
        opens_at: bounds.map(|b| b.start),
        closes_at: bounds.map(|b| b.end),
    }
}

fn to_utc(local: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|value| value.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TZ: Tz = chrono_tz::Asia::Jerusalem;

    fn local(value: &str) -> DateTime<Utc> {
        let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").expect("parse local");
        to_utc(naive, TZ).expect("resolve local")
    }

    #[test]
    fn inside_and_after_evening_window() {
        let window = ScheduleWindow::new("2025-11-19", "19:00", "22:00");
        assert!(is_within_window(Some(&window), local("2025-11-19T20:00"), TZ));
        assert!(!is_within_window(Some(&window), local("2025-11-19T23:00"), TZ));
        assert!(!is_within_window(Some(&window), local("2025-11-19T18:59"), TZ));
        assert!(has_ended(Some(&window), local("2025-11-19T23:00"), TZ));
        assert!(!has_ended(Some(&window), local("2025-11-19T20:00"), TZ));
    }

    #[test]
    fn bounds_are_inclusive() {
        let window = ScheduleWindow::new("2025-11-19", "19:00", "22:00");
        assert!(is_within_window(Some(&window), local("2025-11-19T19:00"), TZ));
        assert!(is_within_window(Some(&window), local("2025-11-19T22:00"), TZ));
    }

    #[test]
    fn missing_schedule_fails_closed() {
        let now = local("2025-11-19T20:00");
        assert!(!is_within_window(None, now, TZ));
        let partial = ScheduleWindow {
            close_time: None,
            ..ScheduleWindow::new("2025-11-19", "19:00", "22:00")
        };
        assert!(!is_within_window(Some(&partial), now, TZ));
        let cleared = ScheduleWindow::new("", "", "").normalized();
        assert!(!is_within_window(Some(&cleared), now, TZ));
        assert!(!has_ended(None, now, TZ));
    }

    #[test]
    fn malformed_values_fail_closed() {
        let window = ScheduleWindow::new("19/11/2025", "19:00", "22:00");
        assert!(!is_within_window(Some(&window), local("2025-11-19T20:00"), TZ));
        let window = ScheduleWindow::new("2025-11-19", "7pm", "22:00");
        assert!(!is_within_window(Some(&window), local("2025-11-19T20:00"), TZ));
    }

    #[test]
    fn window_crossing_midnight_closes_next_day() {
        let window = ScheduleWindow::new("2025-11-17", "23:30", "02:00");
        assert!(is_within_window(Some(&window), local("2025-11-17T23:45"), TZ));
        assert!(is_within_window(Some(&window), local("2025-11-18T01:30"), TZ));
        assert!(!is_within_window(Some(&window), local("2025-11-18T02:30"), TZ));
        assert!(!is_within_window(Some(&window), local("2025-11-17T01:30"), TZ));
    }

    #[test]
    fn window_is_evaluated_in_reference_timezone() {
        let window = ScheduleWindow::new("2025-11-19", "19:00", "22:00");
        let utc_evening = Utc.with_ymd_and_hms(2025, 11, 19, 17, 30, 0).unwrap();
        // 17:30 UTC is 19:30 in Jerusalem (UTC+2 in November).
        assert!(is_within_window(Some(&window), utc_evening, TZ));
        assert!(!is_within_window(Some(&window), utc_evening, chrono_tz::UTC));

        let utc_late = Utc.with_ymd_and_hms(2025, 11, 19, 20, 30, 0).unwrap();
        // 22:30 in Jerusalem, past close there but still open in UTC.
        assert!(!is_within_window(Some(&window), utc_late, TZ));
        assert!(is_within_window(Some(&window), utc_late, chrono_tz::UTC));
    }

    #[test]
    fn status_reports_bounds_and_verification_flag() {
        let window = ScheduleWindow {
            require_verification: true,
            ..ScheduleWindow::new("2025-11-19", "19:00", "22:00")
        };
        let status = window_status(Some(&window), local("2025-11-19T20:00"), TZ);
        assert!(status.open);
        assert!(!status.ended);
        assert!(status.require_verification);
        assert_eq!(status.opens_at, Some(local("2025-11-19T19:00")));
        assert_eq!(status.closes_at, Some(local("2025-11-19T22:00")));
    }
}
