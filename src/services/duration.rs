//! Worked-time aggregation across discontinuous sessions
//!
//! Unlike the status engine, which works on a merged envelope, duration
//! sums the individual sessions so gaps between re-entries never count
//! as worked time. Approved permission minutes are added on top. Nothing
//! is capped or rounded here; rounding happens at presentation.

use crate::domain::types::{AttendanceSession, Request, RequestKind};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Work duration for one employee-day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationBreakdown {
    pub attendance_minutes: i64,
    pub permission_minutes: i64,
    pub total_minutes: i64,
}

/// Sum worked minutes over the day's sessions plus approved permission
/// minutes. Open sessions count up to `now`. `permissions` must already
/// be filtered to approved requests for the date; a permission without a
/// recorded duration contributes zero minutes.
pub fn aggregate(
    sessions: &[AttendanceSession],
    permissions: &[Request],
    now: NaiveDateTime,
) -> DurationBreakdown {
    let attendance_minutes: i64 = sessions.iter().map(|s| s.duration_minutes(now)).sum();
    let permission_minutes: i64 = permissions
        .iter()
        .filter(|r| r.kind == RequestKind::Permission)
        .filter_map(|r| r.minutes)
        .sum();

    DurationBreakdown {
        attendance_minutes,
        permission_minutes,
        total_minutes: attendance_minutes + permission_minutes,
    }
}
