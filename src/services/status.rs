//! Daily attendance status resolution
//!
//! Pure classification of one employee-day from the session envelope,
//! approved leave/permission requests, and policy settings. The only
//! wall-clock input is the injected `now`, consulted solely when the
//! report date is the current date; the same inputs always re-derive the
//! same result, so reports are computed on read and never stored.

use crate::domain::report::{DailyStatusResult, ReportTimes, StatusColor, StatusTag, TagSet};
use crate::domain::types::{AttendanceSession, Request};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Grace period after work start before a check-in counts as late
pub const GRACE_MINUTES: i64 = 15;

/// Check-ins this many minutes before work start are flagged early
const EARLY_IN_MARGIN_MINUTES: i64 = 30;

/// Check-outs this many minutes after work end are flagged late
const LATE_OUT_MARGIN_MINUTES: i64 = 30;

/// Session envelopes shorter than this are a half day on early checkout
const HALF_DAY_MIN_SESSION_MINUTES: i64 = 240;

/// How long past work end today's missing checkout becomes a missed punch
const MISSED_PUNCH_WAIT_MINUTES: i64 = 60;

const DEFAULT_WORK_START_MINUTES: i64 = 9 * 60;
const DEFAULT_WORK_END_MINUTES: i64 = 18 * 60;

/// Attendance policy settings, resolved once per request
///
/// Mirrors the external settings document; lookups that fail fall back to
/// [`PolicySettings::default`] so status computation never hard-fails on
/// unreachable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySettings {
    /// Work start as "HH:mm"
    pub work_start: String,
    /// Work end as "HH:mm"
    pub work_end: String,
    /// Late boundary in minutes from midnight; the resolution rules derive
    /// the cutoff from work start + grace, this knob is carried for the
    /// API layer's settings surface
    pub late_threshold_minutes: i64,
    /// Half-day boundary in minutes from midnight
    pub half_day_threshold_minutes: i64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            work_start: "09:00".to_string(),
            work_end: "18:00".to_string(),
            late_threshold_minutes: DEFAULT_WORK_START_MINUTES + GRACE_MINUTES,
            half_day_threshold_minutes: 13 * 60,
        }
    }
}

impl PolicySettings {
    pub fn work_start_minutes(&self) -> i64 {
        parse_hhmm(&self.work_start).unwrap_or(DEFAULT_WORK_START_MINUTES)
    }

    pub fn work_end_minutes(&self) -> i64 {
        parse_hhmm(&self.work_end).unwrap_or(DEFAULT_WORK_END_MINUTES)
    }
}

/// Parse an "HH:mm" time string to minutes from midnight
fn parse_hhmm(s: &str) -> Option<i64> {
    let t = NaiveTime::parse_from_str(s, "%H:%M").ok()?;
    Some(t.hour() as i64 * 60 + t.minute() as i64)
}

fn minutes_from_midnight(dt: NaiveDateTime) -> i64 {
    dt.time().hour() as i64 * 60 + dt.time().minute() as i64
}

fn fmt_hhmm(dt: NaiveDateTime) -> String {
    dt.format("%H:%M").to_string()
}

/// The day's effective check-in/check-out span for status purposes
///
/// Re-entries are merged into a min(in)/max(out) envelope; duration
/// aggregation over the individual sessions lives in
/// `services::duration`, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionEnvelope {
    pub first_in: NaiveDateTime,
    /// Absent while any session of the day is still open
    pub last_out: Option<NaiveDateTime>,
}

/// Merge a day's sessions into one envelope; None for an empty day
pub fn merge_envelope(sessions: &[AttendanceSession]) -> Option<SessionEnvelope> {
    let first_in = sessions.iter().map(|s| s.check_in).min()?;
    let last_out = if sessions.iter().any(|s| s.check_out.is_none()) {
        None
    } else {
        sessions.iter().filter_map(|s| s.check_out).max()
    };
    Some(SessionEnvelope { first_in, last_out })
}

/// Resolve the daily classification for one (employee, date)
///
/// `leave` and `permission` must already be filtered to approved requests
/// targeting `date`; pending or rejected requests never reach this
/// function.
pub fn compute_daily_status(
    date: NaiveDate,
    attendance: Option<&SessionEnvelope>,
    leave: Option<&Request>,
    permission: Option<&Request>,
    policy: &PolicySettings,
    now: NaiveDateTime,
) -> DailyStatusResult {
    let mut tags = TagSet::new();
    let mut remarks: Vec<String> = Vec::new();

    // Week-off: Sunday without attendance short-circuits everything,
    // Sunday worked is recorded and resolution continues.
    if date.weekday() == Weekday::Sun {
        if attendance.is_none() {
            tags.push(StatusTag::WeekOff);
            return DailyStatusResult {
                tags,
                remarks: "Sunday Holiday".to_string(),
                color: StatusColor::Gray,
                times: ReportTimes::default(),
            };
        }
        tags.push(StatusTag::WeekOffWorked);
    }

    // Approved leave for the date
    if let Some(leave) = leave {
        tags.push(StatusTag::Leave);
        if let Some(leave_type) = &leave.leave_type {
            remarks.push(format!("Leave: {leave_type}"));
        }
        if attendance.is_none() {
            return DailyStatusResult {
                tags,
                remarks: remarks.join("; "),
                color: StatusColor::Orange,
                times: ReportTimes::default(),
            };
        }
        tags.push(StatusTag::PresentOnLeave);
    }

    // No attendance, no week-off, no leave: absent
    let Some(envelope) = attendance else {
        tags.push(StatusTag::Absent);
        return DailyStatusResult {
            tags,
            remarks: "No Check-in".to_string(),
            color: StatusColor::Red,
            times: ReportTimes::default(),
        };
    };

    // Check-in evaluation
    let in_minutes = minutes_from_midnight(envelope.first_in);
    let work_start = policy.work_start_minutes();
    let late_cutoff = work_start + GRACE_MINUTES;

    if in_minutes < work_start - EARLY_IN_MARGIN_MINUTES {
        // Mutually exclusive with the late branch
        tags.push(StatusTag::EarlyIn);
    } else {
        if in_minutes > late_cutoff {
            if permission.is_some() {
                tags.push(StatusTag::PermissionIn);
                remarks.push("Late entry permitted".to_string());
            } else {
                tags.push(StatusTag::LateIn);
            }
        }
        // Stacks with Late in / Permission in
        if in_minutes > policy.half_day_threshold_minutes {
            tags.push(StatusTag::HalfDayIn);
        }
    }

    // Check-out evaluation
    let work_end = policy.work_end_minutes();
    match envelope.last_out {
        None => {
            let overdue_today = date == now.date()
                && minutes_from_midnight(now) > work_end + MISSED_PUNCH_WAIT_MINUTES;
            if date < now.date() || overdue_today {
                tags.push(StatusTag::MissedPunchOut);
            } else {
                tags.push(StatusTag::Working);
            }
        }
        Some(last_out) => {
            let out_minutes = minutes_from_midnight(last_out);
            if out_minutes < work_end {
                tags.push(StatusTag::EarlyOut);
                let session_minutes = (last_out - envelope.first_in).num_minutes();
                if session_minutes < HALF_DAY_MIN_SESSION_MINUTES {
                    tags.push(StatusTag::HalfDayOut);
                }
            }
            if out_minutes > work_end + LATE_OUT_MARGIN_MINUTES {
                tags.push(StatusTag::LateOut);
            }
        }
    }

    // Default fallback
    if tags.is_empty() || (tags.len() == 1 && tags.contains(StatusTag::EarlyIn)) {
        tags.push(StatusTag::Present);
    }

    let color = derive_color(&tags);
    DailyStatusResult {
        tags,
        remarks: remarks.join("; "),
        color,
        times: ReportTimes {
            check_in: Some(fmt_hhmm(envelope.first_in)),
            check_out: envelope.last_out.map(fmt_hhmm),
        },
    }
}

/// Color priority: green default, then red, orange, blue - later rules
/// override earlier ones, so leave days stay blue even when late or
/// half-day tags are present.
fn derive_color(tags: &TagSet) -> StatusColor {
    let mut color = StatusColor::Green;
    if tags.contains(StatusTag::Absent) || tags.contains(StatusTag::MissedPunchOut) {
        color = StatusColor::Red;
    }
    if tags.contains(StatusTag::LateIn)
        || tags.contains(StatusTag::EarlyOut)
        || tags.contains(StatusTag::HalfDayIn)
        || tags.contains(StatusTag::HalfDayOut)
    {
        color = StatusColor::Orange;
    }
    if tags.contains(StatusTag::Leave) {
        color = StatusColor::Blue;
    }
    color
}
