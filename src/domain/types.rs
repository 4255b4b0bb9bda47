//! Shared types for the attendance engine

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Newtype wrapper for employee IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EmployeeId(pub i64);

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for fence IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FenceId(pub i32);

impl std::fmt::Display for FenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// A WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Circular geofence an employee must be inside to be considered on-site
///
/// A fence without a branch scope is a global fallback and applies to
/// every employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fence {
    pub id: FenceId,
    pub name: String,
    pub center: GeoPoint,
    pub radius_m: f64,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Employee identity record
///
/// Live tracking fields intentionally live on [`TrackingState`], not here,
/// so tracking writes never touch identity fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    #[serde(default)]
    pub branch: Option<String>,
}

/// How a session was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Office,
    Travel,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Office => "office",
            SessionKind::Travel => "travel",
        }
    }
}

/// Why a session was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Manual,
    OutsideGeofence,
    StaleSession,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Manual => "manual",
            CloseReason::OutsideGeofence => "outside_geofence",
            CloseReason::StaleSession => "stale_session",
        }
    }
}

/// One check-in/check-out cycle for an employee on a calendar day
///
/// An employee may have several sessions per day (re-entry), but at most
/// one session is open system-wide at any time; the check-in path enforces
/// that, not the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub id: String,
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    pub check_in: NaiveDateTime,
    pub check_out: Option<NaiveDateTime>,
    pub check_in_location: GeoPoint,
    pub kind: SessionKind,
    pub closed_by: Option<CloseReason>,
}

impl AttendanceSession {
    /// Open a new session at the given check-in instant
    pub fn open(
        employee_id: EmployeeId,
        check_in: NaiveDateTime,
        location: GeoPoint,
        kind: SessionKind,
    ) -> Self {
        Self {
            id: new_uuid_v7(),
            employee_id,
            date: check_in.date(),
            check_in,
            check_out: None,
            check_in_location: location,
            kind,
            closed_by: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }

    /// Close the session. A checkout instant before the check-in is clamped
    /// to the check-in so `check_out >= check_in` always holds.
    pub fn close(&mut self, at: NaiveDateTime, reason: CloseReason) {
        self.check_out = Some(at.max(self.check_in));
        self.closed_by = Some(reason);
    }

    /// Worked minutes for this session; open sessions count up to `now`
    pub fn duration_minutes(&self, now: NaiveDateTime) -> i64 {
        let end = self.check_out.unwrap_or(now);
        (end - self.check_in).num_minutes().max(0)
    }
}

/// Kind of employee request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Leave,
    Permission,
    Advance,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Leave => "leave",
            RequestKind::Permission => "permission",
            RequestKind::Advance => "advance",
        }
    }
}

/// Lifecycle status of a request; decided requests are immutable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Leave/permission/advance request raised by an employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub employee_id: EmployeeId,
    pub kind: RequestKind,
    pub status: RequestStatus,
    /// Calendar day the request targets
    pub date: NaiveDate,
    /// Duration in minutes, set for permission requests
    #[serde(default)]
    pub minutes: Option<i64>,
    /// Free-form leave category ("sick", "casual", ...)
    #[serde(default)]
    pub leave_type: Option<String>,
}

impl Request {
    pub fn new(employee_id: EmployeeId, kind: RequestKind, date: NaiveDate) -> Self {
        Self {
            id: new_uuid_v7(),
            employee_id,
            kind,
            status: RequestStatus::Pending,
            date,
            minutes: None,
            leave_type: None,
        }
    }

    /// Decide a pending request. Returns false (and leaves the request
    /// untouched) if it was already decided.
    pub fn decide(&mut self, status: RequestStatus) -> bool {
        if self.status != RequestStatus::Pending {
            return false;
        }
        self.status = status;
        true
    }

    pub fn is_approved(&self) -> bool {
        self.status == RequestStatus::Approved
    }
}

/// Per-employee live tracking record
///
/// Kept separate from [`Employee`] so concurrent tracking updates cannot
/// clobber identity fields. `is_tracking` is a real field rather than
/// being derived from session openness: the read-time staleness check
/// flips it off while the session stays open and resumable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingState {
    pub employee_id: EmployeeId,
    pub is_tracking: bool,
    pub last_location: Option<GeoPoint>,
    pub last_ping: Option<NaiveDateTime>,
    pub inside_fence: bool,
    pub outside_count: u32,
}

impl TrackingState {
    /// Fresh non-tracking state for an employee
    pub fn idle(employee_id: EmployeeId) -> Self {
        Self {
            employee_id,
            is_tracking: false,
            last_location: None,
            last_ping: None,
            inside_fence: false,
            outside_count: 0,
        }
    }

    /// Start tracking at check-in. The employee checks in on-site, so the
    /// state begins inside the fence with a zeroed counter.
    pub fn start(&mut self, location: GeoPoint, at: NaiveDateTime) {
        self.is_tracking = true;
        self.inside_fence = true;
        self.outside_count = 0;
        self.last_location = Some(location);
        self.last_ping = Some(at);
    }

    /// Record an inside-fence ping; resets the consecutive-outside counter
    pub fn record_inside(&mut self, location: GeoPoint, at: NaiveDateTime) {
        self.inside_fence = true;
        self.outside_count = 0;
        self.last_location = Some(location);
        self.last_ping = Some(at);
    }

    /// Record an outside-fence ping; returns the new consecutive count
    pub fn record_outside(&mut self, location: GeoPoint, at: NaiveDateTime) -> u32 {
        self.inside_fence = false;
        self.outside_count += 1;
        self.last_location = Some(location);
        self.last_ping = Some(at);
        self.outside_count
    }

    /// Stop tracking (manual or automatic checkout)
    pub fn stop(&mut self) {
        self.is_tracking = false;
        self.inside_fence = false;
        self.outside_count = 0;
    }
}

/// Immutable audit record of a processed location ping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingRecord {
    pub employee_id: EmployeeId,
    pub location: GeoPoint,
    pub inside_fence: bool,
    pub distance_m: f64,
    pub ts: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_session_open_close() {
        let mut session = AttendanceSession::open(
            EmployeeId(7),
            dt(9, 0),
            GeoPoint::new(12.97, 77.59),
            SessionKind::Office,
        );

        assert!(session.is_open());
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert!(session.closed_by.is_none());

        session.close(dt(17, 30), CloseReason::Manual);
        assert!(!session.is_open());
        assert_eq!(session.check_out, Some(dt(17, 30)));
        assert_eq!(session.closed_by, Some(CloseReason::Manual));
        assert_eq!(session.duration_minutes(dt(23, 0)), 510);
    }

    #[test]
    fn test_session_close_clamps_to_check_in() {
        let mut session = AttendanceSession::open(
            EmployeeId(7),
            dt(9, 0),
            GeoPoint::new(0.0, 0.0),
            SessionKind::Office,
        );

        // A checkout before the check-in must not produce a negative span
        session.close(dt(8, 0), CloseReason::StaleSession);
        assert_eq!(session.check_out, Some(dt(9, 0)));
        assert_eq!(session.duration_minutes(dt(23, 0)), 0);
    }

    #[test]
    fn test_open_session_counts_to_now() {
        let session = AttendanceSession::open(
            EmployeeId(7),
            dt(9, 0),
            GeoPoint::new(0.0, 0.0),
            SessionKind::Travel,
        );
        assert_eq!(session.duration_minutes(dt(10, 30)), 90);
    }

    #[test]
    fn test_request_decides_once() {
        let mut request = Request::new(
            EmployeeId(1),
            RequestKind::Leave,
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        );

        assert!(!request.is_approved());
        assert!(request.decide(RequestStatus::Approved));
        assert!(request.is_approved());

        // Decided requests are immutable
        assert!(!request.decide(RequestStatus::Rejected));
        assert_eq!(request.status, RequestStatus::Approved);
    }

    #[test]
    fn test_tracking_state_counter_reset() {
        let mut state = TrackingState::idle(EmployeeId(3));
        state.start(GeoPoint::new(12.0, 77.0), dt(9, 0));

        assert!(state.is_tracking);
        assert!(state.inside_fence);

        state.record_outside(GeoPoint::new(12.1, 77.1), dt(9, 1));
        state.record_outside(GeoPoint::new(12.1, 77.1), dt(9, 2));
        assert_eq!(state.outside_count, 2);

        // Inside ping resets the consecutive counter
        state.record_inside(GeoPoint::new(12.0, 77.0), dt(9, 3));
        assert_eq!(state.outside_count, 0);
        assert!(state.inside_fence);
    }

    #[test]
    fn test_tracking_state_stop() {
        let mut state = TrackingState::idle(EmployeeId(3));
        state.start(GeoPoint::new(12.0, 77.0), dt(9, 0));
        state.record_outside(GeoPoint::new(12.1, 77.1), dt(9, 1));

        state.stop();
        assert!(!state.is_tracking);
        assert_eq!(state.outside_count, 0);
    }

    #[test]
    fn test_uuid_v7_session_ids() {
        let a =
            AttendanceSession::open(EmployeeId(1), dt(9, 0), GeoPoint::new(0.0, 0.0), SessionKind::Office);
        let b =
            AttendanceSession::open(EmployeeId(1), dt(9, 0), GeoPoint::new(0.0, 0.0), SessionKind::Office);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
    }
}
