//! Domain models - core business types and the daily report model
//!
//! This module contains the canonical data types used throughout the system:
//! - `AttendanceSession` - one check-in/check-out cycle for an employee
//! - `TrackingState` - per-employee live geofence tracking record
//! - `Request` - leave/permission/advance workflow item
//! - `Fence` / `GeoPoint` - geofence geometry
//! - `StatusTag` / `DailyStatusResult` - the derived daily classification
//! - `AttendanceError` - recoverable error taxonomy

pub mod error;
pub mod report;
pub mod types;

// Re-export commonly used types at module level
pub use error::AttendanceError;
pub use report::{DailyStatusResult, ReportTimes, StatusColor, StatusTag, TagSet};
pub use types::{
    AttendanceSession, CloseReason, Employee, EmployeeId, Fence, FenceId, GeoPoint, PingRecord,
    Request, RequestKind, RequestStatus, SessionKind, TrackingState,
};
