//! Error taxonomy for the attendance core
//!
//! Everything here is recoverable by the caller: check-in/check-out
//! conflicts map to user-facing rejections, store failures pass through
//! transparently. A ping for a non-tracking employee is a structured
//! no-op outcome, not an error (see `services::presence::PingOutcome`).

use crate::domain::types::EmployeeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Check-in attempted while a same-day session is genuinely open
    #[error("employee {0} is already checked in")]
    AlreadyCheckedIn(EmployeeId),

    /// Check-out attempted with no open session
    #[error("no open session for employee {0}")]
    NoOpenSession(EmployeeId),

    /// Resume attempted after the grace window elapsed
    #[error("resume window elapsed for employee {0}")]
    ResumeWindowElapsed(EmployeeId),

    /// Operation referenced an employee the directory does not know
    #[error("unknown employee {0}")]
    UnknownEmployee(EmployeeId),

    /// Face image did not match any enrolled employee
    #[error("face not recognized")]
    FaceNotRecognized,

    /// Backing store failure
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
