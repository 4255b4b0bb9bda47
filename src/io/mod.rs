//! IO modules - external system interfaces
//!
//! The persistence backends, face-recognition vendor, and ping audit log
//! are external collaborators; this module defines their seams and the
//! adapters shipped with the engine:
//! - store traits - directory, sessions, requests, tracking state,
//!   policy settings, ping log, identity matcher
//! - `memory` - in-memory store backing the replay binary and tests
//! - `ping_log` - append-only JSONL ping log file writer
//! - `facematch` - HTTP client for the external face-match service

pub mod facematch;
pub mod memory;
pub mod ping_log;

use crate::domain::types::{
    AttendanceSession, CloseReason, Employee, EmployeeId, Fence, FenceId, PingRecord, Request,
    RequestKind, TrackingState,
};
use crate::services::status::PolicySettings;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

// Re-export commonly used types
pub use facematch::FaceMatchClient;
pub use memory::InMemoryStore;
pub use ping_log::PingLogFile;

/// Employee identity and fence directory
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn get_employee(&self, id: EmployeeId) -> anyhow::Result<Option<Employee>>;

    /// Upsert an employee identity record
    async fn update_employee(&self, employee: Employee) -> anyhow::Result<()>;

    async fn list_employees(&self) -> anyhow::Result<Vec<Employee>>;

    /// All currently active fences, branch-scoped and global
    async fn active_fences(&self) -> anyhow::Result<Vec<Fence>>;

    async fn get_fence(&self, id: FenceId) -> anyhow::Result<Option<Fence>>;
}

/// Attendance session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: AttendanceSession) -> anyhow::Result<()>;

    /// Set the checkout time on a session; returns the closed session
    async fn close_session(
        &self,
        session_id: &str,
        at: NaiveDateTime,
        reason: CloseReason,
    ) -> anyhow::Result<AttendanceSession>;

    /// The employee's open session, if any (at most one exists)
    async fn get_open_session(
        &self,
        employee: EmployeeId,
    ) -> anyhow::Result<Option<AttendanceSession>>;

    async fn sessions_for_date(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<AttendanceSession>>;

    async fn sessions_in_range(
        &self,
        employee: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<AttendanceSession>>;
}

/// Leave/permission/advance request lookups
///
/// Only approved requests participate in status resolution, so the seam
/// exposes approved lookups directly.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn approved_for_date(
        &self,
        employee: EmployeeId,
        kind: RequestKind,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Request>>;

    async fn approved_in_range(
        &self,
        employee: EmployeeId,
        kind: RequestKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<Request>>;
}

/// Per-employee live tracking state, keyed by employee
#[async_trait]
pub trait TrackingStore: Send + Sync {
    async fn tracking_state(&self, employee: EmployeeId) -> anyhow::Result<Option<TrackingState>>;

    async fn put_tracking_state(&self, state: TrackingState) -> anyhow::Result<()>;
}

/// Attendance policy settings store
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current policy settings. Callers fall back to in-code defaults on
    /// error; status computation never hard-fails on unreachable config.
    async fn policy(&self) -> anyhow::Result<PolicySettings>;
}

/// Append-only audit log of processed pings
#[async_trait]
pub trait PingLog: Send + Sync {
    async fn append(&self, ping: PingRecord) -> anyhow::Result<()>;
}

/// Identity returned by the external face-match service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMatch {
    pub employee_id: EmployeeId,
    pub similarity: f64,
}

/// External face-recognition service
#[async_trait]
pub trait IdentityMatcher: Send + Sync {
    /// Match an image against the enrolled gallery. `None` means no match
    /// above the service's similarity cutoff.
    async fn match_face(&self, image: &[u8]) -> anyhow::Result<Option<FaceMatch>>;
}
