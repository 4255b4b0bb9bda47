//! In-memory store implementing every collaborator trait
//!
//! Backs the replay binary and the test suites. All maps are guarded by
//! `parking_lot` locks; methods never hold a guard across an await.

use crate::domain::types::{
    AttendanceSession, CloseReason, Employee, EmployeeId, Fence, FenceId, GeoPoint, PingRecord,
    Request, RequestKind, TrackingState,
};
use crate::io::{
    DirectoryStore, PingLog, RequestStore, SessionStore, SettingsStore, TrackingStore,
};
use crate::services::status::PolicySettings;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct InMemoryStore {
    employees: RwLock<FxHashMap<EmployeeId, Employee>>,
    fences: RwLock<Vec<Fence>>,
    sessions: RwLock<Vec<AttendanceSession>>,
    requests: RwLock<Vec<Request>>,
    tracking: RwLock<FxHashMap<EmployeeId, TrackingState>>,
    policy: RwLock<Option<PolicySettings>>,
    pings: RwLock<Vec<PingRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { policy: RwLock::new(Some(PolicySettings::default())), ..Self::default() }
    }

    pub fn seed_employee(&self, id: EmployeeId, name: &str) {
        self.employees
            .write()
            .insert(id, Employee { id, name: name.to_string(), branch: None });
    }

    pub fn seed_fence(&self, id: i32, center: GeoPoint, radius_m: f64) {
        self.add_fence(Fence {
            id: FenceId(id),
            name: format!("FENCE_{id}"),
            center,
            radius_m,
            branch: None,
        });
    }

    pub fn add_fence(&self, fence: Fence) {
        self.fences.write().push(fence);
    }

    pub fn seed_request(&self, request: Request) {
        self.requests.write().push(request);
    }

    pub fn set_policy(&self, policy: PolicySettings) {
        *self.policy.write() = Some(policy);
    }

    /// Simulate a settings-store outage
    pub fn clear_policy(&self) {
        *self.policy.write() = None;
    }

    /// All pings appended so far, oldest first
    pub fn pings(&self) -> Vec<PingRecord> {
        self.pings.read().clone()
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn get_employee(&self, id: EmployeeId) -> anyhow::Result<Option<Employee>> {
        Ok(self.employees.read().get(&id).cloned())
    }

    async fn update_employee(&self, employee: Employee) -> anyhow::Result<()> {
        self.employees.write().insert(employee.id, employee);
        Ok(())
    }

    async fn list_employees(&self) -> anyhow::Result<Vec<Employee>> {
        let mut employees: Vec<Employee> = self.employees.read().values().cloned().collect();
        employees.sort_by_key(|e| e.id.0);
        Ok(employees)
    }

    async fn active_fences(&self) -> anyhow::Result<Vec<Fence>> {
        Ok(self.fences.read().clone())
    }

    async fn get_fence(&self, id: FenceId) -> anyhow::Result<Option<Fence>> {
        Ok(self.fences.read().iter().find(|f| f.id == id).cloned())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(&self, session: AttendanceSession) -> anyhow::Result<()> {
        self.sessions.write().push(session);
        Ok(())
    }

    async fn close_session(
        &self,
        session_id: &str,
        at: NaiveDateTime,
        reason: CloseReason,
    ) -> anyhow::Result<AttendanceSession> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .with_context(|| format!("session {session_id} not found"))?;
        session.close(at, reason);
        Ok(session.clone())
    }

    async fn get_open_session(
        &self,
        employee: EmployeeId,
    ) -> anyhow::Result<Option<AttendanceSession>> {
        Ok(self
            .sessions
            .read()
            .iter()
            .find(|s| s.employee_id == employee && s.is_open())
            .cloned())
    }

    async fn sessions_for_date(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<AttendanceSession>> {
        Ok(self
            .sessions
            .read()
            .iter()
            .filter(|s| s.employee_id == employee && s.date == date)
            .cloned()
            .collect())
    }

    async fn sessions_in_range(
        &self,
        employee: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<AttendanceSession>> {
        Ok(self
            .sessions
            .read()
            .iter()
            .filter(|s| s.employee_id == employee && s.date >= start && s.date <= end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn approved_for_date(
        &self,
        employee: EmployeeId,
        kind: RequestKind,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Request>> {
        Ok(self
            .requests
            .read()
            .iter()
            .filter(|r| {
                r.employee_id == employee && r.kind == kind && r.date == date && r.is_approved()
            })
            .cloned()
            .collect())
    }

    async fn approved_in_range(
        &self,
        employee: EmployeeId,
        kind: RequestKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<Request>> {
        Ok(self
            .requests
            .read()
            .iter()
            .filter(|r| {
                r.employee_id == employee
                    && r.kind == kind
                    && r.date >= start
                    && r.date <= end
                    && r.is_approved()
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TrackingStore for InMemoryStore {
    async fn tracking_state(&self, employee: EmployeeId) -> anyhow::Result<Option<TrackingState>> {
        Ok(self.tracking.read().get(&employee).cloned())
    }

    async fn put_tracking_state(&self, state: TrackingState) -> anyhow::Result<()> {
        self.tracking.write().insert(state.employee_id, state);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for InMemoryStore {
    async fn policy(&self) -> anyhow::Result<PolicySettings> {
        self.policy.read().clone().ok_or_else(|| anyhow!("settings store unavailable"))
    }
}

#[async_trait]
impl PingLog for InMemoryStore {
    async fn append(&self, ping: PingRecord) -> anyhow::Result<()> {
        self.pings.write().push(ping);
        Ok(())
    }
}
