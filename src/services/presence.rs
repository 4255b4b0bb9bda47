//! Presence state machine - ping handling and session lifecycle
//!
//! Per-employee states: not tracking, tracking inside the fence, tracking
//! outside with a consecutive-ping counter. Pings arrive roughly once a
//! minute from a single device; the counter reaching its threshold forces
//! an automatic checkout. A separate read-time staleness check covers the
//! client that stopped pinging entirely - it flips the tracking flag
//! without closing the open session, which stays resumable inside the
//! grace window.
//!
//! The check-in/check-out/ping path for one employee is serialized by a
//! per-employee async mutex held across the read-modify-write.

use crate::domain::error::AttendanceError;
use crate::domain::types::{
    AttendanceSession, CloseReason, EmployeeId, Fence, GeoPoint, PingRecord, SessionKind,
    TrackingState,
};
use crate::infra::metrics::Metrics;
use crate::io::{DirectoryStore, IdentityMatcher, PingLog, SessionStore, TrackingStore};
use crate::services::geofence;
use chrono::{Duration, NaiveDateTime};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tracking thresholds, resolved from configuration at startup
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Consecutive outside-fence pings before forced checkout
    pub outside_ping_threshold: u32,
    /// Minutes without a ping before the read path marks tracking stale
    pub stale_after_minutes: i64,
    /// Minutes within which an open session can be resumed
    pub resume_window_minutes: i64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self { outside_ping_threshold: 5, stale_after_minutes: 10, resume_window_minutes: 30 }
    }
}

/// Result of processing one location ping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PingOutcome {
    /// Employee is not tracking; the ping was a no-op
    NotTracking,
    /// Inside at least one active fence; counter reset
    Inside { distance_m: f64 },
    /// Outside all fences, threshold not yet reached
    Outside { distance_m: f64, consecutive: u32 },
    /// Threshold reached; the open session was closed and tracking stopped
    AutoCheckedOut { distance_m: f64 },
}

impl PingOutcome {
    pub fn tracking(&self) -> bool {
        matches!(self, PingOutcome::Inside { .. } | PingOutcome::Outside { .. })
    }

    pub fn auto_checked_out(&self) -> bool {
        matches!(self, PingOutcome::AutoCheckedOut { .. })
    }

    pub fn inside_fence(&self) -> bool {
        matches!(self, PingOutcome::Inside { .. })
    }

    pub fn distance_m(&self) -> Option<f64> {
        match self {
            PingOutcome::NotTracking => None,
            PingOutcome::Inside { distance_m }
            | PingOutcome::Outside { distance_m, .. }
            | PingOutcome::AutoCheckedOut { distance_m } => Some(*distance_m),
        }
    }
}

/// Central processor for pings and session lifecycle
pub struct PresenceStateMachine {
    directory: Arc<dyn DirectoryStore>,
    sessions: Arc<dyn SessionStore>,
    tracking: Arc<dyn TrackingStore>,
    ping_log: Arc<dyn PingLog>,
    matcher: Option<Arc<dyn IdentityMatcher>>,
    metrics: Arc<Metrics>,
    config: PresenceConfig,
    /// Per-employee guards serializing check-in/check-out/ping
    locks: parking_lot::Mutex<FxHashMap<EmployeeId, Arc<Mutex<()>>>>,
}

impl PresenceStateMachine {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        sessions: Arc<dyn SessionStore>,
        tracking: Arc<dyn TrackingStore>,
        ping_log: Arc<dyn PingLog>,
        metrics: Arc<Metrics>,
        config: PresenceConfig,
    ) -> Self {
        Self {
            directory,
            sessions,
            tracking,
            ping_log,
            matcher: None,
            metrics,
            config,
            locks: parking_lot::Mutex::new(FxHashMap::default()),
        }
    }

    /// Attach the external face-match service for face-driven check-in
    pub fn with_matcher(mut self, matcher: Arc<dyn IdentityMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    fn employee_lock(&self, employee_id: EmployeeId) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(employee_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn state_for(&self, employee_id: EmployeeId) -> anyhow::Result<TrackingState> {
        Ok(self
            .tracking
            .tracking_state(employee_id)
            .await?
            .unwrap_or_else(|| TrackingState::idle(employee_id)))
    }

    /// Fences applicable to an employee: branch-scoped ones for their
    /// branch plus global fallback fences.
    fn applicable_fences(fences: Vec<Fence>, branch: Option<&str>) -> Vec<Fence> {
        fences
            .into_iter()
            .filter(|f| f.branch.is_none() || f.branch.as_deref() == branch)
            .collect()
    }

    /// Process one location ping
    ///
    /// Every processed ping is appended to the ping log regardless of
    /// outcome. Delivery is at-least-once: duplicate inside pings are
    /// harmless beyond a counter reset, duplicate outside pings do count
    /// toward the threshold.
    pub async fn handle_ping(
        &self,
        employee_id: EmployeeId,
        point: GeoPoint,
        ts: NaiveDateTime,
    ) -> Result<PingOutcome, AttendanceError> {
        let lock = self.employee_lock(employee_id);
        let _guard = lock.lock().await;
        let started = Instant::now();

        let mut state = self.state_for(employee_id).await?;
        if !state.is_tracking {
            self.metrics.record_ping_not_tracking();
            debug!(employee_id = %employee_id, "ping_rejected_not_tracking");
            return Ok(PingOutcome::NotTracking);
        }

        let employee = self
            .directory
            .get_employee(employee_id)
            .await?
            .ok_or(AttendanceError::UnknownEmployee(employee_id))?;
        let fences =
            Self::applicable_fences(self.directory.active_fences().await?, employee.branch.as_deref());

        let (inside, distance_m) = match geofence::evaluate(point, &fences) {
            Some(decision) => (decision.inside_any, decision.min_distance_m),
            None => {
                // No fences configured: never auto-checkout on geometry we don't have
                warn!(employee_id = %employee_id, "ping_without_active_fences");
                (true, 0.0)
            }
        };

        let outcome = if inside {
            state.record_inside(point, ts);
            self.tracking.put_tracking_state(state).await?;
            PingOutcome::Inside { distance_m }
        } else {
            let consecutive = state.record_outside(point, ts);
            if consecutive >= self.config.outside_ping_threshold {
                if let Some(open) = self.sessions.get_open_session(employee_id).await? {
                    self.sessions
                        .close_session(&open.id, ts, CloseReason::OutsideGeofence)
                        .await?;
                    info!(
                        employee_id = %employee_id,
                        session_id = %open.id,
                        consecutive = %consecutive,
                        distance_m = %distance_m,
                        "auto_checkout_outside_geofence"
                    );
                } else {
                    warn!(employee_id = %employee_id, "auto_checkout_without_open_session");
                }
                state.stop();
                self.tracking.put_tracking_state(state).await?;
                self.metrics.record_auto_checkout();
                PingOutcome::AutoCheckedOut { distance_m }
            } else {
                self.tracking.put_tracking_state(state).await?;
                debug!(
                    employee_id = %employee_id,
                    consecutive = %consecutive,
                    distance_m = %distance_m,
                    "ping_outside_fence"
                );
                PingOutcome::Outside { distance_m, consecutive }
            }
        };

        self.ping_log
            .append(PingRecord { employee_id, location: point, inside_fence: inside, distance_m, ts })
            .await?;
        self.metrics.record_ping(inside);
        self.metrics.record_ping_latency(started.elapsed().as_micros() as u64);

        Ok(outcome)
    }

    /// Open a session and start tracking
    ///
    /// Self-heals two inconsistencies instead of failing: an open session
    /// left over from a prior calendar day is closed transparently, and a
    /// tracking flag set with no open session (ghost state) is ignored.
    pub async fn check_in(
        &self,
        employee_id: EmployeeId,
        point: GeoPoint,
        ts: NaiveDateTime,
        kind: SessionKind,
    ) -> Result<AttendanceSession, AttendanceError> {
        let lock = self.employee_lock(employee_id);
        let _guard = lock.lock().await;

        if self.directory.get_employee(employee_id).await?.is_none() {
            return Err(AttendanceError::UnknownEmployee(employee_id));
        }

        let mut state = self.state_for(employee_id).await?;

        if let Some(open) = self.sessions.get_open_session(employee_id).await? {
            if open.date < ts.date() {
                let end_of_day = open.date.and_hms_opt(23, 59, 59).unwrap_or(ts);
                self.sessions
                    .close_session(&open.id, end_of_day, CloseReason::StaleSession)
                    .await?;
                self.metrics.record_stale_session();
                info!(
                    employee_id = %employee_id,
                    session_id = %open.id,
                    session_date = %open.date,
                    "stale_session_closed"
                );
            } else {
                return Err(AttendanceError::AlreadyCheckedIn(employee_id));
            }
        } else if state.is_tracking {
            info!(employee_id = %employee_id, "ghost_tracking_healed");
        }

        let session = AttendanceSession::open(employee_id, ts, point, kind);
        self.sessions.create_session(session.clone()).await?;

        state.start(point, ts);
        self.tracking.put_tracking_state(state).await?;
        self.metrics.record_check_in();
        info!(
            employee_id = %employee_id,
            session_id = %session.id,
            kind = %session.kind.as_str(),
            "checked_in"
        );

        Ok(session)
    }

    /// Identify the employee from a face image, then check them in
    pub async fn check_in_by_face(
        &self,
        image: &[u8],
        point: GeoPoint,
        ts: NaiveDateTime,
        kind: SessionKind,
    ) -> Result<AttendanceSession, AttendanceError> {
        let matcher = self.matcher.as_ref().ok_or_else(|| {
            AttendanceError::Store(anyhow::anyhow!("no identity matcher configured"))
        })?;
        let matched = matcher
            .match_face(image)
            .await?
            .ok_or(AttendanceError::FaceNotRecognized)?;

        info!(
            employee_id = %matched.employee_id,
            similarity = %matched.similarity,
            "face_matched"
        );
        self.check_in(matched.employee_id, point, ts, kind).await
    }

    /// Close the open session and stop tracking
    pub async fn check_out(
        &self,
        employee_id: EmployeeId,
        ts: NaiveDateTime,
    ) -> Result<AttendanceSession, AttendanceError> {
        let lock = self.employee_lock(employee_id);
        let _guard = lock.lock().await;

        let Some(open) = self.sessions.get_open_session(employee_id).await? else {
            return Err(AttendanceError::NoOpenSession(employee_id));
        };

        let closed = self.sessions.close_session(&open.id, ts, CloseReason::Manual).await?;

        let mut state = self.state_for(employee_id).await?;
        state.stop();
        self.tracking.put_tracking_state(state).await?;
        self.metrics.record_check_out();
        info!(employee_id = %employee_id, session_id = %closed.id, "checked_out");

        Ok(closed)
    }

    /// Tracking state with the read-time staleness correction applied
    ///
    /// A client that stopped pinging entirely (app killed, connectivity
    /// lost) gets its tracking flag flipped off here. Only the flag
    /// changes; the open session is left untouched so it can be resumed.
    pub async fn corrected_state(
        &self,
        employee_id: EmployeeId,
        now: NaiveDateTime,
    ) -> Result<TrackingState, AttendanceError> {
        let lock = self.employee_lock(employee_id);
        let _guard = lock.lock().await;

        let mut state = self.state_for(employee_id).await?;
        if state.is_tracking {
            if let Some(last_ping) = state.last_ping {
                if now - last_ping > Duration::minutes(self.config.stale_after_minutes) {
                    state.is_tracking = false;
                    self.tracking.put_tracking_state(state.clone()).await?;
                    self.metrics.record_stale_correction();
                    info!(
                        employee_id = %employee_id,
                        last_ping = %last_ping,
                        "tracking_marked_stale"
                    );
                }
            }
        }

        Ok(state)
    }

    /// Resume the open session after a tracking gap
    pub async fn resume(
        &self,
        employee_id: EmployeeId,
        now: NaiveDateTime,
    ) -> Result<AttendanceSession, AttendanceError> {
        let lock = self.employee_lock(employee_id);
        let _guard = lock.lock().await;

        let Some(open) = self.sessions.get_open_session(employee_id).await? else {
            return Err(AttendanceError::NoOpenSession(employee_id));
        };

        let mut state = self.state_for(employee_id).await?;
        let last_seen = state.last_ping.unwrap_or(open.check_in);
        if now - last_seen > Duration::minutes(self.config.resume_window_minutes) {
            return Err(AttendanceError::ResumeWindowElapsed(employee_id));
        }

        state.is_tracking = true;
        state.last_ping = Some(now);
        self.tracking.put_tracking_state(state).await?;
        self.metrics.record_resume();
        info!(employee_id = %employee_id, session_id = %open.id, "tracking_resumed");

        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::InMemoryStore;
    use crate::io::{FaceMatch, SessionStore, TrackingStore};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    const OFFICE: GeoPoint = GeoPoint { lat: 12.9716, lng: 77.5946 };
    // ~1.1 km north of the office, outside any test fence
    const FAR_AWAY: GeoPoint = GeoPoint { lat: 12.9816, lng: 77.5946 };
    const EMP: EmployeeId = EmployeeId(1);

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn harness() -> (PresenceStateMachine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        store.seed_employee(EMP, "Asha");
        store.seed_fence(1, OFFICE, 120.0);
        let machine = PresenceStateMachine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(Metrics::new()),
            PresenceConfig::default(),
        );
        (machine, store)
    }

    #[tokio::test]
    async fn test_ping_rejected_when_not_tracking() {
        let (machine, store) = harness();

        let outcome = machine.handle_ping(EMP, OFFICE, at(9, 1)).await.unwrap();
        assert_eq!(outcome, PingOutcome::NotTracking);
        // Rejected pings are not audit-logged
        assert!(store.pings().is_empty());
    }

    #[tokio::test]
    async fn test_check_in_starts_tracking() {
        let (machine, store) = harness();

        let session =
            machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();
        assert!(session.is_open());

        let state = store.tracking_state(EMP).await.unwrap().unwrap();
        assert!(state.is_tracking);
        assert!(state.inside_fence);
        assert_eq!(state.outside_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_check_in_rejected() {
        let (machine, _store) = harness();

        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();
        let err = machine.check_in(EMP, OFFICE, at(9, 5), SessionKind::Office).await.unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyCheckedIn(id) if id == EMP));
    }

    #[tokio::test]
    async fn test_check_in_unknown_employee() {
        let (machine, _store) = harness();

        let err = machine
            .check_in(EmployeeId(99), OFFICE, at(9, 0), SessionKind::Office)
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::UnknownEmployee(_)));
    }

    #[tokio::test]
    async fn test_inside_ping_keeps_tracking() {
        let (machine, store) = harness();
        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();

        let outcome = machine.handle_ping(EMP, OFFICE, at(9, 1)).await.unwrap();
        assert!(outcome.inside_fence());
        assert!(outcome.tracking());
        assert_eq!(store.pings().len(), 1);
    }

    #[tokio::test]
    async fn test_auto_checkout_on_fifth_outside_ping() {
        let (machine, store) = harness();
        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();

        for minute in 1..=4 {
            let outcome = machine.handle_ping(EMP, FAR_AWAY, at(9, minute)).await.unwrap();
            match outcome {
                PingOutcome::Outside { consecutive, .. } => assert_eq!(consecutive, minute),
                other => panic!("expected outside outcome, got {other:?}"),
            }
        }

        // Exactly the fifth consecutive outside ping forces the checkout
        let fifth = machine.handle_ping(EMP, FAR_AWAY, at(9, 5)).await.unwrap();
        assert!(fifth.auto_checked_out());

        let state = store.tracking_state(EMP).await.unwrap().unwrap();
        assert!(!state.is_tracking);

        let sessions = store
            .sessions_for_date(EMP, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].check_out, Some(at(9, 5)));
        assert_eq!(sessions[0].closed_by, Some(CloseReason::OutsideGeofence));

        // All five pings were audit-logged, the follow-up is a no-op
        assert_eq!(store.pings().len(), 5);
        let after = machine.handle_ping(EMP, FAR_AWAY, at(9, 6)).await.unwrap();
        assert_eq!(after, PingOutcome::NotTracking);
    }

    #[tokio::test]
    async fn test_inside_ping_resets_outside_counter() {
        let (machine, store) = harness();
        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();

        for minute in 1..=4 {
            machine.handle_ping(EMP, FAR_AWAY, at(9, minute)).await.unwrap();
        }
        let inside = machine.handle_ping(EMP, OFFICE, at(9, 5)).await.unwrap();
        assert!(inside.inside_fence());

        let state = store.tracking_state(EMP).await.unwrap().unwrap();
        assert!(state.is_tracking);
        assert_eq!(state.outside_count, 0);
        assert!(store.get_open_session(EMP).await.unwrap().is_some());

        // The counter starts over; four more outside pings do not check out
        for minute in 6..=9 {
            let outcome = machine.handle_ping(EMP, FAR_AWAY, at(9, minute)).await.unwrap();
            assert!(outcome.tracking());
        }
    }

    #[tokio::test]
    async fn test_check_out_closes_session() {
        let (machine, store) = harness();
        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();

        let closed = machine.check_out(EMP, at(17, 30)).await.unwrap();
        assert_eq!(closed.check_out, Some(at(17, 30)));
        assert_eq!(closed.closed_by, Some(CloseReason::Manual));

        let state = store.tracking_state(EMP).await.unwrap().unwrap();
        assert!(!state.is_tracking);
    }

    #[tokio::test]
    async fn test_check_out_without_open_session() {
        let (machine, _store) = harness();

        let err = machine.check_out(EMP, at(17, 30)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::NoOpenSession(id) if id == EMP));
    }

    #[tokio::test]
    async fn test_ghost_tracking_flag_self_heals() {
        let (machine, store) = harness();

        // Flag set with no open session anywhere
        let mut ghost = TrackingState::idle(EMP);
        ghost.is_tracking = true;
        store.put_tracking_state(ghost).await.unwrap();

        let session =
            machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn test_stale_prior_day_session_auto_closed() {
        let (machine, store) = harness();

        let yesterday =
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        machine.check_in(EMP, OFFICE, yesterday, SessionKind::Office).await.unwrap();

        // Next morning's check-in closes the leftover instead of failing
        let session =
            machine.check_in(EMP, OFFICE, at(8, 55), SessionKind::Office).await.unwrap();
        assert!(session.is_open());

        let old = store
            .sessions_for_date(EMP, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].closed_by, Some(CloseReason::StaleSession));
        assert_eq!(
            old[0].check_out,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(23, 59, 59)
        );
    }

    #[tokio::test]
    async fn test_staleness_correction_flips_flag_only() {
        let (machine, store) = harness();
        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();
        machine.handle_ping(EMP, OFFICE, at(9, 1)).await.unwrap();

        // 15 minutes of silence exceeds the 10 minute staleness timeout
        let state = machine.corrected_state(EMP, at(9, 16)).await.unwrap();
        assert!(!state.is_tracking);

        // The open session must survive the correction
        assert!(store.get_open_session(EMP).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_staleness_correction_noop_when_fresh() {
        let (machine, _store) = harness();
        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();
        machine.handle_ping(EMP, OFFICE, at(9, 1)).await.unwrap();

        let state = machine.corrected_state(EMP, at(9, 5)).await.unwrap();
        assert!(state.is_tracking);
    }

    #[tokio::test]
    async fn test_resume_within_window() {
        let (machine, store) = harness();
        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();
        machine.handle_ping(EMP, OFFICE, at(9, 1)).await.unwrap();

        machine.corrected_state(EMP, at(9, 16)).await.unwrap();

        // 20 minutes since the last ping is still inside the 30 minute window
        let resumed = machine.resume(EMP, at(9, 21)).await.unwrap();
        assert!(resumed.is_open());

        let state = store.tracking_state(EMP).await.unwrap().unwrap();
        assert!(state.is_tracking);
    }

    #[tokio::test]
    async fn test_resume_window_elapsed() {
        let (machine, _store) = harness();
        machine.check_in(EMP, OFFICE, at(9, 0), SessionKind::Office).await.unwrap();
        machine.handle_ping(EMP, OFFICE, at(9, 1)).await.unwrap();

        let err = machine.resume(EMP, at(9, 45)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::ResumeWindowElapsed(_)));
    }

    #[tokio::test]
    async fn test_branch_scoped_fence_applies_to_branch_employee() {
        use crate::domain::types::{Employee, FenceId};

        let store = Arc::new(InMemoryStore::new());
        store
            .update_employee(Employee {
                id: EmployeeId(2),
                name: "Noor".to_string(),
                branch: Some("north".to_string()),
            })
            .await
            .unwrap();
        store.add_fence(Fence {
            id: FenceId(9),
            name: "NORTH_YARD".to_string(),
            center: OFFICE,
            radius_m: 120.0,
            branch: Some("north".to_string()),
        });
        let machine = PresenceStateMachine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(Metrics::new()),
            PresenceConfig::default(),
        );

        machine.check_in(EmployeeId(2), OFFICE, at(9, 0), SessionKind::Office).await.unwrap();

        let inside = machine.handle_ping(EmployeeId(2), OFFICE, at(9, 1)).await.unwrap();
        assert!(inside.inside_fence());

        let outside = machine.handle_ping(EmployeeId(2), FAR_AWAY, at(9, 2)).await.unwrap();
        assert!(matches!(outside, PingOutcome::Outside { consecutive: 1, .. }));
    }

    #[tokio::test]
    async fn test_other_branch_fence_is_ignored() {
        use crate::domain::types::{Employee, FenceId};

        let store = Arc::new(InMemoryStore::new());
        store
            .update_employee(Employee { id: EmployeeId(3), name: "Mei".to_string(), branch: None })
            .await
            .unwrap();
        store.add_fence(Fence {
            id: FenceId(9),
            name: "NORTH_YARD".to_string(),
            center: OFFICE,
            radius_m: 120.0,
            branch: Some("north".to_string()),
        });
        let machine = PresenceStateMachine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(Metrics::new()),
            PresenceConfig::default(),
        );

        machine.check_in(EmployeeId(3), OFFICE, at(9, 0), SessionKind::Office).await.unwrap();

        // No fence applies to this employee; pings never count as outside
        let outcome = machine.handle_ping(EmployeeId(3), FAR_AWAY, at(9, 1)).await.unwrap();
        assert!(outcome.inside_fence());
    }

    struct StubMatcher(Option<FaceMatch>);

    #[async_trait]
    impl IdentityMatcher for StubMatcher {
        async fn match_face(&self, _image: &[u8]) -> anyhow::Result<Option<FaceMatch>> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_check_in_by_face() {
        let (machine, _store) = harness();
        let machine = machine
            .with_matcher(Arc::new(StubMatcher(Some(FaceMatch { employee_id: EMP, similarity: 0.97 }))));

        let session = machine
            .check_in_by_face(b"jpeg bytes", OFFICE, at(9, 0), SessionKind::Office)
            .await
            .unwrap();
        assert_eq!(session.employee_id, EMP);
    }

    #[tokio::test]
    async fn test_check_in_by_face_no_match() {
        let (machine, _store) = harness();
        let machine = machine.with_matcher(Arc::new(StubMatcher(None)));

        let err = machine
            .check_in_by_face(b"jpeg bytes", OFFICE, at(9, 0), SessionKind::Office)
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::FaceNotRecognized));
    }
}
