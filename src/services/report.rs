//! Report orchestration over the backing stores
//!
//! Pulls sessions, approved requests, and policy settings together and
//! runs the pure engines. Policy settings are resolved once per request;
//! a settings-store failure falls back to in-code defaults so report
//! generation never hard-fails on unreachable configuration.

use crate::domain::error::AttendanceError;
use crate::domain::report::DailyStatusResult;
use crate::domain::types::{EmployeeId, RequestKind};
use crate::io::{RequestStore, SessionStore, SettingsStore};
use crate::services::duration::{self, DurationBreakdown};
use crate::services::status::{compute_daily_status, merge_envelope, PolicySettings};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::warn;

pub struct Reporter {
    sessions: Arc<dyn SessionStore>,
    requests: Arc<dyn RequestStore>,
    settings: Arc<dyn SettingsStore>,
}

impl Reporter {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        requests: Arc<dyn RequestStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self { sessions, requests, settings }
    }

    /// Policy settings with in-code default fallback
    async fn policy(&self) -> PolicySettings {
        match self.settings.policy().await {
            Ok(policy) => policy,
            Err(e) => {
                warn!(error = %e, "settings_unavailable_using_defaults");
                PolicySettings::default()
            }
        }
    }

    /// Daily classification for one (employee, date)
    pub async fn daily_status(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<DailyStatusResult, AttendanceError> {
        let policy = self.policy().await;
        self.daily_status_with_policy(employee, date, &policy, now).await
    }

    async fn daily_status_with_policy(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        policy: &PolicySettings,
        now: NaiveDateTime,
    ) -> Result<DailyStatusResult, AttendanceError> {
        let sessions = self.sessions.sessions_for_date(employee, date).await?;
        let envelope = merge_envelope(&sessions);
        let leave = self
            .requests
            .approved_for_date(employee, RequestKind::Leave, date)
            .await?
            .into_iter()
            .next();
        let permission = self
            .requests
            .approved_for_date(employee, RequestKind::Permission, date)
            .await?
            .into_iter()
            .next();

        Ok(compute_daily_status(
            date,
            envelope.as_ref(),
            leave.as_ref(),
            permission.as_ref(),
            policy,
            now,
        ))
    }

    /// Classification per day over an inclusive date range
    ///
    /// Days are independent reads over immutable history; callers needing
    /// throughput can fan out per day or per employee freely.
    pub async fn range_report(
        &self,
        employee: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<(NaiveDate, DailyStatusResult)>, AttendanceError> {
        let policy = self.policy().await;
        let mut report = Vec::new();
        let mut date = start;
        while date <= end {
            let result = self.daily_status_with_policy(employee, date, &policy, now).await?;
            report.push((date, result));
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(report)
    }

    /// Worked + permitted minutes for one (employee, date)
    pub async fn durations(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<DurationBreakdown, AttendanceError> {
        let sessions = self.sessions.sessions_for_date(employee, date).await?;
        let permissions =
            self.requests.approved_for_date(employee, RequestKind::Permission, date).await?;
        Ok(duration::aggregate(&sessions, &permissions, now))
    }
}
