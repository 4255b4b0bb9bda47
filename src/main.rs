//! Attendance replay - offline driver for the attendance engine
//!
//! Reads an event stream (JSONL: employee seeds, check-ins, pings,
//! check-outs) and runs it through the presence state machine against an
//! in-memory store, then prints per-employee daily reports and a metrics
//! summary. Useful for validating geofence and policy configuration
//! against captured mobile-client traffic.
//!
//! Module structure:
//! - `domain/` - Core business types (Session, TrackingState, Report)
//! - `io/` - External interfaces (stores, ping log, face match client)
//! - `services/` - Business logic (Presence, Status, Duration, Report)
//! - `infra/` - Infrastructure (Config, Metrics)

use attendance_engine::domain::types::{Employee, EmployeeId, GeoPoint, SessionKind};
use attendance_engine::infra::{Config, Metrics};
use attendance_engine::io::ping_log::PingLogFile;
use attendance_engine::io::{DirectoryStore, InMemoryStore};
use attendance_engine::services::{PresenceStateMachine, Reporter};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Attendance replay - offline attendance engine driver
#[derive(Parser, Debug)]
#[command(name = "attendance-replay", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Path to the JSONL event stream to replay
    #[arg(short, long)]
    events: String,
}

/// One line of the replay input
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ReplayEvent {
    Employee { id: i64, name: String },
    CheckIn { employee: i64, lat: f64, lng: f64, ts: NaiveDateTime },
    Ping { employee: i64, lat: f64, lng: f64, ts: NaiveDateTime },
    CheckOut { employee: i64, ts: NaiveDateTime },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, level via RUST_LOG (default INFO)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("attendance-replay starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        work_start = %config.policy().work_start,
        work_end = %config.policy().work_end,
        fences = %config.fences().len(),
        outside_ping_threshold = %config.presence().outside_ping_threshold,
        ping_log = %config.ping_log_file(),
        "config_loaded"
    );

    let store = Arc::new(InMemoryStore::new());
    store.set_policy(config.policy().clone());
    for fence in config.fences() {
        store.add_fence(fence.clone());
    }

    let metrics = Arc::new(Metrics::new());
    let ping_log = Arc::new(PingLogFile::new(config.ping_log_file()));
    let machine = PresenceStateMachine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        ping_log,
        metrics.clone(),
        config.presence().clone(),
    );

    let file = File::open(&args.events)?;
    let reader = BufReader::new(file);

    let mut employees: BTreeSet<i64> = BTreeSet::new();
    let mut first_date: Option<NaiveDate> = None;
    let mut last_date: Option<NaiveDate> = None;
    let mut last_ts: Option<NaiveDateTime> = None;
    let mut line_no = 0usize;

    for line in reader.lines() {
        line_no += 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ReplayEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = %line_no, error = %e, "skipping_malformed_event");
                continue;
            }
        };

        let ts = match &event {
            ReplayEvent::Employee { .. } => None,
            ReplayEvent::CheckIn { ts, .. }
            | ReplayEvent::Ping { ts, .. }
            | ReplayEvent::CheckOut { ts, .. } => Some(*ts),
        };
        if let Some(ts) = ts {
            first_date = Some(first_date.map_or(ts.date(), |d| d.min(ts.date())));
            last_date = Some(last_date.map_or(ts.date(), |d| d.max(ts.date())));
            last_ts = Some(last_ts.map_or(ts, |t| t.max(ts)));
        }

        match event {
            ReplayEvent::Employee { id, name } => {
                store
                    .update_employee(Employee { id: EmployeeId(id), name, branch: None })
                    .await?;
                employees.insert(id);
            }
            ReplayEvent::CheckIn { employee, lat, lng, ts } => {
                let result = machine
                    .check_in(EmployeeId(employee), GeoPoint::new(lat, lng), ts, SessionKind::Office)
                    .await;
                if let Err(e) = result {
                    warn!(line = %line_no, employee = %employee, error = %e, "check_in_rejected");
                }
            }
            ReplayEvent::Ping { employee, lat, lng, ts } => {
                let result =
                    machine.handle_ping(EmployeeId(employee), GeoPoint::new(lat, lng), ts).await;
                if let Err(e) = result {
                    warn!(line = %line_no, employee = %employee, error = %e, "ping_failed");
                }
            }
            ReplayEvent::CheckOut { employee, ts } => {
                let result = machine.check_out(EmployeeId(employee), ts).await;
                if let Err(e) = result {
                    warn!(line = %line_no, employee = %employee, error = %e, "check_out_rejected");
                }
            }
        }
    }

    info!(lines = %line_no, employees = %employees.len(), "replay_complete");
    metrics.report().log();

    // Daily reports over the replayed window, clocked at the last event
    let (Some(start), Some(end), Some(now)) = (first_date, last_date, last_ts) else {
        info!("no timed events in input, skipping report");
        return Ok(());
    };

    let reporter = Reporter::new(store.clone(), store.clone(), store.clone());
    for &employee in &employees {
        let employee_id = EmployeeId(employee);
        let report = reporter.range_report(employee_id, start, end, now).await?;
        for (date, result) in report {
            println!("{employee} {date} {}", result.to_json());
        }
        let durations = reporter.durations(employee_id, end, now).await?;
        info!(
            employee = %employee,
            date = %end,
            attendance_minutes = %durations.attendance_minutes,
            permission_minutes = %durations.permission_minutes,
            total_minutes = %durations.total_minutes,
            "work_duration"
        );
    }

    Ok(())
}
