//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `geofence` - great-circle distance and fence membership math
//! - `presence` - ping state machine and session lifecycle
//! - `status` - pure daily attendance classification
//! - `duration` - worked-time aggregation across sessions
//! - `report` - per-day/range report orchestration over the stores

pub mod duration;
pub mod geofence;
pub mod presence;
pub mod report;
pub mod status;

// Re-export commonly used types
pub use duration::DurationBreakdown;
pub use presence::{PingOutcome, PresenceConfig, PresenceStateMachine};
pub use report::Reporter;
pub use status::{compute_daily_status, merge_envelope, PolicySettings, SessionEnvelope};
