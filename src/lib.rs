//! Attendance engine library
//!
//! Core of a face-recognition employee attendance tracker: geofence
//! presence tracking with auto-checkout, daily status resolution, and
//! work-duration aggregation. Persistence, notification delivery, and
//! the HTTP shell are external collaborators behind the `io` traits.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
