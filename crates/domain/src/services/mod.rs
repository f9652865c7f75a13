//! Domain services for Worktrack.
//!
//! Services are pure functions over domain models; persistence and HTTP
//! concerns live in the outer crates.

pub mod attendance_automation;
pub mod geofence_evaluation;
pub mod geometry;
pub mod gps_filter;
pub mod restrictions;

pub use attendance_automation::{decide, drop_stale_clock_in, AttendanceAction, AutomationOutcome};
pub use geofence_evaluation::{apply_states, evaluate, Evaluation, MembershipState, Transition};
pub use geometry::{haversine_distance_meters, point_in_circle, point_in_polygon, GeoPoint};
pub use gps_filter::{filter_batch, FilterOutcome, FilterSettings};
pub use restrictions::{find_block, is_blocked, normalize_domain};
