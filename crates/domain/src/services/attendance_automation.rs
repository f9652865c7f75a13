//! Automatic clock-in/clock-out decisions driven by geofence transitions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::geo_event::{GeoEventAction, GeoEventType};
use crate::models::geofence::Geofence;
use crate::services::geofence_evaluation::{Evaluation, Transition};

/// Attendance change to apply for one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceAction {
    ClockIn { geofence_id: Uuid },
    ClockOut { geofence_id: Uuid },
}

/// Automation decision for one evaluated point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationOutcome {
    /// Action recorded on each transition, in transition order.
    pub actions: Vec<GeoEventAction>,
    /// At most one clock-in or clock-out per point.
    pub attendance: Option<AttendanceAction>,
}

/// Decides attendance actions for the transitions of one point.
///
/// - An `enter` into an `auto_clock_in` geofence while no record is open
///   clocks in. Only the first such enter acts.
/// - An `exit` from an `auto_clock_out` geofence while a record is open
///   clocks out, unless the user is still inside another `auto_clock_out`
///   geofence.
/// - Nothing happens when `auto_clock_enabled` is off.
///
/// At most one action is produced per point. Exits are ordered before
/// enters, so a clock-out wins over a clock-in from the same point.
pub fn decide(
    evaluation: &Evaluation,
    geofences: &[Geofence],
    auto_clock_enabled: bool,
    has_open_record: bool,
) -> AutomationOutcome {
    let mut outcome = AutomationOutcome {
        actions: vec![GeoEventAction::None; evaluation.transitions.len()],
        attendance: None,
    };
    if !auto_clock_enabled {
        return outcome;
    }

    let by_id: HashMap<Uuid, &Geofence> = geofences.iter().map(|g| (g.id, g)).collect();
    for (index, transition) in evaluation.transitions.iter().enumerate() {
        if outcome.attendance.is_some() {
            break;
        }
        let Some(geofence) = by_id.get(&transition.geofence_id) else {
            continue;
        };

        match transition.event_type {
            GeoEventType::Enter if geofence.auto_clock_in && !has_open_record => {
                outcome.actions[index] = GeoEventAction::ClockIn;
                outcome.attendance = Some(AttendanceAction::ClockIn {
                    geofence_id: geofence.id,
                });
            }
            GeoEventType::Exit
                if geofence.auto_clock_out
                    && has_open_record
                    && !inside_other_clock_out_fence(transition, evaluation, &by_id) =>
            {
                outcome.actions[index] = GeoEventAction::ClockOut;
                outcome.attendance = Some(AttendanceAction::ClockOut {
                    geofence_id: geofence.id,
                });
            }
            _ => {}
        }
    }

    outcome
}

/// Cancels a clock-in for a point captured before the user's last clock-out.
///
/// Late uploads would otherwise open a record overlapping time that is
/// already closed. The enter event is kept with action `none`.
pub fn drop_stale_clock_in(
    outcome: &mut AutomationOutcome,
    captured_at: DateTime<Utc>,
    last_clock_out: Option<DateTime<Utc>>,
) {
    let stale = last_clock_out.is_some_and(|closed| captured_at < closed);
    if !stale || !matches!(outcome.attendance, Some(AttendanceAction::ClockIn { .. })) {
        return;
    }
    outcome.attendance = None;
    for action in &mut outcome.actions {
        if *action == GeoEventAction::ClockIn {
            *action = GeoEventAction::None;
        }
    }
}

fn inside_other_clock_out_fence(
    transition: &Transition,
    evaluation: &Evaluation,
    by_id: &HashMap<Uuid, &Geofence>,
) -> bool {
    evaluation.states.iter().any(|state| {
        state.inside
            && state.geofence_id != transition.geofence_id
            && by_id
                .get(&state.geofence_id)
                .is_some_and(|g| g.auto_clock_out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geofence::GeofenceShape;
    use crate::services::geofence_evaluation::{apply_states, evaluate};
    use crate::services::geometry::GeoPoint;
    use chrono::Duration;

    const SITE_A: GeoPoint = GeoPoint {
        latitude: 50.0,
        longitude: 14.0,
    };
    const SITE_B: GeoPoint = GeoPoint {
        latitude: 50.0,
        longitude: 14.01,
    };
    const HOME: GeoPoint = GeoPoint {
        latitude: 50.2,
        longitude: 14.0,
    };

    fn fence(name: &str, center: GeoPoint, radius: f64, clock_in: bool, clock_out: bool) -> Geofence {
        Geofence {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            shape: GeofenceShape::Circle {
                center,
                radius_meters: radius,
            },
            auto_clock_in: clock_in,
            auto_clock_out: clock_out,
            active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_enter_clocks_in() {
        let office = fence("Office", SITE_A, 100.0, true, true);
        let fences = [office.clone()];
        let eval = evaluate(&HashMap::new(), &fences, SITE_A);

        let outcome = decide(&eval, &fences, true, false);
        assert_eq!(
            outcome.attendance,
            Some(AttendanceAction::ClockIn {
                geofence_id: office.id
            })
        );
        assert_eq!(outcome.actions, [GeoEventAction::ClockIn]);
    }

    #[test]
    fn test_enter_with_open_record_does_nothing() {
        let fences = [fence("Office", SITE_A, 100.0, true, true)];
        let eval = evaluate(&HashMap::new(), &fences, SITE_A);

        let outcome = decide(&eval, &fences, true, true);
        assert_eq!(outcome.attendance, None);
        assert_eq!(outcome.actions, [GeoEventAction::None]);
    }

    #[test]
    fn test_disabled_org_flag_does_nothing() {
        let fences = [fence("Office", SITE_A, 100.0, true, true)];
        let eval = evaluate(&HashMap::new(), &fences, SITE_A);

        let outcome = decide(&eval, &fences, false, false);
        assert_eq!(outcome.attendance, None);
        assert_eq!(outcome.actions, [GeoEventAction::None]);
    }

    #[test]
    fn test_fence_without_auto_clock_in_does_nothing() {
        let fences = [fence("Parking", SITE_A, 100.0, false, true)];
        let eval = evaluate(&HashMap::new(), &fences, SITE_A);
        assert_eq!(decide(&eval, &fences, true, false).attendance, None);
    }

    #[test]
    fn test_only_first_enter_clocks_in() {
        let a = fence("A", SITE_A, 2_000.0, true, false);
        let b = fence("B", SITE_A, 2_000.0, true, false);
        let fences = [b.clone(), a.clone()];
        let eval = evaluate(&HashMap::new(), &fences, SITE_A);

        let outcome = decide(&eval, &fences, true, false);
        assert_eq!(
            outcome.attendance,
            Some(AttendanceAction::ClockIn { geofence_id: a.id })
        );
        assert_eq!(outcome.actions, [GeoEventAction::ClockIn, GeoEventAction::None]);
    }

    #[test]
    fn test_exit_clocks_out() {
        let office = fence("Office", SITE_A, 100.0, true, true);
        let fences = [office.clone()];
        let mut state = HashMap::new();
        let arrived = evaluate(&state, &fences, SITE_A);
        apply_states(&mut state, &arrived);

        let eval = evaluate(&state, &fences, HOME);
        let outcome = decide(&eval, &fences, true, true);
        assert_eq!(
            outcome.attendance,
            Some(AttendanceAction::ClockOut {
                geofence_id: office.id
            })
        );
        assert_eq!(outcome.actions, [GeoEventAction::ClockOut]);
    }

    #[test]
    fn test_exit_without_open_record_does_nothing() {
        let fences = [fence("Office", SITE_A, 100.0, true, true)];
        let state = HashMap::from([(fences[0].id, true)]);
        let eval = evaluate(&state, &fences, HOME);
        assert_eq!(decide(&eval, &fences, true, false).attendance, None);
    }

    #[test]
    fn test_exit_while_inside_other_clock_out_fence_keeps_record_open() {
        // Small office inside a large campus; both clock out.
        let office = fence("Office", SITE_A, 50.0, true, true);
        let campus = fence("Campus", SITE_A, 3_000.0, true, true);
        let fences = [office.clone(), campus.clone()];
        let state = HashMap::from([(office.id, true), (campus.id, true)]);

        let eval = evaluate(&state, &fences, SITE_B);
        assert_eq!(eval.transitions.len(), 1);
        let outcome = decide(&eval, &fences, true, true);
        assert_eq!(outcome.attendance, None);

        // Leaving the campus too closes the record.
        let mut state = state;
        apply_states(&mut state, &eval);
        let eval = evaluate(&state, &fences, HOME);
        let outcome = decide(&eval, &fences, true, true);
        assert_eq!(
            outcome.attendance,
            Some(AttendanceAction::ClockOut {
                geofence_id: campus.id
            })
        );
    }

    #[test]
    fn test_moving_between_sites_clocks_out_only_once() {
        let a = fence("A", SITE_A, 100.0, true, true);
        let b = fence("B", SITE_B, 100.0, true, true);
        let fences = [a.clone(), b.clone()];
        let state = HashMap::from([(a.id, true), (b.id, false)]);

        let eval = evaluate(&state, &fences, SITE_B);
        // B is a clock-out fence the user is now inside, so the exit from A
        // keeps the record open and the enter into B finds it open.
        let outcome = decide(&eval, &fences, true, true);
        assert_eq!(outcome.attendance, None);
        assert_eq!(outcome.actions, [GeoEventAction::None, GeoEventAction::None]);
    }

    #[test]
    fn test_clock_in_before_last_clock_out_is_dropped() {
        let fences = [fence("Office", SITE_A, 100.0, true, true)];
        let eval = evaluate(&HashMap::new(), &fences, SITE_A);
        let mut outcome = decide(&eval, &fences, true, false);

        let closed = Utc::now();
        drop_stale_clock_in(&mut outcome, closed - Duration::hours(1), Some(closed));
        assert_eq!(outcome.attendance, None);
        assert_eq!(outcome.actions, [GeoEventAction::None]);
    }

    #[test]
    fn test_clock_in_after_last_clock_out_is_kept() {
        let office = fence("Office", SITE_A, 100.0, true, true);
        let fences = [office.clone()];
        let eval = evaluate(&HashMap::new(), &fences, SITE_A);
        let mut outcome = decide(&eval, &fences, true, false);

        let closed = Utc::now() - Duration::hours(2);
        drop_stale_clock_in(&mut outcome, closed + Duration::minutes(5), Some(closed));
        drop_stale_clock_in(&mut outcome, closed - Duration::minutes(5), None);
        assert_eq!(
            outcome.attendance,
            Some(AttendanceAction::ClockIn {
                geofence_id: office.id
            })
        );
    }

    #[test]
    fn test_stale_point_still_clocks_out() {
        let fences = [fence("Office", SITE_A, 100.0, true, true)];
        let state = HashMap::from([(fences[0].id, true)]);
        let eval = evaluate(&state, &fences, HOME);
        let mut outcome = decide(&eval, &fences, true, true);

        let closed = Utc::now();
        drop_stale_clock_in(&mut outcome, closed - Duration::days(1), Some(closed));
        assert_eq!(outcome.actions, [GeoEventAction::ClockOut]);
    }
}
