//! Derives enter/exit transitions from a user's geofence membership.

use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use crate::models::geo_event::GeoEventType;
use crate::models::geofence::Geofence;
use crate::services::geometry::GeoPoint;

/// A crossing detected for one geofence.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub geofence_id: Uuid,
    pub geofence_name: String,
    pub event_type: GeoEventType,
}

/// Membership of one geofence after evaluating a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipState {
    pub geofence_id: Uuid,
    pub inside: bool,
}

/// Result of evaluating a point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// New membership for every evaluated geofence.
    pub states: Vec<MembershipState>,
    /// Exits first, then enters; ties broken by geofence name.
    pub transitions: Vec<Transition>,
}

impl Evaluation {
    pub fn is_inside(&self, geofence_id: Uuid) -> bool {
        self.states
            .iter()
            .any(|s| s.geofence_id == geofence_id && s.inside)
    }
}

/// Evaluates `point` against the active, non-deleted geofences.
///
/// `previous` maps geofence id to the last recorded membership. A geofence
/// with no recorded membership emits `enter` when the point is inside and
/// nothing when it is outside. Stored state for geofences that are not
/// evaluated is ignored.
pub fn evaluate(
    previous: &HashMap<Uuid, bool>,
    geofences: &[Geofence],
    point: GeoPoint,
) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for geofence in geofences.iter().filter(|g| g.is_evaluable()) {
        let inside_now = geofence.contains(point);

        let event_type = match (previous.get(&geofence.id).copied(), inside_now) {
            (None, true) | (Some(false), true) => Some(GeoEventType::Enter),
            (Some(true), false) => Some(GeoEventType::Exit),
            _ => None,
        };

        evaluation.states.push(MembershipState {
            geofence_id: geofence.id,
            inside: inside_now,
        });

        if let Some(event_type) = event_type {
            evaluation.transitions.push(Transition {
                geofence_id: geofence.id,
                geofence_name: geofence.name.clone(),
                event_type,
            });
        }
    }

    evaluation.transitions.sort_by(transition_order);
    evaluation
}

fn transition_order(a: &Transition, b: &Transition) -> Ordering {
    let rank = |t: &Transition| match t.event_type {
        GeoEventType::Exit => 0,
        GeoEventType::Enter => 1,
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.geofence_name.cmp(&b.geofence_name))
        .then_with(|| a.geofence_id.cmp(&b.geofence_id))
}

/// Folds an evaluation's states into the membership map for the next point.
pub fn apply_states(previous: &mut HashMap<Uuid, bool>, evaluation: &Evaluation) {
    for state in &evaluation.states {
        previous.insert(state.geofence_id, state.inside);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geofence::GeofenceShape;
    use chrono::Utc;

    const CENTER: GeoPoint = GeoPoint {
        latitude: 48.1486,
        longitude: 17.1077,
    };
    // About 11 m north of CENTER.
    const NEAR: GeoPoint = GeoPoint {
        latitude: 48.1487,
        longitude: 17.1077,
    };
    // About 1.1 km north of CENTER.
    const FAR: GeoPoint = GeoPoint {
        latitude: 48.1586,
        longitude: 17.1077,
    };

    fn circle(name: &str, radius: f64) -> Geofence {
        Geofence {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            shape: GeofenceShape::Circle {
                center: CENTER,
                radius_meters: radius,
            },
            auto_clock_in: false,
            auto_clock_out: false,
            active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_outside_everything_with_no_state_emits_nothing() {
        let fences = [circle("Office", 100.0)];
        let result = evaluate(&HashMap::new(), &fences, FAR);
        assert!(result.transitions.is_empty());
        assert_eq!(
            result.states,
            [MembershipState {
                geofence_id: fences[0].id,
                inside: false
            }]
        );
    }

    #[test]
    fn test_first_observation_inside_is_enter() {
        let fences = [circle("Office", 100.0)];
        let result = evaluate(&HashMap::new(), &fences, NEAR);
        assert_eq!(result.transitions.len(), 1);
        assert_eq!(result.transitions[0].event_type, GeoEventType::Enter);
        assert!(result.is_inside(fences[0].id));
    }

    #[test]
    fn test_enter_then_exit_sequence() {
        let fences = [circle("Office", 100.0)];
        let mut state = HashMap::new();

        let first = evaluate(&state, &fences, NEAR);
        assert_eq!(first.transitions[0].event_type, GeoEventType::Enter);
        apply_states(&mut state, &first);

        let still_inside = evaluate(&state, &fences, CENTER);
        assert!(still_inside.transitions.is_empty());
        apply_states(&mut state, &still_inside);

        let left = evaluate(&state, &fences, FAR);
        assert_eq!(left.transitions.len(), 1);
        assert_eq!(left.transitions[0].event_type, GeoEventType::Exit);
        apply_states(&mut state, &left);

        let still_outside = evaluate(&state, &fences, FAR);
        assert!(still_outside.transitions.is_empty());
    }

    #[test]
    fn test_previous_outside_now_inside_is_enter() {
        let fences = [circle("Office", 100.0)];
        let state = HashMap::from([(fences[0].id, false)]);
        let result = evaluate(&state, &fences, NEAR);
        assert_eq!(result.transitions[0].event_type, GeoEventType::Enter);
    }

    #[test]
    fn test_inactive_and_deleted_are_skipped() {
        let mut inactive = circle("Inactive", 100.0);
        inactive.active = false;
        let mut deleted = circle("Deleted", 100.0);
        deleted.deleted_at = Some(Utc::now());

        // Stored "inside" state for an inactive fence must not produce an exit.
        let state = HashMap::from([(inactive.id, true)]);
        let result = evaluate(&state, &[inactive, deleted], FAR);
        assert!(result.transitions.is_empty());
        assert!(result.states.is_empty());
    }

    #[test]
    fn test_exits_ordered_before_enters_then_by_name() {
        // FAR lies outside the inner circles and inside the outer ones.
        let inner_b = circle("B inner", 50.0);
        let inner_a = circle("A inner", 50.0);
        let outer_z = circle("Z outer", 5_000.0);
        let outer_c = circle("C outer", 5_000.0);

        let state = HashMap::from([
            (inner_a.id, true),
            (inner_b.id, true),
            (outer_z.id, false),
            (outer_c.id, false),
        ]);
        let fences = [outer_z, inner_b, outer_c, inner_a];
        let result = evaluate(&state, &fences, FAR);

        let order: Vec<(&str, GeoEventType)> = result
            .transitions
            .iter()
            .map(|t| (t.geofence_name.as_str(), t.event_type))
            .collect();
        assert_eq!(
            order,
            [
                ("A inner", GeoEventType::Exit),
                ("B inner", GeoEventType::Exit),
                ("C outer", GeoEventType::Enter),
                ("Z outer", GeoEventType::Enter),
            ]
        );
    }

    #[test]
    fn test_polygon_boundary_counts_as_inside() {
        let mut fence = circle("Yard", 100.0);
        fence.shape = GeofenceShape::Polygon {
            vertices: vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 0.01),
                GeoPoint::new(0.01, 0.01),
                GeoPoint::new(0.01, 0.0),
            ],
        };
        let on_edge = GeoPoint::new(0.005, 0.0);
        let result = evaluate(&HashMap::new(), &[fence], on_edge);
        assert_eq!(result.transitions.len(), 1);
        assert_eq!(result.transitions[0].event_type, GeoEventType::Enter);
    }
}
