//! Evaluation of a single constraint against one host.

use berth_state::{Constraint, ConstraintPredicate, HostAttributes};

use crate::aggregate::AttributeAggregate;
use crate::veto::Veto;

/// Wildcard value accepted by value constraints: matches any host that
/// carries the attribute at all.
const WILDCARD: &str = "*";

/// Evaluates one constraint, returning a veto if it is not satisfied.
pub fn constraint_veto(
    constraint: &Constraint,
    job_state: &AttributeAggregate,
    host: &HostAttributes,
) -> Option<Veto> {
    let attribute = host.attribute(&constraint.name);

    match &constraint.predicate {
        ConstraintPredicate::Value { negated, values } => {
            // A host without the attribute has an empty value set.
            let matched = attribute.is_some_and(|attr| {
                values.contains(WILDCARD) || values.iter().any(|v| attr.values.contains(v))
            });
            if matched != *negated {
                None
            } else {
                Some(Veto::constraint_mismatch(&constraint.name))
            }
        }
        ConstraintPredicate::Limit { limit } => {
            // Without the attribute the limit cannot be verified; reject.
            let Some(attr) = attribute else {
                return Some(Veto::limit_not_satisfied(&constraint.name));
            };
            let exceeded = attr
                .values
                .iter()
                .any(|value| job_state.count(&constraint.name, value) >= u64::from(*limit));
            if exceeded {
                Some(Veto::limit_not_satisfied(&constraint.name))
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_state::{Attribute, MaintenanceMode};

    fn host_with(name: &str, values: &[&str]) -> HostAttributes {
        HostAttributes::new("host-1", MaintenanceMode::None)
            .with_attribute(Attribute::new(name, values.iter().copied()))
    }

    #[test]
    fn value_constraint_matches_intersecting_value() {
        let host = host_with("rack", &["r1"]);
        let constraint = Constraint::value("rack", ["r1", "r2"]);

        assert!(constraint_veto(&constraint, &AttributeAggregate::empty(), &host).is_none());
    }

    #[test]
    fn value_constraint_vetoes_disjoint_values() {
        let host = host_with("rack", &["r3"]);
        let constraint = Constraint::value("rack", ["r1", "r2"]);

        let veto = constraint_veto(&constraint, &AttributeAggregate::empty(), &host);
        assert_eq!(veto, Some(Veto::constraint_mismatch("rack")));
    }

    #[test]
    fn value_constraint_vetoes_missing_attribute() {
        let host = HostAttributes::new("host-1", MaintenanceMode::None);
        let constraint = Constraint::value("rack", ["r1"]);

        assert!(constraint_veto(&constraint, &AttributeAggregate::empty(), &host).is_some());
    }

    #[test]
    fn negated_value_constraint_inverts() {
        let host = host_with("rack", &["r1"]);
        let mut constraint = Constraint::value("rack", ["r1"]);
        if let ConstraintPredicate::Value { negated, .. } = &mut constraint.predicate {
            *negated = true;
        }

        assert!(constraint_veto(&constraint, &AttributeAggregate::empty(), &host).is_some());

        let other_host = host_with("rack", &["r2"]);
        assert!(constraint_veto(&constraint, &AttributeAggregate::empty(), &other_host).is_none());
    }

    #[test]
    fn wildcard_matches_any_present_attribute() {
        let host = host_with("dedicated", &["web/api"]);
        let constraint = Constraint::value("dedicated", ["*"]);

        assert!(constraint_veto(&constraint, &AttributeAggregate::empty(), &host).is_none());
    }

    #[test]
    fn wildcard_does_not_match_missing_attribute() {
        let host = HostAttributes::new("host-1", MaintenanceMode::None);
        let constraint = Constraint::value("dedicated", ["*"]);

        assert!(constraint_veto(&constraint, &AttributeAggregate::empty(), &host).is_some());
    }

    #[test]
    fn limit_constraint_allows_below_limit() {
        let host = host_with("rack", &["r1"]);
        let constraint = Constraint::limit("rack", 2);
        let state =
            AttributeAggregate::from_pairs(vec![("rack".to_string(), "r1".to_string())]);

        assert!(constraint_veto(&constraint, &state, &host).is_none());
    }

    #[test]
    fn limit_constraint_vetoes_at_limit() {
        let host = host_with("rack", &["r1"]);
        let constraint = Constraint::limit("rack", 1);
        let state =
            AttributeAggregate::from_pairs(vec![("rack".to_string(), "r1".to_string())]);

        let veto = constraint_veto(&constraint, &state, &host);
        assert_eq!(veto, Some(Veto::limit_not_satisfied("rack")));
    }

    #[test]
    fn limit_constraint_vetoes_missing_attribute() {
        let host = HostAttributes::new("host-1", MaintenanceMode::None);
        let constraint = Constraint::limit("rack", 5);

        assert!(constraint_veto(&constraint, &AttributeAggregate::empty(), &host).is_some());
    }
}
