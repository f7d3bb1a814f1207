//! Resume-range composition
//!
//! Merges the user's filter with the condition that restarts a scan just
//! past the last checkpoint. A constraint the user already placed on the
//! iteration field is kept: it moves into the `$and` group next to the
//! resume condition, so neither overwrites the other and the query stays
//! ranged on the iteration field.

use serde_json::Value;

use super::ast::{Constraint, Filter, FilterOp};
use crate::config::Direction;

/// Builds the effective filter of a run
pub struct RangeComposer;

impl RangeComposer {
    /// Condition selecting documents strictly after `resume` in iteration order
    pub fn resume_condition(direction: Direction, resume: Value) -> FilterOp {
        match direction {
            Direction::Ascending => FilterOp::Gt(resume),
            Direction::Descending => FilterOp::Lt(resume),
        }
    }

    /// Returns `base` restricted to documents past `resume`.
    ///
    /// With no resume value the filter is returned unchanged.
    pub fn compose(
        base: &Filter,
        field: &str,
        direction: Direction,
        resume: Option<&Value>,
    ) -> Filter {
        let Some(resume) = resume else {
            return base.clone();
        };

        let condition = Constraint::Ops(vec![Self::resume_condition(direction, resume.clone())]);
        let mut effective = base.clone();

        match effective.take_constraint(field) {
            Some(existing) => {
                effective.push_and(Filter::all().with_constraint(field, existing));
                effective.push_and(Filter::all().with_constraint(field, condition));
            }
            None => effective.set_constraint(field, condition),
        }

        effective
    }
}
