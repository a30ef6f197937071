//! Deciding whether two solution sets are the same.

use crate::solution::{FiniteSet, SolutionSet};
use std::fmt::{self, Display, Formatter};

/// How two equivalent sets were found to match.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Match {
    /// The sets are identical.
    Exact,
    /// The sets only agree to within some tolerance (e.g. `3/2` and `1.5`).
    Numeric,
}

/// The outcome of comparing a student's solution set against the correct one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Comparison {
    Valid(Match),
    /// The student found some, but not all, of the solutions.
    Partial,
    Invalid,
}

impl Comparison {
    pub fn is_valid(self) -> bool { matches!(self, Comparison::Valid(_)) }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Valid(Match::Exact) => write!(f, "valid"),
            Comparison::Valid(Match::Numeric) => write!(f, "valid (numerically)"),
            Comparison::Partial => write!(f, "partial"),
            Comparison::Invalid => write!(f, "invalid"),
        }
    }
}

/// Compare the `student`'s solution set against the `correct` one, treating
/// numbers within `tolerance` of each other as equal.
pub fn compare(
    correct: &SolutionSet,
    student: &SolutionSet,
    tolerance: f64,
) -> Comparison {
    let comparison = if correct == student {
        Comparison::Valid(Match::Exact)
    } else if numerically_equal(correct, student, tolerance) {
        Comparison::Valid(Match::Numeric)
    } else if is_partial(correct, student, tolerance) {
        Comparison::Partial
    } else {
        Comparison::Invalid
    };

    log::debug!("Comparing {} against {}: {}", student, correct, comparison);

    comparison
}

fn numerically_equal(a: &SolutionSet, b: &SolutionSet, tolerance: f64) -> bool {
    match (a, b) {
        (SolutionSet::Region(a), SolutionSet::Region(b)) => a.approx_eq(b, tolerance),
        (SolutionSet::Relation(a), SolutionSet::Relation(b)) => {
            a.approx_eq(b, tolerance)
        },
        _ => match (a.as_comparable_finite(), b.as_comparable_finite()) {
            (Some(a), Some(b)) => {
                a.len() == b.len() && contained_in(&b, &a, tolerance)
            },
            _ => false,
        },
    }
}

/// Is a non-empty `student` set a subset of the `correct` one?
fn is_partial(correct: &SolutionSet, student: &SolutionSet, tolerance: f64) -> bool {
    match (correct.as_finite(), student.as_comparable_finite()) {
        (Some(correct), Some(student)) => {
            !student.is_empty() && contained_in(&student, correct, tolerance)
        },
        _ => false,
    }
}

/// Does every value in `inner` have a counterpart in `outer`?
fn contained_in(inner: &FiniteSet, outer: &FiniteSet, tolerance: f64) -> bool {
    inner.variables_compatible_with(outer)
        && inner.values().iter().all(|value| {
            outer
                .values()
                .iter()
                .any(|candidate| candidate.approx_eq(value, tolerance))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algebra::{Number, Parameter},
        solution::{Bound, Interval, Region, Value},
    };

    const TOLERANCE: f64 = 1e-9;

    fn x() -> Parameter { Parameter::named("x") }

    fn set(values: &[Number]) -> SolutionSet {
        SolutionSet::Finite(FiniteSet::new(
            vec![x()],
            values.iter().cloned().map(Value::Scalar).collect(),
        ))
    }

    fn ints(values: &[i64]) -> SolutionSet {
        set(&values.iter().copied().map(Number::integer).collect::<Vec<_>>())
    }

    #[test]
    fn identical_sets_are_an_exact_match() {
        let got = compare(&ints(&[4, -4]), &ints(&[-4, 4]), TOLERANCE);

        assert_eq!(got, Comparison::Valid(Match::Exact));
    }

    #[test]
    fn fractions_and_decimals_match_numerically() {
        let correct = set(&[Number::fraction(3, 2)]);
        let student = set(&[Number::float(1.5)]);

        assert_eq!(
            compare(&correct, &student, TOLERANCE),
            Comparison::Valid(Match::Numeric)
        );
    }

    #[test]
    fn different_sizes_never_match_numerically() {
        let correct = set(&[Number::integer(1), Number::integer(2)]);
        let student = set(&[Number::float(1.0)]);

        assert_eq!(compare(&correct, &student, TOLERANCE), Comparison::Partial);
    }

    #[test]
    fn some_of_the_solutions_is_partial() {
        assert_eq!(
            compare(&ints(&[4, -4]), &ints(&[4]), TOLERANCE),
            Comparison::Partial
        );
    }

    #[test]
    fn an_empty_answer_is_not_partial() {
        assert_eq!(
            compare(&ints(&[4, -4]), &ints(&[]), TOLERANCE),
            Comparison::Invalid
        );
    }

    #[test]
    fn wrong_answers_are_invalid() {
        assert_eq!(compare(&ints(&[6]), &ints(&[5]), TOLERANCE), Comparison::Invalid);
        assert_eq!(
            compare(&ints(&[4]), &ints(&[4, 5]), TOLERANCE),
            Comparison::Invalid
        );
    }

    #[test]
    fn regions_compare_bound_by_bound() {
        let exact = SolutionSet::Region(Region::new(vec![Interval::new(
            Bound::Open(Number::fraction(1, 3)),
            Bound::Unbounded,
        )]));
        let approximate = SolutionSet::Region(Region::new(vec![Interval::new(
            Bound::Open(Number::float(1.0 / 3.0)),
            Bound::Unbounded,
        )]));

        assert_eq!(
            compare(&exact, &approximate, TOLERANCE),
            Comparison::Valid(Match::Numeric)
        );
    }

    #[test]
    fn a_region_of_points_matches_a_finite_set() {
        let region = SolutionSet::Region(Region::new(vec![Interval::point(
            Number::float(2.0),
        )]));

        assert_eq!(
            compare(&ints(&[2]), &region, TOLERANCE),
            Comparison::Valid(Match::Numeric)
        );
    }
}
