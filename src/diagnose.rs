//! Guessing what went wrong when a step is invalid.

use crate::{config::Config, solution::SolutionSet};
use std::fmt::{self, Display, Formatter};

/// How far off the student was.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Offset {
    Integer(i64),
    Decimal(f64),
}

impl Offset {
    /// Decimal offsets are shown to two places.
    const SMALLEST_DECIMAL: f64 = 0.005;

    /// The offset for a distance, or `None` when it's too small to show.
    fn new(distance: f64) -> Option<Offset> {
        let rounded = distance.round();

        if (distance - rounded).abs() < 1e-9 && rounded.abs() < i64::MAX as f64 {
            Some(Offset::Integer(rounded as i64))
        } else if distance.abs() >= Offset::SMALLEST_DECIMAL {
            Some(Offset::Decimal(distance))
        } else {
            None
        }
    }
}

impl Display for Offset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Integer(n) => write!(f, "{}", n),
            Offset::Decimal(d) => write!(f, "{:.2}", d),
        }
    }
}

/// A nudge in the right direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Hint {
    SignFlip,
    OffBy(Offset),
    FlippedFraction,
    LogicError,
    /// The answer is right, but there's still arithmetic left to do.
    PerformArithmetic,
}

impl Display for Hint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Hint::SignFlip => write!(f, "Check your sign."),
            Hint::OffBy(offset) => write!(f, "You are off by {}.", offset),
            Hint::FlippedFraction => write!(f, "Did you flip the fraction?"),
            Hint::LogicError => write!(f, "Logic error."),
            Hint::PerformArithmetic => write!(f, "Perform the arithmetic."),
        }
    }
}

/// Compare the first real value of each set and guess at the mistake.
///
/// This never fails. Anything that can't be compared gets the generic
/// [`Hint::LogicError`].
pub fn diagnose(correct: &SolutionSet, student: &SolutionSet, config: &Config) -> Hint {
    let (expected, got) = match (correct.first_real_value(), student.first_real_value())
    {
        (Some(expected), Some(got)) => (expected, got),
        _ => return Hint::LogicError,
    };

    let tolerance = config.tolerance;
    let distance = (got - expected).abs();

    if distance > tolerance && (got.abs() - expected.abs()).abs() <= tolerance {
        return Hint::SignFlip;
    }

    if distance > tolerance && distance <= config.hint_offset_limit {
        if let Some(offset) = Offset::new(distance) {
            return Hint::OffBy(offset);
        }
    }

    if expected.abs() > tolerance && (got - expected.recip()).abs() <= tolerance {
        return Hint::FlippedFraction;
    }

    Hint::LogicError
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algebra::Number,
        equations::Equation,
        solution::{Bound, FiniteSet, Interval, Region, Relation, Value},
    };

    fn value(n: Number) -> SolutionSet {
        SolutionSet::Finite(FiniteSet::values_only(vec![Value::Scalar(n)]))
    }

    fn hint(expected: Number, got: Number) -> Hint {
        diagnose(&value(expected), &value(got), &Config::default())
    }

    #[test]
    fn sign_flips() {
        assert_eq!(hint(Number::integer(4), Number::integer(-4)), Hint::SignFlip);
    }

    #[test]
    fn small_offsets() {
        assert_eq!(
            hint(Number::integer(6), Number::integer(4)),
            Hint::OffBy(Offset::Integer(2))
        );
        assert_eq!(
            hint(Number::integer(6), Number::integer(4)).to_string(),
            "You are off by 2."
        );
        assert_eq!(
            hint(Number::integer(1), Number::float(1.25)).to_string(),
            "You are off by 0.25."
        );
    }

    #[test]
    fn flipped_fractions() {
        assert_eq!(
            hint(Number::fraction(1, 20), Number::integer(20)),
            Hint::FlippedFraction
        );
    }

    #[test]
    fn everything_else_is_a_logic_error() {
        assert_eq!(hint(Number::integer(3), Number::integer(100)), Hint::LogicError);
    }

    #[test]
    fn tiny_offsets_arent_reported_as_zero() {
        let pi = std::f64::consts::PI;

        let got = hint(Number::float(pi), Number::float(3.14159));

        assert_eq!(got, Hint::LogicError);
        assert_eq!(
            hint(Number::float(pi), Number::float(3.0)).to_string(),
            "You are off by 0.14."
        );
    }

    #[test]
    fn a_correct_value_of_zero_doesnt_divide_by_zero() {
        assert_eq!(hint(Number::zero(), Number::integer(20)), Hint::LogicError);
        assert_eq!(
            hint(Number::zero(), Number::integer(3)),
            Hint::OffBy(Offset::Integer(3))
        );
    }

    #[test]
    fn relations_have_no_value_to_compare() {
        let relation = SolutionSet::Relation(Relation::Equation(
            "y = sin(x)".parse::<Equation>().unwrap(),
        ));

        let got = diagnose(&relation, &value(Number::integer(1)), &Config::default());

        assert_eq!(got, Hint::LogicError);
        let got = diagnose(&value(Number::integer(1)), &relation, &Config::default());
        assert_eq!(got, Hint::LogicError);
    }

    #[test]
    fn regions_use_their_first_bound() {
        // x <= 3
        let region = SolutionSet::Region(Region::new(vec![Interval::new(
            Bound::Unbounded,
            Bound::Closed(Number::integer(3)),
        )]));

        let got = diagnose(&region, &value(Number::integer(5)), &Config::default());

        assert_eq!(got, Hint::OffBy(Offset::Integer(2)));
    }

    #[test]
    fn unbounded_regions_get_the_generic_hint() {
        let everything = SolutionSet::Region(Region::everything());

        let got = diagnose(&everything, &value(Number::integer(5)), &Config::default());

        assert_eq!(got, Hint::LogicError);
    }

    #[test]
    fn complex_values_get_the_generic_hint() {
        let got = hint(Number::imaginary_unit(), Number::integer(1));

        assert_eq!(got, Hint::LogicError);
    }

    #[test]
    fn the_offset_limit_is_configurable() {
        let config = Config::default().with_hint_offset_limit(100.0);

        let got = diagnose(
            &value(Number::integer(3)),
            &value(Number::integer(50)),
            &config,
        );

        assert_eq!(got, Hint::OffBy(Offset::Integer(47)));
    }
}
