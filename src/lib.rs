//! A checker for algebra homework.
//!
//! Given the line a student started from and the line they wrote next, work
//! out the set of values each line describes and decide whether the step was
//! valid.
//!
//! ```rust
//! use step_checker::Verdict;
//!
//! let report = step_checker::check_step("x^2 = 16", "x = 4, -4");
//! assert_eq!(report.verdict, Verdict::Valid);
//!
//! let report = step_checker::check_step("x^2 = 16", "x = 4");
//! assert_eq!(report.verdict, Verdict::Partial);
//! ```
//!
//! The free functions all use the default [`Config`]. Use a [`Checker`] to
//! customise things.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algebra;
mod check;
mod config;
mod diagnose;
mod equations;
mod extract;
mod isolate;
mod judge;
mod normalize;
pub mod plot;
mod session;
mod solution;
mod solve;

pub use check::{Checker, Line, Report, Verdict};
pub use config::{Config, Conjunction};
pub use diagnose::{Hint, Offset};
pub use equations::{Equation, SystemOfEquations};
pub use extract::{extract, extract_statement, ExtractionError};
pub use judge::{Comparison, Match};
pub use normalize::{normalize, normalize_with};
pub use session::{History, Record, Session, DEFAULT_PREVIOUS_LINE};
pub use solution::{
    Bound, FiniteSet, Interval, Region, Relation, SolutionSet, Value,
    MAX_COMPONENTS,
};
pub use solve::{
    reduce_inequality, solve_system, Solution, SolveError, MAX_UNKNOWNS,
};

use crate::algebra::{ParseError, Statement};

/// Parse an already normalized line.
///
/// When `evaluate` is set, constant sub-expressions are folded (so
/// `x = 10 - 4` becomes `x = 6`).
pub fn parse(text: &str, evaluate: bool) -> Result<Statement, ParseError> {
    Checker::new(Config::default()).parse(text, evaluate)
}

/// Render a raw line as LaTeX, if it can be parsed.
pub fn render_display(raw: &str) -> Option<String> {
    Checker::new(Config::default()).render_display(raw)
}

/// Work out which values satisfy a raw line of input.
pub fn extract_solution_set(raw: &str) -> Result<SolutionSet, ExtractionError> {
    Checker::new(Config::default()).extract_solution_set(raw)
}

/// Compare a student's solution set against the correct one.
pub fn compare(correct: &SolutionSet, student: &SolutionSet) -> Comparison {
    Checker::new(Config::default()).compare(correct, student)
}

/// Guess what went wrong with a student's answer.
pub fn diagnose(correct: &SolutionSet, student: &SolutionSet) -> Hint {
    Checker::new(Config::default()).diagnose(correct, student)
}

/// Check whether `current` follows from `previous`.
pub fn check_step(previous: &str, current: &str) -> Report {
    Checker::new(Config::default()).check_step(previous, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displayed_statements_parse_to_the_same_thing() {
        let inputs = [
            "2x + 4 = 12",
            "x**2 - 5x + 6 = 0",
            "(x + 1)(x - 1) = y",
            "x = ± 4",
            "3 ± 2i",
            "-x^2 <= 4",
            "1/(x - 2) > 0",
            "sqrt(2) * x = pi",
            "(4, 4)",
            "4, -4",
            "x = 2^3^2",
            "1 - (2 - 3)",
        ];

        for src in inputs.iter().copied() {
            let original = parse(&normalize(src), false).unwrap();
            let displayed = original.to_string();
            let round_tripped = parse(&displayed, false).unwrap();

            assert_eq!(round_tripped, original, "{} => {}", src, displayed);
        }
    }

    #[test]
    fn the_worked_examples() {
        let cases = [
            ("x^2 = 16", "x = 4", Verdict::Partial),
            ("x^2 = 16", "x = +/- 4", Verdict::Valid),
            ("2x = 3", "x = 1.5", Verdict::Valid),
            ("2x + 3y = 20 ; x + y = 8", "x=4,y=4", Verdict::Valid),
            ("x + 4 = 10", "x = 10 - 4", Verdict::Unsimplified),
            ("5% of 30 = x", "x = 1.5", Verdict::Valid),
            ("900 + 1,000 = x", "x = 1900", Verdict::Valid),
        ];

        for (previous, current, should_be) in cases.iter().cloned() {
            let got = check_step(previous, current);

            assert_eq!(got.verdict, should_be, "{} => {}", previous, current);
        }
    }

    #[test]
    fn solution_sets_of_raw_lines() {
        let got = extract_solution_set("x^2 + 4 = 0").unwrap();
        let expected = extract_solution_set("x = 2i, -2i").unwrap();

        assert!(compare(&expected, &got).is_valid());
        assert!(plot::curves("x^2 + 4 = 0").unwrap().is_empty());
    }

    #[test]
    fn free_functions_use_the_default_config() {
        let correct = extract_solution_set("x = 6").unwrap();
        let student = extract_solution_set("x = 4").unwrap();

        assert_eq!(compare(&correct, &student), Comparison::Invalid);
        assert_eq!(diagnose(&correct, &student), Hint::OffBy(Offset::Integer(2)));
        assert!(render_display("x = 6").is_some());
    }
}
