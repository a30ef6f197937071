//! Checking one line of working against the line before it.

use crate::{
    algebra::{
        ops::{Builtins, Context},
        parse_statement, to_latex, BinaryOperation, Constant, Expression,
        Number, ParseError, Statement,
    },
    config::Config,
    diagnose::{self, Hint},
    extract::{self, split_clauses, ExtractionError},
    judge::{self, Comparison},
    normalize::normalize_with,
    plot::{self, Curve},
    solution::SolutionSet,
};
use num_integer::Integer;
use num_traits::{One, Signed};
use std::{
    any::Any,
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    panic::{self, AssertUnwindSafe},
};

/// Which of the two lines a problem was found in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Line {
    /// The line being transformed ("Line A").
    Previous,
    /// The student's new line ("Line B").
    Current,
}

/// The overall judgement of a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid,
    /// The step is correct, but the arithmetic hasn't been finished.
    Unsimplified,
    /// Only some of the solutions were kept.
    Partial,
    Invalid,
    /// One of the lines is blank.
    Empty,
    /// We couldn't work out a solution set for one of the lines.
    ParseError(Line),
    /// Something unexpected went wrong while checking.
    SyntaxError(String),
}

impl Verdict {
    /// Should the student be allowed to move on to the next step?
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Valid | Verdict::Unsimplified | Verdict::Partial)
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => write!(f, "Valid"),
            Verdict::Unsimplified => write!(f, "Unsimplified"),
            Verdict::Partial => write!(f, "Partial"),
            Verdict::Invalid => write!(f, "Invalid"),
            Verdict::Empty => write!(f, "Empty"),
            Verdict::ParseError(Line::Previous) => write!(f, "Could not solve Line A"),
            Verdict::ParseError(Line::Current) => write!(f, "Could not parse Line B"),
            Verdict::SyntaxError(message) => write!(f, "Syntax Error: {}", message),
        }
    }
}

/// Everything we found out while checking a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub verdict: Verdict,
    pub hint: Option<Hint>,
    /// Extra information for debugging (e.g. the raw solution sets).
    pub diagnostics: BTreeMap<String, String>,
}

impl Report {
    pub const RAW_SET_A: &'static str = "Raw Set A";
    pub const RAW_SET_B: &'static str = "Raw Set B";

    pub fn new(verdict: Verdict) -> Self {
        Report {
            verdict,
            hint: None,
            diagnostics: BTreeMap::new(),
        }
    }

    pub fn with_hint(self, hint: Hint) -> Self {
        Report {
            hint: Some(hint),
            ..self
        }
    }
}

/// The main entrypoint, tying each stage of the pipeline together.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Checker<C = Builtins> {
    config: Config,
    ctx: C,
}

impl Checker<Builtins> {
    pub fn new(config: Config) -> Self { Checker::with_context(config, Builtins) }
}

impl<C: Context> Checker<C> {
    pub fn with_context(config: Config, ctx: C) -> Self { Checker { config, ctx } }

    pub fn config(&self) -> &Config { &self.config }

    pub fn context(&self) -> &C { &self.ctx }

    pub fn normalize(&self, raw: &str) -> String {
        normalize_with(raw, self.config.conjunction)
    }

    /// Parse a single (normalized) clause. When `evaluate` is set, constant
    /// sub-expressions are folded.
    pub fn parse(&self, text: &str, evaluate: bool) -> Result<Statement, ParseError> {
        let statement = parse_statement(text)?;

        if evaluate {
            Ok(statement.evaluated(&self.ctx))
        } else {
            Ok(statement)
        }
    }

    /// Render a line as LaTeX, exactly as it was written. Returns `None` if
    /// any clause doesn't parse (i.e. the student is still typing).
    pub fn render_display(&self, raw: &str) -> Option<String> {
        let normalized = self.normalize(raw);

        let rendered = normalized
            .split(';')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(|clause| self.render_clause(clause))
            .collect::<Option<Vec<_>>>()?;

        if rendered.is_empty() {
            None
        } else {
            Some(rendered.join(", \\quad "))
        }
    }

    fn render_clause(&self, clause: &str) -> Option<String> {
        if let Ok(statement) = self.parse(clause, false) {
            return Some(to_latex(&statement));
        }

        // things like "x = 4, -4" only make sense one side at a time
        let (left, right) = clause.split_once('=')?;
        let left = self.parse(left, false).ok()?;
        let right = self.parse(right, false).ok()?;

        Some(format!("{} = {}", to_latex(&left), to_latex(&right)))
    }

    pub fn extract_solution_set(
        &self,
        raw: &str,
    ) -> Result<SolutionSet, ExtractionError> {
        extract::extract(&self.normalize(raw), &self.ctx)
    }

    pub fn compare(&self, correct: &SolutionSet, student: &SolutionSet) -> Comparison {
        judge::compare(correct, student, self.config.tolerance)
    }

    pub fn diagnose(&self, correct: &SolutionSet, student: &SolutionSet) -> Hint {
        diagnose::diagnose(correct, student, &self.config)
    }

    /// The curves which could be used to graph a line.
    pub fn curves(&self, raw: &str) -> Result<Vec<Curve>, ExtractionError> {
        plot::curves_with(&self.normalize(raw), &self.ctx)
    }

    /// Check whether `current` follows from `previous`.
    ///
    /// This never panics. Anything unexpected is reported as
    /// [`Verdict::SyntaxError`].
    pub fn check_step(&self, previous: &str, current: &str) -> Report {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.check_step_unguarded(previous, current)
        }));

        match outcome {
            Ok(report) => report,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!(
                    "Checking \"{}\" => \"{}\" panicked: {}",
                    previous,
                    current,
                    message
                );
                Report::new(Verdict::SyntaxError(message))
            },
        }
    }

    fn check_step_unguarded(&self, previous: &str, current: &str) -> Report {
        if previous.trim().is_empty() || current.trim().is_empty() {
            return Report::new(Verdict::Empty);
        }

        let correct = self.extract_solution_set(previous);
        let student = self.extract_solution_set(current);

        let mut diagnostics = BTreeMap::new();
        diagnostics.insert(Report::RAW_SET_A.to_string(), describe(&correct));
        diagnostics.insert(Report::RAW_SET_B.to_string(), describe(&student));

        let verdict = |verdict| Report {
            verdict,
            hint: None,
            diagnostics: diagnostics.clone(),
        };

        let correct = match correct {
            Ok(set) => set,
            Err(e) => {
                log::debug!("Unable to solve \"{}\": {}", previous, e);
                return verdict(Verdict::ParseError(Line::Previous));
            },
        };
        let student = match student {
            Ok(set) => set,
            Err(e) => {
                log::debug!("Unable to solve \"{}\": {}", current, e);
                return verdict(Verdict::ParseError(Line::Current));
            },
        };

        match self.compare(&correct, &student) {
            Comparison::Valid(_) if !self.is_simplified(current, &correct) => {
                verdict(Verdict::Unsimplified).with_hint(Hint::PerformArithmetic)
            },
            Comparison::Valid(_) => verdict(Verdict::Valid),
            Comparison::Partial => verdict(Verdict::Partial),
            Comparison::Invalid => {
                let hint = self.diagnose(&correct, &student);
                verdict(Verdict::Invalid).with_hint(hint)
            },
        }
    }

    /// Has the student finished the arithmetic on the right-hand side?
    ///
    /// Only single equations (or bare values) in at most one unknown with a
    /// finite solution set are checked, everything else gets the benefit of
    /// the doubt.
    fn is_simplified(&self, raw: &str, correct: &SolutionSet) -> bool {
        match correct.as_finite() {
            Some(set) if set.variables().len() <= 1 => {},
            // systems are never checked
            _ => return true,
        }

        let normalized = self.normalize(raw);
        let statement = match split_clauses(&normalized).as_slice() {
            [clause] => match self.parse(clause, false) {
                Ok(statement) => statement,
                Err(_) => return true,
            },
            _ => return true,
        };

        if statement.unknowns().len() > 1 {
            return true;
        }

        match statement {
            Statement::Equation(equation) => is_simplified_value(&equation.right),
            // a bare expression means "expr = 0"
            Statement::Expression(expr) if expr.unknowns().is_empty() => {
                is_simplified_value(&expr)
            },
            _ => true,
        }
    }
}

/// Is this expression already as simple as it gets?
///
/// Numbers, variables, reduced fractions, resolved complex numbers (`3I`,
/// `2 - 3I`) and square roots of non-square integers all count, as does `±`
/// or a coordinate made from them.
fn is_simplified_value(expr: &Expression) -> bool {
    match expr {
        Expression::Number(_) | Expression::Parameter(_) | Expression::Constant(_) => {
            true
        },
        Expression::Negate(inner) => {
            matches!(**inner, Expression::Number(_) | Expression::Constant(_))
                || is_reduced_fraction(inner)
                || is_imaginary_term(inner)
        },
        Expression::PlusMinus(inner) => is_simplified_value(inner),
        Expression::Tuple(items) => items.iter().all(is_simplified_value),
        Expression::Binary {
            left,
            op: BinaryOperation::PlusMinus,
            right,
        } => is_simplified_value(left) && is_simplified_value(right),
        Expression::Binary {
            left,
            op: BinaryOperation::Plus | BinaryOperation::Minus,
            right,
        } => is_real_number(left) && is_imaginary_term(right),
        Expression::FunctionCall { function, argument } if function == "sqrt" => {
            match &**argument {
                Expression::Number(n) => n.as_integer().is_some() && !n.sqrt().is_exact(),
                _ => false,
            }
        },
        _ => is_reduced_fraction(expr) || is_imaginary_term(expr),
    }
}

fn is_real_number(expr: &Expression) -> bool {
    match expr {
        Expression::Number(n) => n.is_real(),
        Expression::Negate(inner) | Expression::PlusMinus(inner) => is_real_number(inner),
        _ => false,
    }
}

/// Something like `I`, `3I` or `3*I`.
fn is_imaginary_term(expr: &Expression) -> bool {
    match expr {
        Expression::Constant(Constant::ImaginaryUnit) => true,
        Expression::Number(n) => !n.is_real(),
        Expression::Binary {
            left,
            op: BinaryOperation::Times,
            right,
        } => {
            is_real_number(left)
                && matches!(**right, Expression::Constant(Constant::ImaginaryUnit))
        },
        _ => false,
    }
}

/// An integer fraction in lowest terms, like `3/2`.
fn is_reduced_fraction(expr: &Expression) -> bool {
    let (numerator, denominator) = match expr {
        Expression::Binary {
            left,
            op: BinaryOperation::Divide,
            right,
        } => match (&**left, &**right) {
            (Expression::Number(n), Expression::Number(d)) => (n, d),
            _ => return false,
        },
        _ => return false,
    };

    match (integer_of(numerator), integer_of(denominator)) {
        (Some(n), Some(d)) => d.is_positive() && !d.is_one() && n.gcd(&d).is_one(),
        _ => false,
    }
}

fn integer_of(n: &Number) -> Option<num_bigint::BigInt> { n.as_integer().cloned() }

fn describe(set: &Result<SolutionSet, ExtractionError>) -> String {
    match set {
        Ok(set) => set.to_string(),
        Err(_) => String::from("None"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("an unknown error occurred")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnose::Offset;

    fn check(previous: &str, current: &str) -> Report {
        Checker::new(Config::default()).check_step(previous, current)
    }

    macro_rules! step_test {
        ($name:ident, $previous:expr => $current:expr, $verdict:expr) => {
            #[test]
            fn $name() {
                let got = check($previous, $current);

                assert_eq!(got.verdict, $verdict, "{:?}", got);
            }
        };
    }

    step_test!(simple_linear_step, "2x + 4 = 12" => "2x = 8", Verdict::Valid);
    step_test!(solved, "2x = 8" => "x = 4", Verdict::Valid);
    step_test!(dropped_a_root, "x^2 = 16" => "x = 4", Verdict::Partial);
    step_test!(bare_value_dropped_a_root, "x^2 = 16" => "4", Verdict::Partial);
    step_test!(both_roots_as_a_list, "x^2 = 16" => "4, -4", Verdict::Valid);
    step_test!(both_roots_with_plus_minus, "x^2 = 16" => "+/- 4", Verdict::Valid);
    step_test!(assigned_list, "x^2 = 16" => "x = 4, -4", Verdict::Valid);
    step_test!(fraction_vs_decimal, "x = 3/2" => "x = 1.5", Verdict::Valid);
    step_test!(solve_a_system, "2x + 3y = 20; x + y = 8" => "x=4; y=4", Verdict::Valid);
    step_test!(
        system_with_commas,
        "2x + 3y = 20; x + y = 8" => "x=4,y=4",
        Verdict::Valid
    );
    step_test!(system_as_a_pair, "2x + 3y = 20; x + y = 8" => "(4, 4)", Verdict::Valid);
    step_test!(
        unfinished_arithmetic,
        "x + 4 = 10" => "x = 10 - 4",
        Verdict::Unsimplified
    );
    step_test!(unreduced_fraction, "2x = 3" => "x = 6/4", Verdict::Unsimplified);
    step_test!(reduced_fraction, "2x = 3" => "x = 3/2", Verdict::Valid);
    step_test!(complex_roots, "x^2 + 4 = 0" => "x = +/- 2i", Verdict::Valid);
    step_test!(percentages, "5% of 30" => "3/2", Verdict::Valid);
    step_test!(thousands, "900 + 1,000 = x" => "x = 1900", Verdict::Valid);
    step_test!(inequality_step, "2x + 1 <= 7" => "x <= 3", Verdict::Valid);
    step_test!(wrong_answer, "2x + 4 = 12" => "x = 6", Verdict::Invalid);
    step_test!(blank_previous, "" => "x = 4", Verdict::Empty);
    step_test!(blank_current, "x = 4" => "   ", Verdict::Empty);
    step_test!(
        garbage_previous,
        "2 + * 3" => "x = 4",
        Verdict::ParseError(Line::Previous)
    );
    step_test!(
        garbage_current,
        "x = 4" => "x = = 4",
        Verdict::ParseError(Line::Current)
    );
    step_test!(
        unfinished_pair_in_a_system,
        "2x + 3y = 20; x + y = 8" => "(4, 8 - 4)",
        Verdict::Valid
    );
    step_test!(
        unfinished_assignments_in_a_system,
        "2x + 3y = 20; x + y = 8" => "x = 4; y = 8 - 4",
        Verdict::Valid
    );
    step_test!(unsolvable_relation, "y = sin(x)" => "y = sin(x)", Verdict::Valid);
    step_test!(unknown_under_a_root, "sqrt(x) = 4" => "x = 16", Verdict::Valid);
    step_test!(unknown_in_an_exponent, "2^x = 8" => "x = 3", Verdict::Valid);
    step_test!(both_absolute_values, "abs(x) = 3" => "x = 3, -3", Verdict::Valid);
    step_test!(
        identities_in_two_unknowns,
        "x + y = y + x" => "x + y = y + x; 2x = 2x",
        Verdict::Valid
    );

    #[test]
    fn reflexivity() {
        let lines = [
            "2x + 4 = 12",
            "x = 4",
            "x^2 = 16",
            "2x + 3y = 20; x + y = 8",
            "y = 2x + 1",
            "x > 3",
            "4, -4",
        ];

        for line in lines {
            assert_eq!(check(line, line).verdict, Verdict::Valid, "{}", line);
        }
    }

    #[test]
    fn invalid_steps_get_a_hint() {
        let got = check("2x + 4 = 12", "x = 6");

        assert_eq!(got.hint, Some(Hint::OffBy(Offset::Integer(2))));
        assert_eq!(got.hint.unwrap().to_string(), "You are off by 2.");
    }

    #[test]
    fn sign_errors() {
        let got = check("2x = 8", "x = -4");

        assert_eq!(got.verdict, Verdict::Invalid);
        assert_eq!(got.hint, Some(Hint::SignFlip));
    }

    #[test]
    fn unsimplified_steps_suggest_doing_the_arithmetic() {
        let got = check("x + 4 = 10", "x = 10 - 4");

        assert_eq!(got.hint, Some(Hint::PerformArithmetic));
    }

    #[test]
    fn diagnostics_include_the_raw_sets() {
        let got = check("x^2 = 16", "x = 4");

        assert_eq!(got.diagnostics[Report::RAW_SET_A], "{-4, 4}");
        assert_eq!(got.diagnostics[Report::RAW_SET_B], "{4}");
    }

    #[test]
    fn failed_lines_are_reported_as_none() {
        let got = check("x = 4", "x = = 4");

        assert_eq!(got.diagnostics[Report::RAW_SET_B], "None");
    }

    #[test]
    fn verdict_messages() {
        let inputs = vec![
            (Verdict::Valid, "Valid"),
            (Verdict::ParseError(Line::Previous), "Could not solve Line A"),
            (Verdict::ParseError(Line::Current), "Could not parse Line B"),
            (Verdict::SyntaxError(String::from("oops")), "Syntax Error: oops"),
        ];

        for (verdict, should_be) in inputs {
            assert_eq!(verdict.to_string(), should_be);
        }
    }

    #[derive(Debug, Default, Copy, Clone, PartialEq)]
    struct Panicky;

    impl Context for Panicky {
        fn evaluate_function(
            &self,
            _name: &str,
            _argument: &Number,
        ) -> Result<Number, crate::algebra::ops::EvaluationError> {
            panic!("the context blew up")
        }
    }

    #[test]
    fn panics_become_syntax_errors() {
        let _ = env_logger::builder().is_test(true).try_init();
        let checker = Checker::with_context(Config::default(), Panicky);

        let got = checker.check_step("x = sqrt(4)", "x = 2");

        assert_eq!(
            got.verdict,
            Verdict::SyntaxError(String::from("the context blew up"))
        );
    }

    #[test]
    fn render_lines_as_latex() {
        let checker = Checker::new(Config::default());

        assert_eq!(
            checker.render_display("2(x+4) = 10").unwrap(),
            "2 \\left(x + 4\\right) = 10"
        );
        assert_eq!(
            checker.render_display("2x + 3y = 20; x + y = 8").unwrap(),
            "2 x + 3 y = 20, \\quad x + y = 8"
        );
        assert_eq!(checker.render_display("x = 4, -4").unwrap(), "x = 4, -4");
        assert_eq!(checker.render_display("2 + * 3"), None);
        assert_eq!(checker.render_display(""), None);
    }

    #[test]
    fn evaluated_and_unevaluated_parses() {
        let checker = Checker::new(Config::default());

        let unevaluated = checker.parse("x = 10 - 4", false).unwrap();
        let evaluated = checker.parse("x = 10 - 4", true).unwrap();

        assert_eq!(unevaluated.to_string(), "x = 10 - 4");
        assert_eq!(evaluated.to_string(), "x = 6");
    }
}
