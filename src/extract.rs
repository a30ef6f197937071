//! Turning a normalized line of working into the set of values it describes.

use crate::{
    algebra::{
        ops::{self, Context, EvaluationError},
        parse, parse_statement, Expression, Fraction, Number, Parameter,
        ParseError, Polynomial, Statement, MAX_PLUS_MINUS,
    },
    equations::{Equation, SystemOfEquations},
    isolate,
    solution::{FiniteSet, Region, Relation, SolutionSet, Value, MAX_COMPONENTS},
    solve::{self, Solution, SolveError},
};
use arrayvec::ArrayVec;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("there is nothing to solve")]
    EmptyInput,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("a coordinate may have at most {} components, found {found}", MAX_COMPONENTS)]
    TooManyComponents { found: usize },
    #[error("at most {} \"±\" signs may be used, found {found}", MAX_PLUS_MINUS)]
    TooManyPlusMinus { found: usize },
}

/// Work out the solution set of an already normalized line.
pub fn extract<C>(normalized: &str, ctx: &C) -> Result<SolutionSet, ExtractionError>
where
    C: Context,
{
    let clauses = split_clauses(normalized);

    let set = match clauses.as_slice() {
        [] => return Err(ExtractionError::EmptyInput),
        [clause] => extract_clause(clause, ctx)?,
        many => extract_system(many, ctx)?,
    };

    log::debug!("The solution set of \"{}\" is {}", normalized, set);

    Ok(set.flatten())
}

/// Clauses are separated by `;`, or by `,` when the line contains several
/// equations (`x=4,y=4`).
pub(crate) fn split_clauses(text: &str) -> Vec<&str> {
    let separator = if text.contains(';') {
        ';'
    } else if text.matches('=').count() > 1 && text.contains(',') {
        ','
    } else {
        let text = text.trim();
        return if text.is_empty() { Vec::new() } else { vec![text] };
    };

    text.split(separator)
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .collect()
}

fn extract_clause<C>(clause: &str, ctx: &C) -> Result<SolutionSet, ExtractionError>
where
    C: Context,
{
    if let Some(set) = list_assignment(clause, ctx)? {
        return Ok(set.into());
    }

    let statement = parse_statement(clause)?;
    extract_statement(&statement, ctx)
}

/// Work out the solution set of a single parsed clause.
pub fn extract_statement<C>(
    statement: &Statement,
    ctx: &C,
) -> Result<SolutionSet, ExtractionError>
where
    C: Context,
{
    let found = statement.plus_minus_count();

    if found > MAX_PLUS_MINUS {
        return Err(ExtractionError::TooManyPlusMinus { found });
    }
    if found == 0 {
        return extract_plain(statement, ctx);
    }

    let mut union = FiniteSet::empty();

    for variant in statement.expand_plus_minus() {
        log::trace!("Solving the \"{}\" variant", variant);

        match extract_plain(&variant, ctx)? {
            SolutionSet::Finite(set) => union = union.union(set),
            other if other.is_empty() => {},
            _ => {
                return Err(SolveError::Unsupported {
                    reason: String::from(
                        "\"±\" only works with a finite number of values",
                    ),
                }
                .into())
            },
        }
    }

    Ok(union.into())
}

fn extract_plain<C>(
    statement: &Statement,
    ctx: &C,
) -> Result<SolutionSet, ExtractionError>
where
    C: Context,
{
    match statement {
        Statement::ValueTuple(items) => {
            let values = items
                .iter()
                .map(|item| value_of(item, ctx))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(FiniteSet::values_only(values).into())
        },
        Statement::Expression(expr @ Expression::Tuple(_)) => {
            Ok(FiniteSet::values_only(vec![value_of(expr, ctx)?]).into())
        },
        Statement::Expression(expr) if expr.unknowns().is_empty() => {
            Ok(FiniteSet::values_only(vec![value_of(expr, ctx)?]).into())
        },
        Statement::Expression(expr) => {
            solve_equation(&Equation::equal_to_zero(expr.clone()), ctx)
        },
        Statement::Equation(equation) => solve_equation(equation, ctx),
        Statement::Inequality(inequality) => {
            Ok(solve::reduce_inequality(inequality, ctx)?.into())
        },
    }
}

fn solve_equation<C>(equation: &Equation, ctx: &C) -> Result<SolutionSet, ExtractionError>
where
    C: Context,
{
    let unknowns = equation.unknowns();

    match unknowns.len() {
        0 => {
            let difference = ops::evaluate_constant(&equation.body(), ctx)?;

            if difference.is_negligible() {
                Ok(Region::everything().into())
            } else {
                Ok(Region::empty().into())
            }
        },
        1 => {
            let system = SystemOfEquations::new().with(equation.clone());

            match system.solve(ctx) {
                Ok(solution) => solution_to_set(solution, unknowns),
                Err(SolveError::Unsupported { reason }) => {
                    solve_by_isolation(equation, &unknowns[0], reason, ctx)
                },
                Err(other) => Err(other.into()),
            }
        },
        _ => relation(equation, ctx),
    }
}

/// Strip the functions and exponentials from around the unknown, solve
/// what's left, then keep the candidates which satisfy the original
/// equation.
fn solve_by_isolation<C>(
    equation: &Equation,
    unknown: &Parameter,
    reason: String,
    ctx: &C,
) -> Result<SolutionSet, ExtractionError>
where
    C: Context,
{
    let rewritten = match isolate::isolate(equation, ctx)? {
        Some(rewritten) => rewritten,
        None => return Err(SolveError::Unsupported { reason }.into()),
    };

    let mut candidates = FiniteSet::empty();

    for simpler in &rewritten {
        log::trace!("Solving \"{}\" as \"{}\"", equation, simpler);

        match solve_equation(simpler, ctx)? {
            SolutionSet::Finite(set) => candidates = candidates.union(set),
            other if other.is_empty() => {},
            _ => return Err(SolveError::Unsupported { reason }.into()),
        }
    }

    let solutions = candidates
        .values()
        .iter()
        .filter(|value| match value {
            Value::Scalar(n) => isolate::satisfies(equation, unknown, n, ctx),
            Value::Tuple(_) => false,
        })
        .cloned()
        .collect();

    Ok(FiniteSet::new(vec![unknown.clone()], solutions).into())
}

/// A single equation in several unknowns describes a relation between them.
fn relation<C>(equation: &Equation, ctx: &C) -> Result<SolutionSet, ExtractionError>
where
    C: Context,
{
    match Fraction::from_expression(&equation.body(), ctx) {
        Ok(fraction) if fraction.numerator.is_zero() => {
            Ok(Relation::Polynomial(Polynomial::zero()).into())
        },
        Ok(fraction) => {
            Ok(Relation::Polynomial(fraction.numerator.monic()).into())
        },
        Err(SolveError::Unsupported { reason }) => {
            log::trace!("Comparing \"{}\" structurally ({})", equation, reason);
            Ok(Relation::Equation(equation.clone()).into())
        },
        Err(other) => Err(other.into()),
    }
}

fn extract_system<C>(clauses: &[&str], ctx: &C) -> Result<SolutionSet, ExtractionError>
where
    C: Context,
{
    let mut system = SystemOfEquations::new();

    for clause in clauses {
        let equation = match parse_statement(clause)? {
            Statement::Equation(equation) => equation,
            Statement::Expression(expr) => Equation::equal_to_zero(expr),
            other => {
                return Err(SolveError::Unsupported {
                    reason: format!(
                        "\"{}\" can't be part of a system of equations",
                        other
                    ),
                }
                .into())
            },
        };

        if equation.body().contains_plus_minus() {
            return Err(SolveError::Unsupported {
                reason: String::from("\"±\" can't be used inside a system of equations"),
            }
            .into());
        }

        system.push(equation);
    }

    let unknowns = system.unknowns();
    log::debug!(
        "Solving a system of {} equations in {} unknowns",
        system.len(),
        unknowns.len()
    );

    let solution = system.solve(ctx)?;
    solution_to_set(solution, unknowns)
}

fn solution_to_set(
    solution: Solution,
    unknowns: Vec<Parameter>,
) -> Result<SolutionSet, ExtractionError> {
    match solution {
        Solution::Points(points) => {
            let values = points
                .into_iter()
                .map(|point| point_to_value(point, unknowns.len()))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(FiniteSet::new(unknowns, values).into())
        },
        Solution::Everything if unknowns.len() <= 1 => Ok(Region::everything().into()),
        Solution::Everything => Ok(Relation::Polynomial(Polynomial::zero()).into()),
        Solution::Underdetermined(poly) => Ok(Relation::Polynomial(poly).into()),
    }
}

fn point_to_value(
    point: Vec<Number>,
    dimensions: usize,
) -> Result<Value, ExtractionError> {
    if dimensions == 1 {
        if let Some(only) = point.into_iter().next() {
            return Ok(Value::Scalar(only));
        }
        return Err(ExtractionError::TooManyComponents { found: 0 });
    }

    let found = point.len();
    ArrayVec::try_from(point.as_slice())
        .map(Value::Tuple)
        .map_err(|_| ExtractionError::TooManyComponents { found })
}

/// Handle lines which spell out their values, like `x = 4, -4` or
/// `(x, y) = (4, 4)`.
fn list_assignment<C>(clause: &str, ctx: &C) -> Result<Option<FiniteSet>, ExtractionError>
where
    C: Context,
{
    if !clause.contains(',') || clause.contains(['<', '>']) {
        return Ok(None);
    }

    let (left, right) = match clause.split_once('=') {
        Some((left, right)) if !right.contains('=') => (left, right),
        _ => return Ok(None),
    };

    let variables: Vec<Parameter> = match parse(left) {
        Ok(Expression::Parameter(p)) => vec![p],
        Ok(Expression::Tuple(items)) => {
            match items
                .into_iter()
                .map(|item| match item {
                    Expression::Parameter(p) => Some(p),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
            {
                Some(variables) => variables,
                None => return Ok(None),
            }
        },
        _ => return Ok(None),
    };

    let items = match parse_statement(right) {
        Ok(Statement::ValueTuple(items)) => items,
        Ok(Statement::Expression(tuple @ Expression::Tuple(_))) => vec![tuple],
        _ => return Ok(None),
    };

    let found = Statement::ValueTuple(items.clone()).plus_minus_count();
    if found > MAX_PLUS_MINUS {
        return Err(ExtractionError::TooManyPlusMinus { found });
    }

    let mut values = Vec::new();

    for item in &items {
        for value in values_of(item, ctx)? {
            let arity = value.components().len();
            let expected = variables.len();

            if expected > 1 && (arity != expected || matches!(value, Value::Scalar(_)))
            {
                return Err(SolveError::ArityMismatch {
                    expected,
                    found: arity,
                }
                .into());
            }

            values.push(value.flatten());
        }
    }

    Ok(Some(FiniteSet::new(variables, values)))
}

/// Evaluate an item from a list of values, expanding any `±`.
fn values_of<C>(item: &Expression, ctx: &C) -> Result<Vec<Value>, ExtractionError>
where
    C: Context,
{
    Statement::Expression(item.clone())
        .expand_plus_minus()
        .iter()
        .flat_map(|variant| variant.expressions())
        .map(|expr| value_of(expr, ctx))
        .collect()
}

fn value_of<C>(expr: &Expression, ctx: &C) -> Result<Value, ExtractionError>
where
    C: Context,
{
    match expr {
        Expression::Tuple(items) => {
            let mut components = ArrayVec::new();

            for item in items {
                let value = ops::evaluate_constant(item, ctx)?;
                components.try_push(value).map_err(|_| {
                    ExtractionError::TooManyComponents { found: items.len() }
                })?;
            }

            Ok(Value::Tuple(components))
        },
        other => Ok(Value::Scalar(ops::evaluate_constant(other, ctx)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algebra::ops::Builtins,
        normalize::normalize,
        solution::{Bound, Interval},
    };

    fn solution_set(src: &str) -> SolutionSet {
        extract(&normalize(src), &Builtins).unwrap()
    }

    fn x() -> Parameter { Parameter::named("x") }

    fn finite(variables: Vec<Parameter>, values: Vec<Value>) -> SolutionSet {
        SolutionSet::Finite(FiniteSet::new(variables, values))
    }

    fn scalars(values: &[Number]) -> Vec<Value> {
        values.iter().cloned().map(Value::Scalar).collect()
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        scalars(&values.iter().copied().map(Number::integer).collect::<Vec<_>>())
    }

    fn pairs(values: &[(i64, i64)]) -> Vec<Value> {
        values
            .iter()
            .map(|&(a, b)| {
                let pair = [Number::integer(a), Number::integer(b)];
                Value::Tuple(pair.into_iter().collect())
            })
            .collect()
    }

    fn xy() -> Vec<Parameter> { vec![Parameter::named("x"), Parameter::named("y")] }

    #[test]
    fn split_into_clauses() {
        let inputs = vec![
            ("x = 4; y = 4", vec!["x = 4", "y = 4"]),
            ("x=4,y=4", vec!["x=4", "y=4"]),
            ("x = 4, -4", vec!["x = 4, -4"]),
            ("2x + 3y = 20; ", vec!["2x + 3y = 20"]),
            ("   ", vec![]),
        ];

        for (src, should_be) in inputs {
            assert_eq!(split_clauses(src), should_be, "{}", src);
        }
    }

    #[test]
    fn quadratic() {
        let got = solution_set("x^2 = 16");

        assert_eq!(got, finite(vec![x()], ints(&[4, -4])));
        assert_eq!(got.to_string(), "{-4, 4}");
    }

    #[test]
    fn explicit_values() {
        let should_be = finite(vec![x()], ints(&[4, -4]));

        assert_eq!(solution_set("4, -4"), should_be);
        assert_eq!(solution_set("x = 4, -4"), should_be);
        assert_eq!(solution_set("+/- 4"), should_be);
        assert_eq!(solution_set("x = ±4"), should_be);
    }

    #[test]
    fn plus_minus_inside_an_expression() {
        let got = solution_set("x = 3 +/- 2");

        assert_eq!(got, finite(vec![x()], ints(&[5, 1])));
    }

    #[test]
    fn too_many_plus_minus_signs() {
        let got = extract(&normalize("±1 ± 2 ± 3 ± 4"), &Builtins);

        assert_eq!(got, Err(ExtractionError::TooManyPlusMinus { found: 4 }));
    }

    #[test]
    fn linear_system() {
        let should_be = finite(xy(), pairs(&[(4, 4)]));

        assert_eq!(solution_set("2x + 3y = 20; x + y = 8"), should_be);
        assert_eq!(solution_set("x=4; y=4"), should_be);
        assert_eq!(solution_set("x=4,y=4"), should_be);
        assert_eq!(solution_set("x = 4 and y = 4"), should_be);
        assert_eq!(solution_set("(x, y) = (4, 4)"), should_be);
        assert_eq!(solution_set("(4, 4)"), should_be);
    }

    #[test]
    fn tuple_arity_must_match() {
        let got = extract("(x, y) = (4, 4, 4)", &Builtins);

        assert!(got.is_err());
    }

    #[test]
    fn percentages() {
        let got = solution_set("5% of 30");

        assert_eq!(got, finite(Vec::new(), scalars(&[Number::fraction(3, 2)])));
    }

    #[test]
    fn thousands_separators() {
        let got = solution_set("900 + 1,000 = x");

        assert_eq!(got, finite(vec![x()], ints(&[1900])));
    }

    #[test]
    fn complex_roots_are_kept() {
        let got = solution_set("x^2 + 4 = 0");

        let two_i = Number::integer(2) * Number::imaginary_unit();
        assert_eq!(got, finite(vec![x()], scalars(&[two_i.clone(), -two_i])));
    }

    #[test]
    fn complex_values() {
        let got = solution_set("x = 2 - 3i");

        let value = Number::integer(2) - Number::integer(3) * Number::imaginary_unit();
        assert_eq!(got, finite(vec![x()], scalars(&[value])));
    }

    #[test]
    fn equations_without_unknowns() {
        assert_eq!(solution_set("2 + 2 = 4"), SolutionSet::Region(Region::everything()));
        assert!(solution_set("2 + 2 = 5").is_empty());
    }

    #[test]
    fn relations_in_two_unknowns() {
        let first = solution_set("y = 2x + 1");
        let second = solution_set("2y - 4x = 2");

        assert_eq!(first, second);
        assert!(matches!(first, SolutionSet::Relation(Relation::Polynomial(_))));
    }

    #[test]
    fn identities_in_two_unknowns_are_the_zero_relation() {
        let single = solution_set("x + y = y + x");
        let system = solution_set("x + y = y + x; 2x = 2x");

        let zero = Relation::Polynomial(Polynomial::zero());
        assert_eq!(single, SolutionSet::Relation(zero));
        assert_eq!(single, system);
    }

    #[test]
    fn relations_which_arent_polynomial_are_kept_as_equations() {
        let got = solution_set("y = sin(x)");

        assert!(matches!(got, SolutionSet::Relation(Relation::Equation(_))));
        assert_eq!(got, solution_set("y = sin(x)"));
    }

    #[test]
    fn unknowns_inside_functions() {
        assert_eq!(solution_set("sqrt(x) = 4"), finite(vec![x()], ints(&[16])));
        assert_eq!(solution_set("abs(x) = 3"), finite(vec![x()], ints(&[3, -3])));
        assert_eq!(solution_set("2*sqrt(x - 1) = 6"), finite(vec![x()], ints(&[10])));
    }

    #[test]
    fn unknowns_in_the_exponent() {
        assert_eq!(solution_set("2^x = 8"), finite(vec![x()], ints(&[3])));

        let got = solution_set("e^x = 1");
        let value = got.first_real_value().unwrap();
        assert!(value.abs() < 1e-12);
    }

    #[test]
    fn extraneous_roots_are_dropped() {
        assert!(solution_set("sqrt(x) = -4").is_empty());
        assert!(solution_set("abs(x) = -3").is_empty());
        assert!(solution_set("2^x = 0").is_empty());
    }

    #[test]
    fn inequalities() {
        let got = solution_set("2x + 1 <= 7");

        assert_eq!(
            got,
            SolutionSet::Region(Region::new(vec![Interval::new(
                Bound::Unbounded,
                Bound::Closed(Number::integer(3))
            )]))
        );
    }

    #[test]
    fn one_element_tuples_are_flattened() {
        let got = solution_set("(6,)");

        assert_eq!(got, finite(Vec::new(), ints(&[6])));
        assert_eq!(got.to_string(), "{6}");
    }

    #[test]
    fn empty_input() {
        assert_eq!(extract("", &Builtins), Err(ExtractionError::EmptyInput));
        assert_eq!(extract(" ; ", &Builtins), Err(ExtractionError::EmptyInput));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let got = extract("2 + * 3", &Builtins);

        assert!(matches!(got, Err(ExtractionError::Parse(_))));
    }
}
