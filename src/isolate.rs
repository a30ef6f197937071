//! Undoing the functions and exponentials wrapped around an unknown, so
//! equations like `sqrt(x) = 4` or `2^x = 8` can be handed to the polynomial
//! solver.

use crate::{
    algebra::{
        ops::{self, Context, EvaluationError},
        BinaryOperation, Constant, Expression, Number, Parameter,
    },
    equations::Equation,
};
use num_traits::{One, Signed};

/// How close both sides of the original equation must be before a
/// candidate is accepted.
const TOLERANCE: f64 = 1e-9;
/// The largest integer power tried when looking for an exact logarithm.
const MAX_EXACT_LOGARITHM: i64 = 64;

/// Equations of the form `inner = value`, or `None` when the expression
/// can't be inverted.
type Rewrite = Option<Vec<(Expression, Number)>>;

/// Peel one layer off the side of `equation` containing the unknown.
///
/// Returns `None` when the unknown appears on both sides, or when the
/// outermost operation has no inverse we know about. An empty list means
/// the equation has no solutions at all (e.g. `2^x = 0`).
pub(crate) fn isolate<C>(
    equation: &Equation,
    ctx: &C,
) -> Result<Option<Vec<Equation>>, EvaluationError>
where
    C: Context,
{
    let (inner, other) = if equation.right.unknowns().is_empty() {
        (&equation.left, &equation.right)
    } else if equation.left.unknowns().is_empty() {
        (&equation.right, &equation.left)
    } else {
        return Ok(None);
    };

    let target = ops::evaluate_constant(other, ctx)?;
    let rewritten = invert(inner, target, ctx)?;

    Ok(rewritten.map(|equations| {
        equations
            .into_iter()
            .map(|(inner, value)| Equation::new(inner, Expression::Number(value)))
            .collect()
    }))
}

/// Does substituting `value` for `unknown` make both sides of the equation
/// agree?
///
/// Squaring both sides (and friends) can introduce solutions the original
/// equation doesn't have, so every candidate gets checked.
pub(crate) fn satisfies<C>(
    equation: &Equation,
    unknown: &Parameter,
    value: &Number,
    ctx: &C,
) -> bool
where
    C: Context,
{
    let lookup = |p: &Parameter| {
        if p == unknown {
            Some(value.clone())
        } else {
            None
        }
    };

    match (
        ops::evaluate(&equation.left, &lookup, ctx),
        ops::evaluate(&equation.right, &lookup, ctx),
    ) {
        (Ok(left), Ok(right)) => {
            let (left, right) = (left.to_complex64(), right.to_complex64());
            let scale = 1.0 + left.norm().max(right.norm());
            (left - right).norm() <= TOLERANCE * scale
        },
        _ => false,
    }
}

fn rewritten(inner: &Expression, value: Number) -> Result<Rewrite, EvaluationError> {
    Ok(Some(vec![(inner.clone(), value)]))
}

fn invert<C>(
    expr: &Expression,
    target: Number,
    ctx: &C,
) -> Result<Rewrite, EvaluationError>
where
    C: Context,
{
    match expr {
        Expression::Negate(inner) => rewritten(inner, -target),
        Expression::FunctionCall { function, argument } => {
            invert_function(function, argument, target, ctx)
        },
        Expression::Binary { left, right, op } => {
            invert_binary(left, right, *op, target, ctx)
        },
        _ => Ok(None),
    }
}

fn invert_binary<C>(
    left: &Expression,
    right: &Expression,
    op: BinaryOperation,
    target: Number,
    ctx: &C,
) -> Result<Rewrite, EvaluationError>
where
    C: Context,
{
    let left_is_known = left.unknowns().is_empty();
    let right_is_known = right.unknowns().is_empty();

    if left_is_known == right_is_known {
        return Ok(None);
    }

    let (unknown, known) = if left_is_known {
        (right, ops::evaluate_constant(left, ctx)?)
    } else {
        (left, ops::evaluate_constant(right, ctx)?)
    };

    match op {
        BinaryOperation::Plus => rewritten(unknown, target - known),
        BinaryOperation::Minus if left_is_known => {
            rewritten(unknown, known - target)
        },
        BinaryOperation::Minus => rewritten(unknown, target + known),
        BinaryOperation::Times => match target.checked_div(&known) {
            Ok(value) => rewritten(unknown, value),
            Err(_) => Ok(None),
        },
        // k / u = c
        BinaryOperation::Divide if left_is_known => {
            if target.is_negligible() {
                Ok(Some(Vec::new()))
            } else {
                rewritten(unknown, known.checked_div(&target)?)
            }
        },
        BinaryOperation::Divide => rewritten(unknown, target * known),
        // k^u = c
        BinaryOperation::Power if left_is_known => {
            invert_exponential(unknown, &known, target, ctx)
        },
        // u^k = c
        BinaryOperation::Power => match known.recip() {
            Ok(exponent) => rewritten(unknown, target.pow(&exponent)?),
            Err(_) => Ok(None),
        },
        BinaryOperation::PlusMinus => Ok(None),
    }
}

fn invert_function<C>(
    function: &str,
    argument: &Expression,
    target: Number,
    ctx: &C,
) -> Result<Rewrite, EvaluationError>
where
    C: Context,
{
    match function {
        "sqrt" => rewritten(argument, target.pow(&Number::integer(2))?),
        "abs" => Ok(Some(vec![
            (argument.clone(), target.clone()),
            (argument.clone(), -target),
        ])),
        "exp" => invert_exponential(argument, &Constant::E.value(), target, ctx),
        "ln" | "log" => {
            rewritten(argument, ctx.evaluate_function("exp", &target)?)
        },
        _ => Ok(None),
    }
}

/// Solve `base^exponent = target` for the exponent.
fn invert_exponential<C>(
    exponent: &Expression,
    base: &Number,
    target: Number,
    ctx: &C,
) -> Result<Rewrite, EvaluationError>
where
    C: Context,
{
    if target.is_negligible() {
        return Ok(Some(Vec::new()));
    }

    if let Some(power) = exact_logarithm(base, &target) {
        return rewritten(exponent, power);
    }

    let logarithms = (
        ctx.evaluate_function("ln", &target),
        ctx.evaluate_function("ln", base),
    );

    match logarithms {
        (Ok(numerator), Ok(denominator)) if !denominator.is_negligible() => {
            rewritten(exponent, numerator.checked_div(&denominator)?)
        },
        _ => Ok(None),
    }
}

/// Find an integer `k` where `base^k` is exactly `value`.
fn exact_logarithm(base: &Number, value: &Number) -> Option<Number> {
    let (b, v) = (base.as_rational()?, value.as_rational()?);

    if !b.is_positive() || b.is_one() || !v.is_positive() {
        return None;
    }

    (-MAX_EXACT_LOGARITHM..=MAX_EXACT_LOGARITHM)
        .map(Number::integer)
        .find(|k| base.pow(k).ok().as_ref() == Some(value))
}
