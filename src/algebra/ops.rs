//! [`Expression`] operations.

use crate::algebra::{BinaryOperation, Expression, Number, Parameter};
use smol_str::SmolStr;

/// Contextual information used when evaluating an [`Expression`].
pub trait Context {
    fn evaluate_function(
        &self,
        name: &str,
        argument: &Number,
    ) -> Result<Number, EvaluationError>;
}

impl<C: Context + ?Sized> Context for &C {
    fn evaluate_function(
        &self,
        name: &str,
        argument: &Number,
    ) -> Result<Number, EvaluationError> {
        (**self).evaluate_function(name, argument)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("unknown function \"{name}\"")]
    UnknownFunction { name: SmolStr },
    #[error("\"{name}\" is undefined at {argument}")]
    Domain { name: SmolStr, argument: Number },
    #[error("division by zero")]
    DivisionByZero,
    #[error("exponents larger than {} are not supported", crate::algebra::MAX_EXPONENT)]
    ExponentTooLarge,
    #[error("no value was provided for \"{name}\"")]
    UnknownParameter { name: SmolStr },
    #[error("expected a single number")]
    NotAScalar,
}

/// Names which are parsed as function calls.
pub const FUNCTIONS: &[&str] =
    &["sqrt", "abs", "sin", "cos", "tan", "ln", "log", "exp"];

/// The set of builtin functions.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Builtins;

impl Context for Builtins {
    fn evaluate_function(
        &self,
        name: &str,
        argument: &Number,
    ) -> Result<Number, EvaluationError> {
        match name {
            "sqrt" => Ok(argument.sqrt()),
            "abs" => Ok(argument.abs()),
            "sin" => Ok(argument.map_approx(|z| z.sin())),
            "cos" => Ok(argument.map_approx(|z| z.cos())),
            "tan" => Ok(argument.map_approx(|z| z.tan())),
            "exp" => Ok(argument.map_approx(|z| z.exp())),
            "ln" | "log" if argument.is_zero() => Err(EvaluationError::Domain {
                name: name.into(),
                argument: argument.clone(),
            }),
            "ln" | "log" if argument.is_one() => Ok(Number::zero()),
            "ln" | "log" => Ok(argument.map_approx(|z| z.ln())),
            _ => Err(EvaluationError::UnknownFunction { name: name.into() }),
        }
    }
}

/// Simplify an expression by evaluating all constant operations.
pub fn fold_constants<C>(expr: &Expression, ctx: &C) -> Expression
where
    C: Context,
{
    match expr {
        Expression::Binary { left, right, op } => {
            fold_binary_op(left, right, *op, ctx)
        },
        Expression::Constant(constant) => Expression::Number(constant.value()),
        Expression::Negate(expr) => match fold_constants(expr, ctx) {
            Expression::Number(value) => Expression::Number(-value),
            // double negative
            Expression::Negate(inner) => *inner,
            other => Expression::Negate(Box::new(other)),
        },
        Expression::PlusMinus(inner) => {
            Expression::PlusMinus(Box::new(fold_constants(inner, ctx)))
        },
        Expression::FunctionCall { function, argument } => {
            let argument = fold_constants(argument, ctx);

            if let Expression::Number(argument) = &argument {
                if let Ok(result) = ctx.evaluate_function(function, argument) {
                    return Expression::Number(result);
                }
            }

            Expression::FunctionCall {
                function: function.clone(),
                argument: Box::new(argument),
            }
        },
        Expression::Tuple(items) => Expression::Tuple(
            items.iter().map(|item| fold_constants(item, ctx)).collect(),
        ),
        Expression::Parameter(_) | Expression::Number(_) => expr.clone(),
    }
}

fn fold_binary_op<C>(
    left: &Expression,
    right: &Expression,
    op: BinaryOperation,
    ctx: &C,
) -> Expression
where
    C: Context,
{
    let left = fold_constants(left, ctx);
    let right = fold_constants(right, ctx);

    // If our operands contain constants, we can use arithmetic's identity laws
    // to simplify things
    match (left, right, op) {
        (
            Expression::Parameter(p_left),
            Expression::Parameter(p_right),
            BinaryOperation::Plus,
        ) if p_left == p_right => {
            Expression::number(2) * Expression::Parameter(p_right)
        },
        (
            Expression::Parameter(p_left),
            Expression::Parameter(p_right),
            BinaryOperation::Minus,
        ) if p_left == p_right => Expression::number(0),

        // x + 0 = x
        (Expression::Number(l), right, BinaryOperation::Plus) if l.is_zero() => {
            right
        },
        (left, Expression::Number(r), BinaryOperation::Plus) if r.is_zero() => {
            left
        },

        // 0 * x = 0
        (Expression::Number(l), _, BinaryOperation::Times)
            if l.is_zero() && l.is_exact() =>
        {
            Expression::number(0)
        },
        (_, Expression::Number(r), BinaryOperation::Times)
            if r.is_zero() && r.is_exact() =>
        {
            Expression::number(0)
        },

        // 1 * x = x
        (Expression::Number(l), right, BinaryOperation::Times) if l.is_one() => {
            right
        },
        (left, Expression::Number(r), BinaryOperation::Times) if r.is_one() => {
            left
        },

        // x / 1 = x
        (left, Expression::Number(r), BinaryOperation::Divide) if r.is_one() => {
            left
        },

        // 0 - x = -x
        (Expression::Number(l), right, BinaryOperation::Minus)
            if l.is_zero() && !right.is_constant() =>
        {
            -right
        },

        // x - 0 = x
        (left, Expression::Number(r), BinaryOperation::Minus) if r.is_zero() => {
            left
        },

        // x^1 = x
        (left, Expression::Number(r), BinaryOperation::Power) if r.is_one() => {
            left
        },

        // (a * x) * b = (a*b) * x
        (
            Expression::Number(constant_a),
            Expression::Binary {
                left,
                right,
                op: BinaryOperation::Times,
            },
            BinaryOperation::Times,
        ) if left.is_constant() || right.is_constant() => {
            merge_constant_factors(constant_a, *left, *right)
        },
        (
            Expression::Binary {
                left,
                right,
                op: BinaryOperation::Times,
            },
            Expression::Number(constant_a),
            BinaryOperation::Times,
        ) if left.is_constant() || right.is_constant() => {
            merge_constant_factors(constant_a, *left, *right)
        },

        // Evaluate in-place
        (Expression::Number(l), Expression::Number(r), op) => {
            let value = match op {
                BinaryOperation::Plus => Ok(l.clone() + r.clone()),
                BinaryOperation::Minus => Ok(l.clone() - r.clone()),
                BinaryOperation::Times => Ok(l.clone() * r.clone()),
                BinaryOperation::Divide => l.checked_div(&r),
                BinaryOperation::Power => l.pow(&r),
                BinaryOperation::PlusMinus => Err(EvaluationError::NotAScalar),
            };

            match value {
                Ok(value) => Expression::Number(value),
                Err(_) => Expression::binary(
                    Expression::Number(l),
                    op,
                    Expression::Number(r),
                ),
            }
        },

        // Oh well, we tried
        (left, right, op) => Expression::binary(left, op, right),
    }
}

fn merge_constant_factors(
    constant_a: Number,
    left: Expression,
    right: Expression,
) -> Expression {
    match (left, right) {
        (Expression::Number(constant_b), expr)
        | (expr, Expression::Number(constant_b)) => {
            Expression::Number(constant_a * constant_b) * expr
        },
        (left, right) => Expression::Number(constant_a) * (left * right),
    }
}

/// Replace all references to a [`Parameter`] with an [`Expression`].
pub fn substitute(
    expression: &Expression,
    param: &Parameter,
    value: &Expression,
) -> Expression {
    match expression {
        Expression::Parameter(p) => {
            if p == param {
                value.clone()
            } else {
                Expression::Parameter(p.clone())
            }
        },
        Expression::Number(_) | Expression::Constant(_) => expression.clone(),
        Expression::Binary { left, right, op } => {
            let left = substitute(left, param, value);
            let right = substitute(right, param, value);
            Expression::binary(left, *op, right)
        },
        Expression::Negate(inner) => -substitute(inner, param, value),
        Expression::PlusMinus(inner) => {
            Expression::PlusMinus(Box::new(substitute(inner, param, value)))
        },
        Expression::FunctionCall { function, argument } => {
            Expression::FunctionCall {
                function: function.clone(),
                argument: Box::new(substitute(argument, param, value)),
            }
        },
        Expression::Tuple(items) => Expression::Tuple(
            items
                .iter()
                .map(|item| substitute(item, param, value))
                .collect(),
        ),
    }
}

/// Evaluate an expression to a single [`Number`], looking up the value of
/// each [`Parameter`] as it is encountered.
pub fn evaluate<F, C>(
    expr: &Expression,
    parameter_value: &F,
    ctx: &C,
) -> Result<Number, EvaluationError>
where
    F: Fn(&Parameter) -> Option<Number>,
    C: Context,
{
    match expr {
        Expression::Parameter(p) => parameter_value(p).ok_or_else(|| {
            EvaluationError::UnknownParameter {
                name: p.name().into(),
            }
        }),
        Expression::Number(value) => Ok(value.clone()),
        Expression::Constant(constant) => Ok(constant.value()),
        Expression::Binary { left, right, op } => {
            let left = evaluate(left, parameter_value, ctx)?;
            let right = evaluate(right, parameter_value, ctx)?;

            match op {
                BinaryOperation::Plus => Ok(left + right),
                BinaryOperation::Minus => Ok(left - right),
                BinaryOperation::Times => Ok(left * right),
                BinaryOperation::Divide => left.checked_div(&right),
                BinaryOperation::Power => left.pow(&right),
                BinaryOperation::PlusMinus => Err(EvaluationError::NotAScalar),
            }
        },
        Expression::Negate(inner) => Ok(-evaluate(inner, parameter_value, ctx)?),
        Expression::FunctionCall { function, argument } => {
            let argument = evaluate(argument, parameter_value, ctx)?;
            ctx.evaluate_function(function, &argument)
        },
        Expression::PlusMinus(_) | Expression::Tuple(_) => {
            Err(EvaluationError::NotAScalar)
        },
    }
}

/// Evaluate an expression which shouldn't contain any [`Parameter`]s.
pub fn evaluate_constant<C: Context>(
    expr: &Expression,
    ctx: &C,
) -> Result<Number, EvaluationError> {
    evaluate(expr, &|_: &Parameter| None, ctx)
}
