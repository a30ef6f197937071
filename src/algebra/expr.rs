use crate::algebra::Number;
use smol_str::SmolStr;
use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, Div, Mul, Neg, Sub},
};

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A free variable.
    Parameter(Parameter),
    Number(Number),
    /// A named constant like `pi`.
    Constant(Constant),
    /// An expression involving two operands.
    Binary {
        left: Box<Expression>,
        right: Box<Expression>,
        op: BinaryOperation,
    },
    /// Negate the expression.
    Negate(Box<Expression>),
    /// A prefix `±`, as in `x = ±4`.
    PlusMinus(Box<Expression>),
    /// Invoke a builtin function.
    FunctionCall {
        function: SmolStr,
        argument: Box<Expression>,
    },
    /// A parenthesised, comma-separated group like `(4, 4)` or `(6,)`.
    Tuple(Vec<Expression>),
}

impl Expression {
    pub fn number<N: Into<Number>>(value: N) -> Self {
        Expression::Number(value.into())
    }

    pub fn param<S: Into<SmolStr>>(name: S) -> Self {
        Expression::Parameter(Parameter::named(name))
    }

    pub fn binary(
        left: Expression,
        op: BinaryOperation,
        right: Expression,
    ) -> Self {
        Expression::Binary {
            left: Box::new(left),
            right: Box::new(right),
            op,
        }
    }

    pub fn is_constant(&self) -> bool { matches!(self, Expression::Number(_)) }

    /// Every [`Parameter`] referenced by this expression, in the order they
    /// appear (duplicates included).
    pub fn params(&self) -> impl Iterator<Item = &Parameter> + '_ {
        let mut params = Vec::new();
        self.collect_params(&mut params);
        params.into_iter()
    }

    fn collect_params<'a>(&'a self, params: &mut Vec<&'a Parameter>) {
        match self {
            Expression::Parameter(p) => params.push(p),
            Expression::Number(_) | Expression::Constant(_) => {},
            Expression::Binary { left, right, .. } => {
                left.collect_params(params);
                right.collect_params(params);
            },
            Expression::Negate(inner) | Expression::PlusMinus(inner) => {
                inner.collect_params(params)
            },
            Expression::FunctionCall { argument, .. } => {
                argument.collect_params(params)
            },
            Expression::Tuple(items) => {
                for item in items {
                    item.collect_params(params);
                }
            },
        }
    }

    /// The sorted, de-duplicated set of free variables.
    pub fn unknowns(&self) -> Vec<Parameter> {
        let mut unknowns: Vec<_> = self.params().cloned().collect();
        unknowns.sort();
        unknowns.dedup();
        unknowns
    }

    pub fn depends_on(&self, param: &Parameter) -> bool {
        self.params().any(|p| p == param)
    }

    /// Does a `±` appear anywhere in this expression?
    pub fn contains_plus_minus(&self) -> bool {
        match self {
            Expression::PlusMinus(_)
            | Expression::Binary {
                op: BinaryOperation::PlusMinus,
                ..
            } => true,
            Expression::Binary { left, right, .. } => {
                left.contains_plus_minus() || right.contains_plus_minus()
            },
            Expression::Negate(inner) => inner.contains_plus_minus(),
            Expression::FunctionCall { argument, .. } => {
                argument.contains_plus_minus()
            },
            Expression::Tuple(items) => {
                items.iter().any(Expression::contains_plus_minus)
            },
            Expression::Parameter(_)
            | Expression::Number(_)
            | Expression::Constant(_) => false,
        }
    }

    /// Binding strength, used to decide where parentheses are needed when
    /// printing.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Expression::Binary { op, .. } => op.precedence(),
            Expression::Negate(_) | Expression::PlusMinus(_) => 3,
            Expression::Number(n) if n.is_negative() || !n.is_real() => 3,
            _ => 5,
        }
    }
}

/// A free variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parameter {
    name: SmolStr,
}

impl Parameter {
    pub fn named<S: Into<SmolStr>>(name: S) -> Self {
        Parameter { name: name.into() }
    }

    pub fn name(&self) -> &str { &self.name }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Well-known constants which are never treated as free variables.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
    ImaginaryUnit,
}

impl Constant {
    pub fn from_name(name: &str) -> Option<Constant> {
        match name {
            "pi" => Some(Constant::Pi),
            "e" => Some(Constant::E),
            "I" => Some(Constant::ImaginaryUnit),
            _ => None,
        }
    }

    pub fn value(self) -> Number {
        match self {
            Constant::Pi => Number::float(std::f64::consts::PI),
            Constant::E => Number::float(std::f64::consts::E),
            Constant::ImaginaryUnit => Number::imaginary_unit(),
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Pi => write!(f, "pi"),
            Constant::E => write!(f, "e"),
            Constant::ImaginaryUnit => write!(f, "I"),
        }
    }
}

/// An operation that can be applied to two arguments.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOperation {
    Plus,
    Minus,
    PlusMinus,
    Times,
    Divide,
    Power,
}

impl BinaryOperation {
    pub(crate) fn precedence(self) -> u8 {
        match self {
            BinaryOperation::Plus
            | BinaryOperation::Minus
            | BinaryOperation::PlusMinus => 1,
            BinaryOperation::Times | BinaryOperation::Divide => 2,
            BinaryOperation::Power => 4,
        }
    }

    /// Does `left op right` need parentheses around the operand?
    pub(crate) fn needs_parens(self, operand: &Expression, is_left: bool) -> bool {
        let ours = self.precedence();
        let theirs = operand.precedence();

        match (self, is_left) {
            // powers are right-associative and bind tighter than negation
            (BinaryOperation::Power, true) => theirs <= ours,
            (BinaryOperation::Power, false) => theirs < 3,
            (_, true) => theirs < ours,
            (_, false) => theirs <= ours,
        }
    }
}

impl Display for BinaryOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperation::Plus => " + ",
            BinaryOperation::Minus => " - ",
            BinaryOperation::PlusMinus => " ± ",
            BinaryOperation::Times => "*",
            BinaryOperation::Divide => "/",
            BinaryOperation::Power => "^",
        };
        write!(f, "{}", symbol)
    }
}

// define some operator overloads to make constructing an expression easier.

impl Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::binary(self, BinaryOperation::Plus, rhs)
    }
}

impl Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::binary(self, BinaryOperation::Minus, rhs)
    }
}

impl Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::binary(self, BinaryOperation::Times, rhs)
    }
}

impl Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::binary(self, BinaryOperation::Divide, rhs)
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output { Expression::Negate(Box::new(self)) }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Parameter(p) => write!(f, "{}", p),
            Expression::Number(value) => write!(f, "{}", value),
            Expression::Constant(c) => write!(f, "{}", c),
            Expression::Binary { left, right, op } => {
                write_operand(left, op.needs_parens(left, true), f)?;
                write!(f, "{}", op)?;
                write_operand(right, op.needs_parens(right, false), f)
            },
            Expression::Negate(inner) => {
                write!(f, "-")?;
                write_operand(inner, inner.precedence() < 3, f)
            },
            Expression::PlusMinus(inner) => {
                write!(f, "±")?;
                write_operand(inner, inner.precedence() < 3, f)
            },
            Expression::FunctionCall { function, argument } => {
                write!(f, "{}({})", function, argument)
            },
            Expression::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            },
        }
    }
}

fn write_operand(
    expr: &Expression,
    parenthesize: bool,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let x = || Expression::param("x");
        let inputs = vec![
            (Expression::number(3), "3"),
            (
                Expression::FunctionCall {
                    function: "sin".into(),
                    argument: Box::new(Expression::number(5)),
                },
                "sin(5)",
            ),
            (-Expression::number(5), "-5"),
            (Expression::number(1) + Expression::number(1), "1 + 1"),
            (Expression::number(1) - Expression::number(1), "1 - 1"),
            (Expression::number(1) * Expression::number(1), "1*1"),
            (Expression::number(1) / Expression::number(1), "1/1"),
            (
                (Expression::number(1) + Expression::number(2))
                    / Expression::number(3),
                "(1 + 2)/3",
            ),
            (
                Expression::number(1) - (x() - Expression::number(3)),
                "1 - (x - 3)",
            ),
            (
                Expression::binary(-x(), BinaryOperation::Power, Expression::number(2)),
                "(-x)^2",
            ),
            (
                -Expression::binary(x(), BinaryOperation::Power, Expression::number(2)),
                "-x^2",
            ),
            (Expression::PlusMinus(Box::new(Expression::number(4))), "±4"),
            (
                Expression::Tuple(vec![Expression::number(4), Expression::number(4)]),
                "(4, 4)",
            ),
            (Expression::Tuple(vec![Expression::number(6)]), "(6,)"),
            (Expression::Constant(Constant::ImaginaryUnit), "I"),
        ];

        for (expr, should_be) in inputs {
            let got = expr.to_string();
            assert_eq!(got, should_be);
        }
    }

    #[test]
    fn unknowns_are_sorted_and_unique() {
        let expr = Expression::param("y") * Expression::param("x")
            + Expression::param("y");

        let got = expr.unknowns();

        assert_eq!(got, vec![Parameter::named("x"), Parameter::named("y")]);
        assert!(expr.depends_on(&Parameter::named("x")));
        assert!(!expr.depends_on(&Parameter::named("z")));
    }
}
