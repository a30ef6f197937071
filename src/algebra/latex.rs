//! Rendering expressions as LaTeX for display.

use crate::algebra::{
    BinaryOperation, Constant, Expression, Number, Statement,
};
use std::fmt::{self, Display, Formatter};

/// Render a whole line of working as LaTeX.
pub fn to_latex(statement: &Statement) -> String {
    match statement {
        Statement::Expression(expr) => Latex(expr).to_string(),
        Statement::Equation(eq) => {
            format!("{} = {}", Latex(&eq.left), Latex(&eq.right))
        },
        Statement::Inequality(ineq) => {
            let symbol = match ineq.op.symbol() {
                "<=" => "\\leq",
                ">=" => "\\geq",
                other => other,
            };
            format!("{} {} {}", Latex(&ineq.left), symbol, Latex(&ineq.right))
        },
        Statement::ValueTuple(items) => items
            .iter()
            .map(|item| Latex(item).to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// A wrapper which displays an [`Expression`] as LaTeX.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Latex<'a>(pub &'a Expression);

impl Display for Latex<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expression::Parameter(p) => write!(f, "{}", p),
            Expression::Number(n) => write_number(n, f),
            Expression::Constant(c) => match c {
                Constant::Pi => write!(f, "\\pi"),
                Constant::E => write!(f, "e"),
                Constant::ImaginaryUnit => write!(f, "i"),
            },
            Expression::Binary { left, right, op } => {
                write_binary(left, *op, right, f)
            },
            Expression::Negate(inner) => {
                write!(f, "-")?;
                write_operand(inner, inner.precedence() < 3, f)
            },
            Expression::PlusMinus(inner) => {
                write!(f, "\\pm ")?;
                write_operand(inner, inner.precedence() < 3, f)
            },
            Expression::FunctionCall { function, argument } => {
                match function.as_str() {
                    "sqrt" => write!(f, "\\sqrt{{{}}}", Latex(argument)),
                    "abs" => write!(f, "\\left|{}\\right|", Latex(argument)),
                    other => {
                        write!(f, "\\{}{{\\left({} \\right)}}", other, Latex(argument))
                    },
                }
            },
            Expression::Tuple(items) => {
                write!(f, "\\left(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Latex(item))?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, "\\right)")
            },
        }
    }
}

fn write_number(n: &Number, f: &mut Formatter<'_>) -> fmt::Result {
    match n.as_rational() {
        Some(r) if !r.is_integer() => {
            let sign = if n.is_negative() { "-" } else { "" };
            let numerator = if n.is_negative() {
                -r.numer().clone()
            } else {
                r.numer().clone()
            };
            write!(f, "{}\\frac{{{}}}{{{}}}", sign, numerator, r.denom())
        },
        _ => write!(f, "{}", n),
    }
}

fn write_binary(
    left: &Expression,
    op: BinaryOperation,
    right: &Expression,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    match op {
        BinaryOperation::Divide => {
            write!(f, "\\frac{{{}}}{{{}}}", Latex(left), Latex(right))
        },
        BinaryOperation::Power => {
            write_operand(left, op.needs_parens(left, true), f)?;
            write!(f, "^{{{}}}", Latex(right))
        },
        _ => {
            write_operand(left, op.needs_parens(left, true), f)?;
            let symbol = match op {
                BinaryOperation::Plus => " + ",
                BinaryOperation::Minus => " - ",
                BinaryOperation::PlusMinus => " \\pm ",
                // a bare number on the right would run into the left operand
                BinaryOperation::Times if starts_with_digit(right) => " \\cdot ",
                _ => " ",
            };
            write!(f, "{}", symbol)?;
            write_operand(right, op.needs_parens(right, false), f)
        },
    }
}

fn starts_with_digit(expr: &Expression) -> bool {
    match expr {
        Expression::Number(_) => true,
        Expression::Binary { left, .. } => starts_with_digit(left),
        _ => false,
    }
}

fn write_operand(
    expr: &Expression,
    parenthesize: bool,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    if parenthesize {
        write!(f, "\\left({}\\right)", Latex(expr))
    } else {
        write!(f, "{}", Latex(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::parse_statement;

    fn render(src: &str) -> String {
        to_latex(&parse_statement(src).unwrap())
    }

    #[test]
    fn render_statements() {
        let inputs = vec![
            ("2x", "2 x"),
            ("3*4", "3 \\cdot 4"),
            ("x/2", "\\frac{x}{2}"),
            ("x^2 + 1", "x^{2} + 1"),
            ("(x + 1)(x - 1)", "\\left(x + 1\\right) \\left(x - 1\\right)"),
            ("sqrt(x)", "\\sqrt{x}"),
            ("abs(x - 2)", "\\left|x - 2\\right|"),
            ("sin(x)", "\\sin{\\left(x \\right)}"),
            ("2pi", "2 \\pi"),
            ("x = ±4", "x = \\pm 4"),
            ("x <= 3", "x \\leq 3"),
            ("y > 1", "y > 1"),
            ("4, -4", "4, -4"),
            ("(4, 4)", "\\left(4, 4\\right)"),
        ];

        for (src, should_be) in inputs {
            assert_eq!(render(src), should_be, "{}", src);
        }
    }

    #[test]
    fn exact_fractions() {
        let expr = Expression::Number(Number::fraction(-3, 2));

        assert_eq!(Latex(&expr).to_string(), "-\\frac{3}{2}");
    }
}
