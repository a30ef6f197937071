use crate::{
    algebra::{
        ops::{self, Context},
        BinaryOperation, Expression, Parameter,
    },
    equations::Equation,
};
use std::fmt::{self, Display, Formatter};

/// The most `±` signs we are willing to expand in a single statement. Each
/// one doubles the number of variants.
pub const MAX_PLUS_MINUS: usize = 3;

/// Everything a single line (or clause) of text can parse to.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    Equation(Equation),
    Inequality(Inequality),
    /// A bare comma-separated list, as in `4, -4`.
    ValueTuple(Vec<Expression>),
}

impl Statement {
    /// Fold any constant sub-expressions, leaving the shape of the statement
    /// intact.
    pub fn evaluated<C: Context>(&self, ctx: &C) -> Statement {
        let mut evaluated = self.clone();

        for expr in evaluated.expressions_mut() {
            *expr = ops::fold_constants(expr, ctx);
        }

        evaluated
    }

    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Statement::Expression(expr) => vec![expr],
            Statement::Equation(eq) => vec![&eq.left, &eq.right],
            Statement::Inequality(ineq) => vec![&ineq.left, &ineq.right],
            Statement::ValueTuple(items) => items.iter().collect(),
        }
    }

    fn expressions_mut(&mut self) -> Vec<&mut Expression> {
        match self {
            Statement::Expression(expr) => vec![expr],
            Statement::Equation(eq) => vec![&mut eq.left, &mut eq.right],
            Statement::Inequality(ineq) => {
                vec![&mut ineq.left, &mut ineq.right]
            },
            Statement::ValueTuple(items) => items.iter_mut().collect(),
        }
    }

    /// The sorted, de-duplicated free variables.
    pub fn unknowns(&self) -> Vec<Parameter> {
        let mut unknowns: Vec<_> = self
            .expressions()
            .into_iter()
            .flat_map(|expr| expr.params())
            .cloned()
            .collect();
        unknowns.sort();
        unknowns.dedup();

        unknowns
    }

    /// How many times `±` appears in this statement.
    pub fn plus_minus_count(&self) -> usize {
        self.expressions()
            .into_iter()
            .map(count_plus_minus)
            .sum()
    }

    /// Replace every `±` with `+` and `-`, returning every combination.
    ///
    /// Callers should check [`Statement::plus_minus_count()`] against
    /// [`MAX_PLUS_MINUS`] first, the number of variants grows exponentially.
    pub fn expand_plus_minus(&self) -> Vec<Statement> {
        let mut pending = vec![self.clone()];
        let mut expanded = Vec::new();

        while let Some(statement) = pending.pop() {
            match statement.split_plus_minus() {
                Some((plus, minus)) => {
                    pending.push(minus);
                    pending.push(plus);
                },
                None => expanded.push(statement),
            }
        }

        expanded
    }

    /// Split the first `±` into its `+` and `-` variants.
    fn split_plus_minus(&self) -> Option<(Statement, Statement)> {
        let index = self
            .expressions()
            .into_iter()
            .position(Expression::contains_plus_minus)?;
        let (with_plus, with_minus) =
            split_expression(self.expressions()[index])?;

        let mut plus = self.clone();
        *plus.expressions_mut()[index] = with_plus;
        let mut minus = self.clone();
        *minus.expressions_mut()[index] = with_minus;

        Some((plus, minus))
    }
}

fn count_plus_minus(expr: &Expression) -> usize {
    match expr {
        Expression::PlusMinus(inner) => 1 + count_plus_minus(inner),
        Expression::Binary { left, right, op } => {
            let here = usize::from(*op == BinaryOperation::PlusMinus);
            here + count_plus_minus(left) + count_plus_minus(right)
        },
        Expression::Negate(inner) => count_plus_minus(inner),
        Expression::FunctionCall { argument, .. } => count_plus_minus(argument),
        Expression::Tuple(items) => items.iter().map(count_plus_minus).sum(),
        Expression::Parameter(_)
        | Expression::Number(_)
        | Expression::Constant(_) => 0,
    }
}

/// Rewrite the first (left-most, outer-most) `±` as a `+` and a `-`.
fn split_expression(expr: &Expression) -> Option<(Expression, Expression)> {
    match expr {
        Expression::PlusMinus(inner) => {
            Some((*inner.clone(), -*inner.clone()))
        },
        Expression::Binary {
            left,
            right,
            op: BinaryOperation::PlusMinus,
        } => Some((
            Expression::binary(*left.clone(), BinaryOperation::Plus, *right.clone()),
            Expression::binary(
                *left.clone(),
                BinaryOperation::Minus,
                *right.clone(),
            ),
        )),
        Expression::Binary { left, right, op } => {
            if let Some((l_plus, l_minus)) = split_expression(left) {
                Some((
                    Expression::binary(l_plus, *op, *right.clone()),
                    Expression::binary(l_minus, *op, *right.clone()),
                ))
            } else {
                let (r_plus, r_minus) = split_expression(right)?;
                Some((
                    Expression::binary(*left.clone(), *op, r_plus),
                    Expression::binary(*left.clone(), *op, r_minus),
                ))
            }
        },
        Expression::Negate(inner) => {
            let (plus, minus) = split_expression(inner)?;
            Some((-plus, -minus))
        },
        Expression::FunctionCall { function, argument } => {
            let (plus, minus) = split_expression(argument)?;
            let call = |argument| Expression::FunctionCall {
                function: function.clone(),
                argument: Box::new(argument),
            };
            Some((call(plus), call(minus)))
        },
        Expression::Tuple(items) => {
            let index = items.iter().position(Expression::contains_plus_minus)?;
            let (plus, minus) = split_expression(&items[index])?;

            let mut with_plus = items.clone();
            with_plus[index] = plus;
            let mut with_minus = items.clone();
            with_minus[index] = minus;

            Some((Expression::Tuple(with_plus), Expression::Tuple(with_minus)))
        },
        Expression::Parameter(_)
        | Expression::Number(_)
        | Expression::Constant(_) => None,
    }
}

impl From<Expression> for Statement {
    fn from(expr: Expression) -> Statement { Statement::Expression(expr) }
}

impl From<Equation> for Statement {
    fn from(eq: Equation) -> Statement { Statement::Equation(eq) }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expression(expr) => write!(f, "{}", expr),
            Statement::Equation(eq) => write!(f, "{}", eq),
            Statement::Inequality(ineq) => write!(f, "{}", ineq),
            Statement::ValueTuple(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            },
        }
    }
}

/// Something like `2x + 1 < 5`.
#[derive(Debug, Clone, PartialEq)]
pub struct Inequality {
    pub left: Expression,
    pub op: InequalityKind,
    pub right: Expression,
}

impl Inequality {
    pub fn new(left: Expression, op: InequalityKind, right: Expression) -> Self {
        Inequality { left, op, right }
    }

    /// The inequality rearranged as `body op 0`.
    pub fn body(&self) -> Expression {
        self.left.clone() - self.right.clone()
    }
}

impl Display for Inequality {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InequalityKind {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl InequalityKind {
    /// Is the boundary itself excluded?
    pub fn is_strict(self) -> bool {
        matches!(self, InequalityKind::Less | InequalityKind::Greater)
    }

    /// Does `value op 0` hold?
    pub fn holds_against_zero(self, value: f64) -> bool {
        match self {
            InequalityKind::Less => value < 0.0,
            InequalityKind::LessEqual => value <= 0.0,
            InequalityKind::Greater => value > 0.0,
            InequalityKind::GreaterEqual => value >= 0.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            InequalityKind::Less => "<",
            InequalityKind::LessEqual => "<=",
            InequalityKind::Greater => ">",
            InequalityKind::GreaterEqual => ">=",
        }
    }
}

impl Display for InequalityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{ops::Builtins, parse_statement};

    fn variants(src: &str) -> Vec<String> {
        parse_statement(src)
            .unwrap()
            .expand_plus_minus()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn expand_a_prefix_plus_minus() {
        assert_eq!(variants("x = ±4"), vec!["x = 4", "x = -4"]);
    }

    #[test]
    fn expand_an_infix_plus_minus() {
        assert_eq!(variants("x = 3 ± 2"), vec!["x = 3 + 2", "x = 3 - 2"]);
    }

    #[test]
    fn every_combination_is_generated() {
        let got = variants("±1 ± 2");

        assert_eq!(got, vec!["1 + 2", "-1 + 2", "1 - 2", "-1 - 2"]);
    }

    #[test]
    fn statements_without_plus_minus_are_untouched() {
        assert_eq!(variants("x + 1 = 2"), vec!["x + 1 = 2"]);
    }

    #[test]
    fn count_plus_minus_signs() {
        let statement = parse_statement("(±1, ±2) = x ± y").unwrap();

        assert_eq!(statement.plus_minus_count(), 3);
    }

    #[test]
    fn evaluating_folds_both_sides() {
        let statement = parse_statement("2*3 + x = 10 - 4").unwrap();

        let got = statement.evaluated(&Builtins);

        assert_eq!(got.to_string(), "6 + x = 6");
        assert_eq!(got.unknowns(), vec![Parameter::named("x")]);
    }

    #[test]
    fn inequality_kinds() {
        assert!(InequalityKind::Less.holds_against_zero(-1.0));
        assert!(!InequalityKind::Less.holds_against_zero(0.0));
        assert!(InequalityKind::GreaterEqual.holds_against_zero(0.0));
        assert!(InequalityKind::Greater.is_strict());
        assert!(!InequalityKind::LessEqual.is_strict());
    }
}
