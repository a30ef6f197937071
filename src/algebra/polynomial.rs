//! Multivariate polynomials and rational functions with [`Number`]
//! coefficients.

use crate::{
    algebra::{
        ops::{Context, EvaluationError},
        BinaryOperation, Expression, Number, Parameter, MAX_EXPONENT,
    },
    solve::SolveError,
};
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    ops::{Add, Mul, Neg, Sub},
};

/// A product of unknowns raised to positive powers (`x^2*y`). The empty
/// monomial is the constant term.
pub type Monomial = BTreeMap<Parameter, u32>;

/// A sum of monomials, each with a non-zero coefficient.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, Number>,
}

impl Polynomial {
    pub fn zero() -> Self { Polynomial::default() }

    pub fn constant(value: Number) -> Self {
        let mut poly = Polynomial::zero();
        poly.add_term(Monomial::new(), value);
        poly
    }

    pub fn variable(param: Parameter) -> Self {
        let mut monomial = Monomial::new();
        monomial.insert(param, 1);

        let mut poly = Polynomial::zero();
        poly.add_term(monomial, Number::one());
        poly
    }

    /// Add `coefficient * monomial` to this polynomial, dropping the term if
    /// it cancels out.
    pub fn add_term(&mut self, monomial: Monomial, coefficient: Number) {
        let sum = match self.terms.remove(&monomial) {
            Some(existing) => existing + coefficient,
            None => coefficient,
        };

        if !sum.is_negligible() {
            self.terms.insert(monomial, sum);
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Number)> + '_ {
        self.terms.iter()
    }

    pub fn is_zero(&self) -> bool { self.terms.is_empty() }

    pub fn coefficient(&self, monomial: &Monomial) -> Number {
        self.terms.get(monomial).cloned().unwrap_or_else(Number::zero)
    }

    /// The value of this polynomial if it doesn't depend on any unknowns.
    pub fn as_constant(&self) -> Option<Number> {
        match self.terms.len() {
            0 => Some(Number::zero()),
            1 => self.terms.get(&Monomial::new()).cloned(),
            _ => None,
        }
    }

    /// The sorted set of unknowns this polynomial depends on.
    pub fn variables(&self) -> Vec<Parameter> {
        let mut variables: Vec<_> =
            self.terms.keys().flat_map(|m| m.keys()).cloned().collect();
        variables.sort();
        variables.dedup();

        variables
    }

    pub fn degree_in(&self, param: &Parameter) -> u32 {
        self.terms
            .keys()
            .filter_map(|m| m.get(param).copied())
            .max()
            .unwrap_or(0)
    }

    pub fn total_degree(&self) -> u32 {
        self.terms
            .keys()
            .map(|m| m.values().sum::<u32>())
            .max()
            .unwrap_or(0)
    }

    /// Treat this as a polynomial in `param` whose coefficients are
    /// polynomials in the remaining unknowns. Index `k` holds the
    /// coefficient of `param^k`.
    pub fn coefficients_in(&self, param: &Parameter) -> Vec<Polynomial> {
        let degree = self.degree_in(param) as usize;
        let mut coefficients = vec![Polynomial::zero(); degree + 1];

        for (monomial, coefficient) in &self.terms {
            let mut rest = monomial.clone();
            let power = rest.remove(param).unwrap_or(0) as usize;
            coefficients[power].add_term(rest, coefficient.clone());
        }

        coefficients
    }

    /// The numeric coefficients (lowest power first) when `param` is the
    /// only unknown.
    pub fn univariate_coefficients(
        &self,
        param: &Parameter,
    ) -> Option<Vec<Number>> {
        self.coefficients_in(param)
            .iter()
            .map(Polynomial::as_constant)
            .collect()
    }

    /// Replace `param` with another polynomial.
    pub fn substitute(
        &self,
        param: &Parameter,
        value: &Polynomial,
    ) -> Result<Polynomial, EvaluationError> {
        let mut result = Polynomial::zero();

        for (power, coefficient) in
            self.coefficients_in(param).into_iter().enumerate()
        {
            if coefficient.is_zero() {
                continue;
            }
            result = result + coefficient * value.pow(power as u32)?;
        }

        Ok(result)
    }

    pub fn evaluate<F>(&self, lookup: &F) -> Result<Number, EvaluationError>
    where
        F: Fn(&Parameter) -> Option<Number>,
    {
        let mut total = Number::zero();

        for (monomial, coefficient) in &self.terms {
            let mut term = coefficient.clone();

            for (param, power) in monomial {
                let value = lookup(param).ok_or_else(|| {
                    EvaluationError::UnknownParameter {
                        name: param.name().into(),
                    }
                })?;
                term = term * value.pow(&Number::from(i64::from(*power)))?;
            }

            total = total + term;
        }

        Ok(total)
    }

    /// The partial derivative with respect to `param`.
    pub fn derivative(&self, param: &Parameter) -> Polynomial {
        let mut result = Polynomial::zero();

        for (monomial, coefficient) in &self.terms {
            let power = match monomial.get(param) {
                Some(&power) => power,
                None => continue,
            };

            let mut reduced = monomial.clone();
            if power == 1 {
                reduced.remove(param);
            } else {
                reduced.insert(param.clone(), power - 1);
            }

            let factor = Number::from(i64::from(power));
            result.add_term(reduced, coefficient.clone() * factor);
        }

        result
    }

    pub fn scale(&self, factor: &Number) -> Polynomial {
        let mut result = Polynomial::zero();

        for (monomial, coefficient) in &self.terms {
            result.add_term(monomial.clone(), coefficient.clone() * factor.clone());
        }

        result
    }

    pub fn pow(&self, exponent: u32) -> Result<Polynomial, EvaluationError> {
        if exponent > MAX_EXPONENT || self.total_degree() * exponent > MAX_EXPONENT
        {
            return Err(EvaluationError::ExponentTooLarge);
        }

        let mut result = Polynomial::constant(Number::one());
        for _ in 0..exponent {
            result = result * self.clone();
        }

        Ok(result)
    }

    /// Scale the polynomial so its leading term (the greatest monomial) has a
    /// coefficient of one. Two polynomials which are constant multiples of
    /// each other have the same monic form.
    pub fn monic(&self) -> Polynomial {
        match self.terms.iter().next_back() {
            Some((_, leading)) => match leading.recip() {
                Ok(factor) => self.scale(&factor),
                Err(_) => self.clone(),
            },
            None => self.clone(),
        }
    }

    pub fn to_expression(&self) -> Expression {
        let mut terms = self.terms.iter().rev();

        let (monomial, coefficient) = match terms.next() {
            Some(term) => term,
            None => return Expression::number(0),
        };
        let mut expr = term_to_expression(monomial, coefficient.clone());

        for (monomial, coefficient) in terms {
            expr = if coefficient.is_negative() {
                let magnitude = -coefficient.clone();
                expr - term_to_expression(monomial, magnitude)
            } else {
                expr + term_to_expression(monomial, coefficient.clone())
            };
        }

        expr
    }
}

fn term_to_expression(monomial: &Monomial, coefficient: Number) -> Expression {
    let mut factors = monomial.iter().map(|(param, power)| {
        let base = Expression::Parameter(param.clone());
        if *power == 1 {
            base
        } else {
            Expression::binary(
                base,
                BinaryOperation::Power,
                Expression::number(i64::from(*power)),
            )
        }
    });

    let product = match factors.next() {
        Some(first) => factors.fold(first, |acc, factor| acc * factor),
        None => return Expression::Number(coefficient),
    };

    if coefficient.is_one() {
        product
    } else if (-coefficient.clone()).is_one() {
        -product
    } else {
        Expression::Number(coefficient) * product
    }
}

impl Display for Polynomial {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expression())
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(mut self, rhs: Polynomial) -> Polynomial {
        for (monomial, coefficient) in rhs.terms {
            self.add_term(monomial, coefficient);
        }
        self
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial { self + -rhs }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        Polynomial {
            terms: self
                .terms
                .into_iter()
                .map(|(monomial, coefficient)| (monomial, -coefficient))
                .collect(),
        }
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        let mut product = Polynomial::zero();

        for (left_monomial, left_coefficient) in &self.terms {
            for (right_monomial, right_coefficient) in &rhs.terms {
                let mut monomial = left_monomial.clone();
                for (param, power) in right_monomial {
                    *monomial.entry(param.clone()).or_insert(0) += power;
                }

                product.add_term(
                    monomial,
                    left_coefficient.clone() * right_coefficient.clone(),
                );
            }
        }

        product
    }
}

/// A ratio of two polynomials, used to clear denominators before solving.
///
/// Constant denominators are always folded into the numerator.
#[derive(Debug, Clone, PartialEq)]
pub struct Fraction {
    pub numerator: Polynomial,
    pub denominator: Polynomial,
}

impl Fraction {
    pub fn new(
        numerator: Polynomial,
        denominator: Polynomial,
    ) -> Result<Self, EvaluationError> {
        match denominator.as_constant() {
            Some(constant) if constant.is_negligible() => {
                Err(EvaluationError::DivisionByZero)
            },
            Some(constant) => Ok(Fraction {
                numerator: numerator.scale(&constant.recip()?),
                denominator: Polynomial::constant(Number::one()),
            }),
            None => Ok(Fraction {
                numerator,
                denominator,
            }),
        }
    }

    pub fn polynomial(numerator: Polynomial) -> Self {
        Fraction {
            numerator,
            denominator: Polynomial::constant(Number::one()),
        }
    }

    pub fn as_constant(&self) -> Option<Number> {
        match (self.numerator.as_constant(), self.denominator.as_constant()) {
            (Some(numerator), Some(denominator)) => {
                numerator.checked_div(&denominator).ok()
            },
            _ => None,
        }
    }

    /// Convert an expression into a ratio of polynomials, evaluating any
    /// constant sub-expressions along the way.
    pub fn from_expression<C: Context>(
        expr: &Expression,
        ctx: &C,
    ) -> Result<Fraction, SolveError> {
        match expr {
            Expression::Parameter(p) => {
                Ok(Fraction::polynomial(Polynomial::variable(p.clone())))
            },
            Expression::Number(n) => {
                Ok(Fraction::polynomial(Polynomial::constant(n.clone())))
            },
            Expression::Constant(c) => {
                Ok(Fraction::polynomial(Polynomial::constant(c.value())))
            },
            Expression::Negate(inner) => {
                let inner = Fraction::from_expression(inner, ctx)?;
                Ok(Fraction {
                    numerator: -inner.numerator,
                    denominator: inner.denominator,
                })
            },
            Expression::Binary { left, right, op } => {
                let left = Fraction::from_expression(left, ctx)?;
                let right = Fraction::from_expression(right, ctx)?;
                left.binary_op(*op, right)
            },
            Expression::FunctionCall { function, argument } => {
                let argument = Fraction::from_expression(argument, ctx)?;

                match argument.as_constant() {
                    Some(value) => {
                        let value = ctx.evaluate_function(function, &value)?;
                        Ok(Fraction::polynomial(Polynomial::constant(value)))
                    },
                    None => Err(SolveError::Unsupported {
                        reason: format!(
                            "{} of an unknown is not polynomial",
                            function
                        ),
                    }),
                }
            },
            Expression::PlusMinus(_) => Err(SolveError::Unsupported {
                reason: String::from("± must be expanded before solving"),
            }),
            Expression::Tuple(_) => Err(SolveError::Unsupported {
                reason: String::from("a tuple is not a single value"),
            }),
        }
    }

    fn binary_op(
        self,
        op: BinaryOperation,
        right: Fraction,
    ) -> Result<Fraction, SolveError> {
        let Fraction {
            numerator: a,
            denominator: b,
        } = self;
        let Fraction {
            numerator: c,
            denominator: d,
        } = right;

        let fraction = match op {
            BinaryOperation::Plus | BinaryOperation::Minus => {
                let c = if op == BinaryOperation::Minus { -c } else { c };

                if b == d {
                    Fraction::new(a + c, b)?
                } else {
                    Fraction::new(a * d.clone() + c * b.clone(), b * d)?
                }
            },
            BinaryOperation::Times => Fraction::new(a * c, b * d)?,
            BinaryOperation::Divide => {
                if c.is_zero() {
                    return Err(EvaluationError::DivisionByZero.into());
                }
                Fraction::new(a * d, b * c)?
            },
            BinaryOperation::Power => {
                let base = Fraction::new(a, b)?;
                let exponent = Fraction::new(c, d)?;
                return base.pow(&exponent);
            },
            BinaryOperation::PlusMinus => {
                return Err(SolveError::Unsupported {
                    reason: String::from("± must be expanded before solving"),
                })
            },
        };

        Ok(fraction)
    }

    fn pow(self, exponent: &Fraction) -> Result<Fraction, SolveError> {
        let exponent = exponent.as_constant().ok_or_else(|| {
            SolveError::Unsupported {
                reason: String::from("the exponent contains an unknown"),
            }
        })?;

        if let Some(base) = self.as_constant() {
            let value = base.pow(&exponent)?;
            return Ok(Fraction::polynomial(Polynomial::constant(value)));
        }

        let power = exponent
            .as_integer()
            .and_then(|n| i64::try_from(n).ok())
            .ok_or_else(|| SolveError::Unsupported {
                reason: format!("can't raise an unknown to the power {}", exponent),
            })?;
        let magnitude = u32::try_from(power.unsigned_abs())
            .map_err(|_| EvaluationError::ExponentTooLarge)?;

        let numerator = self.numerator.pow(magnitude)?;
        let denominator = self.denominator.pow(magnitude)?;

        if power < 0 {
            if numerator.is_zero() {
                return Err(EvaluationError::DivisionByZero.into());
            }
            Ok(Fraction::new(denominator, numerator)?)
        } else {
            Ok(Fraction::new(numerator, denominator)?)
        }
    }
}
