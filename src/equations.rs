use crate::{
    algebra::{ops::Context, parse, Expression, Parameter, ParseError},
    solve::{self, Solution, SolveError},
};
use std::{
    fmt::{self, Debug, Display, Formatter},
    iter::{Extend, FromIterator},
    str::FromStr,
};

/// Two expressions which are meant to be equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub left: Expression,
    pub right: Expression,
}

impl Equation {
    pub fn new(left: Expression, right: Expression) -> Self {
        Equation { left, right }
    }

    /// Treat a bare expression as `expr = 0`.
    pub fn equal_to_zero(expr: Expression) -> Self {
        Equation::new(expr, Expression::number(0))
    }

    /// The equation rearranged as `body = 0`.
    pub fn body(&self) -> Expression {
        self.left.clone() - self.right.clone()
    }

    pub fn unknowns(&self) -> Vec<Parameter> {
        let mut unknowns: Vec<_> = self
            .left
            .params()
            .chain(self.right.params())
            .cloned()
            .collect();
        unknowns.sort();
        unknowns.dedup();

        unknowns
    }
}

impl Display for Equation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

impl FromStr for Equation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.find('=') {
            Some(index) => {
                let (left, right) = s.split_at(index);
                let right = &right[1..];
                Ok(Equation::new(parse(left)?, parse(right)?))
            },
            None => Ok(Equation::equal_to_zero(parse(s)?)),
        }
    }
}

/// A builder for constructing a system of equations and solving them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SystemOfEquations {
    pub(crate) equations: Vec<Equation>,
}

impl SystemOfEquations {
    pub fn new() -> Self { SystemOfEquations::default() }

    pub fn with(mut self, equation: Equation) -> Self {
        self.push(equation);
        self
    }

    pub fn push(&mut self, equation: Equation) {
        self.equations.push(equation);
    }

    pub fn solve<C>(&self, ctx: &C) -> Result<Solution, SolveError>
    where
        C: Context,
    {
        let unknowns = self.unknowns();
        solve::solve_system(&self.equations, &unknowns, ctx)
    }

    pub fn unknowns(&self) -> Vec<Parameter> {
        let mut unknowns: Vec<_> = self
            .equations
            .iter()
            .flat_map(|eq| eq.unknowns())
            .collect();
        unknowns.sort();
        unknowns.dedup();

        unknowns
    }

    pub fn num_unknowns(&self) -> usize { self.unknowns().len() }

    pub fn len(&self) -> usize { self.equations.len() }

    pub fn is_empty(&self) -> bool { self.equations.is_empty() }

    pub fn from_equations<E, S>(equations: E) -> Result<Self, ParseError>
    where
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut system = SystemOfEquations::new();

        for equation in equations {
            system.push(equation.as_ref().parse()?);
        }

        Ok(system)
    }
}

impl Extend<Equation> for SystemOfEquations {
    fn extend<T: IntoIterator<Item = Equation>>(&mut self, iter: T) {
        self.equations.extend(iter);
    }
}

impl FromIterator<Equation> for SystemOfEquations {
    fn from_iter<T: IntoIterator<Item = Equation>>(iter: T) -> Self {
        SystemOfEquations {
            equations: Vec::from_iter(iter),
        }
    }
}

impl<'a> IntoIterator for &'a SystemOfEquations {
    type IntoIter = <&'a [Equation] as IntoIterator>::IntoIter;
    type Item = &'a Equation;

    fn into_iter(self) -> Self::IntoIter { self.equations.iter() }
}

impl IntoIterator for SystemOfEquations {
    type IntoIter = <Vec<Equation> as IntoIterator>::IntoIter;
    type Item = Equation;

    fn into_iter(self) -> Self::IntoIter { self.equations.into_iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_an_equation() {
        let got: Equation = "2x + 4 = 12".parse().unwrap();

        assert_eq!(got.to_string(), "2*x + 4 = 12");
        assert_eq!(got.body().to_string(), "2*x + 4 - 12");
    }

    #[test]
    fn a_bare_expression_is_equal_to_zero() {
        let got: Equation = "x - 1".parse().unwrap();

        assert_eq!(got, Equation::equal_to_zero("x - 1".parse().unwrap()));
    }

    #[test]
    fn collect_unknowns_from_every_equation() {
        let system =
            SystemOfEquations::from_equations(&["2x + 3y = 20", "x + y = 8"])
                .unwrap();

        assert_eq!(system.len(), 2);
        assert_eq!(
            system.unknowns(),
            vec![Parameter::named("x"), Parameter::named("y")]
        );
    }
}
