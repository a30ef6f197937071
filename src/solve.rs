use crate::{
    algebra::{
        ops::{Context, EvaluationError},
        roots, Fraction, Inequality, Monomial, Number, Parameter, Polynomial,
    },
    equations::Equation,
    solution::{Bound, Interval, Region},
};
use nalgebra::{DMatrix as Matrix, DVector as Vector};

/// The most unknowns a single problem may contain.
pub const MAX_UNKNOWNS: usize = 2;

/// Residuals smaller than this are close enough to zero when checking a
/// candidate solution.
const RESIDUAL_TOLERANCE: f64 = 1e-6;

/// The result of solving a system of equations.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// Specific points, with one value per unknown (in the same order as the
    /// unknowns passed to the solver).
    Points(Vec<Vec<Number>>),
    /// Infinitely many points, all lying on this (monic) relation.
    Underdetermined(Polynomial),
    /// Every value of the unknowns works.
    Everything,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("unable to solve: {reason}")]
    Unsupported { reason: String },
    #[error("at most {} unknowns are supported, but found {found}", MAX_UNKNOWNS)]
    TooManyUnknowns { found: usize },
    #[error("expected {expected} values but found {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Find every point satisfying all of the equations.
///
/// Linear systems are solved exactly using Gauss-Jordan elimination. For
/// non-linear systems we try to eliminate one unknown by substitution,
/// falling back to Newton's method when no equation is linear in any
/// unknown.
pub fn solve_system<C>(
    equations: &[Equation],
    unknowns: &[Parameter],
    ctx: &C,
) -> Result<Solution, SolveError>
where
    C: Context,
{
    if unknowns.len() > MAX_UNKNOWNS {
        return Err(SolveError::TooManyUnknowns {
            found: unknowns.len(),
        });
    }

    let mut numerators = Vec::new();
    let mut denominators = Vec::new();

    for equation in equations {
        let Fraction {
            numerator,
            denominator,
        } = Fraction::from_expression(&equation.body(), ctx)?;

        if numerator.is_zero() {
            log::trace!("\"{}\" is an identity", equation);
            continue;
        }

        if numerator.as_constant().is_some() {
            log::debug!("\"{}\" is a contradiction", equation);
            return Ok(Solution::Points(Vec::new()));
        }

        numerators.push(numerator);
        denominators.push(denominator);
    }

    if numerators.is_empty() {
        return Ok(Solution::Everything);
    }

    let solution = if numerators.iter().all(|p| p.total_degree() <= 1) {
        gauss_jordan(&numerators, unknowns)?
    } else {
        solve_nonlinear(&numerators, unknowns)?
    };

    match solution {
        Solution::Points(points) => {
            // throw away anything that would divide by zero
            let points = points
                .into_iter()
                .filter(|point| {
                    let lookup = lookup_value_by_name(unknowns, point);
                    denominators.iter().all(|d| !vanishes(d, &lookup))
                })
                .collect();

            Ok(Solution::Points(points))
        },
        other => Ok(other),
    }
}

fn lookup_value_by_name<'p>(
    unknowns: &'p [Parameter],
    values: &'p [Number],
) -> impl Fn(&Parameter) -> Option<Number> + 'p {
    move |parameter| {
        unknowns
            .iter()
            .position(|p| p == parameter)
            .and_then(|ix| values.get(ix).cloned())
    }
}

/// Does the polynomial evaluate to (roughly) zero? Anything that can't be
/// evaluated is treated as zero.
///
/// The residual is measured relative to the size of the terms being summed,
/// so high degree polynomials with large coefficients aren't held to an
/// impossible absolute standard.
fn vanishes<F>(poly: &Polynomial, lookup: &F) -> bool
where
    F: Fn(&Parameter) -> Option<Number>,
{
    let residual = match poly.evaluate(lookup) {
        Ok(value) => value.to_complex64().norm(),
        Err(_) => return true,
    };

    residual < RESIDUAL_TOLERANCE * (1.0 + term_magnitude(poly, lookup))
}

/// The sum of `|coefficient| * |x|^power` over every term.
fn term_magnitude<F>(poly: &Polynomial, lookup: &F) -> f64
where
    F: Fn(&Parameter) -> Option<Number>,
{
    poly.terms()
        .map(|(monomial, coefficient)| {
            monomial.iter().fold(
                coefficient.to_complex64().norm(),
                |magnitude, (param, power)| {
                    let value = lookup(param)
                        .map(|v| v.to_complex64().norm())
                        .unwrap_or(0.0);
                    magnitude * value.powi(*power as i32)
                },
            )
        })
        .sum()
}

fn linear_monomial(param: &Parameter) -> Monomial {
    let mut monomial = Monomial::new();
    monomial.insert(param.clone(), 1);
    monomial
}

/// Solve a linear system exactly by reducing its augmented matrix to
/// reduced row echelon form.
fn gauss_jordan(
    equations: &[Polynomial],
    unknowns: &[Parameter],
) -> Result<Solution, SolveError> {
    let rows = equations.len();
    let n = unknowns.len();

    let mut m = Matrix::from_fn(rows, n + 1, |r, c| {
        if c < n {
            equations[r].coefficient(&linear_monomial(&unknowns[c]))
        } else {
            -equations[r].coefficient(&Monomial::new())
        }
    });

    let mut pivot_row = 0;
    let mut pivot_columns = Vec::new();

    for column in 0..n {
        if pivot_row == rows {
            break;
        }

        let found = (pivot_row..rows).find(|&r| !m[(r, column)].is_negligible());
        let r = match found {
            Some(r) => r,
            None => continue,
        };
        m.swap_rows(pivot_row, r);

        let pivot = m[(pivot_row, column)].clone();
        for c in 0..=n {
            m[(pivot_row, c)] = m[(pivot_row, c)].checked_div(&pivot)?;
        }

        for other in 0..rows {
            let factor = m[(other, column)].clone();
            if other == pivot_row || factor.is_negligible() {
                continue;
            }

            for c in 0..=n {
                let value = m[(other, c)].clone()
                    - factor.clone() * m[(pivot_row, c)].clone();
                m[(other, c)] = value;
            }
        }

        pivot_columns.push(column);
        pivot_row += 1;
    }

    // a row of zeros equal to something non-zero
    if (pivot_row..rows).any(|r| !m[(r, n)].is_negligible()) {
        return Ok(Solution::Points(Vec::new()));
    }

    if pivot_columns.len() == n {
        let point = (0..n).map(|r| m[(r, n)].clone()).collect();
        return Ok(Solution::Points(vec![point]));
    }

    if pivot_row == 0 {
        return Ok(Solution::Everything);
    }

    // With at most two unknowns, being underdetermined means there's a
    // single independent equation left.
    let mut relation = Polynomial::constant(-m[(0, n)].clone());
    for (c, unknown) in unknowns.iter().enumerate() {
        relation = relation + Polynomial::variable(unknown.clone()).scale(&m[(0, c)]);
    }

    Ok(Solution::Underdetermined(relation.monic()))
}

fn solve_nonlinear(
    equations: &[Polynomial],
    unknowns: &[Parameter],
) -> Result<Solution, SolveError> {
    match unknowns {
        [unknown] => {
            let candidates = univariate_roots(&equations[0], unknown)?;
            let points = candidates
                .into_iter()
                .map(|root| vec![root])
                .filter(|point| satisfies_all(equations, unknowns, point))
                .collect();

            Ok(Solution::Points(points))
        },
        [_, _] if equations.len() == 1 => {
            Ok(Solution::Underdetermined(equations[0].monic()))
        },
        [_, _] => match find_linear_unknown(equations, unknowns) {
            Some((index, eliminated)) => {
                solve_by_substitution(equations, unknowns, index, eliminated)
            },
            None => solve_with_newtons_method(equations, unknowns),
        },
        _ => Err(SolveError::Unsupported {
            reason: String::from("there is nothing to solve for"),
        }),
    }
}

fn univariate_roots(
    poly: &Polynomial,
    unknown: &Parameter,
) -> Result<Vec<Number>, SolveError> {
    let coefficients = poly.univariate_coefficients(unknown).ok_or_else(|| {
        SolveError::Unsupported {
            reason: format!("\"{}\" depends on more than just {}", poly, unknown),
        }
    })?;

    Ok(roots::roots(&coefficients)?)
}

fn satisfies_all(
    equations: &[Polynomial],
    unknowns: &[Parameter],
    point: &[Number],
) -> bool {
    let lookup = lookup_value_by_name(unknowns, point);
    equations.iter().all(|eq| vanishes(eq, &lookup))
}

/// Find an equation which is linear in one of the unknowns, preferring one
/// where that unknown has a constant coefficient.
fn find_linear_unknown<'p>(
    equations: &[Polynomial],
    unknowns: &'p [Parameter],
) -> Option<(usize, &'p Parameter)> {
    let mut candidates = Vec::new();

    for (index, equation) in equations.iter().enumerate() {
        for unknown in unknowns {
            if equation.degree_in(unknown) == 1 {
                let coefficient = &equation.coefficients_in(unknown)[1];
                candidates.push((coefficient.as_constant().is_none(), index, unknown));
            }
        }
    }

    candidates
        .into_iter()
        .min_by_key(|(variable_coefficient, index, _)| {
            (*variable_coefficient, *index)
        })
        .map(|(_, index, unknown)| (index, unknown))
}

/// Rewrite `equations[index]` as `a*u + b = 0` so `u = -b/a`, substitute that
/// into every other equation and solve what's left.
fn solve_by_substitution(
    equations: &[Polynomial],
    unknowns: &[Parameter],
    index: usize,
    eliminated: &Parameter,
) -> Result<Solution, SolveError> {
    let remaining = unknowns
        .iter()
        .find(|p| *p != eliminated)
        .ok_or_else(|| SolveError::Unsupported {
            reason: String::from("nothing left to substitute into"),
        })?;

    let coefficients = equations[index].coefficients_in(eliminated);
    let b = &coefficients[0];
    let a = &coefficients[1];
    log::debug!(
        "Substituting {} = -({})/({}) into the rest of the system",
        eliminated,
        b,
        a
    );

    let mut reduced = Vec::new();
    for (i, equation) in equations.iter().enumerate() {
        if i == index {
            continue;
        }

        let substituted = eliminate(equation, eliminated, a, b)?;
        if substituted.is_zero() {
            continue;
        }
        if substituted.as_constant().is_some() {
            return Ok(Solution::Points(Vec::new()));
        }
        reduced.push(substituted);
    }

    if reduced.is_empty() {
        return Ok(Solution::Underdetermined(equations[index].monic()));
    }

    let mut points = Vec::new();

    for value in univariate_roots(&reduced[0], remaining)? {
        let lookup = |p: &Parameter| {
            if p == remaining {
                Some(value.clone())
            } else {
                None
            }
        };

        let a_value = a.evaluate(&lookup)?;
        if a_value.is_negligible() {
            log::trace!("Skipping {} = {}, it zeroes the coefficient", remaining, value);
            continue;
        }
        let u = (-b.evaluate(&lookup)?).checked_div(&a_value)?;

        let point: Vec<Number> = unknowns
            .iter()
            .map(|p| if p == eliminated { u.clone() } else { value.clone() })
            .collect();

        if satisfies_all(equations, unknowns, &point) {
            points.push(point);
        }
    }

    Ok(Solution::Points(points))
}

/// Substitute `u = -b/a` into `poly`, multiplying through by `a^d` (where `d`
/// is the degree of `poly` in `u`) so the result stays a polynomial.
fn eliminate(
    poly: &Polynomial,
    u: &Parameter,
    a: &Polynomial,
    b: &Polynomial,
) -> Result<Polynomial, EvaluationError> {
    let coefficients = poly.coefficients_in(u);
    let degree = coefficients.len() as u32 - 1;
    let negative_b = -b.clone();

    let mut result = Polynomial::zero();

    for (k, coefficient) in coefficients.into_iter().enumerate() {
        let k = k as u32;
        let term =
            coefficient * negative_b.pow(k)? * a.pow(degree - k)?;
        result = result + term;
    }

    Ok(result)
}

/// Solve a set of non-linear equations iteratively using Newton's method,
/// starting from a grid of initial guesses and keeping every distinct real
/// solution we converge to.
///
/// The iterative equation for Newton's method when applied to a set of
/// equations, `F`, is:
///
/// ```text
///  x_next = x_current - jacobian(F).inverse() * F(x_current)
/// ```
///
/// Calculating the inverse of a matrix is expensive though, so we rearrange
/// it to look like this:
///
/// ```text
/// jacobian(F) * (x_next - x_current) = -F(x_current)
/// ```
///
/// ... Which is in the form `A.δx = b`, and can be solved with an LU
/// decomposition.
///
/// See also:
///
/// - https://en.wikipedia.org/wiki/Newton%27s_method#Nonlinear_systems_of_equations
fn solve_with_newtons_method(
    equations: &[Polynomial],
    unknowns: &[Parameter],
) -> Result<Solution, SolveError> {
    // only a square system has an invertible jacobian
    let square = &equations[..unknowns.len()];
    let jacobian = Jacobian::for_equations(square, unknowns);

    let mut found: Vec<Vector<f64>> = Vec::new();

    for guess in initial_guesses(unknowns.len()) {
        let solution = match newton(&jacobian, square, guess) {
            Some(solution) => solution,
            None => continue,
        };

        let seen = found
            .iter()
            .any(|existing| approx::relative_eq!(*existing, solution, epsilon = 1e-6));
        if !seen {
            found.push(solution);
        }
    }

    log::debug!("Newton's method found {} solution(s)", found.len());

    let points = found
        .into_iter()
        .map(|x| x.iter().map(|&v| Number::float(v)).collect::<Vec<_>>())
        .filter(|point| satisfies_all(equations, unknowns, point))
        .collect();

    Ok(Solution::Points(points))
}

fn initial_guesses(dimensions: usize) -> impl Iterator<Item = Vector<f64>> {
    // slightly off-centre so we don't start on a line of symmetry
    let steps: Vec<f64> = (-4..=4).map(|k| f64::from(k) * 2.5 + 0.3).collect();
    let count = steps.len().pow(dimensions as u32);

    (0..count).map(move |mut ix| {
        Vector::from_fn(dimensions, |_, _| {
            let value = steps[ix % steps.len()];
            ix /= steps.len();
            value
        })
    })
}

fn newton(
    jacobian: &Jacobian<'_>,
    equations: &[Polynomial],
    mut x: Vector<f64>,
) -> Option<Vector<f64>> {
    const MAX_ITERATIONS: usize = 50;

    for _ in 0..MAX_ITERATIONS {
        let f_of_x = evaluate_all(equations, jacobian.unknowns, &x).ok()?;
        let evaluated_jacobian = jacobian.evaluate(x.as_slice()).ok()?;
        let x_next = step_newtons_method(evaluated_jacobian, &x, f_of_x)?;

        if approx::relative_eq!(x_next, x) {
            return Some(x_next);
        }
        x = x_next;
    }

    None
}

fn evaluate_all(
    equations: &[Polynomial],
    unknowns: &[Parameter],
    x: &Vector<f64>,
) -> Result<Vector<f64>, EvaluationError> {
    let values: Vec<Number> = x.iter().map(|&v| Number::float(v)).collect();
    let lookup = lookup_value_by_name(unknowns, &values);

    let mut results = Vec::with_capacity(equations.len());
    for equation in equations {
        results.push(equation.evaluate(&lookup)?.to_complex64().re);
    }

    Ok(Vector::from_vec(results))
}

fn step_newtons_method(
    jacobian: Matrix<f64>,
    x: &Vector<f64>,
    f_of_x: Vector<f64>,
) -> Option<Vector<f64>> {
    // We're trying to solve:
    //   x_next = x_current - jacobian(F).inverse() * F(x_current)
    //
    // Which gets rearranged as:
    //   jacobian(F) * (x_next - x_current) = -F(x_current)
    let negative_f_of_x = -f_of_x;
    let delta_x = jacobian.lu().solve(&negative_f_of_x)?;

    Some(delta_x + x)
}

/// A matrix of [`Polynomial`]s representing the partial derivatives for each
/// unknown in each equation.
#[derive(Debug, Clone, PartialEq)]
struct Jacobian<'a> {
    cells: Box<[Polynomial]>,
    rows: usize,
    unknowns: &'a [Parameter],
}

impl<'a> Jacobian<'a> {
    fn for_equations(equations: &[Polynomial], unknowns: &'a [Parameter]) -> Self {
        let cells: Vec<Polynomial> = equations
            .iter()
            .flat_map(|eq| unknowns.iter().map(move |u| eq.derivative(u)))
            .collect();

        Jacobian {
            cells: cells.into_boxed_slice(),
            rows: equations.len(),
            unknowns,
        }
    }

    fn columns(&self) -> usize { self.unknowns.len() }

    fn evaluate(&self, parameter_values: &[f64]) -> Result<Matrix<f64>, EvaluationError> {
        let values: Vec<Number> =
            parameter_values.iter().map(|&v| Number::float(v)).collect();
        let lookup = lookup_value_by_name(self.unknowns, &values);

        let mut cells = Vec::with_capacity(self.cells.len());
        for cell in self.cells.iter() {
            cells.push(cell.evaluate(&lookup)?.to_complex64().re);
        }

        Ok(Matrix::from_row_slice(self.rows, self.columns(), &cells))
    }
}

/// Find the values of a single unknown which satisfy an inequality, using
/// sign analysis on the real roots of its numerator and denominator.
pub fn reduce_inequality<C>(
    inequality: &Inequality,
    ctx: &C,
) -> Result<Region, SolveError>
where
    C: Context,
{
    let body = inequality.body();
    let unknowns = body.unknowns();

    if unknowns.len() > 1 {
        return Err(SolveError::Unsupported {
            reason: String::from("inequalities may only contain one unknown"),
        });
    }

    let fraction = Fraction::from_expression(&body, ctx)?;
    let op = inequality.op;

    let unknown = match unknowns.first() {
        Some(unknown) => unknown,
        None => {
            let holds = fraction
                .as_constant()
                .and_then(|value| value.to_f64())
                .map(|value| op.holds_against_zero(value))
                .unwrap_or(false);

            return Ok(if holds { Region::everything() } else { Region::empty() });
        },
    };

    let zeroes = real_roots(&fraction.numerator, unknown)?;
    let poles = real_roots(&fraction.denominator, unknown)?;

    let mut critical: Vec<(Number, f64, bool)> = zeroes
        .into_iter()
        .map(|(n, v)| (n, v, false))
        .chain(poles.into_iter().map(|(n, v)| (n, v, true)))
        .collect();
    critical.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    // a point which is both a zero and a pole is a pole
    critical.dedup_by(|later, earlier| {
        let same = (later.1 - earlier.1).abs() < 1e-12;
        if same {
            earlier.2 |= later.2;
        }
        same
    });

    let sign_holds = |t: f64| -> bool {
        let lookup = |_: &Parameter| Some(Number::float(t));
        let numerator =
            fraction.numerator.evaluate(&lookup).ok().and_then(|n| n.to_f64());
        let denominator =
            fraction.denominator.evaluate(&lookup).ok().and_then(|n| n.to_f64());

        match (numerator, denominator) {
            (Some(n), Some(d)) if d != 0.0 => op.holds_against_zero(n / d),
            _ => false,
        }
    };

    let mut builder = RegionBuilder::default();

    let first = critical.first().map(|c| c.1 - 1.0).unwrap_or(0.0);
    builder.push(
        sign_holds(first),
        Bound::Unbounded,
        critical.first().map(|c| Bound::Open(c.0.clone())).unwrap_or(Bound::Unbounded),
    );

    for (i, (point, value, is_pole)) in critical.iter().enumerate() {
        let included = !is_pole && op.holds_against_zero(0.0);
        builder.push(
            included,
            Bound::Closed(point.clone()),
            Bound::Closed(point.clone()),
        );

        let (test, upper) = match critical.get(i + 1) {
            Some(next) => ((value + next.1) / 2.0, Bound::Open(next.0.clone())),
            None => (value + 1.0, Bound::Unbounded),
        };
        builder.push(sign_holds(test), Bound::Open(point.clone()), upper);
    }

    Ok(builder.finish())
}

fn real_roots(
    poly: &Polynomial,
    unknown: &Parameter,
) -> Result<Vec<(Number, f64)>, SolveError> {
    if poly.as_constant().is_some() {
        return Ok(Vec::new());
    }

    Ok(univariate_roots(poly, unknown)?
        .into_iter()
        .filter_map(|root| root.to_f64().map(|value| (root, value)))
        .collect())
}

/// Glues consecutive pieces of the number line together into intervals.
#[derive(Debug, Default)]
struct RegionBuilder {
    intervals: Vec<Interval>,
    current: Option<(Bound, Bound)>,
}

impl RegionBuilder {
    fn push(&mut self, included: bool, lower: Bound, upper: Bound) {
        if !included {
            if let Some((lower, upper)) = self.current.take() {
                self.intervals.push(Interval::new(lower, upper));
            }
            return;
        }

        self.current = match self.current.take() {
            Some((start, _)) => Some((start, upper)),
            None => Some((lower, upper)),
        };
    }

    fn finish(mut self) -> Region {
        if let Some((lower, upper)) = self.current.take() {
            self.intervals.push(Interval::new(lower, upper));
        }

        Region::new(self.intervals)
    }
}
