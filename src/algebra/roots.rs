//! Finding the roots of univariate polynomials.

use crate::algebra::{ops::EvaluationError, Number};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Don't bother enumerating the divisors of coefficients larger than this.
const MAX_DIVISOR_SEARCH: u64 = 1_000_000_000_000;
/// Past this many `p/q` pairs the exact search is skipped and the roots are
/// approximated instead.
const MAX_RATIONAL_CANDIDATES: usize = 10_000;
const MAX_ITERATIONS: usize = 1000;
/// Imaginary parts smaller than this (relative to the real part) are
/// considered numerical noise after the iterative root finder.
const IMAGINARY_NOISE: f64 = 1e-9;

/// Find every distinct (complex) root of the polynomial with the provided
/// coefficients, lowest power first.
///
/// Rational roots and roots of quadratics with rational coefficients are found
/// exactly, everything else is approximated.
pub fn roots(coefficients: &[Number]) -> Result<Vec<Number>, EvaluationError> {
    let mut coefficients = trimmed(coefficients);
    let mut found = Vec::new();

    // x = 0 is a root for every missing constant term
    while coefficients.len() > 1 && coefficients[0].is_negligible() {
        found.push(Number::zero());
        coefficients.remove(0);
    }

    if let Some(integers) = integer_coefficients(&coefficients) {
        let (rational_roots, remaining) = rational_roots(integers);
        found.extend(rational_roots);
        coefficients = remaining;
    }

    match coefficients.len() {
        0 | 1 => {},
        2 => found.push(linear_root(&coefficients)?),
        3 => found.extend(quadratic_roots(&coefficients)?),
        _ => found.extend(durand_kerner(&coefficients)),
    }

    Ok(deduplicated(found))
}

/// Drop leading zero coefficients so the last one is never zero.
fn trimmed(coefficients: &[Number]) -> Vec<Number> {
    let len = coefficients
        .iter()
        .rposition(|c| !c.is_negligible())
        .map(|ix| ix + 1)
        .unwrap_or(0);

    coefficients[..len].to_vec()
}

/// Scale exact rational coefficients up to integers.
fn integer_coefficients(coefficients: &[Number]) -> Option<Vec<BigInt>> {
    let rationals: Vec<&BigRational> = coefficients
        .iter()
        .map(Number::as_rational)
        .collect::<Option<_>>()?;

    let lcm = rationals
        .iter()
        .fold(BigInt::one(), |acc, r| acc.lcm(r.denom()));

    Some(
        rationals
            .into_iter()
            .map(|r| (r * BigRational::from_integer(lcm.clone())).to_integer())
            .collect(),
    )
}

/// Use the rational root theorem to find every root of the form `p/q`, where
/// `p` divides the constant term and `q` divides the leading coefficient.
///
/// Returns the roots along with the deflated polynomial's coefficients.
fn rational_roots(mut coefficients: Vec<BigInt>) -> (Vec<Number>, Vec<Number>) {
    let mut found = Vec::new();

    if coefficients.len() > 2 {
        let constant = divisors(&coefficients[0]);
        let leading = divisors(&coefficients[coefficients.len() - 1]);

        let candidates = match (constant, leading) {
            (Some(ps), Some(qs))
                if ps.len() * qs.len() <= MAX_RATIONAL_CANDIDATES =>
            {
                Some((ps, qs))
            },
            (Some(ps), Some(qs)) => {
                log::debug!(
                    "Skipping the rational root search ({} candidates)",
                    2 * ps.len() * qs.len()
                );
                None
            },
            _ => None,
        };

        if let Some((ps, qs)) = candidates {
            for p in &ps {
                for q in &qs {
                    for candidate in &[
                        BigRational::new(p.clone(), q.clone()),
                        BigRational::new(-p.clone(), q.clone()),
                    ] {
                        while coefficients.len() > 2 {
                            match deflate(&coefficients, candidate) {
                                Some(quotient) => {
                                    found.push(Number::real(candidate.clone()));
                                    coefficients = quotient;
                                },
                                None => break,
                            }
                        }
                    }
                }
            }
        }
    }

    let remaining = coefficients
        .into_iter()
        .map(|c| Number::real(BigRational::from_integer(c)))
        .collect();

    (found, remaining)
}

/// The positive divisors of `n`, or `None` if `n` is too big to factor by
/// trial division.
fn divisors(n: &BigInt) -> Option<Vec<BigInt>> {
    let n = n.abs().to_u64().filter(|n| *n <= MAX_DIVISOR_SEARCH)?;
    let mut small = Vec::new();
    let mut large = Vec::new();

    let mut i = 1;
    while i * i <= n {
        if n % i == 0 {
            small.push(BigInt::from(i));
            if i * i != n {
                large.push(BigInt::from(n / i));
            }
        }
        i += 1;
    }

    small.extend(large.into_iter().rev());
    Some(small)
}

/// Divide the polynomial by `(x - root)` using synthetic division, returning
/// the quotient's (integer) coefficients if `root` really is a root.
fn deflate(coefficients: &[BigInt], root: &BigRational) -> Option<Vec<BigInt>> {
    let mut quotient = Vec::with_capacity(coefficients.len() - 1);
    let mut carry = BigRational::zero();

    for c in coefficients.iter().rev() {
        carry = carry * root + BigRational::from_integer(c.clone());
        quotient.push(carry.clone());
    }

    // the final carry is the remainder
    let remainder = quotient.pop()?;
    if !remainder.is_zero() {
        return None;
    }

    quotient.reverse();

    // scale back up to integers so the next search still works
    let lcm = quotient
        .iter()
        .fold(BigInt::one(), |acc, r| acc.lcm(r.denom()));
    Some(
        quotient
            .into_iter()
            .map(|r| (r * BigRational::from_integer(lcm.clone())).to_integer())
            .collect(),
    )
}

fn linear_root(coefficients: &[Number]) -> Result<Number, EvaluationError> {
    (-coefficients[0].clone()).checked_div(&coefficients[1])
}

fn quadratic_roots(coefficients: &[Number]) -> Result<Vec<Number>, EvaluationError> {
    let c = &coefficients[0];
    let b = &coefficients[1];
    let a = &coefficients[2];

    let four = Number::integer(4);
    let discriminant = b.clone() * b.clone() - four * a.clone() * c.clone();
    let root = discriminant.sqrt();
    let two_a = Number::integer(2) * a.clone();

    let plus = (-b.clone() + root.clone()).checked_div(&two_a)?;
    let minus = (-b.clone() - root).checked_div(&two_a)?;

    Ok(vec![plus, minus])
}

/// Find all roots simultaneously using the
/// [Durand-Kerner method](https://en.wikipedia.org/wiki/Durand%E2%80%93Kerner_method).
fn durand_kerner(coefficients: &[Number]) -> Vec<Number> {
    let leading = coefficients[coefficients.len() - 1].to_complex64();
    let monic: Vec<Complex64> = coefficients
        .iter()
        .map(|c| c.to_complex64() / leading)
        .collect();
    let degree = monic.len() - 1;

    let evaluate = |z: Complex64| {
        monic
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + c)
    };

    let seed = Complex64::new(0.4, 0.9);
    let mut guesses: Vec<Complex64> =
        (0..degree).map(|k| seed.powu(k as u32)).collect();

    for iteration in 0..MAX_ITERATIONS {
        let mut largest_change: f64 = 0.0;

        for i in 0..degree {
            let z = guesses[i];
            let denominator = guesses
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold(Complex64::new(1.0, 0.0), |acc, (_, other)| {
                    acc * (z - other)
                });

            if denominator.norm() == 0.0 {
                continue;
            }

            let next = z - evaluate(z) / denominator;
            largest_change = largest_change.max((next - z).norm());
            guesses[i] = next;
        }

        if largest_change < 1e-15 {
            log::trace!("Durand-Kerner converged after {} iterations", iteration);
            break;
        }
    }

    guesses
        .into_iter()
        .map(|z| {
            if z.im.abs() < IMAGINARY_NOISE * (1.0 + z.re.abs()) {
                Number::float(z.re)
            } else {
                Number::Approx(z)
            }
        })
        .collect()
}

fn deduplicated(roots: Vec<Number>) -> Vec<Number> {
    let mut unique: Vec<Number> = Vec::with_capacity(roots.len());

    for root in roots {
        let z = root.to_complex64();
        let seen = unique.iter().any(|existing| {
            existing == &root || (existing.to_complex64() - z).norm() < 1e-9
        });

        if !seen {
            unique.push(root);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Number> {
        values.iter().copied().map(Number::integer).collect()
    }

    #[test]
    fn difference_of_squares() {
        // x^2 - 16
        let got = roots(&ints(&[-16, 0, 1])).unwrap();

        assert_eq!(got, ints(&[4, -4]));
    }

    #[test]
    fn repeated_roots_are_only_reported_once() {
        // (x - 3)^2
        let got = roots(&ints(&[9, -6, 1])).unwrap();

        assert_eq!(got, ints(&[3]));
    }

    #[test]
    fn rational_roots_are_exact() {
        // 2x^2 - 5x + 3 = (2x - 3)(x - 1)
        let got = roots(&ints(&[3, -5, 2])).unwrap();

        assert_eq!(got, vec![Number::integer(1), Number::fraction(3, 2)]);
    }

    #[test]
    fn imaginary_roots_are_exact() {
        // x^2 + 4
        let got = roots(&ints(&[4, 0, 1])).unwrap();

        let two_i = Number::integer(2) * Number::imaginary_unit();
        assert_eq!(got, vec![two_i.clone(), -two_i]);
    }

    #[test]
    fn irrational_roots_are_approximate() {
        // x^2 - 2
        let got = roots(&ints(&[-2, 0, 1])).unwrap();

        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|r| !r.is_exact()));
        approx::assert_abs_diff_eq!(
            got[0].to_f64().unwrap(),
            2_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn zero_roots_are_stripped_first() {
        // x^3 - x
        let got = roots(&ints(&[0, -1, 0, 1])).unwrap();

        assert_eq!(got, ints(&[0, 1, -1]));
    }

    #[test]
    fn higher_degree_roots_are_found_numerically() {
        // x^3 - 2
        let got = roots(&ints(&[-2, 0, 0, 1])).unwrap();

        assert_eq!(got.len(), 3);
        let real: Vec<f64> = got.iter().filter_map(Number::to_f64).collect();
        assert_eq!(real.len(), 1);
        approx::assert_abs_diff_eq!(real[0], 2_f64.cbrt(), epsilon = 1e-9);
    }

    #[test]
    fn constants_have_no_roots() {
        assert!(roots(&ints(&[5])).unwrap().is_empty());
        assert!(roots(&ints(&[0, 0])).unwrap().is_empty());
    }

    #[test]
    fn coefficients_with_lots_of_divisors_are_approximated() {
        // 735134400 has 1344 divisors, so there are millions of p/q pairs
        let got = roots(&ints(&[735134400, 1, 0, 735134400])).unwrap();

        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|r| !r.is_exact()));
        let real: Vec<f64> = got.iter().filter_map(Number::to_f64).collect();
        assert_eq!(real.len(), 1);
        approx::assert_abs_diff_eq!(real[0], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn small_divisor_searches_stay_exact() {
        // 6x^3 - 11x^2 + 6x - 1 = (x - 1)(2x - 1)(3x - 1)
        let got = roots(&ints(&[-1, 6, -11, 6])).unwrap();

        assert_eq!(
            got,
            vec![Number::integer(1), Number::fraction(1, 2), Number::fraction(1, 3)]
        );
    }

    #[test]
    fn decimal_coefficients() {
        // 0.5x - 1
        let got = roots(&[Number::float(-1.0), Number::float(0.5)]).unwrap();

        assert_eq!(got, vec![Number::float(2.0)]);
    }
}
