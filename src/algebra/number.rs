//! Exact and approximate numbers.

use crate::algebra::ops::EvaluationError;
use num_bigint::BigInt;
use num_complex::{Complex, Complex64};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::{
    fmt::{self, Display, Formatter},
    ops::{Add, Mul, Neg, Sub},
};

/// The largest integer exponent we are willing to evaluate.
pub const MAX_EXPONENT: u32 = 1024;

/// Approximate coefficients smaller than this are treated as zero.
const NEGLIGIBLE: f64 = 1e-12;

/// A number which is either known exactly (a Gaussian rational, `a + bi`) or
/// only approximately.
///
/// Integer literals and arithmetic on them stay exact. Decimal literals,
/// transcendental functions and irrational roots produce approximations.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Exact(Complex<BigRational>),
    Approx(Complex64),
}

impl Number {
    pub fn zero() -> Self { Number::integer(0) }

    pub fn one() -> Self { Number::integer(1) }

    pub fn integer(value: i64) -> Self {
        Number::real(BigRational::from_integer(BigInt::from(value)))
    }

    /// Create the exact fraction `numerator/denominator`.
    ///
    /// # Panics
    ///
    /// If `denominator` is zero.
    pub fn fraction(numerator: i64, denominator: i64) -> Self {
        Number::real(BigRational::new(
            BigInt::from(numerator),
            BigInt::from(denominator),
        ))
    }

    pub fn real(value: BigRational) -> Self {
        Number::Exact(Complex::new(value, BigRational::zero()))
    }

    pub fn float(value: f64) -> Self {
        Number::Approx(Complex64::new(value, 0.0))
    }

    pub fn imaginary_unit() -> Self {
        Number::Exact(Complex::new(BigRational::zero(), BigRational::one()))
    }

    /// Parse a numeric literal. Integers are exact, anything with a decimal
    /// point is approximate.
    pub fn parse_literal(text: &str) -> Option<Self> {
        if text.contains('.') {
            text.parse::<f64>().ok().map(Number::float)
        } else {
            text.parse::<BigInt>()
                .ok()
                .map(|n| Number::real(BigRational::from_integer(n)))
        }
    }

    pub fn is_exact(&self) -> bool { matches!(self, Number::Exact(_)) }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Exact(c) => c.is_zero(),
            Number::Approx(c) => c.re == 0.0 && c.im == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Number::Exact(c) => c.is_one(),
            Number::Approx(c) => c.re == 1.0 && c.im == 0.0,
        }
    }

    /// Is this zero, or close enough to zero that the difference is
    /// floating point noise?
    pub fn is_negligible(&self) -> bool {
        match self {
            Number::Exact(c) => c.is_zero(),
            Number::Approx(c) => c.norm() < NEGLIGIBLE,
        }
    }

    pub fn is_real(&self) -> bool {
        match self {
            Number::Exact(c) => c.im.is_zero(),
            Number::Approx(c) => c.im == 0.0,
        }
    }

    /// The exact rational value, if this is an exact real number.
    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            Number::Exact(c) if c.im.is_zero() => Some(&c.re),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        self.as_rational()
            .filter(|r| r.is_integer())
            .map(|r| r.numer())
    }

    pub fn to_complex64(&self) -> Complex64 {
        match self {
            Number::Exact(c) => Complex64::new(
                c.re.to_f64().unwrap_or(f64::NAN),
                c.im.to_f64().unwrap_or(f64::NAN),
            ),
            Number::Approx(c) => *c,
        }
    }

    /// The value as a float, if it is real.
    pub fn to_f64(&self) -> Option<f64> {
        if self.is_real() {
            Some(self.to_complex64().re)
        } else {
            None
        }
    }

    /// Is this a real number less than zero?
    pub fn is_negative(&self) -> bool {
        match self {
            Number::Exact(c) => c.im.is_zero() && c.re.is_negative(),
            Number::Approx(c) => c.im == 0.0 && c.re < 0.0,
        }
    }

    pub fn checked_div(&self, divisor: &Number) -> Result<Number, EvaluationError> {
        if divisor.is_zero() {
            return Err(EvaluationError::DivisionByZero);
        }

        Ok(match (self, divisor) {
            (Number::Exact(a), Number::Exact(b)) => Number::Exact(a / b),
            (a, b) => Number::Approx(a.to_complex64() / b.to_complex64()),
        })
    }

    pub fn recip(&self) -> Result<Number, EvaluationError> {
        Number::one().checked_div(self)
    }

    /// Raise this number to some power, staying exact where possible.
    pub fn pow(&self, exponent: &Number) -> Result<Number, EvaluationError> {
        if let (Number::Exact(base), Some(power)) = (self, exponent.as_rational())
        {
            if power.is_integer() {
                return exact_integer_power(base, power.numer());
            }

            if power.denom() == &BigInt::from(2) {
                let root = self.sqrt();
                if root.is_exact() {
                    let numerator = BigRational::from_integer(power.numer().clone());
                    return root.pow(&Number::real(numerator));
                }
            }
        }

        let base = self.to_complex64();
        let exponent = exponent.to_complex64();

        if base.re == 0.0 && base.im == 0.0 {
            return if exponent.re > 0.0 {
                Ok(Number::float(0.0))
            } else {
                Err(EvaluationError::DivisionByZero)
            };
        }

        if base.im == 0.0
            && exponent.im == 0.0
            && (base.re >= 0.0 || exponent.re.fract() == 0.0)
        {
            return Ok(Number::float(base.re.powf(exponent.re)));
        }

        Ok(Number::Approx(base.powc(exponent)).cleaned())
    }

    /// The principal square root.
    pub fn sqrt(&self) -> Number {
        if let Number::Exact(c) = self {
            if c.im.is_zero() {
                if let Some(root) = exact_sqrt(&c.re.abs()) {
                    let zero = BigRational::zero();
                    return if c.re.is_negative() {
                        Number::Exact(Complex::new(zero, root))
                    } else {
                        Number::Exact(Complex::new(root, zero))
                    };
                }
            }
        }

        let z = self.to_complex64();
        if z.im == 0.0 {
            if z.re >= 0.0 {
                Number::float(z.re.sqrt())
            } else {
                Number::Approx(Complex64::new(0.0, (-z.re).sqrt()))
            }
        } else {
            Number::Approx(z.sqrt())
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Exact(c) if c.im.is_zero() => Number::real(c.re.abs()),
            Number::Exact(c) if c.re.is_zero() => Number::real(c.im.abs()),
            other => Number::float(other.to_complex64().norm()),
        }
    }

    /// Apply a floating point function to this number.
    pub fn map_approx<F>(&self, func: F) -> Number
    where
        F: FnOnce(Complex64) -> Complex64,
    {
        Number::Approx(func(self.to_complex64())).cleaned()
    }

    /// Drop imaginary parts which are just rounding noise.
    fn cleaned(self) -> Number {
        match self {
            Number::Approx(c)
                if c.im != 0.0 && c.im.abs() < NEGLIGIBLE * (1.0 + c.re.abs()) =>
            {
                Number::float(c.re)
            },
            other => other,
        }
    }

    /// A key for sorting numbers by real part, then imaginary part.
    pub(crate) fn sort_key(&self) -> (f64, f64) {
        let c = self.to_complex64();
        (c.re, c.im)
    }
}

fn exact_integer_power(
    base: &Complex<BigRational>,
    exponent: &BigInt,
) -> Result<Number, EvaluationError> {
    let magnitude = exponent
        .abs()
        .to_u32()
        .filter(|e| *e <= MAX_EXPONENT)
        .ok_or(EvaluationError::ExponentTooLarge)?;

    let raised = num_traits::pow(base.clone(), magnitude as usize);

    if exponent.is_negative() {
        Number::one().checked_div(&Number::Exact(raised))
    } else {
        Ok(Number::Exact(raised))
    }
}

fn exact_sqrt(value: &BigRational) -> Option<BigRational> {
    if value.is_negative() {
        return None;
    }

    let numerator = value.numer().sqrt();
    let denominator = value.denom().sqrt();

    if &(&numerator * &numerator) == value.numer()
        && &(&denominator * &denominator) == value.denom()
    {
        Some(BigRational::new(numerator, denominator))
    } else {
        None
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self { Number::integer(value) }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Exact(a), Number::Exact(b)) => Number::Exact(a + b),
            (a, b) => Number::Approx(a.to_complex64() + b.to_complex64()),
        }
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Exact(a), Number::Exact(b)) => Number::Exact(a - b),
            (a, b) => Number::Approx(a.to_complex64() - b.to_complex64()),
        }
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Exact(a), Number::Exact(b)) => Number::Exact(a * b),
            (a, b) => Number::Approx(a.to_complex64() * b.to_complex64()),
        }
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Exact(c) => Number::Exact(-c),
            Number::Approx(c) => Number::Approx(-c),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Number::Exact(c) => write_complex(
                f,
                fmt_rational(&c.re),
                c.re.is_zero(),
                fmt_rational(&c.im.abs()),
                c.im.is_zero(),
                c.im.is_negative(),
                c.im.abs().is_one(),
            ),
            Number::Approx(c) => write_complex(
                f,
                c.re.to_string(),
                c.re == 0.0,
                c.im.abs().to_string(),
                c.im == 0.0,
                c.im < 0.0,
                c.im.abs() == 1.0,
            ),
        }
    }
}

fn fmt_rational(value: &BigRational) -> String {
    if value.is_integer() {
        value.numer().to_string()
    } else {
        format!("{}/{}", value.numer(), value.denom())
    }
}

fn write_complex(
    f: &mut Formatter<'_>,
    re: String,
    re_is_zero: bool,
    im_magnitude: String,
    im_is_zero: bool,
    im_is_negative: bool,
    im_is_unit: bool,
) -> fmt::Result {
    if im_is_zero {
        return write!(f, "{}", re);
    }

    let imaginary = if im_is_unit {
        String::from("i")
    } else if im_magnitude.contains('/') {
        format!("({})i", im_magnitude)
    } else {
        format!("{}i", im_magnitude)
    };

    match (re_is_zero, im_is_negative) {
        (true, false) => write!(f, "{}", imaginary),
        (true, true) => write!(f, "-{}", imaginary),
        (false, false) => write!(f, "{} + {}", re, imaginary),
        (false, true) => write!(f, "{} - {}", re, imaginary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(Number::parse_literal("42"), Some(Number::integer(42)));
        assert_eq!(Number::parse_literal("1.5"), Some(Number::float(1.5)));
        assert_eq!(Number::parse_literal("1.2.3"), None);
    }

    #[test]
    fn exact_arithmetic_stays_exact() {
        let half = Number::fraction(1, 2);
        let got = half.clone() + half.clone() * Number::integer(3);

        assert_eq!(got, Number::integer(2));
        assert_eq!(
            Number::integer(3).checked_div(&Number::integer(2)).unwrap(),
            Number::fraction(3, 2)
        );
    }

    #[test]
    fn mixing_in_a_float_gives_an_approximation() {
        let got = Number::fraction(3, 2) - Number::float(1.5);

        assert_eq!(got, Number::float(0.0));
        assert!(!got.is_exact());
    }

    #[test]
    fn dividing_by_zero_is_an_error() {
        assert_eq!(
            Number::one().checked_div(&Number::zero()),
            Err(EvaluationError::DivisionByZero)
        );
        assert_eq!(
            Number::zero().pow(&Number::integer(-1)),
            Err(EvaluationError::DivisionByZero)
        );
    }

    #[test]
    fn square_roots_of_perfect_squares_are_exact() {
        let inputs = vec![
            (Number::integer(16), "4"),
            (Number::fraction(9, 4), "3/2"),
            (Number::integer(-16), "4i"),
            (Number::integer(-1), "i"),
        ];

        for (input, should_be) in inputs {
            let got = input.sqrt();
            assert!(got.is_exact(), "sqrt({}) = {}", input, got);
            assert_eq!(got.to_string(), should_be);
        }
    }

    #[test]
    fn irrational_roots_are_approximate() {
        let got = Number::integer(2).sqrt();

        assert_eq!(got, Number::float(2_f64.sqrt()));
    }

    #[test]
    fn powers() {
        let inputs = vec![
            (Number::integer(2), Number::integer(10), Number::integer(1024)),
            (Number::integer(2), Number::integer(-2), Number::fraction(1, 4)),
            (Number::integer(4), Number::fraction(3, 2), Number::integer(8)),
            (
                Number::imaginary_unit(),
                Number::integer(2),
                Number::integer(-1),
            ),
            (Number::float(2.0), Number::integer(3), Number::float(8.0)),
        ];

        for (base, exponent, should_be) in inputs {
            let got = base.pow(&exponent).unwrap();
            assert_eq!(got, should_be, "{}^{}", base, exponent);
        }
    }

    #[test]
    fn huge_exponents_are_rejected() {
        let got = Number::integer(2).pow(&Number::integer(1_000_000));

        assert_eq!(got, Err(EvaluationError::ExponentTooLarge));
    }

    #[test]
    fn display() {
        let inputs = vec![
            (Number::integer(-4), "-4"),
            (Number::fraction(-3, 2), "-3/2"),
            (Number::Exact(Complex::new(BigRational::zero(), -BigRational::one())), "-i"),
            (
                Number::Exact(Complex::new(
                    BigRational::from_integer(1.into()),
                    BigRational::from_integer(2.into()),
                )),
                "1 + 2i",
            ),
            (Number::Approx(Complex64::new(0.5, -2.0)), "0.5 - 2i"),
            (Number::float(1.5), "1.5"),
        ];

        for (number, should_be) in inputs {
            assert_eq!(number.to_string(), should_be);
        }
    }
}
