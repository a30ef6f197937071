//! The set of values which satisfy a line of working.

use crate::{
    algebra::{Number, Parameter, Polynomial},
    equations::Equation,
};
use arrayvec::ArrayVec;
use std::fmt::{self, Display, Formatter};

/// The most components a coordinate may have.
pub const MAX_COMPONENTS: usize = 2;

/// A single solution, either a number or a coordinate like `(4, 4)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Number),
    Tuple(ArrayVec<Number, MAX_COMPONENTS>),
}

impl Value {
    pub fn components(&self) -> &[Number] {
        match self {
            Value::Scalar(n) => std::slice::from_ref(n),
            Value::Tuple(items) => items.as_slice(),
        }
    }

    /// Unwrap a one-element tuple into a scalar.
    pub fn flatten(self) -> Value {
        match self {
            Value::Tuple(items) if items.len() == 1 => {
                match items.into_iter().next() {
                    Some(only) => Value::Scalar(only),
                    None => Value::Tuple(ArrayVec::new()),
                }
            },
            other => other,
        }
    }

    /// Are the two values the same shape, with every component within
    /// `tolerance` of its counterpart?
    pub fn approx_eq(&self, other: &Value, tolerance: f64) -> bool {
        let ours = self.components();
        let theirs = other.components();

        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs)
                .all(|(a, b)| numbers_are_close(a, b, tolerance))
    }

    fn sort_key(&self) -> Vec<(f64, f64)> {
        self.components().iter().map(Number::sort_key).collect()
    }
}

pub(crate) fn numbers_are_close(a: &Number, b: &Number, tolerance: f64) -> bool {
    let a = a.to_complex64();
    let b = b.to_complex64();

    approx::abs_diff_eq!(a.re, b.re, epsilon = tolerance)
        && approx::abs_diff_eq!(a.im, b.im, epsilon = tolerance)
}

impl From<Number> for Value {
    fn from(n: Number) -> Value { Value::Scalar(n) }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(n) => write!(f, "{}", n),
            Value::Tuple(items) => {
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

/// A finite set of values, optionally tagged with the unknowns each
/// component belongs to.
#[derive(Debug, Clone)]
pub struct FiniteSet {
    variables: Vec<Parameter>,
    values: Vec<Value>,
}

impl FiniteSet {
    /// Create a new set. The variables are sorted (re-ordering each tuple's
    /// components to match) and duplicate values are removed.
    pub fn new(variables: Vec<Parameter>, values: Vec<Value>) -> Self {
        let mut order: Vec<usize> = (0..variables.len()).collect();
        order.sort_by(|&a, &b| variables[a].cmp(&variables[b]));

        let values = values
            .into_iter()
            .map(|value| match value {
                Value::Tuple(items) if items.len() == variables.len() => {
                    Value::Tuple(
                        order.iter().map(|&ix| items[ix].clone()).collect(),
                    )
                },
                other => other,
            })
            .collect();

        let variables = order.iter().map(|&ix| variables[ix].clone()).collect();

        FiniteSet::from_parts(variables, values)
    }

    /// A set of values which aren't associated with any particular unknowns.
    pub fn values_only(values: Vec<Value>) -> Self {
        FiniteSet::from_parts(Vec::new(), values)
    }

    pub fn empty() -> Self { FiniteSet::from_parts(Vec::new(), Vec::new()) }

    fn from_parts(variables: Vec<Parameter>, values: Vec<Value>) -> Self {
        let mut unique: Vec<Value> = Vec::with_capacity(values.len());
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }

        unique.sort_by(|a, b| {
            a.sort_key()
                .partial_cmp(&b.sort_key())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        FiniteSet {
            variables,
            values: unique,
        }
    }

    pub fn variables(&self) -> &[Parameter] { &self.variables }

    pub fn values(&self) -> &[Value] { &self.values }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn contains(&self, value: &Value) -> bool { self.values.contains(value) }

    /// Untagged sets (bare values like `4, -4`) can be compared against
    /// anything.
    pub fn variables_compatible_with(&self, other: &FiniteSet) -> bool {
        self.variables.is_empty()
            || other.variables.is_empty()
            || self.variables == other.variables
    }

    /// Merge two sets over the same unknowns.
    pub fn union(self, other: FiniteSet) -> FiniteSet {
        let variables = if self.variables.is_empty() {
            other.variables
        } else {
            self.variables
        };
        let mut values = self.values;
        values.extend(other.values);

        FiniteSet::from_parts(variables, values)
    }

    /// Turn `(6,)` into `6`. Idempotent.
    pub fn flatten(self) -> FiniteSet {
        let values = self.values.into_iter().map(Value::flatten).collect();
        FiniteSet::from_parts(self.variables, values)
    }

    fn same_values(&self, other: &FiniteSet) -> bool {
        self.len() == other.len()
            && self.values.iter().all(|v| other.contains(v))
    }
}

impl PartialEq for FiniteSet {
    fn eq(&self, other: &FiniteSet) -> bool {
        self.variables_compatible_with(other) && self.same_values(other)
    }
}

impl Display for FiniteSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "∅");
        }

        write!(f, "{{")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "}}")
    }
}

/// One end of an [`Interval`].
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Unbounded,
    Open(Number),
    Closed(Number),
}

impl Bound {
    pub fn value(&self) -> Option<&Number> {
        match self {
            Bound::Unbounded => None,
            Bound::Open(n) | Bound::Closed(n) => Some(n),
        }
    }

    fn approx_eq(&self, other: &Bound, tolerance: f64) -> bool {
        match (self, other) {
            (Bound::Unbounded, Bound::Unbounded) => true,
            (Bound::Open(a), Bound::Open(b))
            | (Bound::Closed(a), Bound::Closed(b)) => {
                numbers_are_close(a, b, tolerance)
            },
            _ => false,
        }
    }
}

/// A connected range of real numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub lower: Bound,
    pub upper: Bound,
}

impl Interval {
    pub fn new(lower: Bound, upper: Bound) -> Self { Interval { lower, upper } }

    pub fn everything() -> Self {
        Interval::new(Bound::Unbounded, Bound::Unbounded)
    }

    pub fn point(value: Number) -> Self {
        Interval::new(Bound::Closed(value.clone()), Bound::Closed(value))
    }

    /// The single number in a degenerate `[a, a]` interval.
    pub fn as_point(&self) -> Option<&Number> {
        match (&self.lower, &self.upper) {
            (Bound::Closed(a), Bound::Closed(b)) if a == b => Some(a),
            _ => None,
        }
    }

    pub fn approx_eq(&self, other: &Interval, tolerance: f64) -> bool {
        self.lower.approx_eq(&other.lower, tolerance)
            && self.upper.approx_eq(&other.upper, tolerance)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(point) = self.as_point() {
            return write!(f, "{{{}}}", point);
        }

        match &self.lower {
            Bound::Unbounded => write!(f, "(-∞, ")?,
            Bound::Open(n) => write!(f, "({}, ", n)?,
            Bound::Closed(n) => write!(f, "[{}, ", n)?,
        }

        match &self.upper {
            Bound::Unbounded => write!(f, "∞)"),
            Bound::Open(n) => write!(f, "{})", n),
            Bound::Closed(n) => write!(f, "{}]", n),
        }
    }
}

/// A union of disjoint intervals, in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub intervals: Vec<Interval>,
}

impl Region {
    pub fn new(intervals: Vec<Interval>) -> Self { Region { intervals } }

    pub fn everything() -> Self { Region::new(vec![Interval::everything()]) }

    pub fn empty() -> Self { Region::new(Vec::new()) }

    pub fn is_empty(&self) -> bool { self.intervals.is_empty() }

    /// If every interval is a single point, those points.
    pub fn as_points(&self) -> Option<Vec<Number>> {
        self.intervals
            .iter()
            .map(|interval| interval.as_point().cloned())
            .collect()
    }

    pub fn approx_eq(&self, other: &Region, tolerance: f64) -> bool {
        self.intervals.len() == other.intervals.len()
            && self
                .intervals
                .iter()
                .zip(&other.intervals)
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.intervals.is_empty() {
            return write!(f, "∅");
        }

        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                write!(f, " ∪ ")?;
            }
            write!(f, "{}", interval)?;
        }

        Ok(())
    }
}

/// An equation relating two or more unknowns which doesn't pin them down to
/// specific values (e.g. `y = 2x + 1`).
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// The relation's body as a monic polynomial, so `y = 2x + 1` and
    /// `2y - 4x = 2` compare equal.
    Polynomial(Polynomial),
    /// A relation we couldn't turn into a polynomial, compared structurally.
    Equation(Equation),
}

impl Relation {
    pub fn approx_eq(&self, other: &Relation, tolerance: f64) -> bool {
        match (self, other) {
            (Relation::Polynomial(a), Relation::Polynomial(b)) => {
                let a: Vec<_> = a.terms().collect();
                let b: Vec<_> = b.terms().collect();

                a.len() == b.len()
                    && a.iter().zip(&b).all(|((ma, ca), (mb, cb))| {
                        ma == mb && numbers_are_close(ca, cb, tolerance)
                    })
            },
            (Relation::Equation(a), Relation::Equation(b)) => a == b,
            _ => false,
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Polynomial(p) => write!(f, "{} = 0", p),
            Relation::Equation(eq) => write!(f, "{}", eq),
        }
    }
}

/// Everything that satisfies a line of working.
#[derive(Debug, Clone)]
pub enum SolutionSet {
    Finite(FiniteSet),
    Region(Region),
    Relation(Relation),
}

impl SolutionSet {
    pub fn is_empty(&self) -> bool {
        match self {
            SolutionSet::Finite(set) => set.is_empty(),
            SolutionSet::Region(region) => region.is_empty(),
            SolutionSet::Relation(_) => false,
        }
    }

    pub fn as_finite(&self) -> Option<&FiniteSet> {
        match self {
            SolutionSet::Finite(set) => Some(set),
            _ => None,
        }
    }

    /// Unwrap degenerate one-element tuples. Idempotent, and coordinate
    /// pairs are left alone.
    pub fn flatten(self) -> SolutionSet {
        match self {
            SolutionSet::Finite(set) => SolutionSet::Finite(set.flatten()),
            other => other,
        }
    }

    /// The first real number in this set, used for diagnostics.
    ///
    /// For a finite set this is the first component of the first value, for a
    /// region it's the first finite bound.
    pub fn first_real_value(&self) -> Option<f64> {
        match self {
            SolutionSet::Finite(set) => set
                .values()
                .first()
                .and_then(|value| value.components().first())
                .and_then(Number::to_f64),
            SolutionSet::Region(region) => region
                .intervals
                .iter()
                .flat_map(|i| vec![i.lower.value(), i.upper.value()])
                .flatten()
                .next()
                .and_then(Number::to_f64),
            SolutionSet::Relation(_) => None,
        }
    }

    /// View a region made up entirely of isolated points as a finite set.
    pub(crate) fn as_comparable_finite(&self) -> Option<FiniteSet> {
        match self {
            SolutionSet::Finite(set) => Some(set.clone()),
            SolutionSet::Region(region) => {
                let points = region.as_points()?;
                Some(FiniteSet::values_only(
                    points.into_iter().map(Value::Scalar).collect(),
                ))
            },
            SolutionSet::Relation(_) => None,
        }
    }
}

impl PartialEq for SolutionSet {
    fn eq(&self, other: &SolutionSet) -> bool {
        if self.is_empty() && other.is_empty() {
            return true;
        }

        match (self, other) {
            (SolutionSet::Finite(a), SolutionSet::Finite(b)) => a == b,
            (SolutionSet::Region(a), SolutionSet::Region(b)) => a == b,
            (SolutionSet::Relation(a), SolutionSet::Relation(b)) => a == b,
            (SolutionSet::Region(_), SolutionSet::Finite(_))
            | (SolutionSet::Finite(_), SolutionSet::Region(_)) => {
                match (self.as_comparable_finite(), other.as_comparable_finite())
                {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            },
            _ => false,
        }
    }
}

impl From<FiniteSet> for SolutionSet {
    fn from(set: FiniteSet) -> SolutionSet { SolutionSet::Finite(set) }
}

impl From<Region> for SolutionSet {
    fn from(region: Region) -> SolutionSet { SolutionSet::Region(region) }
}

impl From<Relation> for SolutionSet {
    fn from(relation: Relation) -> SolutionSet { SolutionSet::Relation(relation) }
}

impl Display for SolutionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SolutionSet::Finite(set) => write!(f, "{}", set),
            SolutionSet::Region(region) => write!(f, "{}", region),
            SolutionSet::Relation(relation) => write!(f, "{}", relation),
        }
    }
}
