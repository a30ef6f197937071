//! The symbolic algebra system.

mod expr;
mod latex;
mod number;
pub mod ops;
mod parse;
mod polynomial;
pub mod roots;
mod statement;

pub use expr::{BinaryOperation, Constant, Expression, Parameter};
pub use latex::{to_latex, Latex};
pub use number::{Number, MAX_EXPONENT};
pub use parse::{parse, parse_statement, ParseError, TokenKind, MAX_DEPTH};
pub use polynomial::{Fraction, Monomial, Polynomial};
pub use statement::{Inequality, InequalityKind, Statement, MAX_PLUS_MINUS};
