use crate::{
    algebra::{
        ops::FUNCTIONS, BinaryOperation, Constant, Expression, InequalityKind,
        Inequality, Number, Parameter, Statement,
    },
    equations::Equation,
};
use smol_str::SmolStr;
use std::{iter::Peekable, ops::Range, str::FromStr};

/// How deeply parentheses and prefix operators may be nested.
pub const MAX_DEPTH: usize = 100;

/// Parse a single [`Expression`] from some text.
pub fn parse(s: &str) -> Result<Expression, ParseError> {
    with_fallback(s, |parser| parser.parse())
}

/// Parse an equation, inequality, comma-separated list of values or bare
/// expression.
///
/// Relational operators take priority: `x = y < 3` is rejected rather than
/// treated as an equation. Only the first `=` separates the two sides of an
/// equation. The tree is returned exactly as written, use
/// [`Statement::evaluated()`] to fold constants.
pub fn parse_statement(s: &str) -> Result<Statement, ParseError> {
    with_fallback(s, |parser| parser.statement())
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse(s) }
}

impl FromStr for Statement {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse_statement(s) }
}

/// Try the strict grammar first, and if that fails have another go in
/// literal mode. The strict grammar's error wins when both fail.
fn with_fallback<T, F>(s: &str, parse: F) -> Result<T, ParseError>
where
    F: Fn(Parser<'_>) -> Result<T, ParseError>,
{
    if s.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    match parse(Parser::new(s, Mode::Grammar)) {
        Ok(value) => Ok(value),
        Err(original) => {
            let literal = literal_form(s);
            log::trace!("Retrying \"{}\" as \"{}\" ({})", s, literal, original);

            if literal.trim().is_empty() {
                return Err(original);
            }

            parse(Parser::new(&literal, Mode::Literal)).map_err(|_| original)
        },
    }
}

/// Drop trailing separators and close any parentheses left open.
fn literal_form(s: &str) -> String {
    let trimmed = s.trim_end_matches(|c: char| {
        c == ',' || c == ';' || c.is_whitespace()
    });

    let unclosed = trimmed.chars().fold(0_isize, |open, c| match c {
        '(' => open + 1,
        ')' => open - 1,
        _ => open,
    });

    let mut literal = String::from(trimmed);
    for _ in 0..unclosed.max(0) {
        literal.push(')');
    }

    literal
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Mode {
    Grammar,
    /// Be lenient and accept function application without parentheses
    /// (`sqrt 4`).
    Literal,
}

/// A simple recursive descent parser (`LL(1)`) for converting a string into an
/// expression tree.
///
/// The grammar:
///
/// ```text
/// statement  := sum (("=" | "<" | "<=" | ">" | ">=") sum)?
///             | sum ("," sum)+
///
/// sum        := term (("+" | "-" | "±") term)*
///
/// term       := unary (("*" | "/") unary | power)*
///
/// unary      := ("-" | "+" | "±") unary
///             | power
///
/// power      := atom (("^" | "**") unary)?
///
/// atom       := NUMBER
///             | FUNCTION "(" sum ")"
///             | IDENTIFIER
///             | "(" sum ("," sum)* ","? ")"
/// ```
///
/// The `power` alternative in `term` is implicit multiplication, which is
/// only attempted when the next token is an identifier or `(`.
#[derive(Debug, Clone)]
pub(crate) struct Parser<'a> {
    tokens: Peekable<Tokens<'a>>,
    mode: Mode,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, mode: Mode) -> Self {
        Parser {
            tokens: Tokens::new(src).peekable(),
            mode,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Expression, ParseError> {
        let expr = self.sum()?;
        self.end_of_input()?;

        Ok(expr)
    }

    fn statement(mut self) -> Result<Statement, ParseError> {
        let first = self.sum()?;

        let kind = match self.peek() {
            Some(kind) => kind,
            None => {
                // either we're done or the tokenizer hit an error
                self.end_of_input()?;
                return Ok(Statement::Expression(first));
            },
        };

        if kind == TokenKind::Comma {
            let mut items = vec![first];

            while self.peek() == Some(TokenKind::Comma) {
                let _ = self.advance()?;
                items.push(self.sum()?);
            }

            self.end_of_input()?;
            return Ok(Statement::ValueTuple(items));
        }

        if kind == TokenKind::Equals {
            let _ = self.advance()?;
            let right = self.sum()?;
            self.end_of_input()?;
            return Ok(Statement::Equation(Equation::new(first, right)));
        }

        if let Some(op) = kind.as_inequality() {
            let _ = self.advance()?;
            let right = self.sum()?;
            self.end_of_input()?;
            return Ok(Statement::Inequality(Inequality::new(first, op, right)));
        }

        self.end_of_input()?;
        unreachable!("end_of_input() always fails when tokens remain")
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.tokens
            .peek()
            .and_then(|result| result.as_ref().ok())
            .map(|tok| tok.kind)
    }

    fn advance(&mut self) -> Result<Token<'a>, ParseError> {
        match self.tokens.next() {
            Some(result) => result,
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn end_of_input(&mut self) -> Result<(), ParseError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(Ok(Token {
                kind: TokenKind::CloseParen,
                ..
            })) => Err(ParseError::UnbalancedParentheses),
            Some(Ok(Token { kind, span, .. })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    span,
                    expected: OPERATORS,
                })
            },
            Some(Err(e)) => Err(e),
        }
    }

    fn sum(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.term()?;

        while let Some(op) = self.peek().and_then(TokenKind::as_additive_op) {
            // skip past the operator
            let _ = self.advance()?;
            // and parse the second bit
            let right = self.term()?;
            left = Expression::binary(left, op, right);
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.unary()?;

        loop {
            match self.peek() {
                Some(kind @ TokenKind::Times) | Some(kind @ TokenKind::Divide) => {
                    let _ = self.advance()?;
                    let right = self.unary()?;
                    left = Expression::binary(left, kind.as_binary_op(), right);
                },
                Some(TokenKind::Identifier) | Some(TokenKind::OpenParen) => {
                    let right = self.power()?;
                    left = left * right;
                },
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> Result<Expression, ParseError> {
        self.depth += 1;
        let result = if self.depth > MAX_DEPTH {
            Err(ParseError::TooDeep)
        } else {
            self.unary_inner()
        };
        self.depth -= 1;

        result
    }

    fn unary_inner(&mut self) -> Result<Expression, ParseError> {
        match self.peek() {
            Some(TokenKind::Minus) => {
                let _ = self.advance()?;
                let operand = self.unary()?;
                Ok(Expression::Negate(Box::new(operand)))
            },
            Some(TokenKind::Plus) => {
                let _ = self.advance()?;
                self.unary()
            },
            Some(TokenKind::PlusMinus) => {
                let _ = self.advance()?;
                let operand = self.unary()?;
                Ok(Expression::PlusMinus(Box::new(operand)))
            },
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expression, ParseError> {
        let base = self.atom()?;

        if self.peek() == Some(TokenKind::Power) {
            let _ = self.advance()?;
            let exponent = self.unary()?;
            Ok(Expression::binary(base, BinaryOperation::Power, exponent))
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> Result<Expression, ParseError> {
        let expected = &[
            TokenKind::Number,
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::Minus,
        ];

        match self.peek() {
            Some(TokenKind::Number) => return self.number(),
            Some(TokenKind::Identifier) => {
                return self.variable_or_function_call()
            },
            Some(TokenKind::OpenParen) => return self.parenthesised(),
            _ => {},
        }

        // we couldn't parse the atom, return a nice error
        match self.tokens.next() {
            Some(Ok(Token {
                kind: TokenKind::CloseParen,
                ..
            })) => Err(ParseError::UnbalancedParentheses),
            Some(Ok(Token { span, kind, .. })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    expected,
                    span,
                })
            },
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn parenthesised(&mut self) -> Result<Expression, ParseError> {
        let open_paren = self.advance()?;
        debug_assert_eq!(open_paren.kind, TokenKind::OpenParen);

        let first = self.sum()?;

        if self.peek() != Some(TokenKind::Comma) {
            self.close_paren(&[TokenKind::CloseParen])?;
            return Ok(first);
        }

        let mut items = vec![first];

        while self.peek() == Some(TokenKind::Comma) {
            let _ = self.advance()?;

            // a trailing comma, as in "(6,)"
            if self.peek() == Some(TokenKind::CloseParen) {
                break;
            }

            items.push(self.sum()?);
        }

        self.close_paren(&[TokenKind::Comma, TokenKind::CloseParen])?;

        Ok(Expression::Tuple(items))
    }

    fn close_paren(
        &mut self,
        expected: &'static [TokenKind],
    ) -> Result<(), ParseError> {
        match self.tokens.next() {
            Some(Ok(Token {
                kind: TokenKind::CloseParen,
                ..
            })) => Ok(()),
            Some(Ok(Token { kind, span, .. })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    span,
                    expected,
                })
            },
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnbalancedParentheses),
        }
    }

    fn variable_or_function_call(&mut self) -> Result<Expression, ParseError> {
        let ident = self.advance()?;
        debug_assert_eq!(ident.kind, TokenKind::Identifier);

        if FUNCTIONS.contains(&ident.text) {
            return self.function_call(ident);
        }

        match Constant::from_name(ident.text) {
            Some(constant) => Ok(Expression::Constant(constant)),
            None => Ok(Expression::Parameter(Parameter::named(ident.text))),
        }
    }

    fn function_call(
        &mut self,
        identifier: Token<'a>,
    ) -> Result<Expression, ParseError> {
        let argument = match (self.peek(), self.mode) {
            (Some(TokenKind::OpenParen), _) => {
                let _ = self.advance()?;
                let argument = self.sum()?;
                self.close_paren(&[TokenKind::CloseParen])?;
                argument
            },
            (Some(_), Mode::Literal) => self.unary()?,
            _ => {
                return Err(ParseError::MissingArgument {
                    function: identifier.text.into(),
                    span: identifier.span,
                })
            },
        };

        Ok(Expression::FunctionCall {
            function: identifier.text.into(),
            argument: Box::new(argument),
        })
    }

    fn number(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance()?;
        debug_assert_eq!(token.kind, TokenKind::Number);

        match Number::parse_literal(token.text) {
            Some(number) => Ok(Expression::Number(number)),
            None => Err(ParseError::InvalidNumber {
                text: token.text.into(),
                span: token.span,
            }),
        }
    }
}

/// The tokens which may follow a complete operand.
const OPERATORS: &[TokenKind] = &[
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::PlusMinus,
    TokenKind::Times,
    TokenKind::Divide,
    TokenKind::Power,
];

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
    #[error("\"{text}\" is not a valid number")]
    InvalidNumber { text: SmolStr, span: Range<usize> },
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("found {found:?} at {span:?} but expected one of {expected:?}")]
    UnexpectedToken {
        found: TokenKind,
        span: Range<usize>,
        expected: &'static [TokenKind],
    },
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,
    #[error("\"{function}\" is missing its argument")]
    MissingArgument { function: SmolStr, span: Range<usize> },
    #[error("the expression is nested more than {} levels deep", MAX_DEPTH)]
    TooDeep,
    #[error("there is nothing to parse")]
    EmptyInput,
}

/// Words which are recognised inside a run of letters. Anything else is
/// split into single-letter variables, so `xy` means `x*y`.
fn known_words() -> impl Iterator<Item = &'static str> {
    FUNCTIONS.iter().copied().chain(std::iter::once("pi"))
}

#[derive(Debug, Clone, PartialEq)]
struct Tokens<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self { Tokens { src, cursor: 0 } }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn chomp(
        &mut self,
        kind: TokenKind,
    ) -> Option<Result<Token<'a>, ParseError>> {
        let start = self.cursor;
        self.advance()?;
        let end = self.cursor;

        Some(Ok(Token::from_text(self.src, start..end, kind)))
    }

    /// Consume a multi-character operator.
    fn chomp_str(
        &mut self,
        text: &str,
        kind: TokenKind,
    ) -> Option<Result<Token<'a>, ParseError>> {
        let start = self.cursor;
        self.cursor += text.len();

        Some(Ok(Token::from_text(self.src, start..self.cursor, kind)))
    }

    fn take_while<P>(&mut self, mut predicate: P) -> Range<usize>
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        start..self.cursor
    }

    fn chomp_number(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.cursor;
        self.take_while(|c| c.is_ascii_digit());

        if self.peek() == Some('.') {
            // skip past the decimal
            self.advance();
            self.take_while(|c| c.is_ascii_digit());
        }

        let end = self.cursor;

        if &self.src[start..end] == "." {
            return Err(ParseError::InvalidCharacter {
                character: '.',
                index: start,
            });
        }

        Ok(Token::from_text(self.src, start..end, TokenKind::Number))
    }

    fn chomp_identifier(&mut self) -> Token<'a> {
        let start = self.cursor;
        let letters: &str = {
            let rest = self.rest();
            let len = rest
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            &rest[..len]
        };

        let len = known_words()
            .filter(|word| letters.starts_with(word))
            .map(str::len)
            .max()
            .unwrap_or(1);

        self.cursor += len;

        Token::from_text(self.src, start..self.cursor, TokenKind::Identifier)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = self.rest();

            return match self.peek()? {
                space if space.is_whitespace() => {
                    self.advance();
                    continue;
                },
                '(' => self.chomp(TokenKind::OpenParen),
                ')' => self.chomp(TokenKind::CloseParen),
                ',' => self.chomp(TokenKind::Comma),
                '+' if rest.starts_with("+/-") => {
                    self.chomp_str("+/-", TokenKind::PlusMinus)
                },
                '+' => self.chomp(TokenKind::Plus),
                '-' | '−' => self.chomp(TokenKind::Minus),
                '±' => self.chomp(TokenKind::PlusMinus),
                '*' if rest.starts_with("**") => {
                    self.chomp_str("**", TokenKind::Power)
                },
                '*' | '×' | '·' => self.chomp(TokenKind::Times),
                '/' | '÷' => self.chomp(TokenKind::Divide),
                '^' => self.chomp(TokenKind::Power),
                '=' => self.chomp(TokenKind::Equals),
                '<' if rest.starts_with("<=") => {
                    self.chomp_str("<=", TokenKind::LessEqual)
                },
                '<' => self.chomp(TokenKind::Less),
                '>' if rest.starts_with(">=") => {
                    self.chomp_str(">=", TokenKind::GreaterEqual)
                },
                '>' => self.chomp(TokenKind::Greater),
                '≤' => self.chomp(TokenKind::LessEqual),
                '≥' => self.chomp(TokenKind::GreaterEqual),
                'a'..='z' | 'A'..='Z' => Some(Ok(self.chomp_identifier())),
                '0'..='9' | '.' => Some(self.chomp_number()),
                other => Some(Err(ParseError::InvalidCharacter {
                    character: other,
                    index: self.cursor,
                })),
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token<'a> {
    text: &'a str,
    span: Range<usize>,
    kind: TokenKind,
}

impl<'a> Token<'a> {
    fn from_text(
        original_source: &'a str,
        span: Range<usize>,
        kind: TokenKind,
    ) -> Self {
        Token {
            text: &original_source[span.clone()],
            span,
            kind,
        }
    }
}

/// The kinds of token that can appear in a [`Statement`]'s text form.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,
    Number,
    OpenParen,
    CloseParen,
    Comma,
    Plus,
    Minus,
    PlusMinus,
    Times,
    Divide,
    Power,
    Equals,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl TokenKind {
    fn as_binary_op(self) -> BinaryOperation {
        match self {
            TokenKind::Plus => BinaryOperation::Plus,
            TokenKind::Minus => BinaryOperation::Minus,
            TokenKind::PlusMinus => BinaryOperation::PlusMinus,
            TokenKind::Times => BinaryOperation::Times,
            TokenKind::Divide => BinaryOperation::Divide,
            TokenKind::Power => BinaryOperation::Power,
            other => unreachable!("{:?} is not a binary op", other),
        }
    }

    fn as_additive_op(self) -> Option<BinaryOperation> {
        match self {
            TokenKind::Plus | TokenKind::Minus | TokenKind::PlusMinus => {
                Some(self.as_binary_op())
            },
            _ => None,
        }
    }

    fn as_inequality(self) -> Option<InequalityKind> {
        match self {
            TokenKind::Less => Some(InequalityKind::Less),
            TokenKind::LessEqual => Some(InequalityKind::LessEqual),
            TokenKind::Greater => Some(InequalityKind::Greater),
            TokenKind::GreaterEqual => Some(InequalityKind::GreaterEqual),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tokenizer_tests {
    use super::*;

    macro_rules! tokenize_test {
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let mut tokens = Tokens::new($src);

                let got = tokens.next().unwrap().unwrap();

                let Range { start, end } = got.span;
                assert_eq!(start, 0);
                assert_eq!(end, $src.len());
                assert_eq!(got.kind, $should_be);

                assert!(
                    tokens.next().is_none(),
                    "{:?} should be empty",
                    tokens
                );
            }
        };
    }

    tokenize_test!(open_paren, "(", TokenKind::OpenParen);
    tokenize_test!(close_paren, ")", TokenKind::CloseParen);
    tokenize_test!(comma, ",", TokenKind::Comma);
    tokenize_test!(plus, "+", TokenKind::Plus);
    tokenize_test!(minus, "-", TokenKind::Minus);
    tokenize_test!(unicode_minus, "−", TokenKind::Minus);
    tokenize_test!(plus_minus, "±", TokenKind::PlusMinus);
    tokenize_test!(spelled_out_plus_minus, "+/-", TokenKind::PlusMinus);
    tokenize_test!(times, "*", TokenKind::Times);
    tokenize_test!(divide, "/", TokenKind::Divide);
    tokenize_test!(caret, "^", TokenKind::Power);
    tokenize_test!(double_star, "**", TokenKind::Power);
    tokenize_test!(equals, "=", TokenKind::Equals);
    tokenize_test!(less_than, "<", TokenKind::Less);
    tokenize_test!(less_equal, "<=", TokenKind::LessEqual);
    tokenize_test!(unicode_greater_equal, "≥", TokenKind::GreaterEqual);
    tokenize_test!(single_digit_integer, "3", TokenKind::Number);
    tokenize_test!(multi_digit_integer, "31", TokenKind::Number);
    tokenize_test!(number_with_trailing_dot, "31.", TokenKind::Number);
    tokenize_test!(simple_decimal, "3.14", TokenKind::Number);
    tokenize_test!(leading_decimal_point, ".5", TokenKind::Number);
    tokenize_test!(simple_identifier, "x", TokenKind::Identifier);
    tokenize_test!(function_name, "sqrt", TokenKind::Identifier);
    tokenize_test!(pi, "pi", TokenKind::Identifier);

    #[test]
    fn letter_runs_are_split_into_known_words_and_letters() {
        let got: Vec<_> = Tokens::new("2xsinxy")
            .map(|tok| tok.unwrap().text)
            .collect();

        assert_eq!(got, vec!["2", "x", "sin", "x", "y"]);
    }

    #[test]
    fn longest_known_word_wins() {
        let got: Vec<_> =
            Tokens::new("expx").map(|tok| tok.unwrap().text).collect();

        assert_eq!(got, vec!["exp", "x"]);
    }

    #[test]
    fn a_lone_decimal_point_is_invalid() {
        let got = Tokens::new(".").next().unwrap();

        assert_eq!(
            got,
            Err(ParseError::InvalidCharacter {
                character: '.',
                index: 0
            })
        );
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;

    macro_rules! parser_test {
        ($name:ident, $src:expr) => {
            parser_test!($name, $src, $src);
        };
        ($name:ident, $src:expr, $should_be:expr) => {
            #[test]
            fn $name() {
                let got = parse($src).unwrap();

                let round_tripped = got.to_string();
                assert_eq!(round_tripped, $should_be);
            }
        };
    }

    parser_test!(simple_integer, "1");
    parser_test!(one_plus_one, "1 + 1");
    parser_test!(one_plus_one_plus_negative_one, "1 + -1");
    parser_test!(one_plus_one_times_three, "1 + 1*3");
    parser_test!(one_plus_one_all_times_three, "(1 + 1)*3");
    parser_test!(negative_one, "-1");
    parser_test!(negative_one_plus_one, "-1 + 1");
    parser_test!(negative_one_plus_x, "-1 + x");
    parser_test!(number_in_parens, "(1)", "1");
    parser_test!(bimdas, "1*2 + 3*4/(5 - 2)*1 - 3");
    parser_test!(subtraction_is_left_associative, "1 - 2 - 3");
    parser_test!(subtract_a_group, "1 - (2 - 3)");
    parser_test!(function_call, "sin(1)", "sin(1)");
    parser_test!(function_call_with_expression, "sin(1/0)");
    parser_test!(nested_function_calls, "sqrt(abs(sin(pi)))");
    parser_test!(power, "x^2");
    parser_test!(double_star_power, "x**2", "x^2");
    parser_test!(powers_are_right_associative, "2^3^2");
    parser_test!(power_of_a_power, "(2^3)^2");
    parser_test!(negated_power, "-x^2");
    parser_test!(power_of_a_negation, "(-x)^2");
    parser_test!(negative_exponent, "x^-1");
    parser_test!(implicit_multiplication, "2x", "2*x");
    parser_test!(implicit_multiplication_with_parens, "2(x + 4)", "2*(x + 4)");
    parser_test!(
        implicit_multiplication_of_groups,
        "(x + 1)(x - 1)",
        "(x + 1)*(x - 1)"
    );
    parser_test!(adjacent_letters, "xy", "x*y");
    parser_test!(coefficient_and_power, "3x^2", "3*x^2");
    parser_test!(prefix_plus_minus, "±4");
    parser_test!(infix_plus_minus, "3 ± 2");
    parser_test!(spelled_out_plus_minus, "3 +/- 2", "3 ± 2");
    parser_test!(unary_plus, "+4", "4");
    parser_test!(coordinate_pair, "(4, 4)");
    parser_test!(one_element_tuple, "(6,)");
    parser_test!(imaginary_unit, "2I", "2*I");
    parser_test!(decimal, "1.5");
    parser_test!(function_without_parens_in_literal_mode, "sqrt 4", "sqrt(4)");
    parser_test!(unclosed_paren_in_literal_mode, "2*(x + 1", "2*(x + 1)");
    parser_test!(trailing_comma_in_literal_mode, "3,", "3");

    #[test]
    fn statements() {
        let inputs = vec![
            ("2x + 4 = 12", "2*x + 4 = 12"),
            ("x = y = 3", ""),
            ("x <= 3", "x <= 3"),
            ("3 > x", "3 > x"),
            ("4, -4", "4, -4"),
            ("(x, y) = (4, 4)", "(x, y) = (4, 4)"),
            ("x^2", "x^2"),
        ];

        for (src, should_be) in inputs {
            let got = parse_statement(src);

            if should_be.is_empty() {
                assert!(got.is_err(), "{} should fail, got {:?}", src, got);
            } else {
                assert_eq!(got.unwrap().to_string(), should_be);
            }
        }
    }

    #[test]
    fn the_first_equals_sign_splits_an_equation() {
        let got = parse_statement("x = 4").unwrap();

        match got {
            Statement::Equation(eq) => {
                assert_eq!(eq.left, Expression::param("x"));
                assert_eq!(eq.right, Expression::number(4));
            },
            other => panic!("Expected an equation, found {:?}", other),
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_statement("   "), Err(ParseError::EmptyInput));
    }

    #[test]
    fn functions_need_an_argument() {
        let got = parse("sqrt");

        assert_eq!(
            got,
            Err(ParseError::MissingArgument {
                function: "sqrt".into(),
                span: 0..4
            })
        );
    }

    #[test]
    fn unbalanced_closing_paren() {
        assert_eq!(parse("1 + 2)"), Err(ParseError::UnbalancedParentheses));
    }

    #[test]
    fn invalid_characters_are_reported() {
        assert_eq!(
            parse("2 $ 3"),
            Err(ParseError::InvalidCharacter {
                character: '$',
                index: 2
            })
        );
    }

    #[test]
    fn deeply_nested_input_is_rejected() {
        let src = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(parse(&src), Err(ParseError::TooDeep));

        let src = format!("{}1", "-".repeat(10_000));
        assert_eq!(parse(&src), Err(ParseError::TooDeep));
    }

    #[test]
    fn literal_form_cleans_up_the_end() {
        assert_eq!(literal_form("(1 + (2 ;"), "(1 + (2))");
        assert_eq!(literal_form("4, -4, "), "4, -4");
    }
}
