use crate::genomics::{BinaryOp, UnaryOp};

use thiserror::Error;

use std::iter::Peekable;
use std::str::CharIndices;

/// An error type indicating malformed equation text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected character {character:?} at position {position}")]
    UnexpectedCharacter { position: usize, character: char },
    #[error("unexpected {found} at position {position}")]
    UnexpectedToken { position: usize, found: String },
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unknown identifier {0:?}")]
    UnknownIdentifier(String),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("only squaring is supported, found exponent {0}")]
    UnsupportedExponent(String),
}

/// A parsed arithmetic expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Number(f64),
    /// Index into the input names the expression was parsed with.
    Variable(usize),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Evaluates the expression with the given variable values,
    /// using the same guarded operations as genome evaluation.
    /// Variables without a value read as 0.
    pub fn evaluate(&self, inputs: &[f64]) -> f64 {
        match self {
            Expression::Number(value) => *value,
            Expression::Variable(index) => inputs.get(*index).copied().unwrap_or(0.0),
            Expression::Unary(op, a) => op.apply(a.evaluate(inputs)),
            Expression::Binary(op, a, b) => op.apply(a.evaluate(inputs), b.evaluate(inputs)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(String),
    Identifier(String),
    Symbol(char),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(text) => format!("number {}", text),
            Token::Identifier(name) => format!("identifier {:?}", name),
            Token::Symbol(c) => format!("{:?}", c),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = vec![];
    let mut chars = text.char_indices().peekable();
    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            tokens.push((position, Token::Number(take_number(&mut chars))));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut name = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                name.push(c);
                chars.next();
            }
            tokens.push((position, Token::Identifier(name)));
        } else if "+-*/^()".contains(c) {
            tokens.push((position, Token::Symbol(c)));
            chars.next();
        } else {
            return Err(ParseError::UnexpectedCharacter {
                position,
                character: c,
            });
        }
    }
    Ok(tokens)
}

/// Consumes digits, a decimal point and an optional exponent.
fn take_number(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut text = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !(c.is_ascii_digit() || c == '.') {
            break;
        }
        text.push(c);
        chars.next();
    }
    if let Some(&(_, e)) = chars.peek() {
        if e == 'e' || e == 'E' {
            let mut lookahead = chars.clone();
            lookahead.next();
            let mut exponent = String::from(e);
            if let Some(&(_, sign)) = lookahead.peek() {
                if sign == '+' || sign == '-' {
                    exponent.push(sign);
                    lookahead.next();
                }
            }
            let mut has_digits = false;
            while let Some(&(_, d)) = lookahead.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                exponent.push(d);
                has_digits = true;
                lookahead.next();
            }
            if has_digits {
                text.push_str(&exponent);
                *chars = lookahead;
            }
        }
    }
    text
}

/// Recursive-descent parser over the token list.
///
/// ```text
/// expression := term (('+' | '-') term)*
/// term       := factor (('*' | '/') factor)*
/// factor     := '-' factor | power
/// power      := primary ('^' number)?
/// primary    := number | name | function '(' expression ')' | '(' expression ')'
/// ```
struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    position: usize,
    input_names: &'a [String],
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(_, t)| t)
    }

    fn next(&mut self) -> Result<(usize, Token), ParseError> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd)?;
        self.position += 1;
        Ok(token)
    }

    fn next_is(&self, symbol: char) -> bool {
        self.peek() == Some(&Token::Symbol(symbol))
    }

    fn expect(&mut self, symbol: char) -> Result<(), ParseError> {
        match self.next()? {
            (_, Token::Symbol(c)) if c == symbol => Ok(()),
            (position, token) => Err(ParseError::UnexpectedToken {
                position,
                found: token.describe(),
            }),
        }
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.term()?;
        loop {
            let op = if self.next_is('+') {
                BinaryOp::Add
            } else if self.next_is('-') {
                BinaryOp::Subtract
            } else {
                return Ok(left);
            };
            self.position += 1;
            let right = self.term()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.factor()?;
        loop {
            let op = if self.next_is('*') {
                BinaryOp::Multiply
            } else if self.next_is('/') {
                BinaryOp::Divide
            } else {
                return Ok(left);
            };
            self.position += 1;
            let right = self.factor()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn factor(&mut self) -> Result<Expression, ParseError> {
        if self.next_is('-') {
            self.position += 1;
            let operand = self.factor()?;
            return Ok(Expression::Unary(UnaryOp::Negate, Box::new(operand)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expression, ParseError> {
        let base = self.primary()?;
        if !self.next_is('^') {
            return Ok(base);
        }
        self.position += 1;
        match self.next()? {
            (_, Token::Number(text)) if text.parse::<f64>() == Ok(2.0) => {
                Ok(Expression::Unary(UnaryOp::Square, Box::new(base)))
            }
            (_, Token::Number(text)) => Err(ParseError::UnsupportedExponent(text)),
            (position, token) => Err(ParseError::UnexpectedToken {
                position,
                found: token.describe(),
            }),
        }
    }

    fn primary(&mut self) -> Result<Expression, ParseError> {
        match self.next()? {
            (_, Token::Number(text)) => text
                .parse()
                .map(Expression::Number)
                .map_err(|_| ParseError::InvalidNumber(text)),
            (_, Token::Symbol('(')) => {
                let inner = self.expression()?;
                self.expect(')')?;
                Ok(inner)
            }
            (_, Token::Identifier(name)) if self.next_is('(') => {
                let op = match name.as_str() {
                    "exp" => UnaryOp::Exp,
                    "log" => UnaryOp::Log,
                    "sqrt" => UnaryOp::Sqrt,
                    _ => return Err(ParseError::UnknownIdentifier(name)),
                };
                self.position += 1;
                let argument = self.expression()?;
                self.expect(')')?;
                Ok(Expression::Unary(op, Box::new(argument)))
            }
            (_, Token::Identifier(name)) => self
                .input_names
                .iter()
                .position(|n| *n == name)
                .map(Expression::Variable)
                .ok_or(ParseError::UnknownIdentifier(name)),
            (position, token) => Err(ParseError::UnexpectedToken {
                position,
                found: token.describe(),
            }),
        }
    }
}

/// Parses a plain-text equation, resolving
/// variable names against `input_names`.
///
/// Supports `+ - * /`, unary minus, squaring with `^2`,
/// and the functions `exp`, `log` and `sqrt`.
///
/// # Errors
/// Returns an error if the text is malformed or
/// refers to an unknown name.
///
/// # Examples
/// ```
/// use neatgp_expr::equations::parse;
///
/// let names = vec!["Mn".to_string()];
/// let expression = parse("(-0.5)*Mn + sqrt(4)^2", &names).unwrap();
/// assert_eq!(expression.evaluate(&[4.0]), -2.0 + 4.0);
///
/// assert!(parse("2 * y", &names).is_err());
/// ```
pub fn parse(text: &str, input_names: &[String]) -> Result<Expression, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        position: 0,
        input_names,
    };
    let expression = parser.expression()?;
    match parser.tokens.get(parser.position) {
        None => Ok(expression),
        Some((position, token)) => Err(ParseError::UnexpectedToken {
            position: *position,
            found: token.describe(),
        }),
    }
}
