//! Restricted arithmetic evaluator
//!
//! Evaluates text that the arithmetic folder pulled out of untrusted Lua
//! source. Only the following grammar is accepted:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '//') unary)*
//! unary   := '-' unary | primary
//! primary := number | '(' expr ')'
//! number  := digits ('.' digits)?
//! ```
//!
//! Anything else (names, calls, comparisons, `%`, `^`, `**`, unary `+`,
//! strings) is rejected with [`SandboxError::Unsafe`]. Nothing is ever
//! executed; the input is parsed into an [`Expr`] tree and folded.
//!
//! Integers stay integral under `+ - *` and `//`; `/` always yields a float.
//! Inputs longer than [`MAX_TOKENS`] tokens are refused before parsing.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    #[error("unsafe expression: {0}")]
    Unsafe(String),

    #[error("malformed expression: {0}")]
    Syntax(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("result is not finite")]
    NonFinite,

    #[error("expression has more than {0} tokens")]
    TooComplex(usize),
}

type SandboxResult<T> = Result<T, SandboxError>;

/// Bounds the recursion depth of parsing and evaluation
pub const MAX_TOKENS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            // Integral floats keep their `.0` so `4/2` reads as `2.0`
            Number::Float(v) if v.fract() == 0.0 => write!(f, "{:.1}", v),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
}

/// Syntax tree of an accepted expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(Number),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    LParen,
    RParen,
}

/// Parse and evaluate `expr`
pub fn evaluate(expr: &str) -> SandboxResult<Number> {
    let tree = parse(expr)?;
    eval(&tree)
}

/// Parse and evaluate `expr`, returning the canonical decimal form of the result
pub fn evaluate_to_string(expr: &str) -> SandboxResult<String> {
    evaluate(expr).map(|n| n.to_string())
}

/// Parse `expr` into an [`Expr`] tree without evaluating it
pub fn parse(expr: &str) -> SandboxResult<Expr> {
    let tokens = tokenize(expr)?;
    if tokens.len() > MAX_TOKENS {
        return Err(SandboxError::TooComplex(MAX_TOKENS));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let tree = parser.parse_expr()?;
    match parser.peek() {
        None => Ok(tree),
        Some(tok) => Err(SandboxError::Syntax(format!("unexpected {:?}", tok))),
    }
}

fn tokenize(src: &str) -> SandboxResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut end = start;
                let mut seen_dot = false;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() {
                        end = i + 1;
                        chars.next();
                    } else if d == '.' && !seen_dot {
                        seen_dot = true;
                        end = i + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                if let Some(&(_, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        return Err(SandboxError::Unsafe(format!(
                            "unsupported literal `{}{}`",
                            &src[start..end],
                            next
                        )));
                    }
                }
                tokens.push(Token::Number(parse_number(&src[start..end])?));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '*'))) {
                    return Err(SandboxError::Unsafe("power operator".to_string()));
                }
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    tokens.push(Token::DoubleSlash);
                } else {
                    tokens.push(Token::Slash);
                }
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_alphabetic() || c == '_' => {
                let name: String = src[start..]
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                return Err(SandboxError::Unsafe(format!("name `{}`", name)));
            }
            other => {
                return Err(SandboxError::Unsafe(format!("token `{}`", other)));
            }
        }
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> SandboxResult<Number> {
    if literal.ends_with('.') {
        return Err(SandboxError::Syntax(format!("incomplete number `{}`", literal)));
    }
    if literal.contains('.') {
        return literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| SandboxError::Syntax(format!("bad number `{}`", literal)));
    }
    // `007` is malformed, `000` is not
    if literal.len() > 1 && literal.starts_with('0') && literal.bytes().any(|b| b != b'0') {
        return Err(SandboxError::Syntax(format!(
            "leading zeros in `{}`",
            literal
        )));
    }
    literal
        .parse::<i64>()
        .map(Number::Int)
        .map_err(|_| SandboxError::Overflow)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    fn parse_expr(&mut self) -> SandboxResult<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_term(&mut self) -> SandboxResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::DoubleSlash) => BinOp::FloorDiv,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_unary(&mut self) -> SandboxResult<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.bump();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => Err(SandboxError::Unsafe("unary plus".to_string())),
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> SandboxResult<Expr> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(SandboxError::Syntax("unclosed parenthesis".to_string())),
                }
            }
            Some(tok) => Err(SandboxError::Syntax(format!("unexpected {:?}", tok))),
            None => Err(SandboxError::Syntax("unexpected end of input".to_string())),
        }
    }
}

fn eval(expr: &Expr) -> SandboxResult<Number> {
    let value = match expr {
        Expr::Number(n) => *n,
        Expr::Neg(inner) => match eval(inner)? {
            Number::Int(i) => Number::Int(i.checked_neg().ok_or(SandboxError::Overflow)?),
            Number::Float(f) => Number::Float(-f),
        },
        Expr::Binary { op, lhs, rhs } => apply(*op, eval(lhs)?, eval(rhs)?)?,
    };

    match value {
        Number::Float(f) if !f.is_finite() => Err(SandboxError::NonFinite),
        _ => Ok(value),
    }
}

fn apply(op: BinOp, lhs: Number, rhs: Number) -> SandboxResult<Number> {
    use Number::{Float, Int};

    match (op, lhs, rhs) {
        (BinOp::Add, Int(a), Int(b)) => a.checked_add(b).map(Int).ok_or(SandboxError::Overflow),
        (BinOp::Sub, Int(a), Int(b)) => a.checked_sub(b).map(Int).ok_or(SandboxError::Overflow),
        (BinOp::Mul, Int(a), Int(b)) => a.checked_mul(b).map(Int).ok_or(SandboxError::Overflow),
        (BinOp::FloorDiv, Int(a), Int(b)) => {
            if b == 0 {
                return Err(SandboxError::DivisionByZero);
            }
            let q = a.checked_div(b).ok_or(SandboxError::Overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                Ok(Int(q - 1))
            } else {
                Ok(Int(q))
            }
        }
        (op, lhs, rhs) => {
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            match op {
                BinOp::Add => Ok(Float(a + b)),
                BinOp::Sub => Ok(Float(a - b)),
                BinOp::Mul => Ok(Float(a * b)),
                BinOp::Div | BinOp::FloorDiv if b == 0.0 => Err(SandboxError::DivisionByZero),
                BinOp::Div => Ok(Float(a / b)),
                BinOp::FloorDiv => Ok(Float((a / b).floor())),
            }
        }
    }
}
