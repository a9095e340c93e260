//! # Tag Filter
//!
//! Boolean expressions over a service's tags, used to decide which services a
//! discovery pass looks at. The expression is parsed once at startup; a
//! malformed expression is a configuration error.
//!
//! ```text
//! expr  := or
//! or    := and ('||' and)*
//! and   := unary ('&&' unary)*
//! unary := '!' unary | '(' expr ')' | cmp
//! cmp   := 'tag.' KEY ('==' | '!=') STRING
//!        | 'tag.' KEY '.Exists()'
//!        | 'tag.Any()' ('==' | '!=') STRING
//! ```
//!
//! An empty expression matches every service.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{DiscoveryError, Result};

const TAG_PREFIX: &str = "tag.";
const EXISTS_SUFFIX: &str = ".Exists";
const ANY_KEY: &str = "Any";

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    LParen,
    RParen,
    Eq,
    Ne,
    Not,
    And,
    Or,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{}", w),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Eq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::Not => write!(f, "!"),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                if chars.next() != Some('=') {
                    return Err(filter_error(input, "expected '=='"));
                }
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ne);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '&' => {
                chars.next();
                if chars.next() != Some('&') {
                    return Err(filter_error(input, "expected '&&'"));
                }
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                if chars.next() != Some('|') {
                    return Err(filter_error(input, "expected '||'"));
                }
                tokens.push(Token::Or);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(filter_error(input, "unterminated string")),
                        },
                        Some(ch) => value.push(ch),
                        None => return Err(filter_error(input, "unterminated string")),
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if !is_word_char(ch) {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            other => {
                return Err(filter_error(input, &format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '/')
}

fn filter_error(input: &str, message: &str) -> DiscoveryError {
    DiscoveryError::config(format!("Invalid tag filter '{}': {}", input, message))
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Equals { key: String, value: String, negate: bool },
    AnyEquals { value: String, negate: bool },
    Exists(String),
}

impl Expr {
    fn evaluate(&self, tags: &BTreeMap<String, String>) -> bool {
        match self {
            Expr::Or(lhs, rhs) => lhs.evaluate(tags) || rhs.evaluate(tags),
            Expr::And(lhs, rhs) => lhs.evaluate(tags) && rhs.evaluate(tags),
            Expr::Not(inner) => !inner.evaluate(tags),
            Expr::Equals { key, value, negate } => {
                let matched = tags.get(key).is_some_and(|v| v == value);
                matched != *negate
            }
            Expr::AnyEquals { value, negate } => {
                let matched = tags.values().any(|v| v == value);
                matched != *negate
            }
            Expr::Exists(key) => tags.contains_key(key),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => {
                Err(filter_error(self.input, &format!("expected '{}', found '{}'", expected, token)))
            }
            None => Err(filter_error(self.input, &format!("expected '{}'", expected))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.next();
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Not) => Ok(Expr::Not(Box::new(self.parse_unary()?))),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Word(word)) => self.parse_comparison(word),
            Some(token) => Err(filter_error(self.input, &format!("unexpected '{}'", token))),
            None => Err(filter_error(self.input, "unexpected end of expression")),
        }
    }

    fn parse_comparison(&mut self, word: String) -> Result<Expr> {
        let key = word.strip_prefix(TAG_PREFIX).filter(|k| !k.is_empty()).ok_or_else(|| {
            filter_error(self.input, &format!("'{}' must start with '{}'", word, TAG_PREFIX))
        })?;

        if let Some(exists_key) = key.strip_suffix(EXISTS_SUFFIX) {
            if self.peek() == Some(&Token::LParen) {
                self.expect(Token::LParen)?;
                self.expect(Token::RParen)?;
                return Ok(Expr::Exists(exists_key.to_string()));
            }
        }

        let any = if key == ANY_KEY && self.peek() == Some(&Token::LParen) {
            self.expect(Token::LParen)?;
            self.expect(Token::RParen)?;
            true
        } else {
            false
        };

        let negate = match self.next() {
            Some(Token::Eq) => false,
            Some(Token::Ne) => true,
            _ => return Err(filter_error(self.input, &format!("expected '==' or '!=' after '{}'", word))),
        };

        let value = match self.next() {
            Some(Token::Str(value)) => value,
            Some(Token::Word(value)) => value,
            _ => return Err(filter_error(self.input, "expected a value to compare against")),
        };

        if any {
            Ok(Expr::AnyEquals { value, negate })
        } else {
            Ok(Expr::Equals { key: key.to_string(), value, negate })
        }
    }
}

/// A parsed tag filter expression
#[derive(Debug, Clone)]
pub struct TagFilter {
    source: String,
    expr: Option<Expr>,
}

impl TagFilter {
    /// Parse a filter expression; empty input matches everything
    pub fn new(expression: &str) -> Result<Self> {
        let source = expression.trim().to_string();
        if source.is_empty() {
            return Ok(Self { source, expr: None });
        }

        let tokens = tokenize(&source)?;
        let mut parser = Parser { input: &source, tokens, pos: 0 };
        let expr = parser.parse_or()?;

        if let Some(token) = parser.peek() {
            return Err(filter_error(&source, &format!("unexpected trailing '{}'", token)));
        }

        Ok(Self { expr: Some(expr), source })
    }

    /// A filter that matches every service
    pub fn match_all() -> Self {
        Self { source: String::new(), expr: None }
    }

    /// Evaluate the filter against a tag map
    pub fn evaluate(&self, tags: &BTreeMap<String, String>) -> bool {
        self.expr.as_ref().map_or(true, |expr| expr.evaluate(tags))
    }

    /// The expression this filter was parsed from
    pub fn expression(&self) -> &str {
        &self.source
    }
}

impl Default for TagFilter {
    fn default() -> Self {
        Self::match_all()
    }
}
