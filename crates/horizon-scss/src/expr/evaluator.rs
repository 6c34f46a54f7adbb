//! Tokenizer and interpreter for condition expressions.

use std::cmp::Ordering;
use std::fmt;

use cssparser::{ParseError as CssParseError, Parser, ParserInput, Token};

use super::format_number;
use crate::{Error, Result};

/// A value produced while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    /// `false`, `null`, `0` and the empty string are falsy; everything else
    /// (including any bare word) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
        }
    }

    fn to_number(&self) -> std::result::Result<f64, String> {
        match self {
            Value::Null => Ok(0.0),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Ok(*n),
            Value::Str(s) if s.trim().is_empty() => Ok(0.0),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", s)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Or,
    And,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Op {
    /// Binding power as an infix operator; `None` for prefix-only operators.
    fn precedence(self) -> Option<u8> {
        match self {
            Op::Or => Some(1),
            Op::And => Some(2),
            Op::Eq | Op::Ne => Some(3),
            Op::Lt | Op::Le | Op::Gt | Op::Ge => Some(4),
            Op::Add | Op::Sub => Some(5),
            Op::Mul | Op::Div | Op::Rem => Some(6),
            Op::Not => None,
        }
    }
}

/// Raw lexical units straight out of the CSS tokenizer.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Literal(Value),
    Word(String),
    Delim(char),
    Op(Op),
    Open,
    Close,
}

impl Lexeme {
    fn is_operand(&self) -> bool {
        matches!(self, Lexeme::Literal(_) | Lexeme::Word(_) | Lexeme::Close)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Literal(Value),
    Op(Op),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(Value),
    Not(Box<Node>),
    Negate(Box<Node>),
    Plus(Box<Node>),
    Binary(Op, Box<Node>, Box<Node>),
}

/// A parsed expression, ready to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    /// Parse `text`. Variables and function calls must already be resolved.
    pub fn parse(text: &str) -> Result<Self> {
        let fail = |message: String| Error::expression(text.trim(), message);

        let lexemes = lex(text).map_err(fail)?;
        let tokens = combine(lexemes).map_err(fail)?;
        if tokens.is_empty() {
            return Err(fail("empty expression".to_string()));
        }

        let mut parser = ExprParser { tokens, pos: 0 };
        let root = parser.parse_binary(0).map_err(fail)?;
        if parser.pos < parser.tokens.len() {
            return Err(fail("unexpected trailing input".to_string()));
        }

        Ok(Self {
            source: text.trim().to_string(),
            root,
        })
    }

    /// The expression text this was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate to a value.
    pub fn evaluate(&self) -> Result<Value> {
        eval(&self.root).map_err(|message| Error::expression(&self.source, message))
    }
}

/// Parse and evaluate `text`.
pub fn evaluate(text: &str) -> Result<Value> {
    Expression::parse(text)?.evaluate()
}

/// Parse and evaluate `text` as an `@if` condition.
pub fn evaluate_condition(text: &str) -> Result<bool> {
    Ok(evaluate(text)?.is_truthy())
}

/// Parse and evaluate `text`, requiring a numeric result.
pub fn evaluate_number(text: &str) -> Result<f64> {
    let value = evaluate(text)?;
    value
        .to_number()
        .map_err(|message| Error::expression(text.trim(), message))
}

fn lex(text: &str) -> std::result::Result<Vec<Lexeme>, String> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut lexemes = Vec::new();
    collect(&mut parser, &mut lexemes)?;
    Ok(lexemes)
}

fn collect<'i>(
    parser: &mut Parser<'i, '_>,
    out: &mut Vec<Lexeme>,
) -> std::result::Result<(), String> {
    loop {
        let start = parser.position();
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };

        match token {
            Token::Number { value, has_sign, .. } => {
                let text = parser.slice_from(start).trim();
                let value = text.parse::<f64>().unwrap_or(value as f64);
                push_signed(out, value, has_sign, |n| Lexeme::Literal(Value::Number(n)));
            }
            Token::Dimension {
                value,
                has_sign,
                unit,
                ..
            } => {
                let text = parser.slice_from(start).trim();
                let number = text
                    .get(..text.len().saturating_sub(unit.len()))
                    .and_then(|n| n.parse::<f64>().ok())
                    .unwrap_or(value as f64);
                if unit.eq_ignore_ascii_case("px") {
                    push_signed(out, number, has_sign, |n| Lexeme::Literal(Value::Number(n)));
                } else {
                    push_signed(out, number, has_sign, |n| {
                        Lexeme::Word(format!("{}{}", format_number(n), unit))
                    });
                }
            }
            Token::Percentage { .. } => {
                out.push(Lexeme::Word(parser.slice_from(start).trim().to_string()));
            }
            Token::QuotedString(s) => out.push(Lexeme::Literal(Value::Str(s.to_string()))),
            Token::Ident(name) => {
                let lexeme = match name.to_ascii_lowercase().as_str() {
                    "true" => Lexeme::Literal(Value::Bool(true)),
                    "false" => Lexeme::Literal(Value::Bool(false)),
                    "null" => Lexeme::Literal(Value::Null),
                    "and" => Lexeme::Op(Op::And),
                    "or" => Lexeme::Op(Op::Or),
                    "not" => Lexeme::Op(Op::Not),
                    _ => Lexeme::Word(name.to_string()),
                };
                out.push(lexeme);
            }
            Token::Hash(hash) | Token::IDHash(hash) => {
                out.push(Lexeme::Word(format!("#{}", hash)));
            }
            Token::UnquotedUrl(url) => out.push(Lexeme::Word(format!("url({})", url))),
            Token::Function(_) => {
                parser
                    .parse_nested_block(|p| {
                        while p.next().is_ok() {}
                        Ok::<_, CssParseError<'_, ()>>(())
                    })
                    .map_err(|e| format!("{:?}", e.kind))?;
                out.push(Lexeme::Word(parser.slice_from(start).trim().to_string()));
            }
            Token::ParenthesisBlock => {
                out.push(Lexeme::Open);
                let inner = parser
                    .parse_nested_block(|p| Ok::<_, CssParseError<'_, ()>>(collect(p, out)))
                    .map_err(|e| format!("{:?}", e.kind))?;
                inner?;
                out.push(Lexeme::Close);
            }
            Token::Delim(c) => out.push(Lexeme::Delim(c)),
            other => return Err(format!("unexpected token {:?}", other)),
        }
    }
}

/// A sign glued to a number after an operand is really a binary operator:
/// `5 -3` is `5 - 3`.
fn push_signed(
    out: &mut Vec<Lexeme>,
    value: f64,
    has_sign: bool,
    make: impl FnOnce(f64) -> Lexeme,
) {
    if has_sign && out.last().is_some_and(Lexeme::is_operand) {
        out.push(Lexeme::Op(if value < 0.0 { Op::Sub } else { Op::Add }));
        out.push(make(value.abs()));
    } else {
        out.push(make(value));
    }
}

/// Fold delimiters into operators and join adjacent bare words.
fn combine(lexemes: Vec<Lexeme>) -> std::result::Result<Vec<Tok>, String> {
    let mut tokens = Vec::with_capacity(lexemes.len());
    let mut words: Option<String> = None;
    let mut iter = lexemes.into_iter().peekable();

    while let Some(lexeme) = iter.next() {
        if let Lexeme::Word(word) = lexeme {
            match &mut words {
                Some(joined) => {
                    joined.push(' ');
                    joined.push_str(&word);
                }
                None => words = Some(word),
            }
            continue;
        }
        if let Some(joined) = words.take() {
            tokens.push(Tok::Literal(Value::Str(joined)));
        }

        let token = match lexeme {
            Lexeme::Literal(value) => Tok::Literal(value),
            Lexeme::Op(op) => Tok::Op(op),
            Lexeme::Open => Tok::Open,
            Lexeme::Close => Tok::Close,
            Lexeme::Word(_) => continue,
            Lexeme::Delim(c) => {
                let mut followed_by = |next: char| {
                    let hit = iter.peek() == Some(&Lexeme::Delim(next));
                    if hit {
                        iter.next();
                    }
                    hit
                };
                let op = match c {
                    '=' => {
                        followed_by('=');
                        Op::Eq
                    }
                    '!' if followed_by('=') => Op::Ne,
                    '!' => Op::Not,
                    '<' if followed_by('=') => Op::Le,
                    '<' => Op::Lt,
                    '>' if followed_by('=') => Op::Ge,
                    '>' => Op::Gt,
                    '&' if followed_by('&') => Op::And,
                    '|' if followed_by('|') => Op::Or,
                    '+' => Op::Add,
                    '-' => Op::Sub,
                    '*' => Op::Mul,
                    '/' => Op::Div,
                    '%' => Op::Rem,
                    other => return Err(format!("unexpected '{}'", other)),
                };
                Tok::Op(op)
            }
        };
        tokens.push(token);
    }
    if let Some(joined) = words {
        tokens.push(Tok::Literal(Value::Str(joined)));
    }

    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl ExprParser {
    fn next(&mut self) -> Option<Tok> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_binary(&mut self, min_precedence: u8) -> std::result::Result<Node, String> {
        let mut lhs = self.parse_unary()?;

        while let Some(Tok::Op(op)) = self.tokens.get(self.pos) {
            let op = *op;
            let Some(precedence) = op.precedence() else {
                return Err("unexpected 'not'".to_string());
            };
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> std::result::Result<Node, String> {
        match self.next() {
            Some(Tok::Literal(value)) => Ok(Node::Literal(value)),
            Some(Tok::Op(Op::Not)) => Ok(Node::Not(Box::new(self.parse_unary()?))),
            Some(Tok::Op(Op::Sub)) => Ok(Node::Negate(Box::new(self.parse_unary()?))),
            Some(Tok::Op(Op::Add)) => Ok(Node::Plus(Box::new(self.parse_unary()?))),
            Some(Tok::Open) => {
                let inner = self.parse_binary(0)?;
                match self.next() {
                    Some(Tok::Close) => Ok(inner),
                    _ => Err("')' is expected".to_string()),
                }
            }
            Some(Tok::Op(op)) => Err(format!("unexpected operator {:?}", op)),
            Some(Tok::Close) => Err("unexpected ')'".to_string()),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn eval(node: &Node) -> std::result::Result<Value, String> {
    match node {
        Node::Literal(value) => Ok(value.clone()),
        Node::Not(inner) => Ok(Value::Bool(!eval(inner)?.is_truthy())),
        Node::Negate(inner) => Ok(Value::Number(-eval(inner)?.to_number()?)),
        Node::Plus(inner) => Ok(Value::Number(eval(inner)?.to_number()?)),
        Node::Binary(Op::And, lhs, rhs) => {
            let lhs = eval(lhs)?;
            if lhs.is_truthy() { eval(rhs) } else { Ok(lhs) }
        }
        Node::Binary(Op::Or, lhs, rhs) => {
            let lhs = eval(lhs)?;
            if lhs.is_truthy() { Ok(lhs) } else { eval(rhs) }
        }
        Node::Binary(op, lhs, rhs) => binary(*op, eval(lhs)?, eval(rhs)?),
    }
}

fn binary(op: Op, lhs: Value, rhs: Value) -> std::result::Result<Value, String> {
    match op {
        Op::Eq => Ok(Value::Bool(lhs == rhs)),
        Op::Ne => Ok(Value::Bool(lhs != rhs)),
        Op::Lt | Op::Le | Op::Gt | Op::Ge => {
            let ordering = match (&lhs, &rhs) {
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => lhs.to_number()?.partial_cmp(&rhs.to_number()?),
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match op {
                Op::Lt => ordering == Ordering::Less,
                Op::Le => ordering != Ordering::Greater,
                Op::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        Op::Add => match (&lhs, &rhs) {
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{}{}", lhs, rhs))),
            _ => Ok(Value::Number(lhs.to_number()? + rhs.to_number()?)),
        },
        Op::Sub => Ok(Value::Number(lhs.to_number()? - rhs.to_number()?)),
        Op::Mul => Ok(Value::Number(lhs.to_number()? * rhs.to_number()?)),
        Op::Div | Op::Rem => {
            let divisor = rhs.to_number()?;
            if divisor == 0.0 {
                return Err("division by zero".to_string());
            }
            let dividend = lhs.to_number()?;
            Ok(Value::Number(if op == Op::Div {
                dividend / divisor
            } else {
                dividend % divisor
            }))
        }
        Op::And | Op::Or | Op::Not => Err(format!("unexpected operator {:?}", op)),
    }
}
