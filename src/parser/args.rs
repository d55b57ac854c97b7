#![forbid(unsafe_code)]

//! Parameter list parsing
//!
//! Parses the `(name=value, other="quoted, text", list=[a, "b"])` part of an
//! invocation. Values are kept raw; typing happens in the validator.

use crate::types::Identifier;
use serde::Serialize;
use std::fmt;

/// An unvalidated parameter value as written in the invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A bare token or the unescaped contents of a quoted string
    Text(String),
    /// A bracketed list of tokens
    List(Vec<String>),
}

impl RawValue {
    /// Canonical source form, quoting only where the grammar requires it
    pub fn to_syntax(&self) -> String {
        match self {
            RawValue::Text(text) => quote_if_needed(text),
            RawValue::List(items) => {
                let items: Vec<String> = items.iter().map(|i| quote_if_needed(i)).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(text) => f.write_str(text),
            RawValue::List(_) => f.write_str(&self.to_syntax()),
        }
    }
}

/// One `name=value` pair from an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawParam {
    pub name: Identifier,
    pub value: RawValue,
}

/// Quote a token unless it can be written bare
pub fn quote_if_needed(token: &str) -> String {
    let bare = !token.is_empty()
        && token.trim() == token
        && !token
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '[' | ']' | '"' | '\'' | '=' | '\\') || c.is_control());
    if bare {
        return token.to_string();
    }

    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for c in token.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Byte-oriented cursor over a single invocation line
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Read a quoted string; the opening quote is the current character
    fn quoted(&mut self) -> Result<String, String> {
        let quote = self.bump().ok_or("expected a quoted string")?;
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(format!("unterminated {} string", quote)),
                Some('\\') => match self.bump() {
                    Some(c) if c == quote || c == '\\' => value.push(c),
                    Some(c) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => return Err(format!("unterminated {} string", quote)),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
            }
        }
    }

    /// Read an unquoted token up to (not including) one of `stops`
    fn bare(&mut self, stops: &[char]) -> Result<String, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            if matches!(c, '"' | '\'' | '(' | '[' | ']' | ')' | '=') {
                return Err(format!("unexpected '{}' in value", c));
            }
            self.bump();
        }
        let token = self.src[start..self.pos].trim();
        if token.is_empty() {
            return Err("missing value".to_string());
        }
        Ok(token.to_string())
    }

    fn identifier(&mut self) -> Result<Identifier, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            self.bump();
        }
        let name = &self.src[start..self.pos];
        Identifier::new(name).ok_or_else(|| match self.peek() {
            Some(c) if name.is_empty() => format!("expected parameter name, found '{}'", c),
            None if name.is_empty() => "expected parameter name".to_string(),
            _ => format!("invalid parameter name '{}'", name),
        })
    }

    fn list(&mut self) -> Result<Vec<String>, String> {
        // Opening bracket already consumed
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.eat(']') {
            return Ok(items);
        }
        loop {
            self.skip_whitespace();
            let item = match self.peek() {
                Some('"') | Some('\'') => self.quoted()?,
                Some(_) => self.bare(&[',', ']'])?,
                None => return Err("unterminated array".to_string()),
            };
            items.push(item);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {
                    self.skip_whitespace();
                    // Trailing comma before the closing bracket
                    if self.eat(']') {
                        return Ok(items);
                    }
                }
                Some(']') => return Ok(items),
                Some(c) => return Err(format!("expected ',' or ']' in array, found '{}'", c)),
                None => return Err("unterminated array".to_string()),
            }
        }
    }

    fn value(&mut self) -> Result<RawValue, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('"') | Some('\'') => self.quoted().map(RawValue::Text),
            Some('[') => {
                self.bump();
                self.list().map(RawValue::List)
            }
            Some(_) => self.bare(&[',', ')']).map(RawValue::Text),
            None => Err("unterminated parameter list".to_string()),
        }
    }
}

/// Parse a parameter list starting just after its opening parenthesis
///
/// Returns the parameters in written order and the number of bytes consumed,
/// including the closing parenthesis. Duplicate names are rejected.
pub fn parse_parameter_list(src: &str) -> Result<(Vec<RawParam>, usize), String> {
    let mut cursor = Cursor::new(src);
    let mut params: Vec<RawParam> = Vec::new();

    cursor.skip_whitespace();
    if cursor.eat(')') {
        return Ok((params, cursor.pos));
    }

    loop {
        cursor.skip_whitespace();
        if cursor.peek().is_none() {
            return Err("unterminated parameter list".to_string());
        }
        let name = cursor.identifier()?;
        cursor.skip_whitespace();
        if !cursor.eat('=') {
            return Err(match cursor.peek() {
                Some(c) => format!("expected '=' after '{}', found '{}'", name, c),
                None => format!("expected '=' after '{}'", name),
            });
        }
        let value = cursor.value()?;
        if params.iter().any(|p| p.name == name) {
            return Err(format!("parameter '{}' given more than once", name));
        }
        params.push(RawParam { name, value });

        cursor.skip_whitespace();
        match cursor.bump() {
            Some(',') => {
                cursor.skip_whitespace();
                if cursor.eat(')') {
                    return Ok((params, cursor.pos));
                }
            }
            Some(')') => return Ok((params, cursor.pos)),
            Some(c) => return Err(format!("expected ',' or ')', found '{}'", c)),
            None => return Err("unterminated parameter list".to_string()),
        }
    }
}

/// Split list syntax into tokens
///
/// Accepts either a bracketed list (`[a, "b, c"]`) or a bare comma-separated
/// list (`a, b`). An empty or whitespace-only input is an empty list.
pub fn parse_list_literal(src: &str) -> Result<Vec<String>, String> {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut cursor = Cursor::new(trimmed);
    let items = if cursor.eat('[') {
        cursor.list()?
    } else {
        let mut items = Vec::new();
        loop {
            cursor.skip_whitespace();
            let item = match cursor.peek() {
                Some('"') | Some('\'') => cursor.quoted()?,
                _ => cursor.bare(&[','])?,
            };
            items.push(item);
            cursor.skip_whitespace();
            if !cursor.eat(',') {
                break;
            }
        }
        items
    };

    cursor.skip_whitespace();
    if let Some(c) = cursor.peek() {
        return Err(format!("unexpected '{}' after list", c));
    }
    Ok(items)
}
