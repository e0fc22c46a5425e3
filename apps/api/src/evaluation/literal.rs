//! Lenient literal decoder: the fallback path when a model answers with
//! near-JSON (single quotes, tuples, `True`/`None`, trailing commas).
//!
//! Accepts list, tuple, dict, string, number, bool and null literals and
//! nothing else. Strings may be triple-quoted and carry a `u` or `r` prefix.
//! Names, calls, operators, sets, bytes and f-strings are rejected. Output is a `serde_json::Value` so both decode paths feed the
//! same record builder.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Nesting limit for lists/dicts.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralErrorKind {
    UnexpectedEnd,
    UnexpectedChar(char),
    UnterminatedString,
    InvalidEscape,
    InvalidNumber,
    UnknownName(String),
    InvalidKey,
    TrailingCharacters,
    TooDeep,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("literal decode failed at byte {offset}: {kind:?}")]
pub struct LiteralError {
    pub offset: usize,
    pub kind: LiteralErrorKind,
}

/// Parses `text` as a single literal value. Surrounding whitespace is allowed;
/// anything else after the value is an error.
pub fn parse_literal(text: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser { src: text, pos: 0 };
    parser.skip_ws();
    let value = parser.parse_value(0)?;
    parser.skip_ws();
    if parser.pos < parser.src.len() {
        return Err(parser.err(LiteralErrorKind::TrailingCharacters));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn err(&self, kind: LiteralErrorKind) -> LiteralError {
        LiteralError {
            offset: self.pos,
            kind,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn expect_more(&self) -> Result<char, LiteralError> {
        self.peek()
            .ok_or_else(|| self.err(LiteralErrorKind::UnexpectedEnd))
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, LiteralError> {
        if depth > MAX_DEPTH {
            return Err(self.err(LiteralErrorKind::TooDeep));
        }
        if self.at_string_start() {
            return self.parse_strings().map(Value::String);
        }
        match self.expect_more()? {
            '[' => {
                self.bump();
                self.parse_sequence(']', depth).map(Value::Array)
            }
            '(' => {
                self.bump();
                self.parse_sequence(')', depth).map(Value::Array)
            }
            '{' => {
                self.bump();
                self.parse_dict(depth).map(Value::Object)
            }
            c if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            c if c.is_alphabetic() || c == '_' => self.parse_name(),
            c => Err(self.err(LiteralErrorKind::UnexpectedChar(c))),
        }
    }

    /// Items separated by commas, trailing comma allowed. Used for both
    /// lists and tuples; a parenthesised single value without a comma is
    /// treated as a one-element sequence as well.
    fn parse_sequence(&mut self, close: char, depth: usize) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.expect_more()? == close {
                self.bump();
                return Ok(items);
            }
            items.push(self.parse_value(depth + 1)?);
            self.skip_ws();
            match self.expect_more()? {
                ',' => {
                    self.bump();
                }
                c if c == close => {
                    self.bump();
                    return Ok(items);
                }
                c => return Err(self.err(LiteralErrorKind::UnexpectedChar(c))),
            }
        }
    }

    fn parse_dict(&mut self, depth: usize) -> Result<Map<String, Value>, LiteralError> {
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.expect_more()? == '}' {
                self.bump();
                return Ok(map);
            }
            let key_start = self.pos;
            let key = match self.parse_value(depth + 1)? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => {
                    return Err(LiteralError {
                        offset: key_start,
                        kind: LiteralErrorKind::InvalidKey,
                    })
                }
            };
            self.skip_ws();
            match self.expect_more()? {
                ':' => {
                    self.bump();
                }
                c => return Err(self.err(LiteralErrorKind::UnexpectedChar(c))),
            }
            self.skip_ws();
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);
            self.skip_ws();
            match self.expect_more()? {
                ',' => {
                    self.bump();
                }
                '}' => {
                    self.bump();
                    return Ok(map);
                }
                c => return Err(self.err(LiteralErrorKind::UnexpectedChar(c))),
            }
        }
    }

    /// A quote, or a `u`/`r` prefix directly followed by one.
    fn at_string_start(&self) -> bool {
        let mut chars = self.src[self.pos..].chars();
        match chars.next() {
            Some('\'' | '"') => true,
            Some('u' | 'U' | 'r' | 'R') => matches!(chars.next(), Some('\'' | '"')),
            _ => false,
        }
    }

    /// One or more adjacent string literals, concatenated (`'a' "b"` == `"ab"`).
    fn parse_strings(&mut self) -> Result<String, LiteralError> {
        let mut out = self.parse_string()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            if self.at_string_start() {
                out.push_str(&self.parse_string()?);
            } else {
                self.pos = save;
                return Ok(out);
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let raw = match self.expect_more()? {
            'r' | 'R' => {
                self.bump();
                true
            }
            'u' | 'U' => {
                self.bump();
                false
            }
            _ => false,
        };
        let quote = self.expect_more()?;
        self.bump();
        let triple = if quote == '"' { "\"\"\"" } else { "'''" };
        let is_triple = self.src[self.pos..].starts_with(&triple[1..]);
        if is_triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            if is_triple && self.src[self.pos..].starts_with(triple) {
                self.pos += triple.len();
                return Ok(out);
            }
            let c = self.bump().ok_or(LiteralError {
                offset: start,
                kind: LiteralErrorKind::UnterminatedString,
            })?;
            match c {
                c if c == quote && !is_triple => return Ok(out),
                // Raw strings keep the backslash and whatever follows it.
                '\\' if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                '\\' => self.parse_escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.expect_more()?;
        self.bump();
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '/' => out.push('/'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            // Line continuation.
            '\n' => {}
            'x' => out.push(self.parse_hex_escape(2)?),
            'u' => {
                let code = self.parse_hex_code(4)?;
                let c = if (0xD800..=0xDBFF).contains(&code) {
                    self.finish_surrogate_pair(code)
                } else {
                    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                };
                out.push(c);
            }
            'U' => out.push(self.parse_hex_escape(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn parse_hex_escape(&mut self, len: usize) -> Result<char, LiteralError> {
        let start = self.pos;
        let code = self.parse_hex_code(len)?;
        char::from_u32(code).ok_or(LiteralError {
            offset: start,
            kind: LiteralErrorKind::InvalidEscape,
        })
    }

    fn parse_hex_code(&mut self, len: usize) -> Result<u32, LiteralError> {
        let end = self.pos + len;
        let code = self
            .src
            .get(self.pos..end)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|digits| u32::from_str_radix(digits, 16).ok())
            .ok_or_else(|| self.err(LiteralErrorKind::InvalidEscape))?;
        self.pos = end;
        Ok(code)
    }

    /// Pairs a high surrogate with a directly following `\uDC00`..`\uDFFF`
    /// escape. A surrogate without its partner decodes to U+FFFD.
    fn finish_surrogate_pair(&mut self, high: u32) -> char {
        let low = self.src[self.pos..]
            .strip_prefix("\\u")
            .and_then(|rest| rest.get(..4))
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|digits| u32::from_str_radix(digits, 16).ok())
            .filter(|low| (0xDC00..=0xDFFF).contains(low));
        match low {
            Some(low) => {
                self.pos += 6;
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
            }
            None => char::REPLACEMENT_CHARACTER,
        }
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw = &self.src[start..self.pos];
        let invalid = LiteralError {
            offset: start,
            kind: LiteralErrorKind::InvalidNumber,
        };
        if raw.starts_with('_') || raw.ends_with('_') || raw.contains("__") {
            return Err(invalid);
        }
        let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
        let unsigned = cleaned.trim_start_matches(['+', '-']);
        if unsigned.len() + 1 < cleaned.len()
            || unsigned.is_empty()
            || !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        {
            return Err(invalid);
        }
        let is_float = unsigned.contains(['.', 'e', 'E']);
        if !is_float {
            if let Ok(i) = cleaned.parse::<i64>() {
                return Ok(Value::Number(i.into()));
            }
        }
        cleaned
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or(invalid)
    }

    fn parse_name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            other => Err(LiteralError {
                offset: start,
                kind: LiteralErrorKind::UnknownName(other.to_string()),
            }),
        }
    }
}
