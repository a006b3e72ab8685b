//! Recursive-descent parser for the native TSON grammar.
//!
//! Structured as a byte-cursor reader in the style of
//! `json-joy-json-pack::json::JsonDecoder`: a `pos` index into the input
//! bytes, one `read_*` method per grammar production, and an explicit byte
//! offset attached to every error.
//!
//! ```text
//! tson     := value
//! object   := '{' [ pair (',' pair)* ] '}'
//! pair     := string [ timestamp ] ':' value
//! array    := '[' [ elem (',' elem)* ] ']'
//! elem     := [ timestamp ] value
//! value    := primitive [ timestamp ] | object | array | 'null'
//! primitive:= string | number | bool
//! timestamp:= '<' [ digits ] '>'     ; '<>' means "unspecified" (= -1)
//! ```
//!
//! Timestamp placement is context-sensitive: it trails the key in an
//! object pair, leads the primitive in an array element, and trails the
//! primitive at the top level / standalone.

use std::collections::BTreeMap;

use crate::error::ParseError;
use crate::model::{LeafValue, Value, UNSPECIFIED_TIMESTAMP};

/// Parser behavior for primitives with no timestamp annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// When `true`, every primitive must carry an explicit `<...>` timestamp
    /// (even if empty, `<>`). When `false` (the default), a missing
    /// timestamp is treated as `-1` ("unspecified").
    pub strict: bool,
}

/// Parses a complete native-TSON document.
///
/// # Example
///
/// ```
/// use tson::parser::parse;
///
/// let v = parse(r#"{"speed" <1700000000>: 72.5, "engineOn" <1700000000>: true}"#).unwrap();
/// assert_eq!(v.as_object().unwrap().len(), 2);
/// ```
pub fn parse(text: &str) -> Result<Value, ParseError> {
    parse_with(text, ParserOptions::default())
}

/// Parses a complete native-TSON document with explicit [`ParserOptions`].
pub fn parse_with(text: &str, options: ParserOptions) -> Result<Value, ParseError> {
    let mut parser = Parser {
        data: text.as_bytes(),
        pos: 0,
        options,
    };
    let value = parser.read_standalone_value()?;
    parser.skip_whitespace();
    if parser.pos != parser.data.len() {
        return Err(parser.err("trailing input after top-level value"));
    }
    Ok(value)
}

/// A value with its timestamp handling deferred to the caller, since
/// timestamp placement depends on whether this value sits in an object
/// pair, an array element, or the standalone top level.
enum RawValue {
    Primitive(LeafValue),
    Object(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Null,
}

struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
    options: ParserOptions,
}

impl<'a> Parser<'a> {
    fn err(&self, reason: impl Into<String>) -> ParseError {
        ParseError::new(self.pos, reason)
    }

    fn err_at(&self, pos: usize, reason: impl Into<String>) -> ParseError {
        ParseError::new(pos, reason)
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expect_byte(&mut self, b: u8) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format!("expected '{}'", b as char)))
        }
    }

    // ── Timestamp ──────────────────────────────────────────────────────

    /// Tries to consume a `<...>` timestamp starting at the current
    /// (whitespace-skipped) position. Returns `Ok(None)` if no `<` is found.
    fn try_read_timestamp(&mut self) -> Result<Option<i64>, ParseError> {
        self.skip_whitespace();
        if self.peek() != Some(b'<') {
            return Ok(None);
        }
        let start = self.pos;
        self.pos += 1; // consume '<'
        let digits_start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.peek() != Some(b'>') {
            return Err(self.err_at(start, "unterminated timestamp, expected '>'"));
        }
        let digits = &self.data[digits_start..self.pos];
        self.pos += 1; // consume '>'
        if digits.is_empty() {
            return Ok(Some(UNSPECIFIED_TIMESTAMP));
        }
        let text = std::str::from_utf8(digits).map_err(|_| self.err_at(digits_start, "invalid UTF-8 in timestamp"))?;
        let value: i64 = text
            .parse()
            .map_err(|_| self.err_at(digits_start, "malformed timestamp"))?;
        Ok(Some(value))
    }

    /// Resolves a primitive's effective timestamp, honoring strict mode.
    fn resolve_timestamp(&self, found: Option<i64>, pos: usize) -> Result<i64, ParseError> {
        match found {
            Some(ts) => Ok(ts),
            None if self.options.strict => {
                Err(self.err_at(pos, "missing required timestamp in strict mode"))
            }
            None => Ok(UNSPECIFIED_TIMESTAMP),
        }
    }

    // ── Context-specific value parsers ──────────────────────────────────

    /// Top-level / standalone: `primitive [timestamp] | object | array | 'null'`.
    fn read_standalone_value(&mut self) -> Result<Value, ParseError> {
        let pos = self.pos;
        match self.read_raw_value()? {
            RawValue::Primitive(p) => {
                let ts = self.try_read_timestamp()?;
                Ok(Value::leaf(p, self.resolve_timestamp(ts, pos)?))
            }
            RawValue::Object(map) => Ok(Value::Object(map)),
            RawValue::Array(arr) => Ok(Value::Array(arr)),
            RawValue::Null => Err(self.err_at(pos, "null is not a representable TSON leaf value")),
        }
    }

    /// An object pair's value: timestamp (if any) was already consumed
    /// before `:` by the caller and is passed in as `leading_ts`.
    fn read_pair_value(&mut self, leading_ts: Option<i64>, ts_pos: usize) -> Result<Value, ParseError> {
        let pos = self.pos;
        match self.read_raw_value()? {
            RawValue::Primitive(p) => Ok(Value::leaf(p, self.resolve_timestamp(leading_ts, ts_pos)?)),
            RawValue::Object(map) => {
                if leading_ts.is_some() {
                    return Err(self.err_at(ts_pos, "timestamp not allowed on a container value"));
                }
                Ok(Value::Object(map))
            }
            RawValue::Array(arr) => {
                if leading_ts.is_some() {
                    return Err(self.err_at(ts_pos, "timestamp not allowed on a container value"));
                }
                Ok(Value::Array(arr))
            }
            RawValue::Null => Err(self.err_at(pos, "null is not a representable TSON leaf value")),
        }
    }

    /// An array element's value: timestamp (if any) leads the element and
    /// was already consumed by the caller as `leading_ts`.
    fn read_elem_value(&mut self, leading_ts: Option<i64>, ts_pos: usize) -> Result<Value, ParseError> {
        // Same shape as a pair value: the only difference is where the
        // caller reads the timestamp from in the surrounding syntax.
        self.read_pair_value(leading_ts, ts_pos)
    }

    /// Reads one of `object | array | primitive | 'null'`, without
    /// consuming any timestamp.
    fn read_raw_value(&mut self) -> Result<RawValue, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => self.read_object().map(RawValue::Object),
            Some(b'[') => self.read_array().map(RawValue::Array),
            Some(b'"') => self.read_string().map(|s| RawValue::Primitive(LeafValue::String(s))),
            Some(b't') | Some(b'f') => self.read_bool().map(|b| RawValue::Primitive(LeafValue::Bool(b))),
            Some(b'n') => self.read_null().map(|_| RawValue::Null),
            Some(c) if c == b'-' || c.is_ascii_digit() => {
                self.read_number().map(|n| RawValue::Primitive(LeafValue::Number(n)))
            }
            Some(c) => Err(self.err(format!("unexpected character '{}'", c as char))),
            None => Err(self.err("unexpected end of input")),
        }
    }

    // ── Containers ───────────────────────────────────────────────────────

    fn read_object(&mut self) -> Result<BTreeMap<String, Value>, ParseError> {
        self.expect_byte(b'{')?;
        let mut map = BTreeMap::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(map);
        }
        loop {
            self.skip_whitespace();
            let key_pos = self.pos;
            if self.peek() != Some(b'"') {
                return Err(self.err("expected object key"));
            }
            let key = self.read_string()?;
            if map.contains_key(&key) {
                return Err(self.err_at(key_pos, format!("duplicate object key {key:?}")));
            }
            let ts_pos = self.pos;
            let leading_ts = self.try_read_timestamp()?;
            self.expect_byte(b':')?;
            self.skip_whitespace();
            let value = self.read_pair_value(leading_ts, ts_pos)?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.err("expected ',' or '}' in object")),
            }
        }
        Ok(map)
    }

    fn read_array(&mut self) -> Result<Vec<Value>, ParseError> {
        self.expect_byte(b'[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            self.skip_whitespace();
            let ts_pos = self.pos;
            let leading_ts = self.try_read_timestamp()?;
            self.skip_whitespace();
            let value = self.read_elem_value(leading_ts, ts_pos)?;
            items.push(value);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.err("expected ',' or ']' in array")),
            }
        }
        Ok(items)
    }

    // ── Primitives ───────────────────────────────────────────────────────

    fn read_null(&mut self) -> Result<(), ParseError> {
        self.expect_literal("null")
    }

    fn read_bool(&mut self) -> Result<bool, ParseError> {
        if self.data[self.pos..].starts_with(b"true") {
            self.expect_literal("true")?;
            Ok(true)
        } else {
            self.expect_literal("false")?;
            Ok(false)
        }
    }

    fn expect_literal(&mut self, lit: &str) -> Result<(), ParseError> {
        let bytes = lit.as_bytes();
        if self.data[self.pos..].starts_with(bytes) {
            self.pos += bytes.len();
            Ok(())
        } else {
            Err(self.err(format!("expected literal {lit:?}")))
        }
    }

    fn read_number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(self.err_at(start, "malformed number"));
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            let frac_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == frac_start {
                return Err(self.err_at(start, "malformed number: missing fractional digits"));
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == exp_start {
                return Err(self.err_at(start, "malformed number: missing exponent digits"));
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| self.err_at(start, "invalid UTF-8 in number"))?;
        text.parse::<f64>()
            .map_err(|_| self.err_at(start, "malformed number"))
    }

    fn read_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        if self.peek() != Some(b'"') {
            return Err(self.err("expected string"));
        }
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.err_at(start, "unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    out.push(self.read_escape(start)?);
                }
                Some(_) => {
                    let rest = std::str::from_utf8(&self.data[self.pos..])
                        .map_err(|_| self.err_at(self.pos, "invalid UTF-8 in string"))?;
                    let ch = rest.chars().next().expect("non-empty checked by peek");
                    out.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
        Ok(out)
    }

    fn read_escape(&mut self, string_start: usize) -> Result<char, ParseError> {
        let esc = self
            .peek()
            .ok_or_else(|| self.err_at(string_start, "unterminated escape sequence"))?;
        self.pos += 1;
        let ch = match esc {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.read_unicode_escape(string_start),
            other => {
                return Err(self.err_at(self.pos - 1, format!("bad escape '\\{}'", other as char)))
            }
        };
        Ok(ch)
    }

    fn read_unicode_escape(&mut self, string_start: usize) -> Result<char, ParseError> {
        let hi = self.read_hex4(string_start)?;
        if (0xD800..=0xDBFF).contains(&hi) {
            if self.data.get(self.pos) == Some(&b'\\') && self.data.get(self.pos + 1) == Some(&b'u') {
                self.pos += 2;
                let lo = self.read_hex4(string_start)?;
                if (0xDC00..=0xDFFF).contains(&lo) {
                    let c = 0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00);
                    return char::from_u32(c)
                        .ok_or_else(|| self.err_at(string_start, "invalid surrogate pair"));
                }
            }
            return Err(self.err_at(string_start, "unpaired UTF-16 surrogate"));
        }
        char::from_u32(hi).ok_or_else(|| self.err_at(string_start, "invalid \\u escape"))
    }

    fn read_hex4(&mut self, string_start: usize) -> Result<u32, ParseError> {
        if self.pos + 4 > self.data.len() {
            return Err(self.err_at(string_start, "truncated \\u escape"));
        }
        let text = std::str::from_utf8(&self.data[self.pos..self.pos + 4])
            .map_err(|_| self.err_at(string_start, "invalid UTF-8 in \\u escape"))?;
        let value =
            u32::from_str_radix(text, 16).map_err(|_| self.err_at(string_start, "invalid \\u escape"))?;
        self.pos += 4;
        Ok(value)
    }
}
