//! SE-003: Lexer, parser and writer for the text scene/resource format.
//!
//! Files are a sequence of bracketed section headers, each followed by
//! `key = value` property lines:
//!
//! ```text
//! [gd_scene load_steps=2 format=3]
//!
//! [ext_resource type="Script" path="res://player.gd" id="1"]
//!
//! [node name="Player" type="CharacterBody2D"]
//! position = Vector2(10, 20)
//! script = ExtResource("1")
//! ```
//!
//! Values may span lines (dictionaries, arrays), so the parser works on a
//! token stream rather than on lines.

use super::variant::{Color, Rect2, Variant, Vector2, Vector3};
use indexmap::IndexMap;
use std::iter::Peekable;
use std::str::Chars;

/// Parse failure with the 1-based line it was detected on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct FormatError {
    pub line: usize,
    pub message: String,
}

/// One `[tag attr=value ...]` header and the properties that follow it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub tag: String,
    pub attrs: IndexMap<String, Variant>,
    pub props: IndexMap<String, Variant>,
}

impl Section {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: Variant) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    /// String-valued header attribute (`name="Player"`).
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Variant::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Colon,
    Equals,
    Amp,
    Caret,
    Ident(String),
    Str(String),
    Number(String),
    Eof,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == ';' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError {
            line: self.line,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Token, FormatError> {
        self.skip_trivia();
        let c = match self.bump() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };
        let token = match c {
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '=' => Token::Equals,
            '&' => Token::Amp,
            '^' => Token::Caret,
            '"' => Token::Str(self.string_body()?),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                Token::Number(self.number_body(c))
            }
            c if is_key_start(c) => {
                let mut s = String::from(c);
                while let Some(&p) = self.chars.peek() {
                    if is_key_char(p) {
                        s.push(p);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Token::Ident(s)
            }
            other => return Err(self.error(format!("unexpected character '{}'", other))),
        };
        Ok(token)
    }

    fn string_body(&mut self) -> Result<String, FormatError> {
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some(other) => s.push(other),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn number_body(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&p) = self.chars.peek() {
            let after_exponent = matches!(s.chars().last(), Some('e') | Some('E'));
            if p.is_ascii_digit()
                || p == '.'
                || p == 'e'
                || p == 'E'
                || ((p == '-' || p == '+') && after_exponent)
            {
                s.push(p);
                self.bump();
            } else {
                break;
            }
        }
        s
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, FormatError> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, FormatError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error(&self, message: impl Into<String>) -> FormatError {
        self.lexer.error(message)
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormatError> {
        if self.current != expected {
            return Err(self.error(format!(
                "expected {:?}, found {:?}",
                expected, self.current
            )));
        }
        self.advance()?;
        Ok(())
    }

    fn expect_ident(&mut self) -> Result<String, FormatError> {
        match self.advance()? {
            Token::Ident(s) => Ok(s),
            other => Err(self.error(format!("expected identifier, found {:?}", other))),
        }
    }

    fn sections(&mut self) -> Result<Vec<Section>, FormatError> {
        let mut sections = Vec::new();
        while self.current != Token::Eof {
            self.expect(Token::LBracket)?;
            let mut section = Section::new(&self.expect_ident()?);
            while self.current != Token::RBracket {
                let key = self.expect_ident()?;
                self.expect(Token::Equals)?;
                let value = self.value()?;
                section.attrs.insert(key, value);
            }
            self.advance()?;
            while let Token::Ident(_) = self.current {
                let key = self.expect_ident()?;
                self.expect(Token::Equals)?;
                let value = self.value()?;
                section.props.insert(key, value);
            }
            if !matches!(self.current, Token::LBracket | Token::Eof) {
                return Err(self.error(format!("unexpected {:?} after properties", self.current)));
            }
            sections.push(section);
        }
        Ok(sections)
    }

    fn value(&mut self) -> Result<Variant, FormatError> {
        match self.advance()? {
            Token::Str(s) => Ok(Variant::String(s)),
            Token::Number(n) if n == "-" && self.current == Token::Ident("inf".into()) => {
                self.advance()?;
                Ok(Variant::Float(f64::NEG_INFINITY))
            }
            Token::Number(n) => self.number(&n),
            Token::Amp => match self.advance()? {
                Token::Str(s) => Ok(Variant::StringName(s)),
                other => Err(self.error(format!("expected string after '&', found {:?}", other))),
            },
            Token::Caret => match self.advance()? {
                Token::Str(s) => Ok(Variant::NodePath(s)),
                other => Err(self.error(format!("expected string after '^', found {:?}", other))),
            },
            Token::LBracket => Ok(Variant::Array(self.list(Token::RBracket)?)),
            Token::LBrace => self.dictionary(),
            Token::Ident(name) => self.ident_value(name),
            other => Err(self.error(format!("unexpected {:?} in value", other))),
        }
    }

    fn number(&self, raw: &str) -> Result<Variant, FormatError> {
        if !raw.contains(['.', 'e', 'E']) {
            if let Ok(i) = raw.parse::<i64>() {
                return Ok(Variant::Int(i));
            }
        }
        raw.parse::<f64>()
            .map(Variant::Float)
            .map_err(|_| self.error(format!("invalid number '{}'", raw)))
    }

    /// Comma-separated values up to `close`; trailing comma allowed.
    fn list(&mut self, close: Token) -> Result<Vec<Variant>, FormatError> {
        let mut items = Vec::new();
        while self.current != close {
            items.push(self.value()?);
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != close {
                return Err(self.error(format!("expected ',' or {:?}, found {:?}", close, self.current)));
            }
        }
        self.advance()?;
        Ok(items)
    }

    fn dictionary(&mut self) -> Result<Variant, FormatError> {
        let mut map = IndexMap::new();
        while self.current != Token::RBrace {
            let key = match self.value()? {
                Variant::String(s) | Variant::StringName(s) => s,
                other => {
                    return Err(self.error(format!(
                        "dictionary keys must be strings, found {}",
                        other.type_name()
                    )))
                }
            };
            self.expect(Token::Colon)?;
            let value = self.value()?;
            map.insert(key, value);
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != Token::RBrace {
                return Err(self.error(format!("expected ',' or '}}', found {:?}", self.current)));
            }
        }
        self.advance()?;
        Ok(Variant::Dictionary(map))
    }

    fn ident_value(&mut self, name: String) -> Result<Variant, FormatError> {
        match name.as_str() {
            "true" => return Ok(Variant::Bool(true)),
            "false" => return Ok(Variant::Bool(false)),
            "null" | "nil" => return Ok(Variant::Nil),
            "inf" => return Ok(Variant::Float(f64::INFINITY)),
            "nan" => return Ok(Variant::Float(f64::NAN)),
            _ => {}
        }
        // Typed containers: `Array[int]([1, 2])`.
        let mut name = name;
        if self.current == Token::LBracket {
            self.advance()?;
            let inner = self.expect_ident()?;
            self.expect(Token::RBracket)?;
            name = format!("{}[{}]", name, inner);
        }
        if self.current != Token::LParen {
            return Err(self.error(format!("unexpected identifier '{}'", name)));
        }
        self.advance()?;
        let args = self.list(Token::RParen)?;
        Ok(construct(name, args))
    }
}

fn reals(args: &[Variant]) -> Option<Vec<f64>> {
    args.iter().map(Variant::as_f64).collect()
}

/// Map a parsed constructor onto a dedicated variant shape when one exists.
fn construct(name: String, args: Vec<Variant>) -> Variant {
    let nums = reals(&args);
    let single_str = match args.as_slice() {
        [Variant::String(s)] => Some(s.clone()),
        [Variant::Int(i)] => Some(i.to_string()),
        _ => None,
    };
    let shaped = match (name.as_str(), nums.as_deref(), single_str) {
        ("Vector2", Some(&[x, y]), _) => Some(Variant::Vector2(Vector2 { x, y })),
        ("Vector3", Some(&[x, y, z]), _) => Some(Variant::Vector3(Vector3 { x, y, z })),
        ("Color", Some(&[r, g, b]), _) => Some(Variant::Color(Color { r, g, b, a: 1.0 })),
        ("Color", Some(&[r, g, b, a]), _) => Some(Variant::Color(Color { r, g, b, a })),
        ("Rect2", Some(&[x, y, width, height]), _) => Some(Variant::Rect2(Rect2 {
            x,
            y,
            width,
            height,
        })),
        ("PackedFloat32Array", Some(values), _) => {
            Some(Variant::PackedFloat32Array(values.to_vec()))
        }
        ("NodePath", _, Some(path)) => Some(Variant::NodePath(path)),
        ("SubResource", _, Some(id)) => Some(Variant::SubResource(id)),
        ("ExtResource", _, Some(id)) => Some(Variant::ExtResource(id)),
        _ => None,
    };
    shaped.unwrap_or(Variant::Constructor { name, args })
}

/// Parse a whole document into its sections.
pub fn parse(src: &str) -> Result<Vec<Section>, FormatError> {
    Parser::new(src)?.sections()
}

/// Render sections back to text. Sections are separated by a blank line.
fn is_key_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '/'
}

/// True when `key` lexes back as a single identifier, so it can be written
/// unquoted on the left of a property line.
pub fn is_property_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(is_key_start) && chars.all(is_key_char)
}

pub fn write(sections: &[Section]) -> String {
    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push('[');
        out.push_str(&section.tag);
        for (key, value) in &section.attrs {
            out.push_str(&format!(" {}={}", key, value));
        }
        out.push_str("]\n");
        for (key, value) in &section.props {
            out.push_str(&format!("{} = {}\n", key, value));
        }
    }
    out
}
