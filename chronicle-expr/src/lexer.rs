//! Single-pass lexer for the arithmetic expression language.
//!
//! Mirrors the index-based scanning style of a JSON tokenizer: tokens carry
//! byte-offset spans into the source rather than owned strings, so the
//! caller decides when (or whether) to materialize text.

use core::fmt;

/// A byte-offset span into the source text a [`Token`] or AST node came
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset, inclusive.
    pub start: usize,
    /// End byte offset, exclusive.
    pub end: usize,
}

impl Span {
    /// Builds a span from a `start..end` byte range.
    pub const fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// The slice of `source` this span covers.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }

    /// The smallest span containing both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Why the lexer could not produce a well-formed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A character that starts no valid token.
    UnexpectedCharacter(char),
    /// A letter immediately followed a number's digits (e.g. `10x`).
    LetterAfterNumber,
    /// A lone `=` was found; only `==` is a valid operator.
    LoneEquals,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character {c:?}"),
            LexErrorKind::LetterAfterNumber => {
                f.write_str("a letter cannot immediately follow a number")
            }
            LexErrorKind::LoneEquals => f.write_str("'=' is not an operator, did you mean '=='?"),
        }
    }
}

/// The kind of a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An integer literal (no `.`, no exponent). `_` separators already
    /// stripped from `text`.
    Int,
    /// A floating-point literal (has `.` and/or an exponent). `_`
    /// separators already stripped from `text`.
    Float,
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    Identifier,
    /// One of `+ - * / % ^ == != < <= > >=`.
    Operator,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// The input was empty (or all whitespace).
    Empty,
    /// A malformed token; see [`LexErrorKind`].
    Error(LexErrorKind),
}

/// A single lexical token: its kind, its source span, and (for numbers and
/// identifiers) the literal text with `_` separators already removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Where in the source this token came from.
    pub span: Span,
    /// The token's text. For `Int`/`Float`, digit-group separators (`_`)
    /// have already been stripped so this parses directly with `str::parse`.
    pub text: alloc::string::String,
}

/// Tokenizes `source` into a flat list of [`Token`]s, always ending with a
/// token at end-of-input (`Empty` if `source` was empty/whitespace-only, or
/// the trailing token's natural end otherwise).
pub fn tokenize(source: &str) -> alloc::vec::Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = alloc::vec::Vec::new();
    loop {
        let tok = lexer.next_token();
        let done = matches!(tok.kind, TokenKind::Empty);
        tokens.push(tok);
        if done {
            break;
        }
    }
    tokens
}

struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn make(&self, kind: TokenKind, start: usize) -> Token {
        let span = Span::new(start, self.pos);
        Token {
            text: span.text(self.source).replace('_', ""),
            kind,
            span,
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.pos;
        let Some(b) = self.peek() else {
            return Token {
                kind: TokenKind::Empty,
                span: Span::new(start, start),
                text: alloc::string::String::new(),
            };
        };

        match b {
            b'(' => {
                self.pos += 1;
                self.make(TokenKind::LeftParen, start)
            }
            b')' => {
                self.pos += 1;
                self.make(TokenKind::RightParen, start)
            }
            b',' => {
                self.pos += 1;
                self.make(TokenKind::Comma, start)
            }
            b'+' | b'-' | b'*' | b'/' | b'%' | b'^' => {
                // A leading '-' starts a number only if immediately followed by a digit.
                if b == b'-' && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
                    self.scan_number(start)
                } else {
                    self.pos += 1;
                    self.make(TokenKind::Operator, start)
                }
            }
            b'=' => {
                if self.peek_at(1) == Some(b'=') {
                    self.pos += 2;
                    self.make(TokenKind::Operator, start)
                } else {
                    self.pos += 1;
                    self.make(TokenKind::Error(LexErrorKind::LoneEquals), start)
                }
            }
            b'!' | b'<' | b'>' => {
                self.pos += 1;
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                }
                self.make(TokenKind::Operator, start)
            }
            b'0'..=b'9' => self.scan_number(start),
            c if c.is_ascii_alphabetic() || c == b'_' => self.scan_identifier(start),
            _ => {
                let c = self.source[self.pos..].chars().next().unwrap();
                self.pos += c.len_utf8();
                self.make(TokenKind::Error(LexErrorKind::UnexpectedCharacter(c)), start)
            }
        }
    }

    fn scan_number(&mut self, start: usize) -> Token {
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let mut is_float = false;
        self.scan_digits();
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
            is_float = true;
            self.pos += 1;
            self.scan_digits();
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(lookahead), Some(b'+') | Some(b'-')) {
                lookahead += 1;
            }
            if matches!(self.peek_at(lookahead), Some(d) if d.is_ascii_digit()) {
                is_float = true;
                self.pos += lookahead;
                self.scan_digits();
            }
        }
        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.pos += 1;
            return self.make(TokenKind::Error(LexErrorKind::LetterAfterNumber), start);
        }
        self.make(
            if is_float {
                TokenKind::Float
            } else {
                TokenKind::Int
            },
            start,
        )
    }

    fn scan_digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'_') {
            self.pos += 1;
        }
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        self.make(TokenKind::Identifier, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> alloc::vec::Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_arithmetic() {
        let toks = tokenize("2 * (x + 3)");
        let texts: alloc::vec::Vec<_> = toks.iter().map(|t| t.text.clone()).collect();
        assert_eq!(
            texts,
            ["2", "*", "(", "x", "+", "3", ")", ""]
                .map(alloc::string::String::from)
                .to_vec()
        );
    }

    #[test]
    fn negative_number_vs_minus_operator() {
        let toks = tokenize("-3 - -3");
        assert_eq!(toks[0].kind, TokenKind::Int);
        assert_eq!(toks[0].text, "-3");
        assert_eq!(toks[1].kind, TokenKind::Operator);
        assert_eq!(toks[2].kind, TokenKind::Int);
        assert_eq!(toks[2].text, "-3");
    }

    #[test]
    fn underscore_separators_are_stripped() {
        let toks = tokenize("1_000_000");
        assert_eq!(toks[0].kind, TokenKind::Int);
        assert_eq!(toks[0].text, "1000000");
    }

    #[test]
    fn exponent_and_decimal_forms() {
        assert_eq!(kinds("1.5")[0], TokenKind::Float);
        assert_eq!(kinds("1e10")[0], TokenKind::Float);
        assert_eq!(kinds("1.5e-10")[0], TokenKind::Float);
        assert_eq!(kinds("10")[0], TokenKind::Int);
    }

    #[test]
    fn letter_after_number_is_an_error() {
        assert_eq!(
            kinds("10x")[0],
            TokenKind::Error(LexErrorKind::LetterAfterNumber)
        );
    }

    #[test]
    fn lone_equals_is_an_error() {
        assert_eq!(kinds("x = 1")[1], TokenKind::Error(LexErrorKind::LoneEquals));
    }

    #[test]
    fn comparison_operators() {
        for op in ["==", "!=", "<", "<=", ">", ">="] {
            assert_eq!(kinds(op)[0], TokenKind::Operator, "operator {op}");
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(kinds(""), [TokenKind::Empty]);
        assert_eq!(kinds("   "), [TokenKind::Empty]);
    }
}
