//! Rule-driven tokenizer.
//!
//! Each call to [`Lexer::next`] tries the rules in [`RULES`] against the start of the
//! remaining input; the first rule that matches decides the token. Rule order is the
//! only disambiguation mechanism, so new rules must be inserted with care.

use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Ident,
    Str,
    Plus,
    Minus,
    Star,
    Caret,
    Slash,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Number => "number",
            TokenKind::Ident => "identifier",
            TokenKind::Str => "quoted expression",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Caret => "'^'",
            TokenKind::Slash => "'/'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
        };
        f.write_str(text)
    }
}

/// A lexeme borrowed from the source, tagged with its kind and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub lexeme: &'a str,
    pub kind: TokenKind,
    pub position: usize,
}

/// A single lexing rule. [`Rule::len`] returns the length of the match at the start
/// of the input, 0 for no match.
#[derive(Debug, Clone, Copy)]
enum Rule {
    Whitespace,
    Number,
    Ident,
    Str,
    Char(char),
}

impl Rule {
    fn len(self, s: &str) -> usize {
        match self {
            Rule::Whitespace => match_whitespace(s),
            Rule::Number => match_number(s),
            Rule::Ident => match_ident(s),
            Rule::Str => match_string(s),
            Rule::Char(c) => match_char(s, c),
        }
    }
}

/// Ordered rule table. `None` marks input that is consumed without producing a token.
const RULES: &[(Rule, Option<TokenKind>)] = &[
    (Rule::Whitespace, None),
    (Rule::Number, Some(TokenKind::Number)),
    (Rule::Ident, Some(TokenKind::Ident)),
    (Rule::Str, Some(TokenKind::Str)),
    (Rule::Char('+'), Some(TokenKind::Plus)),
    (Rule::Char('-'), Some(TokenKind::Minus)),
    (Rule::Char('*'), Some(TokenKind::Star)),
    (Rule::Char('^'), Some(TokenKind::Caret)),
    (Rule::Char('/'), Some(TokenKind::Slash)),
    (Rule::Char('('), Some(TokenKind::LParen)),
    (Rule::Char(')'), Some(TokenKind::RParen)),
    (Rule::Char(','), Some(TokenKind::Comma)),
];

fn match_whitespace(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// `\d+(\.\d+)?`. A sign is never part of a number; unary minus is a grammar rule.
fn match_number(s: &str) -> usize {
    let bytes = s.as_bytes();
    let int_len = count_digits(bytes);
    if int_len == 0 {
        return 0;
    }
    if bytes.get(int_len) == Some(&b'.') {
        let frac_len = count_digits(&bytes[int_len + 1..]);
        if frac_len > 0 {
            return int_len + 1 + frac_len;
        }
    }
    int_len
}

fn match_ident(s: &str) -> usize {
    s.bytes().take_while(|b| b.is_ascii_alphabetic()).count()
}

/// `"[^"]+"`: a non-empty quoted run without embedded quotes.
fn match_string(s: &str) -> usize {
    let Some(rest) = s.strip_prefix('"') else {
        return 0;
    };
    match rest.find('"') {
        Some(end) if end > 0 => end + 2,
        _ => 0,
    }
}

fn match_char(s: &str, c: char) -> usize {
    if s.starts_with(c) {
        c.len_utf8()
    } else {
        0
    }
}

/// Lazy token stream over a source string.
///
/// The cursor only moves forward; once it reaches the end of the source (or a lexing
/// error has been reported) the stream is exhausted.
pub struct Lexer<'a> {
    source: &'a str,
    cursor: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, cursor: 0 }
    }

    /// Restarts the stream on a new source.
    pub fn read(&mut self, source: &'a str) {
        self.source = source;
        self.cursor = 0;
    }

    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cursor >= self.source.len() {
                return None;
            }
            let rest = &self.source[self.cursor..];
            let start = self.cursor;

            let matched = RULES.iter().find_map(|(rule, kind)| {
                let len = rule.len(rest);
                (len > 0).then_some((len, *kind))
            });

            let Some((len, kind)) = matched else {
                // Park the cursor at the end so the stream stays exhausted.
                self.cursor = self.source.len();
                let character = rest.chars().next().unwrap_or_default();
                return Some(Err(Error::Lex {
                    character,
                    position: start,
                }));
            };

            self.cursor += len;
            if let Some(kind) = kind {
                return Some(Ok(Token {
                    lexeme: &rest[..len],
                    kind,
                    position: start,
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .map(|token| token.expect("token").kind)
            .collect()
    }

    #[test]
    fn lexes_operators_and_punctuation() {
        assert_eq!(
            kinds("+-*^/(),"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Caret,
                TokenKind::Slash,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn whitespace_produces_no_tokens() {
        assert!(kinds("   \t\n ").is_empty());
        let tokens: Vec<_> = Lexer::new("  10    ").map(|t| t.unwrap()).collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].lexeme, "10");
        assert_eq!(tokens[0].position, 2);
    }

    #[test]
    fn numbers_keep_fraction_and_never_take_a_sign() {
        let tokens: Vec<_> = Lexer::new("3.25 -2").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[0].lexeme, "3.25");
        assert_eq!(tokens[1].kind, TokenKind::Minus);
        assert_eq!(tokens[2].lexeme, "2");

        // Binary subtraction survives without spaces.
        assert_eq!(
            kinds("3-2"),
            vec![TokenKind::Number, TokenKind::Minus, TokenKind::Number]
        );
    }

    #[test]
    fn juxtaposed_number_and_identifier_split() {
        let tokens: Vec<_> = Lexer::new("2x").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].lexeme, "x");
    }

    #[test]
    fn quoted_expression_is_one_token() {
        let tokens: Vec<_> = Lexer::new("2 * \"t + 1\"").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[2].kind, TokenKind::Str);
        assert_eq!(tokens[2].lexeme, "\"t + 1\"");
    }

    #[test]
    fn rejects_unknown_character_and_stops() {
        let mut lexer = Lexer::new("1 + $");
        assert!(lexer.next().unwrap().is_ok());
        assert!(lexer.next().unwrap().is_ok());
        assert_eq!(
            lexer.next(),
            Some(Err(Error::Lex {
                character: '$',
                position: 4
            }))
        );
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn empty_quotes_are_not_a_string() {
        let mut lexer = Lexer::new("\"\"");
        assert!(matches!(
            lexer.next(),
            Some(Err(Error::Lex { character: '"', .. }))
        ));
    }

    #[test]
    fn trailing_dot_is_rejected() {
        let results: Vec<_> = Lexer::new("2.").collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Lex { character: '.', .. })));
    }

    #[test]
    fn read_resets_cursor() {
        let mut lexer = Lexer::new("a b");
        lexer.next();
        assert!(lexer.position() > 0);
        lexer.read("c");
        assert_eq!(lexer.position(), 0);
        assert_eq!(lexer.next().unwrap().unwrap().lexeme, "c");
    }
}
