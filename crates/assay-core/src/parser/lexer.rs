//! Tokenizer for Java source text
//!
//! Whitespace and comments are skipped; every token keeps the byte span it
//! was read from so the parser can hand exact positions to the AST.

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Integer,
    Floating,
    Char,
    String,
    TextBlock,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }
}

/// Error raised for text that cannot be tokenized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

const PUNCTUATION: &[&str] = &[
    ">>>=", "<<=", ">>=", "...", "==", "!=", "<=", ">=", "&&", "||", "->", "::", "++", "--", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<",
];

const SINGLE_PUNCTUATION: &str = "(){}[];,.@=<>!~?:+-*/&|^%";

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            match c {
                b' ' | b'\t' | b'\r' | b'\n' | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'"' if self.source[self.pos..].starts_with("\"\"\"") => self.text_block()?,
                b'"' => self.quoted(b'"', TokenKind::String, "string literal")?,
                b'\'' => self.quoted(b'\'', TokenKind::Char, "character literal")?,
                b'0'..=b'9' => self.number(),
                b'.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
                _ if is_ident_start(self.current_char()) => self.identifier(),
                _ => self.punctuation()?,
            }
        }
        Ok(self.tokens)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn current_char(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            text: self.source[start..self.pos].to_string(),
            span: Span::new(start, self.pos),
        });
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        match self.source[self.pos + 2..].find("*/") {
            Some(end) => {
                self.pos += 2 + end + 2;
                Ok(())
            }
            None => Err(LexError {
                offset: start,
                message: "unterminated block comment".to_string(),
            }),
        }
    }

    fn text_block(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 3;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'"' if self.source[self.pos..].starts_with("\"\"\"") => {
                    self.pos += 3;
                    self.push(TokenKind::TextBlock, start);
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(LexError {
            offset: start,
            message: "unterminated text block".to_string(),
        })
    }

    fn quoted(&mut self, quote: u8, kind: TokenKind, what: &str) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' => break,
                c if c == quote => {
                    self.pos += 1;
                    self.push(kind, start);
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(LexError {
            offset: start,
            message: format!("unterminated {what}"),
        })
    }

    fn number(&mut self) {
        let start = self.pos;
        let hex = self.source[start..].starts_with("0x") || self.source[start..].starts_with("0X");
        let mut floating = false;
        while let Some(c) = self.peek(0) {
            let previous = if self.pos > start {
                self.bytes[self.pos - 1]
            } else {
                0
            };
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else if c == b'.' && !floating && self.peek(1).map_or(true, |n| !n.is_ascii_alphabetic()) {
                floating = true;
                self.pos += 1;
            } else if (c == b'+' || c == b'-') && !hex && matches!(previous, b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        if !hex {
            let lower = text.to_ascii_lowercase();
            floating = floating
                || lower.contains('e')
                || lower.ends_with('f')
                || lower.ends_with('d');
        }
        let kind = if floating {
            TokenKind::Floating
        } else {
            TokenKind::Integer
        };
        self.push(kind, start);
    }

    fn identifier(&mut self) {
        let start = self.pos;
        for c in self.source[start..].chars() {
            if is_ident_part(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        self.push(TokenKind::Ident, start);
    }

    fn punctuation(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let rest = &self.source[start..];
        if let Some(op) = PUNCTUATION.iter().find(|op| rest.starts_with(**op)) {
            self.pos += op.len();
            self.push(TokenKind::Punct, start);
            return Ok(());
        }
        let c = self.current_char();
        if SINGLE_PUNCTUATION.contains(c) {
            self.pos += c.len_utf8();
            self.push(TokenKind::Punct, start);
            return Ok(());
        }
        Err(LexError {
            offset: start,
            message: format!("unexpected character '{c}'"),
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_assert_statement_tokens() {
        let tokens = kinds("assert o == null : \"msg\";");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Ident, "assert".to_string()),
                (TokenKind::Ident, "o".to_string()),
                (TokenKind::Punct, "==".to_string()),
                (TokenKind::Ident, "null".to_string()),
                (TokenKind::Punct, ":".to_string()),
                (TokenKind::String, "\"msg\"".to_string()),
                (TokenKind::Punct, ";".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped_and_spans_kept() {
        let source = "a /* b */ // c\n d";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(&source[tokens[1].span.start..tokens[1].span.end], "d");
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 3.14 1e10 0xFF 10L 2f .5 1_000");
        let observed: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            observed,
            vec![
                TokenKind::Integer,
                TokenKind::Floating,
                TokenKind::Floating,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Floating,
                TokenKind::Floating,
                TokenKind::Integer,
            ]
        );
    }

    #[test]
    fn test_member_access_on_integer_literal_is_not_a_float() {
        let tokens = kinds("1.toString");
        assert_eq!(tokens[0], (TokenKind::Integer, "1".to_string()));
        assert_eq!(tokens[1], (TokenKind::Punct, ".".to_string()));
    }

    #[test]
    fn test_text_block() {
        let tokens = kinds("String s = \"\"\"\n  hello \"quoted\"\n  \"\"\";");
        assert_eq!(tokens[3].0, TokenKind::TextBlock);
        assert_eq!(tokens[4], (TokenKind::Punct, ";".to_string()));
    }

    #[test]
    fn test_generics_close_as_single_angles() {
        let tokens = kinds("List<List<String>> x");
        let angles = tokens.iter().filter(|(_, t)| t == ">").count();
        assert_eq!(angles, 2);
    }

    #[test]
    fn test_unterminated_literals() {
        let err = tokenize("x = \"abc").unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(err.message.contains("string literal"));
        assert!(tokenize("/* open").is_err());
        assert!(tokenize("'a").is_err());
    }
}
