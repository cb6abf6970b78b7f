//! Schema tokenizer.
//!
//! Produces a positioned token stream from ASN.1 source text.
//! Whitespace and `--` comments (running to end of line) are skipped
//! between tokens. All structural tokens are ASCII; keywords are not
//! reserved here and surface as plain identifiers for the parser to
//! interpret in context.

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or contextual keyword: a letter followed by letters
    /// and digits.
    Ident,
    /// Decimal number, possibly negative.
    Number,
    /// Double-quoted string literal.
    Text,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    /// `..`
    DotDot,
    /// `::=`
    Assign,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The lexeme; for `Text` tokens the surrounding quotes are
    /// stripped.
    pub text: String,
    pub line: u32,
    pub column: u32,
}

pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input. The stream always ends with an `Eof`
    /// token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    /// Skip whitespace and `--` comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'-') if self.peek_at(1) == Some(b'-') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn token(&self, kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Token {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();

        let (line, column) = (self.line, self.column);
        let Some(b) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, "", line, column));
        };

        let punctuation = match b {
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b'[' => Some(TokenKind::LBracket),
            b']' => Some(TokenKind::RBracket),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = punctuation {
            self.advance();
            return Ok(self.token(kind, (b as char).to_string(), line, column));
        }

        if b == b'.' {
            if self.peek_at(1) == Some(b'.') {
                self.advance();
                self.advance();
                return Ok(self.token(TokenKind::DotDot, "..", line, column));
            }
            return Err(ParseError::new(line, column, "expected '..'"));
        }

        if b == b':' {
            if self.peek_at(1) == Some(b':') && self.peek_at(2) == Some(b'=') {
                self.advance();
                self.advance();
                self.advance();
                return Ok(self.token(TokenKind::Assign, "::=", line, column));
            }
            return Err(ParseError::new(line, column, "expected '::='"));
        }

        if b == b'-' {
            // Comments were consumed by skip_trivia, so a dash here
            // must start a negative number.
            if self.peek_at(1).is_some_and(|next| next.is_ascii_digit()) {
                return Ok(self.scan_number(line, column));
            }
            return Err(ParseError::new(line, column, "unexpected character '-'"));
        }

        if b.is_ascii_digit() {
            return Ok(self.scan_number(line, column));
        }

        if b == b'"' {
            return self.scan_text(line, column);
        }

        if b.is_ascii_alphabetic() {
            return Ok(self.scan_ident(line, column));
        }

        Err(ParseError::new(
            line,
            column,
            format!("unexpected character 0x{:02x}", b),
        ))
    }

    fn scan_number(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.advance();
        }
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        self.token(TokenKind::Number, text, line, column)
    }

    fn scan_ident(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric()) {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        self.token(TokenKind::Ident, text, line, column)
    }

    fn scan_text(&mut self, line: u32, column: u32) -> Result<Token, ParseError> {
        self.advance(); // opening quote
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::new(line, column, "unterminated string literal"))
                }
                Some(b'"') => {
                    let text =
                        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
                    self.advance(); // closing quote
                    return Ok(self.token(TokenKind::Text, text, line, column));
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Lexer, Token, TokenKind};

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(vec![TokenKind::Eof], kinds(""));
        assert_eq!(vec![TokenKind::Eof], kinds("   \t\n  "));
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::DotDot,
                TokenKind::Assign,
                TokenKind::Eof,
            ],
            kinds("{ } [ ] ( ) , .. ::=")
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(vec!["0", "42", "-1", "-128"], texts("0 42 -1 -128"));
        assert_eq!(
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Eof
            ],
            kinds("0 42 -1 -128")
        );
    }

    #[test]
    fn test_identifiers_and_keywords_are_plain_idents() {
        assert_eq!(
            vec!["PingRequest", "DEFINITIONS", "messageId", "Long2"],
            texts("PingRequest DEFINITIONS messageId Long2")
        );
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        assert_eq!(
            vec!["INTEGER", "BOOLEAN"],
            texts("INTEGER -- a comment ::= { } \nBOOLEAN")
        );
    }

    #[test]
    fn test_string_literal_strips_quotes() {
        let tokens = Lexer::new(r#""hello there""#).tokenize().unwrap();
        assert_eq!(
            Token {
                kind: TokenKind::Text,
                text: "hello there".to_string(),
                line: 1,
                column: 1,
            },
            tokens[0]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("Msg ::=\n  INTEGER").tokenize().unwrap();
        assert_eq!((1, 1), (tokens[0].line, tokens[0].column));
        assert_eq!((1, 5), (tokens[1].line, tokens[1].column));
        assert_eq!((2, 3), (tokens[2].line, tokens[2].column));
    }

    #[rstest(source, line, column,
        case("INTEGER \u{1}", 1, 9),
        case("a\nb\n  :", 3, 3),
        case("x .y", 1, 3),
        case("- 1", 1, 1),
    )]
    fn test_unexpected_character_positions(source: &str, line: u32, column: u32) {
        let err = Lexer::new(source).tokenize().unwrap_err();
        assert_eq!((line, column), (err.line, err.column));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new(r#"DEFAULT "oops"#).tokenize().unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(9, err.column);
    }
}
