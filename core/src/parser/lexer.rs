//! Lexer for the scenario DSL
//!
//! Converts raw script text into a flat token stream. Whitespace is only
//! used for line bookkeeping; `#` starts a comment running to end of line.
//! Unknown characters are rejected rather than skipped.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/* ===================== Tokens ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Domain,
    State,
    Response,
    Transition,
    End,
    /// `->`
    Arrow,
    /// `:`
    Colon,
    String,
    Id,
    /// Always the final token of a stream
    Eof,
}

impl TokenKind {
    /// Map a word to its reserved keyword kind, if any. Case-sensitive.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "domain" => Some(TokenKind::Domain),
            "state" => Some(TokenKind::State),
            "response" => Some(TokenKind::Response),
            "transition" => Some(TokenKind::Transition),
            "end" => Some(TokenKind::End),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Domain => "'domain'",
            TokenKind::State => "'state'",
            TokenKind::Response => "'response'",
            TokenKind::Transition => "'transition'",
            TokenKind::End => "'end'",
            TokenKind::Arrow => "'->'",
            TokenKind::Colon => "':'",
            TokenKind::String => "string literal",
            TokenKind::Id => "identifier",
            TokenKind::Eof => "end of file",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Keyword/identifier text, or the contents of a string literal
    /// without its delimiters
    pub value: String,
    /// 1-based line where the token starts
    pub line: usize,
}

/* ===================== Errors ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("line {line}: unexpected character {ch:?}")]
    UnexpectedChar { line: usize, ch: char },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::UnexpectedChar { line, .. } => *line,
            LexError::UnterminatedString { line } => *line,
        }
    }
}

/* ===================== Lexer ===================== */

/// Tokenize a whole script. The returned stream always ends with `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    lexer.scan_tokens()?;
    Ok(lexer.tokens)
}

struct Lexer {
    chars: Vec<char>,
    current: usize,
    line: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            current: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn scan_tokens(&mut self) -> Result<(), LexError> {
        while !self.is_at_end() {
            self.scan_token()?;
        }

        self.tokens.push(Token {
            kind: TokenKind::Eof,
            value: String::new(),
            line: self.line,
        });
        Ok(())
    }

    fn scan_token(&mut self) -> Result<(), LexError> {
        let ch = self.advance();

        match ch {
            '\n' => self.line += 1,
            c if c.is_whitespace() => {}

            '#' => {
                while self.peek() != Some('\n') && !self.is_at_end() {
                    self.advance();
                }
            }

            ':' => self.push(TokenKind::Colon, ":"),

            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    self.push(TokenKind::Arrow, "->");
                } else {
                    return Err(LexError::UnexpectedChar {
                        line: self.line,
                        ch,
                    });
                }
            }

            '"' | '\'' => self.string(ch)?,

            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),

            _ => {
                return Err(LexError::UnexpectedChar {
                    line: self.line,
                    ch,
                })
            }
        }

        Ok(())
    }

    /// Scan a string literal opened by `delimiter`. No escapes: the literal
    /// ends at the next occurrence of the same delimiter.
    fn string(&mut self, delimiter: char) -> Result<(), LexError> {
        let start_line = self.line;
        let start = self.current;

        while self.peek() != Some(delimiter) && !self.is_at_end() {
            if self.peek() == Some('\n') {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(LexError::UnterminatedString { line: start_line });
        }

        let value: String = self.chars[start..self.current].iter().collect();
        self.advance(); // closing quote

        self.tokens.push(Token {
            kind: TokenKind::String,
            value,
            line: start_line,
        });
        Ok(())
    }

    fn identifier(&mut self) {
        let start = self.current - 1;

        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text: String = self.chars[start..self.current].iter().collect();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Id);
        self.tokens.push(Token {
            kind,
            value: text,
            line: self.line,
        });
    }

    fn push(&mut self, kind: TokenKind, value: &str) {
        self.tokens.push(Token {
            kind,
            value: value.to_string(),
            line: self.line,
        });
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.current];
        self.current += 1;
        ch
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_transition_line() {
        let tokens = tokenize(r#"transition refund "I want a refund" -> done"#).unwrap();
        let got: Vec<(TokenKind, &str)> =
            tokens.iter().map(|t| (t.kind, t.value.as_str())).collect();
        assert_eq!(
            got,
            vec![
                (TokenKind::Transition, "transition"),
                (TokenKind::Id, "refund"),
                (TokenKind::String, "I want a refund"),
                (TokenKind::Arrow, "->"),
                (TokenKind::Id, "done"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_keywords_are_reserved_and_case_sensitive() {
        assert_eq!(
            kinds("domain state response transition end State END"),
            vec![
                TokenKind::Domain,
                TokenKind::State,
                TokenKind::Response,
                TokenKind::Transition,
                TokenKind::End,
                TokenKind::Id,
                TokenKind::Id,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = tokenize("ending states _end2").unwrap();
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Id));
        assert_eq!(tokens[2].value, "_end2");
    }

    #[test]
    fn test_comments_and_line_numbers() {
        let source = "# header comment\ndomain \"Shop\" # trailing\n\nstate start:";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Domain);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[2].kind, TokenKind::State);
        assert_eq!(tokens[2].line, 4);
        assert_eq!(tokens.last().unwrap().line, 4);
    }

    #[test]
    fn test_single_and_double_quotes() {
        let tokens = tokenize(r#"'say "hi"' "it's""#).unwrap();
        assert_eq!(tokens[0].value, r#"say "hi""#);
        assert_eq!(tokens[1].value, "it's");
    }

    #[test]
    fn test_hash_inside_string_is_not_a_comment() {
        let tokens = tokenize(r#"response "order #42""#).unwrap();
        assert_eq!(tokens[1].value, "order #42");
    }

    #[test]
    fn test_multiline_string_keeps_counting_lines() {
        let tokens = tokenize("\"first\nsecond\"\nstate").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_non_ascii_string_contents() {
        let tokens = tokenize("response \"您好，请问有什么可以帮您？\"").unwrap();
        assert_eq!(tokens[1].value, "您好，请问有什么可以帮您？");
    }

    #[test]
    fn test_unknown_character_is_rejected() {
        let err = tokenize("domain \"x\"\nstate a:\n  response \"y\" ;").unwrap_err();
        assert_eq!(err, LexError::UnexpectedChar { line: 3, ch: ';' });
    }

    #[test]
    fn test_lone_dash_is_rejected() {
        let err = tokenize("transition a \"b\" - c").unwrap_err();
        assert_eq!(err, LexError::UnexpectedChar { line: 1, ch: '-' });
    }

    #[test]
    fn test_digit_cannot_start_identifier() {
        let err = tokenize("state 1st:").unwrap_err();
        assert_eq!(err, LexError::UnexpectedChar { line: 1, ch: '1' });
    }

    #[test]
    fn test_unterminated_string_reports_opening_line() {
        let err = tokenize("domain \"never closed\n\n").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { line: 1 });
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }
}
