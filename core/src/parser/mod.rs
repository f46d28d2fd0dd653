//! Parser for the scenario DSL
//!
//! Recursive descent with one token of lookahead over the stream produced by
//! [`lexer::tokenize`]. The output is a [`ScriptDef`]: structurally valid, but
//! not yet checked for duplicate states or dangling transition targets. Those
//! checks need the complete state table and live in [`semantic_validator`].
//!
//! ```text
//! script         := 'domain' STRING state+
//! state          := 'state' ID ':' stateBody
//! stateBody      := (responseStmt | transitionStmt | 'end')*
//! responseStmt   := 'response' STRING
//! transitionStmt := 'transition' ID STRING '->' ID
//! ```

use thiserror::Error;

use crate::executor::types::ast::{ScriptDef, State, Transition};

pub mod lexer;
pub mod semantic_validator;

pub use lexer::{tokenize, LexError, Token, TokenKind};


/* ===================== Error Types ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    Unexpected {
        line: usize,
        expected: TokenKind,
        found: TokenKind,
    },

    #[error("line {line}: unexpected {found} in state '{state}' (expected 'response', 'transition', 'end' or the next 'state')")]
    UnexpectedInState {
        line: usize,
        state: String,
        found: TokenKind,
    },

    #[error("line {line}: script declares no states")]
    NoStates { line: usize },

    #[error("line {line}: state '{state}' has no response")]
    MissingResponse { line: usize, state: String },

    #[error("line {line}: state '{state}' has an empty response")]
    EmptyResponse { line: usize, state: String },

    #[error("line {line}: state '{state}' declares more than one response")]
    DuplicateResponse { line: usize, state: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Unexpected { line, .. }
            | ParseError::UnexpectedInState { line, .. }
            | ParseError::NoStates { line }
            | ParseError::MissingResponse { line, .. }
            | ParseError::EmptyResponse { line, .. }
            | ParseError::DuplicateResponse { line, .. } => *line,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Public API ===================== */

/// Parse a token stream into a script definition.
///
/// The stream must end with an `Eof` token, as produced by [`tokenize`].
pub fn parse(tokens: Vec<Token>) -> ParseResult<ScriptDef> {
    let mut parser = Parser::new(tokens);
    parser.script()
}

/* ===================== Parser ===================== */

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token {
                kind: TokenKind::Eof,
                value: String::new(),
                line,
            });
        }
        Self { tokens, current: 0 }
    }

    fn script(&mut self) -> ParseResult<ScriptDef> {
        let domain_kw = self.consume(TokenKind::Domain)?;
        let domain = self.consume(TokenKind::String)?.value;

        if self.check(TokenKind::Eof) {
            return Err(ParseError::NoStates {
                line: domain_kw.line,
            });
        }

        let mut states = Vec::new();
        while !self.check(TokenKind::Eof) {
            states.push(self.state()?);
        }

        Ok(ScriptDef {
            domain,
            states,
            line: domain_kw.line,
        })
    }

    fn state(&mut self) -> ParseResult<State> {
        let state_kw = self.consume(TokenKind::State)?;
        let name = self.consume(TokenKind::Id)?.value;
        self.consume(TokenKind::Colon)?;

        let mut response: Option<String> = None;
        let mut transitions = Vec::new();
        let mut is_end = false;

        // The body runs until the next `state` keyword or end of input
        loop {
            let (kind, line) = {
                let token = self.peek();
                (token.kind, token.line)
            };
            match kind {
                TokenKind::State | TokenKind::Eof => break,

                TokenKind::Response => {
                    let kw = self.advance();
                    let text = self.consume(TokenKind::String)?.value;
                    if response.is_some() {
                        return Err(ParseError::DuplicateResponse {
                            line: kw.line,
                            state: name,
                        });
                    }
                    if text.trim().is_empty() {
                        return Err(ParseError::EmptyResponse {
                            line: kw.line,
                            state: name,
                        });
                    }
                    response = Some(text);
                }

                TokenKind::Transition => transitions.push(self.transition()?),

                TokenKind::End => {
                    self.advance();
                    is_end = true;
                }

                found => {
                    return Err(ParseError::UnexpectedInState {
                        line,
                        state: name,
                        found,
                    })
                }
            }
        }

        let Some(response) = response else {
            return Err(ParseError::MissingResponse {
                line: state_kw.line,
                state: name,
            });
        };

        Ok(State {
            name,
            response,
            transitions,
            is_end,
            line: state_kw.line,
        })
    }

    fn transition(&mut self) -> ParseResult<Transition> {
        let kw = self.consume(TokenKind::Transition)?;
        let intent = self.consume(TokenKind::Id)?.value;
        let description = self.consume(TokenKind::String)?.value;
        self.consume(TokenKind::Arrow)?;
        let target = self.consume(TokenKind::Id)?.value;

        Ok(Transition {
            intent,
            description,
            target,
            line: kw.line,
        })
    }

    /* ===================== Token Helpers ===================== */

    fn consume(&mut self, expected: TokenKind) -> ParseResult<Token> {
        let token = self.peek();
        if token.kind == expected {
            Ok(self.advance())
        } else {
            Err(ParseError::Unexpected {
                line: token.line,
                expected,
                found: token.kind,
            })
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Never moves past the trailing `Eof`.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }
}
