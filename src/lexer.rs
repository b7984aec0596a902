//! Lexer for matrix and problem configuration files using logos
//!
//! Supports tokens like:
//! - Integers: 4, -1, 0
//! - Words: dimensions, N, box.pip, ../deps/matmul.dep
//! - Punctuation: =
//! - Line breaks (significant for `key = value` lines)
//!
//! `#` starts a comment that runs to the end of the line.

use logos::Logos;

use crate::error::{ExploreError, ExploreResult};

/// Token types shared by the matrix and configuration readers
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"[a-zA-Z_./][a-zA-Z0-9_./\-]*", |lex| lex.slice().to_string())]
    Word(String),

    #[token("=")]
    Equals,

    #[token("\n")]
    Newline,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Word(s) => write!(f, "{}", s),
            Token::Equals => write!(f, "="),
            Token::Newline => write!(f, "newline"),
        }
    }
}

/// Lexer wrapper that tracks line numbers and provides one token of lookahead
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<ExploreResult<Token>>>,
    line: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            peeked: None,
            line: 1,
        }
    }

    /// Line of the most recently produced token (1-based)
    pub fn line(&self) -> usize {
        self.line
    }

    fn lex_next(&mut self) -> Option<ExploreResult<Token>> {
        let token = self.inner.next()?;
        Some(match token {
            Ok(Token::Newline) => {
                self.line += 1;
                Ok(Token::Newline)
            }
            Ok(tok) => Ok(tok),
            Err(()) => Err(ExploreError::LexerError {
                line: self.line,
                message: format!("unexpected input '{}'", self.inner.slice()),
            }),
        })
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> Option<&ExploreResult<Token>> {
        if self.peeked.is_none() {
            let next = self.lex_next();
            self.peeked = Some(next);
        }
        self.peeked.as_ref().and_then(|p| p.as_ref())
    }

    /// Check if the next token is a line break
    pub fn check_newline(&mut self) -> bool {
        matches!(self.peek(), Some(Ok(Token::Newline)))
    }

    /// Skip any run of line breaks
    pub fn skip_newlines(&mut self) {
        while self.check_newline() {
            self.next();
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = ExploreResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(peeked) = self.peeked.take() {
            peeked
        } else {
            self.lex_next()
        }
    }
}
