//! Parser for PIP matrix files and `key = value` configuration files
//!
//! Matrix files look like:
//!
//! ```text
//! # 0 <= i <= N
//! 2 4
//! 1  1 0 0
//! 1 -1 1 0
//! ```
//!
//! A header `rows cols` is followed by `rows * cols` integers. Line breaks
//! between entries are not significant. Several matrices may follow each
//! other in one file (the constraints file holds the domain, then the
//! context).

use crate::error::{ExploreError, ExploreResult};
use crate::lexer::{Lexer, Token};
use crate::matrix::IntMatrix;

/// One `key = value...` line of a configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub values: Vec<String>,
    pub line: usize,
}

/// Parser over the shared token stream
pub struct Parser<'source> {
    lexer: Lexer<'source>,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Next token, or an error when the input is exhausted
    fn advance(&mut self, what: &str) -> ExploreResult<Token> {
        match self.lexer.next() {
            Some(tok) => tok,
            None => Err(ExploreError::parse_error(format!(
                "Unexpected end of input, expected {}",
                what
            ))),
        }
    }

    /// Next integer, skipping line breaks
    fn expect_integer(&mut self, what: &str) -> ExploreResult<i64> {
        self.lexer.skip_newlines();
        match self.advance(what)? {
            Token::Integer(n) => Ok(n),
            other => Err(ExploreError::parse_error(format!(
                "Expected {} at line {}, got '{}'",
                what,
                self.lexer.line(),
                other
            ))),
        }
    }

    /// True once only line breaks (or nothing) remain
    pub fn at_end(&mut self) -> bool {
        self.lexer.skip_newlines();
        self.lexer.peek().is_none()
    }

    /// Parse one matrix: header then entries
    pub fn parse_matrix(&mut self) -> ExploreResult<IntMatrix> {
        let rows = self.expect_integer("row count")?;
        let cols = self.expect_integer("column count")?;
        if rows < 0 || cols < 0 {
            return Err(ExploreError::parse_error(format!(
                "Matrix dimensions must be non-negative, got {}x{}",
                rows, cols
            )));
        }
        let (rows, cols) = (rows as usize, cols as usize);

        let mut data = Vec::with_capacity(rows);
        for r in 0..rows {
            let mut row = Vec::with_capacity(cols);
            for c in 0..cols {
                row.push(self.expect_integer(&format!("entry ({}, {})", r, c))?);
            }
            data.push(row);
        }
        IntMatrix::from_rows_with_cols(data, cols)
    }

    /// Parse every `key = value...` line until the end of input
    pub fn parse_entries(&mut self) -> ExploreResult<Vec<ConfigEntry>> {
        let mut entries = Vec::new();

        while !self.at_end() {
            let line = self.lexer.line();
            let key = match self.advance("configuration key")? {
                Token::Word(w) => w,
                other => {
                    return Err(ExploreError::parse_error(format!(
                        "Expected configuration key at line {}, got '{}'",
                        line, other
                    )))
                }
            };
            match self.advance("'='")? {
                Token::Equals => {}
                other => {
                    return Err(ExploreError::parse_error(format!(
                        "Expected '=' after '{}' at line {}, got '{}'",
                        key, line, other
                    )))
                }
            }

            let mut values = Vec::new();
            while let Some(tok) = self.lexer.next() {
                match tok? {
                    Token::Newline => break,
                    Token::Equals => {
                        return Err(ExploreError::parse_error(format!(
                            "Unexpected '=' in value of '{}' at line {}",
                            key, line
                        )))
                    }
                    value => values.push(value.to_string()),
                }
            }
            entries.push(ConfigEntry { key, values, line });
        }

        Ok(entries)
    }
}

/// Parse exactly `count` matrices from a source string
pub fn parse_matrices(source: &str, count: usize) -> ExploreResult<Vec<IntMatrix>> {
    let mut parser = Parser::new(source);
    let mut matrices = Vec::with_capacity(count);
    for _ in 0..count {
        matrices.push(parser.parse_matrix()?);
    }
    if !parser.at_end() {
        return Err(ExploreError::parse_error(format!(
            "Trailing input after {} matrices",
            count
        )));
    }
    Ok(matrices)
}
