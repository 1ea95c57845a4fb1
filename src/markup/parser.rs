//! Parser for the markup language
//!
//! Grammar, in rule-index order:
//!
//! ```text
//! document  : (heading | paragraph | NEWLINE)* EOF
//! heading   : HASHES inline* NEWLINE?
//! paragraph : line (NEWLINE line)* NEWLINE?
//! line      : inline+
//! emphasis  : STAR inline+ STAR
//! code      : TICK (TEXT | HASHES | STAR | LT)* TICK
//! text      : TEXT | LT | HASHES
//! ```
//!
//! A paragraph ends at a blank line, a heading or the end of input. Hidden
//! channel tokens never reach the parser.

use crate::pipeline::{Parsed, ParseTree, PipelineError, RuleNames, Token};

use super::lexer::TokenKind;

pub const RULE_DOCUMENT: usize = 0;
pub const RULE_HEADING: usize = 1;
pub const RULE_PARAGRAPH: usize = 2;
pub const RULE_LINE: usize = 3;
pub const RULE_EMPHASIS: usize = 4;
pub const RULE_CODE: usize = 5;
pub const RULE_TEXT: usize = 6;

/// Rule names indexed by the `RULE_*` constants
pub const RULE_NAMES: [&str; 7] = [
    "document",
    "heading",
    "paragraph",
    "line",
    "emphasis",
    "code",
    "text",
];

/// Recursive-descent parser over main-channel tokens
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser, dropping hidden-channel tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(Token::is_main).collect(),
            pos: 0,
        }
    }

    /// Parse a whole document
    pub fn parse_document(mut self) -> Result<Parsed<ParseTree>, PipelineError> {
        let mut children = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Eof => {
                    if let Some(eof) = self.advance() {
                        children.push(ParseTree::terminal(eof));
                    }
                    break;
                }
                TokenKind::Newline => children.push(self.terminal()?),
                TokenKind::Hashes => children.push(self.heading()?),
                _ => children.push(self.paragraph()?),
            }
        }

        Ok(Parsed::new(
            ParseTree::rule(RULE_DOCUMENT, children),
            RuleNames::new(RULE_NAMES),
        ))
    }

    fn heading(&mut self) -> Result<ParseTree, PipelineError> {
        let mut children = vec![self.expect(TokenKind::Hashes)?];
        while !matches!(self.kind(), TokenKind::Newline | TokenKind::Eof) {
            children.push(self.inline()?);
        }
        if self.kind() == TokenKind::Newline {
            children.push(self.terminal()?);
        }
        Ok(ParseTree::rule(RULE_HEADING, children))
    }

    fn paragraph(&mut self) -> Result<ParseTree, PipelineError> {
        let mut children = vec![self.line()?];
        while self.kind() == TokenKind::Newline && self.continues_paragraph() {
            children.push(self.terminal()?);
            children.push(self.line()?);
        }
        if self.kind() == TokenKind::Newline {
            children.push(self.terminal()?);
        }
        Ok(ParseTree::rule(RULE_PARAGRAPH, children))
    }

    /// Whether the token after the current newline starts another line of
    /// the same paragraph
    fn continues_paragraph(&self) -> bool {
        !matches!(
            self.kind_at(self.pos + 1),
            TokenKind::Newline | TokenKind::Eof | TokenKind::Hashes
        )
    }

    fn line(&mut self) -> Result<ParseTree, PipelineError> {
        let mut children = vec![self.inline()?];
        while !matches!(self.kind(), TokenKind::Newline | TokenKind::Eof) {
            children.push(self.inline()?);
        }
        Ok(ParseTree::rule(RULE_LINE, children))
    }

    fn inline(&mut self) -> Result<ParseTree, PipelineError> {
        match self.kind() {
            TokenKind::Star => self.emphasis(),
            TokenKind::Tick => self.code(),
            TokenKind::Text | TokenKind::Lt | TokenKind::Hashes => {
                Ok(ParseTree::rule(RULE_TEXT, vec![self.terminal()?]))
            }
            _ => Err(self.error("expected inline content")),
        }
    }

    fn emphasis(&mut self) -> Result<ParseTree, PipelineError> {
        let open = self.expect(TokenKind::Star)?;
        if self.kind() == TokenKind::Star {
            return Err(self.error("empty emphasis"));
        }

        let mut children = vec![open];
        loop {
            match self.kind() {
                TokenKind::Star => break,
                TokenKind::Newline | TokenKind::Eof => {
                    return Err(self.error("unterminated emphasis"));
                }
                _ => children.push(self.inline()?),
            }
        }
        children.push(self.expect(TokenKind::Star)?);
        Ok(ParseTree::rule(RULE_EMPHASIS, children))
    }

    fn code(&mut self) -> Result<ParseTree, PipelineError> {
        let mut children = vec![self.expect(TokenKind::Tick)?];
        loop {
            match self.kind() {
                TokenKind::Tick => break,
                TokenKind::Newline | TokenKind::Eof => {
                    return Err(self.error("unterminated code span"));
                }
                _ => children.push(self.terminal()?),
            }
        }
        children.push(self.expect(TokenKind::Tick)?);
        Ok(ParseTree::rule(RULE_CODE, children))
    }

    fn kind(&self) -> TokenKind {
        self.kind_at(self.pos)
    }

    fn kind_at(&self, index: usize) -> TokenKind {
        self.tokens
            .get(index)
            .and_then(|t| TokenKind::from_name(&t.kind))
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn terminal(&mut self) -> Result<ParseTree, PipelineError> {
        self.advance()
            .map(ParseTree::terminal)
            .ok_or_else(|| self.error("unexpected end of input"))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<ParseTree, PipelineError> {
        if self.kind() != kind {
            return Err(self.error(format!("expected {}", kind.name())));
        }
        self.terminal()
    }

    fn error(&self, message: impl Into<String>) -> PipelineError {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(token) => PipelineError::parse_at(token, message),
            None => PipelineError::Parse {
                line: 1,
                column: 0,
                message: message.into(),
            },
        }
    }
}
