//! A small Markdown-like pipeline
//!
//! Supports ATX headings (`#`), paragraphs, `*emphasis*`, `` `code` `` and
//! `<!-- comments -->` (kept on the hidden channel). It renders to HTML.
//!
//! This module provides:
//! - Lexer (tokenization)
//! - Parser (parse tree construction)
//! - Renderer (outline walk, then HTML walk)
//!
//! It doubles as the reference [`Pipeline`] implementation for wiring a
//! grammar into the harness.

pub mod lexer;
pub mod parser;
pub mod render;

pub use lexer::TokenKind;
pub use parser::{Parser, RULE_NAMES};

use crate::pipeline::{Parsed, ParseTree, Pipeline, PipelineError, Token};

/// Markup source → HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupPipeline;

impl Pipeline for MarkupPipeline {
    type Tree = ParseTree;

    fn tokenize(&self, source: &str) -> Result<Vec<Token>, PipelineError> {
        lexer::tokenize(source)
    }

    fn parse(&self, tokens: Vec<Token>) -> Result<Parsed<ParseTree>, PipelineError> {
        Parser::new(tokens).parse_document()
    }

    fn render(&self, tree: &ParseTree) -> Result<String, PipelineError> {
        render::render(tree)
    }
}
