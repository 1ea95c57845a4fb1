//! The pipeline capability driven by the harness
//!
//! A pipeline turns source text into tokens, tokens into a syntax tree, and
//! a syntax tree into rendered text. The harness only ever talks to a
//! pipeline through the [`Pipeline`] trait, so any grammar can be plugged in
//! without touching the harness.
//!
//! This module provides:
//! - The [`Pipeline`] trait
//! - Token records ([`Token`], [`Channel`], [`Position`])
//! - The [`SyntaxTree`] abstraction and a ready-made [`ParseTree`]
//! - Rule-name tables ([`RuleNames`]) returned alongside each tree

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::printer::escape_whitespace;

/// A text-to-text pipeline under test
pub trait Pipeline {
    /// The tree type produced by [`Pipeline::parse`]
    type Tree: SyntaxTree;

    /// Split source text into tokens, in source order
    fn tokenize(&self, source: &str) -> Result<Vec<Token>, PipelineError>;

    /// Build a syntax tree from a token stream.
    ///
    /// The rule-name table comes back with the tree and is dropped with it.
    fn parse(&self, tokens: Vec<Token>) -> Result<Parsed<Self::Tree>, PipelineError>;

    /// Run the rendering phases over a tree and return the final text
    fn render(&self, tree: &Self::Tree) -> Result<String, PipelineError>;
}

/// Errors raised by a pipeline while processing a fixture
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("lex error at {line}:{column}: {message}")]
    Lex {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("render error: {0}")]
    Render(String),
}

impl PipelineError {
    /// Create a parse error positioned at a token
    pub fn parse_at(token: &Token, message: impl Into<String>) -> Self {
        Self::Parse {
            line: token.position.line,
            column: token.position.column,
            message: message.into(),
        }
    }
}

/// Token channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    /// Tokens the parser consumes
    #[default]
    Main,
    /// Tokens kept for tooling but skipped by the parser (comments and the like)
    Hidden,
}

impl Channel {
    /// Numeric channel id as shown in token dumps
    pub fn id(self) -> u32 {
        match self {
            Channel::Main => 0,
            Channel::Hidden => 1,
        }
    }
}

/// Location of a token in its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Start char offset (0-indexed)
    pub start: usize,
    /// Stop char offset (0-indexed, inclusive; `start - 1` for empty tokens)
    pub stop: isize,
    /// Line (1-indexed)
    pub line: usize,
    /// Column in chars (0-indexed)
    pub column: usize,
}

/// A single token record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Position in the token stream
    pub index: usize,
    /// Symbolic token kind, e.g. `TEXT`
    pub kind: String,
    /// Matched text
    pub text: String,
    pub channel: Channel,
    pub position: Position,
}

impl Token {
    pub fn new(
        index: usize,
        kind: impl Into<String>,
        text: impl Into<String>,
        channel: Channel,
        position: Position,
    ) -> Self {
        Self {
            index,
            kind: kind.into(),
            text: text.into(),
            channel,
            position,
        }
    }

    /// Check if the parser should see this token
    pub fn is_main(&self) -> bool {
        self.channel == Channel::Main
    }
}

/// One line of a token dump:
/// `[@index,start:stop='text',<KIND>,channel=N,line:column]`
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel = match self.channel {
            Channel::Main => String::new(),
            other => format!(",channel={}", other.id()),
        };
        write!(
            f,
            "[@{},{}:{}='{}',<{}>{},{}:{}]",
            self.index,
            self.position.start,
            self.position.stop,
            escape_whitespace(&self.text, false),
            self.kind,
            channel,
            self.position.line,
            self.position.column
        )
    }
}

/// Lookup table from rule index to rule name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleNames {
    names: Vec<String>,
}

impl RuleNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Get the name of a rule, if known
    pub fn get(&self, rule: usize) -> Option<&str> {
        self.names.get(rule).map(String::as_str)
    }

    /// Name of a rule, falling back to `rule#N` for unknown indices
    pub fn name(&self, rule: usize) -> Cow<'_, str> {
        match self.get(rule) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("rule#{}", rule)),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A parsed tree together with the rule names needed to print it
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub tree: T,
    pub rule_names: RuleNames,
}

impl<T> Parsed<T> {
    pub fn new(tree: T, rule_names: RuleNames) -> Self {
        Self { tree, rule_names }
    }
}

/// An ordered n-ary tree that can be printed
///
/// Child order is source order. A node with no children is a leaf.
pub trait SyntaxTree: Sized {
    /// Children in source order
    fn children(&self) -> &[Self];

    /// Label of this node: a rule name for rule nodes, token text for leaves
    fn node_text<'a>(&'a self, rules: &'a RuleNames) -> Cow<'a, str>;

    fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

/// General-purpose parse tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    /// An application of a grammar rule
    Rule {
        rule: usize,
        children: Vec<ParseTree>,
    },
    /// A matched token
    Terminal(Token),
}

impl ParseTree {
    pub fn rule(rule: usize, children: Vec<ParseTree>) -> Self {
        Self::Rule { rule, children }
    }

    pub fn terminal(token: Token) -> Self {
        Self::Terminal(token)
    }

    /// Rule index, or `None` for terminals
    pub fn rule_index(&self) -> Option<usize> {
        match self {
            Self::Rule { rule, .. } => Some(*rule),
            Self::Terminal(_) => None,
        }
    }

    /// The token of a terminal node
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Terminal(token) => Some(token),
            Self::Rule { .. } => None,
        }
    }

    /// Concatenated text of every terminal below this node
    pub fn text(&self) -> String {
        match self {
            Self::Terminal(token) => token.text.clone(),
            Self::Rule { children, .. } => children.iter().map(ParseTree::text).collect(),
        }
    }
}

impl SyntaxTree for ParseTree {
    fn children(&self) -> &[Self] {
        match self {
            Self::Rule { children, .. } => children,
            Self::Terminal(_) => &[],
        }
    }

    fn node_text<'a>(&'a self, rules: &'a RuleNames) -> Cow<'a, str> {
        match self {
            Self::Rule { rule, .. } => rules.name(*rule),
            Self::Terminal(token) => Cow::Borrowed(&token.text),
        }
    }
}
