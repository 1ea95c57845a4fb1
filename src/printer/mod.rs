//! Canonical tree printer
//!
//! Produces a single, deterministic text representation of any
//! [`SyntaxTree`] so that tree shapes can be stored in baseline files and
//! compared line by line.
//!
//! Two modes are supported:
//! - compact: `(label child child ...)` on a single line
//! - pretty: one node per line, children indented one unit deeper than
//!   their parent

use std::borrow::Cow;

use crate::pipeline::{RuleNames, SyntaxTree};

/// Platform line separator used when joining printed lines
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Platform line separator used when joining printed lines
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Configuration for the tree printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintConfig {
    /// Pretty (indented) output instead of the compact form
    pub pretty: bool,
    /// Indentation string repeated once per nesting level (default: 2 spaces)
    pub indent: String,
    /// Line separator for pretty output
    pub line_ending: String,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
            line_ending: LINE_ENDING.to_string(),
        }
    }
}

/// Printer for syntax trees
#[derive(Debug, Clone, Default)]
pub struct TreePrinter {
    config: PrintConfig,
}

impl TreePrinter {
    /// Create a printer with default configuration
    pub fn new() -> Self {
        Self::with_config(PrintConfig::default())
    }

    /// Create a printer with custom configuration
    pub fn with_config(config: PrintConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &PrintConfig {
        &self.config
    }

    /// Print a tree in the configured mode
    pub fn print<T: SyntaxTree>(&self, tree: &T, rules: &RuleNames) -> String {
        if self.config.pretty {
            self.to_pretty_tree(tree, rules)
        } else {
            to_string_tree(tree, rules)
        }
    }

    /// Print a tree with one node per line.
    ///
    /// Leaves are their escaped text. A rule node is its escaped label
    /// followed by each child on its own line, indented one level deeper.
    /// The result has no blank lines, no trailing whitespace and no
    /// leading or trailing line break.
    pub fn to_pretty_tree<T: SyntaxTree>(&self, tree: &T, rules: &RuleNames) -> String {
        let raw = self.pretty_node(tree, rules, 0);
        normalize_lines(&raw, &self.config.line_ending)
    }

    fn pretty_node<T: SyntaxTree>(&self, node: &T, rules: &RuleNames, depth: usize) -> String {
        let mut out = escape_whitespace(&node.node_text(rules), true).into_owned();
        for child in node.children() {
            out.push('\n');
            out.push_str(&self.config.indent.repeat(depth + 1));
            out.push_str(&self.pretty_node(child, rules, depth + 1));
        }
        out
    }
}

/// Print a tree on a single line as nested parenthesized lists
pub fn to_string_tree<T: SyntaxTree>(tree: &T, rules: &RuleNames) -> String {
    let text = tree.node_text(rules);
    let label = escape_whitespace(&text, false);
    if tree.is_leaf() {
        return label.into_owned();
    }

    let mut out = String::from("(");
    out.push_str(&label);
    for child in tree.children() {
        out.push(' ');
        out.push_str(&to_string_tree(child, rules));
    }
    out.push(')');
    out
}

/// Replace whitespace with visible escapes.
///
/// `\n`, `\r` and `\t` always become two-character escapes. With
/// `escape_spaces`, a space becomes `·` and any other whitespace becomes
/// `\u{XXXX}`.
pub fn escape_whitespace(text: &str, escape_spaces: bool) -> Cow<'_, str> {
    if !text.chars().any(char::is_whitespace) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' ' if escape_spaces => out.push('\u{00B7}'),
            c if escape_spaces && c.is_whitespace() => {
                out.push_str(&format!("\\u{{{:04X}}}", c as u32));
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Trim trailing whitespace from every line, drop whitespace-only lines and
/// join what is left with `line_ending`.
pub fn normalize_lines(text: &str, line_ending: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(line_ending)
}
