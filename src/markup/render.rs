//! HTML rendering for markup trees
//!
//! Rendering runs in two walks over the tree: the first collects the
//! document outline and assigns a unique anchor to every heading, the second
//! emits HTML using those anchors.

use std::collections::HashMap;

use crate::pipeline::{ParseTree, PipelineError};

use super::lexer::TokenKind;
use super::parser::{
    RULE_CODE, RULE_DOCUMENT, RULE_EMPHASIS, RULE_HEADING, RULE_LINE, RULE_PARAGRAPH, RULE_TEXT,
};

/// A heading found by the outline walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    pub anchor: String,
}

/// Render a document tree to HTML
pub fn render(tree: &ParseTree) -> Result<String, PipelineError> {
    if tree.rule_index() != Some(RULE_DOCUMENT) {
        return Err(PipelineError::Render("expected a document node".to_string()));
    }
    let outline = outline(tree)?;
    Emitter::new(&outline).document(tree)
}

/// First walk: collect headings in document order
pub fn outline(document: &ParseTree) -> Result<Vec<Heading>, PipelineError> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headings = Vec::new();

    for block in children(document) {
        if block.rule_index() != Some(RULE_HEADING) {
            continue;
        }
        let level = heading_level(block)?;
        let title = plain_text(block).trim().to_string();

        let base = slugify(&title);
        let count = seen.entry(base.clone()).or_insert(0);
        let anchor = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;

        headings.push(Heading {
            level,
            title,
            anchor,
        });
    }

    Ok(headings)
}

/// Second walk: HTML output
struct Emitter<'a> {
    outline: &'a [Heading],
    next_heading: usize,
    output: String,
}

impl<'a> Emitter<'a> {
    fn new(outline: &'a [Heading]) -> Self {
        Self {
            outline,
            next_heading: 0,
            output: String::new(),
        }
    }

    fn document(mut self, document: &ParseTree) -> Result<String, PipelineError> {
        for block in children(document) {
            match block {
                ParseTree::Terminal(_) => {}
                ParseTree::Rule { rule, .. } if *rule == RULE_HEADING => self.heading(block)?,
                ParseTree::Rule { rule, .. } if *rule == RULE_PARAGRAPH => {
                    self.paragraph(block)?
                }
                ParseTree::Rule { rule, .. } => {
                    return Err(PipelineError::Render(format!(
                        "unexpected block rule {}",
                        rule
                    )))
                }
            }
        }
        Ok(self.output)
    }

    fn heading(&mut self, heading: &ParseTree) -> Result<(), PipelineError> {
        let outline = self.outline;
        let Some(entry) = outline.get(self.next_heading) else {
            return Err(PipelineError::Render("heading missing from outline".to_string()));
        };
        self.next_heading += 1;

        let mut content = String::new();
        for child in children(heading).iter().filter(|c| c.rule_index().is_some()) {
            content.push_str(&inline_html(child)?);
        }
        self.output.push_str(&format!(
            "<h{level} id=\"{anchor}\">{content}</h{level}>\n",
            level = entry.level,
            anchor = entry.anchor,
            content = content.trim()
        ));
        Ok(())
    }

    fn paragraph(&mut self, paragraph: &ParseTree) -> Result<(), PipelineError> {
        let mut lines = Vec::new();
        for line in children(paragraph)
            .iter()
            .filter(|c| c.rule_index() == Some(RULE_LINE))
        {
            let mut html = String::new();
            for inline in children(line) {
                html.push_str(&inline_html(inline)?);
            }
            lines.push(html.trim().to_string());
        }
        self.output.push_str(&format!("<p>{}</p>\n", lines.join("\n")));
        Ok(())
    }
}

fn inline_html(node: &ParseTree) -> Result<String, PipelineError> {
    match node.rule_index() {
        Some(RULE_TEXT) => Ok(escape_html(&node.text())),
        Some(RULE_EMPHASIS) => {
            let mut inner = String::new();
            for child in children(node).iter().filter(|c| c.rule_index().is_some()) {
                inner.push_str(&inline_html(child)?);
            }
            Ok(format!("<em>{}</em>", inner))
        }
        Some(RULE_CODE) => {
            let nodes = children(node);
            let inner: String = nodes
                .get(1..nodes.len().saturating_sub(1))
                .unwrap_or_default()
                .iter()
                .map(ParseTree::text)
                .collect();
            Ok(format!("<code>{}</code>", escape_html(&inner)))
        }
        _ => Err(PipelineError::Render(format!(
            "unexpected inline node {:?}",
            node.rule_index()
        ))),
    }
}

fn children(node: &ParseTree) -> &[ParseTree] {
    match node {
        ParseTree::Rule { children, .. } => children,
        ParseTree::Terminal(_) => &[],
    }
}

fn heading_level(heading: &ParseTree) -> Result<usize, PipelineError> {
    let marker = children(heading)
        .first()
        .and_then(ParseTree::token)
        .filter(|t| TokenKind::from_name(&t.kind) == Some(TokenKind::Hashes))
        .ok_or_else(|| PipelineError::Render("heading without marker".to_string()))?;
    Ok(marker.text.chars().count().min(6))
}

/// Text of a heading without its marker and line break
fn plain_text(heading: &ParseTree) -> String {
    children(heading)
        .iter()
        .filter(|c| c.rule_index().is_some())
        .map(|c| {
            let text = c.text();
            if c.rule_index() == Some(RULE_EMPHASIS) {
                text.trim_matches('*').to_string()
            } else if c.rule_index() == Some(RULE_CODE) {
                text.trim_matches('`').to_string()
            } else {
                text
            }
        })
        .collect()
}

/// Lowercase anchor made of ASCII alphanumerics separated by single dashes
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
