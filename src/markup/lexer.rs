//! Lexer for the markup language

use logos::Logos;

use crate::pipeline::{Channel, PipelineError, Position, Token};

/// Token types for markup sources
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    #[regex(r"#+")]
    Hashes,

    #[token("*")]
    Star,

    #[token("`")]
    Tick,

    #[token("<")]
    Lt,

    #[regex(r"\r?\n")]
    Newline,

    #[regex(r"[^#*`<\r\n]+")]
    Text,

    // Comments go to the hidden channel
    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    // End of file
    Eof,
}

impl TokenKind {
    /// Symbolic name used in token dumps
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Hashes => "HASHES",
            TokenKind::Star => "STAR",
            TokenKind::Tick => "TICK",
            TokenKind::Lt => "LT",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Text => "TEXT",
            TokenKind::Comment => "COMMENT",
            TokenKind::Eof => "EOF",
        }
    }

    /// Inverse of [`TokenKind::name`]
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "HASHES" => TokenKind::Hashes,
            "STAR" => TokenKind::Star,
            "TICK" => TokenKind::Tick,
            "LT" => TokenKind::Lt,
            "NEWLINE" => TokenKind::Newline,
            "TEXT" => TokenKind::Text,
            "COMMENT" => TokenKind::Comment,
            "EOF" => TokenKind::Eof,
            _ => return None,
        };
        Some(kind)
    }

    pub fn channel(self) -> Channel {
        match self {
            TokenKind::Comment => Channel::Hidden,
            _ => Channel::Main,
        }
    }
}

/// Text of the end-of-file token
pub const EOF_TEXT: &str = "<EOF>";

/// Tracks char offsets and line/column while walking the source
#[derive(Debug, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn new() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 0,
        }
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            self.offset += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
    }
}

/// Split a source into tokens, ending with an `EOF` token
pub fn tokenize(source: &str) -> Result<Vec<Token>, PipelineError> {
    let mut lexer = TokenKind::lexer(source);
    let mut cursor = Cursor::new();
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let kind = result.map_err(|()| PipelineError::Lex {
            line: cursor.line,
            column: cursor.column,
            message: format!("Unexpected character: {:?}", text),
        })?;

        let len = text.chars().count();
        let position = Position {
            start: cursor.offset,
            stop: (cursor.offset + len) as isize - 1,
            line: cursor.line,
            column: cursor.column,
        };
        tokens.push(Token::new(
            tokens.len(),
            kind.name(),
            text,
            kind.channel(),
            position,
        ));
        cursor.advance(text);
    }

    let eof = Position {
        start: cursor.offset,
        stop: cursor.offset as isize - 1,
        line: cursor.line,
        column: cursor.column,
    };
    tokens.push(Token::new(
        tokens.len(),
        TokenKind::Eof.name(),
        EOF_TEXT,
        Channel::Main,
        eof,
    ));

    Ok(tokens)
}
