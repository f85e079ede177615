//! Token kinds and style flags produced by the tokenizer.

use std::fmt;

/// Presentation kind of a completed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Prose text and whitespace.
    Body,
    /// Raw markdown punctuation such as ticks and asterisks.
    Markdown,
    Number,
    String,
    Identifier,
    Keyword,
    /// Literal value words like `true`, `false` or `None`.
    Literal,
    /// An identifier immediately followed by `(`.
    Call,
    Punctuation,
    Operator,
    Comment,
    Url,
    /// An opening or closing bracket at the given nesting depth.
    Bracket(usize),
}

impl TokenKind {
    /// Whether the token is a name whose role may change once the next token
    /// is known.
    pub fn is_name(self) -> bool {
        matches!(self, Self::Body | Self::Identifier)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => write!(f, "body"),
            Self::Markdown => write!(f, "md"),
            Self::Number => write!(f, "num"),
            Self::String => write!(f, "str"),
            Self::Identifier => write!(f, "ident"),
            Self::Keyword => write!(f, "kw"),
            Self::Literal => write!(f, "lit"),
            Self::Call => write!(f, "call"),
            Self::Punctuation => write!(f, "punct"),
            Self::Operator => write!(f, "op"),
            Self::Comment => write!(f, "comment"),
            Self::Url => write!(f, "url"),
            Self::Bracket(depth) => write!(f, "bracket{depth}"),
        }
    }
}

bitflags::bitflags! {
    /// Text attributes derived from the active emphasis contexts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StyleFlags: u8 {
        const BOLD = 0b0001;
        const DIM = 0b0010;
        const ITALIC = 0b0100;
        const UNDERLINE = 0b1000;
    }
}

impl fmt::Display for StyleFlags {
    /// Compact form used in captured token streams, e.g. `+bi`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "+")?;
        for (flag, letter) in [
            (Self::BOLD, 'b'),
            (Self::DIM, 'd'),
            (Self::ITALIC, 'i'),
            (Self::UNDERLINE, 'u'),
        ] {
            if self.contains(flag) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}
