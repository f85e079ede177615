//! One-token lookahead that promotes names followed by `(` to call targets.

use std::io;

use crate::sink::TokenSink;
use crate::token::{StyleFlags, TokenKind};

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    kind: TokenKind,
    style: StyleFlags,
}

/// Holds names (and the dots chaining them) until the following token shows
/// whether the last name is being called.
///
/// The buffer only ever contains name entries and `.` punctuation.
#[derive(Debug, Default)]
pub struct Classifier {
    pending: Vec<Pending>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a name token.
    pub fn defer<S: TokenSink>(
        &mut self,
        text: &str,
        kind: TokenKind,
        style: StyleFlags,
        sink: &mut S,
    ) -> io::Result<()> {
        debug_assert!(kind.is_name(), "only names can be deferred, got {kind}");
        if self.pending.last().is_some_and(|last| last.kind.is_name()) {
            self.flush(sink)?;
        }
        self.pending.push(Pending { text: text.to_string(), kind, style });
        Ok(())
    }

    /// Writes a token that is not deferred, resolving the buffer first.
    pub fn write<S: TokenSink>(
        &mut self,
        text: &str,
        kind: TokenKind,
        style: StyleFlags,
        sink: &mut S,
    ) -> io::Result<()> {
        if kind == TokenKind::Punctuation && text == "." && !self.pending.is_empty() {
            self.pending.push(Pending { text: text.to_string(), kind, style });
            return Ok(());
        }

        if matches!(kind, TokenKind::Bracket(_))
            && text == "("
            && let Some(last) = self.pending.last_mut()
            && last.kind.is_name()
        {
            last.kind = TokenKind::Call;
        }

        self.flush(sink)?;
        sink.write(text, kind, style)
    }

    pub fn flush<S: TokenSink>(&mut self, sink: &mut S) -> io::Result<()> {
        for pending in self.pending.drain(..) {
            sink.write(&pending.text, pending.kind, pending.style)?;
        }
        Ok(())
    }
}
