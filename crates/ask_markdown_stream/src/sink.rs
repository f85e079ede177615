//! Output side of the tokenizer.

use std::io;

use crate::context::ContextTag;
use crate::token::{StyleFlags, TokenKind};

/// Receives classified tokens and context transitions in stream order.
pub trait TokenSink {
    fn write(&mut self, text: &str, kind: TokenKind, style: StyleFlags) -> io::Result<()>;

    fn begin_context(&mut self, tag: ContextTag) -> io::Result<()>;

    fn end_context(&mut self) -> io::Result<()>;

    /// Called exactly once, after every context has been closed.
    fn finish(&mut self) -> io::Result<()>;
}

/// One captured write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub text: String,
    pub kind: TokenKind,
    pub style: StyleFlags,
}

/// Sink that records everything it receives, for golden-output tests and
/// tooling.
///
/// Adjacent writes with the same kind and style are merged, so the captured
/// stream does not depend on where the tokenizer split runs of equal text.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    pub emissions: Vec<Emission>,
    /// Contexts currently open, innermost last.
    pub open: Vec<ContextTag>,
    pub begun: usize,
    pub ended: usize,
    pub finished: usize,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenated text of every emission.
    pub fn text(&self) -> String {
        self.emissions.iter().map(|e| e.text.as_str()).collect()
    }

    /// Compact `kind+style:"text"` listing of the emissions.
    pub fn tagged(&self) -> String {
        self.emissions
            .iter()
            .map(|e| format!("{}{}:{:?}", e.kind, e.style, e.text))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TokenSink for CaptureSink {
    fn write(&mut self, text: &str, kind: TokenKind, style: StyleFlags) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        match self.emissions.last_mut() {
            Some(last) if last.kind == kind && last.style == style => last.text.push_str(text),
            _ => self
                .emissions
                .push(Emission { text: text.to_string(), kind, style }),
        }
        Ok(())
    }

    fn begin_context(&mut self, tag: ContextTag) -> io::Result<()> {
        self.open.push(tag);
        self.begun += 1;
        Ok(())
    }

    fn end_context(&mut self) -> io::Result<()> {
        self.open.pop();
        self.ended += 1;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished += 1;
        Ok(())
    }
}
