//! Streaming markdown renderer for terminal output.
//!
//! Text arrives in arbitrary chunks (typically straight from a chat
//! completion stream) and is tokenized one character at a time, classified
//! with a single token of lookahead, and written to the terminal with syntax
//! colors for code, bracket depth colors and word-wrapped prose. Nothing is
//! buffered beyond the token in progress, so output appears as the text
//! arrives.
//!
//! # Example
//!
//! ```no_run
//! use ask_markdown_stream::MarkdownStream;
//! use std::io;
//!
//! fn main() -> io::Result<()> {
//!     let mut stream = MarkdownStream::new(io::stdout(), 80);
//!
//!     stream.append("Hello **wor")?;
//!     stream.append("ld**, see `main()`\n")?;
//!
//!     stream.finish()?;
//!     Ok(())
//! }
//! ```

mod classifier;
mod context;
mod renderer;
mod scanner;
mod sink;
mod theme;
mod token;
mod vocabulary;

use std::io::{self, Write};

pub use context::{ContextStack, ContextTag, Frame};
use derive_setters::Setters;
pub use renderer::Renderer;
pub use scanner::Tokenizer;
pub use sink::{CaptureSink, Emission, TokenSink};
pub use theme::{Style, Theme};
pub use token::{StyleFlags, TokenKind};
pub use vocabulary::{Vocabularies, Vocabulary};

/// Rendering options, fixed for the lifetime of a stream.
#[derive(Debug, Clone, Setters)]
pub struct StreamConfig {
    /// Terminal width in columns used for wrapping prose.
    pub width: usize,
    /// Whether markdown punctuation (ticks, asterisks) is shown dimmed or
    /// hidden.
    pub show_markdown: bool,
    /// Whether ANSI escape sequences are written.
    pub ansi: bool,
    pub theme: Theme,
    pub vocabulary: Vocabularies,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: 80,
            show_markdown: true,
            ansi: true,
            theme: Theme::default(),
            vocabulary: Vocabularies::default(),
        }
    }
}

/// Streaming markdown renderer writing to `W`.
pub struct MarkdownStream<W: Write> {
    tokenizer: Tokenizer<Renderer<W>>,
}

impl<W: Write> MarkdownStream<W> {
    /// Create a new stream with the given writer and terminal width.
    pub fn new(writer: W, width: usize) -> Self {
        Self::with_config(writer, StreamConfig::default().width(width))
    }

    pub fn with_config(writer: W, config: StreamConfig) -> Self {
        let renderer = Renderer::with_config(writer, &config);
        Self { tokenizer: Tokenizer::with_vocabulary(renderer, config.vocabulary) }
    }

    /// Feed the next chunk of text. Chunks may split tokens, words or
    /// multi-character markers anywhere.
    pub fn append(&mut self, chunk: &str) -> io::Result<()> {
        self.tokenizer.append(chunk)
    }

    /// Flush the token in progress, close open contexts and end the last
    /// line. Further calls and appends are ignored.
    pub fn finish(&mut self) -> io::Result<()> {
        self.tokenizer.finish()
    }

    pub fn is_finished(&self) -> bool {
        self.tokenizer.is_finished()
    }

    /// Returns the underlying writer.
    pub fn into_writer(self) -> W {
        self.tokenizer.into_sink().into_writer()
    }
}
