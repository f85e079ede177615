use std::io::{self, Write};

use ask_markdown_stream::{MarkdownStream, StreamConfig};

pub fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Renders an answer as it streams in and keeps its raw text for the
/// history.
pub struct ResponseWriter<W: Write> {
    stream: MarkdownStream<W>,
    text: String,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(writer: W, config: StreamConfig) -> Self {
        Self { stream: MarkdownStream::with_config(writer, config), text: String::new() }
    }

    pub fn write(&mut self, chunk: &str) -> io::Result<()> {
        self.text.push_str(chunk);
        self.stream.append(chunk)
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.stream.finish()
    }

    /// Returns the raw text and the underlying writer.
    pub fn into_parts(self) -> (String, W) {
        (self.text, self.stream.into_writer())
    }
}
