//! Terminal writer: styles tokens and word-wraps prose.

use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

use crate::StreamConfig;
use crate::context::ContextTag;
use crate::sink::TokenSink;
use crate::theme::Theme;
use crate::token::{StyleFlags, TokenKind};

/// Writes classified tokens to a terminal.
///
/// Code contexts are written verbatim. Prose is reflowed: the renderer keeps
/// the word being built (already painted) and the blanks before it, and only
/// decides where the word goes once a blank, a newline or the end of the
/// stream shows that the word is complete. Writes that are not separated by
/// whitespace join into one word, so `call()` or `word.` never wrap apart.
pub struct Renderer<W: Write> {
    writer: W,
    width: usize,
    show_markdown: bool,
    ansi: bool,
    theme: Theme,
    contexts: Vec<ContextTag>,
    // Line state
    column: usize,
    pending_spaces: usize,
    word: String,
    word_width: usize,
}

impl<W: Write> Renderer<W> {
    pub fn new(writer: W, width: usize) -> Self {
        Self::with_config(writer, &StreamConfig::default().width(width))
    }

    pub fn with_config(writer: W, config: &StreamConfig) -> Self {
        Self {
            writer,
            width: config.width,
            show_markdown: config.show_markdown,
            ansi: config.ansi,
            theme: config.theme.clone(),
            contexts: Vec::new(),
            column: 0,
            pending_spaces: 0,
            word: String::new(),
            word_width: 0,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn in_code(&self) -> bool {
        self.contexts.iter().any(|tag| tag.is_code())
    }

    fn paint(&self, text: &str, kind: TokenKind, style: StyleFlags) -> String {
        if self.ansi {
            self.theme.paint(text, kind, style)
        } else {
            text.to_string()
        }
    }

    fn write_verbatim(&mut self, text: &str, kind: TokenKind, style: StyleFlags) -> io::Result<()> {
        self.commit_word()?;
        self.write_spaces()?;

        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            self.write_segment(first, kind, style)?;
        }
        for line in lines {
            self.writer.write_all(b"\n")?;
            self.column = 0;
            self.write_segment(line, kind, style)?;
        }
        Ok(())
    }

    fn write_segment(&mut self, segment: &str, kind: TokenKind, style: StyleFlags) -> io::Result<()> {
        if segment.is_empty() {
            return Ok(());
        }
        let painted = self.paint(segment, kind, style);
        self.writer.write_all(painted.as_bytes())?;
        self.column += segment.width();
        Ok(())
    }

    fn reflow(&mut self, text: &str, kind: TokenKind, style: StyleFlags) -> io::Result<()> {
        let mut run = String::new();
        for ch in text.chars() {
            match ch {
                '\n' => {
                    self.extend_word(&mut run, kind, style);
                    self.commit_word()?;
                    self.writer.write_all(b"\n")?;
                    self.column = 0;
                    self.pending_spaces = 0;
                }
                '\r' => {}
                _ if ch.is_whitespace() => {
                    self.extend_word(&mut run, kind, style);
                    self.commit_word()?;
                    self.pending_spaces += 1;
                }
                _ => run.push(ch),
            }
        }
        self.extend_word(&mut run, kind, style);
        Ok(())
    }

    /// Moves a run of non-blank characters into the word buffer.
    fn extend_word(&mut self, run: &mut String, kind: TokenKind, style: StyleFlags) {
        if run.is_empty() {
            return;
        }
        let painted = self.paint(run, kind, style);
        self.word.push_str(&painted);
        self.word_width += run.width();
        run.clear();
    }

    /// Places the buffered word, breaking the line first when it would
    /// overflow. A word wider than the whole line is written unbroken.
    fn commit_word(&mut self) -> io::Result<()> {
        if self.word.is_empty() {
            return Ok(());
        }
        if self.column > 0 && self.column + self.pending_spaces + self.word_width > self.width {
            self.writer.write_all(b"\n")?;
            self.column = 0;
            self.pending_spaces = 0;
        } else {
            self.write_spaces()?;
        }
        self.writer.write_all(self.word.as_bytes())?;
        self.column += self.word_width;
        self.word.clear();
        self.word_width = 0;
        Ok(())
    }

    fn write_spaces(&mut self) -> io::Result<()> {
        if self.pending_spaces > 0 {
            write!(self.writer, "{:1$}", "", self.pending_spaces)?;
            self.column += self.pending_spaces;
            self.pending_spaces = 0;
        }
        Ok(())
    }
}

impl<W: Write> TokenSink for Renderer<W> {
    fn write(&mut self, text: &str, kind: TokenKind, style: StyleFlags) -> io::Result<()> {
        let style = if kind == TokenKind::Markdown {
            if !self.show_markdown {
                return Ok(());
            }
            style | StyleFlags::DIM
        } else {
            style
        };

        if self.in_code() {
            self.write_verbatim(text, kind, style)
        } else {
            self.reflow(text, kind, style)
        }
    }

    fn begin_context(&mut self, tag: ContextTag) -> io::Result<()> {
        self.contexts.push(tag);
        Ok(())
    }

    fn end_context(&mut self) -> io::Result<()> {
        self.contexts.pop();
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.commit_word()?;
        self.pending_spaces = 0;
        if self.column > 0 {
            self.writer.write_all(b"\n")?;
            self.column = 0;
        }
        self.writer.flush()
    }
}
