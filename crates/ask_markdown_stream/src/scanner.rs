//! Character-at-a-time tokenizer for streamed markdown.
//!
//! The scanner never looks ahead in the input: every decision is made from
//! the current state, the partial token and the character being fed. Input
//! can therefore be split into chunks at any character boundary without
//! changing the output.

use std::io;

use tracing::{trace, warn};

use crate::classifier::Classifier;
use crate::context::{ContextStack, ContextTag};
use crate::sink::TokenSink;
use crate::token::TokenKind;
use crate::vocabulary::Vocabularies;

/// Ending a token retries its character once, always from `Unknown`, which
/// consumes. The bound leaves headroom above that; reaching it means the
/// transition table is broken.
const MAX_RETRIES: usize = 4;

const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "file"];

/// Where the scanner is in the middle of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between tokens.
    Unknown,
    Whitespace,
    /// A newline followed by blanks.
    Newline,
    /// Two or more newlines: a paragraph break.
    Newlines,
    Word,
    /// A URL scheme word followed by `:`, waiting for the `/` that confirms
    /// the URL.
    Scheme,
    Url,
    Integer,
    /// An integer followed by a single `.`.
    Decimal,
    Fraction,
    LineComment,
    Ticks(usize),
    /// A fence opening line: three ticks and the info string.
    FenceInfo,
    Stars(usize),
    Underscores(usize),
    Slash,
    Quote,
    QuoteBody,
    QuoteEscape,
    QuotePair,
    TripleBody,
    TripleOne,
    TripleTwo,
    Apostrophe,
    ApostropheEscape,
    Finished,
}

/// Outcome of feeding one character to the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Consumed,
    /// The character ended the current token and must be fed again.
    Retry,
}

/// Streaming tokenizer that classifies tokens and forwards them to a sink.
pub struct Tokenizer<S: TokenSink> {
    state: State,
    token: String,
    depth: usize,
    contexts: ContextStack,
    classifier: Classifier,
    vocabulary: Vocabularies,
    sink: S,
}

impl<S: TokenSink> Tokenizer<S> {
    pub fn new(sink: S) -> Self {
        Self::with_vocabulary(sink, Vocabularies::default())
    }

    pub fn with_vocabulary(sink: S, vocabulary: Vocabularies) -> Self {
        Self {
            state: State::Whitespace,
            token: String::new(),
            depth: 0,
            contexts: ContextStack::new(),
            classifier: Classifier::new(),
            vocabulary,
            sink,
        }
    }

    /// Feeds a chunk of input. The chunk may end anywhere, including in the
    /// middle of a token.
    pub fn append(&mut self, chunk: &str) -> io::Result<()> {
        for ch in chunk.chars() {
            let mut retries = 0;
            while self.step(ch)? == Step::Retry {
                retries += 1;
                if retries >= MAX_RETRIES {
                    debug_assert!(false, "scanner stuck on {ch:?} in {:?}", self.state);
                    warn!(?ch, state = ?self.state, "scanner stuck, emitting character as text");
                    self.token.clear();
                    self.state = State::Unknown;
                    self.emit(&ch.to_string(), TokenKind::Body)?;
                    break;
                }
            }
        }
        Ok(())
    }

    /// Ends the open token, closes every context and finishes the sink.
    /// Calling it again, or appending afterwards, has no effect.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.state == State::Finished {
            return Ok(());
        }
        self.end_token(None)?;
        self.classifier.flush(&mut self.sink)?;
        while self.contexts.len() > 1 {
            self.pop()?;
        }
        self.state = State::Finished;
        self.sink.finish()
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Current bracket nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn consume(&mut self, ch: char, next: State) -> io::Result<Step> {
        self.token.push(ch);
        self.state = next;
        Ok(Step::Consumed)
    }

    fn retry(&mut self, ch: char) -> io::Result<Step> {
        self.end_token(Some(ch))?;
        Ok(Step::Retry)
    }

    fn step(&mut self, ch: char) -> io::Result<Step> {
        match self.state {
            State::Finished => Ok(Step::Consumed),
            State::Unknown => {
                self.start(ch)?;
                Ok(Step::Consumed)
            }
            State::Whitespace => {
                if is_blank(ch) {
                    self.consume(ch, State::Whitespace)
                } else {
                    self.retry(ch)
                }
            }
            State::Newline | State::Newlines => {
                if ch == '\n' {
                    self.consume(ch, State::Newlines)
                } else if is_blank(ch) {
                    self.consume(ch, self.state)
                } else {
                    self.retry(ch)
                }
            }
            State::Word => {
                let in_code = self.contexts.in_code();
                if ch.is_alphanumeric() || (in_code && ch == '_') {
                    self.consume(ch, State::Word)
                } else if ch == ':' && !in_code && is_url_scheme(&self.token) {
                    self.consume(ch, State::Scheme)
                } else {
                    self.retry(ch)
                }
            }
            State::Scheme => {
                if ch == '/' {
                    self.consume(ch, State::Url)
                } else {
                    self.retry(ch)
                }
            }
            State::Url => {
                if is_url_char(ch) {
                    self.consume(ch, State::Url)
                } else {
                    self.retry(ch)
                }
            }
            State::Integer => match ch {
                '0'..='9' => self.consume(ch, State::Integer),
                '.' => self.consume(ch, State::Decimal),
                _ => self.retry(ch),
            },
            State::Decimal | State::Fraction => {
                if ch.is_ascii_digit() {
                    self.consume(ch, State::Fraction)
                } else {
                    self.retry(ch)
                }
            }
            State::LineComment | State::FenceInfo => {
                if ch == '\n' {
                    self.retry(ch)
                } else {
                    self.consume(ch, self.state)
                }
            }
            State::Ticks(count) => {
                if ch != '`' {
                    return self.retry(ch);
                }
                if count < 2 {
                    return self.consume(ch, State::Ticks(count + 1));
                }
                self.consume(ch, State::FenceInfo)?;
                if self.contexts.in_fence() {
                    // Closing fences end on the third tick.
                    self.end_token(Some(ch))?;
                }
                Ok(Step::Consumed)
            }
            State::Stars(count) => {
                if ch == '*' {
                    self.consume(ch, State::Stars(count + 1))
                } else {
                    self.retry(ch)
                }
            }
            State::Underscores(count) => {
                if ch == '_' {
                    self.consume(ch, State::Underscores(count + 1))
                } else {
                    self.retry(ch)
                }
            }
            State::Slash => {
                if ch == '/' && self.contexts.in_fence() {
                    self.consume(ch, State::LineComment)
                } else {
                    self.retry(ch)
                }
            }
            State::Quote
            | State::QuoteBody
            | State::QuoteEscape
            | State::QuotePair
            | State::TripleBody
            | State::TripleOne
            | State::TripleTwo
            | State::Apostrophe
            | State::ApostropheEscape
                if ch == '`' && self.contexts.code() == Some(ContextTag::InlineCode) =>
            {
                // The closing tick of inline code ends any string inside it.
                self.retry(ch)
            }
            State::Quote => match ch {
                '"' => self.consume(ch, State::QuotePair),
                '\\' => self.consume(ch, State::QuoteEscape),
                '\n' => self.retry(ch),
                _ => self.consume(ch, State::QuoteBody),
            },
            State::QuoteBody => match ch {
                '"' => {
                    self.consume(ch, State::QuoteBody)?;
                    self.end_token(Some(ch))?;
                    Ok(Step::Consumed)
                }
                '\\' => self.consume(ch, State::QuoteEscape),
                '\n' => self.retry(ch),
                _ => self.consume(ch, State::QuoteBody),
            },
            State::QuoteEscape => self.consume(ch, State::QuoteBody),
            State::QuotePair => {
                if ch == '"' {
                    self.consume(ch, State::TripleBody)
                } else {
                    self.retry(ch)
                }
            }
            State::TripleBody => match ch {
                '"' => self.consume(ch, State::TripleOne),
                _ => self.consume(ch, State::TripleBody),
            },
            State::TripleOne => match ch {
                '"' => self.consume(ch, State::TripleTwo),
                _ => self.consume(ch, State::TripleBody),
            },
            State::TripleTwo => match ch {
                '"' => {
                    self.consume(ch, State::TripleTwo)?;
                    self.end_token(Some(ch))?;
                    Ok(Step::Consumed)
                }
                _ => self.consume(ch, State::TripleBody),
            },
            State::Apostrophe => match ch {
                '\'' => {
                    self.consume(ch, State::Apostrophe)?;
                    self.end_token(Some(ch))?;
                    Ok(Step::Consumed)
                }
                '\\' => self.consume(ch, State::ApostropheEscape),
                '\n' => self.retry(ch),
                _ => self.consume(ch, State::Apostrophe),
            },
            State::ApostropheEscape => self.consume(ch, State::Apostrophe),
        }
    }

    /// Handles the first character of a token.
    fn start(&mut self, ch: char) -> io::Result<()> {
        let in_code = self.contexts.in_code();
        match ch {
            '\n' => {
                self.consume(ch, State::Newline)?;
            }
            _ if is_blank(ch) => {
                self.consume(ch, State::Whitespace)?;
            }
            '0'..='9' => {
                self.consume(ch, State::Integer)?;
            }
            '.' | ',' | ';' | ':' | '!' | '?' => {
                self.emit(&ch.to_string(), TokenKind::Punctuation)?;
            }
            '(' | '[' | '{' => {
                self.depth += 1;
                self.emit(&ch.to_string(), TokenKind::Bracket(self.depth))?;
            }
            ')' | ']' | '}' => {
                self.emit(&ch.to_string(), TokenKind::Bracket(self.depth))?;
                self.depth = self.depth.saturating_sub(1);
            }
            '`' => {
                self.consume(ch, State::Ticks(1))?;
            }
            '*' if !in_code => {
                self.consume(ch, State::Stars(1))?;
            }
            '_' if !in_code => {
                self.consume(ch, State::Underscores(1))?;
            }
            '/' => {
                self.consume(ch, State::Slash)?;
            }
            '#' if self.contexts.in_fence() => {
                self.consume(ch, State::LineComment)?;
            }
            '"' => {
                self.consume(ch, State::Quote)?;
            }
            '\'' if in_code => {
                self.consume(ch, State::Apostrophe)?;
            }
            '\'' => {
                self.emit(&ch.to_string(), TokenKind::Body)?;
            }
            '=' | '+' | '-' | '*' | '%' | '&' | '|' | '^' | '~' | '<' | '>' | '#' => {
                self.emit(&ch.to_string(), TokenKind::Operator)?;
            }
            _ => {
                self.consume(ch, State::Word)?;
            }
        }
        Ok(())
    }

    /// Classifies and emits the current token. `next` is the character that
    /// ended it, or `None` at the end of input.
    fn end_token(&mut self, next: Option<char>) -> io::Result<()> {
        let state = std::mem::replace(&mut self.state, State::Unknown);
        let text = std::mem::take(&mut self.token);
        if text.is_empty() {
            return Ok(());
        }

        match state {
            State::Unknown | State::Finished => {
                debug_assert!(false, "token {text:?} ended from {state:?}");
                warn!(?state, "token ended from idle state, emitting as text");
                self.emit(&text, TokenKind::Body)
            }
            State::Whitespace | State::Newline => self.emit(&text, TokenKind::Body),
            State::Newlines => {
                if !self.contexts.in_fence() {
                    self.depth = 0;
                    self.close_inline()?;
                }
                self.emit(&text, TokenKind::Body)
            }
            State::Word => self.emit_word(&text),
            State::Scheme => {
                let word = text.strip_suffix(':').unwrap_or(&text);
                self.emit_word(word)?;
                self.emit(":", TokenKind::Punctuation)
            }
            State::Url => self.end_url(&text),
            State::Integer | State::Fraction => self.emit(&text, TokenKind::Number),
            State::Decimal => {
                let number = text.strip_suffix('.').unwrap_or(&text);
                self.emit(number, TokenKind::Number)?;
                self.emit(".", TokenKind::Punctuation)
            }
            State::LineComment => self.emit(&text, TokenKind::Comment),
            State::Ticks(count) => self.end_ticks(&text, count),
            State::FenceInfo => self.end_fence(&text),
            State::Stars(count) => {
                let tags: &[ContextTag] = match count {
                    1 => &[ContextTag::Italic],
                    2 => &[ContextTag::Bold],
                    3 => &[ContextTag::Bold, ContextTag::Italic],
                    _ => &[],
                };
                self.end_emphasis(&text, tags, next)
            }
            State::Underscores(count) => {
                let tags: &[ContextTag] = if count == 2 { &[ContextTag::Underline] } else { &[] };
                self.end_emphasis(&text, tags, next)
            }
            State::Slash => self.emit(&text, TokenKind::Operator),
            State::Quote
            | State::QuoteBody
            | State::QuoteEscape
            | State::QuotePair
            | State::TripleBody
            | State::TripleOne
            | State::TripleTwo
            | State::Apostrophe
            | State::ApostropheEscape => self.emit(&text, TokenKind::String),
        }
    }

    fn emit_word(&mut self, text: &str) -> io::Result<()> {
        let kind = match self.contexts.code() {
            Some(tag) => self.vocabulary.classify(tag, text),
            None => TokenKind::Body,
        };
        if kind.is_name() {
            let style = self.contexts.style();
            self.classifier.defer(text, kind, style, &mut self.sink)
        } else {
            self.emit(text, kind)
        }
    }

    /// Sentence punctuation at the end of a URL is not part of it.
    fn end_url(&mut self, text: &str) -> io::Result<()> {
        let url = text.trim_end_matches(is_trailing_punctuation);
        self.emit(url, TokenKind::Url)?;
        for ch in text[url.len()..].chars() {
            self.emit(&ch.to_string(), TokenKind::Punctuation)?;
        }
        Ok(())
    }

    fn end_ticks(&mut self, text: &str, count: usize) -> io::Result<()> {
        if self.contexts.in_fence() {
            return self.emit(text, TokenKind::Punctuation);
        }
        if count != 1 {
            return self.emit(text, TokenKind::Markdown);
        }
        if self.contexts.contains(ContextTag::InlineCode) {
            self.pop_to(ContextTag::InlineCode)?;
            self.emit(text, TokenKind::Markdown)
        } else {
            self.emit(text, TokenKind::Markdown)?;
            self.push(ContextTag::InlineCode)
        }
    }

    fn end_fence(&mut self, text: &str) -> io::Result<()> {
        if self.contexts.in_fence() {
            while self.contexts.in_fence() {
                self.pop()?;
            }
            return self.emit(text, TokenKind::Markdown);
        }
        let tag = ContextTag::from_fence_info(text.trim_start_matches('`').trim());
        self.close_inline()?;
        self.emit(text, TokenKind::Markdown)?;
        self.push(tag)
    }

    /// Toggles the emphasis contexts `tags` for a marker run. Runs that can
    /// neither close nor open (or have no tags) are literal text.
    fn end_emphasis(
        &mut self,
        text: &str,
        tags: &[ContextTag],
        next: Option<char>,
    ) -> io::Result<()> {
        if tags.is_empty() {
            return self.emit(text, TokenKind::Body);
        }
        if tags.iter().all(|tag| self.contexts.contains(*tag)) {
            for tag in tags.iter().rev() {
                self.pop_to(*tag)?;
            }
            return self.emit(text, TokenKind::Markdown);
        }
        if next.is_some_and(|ch| !ch.is_whitespace()) {
            self.emit(text, TokenKind::Markdown)?;
            for tag in tags {
                if !self.contexts.contains(*tag) {
                    self.push(*tag)?;
                }
            }
            return Ok(());
        }
        self.emit(text, TokenKind::Body)
    }

    fn emit(&mut self, text: &str, kind: TokenKind) -> io::Result<()> {
        let style = self.contexts.style();
        self.classifier.write(text, kind, style, &mut self.sink)
    }

    fn push(&mut self, tag: ContextTag) -> io::Result<()> {
        self.classifier.flush(&mut self.sink)?;
        self.contexts.push(tag, self.depth);
        if tag.is_fence() {
            self.depth = 0;
        }
        self.sink.begin_context(tag)
    }

    fn pop(&mut self) -> io::Result<()> {
        self.classifier.flush(&mut self.sink)?;
        if let Some(frame) = self.contexts.pop() {
            if frame.tag.is_fence() {
                self.depth = frame.saved_depth;
            }
            self.sink.end_context()?;
        }
        Ok(())
    }

    /// Pops frames until `tag` has been removed.
    fn pop_to(&mut self, tag: ContextTag) -> io::Result<()> {
        while self.contexts.contains(tag) {
            self.pop()?;
        }
        Ok(())
    }

    fn close_inline(&mut self) -> io::Result<()> {
        while self.contexts.top().is_inline() {
            trace!(tag = ?self.contexts.top(), "closing unterminated inline context");
            self.pop()?;
        }
        Ok(())
    }
}

fn is_blank(ch: char) -> bool {
    ch != '\n' && ch.is_whitespace()
}

fn is_url_scheme(word: &str) -> bool {
    URL_SCHEMES
        .iter()
        .any(|scheme| scheme.eq_ignore_ascii_case(word))
}

fn is_url_char(ch: char) -> bool {
    ch.is_alphanumeric() || "-._~:/?#[]@!$&+,;=%'".contains(ch)
}

fn is_trailing_punctuation(ch: char) -> bool {
    matches!(ch, '.' | ',' | ';' | ':' | '!' | '?')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sink::CaptureSink;

    fn tokenize(input: &str) -> Tokenizer<CaptureSink> {
        let mut tokenizer = Tokenizer::new(CaptureSink::new());
        tokenizer.append(input).unwrap();
        tokenizer.finish().unwrap();
        tokenizer
    }

    fn tagged(input: &str) -> String {
        tokenize(input).sink().tagged()
    }

    #[test]
    fn test_prose_brackets_share_depth_color() {
        insta::assert_snapshot!(tagged("hello (world)"), @r#"body:"hello " bracket1:"(" body:"world" bracket1:")""#);
    }

    #[test]
    fn test_python_fence() {
        let actual = tokenize("```python\ndef foo():\n    return 1\n```");

        insta::assert_snapshot!(actual.sink().tagged(), @r#"md:"```python" body:"\n" kw:"def" body:" " call:"foo" bracket1:"()" punct:":" body:"\n    " kw:"return" body:" " num:"1" body:"\n" md:"```""#);
        assert!(actual.sink().open.is_empty());
        assert_eq!((actual.sink().begun, actual.sink().ended), (1, 1));
    }

    #[test]
    fn test_dotted_call_outside_code() {
        insta::assert_snapshot!(tagged("a.b.c("), @r#"body:"a" punct:"." body:"b" punct:"." call:"c" bracket1:"(""#);
    }

    #[test]
    fn test_prose_word_before_paren_is_call() {
        insta::assert_snapshot!(tagged("the function(s)"), @r#"body:"the " call:"function" bracket1:"(" body:"s" bracket1:")""#);
    }

    #[test]
    fn test_dotted_call_inside_code() {
        insta::assert_snapshot!(tagged("```\nself.items.push(x)\n```"), @r#"md:"```" body:"\n" lit:"self" punct:"." ident:"items" punct:"." call:"push" bracket1:"(" ident:"x" bracket1:")" body:"\n" md:"```""#);
    }

    #[test]
    fn test_keyword_before_paren_stays_keyword() {
        insta::assert_snapshot!(tagged("```cs\nif (x)\n```"), @r#"md:"```cs" body:"\n" kw:"if" body:" " bracket1:"(" ident:"x" bracket1:")" body:"\n" md:"```""#);
    }

    #[test]
    fn test_prose_words_are_body() {
        insta::assert_snapshot!(tagged("if return def"), @r#"body:"if return def""#);
    }

    #[test]
    fn test_numbers() {
        insta::assert_snapshot!(tagged("pi is 3.14."), @r#"body:"pi is " num:"3.14" punct:".""#);
        insta::assert_snapshot!(tagged("I have 12."), @r#"body:"I have " num:"12" punct:".""#);
        insta::assert_snapshot!(tagged("1.2.3"), @r#"num:"1.2" punct:"." num:"3""#);
    }

    #[test]
    fn test_unmatched_closers_clamp_at_zero() {
        let actual = tokenize(")) (");

        insta::assert_snapshot!(actual.sink().tagged(), @r#"bracket0:"))" body:" " bracket1:"(""#);
        assert_eq!(actual.depth(), 1);
    }

    #[test]
    fn test_nested_brackets() {
        insta::assert_snapshot!(tagged("([x])"), @r#"bracket1:"(" bracket2:"[" body:"x" bracket2:"]" bracket1:")""#);
    }

    #[test]
    fn test_paragraph_break_resets_depth() {
        let actual = tokenize("(a\n\nb)");

        insta::assert_snapshot!(actual.sink().tagged(), @r#"bracket1:"(" body:"a\n\nb" bracket0:")""#);
        assert_eq!(actual.depth(), 0);
    }

    #[test]
    fn test_blank_line_inside_fence_keeps_depth() {
        insta::assert_snapshot!(tagged("```\n{\n\n}\n```"), @r#"md:"```" body:"\n" bracket1:"{" body:"\n\n" bracket1:"}" body:"\n" md:"```""#);
    }

    #[test]
    fn test_fence_depth_is_restored() {
        let mut fixture = Tokenizer::new(CaptureSink::new());
        fixture.append("(see\n```js\n{[").unwrap();
        assert_eq!(fixture.depth(), 2);

        fixture.append("\n```\n").unwrap();
        assert_eq!(fixture.depth(), 1);
    }

    #[test]
    fn test_url_outside_code() {
        insta::assert_snapshot!(tagged("see https://example.com/a?b=1 now"), @r#"body:"see " url:"https://example.com/a?b=1" body:" now""#);
    }

    #[test]
    fn test_emphasis_after_url() {
        let actual = tokenize("**see https://x.com** done");

        insta::assert_snapshot!(actual.sink().tagged(), @r#"md:"**" body+b:"see " url+b:"https://x.com" md:"**" body:" done""#);
        assert_eq!((actual.sink().begun, actual.sink().ended), (1, 1));
    }

    #[test]
    fn test_url_trailing_punctuation() {
        insta::assert_snapshot!(tagged("Visit https://example.com. Then"), @r#"body:"Visit " url:"https://example.com" punct:"." body:" Then""#);
        insta::assert_snapshot!(tagged("(https://x.io/a?),"), @r#"bracket1:"(" url:"https://x.io/a" punct:"?" bracket1:")" punct:",""#);
    }

    #[test]
    fn test_scheme_word_without_slash_is_prose() {
        insta::assert_snapshot!(tagged("Open the file: it works"), @r#"body:"Open the file" punct:":" body:" it works""#);
        insta::assert_snapshot!(tagged("http:"), @r#"body:"http" punct:":""#);
    }

    #[test]
    fn test_url_scheme_inside_code_is_identifier() {
        insta::assert_snapshot!(tagged("`http:x`"), @r#"md:"`" ident:"http" punct:":" ident:"x" md:"`""#);
    }

    #[test]
    fn test_bold_markers() {
        insta::assert_snapshot!(tagged("**bold** text"), @r#"md:"**" body+b:"bold" md:"**" body:" text""#);
    }

    #[test]
    fn test_bold_italic_markers() {
        insta::assert_snapshot!(tagged("***both*** and *it*"), @r#"md:"***" body+bi:"both" md:"***" body:" and " md:"*" body+i:"it" md:"*""#);
    }

    #[test]
    fn test_literal_stars() {
        insta::assert_snapshot!(tagged("2 * 3"), @r#"num:"2" body:" * " num:"3""#);
        insta::assert_snapshot!(tagged("* item"), @r#"body:"* item""#);
    }

    #[test]
    fn test_underline_markers() {
        insta::assert_snapshot!(tagged("__under__ snake_case"), @r#"md:"__" body+u:"under" md:"__" body:" snake_case""#);
    }

    #[test]
    fn test_star_is_operator_in_code() {
        insta::assert_snapshot!(tagged("`a*b`"), @r#"md:"`" ident:"a" op:"*" ident:"b" md:"`""#);
    }

    #[test]
    fn test_inline_code_call() {
        insta::assert_snapshot!(tagged("use `foo()` now"), @r#"body:"use " md:"`" call:"foo" bracket1:"()" md:"`" body:" now""#);
    }

    #[test]
    fn test_line_comments() {
        insta::assert_snapshot!(tagged("```cs\nint x; // note\n```"), @r#"md:"```cs" body:"\n" kw:"int" body:" " ident:"x" punct:";" body:" " comment:"// note" body:"\n" md:"```""#);
        insta::assert_snapshot!(tagged("```py\nx = 1 # hi\n```"), @r##"md:"```py" body:"\n" ident:"x" body:" " op:"=" body:" " num:"1" body:" " comment:"# hi" body:"\n" md:"```""##);
    }

    #[test]
    fn test_slashes_and_hash_in_prose_are_operators() {
        insta::assert_snapshot!(tagged("a // b"), @r#"body:"a " op:"//" body:" b""#);
        insta::assert_snapshot!(tagged("# Title"), @r##"op:"#" body:" Title""##);
    }

    #[test]
    fn test_strings() {
        insta::assert_snapshot!(tagged(r#"`print("hi")`"#), @r#"md:"`" call:"print" bracket1:"(" str:"\"hi\"" bracket1:")" md:"`""#);
        insta::assert_snapshot!(tagged(r#"say "a \" b" ok"#), @r#"body:"say " str:"\"a \\\" b\"" body:" ok""#);
        insta::assert_snapshot!(tagged("x = \"\""), @r#"body:"x " op:"=" body:" " str:"\"\"""#);
    }

    #[test]
    fn test_closing_tick_ends_string_in_inline_code() {
        let actual = tokenize("Use `it's` here and `x` then more");

        insta::assert_snapshot!(actual.sink().tagged(), @r#"body:"Use " md:"`" ident:"it" str:"'s" md:"`" body:" here and " md:"`" ident:"x" md:"`" body:" then more""#);
        assert_eq!((actual.sink().begun, actual.sink().ended), (2, 2));
        insta::assert_snapshot!(tagged(r#"`say("hi`"#), @r#"md:"`" call:"say" bracket1:"(" str:"\"hi" md:"`""#);
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        insta::assert_snapshot!(tagged("```py\n\"\"\"doc \"q\"\nend\"\"\"\n```"), @r#"md:"```py" body:"\n" str:"\"\"\"doc \"q\"\nend\"\"\"" body:"\n" md:"```""#);
    }

    #[test]
    fn test_unterminated_string_ends_at_newline() {
        insta::assert_snapshot!(tagged("say \"hello\nnext"), @r#"body:"say " str:"\"hello" body:"\nnext""#);
    }

    #[test]
    fn test_apostrophes() {
        insta::assert_snapshot!(tagged("don't"), @r#"body:"don't""#);
        insta::assert_snapshot!(tagged("```c\nc = 'x';\n```"), @r#"md:"```c" body:"\n" ident:"c" body:" " op:"=" body:" " str:"'x'" punct:";" body:"\n" md:"```""#);
    }

    #[test]
    fn test_literal_words() {
        insta::assert_snapshot!(tagged("```python\nx = None\n```"), @r#"md:"```python" body:"\n" ident:"x" body:" " op:"=" body:" " lit:"None" body:"\n" md:"```""#);
    }

    #[test]
    fn test_fence_closes_open_emphasis() {
        let actual = tokenize("**bold\n```\nx\n```");

        insta::assert_snapshot!(actual.sink().tagged(), @r#"md:"**" body+b:"bold\n" md:"```" body:"\n" ident:"x" body:"\n" md:"```""#);
        assert_eq!((actual.sink().begun, actual.sink().ended), (2, 2));
    }

    #[test]
    fn test_paragraph_break_closes_emphasis() {
        insta::assert_snapshot!(tagged("*open\n\nplain"), @r#"md:"*" body+i:"open" body:"\n\nplain""#);
    }

    #[test]
    fn test_finish_closes_every_context() {
        let actual = tokenize("**bold `code\n```rust\nfn x() {");

        assert_eq!(actual.contexts().len(), 1);
        assert!(actual.sink().open.is_empty());
        assert_eq!(actual.sink().begun, actual.sink().ended);
        assert_eq!(actual.sink().finished, 1);
    }

    #[test]
    fn test_unterminated_tokens_flush_on_finish() {
        insta::assert_snapshot!(tagged("```py\n# tail"), @r##"md:"```py" body:"\n" comment:"# tail""##);
        insta::assert_snapshot!(tagged("**"), @r#"body:"**""#);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut fixture = Tokenizer::new(CaptureSink::new());
        fixture.append("some *text").unwrap();
        fixture.finish().unwrap();
        let expected = fixture.sink().clone();

        fixture.finish().unwrap();
        fixture.append("more").unwrap();

        assert!(fixture.is_finished());
        assert_eq!(fixture.sink().emissions, expected.emissions);
        assert_eq!(fixture.sink().finished, 1);
    }

    #[test]
    fn test_backticks_inside_fence_are_punctuation() {
        insta::assert_snapshot!(tagged("```sh\necho `date`\n```"), @r#"md:"```sh" body:"\n" ident:"echo" body:" " punct:"`" ident:"date" punct:"`" body:"\n" md:"```""#);
    }

    #[test]
    fn test_embedded_closing_fence() {
        insta::assert_snapshot!(tagged("```js\n}```"), @r#"md:"```js" body:"\n" bracket0:"}" md:"```""#);
    }

    #[test]
    fn test_chunked_input_matches_single_append() {
        let input = "Say **hi** to `foo.bar(1.5)`\n\n```python\ndef f(x):\n    return \"\"\"a\"\"\" # c\n```\nsee https://x.io ok";
        let expected = tagged(input);

        for split in 0..=input.chars().count() {
            let head: String = input.chars().take(split).collect();
            let tail: String = input.chars().skip(split).collect();
            let mut fixture = Tokenizer::new(CaptureSink::new());
            fixture.append(&head).unwrap();
            fixture.append(&tail).unwrap();
            fixture.finish().unwrap();
            assert_eq!(fixture.sink().tagged(), expected, "split at {split}");
        }
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        const PIECES: &[&str] = &[
            "`", "```", "```py\n", "*", "**", "__", "\"", "'", "\n", "\n\n", "//", "#", "(", ")",
            "https:",
        ];

        fn markdownish() -> impl Strategy<Value = String> {
            let piece = prop_oneof![
                proptest::sample::select(PIECES).prop_map(|piece| piece.to_string()),
                "[a-z]{1,6}",
                "[0-9.]{1,4}",
                "[ \t]{1,3}",
            ];
            proptest::collection::vec(piece, 0..40).prop_map(|parts| parts.concat())
        }

        proptest! {
            #[test]
            fn chunking_never_changes_output(input in markdownish(), cuts in proptest::collection::vec(any::<usize>(), 0..6)) {
                let chars: Vec<char> = input.chars().collect();
                let mut cuts: Vec<usize> = cuts.into_iter().map(|cut| cut % (chars.len() + 1)).collect();
                cuts.sort_unstable();

                let mut chunked = Tokenizer::new(CaptureSink::new());
                let mut start = 0;
                for cut in cuts.into_iter().chain(std::iter::once(chars.len())) {
                    let chunk: String = chars[start..cut].iter().collect();
                    chunked.append(&chunk).unwrap();
                    start = cut;
                }
                chunked.finish().unwrap();

                let whole = tokenize(&input);
                prop_assert_eq!(chunked.sink().tagged(), whole.sink().tagged());
            }

            #[test]
            fn contexts_balance_after_finish(input in markdownish()) {
                let actual = tokenize(&input);

                prop_assert_eq!(actual.contexts().len(), 1);
                prop_assert_eq!(actual.sink().begun, actual.sink().ended);
                prop_assert_eq!(actual.sink().finished, 1);
                prop_assert_eq!(actual.sink().text(), input);
            }
        }
    }
}
