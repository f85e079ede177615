//! Colors and attributes for each token kind.

use colored::{Color, ColoredString, Colorize};

use crate::token::{StyleFlags, TokenKind};

/// Style configuration for a single token kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub dimmed: bool,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn dimmed(mut self) -> Self {
        self.dimmed = true;
        self
    }

    /// Adds the attributes of the active emphasis contexts.
    pub fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.bold |= flags.contains(StyleFlags::BOLD);
        self.dimmed |= flags.contains(StyleFlags::DIM);
        self.italic |= flags.contains(StyleFlags::ITALIC);
        self.underline |= flags.contains(StyleFlags::UNDERLINE);
        self
    }

    /// Apply this style to a string.
    pub fn apply(&self, text: &str) -> ColoredString {
        let mut result = text.normal();

        if let Some(fg) = self.fg {
            result = result.color(fg);
        }
        if let Some(bg) = self.bg {
            result = result.on_color(bg);
        }
        if self.bold {
            result = result.bold();
        }
        if self.italic {
            result = result.italic();
        }
        if self.underline {
            result = result.underline();
        }
        if self.dimmed {
            result = result.dimmed();
        }

        result
    }
}

/// Styles for every token kind plus the bracket depth palette.
#[derive(Clone, Debug)]
pub struct Theme {
    pub body: Style,
    pub markdown: Style,
    pub number: Style,
    pub string: Style,
    pub identifier: Style,
    pub keyword: Style,
    pub literal: Style,
    pub call: Style,
    pub punctuation: Style,
    pub operator: Style,
    pub comment: Style,
    pub url: Style,

    /// Bracket colors indexed by depth modulo the palette length. An empty
    /// palette leaves brackets uncolored.
    pub brackets: Vec<Color>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Detects the terminal theme (dark or light) and returns the appropriate
    /// theme.
    pub fn detect() -> Self {
        use terminal_colorsaurus::{QueryOptions, ThemeMode, theme_mode};

        match theme_mode(QueryOptions::default()) {
            Ok(ThemeMode::Light) => Self::light(),
            Ok(ThemeMode::Dark) | Err(_) => Self::dark(),
        }
    }

    /// Dark theme (default).
    pub fn dark() -> Self {
        Self {
            body: Style::new(),
            markdown: Style::new().dimmed(),
            number: Style::new().fg(Color::Yellow),
            string: Style::new().fg(Color::Green),
            identifier: Style::new(),
            keyword: Style::new().fg(Color::Blue),
            literal: Style::new().fg(Color::BrightMagenta),
            call: Style::new().fg(Color::BrightYellow),
            punctuation: Style::new().fg(Color::BrightBlack),
            operator: Style::new().fg(Color::BrightCyan),
            comment: Style::new().fg(Color::BrightBlack).italic(),
            url: Style::new().fg(Color::Cyan).underline(),
            brackets: vec![Color::Yellow, Color::Magenta, Color::Cyan],
        }
    }

    /// Light theme for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            body: Style::new(),
            markdown: Style::new().dimmed(),
            number: Style::new().fg(Color::Red),
            string: Style::new().fg(Color::Green),
            identifier: Style::new(),
            keyword: Style::new().fg(Color::Blue).bold(),
            literal: Style::new().fg(Color::Magenta),
            call: Style::new().fg(Color::Blue),
            punctuation: Style::new().fg(Color::BrightBlack),
            operator: Style::new().fg(Color::Cyan),
            comment: Style::new().fg(Color::BrightBlack).italic(),
            url: Style::new().fg(Color::Blue).underline(),
            brackets: vec![Color::Blue, Color::Magenta, Color::Red],
        }
    }

    /// Style for a token kind, without emphasis.
    pub fn style(&self, kind: TokenKind) -> Style {
        match kind {
            TokenKind::Body => self.body.clone(),
            TokenKind::Markdown => self.markdown.clone(),
            TokenKind::Number => self.number.clone(),
            TokenKind::String => self.string.clone(),
            TokenKind::Identifier => self.identifier.clone(),
            TokenKind::Keyword => self.keyword.clone(),
            TokenKind::Literal => self.literal.clone(),
            TokenKind::Call => self.call.clone(),
            TokenKind::Punctuation => self.punctuation.clone(),
            TokenKind::Operator => self.operator.clone(),
            TokenKind::Comment => self.comment.clone(),
            TokenKind::Url => self.url.clone(),
            TokenKind::Bracket(depth) => match self.bracket_color(depth) {
                Some(color) => Style::new().fg(color),
                None => Style::new(),
            },
        }
    }

    pub fn bracket_color(&self, depth: usize) -> Option<Color> {
        if self.brackets.is_empty() {
            return None;
        }
        self.brackets.get(depth % self.brackets.len()).copied()
    }

    /// Renders `text` with the style of `kind` and the emphasis `flags`.
    pub fn paint(&self, text: &str, kind: TokenKind, flags: StyleFlags) -> String {
        self.style(kind).with_flags(flags).apply(text).to_string()
    }
}
