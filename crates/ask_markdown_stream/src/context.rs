//! Nesting contexts that decide how tokens are classified and rendered.

use tracing::trace;

use crate::token::StyleFlags;

/// Fence info strings that select C-family highlighting.
const C_FAMILY_ALIASES: &[&str] = &[
    "c", "h", "cpp", "c++", "cc", "hpp", "cs", "csharp", "c#", "java", "kotlin", "kt",
    "javascript", "js", "jsx", "typescript", "ts", "tsx", "rust", "rs", "go", "swift", "dart",
    "scala", "objc",
];

/// Fence info strings that select Python-like (`#` comment) highlighting.
const PYTHON_ALIASES: &[&str] = &[
    "python", "py", "python3", "sh", "bash", "shell", "zsh", "ruby", "rb", "perl", "pl", "yaml",
    "yml", "toml", "r",
];

/// A formatting or code region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextTag {
    /// Root prose context, always at the bottom of the stack.
    Text,
    Bold,
    Italic,
    Underline,
    InlineCode,
    /// Fenced block in an unrecognized or unspecified language.
    Code,
    /// Fenced block in a C-family language.
    CFamily,
    /// Fenced block in Python or a similar `#`-commented script language.
    Python,
}

impl ContextTag {
    /// Selects the fenced context for a fence info string such as `python` or
    /// `cs title="x"`. Only the first word is considered.
    pub fn from_fence_info(info: &str) -> Self {
        let language = info
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();

        if C_FAMILY_ALIASES.contains(&language.as_str()) {
            Self::CFamily
        } else if PYTHON_ALIASES.contains(&language.as_str()) {
            Self::Python
        } else {
            Self::Code
        }
    }

    /// Words inside code contexts are syntax-classified and written verbatim.
    pub fn is_code(self) -> bool {
        matches!(
            self,
            Self::InlineCode | Self::Code | Self::CFamily | Self::Python
        )
    }

    /// Fenced blocks own their bracket depth and enable line comments.
    pub fn is_fence(self) -> bool {
        matches!(self, Self::Code | Self::CFamily | Self::Python)
    }

    /// Inline contexts are closed by paragraph breaks and fence openings.
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Bold | Self::Italic | Self::Underline | Self::InlineCode
        )
    }

    pub fn style(self) -> StyleFlags {
        match self {
            Self::Bold => StyleFlags::BOLD,
            Self::Italic => StyleFlags::ITALIC,
            Self::Underline => StyleFlags::UNDERLINE,
            Self::Text | Self::InlineCode | Self::Code | Self::CFamily | Self::Python => {
                StyleFlags::empty()
            }
        }
    }
}

/// A pushed context together with the bracket depth active when it was
/// entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub tag: ContextTag,
    pub saved_depth: usize,
}

/// Stack of active contexts. The root `Text` frame can never be popped.
#[derive(Debug, Clone)]
pub struct ContextStack {
    frames: Vec<Frame>,
}

impl Default for ContextStack {
    fn default() -> Self {
        Self { frames: vec![Frame { tag: ContextTag::Text, saved_depth: 0 }] }
    }
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: ContextTag, depth: usize) {
        trace!(?tag, depth, "push context");
        self.frames.push(Frame { tag, saved_depth: depth });
    }

    /// Removes the innermost frame. Returns `None` when only the root is left.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() == 1 {
            return None;
        }
        let frame = self.frames.pop();
        trace!(?frame, "pop context");
        frame
    }

    pub fn top(&self) -> ContextTag {
        self.frames.last().map_or(ContextTag::Text, |frame| frame.tag)
    }

    pub fn contains(&self, tag: ContextTag) -> bool {
        self.frames.iter().any(|frame| frame.tag == tag)
    }

    /// The innermost code-class context, if any.
    pub fn code(&self) -> Option<ContextTag> {
        self.frames
            .iter()
            .rev()
            .map(|frame| frame.tag)
            .find(|tag| tag.is_code())
    }

    pub fn in_code(&self) -> bool {
        self.code().is_some()
    }

    pub fn in_fence(&self) -> bool {
        self.frames.iter().any(|frame| frame.tag.is_fence())
    }

    /// Union of the emphasis styles of every active frame.
    pub fn style(&self) -> StyleFlags {
        self.frames
            .iter()
            .fold(StyleFlags::empty(), |style, frame| style | frame.tag.style())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false: the root frame is permanent.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
