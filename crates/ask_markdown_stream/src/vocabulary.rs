//! Fixed keyword and literal-word sets for the recognized code languages.

use std::collections::HashSet;

use crate::context::ContextTag;
use crate::token::TokenKind;

const C_FAMILY_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "base", "bool", "break", "byte", "case", "catch", "char",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum",
    "event", "explicit", "export", "extends", "extern", "final", "finally", "fixed", "float", "fn",
    "for", "foreach", "func", "function", "get", "goto", "if", "impl", "implements", "import",
    "in", "int", "interface", "internal", "is", "let", "lock", "long", "loop", "match", "mod",
    "mut", "namespace", "new", "object", "operator", "out", "override", "package", "params",
    "private", "protected", "pub", "public", "readonly", "ref", "return", "sealed", "set",
    "short", "signed", "sizeof", "static", "string", "struct", "super", "switch", "template",
    "this", "throw", "throws", "trait", "try", "type", "typedef", "typeof", "uint", "ulong",
    "union", "unsafe", "unsigned", "use", "using", "var", "virtual", "void", "volatile", "where",
    "while", "yield",
];

const C_FAMILY_LITERALS: &[&str] = &[
    "true", "false", "null", "nullptr", "NULL", "undefined", "None", "Some", "Ok", "Err",
    "self", "Self",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "case", "class", "continue", "def", "del",
    "do", "done", "elif", "else", "esac", "except", "export", "fi", "finally", "for", "from",
    "function", "global", "if", "import", "in", "is", "lambda", "local", "match", "nonlocal",
    "not", "or", "pass", "raise", "return", "then", "try", "while", "with", "yield",
];

const PYTHON_LITERALS: &[&str] = &["True", "False", "None", "true", "false", "null", "self"];

/// Keywords and literal value words of one language family.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    keywords: HashSet<String>,
    literals: HashSet<String>,
}

impl Vocabulary {
    pub fn new<K, L>(keywords: K, literals: L) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            literals: literals.into_iter().map(Into::into).collect(),
        }
    }

    pub fn c_family() -> Self {
        Self::new(C_FAMILY_KEYWORDS.iter().copied(), C_FAMILY_LITERALS.iter().copied())
    }

    pub fn python() -> Self {
        Self::new(PYTHON_KEYWORDS.iter().copied(), PYTHON_LITERALS.iter().copied())
    }

    /// Keyword or literal kind for `word`; `None` for plain identifiers.
    pub fn lookup(&self, word: &str) -> Option<TokenKind> {
        if self.keywords.contains(word) {
            Some(TokenKind::Keyword)
        } else if self.literals.contains(word) {
            Some(TokenKind::Literal)
        } else {
            None
        }
    }
}

/// Vocabularies for every recognized language, selected by context.
#[derive(Debug, Clone)]
pub struct Vocabularies {
    pub c_family: Vocabulary,
    pub python: Vocabulary,
}

impl Default for Vocabularies {
    fn default() -> Self {
        Self { c_family: Vocabulary::c_family(), python: Vocabulary::python() }
    }
}

impl Vocabularies {
    /// Classifies a word found inside the code context `tag`. Generic code
    /// and inline code consult every vocabulary.
    pub fn classify(&self, tag: ContextTag, word: &str) -> TokenKind {
        let found = match tag {
            ContextTag::CFamily => self.c_family.lookup(word),
            ContextTag::Python => self.python.lookup(word),
            _ => self
                .c_family
                .lookup(word)
                .or_else(|| self.python.lookup(word)),
        };
        found.unwrap_or(TokenKind::Identifier)
    }
}
