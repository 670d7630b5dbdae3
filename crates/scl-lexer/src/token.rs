use std::fmt;
use std::rc::Rc;

/// A position in a source file, used as the `[file:line]` prefix of errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Rc<str>,
    pub line: usize,
}

impl Location {
    pub fn new(file: Rc<str>, line: usize) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Token classification for a scanned SCL line.
///
/// Every variant carries its content: the literal text, the variable or
/// mixin name, or the comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Raw literal text (`value = 1`, `"quoted"`, `[1,2,3]`).
    Literal(String),
    /// A `$name` reference in an argument list.
    Variable(String),
    /// `$name = ...`; always followed by the assigned `Literal`.
    VariableAssignment(String),
    /// `@name(...)`
    MixinDeclaration(String),
    /// `name(...)` or `name:`
    FunctionCall(String),
    /// `// text`
    LineComment(String),
}

impl TokenKind {
    /// The text carried by the token.
    pub fn content(&self) -> &str {
        match self {
            Self::Literal(s)
            | Self::Variable(s)
            | Self::VariableAssignment(s)
            | Self::MixinDeclaration(s)
            | Self::FunctionCall(s)
            | Self::LineComment(s) => s,
        }
    }
}

/// A token produced by the SCL tokeniser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, location: Location) -> Self {
        Self { kind, location }
    }
}

/// A tokenised line, classified into the statement the parser acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `// text`, carries the comment text.
    Comment(String),
    /// Anything emitted as-is after interpolation.
    Literal(String),
    /// `$name = value`
    Assignment { name: String, value: String },
    /// `@name(arguments)`; arguments are unvalidated signature tokens.
    MixinDeclaration { name: String, arguments: Vec<Token> },
    /// `name(arguments)` or `name:`
    FunctionCall { name: String, arguments: Vec<Token> },
}
