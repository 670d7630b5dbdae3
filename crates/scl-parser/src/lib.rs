//! SCL Parser
//!
//! Expands an SCL file into HCL text. Walks the scanned line tree, resolves
//! variables through a chain of scopes, expands mixin calls, and pulls in
//! imported files through a [`FileSystem`].
//!
//! ```
//! use scl_parser::{MemorySystem, Parser};
//!
//! let fs = MemorySystem::new()
//!     .with_file("main.scl", "@field($name)\n  field $name\n    on = true\nfield(\"x\")\n");
//!
//! let mut parser = Parser::new(fs);
//! parser.parse("main.scl").unwrap();
//! assert_eq!(parser.to_string(), "field \"x\" {\n  on = true\n}");
//! ```

pub mod doc;
pub mod fs;
pub mod mixin;
pub mod parser;
pub mod scope;

pub use doc::{MixinDoc, MixinDocs};
pub use fs::{DiskSystem, FileSystem, MemorySystem};
pub use mixin::{Argument, Mixin};
pub use parser::{Parser, ParserConfig};
pub use scope::{ScopeId, Scopes, Variable};

use std::fmt;

use scl_lexer::{Location, ScanError, TokenErrorKind};

/// Interpolation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("Unknown variable '${0}'")]
    UnknownVariable(String),
    #[error("Unterminated backtick literal")]
    UnterminatedBacktick,
    #[error("Expecting closing right brace in variable ${{{0}}}")]
    UnclosedBrace(String),
}

/// A failed interpolation, with the output substituted so far.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct InterpolationError {
    pub error: ScopeError,
    /// Best-effort output; unknown variables are replaced by nothing.
    pub partial: String,
}

/// Why a mixin argument declaration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationReason {
    RequiredAfterOptional,
    UnexpectedLiteral,
    Duplicate,
}

impl fmt::Display for DeclarationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiredAfterOptional => {
                write!(f, "A required argument can't follow an optional argument")
            }
            Self::UnexpectedLiteral => write!(f, "Unexpected literal"),
            Self::Duplicate => write!(f, "Duplicate argument"),
        }
    }
}

/// An invalid mixin argument list; `index` counts arguments from 0.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Argument declaration {index} [{name}]: {reason}")]
pub struct DeclarationError {
    pub index: usize,
    pub name: String,
    pub reason: DeclarationReason,
}

/// A name or call that can't be resolved in the current scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Mixin {0} not declared in this scope")]
    UnknownMixin(String),
    #[error("Variable ${0} is not declared in this scope")]
    UndeclaredVariable(String),
    #[error("Wrong number of arguments for {name} (required {required}, got {got})")]
    WrongArity {
        name: String,
        required: usize,
        got: usize,
    },
    #[error("Unknown argument ${argument} for mixin {name}")]
    UnknownArgument { name: String, argument: String },
    #[error("Missing argument ${argument} for mixin {name}")]
    MissingArgument { name: String, argument: String },
    #[error("Mixin call {0} can't have a body")]
    CallWithBody(String),
    #[error("Argument ${argument} for mixin {name} bound twice")]
    BoundTwice { name: String, argument: String },
}

/// What went wrong at a located line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("{0}")]
    Token(TokenErrorKind),
    #[error("{0}")]
    Scope(ScopeError),
    #[error("{0}")]
    Declaration(DeclarationError),
    #[error("{0}")]
    Resolution(ResolutionError),
    #[error("Can't read {pattern}: no files found")]
    NoFilesFound { pattern: String },
    /// An assignment or import line with indented lines under it.
    #[error("{0} can't have a body")]
    UnexpectedBody(String),
}

/// Parser error.
///
/// Located errors read `[file:line] message`. Errors raised inside an
/// import or a mixin body are wrapped with the location of the import or
/// call, so the message reads as a chain: `[main.scl:3] [lib.scl:1] ...`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Can't scan {file}: {source}")]
    Scan { file: String, source: ScanError },
    #[error("Can't read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("[{location}] {kind}")]
    Located { location: Location, kind: ErrorKind },
    #[error("[{location}] {source}")]
    Nested {
        location: Location,
        source: Box<Error>,
    },
}

impl Error {
    pub fn at(location: Location, kind: ErrorKind) -> Self {
        Error::Located { location, kind }
    }

    /// Wrap this error with the location of the line that led to it.
    pub fn within(self, location: Location) -> Self {
        Error::Nested {
            location,
            source: Box::new(self),
        }
    }

    /// The innermost error of a wrapped chain.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Nested { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<scl_lexer::TokenError> for Error {
    fn from(e: scl_lexer::TokenError) -> Self {
        Error::at(e.location, ErrorKind::Token(e.kind))
    }
}
