//! SCL Lexer
//!
//! Turns `.scl` source text into a tree of indented lines, and classifies
//! each line into tokens. The scanner owns indentation and heredocs; the
//! tokeniser owns comments, mixin declarations, function calls and
//! variable assignments.
//!
//! # Example
//!
//! ```
//! use scl_lexer::{scan, tokenise, TokenKind};
//!
//! let tree = scan("block\n  value = 1\n", "main.scl").unwrap();
//! let root = tree.line(tree.roots()[0]);
//! assert_eq!(root.content, "block");
//!
//! let tokens = tokenise(tree.line(root.children[0])).unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Literal("value = 1".into()));
//! ```

pub mod scanner;
pub mod token;
pub mod tokeniser;

pub use scanner::{scan, LineId, LineTree, ScannedLine};
pub use token::{Location, Statement, Token, TokenKind};
pub use tokeniser::{classify, strip_comments, tokenise, tokenise_function};

use std::fmt;

/// Scanner error. Scanning only fails on structures spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("Heredoc '{marker}' (started line {line}) not terminated")]
    UnterminatedHeredoc { marker: String, line: usize },
}

/// Classifies a tokeniser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenErrorKind {
    /// Unbalanced parentheses, unterminated or empty argument.
    MalformedSignature,
    /// A bare argument containing a character no literal may contain.
    IllegalCharacter(char),
    /// An argument that looks like a variable but isn't one.
    UnknownToken(String),
}

impl fmt::Display for TokenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSignature => write!(f, "Can't parse function signature"),
            Self::IllegalCharacter(c) => write!(f, "Illegal character '{c}' in argument"),
            Self::UnknownToken(text) => write!(f, "Unknown token: {text}"),
        }
    }
}

/// Tokeniser error, located at the line that failed to tokenise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{location}: {kind}")]
pub struct TokenError {
    pub kind: TokenErrorKind,
    pub location: Location,
}
