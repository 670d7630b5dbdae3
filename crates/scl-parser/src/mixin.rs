use std::collections::HashSet;
use std::rc::Rc;

use scl_lexer::{LineId, LineTree, ScannedLine, Token, TokenKind};

use crate::scope::ScopeId;
use crate::{DeclarationError, DeclarationReason};

/// A declared mixin argument. Arguments with a default are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub default: Option<String>,
}

/// A reusable, parameterised block.
///
/// The body is shared with the tree it was scanned from, so a mixin stays
/// callable after the file that declared it has been fully walked.
#[derive(Debug, Clone)]
pub struct Mixin {
    pub name: String,
    pub tree: Rc<LineTree>,
    /// The `@name(...)` line; its children are the body.
    pub declaration: LineId,
    pub arguments: Vec<Argument>,
    /// Text of the `//` comments directly above the declaration.
    pub doc: Option<String>,
    /// Scope the mixin was declared in; invocations start from a clone of it.
    pub scope: ScopeId,
}

impl Mixin {
    pub fn declaration_line(&self) -> &ScannedLine {
        self.tree.line(self.declaration)
    }

    pub fn body(&self) -> &[LineId] {
        &self.declaration_line().children
    }

    /// Number of arguments without a default.
    pub fn required(&self) -> usize {
        self.arguments.iter().filter(|a| a.default.is_none()).count()
    }
}

/// Validate the argument tokens of a `@name(...)` line.
///
/// Required arguments come first, each name appears once, and bare
/// literals are not allowed.
pub fn declared_arguments(tokens: &[Token]) -> Result<Vec<Argument>, DeclarationError> {
    let mut arguments: Vec<Argument> = Vec::new();
    let mut seen = HashSet::new();
    let mut tokens = tokens.iter();

    while let Some(token) = tokens.next() {
        let index = arguments.len();
        let reject = |name: &str, reason| DeclarationError {
            index,
            name: name.to_string(),
            reason,
        };

        let argument = match &token.kind {
            TokenKind::Variable(name) => {
                if arguments.iter().any(|a| a.default.is_some()) {
                    return Err(reject(name, DeclarationReason::RequiredAfterOptional));
                }
                Argument {
                    name: name.clone(),
                    default: None,
                }
            }
            TokenKind::VariableAssignment(name) => {
                let default = tokens
                    .next()
                    .map(|t| t.kind.content().to_string())
                    .unwrap_or_default();
                Argument {
                    name: name.clone(),
                    default: Some(default),
                }
            }
            other => {
                return Err(reject(
                    other.content().trim_matches('"'),
                    DeclarationReason::UnexpectedLiteral,
                ))
            }
        };

        if !seen.insert(argument.name.clone()) {
            return Err(reject(&argument.name, DeclarationReason::Duplicate));
        }
        arguments.push(argument);
    }

    Ok(arguments)
}

/// `@name($a, $b=default)` as written, from the declaration tokens.
pub fn signature(name: &str, tokens: &[Token]) -> String {
    let mut parts = Vec::new();
    let mut tokens = tokens.iter();

    while let Some(token) = tokens.next() {
        match &token.kind {
            TokenKind::Variable(n) => parts.push(format!("${n}")),
            TokenKind::VariableAssignment(n) => {
                let default = tokens.next().map(|t| t.kind.content()).unwrap_or_default();
                parts.push(format!("${n}={default}"));
            }
            other => parts.push(other.content().to_string()),
        }
    }

    format!("@{name}({})", parts.join(", "))
}
