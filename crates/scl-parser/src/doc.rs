//! Mixin documentation.
//!
//! Collects every mixin declared in a file, with its signature and the
//! `//` comment block written directly above it. Nothing is expanded.

use scl_lexer::{classify, LineId, LineTree, Statement};
use serde::Serialize;

use crate::mixin::signature;
use crate::Error;

/// A documented mixin and the mixins declared inside its body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MixinDoc {
    pub name: String,
    pub file: String,
    pub line: usize,
    /// `file:line`
    pub reference: String,
    /// `@name($a, $b=default)`
    pub signature: String,
    pub docs: String,
    pub children: MixinDocs,
}

pub type MixinDocs = Vec<MixinDoc>;

/// Mixin declarations among `ids` and below them.
///
/// Declarations inside a plain block are listed at the level of the block
/// itself; declarations inside a mixin body become its children.
pub fn collect(tree: &LineTree, ids: &[LineId]) -> Result<MixinDocs, Error> {
    let mut docs = MixinDocs::new();

    for (position, &id) in ids.iter().enumerate() {
        let line = tree.line(id);
        match classify(line)? {
            Statement::MixinDeclaration { name, arguments } => docs.push(MixinDoc {
                signature: signature(&name, &arguments),
                name,
                file: tree.file().to_string(),
                line: line.line,
                reference: line.location().to_string(),
                docs: comment_above(tree, ids, position).unwrap_or_default(),
                children: collect(tree, &line.children)?,
            }),
            Statement::Literal(_) | Statement::Comment(_) if !line.children.is_empty() => {
                docs.extend(collect(tree, &line.children)?);
            }
            _ => {}
        }
    }

    Ok(docs)
}

/// The `//` lines directly above `siblings[position]`, joined with `\n`.
///
/// The block stops at the first sibling that is not a comment or that
/// leaves a gap in line numbers.
pub fn comment_above(tree: &LineTree, siblings: &[LineId], position: usize) -> Option<String> {
    let mut expected = tree.line(siblings[position]).line;
    let mut lines = Vec::new();

    for &id in siblings[..position].iter().rev() {
        let line = tree.line(id);
        if line.line + 1 != expected {
            break;
        }
        let Some(text) = line.content.strip_prefix("//") else {
            break;
        };
        lines.push(text.trim());
        expected = line.line;
    }

    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    Some(lines.join("\n"))
}
