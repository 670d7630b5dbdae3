//! Lexical scopes.
//!
//! Scopes live in an arena owned by one parse and point at their parent by
//! id. Lookups walk outward until the root. Scopes opened for a block or a
//! mixin invocation are released when it finishes, which truncates the
//! arena back to that point.

use std::collections::HashMap;
use std::rc::Rc;

use crate::mixin::Mixin;
use crate::{InterpolationError, ResolutionError, ScopeError};

/// Index of a scope in its [`Scopes`] arena.
pub type ScopeId = usize;

/// A named string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    parent: Option<ScopeId>,
    variables: HashMap<String, Variable>,
    mixins: HashMap<String, Rc<Mixin>>,
}

#[derive(Debug)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    pub const ROOT: ScopeId = 0;

    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id].parent
    }

    /// Open a scope whose parent is `source` and whose own variables and
    /// mixins start as a copy of `source`'s.
    pub fn clone_scope(&mut self, source: ScopeId) -> ScopeId {
        let copy = Scope {
            parent: Some(source),
            ..self.scopes[source].clone()
        };
        self.scopes.push(copy);
        self.scopes.len() - 1
    }

    /// Drop `id` and every scope opened after it. The root is never dropped.
    pub fn release(&mut self, id: ScopeId) {
        if id > Self::ROOT {
            self.scopes.truncate(id);
        }
    }

    /// Set a variable in `id` itself; outer scopes are untouched.
    pub fn set_variable(&mut self, id: ScopeId, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let variable = Variable {
            name: name.clone(),
            value: value.into(),
        };
        self.scopes[id].variables.insert(name, variable);
    }

    pub fn variable(&self, id: ScopeId, name: &str) -> Option<&str> {
        let mut current = Some(id);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(variable) = scope.variables.get(name) {
                return Some(&variable.value);
            }
            current = scope.parent;
        }
        None
    }

    pub fn set_mixin(&mut self, id: ScopeId, mixin: Mixin) {
        self.scopes[id]
            .mixins
            .insert(mixin.name.clone(), Rc::new(mixin));
    }

    pub fn mixin(&self, id: ScopeId, name: &str) -> Result<Rc<Mixin>, ResolutionError> {
        let mut current = Some(id);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(mixin) = scope.mixins.get(name) {
                return Ok(Rc::clone(mixin));
            }
            current = scope.parent;
        }
        Err(ResolutionError::UnknownMixin(name.to_string()))
    }

    /// Substitute `$name` and `${name}` references visible from `id`.
    ///
    /// - `$$` runs are kept as-is and stop the name that follows them
    /// - `\$` and `` \` `` produce a literal `$` and backtick; other
    ///   backslash sequences pass through untouched
    /// - backtick spans are copied raw without the backticks
    ///
    /// Unknown variables are substituted with nothing. Scanning carries on
    /// after a failure and the first failure is reported together with the
    /// partial output.
    pub fn interpolate_literal(&self, id: ScopeId, text: &str) -> Result<String, InterpolationError> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut error: Option<ScopeError> = None;
        let mut fail = |e: ScopeError| {
            error.get_or_insert(e);
        };
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '\\' => match chars.get(i + 1).copied() {
                    Some(c @ ('$' | '`')) => {
                        out.push(c);
                        i += 2;
                    }
                    Some('\\') => {
                        out.push_str("\\\\");
                        i += 2;
                    }
                    _ => {
                        out.push('\\');
                        i += 1;
                    }
                },
                '`' => match chars[i + 1..].iter().position(|&c| c == '`') {
                    Some(len) => {
                        out.extend(&chars[i + 1..i + 1 + len]);
                        i += len + 2;
                    }
                    None => {
                        out.extend(&chars[i + 1..]);
                        fail(ScopeError::UnterminatedBacktick);
                        i = chars.len();
                    }
                },
                '$' => {
                    let run = chars[i..].iter().take_while(|&&c| c == '$').count();
                    if run > 1 {
                        out.extend(&chars[i..i + run]);
                        i += run;
                        continue;
                    }

                    let braced = chars.get(i + 1) == Some(&'{');
                    let start = if braced { i + 2 } else { i + 1 };
                    let len = name_len(&chars[start..]);
                    let name: String = chars[start..start + len].iter().collect();

                    // A `$` not followed by a name is plain text.
                    if name.is_empty() {
                        out.push('$');
                        i += 1;
                        continue;
                    }

                    let end = start + len;
                    if braced && chars.get(end) != Some(&'}') {
                        out.extend(&chars[i..end]);
                        fail(ScopeError::UnclosedBrace(name));
                        i = end;
                        continue;
                    }

                    match self.variable(id, &name) {
                        Some(value) => out.push_str(value),
                        None => fail(ScopeError::UnknownVariable(name)),
                    }
                    i = if braced { end + 1 } else { end };
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        match error {
            Some(error) => Err(InterpolationError {
                error,
                partial: out,
            }),
            None => Ok(out),
        }
    }
}

fn name_len(chars: &[char]) -> usize {
    chars
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
        .count()
}
