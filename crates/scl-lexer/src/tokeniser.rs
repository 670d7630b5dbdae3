//! Line tokeniser.
//!
//! Classifies one scanned line as a comment, mixin declaration, function
//! call, variable assignment or plain literal, and splits argument lists
//! into literal and variable tokens.

use crate::scanner::ScannedLine;
use crate::token::{Location, Statement, Token, TokenKind};
use crate::{TokenError, TokenErrorKind};

/// Remove a trailing `//` comment that is not inside a quoted span.
///
/// Single, double and backtick quotes are tracked separately. An
/// unterminated quote protects the rest of the line.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' && q != b'`' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'/' if bytes.get(i + 1) == Some(&b'/') => return text[..i].trim().to_string(),
                _ => {}
            },
        }
        i += 1;
    }

    text.trim().to_string()
}

/// Tokenise a scanned line.
///
/// Produces a single `LineComment` or `Literal`, a `MixinDeclaration` or
/// `FunctionCall` followed by its argument tokens, or a
/// `VariableAssignment` followed by the assigned `Literal`.
pub fn tokenise(line: &ScannedLine) -> Result<Vec<Token>, TokenError> {
    let location = line.location();
    let content = line.content.as_str();

    if let Some(comment) = content.strip_prefix("//") {
        return Ok(vec![Token::new(
            TokenKind::LineComment(comment.trim().to_string()),
            location,
        )]);
    }

    // Only the first line of a heredoc can carry a comment.
    let text = match content.split_once('\n') {
        Some((head, tail)) => format!("{}\n{tail}", strip_comments(head)),
        None => strip_comments(content),
    };

    let error = |kind| TokenError {
        kind,
        location: location.clone(),
    };

    if let Some(declaration) = text.strip_prefix('@') {
        let (name, arguments) = tokenise_function(line, declaration).map_err(error)?;
        return Ok(prefixed(TokenKind::MixinDeclaration(name), arguments, &location));
    }

    if is_function_call(&text) {
        let (name, arguments) = tokenise_function(line, &text).map_err(error)?;
        return Ok(prefixed(TokenKind::FunctionCall(name), arguments, &location));
    }

    if let Some(path) = import_statement(&text) {
        let arguments = argument_tokens(path, &location).map_err(error)?;
        return Ok(prefixed(
            TokenKind::FunctionCall("import".into()),
            arguments,
            &location,
        ));
    }

    if let Some((name, value)) = assignment(&text) {
        return Ok(vec![
            Token::new(TokenKind::VariableAssignment(name.into()), location.clone()),
            Token::new(TokenKind::Literal(value.into()), location),
        ]);
    }

    Ok(vec![Token::new(TokenKind::Literal(text), location)])
}

/// Tokenise a line into the statement the parser dispatches on.
pub fn classify(line: &ScannedLine) -> Result<Statement, TokenError> {
    let mut tokens = tokenise(line)?.into_iter();

    let Some(first) = tokens.next() else {
        return Ok(Statement::Literal(String::new()));
    };

    match first.kind {
        TokenKind::LineComment(text) => Ok(Statement::Comment(text)),
        TokenKind::Literal(text) => Ok(Statement::Literal(text)),
        TokenKind::VariableAssignment(name) => {
            let value = tokens
                .next()
                .map(|t| t.kind.content().to_string())
                .unwrap_or_default();
            Ok(Statement::Assignment { name, value })
        }
        TokenKind::MixinDeclaration(name) => Ok(Statement::MixinDeclaration {
            name,
            arguments: tokens.collect(),
        }),
        TokenKind::FunctionCall(name) => Ok(Statement::FunctionCall {
            name,
            arguments: tokens.collect(),
        }),
        TokenKind::Variable(name) => Err(TokenError {
            kind: TokenErrorKind::UnknownToken(format!("${name}")),
            location: first.location,
        }),
    }
}

/// Split `name(arguments)`, `name(arguments):` or `name:` into the name and
/// the argument tokens.
pub fn tokenise_function(
    line: &ScannedLine,
    text: &str,
) -> Result<(String, Vec<Token>), TokenErrorKind> {
    let name_len = identifier_len(text);
    if name_len == 0 {
        return Err(TokenErrorKind::MalformedSignature);
    }

    let name = &text[..name_len];
    let rest = &text[name_len..];

    if rest.trim() == ":" {
        return Ok((name.to_string(), Vec::new()));
    }

    if !rest.starts_with('(') {
        return Err(TokenErrorKind::MalformedSignature);
    }

    let close = matching_paren(rest).ok_or(TokenErrorKind::MalformedSignature)?;
    let trailer = rest[close + 1..].trim();
    if !trailer.is_empty() && trailer != ":" {
        return Err(TokenErrorKind::MalformedSignature);
    }

    let location = line.location();
    let inner = &rest[1..close];
    let mut tokens = Vec::new();

    if !inner.trim().is_empty() {
        for argument in split_arguments(inner) {
            tokens.extend(argument_tokens(argument.trim(), &location)?);
        }
    }

    Ok((name.to_string(), tokens))
}

fn prefixed(head: TokenKind, arguments: Vec<Token>, location: &Location) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(arguments.len() + 1);
    tokens.push(Token::new(head, location.clone()));
    tokens.extend(arguments);
    tokens
}

/// Tokens for one argument: a literal, `$name`, or `$name=literal`.
fn argument_tokens(argument: &str, location: &Location) -> Result<Vec<Token>, TokenErrorKind> {
    if argument.is_empty() {
        return Err(TokenErrorKind::MalformedSignature);
    }

    let Some(variable) = argument.strip_prefix('$') else {
        validate_literal(argument)?;
        return Ok(vec![Token::new(
            TokenKind::Literal(argument.to_string()),
            location.clone(),
        )]);
    };

    let unknown = || TokenErrorKind::UnknownToken(argument.to_string());

    let name_len = variable_name_len(variable);
    if name_len == 0 {
        return Err(unknown());
    }

    let name = &variable[..name_len];
    let rest = variable[name_len..].trim_start();

    if rest.is_empty() {
        return Ok(vec![Token::new(
            TokenKind::Variable(name.to_string()),
            location.clone(),
        )]);
    }

    let default = rest.strip_prefix('=').map(str::trim).ok_or_else(unknown)?;
    if default.is_empty() {
        return Err(unknown());
    }
    validate_literal(default)?;

    Ok(vec![
        Token::new(TokenKind::VariableAssignment(name.to_string()), location.clone()),
        Token::new(TokenKind::Literal(default.to_string()), location.clone()),
    ])
}

/// Literal arguments are quoted strings, bracketed values, or bare words.
fn validate_literal(literal: &str) -> Result<(), TokenErrorKind> {
    let first = literal.chars().next().ok_or(TokenErrorKind::MalformedSignature)?;

    let closing = match first {
        '"' | '\'' | '`' => Some(first),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    };

    if let Some(closing) = closing {
        return if literal.len() >= 2 && literal.ends_with(closing) {
            Ok(())
        } else {
            Err(TokenErrorKind::MalformedSignature)
        };
    }

    match literal
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '+')))
    {
        Some(c) => Err(TokenErrorKind::IllegalCharacter(c)),
        None => Ok(()),
    }
}

/// Split an argument list on commas outside quotes and brackets.
fn split_arguments(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q != '`' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(&inner[start..]);
    parts
}

/// Byte index of the `)` closing the `(` that `text` starts with.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q != '`' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (c == ')').then_some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// `name(` or a bare `name:`.
fn is_function_call(text: &str) -> bool {
    let len = identifier_len(text);
    if len == 0 {
        return false;
    }
    let rest = &text[len..];
    rest.starts_with('(') || rest == ":"
}

/// `import "path"`, without parentheses.
fn import_statement(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("import")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let path = rest.trim();
    path.starts_with(|c: char| matches!(c, '"' | '\'' | '$')).then_some(path)
}

/// `$name = value`
fn assignment(text: &str) -> Option<(&str, &str)> {
    let variable = text.strip_prefix('$')?;
    let name_len = variable_name_len(variable);
    if name_len == 0 {
        return None;
    }

    let value = variable[name_len..].trim_start().strip_prefix('=')?;
    if value.starts_with('=') {
        return None;
    }

    let value = value.trim();
    (!value.is_empty()).then_some((&variable[..name_len], value))
}

fn identifier_len(text: &str) -> usize {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map_or(text.len(), |(i, _)| i)
}

fn variable_name_len(text: &str) -> usize {
    text.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len())
}
