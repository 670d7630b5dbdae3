use std::rc::Rc;

use crate::token::Location;
use crate::tokeniser::strip_comments;
use crate::ScanError;

/// Index of a line in its [`LineTree`].
pub type LineId = usize;

/// A non-empty source line with the lines indented beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine {
    pub file: Rc<str>,
    /// 1-based line number.
    pub line: usize,
    /// Number of leading whitespace characters.
    pub column: usize,
    /// Text without indentation or trailing whitespace and braces.
    /// Heredocs keep their body verbatim, joined with `\n`.
    pub content: String,
    pub children: Vec<LineId>,
}

impl ScannedLine {
    pub fn location(&self) -> Location {
        Location::new(Rc::clone(&self.file), self.line)
    }
}

/// The forest of lines scanned from one file.
///
/// Lines live in an arena and refer to their children by [`LineId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTree {
    file: Rc<str>,
    lines: Vec<ScannedLine>,
    roots: Vec<LineId>,
}

impl LineTree {
    fn new(file: Rc<str>) -> Self {
        Self {
            file,
            lines: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Top-level lines, in source order.
    pub fn roots(&self) -> &[LineId] {
        &self.roots
    }

    pub fn line(&self, id: LineId) -> &ScannedLine {
        &self.lines[id]
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn push(&mut self, parent: Option<LineId>, line: ScannedLine) -> LineId {
        let id = self.lines.len();
        self.lines.push(line);
        match parent {
            Some(parent) => self.lines[parent].children.push(id),
            None => self.roots.push(id),
        }
        id
    }
}

/// A trimmed source line before it is placed in the tree.
struct RawLine {
    line: usize,
    indent: usize,
    content: String,
}

/// One indentation level during tree construction.
struct Frame {
    indent: usize,
    /// Line the level hangs under; `None` for the top level.
    parent: Option<LineId>,
    /// Most recent line added at this level.
    last: Option<LineId>,
}

/// SCL line scanner.
///
/// Groups source lines into a tree by indentation depth. Trailing braces
/// are dropped, so brace-delimited input scans the same as indented input.
pub struct Scanner<'a> {
    source: &'a str,
    file: Rc<str>,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner; `file` is only used for locations.
    pub fn new(source: &'a str, file: &str) -> Self {
        Self {
            source,
            file: Rc::from(file),
        }
    }

    /// Scan the whole source into a line tree.
    pub fn scan(self) -> Result<LineTree, ScanError> {
        let raw = self.raw_lines()?;
        Ok(self.build(raw))
    }

    /// Split into trimmed, non-empty lines, folding heredocs into one line.
    fn raw_lines(&self) -> Result<Vec<RawLine>, ScanError> {
        let mut raw = Vec::new();
        let mut lines = self.source.lines().enumerate();

        while let Some((index, text)) = lines.next() {
            let number = index + 1;
            let trimmed = text.trim_end_matches(|c: char| matches!(c, ' ' | '\t' | '{' | '}'));
            let body = trimmed.trim_start();

            if body.is_empty() {
                continue;
            }

            let indent = trimmed.chars().take_while(|c| c.is_whitespace()).count();
            let mut content = body.to_string();

            // A marker inside a trailing `//` comment opens nothing.
            if let Some(marker) = heredoc_marker(&strip_comments(body)).map(str::to_string) {
                loop {
                    let Some((_, text)) = lines.next() else {
                        return Err(ScanError::UnterminatedHeredoc {
                            marker,
                            line: number,
                        });
                    };
                    content.push('\n');
                    content.push_str(text);
                    if text.trim() == marker {
                        break;
                    }
                }
            }

            raw.push(RawLine {
                line: number,
                indent,
                content,
            });
        }

        Ok(raw)
    }

    /// Place lines in the tree with a stack of indentation frames.
    ///
    /// Equal indent adds a sibling, deeper indent opens a frame under the
    /// previous sibling, shallower indent pops frames and retries. A line
    /// shallower than the top level rebases the top level.
    fn build(&self, raw: Vec<RawLine>) -> LineTree {
        let mut tree = LineTree::new(Rc::clone(&self.file));

        let Some(first) = raw.first() else {
            return tree;
        };

        let mut frames = vec![Frame {
            indent: first.indent,
            parent: None,
            last: None,
        }];

        for RawLine {
            line,
            indent,
            content,
        } in raw
        {
            let scanned = ScannedLine {
                file: Rc::clone(&self.file),
                line,
                column: indent,
                content,
                children: Vec::new(),
            };

            loop {
                let top = frames.len() - 1;
                let frame = &mut frames[top];

                if top == 0 && indent < frame.indent {
                    frame.indent = indent;
                }

                if indent > frame.indent {
                    if let Some(last) = frame.last {
                        frames.push(Frame {
                            indent,
                            parent: Some(last),
                            last: None,
                        });
                        continue;
                    }
                }

                if indent >= frame.indent {
                    let parent = frame.parent;
                    let id = tree.push(parent, scanned);
                    frames[top].last = Some(id);
                    break;
                }

                frames.pop();
            }
        }

        tree
    }
}

/// Scan `source` into a line tree. `file` names the source in locations.
pub fn scan(source: &str, file: &str) -> Result<LineTree, ScanError> {
    Scanner::new(source, file).scan()
}

/// The marker of a heredoc opened at the end of `text` (`<<EOF`, `<<-EOF`).
fn heredoc_marker(text: &str) -> Option<&str> {
    let start = text.rfind("<<")?;
    let marker = text[start + 2..].strip_prefix('-').unwrap_or(&text[start + 2..]);

    let mut chars = marker.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    valid.then_some(marker)
}
