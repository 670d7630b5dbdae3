//! Mixin expansion.
//!
//! Walks a scanned file line by line with a current scope:
//!
//! - literals are interpolated and emitted; a literal with children opens a
//!   block in a cloned scope
//! - `$name = value` sets a variable and emits `name = value`
//! - `@name(...)` declares a mixin over its children, emitting nothing
//! - `import "pattern"` visits every matching file in the current scope
//! - `name(...)` expands a mixin in place

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use scl_codegen::{render, Node};
use scl_lexer::{
    classify, scan, LineId, LineTree, Location, ScannedLine, Statement, Token, TokenErrorKind,
    TokenKind,
};
use tracing::{debug, trace};

use crate::doc::{self, MixinDocs};
use crate::fs::FileSystem;
use crate::mixin::{declared_arguments, Mixin};
use crate::scope::{ScopeId, Scopes};
use crate::{Error, ErrorKind, ResolutionError};

/// Settings applied to every parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Directories searched for imports after the importing file's own.
    pub include_paths: Vec<PathBuf>,
    /// Variables set in the root scope before parsing, in order.
    pub params: Vec<(String, String)>,
}

/// SCL parser.
///
/// Each call to [`Parser::parse`] starts from a fresh root scope seeded
/// with the configured params and replaces the previous output.
pub struct Parser<F> {
    fs: F,
    config: ParserConfig,
    output: Vec<Node>,
}

impl<F: FileSystem> Parser<F> {
    pub fn new(fs: F) -> Self {
        Self::with_config(fs, ParserConfig::default())
    }

    pub fn with_config(fs: F, config: ParserConfig) -> Self {
        Self {
            fs,
            config,
            output: Vec::new(),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn add_include_path(&mut self, dir: impl Into<PathBuf>) {
        self.config.include_paths.push(dir.into());
    }

    /// Preset a root-scope variable. The value is used as written, so
    /// string values should carry their own quotes.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.config.params.push((name.into(), value.into()));
    }

    /// Expand `file`. On failure no output is kept.
    pub fn parse(&mut self, file: &str) -> Result<(), Error> {
        self.output.clear();
        debug!(
            file,
            include_paths = self.config.include_paths.len(),
            params = self.config.params.len(),
            "parsing"
        );

        let mut expander = Expander {
            fs: &self.fs,
            include_paths: &self.config.include_paths,
            scopes: Scopes::new(),
        };
        for (name, value) in &self.config.params {
            expander
                .scopes
                .set_variable(Scopes::ROOT, name.as_str(), value.as_str());
        }

        let tree = load(&self.fs, file)?;
        let mut output = Vec::new();
        expander.visit(&tree, tree.roots(), Scopes::ROOT, &mut output)?;

        self.output = output;
        Ok(())
    }

    /// Expanded output of the last successful parse.
    pub fn nodes(&self) -> &[Node] {
        &self.output
    }

    /// Rendered HCL of the last successful parse.
    pub fn output(&self) -> String {
        render(&self.output)
    }

    /// Mixins declared in `file` with their signatures and doc comments.
    /// Imports are not followed and nothing is expanded.
    pub fn documentation(&self, file: &str) -> Result<MixinDocs, Error> {
        let tree = load(&self.fs, file)?;
        doc::collect(&tree, tree.roots())
    }
}

impl<F> fmt::Display for Parser<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.output))
    }
}

/// Read and scan one file.
fn load<F: FileSystem>(fs: &F, path: &str) -> Result<Rc<LineTree>, Error> {
    let io_error = |source: io::Error| Error::Io {
        path: path.to_string(),
        source,
    };

    let (mut reader, _) = fs.open(Path::new(path)).map_err(io_error)?;
    let mut source = String::new();
    reader.read_to_string(&mut source).map_err(io_error)?;

    let tree = scan(&source, path).map_err(|source| Error::Scan {
        file: path.to_string(),
        source,
    })?;
    trace!(file = path, lines = tree.len(), "scanned");
    Ok(Rc::new(tree))
}

/// State of one parse: the scope arena and where to look for imports.
struct Expander<'a, F> {
    fs: &'a F,
    include_paths: &'a [PathBuf],
    scopes: Scopes,
}

impl<F: FileSystem> Expander<'_, F> {
    fn visit(
        &mut self,
        tree: &Rc<LineTree>,
        ids: &[LineId],
        scope: ScopeId,
        out: &mut Vec<Node>,
    ) -> Result<(), Error> {
        for (position, &id) in ids.iter().enumerate() {
            let line = tree.line(id);

            match classify(line)? {
                // Lines indented under a comment belong to the comment's level.
                Statement::Comment(_) => self.visit(tree, &line.children, scope, out)?,
                Statement::Literal(text) => self.literal(tree, line, &text, scope, out)?,
                Statement::Assignment { name, value } => {
                    if !line.children.is_empty() {
                        return Err(Error::at(
                            line.location(),
                            ErrorKind::UnexpectedBody(format!("Assignment to ${name}")),
                        ));
                    }
                    let value = self.interpolate(scope, &value, line)?;
                    out.push(Node::Line(format!("{name} = {value}")));
                    self.scopes.set_variable(scope, name, value);
                }
                Statement::MixinDeclaration { name, arguments } => {
                    let arguments = declared_arguments(&arguments)
                        .map_err(|e| Error::at(line.location(), ErrorKind::Declaration(e)))?;
                    debug!(mixin = %name, location = %line.location(), "declared mixin");

                    self.scopes.set_mixin(
                        scope,
                        Mixin {
                            name,
                            tree: Rc::clone(tree),
                            declaration: id,
                            arguments,
                            doc: doc::comment_above(tree, ids, position),
                            scope,
                        },
                    );
                }
                Statement::FunctionCall { name, arguments } if name == "import" => {
                    self.import(line, &arguments, scope, out)?;
                }
                Statement::FunctionCall { name, arguments } => {
                    self.call(line, &name, &arguments, scope, out)?;
                }
            }
        }

        Ok(())
    }

    fn literal(
        &mut self,
        tree: &Rc<LineTree>,
        line: &ScannedLine,
        text: &str,
        scope: ScopeId,
        out: &mut Vec<Node>,
    ) -> Result<(), Error> {
        let text = self.interpolate(scope, text, line)?;

        if line.children.is_empty() {
            out.push(Node::leaf(text));
            return Ok(());
        }

        let block = self.scopes.clone_scope(scope);
        let mut children = Vec::new();
        let result = self.visit(tree, &line.children, block, &mut children);
        self.scopes.release(block);
        result?;

        out.push(Node::block(text, children));
        Ok(())
    }

    fn call(
        &mut self,
        line: &ScannedLine,
        name: &str,
        arguments: &[Token],
        scope: ScopeId,
        out: &mut Vec<Node>,
    ) -> Result<(), Error> {
        let location = line.location();
        let resolution =
            |e: ResolutionError| Error::at(location.clone(), ErrorKind::Resolution(e));

        let mixin = self.scopes.mixin(scope, name).map_err(resolution)?;
        if !line.children.is_empty() {
            return Err(resolution(ResolutionError::CallWithBody(name.to_string())));
        }

        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut tokens = arguments.iter();
        while let Some(token) = tokens.next() {
            match &token.kind {
                TokenKind::Literal(text) => positional.push(self.interpolate(scope, text, line)?),
                TokenKind::Variable(variable) => {
                    let value = self.scopes.variable(scope, variable).ok_or_else(|| {
                        resolution(ResolutionError::UndeclaredVariable(variable.clone()))
                    })?;
                    positional.push(value.to_string());
                }
                TokenKind::VariableAssignment(argument) => {
                    let value = tokens.next().map(|t| t.kind.content()).unwrap_or_default();
                    named.push((argument.clone(), self.interpolate(scope, value, line)?));
                }
                other => {
                    return Err(Error::at(
                        location.clone(),
                        ErrorKind::Token(TokenErrorKind::UnknownToken(other.content().to_string())),
                    ))
                }
            }
        }

        let required = mixin.required();
        let got = positional.len() + named.len();
        if got < required || got > mixin.arguments.len() {
            return Err(resolution(ResolutionError::WrongArity {
                name: name.to_string(),
                required,
                got,
            }));
        }

        trace!(mixin = name, location = %location, got, "expanding mixin");
        let invocation = self.scopes.clone_scope(mixin.scope);
        let result = match self.bind(&mixin, invocation, positional, named, &location) {
            Ok(()) => self
                .visit(&mixin.tree, mixin.body(), invocation, out)
                .map_err(|e| e.within(location)),
            Err(e) => Err(e),
        };
        self.scopes.release(invocation);
        result
    }

    /// Set the mixin's arguments as variables of the invocation scope.
    fn bind(
        &mut self,
        mixin: &Mixin,
        invocation: ScopeId,
        positional: Vec<String>,
        named: Vec<(String, String)>,
        location: &Location,
    ) -> Result<(), Error> {
        let resolution =
            |e: ResolutionError| Error::at(location.clone(), ErrorKind::Resolution(e));

        let mut values: Vec<Option<String>> = vec![None; mixin.arguments.len()];
        for (slot, value) in values.iter_mut().zip(positional) {
            *slot = Some(value);
        }
        for (argument, value) in named {
            let Some(index) = mixin.arguments.iter().position(|a| a.name == argument) else {
                return Err(resolution(ResolutionError::UnknownArgument {
                    name: mixin.name.clone(),
                    argument,
                }));
            };
            if values[index].is_some() {
                return Err(resolution(ResolutionError::BoundTwice {
                    name: mixin.name.clone(),
                    argument,
                }));
            }
            values[index] = Some(value);
        }

        for (argument, value) in mixin.arguments.iter().zip(values) {
            let value = match (value, &argument.default) {
                (Some(value), _) => value,
                // Defaults may refer to earlier arguments.
                (None, Some(default)) => self
                    .interpolate(invocation, default, mixin.declaration_line())
                    .map_err(|e| e.within(location.clone()))?,
                (None, None) => {
                    return Err(resolution(ResolutionError::MissingArgument {
                        name: mixin.name.clone(),
                        argument: argument.name.clone(),
                    }))
                }
            };
            self.scopes
                .set_variable(invocation, argument.name.as_str(), value);
        }

        Ok(())
    }

    fn import(
        &mut self,
        line: &ScannedLine,
        arguments: &[Token],
        scope: ScopeId,
        out: &mut Vec<Node>,
    ) -> Result<(), Error> {
        let location = line.location();

        if !line.children.is_empty() {
            return Err(Error::at(location, ErrorKind::UnexpectedBody("Import".into())));
        }

        let [argument] = arguments else {
            return Err(Error::at(
                location,
                ErrorKind::Resolution(ResolutionError::WrongArity {
                    name: "import".into(),
                    required: 1,
                    got: arguments.len(),
                }),
            ));
        };

        let raw = match &argument.kind {
            TokenKind::Variable(name) => self
                .scopes
                .variable(scope, name)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::at(
                        location.clone(),
                        ErrorKind::Resolution(ResolutionError::UndeclaredVariable(name.clone())),
                    )
                })?,
            other => self.interpolate(scope, other.content(), line)?,
        };
        let pattern = unquote(&raw);

        let paths = self.resolve(&location.file, pattern).map_err(|source| {
            Error::Io {
                path: pattern.to_string(),
                source,
            }
            .within(location.clone())
        })?;
        if paths.is_empty() {
            return Err(Error::at(
                location,
                ErrorKind::NoFilesFound {
                    pattern: pattern.to_string(),
                },
            ));
        }

        for path in paths {
            let path = path.to_string_lossy();
            debug!(import = %path, location = %location, "importing");

            let tree = load(self.fs, &path).map_err(|e| e.within(location.clone()))?;
            self.visit(&tree, tree.roots(), scope, out)
                .map_err(|e| e.within(location.clone()))?;
        }

        Ok(())
    }

    /// Files matching `pattern`: first next to the importing file, then in
    /// each include path. The first location with a match wins.
    fn resolve(&self, importer: &str, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let candidates: Vec<PathBuf> = if Path::new(pattern).is_absolute() {
            vec![PathBuf::from(pattern)]
        } else {
            let base = Path::new(importer).parent().unwrap_or_else(|| Path::new(""));
            std::iter::once(base.join(pattern))
                .chain(self.include_paths.iter().map(|dir| dir.join(pattern)))
                .collect()
        };

        for candidate in candidates {
            let mut found = self.fs.glob(&candidate.to_string_lossy())?;
            if !found.is_empty() {
                found.sort();
                trace!(pattern, matched = found.len(), candidate = %candidate.display(), "resolved import");
                return Ok(found);
            }
        }

        Ok(Vec::new())
    }

    fn interpolate(&self, scope: ScopeId, text: &str, line: &ScannedLine) -> Result<String, Error> {
        self.scopes
            .interpolate_literal(scope, text)
            .map_err(|e| Error::at(line.location(), ErrorKind::Scope(e.error)))
    }
}

/// Strip one pair of matching surrounding quotes.
fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return inner;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemorySystem;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Helper: expand `main.scl` among `files` and return the output.
    fn expand_files(files: &[(&str, &str)]) -> Result<String, Error> {
        let fs = files
            .iter()
            .fold(MemorySystem::new(), |fs, (path, content)| fs.with_file(*path, *content));
        let mut parser = Parser::new(fs);
        parser.parse("main.scl")?;
        Ok(parser.to_string())
    }

    fn expand(source: &str) -> String {
        expand_files(&[("main.scl", source)]).unwrap()
    }

    /// Helper: the error message produced by expanding `source`.
    fn failure(source: &str) -> String {
        expand_files(&[("main.scl", source)])
            .unwrap_err()
            .to_string()
    }

    // =========================================================================
    // Literals and blocks
    // =========================================================================

    #[test]
    fn test_plain_hcl_passes_through() {
        assert_eq!(
            expand("# comment\nblock {\n  value = 1\n}\n"),
            "# comment\nblock {\n  value = 1\n}"
        );
    }

    #[test]
    fn test_indented_blocks() {
        assert_eq!(
            expand("outer \"a\"\n  inner\n    x = 1\n  y = [1, 2]\n"),
            "outer \"a\" {\n  inner {\n    x = 1\n  }\n  y = [1, 2]\n}"
        );
    }

    #[test]
    fn test_bare_header_becomes_empty_block() {
        assert_eq!(expand("inner \"no\"\nvalue = 1\n"), "inner \"no\" {}\nvalue = 1");
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(expand("// note\na = 1 // trailing\n"), "a = 1");
    }

    #[test]
    fn test_lines_under_a_comment_are_kept() {
        assert_eq!(
            expand("// note\n  kept = 1\nc = 3\n"),
            "kept = 1\nc = 3"
        );
    }

    #[test]
    fn test_heredoc_passes_through() {
        assert_eq!(
            expand("config\n  data = <<EOF\nline one\n  line two\nEOF\n"),
            "config {\n  data = <<EOF\nline one\n  line two\nEOF\n}"
        );
    }

    // =========================================================================
    // Variables
    // =========================================================================

    #[test]
    fn test_unknown_variable() {
        assert_eq!(
            failure("block\n  value = $myVar\n"),
            "[main.scl:2] Unknown variable '$myVar'"
        );
    }

    #[test]
    fn test_assignment_sets_and_emits() {
        assert_eq!(
            expand("$name = \"web\"\n$port = 8080\nservice $name\n  url = \"http://localhost:${port}/\"\n"),
            "name = \"web\"\nport = 8080\nservice \"web\" {\n  url = \"http://localhost:8080/\"\n}"
        );
    }

    #[test]
    fn test_assignment_with_body() {
        assert_eq!(
            failure("$a = 1\n  b = 2\nc = 3\n"),
            "[main.scl:1] Assignment to $a can't have a body"
        );
    }

    #[test]
    fn test_sibling_scopes_do_not_leak() {
        let source = "\
$env = \"base\"
a
  $env = \"a\"
  name = $env
b
  name = $env
";
        assert_eq!(
            expand(source),
            "env = \"base\"\na {\n  env = \"a\"\n  name = \"a\"\n}\nb {\n  name = \"base\"\n}"
        );
    }

    #[test]
    fn test_params_seed_root_scope() {
        let fs = MemorySystem::new().with_file("main.scl", "region = $region\nzone = $zone\n");
        let config = ParserConfig {
            params: vec![("region".into(), "\"eu\"".into())],
            ..ParserConfig::default()
        };

        let mut parser = Parser::with_config(fs, config);
        parser.set_param("zone", "\"b\"");
        parser.parse("main.scl").unwrap();

        assert_eq!(parser.output(), "region = \"eu\"\nzone = \"b\"");
    }

    // =========================================================================
    // Mixins
    // =========================================================================

    #[test]
    fn test_mixin_call() {
        let source = "\
@field($name,$label)
  field $name {
    label = $label
  }
field(\"x\",\"y\")
";
        assert_eq!(expand(source), "field \"x\" {\n  label = \"y\"\n}");
    }

    #[test]
    fn test_optional_and_named_arguments() {
        let source = "\
@server($name, $port=80, $tls=false)
  server $name
    port = $port
    tls = $tls
server(\"a\")
server(\"b\", 8080)
server(\"c\", $tls=true)
";
        assert_eq!(
            expand(source),
            "server \"a\" {\n  port = 80\n  tls = false\n}\n\
server \"b\" {\n  port = 8080\n  tls = false\n}\n\
server \"c\" {\n  port = 80\n  tls = true\n}"
        );
    }

    #[test]
    fn test_default_refers_to_earlier_argument() {
        let source = "@pair($a, $b=\"$a\")\n  a = $a\n  b = $b\npair(1)\n";
        assert_eq!(expand(source), "a = 1\nb = \"1\"");
    }

    #[test]
    fn test_variable_argument() {
        let source = "$size = 3\n@sized($n)\n  size = $n\nsized($size)\n";
        assert_eq!(expand(source), "size = 3\nsize = 3");
    }

    #[test]
    fn test_lexical_scoping() {
        let source = "\
$who = \"outer\"
@greet()
  hello = $who
block
  $who = \"inner\"
  greet()
";
        assert_eq!(
            expand(source),
            "who = \"outer\"\nblock {\n  who = \"inner\"\n  hello = \"outer\"\n}"
        );
    }

    #[test]
    fn test_mixins_calling_mixins() {
        let source = "\
@inner($v)
  value = $v
@outer($v)
  wrap
    inner($v)
outer(1)
outer(2)
";
        assert_eq!(
            expand(source),
            "wrap {\n  value = 1\n}\nwrap {\n  value = 2\n}"
        );
    }

    #[test]
    fn test_colon_call_without_arguments() {
        assert_eq!(expand("@tags()\n  tag = true\nresource\n  tags:\n"), "resource {\n  tag = true\n}");
    }

    #[test]
    fn test_mixin_declared_in_block_is_local() {
        assert_eq!(
            failure("block\n  @local()\n    x = 1\n  local()\nlocal()\n"),
            "[main.scl:5] Mixin local not declared in this scope"
        );
    }

    #[test]
    fn test_mixin_captures_doc_comment() {
        let fs = MemorySystem::new().with_file("main.scl", "// Says hi\n@hi()\n  x = 1\n");
        let tree = load(&fs, "main.scl").unwrap();
        let mut expander = Expander {
            fs: &fs,
            include_paths: &[],
            scopes: Scopes::new(),
        };
        let mut out = Vec::new();
        expander
            .visit(&tree, tree.roots(), Scopes::ROOT, &mut out)
            .unwrap();

        let mixin = expander.scopes.mixin(Scopes::ROOT, "hi").unwrap();
        assert_eq!(mixin.doc.as_deref(), Some("Says hi"));
        assert!(out.is_empty());
    }

    // =========================================================================
    // Mixin errors
    // =========================================================================

    #[test]
    fn test_undeclared_mixin() {
        assert_eq!(
            failure("missing()\n"),
            "[main.scl:1] Mixin missing not declared in this scope"
        );
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(
            failure("@pair($a, $b)\n  x = $a\n\npair(1, 2, 3)\n"),
            "[main.scl:4] Wrong number of arguments for pair (required 2, got 3)"
        );
    }

    #[test]
    fn test_undeclared_variable_argument() {
        assert_eq!(
            failure("@m($a)\n  x = $a\nm($myArg)\n"),
            "[main.scl:3] Variable $myArg is not declared in this scope"
        );
    }

    #[test]
    fn test_missing_and_unknown_named_arguments() {
        assert_eq!(
            failure("@m($a, $b=1)\n  x = $a\nm($b=2)\n"),
            "[main.scl:3] Missing argument $a for mixin m"
        );
        assert_eq!(
            failure("@m($a, $b=1)\n  x = $a\nm(1, $c=2)\n"),
            "[main.scl:3] Unknown argument $c for mixin m"
        );
    }

    #[test]
    fn test_argument_bound_twice() {
        assert_eq!(
            failure("@m($a, $b=1)\n  x = $a\n  y = $b\nm(1, $a=2)\n"),
            "[main.scl:4] Argument $a for mixin m bound twice"
        );
        assert_eq!(
            failure("@m($a, $b=1)\n  x = $a\nm($b=2, $b=3)\n"),
            "[main.scl:3] Argument $b for mixin m bound twice"
        );
    }

    #[test]
    fn test_call_with_body() {
        assert_eq!(
            failure("@m()\n  x = 1\nm()\n  y = 2\n"),
            "[main.scl:3] Mixin call m can't have a body"
        );
    }

    #[test]
    fn test_invalid_declaration() {
        assert_eq!(
            failure("@m($a=1, $required)\n  x = 1\n"),
            "[main.scl:1] Argument declaration 1 [required]: A required argument can't follow an optional argument"
        );
    }

    #[test]
    fn test_error_in_mixin_body_is_wrapped() {
        assert_eq!(
            failure("@m()\n  x = $nope\n\nm()\n"),
            "[main.scl:4] [main.scl:2] Unknown variable '$nope'"
        );
    }

    #[test]
    fn test_token_error_is_located() {
        assert_eq!(
            failure("a = 1\nbroken(\n"),
            "[main.scl:2] Can't parse function signature"
        );
    }

    // =========================================================================
    // Imports
    // =========================================================================

    #[test]
    fn test_import_relative_glob() {
        let mut parser = Parser::new(
            MemorySystem::new()
                .with_file("conf/main.scl", "import \"lib/*.scl\"\nuse_a()\n")
                .with_file("conf/lib/b.scl", "b = 2\n")
                .with_file("conf/lib/a.scl", "@use_a()\n  a = 1\n"),
        );
        parser.parse("conf/main.scl").unwrap();
        assert_eq!(parser.output(), "b = 2\na = 1");
    }

    #[test]
    fn test_import_from_include_path() {
        let fs = MemorySystem::new()
            .with_file("main.scl", "import(\"shared.scl\")\n")
            .with_file("vendor/shared.scl", "shared = true\n");
        let mut parser = Parser::new(fs);
        parser.add_include_path("vendor");
        parser.parse("main.scl").unwrap();
        assert_eq!(parser.output(), "shared = true");
    }

    #[test]
    fn test_import_shares_scope() {
        let output = expand_files(&[
            ("main.scl", "$name = \"app\"\nimport \"lib.scl\"\nlabel = $label\n"),
            ("lib.scl", "$label = $name\n"),
        ])
        .unwrap();
        assert_eq!(output, "name = \"app\"\nlabel = \"app\"\nlabel = \"app\"");
    }

    #[test]
    fn test_import_variable_argument() {
        let output = expand_files(&[
            ("main.scl", "$lib = \"lib.scl\"\nimport($lib)\n"),
            ("lib.scl", "x = 1\n"),
        ])
        .unwrap();
        assert_eq!(output, "lib = \"lib.scl\"\nx = 1");
    }

    #[test]
    fn test_import_missing() {
        assert_eq!(
            failure("a = 1\nimport \"missing/path.scl\"\n"),
            "[main.scl:2] Can't read missing/path.scl: no files found"
        );
    }

    #[test]
    fn test_import_with_body() {
        let err = expand_files(&[
            ("main.scl", "import \"lib.scl\"\n  x = 1\n"),
            ("lib.scl", "y = 2\n"),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "[main.scl:1] Import can't have a body");
    }

    #[test]
    fn test_error_in_import_is_wrapped() {
        let err = expand_files(&[
            ("main.scl", "import \"inner.scl\"\n"),
            ("inner.scl", "block\n  broken(\n"),
        ])
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "[main.scl:1] [inner.scl:2] Can't parse function signature"
        );
        assert!(matches!(err.root_cause(), Error::Located { .. }));
    }

    // =========================================================================
    // Files
    // =========================================================================

    #[test]
    fn test_unterminated_heredoc() {
        assert_eq!(
            failure("value = <<EOF\nline\n"),
            "Can't scan main.scl: Heredoc 'EOF' (started line 1) not terminated"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = Parser::new(MemorySystem::new()).parse("this/doesnt/exist").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't read this/doesnt/exist: no such file or directory"
        );
    }

    #[test]
    fn test_failed_parse_clears_output() {
        let fs = MemorySystem::new()
            .with_file("good.scl", "a = 1\n")
            .with_file("bad.scl", "a = $nope\n");
        let mut parser = Parser::new(fs);

        parser.parse("good.scl").unwrap();
        assert_eq!(parser.output(), "a = 1");

        assert!(parser.parse("bad.scl").is_err());
        assert_eq!(parser.output(), "");
        assert!(parser.nodes().is_empty());
    }

    #[test]
    fn test_documentation() {
        let fs = MemorySystem::new().with_file(
            "main.scl",
            "// Outer mixin\n@outer($a)\n  @inner($b=1)\n    x = $b\n  inner()\nouter(1)\n",
        );
        let parser = Parser::new(fs);
        let docs = parser.documentation("main.scl").unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].signature, "@outer($a)");
        assert_eq!(docs[0].docs, "Outer mixin");
        assert_eq!(docs[0].reference, "main.scl:2");
        assert_eq!(docs[0].children[0].signature, "@inner($b=1)");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a.scl\""), "a.scl");
        assert_eq!(unquote("'a.scl'"), "a.scl");
        assert_eq!(unquote("a.scl"), "a.scl");
        assert_eq!(unquote("\""), "\"");
    }

    proptest! {
        #[test]
        fn prop_mixin_expansion_is_deterministic(a in "[a-z0-9]{1,8}", b in "[a-z0-9]{1,8}") {
            let source = format!(
                "@pair($x, $y)\n  pair \"$x\"\n    other = \"$y\"\npair({a}, {b})\n"
            );
            let first = expand(&source);
            prop_assert_eq!(&first, &expand(&source));
            prop_assert_eq!(first, format!("pair \"{a}\" {{\n  other = \"{b}\"\n}}"));
        }
    }
}
