use clap::Parser as _;
use scl_parser::{DiskSystem, FileSystem, MixinDoc, Parser, ParserConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;

#[derive(clap::Parser)]
#[command(name = "scl")]
#[command(about = "SCL: compile SCL configuration files to HCL")]
#[command(version)]
struct Cli {
    /// Directory searched for imports (repeatable)
    #[arg(long = "include", value_name = "DIR")]
    include_paths: Vec<PathBuf>,

    /// Variable preset in the global scope as a string, e.g. name=value (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Don't ingest environment variables as params
    #[arg(long)]
    no_env: bool,

    /// Print the mixin documentation tree instead of compiling
    #[arg(long)]
    docs: bool,

    /// With --docs, print one JSON array per file
    #[arg(long, requires = "docs")]
    json: bool,

    /// Input .scl files
    #[arg(required = true, value_name = "FILE")]
    files: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let environment = if cli.no_env {
        Vec::new()
    } else {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    };
    let config = config(&cli, environment);

    let stdout = io::stdout();
    let stderr = io::stderr();
    let ok = if cli.docs {
        cmd_docs(
            &config,
            &cli.files,
            DiskSystem,
            cli.json,
            &mut stdout.lock(),
            &mut stderr.lock(),
        )
    } else {
        cmd_compile(&config, &cli.files, DiskSystem, &mut stdout.lock(), &mut stderr.lock())
    };

    match ok {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `name=value` into a trimmed name and a quoted, trimmed value.
fn parse_param(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Unable to convert to param: {s}"))?;
    Ok((name.trim().to_string(), format!("\"{}\"", value.trim())))
}

/// Parser settings from the flags. Environment variables come first so
/// that an explicit `--param` wins.
fn config(cli: &Cli, environment: Vec<(String, String)>) -> ParserConfig {
    let mut params: Vec<(String, String)> = environment
        .into_iter()
        .map(|(name, value)| (name.trim().to_string(), format!("\"{}\"", value.trim())))
        .collect();
    params.extend(cli.params.iter().cloned());

    ParserConfig {
        include_paths: cli.include_paths.clone(),
        params,
    }
}

/// Compile each file with a fresh parser. Failures are reported and the
/// remaining files are still compiled; returns whether all succeeded.
fn cmd_compile<F: FileSystem + Clone>(
    config: &ParserConfig,
    files: &[String],
    fs: F,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> io::Result<bool> {
    let mut ok = true;

    for file in files {
        let mut parser = Parser::with_config(fs.clone(), config.clone());
        match parser.parse(file) {
            Ok(()) => write!(stdout, "/* {file} */\n{parser}\n\n")?,
            Err(e) => {
                tracing::debug!(file = %file, "parse failed");
                writeln!(stderr, "Error: Unable to parse file: {e}")?;
                ok = false;
            }
        }
    }

    Ok(ok)
}

fn cmd_docs<F: FileSystem + Clone>(
    config: &ParserConfig,
    files: &[String],
    fs: F,
    json: bool,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> io::Result<bool> {
    let mut ok = true;

    for file in files {
        let parser = Parser::with_config(fs.clone(), config.clone());
        match parser.documentation(file) {
            Ok(docs) if json => {
                serde_json::to_writer(&mut *stdout, &docs)?;
                writeln!(stdout)?;
            }
            Ok(docs) => {
                writeln!(stdout, "/* {file} */")?;
                write_docs(stdout, &docs, 0)?;
                writeln!(stdout)?;
            }
            Err(e) => {
                writeln!(stderr, "Error: Unable to read documentation: {e}")?;
                ok = false;
            }
        }
    }

    Ok(ok)
}

/// One line per mixin, `signature  [file:line]`, followed by its doc
/// comment and then its nested mixins, indented by depth.
fn write_docs(out: &mut impl Write, docs: &[MixinDoc], depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);

    for doc in docs {
        writeln!(out, "{indent}{}  [{}]", doc.signature, doc.reference)?;
        for line in doc.docs.lines() {
            let comment = format!("{indent}  // {line}");
            writeln!(out, "{}", comment.trim_end())?;
        }
        write_docs(out, &doc.children, depth + 1)?;
    }

    Ok(())
}
