mod cli;

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser as ClapParser;
use colored::Colorize;
use lark_lang::{
    parse_source, Errors, Positions, Renderer, Scanner, Style, Syntax,
};
use memmap2::MmapOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Mode, OutputFormat};

fn main() -> ExitCode {
    let Cli {
        mode,
        input,
        syntax,
        style,
        log,
    } = Cli::parse();
    // The default invocation parses; subcommands carry their own inputs.
    let (tokenize, format, input) = match mode {
        None => (false, OutputFormat::Text, input),
        Some(Mode::Parse { format, input }) => (false, format, input),
        Some(Mode::Tokenize { input }) => (true, OutputFormat::Text, input),
    };

    let filter = match log {
        Some(level) => EnvFilter::default().add_directive(level.into()),
        None => EnvFilter::from_env("LARK_LOG"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let positions = Positions::new();
    let errors = Errors::new(positions.clone());

    let syntax = match &syntax {
        Some(path) => match Syntax::from_file(path, &positions, &errors) {
            Ok(syntax) => Arc::new(syntax),
            Err(error) => {
                report_io_error("syntax description", &path.display().to_string(), &error);
                return ExitCode::FAILURE;
            }
        },
        None => Syntax::built_in(&positions, &errors),
    };

    let style = match &style {
        Some(path) => match Style::from_file(path, &positions, &errors) {
            Ok(style) => style,
            Err(error) => {
                report_io_error("style description", &path.display().to_string(), &error);
                return ExitCode::FAILURE;
            }
        },
        None => Style::new(),
    };

    let mut sources: Vec<(String, String)> = Vec::new();
    if let Some(eval) = input.eval {
        sources.push(("<eval>".to_string(), eval));
    }
    if input.stdin {
        let mut text = String::new();
        if let Err(error) = io::stdin().read_to_string(&mut text) {
            report_io_error("input", "<stdin>", &error);
            return ExitCode::FAILURE;
        }
        sources.push(("<stdin>".to_string(), text));
    }
    for path in &input.paths {
        match read_file(path) {
            Ok(text) => sources.push((path.display().to_string(), text)),
            Err(error) => {
                report_io_error("source file", &path.display().to_string(), &error);
                return ExitCode::FAILURE;
            }
        }
    }
    if sources.is_empty() {
        eprintln!("{}: no input; pass file paths, --eval or --stdin", "usage".yellow().bold());
        return ExitCode::FAILURE;
    }

    for (name, text) in sources {
        info!(source = %name, bytes = text.len(), "processing");
        if tokenize {
            let mut scanner = Scanner::from_source(
                name,
                text,
                positions.clone(),
                syntax.clone(),
                errors.clone(),
            );
            loop {
                let token = scanner.next_token();
                let done = token.is_eof();
                println!("{token}");
                if done {
                    break;
                }
            }
            continue;
        }

        let tree = parse_source(name, text, &positions, syntax.clone(), &errors);
        let Some(tree) = tree else {
            continue;
        };
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let failed = match format {
            OutputFormat::Text => Renderer::new(&mut out, style.clone())
                .render(&tree)
                .and_then(|()| out.write_all(b"\n")),
            OutputFormat::Json => serde_json::to_writer_pretty(&mut out, &tree)
                .map_err(io::Error::from)
                .and_then(|()| out.write_all(b"\n")),
        };
        if let Err(error) = failed {
            report_io_error("output", "<stdout>", &error);
            return ExitCode::FAILURE;
        }
    }

    if errors.count() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Read a source file through a memory map, falling back to a plain read
/// for files that cannot be mapped (empty files, pipes).
fn read_file(path: &std::path::Path) -> io::Result<String> {
    let file = File::open(path)?;
    match unsafe { MmapOptions::new().map(&file) } {
        Ok(mmap) => Ok(String::from_utf8_lossy(&mmap).into_owned()),
        Err(_) => {
            let mut text = String::new();
            let mut file = file;
            file.read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn report_io_error(what: &str, name: &str, error: &io::Error) {
    eprintln!("{}: cannot read {what} {name}: {error}", "error".red().bold());
}
