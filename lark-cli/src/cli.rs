use std::path::PathBuf;

use clap::{
    builder::{styling::AnsiColor, Styles},
    crate_description, crate_version, Args, ColorChoice, Parser, Subcommand, ValueEnum, ValueHint,
};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = crate_description!(),
    color = ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::BrightMagenta.on_default().bold().underline())
        .usage(AnsiColor::BrightMagenta.on_default().bold().underline())
        .literal(AnsiColor::BrightCyan.on_default().bold())
        .placeholder(AnsiColor::BrightCyan.on_default().bold())
        .error(AnsiColor::BrightRed.on_default())
)]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Option<Mode>,

    #[command(flatten)]
    pub input: InputOptions,

    /// Alternate syntax description file
    #[arg(short, long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub syntax: Option<PathBuf>,

    /// Style description applied when rendering
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub style: Option<PathBuf>,

    /// Set the log level
    #[arg(short, long, value_name = "LEVEL", env = "LARK_LOG")]
    pub log: Option<LevelFilter>,
}

#[derive(Subcommand)]
pub enum Mode {
    /// Parse each source and render the tree back to stdout (default)
    #[command(alias = "p")]
    Parse {
        /// Output format for the parsed tree
        #[arg(short, long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,

        #[command(flatten)]
        input: InputOptions,
    },

    /// Scan each source and print the token stream
    #[command(alias = "t")]
    Tokenize {
        #[command(flatten)]
        input: InputOptions,
    },
}

#[derive(Args)]
pub struct InputOptions {
    /// Source code to parse instead of files
    #[arg(short, long, value_name = "INPUT", value_hint = ValueHint::Other)]
    pub eval: Option<String>,

    /// Read source code from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Paths to source files
    #[arg(value_name = "PATHS", value_hint = ValueHint::FilePath)]
    pub paths: Vec<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Eq, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}
