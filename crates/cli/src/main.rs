//! # Axol
//! A dynamically typed scripting language, compiled to a portable bytecode blob
//! and run by a stack based interpreter with multiple dispatch.

#![allow(clippy::print_stdout)]

mod commands;
mod diagnostics;

use clap::builder::styling::{AnsiColor, Style, Styles};
use clap::{Args, Parser, Subcommand};
use commands::CommandStatus;
use owo_colors::*;
use std::{path::PathBuf, process};
use tracing_subscriber::{EnvFilter, fmt};

const STYLES: Styles = Styles::styled()
  .usage(Style::new().italic())
  .header(AnsiColor::BrightYellow.on_default().bold());

/// The environment variable which sets the log filter
const LOG_ENV: &str = "AXOL_LOG";

fn coloured_header() -> String {
  format!(
    "{} {}",
    "Axol".fg::<owo_colors::colors::css::HotPink>().bold(),
    concat!("(v", env!("CARGO_PKG_VERSION"), ")").italic().dimmed()
  )
}

fn about() -> String {
  format!(
    "{}\nA dynamically typed scripting language, with a bytecode interpreter.",
    coloured_header()
  )
}

#[derive(Parser)]
#[clap(
  name = "axol",
  version,
  about = about(),
  styles = STYLES,
  disable_help_subcommand = true,
)]
enum App {
  /// Runs a source file
  Run(RunOptions),

  /// Compiles a source file into a blob
  Compile {
    /// The file to compile
    file: String,
    /// Where to write the blob [default: the file with the blob extension]
    #[clap(short, long)]
    output: Option<PathBuf>,
  },

  /// Runs a compiled blob
  Exec {
    /// The blob to run
    file: String,
  },

  /// Displays the instructions of a source file or blob
  Disasm {
    /// The source file or blob
    file: String,
  },

  /// Prints debugging information
  Print {
    #[command(subcommand)]
    command: PrintCommand,
  },

  /// Start an interactive Read-Eval-Print Loop (REPL)
  Repl,
}

#[derive(Args)]
struct RunOptions {
  /// The file to run
  file: String,
  /// Call a global function after the top level code has run
  #[clap(long)]
  function: Option<String>,
  /// Also search a directory for modules to import
  #[clap(long = "import-path", value_name = "DIR")]
  import_paths: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum PrintCommand {
  /// Displays the tokens in the file
  Tokens {
    /// The file to print
    file: String,
  },
  /// Displays the Abstract Syntax Tree
  Ast {
    /// The file to print
    file: String,
  },
  /// Displays the intermediate representation
  Ir {
    /// The file to print
    file: String,
  },
}

fn main() -> process::ExitCode {
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
  fmt()
    .compact()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();

  let args = App::parse();

  let result = match args {
    App::Run(options) => commands::run(&options),
    App::Compile { file, output } => commands::compile(&file, output),
    App::Exec { file } => commands::exec(&file),
    App::Disasm { file } => commands::disassemble(&file),
    App::Print { command } => match command {
      PrintCommand::Tokens { file } => commands::print_tokens(&file),
      PrintCommand::Ast { file } => commands::print_ast(&file),
      PrintCommand::Ir { file } => commands::print_ir(&file),
    },
    App::Repl => commands::repl(),
  };

  match result {
    Ok(CommandStatus::Success) => process::ExitCode::from(0),
    Ok(CommandStatus::Failure) => process::ExitCode::from(1),
    Err(()) => process::ExitCode::from(2),
  }
}
