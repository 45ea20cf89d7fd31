use super::RunOptions;
use super::diagnostics::{CodeFrame, Message, Severity};

use axol_blob::{Blob, Disassembler};
use axol_interpreter::{Config, Runtime, RuntimeError, Script, lower};
use axol_syntax::{AST, TokenKind, tokenise};

use anstream::{eprint, eprintln, print, println};
use std::{
  fs,
  io::{self, Read},
  path::{Path, PathBuf},
  rc::Rc,
};

pub enum CommandStatus {
  /// Command was successful, no errors or warnings occurred
  Success,
  /// Command completed, but found problems
  Failure,
}

fn read_file(filename: &str) -> Result<String, ()> {
  let bytes = read_bytes(filename)?;
  if bytes.is_empty() {
    eprintln!("{}", Message::warning(format!("Empty file `{filename}`")));
    return Err(());
  }
  if u32::try_from(bytes.len()).is_err() {
    eprintln!("{}", Message::error("File too large - max size 4GB".into()));
    return Err(());
  }

  String::from_utf8(bytes).map_err(|_| {
    eprintln!("{}", Message::error(format!("File `{filename}` is not valid UTF-8")));
  })
}

fn read_bytes(filename: &str) -> Result<Vec<u8>, ()> {
  if filename == "-" {
    let mut buffer = Vec::new();
    return match io::stdin().lock().read_to_end(&mut buffer) {
      Ok(_) => Ok(buffer),
      Err(_) => {
        eprintln!("{}", Message::error("Problem Reading from STDIN".into()));
        Err(())
      }
    };
  }

  fs::read(filename).map_err(|_| {
    eprintln!("{}", Message::error(format!("File not found `{filename}`")));
  })
}

/// The module is named after the file
fn module_name(filename: &str) -> String {
  match Path::new(filename).file_stem() {
    Some(stem) if filename != "-" => stem.to_string_lossy().into_owned(),
    _ => "main".to_owned(),
  }
}

fn is_blob(filename: &str) -> bool {
  let extension = Config::default().blob_extension;
  Path::new(filename)
    .extension()
    .is_some_and(|found| *found == *extension)
}

fn parse(filename: &str, source: String) -> Result<AST, ()> {
  let ast = axol_syntax::parse(source);

  for warning in &ast.warnings {
    eprintln!("{}", Message::from(warning));
    eprintln!("{}\n", CodeFrame::new(filename, &ast.source, warning.span()));
  }

  if ast.is_valid() {
    Ok(ast)
  } else {
    for error in &ast.errors {
      eprintln!("{}", Message::from(error));
      eprintln!("{}", CodeFrame::new(filename, &ast.source, error.span()));
    }
    Err(())
  }
}

fn compile_ast(filename: &str, ast: &AST) -> Result<Blob, ()> {
  match axol_interpreter::compile(ast, &module_name(filename)) {
    Ok(mut blob) => {
      if filename != "-" {
        blob.set_debug_file(filename);
      }
      Ok(blob)
    }
    Err(error) => {
      eprintln!("{}", Message::from(&error));
      if let Some(span) = error.span() {
        eprintln!("{}", CodeFrame::new(filename, &ast.source, span));
      }
      Err(())
    }
  }
}

fn load_blob(filename: &str) -> Result<Blob, ()> {
  let bytes = read_bytes(filename)?;

  Blob::from_bytes(bytes).map_err(|error| {
    let body = format!("`{filename}` is not a valid blob ({error})");
    let body = format!("{body}, blobs are created with `axol compile`");
    eprintln!("{}", Message::new(Severity::Error, error.title(), body));
  })
}

fn runtime(import_paths: &[PathBuf]) -> Rc<Runtime> {
  let mut config = Config::default();
  config.import_paths.splice(0..0, import_paths.iter().cloned());
  Runtime::with_config(config)
}

fn script(filename: &str, blob: Blob, runtime: &Rc<Runtime>) -> Result<Script, ()> {
  let script = Script::from_blob(blob, runtime).map_err(|error| {
    eprintln!("{}", Message::from(&error));
  })?;

  if filename != "-"
    && let Some(directory) = Path::new(filename).parent()
  {
    script.imports().add_path(directory);
  }
  Ok(script)
}

/// Show a runtime error, with the source it happened at if it can be found
fn report_runtime_error(error: &RuntimeError, module: &str, source: Option<&str>) {
  eprintln!("{}", Message::from(error));

  if let Some(location) = error.location() {
    let file_source = (location.file.as_deref()).and_then(|file| fs::read_to_string(file).ok());

    match (file_source, source) {
      (Some(file_source), _) => {
        let title = location.file.as_deref().unwrap_or_default();
        eprintln!("{}", CodeFrame::from_debug_entry(title, &file_source, location.entry));
      }
      (None, Some(source)) if location.module.as_str() == module => {
        eprintln!("{}", CodeFrame::from_debug_entry("-", source, location.entry));
      }
      _ => {}
    }
  }

  if let Some(traceback) = error.traceback() {
    eprint!("\n{traceback}");
  }
}

pub fn run(options: &RunOptions) -> Result<CommandStatus, ()> {
  let filename = options.file.as_str();
  let source = read_file(filename)?;
  let ast = parse(filename, source)?;
  let blob = compile_ast(filename, &ast)?;

  let runtime = runtime(&options.import_paths);
  let script = script(filename, blob, &runtime)?;

  let result = match &options.function {
    Some(function) => script.run(function, &[]),
    None => script.run_main(),
  };

  match result {
    Ok(value) => {
      if options.function.is_some() && !value.is_nil() {
        println!("{value}");
      }
      Ok(CommandStatus::Success)
    }
    Err(error) => {
      report_runtime_error(&error, &module_name(filename), Some(&ast.source));
      Err(())
    }
  }
}

pub fn compile(filename: &str, output: Option<PathBuf>) -> Result<CommandStatus, ()> {
  let source = read_file(filename)?;
  let ast = parse(filename, source)?;
  let blob = compile_ast(filename, &ast)?;

  let output = output.unwrap_or_else(|| {
    let extension = Config::default().blob_extension;
    PathBuf::from(module_name(filename)).with_extension(extension)
  });
  if fs::write(&output, blob.as_bytes()).is_err() {
    eprintln!("{}", Message::error(format!("Problem writing to `{}`", output.display())));
    return Err(());
  }

  tracing::debug!(output = %output.display(), bytes = blob.as_bytes().len(), "wrote blob");
  Ok(CommandStatus::Success)
}

pub fn exec(filename: &str) -> Result<CommandStatus, ()> {
  let blob = load_blob(filename)?;
  let module = blob.module_name().to_owned();

  let runtime = runtime(&[]);
  let script = script(filename, blob, &runtime)?;

  match script.run_main() {
    Ok(_) => Ok(CommandStatus::Success),
    Err(error) => {
      report_runtime_error(&error, &module, None);
      Err(())
    }
  }
}

pub fn disassemble(filename: &str) -> Result<CommandStatus, ()> {
  let blob = if is_blob(filename) {
    load_blob(filename)?
  } else {
    let source = read_file(filename)?;
    let ast = parse(filename, source)?;
    compile_ast(filename, &ast)?
  };

  print!("{}", Disassembler::new(&blob));
  Ok(CommandStatus::Success)
}

pub fn print_tokens(filename: &str) -> Result<CommandStatus, ()> {
  let source = read_file(filename)?;
  let filename = if filename == "-" { "STDIN" } else { filename };

  println!("    ╭─[Tokens: {filename}]");
  for token in tokenise(&source) {
    print!("{:>3} │ {}", token.start, token.kind);
    if matches!(
      token.kind,
      TokenKind::Identifier
        | TokenKind::Integer
        | TokenKind::Float
        | TokenKind::String
        | TokenKind::Comment
        | TokenKind::Unknown
        | TokenKind::UnterminatedString
    ) {
      print!(" (length: {})", token.length);
    }
    println!();
  }
  println!("────╯");

  Ok(CommandStatus::Success)
}

pub fn print_ast(filename: &str) -> Result<CommandStatus, ()> {
  let source = read_file(filename)?;
  let ast = axol_syntax::parse(source);

  if !ast.is_valid() {
    for error in &ast.errors {
      eprintln!("{}", Message::from(error));
      eprintln!("{}", CodeFrame::new(filename, &ast.source, error.span()));
    }
    println!();
  }

  let filename = if filename == "-" { "STDIN" } else { filename };
  println!("╭─[Abstract Syntax Tree: {filename}]");
  print!("{ast}");
  println!("╯");

  if ast.is_valid() {
    Ok(CommandStatus::Success)
  } else {
    Ok(CommandStatus::Failure)
  }
}

pub fn print_ir(filename: &str) -> Result<CommandStatus, ()> {
  let source = read_file(filename)?;
  let ast = parse(filename, source)?;

  match lower(&ast, &module_name(filename)) {
    Ok(program) => {
      print!("{program}");
      Ok(CommandStatus::Success)
    }
    Err(error) => {
      eprintln!("{}", Message::from(&error));
      Err(())
    }
  }
}

mod repl;
pub use repl::repl;
