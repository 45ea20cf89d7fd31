use super::{CommandStatus, compile_ast, parse, report_runtime_error, runtime};
use crate::diagnostics::Message;

use axol_interpreter::{ENTRY_POINT, ImportTable, Module, Script};
use axol_syntax::ast::Statement;

use anstream::{eprintln, println};
use owo_colors::OwoColorize;
use std::rc::Rc;

/// The name of the source in diagnostics
const TITLE: &str = "REPL";
/// The name of each module, as they are compiled from stdin
const MODULE: &str = "main";

/// Each entry is compiled as its own module. The globals of earlier entries are
/// copied into the next, and the modules are kept alive so functions declared in
/// earlier entries can still be called.
#[derive(Default)]
struct Session {
  modules: Vec<Module>,
  imports: ImportTable,
}

pub fn repl() -> Result<CommandStatus, ()> {
  println!("{}", crate::coloured_header());
  println!("{}", "exit using ctrl+d, or ctrl+c".dimmed());

  let runtime = runtime(&[]);
  let mut session = Session::default();

  let mut editor = rustyline::DefaultEditor::new().map_err(|error| {
    eprintln!("{}", Message::error(format!("Could not start the REPL: {error}")));
  })?;
  while let Ok(line) = editor.readline(">> ") {
    if line.trim().is_empty() {
      continue;
    }
    let _ = editor.add_history_entry(line.as_str());
    _ = run_repl_entry(&runtime, &mut session, &line);
  }

  Ok(CommandStatus::Success)
}

fn run_repl_entry(
  runtime: &Rc<axol_interpreter::Runtime>,
  session: &mut Session,
  line: &str,
) -> Result<(), ()> {
  let source = entry_source(line);
  let ast = parse(TITLE, source)?;
  let blob = compile_ast("-", &ast)?;

  let mut script = Script::from_blob(blob, runtime).map_err(|error| {
    eprintln!("{}", Message::from(&error));
  })?;
  script.set_imports(session.imports.clone());

  let module = script.module().clone();
  if let Some(previous) = session.modules.last() {
    for name in previous.global_names() {
      if name.as_str() == ENTRY_POINT || module.global(&name).is_some() {
        continue;
      }
      if let Some(value) = previous.global(&name) {
        module.set_global(&name, value);
      }
    }
  }
  session.modules.push(module);

  match script.run_main() {
    Ok(value) if value.is_nil() => Ok(()),
    Ok(value) => {
      println!("{value}");
      Ok(())
    }
    Err(error) => {
      report_runtime_error(&error, MODULE, Some(&ast.source));
      Err(())
    }
  }
}

/// A single expression is returned, so its value can be printed
fn entry_source(line: &str) -> String {
  let trimmed = line.trim_end().trim_end_matches(';');

  let candidate = format!("{trimmed};");
  let ast = axol_syntax::parse(candidate.clone());
  match ast.root_statements.as_slice() {
    [Statement::Expression(_)] if ast.is_valid() => format!("return {trimmed};"),
    _ if line.trim_end().ends_with(['}', ';']) => line.to_owned(),
    _ => candidate,
  }
}
