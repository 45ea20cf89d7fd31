//! # Script
//! Compile a source file or load a blob, and run its functions.

use crate::{
  compiler::{CompileError, compile},
  engine::Engine,
  error::RuntimeError,
  import::ImportTable,
  module::{ENTRY_POINT, Module},
  object::Object,
  runtime::Runtime,
};
use axol_blob::{Blob, BlobError};
use axol_syntax::{ParseError, parse};
use std::{fs, io, path::Path, rc::Rc};

/// An error whilst loading or running a script
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
  /// The file couldn't be read
  #[error("could not read `{path}`: {error}")]
  Io {
    /// The path of the file
    path: String,
    /// What went wrong
    #[source]
    error: io::Error,
  },
  /// The source has a syntax error
  #[error(transparent)]
  Parse(#[from] ParseError),
  /// The source couldn't be compiled
  #[error(transparent)]
  Compile(#[from] CompileError),
  /// The blob is malformed
  #[error(transparent)]
  Blob(#[from] BlobError),
  /// The script raised an error
  #[error(transparent)]
  Runtime(#[from] RuntimeError),
}
impl ScriptError {
  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> String {
    match self {
      Self::Io { .. } => "Could Not Read File".to_owned(),
      Self::Parse(error) => error.title(),
      Self::Compile(error) => error.title().to_owned(),
      Self::Blob(error) => error.title().to_owned(),
      Self::Runtime(error) => error.title().to_owned(),
    }
  }

  /// The body of the error message describing what has gone wrong
  #[must_use]
  pub fn message(&self) -> String {
    match self {
      Self::Parse(error) => error.message(),
      Self::Compile(error) => error.message(),
      Self::Runtime(error) => error.message(),
      Self::Io { .. } | Self::Blob(_) => self.to_string(),
    }
  }
}

/// A compiled module, ready to be run.
///
/// # Examples
/// ```
/// use axol_interpreter::{Runtime, Script};
///
/// let runtime = Runtime::new();
/// let script = Script::from_source("main", "return 1 + 2;".to_owned(), &runtime).unwrap();
/// let result = script.run_main().unwrap();
///
/// assert_eq!(result.as_int(), Some(3));
/// ```
#[derive(Debug)]
pub struct Script {
  runtime: Rc<Runtime>,
  module: Module,
  imports: ImportTable,
}
impl Script {
  /// Compile source code as a module
  ///
  /// # Errors
  /// If the source has a syntax error, or can't be compiled
  pub fn from_source(
    name: &str,
    source: String,
    runtime: &Rc<Runtime>,
  ) -> Result<Self, ScriptError> {
    let blob = compile_source(name, source)?;
    Self::from_blob(blob, runtime)
  }

  /// Compile a source file as a module, named after the file.
  ///
  /// Modules in the same directory as the file can be imported.
  ///
  /// # Errors
  /// If the file can't be read, has a syntax error, or can't be compiled
  pub fn from_file(path: &Path, runtime: &Rc<Runtime>) -> Result<Self, ScriptError> {
    let source = fs::read_to_string(path).map_err(|error| ScriptError::Io {
      path: path.display().to_string(),
      error,
    })?;
    let name = (path.file_stem())
      .map_or_else(|| "main".into(), |stem| stem.to_string_lossy());

    let mut blob = compile_source(&name, source)?;
    blob.set_debug_file(&path.display().to_string());

    let script = Self::from_blob(blob, runtime)?;
    if let Some(directory) = path.parent() {
      script.imports.add_path(directory);
    }
    Ok(script)
  }

  /// Load a compiled blob as a module
  ///
  /// # Errors
  /// If the blob is inconsistent
  pub fn from_blob(blob: Blob, runtime: &Rc<Runtime>) -> Result<Self, ScriptError> {
    let module = Module::from_blob(blob, runtime)?;
    let imports = ImportTable::new();
    module.set_import_table(imports.clone());

    Ok(Self {
      runtime: runtime.clone(),
      module,
      imports,
    })
  }

  /// The compiled module
  #[must_use]
  pub fn module(&self) -> &Module {
    &self.module
  }

  /// The runtime the script runs in
  #[must_use]
  pub fn runtime(&self) -> &Rc<Runtime> {
    &self.runtime
  }

  /// The table modules are imported through
  #[must_use]
  pub fn imports(&self) -> &ImportTable {
    &self.imports
  }

  /// Import modules through a different table, so imports can be shared between scripts
  pub fn set_imports(&mut self, imports: ImportTable) {
    self.module.set_import_table(imports.clone());
    self.imports = imports;
  }

  /// Create an engine to run the script with
  #[must_use]
  pub fn engine(&self) -> Engine {
    Engine::with_imports(self.runtime.clone(), self.imports.clone())
  }

  /// Call a global function of the module.
  ///
  /// Unless the entry point is being called, it is run first if it hasn't been.
  ///
  /// # Errors
  /// If the function doesn't exist, or raises an error
  pub fn run(&self, name: &str, arguments: &[Object]) -> Result<Object, RuntimeError> {
    let mut engine = self.engine();

    if name == ENTRY_POINT {
      self.module.mark_initialized();
    } else {
      self.module.init(&mut engine)?;
    }

    engine.run(&self.module, name, arguments)
  }

  /// Run the top level code of the module
  ///
  /// # Errors
  /// If the code raises an error
  pub fn run_main(&self) -> Result<Object, RuntimeError> {
    self.run(ENTRY_POINT, &[])
  }
}

fn compile_source(name: &str, source: String) -> Result<Blob, ScriptError> {
  let ast = parse(source);
  for warning in &ast.warnings {
    tracing::warn!(module = name, %warning, "parse warning");
  }
  if let Some(error) = ast.errors.first() {
    return Err(error.clone().into());
  }

  Ok(compile(&ast, name)?)
}
