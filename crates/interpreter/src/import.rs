//! # Imports
//! Finding modules by name.

use crate::{
  collections::{HashMap, String as SmartString},
  compiler,
  error::{ErrorKind, RuntimeError},
  module::Module,
  runtime::Runtime,
};
use axol_blob::Blob;
use std::{
  cell::RefCell,
  fs,
  path::{Path, PathBuf},
  rc::Rc,
};

#[derive(Debug, Default)]
struct Imports {
  cache: HashMap<SmartString, Module>,
  scope: HashMap<SmartString, Module>,
  paths: Vec<PathBuf>,
}

/// Resolves module names to modules.
///
/// A name is looked up in order: modules already imported, modules added to the
/// table, the runtime's builtin modules, and finally files in the search paths.
/// Each module is only loaded once per table.
#[derive(Clone, Debug, Default)]
pub struct ImportTable(Rc<RefCell<Imports>>);
impl ImportTable {
  /// Create an empty import table
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Make a module importable by its name
  pub fn add(&self, module: Module) {
    let name = SmartString::from(module.name());
    self.0.borrow_mut().scope.insert(name, module);
  }

  /// Search a directory for modules, before the configured search paths
  pub fn add_path(&self, path: impl Into<PathBuf>) {
    self.0.borrow_mut().paths.push(path.into());
  }

  /// Has a module already been imported?
  #[must_use]
  pub fn is_cached(&self, name: &str) -> bool {
    self.0.borrow().cache.contains_key(name)
  }

  /// Find a module, loading it if it hasn't been imported before
  ///
  /// # Errors
  /// If the module can't be found, or it fails to compile
  pub fn open(&self, runtime: &Rc<Runtime>, name: &str) -> Result<Module, RuntimeError> {
    if let Some(module) = self.0.borrow().cache.get(name) {
      tracing::trace!(module = name, "import from cache");
      return Ok(module.clone());
    }

    let scoped = self.0.borrow().scope.get(name).cloned();
    let module = match scoped.or_else(|| runtime.builtin(name)) {
      Some(module) => module,
      None => self.load(runtime, name)?,
    };

    self.0.borrow_mut().cache.insert(name.into(), module.clone());
    Ok(module)
  }

  fn load(&self, runtime: &Rc<Runtime>, name: &str) -> Result<Module, RuntimeError> {
    let config = runtime.config();
    let paths = (self.0.borrow().paths.iter())
      .chain(&config.import_paths)
      .cloned()
      .collect::<Vec<_>>();

    for directory in paths {
      let source = directory.join(format!("{name}.{}", config.extension));
      if source.is_file() {
        tracing::debug!(module = name, path = %source.display(), "compiling module");
        return compile_file(runtime, name, &source);
      }

      let blob = directory.join(format!("{name}.{}", config.blob_extension));
      if blob.is_file() {
        tracing::debug!(module = name, path = %blob.display(), "loading blob");
        let bytes = fs::read(&blob).map_err(|error| import_error(name, error))?;
        let blob = Blob::from_bytes(bytes).map_err(|error| import_error(name, error))?;
        return Module::from_blob(blob, runtime);
      }
    }

    Err(RuntimeError::new(ErrorKind::NoFile(name.into())))
  }
}

fn compile_file(runtime: &Rc<Runtime>, name: &str, path: &Path) -> Result<Module, RuntimeError> {
  let source = fs::read_to_string(path).map_err(|error| import_error(name, error))?;

  let ast = axol_syntax::parse(source);
  for warning in &ast.warnings {
    tracing::warn!(module = name, %warning, "parse warning");
  }
  if let Some(error) = ast.errors.first() {
    return Err(import_error(name, error));
  }

  let mut blob = compiler::compile(&ast, name).map_err(|error| import_error(name, error))?;
  blob.set_debug_file(&path.display().to_string());
  Module::from_blob(blob, runtime)
}

fn import_error(module: &str, error: impl ToString) -> RuntimeError {
  RuntimeError::new(ErrorKind::Import {
    module: module.into(),
    message: error.to_string(),
  })
}
