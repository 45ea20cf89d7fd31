//! # Module
//! A compiled unit: its blob, globals, and constant pool.

use crate::{
  callable::{Callable, NativeFunction, ScriptedFunction, Signature},
  class::Class,
  collections::{HashMap, String as SmartString},
  engine::Engine,
  error::{Location, RuntimeError},
  import::ImportTable,
  object::Object,
  runtime::Runtime,
};
use axol_blob::{Binding, Blob};
use std::{
  cell::{Cell, OnceCell, RefCell},
  fmt,
  rc::{Rc, Weak},
};

/// The name of the function which runs the top level code of a module
pub const ENTRY_POINT: &str = "__main__";

struct ModuleData {
  name: SmartString,
  runtime: Weak<Runtime>,
  blob: OnceCell<Rc<Blob>>,
  text: OnceCell<Rc<[u32]>>,
  globals: RefCell<HashMap<SmartString, Object>>,
  constants: RefCell<Vec<Object>>,
  imports: RefCell<Option<ImportTable>>,
  init_called: Cell<bool>,
}

/// A reference counted handle to a module.
///
/// A module starts as an empty shell, and becomes usable once a blob is attached,
/// which creates the globals for its functions and classes, and its constants.
#[derive(Clone)]
pub struct Module(Rc<ModuleData>);

/// A handle to a module which doesn't keep it alive
#[derive(Clone, Debug, Default)]
pub struct WeakModule(Weak<ModuleData>);
impl WeakModule {
  /// Get the module, if it still exists
  #[must_use]
  pub fn upgrade(&self) -> Option<Module> {
    self.0.upgrade().map(Module)
  }
}

impl Module {
  /// Create an empty module
  #[must_use]
  pub fn new(name: &str, runtime: &Rc<Runtime>) -> Self {
    Self(Rc::new(ModuleData {
      name: name.into(),
      runtime: Rc::downgrade(runtime),
      blob: OnceCell::new(),
      text: OnceCell::new(),
      globals: RefCell::default(),
      constants: RefCell::default(),
      imports: RefCell::default(),
      init_called: Cell::new(false),
    }))
  }

  /// Create a module from a compiled blob
  ///
  /// # Errors
  /// If the blob is malformed or inconsistent
  pub fn from_blob(blob: Blob, runtime: &Rc<Runtime>) -> Result<Self, RuntimeError> {
    let module = Self::new(blob.module_name(), runtime);
    module.set_blob(blob)?;
    Ok(module)
  }

  /// The name of the module
  #[must_use]
  pub fn name(&self) -> &str {
    &self.0.name
  }

  /// The runtime the module belongs to
  #[must_use]
  pub fn runtime(&self) -> Option<Rc<Runtime>> {
    self.0.runtime.upgrade()
  }

  /// A handle which doesn't keep the module alive
  #[must_use]
  pub fn downgrade(&self) -> WeakModule {
    WeakModule(Rc::downgrade(&self.0))
  }

  /// Are both handles to the same module?
  #[must_use]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }

  /// The blob, if one has been attached
  #[must_use]
  pub fn blob(&self) -> Option<Rc<Blob>> {
    self.0.blob.get().cloned()
  }

  /// The instruction words of the blob
  pub(crate) fn text(&self) -> Rc<[u32]> {
    self.0.text.get().cloned().unwrap_or_else(|| Rc::from([]))
  }

  /// Attach a blob, creating a global for each global function and class, and
  /// reading the constant pool.
  ///
  /// # Errors
  /// If the module already has a blob, a global is defined twice, or the blob
  /// refers to strings, symbols or classes which don't exist
  pub fn set_blob(&self, blob: Blob) -> Result<(), RuntimeError> {
    let runtime = self
      .runtime()
      .ok_or_else(|| RuntimeError::internal("runtime no longer exists"))?;

    let text: Rc<[u32]> = Rc::from(blob.text());
    if self.0.blob.set(Rc::new(blob)).is_err() {
      return Err(RuntimeError::internal(format!(
        "module `{}` already has a blob",
        self.name()
      )));
    }
    let _ = self.0.text.set(text);
    let blob = self
      .blob()
      .ok_or_else(|| RuntimeError::internal("blob was not attached"))?;

    let string = |offset: u32| {
      blob
        .string_at(offset)
        .ok_or_else(|| RuntimeError::internal(format!("no string at offset {offset}")))
    };

    let mut functions = Vec::with_capacity(blob.symbol_count() as usize);
    for index in 0..blob.symbol_count() {
      let symbol = blob
        .symbol_at(index)
        .ok_or_else(|| RuntimeError::internal(format!("malformed symbol {index}")))?;
      let name = string(symbol.name)?;
      let signature = blob
        .signature_at(symbol.signature)
        .ok_or_else(|| RuntimeError::internal(format!("`{name}` has no signature")))?;

      let function = Object::from(Callable::Scripted(Rc::new(ScriptedFunction {
        name: name.into(),
        module: self.downgrade(),
        address: symbol.address,
        locals: symbol.locals,
        signature: Signature::fixed(signature),
      })));

      if symbol.binding == Binding::Global {
        self.define(name, function.clone())?;
      }
      functions.push(function);
    }

    for index in 0..blob.type_spec_count() {
      let spec = blob
        .type_spec_at(index)
        .ok_or_else(|| RuntimeError::internal(format!("malformed type spec {index}")))?;
      let class = Class::new(string(spec.name)?, self.name());
      class.attach(Rc::downgrade(&runtime));

      for symbol in spec.symbols {
        let method = functions.get(symbol as usize).ok_or_else(|| {
          RuntimeError::internal(format!("class `{}` has no symbol {symbol}", class.name()))
        })?;
        let name = method
          .as_callable()
          .map(|callable| SmartString::from(method_name(callable.name())))
          .unwrap_or_default();
        class.add_member(name, method.clone());
      }

      self.define(class.name(), Object::from(class.clone()))?;
    }

    let mut constants = Vec::with_capacity(blob.constant_count() as usize);
    for index in 0..blob.constant_count() {
      let constant = blob
        .constant_at(index)
        .ok_or_else(|| RuntimeError::internal(format!("malformed constant {index}")))?;
      constants.push(runtime.deserialize(string(constant.class)?, string(constant.value)?)?);
    }
    *self.0.constants.borrow_mut() = constants;

    tracing::debug!(
      module = %self.name(),
      symbols = functions.len(),
      classes = blob.type_spec_count(),
      constants = blob.constant_count(),
      "attached blob"
    );
    Ok(())
  }

  fn define(&self, name: &str, value: Object) -> Result<(), RuntimeError> {
    let mut globals = self.0.globals.borrow_mut();
    if globals.contains_key(name) {
      return Err(RuntimeError::internal(format!(
        "global `{name}` is defined twice in `{}`",
        self.name()
      )));
    }

    globals.insert(name.into(), value);
    Ok(())
  }

  /// Get a global variable
  #[must_use]
  pub fn global(&self, name: &str) -> Option<Object> {
    self.0.globals.borrow().get(name).cloned()
  }

  /// Set a global variable
  pub fn set_global(&self, name: &str, value: Object) {
    let previous = self.0.globals.borrow_mut().insert(name.into(), value);
    drop(previous);
  }

  /// Add a native function as a global, named after the function
  pub fn add_native(&self, function: NativeFunction) {
    let name = SmartString::from(function.name());
    self.set_global(&name, function.into());
  }

  /// The names of the globals, sorted
  #[must_use]
  pub fn global_names(&self) -> Vec<SmartString> {
    let mut names = self.0.globals.borrow().keys().cloned().collect::<Vec<_>>();
    names.sort_unstable();
    names
  }

  pub(crate) fn constant(&self, index: u32) -> Option<Object> {
    self.0.constants.borrow().get(index as usize).cloned()
  }

  pub(crate) fn string(&self, offset: u32) -> Result<SmartString, RuntimeError> {
    (self.0.blob.get())
      .and_then(|blob| blob.string_at(offset))
      .map(SmartString::from)
      .ok_or_else(|| RuntimeError::internal(format!("no string at offset {offset}")))
  }

  /// Copy globals into another module.
  ///
  /// A mask of `*` copies every global with its own name, an empty mask copies
  /// every global as `alias.name`, and any other mask copies only the global with
  /// that name. The entry point is always copied as `alias.__main__`. Existing
  /// globals of the target are overwritten. The hook is called with each name
  /// and value copied.
  pub fn export_to(
    &self,
    target: &Self,
    mask: &str,
    alias: &str,
    mut hook: Option<&mut dyn FnMut(&str, &Object)>,
  ) {
    for name in self.global_names() {
      let Some(value) = self.global(&name) else {
        continue;
      };

      let exported = match mask {
        _ if name.as_str() == ENTRY_POINT => format!("{alias}.{name}").into(),
        "*" => name,
        "" => format!("{alias}.{name}").into(),
        mask if mask == name.as_str() => name,
        _ => continue,
      };

      if let Some(hook) = &mut hook {
        hook(&exported, &value);
      }
      target.set_global(&exported, value);
    }
  }

  /// Run the entry point of the module, if it hasn't been run before
  ///
  /// # Errors
  /// If the entry point raises an error
  pub fn init(&self, engine: &mut Engine) -> Result<(), RuntimeError> {
    if self.0.init_called.replace(true) {
      return Ok(());
    }

    match self.global(ENTRY_POINT) {
      Some(entry_point) => engine.invoke(&entry_point, &[]).map(drop),
      None => Ok(()),
    }
  }

  /// Record that the entry point has been run
  pub(crate) fn mark_initialized(&self) {
    self.0.init_called.set(true);
  }

  /// The name of the function containing an address
  #[must_use]
  pub fn function_at(&self, address: u32) -> Option<SmartString> {
    let blob = self.0.blob.get()?;

    let symbol = (0..blob.symbol_count())
      .filter_map(|index| blob.symbol_at(index))
      .filter(|symbol| symbol.address <= address)
      .max_by_key(|symbol| symbol.address)?;
    blob.string_at(symbol.name).map(SmartString::from)
  }

  /// The source location of an instruction, from the debug section
  #[must_use]
  pub fn location(&self, address: u32, debug_index: u32) -> Option<Location> {
    let blob = self.0.blob.get()?;

    Some(Location {
      module: self.0.name.clone(),
      function: self.function_at(address),
      file: (blob.debug_file())
        .filter(|file| !file.is_empty())
        .map(SmartString::from),
      entry: blob.debug_entry_at(debug_index)?,
    })
  }

  /// Give the module its own import table, which it keeps alive
  pub fn set_import_table(&self, imports: ImportTable) {
    *self.0.imports.borrow_mut() = Some(imports);
  }

  /// The import table owned by the module
  #[must_use]
  pub fn import_table(&self) -> Option<ImportTable> {
    self.0.imports.borrow().clone()
  }

  /// Release the import table owned by the module
  pub fn detach_import_table(&self) -> Option<ImportTable> {
    self.0.imports.borrow_mut().take()
  }
}
impl fmt::Debug for Module {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Module")
      .field("name", &self.0.name)
      .field("globals", &self.0.globals.borrow().len())
      .field("has_blob", &self.0.blob.get().is_some())
      .finish_non_exhaustive()
  }
}

/// The member name of a method symbol, `Class.method` is bound as `method`
fn method_name(symbol: &str) -> &str {
  symbol.rsplit_once('.').map_or(symbol, |(_, name)| name)
}
