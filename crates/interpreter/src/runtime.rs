//! # Runtime
//! The registries shared by every module and engine: classes, prelude globals,
//! members every object has, and builtin modules.

use crate::{
  class::{Class, ClassRef},
  collections::{HashMap, String as SmartString},
  config::Config,
  error::{ErrorKind, RuntimeError},
  module::Module,
  object::{Members, Object},
  stdlib,
};
use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

thread_local! {
  static DETACHED: Rc<Runtime> = Runtime::new();
}

/// The state shared between modules.
///
/// Created by an explicit startup routine, which registers the primitive classes,
/// the prelude, and the builtin modules.
#[derive(Debug)]
pub struct Runtime {
  this: Weak<Runtime>,
  config: Config,
  classes: RefCell<HashMap<SmartString, Rc<Class>>>,
  prelude: RefCell<HashMap<SmartString, Object>>,
  universal: RefCell<Members>,
  builtins: RefCell<HashMap<SmartString, Module>>,
}
impl Runtime {
  /// Create a runtime with the default configuration and the standard library
  #[must_use]
  pub fn new() -> Rc<Self> {
    Self::with_config(Config::default())
  }

  /// Create a runtime with the standard library
  #[must_use]
  pub fn with_config(config: Config) -> Rc<Self> {
    let runtime = Rc::new_cyclic(|this| Self {
      this: this.clone(),
      config,
      classes: RefCell::default(),
      prelude: RefCell::default(),
      universal: RefCell::default(),
      builtins: RefCell::default(),
    });

    stdlib::register(&runtime);
    tracing::debug!(
      classes = runtime.classes.borrow().len(),
      builtins = runtime.builtins.borrow().len(),
      "runtime started"
    );

    runtime
  }

  /// The runtime for objects whose class isn't attached to one, shared by the thread
  ///
  /// # Errors
  /// If the thread is exiting, and the runtime has been dropped
  pub(crate) fn detached() -> Result<Rc<Self>, RuntimeError> {
    DETACHED
      .try_with(Rc::clone)
      .map_err(|_| RuntimeError::internal("no runtime while the thread exits"))
  }

  /// The configuration
  #[must_use]
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Add a class to the registry
  ///
  /// # Errors
  /// If a class with the same name is already registered
  pub fn register_class(&self, class: Rc<Class>) -> Result<(), RuntimeError> {
    let mut classes = self.classes.borrow_mut();
    if classes.contains_key(class.name()) {
      return Err(RuntimeError::internal(format!(
        "class `{}` is already registered",
        class.name()
      )));
    }

    class.attach(self.this.clone());
    classes.insert(class.name().into(), class);
    Ok(())
  }

  /// Get a registered class by name
  #[must_use]
  pub fn class(&self, name: &str) -> Option<Rc<Class>> {
    self.classes.borrow().get(name).cloned()
  }

  /// Associate an object with its builtin class, if it only knows the name
  pub fn bind(&self, object: &Object) {
    if let ClassRef::Pending(name) = object.class_ref()
      && let Some(class) = self.class(&name)
    {
      object.bind_class(class);
    }
  }

  /// Add a member which every object has, after its own and its class's members
  pub fn add_universal(&self, name: &str, value: Object) {
    self.universal.borrow_mut().push(name, value);
  }

  /// The universal members with a name
  #[must_use]
  pub fn universal(&self, name: &str) -> Vec<Object> {
    self.universal.borrow().get(name).cloned().collect()
  }

  /// Every entry for a member name of an object, including the universal members
  #[must_use]
  pub fn entries(&self, receiver: &Object, name: &str) -> Vec<Object> {
    self.bind(receiver);

    let mut entries = receiver.declared(name);
    entries.extend(self.universal(name));
    entries
  }

  /// Read a member of an object, which may be a universal member
  ///
  /// # Errors
  /// If there is no member with the name, or it is polymorphic
  pub fn member(&self, receiver: &Object, name: &str) -> Result<Object, RuntimeError> {
    match self.entries(receiver, name).as_slice() {
      [] => Err(RuntimeError::no_member(&receiver.class_name(), name)),
      [member] => Ok(member.clone()),
      [..] => Err(RuntimeError::polymorphic(&receiver.class_name(), name)),
    }
  }

  /// Find the first entry for a member name whose signature matches the arguments.
  ///
  /// The object's own members are checked before its class's members, and the
  /// universal members last.
  #[must_use]
  pub fn resolve(&self, receiver: &Object, name: &str, arguments: &[Object]) -> Option<Object> {
    for argument in arguments {
      self.bind(argument);
    }

    (self.entries(receiver, name).into_iter()).find(|entry| {
      entry
        .as_callable()
        .is_some_and(|callable| callable.matches(arguments))
    })
  }

  /// Add a global which is visible in every module
  pub fn add_prelude(&self, name: &str, value: Object) {
    self.prelude.borrow_mut().insert(name.into(), value);
  }

  /// Get a global from the prelude
  #[must_use]
  pub fn prelude(&self, name: &str) -> Option<Object> {
    self.prelude.borrow().get(name).cloned()
  }

  /// Register a module which can be imported by name without a file
  ///
  /// # Errors
  /// If a builtin module with the same name already exists
  pub fn add_builtin(&self, module: Module) -> Result<(), RuntimeError> {
    let mut builtins = self.builtins.borrow_mut();
    if builtins.contains_key(module.name()) {
      return Err(RuntimeError::internal(format!(
        "builtin module `{}` is already registered",
        module.name()
      )));
    }

    builtins.insert(module.name().into(), module);
    Ok(())
  }

  /// Get a builtin module by name
  #[must_use]
  pub fn builtin(&self, name: &str) -> Option<Module> {
    self.builtins.borrow().get(name).cloned()
  }

  /// Create an object from its serialized form in a blob's constant pool
  ///
  /// # Errors
  /// If the class isn't registered, or the value can't be read as the class
  pub fn deserialize(&self, class: &str, value: &str) -> Result<Object, RuntimeError> {
    let Some(class) = self.class(class) else {
      return Err(RuntimeError::new(ErrorKind::Class(format!(
        "constant of unknown class `{class}`"
      ))));
    };

    let invalid = || {
      RuntimeError::internal(format!(
        "`{value}` is not a valid `{}` constant",
        class.name()
      ))
    };
    let object = match class.name() {
      "nil" => Object::nil(),
      "bool" => Object::from(value.parse::<bool>().map_err(|_| invalid())?),
      "int" => Object::from(value.parse::<i64>().map_err(|_| invalid())?),
      "float" => Object::from(value.parse::<f64>().map_err(|_| invalid())?),
      "string" => Object::from(value),
      _ => return Err(invalid()),
    };

    object.bind_class(class);
    Ok(object)
  }
}
