//! Classes, and the identifiers used to match arguments against signatures.

use crate::{
  collections::String as SmartString,
  object::{Members, Object},
  runtime::Runtime,
};
use rustc_hash::FxHasher;
use std::{
  cell::{Ref, RefCell},
  fmt,
  hash::{Hash, Hasher},
  rc::{Rc, Weak},
};

/// Identifies a class in a signature
pub type ClassId = u64;

/// The wildcard class, which matches an argument of any class
pub const ANY_ID: ClassId = 0;

/// The module name which builtin classes are declared in
pub const BUILTIN_MODULE: &str = "";

/// The id of a class, from its name and the module which declares it.
///
/// The hash is deterministic, so ids can be stored in a blob and read back later.
#[must_use]
pub fn class_id(name: &str, module: &str) -> ClassId {
  let mut hasher = FxHasher::default();
  name.hash(&mut hasher);
  module.hash(&mut hasher);

  match hasher.finish() {
    ANY_ID => ANY_ID + 1,
    id => id,
  }
}

/// A class: a name, and the members each instance starts with.
///
/// Members are stored in order, and a name can appear more than once, in which
/// case calls to that member are dispatched on the classes of the arguments.
pub struct Class {
  id: ClassId,
  name: SmartString,
  module: SmartString,
  members: RefCell<Members>,
  runtime: RefCell<Weak<Runtime>>,
}
impl Class {
  /// Create a class declared in a module
  pub fn new(name: impl Into<SmartString>, module: impl Into<SmartString>) -> Rc<Self> {
    let (name, module) = (name.into(), module.into());

    Rc::new(Self {
      id: class_id(&name, &module),
      name,
      module,
      members: RefCell::new(Members::default()),
      runtime: RefCell::new(Weak::new()),
    })
  }

  /// Create a builtin class
  pub fn builtin(name: impl Into<SmartString>) -> Rc<Self> {
    Self::new(name, BUILTIN_MODULE)
  }

  /// The identifier used in signatures
  #[must_use]
  pub fn id(&self) -> ClassId {
    self.id
  }

  /// The name of the class
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The module the class was declared in
  #[must_use]
  pub fn module(&self) -> &str {
    &self.module
  }

  /// Add a member. If the name already exists, the member becomes polymorphic.
  pub fn add_member(&self, name: impl Into<SmartString>, value: Object) {
    self.members.borrow_mut().push(name.into(), value);
  }

  /// The members of the class
  #[must_use]
  pub fn members(&self) -> Ref<'_, Members> {
    self.members.borrow()
  }

  /// The runtime the class belongs to, once it is registered or declared by a module
  #[must_use]
  pub fn runtime(&self) -> Option<Rc<Runtime>> {
    self.runtime.borrow().upgrade()
  }

  pub(crate) fn attach(&self, runtime: Weak<Runtime>) {
    *self.runtime.borrow_mut() = runtime;
  }
}
impl fmt::Debug for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Class")
      .field("name", &self.name)
      .field("module", &self.module)
      .field("id", &format_args!("{:#018x}", self.id))
      .finish_non_exhaustive()
  }
}

/// The class of an object.
///
/// Objects can be created before their class exists (for example while the
/// builtin classes are being registered), in which case the class is looked up by
/// name the first time it is needed.
#[derive(Clone, Debug)]
pub enum ClassRef {
  /// The class is known
  Bound(Rc<Class>),
  /// Only the name of the builtin class is known
  Pending(SmartString),
}
impl ClassRef {
  /// The name of the class
  #[must_use]
  pub fn name(&self) -> &str {
    match self {
      Self::Bound(class) => class.name(),
      Self::Pending(name) => name,
    }
  }

  /// The identifier of the class
  #[must_use]
  pub fn id(&self) -> ClassId {
    match self {
      Self::Bound(class) => class.id(),
      Self::Pending(name) => class_id(name, BUILTIN_MODULE),
    }
  }
}
