//! # Objects
//! The universal runtime value.
//!
//! An [`Object`] is a reference counted handle to a value, its class, and a set of
//! members. A member name can be bound more than once, and calls to such a
//! polymorphic member are dispatched by matching the arguments against the
//! signature of each entry in order. A weak handle shares the identity of the value
//! but doesn't keep it alive.

use crate::{
  callable::{Callable, NativeFunction},
  class::{Class, ClassId, ClassRef},
  collections::String as SmartString,
  engine::{Engine, StackFrame},
  error::RuntimeError,
  runtime::Runtime,
};
use std::{
  cell::{Cell, RefCell},
  fmt,
  rc::{Rc, Weak},
};

/// Names of members with a special meaning
pub mod names {
  /// `+`
  pub const ADD: &str = "__add__";
  /// `-`
  pub const SUBTRACT: &str = "__sub__";
  /// `*`
  pub const MULTIPLY: &str = "__mul__";
  /// `/`
  pub const DIVIDE: &str = "__div__";
  /// `%`
  pub const REMAINDER: &str = "__mod__";
  /// `==`
  pub const EQUAL: &str = "__eq__";
  /// `!=`
  pub const NOT_EQUAL: &str = "__ne__";
  /// `<`
  pub const LESS: &str = "__lt__";
  /// `<=`
  pub const LESS_EQUAL: &str = "__le__";
  /// `>`
  pub const GREATER: &str = "__gt__";
  /// `>=`
  pub const GREATER_EQUAL: &str = "__ge__";
  /// Unary `-`
  pub const NEGATE: &str = "__neg__";
  /// `!`
  pub const NOT: &str = "__not__";
  /// Called when an object which isn't a function is called
  pub const CALL: &str = "__call__";
  /// Called on a new instance with the arguments of the constructor
  pub const INIT: &str = "__init__";
  /// Called when the last strong reference to an instance is dropped
  pub const FINALIZER: &str = "__del__";
  /// The name of the class of an object
  pub const CLASSNAME: &str = "__classname__";
  /// Converts an object to a string for `str` and `print`
  pub const STRING: &str = "__str__";
}

/// The payload of an object
#[derive(Clone, Debug, Default)]
pub enum Value {
  /// No value
  #[default]
  Nil,
  /// A boolean
  Bool(bool),
  /// A 64-bit signed integer
  Int(i64),
  /// A 64-bit float
  Float(f64),
  /// An immutable string
  String(Rc<str>),
  /// A function
  Callable(Callable),
  /// A class, which constructs instances when called
  Class(Rc<Class>),
  /// An instance of a class, whose state is its members
  Instance,
  /// Saved interpreter state, only found on the engine's stack
  Frame(Rc<StackFrame>),
}

/// Member names bound to objects, in the order they were added.
///
/// A name can be bound more than once.
#[derive(Clone, Debug, Default)]
pub struct Members(Vec<(SmartString, Object)>);
impl Members {
  /// Add an entry, keeping any existing entries with the same name
  pub fn push(&mut self, name: impl Into<SmartString>, value: Object) {
    self.0.push((name.into(), value));
  }

  /// The entries with a name
  pub fn get<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Object> + 'a {
    (self.0.iter())
      .filter(move |(entry, _)| entry == name)
      .map(|(_, value)| value)
  }

  /// How many entries have a name
  #[must_use]
  pub fn count(&self, name: &str) -> usize {
    self.get(name).count()
  }

  /// Iterate over all the entries
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Object)> {
    self.0.iter().map(|(name, value)| (name.as_str(), value))
  }

  /// The number of entries
  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Are there no entries?
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Set the single entry of a name, returning the value it replaced
  fn replace(&mut self, name: &str, value: Object) -> Option<Object> {
    match self.0.iter_mut().find(|(entry, _)| entry == name) {
      Some((_, slot)) => Some(std::mem::replace(slot, value)),
      None => {
        self.push(name, value);
        None
      }
    }
  }
}

struct ObjectData {
  class: RefCell<ClassRef>,
  value: Value,
  members: RefCell<Members>,
  finalized: Cell<bool>,
}

#[derive(Clone)]
enum Handle {
  Strong(Rc<ObjectData>),
  Weak(Weak<ObjectData>),
}

/// A reference counted runtime value.
///
/// Cloning a strong object adds a reference, cloning a weak object doesn't. When
/// the last strong reference to an instance is dropped, its `__del__` member is
/// called (at most once). A weak reference to a value which has been dropped
/// behaves as `nil`.
#[derive(Clone)]
pub struct Object {
  handle: Handle,
}

/// Creating objects
impl Object {
  /// Create an object with a class and value
  #[must_use]
  pub fn new(class: ClassRef, value: Value) -> Self {
    Self {
      handle: Handle::Strong(Rc::new(ObjectData {
        class: RefCell::new(class),
        value,
        members: RefCell::new(Members::default()),
        finalized: Cell::new(false),
      })),
    }
  }

  /// Create an object of a builtin class, which is looked up when first needed
  #[must_use]
  pub fn builtin(class: &str, value: Value) -> Self {
    Self::new(ClassRef::Pending(class.into()), value)
  }

  /// The `nil` object
  #[must_use]
  pub fn nil() -> Self {
    Self::builtin("nil", Value::Nil)
  }

  /// Create an instance of a class, with a copy of each of the class's members
  #[must_use]
  pub fn instance(class: &Rc<Class>) -> Self {
    let object = Self::new(ClassRef::Bound(class.clone()), Value::Instance);
    if let Some(data) = object.data() {
      *data.members.borrow_mut() = class.members().clone();
    }
    object
  }

  /// Create a callable object with several overloads, which is dispatched on the
  /// arguments it is called with
  #[must_use]
  pub fn overloaded(overloads: impl IntoIterator<Item = NativeFunction>) -> Self {
    let object = Self::builtin("function", Value::Instance);
    for overload in overloads {
      object.add_polymorphic(names::CALL, overload.into());
    }
    object
  }

  fn data(&self) -> Option<Rc<ObjectData>> {
    match &self.handle {
      Handle::Strong(data) => Some(data.clone()),
      Handle::Weak(data) => data.upgrade(),
    }
  }
}

/// References
impl Object {
  /// Is it a weak reference?
  #[must_use]
  pub fn is_weak(&self) -> bool {
    matches!(self.handle, Handle::Weak(_))
  }

  /// A weak reference to the same value
  #[must_use]
  pub fn downgrade(&self) -> Self {
    let handle = match &self.handle {
      Handle::Strong(data) => Handle::Weak(Rc::downgrade(data)),
      Handle::Weak(data) => Handle::Weak(data.clone()),
    };
    Self { handle }
  }

  /// A strong reference to the same value, if it still exists
  #[must_use]
  pub fn upgrade(&self) -> Option<Self> {
    Some(Self {
      handle: Handle::Strong(self.data()?),
    })
  }

  /// Are both handles to the same value?
  #[must_use]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    let pointer = |object: &Self| match &object.handle {
      Handle::Strong(data) => Rc::as_ptr(data),
      Handle::Weak(data) => data.as_ptr(),
    };
    std::ptr::eq(pointer(self), pointer(other))
  }

  /// The number of strong references to the value
  #[must_use]
  pub fn strong_count(&self) -> usize {
    match &self.handle {
      Handle::Strong(data) => Rc::strong_count(data),
      Handle::Weak(data) => data.strong_count(),
    }
  }
}

/// Values and classes
impl Object {
  /// The payload of the object
  #[must_use]
  pub fn value(&self) -> Value {
    self.data().map(|data| data.value.clone()).unwrap_or_default()
  }

  /// Is it `nil`?
  #[must_use]
  pub fn is_nil(&self) -> bool {
    self.data().is_none_or(|data| matches!(data.value, Value::Nil))
  }

  /// Get the value if it is a boolean
  #[must_use]
  pub fn as_bool(&self) -> Option<bool> {
    match self.data()?.value {
      Value::Bool(value) => Some(value),
      _ => None,
    }
  }

  /// Get the value if it is an integer
  #[must_use]
  pub fn as_int(&self) -> Option<i64> {
    match self.data()?.value {
      Value::Int(value) => Some(value),
      _ => None,
    }
  }

  /// Get the value if it is a float
  #[must_use]
  pub fn as_float(&self) -> Option<f64> {
    match self.data()?.value {
      Value::Float(value) => Some(value),
      _ => None,
    }
  }

  /// Get the value if it is a string
  #[must_use]
  pub fn as_str(&self) -> Option<Rc<str>> {
    match &self.data()?.value {
      Value::String(value) => Some(value.clone()),
      _ => None,
    }
  }

  /// Get the function if it is one
  #[must_use]
  pub fn as_callable(&self) -> Option<Callable> {
    match &self.data()?.value {
      Value::Callable(callable) => Some(callable.clone()),
      _ => None,
    }
  }

  /// Get the class if it is one
  #[must_use]
  pub fn as_class(&self) -> Option<Rc<Class>> {
    match &self.data()?.value {
      Value::Class(class) => Some(class.clone()),
      _ => None,
    }
  }

  pub(crate) fn as_frame(&self) -> Option<Rc<StackFrame>> {
    match &self.data()?.value {
      Value::Frame(frame) => Some(frame.clone()),
      _ => None,
    }
  }

  /// The class of the object
  #[must_use]
  pub fn class_ref(&self) -> ClassRef {
    match self.data() {
      Some(data) => data.class.borrow().clone(),
      None => ClassRef::Pending("nil".into()),
    }
  }

  /// The name of the class of the object
  #[must_use]
  pub fn class_name(&self) -> SmartString {
    self.class_ref().name().into()
  }

  /// The identifier of the class of the object
  #[must_use]
  pub fn class_id(&self) -> ClassId {
    self.class_ref().id()
  }

  /// Associate an object with its class, once the class exists
  pub(crate) fn bind_class(&self, class: Rc<Class>) {
    if let Some(data) = self.data() {
      *data.class.borrow_mut() = ClassRef::Bound(class);
    }
  }
}

/// Members
impl Object {
  /// The entries for a member name.
  ///
  /// The object's own members are checked first, and if it has none with the name,
  /// then the members of its class. The universal members of the runtime the class
  /// is attached to come last. An object whose class hasn't been bound to a runtime
  /// (see [`Runtime::bind`]) has no universal members.
  #[must_use]
  pub fn entries(&self, name: &str) -> Vec<Object> {
    let mut entries = self.declared(name);
    if let Some(runtime) = self.class_runtime() {
      entries.extend(runtime.universal(name));
    }
    entries
  }

  /// The runtime the object's class is attached to
  #[must_use]
  pub fn class_runtime(&self) -> Option<Rc<Runtime>> {
    match self.class_ref() {
      ClassRef::Bound(class) => class.runtime(),
      ClassRef::Pending(_) => None,
    }
  }

  /// The entries for a member name from the object and its class
  pub(crate) fn declared(&self, name: &str) -> Vec<Object> {
    let Some(data) = self.data() else {
      return Vec::new();
    };

    let own = data.members.borrow().get(name).cloned().collect::<Vec<_>>();
    if !own.is_empty() {
      return own;
    }

    match &*data.class.borrow() {
      ClassRef::Bound(class) => class.members().get(name).cloned().collect(),
      ClassRef::Pending(_) => Vec::new(),
    }
  }

  /// Does the object have a member with the name?
  #[must_use]
  pub fn has(&self, name: &str) -> bool {
    !self.entries(name).is_empty()
  }

  /// Is the name bound to more than one member?
  #[must_use]
  pub fn is_polymorphic(&self, name: &str) -> bool {
    self.entries(name).len() > 1
  }

  /// Read a member
  ///
  /// # Errors
  /// If there is no member with the name, or it is polymorphic
  pub fn get_member(&self, name: &str) -> Result<Object, RuntimeError> {
    match self.entries(name).as_slice() {
      [] => Err(RuntimeError::no_member(&self.class_name(), name)),
      [member] => Ok(member.clone()),
      [..] => Err(RuntimeError::polymorphic(&self.class_name(), name)),
    }
  }

  /// The object's own member with a name, which is created as `nil` if it doesn't exist
  ///
  /// # Errors
  /// If the member is polymorphic
  pub fn member(&self, name: &str) -> Result<Object, RuntimeError> {
    let Some(data) = self.data() else {
      return Err(RuntimeError::no_member("nil", name));
    };

    let mut members = data.members.borrow_mut();
    let existing = members.get(name).cloned().collect::<Vec<_>>();
    match existing.as_slice() {
      [] => {
        members.push(name, Object::nil());
        Ok(Object::nil())
      }
      [member] => Ok(member.clone()),
      [..] => Err(RuntimeError::polymorphic(&self.class_name(), name)),
    }
  }

  /// Set the object's own member with a name
  ///
  /// # Errors
  /// If the member is polymorphic, or the object no longer exists
  pub fn set_member(&self, name: &str, value: Object) -> Result<(), RuntimeError> {
    let Some(data) = self.data() else {
      return Err(RuntimeError::no_member("nil", name));
    };

    if data.members.borrow().count(name) > 1 {
      return Err(RuntimeError::polymorphic(&self.class_name(), name));
    }

    // the old value is dropped after the borrow ends, as it may have a finalizer
    let previous = data.members.borrow_mut().replace(name, value);
    drop(previous);
    Ok(())
  }

  /// Add another entry for a member name
  pub fn add_polymorphic(&self, name: &str, value: Object) {
    if let Some(data) = self.data() {
      data.members.borrow_mut().push(name, value);
    }
  }

  /// Find the first entry for a name whose signature matches the arguments
  #[must_use]
  pub fn find_polymorphic(&self, name: &str, arguments: &[Object]) -> Option<Object> {
    (self.entries(name).into_iter()).find(|entry| {
      entry
        .as_callable()
        .is_some_and(|callable| callable.matches(arguments))
    })
  }

  /// A snapshot of the object's own members
  #[must_use]
  pub fn members(&self) -> Members {
    self
      .data()
      .map(|data| data.members.borrow().clone())
      .unwrap_or_default()
  }
}

/// Calling
impl Object {
  /// Call the object with arguments
  ///
  /// # Errors
  /// If it can't be called with the arguments, or the call fails
  pub fn invoke(&self, engine: &mut Engine, arguments: &[Object]) -> Result<Object, RuntimeError> {
    engine.invoke(self, arguments)
  }

  /// Call a member of the object, passing the object as the first argument
  ///
  /// # Errors
  /// If there is no matching member, or the call fails
  pub fn method(
    &self,
    engine: &mut Engine,
    name: &str,
    arguments: &[Object],
  ) -> Result<Object, RuntimeError> {
    engine.method(self, name, arguments)
  }
}

impl Drop for Object {
  fn drop(&mut self) {
    let Handle::Strong(data) = &self.handle else {
      return;
    };
    if Rc::strong_count(data) > 1 || data.finalized.get() {
      return;
    }

    let finalizer = data.members.borrow().get(names::FINALIZER).next().cloned();
    let Some(finalizer) = finalizer else {
      return;
    };
    data.finalized.set(true);

    tracing::trace!(class = %self.class_name(), "running finalizer");
    if let Err(error) = Engine::run_finalizer(&finalizer, self.downgrade()) {
      tracing::warn!(class = %self.class_name(), %error, "finalizer failed");
    }
  }
}

impl From<()> for Object {
  fn from((): ()) -> Self {
    Self::nil()
  }
}
impl From<bool> for Object {
  fn from(value: bool) -> Self {
    Self::builtin("bool", Value::Bool(value))
  }
}
impl From<i64> for Object {
  fn from(value: i64) -> Self {
    Self::builtin("int", Value::Int(value))
  }
}
impl From<f64> for Object {
  fn from(value: f64) -> Self {
    Self::builtin("float", Value::Float(value))
  }
}
impl From<Rc<str>> for Object {
  fn from(value: Rc<str>) -> Self {
    Self::builtin("string", Value::String(value))
  }
}
impl From<&str> for Object {
  fn from(value: &str) -> Self {
    Self::from(Rc::<str>::from(value))
  }
}
impl From<String> for Object {
  fn from(value: String) -> Self {
    Self::from(Rc::<str>::from(value))
  }
}
impl From<Callable> for Object {
  fn from(value: Callable) -> Self {
    Self::builtin("function", Value::Callable(value))
  }
}
impl From<NativeFunction> for Object {
  fn from(value: NativeFunction) -> Self {
    Self::from(Callable::from(value))
  }
}
impl From<Rc<Class>> for Object {
  /// A class object, which constructs an instance when called
  fn from(class: Rc<Class>) -> Self {
    let weak = Rc::downgrade(&class);
    let constructor = NativeFunction::variadic(class.name(), move |engine, arguments| {
      match weak.upgrade() {
        Some(class) => engine.construct(&class, arguments),
        None => Err(RuntimeError::internal("class no longer exists")),
      }
    });

    let object = Self::builtin("class", Value::Class(class));
    object.add_polymorphic(names::CALL, constructor.into());
    object
  }
}

impl fmt::Display for Object {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.value() {
      Value::Nil => write!(f, "nil"),
      Value::Bool(value) => write!(f, "{value}"),
      Value::Int(value) => write!(f, "{value}"),
      Value::Float(value) if value.fract() == 0.0 && value.is_finite() => write!(f, "{value:.1}"),
      Value::Float(value) => write!(f, "{value}"),
      Value::String(value) => write!(f, "{value}"),
      Value::Callable(callable) => write!(f, "<function {}>", callable.name()),
      Value::Class(class) => write!(f, "<class {}>", class.name()),
      Value::Instance => write!(f, "<{} instance>", self.class_name()),
      Value::Frame(_) => write!(f, "<frame>"),
    }
  }
}
impl fmt::Debug for Object {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let weak = if self.is_weak() { "weak " } else { "" };
    write!(f, "Object({weak}{} {self})", self.class_name())
  }
}
