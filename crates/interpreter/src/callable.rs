//! Things which can be called: native closures, and functions in a module's text section.

use crate::{
  class::{ANY_ID, BUILTIN_MODULE, ClassId, class_id},
  collections::String as SmartString,
  engine::Engine,
  error::RuntimeError,
  module::WeakModule,
  object::Object,
};
use std::{fmt, rc::Rc};

/// The classes of arguments a callable accepts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signature {
  /// A fixed number of arguments, each of which must match a class (or [`ANY_ID`])
  Fixed {
    /// The class of each argument
    arguments: Vec<ClassId>,
    /// Does the callable produce a value?
    returns: bool,
  },
  /// Any number of arguments of any class
  Variadic,
}
impl Signature {
  /// A fixed signature which returns a value
  pub fn fixed(arguments: impl Into<Vec<ClassId>>) -> Self {
    Self::Fixed {
      arguments: arguments.into(),
      returns: true,
    }
  }

  /// Can a callable with this signature be called with the arguments?
  ///
  /// Each argument must have exactly the expected class, unless the expected class
  /// is the wildcard.
  #[must_use]
  pub fn matches(&self, arguments: &[Object]) -> bool {
    match self {
      Self::Variadic => true,
      Self::Fixed {
        arguments: expected,
        ..
      } => {
        expected.len() == arguments.len()
          && (expected.iter())
            .zip(arguments)
            .all(|(expected, argument)| *expected == ANY_ID || *expected == argument.class_id())
      }
    }
  }

  /// The number of arguments, if it is fixed
  #[must_use]
  pub fn arity(&self) -> Option<usize> {
    match self {
      Self::Fixed { arguments, .. } => Some(arguments.len()),
      Self::Variadic => None,
    }
  }

  /// Does the callable produce a value?
  #[must_use]
  pub fn returns(&self) -> bool {
    match self {
      Self::Fixed { returns, .. } => *returns,
      Self::Variadic => true,
    }
  }
}

/// A value which can be taken as an argument by a native function
pub trait FromObject: Sized {
  /// The name of the builtin class the argument must be, or `None` for any class
  const CLASS: Option<&'static str>;

  /// Get the value out of an object
  fn from_object(object: &Object) -> Option<Self>;

  /// The class id used in the signature
  #[must_use]
  fn class_id() -> ClassId {
    Self::CLASS.map_or(ANY_ID, |name| class_id(name, BUILTIN_MODULE))
  }
}
impl FromObject for i64 {
  const CLASS: Option<&'static str> = Some("int");

  fn from_object(object: &Object) -> Option<Self> {
    object.as_int()
  }
}
impl FromObject for f64 {
  const CLASS: Option<&'static str> = Some("float");

  fn from_object(object: &Object) -> Option<Self> {
    object.as_float()
  }
}
impl FromObject for bool {
  const CLASS: Option<&'static str> = Some("bool");

  fn from_object(object: &Object) -> Option<Self> {
    object.as_bool()
  }
}
impl FromObject for Rc<str> {
  const CLASS: Option<&'static str> = Some("string");

  fn from_object(object: &Object) -> Option<Self> {
    object.as_str()
  }
}
impl FromObject for Object {
  const CLASS: Option<&'static str> = None;

  fn from_object(object: &Object) -> Option<Self> {
    Some(object.clone())
  }
}

/// Get an argument of a native function
///
/// # Errors
/// If the argument is missing or is the wrong class
pub fn argument<T: FromObject>(arguments: &[Object], index: usize) -> Result<T, RuntimeError> {
  (arguments.get(index))
    .and_then(T::from_object)
    .ok_or_else(|| {
      RuntimeError::internal(format!(
        "argument {index} is not a `{}`",
        T::CLASS.unwrap_or("Any")
      ))
    })
}

type NativeFn = dyn Fn(&mut Engine, &[Object]) -> Result<Object, RuntimeError>;

/// A function implemented in Rust
pub struct NativeFunction {
  name: SmartString,
  signature: Signature,
  function: Box<NativeFn>,
}
impl NativeFunction {
  /// Wrap a closure as a function
  pub fn new(
    name: impl Into<SmartString>,
    signature: Signature,
    function: impl Fn(&mut Engine, &[Object]) -> Result<Object, RuntimeError> + 'static,
  ) -> Self {
    Self {
      name: name.into(),
      signature,
      function: Box::new(function),
    }
  }

  /// A function which takes any number of arguments
  pub fn variadic(
    name: impl Into<SmartString>,
    function: impl Fn(&mut Engine, &[Object]) -> Result<Object, RuntimeError> + 'static,
  ) -> Self {
    Self::new(name, Signature::Variadic, function)
  }

  /// A function of one argument, whose signature comes from the argument type
  pub fn unary<A, R>(name: impl Into<SmartString>, function: impl Fn(A) -> R + 'static) -> Self
  where
    A: FromObject,
    R: Into<Object>,
  {
    Self::new(name, Signature::fixed([A::class_id()]), move |_, args| {
      Ok(function(argument(args, 0)?).into())
    })
  }

  /// A function of two arguments, whose signature comes from the argument types
  pub fn binary<A, B, R>(
    name: impl Into<SmartString>,
    function: impl Fn(A, B) -> R + 'static,
  ) -> Self
  where
    A: FromObject,
    B: FromObject,
    R: Into<Object>,
  {
    let signature = Signature::fixed([A::class_id(), B::class_id()]);
    Self::new(name, signature, move |_, args| {
      Ok(function(argument(args, 0)?, argument(args, 1)?).into())
    })
  }

  /// The name of the function
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Call the function. The signature is not checked.
  ///
  /// # Errors
  /// If the function returns an error
  pub fn call(&self, engine: &mut Engine, arguments: &[Object]) -> Result<Object, RuntimeError> {
    let result = (self.function)(engine, arguments)?;

    if self.signature.returns() {
      Ok(result)
    } else {
      Ok(Object::nil())
    }
  }
}
impl fmt::Debug for NativeFunction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NativeFunction")
      .field("name", &self.name)
      .field("signature", &self.signature)
      .finish_non_exhaustive()
  }
}

/// A function in the text section of a module
#[derive(Debug)]
pub struct ScriptedFunction {
  pub(crate) name: SmartString,
  pub(crate) module: WeakModule,
  pub(crate) address: u32,
  pub(crate) locals: u32,
  pub(crate) signature: Signature,
}
impl ScriptedFunction {
  /// The name of the function
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The address of the first instruction
  #[must_use]
  pub fn address(&self) -> u32 {
    self.address
  }
}

/// A native or scripted function
#[derive(Clone, Debug)]
pub enum Callable {
  /// Implemented in Rust
  Native(Rc<NativeFunction>),
  /// Implemented as bytecode
  Scripted(Rc<ScriptedFunction>),
}
impl Callable {
  /// The name of the function
  #[must_use]
  pub fn name(&self) -> &str {
    match self {
      Self::Native(native) => native.name(),
      Self::Scripted(scripted) => scripted.name(),
    }
  }

  /// The classes of the arguments it accepts
  #[must_use]
  pub fn signature(&self) -> &Signature {
    match self {
      Self::Native(native) => &native.signature,
      Self::Scripted(scripted) => &scripted.signature,
    }
  }

  /// Can it be called with the arguments?
  #[must_use]
  pub fn matches(&self, arguments: &[Object]) -> bool {
    self.signature().matches(arguments)
  }

  /// Are both the same function?
  #[must_use]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Native(a), Self::Native(b)) => Rc::ptr_eq(a, b),
      (Self::Scripted(a), Self::Scripted(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }
}
impl From<NativeFunction> for Callable {
  fn from(value: NativeFunction) -> Self {
    Self::Native(Rc::new(value))
  }
}
