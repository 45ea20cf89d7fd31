//! Errors raised whilst running bytecode.

use crate::{collections::String as SmartString, object::Object};
use axol_blob::{DebugEntry, OpCode};
use std::fmt::{self, Write};

/// A source location recovered from the debug section of a blob
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
  /// The module the instruction is in
  pub module: SmartString,
  /// The function the instruction is in, if known
  pub function: Option<SmartString>,
  /// The file the module was compiled from, if known
  pub file: Option<SmartString>,
  /// The line, column, and length in the source
  pub entry: DebugEntry,
}
impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.function.as_deref() {
      Some(crate::module::ENTRY_POINT) | None => write!(f, "at line {}", self.entry.line)?,
      Some(function) => write!(f, "in function '{function}' at line {}", self.entry.line)?,
    }

    match &self.file {
      Some(file) if !file.is_empty() => write!(f, " ({file})"),
      _ => write!(f, " ({})", self.module),
    }
  }
}

/// A fault whilst running a script.
///
/// Scripts can't catch errors, so every error stops execution and is returned to
/// the host.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{}", self.message())]
pub struct RuntimeError {
  kind: ErrorKind,
  opcode: Option<OpCode>,
  traceback: Vec<Location>,
}
impl RuntimeError {
  /// Create an error of a kind
  #[must_use]
  pub fn new(kind: ErrorKind) -> Self {
    Self {
      kind,
      opcode: None,
      traceback: Vec::new(),
    }
  }

  pub(crate) fn internal(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Internal(message.into()))
  }
  pub(crate) fn no_member(class: &str, member: &str) -> Self {
    Self::new(ErrorKind::NoMember {
      class: class.into(),
      member: member.into(),
    })
  }
  pub(crate) fn polymorphic(class: &str, member: &str) -> Self {
    Self::new(ErrorKind::Class(format!(
      "member `{member}` of `{class}` is polymorphic, so it can only be called"
    )))
  }
  pub(crate) fn not_boolean(got: &Object) -> Self {
    Self::new(ErrorKind::Class(format!(
      "expected `bool`, got `{}`",
      got.class_name()
    )))
  }
  pub(crate) fn signature(callee: &str, arguments: &[Object]) -> Self {
    Self::new(ErrorKind::Signature {
      callee: callee.into(),
      arguments: arguments.iter().map(Object::class_name).collect(),
    })
  }
  pub(crate) fn no_global(name: &str) -> Self {
    Self::new(ErrorKind::NoGlobal(name.into()))
  }

  /// What went wrong
  #[must_use]
  pub fn kind(&self) -> &ErrorKind {
    &self.kind
  }

  /// The instruction which raised the error
  #[must_use]
  pub fn opcode(&self) -> Option<OpCode> {
    self.opcode
  }

  /// The location of the instruction which raised the error
  #[must_use]
  pub fn location(&self) -> Option<&Location> {
    self.traceback.first()
  }

  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> &'static str {
    self.kind.title()
  }

  /// The body of the error message describing what has gone wrong
  #[must_use]
  pub fn message(&self) -> String {
    match self.opcode {
      Some(opcode) => format!("{} (in `{opcode}`)", self.kind.message()),
      None => self.kind.message(),
    }
  }

  /// The chain of calls which led to the error, innermost first
  #[must_use]
  pub fn traceback(&self) -> Option<String> {
    if self.traceback.is_empty() {
      return None;
    }

    let mut string = String::new();
    for location in &self.traceback {
      let _ = writeln!(string, "{location}");
    }
    Some(string)
  }

  pub(crate) fn set_opcode(&mut self, opcode: OpCode) {
    self.opcode.get_or_insert(opcode);
  }

  pub(crate) fn add_location(&mut self, location: Location) {
    self.traceback.push(location);
  }
}

/// The kinds of [`RuntimeError`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  /// An object doesn't have a member
  NoMember {
    /// The class of the object
    class: SmartString,
    /// The name of the missing member
    member: SmartString,
  },
  /// An object is the wrong class for an operation
  Class(String),
  /// No overload of a function accepts the arguments
  Signature {
    /// The name of the function
    callee: SmartString,
    /// The classes of the arguments given
    arguments: Vec<SmartString>,
  },
  /// A module to import can't be found
  NoFile(SmartString),
  /// A module to import couldn't be compiled
  Import {
    /// The name of the module
    module: SmartString,
    /// What went wrong
    message: String,
  },
  /// A global variable doesn't exist
  NoGlobal(SmartString),
  /// An invalid arithmetic operation, such as dividing by zero
  Arithmetic(&'static str),
  /// The bytecode or the state of the interpreter is inconsistent
  Internal(String),
}
impl ErrorKind {
  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> &'static str {
    match self {
      Self::NoMember { .. } => "No Member",
      Self::Class(_) => "Class Error",
      Self::Signature { .. } => "Signature Mismatch",
      Self::NoFile(_) => "Module Not Found",
      Self::Import { .. } => "Import Error",
      Self::NoGlobal(_) => "Undefined Variable",
      Self::Arithmetic(_) => "Arithmetic Error",
      Self::Internal(_) => "Internal Error",
    }
  }

  /// The body of the error message describing what has gone wrong
  #[must_use]
  pub fn message(&self) -> String {
    match self {
      Self::NoMember { class, member } => format!("`{class}` has no member `{member}`"),
      Self::Class(message) | Self::Internal(message) => message.clone(),
      Self::Signature { callee, arguments } => {
        format!("no overload of `{callee}` accepts ({})", arguments.join(", "))
      }
      Self::NoFile(module) => format!("could not find module `{module}`"),
      Self::Import { module, message } => format!("could not compile `{module}`: {message}"),
      Self::NoGlobal(name) => format!("variable `{name}` is not defined"),
      Self::Arithmetic(message) => (*message).to_owned(),
    }
  }
}
