//! # Standard library
//!
//! The primitive classes, the members every object has, the prelude of global
//! functions, and the builtin modules.

mod classes;
mod math;
mod prelude;

use crate::{error::RuntimeError, object::Object, runtime::Runtime};
use std::rc::Rc;

/// The classes every runtime has, which literals are instances of
pub const BUILTIN_CLASSES: [&str; 7] =
  ["nil", "bool", "int", "float", "string", "class", "function"];

/// Register the standard library with a new runtime
pub(crate) fn register(runtime: &Rc<Runtime>) {
  let result = classes::register(runtime)
    .and_then(|()| prelude::register(runtime))
    .and_then(|()| math::register(runtime));

  if let Err(error) = result {
    tracing::error!(%error, "failed to register standard library");
  }
}

/// Read a condition as a boolean
fn truthy(object: &Object) -> Result<bool, RuntimeError> {
  object
    .as_bool()
    .ok_or_else(|| RuntimeError::not_boolean(object))
}
