//! Global functions available in every module.

use crate::{
  callable::{NativeFunction, Signature, argument},
  class::ANY_ID,
  engine::Engine,
  error::{ErrorKind, RuntimeError},
  object::{Object, names},
  runtime::Runtime,
};
use std::rc::Rc;

#[allow(clippy::print_stdout)]
pub(super) fn register(runtime: &Runtime) -> Result<(), RuntimeError> {
  let functions = [
    NativeFunction::variadic("print", |engine, arguments| {
      let strings = (arguments.iter())
        .map(|argument| to_string(engine, argument))
        .collect::<Result<Vec<_>, _>>()?;
      println!("{}", strings.join(" "));
      Ok(Object::nil())
    }),
    NativeFunction::new("str", Signature::fixed([ANY_ID]), |engine, arguments| {
      let object = argument::<Object>(arguments, 0)?;
      Ok(to_string(engine, &object)?.into())
    }),
    NativeFunction::unary("weakref", |object: Object| object.downgrade()),
    NativeFunction::unary("classname", |object: Object| {
      object.class_name().to_string()
    }),
  ];

  for function in functions {
    let name = function.name().to_owned();
    runtime.add_prelude(&name, function.into());
  }
  Ok(())
}

/// Convert an object to a string, using its `__str__` member if it has one
fn to_string(engine: &mut Engine, object: &Object) -> Result<Rc<str>, RuntimeError> {
  if let Some(string) = object.as_str() {
    return Ok(string);
  }
  if !object.has(names::STRING) {
    return Ok(object.to_string().into());
  }

  let string = engine.method(object, names::STRING, &[])?;
  string.as_str().ok_or_else(|| {
    RuntimeError::new(ErrorKind::Class(format!(
      "`__str__` must return a `string`, got `{}`",
      string.class_name()
    )))
  })
}
