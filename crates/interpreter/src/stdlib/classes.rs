//! The primitive classes, and the members shared by every object.

use super::truthy;
use crate::{
  callable::{FromObject, NativeFunction, Signature, argument},
  class::{ANY_ID, BUILTIN_MODULE, Class, class_id},
  error::{ErrorKind, RuntimeError},
  object::{Object, names},
  runtime::Runtime,
};
use std::rc::Rc;

const OVERFLOW: &str = "integer overflow";
const DIVIDE_BY_ZERO: &str = "division by zero";

pub(super) fn register(runtime: &Runtime) -> Result<(), RuntimeError> {
  let nil = Signature::fixed([class_id("nil", BUILTIN_MODULE)]);
  let not_nil = NativeFunction::new(names::NOT, nil, |_, _| Ok(true.into()));
  runtime.register_class(class("nil", [not_nil]))?;
  runtime.register_class(class("bool", boolean()))?;
  runtime.register_class(class("int", int()))?;
  runtime.register_class(class("float", float()))?;
  runtime.register_class(class("string", string()))?;
  runtime.register_class(Class::builtin("class"))?;
  runtime.register_class(Class::builtin("function"))?;

  for member in universal() {
    let name = member.name().to_owned();
    runtime.add_universal(&name, member.into());
  }

  Ok(())
}

fn class(name: &str, members: impl IntoIterator<Item = NativeFunction>) -> Rc<Class> {
  let class = Class::builtin(name);
  for member in members {
    let name = member.name().to_owned();
    class.add_member(name, member.into());
  }
  class
}

fn boolean() -> Vec<NativeFunction> {
  vec![
    NativeFunction::unary(names::NOT, |value: bool| !value),
    NativeFunction::binary(names::EQUAL, |a: bool, b: bool| a == b),
  ]
}

fn integer(name: &str, operation: fn(i64, i64) -> Result<i64, &'static str>) -> NativeFunction {
  let signature = Signature::fixed([i64::class_id(), i64::class_id()]);
  NativeFunction::new(name, signature, move |_, arguments| {
    let (left, right) = (argument(arguments, 0)?, argument(arguments, 1)?);
    operation(left, right)
      .map(Object::from)
      .map_err(|message| RuntimeError::new(ErrorKind::Arithmetic(message)))
  })
}

#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn int() -> Vec<NativeFunction> {
  vec![
    integer(names::ADD, |a, b| a.checked_add(b).ok_or(OVERFLOW)),
    NativeFunction::binary(names::ADD, |a: i64, b: f64| a as f64 + b),
    integer(names::SUBTRACT, |a, b| a.checked_sub(b).ok_or(OVERFLOW)),
    NativeFunction::binary(names::SUBTRACT, |a: i64, b: f64| a as f64 - b),
    integer(names::MULTIPLY, |a, b| a.checked_mul(b).ok_or(OVERFLOW)),
    NativeFunction::binary(names::MULTIPLY, |a: i64, b: f64| a as f64 * b),
    integer(names::DIVIDE, |a, b| match b {
      0 => Err(DIVIDE_BY_ZERO),
      _ => a.checked_div(b).ok_or(OVERFLOW),
    }),
    NativeFunction::binary(names::DIVIDE, |a: i64, b: f64| a as f64 / b),
    integer(names::REMAINDER, |a, b| match b {
      0 => Err(DIVIDE_BY_ZERO),
      _ => a.checked_rem(b).ok_or(OVERFLOW),
    }),
    NativeFunction::binary(names::REMAINDER, |a: i64, b: f64| a as f64 % b),
    NativeFunction::new(names::NEGATE, Signature::fixed([i64::class_id()]), |_, arguments| {
      let value = argument::<i64>(arguments, 0)?;
      (value.checked_neg())
        .map(Object::from)
        .ok_or_else(|| RuntimeError::new(ErrorKind::Arithmetic(OVERFLOW)))
    }),
    NativeFunction::binary(names::EQUAL, |a: i64, b: i64| a == b),
    NativeFunction::binary(names::EQUAL, |a: i64, b: f64| a as f64 == b),
    NativeFunction::binary(names::LESS, |a: i64, b: i64| a < b),
    NativeFunction::binary(names::LESS, |a: i64, b: f64| (a as f64) < b),
  ]
}

#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn float() -> Vec<NativeFunction> {
  vec![
    NativeFunction::binary(names::ADD, |a: f64, b: f64| a + b),
    NativeFunction::binary(names::ADD, |a: f64, b: i64| a + b as f64),
    NativeFunction::binary(names::SUBTRACT, |a: f64, b: f64| a - b),
    NativeFunction::binary(names::SUBTRACT, |a: f64, b: i64| a - b as f64),
    NativeFunction::binary(names::MULTIPLY, |a: f64, b: f64| a * b),
    NativeFunction::binary(names::MULTIPLY, |a: f64, b: i64| a * b as f64),
    NativeFunction::binary(names::DIVIDE, |a: f64, b: f64| a / b),
    NativeFunction::binary(names::DIVIDE, |a: f64, b: i64| a / b as f64),
    NativeFunction::binary(names::REMAINDER, |a: f64, b: f64| a % b),
    NativeFunction::binary(names::REMAINDER, |a: f64, b: i64| a % b as f64),
    NativeFunction::unary(names::NEGATE, |value: f64| -value),
    NativeFunction::binary(names::EQUAL, |a: f64, b: f64| a == b),
    NativeFunction::binary(names::EQUAL, |a: f64, b: i64| a == b as f64),
    NativeFunction::binary(names::LESS, |a: f64, b: f64| a < b),
    NativeFunction::binary(names::LESS, |a: f64, b: i64| a < b as f64),
  ]
}

fn string() -> Vec<NativeFunction> {
  vec![
    NativeFunction::binary(names::ADD, |a: Rc<str>, b: Rc<str>| format!("{a}{b}")),
    NativeFunction::binary(names::MULTIPLY, |a: Rc<str>, count: i64| {
      a.repeat(usize::try_from(count).unwrap_or(0))
    }),
    NativeFunction::binary(names::EQUAL, |a: Rc<str>, b: Rc<str>| a == b),
    NativeFunction::binary(names::LESS, |a: Rc<str>, b: Rc<str>| a < b),
    NativeFunction::unary("length", |value: Rc<str>| {
      i64::try_from(value.chars().count()).unwrap_or(i64::MAX)
    }),
  ]
}

/// Members every object has, checked after its own and its class's members
fn universal() -> Vec<NativeFunction> {
  let any = || Signature::fixed([ANY_ID, ANY_ID]);

  vec![
    NativeFunction::unary(names::CLASSNAME, |object: Object| {
      object.class_name().to_string()
    }),
    NativeFunction::binary(names::EQUAL, |a: Object, b: Object| {
      match (a.is_nil(), b.is_nil()) {
        (true, true) => true,
        (false, false) => a.ptr_eq(&b),
        _ => false,
      }
    }),
    NativeFunction::new(names::NOT_EQUAL, any(), |engine, arguments| {
      let (a, b) = (argument::<Object>(arguments, 0)?, argument(arguments, 1)?);
      Ok((!truthy(&engine.method(&a, names::EQUAL, &[b])?)?).into())
    }),
    NativeFunction::new(names::LESS_EQUAL, any(), |engine, arguments| {
      let (a, b) = (argument::<Object>(arguments, 0)?, argument::<Object>(arguments, 1)?);
      let result = truthy(&engine.method(&a, names::LESS, &[b.clone()])?)?
        || truthy(&engine.method(&a, names::EQUAL, &[b])?)?;
      Ok(result.into())
    }),
    NativeFunction::new(names::GREATER, any(), |engine, arguments| {
      let (a, b) = (argument(arguments, 0)?, argument::<Object>(arguments, 1)?);
      engine.method(&b, names::LESS, &[a])
    }),
    NativeFunction::new(names::GREATER_EQUAL, any(), |engine, arguments| {
      let (a, b) = (argument::<Object>(arguments, 0)?, argument::<Object>(arguments, 1)?);
      let result = truthy(&engine.method(&a, names::GREATER, &[b.clone()])?)?
        || truthy(&engine.method(&a, names::EQUAL, &[b])?)?;
      Ok(result.into())
    }),
  ]
}
