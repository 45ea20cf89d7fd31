//! The builtin `math` module.

use crate::{
  callable::NativeFunction, error::RuntimeError, module::Module, object::Object, runtime::Runtime,
};
use std::rc::Rc;

#[allow(clippy::cast_precision_loss)]
pub(super) fn register(runtime: &Rc<Runtime>) -> Result<(), RuntimeError> {
  let math = Module::new("math", runtime);

  math.set_global("pi", std::f64::consts::PI.into());
  math.set_global("e", std::f64::consts::E.into());
  math.set_global("infinity", f64::INFINITY.into());

  math.add_native(NativeFunction::unary("sqrt", f64::sqrt));
  math.set_global(
    "floor",
    Object::overloaded([
      NativeFunction::unary("floor", f64::floor),
      NativeFunction::unary("floor", |value: i64| value),
    ]),
  );
  math.set_global(
    "ceil",
    Object::overloaded([
      NativeFunction::unary("ceil", f64::ceil),
      NativeFunction::unary("ceil", |value: i64| value),
    ]),
  );
  math.set_global(
    "round",
    Object::overloaded([
      NativeFunction::unary("round", f64::round),
      NativeFunction::unary("round", |value: i64| value),
    ]),
  );
  math.set_global(
    "abs",
    Object::overloaded([
      NativeFunction::unary("abs", i64::wrapping_abs),
      NativeFunction::unary("abs", f64::abs),
    ]),
  );
  math.set_global(
    "min",
    Object::overloaded([
      NativeFunction::binary("min", i64::min),
      NativeFunction::binary("min", f64::min),
      NativeFunction::binary("min", |a: i64, b: f64| (a as f64).min(b)),
      NativeFunction::binary("min", |a: f64, b: i64| a.min(b as f64)),
    ]),
  );
  math.set_global(
    "max",
    Object::overloaded([
      NativeFunction::binary("max", i64::max),
      NativeFunction::binary("max", f64::max),
      NativeFunction::binary("max", |a: i64, b: f64| (a as f64).max(b)),
      NativeFunction::binary("max", |a: f64, b: i64| a.max(b as f64)),
    ]),
  );

  runtime.add_builtin(math)
}
