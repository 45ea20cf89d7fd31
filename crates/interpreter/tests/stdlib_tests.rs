//! # Standard Library Tests
//!
//! Check that the standard library works as expected.

use axol_interpreter::{
  Config, ErrorKind, NativeFunction, Object, Runtime, RuntimeError, Script, Signature, class_id,
};
use indoc::indoc;

fn run(source: &str) -> Result<Script, RuntimeError> {
  let runtime = Runtime::new();
  let script = Script::from_source("main", source.to_owned(), &runtime).unwrap();
  script.run_main()?;
  Ok(script)
}

macro_rules! assert_variable {
  ($script:expr; $name:ident, string $value:literal) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    assert_eq!(value.as_str().as_deref(), Some($value), "{} is {value:?}", stringify!($name));
  };
  ($script:expr; $name:ident, float $value:expr) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    let float = value.as_float().unwrap();
    assert!((float - $value).abs() < f64::EPSILON, "{} is {float}", stringify!($name));
  };
  ($script:expr; $name:ident, int $value:expr) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    assert_eq!(value.as_int(), Some($value), "{} is {value:?}", stringify!($name));
  };
  ($script:expr; $name:ident, bool $value:expr) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    assert_eq!(value.as_bool(), Some($value), "{} is {value:?}", stringify!($name));
  };
}

#[test]
fn string_conversion() {
  let result = run(indoc! {"
    a = str(12);
    b = str(1.5);
    c = str(2.0);
    d = str(nil);
    e = str(true);
    f = str('text');
  "});
  assert_variable!(result; a, string "12");
  assert_variable!(result; b, string "1.5");
  assert_variable!(result; c, string "2.0");
  assert_variable!(result; d, string "nil");
  assert_variable!(result; e, string "true");
  assert_variable!(result; f, string "text");
}

#[test]
fn string_conversion_uses_str_member() {
  let result = run(indoc! {"
    class Named {
      fn __init__(name) { self.name = name; }
      fn __str__() { return 'Named(' + self.name + ')'; }
    }
    class Plain { }

    a = str(Named('x'));
    b = str(Plain());
  "});
  assert_variable!(result; a, string "Named(x)");
  assert_variable!(result; b, string "<Plain instance>");

  let error = run("class Bad { fn __str__() { return 1; } } s = str(Bad());").unwrap_err();
  assert!(matches!(error.kind(), ErrorKind::Class(_)));
}

#[test]
fn print_returns_nil() {
  let result = run("x = print('hello', 1, 2.5, nil);");
  let value = result.unwrap().module().global("x").unwrap();
  assert!(value.is_nil());
}

#[test]
fn classname() {
  let result = run(indoc! {"
    class Point { }
    fn f() { }

    a = classname(1);
    b = classname(1.0);
    c = classname('s');
    d = classname(nil);
    e = classname(Point());
    f2 = classname(Point);
    g = classname(f);
    h = classname(true);
  "});
  assert_variable!(result; a, string "int");
  assert_variable!(result; b, string "float");
  assert_variable!(result; c, string "string");
  assert_variable!(result; d, string "nil");
  assert_variable!(result; e, string "Point");
  assert_variable!(result; f2, string "class");
  assert_variable!(result; g, string "function");
  assert_variable!(result; h, string "bool");
}

#[test]
fn weak_references() {
  let result = run(indoc! {"
    class Box { }

    b = Box();
    w = weakref(b);
    alive = w == b;
    name = classname(w);
    b = nil;
    gone = w == nil;
    after = classname(w);
  "});
  assert_variable!(result; alive, bool true);
  assert_variable!(result; name, string "Box");
  assert_variable!(result; gone, bool true);
  assert_variable!(result; after, string "nil");
}

#[test]
fn math_module() {
  let result = run(indoc! {"
    import 'math';

    a = math.sqrt(16.0);
    b = math.abs(-3);
    c = math.abs(-2.5);
    d = math.floor(2.7);
    e = math.ceil(2.1);
    f = math.round(2.5);
    g = math.min(3, 7);
    h = math.max(3, 7.5);
    i = math.floor(4);
  "});
  assert_variable!(result; a, float 4.0);
  assert_variable!(result; b, int 3);
  assert_variable!(result; c, float 2.5);
  assert_variable!(result; d, float 2.0);
  assert_variable!(result; e, float 3.0);
  assert_variable!(result; f, float 3.0);
  assert_variable!(result; g, int 3);
  assert_variable!(result; h, float 7.5);
  assert_variable!(result; i, int 4);
}

#[test]
fn math_constants() {
  let result = run(indoc! {"
    from 'math' import pi;
    from 'math' import *;
    a = pi;
    b = e;
    c = infinity > 1000000.0;
  "});
  assert_variable!(result; a, float std::f64::consts::PI);
  assert_variable!(result; b, float std::f64::consts::E);
  assert_variable!(result; c, bool true);
}

#[test]
fn math_functions_check_arguments() {
  let error = run("import 'math'; x = math.sqrt('four');").unwrap_err();
  assert!(matches!(error.kind(), ErrorKind::Signature { .. }));
}

#[test]
fn host_defined_functions() {
  let runtime = Runtime::new();
  let int = class_id("int", "");
  let triple = NativeFunction::new("triple", Signature::fixed([int]), |_, arguments| {
    let value = arguments[0].as_int().unwrap_or_default();
    Ok(Object::from(value * 3))
  });
  runtime.add_prelude("triple", triple.into());

  let script = Script::from_source("main", "return triple(4);".to_owned(), &runtime).unwrap();
  assert_eq!(script.run_main().unwrap().as_int(), Some(12));
}

#[test]
fn universal_members_can_be_extended() {
  let runtime = Runtime::new();
  let describe = NativeFunction::unary("describe", |object: Object| {
    format!("a {}", object.class_name())
  });
  runtime.add_universal("describe", describe.into());

  let source = "x = 1; return x.describe();".to_owned();
  let script = Script::from_source("main", source, &runtime).unwrap();
  let result = script.run_main().unwrap();
  assert_eq!(result.as_str().as_deref(), Some("a int"));
}

#[test]
fn stack_limit_from_config() {
  let runtime = Runtime::with_config(Config {
    max_stack: 64,
    ..Config::default()
  });
  let source = "fn down(n) { return down(n + 1); } down(0);".to_owned();
  let script = Script::from_source("main", source, &runtime).unwrap();

  let error = script.run_main().unwrap_err();
  assert!(matches!(error.kind(), ErrorKind::Internal(_)));
  assert!(error.message().starts_with("stack overflow"));
}
