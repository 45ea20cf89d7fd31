//! # Runtime Tests
//!
//! Check that the output of the interpreted code is correct.

use axol_blob::{Assembler, Binding, Blob, OpCode, Operand, Symbol, SymbolKind};
use axol_interpreter::{ErrorKind, NativeFunction, Object, Runtime, RuntimeError, Script};
use indoc::indoc;
use std::{cell::Cell, fs, rc::Rc};

fn run(source: &str) -> Result<Script, RuntimeError> {
  run_with(&Runtime::new(), source)
}

fn run_with(runtime: &Rc<Runtime>, source: &str) -> Result<Script, RuntimeError> {
  let script = Script::from_source("main", source.to_owned(), runtime).unwrap();
  script.run_main()?;
  Ok(script)
}

fn error(source: &str) -> RuntimeError {
  run(source).unwrap_err()
}

/// Assemble a `__main__` function by hand and run it.
///
/// Constants: `#0` is `true`, `#1` to `#3` are the ints 1 to 3, `#4` is `false`.
fn run_assembled(emit: impl FnOnce(&mut Assembler)) -> Result<Object, RuntimeError> {
  let mut blob = Blob::new("main");
  for (class, value) in [("bool", "true"), ("int", "1"), ("int", "2"), ("int", "3")] {
    blob.add_constant(class, value);
  }
  blob.add_constant("bool", "false");

  let mut assembler = Assembler::new(blob);
  emit(&mut assembler);
  let mut blob = assembler.into_blob().unwrap();

  let main = Symbol {
    name: blob.add_string("__main__"),
    kind: SymbolKind::Function,
    binding: Binding::Global,
    address: 0,
    locals: 0,
    signature: blob.add_signature(&[]),
  };
  blob.add_symbol(main);

  Script::from_blob(blob, &Runtime::new()).unwrap().run_main()
}

/// A runtime with a `tick` function, which counts how often it is called
fn counting_runtime() -> (Rc<Runtime>, Rc<Cell<u32>>) {
  let runtime = Runtime::new();
  let ticks = Rc::new(Cell::new(0));

  let counter = ticks.clone();
  let tick = NativeFunction::variadic("tick", move |_, _| {
    counter.set(counter.get() + 1);
    Ok(Object::nil())
  });
  runtime.add_prelude("tick", tick.into());

  (runtime, ticks)
}

macro_rules! assert_variable {
  ($script:expr; $name:ident, nil) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    assert!(value.is_nil(), "{} is {value:?}, not nil", stringify!($name));
  };
  ($script:expr; $name:ident, int $value:expr) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    assert_eq!(value.as_int(), Some($value), "{} is {value:?}", stringify!($name));
  };
  ($script:expr; $name:ident, float $value:expr) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    assert_eq!(value.as_float(), Some($value), "{} is {value:?}", stringify!($name));
  };
  ($script:expr; $name:ident, bool $value:expr) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    assert_eq!(value.as_bool(), Some($value), "{} is {value:?}", stringify!($name));
  };
  ($script:expr; $name:ident, string $value:literal) => {
    let value = $script.as_ref().unwrap().module().global(stringify!($name)).unwrap();
    assert_eq!(value.as_str().as_deref(), Some($value), "{} is {value:?}", stringify!($name));
  };
}

#[test]
fn return_from_entry_point() {
  let runtime = Runtime::new();
  let script = Script::from_source("main", "x = 1; y = x + 2; return y;".to_owned(), &runtime);
  let result = script.unwrap().run_main().unwrap();

  assert_eq!(result.as_int(), Some(3));
}

#[test]
fn numeric_operators() {
  let result = run(indoc! {"
    a = 1 + 2;
    b = 3.5 * 2;
    c = 7 / 2;
    d = 7 % 3;
    e = 1 + 0.5;
    f = -4;
    g = 10 - 2.5;
    h = 7.0 / 2;
  "});
  assert_variable!(result; a, int 3);
  assert_variable!(result; b, float 7.0);
  assert_variable!(result; c, int 3);
  assert_variable!(result; d, int 1);
  assert_variable!(result; e, float 1.5);
  assert_variable!(result; f, int -4);
  assert_variable!(result; g, float 7.5);
  assert_variable!(result; h, float 3.5);
}

#[test]
fn comparison_operators() {
  let result = run(indoc! {"
    a = 1 < 2;
    b = 2 <= 2;
    c = 3 > 4;
    d = 3 >= 3;
    e = 1 == 1;
    f = 1 != 1;
    g = nil == nil;
    h = nil == 1;
    i = 'a' < 'b';
    j = 1 == 1.0;
  "});
  assert_variable!(result; a, bool true);
  assert_variable!(result; b, bool true);
  assert_variable!(result; c, bool false);
  assert_variable!(result; d, bool true);
  assert_variable!(result; e, bool true);
  assert_variable!(result; f, bool false);
  assert_variable!(result; g, bool true);
  assert_variable!(result; h, bool false);
  assert_variable!(result; i, bool true);
  assert_variable!(result; j, bool true);
}

#[test]
fn logical_operators() {
  let result = run(indoc! {"
    a = true and false;
    b = false or true;
    c = !true;
    d = !nil;
    e = true and 5;
  "});
  assert_variable!(result; a, bool false);
  assert_variable!(result; b, bool true);
  assert_variable!(result; c, bool false);
  assert_variable!(result; d, bool true);
  assert_variable!(result; e, int 5);
}

#[test]
fn logical_operators_short_circuit() {
  let result = run(indoc! {"
    fn fail() { return nil + 1; }

    a = false and fail();
    b = true or fail();
  "});
  assert_variable!(result; a, bool false);
  assert_variable!(result; b, bool true);
}

#[test]
fn string_operators() {
  let result = run(indoc! {"
    a = 'ab' + \"cd\";
    b = 'ab' * 3;
    c = 'hello'.length();
    d = 'same' == 'same';
  "});
  assert_variable!(result; a, string "abcd");
  assert_variable!(result; b, string "ababab");
  assert_variable!(result; c, int 5);
  assert_variable!(result; d, bool true);
}

#[test]
fn if_else() {
  let result = run(indoc! {"
    x = 5;
    if x > 3 { a = 'big'; } else { a = 'small'; }
    if x > 10 { b = 'big'; } else { b = 'small'; }

    if x < 0 {
      c = 'negative';
    } else if x == 0 {
      c = 'zero';
    } else {
      c = 'positive';
    }
  "});
  assert_variable!(result; a, string "big");
  assert_variable!(result; b, string "small");
  assert_variable!(result; c, string "positive");
}

#[test]
fn while_loop() {
  let result = run(indoc! {"
    i = 0;
    total = 0;
    while i < 5 {
      total = total + i;
      i = i + 1;
    }
  "});
  assert_variable!(result; i, int 5);
  assert_variable!(result; total, int 10);
}

#[test]
fn functions() {
  let result = run(indoc! {"
    fn add(a, b) { return a + b; }
    fn subtract(a: int, b: int) { return a - b; }
    fn nothing() { }

    a = add(1, 2);
    b = subtract(10, 3);
    c = nothing();
  "});
  assert_variable!(result; a, int 3);
  assert_variable!(result; b, int 7);
  assert_variable!(result; c, nil);
}

#[test]
fn recursion() {
  let result = run(indoc! {"
    fn fib(n) {
      if n < 2 { return n; }
      return fib(n - 1) + fib(n - 2);
    }

    x = fib(15);
  "});
  assert_variable!(result; x, int 610);
}

#[test]
fn locals_shadow_globals() {
  let result = run(indoc! {"
    x = 1;
    g = 10;

    fn assigns() { x = 5; return x; }
    fn reads() { return g * 2; }
    fn increments(a) { a = a + 1; return a; }

    a = assigns();
    b = reads();
    c = increments(1);
  "});
  assert_variable!(result; x, int 1);
  assert_variable!(result; a, int 5);
  assert_variable!(result; b, int 20);
  assert_variable!(result; c, int 2);
}

#[test]
fn classes() {
  let result = run(indoc! {"
    class Point {
      fn __init__(x, y) {
        self.x = x;
        self.y = y;
      }

      fn sum() { return self.x + self.y; }
    }

    p = Point(3, 4);
    total = p.sum();
    px = p.x;
    p.x = 10;
    changed = p.sum();
    name = p.__classname__();
  "});
  assert_variable!(result; total, int 7);
  assert_variable!(result; px, int 3);
  assert_variable!(result; changed, int 14);
  assert_variable!(result; name, string "Point");
}

#[test]
fn class_without_init() {
  let result = run(indoc! {"
    class Empty { }
    e = Empty();
    e.value = 1;
    v = e.value;
  "});
  assert_variable!(result; v, int 1);

  let error = error("class Empty { } e = Empty(1);");
  assert!(matches!(error.kind(), ErrorKind::Signature { .. }));
}

#[test]
fn operator_overloading() {
  let result = run(indoc! {"
    class Vector {
      fn __init__(x) { self.x = x; }
      fn __add__(other: Vector) { return Vector(self.x + other.x); }
      fn __add__(other: int) { return Vector(self.x + other); }
      fn __eq__(other: Vector) { return self.x == other.x; }
    }

    a = (Vector(1) + Vector(2)).x;
    b = (Vector(1) + 5).x;
    c = Vector(3) == Vector(3);
    d = Vector(3) != Vector(4);
  "});
  assert_variable!(result; a, int 3);
  assert_variable!(result; b, int 6);
  assert_variable!(result; c, bool true);
  assert_variable!(result; d, bool true);
}

#[test]
fn methods_dispatch_on_annotations() {
  let result = run(indoc! {"
    class Show {
      fn describe(value: int) { return 'int'; }
      fn describe(value: string) { return 'string'; }
      fn describe(value) { return 'other'; }
    }

    s = Show();
    a = s.describe(1);
    b = s.describe('x');
    c = s.describe(1.5);
  "});
  assert_variable!(result; a, string "int");
  assert_variable!(result; b, string "string");
  assert_variable!(result; c, string "other");
}

#[test]
fn callable_instances() {
  let result = run(indoc! {"
    class Adder {
      fn __init__(n) { self.n = n; }
      fn __call__(x) { return self.n + x; }
    }

    add = Adder(5);
    y = add(1);
  "});
  assert_variable!(result; y, int 6);
}

#[test]
fn fields_holding_functions() {
  let result = run(indoc! {"
    fn double(x) { return x * 2; }

    class Holder { }
    h = Holder();
    h.function = double;
    y = h.function(4);
  "});
  assert_variable!(result; y, int 8);
}

#[test]
fn finalizer_runs_when_last_reference_goes() {
  let (runtime, ticks) = counting_runtime();
  let result = run_with(
    &runtime,
    indoc! {"
      class Resource {
        fn __del__() { tick(); }
      }

      r = Resource();
      copy = r;
      r = nil;
      before = copy == nil;
      copy = nil;
    "},
  );

  assert_variable!(result; before, bool false);
  assert_eq!(ticks.get(), 1);
}

#[test]
fn import_runs_entry_point_every_time() {
  let (runtime, ticks) = counting_runtime();

  let directory = std::env::temp_dir().join(format!("axol-import-{}", std::process::id()));
  fs::create_dir_all(&directory).unwrap();
  fs::write(directory.join("counter.ax"), "tick(); value = 42;").unwrap();

  let source = indoc! {"
    import 'counter';
    import 'counter';
    x = counter.value;
  "};
  let script = Script::from_source("main", source.to_owned(), &runtime).unwrap();
  script.imports().add_path(&directory);
  script.run_main().unwrap();

  assert!(script.imports().is_cached("counter"));
  assert_eq!(ticks.get(), 2);
  let first = script.imports().open(&runtime, "counter").unwrap();
  let second = script.imports().open(&runtime, "counter").unwrap();
  assert!(first.ptr_eq(&second));

  let result = Ok::<_, RuntimeError>(script);
  assert_variable!(result; x, int 42);

  fs::remove_dir_all(&directory).unwrap();
}

#[test]
fn import_forms() {
  let runtime = Runtime::new();
  let library = Script::from_source(
    "library",
    "fn double(x) { return x * 2; } fn triple(x) { return x * 3; }".to_owned(),
    &runtime,
  )
  .unwrap();

  let source = indoc! {"
    import 'library';
    from 'library' import double;
    a = library.triple(2);
    b = double(2);
  "};
  let script = Script::from_source("main", source.to_owned(), &runtime).unwrap();
  script.imports().add(library.module().clone());
  script.run_main().unwrap();

  let module = script.module();
  assert!(module.global("triple").is_none());
  assert!(module.global("library.double").is_some());
  assert_eq!(module.global("a").unwrap().as_int(), Some(6));
  assert_eq!(module.global("b").unwrap().as_int(), Some(4));

  let everything = Script::from_source(
    "main",
    "from 'library' import *; c = triple(3);".to_owned(),
    &runtime,
  )
  .unwrap();
  everything.imports().add(library.module().clone());
  everything.run_main().unwrap();
  assert_eq!(everything.module().global("c").unwrap().as_int(), Some(9));
}

#[test]
fn run_named_function() {
  let runtime = Runtime::new();
  let source = indoc! {"
    offset = 100;
    fn shift(x) { return x + offset; }
  "};
  let script = Script::from_source("main", source.to_owned(), &runtime).unwrap();

  let result = script.run("shift", &[5.into()]).unwrap();
  assert_eq!(result.as_int(), Some(105));
}

#[test]
fn undefined_variable() {
  let error = error("x = y;");
  assert_eq!(error.kind(), &ErrorKind::NoGlobal("y".into()));
  assert_eq!(error.title(), "Undefined Variable");
}

#[test]
fn missing_member() {
  let error = error("x = 1; y = x.missing;");
  assert!(matches!(
    error.kind(),
    ErrorKind::NoMember { class, member } if class == "int" && member == "missing"
  ));
}

#[test]
fn wrong_argument_classes() {
  let error = error("fn f(a: int) { } f('string');");
  assert!(matches!(error.kind(), ErrorKind::Signature { callee, .. } if callee == "f"));

  let error = crate::error("fn f(a) { } f();");
  assert!(matches!(error.kind(), ErrorKind::Signature { .. }));
}

#[test]
fn nil_is_compared_before_methods_are_called() {
  let result = run(indoc! {"
    class Point {
      fn __init__(x) { self.x = x; }
      fn __eq__(other) { return self.x == other.x; }
    }

    p = Point(1);
    a = p == nil;
    b = nil == p;
    c = p != nil;
    d = p == Point(1);
    e = nil != nil;
    f = nil <= nil;
    g = nil >= nil;
  "});
  assert_variable!(result; a, bool false);
  assert_variable!(result; b, bool false);
  assert_variable!(result; c, bool true);
  assert_variable!(result; d, bool true);
  assert_variable!(result; e, bool false);
  assert_variable!(result; f, bool true);
  assert_variable!(result; g, bool true);
}

#[test]
fn universal_members_can_be_loaded() {
  let result = run(indoc! {"
    x = 1;
    classname = x.__classname__;
    a = classname(x);
    b = classname('text');
    less_equal = x.__le__;
  "});
  assert_variable!(result; a, string "int");
  assert_variable!(result; b, string "string");

  let script = result.unwrap();
  let x = script.module().global("x").unwrap();
  assert!(x.has("__classname__"));
  assert!(x.has("__le__"));
  assert!(script.module().global("less_equal").is_some_and(|f| !f.is_nil()));
}

#[test]
fn relative_jumps() {
  // forwards over a return, then backwards when the condition holds
  let result = run_assembled(|assembler| {
    let mut emit = |opcode, operands: &[Operand]| assembler.emit(opcode, operands, None).unwrap();
    emit(OpCode::Jmpr, &[Operand::signed(5)]);
    emit(OpCode::LoadConst, &[Operand::Index(2)]);
    emit(OpCode::Return, &[]);
    emit(OpCode::LoadConst, &[Operand::Index(0)]);
    emit(OpCode::JmprIfTrue, &[Operand::signed(-5)]);
    emit(OpCode::LoadConst, &[Operand::Index(1)]);
    emit(OpCode::Return, &[]);
  });
  assert_eq!(result.unwrap().as_int(), Some(2));

  // taken on `false`, falls through on `true`
  let result = run_assembled(|assembler| {
    let mut emit = |opcode, operands: &[Operand]| assembler.emit(opcode, operands, None).unwrap();
    emit(OpCode::LoadConst, &[Operand::Index(4)]);
    emit(OpCode::JmprIfFalse, &[Operand::signed(5)]);
    emit(OpCode::LoadConst, &[Operand::Index(1)]);
    emit(OpCode::Return, &[]);
    emit(OpCode::LoadConst, &[Operand::Index(0)]);
    emit(OpCode::JmprIfFalse, &[Operand::signed(4)]);
    emit(OpCode::LoadConst, &[Operand::Index(3)]);
    emit(OpCode::Return, &[]);
  });
  assert_eq!(result.unwrap().as_int(), Some(3));
}

#[test]
fn relative_jump_conditions_must_be_booleans() {
  let error = run_assembled(|assembler| {
    let mut emit = |opcode, operands: &[Operand]| assembler.emit(opcode, operands, None).unwrap();
    emit(OpCode::LoadConst, &[Operand::Index(1)]);
    emit(OpCode::JmprIfFalse, &[Operand::signed(3)]);
    emit(OpCode::Leave, &[]);
  })
  .unwrap_err();

  assert!(matches!(error.kind(), ErrorKind::Class(_)));
  assert_eq!(error.opcode(), Some(OpCode::JmprIfFalse));
}

#[test]
fn conditions_must_be_booleans() {
  assert!(matches!(error("if 1 { }").kind(), ErrorKind::Class(_)));
  assert!(matches!(error("while 'yes' { }").kind(), ErrorKind::Class(_)));
}

#[test]
fn arithmetic_errors() {
  let error = error("x = 1 / 0;");
  assert_eq!(error.kind(), &ErrorKind::Arithmetic("division by zero"));

  let overflow = run("x = 9223372036854775807 + 1;").unwrap_err();
  assert_eq!(overflow.kind(), &ErrorKind::Arithmetic("integer overflow"));
}

#[test]
fn missing_module() {
  let error = error("import 'does_not_exist';");
  assert_eq!(error.kind(), &ErrorKind::NoFile("does_not_exist".into()));
}

#[test]
fn traceback() {
  let error = error(indoc! {"
    fn inner() { return nil + 1; }
    fn outer() { return inner(); }
    outer();
  "});

  assert!(matches!(error.kind(), ErrorKind::NoMember { .. }));
  assert_eq!(error.location().unwrap().entry.line, 1);
  assert_eq!(
    error.traceback().unwrap(),
    indoc! {"
      in function 'inner' at line 1 (main)
      in function 'outer' at line 2 (main)
      at line 3 (main)
    "}
  );
  assert!(error.message().contains("METHOD"));
}

#[test]
fn deep_recursion_is_an_error() {
  let error = error("fn forever(n) { return forever(n + 1); } forever(0);");
  assert!(matches!(error.kind(), ErrorKind::Internal(_)));
}
