//! # Compiler Error Tests
//!
//! Inputs (generally pathological) which fail to compile, and some large inputs
//! which should still compile.

use axol_interpreter::{CompileError, Runtime, Script, compile};
use axol_syntax::parse;
use std::fmt::Write;

fn compile_error(source: &str) -> CompileError {
  let ast = parse(source.to_owned());
  match compile(&ast, "main") {
    Ok(_) => panic!("Expected an error compiling {source:?}"),
    Err(error) => error,
  }
}

#[test]
fn invalid_ast() {
  // expression
  assert_eq!(compile_error("&hello;"), CompileError::InvalidAST);
  // missing semicolon
  assert_eq!(compile_error("hello = 5"), CompileError::InvalidAST);
  // missing value
  assert_eq!(compile_error("x = ;"), CompileError::InvalidAST);
  // nested function
  assert_eq!(compile_error("fn a() { fn b() { } }"), CompileError::InvalidAST);
}

#[test]
fn duplicate_definitions() {
  let error = compile_error("fn a() { } fn a() { }");
  assert!(matches!(error, CompileError::DuplicateDefinition(ref name, _) if name == "a"));
  assert_eq!(error.title(), "Duplicate Definition");

  let error = compile_error("class A { } fn A() { }");
  assert!(matches!(error, CompileError::DuplicateDefinition(ref name, _) if name == "A"));

  let error = compile_error("class A { } class A { }");
  assert!(matches!(error, CompileError::DuplicateDefinition(..)));
}

#[test]
fn overloaded_methods_are_not_duplicates() {
  let ast = parse("class A { fn f(x: int) { } fn f(x: float) { } }".to_owned());
  assert!(compile(&ast, "main").is_ok());
}

#[test]
fn unknown_class_annotation() {
  let source = "fn f(a: Nope) { }";
  let error = compile_error(source);

  let CompileError::UnknownClass(name, _) = &error else {
    panic!("Expected UnknownClass, got {error}");
  };
  assert_eq!(name, "Nope");
  assert_eq!(error.message(), "class `Nope` is not defined");
}

#[test]
fn annotations_can_refer_to_later_classes() {
  let ast = parse("fn f(p: Point) { } class Point { }".to_owned());
  assert!(compile(&ast, "main").is_ok());

  let ast = parse("fn f(a: int, b: string, c: Any, d: nil, e: function) { }".to_owned());
  assert!(compile(&ast, "main").is_ok());
}

#[test]
fn nul_in_string() {
  let error = compile_error("x = 'a\\0b';");
  assert!(matches!(error, CompileError::NulInString(_)));
  assert_eq!(error.title(), "Invalid String");
}

#[test]
fn many_constants() {
  let mut source = String::new();
  for i in 0..5000 {
    let _ = writeln!(source, "v{i} = {i};");
  }
  source.push_str("return v731;");

  let runtime = Runtime::new();
  let script = Script::from_source("main", source, &runtime).unwrap();
  let result = script.run_main().unwrap();
  assert_eq!(result.as_int(), Some(731));
}

#[test]
fn many_locals() {
  let mut source = String::from("fn f() {\n");
  for i in 0..1000 {
    let _ = writeln!(source, "  v{i} = {i};");
  }
  source.push_str("  return v1 + v702;\n}\nreturn f();");

  let runtime = Runtime::new();
  let script = Script::from_source("main", source, &runtime).unwrap();
  let result = script.run_main().unwrap();
  assert_eq!(result.as_int(), Some(703));
}
