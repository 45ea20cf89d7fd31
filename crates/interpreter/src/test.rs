use crate::{
  ANY_ID, BUILTIN_MODULE, Class, Engine, Module, NativeFunction, Object, Runtime, Signature,
  class_id,
  compiler::{Instruction, lower},
  names,
};
use axol_blob::{OpCode, Operand};
use axol_syntax::parse;
use indoc::indoc;
use std::{cell::Cell, rc::Rc};

fn returns(name: &str, class: &str, result: i64) -> NativeFunction {
  let signature = match class {
    "Any" => Signature::fixed([ANY_ID]),
    class => Signature::fixed([class_id(class, BUILTIN_MODULE)]),
  };
  NativeFunction::new(name, signature, move |_, _| Ok(result.into()))
}

#[test]
fn first_matching_overload_is_called() {
  let runtime = Runtime::new();
  let mut engine = Engine::new(runtime);

  let function = Object::overloaded([
    returns("f", "int", 1),
    returns("f", "string", 2),
    returns("f", "Any", 3),
  ]);

  let call = |engine: &mut Engine, argument: Object| {
    (function.invoke(engine, &[argument]).unwrap())
      .as_int()
      .unwrap()
  };
  assert_eq!(call(&mut engine, 5.into()), 1);
  assert_eq!(call(&mut engine, "text".into()), 2);
  assert_eq!(call(&mut engine, 1.5.into()), 3);
  assert_eq!(call(&mut engine, Object::nil()), 3);
}

#[test]
fn polymorphic_members_are_found_by_arguments() {
  let object = Object::builtin("function", crate::Value::Instance);
  object.add_polymorphic("describe", returns("describe", "int", 1).into());
  object.add_polymorphic("describe", returns("describe", "float", 2).into());

  assert!(object.is_polymorphic("describe"));
  assert!(object.find_polymorphic("describe", &[1.into()]).is_some());
  assert!(object.find_polymorphic("describe", &["no".into()]).is_none());
  assert!(object.get_member("describe").is_err());
}

#[test]
fn finalizer_runs_once_when_last_reference_is_dropped() {
  let finalized = Rc::new(Cell::new(0));

  let class = Class::new("Counted", "test");
  let counter = finalized.clone();
  let finalizer = NativeFunction::new(names::FINALIZER, Signature::fixed([ANY_ID]), move |_, _| {
    counter.set(counter.get() + 1);
    Ok(Object::nil())
  });
  class.add_member(names::FINALIZER, finalizer.into());

  let instance = Object::instance(&class);
  let weak = instance.downgrade();
  let copies = (0..4).map(|_| instance.clone()).collect::<Vec<_>>();
  assert_eq!(instance.strong_count(), 5);

  drop(copies);
  assert_eq!(instance.strong_count(), 1);
  assert_eq!(finalized.get(), 0);
  assert!(!weak.is_nil());

  drop(instance);
  assert_eq!(finalized.get(), 1);
  assert!(weak.is_nil());
  assert!(weak.upgrade().is_none());
}

#[test]
fn native_finalizer_runs_with_the_runtime_of_its_class() {
  let runtime = Runtime::new();
  runtime.add_prelude("marker", Object::from(7));
  let seen = Rc::new(Cell::new(None));

  let class = Class::new("Tracked", "test");
  let record = seen.clone();
  let signature = Signature::fixed([ANY_ID]);
  let finalizer = NativeFunction::new(names::FINALIZER, signature, move |engine, _| {
    record.set(engine.runtime().prelude("marker").and_then(|marker| marker.as_int()));
    Ok(Object::nil())
  });
  class.add_member(names::FINALIZER, finalizer.into());
  runtime.register_class(class.clone()).unwrap();
  assert!(class.runtime().is_some_and(|attached| Rc::ptr_eq(&attached, &runtime)));

  drop(Object::instance(&class));
  assert_eq!(seen.get(), Some(7));
}

#[test]
fn universal_members_once_bound_to_a_runtime() {
  let runtime = Runtime::new();
  let number = Object::from(1);
  assert!(!number.has(names::CLASSNAME));

  runtime.bind(&number);
  assert!(number.has(names::CLASSNAME));
  assert!(number.has(names::LESS_EQUAL));
  assert!(number.is_polymorphic(names::EQUAL));
  assert!(number.get_member(names::CLASSNAME).is_ok());
  assert!(runtime.member(&number, names::GREATER_EQUAL).is_ok());
}

#[test]
fn weak_references_read_as_nil_once_dropped() {
  let strong = Object::instance(&Class::new("Thing", "test"));
  let weak = strong.downgrade();

  assert!(weak.is_weak());
  assert!(weak.ptr_eq(&strong));
  assert_eq!(weak.class_name(), "Thing");

  drop(strong);
  assert!(weak.is_nil());
  assert_eq!(weak.class_name(), "nil");
}

fn exporting_module(runtime: &Rc<Runtime>) -> Module {
  let module = Module::new("m", runtime);
  module.set_global("a", 1.into());
  module.set_global("b", 2.into());
  module.set_global("__main__", Object::nil());
  module
}

#[test]
fn export_everything_unqualified() {
  let runtime = Runtime::new();
  let source = exporting_module(&runtime);
  let target = Module::new("t", &runtime);

  source.export_to(&target, "*", "m", None);
  assert_eq!(target.global_names(), ["a", "b", "m.__main__"]);
}

#[test]
fn export_everything_qualified() {
  let runtime = Runtime::new();
  let source = exporting_module(&runtime);
  let target = Module::new("t", &runtime);

  let mut exported = Vec::new();
  let mut hook = |name: &str, _: &Object| exported.push(name.to_owned());
  source.export_to(&target, "", "alias", Some(&mut hook));

  assert_eq!(exported, ["alias.__main__", "alias.a", "alias.b"]);
  assert_eq!(target.global_names(), ["alias.__main__", "alias.a", "alias.b"]);
}

#[test]
fn export_single_name() {
  let runtime = Runtime::new();
  let source = exporting_module(&runtime);
  let target = Module::new("t", &runtime);
  target.set_global("a", "old".into());

  source.export_to(&target, "a", "m", None);
  assert_eq!(target.global_names(), ["a", "m.__main__"]);
  assert_eq!(target.global("a").unwrap().as_int(), Some(1));
}

#[test]
fn arguments_are_negative_constant_slots() {
  let ast = parse("fn f(a, b) { c = a - b; return c; }".to_owned());
  let program = lower(&ast, "main").unwrap();
  let function = (program.functions.iter())
    .find(|function| function.name == "f")
    .unwrap();

  assert_eq!(function.locals, 1);
  let loads = (function.body.iter())
    .filter_map(|instruction| match instruction {
      Instruction::Op {
        opcode: OpCode::LoadConst,
        operands,
        ..
      } => operands.first().cloned(),
      _ => None,
    })
    .collect::<Vec<_>>();
  assert_eq!(loads, [Operand::signed(-1), Operand::signed(-2)]);
}

#[test]
fn lowered_program_display() {
  let ast = parse("x = 1; y = x + 2; return y;".to_owned());
  let program = lower(&ast, "main").unwrap();

  assert_eq!(
    program.to_string(),
    indoc! {r#"
      module main
      constants
        #0 int "1"
        #1 int "2"

      fn __main__() locals 0
        LOAD_CONST #0
        STOR_GLOBAL 'x'
        LOAD_GLOBAL 'x'
        LOAD_CONST #1
        METHOD '__add__' 1
        STOR_GLOBAL 'y'
        LOAD_GLOBAL 'y'
        RETURN
        LEAVE
    "#}
  );
}

#[test]
fn constants_are_deduplicated() {
  let ast = parse("a = 1; b = 1; c = '1'; d = 1.0;".to_owned());
  let program = lower(&ast, "main").unwrap();

  assert_eq!(program.constants.len(), 3);
}

#[test]
fn methods_are_attached_to_classes() {
  let ast = parse(
    indoc! {"
      class Point {
        fn __init__(x) { self.x = x; }
        fn get() { return self.x; }
      }
    "}
    .to_owned(),
  );
  let program = lower(&ast, "main").unwrap();

  assert_eq!(program.classes.len(), 1);
  let methods = (program.classes[0].methods.iter())
    .map(|index| program.functions[*index].name.as_str())
    .collect::<Vec<_>>();
  assert_eq!(methods, ["Point.__init__", "Point.get"]);
}
