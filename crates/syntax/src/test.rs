use crate::{
  AST, ParseError, ParseWarning, Span, TokenKind,
  ast::{Expression, Statement, expression::LiteralValue},
};
use indoc::indoc;

fn parse(source: &str) -> AST {
  crate::parse(source.to_owned())
}
impl AST {
  fn is_ok(&self) -> bool {
    self.errors.is_empty()
  }

  fn is_err(&self) -> bool {
    !self.is_ok()
  }
}

fn parse_to_string(source: &str) -> String {
  crate::parse(source.to_owned()).to_string()
}

#[test]
fn empty_source() {
  assert!(parse("").is_ok());
  assert!(parse("   \n\n\t ").is_ok());
  assert!(parse("// just a comment").is_ok());
  assert!(parse("").root_statements.is_empty());
}

#[test]
fn unterminated_string() {
  assert!(parse("x = 'unterminated string;").is_err());
  assert!(parse("x = \"un;").is_err());

  assert!(parse("x = '';").is_ok());
  assert!(parse("x = \"hello world\";").is_ok());
  assert!(parse("x = 'it\\'s';").is_ok());
}

#[test]
fn unknown_character() {
  assert!(parse("x = ¬;").is_err());
  assert!(parse("x = 3 $ 4;").is_err());
  assert!(parse("x = 🤗;").is_err());
  assert!(parse("&;").is_err());

  assert!(parse("x = '¬';").is_ok());
  assert!(parse("x = '🤗';").is_ok());
}

#[test]
fn assignment() {
  let ast = parse_to_string("x = 4 + 23;");
  let expected = indoc! {"
    ├─ Assignment
    │  ├─ Variable (x)
    │  ╰─ Binary (+)
    │     ├─ Number (4)
    │     ╰─ Number (23)
  "};
  assert_eq!(ast, expected);
}

#[test]
fn precedence() {
  let ast = parse_to_string("y = 1 + 2 * 3;");
  let expected = indoc! {"
    ├─ Assignment
    │  ├─ Variable (y)
    │  ╰─ Binary (+)
    │     ├─ Number (1)
    │     ╰─ Binary (*)
    │        ├─ Number (2)
    │        ╰─ Number (3)
  "};
  assert_eq!(ast, expected);

  let ast = parse_to_string("y = (1 + 2) * 3;");
  let expected = indoc! {"
    ├─ Assignment
    │  ├─ Variable (y)
    │  ╰─ Binary (*)
    │     ├─ Group
    │     │  ╰─ Binary (+)
    │     │     ├─ Number (1)
    │     │     ╰─ Number (2)
    │     ╰─ Number (3)
  "};
  assert_eq!(ast, expected);

  let ast = parse_to_string("z = !a or b and c == -1;");
  let expected = indoc! {"
    ├─ Assignment
    │  ├─ Variable (z)
    │  ╰─ Binary (or)
    │     ├─ Unary (!)
    │     │  ╰─ Variable (a)
    │     ╰─ Binary (and)
    │        ├─ Variable (b)
    │        ╰─ Binary (==)
    │           ├─ Variable (c)
    │           ╰─ Unary (-)
    │              ╰─ Number (1)
  "};
  assert_eq!(ast, expected);
}

#[test]
fn method_call() {
  let ast = parse_to_string("p.move(1, 2);");
  let expected = indoc! {"
    ├─ Call
    │  ├─ Member (.move)
    │  │  ╰─ Variable (p)
    │  ╰─ Arguments
    │     ├─ Number (1)
    │     ╰─ Number (2)
  "};
  assert_eq!(ast, expected);

  let ast = parse_to_string("f();");
  let expected = indoc! {"
    ├─ Call
    │  ╰─ Variable (f)
  "};
  assert_eq!(ast, expected);
}

#[test]
fn function() {
  let ast = parse_to_string("fn add(a: int, b) { return a + b; }");
  let expected = indoc! {"
    ├─ Function add(a: int, b)
    │  ╰─ Block
    │     ╰─ Return
    │        ╰─ Binary (+)
    │           ├─ Variable (a)
    │           ╰─ Variable (b)
  "};
  assert_eq!(ast, expected);

  let ast = parse("fn add(a: int, b) { return a + b; }");
  let Statement::Function(function) = &ast.root_statements[0] else {
    panic!("expected function");
  };
  assert_eq!(function.name(&ast), "add");
  let parameters = function.parameters();
  assert_eq!(parameters.len(), 2);
  assert_eq!(parameters[0].annotation(&ast), Some("int"));
  assert_eq!(parameters[1].annotation(&ast), None);
}

#[test]
fn class() {
  let source = indoc! {"
    class Point {
      fn __init__(x, y) {
        self.x = x;
        self.y = y;
      }
      fn sum() { return self.x + self.y; }
    }
  "};
  let ast = parse(source);
  assert!(ast.is_ok());

  let Statement::Class(class) = &ast.root_statements[0] else {
    panic!("expected class");
  };
  assert_eq!(class.name(&ast), "Point");
  let methods = class.methods(&ast).map(|m| m.name(&ast)).collect::<Vec<_>>();
  assert_eq!(methods, ["__init__", "sum"]);

  assert!(parse("class A { x = 1; }").is_err());
}

#[test]
fn if_else() {
  let ast = parse_to_string("if x { y = 1; } else { y = 2; }");
  let expected = indoc! {"
    ├─ If
    │  ├─ Variable (x)
    │  ├─ Block
    │  │  ╰─ Assignment
    │  │     ├─ Variable (y)
    │  │     ╰─ Number (1)
    │  ╰─ Else
    │     ╰─ Block
    │        ╰─ Assignment
    │           ├─ Variable (y)
    │           ╰─ Number (2)
  "};
  assert_eq!(ast, expected);

  assert!(parse("if a { } else if b { } else { }").is_ok());
  assert!(parse("if a x = 1;").is_err());
}

#[test]
fn while_loop() {
  let ast = parse_to_string("while i < 3 { i = i + 1; }");
  let expected = indoc! {"
    ├─ While
    │  ├─ Binary (<)
    │  │  ├─ Variable (i)
    │  │  ╰─ Number (3)
    │  ╰─ Block
    │     ╰─ Assignment
    │        ├─ Variable (i)
    │        ╰─ Binary (+)
    │           ├─ Variable (i)
    │           ╰─ Number (1)
  "};
  assert_eq!(ast, expected);
}

#[test]
fn imports() {
  let ast = parse_to_string("import \"maths\"; from \"m\" import x; from \"m\" import *;");
  let expected = indoc! {"
    ├─ Import (maths)
    ├─ Import (m: x)
    ├─ Import (m: *)
  "};
  assert_eq!(ast, expected);

  assert!(parse("import maths;").is_err());
  assert!(parse("from \"m\" import 5;").is_err());
  assert!(parse("import \"m\"").is_err());
}

#[test]
fn literals() {
  let ast = parse("x = 'a\\nb'; y = 1_000; z = 2.5; n = nil; t = true;");
  assert!(ast.is_ok());

  let values = ast
    .root_statements
    .iter()
    .map(|statement| match statement {
      Statement::Assignment(assignment) => match assignment.value(&ast) {
        Expression::Literal(literal) => literal.value(&ast),
        _ => panic!("expected literal"),
      },
      _ => panic!("expected assignment"),
    })
    .collect::<Vec<_>>();

  assert_eq!(values, [
    LiteralValue::String("a\nb".into()),
    LiteralValue::Integer(1000),
    LiteralValue::Float(2.5),
    LiteralValue::Nil,
    LiteralValue::Boolean(true),
  ]);
}

#[test]
fn top_level_return() {
  let ast = parse("x = 1; y = x + 2; return y;");
  assert!(ast.is_ok());
  assert_eq!(ast.root_statements.len(), 3);
  assert!(matches!(ast.root_statements[2], Statement::Return(_)));

  assert!(parse("return;").is_ok());
}

#[test]
fn errors() {
  assert!(parse("x = 1").is_err());
  assert!(parse("x = ;").is_err());
  assert!(parse("f(1, 2;").is_err());

  let ast = parse("1 = 2;");
  assert!(matches!(
    ast.errors[..],
    [ParseError::InvalidAssignmentTarget(_)]
  ));

  let ast = parse("fn a() { fn b() {} }");
  assert!(matches!(ast.errors[..], [ParseError::NestedDeclaration(_)]));

  let ast = parse("x = 5 +;");
  assert_eq!(ast.errors[0].title(), "Expected Expression");
  assert_eq!(ast.errors[0].message(), "expected expression but got ;");
  assert_eq!(ast.errors[0].span(), Span::new(7, 8));
}

#[test]
fn error_recovery() {
  let ast = parse("x = ; y = 2; z = 3;");
  assert_eq!(ast.errors.len(), 1);
  assert_eq!(ast.root_statements.len(), 3);

  let ast = parse("fn f() { x = ); return 1; }");
  assert_eq!(ast.errors.len(), 1);
  assert_eq!(ast.root_statements.len(), 1);
}

#[test]
fn warnings() {
  let ast = parse(";");
  assert!(ast.is_ok());
  assert!(matches!(ast.warnings[..], [ParseWarning::EmptyStatement(_)]));

  let ast = parse("1 + 2;");
  assert!(matches!(ast.warnings[..], [ParseWarning::UnusedExpression(_)]));
  assert_eq!(ast.warnings[0].title(), "Unused Expression");

  let ast = parse("fn f() { return 1; x = 2; }");
  assert!(matches!(ast.warnings[..], [ParseWarning::UnreachableCode(_)]));

  assert!(parse("print(1);").warnings.is_empty());
}

#[test]
fn tokens() {
  let kinds = crate::tokenise("x = 1.5; // done\nfrom")
    .map(|token| token.kind)
    .collect::<Vec<_>>();
  assert_eq!(kinds, [
    TokenKind::Identifier,
    TokenKind::Equal,
    TokenKind::Float,
    TokenKind::Semicolon,
    TokenKind::Comment,
    TokenKind::From,
  ]);

  let ast = parse("x = 1; // comment");
  assert_eq!(ast.tokens.last().map(|t| t.kind), Some(TokenKind::EndOfFile));
  assert!(ast.tokens.iter().all(|t| t.kind != TokenKind::Comment));
}

#[test]
fn line_index() {
  let ast = parse("x = 1;\ny = 2;\n  z = 3;");
  let index = ast.line_index();

  let spans = ast
    .root_statements
    .iter()
    .map(|statement| index.line_col(statement.span(&ast)))
    .collect::<Vec<_>>();
  assert_eq!(spans, [(1, 1), (2, 1), (3, 3)]);

  assert_eq!(index.line_span(2), Span::new(7, 14));
}
