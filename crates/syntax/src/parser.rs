use crate::{
  ast::{AST, ExpressionIdx, StatementIdx, TokenIdx, expression::*, statement::*},
  span::Span,
  tokeniser::{Token, TokenKind},
};
use thin_vec::ThinVec;

pub struct Parser<'ast> {
  /// The AST being built up by the parser
  ast: &'ast mut AST,

  /// The current token
  position: usize,
  /// How many functions are we currently in
  function_depth: usize,
  /// Have we encountered an error, and want to resync at the next chance?
  should_resync: bool,
}
impl<'ast> Parser<'ast> {
  pub fn new(ast: &'ast mut AST) -> Self {
    Self {
      ast,
      position: 0,
      function_depth: 0,
      should_resync: false,
    }
  }

  pub fn parse(mut self) {
    while !self.is_finished() {
      if let Some(statement) = self.parse_statement() {
        self.ast.root_statements.push(statement);
      }
    }

    tracing::debug!(
      statements = self.ast.root_statements.len(),
      errors = self.ast.errors.len(),
      warnings = self.ast.warnings.len(),
      "parsed source"
    );
  }

  fn add_error(&mut self, error: ParseError) {
    self.ast.errors.push(error);
  }

  fn add_warning(&mut self, warning: ParseWarning) {
    self.ast.warnings.push(warning);
  }

  fn is_finished(&self) -> bool {
    self.current_kind() == TokenKind::EndOfFile
  }

  fn current_token_id(&self) -> TokenIdx {
    TokenIdx::new(self.position.min(self.ast.tokens.len() - 1))
  }

  fn current_token(&self) -> Token {
    self.ast[self.current_token_id()]
  }

  fn current_kind(&self) -> TokenKind {
    self.current_token().kind
  }

  #[must_use]
  fn advance(&mut self) -> (TokenKind, TokenIdx) {
    let result = (self.current_kind(), self.current_token_id());
    if !self.is_finished() {
      self.position += 1;
    }
    result
  }

  fn expect(&mut self, kind: TokenKind) -> Option<TokenIdx> {
    if self.current_kind() == kind {
      Some(self.advance().1)
    } else {
      self.add_error(ParseError::Expected {
        expected: kind,
        received: self.current_token(),
      });

      None
    }
  }

  fn matches(&mut self, kind: TokenKind) -> Option<TokenIdx> {
    (self.current_kind() == kind).then(|| self.advance().1)
  }

  /// Skip to the end of the current statement, without consuming a closing bracket
  fn resync(&mut self) {
    while !matches!(
      self.current_kind(),
      TokenKind::Semicolon | TokenKind::RightCurly | TokenKind::EndOfFile
    ) {
      self.position += 1;
    }
  }

  fn expect_semicolon(&mut self) -> TokenIdx {
    if self.should_resync {
      self.should_resync = false;
      self.resync();
      return self.matches(TokenKind::Semicolon).unwrap_or(self.current_token_id());
    }

    let token = self.current_token_id();
    if self.expect(TokenKind::Semicolon).is_none() {
      self.resync();
      let _ = self.matches(TokenKind::Semicolon);
    }
    token
  }

  fn parse_expression(&mut self) -> ExpressionIdx {
    self.parse_expression_with_precedence(ParsePrecedence::LOWEST)
  }

  fn parse_expression_with_precedence(&mut self, precedence: ParsePrecedence) -> ExpressionIdx {
    let (kind, token) = self.advance();
    let mut previous = match self.prefix_expression(kind, token) {
      Ok(expression) => expression,
      Err(error) => {
        // leave the end of the statement to be found by resync
        if matches!(kind, TokenKind::Semicolon | TokenKind::RightCurly) {
          self.position -= 1;
        }
        self.add_error(error);
        self.should_resync = true;
        return self.ast.add_expression(Invalid { token });
      }
    };

    while precedence <= ParsePrecedence::from(self.current_kind()) {
      let (kind, token) = self.advance();
      previous = self.infix_expression(previous, kind, token);
    }

    previous
  }

  /// Parse a prefix expression
  ///
  /// An expression which starts/ makes up the first part of the expression
  fn prefix_expression(
    &mut self,
    token_kind: TokenKind,
    token: TokenIdx,
  ) -> Result<ExpressionIdx, ParseError> {
    match token_kind {
      TokenKind::True
      | TokenKind::False
      | TokenKind::Nil
      | TokenKind::Integer
      | TokenKind::Float
      | TokenKind::String => Ok(self.ast.add_expression(Literal { token })),

      TokenKind::Identifier => Ok(self.ast.add_expression(Variable { token })),

      TokenKind::LeftParen => Ok(self.group(token)),
      TokenKind::Minus | TokenKind::Bang => Ok(self.unary(token)),

      TokenKind::Unknown => Err(ParseError::UnknownCharacter(self.ast[token])),
      TokenKind::UnterminatedString => Err(ParseError::UnterminatedString(self.ast[token])),
      _ => Err(ParseError::ExpectedExpression(self.ast[token])),
    }
  }

  /// Parse an infix expression
  ///
  /// An expression which relies on a previous expression to be complete.
  /// Passes the previously parsed expression to make up the start of the expression.
  fn infix_expression(
    &mut self,
    lhs: ExpressionIdx,
    kind: TokenKind,
    operator: TokenIdx,
  ) -> ExpressionIdx {
    match kind {
      TokenKind::LeftParen => self.call(lhs, operator),
      TokenKind::Dot => self.member(lhs, operator),
      _ => self.binary(lhs, kind, operator),
    }
  }

  fn identifier(&mut self) -> Option<TokenIdx> {
    if self.current_kind() == TokenKind::Identifier {
      return Some(self.advance().1);
    }

    self.add_error(ParseError::MissingIdentifier(self.current_token()));
    None
  }
}
// Expressions
impl Parser<'_> {
  fn binary(&mut self, left: ExpressionIdx, kind: TokenKind, operator: TokenIdx) -> ExpressionIdx {
    let right = self.parse_expression_with_precedence(ParsePrecedence::from(kind).next());

    self.ast.add_expression(Binary {
      left,
      operator,
      right,
    })
  }

  fn call(&mut self, callee: ExpressionIdx, opening: TokenIdx) -> ExpressionIdx {
    let mut arguments = ThinVec::new();

    if !matches!(
      self.current_kind(),
      TokenKind::RightParen | TokenKind::EndOfFile
    ) {
      loop {
        arguments.push(self.parse_expression());
        if self.matches(TokenKind::Comma).is_none() {
          break;
        }
      }
    }

    let closing = self.expect(TokenKind::RightParen);

    self.ast.add_expression(Call {
      callee,
      opening,
      arguments,
      closing,
    })
  }

  fn group(&mut self, start: TokenIdx) -> ExpressionIdx {
    let expression = self.parse_expression();
    let end = self.expect(TokenKind::RightParen);

    self.ast.add_expression(Group {
      start,
      expression,
      end,
    })
  }

  fn member(&mut self, object: ExpressionIdx, dot: TokenIdx) -> ExpressionIdx {
    let name = self.identifier();

    self.ast.add_expression(Member { object, dot, name })
  }

  fn unary(&mut self, operator: TokenIdx) -> ExpressionIdx {
    let expression = self.parse_expression_with_precedence(ParsePrecedence::Unary);

    self.ast.add_expression(Unary {
      operator,
      expression,
    })
  }
}
// Statements
impl Parser<'_> {
  fn parse_statement(&mut self) -> Option<Statement> {
    match self.current_kind() {
      TokenKind::Semicolon => {
        let (_, token) = self.advance();
        self.add_warning(ParseWarning::EmptyStatement(self.ast[token].into()));
        None
      }
      TokenKind::LeftCurly => {
        let (_, token) = self.advance();
        Some(self.block(token))
      }
      TokenKind::Class => {
        let (_, token) = self.advance();
        Some(self.class(token))
      }
      TokenKind::Fn => {
        let (_, token) = self.advance();
        Some(self.function(token))
      }
      TokenKind::If => {
        let (_, token) = self.advance();
        Some(self.if_(token))
      }
      TokenKind::Import | TokenKind::From => {
        let (kind, token) = self.advance();
        Some(self.import(kind, token))
      }
      TokenKind::Return => {
        let (_, token) = self.advance();
        Some(self.return_(token))
      }
      TokenKind::While => {
        let (_, token) = self.advance();
        Some(self.while_(token))
      }
      _ => Some(self.expression_statement()),
    }
  }

  /// A statement which must be a block, such as the body of a function.
  fn body(&mut self) -> StatementIdx {
    if let Some(opening) = self.matches(TokenKind::LeftCurly) {
      let block = self.block(opening);
      return self.ast.add_statement(block);
    }

    self.add_error(ParseError::Expected {
      expected: TokenKind::LeftCurly,
      received: self.current_token(),
    });
    let opening = self.current_token_id();
    let mut statements = ThinVec::new();
    if !self.is_finished() {
      if let Some(statement) = self.parse_statement() {
        statements.push(self.ast.add_statement(statement));
      }
    }

    self.ast.add_statement(Block {
      opening,
      statements,
      closing: None,
    })
  }

  fn block(&mut self, opening: TokenIdx) -> Statement {
    let mut statements = ThinVec::new();
    let mut returned = false;

    while !matches!(
      self.current_kind(),
      TokenKind::RightCurly | TokenKind::EndOfFile
    ) {
      let Some(statement) = self.parse_statement() else {
        continue;
      };

      if returned {
        self.add_warning(ParseWarning::UnreachableCode(statement.span(self.ast)));
        returned = false;
      }
      if let Statement::Return(_) = statement {
        returned = true;
      }

      statements.push(self.ast.add_statement(statement));
    }
    let closing = self.expect(TokenKind::RightCurly);

    Statement::Block(Block {
      opening,
      statements,
      closing,
    })
  }

  fn class(&mut self, keyword: TokenIdx) -> Statement {
    if self.function_depth > 0 {
      self.add_error(ParseError::NestedDeclaration(self.ast[keyword]));
    }

    let name = self.identifier();
    let mut methods = ThinVec::new();

    if self.expect(TokenKind::LeftCurly).is_some() {
      while !matches!(
        self.current_kind(),
        TokenKind::RightCurly | TokenKind::EndOfFile
      ) {
        if let Some(keyword) = self.matches(TokenKind::Fn) {
          let method = self.function(keyword);
          methods.push(self.ast.add_statement(method));
        } else {
          let (_, token) = self.advance();
          self.add_error(ParseError::ExpectedMethod(self.ast[token]));
        }
      }
    }
    let closing = self.expect(TokenKind::RightCurly);

    Statement::Class(Class {
      keyword,
      name,
      methods,
      closing,
    })
  }

  fn expression_statement(&mut self) -> Statement {
    let expression = self.parse_expression();

    let statement = if self.matches(TokenKind::Equal).is_some() {
      if !self.ast[expression].is_assignable() {
        let span = self.ast[expression].span(self.ast);
        self.add_error(ParseError::InvalidAssignmentTarget(span));
      }

      let value = self.parse_expression();
      Statement::Assignment(Assignment {
        target: expression,
        value,
      })
    } else {
      match &self.ast[expression] {
        Expression::Call(_) | Expression::Invalid(_) => {}
        other => {
          let span = other.span(self.ast);
          self.add_warning(ParseWarning::UnusedExpression(span));
        }
      }

      Statement::Expression(ExpressionStmt { expression })
    };

    self.expect_semicolon();
    statement
  }

  fn function(&mut self, keyword: TokenIdx) -> Statement {
    if self.function_depth > 0 {
      self.add_error(ParseError::NestedDeclaration(self.ast[keyword]));
    }

    let name = self.identifier();
    let mut parameters = ThinVec::new();

    if self.expect(TokenKind::LeftParen).is_some() {
      while !matches!(
        self.current_kind(),
        TokenKind::RightParen | TokenKind::LeftCurly | TokenKind::EndOfFile
      ) {
        let Some(name) = self.identifier() else {
          let _ = self.advance();
          continue;
        };
        let annotation = self
          .matches(TokenKind::Colon)
          .and_then(|_| self.identifier());
        parameters.push(Parameter { name, annotation });

        if self.matches(TokenKind::Comma).is_none() {
          break;
        }
      }
      self.expect(TokenKind::RightParen);
    }

    self.function_depth += 1;
    let body = self.body();
    self.function_depth -= 1;

    Statement::Function(Function {
      keyword,
      name,
      parameters,
      body,
    })
  }

  fn if_(&mut self, keyword: TokenIdx) -> Statement {
    let condition = self.parse_expression();
    self.should_resync = false;
    let then = self.body();

    let otherwise = self.matches(TokenKind::Else).map(|_| {
      if let Some(keyword) = self.matches(TokenKind::If) {
        let statement = self.if_(keyword);
        self.ast.add_statement(statement)
      } else {
        self.body()
      }
    });

    Statement::If(If {
      keyword,
      condition,
      then,
      otherwise,
    })
  }

  fn import(&mut self, kind: TokenKind, keyword: TokenIdx) -> Statement {
    let module = self.expect(TokenKind::String);

    let items = if kind == TokenKind::From {
      self.expect(TokenKind::Import);
      if self.matches(TokenKind::Star).is_some() {
        ImportItems::All
      } else {
        self
          .identifier()
          .map_or(ImportItems::All, ImportItems::Named)
      }
    } else {
      ImportItems::Qualified
    };

    let end = self.expect_semicolon();

    Statement::Import(Import {
      keyword,
      module,
      items,
      end,
    })
  }

  fn return_(&mut self, keyword: TokenIdx) -> Statement {
    let value = (!matches!(
      self.current_kind(),
      TokenKind::Semicolon | TokenKind::RightCurly | TokenKind::EndOfFile
    ))
    .then(|| self.parse_expression());
    self.expect_semicolon();

    Statement::Return(Return { keyword, value })
  }

  fn while_(&mut self, keyword: TokenIdx) -> Statement {
    let condition = self.parse_expression();
    self.should_resync = false;
    let body = self.body();

    Statement::While(While {
      keyword,
      condition,
      body,
    })
  }
}

/// The precendence of the different operators
#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Eq)]
enum ParsePrecedence {
  None = 1,
  Or,         // or
  And,        // and
  Equality,   // == !=
  Comparison, // < > <= >=
  Term,       // + -
  Factor,     // * / %
  Unary,      // ! -
  Call,       // () .
  Primary,    // string, number, variable
}
impl ParsePrecedence {
  const LOWEST: Self = Self::Or;

  fn next(self) -> Self {
    match self {
      Self::None => Self::Or,
      Self::Or => Self::And,
      Self::And => Self::Equality,
      Self::Equality => Self::Comparison,
      Self::Comparison => Self::Term,
      Self::Term => Self::Factor,
      Self::Factor => Self::Unary,
      Self::Unary => Self::Call,
      Self::Call | Self::Primary => Self::Primary,
    }
  }
}
impl From<TokenKind> for ParsePrecedence {
  fn from(kind: TokenKind) -> Self {
    match kind {
      TokenKind::LeftParen | TokenKind::Dot => Self::Call,
      TokenKind::Plus | TokenKind::Minus => Self::Term,
      TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Self::Factor,
      TokenKind::BangEqual | TokenKind::EqualEqual => Self::Equality,
      TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual => {
        Self::Comparison
      }
      TokenKind::Or => Self::Or,
      TokenKind::And => Self::And,
      _ => Self::None,
    }
  }
}

/// An error which arose during parsing
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
  /// Expected a token of a certain kind
  #[error("expected {expected} but got {}", .received.kind)]
  Expected {
    /// Expected Token Kind to be
    expected: TokenKind,
    /// Received this Token instead
    received: Token,
  },
  /// Expected Expression
  #[error("expected expression but got {}", .0.kind)]
  ExpectedExpression(Token),
  /// Expected a method in a class body
  #[error("expected a method declaration starting with `fn` but got {}", .0.kind)]
  ExpectedMethod(Token),
  /// Unknown Character
  #[error("got unknown character")]
  UnknownCharacter(Token),
  /// Missing Identifier
  #[error("expected identifier but got {}", .0.kind)]
  MissingIdentifier(Token),
  /// Unterminated String Literal
  #[error("missing closing quote for string")]
  UnterminatedString(Token),
  /// Only variables and members can be assigned to
  #[error("can only assign to a variable or a member")]
  InvalidAssignmentTarget(Span),
  /// Functions and classes declared inside a function
  #[error("functions and classes can only be declared at the top level")]
  NestedDeclaration(Token),
}
impl ParseError {
  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> String {
    match self {
      Self::Expected { expected, .. } => format!("Expected {expected}"),
      Self::ExpectedExpression(_) => "Expected Expression".into(),
      Self::ExpectedMethod(_) => "Expected Method".into(),
      Self::UnknownCharacter(_) => "Unknown Character".into(),
      Self::MissingIdentifier(_) => "Missing Identifier".into(),
      Self::UnterminatedString(_) => "Unterminated String".into(),
      Self::InvalidAssignmentTarget(_) => "Invalid Assignment Target".into(),
      Self::NestedDeclaration(_) => "Nested Declaration".into(),
    }
  }

  /// The body of the error message describing what has gone wrong
  #[must_use]
  pub fn message(&self) -> String {
    self.to_string()
  }

  /// The title and message of the error in a combined string
  #[must_use]
  pub fn full_message(&self) -> String {
    format!("{}\n{}", self.title(), self.message())
  }

  /// The location of the error
  pub fn span(&self) -> Span {
    match self {
      Self::Expected { received, .. } => received.into(),
      Self::ExpectedExpression(token)
      | Self::ExpectedMethod(token)
      | Self::UnknownCharacter(token)
      | Self::MissingIdentifier(token)
      | Self::UnterminatedString(token)
      | Self::NestedDeclaration(token) => token.into(),
      Self::InvalidAssignmentTarget(span) => *span,
    }
  }
}

/// A problem found whilst parsing which doesn't stop the program running
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseWarning {
  /// A semicolon on its own
  #[error("statement does nothing and can be removed")]
  EmptyStatement(Span),
  /// An expression statement whose value isn't used
  #[error("expression value is unused")]
  UnusedExpression(Span),
  /// A statement after a return
  #[error("code after a return statement will never run")]
  UnreachableCode(Span),
}
impl ParseWarning {
  /// The title of the warning message
  #[must_use]
  pub fn title(&self) -> &'static str {
    match self {
      Self::EmptyStatement(_) => "Empty Statement",
      Self::UnusedExpression(_) => "Unused Expression",
      Self::UnreachableCode(_) => "Unreachable Code",
    }
  }

  /// The body of the warning message
  #[must_use]
  pub fn message(&self) -> String {
    self.to_string()
  }

  /// The location of the warning
  pub fn span(&self) -> Span {
    match self {
      Self::EmptyStatement(span) | Self::UnusedExpression(span) | Self::UnreachableCode(span) => {
        *span
      }
    }
  }
}
