use crate::span::Span;
use std::{fmt, iter};

/// Convert a string of source code into an [Iterator] of [Token]s
pub struct Tokeniser<'source> {
  /// The source code to tokenise
  source: &'source [u8],
  /// The current position in the source code
  position: usize,
}
impl<'source> From<&'source str> for Tokeniser<'source> {
  /// Create a new [Tokeniser] from a source code string
  ///
  /// # Panics
  /// Panics if the length of the source code is greater than `u32::MAX`
  fn from(value: &'source str) -> Self {
    assert!(value.len() < u32::MAX as usize);

    Self {
      source: value.as_ref(),
      position: 0,
    }
  }
}
impl Tokeniser<'_> {
  /// Has the end of the source code been reached?
  fn is_end(&self, position: usize) -> bool {
    position >= self.source.len()
  }

  /// Skip over any whitespace
  fn skip_whitespace(&mut self) {
    while let Some(b' ' | b'\r' | b'\t' | b'\n') = self.source.get(self.position) {
      self.position += 1;
    }
  }

  /// Get the next token from the source code
  fn get_next_token(&self) -> (TokenKind, usize) {
    let character = &self.source[self.position];
    let next_character = self.source.get(self.position + 1);

    match character {
      b'/' if matches!(next_character, Some(b'/')) => self.comment(),

      // Values
      quote @ (b'"' | b'\'') => self.string(*quote),
      b'0'..=b'9' => self.number(),
      b'_' | b'a'..=b'z' | b'A'..=b'Z' => self.identifier(),

      // Brackets + Separators
      b'(' => (TokenKind::LeftParen, 1),
      b')' => (TokenKind::RightParen, 1),
      b'{' => (TokenKind::LeftCurly, 1),
      b'}' => (TokenKind::RightCurly, 1),
      b',' => (TokenKind::Comma, 1),
      b'.' => (TokenKind::Dot, 1),
      b';' => (TokenKind::Semicolon, 1),
      b':' => (TokenKind::Colon, 1),

      // Logical Operators
      b'&' if matches!(next_character, Some(b'&')) => (TokenKind::And, 2),
      b'|' if matches!(next_character, Some(b'|')) => (TokenKind::Or, 2),

      // Operators
      b'+' => (TokenKind::Plus, 1),
      b'-' => (TokenKind::Minus, 1),
      b'/' => (TokenKind::Slash, 1),
      b'*' => (TokenKind::Star, 1),
      b'%' => (TokenKind::Percent, 1),

      // Equalities
      b'!' if matches!(next_character, Some(b'=')) => (TokenKind::BangEqual, 2),
      b'=' if matches!(next_character, Some(b'=')) => (TokenKind::EqualEqual, 2),
      b'<' if matches!(next_character, Some(b'=')) => (TokenKind::LessEqual, 2),
      b'>' if matches!(next_character, Some(b'=')) => (TokenKind::GreaterEqual, 2),
      b'!' => (TokenKind::Bang, 1),
      b'=' => (TokenKind::Equal, 1),
      b'<' => (TokenKind::Less, 1),
      b'>' => (TokenKind::Greater, 1),

      // Unknown character
      x if (x & 0b1111_0000) == 0b1111_0000 => (TokenKind::Unknown, 4),
      x if (x & 0b1110_0000) == 0b1110_0000 => (TokenKind::Unknown, 3),
      x if (x & 0b1100_0000) == 0b1100_0000 => (TokenKind::Unknown, 2),
      _ => (TokenKind::Unknown, 1),
    }
  }

  /// Skip to the end of a comment token (a newline)
  fn comment(&self) -> (TokenKind, usize) {
    let length = self.source[self.position..]
      .iter()
      .take_while(|c| **c != b'\n')
      .count();

    (TokenKind::Comment, length)
  }

  /// Go to the end of a string token, the closing quote
  fn string(&self, quote: u8) -> (TokenKind, usize) {
    let mut pos = self.position + 1;

    loop {
      if self.is_end(pos) || self.source[pos] == b'\n' {
        break (TokenKind::UnterminatedString, pos - self.position);
      } else if self.source[pos] == b'\\' && !self.is_end(pos + 1) {
        pos += 2;
        continue;
      } else if self.source[pos] == quote {
        break (TokenKind::String, pos - self.position + 1);
      }

      pos += 1;
    }
  }

  /// Get a number token, with possible decimal part and numeric separators
  fn number(&self) -> (TokenKind, usize) {
    let mut position = self.position + 1;
    let mut kind = TokenKind::Integer;

    // Match numbers before the decimal point
    position += self.source[position..]
      .iter()
      .take_while(|c| matches!(c, b'0'..=b'9' | b'_'))
      .count();

    // Match a decimal point
    if !self.is_end(position + 1)
      && self.source[position] == b'.'
      && self.source[position + 1].is_ascii_digit()
    {
      position += 1;
      kind = TokenKind::Float;
    }

    // Match numbers after the decimal point
    position += self.source[position..]
      .iter()
      .take_while(|c| matches!(c, b'0'..=b'9' | b'_'))
      .count();

    (kind, position - self.position)
  }

  /// Get an identifier token, a sequence of [a-zA-Z0-9_]
  fn identifier(&self) -> (TokenKind, usize) {
    let length = self.source[self.position..]
      .iter()
      .take_while(|c| c.is_ascii_alphanumeric() || **c == b'_')
      .count();

    (self.identifier_type(length), length)
  }

  /// Determines the type of the identifier, is it a keyword or a standard identifier
  fn identifier_type(&self, length: usize) -> TokenKind {
    let text = &self.source[self.position..self.position + length];

    match text {
      b"and" => TokenKind::And,
      b"class" => TokenKind::Class,
      b"else" => TokenKind::Else,
      b"false" => TokenKind::False,
      b"fn" => TokenKind::Fn,
      b"from" => TokenKind::From,
      b"if" => TokenKind::If,
      b"import" => TokenKind::Import,
      b"nil" => TokenKind::Nil,
      b"or" => TokenKind::Or,
      b"return" => TokenKind::Return,
      b"true" => TokenKind::True,
      b"while" => TokenKind::While,
      _ => TokenKind::Identifier,
    }
  }
}
impl Iterator for Tokeniser<'_> {
  type Item = Token;

  fn next(&mut self) -> Option<Self::Item> {
    self.skip_whitespace();
    if self.is_end(self.position) {
      return None;
    }

    let (kind, len) = self.get_next_token();
    let start = self.position;
    self.position = (self.position + len).min(self.source.len());

    Some(Token {
      kind,
      start: u32::try_from(start).unwrap_or(u32::MAX),
      length: u32::try_from(self.position - start).unwrap_or(u32::MAX),
    })
  }
}
impl iter::FusedIterator for Tokeniser<'_> {}

/// A Token of source code, a lexeme of the language
///
/// With the type of token, start position and length of the token in the source code
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Token {
  /// The type of the token
  pub kind: TokenKind,
  /// The byte offset of the start of the token
  pub start: u32,
  /// The length of the token in bytes
  pub length: u32,
}
impl From<Token> for Span {
  fn from(token: Token) -> Self {
    Self {
      start: token.start,
      end: token.start + token.length,
    }
  }
}
impl From<&Token> for Span {
  fn from(token: &Token) -> Self {
    Self::from(*token)
  }
}

/// The type of a token
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub enum TokenKind {
  // Brackets
  /// `(`
  LeftParen,
  /// `)`
  RightParen,
  /// `{`
  LeftCurly,
  /// `}`
  RightCurly,

  // Separators
  /// `,`
  Comma,
  /// `.`
  Dot,
  /// `;`
  Semicolon,
  /// `:`
  Colon,

  // Operators
  /// `-`
  Minus,
  /// `+`
  Plus,
  /// `/`
  Slash,
  /// `*`
  Star,
  /// `%`
  Percent,
  /// `!`
  Bang,
  /// `and` or `&&`
  And,
  /// `or` or `||`
  Or,

  // Comparators
  /// `!=`
  BangEqual,
  /// `=`
  Equal,
  /// `==`
  EqualEqual,
  /// `>`
  Greater,
  /// `>=`
  GreaterEqual,
  /// `<`
  Less,
  /// `<=`
  LessEqual,

  // Values
  /// A identifier for a variable, a sequence of [a-zA-Z0-9_]
  Identifier,
  /// A whole number, with possible numeric separators
  Integer,
  /// A number with a decimal part
  Float,
  /// A string, any characters between `'` or `"`
  String,

  // Keywords
  /// `class`
  Class,
  /// `else`
  Else,
  /// `false`
  False,
  /// `fn`
  Fn,
  /// `from`
  From,
  /// `if`
  If,
  /// `import`
  Import,
  /// `nil`
  Nil,
  /// `return`
  Return,
  /// `true`
  True,
  /// `while`
  While,

  // Comments
  /// A comment, consisting of `//` then any number of characters before a newline
  Comment,
  /// A token to indicate the end of the file
  EndOfFile,

  // Error
  /// An unknown character, not known to fit in a [`TokenKind`]
  #[default]
  Unknown,
  /// A string where the end of the line has been reached, thus unterminated
  UnterminatedString,
}
impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      // Brackets
      Self::LeftParen => write!(f, "("),
      Self::RightParen => write!(f, ")"),
      Self::LeftCurly => write!(f, "{{"),
      Self::RightCurly => write!(f, "}}"),

      // Separators
      Self::Comma => write!(f, ","),
      Self::Dot => write!(f, "."),
      Self::Semicolon => write!(f, ";"),
      Self::Colon => write!(f, ":"),

      // Operators
      Self::Minus => write!(f, "-"),
      Self::Plus => write!(f, "+"),
      Self::Slash => write!(f, "/"),
      Self::Star => write!(f, "*"),
      Self::Percent => write!(f, "%"),
      Self::Bang => write!(f, "!"),
      Self::Or => write!(f, "or"),
      Self::And => write!(f, "and"),

      // Equalities
      Self::BangEqual => write!(f, "!="),
      Self::Equal => write!(f, "="),
      Self::EqualEqual => write!(f, "=="),
      Self::Greater => write!(f, ">"),
      Self::GreaterEqual => write!(f, ">="),
      Self::Less => write!(f, "<"),
      Self::LessEqual => write!(f, "<="),

      // With Values
      Self::Identifier => write!(f, "Identifier"),
      Self::Integer => write!(f, "Integer"),
      Self::Float => write!(f, "Float"),
      Self::String => write!(f, "String"),

      // Keywords
      Self::Class => write!(f, "class"),
      Self::Else => write!(f, "else"),
      Self::False => write!(f, "false"),
      Self::Fn => write!(f, "fn"),
      Self::From => write!(f, "from"),
      Self::If => write!(f, "if"),
      Self::Import => write!(f, "import"),
      Self::Nil => write!(f, "nil"),
      Self::Return => write!(f, "return"),
      Self::True => write!(f, "true"),
      Self::While => write!(f, "while"),

      // Comments
      Self::Comment => write!(f, "Comment"),
      Self::EndOfFile => write!(f, "End of File"),

      // Errors
      Self::Unknown => write!(f, "Unknown Character"),
      Self::UnterminatedString => write!(f, "Unterminated String"),
    }
  }
}
