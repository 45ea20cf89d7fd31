use axol_blob::DebugEntry;
use axol_interpreter::{CompileError, RuntimeError, ScriptError};
use axol_syntax::{LineIndex, ParseError, ParseWarning, Span, TokenKind, tokenise};
use owo_colors::{OwoColorize, Style};
use std::fmt;

#[derive(Clone, Copy, Debug)]
pub enum Severity {
  Error,
  Warning,
}

/// A problem to show the user, with an optional body below the title
pub struct Message {
  severity: Severity,
  title: String,
  body: String,
}
impl Message {
  pub fn new(severity: Severity, title: impl Into<String>, body: impl Into<String>) -> Self {
    Self {
      severity,
      title: title.into(),
      body: body.into(),
    }
  }

  pub fn error(title: String) -> Self {
    Self::new(Severity::Error, title, "")
  }

  pub fn warning(title: String) -> Self {
    Self::new(Severity::Warning, title, "")
  }
}
impl fmt::Display for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self.severity {
      Severity::Error => "✕ Error".bold().red().to_string(),
      Severity::Warning => "⚠ Warning".bold().yellow().to_string(),
    };
    writeln!(f, "{label}{} {}", ":".bold(), self.title.bold())?;

    match self.body.as_str() {
      "" => Ok(()),
      body => writeln!(f, "{body}"),
    }
  }
}

macro_rules! message_from {
  ($($problem:ty => $severity:ident),* $(,)?) => {$(
    impl From<&$problem> for Message {
      fn from(problem: &$problem) -> Self {
        Self::new(Severity::$severity, problem.title().to_string(), problem.message())
      }
    }
  )*};
}
message_from! {
  ParseError => Error,
  ParseWarning => Warning,
  CompileError => Error,
  RuntimeError => Error,
  ScriptError => Error,
}

/// The lines of source a problem covers, with syntax highlighting
pub struct CodeFrame<'a> {
  title: &'a str,
  source: &'a str,
  lines: LineIndex,
  span: Span,
}
impl<'a> CodeFrame<'a> {
  pub fn new(title: &'a str, source: &'a str, span: Span) -> Self {
    let title = if title == "-" { "STDIN" } else { title };
    let lines = LineIndex::from_source(source);
    Self { title, source, lines, span }
  }

  /// A frame around the source a debug entry points to
  pub fn from_debug_entry(title: &'a str, source: &'a str, entry: DebugEntry) -> Self {
    let mut frame = Self::new(title, source, Span::default());

    let line = usize::try_from(entry.line).unwrap_or(usize::MAX);
    let start = frame.lines.get_line_start(line) + entry.col.saturating_sub(1);
    frame.span = Span { start, end: start + entry.extent };
    frame
  }
}
impl fmt::Display for CodeFrame<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let first = self.lines.line(self.span).max(1);
    let last = self.lines.final_line(self.span).max(first);

    let (open, close) = ("╭─[".dimmed(), "]".dimmed());
    writeln!(f, "    {open}{}{}{first}{close}", self.title, ":".dimmed())?;

    for line in first..=last {
      let text = self.lines.line_span(line).source_text(self.source);
      let gap = if text.is_empty() { "" } else { " " };
      write!(f, "{line:>3} {}{gap}", "│".dimmed())?;

      highlight_source(f, text)?;
      if !text.ends_with('\n') {
        writeln!(f)?;
      }
    }

    write!(f, "{}", "────╯".dimmed())
  }
}

fn token_style(kind: TokenKind) -> Style {
  match kind {
    TokenKind::Integer | TokenKind::Float => Style::new().blue(),
    TokenKind::True | TokenKind::False | TokenKind::Nil => Style::new().blue(),
    TokenKind::String | TokenKind::UnterminatedString => Style::new().green(),
    TokenKind::If | TokenKind::Else | TokenKind::While | TokenKind::Return => Style::new().cyan(),
    TokenKind::Import | TokenKind::From => Style::new().cyan(),
    TokenKind::Class | TokenKind::Fn => Style::new().magenta(),
    TokenKind::Comment => Style::new().dimmed(),
    _ => Style::new(),
  }
}

/// Write source with each token coloured by its kind, keeping the whitespace between tokens
fn highlight_source(output: &mut dyn fmt::Write, source: &str) -> fmt::Result {
  let mut position = 0;
  for token in tokenise(source) {
    let gap = usize::try_from(token.start.saturating_sub(position)).unwrap_or_default();
    let text = Span::from(token).source_text(source);
    write!(output, "{:gap$}{}", "", text.style(token_style(token.kind)))?;

    position = token.start + token.length;
  }

  Ok(())
}
