//! Result and errors.
use std::fmt::{self, Display, Formatter, Write as FmtWrite};
use std::io;

use crate::tokens::{Span, Token, TokenKind};

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    /// Source text could not be broken into tokens.
    Lex(LexError),
    /// Token does not satisfy the grammar production at the cursor.
    Syntax(SyntaxError),
    /// Count that does not fit a 16-bit VM operand.
    Limit(&'static str),
    /// Failure reading sources or writing artifacts.
    Io(io::Error),
    Fmt(fmt::Error),
}

impl JackError {
    /// Location in the source the error refers to, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lex(err) => Some(err.span()),
            Self::Syntax(err) => err.span(),
            Self::Limit(_) | Self::Io(_) | Self::Fmt(_) => None,
        }
    }

    /// Format the error together with the offending line of source code.
    ///
    /// ```text
    /// syntax error: expected symbol ';', found keyword 'let'
    ///  --> line 3, column 9
    ///   |
    /// 3 |         let y = 2;
    ///   |         ^^^
    /// ```
    pub fn render(&self, source: &str) -> String {
        let mut out = self.to_string();

        if let Some(span) = self.span() {
            if span.end() as usize <= source.len() {
                // Writing into a String can't fail.
                let _ = render_span(&mut out, span, source);
            }
        }

        out
    }
}

fn render_span(out: &mut String, span: Span, source: &str) -> fmt::Result {
    let (line_no, column) = span.line_column(source);
    let (line, _) = span.surrounding_line(source);
    let gutter = " ".repeat(line_no.to_string().len());
    let marker = "^".repeat(span.size.max(1) as usize);

    writeln!(out)?;
    writeln!(out, "{gutter}--> line {line_no}, column {column}")?;
    writeln!(out, "{gutter} |")?;
    writeln!(out, "{line_no} | {line}")?;
    write!(out, "{gutter} | {:pad$}{marker}", "", pad = column - 1)
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "lexical error: {}", err),
            Self::Syntax(err) => write!(f, "syntax error: {}", err),
            Self::Limit(what) => write!(f, "limit exceeded: too many {}", what),
            Self::Io(err) => write!(f, "{}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for JackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lex(err) => Some(err),
            Self::Syntax(err) => Some(err),
            Self::Limit(_) => None,
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
        }
    }
}

impl From<LexError> for JackError {
    fn from(err: LexError) -> Self {
        JackError::Lex(err)
    }
}

impl From<SyntaxError> for JackError {
    fn from(err: SyntaxError) -> Self {
        JackError::Syntax(err)
    }
}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<fmt::Error> for JackError {
    fn from(err: fmt::Error) -> Self {
        JackError::Fmt(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// Character that can't start any token.
    UnknownCharacter(char, Span),
    /// String constant without a closing quote on the same line.
    UnterminatedString(Span),
    /// Block comment without a closing `*/`.
    UnterminatedComment(Span),
    /// Integer constant larger than 32767.
    IntegerOverflow(Span),
    /// String constant longer than 32767 characters.
    StringOverflow(Span),
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnknownCharacter(_, span)
            | Self::UnterminatedString(span)
            | Self::UnterminatedComment(span)
            | Self::IntegerOverflow(span)
            | Self::StringOverflow(span) => *span,
        }
    }
}

impl std::error::Error for LexError {}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCharacter(c, _) => write!(f, "unknown character {:?}", c),
            Self::UnterminatedString(_) => write!(f, "unterminated string constant"),
            Self::UnterminatedComment(_) => write!(f, "unterminated block comment"),
            Self::IntegerOverflow(_) => write!(f, "integer constant exceeds 32767"),
            Self::StringOverflow(_) => write!(f, "string constant longer than 32767 characters"),
        }
    }
}

/// Error returned when an unexpected token is encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    Expected {
        /// Description of what the production required.
        expected: String,
        found: TokenKind,
        span: Span,
    },
    /// Token stream ended before the class was complete.
    UnexpectedEof,
}

impl SyntaxError {
    pub fn expected(expected: impl ToString, found: &Token) -> Self {
        SyntaxError::Expected {
            expected: expected.to_string(),
            found: found.kind,
            span: found.span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Expected { span, .. } => Some(*span),
            Self::UnexpectedEof => None,
        }
    }
}

impl std::error::Error for SyntaxError {}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected {
                expected, found, ..
            } => write!(f, "expected {}, found {}", expected, found),
            Self::UnexpectedEof => write!(f, "unexpected end of source code"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokens::{Keyword, Punct};

    #[test]
    fn test_render_points_at_token() {
        const CODE: &str = "class Main {\n  let x\n}";

        let token = Token {
            span: Span::new(15, 3),
            kind: TokenKind::Keyword(Keyword::Let),
        };
        let expected = TokenKind::Symbol(Punct::Semicolon);
        let err = JackError::from(SyntaxError::expected(expected, &token));

        let rendered = err.render(CODE);
        assert_eq!(
            rendered,
            "syntax error: expected symbol ';', found keyword 'let'\n \
             --> line 2, column 3\n  |\n2 |   let x\n  |   ^^^"
        );
    }

    #[test]
    fn test_render_without_span() {
        let err = JackError::from(SyntaxError::UnexpectedEof);
        assert_eq!(err.render(""), "syntax error: unexpected end of source code");
    }

    #[test]
    fn test_limit_message() {
        let err = JackError::Limit("labels");
        assert_eq!(err.span(), None);
        assert_eq!(err.render("class A {}"), "limit exceeded: too many labels");
    }
}
