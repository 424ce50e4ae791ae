//! Tokens
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
}

impl Token {
    /// Slice the token's text out of the source it was lexed from.
    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        self.span.fragment(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    /// Reserved identifiers
    Keyword(Keyword),
    /// Single character operator or punctuation
    Symbol(Punct),
    /// Integer literal in the range 0..=32767
    Int,
    /// String literal, the span excludes the quotes
    Str,
    Ident,

    // ------------------------------------------------------------------------
    // Special
    /// End-of-file
    EOF,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "keyword '{keyword}'"),
            Self::Symbol(punct) => write!(f, "symbol '{punct}'"),
            Self::Int => write!(f, "integer constant"),
            Self::Str => write!(f, "string constant"),
            Self::Ident => write!(f, "identifier"),
            Self::EOF => write!(f, "end-of-file"),
        }
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Declarations
    Class,       // class
    Constructor, // constructor
    Function,    // function
    Method,      // method
    Field,       // field
    Static,      // static
    Var,         // var

    // ------------------------------------------------------------------------
    // Types
    Int,         // int
    Char,        // char
    Boolean,     // boolean
    Void,        // void

    // ------------------------------------------------------------------------
    // Constants
    True,        // true
    False,       // false
    Null,        // null
    This,        // this

    // ------------------------------------------------------------------------
    // Statements
    Let,         // let
    Do,          // do
    If,          // if
    Else,        // else
    While,       // while
    Return,      // return
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single character symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Punct {
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Dot,          // .
    Comma,        // ,
    Semicolon,    // ;
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Amp,          // &
    Pipe,         // |
    Less,         // <
    Greater,      // >
    Eq,           // =
    Tilde,        // ~
}

impl Punct {
    #[rustfmt::skip]
    pub fn parse(c: char) -> Option<Self> {
        match c {
            '{' => Some(Self::LeftBrace),
            '}' => Some(Self::RightBrace),
            '(' => Some(Self::LeftParen),
            ')' => Some(Self::RightParen),
            '[' => Some(Self::LeftBracket),
            ']' => Some(Self::RightBracket),
            '.' => Some(Self::Dot),
            ',' => Some(Self::Comma),
            ';' => Some(Self::Semicolon),
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            '*' => Some(Self::Star),
            '/' => Some(Self::Slash),
            '&' => Some(Self::Amp),
            '|' => Some(Self::Pipe),
            '<' => Some(Self::Less),
            '>' => Some(Self::Greater),
            '=' => Some(Self::Eq),
            '~' => Some(Self::Tilde),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_char(&self) -> char {
        match self {
            Self::LeftBrace    => '{',
            Self::RightBrace   => '}',
            Self::LeftParen    => '(',
            Self::RightParen   => ')',
            Self::LeftBracket  => '[',
            Self::RightBracket => ']',
            Self::Dot          => '.',
            Self::Comma        => ',',
            Self::Semicolon    => ';',
            Self::Plus         => '+',
            Self::Minus        => '-',
            Self::Star         => '*',
            Self::Slash        => '/',
            Self::Amp          => '&',
            Self::Pipe         => '|',
            Self::Less         => '<',
            Self::Greater      => '>',
            Self::Eq           => '=',
            Self::Tilde        => '~',
        }
    }

    /// Indicates whether the symbol can join two terms in an expression.
    #[inline]
    pub fn is_binary_op(&self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Star
                | Self::Slash
                | Self::Amp
                | Self::Pipe
                | Self::Less
                | Self::Greater
                | Self::Eq
        )
    }
}

impl fmt::Display for Punct {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.end() as usize)]
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }

    /// One-based line and column of the span's first character.
    pub fn line_column(&self, text: &str) -> (usize, usize) {
        let before = &text[..self.index as usize];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }

    /// The full line of source containing the start of the span,
    /// without its line terminator.
    pub fn surrounding_line<'a>(&self, text: &'a str) -> (&'a str, Span) {
        let index = self.index as usize;
        let start = text[..index].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = text[index..]
            .find('\n')
            .map(|i| index + i)
            .unwrap_or(text.len());

        // Windows :(
        let line = text[start..end].trim_end_matches('\r');

        let line_span = Span {
            index: start as u32,
            size: line.len() as u32,
        };

        (line, line_span)
    }
}
