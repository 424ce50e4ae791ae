//! Lexical analysis (tokenizer)
use crate::{
    error::LexError,
    tokens::{Keyword, Punct, Span, Token, TokenKind},
};

use itertools::{multipeek, MultiPeek};
use std::{iter::Iterator, str::CharIndices};

/// Largest integer constant the language can express.
pub const MAX_INT: u16 = 32767;

/// Lexical analyzer.
pub struct Lexer<'a> {
    source: SourceText<'a>,
    /// Start absolute byte position of the current token
    /// in the source.
    token_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            source: SourceText::new(source_code),
            token_start: 0,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.source.original
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Comments and whitespace preceding the token are discarded. Once
    /// the source is exhausted every call returns a [`TokenKind::EOF`].
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        use TokenKind as TK;

        self.erase_trivia()?;
        self.start_token();

        let next_char = match self.source.next_char() {
            Some(c) => c,
            None => return Ok(self.make_token(TK::EOF)),
        };

        if let Some(punct) = Punct::parse(next_char) {
            return Ok(self.make_token(TK::Symbol(punct)));
        }

        match next_char {
            '"' => self.consume_string(),
            '0'..='9' => self.consume_number(),
            c if is_letter(c) => Ok(self.consume_word()),
            c => Err(LexError::UnknownCharacter(c, self.make_span())),
        }
    }

    /// Prime the lexer state for recording a new token.
    fn start_token(&mut self) {
        self.token_start = self.source.offset;
    }

    /// Span from the start of the current token up to,
    /// but excluding, the next unconsumed character.
    fn make_span(&self) -> Span {
        let start = self.token_start;
        let end = self.source.offset;
        debug_assert!(end >= start);

        Span {
            index: start as u32,
            size: (end - start) as u32,
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token {
            span: self.make_span(),
            kind,
        }
    }

    fn token_fragment(&self) -> &'a str {
        &self.source.original[self.token_start..self.source.offset]
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Discard whitespace, line comments and block comments until
    /// the start of the next token or the end of source.
    fn erase_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.source.peek_char2() {
                (Some(c), _) if is_whitespace(c) => {
                    self.source.next_char();
                }
                (Some('/'), Some('/')) => self.erase_line_comment(),
                (Some('/'), Some('*')) => self.erase_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Erase comment line up to, but not including, the trailing newline.
    fn erase_line_comment(&mut self) {
        while let Some(c) = self.source.peek_char() {
            if is_newline(c) {
                break;
            }
            self.source.next_char();
        }
    }

    /// Erase a `/* ... */` comment, which includes `/** ... */` doc comments.
    fn erase_block_comment(&mut self) -> Result<(), LexError> {
        self.start_token();

        // Opening `/*`
        self.source.next_char();
        self.source.next_char();

        loop {
            match self.source.next_char() {
                Some('*') if self.source.peek_char() == Some('/') => {
                    self.source.next_char();
                    return Ok(());
                }
                Some(_) => continue,
                None => return Err(LexError::UnterminatedComment(self.make_span())),
            }
        }
    }

    /// Make a string constant token.
    ///
    /// The opening quote has already been consumed. There are no
    /// escape sequences, and a string may not cross a line.
    fn consume_string(&mut self) -> Result<Token, LexError> {
        let quote_start = self.token_start;
        self.start_token();

        loop {
            match self.source.peek_char() {
                Some('"') => break,
                Some(c) if !is_newline(c) => {
                    self.source.next_char();
                }
                _ => {
                    self.token_start = quote_start;
                    return Err(LexError::UnterminatedString(self.make_span()));
                }
            }
        }

        let token = self.make_token(TokenKind::Str);

        // Closing quote
        self.source.next_char();

        Ok(token)
    }

    /// Make an integer constant token.
    fn consume_number(&mut self) -> Result<Token, LexError> {
        while let Some('0'..='9') = self.source.peek_char() {
            self.source.next_char();
        }

        match self.token_fragment().parse::<u16>() {
            Ok(value) if value <= MAX_INT => Ok(self.make_token(TokenKind::Int)),
            _ => Err(LexError::IntegerOverflow(self.make_span())),
        }
    }

    /// Make an identifier or keyword token.
    ///
    /// The whole word is scanned before checking the keyword table,
    /// so a keyword that prefixes a longer name stays an identifier.
    fn consume_word(&mut self) -> Token {
        while let Some(c) = self.source.peek_char() {
            if !is_letter_or_digit(c) {
                break;
            }
            self.source.next_char();
        }

        let token_kind = match Keyword::parse(self.token_fragment()) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };

        self.make_token(token_kind)
    }
}

/// Test whether the character is considered whitespace
/// that should be ignored by the parser later.
///
/// Unlike the assembler family of languages newlines
/// carry no meaning, so they are whitespace too.
fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0020}' // space
            | '\u{0009}' // tab
            | '\u{000A}' // line feed
            | '\u{000C}' // form feed
            | '\u{000D}' // carriage return
            | '\u{00A0}' // no-break space
            | '\u{FEFF}' // zero width no-break space
    )
}

fn is_newline(c: char) -> bool {
    matches!(c, '\r' | '\n')
}

fn is_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_letter_or_digit(c: char) -> bool {
    is_letter(c) || c.is_ascii_digit()
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Result<Token, LexError>;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
///
/// The final item is either the EOF token or the first
/// lexical error; the iterator is fused after that.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> LexerIter<'a> {
    pub fn source_code(&self) -> &'a str {
        self.lexer.source_code()
    }
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.lexer.next_token();
        if matches!(result, Ok(Token { kind: TokenKind::EOF, .. }) | Err(_)) {
            self.done = true;
        }

        Some(result)
    }
}

/// Wrapper for source code that keeps a cursor position.
///
/// Allows forward lookup via peeking.
struct SourceText<'a> {
    /// Keep reference to the source so the lexer can
    /// slice fragments from it.
    original: &'a str,

    /// Iterator over UTF-8 encoded source code.
    ///
    /// The `MultiPeek` wrapper allows for arbitrary lookahead by consuming
    /// the iterator internally and buffering the result. This is required
    /// because UTF-8 characters are variable in width.
    ///
    /// Peeking advances the internal peek cursor by 1. The peek methods
    /// below reset it first so every lookup starts from the next
    /// unconsumed character.
    chars: MultiPeek<CharIndices<'a>>,

    /// Byte position of the next unconsumed character.
    offset: usize,
}

impl<'a> SourceText<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            original: source,
            chars: multipeek(source.char_indices()),
            offset: 0,
        }
    }

    /// Advance the cursor and return the consumed character.
    fn next_char(&mut self) -> Option<char> {
        let (index, c) = self.chars.next()?;
        self.offset = index + c.len_utf8();
        Some(c)
    }

    /// Peeks the next unconsumed character.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.reset_peek();
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Two character lookahead.
    fn peek_char2(&mut self) -> (Option<char>, Option<char>) {
        self.chars.reset_peek();
        (
            self.chars.peek().map(|(_, c)| *c),
            self.chars.peek().map(|(_, c)| *c),
        )
    }
}
