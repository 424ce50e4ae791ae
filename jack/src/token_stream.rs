//! Peekable token stream.
use std::iter::Peekable;

use log::trace;
use smol_str::SmolStr;

use crate::{
    error::{JackResult, SyntaxError},
    lex::{Lexer, LexerIter},
    tokens::{Span, Token, TokenKind},
};

/// Buffered stream of tokens with one token of look ahead.
///
/// Tokens are lazily lexed. Peeking or consuming the next token
/// triggers the internal lexer. A lexical error surfaces the
/// first time the offending token is peeked or consumed.
pub struct TokenStream<'a> {
    lexer: Peekable<LexerIter<'a>>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            original: lexer.source_code(),
            lexer: lexer.into_iter().peekable(),
        }
    }

    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Helper function to extract the span's string fragment
    /// from the original source code.
    #[inline]
    pub fn span_fragment(&self, span: &Span) -> &'a str {
        span.fragment(self.original)
    }

    /// Consumes the current token regardless of kind.
    pub fn next_token(&mut self) -> JackResult<Token> {
        match self.lexer.next() {
            Some(Ok(token)) => {
                trace!("{:?} {:?}", token.kind, self.span_fragment(&token.span));
                Ok(token)
            }
            Some(Err(err)) => Err(err.into()),
            None => Err(SyntaxError::UnexpectedEof.into()),
        }
    }

    /// Return the current token without advancing the cursor.
    pub fn peek(&mut self) -> JackResult<&Token> {
        match self.lexer.peek() {
            Some(Ok(token)) => Ok(token),
            Some(Err(err)) => Err(err.clone().into()),
            None => Err(SyntaxError::UnexpectedEof.into()),
        }
    }

    /// Return the current token kind without advancing the cursor.
    #[inline]
    pub fn peek_kind(&mut self) -> JackResult<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Returns true when matched. Does not consume the token
    /// if the kinds do not match.
    pub fn match_token(&mut self, token_kind: TokenKind) -> JackResult<bool> {
        if self.peek_kind()? == token_kind {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Return the current token and advance the cursor.
    ///
    /// The consumed token must match the given token kind, otherwise
    /// a syntax error is returned. The cursor is not advanced if
    /// the token kind does not match.
    pub fn consume(&mut self, token_kind: TokenKind) -> JackResult<Token> {
        let token = self.peek()?;
        if token.kind != token_kind {
            return Err(SyntaxError::expected(token_kind, token).into());
        }

        self.next_token()
    }

    /// Consume an identifier and return its name.
    pub fn consume_ident(&mut self) -> JackResult<(SmolStr, Span)> {
        let token = self.consume(TokenKind::Ident)?;
        let name = SmolStr::from(self.span_fragment(&token.span));
        Ok((name, token.span))
    }
}
