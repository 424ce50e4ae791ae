//! Expression compilation.
use smol_str::SmolStr;
use std::fmt;

use super::{
    engine::{CompilationEngine, MATH_DIVIDE, MATH_MULTIPLY, STRING_APPEND_CHAR, STRING_NEW},
    ir::{ArithOp, Segment},
};
use crate::{
    error::{JackError, JackResult, LexError, SyntaxError},
    lex::MAX_INT,
    tokens::{Keyword, Punct, Span, Token, TokenKind},
};

impl<'a, W: fmt::Write> CompilationEngine<'a, W> {
    /// `term (op term)*`
    ///
    /// Operators have no precedence and are applied from left to right.
    /// `2 + 3 * 4` is `(2 + 3) * 4`.
    pub(super) fn expression(&mut self) -> JackResult<()> {
        self.term()?;

        loop {
            let op = match self.input.peek_kind()? {
                TokenKind::Symbol(punct) if punct.is_binary_op() => punct,
                _ => return Ok(()),
            };
            self.input.next_token()?;

            self.term()?;
            self.binary_op(op);
        }
    }

    fn binary_op(&mut self, op: Punct) {
        match op {
            Punct::Star => self.writer.call(MATH_MULTIPLY, 2),
            Punct::Slash => self.writer.call(MATH_DIVIDE, 2),
            _ => {
                if let Some(arith) = ArithOp::binary(op) {
                    self.writer.arithmetic(arith);
                }
            }
        }
    }

    /// ```text
    /// integerConstant | stringConstant | keywordConstant
    /// | varName | varName '[' expression ']' | subroutineCall
    /// | '(' expression ')' | unaryOp term
    /// ```
    fn term(&mut self) -> JackResult<()> {
        use Keyword as K;
        use TokenKind as TK;

        let token = self.input.next_token()?;

        match token.kind {
            TK::Int => {
                let value = self
                    .input
                    .span_fragment(&token.span)
                    .parse::<u16>()
                    .map_err(|_| LexError::IntegerOverflow(token.span))?;
                self.writer.push(Segment::Constant, value);
            }
            TK::Str => self.string_constant(token.span)?,
            TK::Keyword(K::True) => {
                self.writer.push(Segment::Constant, 0);
                self.writer.arithmetic(ArithOp::Not);
            }
            TK::Keyword(K::False | K::Null) => self.writer.push(Segment::Constant, 0),
            TK::Keyword(K::This) => self.writer.push(Segment::Pointer, 0),
            TK::Symbol(Punct::LeftParen) => {
                self.expression()?;
                self.input.consume(TK::Symbol(Punct::RightParen))?;
            }
            TK::Symbol(punct) => {
                let op = ArithOp::unary(punct)
                    .ok_or_else(|| SyntaxError::expected("term", &token))?;
                self.term()?;
                self.writer.arithmetic(op);
            }
            TK::Ident => self.identifier_term(token)?,
            _ => return Err(SyntaxError::expected("term", &token).into()),
        }

        Ok(())
    }

    /// Term starting with a name. The next token decides
    /// between array access, subroutine call and variable.
    fn identifier_term(&mut self, token: Token) -> JackResult<()> {
        use TokenKind as TK;

        let name = SmolStr::from(self.input.span_fragment(&token.span));

        match self.input.peek_kind()? {
            TK::Symbol(Punct::LeftBracket) => {
                let (segment, index) = self.variable(&name, token.span)?;
                self.input.next_token()?;

                self.writer.push(segment, index);
                self.expression()?;
                self.input.consume(TK::Symbol(Punct::RightBracket))?;
                self.writer.arithmetic(ArithOp::Add);

                self.writer.pop(Segment::Pointer, 1);
                self.writer.push(Segment::That, 0);
            }
            TK::Symbol(Punct::LeftParen | Punct::Dot) => self.subroutine_call(name)?,
            _ => {
                let (segment, index) = self.variable(&name, token.span)?;
                self.writer.push(segment, index);
            }
        }

        Ok(())
    }

    /// `subroutineName '(' expressionList ')'
    ///  | (className | varName) '.' subroutineName '(' expressionList ')'`
    ///
    /// The leading name has already been consumed.
    pub(super) fn subroutine_call(&mut self, name: SmolStr) -> JackResult<()> {
        if !self.input.match_token(TokenKind::Symbol(Punct::Dot))? {
            // Method of the current object.
            self.writer.push(Segment::Pointer, 0);
            let arg_count = with_receiver(self.expression_list()?)?;
            let function_name = format!("{}.{}", self.class_name, name);
            self.writer.call(function_name, arg_count);
            return Ok(());
        }

        let (method, _) = self.input.consume_ident()?;

        match self.symbols.lookup(&name).cloned() {
            Some(receiver) => {
                // Method of the object held by a variable.
                self.writer.push(receiver.kind.segment(), receiver.index);
                let arg_count = with_receiver(self.expression_list()?)?;
                self.writer.call(format!("{}.{}", receiver.ty, method), arg_count);
            }
            None => {
                // Function or constructor of another class.
                let arg_count = self.expression_list()?;
                self.writer.call(format!("{}.{}", name, method), arg_count);
            }
        }

        Ok(())
    }

    /// `'(' (expression (',' expression)*)? ')'`
    ///
    /// Returns the number of expressions pushed.
    fn expression_list(&mut self) -> JackResult<u16> {
        self.input.consume(TokenKind::Symbol(Punct::LeftParen))?;

        let mut count: u16 = 0;
        if !self.input.match_token(TokenKind::Symbol(Punct::RightParen))? {
            loop {
                self.expression()?;
                count = count.checked_add(1).ok_or(JackError::Limit("arguments"))?;

                if !self.input.match_token(TokenKind::Symbol(Punct::Comma))? {
                    break;
                }
            }
            self.input.consume(TokenKind::Symbol(Punct::RightParen))?;
        }

        Ok(count)
    }

    /// Build a new string object one character at a time.
    ///
    /// The length is pushed as a constant, so it
    /// is held to the integer constant range.
    fn string_constant(&mut self, span: Span) -> JackResult<()> {
        let units = self.input.span_fragment(&span).encode_utf16().collect::<Vec<_>>();
        let len = u16::try_from(units.len())
            .ok()
            .filter(|len| *len <= MAX_INT)
            .ok_or(LexError::StringOverflow(span))?;

        self.writer.push(Segment::Constant, len);
        self.writer.call(STRING_NEW, 1);

        for unit in units {
            self.writer.push(Segment::Constant, unit);
            self.writer.call(STRING_APPEND_CHAR, 2);
        }

        Ok(())
    }

    /// Resolve a variable name to its VM location.
    pub(super) fn variable(&self, name: &str, span: Span) -> JackResult<(Segment, u16)> {
        match self.symbols.lookup(name) {
            Some(symbol) => Ok((symbol.kind.segment(), symbol.index)),
            None => Err(SyntaxError::Expected {
                expected: "declared variable".to_string(),
                found: TokenKind::Ident,
                span,
            }
            .into()),
        }
    }
}

/// Argument count of a method call, the receiver included.
#[inline]
fn with_receiver(arg_count: u16) -> JackResult<u16> {
    arg_count.checked_add(1).ok_or(JackError::Limit("arguments"))
}
