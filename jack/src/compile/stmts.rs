//! Statement compilation.
use std::fmt;

use super::{
    engine::{CompilationEngine, SubroutineKind},
    ir::{ArithOp, Segment, VmCommand},
    vm_writer::LabelFamily,
};
use crate::{
    error::JackResult,
    tokens::{Keyword, Punct, TokenKind},
};

impl<'a, W: fmt::Write> CompilationEngine<'a, W> {
    /// `statement*`
    pub(super) fn statements(&mut self) -> JackResult<()> {
        use Keyword as K;

        loop {
            match self.input.peek_kind()? {
                TokenKind::Keyword(K::Let) => self.let_statement()?,
                TokenKind::Keyword(K::If) => self.if_statement()?,
                TokenKind::Keyword(K::While) => self.while_statement()?,
                TokenKind::Keyword(K::Do) => self.do_statement()?,
                TokenKind::Keyword(K::Return) => self.return_statement()?,
                _ => return Ok(()),
            }
        }
    }

    /// `'{' statements '}'`
    fn block(&mut self) -> JackResult<()> {
        self.input.consume(TokenKind::Symbol(Punct::LeftBrace))?;
        self.statements()?;
        self.input.consume(TokenKind::Symbol(Punct::RightBrace))?;
        Ok(())
    }

    /// `'let' varName ('[' expression ']')? '=' expression ';'`
    fn let_statement(&mut self) -> JackResult<()> {
        use TokenKind as TK;

        self.input.consume(TK::Keyword(Keyword::Let))?;
        let (name, span) = self.input.consume_ident()?;
        let (segment, index) = self.variable(&name, span)?;

        if self.input.match_token(TK::Symbol(Punct::LeftBracket))? {
            // Target address is computed before the value.
            self.writer.push(segment, index);
            self.expression()?;
            self.input.consume(TK::Symbol(Punct::RightBracket))?;
            self.writer.arithmetic(ArithOp::Add);

            self.input.consume(TK::Symbol(Punct::Eq))?;
            let mark = self.writer.len();
            self.expression()?;
            self.input.consume(TK::Symbol(Punct::Semicolon))?;

            self.store_that(mark);
        } else {
            self.input.consume(TK::Symbol(Punct::Eq))?;
            self.expression()?;
            self.input.consume(TK::Symbol(Punct::Semicolon))?;

            self.writer.pop(segment, index);
        }

        Ok(())
    }

    /// Store the value on top of the stack at the address below it.
    ///
    /// `mark` is the position right after the address was computed. The
    /// address goes into `pointer 1` at that position, unless the value's
    /// own code repositions `pointer 1`, in which case the value is parked
    /// in `temp 0` while the address is loaded. Calls restore `pointer 1`
    /// on return.
    fn store_that(&mut self, mark: usize) {
        let repositioned = self
            .writer
            .code_since(mark)
            .iter()
            .any(|command| *command == VmCommand::Pop(Segment::Pointer, 1));

        if repositioned {
            self.writer.pop(Segment::Temp, 0);
            self.writer.pop(Segment::Pointer, 1);
            self.writer.push(Segment::Temp, 0);
        } else {
            self.writer.insert(mark, VmCommand::Pop(Segment::Pointer, 1));
        }

        self.writer.pop(Segment::That, 0);
    }

    /// `'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    ///
    /// The else branch falls through from the condition test,
    /// so its code is placed ahead of the if branch.
    fn if_statement(&mut self) -> JackResult<()> {
        use TokenKind as TK;

        self.input.consume(TK::Keyword(Keyword::If))?;
        self.input.consume(TK::Symbol(Punct::LeftParen))?;
        self.expression()?;
        self.input.consume(TK::Symbol(Punct::RightParen))?;

        // Reserved up front so labels follow the textual order
        // of nested statements.
        let (if_true, if_end) = self.writer.unique_label(LabelFamily::Branch)?;
        self.writer.if_goto(if_true.clone());

        let mark = self.writer.len();
        self.block()?;
        let if_branch = self.writer.split_off(mark);

        if self.input.match_token(TK::Keyword(Keyword::Else))? {
            self.block()?;
        }

        self.writer.goto(if_end.clone());
        self.writer.label(if_true);
        self.writer.extend(if_branch);
        self.writer.label(if_end);

        Ok(())
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    fn while_statement(&mut self) -> JackResult<()> {
        use TokenKind as TK;

        self.input.consume(TK::Keyword(Keyword::While))?;
        let (while_exp, while_end) = self.writer.unique_label(LabelFamily::Loop)?;
        self.writer.label(while_exp.clone());

        self.input.consume(TK::Symbol(Punct::LeftParen))?;
        self.expression()?;
        self.input.consume(TK::Symbol(Punct::RightParen))?;

        self.writer.arithmetic(ArithOp::Not);
        self.writer.if_goto(while_end.clone());

        self.block()?;

        self.writer.goto(while_exp);
        self.writer.label(while_end);

        Ok(())
    }

    /// `'do' subroutineCall ';'`
    fn do_statement(&mut self) -> JackResult<()> {
        self.input.consume(TokenKind::Keyword(Keyword::Do))?;
        let (name, _) = self.input.consume_ident()?;
        self.subroutine_call(name)?;
        self.input.consume(TokenKind::Symbol(Punct::Semicolon))?;

        // Discard the returned value.
        self.writer.pop(Segment::Temp, 0);

        Ok(())
    }

    /// `'return' expression? ';'`
    fn return_statement(&mut self) -> JackResult<()> {
        self.input.consume(TokenKind::Keyword(Keyword::Return))?;

        if self.input.peek_kind()? != TokenKind::Symbol(Punct::Semicolon) {
            self.expression()?;
        } else if self.subroutine_kind == SubroutineKind::Constructor {
            self.writer.push(Segment::Pointer, 0);
        } else {
            // Every function leaves exactly one value on the stack.
            self.writer.push(Segment::Constant, 0);
        }

        self.input.consume(TokenKind::Symbol(Punct::Semicolon))?;
        self.writer.ret();

        Ok(())
    }
}
