//! Recursive descent compiler.
//!
//! Parsing and code generation happen in the same traversal. Each grammar
//! production consumes its tokens from the stream and emits the matching
//! VM code straight away, there is no syntax tree in between.
use log::debug;
use smol_str::SmolStr;
use std::fmt;

use super::{
    ir::Segment,
    symbol::{SymbolKind, SymbolTable},
    vm_writer::VmWriter,
    CompileConf,
};
use crate::{
    error::{JackResult, SyntaxError},
    lex::Lexer,
    token_stream::TokenStream,
    tokens::{Keyword, Punct, TokenKind},
};

// Operating system routines the generated code depends on.
pub(super) const MEMORY_ALLOC: &str = "Memory.alloc";
pub(super) const MATH_MULTIPLY: &str = "Math.multiply";
pub(super) const MATH_DIVIDE: &str = "Math.divide";
pub(super) const STRING_NEW: &str = "String.new";
pub(super) const STRING_APPEND_CHAR: &str = "String.appendChar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    /// Allocates and returns a new instance.
    Constructor,
    /// Static routine with no receiver.
    Function,
    /// Receives the instance as argument 0.
    Method,
}

/// Compiles the source of one class into VM code.
///
/// An engine holds all the state of a single compilation unit, its symbol
/// table and label counters included. Units compiled concurrently must
/// each use their own engine.
pub struct CompilationEngine<'a, W> {
    pub(super) input: TokenStream<'a>,
    pub(super) symbols: SymbolTable,
    pub(super) writer: VmWriter<W>,
    /// Name of the class being compiled.
    pub(super) class_name: SmolStr,
    /// Kind of the subroutine being compiled.
    pub(super) subroutine_kind: SubroutineKind,
}

impl<'a, W: fmt::Write> CompilationEngine<'a, W> {
    pub fn new(source: &'a str, sink: W) -> Self {
        Self::with_conf(source, sink, &CompileConf::default())
    }

    pub fn with_conf(source: &'a str, sink: W, conf: &CompileConf) -> Self {
        Self {
            input: TokenStream::new(Lexer::new(source)),
            symbols: SymbolTable::new(),
            writer: VmWriter::with_line_ending(sink, conf.line_ending),
            class_name: SmolStr::default(),
            subroutine_kind: SubroutineKind::Function,
        }
    }

    /// Compile the whole source and return the sink containing the VM code.
    ///
    /// Compilation stops at the first error. Nothing is written
    /// to the sink in that case.
    pub fn compile_class(mut self) -> JackResult<W> {
        self.class()?;
        self.writer.close()
    }

    /// Symbol scope and label counters are reset
    /// together at every subroutine boundary.
    fn start_subroutine(&mut self, kind: SubroutineKind) {
        self.symbols.start_subroutine();
        self.writer.reset_labels();
        self.subroutine_kind = kind;
    }
}

/// Program structure.
impl<'a, W: fmt::Write> CompilationEngine<'a, W> {
    /// `'class' className '{' classVarDec* subroutineDec* '}'`
    fn class(&mut self) -> JackResult<()> {
        use Keyword as K;
        use TokenKind as TK;

        self.input.consume(TK::Keyword(K::Class))?;
        let (name, _) = self.input.consume_ident()?;
        debug!("compiling class {}", name);
        self.class_name = name;

        self.input.consume(TK::Symbol(Punct::LeftBrace))?;

        while let TK::Keyword(K::Static | K::Field) = self.input.peek_kind()? {
            self.class_var_dec()?;
        }

        while let TK::Keyword(K::Constructor | K::Function | K::Method) = self.input.peek_kind()? {
            self.subroutine_dec()?;
        }

        self.input.consume(TK::Symbol(Punct::RightBrace))?;

        // One class per unit, nothing may follow it.
        self.input.consume(TK::EOF)?;

        Ok(())
    }

    /// `('static' | 'field') type varName (',' varName)* ';'`
    fn class_var_dec(&mut self) -> JackResult<()> {
        let token = self.input.next_token()?;
        let kind = match token.kind {
            TokenKind::Keyword(Keyword::Static) => SymbolKind::Static,
            TokenKind::Keyword(Keyword::Field) => SymbolKind::Field,
            _ => return Err(SyntaxError::expected("'static' or 'field'", &token).into()),
        };

        let ty = self.type_name()?;
        self.var_names(&ty, kind)
    }

    /// `('constructor' | 'function' | 'method') ('void' | type) subroutineName
    ///  '(' parameterList ')' subroutineBody`
    fn subroutine_dec(&mut self) -> JackResult<()> {
        use TokenKind as TK;

        let token = self.input.next_token()?;
        let kind = match token.kind {
            TK::Keyword(Keyword::Constructor) => SubroutineKind::Constructor,
            TK::Keyword(Keyword::Function) => SubroutineKind::Function,
            TK::Keyword(Keyword::Method) => SubroutineKind::Method,
            _ => return Err(SyntaxError::expected("subroutine declaration", &token).into()),
        };

        // Return type has no bearing on the generated code.
        if !self.input.match_token(TK::Keyword(Keyword::Void))? {
            self.type_name()?;
        }

        let (name, _) = self.input.consume_ident()?;
        self.start_subroutine(kind);

        if kind == SubroutineKind::Method {
            self.symbols.define("this", &self.class_name, SymbolKind::Argument)?;
        }

        self.input.consume(TK::Symbol(Punct::LeftParen))?;
        self.parameter_list()?;
        self.input.consume(TK::Symbol(Punct::RightParen))?;

        self.subroutine_body(&name)
    }

    /// `((type varName) (',' type varName)*)?`
    fn parameter_list(&mut self) -> JackResult<()> {
        if self.input.peek_kind()? == TokenKind::Symbol(Punct::RightParen) {
            return Ok(());
        }

        loop {
            let ty = self.type_name()?;
            let (name, _) = self.input.consume_ident()?;
            self.symbols.define(&name, &ty, SymbolKind::Argument)?;

            if !self.input.match_token(TokenKind::Symbol(Punct::Comma))? {
                return Ok(());
            }
        }
    }

    /// `'{' varDec* statements '}'`
    ///
    /// The function header can only be written once all the
    /// local variables have been declared.
    fn subroutine_body(&mut self, name: &str) -> JackResult<()> {
        self.input.consume(TokenKind::Symbol(Punct::LeftBrace))?;

        while self.input.peek_kind()? == TokenKind::Keyword(Keyword::Var) {
            self.var_dec()?;
        }

        let function_name = format!("{}.{}", self.class_name, name);
        debug!("compiling {:?} {}", self.subroutine_kind, function_name);

        let local_count = self.symbols.var_count(SymbolKind::Local);
        self.writer.function(function_name, local_count);

        match self.subroutine_kind {
            SubroutineKind::Constructor => {
                let field_count = self.symbols.var_count(SymbolKind::Field);
                self.writer.push(Segment::Constant, field_count);
                self.writer.call(MEMORY_ALLOC, 1);
                self.writer.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                self.writer.push(Segment::Argument, 0);
                self.writer.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Function => {}
        }

        self.statements()?;
        self.input.consume(TokenKind::Symbol(Punct::RightBrace))?;

        Ok(())
    }

    /// `'var' type varName (',' varName)* ';'`
    fn var_dec(&mut self) -> JackResult<()> {
        self.input.consume(TokenKind::Keyword(Keyword::Var))?;
        let ty = self.type_name()?;
        self.var_names(&ty, SymbolKind::Local)
    }

    /// `varName (',' varName)* ';'`
    fn var_names(&mut self, ty: &str, kind: SymbolKind) -> JackResult<()> {
        loop {
            let (name, _) = self.input.consume_ident()?;
            self.symbols.define(&name, ty, kind)?;

            if !self.input.match_token(TokenKind::Symbol(Punct::Comma))? {
                break;
            }
        }

        self.input.consume(TokenKind::Symbol(Punct::Semicolon))?;
        Ok(())
    }

    /// `'int' | 'char' | 'boolean' | className`
    fn type_name(&mut self) -> JackResult<SmolStr> {
        let token = self.input.next_token()?;
        match token.kind {
            TokenKind::Keyword(keyword @ (Keyword::Int | Keyword::Char | Keyword::Boolean)) => {
                Ok(SmolStr::from(keyword.as_str()))
            }
            TokenKind::Ident => Ok(SmolStr::from(self.input.span_fragment(&token.span))),
            _ => Err(SyntaxError::expected("type", &token).into()),
        }
    }
}
