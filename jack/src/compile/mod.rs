//! Code generation.
mod engine;
mod expr;
mod ir;
mod stmts;
mod symbol;
mod vm_writer;

pub use self::{
    engine::{CompilationEngine, SubroutineKind},
    ir::{ArithOp, Segment, VmCommand},
    symbol::{Symbol, SymbolKind, SymbolTable},
    vm_writer::{LabelFamily, VmWriter},
};

/// Compiler configuration parameters.
#[derive(Debug, Default, Clone)]
pub struct CompileConf {
    /// Terminator written after every instruction.
    pub line_ending: LineEnding,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}
