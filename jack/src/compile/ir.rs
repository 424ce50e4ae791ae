use smol_str::SmolStr;
use std::fmt;

use crate::tokens::Punct;

/// Named memory region of the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Local    => "local",
            Segment::Argument => "argument",
            Segment::This     => "this",
            Segment::That     => "that",
            Segment::Pointer  => "pointer",
            Segment::Temp     => "temp",
            Segment::Static   => "static",
        };
        f.write_str(name)
    }
}

/// Arithmetic and logical commands, operating on the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithOp {
    /// Command implementing a binary operator symbol.
    ///
    /// Multiplication and division have no VM command,
    /// they are library calls instead.
    pub fn binary(punct: Punct) -> Option<Self> {
        match punct {
            Punct::Plus => Some(ArithOp::Add),
            Punct::Minus => Some(ArithOp::Sub),
            Punct::Amp => Some(ArithOp::And),
            Punct::Pipe => Some(ArithOp::Or),
            Punct::Less => Some(ArithOp::Lt),
            Punct::Greater => Some(ArithOp::Gt),
            Punct::Eq => Some(ArithOp::Eq),
            _ => None,
        }
    }

    /// Command implementing a unary operator symbol.
    pub fn unary(punct: Punct) -> Option<Self> {
        match punct {
            Punct::Minus => Some(ArithOp::Neg),
            Punct::Tilde => Some(ArithOp::Not),
            _ => None,
        }
    }
}

impl fmt::Display for ArithOp {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mnemonic = match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Neg => "neg",
            ArithOp::Eq  => "eq",
            ArithOp::Gt  => "gt",
            ArithOp::Lt  => "lt",
            ArithOp::And => "and",
            ArithOp::Or  => "or",
            ArithOp::Not => "not",
        };
        f.write_str(mnemonic)
    }
}

/// Single virtual machine instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmCommand {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(ArithOp),
    Label(SmolStr),
    Goto(SmolStr),
    IfGoto(SmolStr),
    /// Function name and number of arguments already pushed.
    Call(SmolStr, u16),
    /// Function name and number of local variables.
    Function(SmolStr, u16),
    Return,
}

/// Outputs instruction as VM text.
impl fmt::Display for VmCommand {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VmCommand::Push(seg, i)       => write!(f, "push {} {}", seg, i),
            VmCommand::Pop(seg, i)        => write!(f, "pop {} {}", seg, i),
            VmCommand::Arithmetic(op)     => write!(f, "{}", op),
            VmCommand::Label(name)        => write!(f, "label {}", name),
            VmCommand::Goto(name)         => write!(f, "goto {}", name),
            VmCommand::IfGoto(name)       => write!(f, "if-goto {}", name),
            VmCommand::Call(name, n)      => write!(f, "call {} {}", name, n),
            VmCommand::Function(name, n)  => write!(f, "function {} {}", name, n),
            VmCommand::Return             => write!(f, "return"),
        }
    }
}
