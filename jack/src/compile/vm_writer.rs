//! Emitter of virtual machine instructions.
use log::trace;
use smol_str::SmolStr;
use std::fmt;

use super::{
    ir::{ArithOp, Segment, VmCommand},
    LineEnding,
};
use crate::error::{JackError, JackResult};

/// Control flow label counter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFamily {
    /// `while` statements
    Loop,
    /// `if` statements
    Branch,
}

impl LabelFamily {
    /// Prefixes of the opening and closing labels.
    #[rustfmt::skip]
    fn prefixes(self) -> (&'static str, &'static str) {
        match self {
            LabelFamily::Loop   => ("WHILE_EXP", "WHILE_END"),
            LabelFamily::Branch => ("IF_TRUE", "IF_END"),
        }
    }
}

/// Writes VM instructions into a text sink.
///
/// Instructions are buffered until [`VmWriter::close`], which lets the
/// code generator splice blocks of code while still compiling in a
/// single pass.
pub struct VmWriter<W> {
    sink: W,
    code: Vec<VmCommand>,
    line_ending: LineEnding,
    /// Number of loop labels handed out in the current subroutine.
    loops: u16,
    /// Number of branch labels handed out in the current subroutine.
    branches: u16,
}

impl<W: fmt::Write> VmWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_line_ending(sink, LineEnding::default())
    }

    pub fn with_line_ending(sink: W, line_ending: LineEnding) -> Self {
        Self {
            sink,
            code: vec![],
            line_ending,
            loops: 0,
            branches: 0,
        }
    }

    pub fn push(&mut self, segment: Segment, index: u16) {
        self.emit(VmCommand::Push(segment, index))
    }

    pub fn pop(&mut self, segment: Segment, index: u16) {
        self.emit(VmCommand::Pop(segment, index))
    }

    pub fn arithmetic(&mut self, op: ArithOp) {
        self.emit(VmCommand::Arithmetic(op))
    }

    pub fn label(&mut self, name: impl Into<SmolStr>) {
        self.emit(VmCommand::Label(name.into()))
    }

    pub fn goto(&mut self, name: impl Into<SmolStr>) {
        self.emit(VmCommand::Goto(name.into()))
    }

    pub fn if_goto(&mut self, name: impl Into<SmolStr>) {
        self.emit(VmCommand::IfGoto(name.into()))
    }

    pub fn call(&mut self, name: impl Into<SmolStr>, arg_count: u16) {
        self.emit(VmCommand::Call(name.into(), arg_count))
    }

    pub fn function(&mut self, name: impl Into<SmolStr>, local_count: u16) {
        self.emit(VmCommand::Function(name.into(), local_count))
    }

    pub fn ret(&mut self) {
        self.emit(VmCommand::Return)
    }

    /// Hand out the next pair of opening and closing
    /// labels from the given family.
    pub fn unique_label(&mut self, family: LabelFamily) -> JackResult<(SmolStr, SmolStr)> {
        let counter = match family {
            LabelFamily::Loop => &mut self.loops,
            LabelFamily::Branch => &mut self.branches,
        };
        let n = *counter;
        *counter = n.checked_add(1).ok_or(JackError::Limit("labels"))?;

        let (open, close) = family.prefixes();
        Ok((
            SmolStr::from(format!("{open}{n}")),
            SmolStr::from(format!("{close}{n}")),
        ))
    }

    /// Restart both label families at zero.
    pub fn reset_labels(&mut self) {
        self.loops = 0;
        self.branches = 0;
    }

    /// Number of instructions written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Instructions written since the given position.
    #[inline]
    pub fn code_since(&self, mark: usize) -> &[VmCommand] {
        &self.code[mark..]
    }

    /// Place an instruction at an earlier position.
    pub fn insert(&mut self, mark: usize, command: VmCommand) {
        trace!("{} (at {})", command, mark);
        self.code.insert(mark, command);
    }

    /// Remove and return the instructions written since the given position.
    pub fn split_off(&mut self, mark: usize) -> Vec<VmCommand> {
        self.code.split_off(mark)
    }

    /// Append a block previously taken out with [`VmWriter::split_off`].
    pub fn extend(&mut self, block: Vec<VmCommand>) {
        self.code.extend(block);
    }

    /// Write all instructions into the sink, one per line, and hand it back.
    pub fn close(mut self) -> JackResult<W> {
        let newline = self.line_ending.as_str();
        for command in &self.code {
            write!(self.sink, "{}{}", command, newline)?;
        }
        Ok(self.sink)
    }

    fn emit(&mut self, command: VmCommand) {
        trace!("{}", command);
        self.code.push(command);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_close_writes_lines() {
        let mut writer = VmWriter::new(String::new());
        writer.function("Main.main", 1);
        writer.push(Segment::Constant, 2);
        writer.pop(Segment::Local, 0);
        writer.push(Segment::Constant, 0);
        writer.ret();
        assert_eq!(writer.len(), 5);

        let text = writer.close().unwrap();
        assert_eq!(
            text,
            "function Main.main 1\npush constant 2\npop local 0\npush constant 0\nreturn\n"
        );
    }

    #[test]
    fn test_crlf_line_ending() {
        let mut writer = VmWriter::with_line_ending(String::new(), LineEnding::CrLf);
        writer.arithmetic(ArithOp::Add);
        writer.goto("WHILE_EXP0");

        assert_eq!(writer.close().unwrap(), "add\r\ngoto WHILE_EXP0\r\n");
    }

    #[test]
    fn test_label_families_count_independently() {
        let mut writer = VmWriter::new(String::new());

        assert_eq!(
            writer.unique_label(LabelFamily::Loop).unwrap(),
            ("WHILE_EXP0".into(), "WHILE_END0".into())
        );
        assert_eq!(
            writer.unique_label(LabelFamily::Branch).unwrap(),
            ("IF_TRUE0".into(), "IF_END0".into())
        );
        assert_eq!(
            writer.unique_label(LabelFamily::Loop).unwrap(),
            ("WHILE_EXP1".into(), "WHILE_END1".into())
        );

        writer.reset_labels();
        assert_eq!(writer.unique_label(LabelFamily::Loop).unwrap().0, "WHILE_EXP0");
        assert_eq!(writer.unique_label(LabelFamily::Branch).unwrap().0, "IF_TRUE0");
    }

    #[test]
    fn test_label_exhaustion() {
        let mut writer = VmWriter::new(String::new());
        for _ in 0..u16::MAX {
            writer.unique_label(LabelFamily::Branch).unwrap();
        }

        assert!(matches!(
            writer.unique_label(LabelFamily::Branch),
            Err(JackError::Limit(_))
        ));
        assert!(writer.unique_label(LabelFamily::Loop).is_ok());

        writer.reset_labels();
        assert_eq!(writer.unique_label(LabelFamily::Branch).unwrap().1, "IF_END0");
    }

    #[test]
    fn test_splice_block() {
        let mut writer = VmWriter::new(String::new());
        writer.push(Segment::Constant, 1);

        let mark = writer.len();
        writer.push(Segment::Constant, 2);
        let block = writer.split_off(mark);
        writer.push(Segment::Constant, 3);
        writer.extend(block);
        writer.insert(1, VmCommand::Pop(Segment::Temp, 0));

        assert_eq!(
            writer.close().unwrap(),
            "push constant 1\npop temp 0\npush constant 3\npush constant 2\n"
        );
    }
}
