pub mod compile;
mod error;
pub mod lex;
pub mod token_stream;
pub mod tokens;

pub use self::{
    compile::{CompileConf, LineEnding},
    error::{JackError, JackResult, LexError, SyntaxError},
};

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile the source code of one Jack class into VM code.
pub fn compile_str(source: &str) -> JackResult<String> {
    compile_with(source, CompileConf::default())
}

pub fn compile_with(source: &str, conf: CompileConf) -> JackResult<String> {
    // Lexing, parsing and code generation
    // all happen in the same pass.
    let engine = compile::CompilationEngine::with_conf(source, String::new(), &conf);
    engine.compile_class()
}
