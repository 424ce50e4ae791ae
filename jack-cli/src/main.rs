//! Entrypoint for CLI
use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
    time::Instant,
};

use jack::{lex::Lexer, tokens::TokenKind, CompileConf, JackResult, LineEnding, IMPL_VERSION};
use log::{error, info};

static USAGE: &str = r#"
usage: jackc CMD PATH [OPTIONS]

commands:
    compile     Compile a .jack file, or every .jack file in a directory
    tokens      Print the tokens of the target .jack file

options:
    --crlf      Terminate VM instructions with CRLF instead of LF

examples:
    jackc compile Main.jack
    jackc compile Pong/ --crlf
    jackc tokens Main.jack
"#;

/// Compile every unit found at the path, each to a sibling `.vm` file.
///
/// Returns the number of units that failed. A failed unit does not
/// stop the others from compiling.
fn run_compiler(path: impl AsRef<Path>, conf: CompileConf) -> JackResult<usize> {
    let sources = find_sources(path.as_ref())?;
    let mut failures = 0;

    for source_path in sources {
        let start = Instant::now();

        let source_code = match fs::read_to_string(&source_path) {
            Ok(source_code) => source_code,
            Err(err) => {
                error!("{}: {}", source_path.display(), err);
                failures += 1;
                continue;
            }
        };

        match compile_file(&source_path, &source_code, conf.clone()) {
            Ok(out_path) => info!(
                "{} -> {} ({}ms)",
                source_path.display(),
                out_path.display(),
                start.elapsed().as_nanos() as f64 / 1000000.0
            ),
            Err(err) => {
                // Render against the source so the message shows the offending line.
                error!("{}: {}", source_path.display(), err.render(&source_code));
                failures += 1;
            }
        }
    }

    Ok(failures)
}

/// Either the file itself, or the `.jack` files directly inside the directory.
fn find_sources(path: &Path) -> JackResult<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut sources = vec![];
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_file() && entry_path.extension().map_or(false, |ext| ext == "jack") {
            sources.push(entry_path);
        }
    }

    // Directory order is platform dependent.
    sources.sort();

    Ok(sources)
}

fn compile_file(source_path: &Path, source_code: &str, conf: CompileConf) -> JackResult<PathBuf> {
    let code = jack::compile_with(source_code, conf)?;

    let out_path = source_path.with_extension("vm");
    fs::write(&out_path, code)?;

    Ok(out_path)
}

fn run_tokenizer(filepath: impl AsRef<Path>) -> JackResult<()> {
    let source_code = fs::read_to_string(filepath)?;
    let mut lexer = Lexer::new(source_code.as_str());

    println!(" offset:len token                fragment");
    loop {
        let token = match lexer.next_token() {
            Ok(token) => token,
            Err(err) => {
                error!("{}", jack::JackError::from(err).render(&source_code));
                break;
            }
        };

        let offset = token.span.index;
        let len = token.span.size;
        let kind = format!("{:?}", token.kind); // cannot format debug print {:?} into columns
        let fragment = token.fragment(lexer.source_code());
        println!("{offset:7}:{len: <3} {kind: <20} \"{fragment}\"");

        if token.kind == TokenKind::EOF {
            break;
        }
    }

    Ok(())
}

fn main() {
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let result = match parse_args() {
        Some(Cmd::Compile { path, line_ending }) => {
            run_compiler(path, CompileConf { line_ending }).map(|failures| failures == 0)
        }
        Some(Cmd::Tokens { filepath }) => run_tokenizer(filepath).map(|_| true),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            error!("{err}");
            process::exit(1)
        }
    }
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next()?.as_str() {
        "compile" => {
            let path = args.next()?;
            let line_ending = match args.next().as_deref() {
                None => LineEnding::Lf,
                Some("--crlf") => LineEnding::CrLf,
                Some(_) => return None,
            };
            Some(Cmd::Compile { path, line_ending })
        }
        "tokens" => Some(Cmd::Tokens {
            filepath: args.next()?,
        }),
        _ => None,
    }
}

fn print_usage() {
    println!("Jack compiler v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Compile file or directory
    Compile {
        path: String,
        line_ending: LineEnding,
    },
    /// Dump tokens
    Tokens { filepath: String },
}
