use jack::{
    compile::CompilationEngine,
    compile_str, compile_with,
    tokens::{Keyword, Punct, TokenKind},
    CompileConf, JackError, LexError, LineEnding, SyntaxError,
};

const SQUARE_SOURCE: &str = include_str!("Square.jack");
const SQUARE_VM: &str = include_str!("Square.vm");

/// Wraps statements into a function of a class named `Main`.
fn compile_main(locals: &str, statements: &str) -> Vec<String> {
    let source = format!(
        "class Main {{\n    function void main() {{\n        {locals}\n        {statements}\n    }}\n}}\n"
    );
    let code = compile_str(&source).unwrap();
    code.lines().map(str::to_string).collect()
}

#[test]
fn test_compile_class() {
    let code = compile_str(SQUARE_SOURCE).unwrap();
    assert_eq!(code, SQUARE_VM);
}

#[test]
fn test_compile_engine_into_sink() {
    let engine = CompilationEngine::new(SQUARE_SOURCE, String::new());
    let code = engine.compile_class().unwrap();
    assert_eq!(code.lines().count(), SQUARE_VM.lines().count());
}

#[test]
fn test_expression_left_to_right() {
    let code = compile_main("var int x;", "let x = 2 + 3 * 4; return;");

    assert_eq!(
        code,
        vec![
            "function Main.main 1",
            "push constant 2",
            "push constant 3",
            "add",
            "push constant 4",
            "call Math.multiply 2",
            "pop local 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_parentheses_and_unary() {
    let code = compile_main(
        "var int x, y; var boolean b;",
        "let x = -(y / 2); let b = ~(x = y) | false; return;",
    );

    assert_eq!(
        &code[1..13],
        &[
            "push local 1",
            "push constant 2",
            "call Math.divide 2",
            "neg",
            "pop local 0",
            "push local 0",
            "push local 1",
            "eq",
            "not",
            "push constant 0",
            "or",
            "pop local 2",
        ]
    );
}

#[test]
fn test_keyword_constants() {
    let code = compile_main(
        "var boolean t, f; var Array n;",
        "let t = true; let f = false; let n = null; return;",
    );

    assert_eq!(
        &code[1..8],
        &[
            "push constant 0",
            "not",
            "pop local 0",
            "push constant 0",
            "pop local 1",
            "push constant 0",
            "pop local 2",
        ]
    );
}

#[test]
fn test_string_constant() {
    let code = compile_main("", "do Output.printString(\"Hi\"); return;");

    assert_eq!(
        &code[1..9],
        &[
            "push constant 2",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "call Output.printString 1",
            "pop temp 0",
        ]
    );
}

#[test]
fn test_empty_string_constant() {
    let code = compile_main("", "do Output.printString(\"\"); return;");

    assert_eq!(
        &code[1..4],
        &["push constant 0", "call String.new 1", "call Output.printString 1"]
    );
}

#[test]
fn test_while_labels() {
    let code = compile_main(
        "var int i;",
        "while (i < 10) { let i = i + 1; } while (false) { } return;",
    );

    assert_eq!(
        code,
        vec![
            "function Main.main 1",
            "label WHILE_EXP0",
            "push local 0",
            "push constant 10",
            "lt",
            "not",
            "if-goto WHILE_END0",
            "push local 0",
            "push constant 1",
            "add",
            "pop local 0",
            "goto WHILE_EXP0",
            "label WHILE_END0",
            "label WHILE_EXP1",
            "push constant 0",
            "not",
            "if-goto WHILE_END1",
            "goto WHILE_EXP1",
            "label WHILE_END1",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_labels_restart_per_subroutine() {
    const CODE: &str = r#"
class Loops {
    function void a() {
        while (true) { }
        if (true) { }
        return;
    }

    function void b() {
        while (true) { }
        if (true) { }
        return;
    }
}
"#;

    let code = compile_str(CODE).unwrap();
    assert_eq!(code.matches("label WHILE_EXP0").count(), 2);
    assert_eq!(code.matches("label IF_TRUE0").count(), 2);
    assert!(!code.contains("WHILE_EXP1"));
    assert!(!code.contains("IF_TRUE1"));
}

#[test]
fn test_if_without_else() {
    let code = compile_main("var int x;", "if (x) { let x = 1; } return;");

    assert_eq!(
        &code[1..9],
        &[
            "push local 0",
            "if-goto IF_TRUE0",
            "goto IF_END0",
            "label IF_TRUE0",
            "push constant 1",
            "pop local 0",
            "label IF_END0",
            "push constant 0",
        ]
    );
}

#[test]
fn test_nested_if_labels() {
    let code = compile_main(
        "var int x;",
        "if (x) { if (x) { let x = 1; } } else { let x = 2; } return;",
    );

    assert_eq!(
        &code[1..17],
        &[
            "push local 0",
            "if-goto IF_TRUE0",
            "push constant 2",
            "pop local 0",
            "goto IF_END0",
            "label IF_TRUE0",
            "push local 0",
            "if-goto IF_TRUE1",
            "goto IF_END1",
            "label IF_TRUE1",
            "push constant 1",
            "pop local 0",
            "label IF_END1",
            "label IF_END0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_array_store() {
    let code = compile_main("var Array a; var int i;", "let a[i] = 5; return;");

    assert_eq!(
        &code[1..7],
        &[
            "push local 0",
            "push local 1",
            "add",
            "pop pointer 1",
            "push constant 5",
            "pop that 0",
        ]
    );
}

#[test]
fn test_array_store_from_array() {
    let code = compile_main("var Array a, b; var int i, j;", "let a[i] = b[j]; return;");

    assert_eq!(
        &code[1..13],
        &[
            "push local 0",
            "push local 2",
            "add",
            "push local 1",
            "push local 3",
            "add",
            "pop pointer 1",
            "push that 0",
            "pop temp 0",
            "pop pointer 1",
            "push temp 0",
            "pop that 0",
        ]
    );
}

#[test]
fn test_array_store_from_call() {
    let code = compile_main("var Array a; var int i, x;", "let a[i] = Math.abs(x); return;");

    assert_eq!(
        &code[1..8],
        &[
            "push local 0",
            "push local 1",
            "add",
            "pop pointer 1",
            "push local 2",
            "call Math.abs 1",
            "pop that 0",
        ]
    );
}

#[test]
fn test_array_load() {
    let code = compile_main("var Array a; var int x;", "let x = a[2]; return;");

    assert_eq!(
        &code[1..7],
        &[
            "push local 0",
            "push constant 2",
            "add",
            "pop pointer 1",
            "push that 0",
            "pop local 1",
        ]
    );
}

#[test]
fn test_call_forms() {
    const CODE: &str = r#"
class Game {
    field Ball ball;

    method void run() {
        var Paddle paddle;
        do ball.move(1, 2);
        do paddle.draw();
        do Screen.clear();
        do step(ball);
        return;
    }
}
"#;

    let code = compile_str(CODE).unwrap();
    let code = code.lines().collect::<Vec<_>>();

    assert_eq!(
        code,
        vec![
            "function Game.run 1",
            "push argument 0",
            "pop pointer 0",
            "push this 0",
            "push constant 1",
            "push constant 2",
            "call Ball.move 3",
            "pop temp 0",
            "push local 0",
            "call Paddle.draw 1",
            "pop temp 0",
            "call Screen.clear 0",
            "pop temp 0",
            "push pointer 0",
            "push this 0",
            "call Game.step 2",
            "pop temp 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_constructor_bare_return() {
    const CODE: &str = r#"
class Point {
    field int x, y;
    static int made;

    constructor Point new() {
        return;
    }
}
"#;

    assert_eq!(
        compile_str(CODE).unwrap(),
        "function Point.new 0\n\
         push constant 2\n\
         call Memory.alloc 1\n\
         pop pointer 0\n\
         push pointer 0\n\
         return\n"
    );
}

#[test]
fn test_method_arguments_start_at_one() {
    const CODE: &str = r#"
class Counter {
    method int add(int a, int b) {
        return a + b;
    }
}
"#;

    let code = compile_str(CODE).unwrap();
    assert!(code.contains("push argument 1\npush argument 2\nadd\nreturn\n"));
}

#[test]
fn test_crlf_line_ending() {
    let conf = CompileConf {
        line_ending: LineEnding::CrLf,
    };

    let code = compile_with(SQUARE_SOURCE, conf).unwrap();
    assert_eq!(code, SQUARE_VM.replace('\n', "\r\n"));
}

#[test]
fn test_undeclared_variable() {
    const CODE: &str = "class Main { function void main() { let x = 1; return; } }";

    let err = compile_str(CODE).unwrap_err();
    match &err {
        JackError::Syntax(SyntaxError::Expected {
            expected, found, span,
        }) => {
            assert_eq!(expected, "declared variable");
            assert_eq!(*found, TokenKind::Ident);
            assert_eq!(span.fragment(CODE), "x");
        }
        _ => panic!("unexpected error: {err:?}"),
    }
}

#[test]
fn test_undeclared_variable_in_term() {
    const CODE: &str = "class Main { function int f() { return y; } }";

    let err = compile_str(CODE).unwrap_err();
    assert_eq!(
        err.to_string(),
        "syntax error: expected declared variable, found identifier"
    );
    assert_eq!(err.span().map(|span| span.fragment(CODE)), Some("y"));
}

#[test]
fn test_missing_semicolon() {
    const CODE: &str = "class Main {\n  function void main() {\n    var int x;\n    let x = 1\n  }\n}\n";

    let err = compile_str(CODE).unwrap_err();
    assert!(matches!(
        err,
        JackError::Syntax(SyntaxError::Expected {
            found: TokenKind::Symbol(Punct::RightBrace),
            ..
        })
    ));

    let rendered = err.render(CODE);
    assert!(rendered.starts_with("syntax error: expected symbol ';', found symbol '}'"));
    assert!(rendered.contains("--> line 5, column 3"));
}

#[test]
fn test_trailing_tokens_after_class() {
    let err = compile_str("class A { } class B { }").unwrap_err();

    assert!(matches!(
        err,
        JackError::Syntax(SyntaxError::Expected {
            found: TokenKind::Keyword(Keyword::Class),
            ..
        })
    ));
}

#[test]
fn test_truncated_source() {
    let err = compile_str("class A {").unwrap_err();

    assert!(matches!(
        err,
        JackError::Syntax(SyntaxError::Expected {
            found: TokenKind::EOF,
            ..
        })
    ));
}

#[test]
fn test_bad_term() {
    const CODE: &str = "class Main { function int f() { return +; } }";

    let err = compile_str(CODE).unwrap_err();
    match err {
        JackError::Syntax(SyntaxError::Expected { expected, found, .. }) => {
            assert_eq!(expected, "term");
            assert_eq!(found, TokenKind::Symbol(Punct::Plus));
        }
        _ => panic!("unexpected error: {err:?}"),
    }
}

#[test]
fn test_lex_error_aborts_compile() {
    const CODE: &str = "class Main { function int f() { return 40000; } }";

    assert!(matches!(
        compile_str(CODE),
        Err(JackError::Lex(LexError::IntegerOverflow(_)))
    ));
}

#[test]
fn test_string_constant_length_limit() {
    let longest = "a".repeat(32767);
    let code = compile_main("", &format!("do Output.printString(\"{longest}\"); return;"));
    assert_eq!(code[1], "push constant 32767");
    assert_eq!(code[2], "call String.new 1");

    for len in [32768, 40000, 65537] {
        let source = format!(
            "class Main {{ function void main() {{ do Output.printString(\"{}\"); return; }} }}",
            "a".repeat(len)
        );

        match compile_str(&source).unwrap_err() {
            JackError::Lex(LexError::StringOverflow(span)) => {
                assert_eq!(span.size as usize, len);
            }
            err => panic!("unexpected error: {err:?}"),
        }
    }
}

#[test]
fn test_argument_count_limit() {
    let args = vec!["0"; u16::MAX as usize].join(",");

    // The receiver takes up one more argument slot.
    let source = format!("class Main {{ method void m() {{ do m({args}); return; }} }}");
    assert!(matches!(compile_str(&source), Err(JackError::Limit(_))));

    let source = format!("class Main {{ function void f() {{ do Sys.g({args}); return; }} }}");
    let code = compile_str(&source).unwrap();
    assert!(code.contains("call Sys.g 65535\n"));
}
