use std::collections::HashMap;
use tinypas::error::ErrorKind;
use tinypas::runner::{execute, run_expression, run_program, Mode, Outcome, RunOptions};
use tinypas::{Environment, Evaluator, Lexer, Parser};

fn eval(source: &str) -> i64 {
    run_expression(source, &RunOptions::default()).expect("expression failed")
}

fn run(source: &str) -> HashMap<String, i64> {
    run_program(source, &RunOptions::default())
        .expect("program failed")
        .into_inner()
}

fn env(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn error_kind(source: &str, mode: Mode) -> ErrorKind {
    execute(source, &RunOptions::default(), mode)
        .expect_err("run should fail")
        .kind
}

#[test]
fn precedence_and_associativity() {
    let cases = [
        ("3", 3),
        ("10 + 11 + 11", 32),
        ("10 - 5 - 2", 3),
        ("10 - 5 + 2", 7),
        ("2 + 3 * 4", 14),
        ("(2 + 3) * 4", 20),
        ("100 / 10 / 5", 2),
        ("14 + 2 * 3 - 6 / 2", 17),
        ("7 + 3 * (10 / (12 / (3 + 1) - 1))", 22),
        ("7 + (((3 + 2)))", 12),
    ];
    for (source, expected) in cases {
        assert_eq!(eval(source), expected, "{}", source);
    }
}

#[test]
fn unary_operators() {
    assert_eq!(eval("--2"), 2);
    assert_eq!(eval("-+2"), -2);
    assert_eq!(eval("-(+2)"), -2);
    assert_eq!(eval("-(-2)"), 2);
    assert_eq!(eval("5 - - - + - 3"), 8);
    assert_eq!(eval("5 - - - + - (3 + 4) - +2"), 10);
}

#[test]
fn division() {
    assert_eq!(eval("(20+10)/(-2)"), -15);
    assert_eq!(eval("7 / 2"), 3);
}

#[test]
fn literal_zero_divisor_yields_zero() {
    assert_eq!(eval("20/0"), 0);
    assert_eq!(eval("20/(0)"), 0);
    assert_eq!(eval("1 + 20/0"), 1);
}

#[test]
fn computed_zero_divisor_is_runtime_error() {
    assert_eq!(error_kind("20 / (1 - 1)", Mode::Expression), ErrorKind::RuntimeError);
    assert_eq!(error_kind("20 / -0", Mode::Expression), ErrorKind::RuntimeError);
    assert_eq!(
        error_kind("BEGIN z := 0; a := 5 / z END.", Mode::Program),
        ErrorKind::RuntimeError
    );
}

#[test]
fn overflow_is_runtime_error() {
    assert_eq!(
        error_kind("9223372036854775807 + 1", Mode::Expression),
        ErrorKind::RuntimeError
    );
    assert_eq!(
        error_kind("-9223372036854775807 - 2", Mode::Expression),
        ErrorKind::RuntimeError
    );
}

#[test]
fn last_write_wins() {
    assert_eq!(run("BEGIN a:=2; a:=3 END."), env(&[("a", 3)]));
}

#[test]
fn nested_blocks_run_in_textual_order() {
    assert_eq!(
        run("BEGIN BEGIN a:=5 END; b:=11 END."),
        env(&[("a", 5), ("b", 11)])
    );
}

#[test]
fn assignment_of_expression() {
    for source in ["BEGIN x := 10+11 END.", " BEGIN x:=10 + 11 END. ", " BEGIN x:=10 + 11   END."] {
        assert_eq!(run(source), env(&[("x", 21)]), "{}", source);
    }
}

#[test]
fn empty_block_leaves_environment_empty() {
    assert!(run("BEGIN END.").is_empty());
    assert!(run("BEGIN ; ; END.").is_empty());
}

#[test]
fn full_program() {
    let source = "
        BEGIN
            BEGIN
                number := 2;
                a := number;
                b := 10 * a + 10 * number / 4;
                c := a - - b
            END;
            x := 11;
        END.
    ";
    assert_eq!(
        run(source),
        env(&[("number", 2), ("a", 2), ("b", 25), ("c", 27), ("x", 11)])
    );
}

#[test]
fn variables_read_earlier_assignments() {
    assert_eq!(
        run("BEGIN a := 1; a := a + 1; b := a * 10 END."),
        env(&[("a", 2), ("b", 20)])
    );
}

#[test]
fn undefined_variable_is_name_error() {
    assert_eq!(error_kind("x + 1", Mode::Expression), ErrorKind::NameError);
    assert_eq!(error_kind("BEGIN a := b END.", Mode::Program), ErrorKind::NameError);
    assert_eq!(
        error_kind("BEGIN a := 1; b := c END.", Mode::Program),
        ErrorKind::NameError
    );
}

#[test]
fn literal_zero_divisor_does_not_skip_left_operand() {
    assert_eq!(error_kind("y / 0", Mode::Expression), ErrorKind::NameError);
}

#[test]
fn name_error_message_names_the_variable() {
    let err = run_program("BEGIN a := missing END.", &RunOptions::default()).unwrap_err();
    assert_eq!(err.message, "Undefined variable 'missing'");
    assert_eq!(err.span.start, 11);
}

#[test]
fn caller_supplied_environment() {
    let mut environment = Environment::new();
    environment.assign("x", 4);

    let ast = Parser::new(Lexer::new("x * 2"))
        .unwrap()
        .parse_expression()
        .unwrap();
    let mut evaluator = Evaluator::with_environment(environment);
    assert_eq!(evaluator.evaluate(&ast).unwrap(), Some(8));

    let program = Parser::new(Lexer::new("BEGIN y := x + 1 END."))
        .unwrap()
        .parse_program()
        .unwrap();
    assert_eq!(evaluator.evaluate(&program).unwrap(), None);
    assert_eq!(evaluator.environment().get("y"), Some(5));
}

#[test]
fn runs_do_not_share_state() {
    run("BEGIN shared := 1 END.");
    assert!(!run("BEGIN other := 2 END.").contains_key("shared"));
}

#[test]
fn execute_reports_outcome_by_mode() {
    let options = RunOptions::default();
    assert_eq!(
        execute("1 + 1", &options, Mode::Expression).unwrap(),
        Outcome::Value(2)
    );
    match execute("BEGIN a := 1 END.", &options, Mode::Program).unwrap() {
        Outcome::Environment(environment) => assert_eq!(environment.sorted(), vec![("a", 1)]),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn first_error_wins() {
    // Lexing is lazy, so the syntax error before the bad character surfaces first.
    assert_eq!(error_kind("BEGIN a := END. $", Mode::Program), ErrorKind::SyntaxError);
    assert_eq!(error_kind("BEGIN $ a := END.", Mode::Program), ErrorKind::LexError);
}

#[test]
fn detect_mode_by_leading_keyword() {
    use tinypas::runner::detect_mode;
    assert_eq!(detect_mode("  { hi } BEGIN END."), Mode::Program);
    assert_eq!(detect_mode("1 + 2"), Mode::Expression);
    assert_eq!(detect_mode("begin"), Mode::Expression);
}

/// Run `f` on a thread with a 2 MiB stack, the default for spawned threads.
fn on_small_stack<F: FnOnce() + Send + 'static>(f: F) {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(f)
        .expect("spawn failed")
        .join()
        .expect("worker thread panicked");
}

#[test]
fn long_flat_sum_runs_in_constant_stack() {
    on_small_stack(|| {
        let source = vec!["1"; 200_000].join("+");
        assert_eq!(eval(&source), 200_000);
    });
}

#[test]
fn long_flat_difference_and_products() {
    on_small_stack(|| {
        let source = format!("0{}", "-1".repeat(200_000));
        assert_eq!(eval(&source), -200_000);

        let source = vec!["2*3/3"; 100_000].join("+");
        assert_eq!(eval(&source), 200_000);
    });
}

#[test]
fn long_assignment_in_program() {
    on_small_stack(|| {
        let source = format!("BEGIN x := {} END.", vec!["1"; 200_000].join("+"));
        assert_eq!(run(&source), env(&[("x", 200_000)]));
    });
}

#[test]
fn long_chain_displays_and_drops() {
    on_small_stack(|| {
        let source = vec!["1"; 200_000].join("+");
        let ast = Parser::new(Lexer::new(&source))
            .unwrap()
            .parse_expression()
            .unwrap();

        let rendered = ast.to_string();
        assert!(rendered.starts_with("BinaryExpr(+, BinaryExpr(+, "));
        assert!(rendered.ends_with(", Num(1))"));
        drop(ast);
    });
}

#[test]
fn chain_keeps_literal_zero_rule_per_link() {
    assert_eq!(eval("5 + 20/0 + 1"), 6);
    assert_eq!(eval("8 / 0 * 3 + 2"), 2);
}

#[test]
fn statement_count_includes_nested_blocks() {
    use tinypas::runner::{parse_source, statement_count};
    let ast = parse_source(
        "BEGIN a := 1; BEGIN b := 2; c := 3 END; END.",
        &RunOptions::default(),
        Mode::Program,
    )
    .unwrap();
    assert_eq!(statement_count(&ast), 4);
}
