use crate::ast::{Ast, Stmt};
use crate::error::InterpError;
use crate::evaluator::{Environment, Evaluator};
use crate::lexer::{Lexer, TokenType};
use crate::parser::{Parser, DEFAULT_MAX_DEPTH};
use tracing::{debug, trace};

/// Which entry rule the source is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `BEGIN ... END.`, run for its effect on the environment.
    Program,
    /// A bare arithmetic expression, run for its value.
    Expression,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub max_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Environment(Environment),
    Value(i64),
}

pub fn parse_source(source: &str, options: &RunOptions, mode: Mode) -> Result<Ast, InterpError> {
    let mut parser = Parser::new(Lexer::new(source))?.with_max_depth(options.max_depth);
    let ast = match mode {
        Mode::Program => parser.parse_program()?,
        Mode::Expression => parser.parse_expression()?,
    };
    debug!(
        ?mode,
        tokens = parser.tokens_consumed(),
        statements = statement_count(&ast),
        "parsed source"
    );
    trace!(tree = %ast, "syntax tree");
    Ok(ast)
}

/// Assignments and empty statements in the tree, counting into nested blocks.
pub fn statement_count(ast: &Ast) -> usize {
    fn count(stmt: &Stmt) -> usize {
        match stmt {
            Stmt::Compound { statements, .. } => statements.iter().map(count).sum(),
            Stmt::Assignment { .. } | Stmt::Empty { .. } => 1,
        }
    }

    match ast {
        Ast::Expr(_) => 0,
        Ast::Stmt(stmt) => count(stmt),
    }
}

/// Parse and run a whole program in a fresh environment, returning the
/// bindings it left behind.
pub fn run_program(source: &str, options: &RunOptions) -> Result<Environment, InterpError> {
    let ast = parse_source(source, options, Mode::Program)?;
    let mut evaluator = Evaluator::new();
    evaluator.evaluate(&ast)?;
    let environment = evaluator.into_environment();
    debug!(bindings = environment.len(), "program finished");
    Ok(environment)
}

pub fn run_expression(source: &str, options: &RunOptions) -> Result<i64, InterpError> {
    let ast = parse_source(source, options, Mode::Expression)?;
    let value = Evaluator::new().evaluate(&ast)?.unwrap_or_default();
    debug!(value, "expression evaluated");
    Ok(value)
}

pub fn execute(source: &str, options: &RunOptions, mode: Mode) -> Result<Outcome, InterpError> {
    match mode {
        Mode::Program => run_program(source, options).map(Outcome::Environment),
        Mode::Expression => run_expression(source, options).map(Outcome::Value),
    }
}

/// Run `source` and print the result, or report the error against the
/// source text. Returns whether the run succeeded.
pub fn run(source: &str, filename: Option<&str>, mode: Mode, options: &RunOptions) -> bool {
    match execute(source, options, mode) {
        Ok(Outcome::Value(value)) => {
            println!("{}", value);
            true
        }
        Ok(Outcome::Environment(environment)) => {
            for (name, value) in environment.sorted() {
                println!("{} = {}", name, value);
            }
            true
        }
        Err(error) => {
            debug!(kind = ?error.kind, "run failed");
            error.report(source, filename);
            false
        }
    }
}

/// Parse only and print the tree.
pub fn dump_ast(source: &str, filename: Option<&str>, mode: Mode, options: &RunOptions) -> bool {
    match parse_source(source, options, mode) {
        Ok(ast) => {
            println!("{}", ast);
            true
        }
        Err(error) => {
            error.report(source, filename);
            false
        }
    }
}

/// Programs start with `BEGIN`; anything else is treated as an expression.
pub fn detect_mode(source: &str) -> Mode {
    let starts_with_begin = Lexer::new(source)
        .next()
        .and_then(Result::ok)
        .is_some_and(|token| token.token_type == TokenType::Begin);
    if starts_with_begin {
        Mode::Program
    } else {
        Mode::Expression
    }
}
