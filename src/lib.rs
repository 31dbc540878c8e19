// tinypas
//
// Tokenizer, recursive-descent parser and tree-walking evaluator for a
// small Pascal-like language: integer arithmetic, variable assignment and
// `BEGIN ... END.` blocks.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;

pub use ast::{Ast, BinaryOp, Expr, Stmt, UnaryOp, Variable};
pub use error::{ErrorKind, InterpError, Span};
pub use evaluator::{Environment, Evaluator};
pub use lexer::{Lexer, Literal, Token, TokenType};
pub use parser::Parser;
pub use runner::{run_expression, run_program, Mode, RunOptions};

pub use repl::start as start_repl;
