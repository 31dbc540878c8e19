use crate::ast::{Ast, BinaryOp, Expr, Stmt, UnaryOp, Variable};
use crate::error::{InterpError, Span};
use crate::lexer::{Lexer, Token, TokenType};
use tracing::trace;

/// Default limit on nested blocks, parentheses and unary operators.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Recursive-descent parser with a single token of lookahead, pulled from
/// the lexer on demand. No backtracking and no error recovery.
pub struct Parser {
    lexer: Lexer,
    current: Token,
    consumed: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, InterpError> {
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            consumed: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of tokens consumed so far; the final `Eof` is never consumed.
    pub fn tokens_consumed(&self) -> usize {
        self.consumed
    }

    /// program := compound_statement '.' EOF
    pub fn parse_program(&mut self) -> Result<Ast, InterpError> {
        let block = self.compound_statement()?;
        self.consume_with_help(
            TokenType::Dot,
            "Expected '.' after program",
            "A program is a single 'BEGIN ... END' block followed by '.'.",
        )?;
        self.expect_end("program")?;
        Ok(Ast::Stmt(block))
    }

    /// Parse a bare arithmetic expression, bypassing `program`.
    pub fn parse_expression(&mut self) -> Result<Ast, InterpError> {
        let expr = self.expr()?;
        self.expect_end("expression")?;
        Ok(Ast::Expr(expr))
    }

    // compound_statement := BEGIN statement_list END
    fn compound_statement(&mut self) -> Result<Stmt, InterpError> {
        let begin = self.consume(TokenType::Begin, "Expected 'BEGIN'")?;
        self.enter(begin.span)?;

        let statements = self.statement_list()?;
        let end = self.consume_with_help(
            TokenType::End,
            "Expected 'END' to close block",
            "Statements inside a block are separated by ';' and the block is closed with 'END'.",
        )?;

        self.leave();
        Ok(Stmt::Compound {
            statements,
            span: begin.span.to(end.span),
        })
    }

    // statement_list := statement ( ';' statement )*
    fn statement_list(&mut self) -> Result<Vec<Stmt>, InterpError> {
        let mut statements = vec![self.statement()?];

        while self.check(TokenType::Semicolon) {
            self.advance()?;
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    // statement := compound_statement | assignment_statement | empty
    fn statement(&mut self) -> Result<Stmt, InterpError> {
        match self.current.token_type {
            TokenType::Begin => self.compound_statement(),
            TokenType::Identifier => self.assignment_statement(),
            _ => Ok(Stmt::Empty {
                span: Span::new(self.current.span.start, self.current.span.start),
            }),
        }
    }

    // assignment_statement := variable ':=' expr
    fn assignment_statement(&mut self) -> Result<Stmt, InterpError> {
        let target = self.variable()?;
        self.consume_with_help(
            TokenType::Assign,
            "Expected ':=' after variable",
            "Assignments are written 'name := expression'.",
        )?;
        let value = self.expr()?;
        let span = target.span.to(value.span());

        Ok(Stmt::Assignment {
            target,
            value,
            span,
        })
    }

    fn variable(&mut self) -> Result<Variable, InterpError> {
        let token = self.consume(TokenType::Identifier, "Expected variable name")?;
        Ok(Variable {
            name: token.lexeme,
            span: token.span,
        })
    }

    // expr := term ( ('+'|'-') term )*
    fn expr(&mut self) -> Result<Expr, InterpError> {
        let mut expr = self.term()?;

        while let Some(operator) = self.additive_operator() {
            self.advance()?;
            let right = self.term()?;
            let span = expr.span().to(right.span());

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    // term := factor ( ('*'|'/') factor )*
    fn term(&mut self) -> Result<Expr, InterpError> {
        let mut expr = self.factor()?;

        while let Some(operator) = self.multiplicative_operator() {
            self.advance()?;
            let right = self.factor()?;
            let span = expr.span().to(right.span());

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    // factor := ('+'|'-') factor | INTEGER | '(' expr ')' | variable
    fn factor(&mut self) -> Result<Expr, InterpError> {
        match self.current.token_type {
            TokenType::Plus | TokenType::Minus => {
                let operator = if self.current.token_type == TokenType::Plus {
                    UnaryOp::Plus
                } else {
                    UnaryOp::Minus
                };
                let op_token = self.advance()?;
                self.enter(op_token.span)?;
                let operand = self.factor()?;
                self.leave();

                let span = op_token.span.to(operand.span());
                Ok(Expr::Unary {
                    operator,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenType::Integer => {
                let token = self.advance()?;
                let value = token.integer().ok_or_else(|| {
                    InterpError::syntax_error(
                        token.span,
                        format!("Malformed integer literal '{}'", token.lexeme),
                    )
                })?;
                Ok(Expr::Number {
                    value,
                    span: token.span,
                })
            }
            TokenType::LeftParen => {
                let open = self.advance()?;
                self.enter(open.span)?;
                let expr = self.expr()?;
                self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every '(' needs a matching ')'.",
                )?;
                self.leave();
                Ok(expr)
            }
            TokenType::Identifier => Ok(Expr::Variable(self.variable()?)),
            TokenType::Real => Err(InterpError::syntax_error(
                self.current.span,
                format!("Real literal '{}' is not allowed here", self.current.lexeme),
            )
            .with_help("Only integer arithmetic is supported.")),
            found => Err(InterpError::syntax_error(
                self.current.span,
                format!("Expected expression, found {}", found),
            )),
        }
    }

    fn additive_operator(&self) -> Option<BinaryOp> {
        match self.current.token_type {
            TokenType::Plus => Some(BinaryOp::Add),
            TokenType::Minus => Some(BinaryOp::Subtract),
            _ => None,
        }
    }

    fn multiplicative_operator(&self) -> Option<BinaryOp> {
        match self.current.token_type {
            TokenType::Star => Some(BinaryOp::Multiply),
            TokenType::Slash => Some(BinaryOp::Divide),
            _ => None,
        }
    }

    fn expect_end(&self, what: &str) -> Result<(), InterpError> {
        if self.check(TokenType::Eof) {
            Ok(())
        } else {
            Err(InterpError::syntax_error(
                self.current.span,
                format!("Unexpected {} after end of {}", self.current.token_type, what),
            ))
        }
    }

    fn enter(&mut self, span: Span) -> Result<(), InterpError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(InterpError::syntax_error(
                span,
                format!("Nesting too deep (limit is {})", self.max_depth),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.current.token_type == token_type
    }

    /// Move to the next token, returning the one just consumed.
    fn advance(&mut self) -> Result<Token, InterpError> {
        let next = self.lexer.next_token()?;
        let token = std::mem::replace(&mut self.current, next);
        self.consumed += 1;
        trace!(kind = %token.token_type, lexeme = %token.lexeme, start = token.span.start, "token");
        Ok(token)
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<Token, InterpError> {
        if self.check(token_type) {
            self.advance()
        } else {
            Err(self.mismatch(message))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: &str,
    ) -> Result<Token, InterpError> {
        if self.check(token_type) {
            self.advance()
        } else {
            Err(self.mismatch(message).with_help(help))
        }
    }

    fn mismatch(&self, message: &str) -> InterpError {
        InterpError::syntax_error(
            self.current.span,
            format!("{}, found {}", message, self.current.token_type),
        )
    }
}
