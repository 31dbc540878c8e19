use crate::ast::{Ast, BinaryOp, Expr, Stmt, UnaryOp};
use crate::error::{InterpError, Span};
use std::collections::hash_map;
use std::collections::HashMap;

/// Variable bindings for a single evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    values: HashMap<String, i64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Bind `name`, replacing any earlier value.
    pub fn assign(&mut self, name: &str, value: i64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, i64> {
        self.values.iter()
    }

    /// Bindings ordered by name.
    pub fn sorted(&self) -> Vec<(&str, i64)> {
        let mut pairs: Vec<_> = self.values.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    pub fn into_inner(self) -> HashMap<String, i64> {
        self.values
    }
}

impl From<Environment> for HashMap<String, i64> {
    fn from(environment: Environment) -> Self {
        environment.values
    }
}

impl<'a> IntoIterator for &'a Environment {
    type Item = (&'a String, &'a i64);
    type IntoIter = hash_map::Iter<'a, String, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Tree-walking evaluator. Blocks, parentheses and unary operators recurse,
/// and the parser bounds how deep those nest. Chains of binary operators
/// are walked along their left spine without recursing, so `1+1+...+1` of
/// any length runs in constant stack.
pub struct Evaluator {
    environment: Environment,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
        }
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn into_environment(self) -> Environment {
        self.environment
    }

    /// Run a parsed root. Expressions yield their value; statements yield
    /// `None` and leave their effects in the environment.
    pub fn evaluate(&mut self, ast: &Ast) -> Result<Option<i64>, InterpError> {
        match ast {
            Ast::Expr(expr) => self.evaluate_expression(expr).map(Some),
            Ast::Stmt(stmt) => {
                self.execute(stmt)?;
                Ok(None)
            }
        }
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<(), InterpError> {
        match stmt {
            Stmt::Assignment { target, value, .. } => {
                let value = self.evaluate_expression(value)?;
                self.environment.assign(&target.name, value);
                Ok(())
            }
            Stmt::Compound { statements, .. } => {
                for statement in statements {
                    self.execute(statement)?;
                }
                Ok(())
            }
            Stmt::Empty { .. } => Ok(()),
        }
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<i64, InterpError> {
        match expr {
            Expr::Number { value, .. } => Ok(*value),
            Expr::Variable(variable) => self.environment.get(&variable.name).ok_or_else(|| {
                InterpError::name_error(
                    variable.span,
                    format!("Undefined variable '{}'", variable.name),
                )
                .with_help("Assign a value with ':=' before reading the variable.")
            }),
            Expr::Binary { .. } => self.evaluate_chain(expr),
            Expr::Unary {
                operator,
                operand,
                span,
            } => {
                let value = self.evaluate_expression(operand)?;
                match operator {
                    UnaryOp::Plus => Ok(value),
                    UnaryOp::Minus => value.checked_neg().ok_or_else(|| overflow(*span)),
                }
            }
        }
    }

    /// Evaluate a left-leaning chain of binary operators. The leftmost
    /// operand is evaluated first, then each right operand in source order.
    fn evaluate_chain(&mut self, expr: &Expr) -> Result<i64, InterpError> {
        let mut spine = Vec::new();
        let mut node = expr;
        while let Expr::Binary {
            left,
            operator,
            right,
            span,
        } = node
        {
            spine.push((*operator, right.as_ref(), *span));
            node = left.as_ref();
        }

        let mut acc = self.evaluate_expression(node)?;
        for (operator, right, span) in spine.into_iter().rev() {
            let right_val = self.evaluate_expression(right)?;

            // A literal zero divisor is defined to give 0. Zero reached at
            // run time is still an error.
            acc = if operator == BinaryOp::Divide && right.is_literal_zero() {
                0
            } else {
                self.evaluate_binary_op(operator, acc, right_val, span, right.span())?
            };
        }

        Ok(acc)
    }

    fn evaluate_binary_op(
        &self,
        operator: BinaryOp,
        left: i64,
        right: i64,
        span: Span,
        right_span: Span,
    ) -> Result<i64, InterpError> {
        let result = match operator {
            BinaryOp::Add => left.checked_add(right),
            BinaryOp::Subtract => left.checked_sub(right),
            BinaryOp::Multiply => left.checked_mul(right),
            BinaryOp::Divide => {
                if right == 0 {
                    return Err(InterpError::runtime_error(
                        right_span,
                        "Division by zero".to_string(),
                    ));
                }
                left.checked_div(right)
            }
        };

        result.ok_or_else(|| overflow(span))
    }
}

fn overflow(span: Span) -> InterpError {
    InterpError::runtime_error(span, "Integer overflow".to_string())
}
