use crate::error::Span;
use std::fmt;

/// A variable reference. Used both for reads and as an assignment target;
/// the name is only resolved when evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number {
        value: i64,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Variable(Variable),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Variable(variable) => variable.span,
        }
    }

    /// True only for a literal `0` written directly in the source.
    pub fn is_literal_zero(&self) -> bool {
        matches!(self, Expr::Number { value: 0, .. })
    }
}

/// Tear down nested children through an explicit stack so a long operator
/// chain does not drop one stack frame per link.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        take_children(self, &mut pending);
        while let Some(mut child) = pending.pop() {
            take_children(&mut child, &mut pending);
        }
    }
}

fn take_children(expr: &mut Expr, pending: &mut Vec<Expr>) {
    match expr {
        Expr::Binary { left, right, .. } => {
            pending.push(std::mem::replace(left.as_mut(), Expr::placeholder()));
            pending.push(std::mem::replace(right.as_mut(), Expr::placeholder()));
        }
        Expr::Unary { operand, .. } => {
            pending.push(std::mem::replace(operand.as_mut(), Expr::placeholder()));
        }
        Expr::Number { .. } | Expr::Variable(_) => {}
    }
}

impl Expr {
    fn placeholder() -> Self {
        Expr::Number {
            value: 0,
            span: Span::new(0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment {
        target: Variable,
        value: Expr,
        span: Span,
    },
    /// `BEGIN ... END`; statements stay in source order.
    Compound {
        statements: Vec<Stmt>,
        span: Span,
    },
    Empty {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assignment { span, .. } => *span,
            Stmt::Compound { span, .. } => *span,
            Stmt::Empty { span } => *span,
        }
    }
}

/// Root produced by the parser: a whole program or a bare expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Expr(Expr),
    Stmt(Stmt),
}

impl Ast {
    pub fn span(&self) -> Span {
        match self {
            Ast::Expr(expr) => expr.span(),
            Ast::Stmt(stmt) => stmt.span(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number { value, .. } => write!(f, "Num({})", value),
            Expr::Binary { .. } => {
                // Print the left spine without recursing into it.
                let mut spine = Vec::new();
                let mut node = self;
                while let Expr::Binary {
                    left,
                    operator,
                    right,
                    ..
                } = node
                {
                    spine.push((*operator, right.as_ref()));
                    node = left.as_ref();
                }
                for (operator, _) in &spine {
                    write!(f, "BinaryExpr({}, ", operator.symbol())?;
                }
                write!(f, "{}", node)?;
                for (_, right) in spine.iter().rev() {
                    write!(f, ", {})", right)?;
                }
                Ok(())
            }
            Expr::Unary {
                operator, operand, ..
            } => write!(f, "UnaryExpr({}, {})", operator.symbol(), operand),
            Expr::Variable(variable) => write!(f, "Var({})", variable.name),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Assignment { target, value, .. } => {
                write!(f, "Assign({}, {})", target.name, value)
            }
            Stmt::Compound { statements, .. } => {
                write!(f, "Compound[")?;
                for (i, statement) in statements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", statement)?;
                }
                write!(f, "]")
            }
            Stmt::Empty { .. } => write!(f, "Empty"),
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ast::Expr(expr) => write!(f, "{}", expr),
            Ast::Stmt(stmt) => write!(f, "{}", stmt),
        }
    }
}
