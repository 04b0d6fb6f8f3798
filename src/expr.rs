// Expression tree and the precedence-climbing expression parser.

use crate::ast::{Query, SelectItem};
use crate::node::NodeKind;
use crate::parser::{ParseResult, Parser};
use crate::token::TokenKind;

/// Expression AST with zero-copy strings
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// Column reference, optionally qualified (`t.col`)
    Column(ColumnRef<'a>),

    /// Literal value
    Literal(Literal<'a>),

    /// Function call such as `COUNT(*)` or `SUM(DISTINCT x)`
    Function(FuncCall<'a>),

    And {
        left: Box<Expr<'a>>,
        right: Box<Expr<'a>>,
    },

    Or {
        left: Box<Expr<'a>>,
        right: Box<Expr<'a>>,
    },

    Not(Box<Expr<'a>>),

    /// `=`, `!=`, `<`, `>`, `<=`, `>=`, `LIKE`, `NOT LIKE`
    Comparison {
        left: Box<Expr<'a>>,
        op: BinaryOp,
        right: Box<Expr<'a>>,
    },

    /// `+`, `-`, `*`, `/`
    Arithmetic {
        left: Box<Expr<'a>>,
        op: BinaryOp,
        right: Box<Expr<'a>>,
    },

    /// Parenthesized expression
    Nested(Box<Expr<'a>>),

    IsNull {
        expr: Box<Expr<'a>>,
        negated: bool,
    },

    Between {
        expr: Box<Expr<'a>>,
        negated: bool,
        low: Box<Expr<'a>>,
        high: Box<Expr<'a>>,
    },

    InList {
        expr: Box<Expr<'a>>,
        negated: bool,
        list: Vec<Expr<'a>>,
    },

    InSubquery {
        expr: Box<Expr<'a>>,
        negated: bool,
        query: Box<Query<'a>>,
    },

    Case {
        operand: Option<Box<Expr<'a>>>,
        branches: Vec<(Expr<'a>, Expr<'a>)>,
        else_result: Option<Box<Expr<'a>>>,
    },

    /// Scalar subquery
    Subquery(Box<Query<'a>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef<'a> {
    pub qualifier: Option<&'a str>,
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall<'a> {
    pub name: &'a str,
    pub distinct: bool,
    pub args: Vec<SelectItem<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal<'a> {
    Number(i64),
    Float(f64),
    String(&'a str),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Logical
    And,
    Or,

    // Comparison
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Like,
    NotLike,

    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl BinaryOp {
    /// Convert token to binary operator
    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::And => Some(BinaryOp::And),
            TokenKind::Or => Some(BinaryOp::Or),
            TokenKind::Equal => Some(BinaryOp::Equal),
            TokenKind::NotEqual => Some(BinaryOp::NotEqual),
            TokenKind::Less => Some(BinaryOp::Less),
            TokenKind::Greater => Some(BinaryOp::Greater),
            TokenKind::LessEqual => Some(BinaryOp::LessEqual),
            TokenKind::GreaterEqual => Some(BinaryOp::GreaterEqual),
            TokenKind::Like => Some(BinaryOp::Like),
            TokenKind::Plus => Some(BinaryOp::Plus),
            TokenKind::Minus => Some(BinaryOp::Minus),
            TokenKind::Star => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            _ => None,
        }
    }
}

impl<'a> Expr<'a> {
    /// Build the node for `left op right`.
    pub fn binary(left: Expr<'a>, op: BinaryOp, right: Expr<'a>) -> Self {
        let left = Box::new(left);
        let right = Box::new(right);
        match op {
            BinaryOp::And => Expr::And { left, right },
            BinaryOp::Or => Expr::Or { left, right },
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide => {
                Expr::Arithmetic { left, op, right }
            }
            _ => Expr::Comparison { left, op, right },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Expr::Column(_) => NodeKind::ColumnRef,
            Expr::Literal(_) => NodeKind::Literal,
            Expr::Function(_) => NodeKind::FuncCall,
            Expr::And { .. } => NodeKind::AndExpr,
            Expr::Or { .. } => NodeKind::OrExpr,
            Expr::Not(_) => NodeKind::NotExpr,
            Expr::Comparison { .. } => NodeKind::ComparisonExpr,
            Expr::Arithmetic { .. } => NodeKind::ArithmeticExpr,
            Expr::Nested(_) => NodeKind::NestedExpr,
            Expr::IsNull { .. } => NodeKind::IsNullExpr,
            Expr::Between { .. } => NodeKind::BetweenExpr,
            Expr::InList { .. } | Expr::InSubquery { .. } => NodeKind::InExpr,
            Expr::Case { .. } => NodeKind::CaseExpr,
            Expr::Subquery(_) => NodeKind::Subquery,
        }
    }
}

const NOT_PRECEDENCE: u8 = 25;
const PREDICATE_PRECEDENCE: u8 = 30;
/// BETWEEN bounds bind tighter than AND so `x BETWEEN 1 AND 2` stays whole.
const BETWEEN_BOUND_PRECEDENCE: u8 = 50;

/// Get operator precedence
fn get_precedence(token: TokenKind) -> Option<(u8, bool)> {
    // Return (precedence, is_left_associative)
    match token {
        TokenKind::Or => Some((10, true)),
        TokenKind::And => Some((20, true)),
        TokenKind::Equal | TokenKind::NotEqual | TokenKind::Like => Some((30, true)),
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
            Some((40, true))
        }
        TokenKind::Plus | TokenKind::Minus => Some((50, true)),
        TokenKind::Star | TokenKind::Slash => Some((60, true)),
        _ => None,
    }
}

impl<'t, 'a> Parser<'t, 'a> {
    /// Parse an expression using precedence climbing
    pub fn parse_expr(&mut self) -> ParseResult<Expr<'a>> {
        self.parse_expr_with_precedence(0)
    }

    /// Parse expression with minimum precedence
    #[recursive::recursive]
    fn parse_expr_with_precedence(&mut self, min_prec: u8) -> ParseResult<Expr<'a>> {
        let mut left = if self.try_consume(TokenKind::Not) {
            let operand = self.parse_expr_with_precedence(NOT_PRECEDENCE)?;
            Expr::Not(Box::new(operand))
        } else {
            self.parse_primary()?
        };

        loop {
            let kind = self.current_kind();

            if matches!(kind, TokenKind::Is | TokenKind::In | TokenKind::Between)
                || (kind == TokenKind::Not
                    && matches!(
                        self.peek_kind(1),
                        TokenKind::In | TokenKind::Between | TokenKind::Like
                    ))
            {
                if PREDICATE_PRECEDENCE < min_prec {
                    break;
                }
                left = self.parse_predicate(left)?;
                continue;
            }

            let Some((prec, is_left)) = get_precedence(kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }

            self.advance();
            let next_min_prec = if is_left { prec + 1 } else { prec };
            let right = self.parse_expr_with_precedence(next_min_prec)?;

            if let Some(op) = BinaryOp::from_token(kind) {
                left = Expr::binary(left, op, right);
            }
        }

        Ok(left)
    }

    /// Parse the postfix predicates: IS [NOT] NULL, [NOT] IN, [NOT] BETWEEN, NOT LIKE
    fn parse_predicate(&mut self, left: Expr<'a>) -> ParseResult<Expr<'a>> {
        if self.try_consume(TokenKind::Is) {
            let negated = self.try_consume(TokenKind::Not);
            self.expect(TokenKind::Null)?;
            return Ok(Expr::IsNull {
                expr: Box::new(left),
                negated,
            });
        }

        let negated = self.try_consume(TokenKind::Not);

        if self.try_consume(TokenKind::Like) {
            let right = self.parse_expr_with_precedence(PREDICATE_PRECEDENCE + 1)?;
            let op = if negated {
                BinaryOp::NotLike
            } else {
                BinaryOp::Like
            };
            return Ok(Expr::binary(left, op, right));
        }

        if self.try_consume(TokenKind::Between) {
            let low = self.parse_expr_with_precedence(BETWEEN_BOUND_PRECEDENCE)?;
            self.expect(TokenKind::And)?;
            let high = self.parse_expr_with_precedence(BETWEEN_BOUND_PRECEDENCE)?;
            return Ok(Expr::Between {
                expr: Box::new(left),
                negated,
                low: Box::new(low),
                high: Box::new(high),
            });
        }

        self.expect(TokenKind::In)?;
        self.expect(TokenKind::LeftParen)?;
        let expr = if self.at_query_start() {
            let query = self.parse_query()?;
            Expr::InSubquery {
                expr: Box::new(left),
                negated,
                query: Box::new(query),
            }
        } else {
            let list = self.parse_expr_list()?;
            Expr::InList {
                expr: Box::new(left),
                negated,
                list,
            }
        };
        self.expect(TokenKind::RightParen)?;
        Ok(expr)
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> ParseResult<Expr<'a>> {
        let Some(token) = self.current() else {
            return Err(self.error_at_current("Unexpected end of input"));
        };

        match token.kind {
            TokenKind::Number => {
                self.advance();
                let n = token
                    .text
                    .parse::<i64>()
                    .map_err(|_| self.error_at_current("Invalid number"))?;
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::Float => {
                self.advance();
                let f = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| self.error_at_current("Invalid float"))?;
                Ok(Expr::Literal(Literal::Float(f)))
            }
            TokenKind::String => {
                self.advance();
                // Remove quotes
                let s = &token.text[1..token.text.len() - 1];
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                let name = self.parse_identifier()?;
                if self.current_kind() == TokenKind::LeftParen {
                    return self.parse_function_call(name);
                }
                if self.try_consume(TokenKind::Dot) {
                    let column = self.parse_identifier()?;
                    return Ok(Expr::Column(ColumnRef {
                        qualifier: Some(name),
                        name: column,
                    }));
                }
                Ok(Expr::Column(ColumnRef {
                    qualifier: None,
                    name,
                }))
            }
            TokenKind::LeftParen => {
                self.advance();
                if self.at_query_start() {
                    let query = self.parse_query()?;
                    self.expect(TokenKind::RightParen)?;
                    return Ok(Expr::Subquery(Box::new(query)));
                }
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                Ok(Expr::Nested(Box::new(expr)))
            }
            TokenKind::Case => self.parse_case(),
            _ => self.fail("expression"),
        }
    }

    /// Parse `name(...)`; the arguments are projection items so `*` is allowed
    fn parse_function_call(&mut self, name: &'a str) -> ParseResult<Expr<'a>> {
        self.expect(TokenKind::LeftParen)?;
        let distinct = self.try_consume(TokenKind::Distinct);

        let mut args = Vec::new();
        if self.current_kind() != TokenKind::RightParen {
            args.push(self.parse_select_item(false)?);
            while self.try_consume(TokenKind::Comma) {
                args.push(self.parse_select_item(false)?);
            }
        }
        self.expect(TokenKind::RightParen)?;

        Ok(Expr::Function(FuncCall {
            name,
            distinct,
            args,
        }))
    }

    /// Parse `CASE [operand] WHEN .. THEN .. [ELSE ..] END`
    fn parse_case(&mut self) -> ParseResult<Expr<'a>> {
        self.expect(TokenKind::Case)?;

        let operand = if self.current_kind() == TokenKind::When {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        let mut branches = Vec::new();
        loop {
            self.expect(TokenKind::When)?;
            let condition = self.parse_expr()?;
            self.expect(TokenKind::Then)?;
            let result = self.parse_expr()?;
            branches.push((condition, result));
            if self.current_kind() != TokenKind::When {
                break;
            }
        }

        let else_result = if self.try_consume(TokenKind::Else) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect(TokenKind::End)?;

        Ok(Expr::Case {
            operand,
            branches,
            else_result,
        })
    }
}

impl<'a> std::fmt::Display for Expr<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Column(col) => write!(f, "{}", col),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Function(func) => write!(f, "{}", func),
            Expr::And { left, right } => write!(f, "({} AND {})", left, right),
            Expr::Or { left, right } => write!(f, "({} OR {})", left, right),
            Expr::Not(expr) => write!(f, "NOT {}", expr),
            Expr::Comparison { left, op, right } | Expr::Arithmetic { left, op, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            Expr::Nested(expr) => write!(f, "({})", expr),
            Expr::IsNull { expr, negated } => {
                let not = if *negated { " NOT" } else { "" };
                write!(f, "{} IS{} NULL", expr, not)
            }
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let not = if *negated { " NOT" } else { "" };
                write!(f, "{}{} BETWEEN {} AND {}", expr, not, low, high)
            }
            Expr::InList {
                expr,
                negated,
                list,
            } => {
                let not = if *negated { " NOT" } else { "" };
                write!(f, "{}{} IN (", expr, not)?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expr::InSubquery {
                expr,
                negated,
                query,
            } => {
                let not = if *negated { " NOT" } else { "" };
                write!(f, "{}{} IN ({})", expr, not, query)
            }
            Expr::Case {
                operand,
                branches,
                else_result,
            } => {
                write!(f, "CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {}", operand)?;
                }
                for (condition, result) in branches {
                    write!(f, " WHEN {} THEN {}", condition, result)?;
                }
                if let Some(else_result) = else_result {
                    write!(f, " ELSE {}", else_result)?;
                }
                write!(f, " END")
            }
            Expr::Subquery(query) => write!(f, "({})", query),
        }
    }
}

impl<'a> std::fmt::Display for ColumnRef<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(qualifier) = self.qualifier {
            write!(f, "{}.", qualifier)?;
        }
        write!(f, "{}", self.name)
    }
}

impl<'a> std::fmt::Display for FuncCall<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

impl<'a> std::fmt::Display for Literal<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Float(fl) => write!(f, "{}", fl),
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Boolean(true) => write!(f, "TRUE"),
            Literal::Boolean(false) => write!(f, "FALSE"),
            Literal::Null => write!(f, "NULL"),
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Like => "LIKE",
            BinaryOp::NotLike => "NOT LIKE",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        };
        write!(f, "{}", s)
    }
}
