//! Node kinds of the statement tree, as reported in diagnostics.
//!
//! The tree itself is a set of closed enums (`Statement`, `Query`, `Expr`,
//! `TableExpr`, ...). `NodeKind` names each shape the collectors can meet so
//! that a coverage failure can say exactly what it refused to walk.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Shapes the collectors walk
    Select,
    AliasedExpr,
    FuncCall,
    OrderClause,
    WhereClause,
    ColumnRef,
    StarExpr,
    AndExpr,
    OrExpr,
    NotExpr,
    ComparisonExpr,
    NestedExpr,
    TableExprList,
    AliasedTableExpr,
    JoinExpr,
    JoinCondition,
    TableNameRef,

    // Shapes the collectors refuse
    Literal,
    ArithmeticExpr,
    IsNullExpr,
    BetweenExpr,
    InExpr,
    CaseExpr,
    Subquery,
    DerivedTable,
    Union,
    With,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
