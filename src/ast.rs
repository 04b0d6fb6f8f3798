// Statement-level tree produced by the parser.
// Names borrow from the query text; the collectors only ever read this tree.

use crate::expr::Expr;
use crate::node::NodeKind;
use std::fmt;

/// SQL Statement types
#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'a> {
    Query(Query<'a>),
    Insert(Insert<'a>),
    Update(Update<'a>),
    Delete(Delete<'a>),
}

/// Query types
#[derive(Debug, Clone, PartialEq)]
pub enum Query<'a> {
    Select(Box<SelectStmt<'a>>),
    With {
        with: With<'a>,
        query: Box<Query<'a>>,
    },
    Union {
        left: Box<Query<'a>>,
        all: bool,
        right: Box<Query<'a>>,
    },
}

impl Query<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Query::Select(_) => NodeKind::Select,
            Query::With { .. } => NodeKind::With,
            Query::Union { .. } => NodeKind::Union,
        }
    }
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStmt<'a> {
    pub distinct: bool,
    pub projection: Vec<SelectItem<'a>>,
    /// Comma-separated FROM members; empty when there is no FROM clause.
    pub from: Vec<TableExpr<'a>>,
    pub where_clause: Option<Filter<'a>>,
    pub group_by: Vec<Expr<'a>>,
    pub having: Option<Filter<'a>>,
    pub order_by: Vec<OrderByExpr<'a>>,
    pub limit: Option<Limit>,
}

/// One projection item. Function arguments use the same shape, so
/// `COUNT(*)` carries a wildcard argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem<'a> {
    /// An expression with an optional alias
    Expr {
        expr: Expr<'a>,
        alias: Option<&'a str>,
    },
    /// `*` or `t.*`
    Wildcard { qualifier: Option<&'a str> },
}

impl SelectItem<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            SelectItem::Expr { .. } => NodeKind::AliasedExpr,
            SelectItem::Wildcard { .. } => NodeKind::StarExpr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Where,
    Having,
}

/// A boolean filter. WHERE and HAVING share this node.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<'a> {
    pub kind: FilterKind,
    pub expr: Expr<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr<'a> {
    pub expr: Expr<'a>,
    pub direction: Option<SortDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub count: i64,
    pub offset: Option<i64>,
}

/// A member of the FROM list
#[derive(Debug, Clone, PartialEq)]
pub enum TableExpr<'a> {
    Aliased(AliasedTableExpr<'a>),
    Join(Box<JoinExpr<'a>>),
}

impl TableExpr<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            TableExpr::Aliased(_) => NodeKind::AliasedTableExpr,
            TableExpr::Join(_) => NodeKind::JoinExpr,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasedTableExpr<'a> {
    pub factor: TableFactor<'a>,
    pub alias: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableFactor<'a> {
    Table(TableName<'a>),
    /// `(SELECT ...) AS alias`
    Derived(Box<Query<'a>>),
}

/// Table reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableName<'a> {
    pub qualifier: Option<&'a str>,
    pub name: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOperator {
    Inner,
    Cross,
    Left,
    Right,
    Full,
}

/// `left <op> JOIN right <condition>`; chains nest on the left.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpr<'a> {
    pub left: TableExpr<'a>,
    pub operator: JoinOperator,
    pub right: TableExpr<'a>,
    pub condition: JoinCondition<'a>,
}

/// `ON expr` and/or `USING (cols)`; both empty for CROSS JOIN.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinCondition<'a> {
    pub on: Option<Expr<'a>>,
    pub using: Vec<&'a str>,
}

/// WITH clause containing CTEs
#[derive(Debug, Clone, PartialEq)]
pub struct With<'a> {
    pub recursive: bool,
    pub ctes: Vec<CTE<'a>>,
}

/// Common Table Expression (CTE)
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub struct CTE<'a> {
    pub name: &'a str,
    pub columns: Option<Vec<&'a str>>,
    pub query: Box<Query<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert<'a> {
    pub table: TableName<'a>,
    pub columns: Vec<&'a str>,
    pub source: InsertSource<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource<'a> {
    Values(Vec<Vec<Expr<'a>>>),
    Query(Box<Query<'a>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update<'a> {
    pub table: TableName<'a>,
    pub assignments: Vec<Assignment<'a>>,
    pub where_clause: Option<Filter<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<'a> {
    pub column: &'a str,
    pub value: Expr<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete<'a> {
    pub table: TableName<'a>,
    pub where_clause: Option<Filter<'a>>,
}

// Display implementations for pretty printing

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl<'a> fmt::Display for Statement<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Query(q) => write!(f, "{}", q),
            Statement::Insert(i) => write!(f, "{}", i),
            Statement::Update(u) => write!(f, "{}", u),
            Statement::Delete(d) => write!(f, "{}", d),
        }
    }
}

impl<'a> fmt::Display for Query<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Select(s) => write!(f, "{}", s),
            Query::With { with, query } => {
                write!(f, "{} {}", with, query)
            }
            Query::Union { left, all, right } => {
                if *all {
                    write!(f, "{} UNION ALL {}", left, right)
                } else {
                    write!(f, "{} UNION {}", left, right)
                }
            }
        }
    }
}

impl<'a> fmt::Display for SelectStmt<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        write_list(f, &self.projection)?;

        if !self.from.is_empty() {
            write!(f, " FROM ")?;
            write_list(f, &self.from)?;
        }

        if let Some(where_clause) = &self.where_clause {
            write!(f, " {}", where_clause)?;
        }

        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }

        if let Some(having) = &self.having {
            write!(f, " {}", having)?;
        }

        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }

        if let Some(limit) = &self.limit {
            write!(f, " {}", limit)?;
        }

        Ok(())
    }
}

impl<'a> fmt::Display for SelectItem<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Expr { expr, alias } => {
                write!(f, "{}", expr)?;
                if let Some(alias) = alias {
                    write!(f, " AS {}", alias)?;
                }
                Ok(())
            }
            SelectItem::Wildcard { qualifier: None } => write!(f, "*"),
            SelectItem::Wildcard {
                qualifier: Some(q),
            } => write!(f, "{}.*", q),
        }
    }
}

impl<'a> fmt::Display for Filter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FilterKind::Where => write!(f, "WHERE {}", self.expr),
            FilterKind::Having => write!(f, "HAVING {}", self.expr),
        }
    }
}

impl<'a> fmt::Display for OrderByExpr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match self.direction {
            Some(SortDirection::Asc) => write!(f, " ASC"),
            Some(SortDirection::Desc) => write!(f, " DESC"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LIMIT {}", self.count)?;
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for TableExpr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableExpr::Aliased(aliased) => write!(f, "{}", aliased),
            TableExpr::Join(join) => write!(f, "{}", join),
        }
    }
}

impl<'a> fmt::Display for AliasedTableExpr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.factor {
            TableFactor::Table(name) => write!(f, "{}", name)?,
            TableFactor::Derived(query) => write!(f, "({})", query)?,
        }
        if let Some(alias) = self.alias {
            write!(f, " AS {}", alias)?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for TableName<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = self.qualifier {
            write!(f, "{}.", qualifier)?;
        }
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for JoinOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinOperator::Inner => "INNER JOIN",
            JoinOperator::Cross => "CROSS JOIN",
            JoinOperator::Left => "LEFT JOIN",
            JoinOperator::Right => "RIGHT JOIN",
            JoinOperator::Full => "FULL JOIN",
        };
        write!(f, "{}", s)
    }
}

impl<'a> fmt::Display for JoinExpr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)?;
        if let Some(on) = &self.condition.on {
            write!(f, " ON {}", on)?;
        }
        if !self.condition.using.is_empty() {
            write!(f, " USING (")?;
            write_list(f, &self.condition.using)?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for With<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WITH ")?;
        if self.recursive {
            write!(f, "RECURSIVE ")?;
        }
        write_list(f, &self.ctes)
    }
}

impl<'a> fmt::Display for CTE<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;

        if let Some(columns) = &self.columns {
            write!(f, "(")?;
            write_list(f, columns)?;
            write!(f, ")")?;
        }

        write!(f, " AS ({})", self.query)
    }
}

impl<'a> fmt::Display for Insert<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO {}", self.table)?;
        if !self.columns.is_empty() {
            write!(f, " (")?;
            write_list(f, &self.columns)?;
            write!(f, ")")?;
        }
        match &self.source {
            InsertSource::Values(rows) => {
                write!(f, " VALUES ")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "(")?;
                    write_list(f, row)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            InsertSource::Query(query) => write!(f, " {}", query),
        }
    }
}

impl<'a> fmt::Display for Update<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE {} SET ", self.table)?;
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", assignment.column, assignment.value)?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " {}", where_clause)?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for Delete<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM {}", self.table)?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " {}", where_clause)?;
        }
        Ok(())
    }
}
