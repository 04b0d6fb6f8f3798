//! Table discovery over the FROM clause, including nested joins.

use crate::ast::{AliasedTableExpr, Query, SelectStmt, Statement, TableExpr, TableFactor};
use crate::error::AnalyzeError;
use crate::names::NameList;
use crate::node::NodeKind;
use log::trace;

type VisitResult = Result<(), AnalyzeError>;

/// Accumulates table names while walking one statement.
#[derive(Debug, Default)]
pub struct TableCollector {
    tables: NameList,
}

impl TableCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> NameList {
        self.tables
    }

    pub fn visit_statement(&mut self, stmt: &Statement<'_>, depth: usize) -> VisitResult {
        match stmt {
            Statement::Query(query) => self.visit_query(query, depth),
            Statement::Insert(_) => Err(AnalyzeError::unsupported(NodeKind::Insert, depth)),
            Statement::Update(_) => Err(AnalyzeError::unsupported(NodeKind::Update, depth)),
            Statement::Delete(_) => Err(AnalyzeError::unsupported(NodeKind::Delete, depth)),
        }
    }

    pub fn visit_query(&mut self, query: &Query<'_>, depth: usize) -> VisitResult {
        match query {
            Query::Select(select) => self.visit_select(select, depth),
            Query::With { .. } | Query::Union { .. } => {
                Err(AnalyzeError::unsupported(query.kind(), depth))
            }
        }
    }

    pub fn visit_select(&mut self, select: &SelectStmt<'_>, depth: usize) -> VisitResult {
        trace!("tables: Select at depth {}", depth);

        for table in &select.from {
            self.visit_table_expr(table, depth + 1)?;
        }
        Ok(())
    }

    #[recursive::recursive]
    fn visit_table_expr(&mut self, table: &TableExpr<'_>, depth: usize) -> VisitResult {
        match table {
            TableExpr::Aliased(aliased) => self.visit_aliased(aliased, depth),
            // The join condition holds columns, not tables
            TableExpr::Join(join) => {
                self.visit_table_expr(&join.left, depth + 1)?;
                self.visit_table_expr(&join.right, depth + 1)
            }
        }
    }

    fn visit_aliased(&mut self, aliased: &AliasedTableExpr<'_>, depth: usize) -> VisitResult {
        match &aliased.factor {
            TableFactor::Table(table) => {
                if !table.name.is_empty() {
                    self.tables.insert(table.name);
                }
                Ok(())
            }
            TableFactor::Derived(_) => {
                Err(AnalyzeError::unsupported(NodeKind::DerivedTable, depth + 1))
            }
        }
    }
}

/// Every table named in the FROM clause of `stmt`, in first-seen order.
pub fn collect_tables(stmt: &Statement<'_>) -> Result<NameList, AnalyzeError> {
    let mut collector = TableCollector::new();
    collector.visit_statement(stmt, 0)?;
    Ok(collector.finish())
}
