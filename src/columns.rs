//! Column discovery.
//!
//! Walks the projection, FROM (join conditions only), ORDER BY, WHERE,
//! HAVING and GROUP BY of a `SELECT` and records every column reference in
//! first-seen order. A `*` projection is recorded as the name `"*"`.
//!
//! The walk is defined over a closed set of node shapes. Anything else is
//! refused with [`AnalyzeError::Unsupported`] rather than skipped, since a
//! skipped branch would make the result look complete when it is not.

use crate::ast::{
    Filter, JoinCondition, OrderByExpr, Query, SelectItem, SelectStmt, Statement, TableExpr,
};
use crate::error::AnalyzeError;
use crate::expr::Expr;
use crate::names::NameList;
use crate::node::NodeKind;
use log::trace;

type VisitResult = Result<(), AnalyzeError>;

/// Accumulates column names while walking one statement.
#[derive(Debug, Default)]
pub struct ColumnCollector {
    columns: NameList,
}

impl ColumnCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> NameList {
        self.columns
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
        trace!("columns: Select at depth {}", depth);

        for item in &select.projection {
            self.visit_select_item(item, depth + 1)?;
        }

        self.visit_table_exprs(&select.from, depth + 1)?;

        for order in &select.order_by {
            self.visit_order_by(order, depth + 1)?;
        }

        if let Some(where_clause) = &select.where_clause {
            self.visit_filter(where_clause, depth + 1)?;
        }

        if let Some(having) = &select.having {
            self.visit_filter(having, depth + 1)?;
        }

        for group in &select.group_by {
            self.visit_expr(group, depth + 1)?;
        }

        Ok(())
    }

    fn visit_select_item(&mut self, item: &SelectItem<'_>, depth: usize) -> VisitResult {
        match item {
            // The alias names an output, not a source column
            SelectItem::Expr { expr, .. } => self.visit_expr(expr, depth + 1),
            SelectItem::Wildcard { .. } => {
                self.columns.insert("*");
                Ok(())
            }
        }
    }

    fn visit_order_by(&mut self, order: &OrderByExpr<'_>, depth: usize) -> VisitResult {
        self.visit_expr(&order.expr, depth + 1)
    }

    fn visit_filter(&mut self, filter: &Filter<'_>, depth: usize) -> VisitResult {
        self.visit_expr(&filter.expr, depth + 1)
    }

    #[recursive::recursive]
    fn visit_expr(&mut self, expr: &Expr<'_>, depth: usize) -> VisitResult {
        match expr {
            Expr::Column(column) => {
                if !column.name.is_empty() {
                    self.columns.insert(column.name);
                }
                Ok(())
            }
            Expr::Function(func) => {
                for arg in &func.args {
                    self.visit_select_item(arg, depth + 1)?;
                }
                Ok(())
            }
            Expr::And { left, right } | Expr::Or { left, right } => {
                self.visit_expr(left, depth + 1)?;
                self.visit_expr(right, depth + 1)
            }
            Expr::Not(inner) | Expr::Nested(inner) => self.visit_expr(inner, depth + 1),
            // Only the left operand: the right side is usually a literal
            Expr::Comparison { left, .. } => self.visit_expr(left, depth + 1),
            Expr::Literal(_)
            | Expr::Arithmetic { .. }
            | Expr::IsNull { .. }
            | Expr::Between { .. }
            | Expr::InList { .. }
            | Expr::InSubquery { .. }
            | Expr::Case { .. }
            | Expr::Subquery(_) => Err(AnalyzeError::unsupported(expr.kind(), depth)),
        }
    }

    fn visit_table_exprs(&mut self, tables: &[TableExpr<'_>], depth: usize) -> VisitResult {
        for table in tables {
            self.visit_table_expr(table, depth + 1)?;
        }
        Ok(())
    }

    /// Columns of a FROM member come from join conditions only. A join
    /// also walks its operands, left before right, so the conditions of
    /// joins nested inside it are collected as well; a plain table operand
    /// adds nothing.
    #[recursive::recursive]
    fn visit_table_expr(&mut self, table: &TableExpr<'_>, depth: usize) -> VisitResult {
        match table {
            // A table alias carries no column reference
            TableExpr::Aliased(_) => Ok(()),
            TableExpr::Join(join) => {
                self.visit_table_expr(&join.left, depth + 1)?;
                self.visit_table_expr(&join.right, depth + 1)?;
                self.visit_join_condition(&join.condition, depth + 1)
            }
        }
    }

    fn visit_join_condition(&mut self, condition: &JoinCondition<'_>, depth: usize) -> VisitResult {
        if let Some(on) = &condition.on {
            self.visit_expr(on, depth + 1)?;
        }
        for column in &condition.using {
            if !column.is_empty() {
                self.columns.insert(column);
            }
        }
        Ok(())
    }
}

/// Every column referenced by `stmt`, in first-seen order.
pub fn collect_columns(stmt: &Statement<'_>) -> Result<NameList, AnalyzeError> {
    let mut collector = ColumnCollector::new();
    collector.visit_statement(stmt, 0)?;
    Ok(collector.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;

    fn columns(sql: &str) -> Result<Vec<String>, AnalyzeError> {
        let stmt = parse_statement(sql).unwrap();
        collect_columns(&stmt).map(NameList::into_vec)
    }

    #[test]
    fn star_projection_is_recorded_once() {
        assert_eq!(columns("SELECT * FROM t").unwrap(), vec!["*"]);
        assert_eq!(columns("SELECT *, t.* FROM t").unwrap(), vec!["*"]);
    }

    #[test]
    fn traversal_order_is_projection_from_order_where_having_group() {
        let cols = columns(
            "SELECT a FROM t1 JOIN t2 ON b = 1 WHERE d = 1 \
             GROUP BY f HAVING e = 1 ORDER BY c",
        )
        .unwrap();
        assert_eq!(cols, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn comparison_right_hand_side_is_not_inspected() {
        assert_eq!(columns("SELECT x FROM t WHERE x = y").unwrap(), vec!["x"]);
        assert_eq!(
            columns("SELECT a FROM t WHERE b > 1 + 2").unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn function_arguments_are_visited_in_order() {
        assert_eq!(
            columns("SELECT COUNT(deji, users, stadium) FROM users").unwrap(),
            vec!["deji", "users", "stadium"]
        );
        assert_eq!(columns("SELECT COUNT(*) FROM t").unwrap(), vec!["*"]);
    }

    #[test]
    fn qualifier_is_dropped() {
        assert_eq!(
            columns("SELECT a.x FROM a INNER JOIN b ON a.id = b.id").unwrap(),
            vec!["x", "id"]
        );
    }

    #[test]
    fn nested_join_conditions_are_collected_left_first() {
        assert_eq!(
            columns("SELECT * FROM a JOIN b ON a.x = b.x JOIN c ON b.y = c.y").unwrap(),
            vec!["*", "x", "y"]
        );
    }

    #[test]
    fn using_columns_are_recorded() {
        assert_eq!(
            columns("SELECT a FROM t JOIN u USING (id, region) CROSS JOIN v").unwrap(),
            vec!["a", "id", "region"]
        );
    }

    #[test]
    fn parentheses_are_transparent() {
        assert_eq!(
            columns("SELECT a FROM t WHERE (b = 1 OR c = 2) AND NOT (d = 3)").unwrap(),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn empty_quoted_name_is_skipped() {
        assert_eq!(columns("SELECT ``, a FROM t").unwrap(), vec!["a"]);
    }

    #[test]
    fn derived_table_is_ignored_for_columns() {
        assert_eq!(
            columns("SELECT a FROM (SELECT b FROM t) AS s").unwrap(),
            vec!["a"]
        );
    }

    #[test]
    fn unsupported_expression_reports_kind_and_depth() {
        match columns("SELECT 1 FROM t") {
            Err(AnalyzeError::Unsupported { kind, depth }) => {
                assert_eq!(kind, NodeKind::Literal);
                // Select 0 -> AliasedExpr 1 -> expression 2
                assert_eq!(depth, 2);
            }
            other => panic!("expected a coverage failure, got {:?}", other),
        }

        for (sql, expected) in [
            ("SELECT a + b FROM t", NodeKind::ArithmeticExpr),
            ("SELECT a FROM t WHERE b IS NULL", NodeKind::IsNullExpr),
            ("SELECT a FROM t WHERE b BETWEEN 1 AND 2", NodeKind::BetweenExpr),
            ("SELECT a FROM t WHERE b IN (1, 2)", NodeKind::InExpr),
            ("SELECT CASE WHEN a = 1 THEN b END FROM t", NodeKind::CaseExpr),
            ("SELECT (SELECT 1) FROM t", NodeKind::Subquery),
        ] {
            match columns(sql) {
                Err(AnalyzeError::Unsupported { kind, .. }) => {
                    assert_eq!(kind, expected, "{}", sql)
                }
                other => panic!("{}: expected a coverage failure, got {:?}", sql, other),
            }
        }
    }

    #[test]
    fn non_select_statements_are_refused() {
        assert!(matches!(
            columns("SELECT a FROM t UNION SELECT b FROM u"),
            Err(AnalyzeError::Unsupported {
                kind: NodeKind::Union,
                depth: 0
            })
        ));
        assert!(matches!(
            columns("DELETE FROM t"),
            Err(AnalyzeError::Unsupported {
                kind: NodeKind::Delete,
                ..
            })
        ));
    }
}
