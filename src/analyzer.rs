//! Entry point: query text in, referenced tables and columns out.

use crate::ast::Statement;
use crate::columns::collect_columns;
use crate::error::AnalyzeError;
use crate::names::NameList;
use crate::parser::parse_statement;
use crate::tables::collect_tables;
use log::{debug, warn};
use serde::Serialize;

/// Tables and columns a query touches, each in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryAnalysis {
    pub tables: NameList,
    pub columns: NameList,
}

impl QueryAnalysis {
    /// `(tables, columns)`
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.tables.into_vec(), self.columns.into_vec())
    }
}

/// Parse `sql` and collect what it references.
///
/// A parse failure returns before any traversal. A construct the
/// collectors do not cover fails the whole call; there is no partial result.
pub fn analyze(sql: &str) -> Result<QueryAnalysis, AnalyzeError> {
    let stmt = parse_statement(sql).map_err(|err| {
        debug!("parse failed: {}", err.message);
        AnalyzeError::Parse(err)
    })?;
    debug!("parsed statement: {}", stmt);

    analyze_statement(&stmt)
}

/// Collect tables and columns from an already parsed statement.
pub fn analyze_statement(stmt: &Statement<'_>) -> Result<QueryAnalysis, AnalyzeError> {
    let result = collect_columns(stmt)
        .and_then(|columns| collect_tables(stmt).map(|tables| QueryAnalysis { tables, columns }));

    match &result {
        Ok(analysis) => debug!(
            "tables: {} columns: {}",
            analysis.tables, analysis.columns
        ),
        Err(err) => warn!("analysis refused: {}", err),
    }

    result
}

/// `(tables, columns)` for `sql`.
pub fn parse_query(sql: &str) -> Result<(Vec<String>, Vec<String>), AnalyzeError> {
    analyze(sql).map(QueryAnalysis::into_parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn star_projection() {
        let analysis = analyze("SELECT * FROM t").unwrap();
        assert_eq!(analysis.tables.to_vec(), vec!["t"]);
        assert_eq!(analysis.columns.to_vec(), vec!["*"]);
    }

    #[test]
    fn parse_failure_has_no_partial_result() {
        let err = analyze("SELECT * FORM users").unwrap_err();
        match err {
            AnalyzeError::Parse(parse) => {
                assert_eq!(parse.suggestion.as_deref(), Some("FROM"));
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn coverage_failure_in_from_fails_the_call() {
        let err = analyze("SELECT a FROM (SELECT b FROM t) AS s").unwrap_err();
        assert!(matches!(
            err,
            AnalyzeError::Unsupported {
                kind: NodeKind::DerivedTable,
                ..
            }
        ));
    }

    #[test]
    fn parse_query_returns_tables_then_columns() {
        let (tables, columns) =
            parse_query("SELECT COUNT(x), SUM(y) FROM t JOIN u ON t.k = u.k").unwrap();
        assert_eq!(tables, vec!["t", "u"]);
        assert_eq!(columns, vec!["x", "y", "k"]);
    }

    #[test]
    fn analysis_serializes_to_json() {
        let analysis = analyze("SELECT a FROM t").unwrap();
        assert_eq!(
            serde_json::to_string(&analysis).unwrap(),
            r#"{"tables":["t"],"columns":["a"]}"#
        );
    }
}
