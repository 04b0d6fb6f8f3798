// Library exports for the SQL reference extractor
// Parses a query and reports which tables and columns it touches.

pub mod analyzer;
pub mod ast;
pub mod columns;
pub mod error;
pub mod expr;
pub mod names;
pub mod node;
pub mod parser;
pub mod tables;
pub mod token;

// Re-export commonly used types
pub use analyzer::{analyze, analyze_statement, parse_query, QueryAnalysis};
pub use ast::{Query, SelectStmt, Statement, TableExpr};
pub use columns::{collect_columns, ColumnCollector};
pub use error::{AnalyzeError, ParseError};
pub use expr::Expr;
pub use names::NameList;
pub use node::NodeKind;
pub use parser::{parse_sql, parse_sql_to_string, parse_statement};
pub use tables::{collect_tables, TableCollector};
pub use token::{Token, TokenKind};
