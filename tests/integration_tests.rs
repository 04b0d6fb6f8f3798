// Parser boundary: query text in, the tree the collectors walk out
use sql_ref_extractor::ast::{
    AliasedTableExpr, FilterKind, InsertSource, JoinOperator, Query, SelectItem, SelectStmt,
    Statement, TableExpr, TableFactor, TableName,
};
use sql_ref_extractor::expr::{BinaryOp, ColumnRef, Expr, FuncCall, Literal};
use sql_ref_extractor::parser::{parse_sql, parse_statement};

fn plain_select(sql: &str) -> SelectStmt<'_> {
    match parse_statement(sql) {
        Ok(Statement::Query(Query::Select(select))) => *select,
        other => panic!("{}: expected a plain select, got {:?}", sql, other),
    }
}

fn column<'a>(qualifier: Option<&'a str>, name: &'a str) -> Expr<'a> {
    Expr::Column(ColumnRef { qualifier, name })
}

fn table<'a>(qualifier: Option<&'a str>, name: &'a str, alias: Option<&'a str>) -> TableExpr<'a> {
    TableExpr::Aliased(AliasedTableExpr {
        factor: TableFactor::Table(TableName { qualifier, name }),
        alias,
    })
}

fn where_text(sql: &str) -> String {
    let filter = plain_select(sql).where_clause.expect("WHERE clause");
    assert_eq!(filter.kind, FilterKind::Where);
    filter.expr.to_string()
}

/// Join operators along the left spine, innermost first
fn join_chain<'t, 'a>(mut table: &'t TableExpr<'a>) -> (Vec<JoinOperator>, &'t TableExpr<'a>) {
    let mut operators = Vec::new();
    while let TableExpr::Join(join) = table {
        operators.push(join.operator);
        table = &join.left;
    }
    operators.reverse();
    (operators, table)
}

#[test]
fn test_projection_items() {
    let select = plain_select("SELECT a, t.b AS bee, t.*, COUNT(*), SUM(DISTINCT c) total FROM t");

    assert_eq!(
        select.projection,
        vec![
            SelectItem::Expr {
                expr: column(None, "a"),
                alias: None,
            },
            SelectItem::Expr {
                expr: column(Some("t"), "b"),
                alias: Some("bee"),
            },
            SelectItem::Wildcard {
                qualifier: Some("t"),
            },
            SelectItem::Expr {
                expr: Expr::Function(FuncCall {
                    name: "COUNT",
                    distinct: false,
                    args: vec![SelectItem::Wildcard { qualifier: None }],
                }),
                alias: None,
            },
            SelectItem::Expr {
                expr: Expr::Function(FuncCall {
                    name: "SUM",
                    distinct: true,
                    args: vec![SelectItem::Expr {
                        expr: column(None, "c"),
                        alias: None,
                    }],
                }),
                alias: Some("total"),
            },
        ]
    );
}

#[test]
fn test_table_names_keep_qualifier_and_alias() {
    let select = plain_select("SELECT * FROM shop.orders o, users AS u, events");

    assert_eq!(
        select.from,
        vec![
            table(Some("shop"), "orders", Some("o")),
            table(None, "users", Some("u")),
            table(None, "events", None),
        ]
    );
}

#[test]
fn test_join_chain_nests_on_the_left() {
    let select = plain_select(
        "SELECT * FROM a JOIN b ON a.id = b.id LEFT OUTER JOIN c USING (id, region) CROSS JOIN d",
    );
    assert_eq!(select.from.len(), 1);

    let (operators, innermost) = join_chain(&select.from[0]);
    assert_eq!(
        operators,
        vec![JoinOperator::Inner, JoinOperator::Left, JoinOperator::Cross]
    );
    assert_eq!(*innermost, table(None, "a", None));

    let TableExpr::Join(cross) = &select.from[0] else {
        panic!("expected a join");
    };
    assert_eq!(cross.right, table(None, "d", None));
    assert!(cross.condition.on.is_none() && cross.condition.using.is_empty());

    let TableExpr::Join(left) = &cross.left else {
        panic!("expected a join");
    };
    assert_eq!(left.condition.using, vec!["id", "region"]);

    let TableExpr::Join(inner) = &left.left else {
        panic!("expected a join");
    };
    assert_eq!(
        inner.condition.on,
        Some(Expr::Comparison {
            left: Box::new(column(Some("a"), "id")),
            op: BinaryOp::Equal,
            right: Box::new(column(Some("b"), "id")),
        })
    );
}

#[test]
fn test_join_keywords() {
    let cases = vec![
        ("JOIN", JoinOperator::Inner),
        ("INNER JOIN", JoinOperator::Inner),
        ("LEFT JOIN", JoinOperator::Left),
        ("RIGHT OUTER JOIN", JoinOperator::Right),
        ("full outer join", JoinOperator::Full),
        ("CROSS JOIN", JoinOperator::Cross),
    ];

    for (keywords, expected) in cases {
        let sql = format!("SELECT * FROM a x {} b y", keywords);
        let select = plain_select(&sql);
        let (operators, _) = join_chain(&select.from[0]);
        assert_eq!(operators, vec![expected], "{}", sql);
    }
}

#[test]
fn test_derived_table_is_kept_as_a_query() {
    let select = plain_select("SELECT * FROM db.a AS x, (SELECT b FROM c) AS sub");

    let TableExpr::Aliased(derived) = &select.from[1] else {
        panic!("expected an aliased table");
    };
    assert_eq!(derived.alias, Some("sub"));
    let TableFactor::Derived(query) = &derived.factor else {
        panic!("expected a derived table");
    };
    assert!(matches!(**query, Query::Select(_)));
}

#[test]
fn test_where_and_having_are_filters() {
    let select = plain_select("SELECT a FROM t WHERE a = 1 GROUP BY a, b HAVING COUNT(b) > 2");

    assert_eq!(select.group_by, vec![column(None, "a"), column(None, "b")]);

    let having = select.having.expect("HAVING clause");
    assert_eq!(having.kind, FilterKind::Having);
    let Expr::Comparison { left, op, right } = having.expr else {
        panic!("expected a comparison");
    };
    assert!(matches!(*left, Expr::Function(FuncCall { name: "COUNT", .. })));
    assert_eq!(op, BinaryOp::Greater);
    assert_eq!(*right, Expr::Literal(Literal::Number(2)));
}

#[test]
fn test_operator_precedence() {
    let cases = vec![
        ("a OR b AND c", "(a OR (b AND c))"),
        (
            "a = 1 OR b = 2 AND c = 3",
            "((a = 1) OR ((b = 2) AND (c = 3)))",
        ),
        ("a + b * c > 10", "((a + (b * c)) > 10)"),
        ("a - b - c = d", "(((a - b) - c) = d)"),
        ("NOT a = 1 AND b = 2", "(NOT (a = 1) AND (b = 2))"),
        ("(a OR b) AND c", "(((a OR b)) AND c)"),
        (
            "a BETWEEN 1 AND 10 AND b = 2",
            "(a BETWEEN 1 AND 10 AND (b = 2))",
        ),
    ];

    for (filter, expected) in cases {
        let sql = format!("SELECT * FROM t WHERE {}", filter);
        assert_eq!(where_text(&sql), expected, "{}", filter);
    }
}

#[test]
fn test_predicates() {
    let expr = |filter: &str| {
        let sql = format!("SELECT * FROM t WHERE {}", filter);
        parse_statement(&sql).map(|stmt| format!("{:?}", stmt))
    };

    let select = plain_select("SELECT * FROM t WHERE a IS NOT NULL");
    assert!(matches!(
        select.where_clause.map(|f| f.expr),
        Some(Expr::IsNull { negated: true, .. })
    ));

    let select = plain_select("SELECT * FROM t WHERE a NOT IN (1, 2)");
    match select.where_clause.map(|f| f.expr) {
        Some(Expr::InList { negated, list, .. }) => {
            assert!(negated);
            assert_eq!(list.len(), 2);
        }
        other => panic!("expected an IN list, got {:?}", other),
    }

    let select = plain_select("SELECT * FROM t WHERE name NOT LIKE 'x%'");
    assert!(matches!(
        select.where_clause.map(|f| f.expr),
        Some(Expr::Comparison {
            op: BinaryOp::NotLike,
            ..
        })
    ));

    assert!(expr("a IN (SELECT b FROM u)").unwrap().contains("InSubquery"));
    assert!(expr("CASE a WHEN 1 THEN 'one' ELSE 'many' END = 'one'")
        .unwrap()
        .contains("Case"));
    assert!(expr("flag = TRUE AND other = NULL").is_ok());
}

#[test]
fn test_with_and_union_shapes() {
    let sql = "WITH RECURSIVE t(n) AS (SELECT 1 UNION ALL SELECT n FROM t) SELECT * FROM t";
    let stmt = parse_statement(sql).unwrap();
    let Statement::Query(Query::With { with, query }) = stmt else {
        panic!("expected a WITH query");
    };
    assert!(with.recursive);
    assert_eq!(with.ctes.len(), 1);
    assert_eq!(with.ctes[0].name, "t");
    assert_eq!(with.ctes[0].columns, Some(vec!["n"]));
    assert!(matches!(*with.ctes[0].query, Query::Union { all: true, .. }));
    assert!(matches!(*query, Query::Select(_)));

    // UNION chains nest on the right
    let stmt = parse_statement("SELECT 1 UNION SELECT 2 UNION ALL SELECT 3").unwrap();
    let Statement::Query(Query::Union { left, all, right }) = stmt else {
        panic!("expected a union");
    };
    assert!(!all);
    assert!(matches!(*left, Query::Select(_)));
    assert!(matches!(*right, Query::Union { all: true, .. }));
}

#[test]
fn test_dml_shapes() {
    match parse_statement("INSERT INTO shop.users (id, name) VALUES (1, 'a'), (2, 'b')") {
        Ok(Statement::Insert(insert)) => {
            assert_eq!(
                insert.table,
                TableName {
                    qualifier: Some("shop"),
                    name: "users"
                }
            );
            assert_eq!(insert.columns, vec!["id", "name"]);
            assert!(matches!(insert.source, InsertSource::Values(ref rows) if rows.len() == 2));
        }
        other => panic!("expected an insert, got {:?}", other),
    }

    assert!(matches!(
        parse_statement("INSERT INTO archive SELECT * FROM users"),
        Ok(Statement::Insert(insert)) if matches!(insert.source, InsertSource::Query(_))
    ));

    match parse_statement("UPDATE users SET name = 'b', age = 3 WHERE id = 1") {
        Ok(Statement::Update(update)) => {
            let columns: Vec<&str> = update.assignments.iter().map(|a| a.column).collect();
            assert_eq!(columns, vec!["name", "age"]);
            assert!(update.where_clause.is_some());
        }
        other => panic!("expected an update, got {:?}", other),
    }

    match parse_statement("DELETE FROM users") {
        Ok(Statement::Delete(delete)) => {
            assert_eq!(delete.table.name, "users");
            assert!(delete.where_clause.is_none());
        }
        other => panic!("expected a delete, got {:?}", other),
    }
}

#[test]
fn test_names_borrow_from_the_query_text() {
    let sql = String::from("SELECT name FROM users WHERE status = 'active'");
    let select = plain_select(&sql);
    let range = sql.as_bytes().as_ptr_range();

    let SelectItem::Expr {
        expr: Expr::Column(col),
        ..
    } = &select.projection[0]
    else {
        panic!("expected a column");
    };
    assert!(range.contains(&col.name.as_ptr()));

    let TableExpr::Aliased(AliasedTableExpr {
        factor: TableFactor::Table(name),
        ..
    }) = &select.from[0]
    else {
        panic!("expected a table");
    };
    assert!(range.contains(&name.name.as_ptr()));
}

#[test]
fn test_keyword_typos_are_suggested() {
    let cases = vec![
        ("SELCT * FROM users", "SELECT"),
        ("SELECT * FORM users", "FROM"),
        ("SELECT * FROM users WHEER age > 18", "WHERE"),
        ("SELECT a FROM users u GRUP BY a", "GROUP"),
    ];

    for (sql, keyword) in cases {
        let error = parse_sql(sql).unwrap_err();
        assert_eq!(error.suggestion.as_deref(), Some(keyword), "{}", sql);
    }
}

#[test]
fn test_cte_without_parentheses() {
    let error = parse_sql("WITH t AS SELECT 1 SELECT * FROM t").unwrap_err();
    assert_eq!(error.message, "Expected LeftParen, found 'SELECT'");
    assert_eq!(error.column, 11);
}

#[test]
fn test_error_display_points_at_the_line() {
    let sql = "SELECT *\nFROM users\nWHEER age > 18";
    let error = parse_sql(sql).unwrap_err();
    assert_eq!((error.line, error.column), (3, 1));

    let rendered = error.to_string();
    let heading = regex::Regex::new(r"Parse error at line 3:1").unwrap();
    let source = regex::Regex::new(r"(?m)^  3 \| WHEER age > 18$").unwrap();
    assert!(heading.is_match(&rendered), "{}", rendered);
    assert!(source.is_match(&rendered), "{}", rendered);
    assert!(rendered.contains("Did you mean:"));
}

#[test]
fn test_malformed_queries_fail() {
    let queries = vec![
        "",
        "SELECT",
        "SELECT a FROM",
        "SELECT a FROM t WHERE",
        "SELECT a FROM t GROUP a",
        "SELECT a FROM t JOIN",
        "SELECT (a FROM t",
        "SELECT a FROM t extra tokens",
        "SELECT a FROM t WHERE x # 1",
        "SELECT naïve FROM t",
        "INSERT users VALUES (1)",
    ];

    for sql in queries {
        assert!(parse_sql(sql).is_err(), "Should have failed: {}", sql);
    }
}
