// Statement parser: turns query text into the tree the collectors walk.

use crate::ast::{
    AliasedTableExpr, Assignment, Delete, Filter, FilterKind, Insert, InsertSource, JoinCondition,
    JoinExpr, JoinOperator, Limit, OrderByExpr, Query, SelectItem, SelectStmt, SortDirection,
    Statement, TableExpr, TableFactor, TableName, Update, With, CTE,
};
use crate::error::{suggest_keyword, Backtrace, ParseError};
use crate::expr::Expr;
use crate::token::{tokenize, Token, TokenKind};

pub type ParseResult<T> = Result<T, ParseError>;

/// An implicit table alias that looks like one of these keywords may be a typo.
const TABLE_ALIAS_STOPWORDS: &[&str] = &[
    "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "GROUP", "ORDER", "HAVING", "LIMIT", "UNION",
];

/// Tokens that may follow a table alias.
const AFTER_TABLE_ALIAS: &[TokenKind] = &[
    TokenKind::Comma,
    TokenKind::Join,
    TokenKind::Inner,
    TokenKind::Left,
    TokenKind::Right,
    TokenKind::Full,
    TokenKind::Cross,
    TokenKind::On,
    TokenKind::Using,
    TokenKind::Where,
    TokenKind::Group,
    TokenKind::Having,
    TokenKind::Order,
    TokenKind::Limit,
    TokenKind::Union,
    TokenKind::RightParen,
    TokenKind::Semicolon,
    TokenKind::Eof,
];

/// Tokens that may follow a projection alias.
const AFTER_COLUMN_ALIAS: &[TokenKind] = &[
    TokenKind::Comma,
    TokenKind::From,
    TokenKind::Where,
    TokenKind::Group,
    TokenKind::Having,
    TokenKind::Order,
    TokenKind::Limit,
    TokenKind::Union,
    TokenKind::RightParen,
    TokenKind::Semicolon,
    TokenKind::Eof,
];

/// Recursive-descent parser over a token slice.
///
/// `'t` is the borrow of the token buffer and error tracker, which live only
/// as long as one parse. `'a` is the query text; the tree borrows names from
/// it and so outlives the parser.
pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    backtrace: &'t Backtrace,
    input: &'a str, // Original input for error messages
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>], backtrace: &'t Backtrace, input: &'a str) -> Self {
        Parser {
            tokens,
            pos: 0,
            backtrace,
            input,
        }
    }

    /// Current token
    pub fn current(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    /// Kind of the current token, `Eof` past the end
    pub fn current_kind(&self) -> TokenKind {
        self.peek_kind(0)
    }

    /// Kind of the token `offset` places ahead
    pub fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Advance to next token
    pub fn advance(&mut self) -> &'t Token<'a> {
        let tokens = self.tokens;
        let token = &tokens[self.pos.min(tokens.len().saturating_sub(1))];
        if self.pos + 1 < tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Byte offset used when the error is at end of input
    fn end_position(&self) -> usize {
        if self.pos > 0 && !self.tokens.is_empty() {
            self.tokens[self.pos - 1].span.end
        } else {
            0
        }
    }

    /// Record `expected` at the current token and return the furthest error
    pub(crate) fn fail<T>(&self, expected: &str) -> ParseResult<T> {
        match self.current() {
            Some(token) => {
                let found = (token.kind != TokenKind::Eof).then_some(token.text);
                self.backtrace.track_error(token.span.start, expected, found);
            }
            None => self
                .backtrace
                .track_error(self.end_position(), expected, None),
        }
        Err(self.backtrace.get_error(self.input))
    }

    /// Expect a specific token kind
    pub fn expect(&mut self, expected: TokenKind) -> ParseResult<&'t Token<'a>> {
        if self.current_kind() == expected {
            Ok(self.advance())
        } else {
            self.fail(&format!("{:?}", expected))
        }
    }

    /// Try to consume a token
    pub fn try_consume(&mut self, kind: TokenKind) -> bool {
        if self.current_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse identifier, stripping the quotes of a quoted one
    pub fn parse_identifier(&mut self) -> ParseResult<&'a str> {
        match self.current() {
            Some(token) if token.kind == TokenKind::Identifier => Ok(self.advance().text),
            Some(token) if token.kind == TokenKind::QuotedIdentifier => {
                self.advance();
                Ok(&token.text[1..token.text.len() - 1])
            }
            _ => self.fail("identifier"),
        }
    }

    /// Create error at current position
    pub fn error_at_current(&self, msg: &str) -> ParseError {
        let mut error = self.backtrace.get_error(self.input);
        error.message = msg.to_string();
        error
    }

    /// Whether the next tokens open a query (`SELECT` or `WITH`)
    pub(crate) fn at_query_start(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Select | TokenKind::With)
    }

    /// If the current identifier looks like one of `keywords` misspelled,
    /// track it as an error and return true
    fn check_for_keyword_typo(&mut self, keywords: &[&str]) -> bool {
        if let Some(token) = self.current() {
            if token.kind == TokenKind::Identifier {
                if let Some(keyword) = suggest_keyword(token.text) {
                    if keywords.contains(&keyword.as_str()) {
                        self.backtrace
                            .track_error(token.span.start, &keyword, Some(token.text));
                        return true;
                    }
                }
            }
        }
        false
    }

    /// An implicit alias is only read as a misspelled keyword when the
    /// token after it could not follow an alias: `FROM t wher x = 1` is a
    /// typo, `FROM limits lim` is an alias.
    fn alias_is_keyword_typo(&mut self, keywords: &[&str], follow: &[TokenKind]) -> bool {
        !follow.contains(&self.peek_kind(1)) && self.check_for_keyword_typo(keywords)
    }

    /// Point at the first character the tokenizer could not classify.
    fn reject_unrecognized(&self) -> ParseResult<()> {
        match self.tokens.iter().find(|t| t.kind == TokenKind::Error) {
            Some(token) => Err(ParseError::at(
                self.input,
                token.span.start,
                format!("Unrecognized character '{}'", token.text),
            )),
            None => Ok(()),
        }
    }

    /// Parse a complete SQL statement, optionally terminated by `;`
    pub fn parse_statement(&mut self) -> ParseResult<Statement<'a>> {
        self.reject_unrecognized()?;
        let start_pos = self.pos;

        let stmt = match self.current_kind() {
            TokenKind::Insert => Statement::Insert(self.parse_insert()?),
            TokenKind::Update => Statement::Update(self.parse_update()?),
            TokenKind::Delete => Statement::Delete(self.parse_delete()?),
            _ => match self.parse_query() {
                Ok(query) => Statement::Query(query),
                Err(err) => {
                    // Offer the other statement types at the first token;
                    // a deeper failure is still the furthest one reported
                    self.pos = start_pos;
                    if let Some(token) = self.current() {
                        for alternative in ["INSERT", "UPDATE", "DELETE", "WITH"] {
                            self.backtrace.track_error(
                                token.span.start,
                                alternative,
                                Some(token.text),
                            );
                        }
                        return Err(self.backtrace.get_error(self.input));
                    }
                    return Err(err);
                }
            },
        };

        self.try_consume(TokenKind::Semicolon);
        if self.current_kind() != TokenKind::Eof {
            return self.fail("end of input");
        }

        Ok(stmt)
    }

    /// Parse a query (can be SELECT, WITH or UNION)
    pub fn parse_query(&mut self) -> ParseResult<Query<'a>> {
        if self.current_kind() == TokenKind::With {
            let with = self.parse_with()?;
            let query = Box::new(self.parse_query()?);
            return Ok(Query::With { with, query });
        }

        let select = self.parse_select()?;

        if self.try_consume(TokenKind::Union) {
            let all = self.try_consume(TokenKind::All);
            let right = Box::new(self.parse_query()?);
            Ok(Query::Union {
                left: Box::new(Query::Select(Box::new(select))),
                all,
                right,
            })
        } else {
            Ok(Query::Select(Box::new(select)))
        }
    }

    /// Parse SELECT statement with lenient keyword matching
    pub fn parse_select(&mut self) -> ParseResult<SelectStmt<'a>> {
        let mut had_errors = false;

        // Try to parse SELECT, but be lenient about typos
        match self.current() {
            Some(token) if token.kind == TokenKind::Select => {
                self.advance();
            }
            Some(token) if token.kind == TokenKind::Identifier => {
                self.backtrace.track_error(
                    token.span.start,
                    "SELECT",
                    Some(token.text),
                );
                had_errors = true;

                // Looks like a SELECT typo: keep going to find a later error
                let text = token.text.to_uppercase();
                if text.starts_with("SEL") && text.len() >= 4 {
                    self.advance();
                } else {
                    return Err(self.backtrace.get_error(self.input));
                }
            }
            _ => return self.fail("SELECT"),
        }

        let distinct = self.try_consume(TokenKind::Distinct);

        let mut projection = vec![self.parse_select_item(true)?];
        while self.try_consume(TokenKind::Comma) {
            projection.push(self.parse_select_item(true)?);
        }

        let from = if self.try_consume(TokenKind::From) {
            self.parse_table_expr_list()?
        } else {
            if self.check_for_keyword_typo(&["FROM"]) {
                return Err(self.backtrace.get_error(self.input));
            }
            Vec::new()
        };

        let where_clause = if self.try_consume(TokenKind::Where) {
            Some(Filter {
                kind: FilterKind::Where,
                expr: self.parse_expr()?,
            })
        } else {
            if self.check_for_keyword_typo(&["WHERE"]) {
                return Err(self.backtrace.get_error(self.input));
            }
            None
        };

        let group_by = if self.try_consume(TokenKind::Group) {
            self.expect(TokenKind::By)?;
            self.parse_expr_list()?
        } else {
            Vec::new()
        };

        let having = if self.try_consume(TokenKind::Having) {
            Some(Filter {
                kind: FilterKind::Having,
                expr: self.parse_expr()?,
            })
        } else {
            None
        };

        let order_by = if self.try_consume(TokenKind::Order) {
            self.expect(TokenKind::By)?;
            self.parse_order_by_list()?
        } else {
            Vec::new()
        };

        let limit = if self.try_consume(TokenKind::Limit) {
            Some(self.parse_limit()?)
        } else {
            None
        };

        if had_errors {
            return Err(self.backtrace.get_error(self.input));
        }

        Ok(SelectStmt {
            distinct,
            projection,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
        })
    }

    /// Parse one projection item: `*`, `t.*` or an expression with an
    /// optional alias. Function arguments reuse this without aliases.
    pub(crate) fn parse_select_item(&mut self, allow_alias: bool) -> ParseResult<SelectItem<'a>> {
        if self.try_consume(TokenKind::Star) {
            return Ok(SelectItem::Wildcard { qualifier: None });
        }

        if self.current_kind().is_identifier()
            && self.peek_kind(1) == TokenKind::Dot
            && self.peek_kind(2) == TokenKind::Star
        {
            let qualifier = self.parse_identifier()?;
            self.advance();
            self.advance();
            return Ok(SelectItem::Wildcard {
                qualifier: Some(qualifier),
            });
        }

        let expr = self.parse_expr()?;

        let alias = if !allow_alias {
            None
        } else if self.try_consume(TokenKind::As) {
            Some(self.parse_identifier()?)
        } else if self.current_kind().is_identifier() {
            if self.alias_is_keyword_typo(&["FROM"], AFTER_COLUMN_ALIAS) {
                return Err(self.backtrace.get_error(self.input));
            }
            Some(self.parse_identifier()?)
        } else {
            None
        };

        Ok(SelectItem::Expr { expr, alias })
    }

    /// Parse comma-separated FROM members
    fn parse_table_expr_list(&mut self) -> ParseResult<Vec<TableExpr<'a>>> {
        let mut tables = vec![self.parse_table_expr()?];

        while self.try_consume(TokenKind::Comma) {
            tables.push(self.parse_table_expr()?);
        }

        Ok(tables)
    }

    /// Parse a table factor followed by any chain of joins
    fn parse_table_expr(&mut self) -> ParseResult<TableExpr<'a>> {
        let mut left = TableExpr::Aliased(self.parse_aliased_table()?);

        while let Some(operator) = self.parse_join_operator()? {
            let right = TableExpr::Aliased(self.parse_aliased_table()?);
            let condition = self.parse_join_condition()?;
            left = TableExpr::Join(Box::new(JoinExpr {
                left,
                operator,
                right,
                condition,
            }));
        }

        Ok(left)
    }

    /// Parse `[INNER | CROSS | LEFT [OUTER] | RIGHT [OUTER] | FULL [OUTER]] JOIN`
    fn parse_join_operator(&mut self) -> ParseResult<Option<JoinOperator>> {
        let operator = match self.current_kind() {
            TokenKind::Join => JoinOperator::Inner,
            TokenKind::Inner => {
                self.advance();
                JoinOperator::Inner
            }
            TokenKind::Cross => {
                self.advance();
                JoinOperator::Cross
            }
            TokenKind::Left | TokenKind::Right | TokenKind::Full => {
                let operator = match self.advance().kind {
                    TokenKind::Left => JoinOperator::Left,
                    TokenKind::Right => JoinOperator::Right,
                    _ => JoinOperator::Full,
                };
                self.try_consume(TokenKind::Outer);
                operator
            }
            _ => return Ok(None),
        };
        self.expect(TokenKind::Join)?;
        Ok(Some(operator))
    }

    /// Parse `ON expr` or `USING (a, b)`; neither is required
    fn parse_join_condition(&mut self) -> ParseResult<JoinCondition<'a>> {
        if self.try_consume(TokenKind::On) {
            return Ok(JoinCondition {
                on: Some(self.parse_expr()?),
                using: Vec::new(),
            });
        }

        if self.try_consume(TokenKind::Using) {
            self.expect(TokenKind::LeftParen)?;
            let using = self.parse_identifier_list()?;
            self.expect(TokenKind::RightParen)?;
            return Ok(JoinCondition { on: None, using });
        }

        Ok(JoinCondition::default())
    }

    /// Parse a table name or a parenthesized subquery, with optional alias
    fn parse_aliased_table(&mut self) -> ParseResult<AliasedTableExpr<'a>> {
        let factor = if self.try_consume(TokenKind::LeftParen) {
            let query = self.parse_query()?;
            self.expect(TokenKind::RightParen)?;
            TableFactor::Derived(Box::new(query))
        } else {
            TableFactor::Table(self.parse_table_name()?)
        };

        let alias = if self.try_consume(TokenKind::As) {
            Some(self.parse_identifier()?)
        } else if self.current_kind().is_identifier() {
            if self.alias_is_keyword_typo(TABLE_ALIAS_STOPWORDS, AFTER_TABLE_ALIAS) {
                return Err(self.backtrace.get_error(self.input));
            }
            Some(self.parse_identifier()?)
        } else {
            None
        };

        Ok(AliasedTableExpr { factor, alias })
    }

    /// Parse `name` or `qualifier.name`
    fn parse_table_name(&mut self) -> ParseResult<TableName<'a>> {
        let first = self.parse_identifier()?;
        if self.try_consume(TokenKind::Dot) {
            let name = self.parse_identifier()?;
            Ok(TableName {
                qualifier: Some(first),
                name,
            })
        } else {
            Ok(TableName {
                qualifier: None,
                name: first,
            })
        }
    }

    /// Parse comma-separated expression list
    pub(crate) fn parse_expr_list(&mut self) -> ParseResult<Vec<Expr<'a>>> {
        let mut exprs = vec![self.parse_expr()?];

        while self.try_consume(TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }

        Ok(exprs)
    }

    fn parse_order_by_list(&mut self) -> ParseResult<Vec<OrderByExpr<'a>>> {
        let mut items = Vec::new();
        loop {
            let expr = self.parse_expr()?;
            let direction = if self.try_consume(TokenKind::Asc) {
                Some(SortDirection::Asc)
            } else if self.try_consume(TokenKind::Desc) {
                Some(SortDirection::Desc)
            } else {
                None
            };
            items.push(OrderByExpr { expr, direction });

            if !self.try_consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    /// Parse `n [OFFSET m]` or the MySQL form `m, n`
    fn parse_limit(&mut self) -> ParseResult<Limit> {
        let first = self.parse_integer()?;
        if self.try_consume(TokenKind::Offset) {
            let offset = self.parse_integer()?;
            return Ok(Limit {
                count: first,
                offset: Some(offset),
            });
        }
        if self.try_consume(TokenKind::Comma) {
            let count = self.parse_integer()?;
            return Ok(Limit {
                count,
                offset: Some(first),
            });
        }
        Ok(Limit {
            count: first,
            offset: None,
        })
    }

    fn parse_integer(&mut self) -> ParseResult<i64> {
        let token = self.expect(TokenKind::Number)?;
        token
            .text
            .parse::<i64>()
            .map_err(|_| self.error_at_current("Invalid number"))
    }

    /// Parse WITH clause (including CTEs)
    pub fn parse_with(&mut self) -> ParseResult<With<'a>> {
        self.expect(TokenKind::With)?;

        let recursive = self.try_consume(TokenKind::Recursive);

        let mut ctes = vec![self.parse_cte()?];

        while self.try_consume(TokenKind::Comma) {
            ctes.push(self.parse_cte()?);
        }

        Ok(With { recursive, ctes })
    }

    /// Parse a single CTE
    fn parse_cte(&mut self) -> ParseResult<CTE<'a>> {
        let name = self.parse_identifier()?;

        let columns = if self.try_consume(TokenKind::LeftParen) {
            let cols = self.parse_identifier_list()?;
            self.expect(TokenKind::RightParen)?;
            Some(cols)
        } else {
            None
        };

        self.expect(TokenKind::As)?;
        self.expect(TokenKind::LeftParen)?;
        let query = Box::new(self.parse_query()?);
        self.expect(TokenKind::RightParen)?;

        Ok(CTE {
            name,
            columns,
            query,
        })
    }

    /// Parse identifier list
    fn parse_identifier_list(&mut self) -> ParseResult<Vec<&'a str>> {
        let mut idents = vec![self.parse_identifier()?];

        while self.try_consume(TokenKind::Comma) {
            idents.push(self.parse_identifier()?);
        }

        Ok(idents)
    }

    /// Parse `INSERT INTO t [(cols)] VALUES (...), ... | query`
    fn parse_insert(&mut self) -> ParseResult<Insert<'a>> {
        self.expect(TokenKind::Insert)?;
        self.expect(TokenKind::Into)?;
        let table = self.parse_table_name()?;

        let columns = if self.try_consume(TokenKind::LeftParen) {
            let cols = self.parse_identifier_list()?;
            self.expect(TokenKind::RightParen)?;
            cols
        } else {
            Vec::new()
        };

        let source = if self.try_consume(TokenKind::Values) {
            let mut rows = Vec::new();
            loop {
                self.expect(TokenKind::LeftParen)?;
                rows.push(self.parse_expr_list()?);
                self.expect(TokenKind::RightParen)?;
                if !self.try_consume(TokenKind::Comma) {
                    break;
                }
            }
            InsertSource::Values(rows)
        } else if self.at_query_start() {
            InsertSource::Query(Box::new(self.parse_query()?))
        } else {
            return self.fail("VALUES");
        };

        Ok(Insert {
            table,
            columns,
            source,
        })
    }

    /// Parse `UPDATE t SET col = expr, ... [WHERE expr]`
    fn parse_update(&mut self) -> ParseResult<Update<'a>> {
        self.expect(TokenKind::Update)?;
        let table = self.parse_table_name()?;
        self.expect(TokenKind::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.parse_identifier()?;
            self.expect(TokenKind::Equal)?;
            let value = self.parse_expr()?;
            assignments.push(Assignment { column, value });
            if !self.try_consume(TokenKind::Comma) {
                break;
            }
        }

        let where_clause = self.parse_optional_where()?;

        Ok(Update {
            table,
            assignments,
            where_clause,
        })
    }

    /// Parse `DELETE FROM t [WHERE expr]`
    fn parse_delete(&mut self) -> ParseResult<Delete<'a>> {
        self.expect(TokenKind::Delete)?;
        self.expect(TokenKind::From)?;
        let table = self.parse_table_name()?;
        let where_clause = self.parse_optional_where()?;

        Ok(Delete {
            table,
            where_clause,
        })
    }

    fn parse_optional_where(&mut self) -> ParseResult<Option<Filter<'a>>> {
        if self.try_consume(TokenKind::Where) {
            Ok(Some(Filter {
                kind: FilterKind::Where,
                expr: self.parse_expr()?,
            }))
        } else {
            Ok(None)
        }
    }
}

/// Parse one statement. The returned tree borrows names from `sql`.
pub fn parse_statement(sql: &str) -> Result<Statement<'_>, ParseError> {
    let tokens = tokenize(sql);
    let backtrace = Backtrace::new();
    let mut parser = Parser::new(&tokens, &backtrace, sql);
    parser.parse_statement()
}

/// Parse SQL and only report whether it is valid
pub fn parse_sql(sql: &str) -> Result<(), ParseError> {
    parse_statement(sql).map(|_| ())
}

/// Parse SQL and return an owned representation (for testing)
pub fn parse_sql_to_string(sql: &str) -> Result<String, ParseError> {
    let stmt = parse_statement(sql)?;
    Ok(format!("{:?}", stmt))
}
