//! SELECT builder: projection → FROM → [JOIN] → [WHERE] → [ORDER BY] → [LIMIT].

use crate::column::Column;
use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::expr::SqlExpr;
use crate::row::FromRow;
use crate::stmt::projection_item;
use crate::table::Table;
use crate::token::{render_statement, Rendered, Token, ToTokens};
use std::sync::Arc;
use tokio_postgres::Row;

/// Sort direction for ORDER BY.
#[derive(Clone, Copy, Debug)]
pub enum Order {
    Asc,
    Desc,
}

/// The result of [`Database::select`]: a projection waiting for its FROM
/// table. The only continuation is [`Projection::from`], which is what keeps
/// the clause grammar in order.
pub struct Projection<'q, 'db> {
    pub(crate) db: &'q Database<'db>,
    pub(crate) columns: Vec<Column>,
}

impl<'q, 'db> Projection<'q, 'db> {
    /// Attach the target table and produce the composed SELECT builder.
    pub fn from(self, table: &Arc<Table>) -> Select<'q, 'db> {
        let mut build_error = None;
        if let Err(e) = table.bind(self.db.id()) {
            build_error = Some(e.to_string());
        }
        if self.columns.is_empty() {
            build_error.get_or_insert_with(|| "empty projection: nothing to select".to_string());
        }
        // Columns from a second table force qualification so every projected
        // name stays unambiguous once joins attach.
        let qualify = self.columns.iter().any(|c| c.table_name() != table.name());
        let items: Vec<Token> = self
            .columns
            .iter()
            .map(|c| projection_item(c, qualify))
            .collect();
        Select {
            db: self.db,
            head: vec![
                Token::literal("SELECT"),
                Token::separated(",", items),
                Token::literal("FROM"),
                Token::literal(table.name()),
            ],
            joins: Vec::new(),
            where_clause: None,
            order: Vec::new(),
            limit: None,
            offset: None,
            build_error,
        }
    }
}

/// A composed SELECT statement.
///
/// Implements [`ToTokens`], so a whole select can be embedded as a
/// parenthesized sub-expression of another statement; its placeholders are
/// renumbered during the enclosing statement's render.
#[derive(Clone)]
pub struct Select<'q, 'db> {
    db: &'q Database<'db>,
    head: Vec<Token>,
    joins: Vec<Token>,
    where_clause: Option<SqlExpr>,
    order: Vec<Token>,
    limit: Option<i64>,
    offset: Option<i64>,
    build_error: Option<String>,
}

impl<'q, 'db> Select<'q, 'db> {
    /// Add `INNER JOIN <table> ON <condition>`.
    pub fn inner_join(self, table: &Arc<Table>, on: SqlExpr) -> Self {
        self.join("INNER JOIN", table, on)
    }

    /// Add `LEFT JOIN <table> ON <condition>`.
    pub fn left_join(self, table: &Arc<Table>, on: SqlExpr) -> Self {
        self.join("LEFT JOIN", table, on)
    }

    fn join(mut self, kind: &str, table: &Arc<Table>, on: SqlExpr) -> Self {
        if let Err(e) = table.bind(self.db.id()) {
            self.build_error.get_or_insert_with(|| e.to_string());
        }
        self.joins.push(Token::group(vec![
            Token::literal(kind),
            Token::literal(table.name()),
            Token::literal("ON"),
            Token::group(on.to_tokens()),
        ]));
        self
    }

    /// Add a WHERE condition; successive calls are ANDed.
    pub fn where_(mut self, expr: SqlExpr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// Add an ORDER BY item.
    pub fn order_by(mut self, column: &Column, order: Order) -> Self {
        let direction = match order {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        };
        self.order.push(Token::group(vec![
            Token::literal(column.physical_name()),
            Token::literal(direction),
        ]));
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    fn clause_tokens(&self) -> Vec<Token> {
        let mut tokens = self.head.clone();
        tokens.extend(self.joins.iter().cloned());
        if let Some(where_clause) = &self.where_clause {
            tokens.push(Token::literal("WHERE"));
            tokens.push(Token::group(where_clause.to_tokens()));
        }
        if !self.order.is_empty() {
            tokens.push(Token::literal("ORDER BY"));
            tokens.push(Token::separated(", ", self.order.clone()));
        }
        if let Some(limit) = self.limit {
            tokens.push(Token::literal(format!("LIMIT {limit}")));
        }
        if let Some(offset) = self.offset {
            tokens.push(Token::literal(format!("OFFSET {offset}")));
        }
        tokens
    }

    fn validate(&self) -> DbResult<()> {
        match &self.build_error {
            Some(error) => Err(DbError::build(error.clone())),
            None => Ok(()),
        }
    }

    /// Render to SQL text plus the ordered parameter list without executing.
    pub fn render(&self) -> Rendered {
        render_statement(&self.clause_tokens())
    }

    /// Get the built SQL string (for debugging).
    pub fn to_sql(&self) -> String {
        self.render().sql
    }

    /// Execute and return all rows.
    pub async fn fetch_all(&self) -> DbResult<Vec<Row>> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .query(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and return exactly one row.
    pub async fn fetch_one(&self) -> DbResult<Row> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .query_one(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and return at most one row.
    pub async fn fetch_opt(&self) -> DbResult<Option<Row>> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .query_opt(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and map all rows to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self) -> DbResult<Vec<T>> {
        let rows = self.fetch_all().await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute and map exactly one row to `T`.
    pub async fn fetch_one_as<T: FromRow>(&self) -> DbResult<T> {
        let row = self.fetch_one().await?;
        T::from_row(&row)
    }

    /// Execute and map at most one row to `T`.
    pub async fn fetch_opt_as<T: FromRow>(&self) -> DbResult<Option<T>> {
        let row = self.fetch_opt().await?;
        row.as_ref().map(T::from_row).transpose()
    }
}

impl ToTokens for Select<'_, '_> {
    fn to_tokens(&self) -> Vec<Token> {
        vec![Token::parenthesized(self.clause_tokens())]
    }
}
