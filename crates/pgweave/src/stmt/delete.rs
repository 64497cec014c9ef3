//! DELETE builder.

use crate::column::Column;
use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::expr::SqlExpr;
use crate::row::FromRow;
use crate::stmt::returning_clause;
use crate::table::Table;
use crate::token::{render_statement, Rendered, Token, ToTokens};
use std::sync::Arc;
use tokio_postgres::Row;

/// A `DELETE FROM <table>` statement.
///
/// A DELETE with no WHERE condition renders `WHERE 1=0` (a no-op) unless
/// `allow_delete_all(true)` was called.
#[derive(Clone)]
pub struct Delete<'q, 'db> {
    db: &'q Database<'db>,
    table: Arc<Table>,
    where_clause: Option<SqlExpr>,
    returning: Option<Token>,
    allow_delete_all: bool,
    build_error: Option<String>,
}

impl<'q, 'db> Delete<'q, 'db> {
    pub(crate) fn new(db: &'q Database<'db>, table: &Arc<Table>) -> Self {
        let build_error = table.bind(db.id()).err().map(|e| e.to_string());
        Self {
            db,
            table: table.clone(),
            where_clause: None,
            returning: None,
            allow_delete_all: false,
            build_error,
        }
    }

    /// Allow DELETE without WHERE conditions (deletes every row).
    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.allow_delete_all = allow;
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

    /// Append a RETURNING clause.
    pub fn returning(mut self, columns: &[&Column]) -> Self {
        self.returning = Some(returning_clause(columns));
        self
    }

    fn clause_tokens(&self) -> Vec<Token> {
        let mut tokens = vec![
            Token::literal("DELETE FROM"),
            Token::literal(self.table.name()),
        ];
        match &self.where_clause {
            Some(where_clause) => {
                tokens.push(Token::literal("WHERE"));
                tokens.push(Token::group(where_clause.to_tokens()));
            }
            None if !self.allow_delete_all => {
                tokens.push(Token::literal("WHERE 1=0"));
            }
            None => {}
        }
        if let Some(returning) = &self.returning {
            tokens.push(returning.clone());
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

    /// Execute and return the number of deleted rows.
    pub async fn execute(&self) -> DbResult<u64> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .execute(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and return all RETURNING rows.
    pub async fn fetch_all(&self) -> DbResult<Vec<Row>> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .query(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and map all RETURNING rows to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self) -> DbResult<Vec<T>> {
        let rows = self.fetch_all().await?;
        rows.iter().map(T::from_row).collect()
    }
}
