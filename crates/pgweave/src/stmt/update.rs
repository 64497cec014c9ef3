//! UPDATE builder: table → SET → [WHERE] → [RETURNING].

use crate::column::Column;
use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::expr::SqlExpr;
use crate::row::FromRow;
use crate::stmt::patch::{Patch, SetValue};
use crate::stmt::returning_clause;
use crate::table::Table;
use crate::token::{render_statement, Rendered, Token, ToTokens};
use std::sync::Arc;
use tokio_postgres::Row;

/// The result of [`Database::update`]: an UPDATE waiting for its SET patch.
/// The only continuation is [`UpdateSeed::set`].
pub struct UpdateSeed<'q, 'db> {
    db: &'q Database<'db>,
    table: Arc<Table>,
    build_error: Option<String>,
}

impl<'q, 'db> UpdateSeed<'q, 'db> {
    pub(crate) fn new(db: &'q Database<'db>, table: &Arc<Table>) -> Self {
        let build_error = table.bind(db.id()).err().map(|e| e.to_string());
        Self {
            db,
            table: table.clone(),
            build_error,
        }
    }

    /// Build the SET clause from a partial patch.
    ///
    /// Keys absent from the patch leave their columns untouched. Keys that do
    /// not resolve to a known column are silently dropped (patches often
    /// carry extra fields). A known column that is not updatable is a build
    /// error. An expression value splices its token tree; a plain value
    /// binds a parameter.
    pub fn set(self, patch: Patch) -> Update<'q, 'db> {
        let mut build_error = self.build_error;
        let mut assignments = Vec::new();
        for (logical, value) in patch.entries {
            let Some(column) = self.table.get(&logical) else {
                continue;
            };
            if !column.is_updatable() {
                build_error.get_or_insert_with(|| {
                    format!(
                        "column `{logical}` on table `{}` is not updatable",
                        self.table.name()
                    )
                });
                continue;
            }
            let rhs = match value {
                SetValue::Value(param) => Token::param(param),
                SetValue::Expr(tokens) => Token::group(tokens),
            };
            assignments.push(Token::group(vec![
                Token::literal(column.physical_name()),
                Token::literal("="),
                rhs,
            ]));
        }
        if assignments.is_empty() {
            build_error.get_or_insert_with(|| {
                format!("UPDATE {}: SET clause is empty", self.table.name())
            });
        }
        Update {
            db: self.db,
            head: vec![
                Token::literal("UPDATE"),
                Token::literal(self.table.name()),
                Token::literal("SET"),
                Token::separated(",", assignments),
            ],
            where_clause: None,
            returning: None,
            build_error,
        }
    }
}

/// A composed UPDATE statement.
#[derive(Clone)]
pub struct Update<'q, 'db> {
    db: &'q Database<'db>,
    head: Vec<Token>,
    where_clause: Option<SqlExpr>,
    returning: Option<Token>,
    build_error: Option<String>,
}

impl<'q, 'db> Update<'q, 'db> {
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
        let mut tokens = self.head.clone();
        if let Some(where_clause) = &self.where_clause {
            tokens.push(Token::literal("WHERE"));
            tokens.push(Token::group(where_clause.to_tokens()));
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

    /// Execute and return the number of updated rows.
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

    /// Execute and return exactly one RETURNING row.
    pub async fn fetch_one(&self) -> DbResult<Row> {
        self.validate()?;
        let rendered = self.render();
        self.db
            .backend
            .query_one(&rendered.sql, &rendered.params.as_refs())
            .await
    }

    /// Execute and map all RETURNING rows to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self) -> DbResult<Vec<T>> {
        let rows = self.fetch_all().await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute and map exactly one RETURNING row to `T`.
    pub async fn fetch_one_as<T: FromRow>(&self) -> DbResult<T> {
        let row = self.fetch_one().await?;
        T::from_row(&row)
    }
}
