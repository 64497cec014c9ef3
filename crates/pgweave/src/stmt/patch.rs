//! Partial row patches for INSERT values and UPDATE SET clauses.

use crate::token::{Param, Token, ToTokens};
use serde::Serialize;
use tokio_postgres::types::ToSql;

/// A value assigned to a column: a bound parameter, or an embeddable
/// expression whose token tree is spliced into the statement.
#[derive(Clone, Debug)]
pub enum SetValue {
    /// Parameterized value
    Value(Param),
    /// Token-backed expression, e.g. `quantity + 1` or a sub-select
    Expr(Vec<Token>),
}

/// An ordered partial mapping from logical column name to value.
///
/// Keys absent from the patch are never touched. `set_opt` is the explicit
/// absent-value affordance: a `None` contributes no entry, no token, and no
/// placeholder.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    pub(crate) entries: Vec<(String, SetValue)>,
}

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a parameterized value.
    pub fn set<T: ToSql + Send + Sync + 'static>(
        mut self,
        column: impl Into<String>,
        value: T,
    ) -> Self {
        self.entries
            .push((column.into(), SetValue::Value(Param::new(value))));
        self
    }

    /// Assign a value if present (None => skip).
    pub fn set_opt<T: ToSql + Send + Sync + 'static>(
        self,
        column: impl Into<String>,
        value: Option<T>,
    ) -> Self {
        if let Some(v) = value {
            self.set(column, v)
        } else {
            self
        }
    }

    /// Assign an embeddable expression; its tokens are spliced in and its
    /// parameters renumbered as part of the final statement render.
    pub fn set_expr(mut self, column: impl Into<String>, expr: impl ToTokens) -> Self {
        self.entries
            .push((column.into(), SetValue::Expr(expr.to_tokens())));
        self
    }

    /// Assign a JSON value.
    pub fn set_json<T: Serialize>(
        self,
        column: impl Into<String>,
        value: &T,
    ) -> serde_json::Result<Self> {
        let json_val = serde_json::to_value(value)?;
        Ok(self.set(column, json_val))
    }

    /// Check if the patch has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_opt_none_contributes_nothing() {
        let patch = Patch::new()
            .set("name", "Ann")
            .set_opt::<&str>("email", None);
        assert_eq!(patch.len(), 1);
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let patch = Patch::new().set("b", 1i32).set("a", 2i32);
        let keys: Vec<&str> = patch.entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
